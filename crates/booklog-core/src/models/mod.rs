pub mod book;
pub mod comment;
pub mod my_book;
pub mod user;

pub use book::*;
pub use comment::*;
pub use my_book::*;
pub use user::*;
