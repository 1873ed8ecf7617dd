pub mod config;
pub mod error;
pub mod models;
pub mod password;
pub mod policy;
pub mod seed;
pub mod storage;

pub use config::AppConfig;
pub use error::{BooklogError, Result};
pub use models::*;
pub use policy::{can_view_book, Actor};
pub use seed::{seed_demo_data, SeedReport};

pub use storage::covers::CoverStore;
pub use storage::database::{open_database, open_in_memory, ConnectionPool, Database};

pub use storage::repositories::{
    BookRepository, CommentRepository, MyBookRepository, Repository, SqliteBookRepository,
    SqliteCommentRepository, SqliteMyBookRepository, SqliteUserRepository, UserRepository,
};
