mod book_repository;
mod comment_repository;
mod my_book_repository;
mod user_repository;

pub use book_repository::{BookRepository, SqliteBookRepository};
pub use comment_repository::{CommentRepository, SqliteCommentRepository};
pub use my_book_repository::{MyBookRepository, SqliteMyBookRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};

use crate::error::Result;

pub trait Repository {
    type Entity;
    type Id;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
    fn delete(&self, id: &Self::Id) -> Result<bool>;
}
