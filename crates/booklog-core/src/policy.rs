//! Who may see and change what.
//!
//! Admins may do anything. Authors may create books and change the ones they
//! own. Every signed-in user may comment and keep a reading list, and may
//! change their own comments. Hidden books exist only for admins and owners.

use crate::error::{BooklogError, Result};
use crate::models::{Book, Comment, Role, User, VisibilityStatus};

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can_create_books(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Author)
    }

    pub fn owns_book(&self, book: &Book) -> bool {
        book.created_by_user_id == self.user_id
    }

    pub fn can_modify_book(&self, book: &Book) -> bool {
        self.is_admin() || self.owns_book(book)
    }

    pub fn can_modify_comment(&self, comment: &Comment) -> bool {
        self.is_admin() || comment.user_id == self.user_id
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}

/// Whether `viewer` (anonymous when `None`) may see `book` at all.
pub fn can_view_book(viewer: Option<&Actor>, book: &Book) -> bool {
    match book.status {
        VisibilityStatus::Published => true,
        VisibilityStatus::Hidden => viewer.is_some_and(|a| a.can_modify_book(book)),
    }
}

pub(crate) fn ensure_can_create_books(actor: &Actor) -> Result<()> {
    if actor.can_create_books() {
        Ok(())
    } else {
        Err(BooklogError::Forbidden("only admins and authors can add books".into()))
    }
}

pub(crate) fn ensure_can_modify_book(actor: &Actor, book: &Book) -> Result<()> {
    if actor.can_modify_book(book) {
        Ok(())
    } else {
        Err(BooklogError::Forbidden(format!("book {} belongs to another user", book.id)))
    }
}

pub(crate) fn ensure_can_modify_comment(actor: &Actor, comment: &Comment) -> Result<()> {
    if actor.can_modify_comment(comment) {
        Ok(())
    } else {
        Err(BooklogError::Forbidden(format!(
            "comment {} belongs to another user",
            comment.id
        )))
    }
}
