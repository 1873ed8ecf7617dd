//! JSON shapes of the HTTP API.

use booklog_core::{Book, Comment, MyBook, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub id: i64,
    pub title: String,
    pub author_name: String,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub status: String,
    pub created_by_user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author_name: book.author_name,
            genre: book.genre,
            description: book.description,
            cover_image_url: book.cover_image_url,
            status: book.status.to_string(),
            created_by_user_id: book.created_by_user_id,
            created_at: book.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Comment> for CommentDto {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            book_id: c.book_id,
            user_id: c.user_id,
            username: c.username,
            content: c.content,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MyBookDto {
    pub id: i64,
    pub book_id: i64,
    pub status: String,
    pub book: BookDto,
}

impl From<MyBook> for MyBookDto {
    fn from(entry: MyBook) -> Self {
        Self {
            id: entry.id,
            book_id: entry.book_id,
            status: entry.status.to_string(),
            book: entry.book.into(),
        }
    }
}

pub fn to_dtos<T, D: From<T>>(items: Vec<T>) -> Vec<D> {
    items.into_iter().map(D::from).collect()
}
