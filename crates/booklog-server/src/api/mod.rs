//! REST routes under `/api`.

pub mod auth;
pub mod books;
pub mod comments;
pub mod dto;
pub mod health;
pub mod my_books;
pub mod uploads;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/books", get(books::list).post(books::create))
        .route("/books/genres", get(books::genres))
        .route(
            "/books/:id",
            get(books::get).put(books::update).delete(books::delete),
        )
        .route(
            "/books/:id/comments",
            get(comments::list_for_book).post(comments::create),
        )
        .route(
            "/comments/:id",
            put(comments::update).delete(comments::delete),
        )
        .route("/mybooks", get(my_books::list))
        .route(
            "/mybooks/:book_id",
            put(my_books::set_status).delete(my_books::remove),
        )
        .route("/uploads/cover", post(uploads::upload_cover))
}
