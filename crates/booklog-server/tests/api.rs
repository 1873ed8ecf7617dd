use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use booklog_core::{AppConfig, CoverStore, Database, Role};
use booklog_server::{router, AppState, JwtKeys};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    _dir: TempDir,
}

struct Response {
    status: StatusCode,
    body: Value,
    raw: Vec<u8>,
}

impl TestApp {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap().with_password_cost(4);
        db.create_user("admin", "Admin123!", Role::Admin).unwrap();

        let mut config = AppConfig::default();
        config.core.data_dir = dir.path().to_string_lossy().to_string();
        config.server.max_upload_bytes = 1024;

        let jwt = JwtKeys::new(b"integration-test-secret", "booklog", "booklog-client", 120);
        let covers = CoverStore::new(config.uploads_dir()).with_max_bytes(config.server.max_upload_bytes);
        let app = router(AppState::new(db, jwt, covers, config));
        Self { app, _dir: dir }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let raw = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
        let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);
        Response { status, body, raw }
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let res = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"username": username, "password": password})),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
        res.body["accessToken"].as_str().unwrap().to_string()
    }

    async fn register(&self, username: &str, role: &str) -> String {
        let res = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"username": username, "password": "Test123!", "role": role})),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
        res.body["accessToken"].as_str().unwrap().to_string()
    }

    async fn create_book(&self, token: &str, body: Value) -> Value {
        let res = self.call(Method::POST, "/api/books", Some(token), Some(body)).await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
        res.body
    }

    async fn upload(&self, token: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Response {
        let boundary = "booklog-test-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/uploads/cover")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

fn book(title: &str) -> Value {
    json!({"title": title, "authorName": "Frank Herbert", "genre": "Sci-Fi"})
}

// ─── Health & auth ─────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new();
    let res = app.call(Method::GET, "/api/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
}

#[tokio::test]
async fn register_login_and_me_round_trip() {
    let app = TestApp::new();
    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "newreader", "password": "Test123!"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["user"]["username"], "newreader");
    assert_eq!(res.body["user"]["role"], "Reader");

    let token = app.login("newreader", "Test123!").await;
    let me = app.call(Method::GET, "/api/auth/me", Some(token.as_str()), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "newreader");
    assert_eq!(me.body["role"], "Reader");
}

#[tokio::test]
async fn register_rejects_admin_role_and_duplicates() {
    let app = TestApp::new();
    let admin = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "sneaky", "password": "Test123!", "role": "Admin"})),
        )
        .await;
    assert_eq!(admin.status, StatusCode::BAD_REQUEST);

    app.register("author9", "Author").await;
    let dup = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "AUTHOR9", "password": "Test123!", "role": "Reader"})),
        )
        .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);
    assert_eq!(dup.body["status"], "error");
    assert_eq!(dup.body["error"], "conflict");
}

#[tokio::test]
async fn bad_credentials_and_missing_tokens_are_unauthorized() {
    let app = TestApp::new();
    let res = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"username": "admin", "password": "wrong"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "unauthorized");

    let res = app.call(Method::GET, "/api/mybooks", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.call(Method::GET, "/api/mybooks", Some("garbage"), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

// ─── Books ─────────────────────────────────────────────────

#[tokio::test]
async fn reader_cannot_create_books() {
    let app = TestApp::new();
    let reader = app.register("reader9", "Reader").await;
    let res = app.call(Method::POST, "/api/books", Some(reader.as_str()), Some(book("Dune"))).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["error"], "forbidden");
}

#[tokio::test]
async fn ownership_guards_update_and_delete() {
    let app = TestApp::new();
    let owner = app.register("owner1", "Author").await;
    let other = app.register("other1", "Author").await;
    let admin = app.login("admin", "Admin123!").await;

    let created = app.create_book(&owner, book("Dune")).await;
    let id = created["id"].as_i64().unwrap();
    let me = app.call(Method::GET, "/api/auth/me", Some(owner.as_str()), None).await;
    assert_eq!(created["createdByUserId"], me.body["id"]);
    assert_eq!(created["status"], "Published");

    let uri = format!("/api/books/{id}");
    let res = app.call(Method::PUT, &uri, Some(other.as_str()), Some(book("Stolen"))).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = app.call(Method::DELETE, &uri, Some(other.as_str()), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.call(Method::PUT, &uri, Some(owner.as_str()), Some(book("Dune Messiah"))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["title"], "Dune Messiah");

    let res = app.call(Method::PUT, "/api/books/9999", Some(other.as_str()), Some(book("x"))).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = app.call(Method::DELETE, "/api/books/9999", Some(other.as_str()), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.call(Method::DELETE, &uri, Some(admin.as_str()), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_visibility_defaults_to_published() {
    let app = TestApp::new();
    let author = app.register("author2", "Author").await;
    let created = app
        .create_book(
            &author,
            json!({"title": "Dune", "authorName": "Frank Herbert", "status": "Sideways"}),
        )
        .await;
    assert_eq!(created["status"], "Published");
}

#[tokio::test]
async fn blank_title_is_a_validation_error() {
    let app = TestApp::new();
    let author = app.register("author3", "Author").await;
    let res = app
        .call(
            Method::POST,
            "/api/books",
            Some(author.as_str()),
            Some(json!({"title": "   ", "authorName": "Someone"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn hidden_books_are_only_visible_to_owner_and_admin() {
    let app = TestApp::new();
    let owner = app.register("author4", "Author").await;
    let reader = app.register("reader4", "Reader").await;
    let admin = app.login("admin", "Admin123!").await;

    let hidden = app
        .create_book(
            &owner,
            json!({"title": "Draft", "authorName": "Me", "status": "Hidden"}),
        )
        .await;
    app.create_book(&owner, book("Public")).await;
    let uri = format!("/api/books/{}", hidden["id"]);

    for token in [None, Some(reader.as_str())] {
        let list = app.call(Method::GET, "/api/books", token, None).await;
        assert_eq!(list.body.as_array().unwrap().len(), 1);
        let res = app.call(Method::GET, &uri, token, None).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
    }
    for token in [owner.as_str(), admin.as_str()] {
        let list = app.call(Method::GET, "/api/books", Some(token), None).await;
        assert_eq!(list.body.as_array().unwrap().len(), 2);
        let res = app.call(Method::GET, &uri, Some(token), None).await;
        assert_eq!(res.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn list_filters_by_query_genre_and_owner() {
    let app = TestApp::new();
    let author = app.register("author5", "Author").await;
    let admin = app.login("admin", "Admin123!").await;

    app.create_book(&author, json!({"title": "Dune", "authorName": "Frank Herbert", "genre": "Sci-Fi"}))
        .await;
    app.create_book(&admin, json!({"title": "The Hobbit", "authorName": "J.R.R. Tolkien", "genre": "Fantasy"}))
        .await;

    let res = app.call(Method::GET, "/api/books?q=tolkien", None, None).await;
    let titles: Vec<&str> = res.body.as_array().unwrap().iter().map(|b| b["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["The Hobbit"]);

    let res = app.call(Method::GET, "/api/books?genre=sci-fi", None, None).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    let res = app.call(Method::GET, "/api/books?mine=true", Some(author.as_str()), None).await;
    assert_eq!(res.body[0]["title"], "Dune");
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    let res = app.call(Method::GET, "/api/books?mine=true", None, None).await;
    assert_eq!(res.body.as_array().unwrap().len(), 2);

    let res = app.call(Method::GET, "/api/books/genres", None, None).await;
    assert_eq!(res.body, json!(["Fantasy", "Sci-Fi"]));
}

// ─── Comments ──────────────────────────────────────────────

#[tokio::test]
async fn comments_can_be_changed_by_owner_or_admin_only() {
    let app = TestApp::new();
    let author = app.register("author6", "Author").await;
    let reader = app.register("reader6", "Reader").await;
    let admin = app.login("admin", "Admin123!").await;
    let book_id = app.create_book(&author, book("Dune")).await["id"].as_i64().unwrap();

    let uri = format!("/api/books/{book_id}/comments");
    let res = app
        .call(Method::POST, &uri, Some(reader.as_str()), Some(json!({"content": "Great read"})))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["username"], "reader6");
    let comment_uri = format!("/api/comments/{}", res.body["id"]);

    let res = app
        .call(Method::PUT, &comment_uri, Some(author.as_str()), Some(json!({"content": "hijack"})))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .call(Method::PUT, &comment_uri, Some(reader.as_str()), Some(json!({"content": "Really great"})))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["content"], "Really great");
    assert!(res.body["updatedAt"].is_string());

    let res = app.call(Method::DELETE, &comment_uri, Some(author.as_str()), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = app.call(Method::DELETE, &comment_uri, Some(admin.as_str()), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn commenting_on_missing_book_is_not_found() {
    let app = TestApp::new();
    let reader = app.register("reader7", "Reader").await;
    let res = app
        .call(Method::POST, "/api/books/4242/comments", Some(reader.as_str()), Some(json!({"content": "hi"})))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"], "not_found");
}

// ─── Reading list ──────────────────────────────────────────

#[tokio::test]
async fn reading_list_upserts_in_place() {
    let app = TestApp::new();
    let author = app.register("author8", "Author").await;
    let reader = app.register("reader8", "Reader").await;
    let book_id = app.create_book(&author, book("Dune")).await["id"].as_i64().unwrap();
    let uri = format!("/api/mybooks/{book_id}");

    let first = app.call(Method::PUT, &uri, Some(reader.as_str()), Some(json!({"status": "Reading"}))).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["status"], "Reading");
    assert_eq!(first.body["book"]["title"], "Dune");

    let second = app.call(Method::PUT, &uri, Some(reader.as_str()), Some(json!({"status": "nonsense"}))).await;
    assert_eq!(second.body["status"], "WantToRead");
    assert_eq!(second.body["id"], first.body["id"]);

    let list = app.call(Method::GET, "/api/mybooks", Some(reader.as_str()), None).await;
    assert_eq!(list.body.as_array().unwrap().len(), 1);

    let res = app.call(Method::DELETE, &uri, Some(reader.as_str()), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = app.call(Method::DELETE, &uri, Some(reader.as_str()), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.call(Method::PUT, "/api/mybooks/777", Some(reader.as_str()), Some(json!({"status": "Reading"}))).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_book_cascades() {
    let app = TestApp::new();
    let author = app.register("author10", "Author").await;
    let reader = app.register("reader10", "Reader").await;
    let book_id = app.create_book(&author, book("Dune")).await["id"].as_i64().unwrap();

    app.call(
        Method::POST,
        &format!("/api/books/{book_id}/comments"),
        Some(reader.as_str()),
        Some(json!({"content": "nice"})),
    )
    .await;
    app.call(Method::PUT, &format!("/api/mybooks/{book_id}"), Some(reader.as_str()), Some(json!({"status": "Finished"})))
        .await;

    let res = app.call(Method::DELETE, &format!("/api/books/{book_id}"), Some(author.as_str()), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let list = app.call(Method::GET, "/api/mybooks", Some(reader.as_str()), None).await;
    assert_eq!(list.body, json!([]));
    let comments = app
        .call(Method::GET, &format!("/api/books/{book_id}/comments"), None, None)
        .await;
    assert_eq!(comments.status, StatusCode::NOT_FOUND);
}

// ─── Uploads ───────────────────────────────────────────────

#[tokio::test]
async fn cover_upload_is_stored_and_served() {
    let app = TestApp::new();
    let author = app.register("author11", "Author").await;

    let res = app.upload(&author, "cover.png", "image/png", b"\x89PNG fake").await;
    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    let url = res.body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/") && url.ends_with(".png"));

    let served = app.call(Method::GET, &url, None, None).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.raw, b"\x89PNG fake");
}

#[tokio::test]
async fn cover_upload_rejections() {
    let app = TestApp::new();
    let author = app.register("author12", "Author").await;
    let reader = app.register("reader12", "Reader").await;

    let res = app.upload(&author, "cover.gif", "image/gif", b"GIF89a").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.upload(&author, "cover.exe", "image/png", b"MZ").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.upload(&author, "cover.png", "image/png", b"").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.upload(&reader, "cover.png", "image/png", b"\x89PNG").await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cover_upload_over_size_limit_is_rejected() {
    let app = TestApp::new();
    let author = app.register("author13", "Author").await;

    let res = app.upload(&author, "big.png", "image/png", &[0u8; 2000]).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "invalid_upload");

    let res = app.upload(&author, "fits.png", "image/png", &[0u8; 1024]).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn hidden_book_changes_by_others_are_not_found() {
    let app = TestApp::new();
    let owner = app.register("author14", "Author").await;
    let other = app.register("author15", "Author").await;
    let reader = app.register("reader14", "Reader").await;

    let hidden = app
        .create_book(
            &owner,
            json!({"title": "Draft", "authorName": "Me", "status": "Hidden"}),
        )
        .await;
    let uri = format!("/api/books/{}", hidden["id"]);

    for token in [other.as_str(), reader.as_str()] {
        let res = app.call(Method::PUT, &uri, Some(token), Some(book("Leak"))).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        let res = app.call(Method::DELETE, &uri, Some(token), None).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
    }

    let res = app.call(Method::GET, &uri, Some(owner.as_str()), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["title"], "Draft");
}

#[tokio::test]
async fn register_role_defaults_only_when_absent() {
    let app = TestApp::new();
    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "norole", "password": "Test123!"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
    let token = app.login("norole", "Test123!").await;
    let me = app.call(Method::GET, "/api/auth/me", Some(token.as_str()), None).await;
    assert_eq!(me.body["role"], "Reader");

    for role in ["", "  ", "Librarian"] {
        let res = app
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"username": "blankrole", "password": "Test123!", "role": role})),
            )
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "role {role}");
    }
}

#[tokio::test]
async fn search_folds_non_ascii_case() {
    let app = TestApp::new();
    let author = app.register("author16", "Author").await;
    app.create_book(&author, json!({"title": "Élan vital", "authorName": "Henri Bergson"}))
        .await;
    app.create_book(&author, json!({"title": "Straße", "authorName": "Ödön von Horváth"}))
        .await;
    app.create_book(&author, book("Dune")).await;

    let res = app.call(Method::GET, "/api/books?q=%C3%A9LAN", None, None).await;
    let titles: Vec<&str> = res.body.as_array().unwrap().iter().map(|b| b["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["Élan vital"]);

    let res = app.call(Method::GET, "/api/books?q=%C3%B6d%C3%B6n", None, None).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
}
