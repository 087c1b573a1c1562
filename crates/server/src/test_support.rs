use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, header},
    response::Response,
};
use db::DBService;
use services::services::{
    config::{AddressConfig, AdminConfig, Config, MailboxConfig},
    storage::ImageStorage,
};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::AppState;

pub const TEST_ADMIN_PASSWORD: &str = "letmein";
pub const TEST_MASTER_PASSWORD: &str = "sesame";

pub struct TestApp {
    pub state: AppState,
    // Dropped with the app, taking the uploaded files with it.
    _storage_dir: TempDir,
}

/// In-memory database, throwaway upload dir, both admin passwords known.
/// The mailbox is deliberately left without credentials so nothing ever
/// dials out during a test.
pub async fn test_app() -> TestApp {
    let db = DBService::from_url("sqlite::memory:")
        .await
        .expect("in-memory database");
    let storage_dir = tempfile::tempdir().expect("temp storage dir");
    let storage =
        ImageStorage::new(storage_dir.path().join("uploads")).expect("storage root");
    let config = Config {
        mailbox: MailboxConfig {
            host: "imap.example.org".to_string(),
            port: 993,
            user: None,
            password: None,
            timeout: Duration::from_secs(1),
        },
        addresses: AddressConfig {
            prefix: "mailpix+".to_string(),
            domain: "gmail.com".to_string(),
        },
        admin: AdminConfig {
            creation_password: Some(TEST_ADMIN_PASSWORD.to_string()),
            master_password: Some(TEST_MASTER_PASSWORD.to_string()),
        },
    };

    TestApp {
        state: AppState::new(db, config, storage),
        _storage_dir: storage_dir,
    }
}

pub async fn post_form(router: &Router, uri: &str, body: &str) -> Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn post_form_with_cookie(
    router: &Router,
    uri: &str,
    body: &str,
    cookie: &str,
) -> Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header(header::COOKIE, cookie)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response should carry a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

pub async fn login_as_admin(router: &Router) -> String {
    let response = post_form(
        router,
        "/admin/login",
        &format!("password={}", TEST_MASTER_PASSWORD),
    )
    .await;
    session_cookie(&response)
}
