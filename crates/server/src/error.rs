use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::DbErr;
use services::services::{mailbox::MailboxError, storage::StorageError};
use thiserror::Error;

use crate::views;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Mailbox(#[from] MailboxError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ServerError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ServerError::Mailbox(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MailboxError"),
            ServerError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "StorageError"),
            ServerError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IoError"),
            ServerError::Session(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SessionError"),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "Request failed"
            );
        }

        let message = match &self {
            ServerError::NotFound(msg) => msg.clone(),
            _ if status_code.is_server_error() => {
                "Something went wrong handling this request.".to_string()
            }
            other => other.to_string(),
        };
        (status_code, views::error_page(status_code, &message)).into_response()
    }
}
