//! Session-backed state: the admin flag and Flask-style flash messages.
//! Everything lives server-side in the session store; cookies only carry the
//! random session id.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::ServerError;

const ADMIN_KEY: &str = "is_admin";
const FLASH_KEY: &str = "flashes";

pub async fn push_flash(session: &Session, message: impl Into<String>) -> Result<(), ServerError> {
    let mut flashes: Vec<String> = session.get(FLASH_KEY).await?.unwrap_or_default();
    flashes.push(message.into());
    session.insert(FLASH_KEY, flashes).await?;
    Ok(())
}

/// Drains the pending flashes; they display exactly once.
pub async fn take_flashes(session: &Session) -> Result<Vec<String>, ServerError> {
    Ok(session
        .remove::<Vec<String>>(FLASH_KEY)
        .await?
        .unwrap_or_default())
}

pub async fn is_admin(session: &Session) -> Result<bool, ServerError> {
    Ok(session.get::<bool>(ADMIN_KEY).await?.unwrap_or(false))
}

pub async fn set_admin(session: &Session, value: bool) -> Result<(), ServerError> {
    if value {
        session.insert(ADMIN_KEY, true).await?;
    } else {
        session.remove::<bool>(ADMIN_KEY).await?;
    }
    Ok(())
}

/// Guard for the admin surface. Anything without the session flag bounces to
/// the login page before the handler can touch state.
pub async fn require_admin(session: Session, request: Request, next: Next) -> Response {
    match is_admin(&session).await {
        Ok(true) => next.run(request).await,
        Ok(false) => Redirect::to("/admin/login").into_response(),
        Err(err) => err.into_response(),
    }
}
