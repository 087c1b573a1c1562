use axum::{
    Form, Router, middleware,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use db::TransactionTrait;
use db::models::{event::Event, image::Image};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    AppState,
    error::ServerError,
    http::session,
    views::{self, EventView},
};

pub fn router() -> Router<AppState> {
    let gated = Router::new()
        .route("/", get(dashboard))
        .route("/refresh", post(refresh_all))
        .route("/event/{id}", get(event_detail))
        .route("/event/{id}/refresh", post(refresh_event))
        .route("/event/{id}/delete", post(delete_event))
        .route("/image/{id}/delete", post(delete_image))
        .route("/logout", post(logout))
        .layer(middleware::from_fn(session::require_admin));

    Router::new()
        .route("/login", get(login_form).post(login))
        .merge(gated)
}

pub async fn login_form(session: Session) -> Result<Html<String>, ServerError> {
    let flashes = session::take_flashes(&session).await?;
    Ok(views::admin_login_page(&flashes))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, ServerError> {
    if state
        .config()
        .admin
        .master_password_matches(form.password.trim())
    {
        session::set_admin(&session, true).await?;
        Ok(Redirect::to("/admin"))
    } else {
        session::push_flash(&session, "Invalid password").await?;
        Ok(Redirect::to("/admin/login"))
    }
}

pub async fn logout(session: Session) -> Result<Redirect, ServerError> {
    session::set_admin(&session, false).await?;
    session::push_flash(&session, "Logged out").await?;
    Ok(Redirect::to("/admin/login"))
}

pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, ServerError> {
    let events = Event::find_all(&state.db().pool).await?;
    let mut rows = Vec::with_capacity(events.len());
    for event in events {
        let count = Image::count_by_event(&state.db().pool, event.id).await?;
        rows.push((EventView::new(event, &state.config().addresses), count));
    }
    let flashes = session::take_flashes(&session).await?;
    Ok(views::admin_dashboard_page(&flashes, &rows))
}

/// Runs ingestion for every event in turn. One broken event (or an empty
/// mailbox config) must not stop the rest, so failures are tallied, not
/// propagated.
pub async fn refresh_all(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, ServerError> {
    let events = Event::find_all(&state.db().pool).await?;
    let total = events.len();
    let mut stored = 0usize;
    let mut failed = 0usize;
    for event in &events {
        match state.mailbox().ingest(&state.db().pool, &event.key).await {
            Ok(outcome) => stored += outcome.images_stored,
            Err(err) => {
                failed += 1;
                tracing::warn!("Refresh for event {} failed: {}", event.key, err);
            }
        }
    }
    session::push_flash(
        &session,
        format!(
            "Refreshed {} event(s): {} new image(s), {} failure(s)",
            total, stored, failed
        ),
    )
    .await?;
    Ok(Redirect::to("/admin"))
}

pub async fn event_detail(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Response, ServerError> {
    let Some(event) = Event::find_by_id(&state.db().pool, id).await? else {
        session::push_flash(&session, "Event not found").await?;
        return Ok(Redirect::to("/admin").into_response());
    };

    let images = Image::list_by_event(&state.db().pool, event.id).await?;
    let flashes = session::take_flashes(&session).await?;
    let view = EventView::new(event, &state.config().addresses);
    Ok(views::admin_event_page(&flashes, &view, &images).into_response())
}

pub async fn refresh_event(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Redirect, ServerError> {
    let Some(event) = Event::find_by_id(&state.db().pool, id).await? else {
        session::push_flash(&session, "Event not found").await?;
        return Ok(Redirect::to("/admin"));
    };

    match state.mailbox().ingest(&state.db().pool, &event.key).await {
        Ok(outcome) => {
            session::push_flash(
                &session,
                format!("Stored {} new image(s)", outcome.images_stored),
            )
            .await?;
        }
        Err(err) => {
            tracing::warn!("Refresh for event {} failed: {}", event.key, err);
            session::push_flash(&session, err.user_message()).await?;
        }
    }
    Ok(Redirect::to(&format!("/admin/event/{}", id)))
}

/// Cascading delete: image rows and the event row go in one transaction so
/// a crash can orphan files but never rows. Files are removed after the
/// commit, best-effort.
pub async fn delete_event(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Redirect, ServerError> {
    let Some(event) = Event::find_by_id(&state.db().pool, id).await? else {
        session::push_flash(&session, "Event not found").await?;
        return Ok(Redirect::to("/admin"));
    };

    let images = Image::list_by_event(&state.db().pool, event.id).await?;

    let tx = state.db().pool.begin().await?;
    Event::delete(&tx, event.id).await?;
    tx.commit().await?;

    for image in &images {
        state.storage().remove(&image.file_name);
    }

    tracing::info!(
        "Deleted event {} and {} image(s)",
        event.key,
        images.len()
    );
    session::push_flash(&session, format!("Deleted event \"{}\"", event.name)).await?;
    Ok(Redirect::to("/admin"))
}

/// File first, row second; a file that refuses to die is logged and left
/// behind, the row still goes.
pub async fn delete_image(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Redirect, ServerError> {
    let Some(image) = Image::find_by_id(&state.db().pool, id).await? else {
        session::push_flash(&session, "Image not found").await?;
        return Ok(Redirect::to("/admin"));
    };

    state.storage().remove(&image.file_name);
    Image::delete(&state.db().pool, image.id).await?;

    session::push_flash(&session, "Image deleted").await?;
    Ok(Redirect::to(&format!("/admin/event/{}", image.event_id)))
}
