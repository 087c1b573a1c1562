use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use db::models::{
    event::{CreateEvent, Event},
    image::Image,
};
use serde::Deserialize;
use services::services::event_key;
use tower_sessions::Session;

use crate::{
    AppState,
    error::ServerError,
    http::session,
    views::{self, EventView},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/create_event", get(create_event_form).post(create_event))
        .route("/event/{key}", get(event_page))
        .route("/find_event", get(find_event_form).post(find_event))
}

pub async fn index(session: Session) -> Result<Html<String>, ServerError> {
    let flashes = session::take_flashes(&session).await?;
    Ok(views::index_page(&flashes))
}

pub async fn create_event_form(session: Session) -> Result<Html<String>, ServerError> {
    let flashes = session::take_flashes(&session).await?;
    Ok(views::create_event_page(&flashes))
}

#[derive(Debug, Deserialize)]
pub struct CreateEventForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    admin_password: String,
}

pub async fn create_event(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CreateEventForm>,
) -> Result<Redirect, ServerError> {
    if !state
        .config()
        .admin
        .creation_password_matches(form.admin_password.trim())
    {
        session::push_flash(&session, "Invalid admin password").await?;
        return Ok(Redirect::to("/create_event"));
    }

    let name = form.name.trim();
    if name.is_empty() {
        session::push_flash(&session, "Event name is required").await?;
        return Ok(Redirect::to("/create_event"));
    }

    let description = match form.description.trim() {
        "" => None,
        trimmed => Some(trimmed.to_string()),
    };

    let key = event_key::generate_unique_key(&state.db().pool).await?;
    let event = Event::create(
        &state.db().pool,
        &CreateEvent {
            name: name.to_string(),
            description,
            key,
        },
    )
    .await?;

    let address = state.config().addresses.collection_address(&event.key);
    tracing::info!("Created event {} ({})", event.name, address);
    session::push_flash(
        &session,
        format!("Event created! Share this email address: {}", address),
    )
    .await?;
    Ok(Redirect::to(&format!("/event/{}", event.key)))
}

/// The public gallery. Viewing is what triggers an ingestion pass, so the
/// page is always at most one refresh behind the mailbox; ingestion failure
/// flashes but never hides the images already stored.
pub async fn event_page(
    State(state): State<AppState>,
    session: Session,
    Path(key): Path<String>,
) -> Result<Response, ServerError> {
    let Some(event) = Event::find_by_key(&state.db().pool, &key).await? else {
        session::push_flash(&session, "Event not found").await?;
        return Ok(Redirect::to("/").into_response());
    };

    if let Err(err) = state.mailbox().ingest(&state.db().pool, &event.key).await {
        tracing::warn!("Ingestion for event {} failed: {}", event.key, err);
        session::push_flash(&session, err.user_message()).await?;
    }

    let images = Image::list_by_event(&state.db().pool, event.id).await?;
    let flashes = session::take_flashes(&session).await?;
    let view = EventView::new(event, &state.config().addresses);
    Ok(views::event_page(&flashes, &view, &images).into_response())
}

pub async fn find_event_form(session: Session) -> Result<Html<String>, ServerError> {
    let flashes = session::take_flashes(&session).await?;
    Ok(views::find_event_page(&flashes))
}

#[derive(Debug, Deserialize)]
pub struct FindEventForm {
    #[serde(default)]
    email: String,
}

pub async fn find_event(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FindEventForm>,
) -> Result<Redirect, ServerError> {
    let email = form.email.trim();
    if email.is_empty() {
        session::push_flash(&session, "Email is required").await?;
        return Ok(Redirect::to("/find_event"));
    }

    let Some(key) = state.config().addresses.extract_key(email) else {
        session::push_flash(&session, "Invalid event email format").await?;
        return Ok(Redirect::to("/find_event"));
    };

    if Event::find_by_key(&state.db().pool, &key).await?.is_none() {
        session::push_flash(&session, "Event not found").await?;
        return Ok(Redirect::to("/find_event"));
    }

    Ok(Redirect::to(&format!("/event/{}", key)))
}
