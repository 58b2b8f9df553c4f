use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use records::{Club, Event, Notification, UserProfile};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{
    error::AppError,
    mail::Email,
    notify::render,
    services::{Participant, TagCategory},
    state::AppState,
};

type Shared = State<Arc<AppState>>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    user_id: String,
}

fn payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| {
            info!("Rejected payload: {rejection}");
            AppError::MalformedPayload
        })
}

fn done(ok: bool) -> Result<StatusCode, AppError> {
    if ok {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::ActionFailed)
    }
}

/// Relay endpoint: turns a notification payload into one email to the
/// representative. A body without `type` is a club application.
pub async fn notify_handler(State(state): Shared, body: Bytes) -> Response {
    let sent = async {
        let notification = Notification::from_relay_body(&body)
            .map_err(|e| format!("Malformed notification: {e}"))?;
        let message = render(&notification);

        let email = Email {
            from: state.config.mail_from.clone(),
            to: vec![notification.representative_email().to_string()],
            subject: message.subject,
            text: message.body,
        };

        state
            .mailer
            .send(&email)
            .await
            .map_err(|e| format!("Failed to send {} email: {e}", notification.kind()))
    };

    match sent.await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Email sent successfully" })),
        )
            .into_response(),
        Err(e) => {
            error!("{e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to send email" })),
            )
                .into_response()
        }
    }
}

pub async fn clubs_handler(State(state): Shared) -> Json<Vec<Club>> {
    Json(state.clubs.clubs().await)
}

pub async fn club_handler(
    State(state): Shared,
    Path(club_id): Path<String>,
) -> Result<Json<Club>, AppError> {
    state
        .clubs
        .club(&club_id)
        .await
        .map(Json)
        .ok_or(AppError::NotFound)
}

pub async fn club_members_handler(
    State(state): Shared,
    Path(club_id): Path<String>,
) -> Json<Vec<Participant>> {
    Json(state.clubs.approved_participants(&club_id).await)
}

pub async fn apply_handler(
    State(state): Shared,
    Path(club_id): Path<String>,
    body: Result<Json<Membership>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Membership { user_id } = payload(body)?;

    done(state.clubs.apply(&club_id, &user_id).await)
}

pub async fn cancel_application_handler(
    State(state): Shared,
    Path((club_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    done(state.clubs.cancel_application(&club_id, &user_id).await)
}

pub async fn events_handler(State(state): Shared) -> Json<Vec<Event>> {
    Json(state.events.events().await)
}

pub async fn event_handler(
    State(state): Shared,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, AppError> {
    state
        .events
        .event(&event_id)
        .await
        .map(Json)
        .ok_or(AppError::NotFound)
}

pub async fn create_event_handler(
    State(state): Shared,
    body: Result<Json<Event>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = payload(body)?;

    state
        .events
        .create_event(event)
        .await
        .map(|event| (StatusCode::CREATED, Json(event)))
        .ok_or(AppError::ActionFailed)
}

pub async fn event_participants_handler(
    State(state): Shared,
    Path(event_id): Path<String>,
) -> Json<Vec<Participant>> {
    Json(state.events.participants(&event_id).await)
}

pub async fn join_handler(
    State(state): Shared,
    Path(event_id): Path<String>,
    body: Result<Json<Membership>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Membership { user_id } = payload(body)?;

    done(state.events.join(&event_id, &user_id).await)
}

pub async fn leave_handler(
    State(state): Shared,
    Path((event_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    done(state.events.leave(&event_id, &user_id).await)
}

pub async fn profile_handler(
    State(state): Shared,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    state
        .users
        .profile(&user_id)
        .await
        .map(Json)
        .ok_or(AppError::NotFound)
}

pub async fn tags_handler(State(state): Shared) -> Json<Vec<TagCategory>> {
    Json(state.tags.tags_by_category().await)
}
