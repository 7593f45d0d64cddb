use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::session::{ChangeSink, CommandOutcome, PreferenceCommand, PreferenceSession};
use super::submission::DEFAULT_FORM_PREFIX;
use crate::error::AppError;

/// The single editing session shared by the HTTP handlers; commands are applied one at a time.
pub type SharedSession<S> = Arc<Mutex<PreferenceSession<S>>>;

/// Router builder exposing the command surface and the submission snapshot.
pub fn preference_router<S>(session: SharedSession<S>) -> Router
where
    S: ChangeSink + 'static,
{
    Router::new()
        .route("/api/v1/preferences", get(view_handler::<S>))
        .route("/api/v1/preferences/commands", post(command_handler::<S>))
        .route(
            "/api/v1/preferences/submission",
            get(submission_handler::<S>),
        )
        .with_state(session)
}

pub(crate) async fn view_handler<S>(State(session): State<SharedSession<S>>) -> Response
where
    S: ChangeSink + 'static,
{
    let view = session.lock().expect("session mutex poisoned").view();
    (StatusCode::OK, axum::Json(view)).into_response()
}

pub(crate) async fn command_handler<S>(
    State(session): State<SharedSession<S>>,
    axum::Json(command): axum::Json<PreferenceCommand>,
) -> Result<Response, AppError>
where
    S: ChangeSink + 'static,
{
    let mut guard = session.lock().expect("session mutex poisoned");
    let payload = match guard.dispatch(command)? {
        CommandOutcome::Applied(change) => json!({
            "applied": true,
            "change": change,
            "session": guard.view(),
        }),
        CommandOutcome::Ignored { item_id, direction } => json!({
            "applied": false,
            "ignored": true,
            "item_id": item_id,
            "direction": direction,
            "session": guard.view(),
        }),
    };
    Ok((StatusCode::OK, axum::Json(payload)).into_response())
}

pub(crate) async fn submission_handler<S>(
    State(session): State<SharedSession<S>>,
) -> Result<Response, AppError>
where
    S: ChangeSink + 'static,
{
    let snapshot = session
        .lock()
        .expect("session mutex poisoned")
        .submission()?;
    let form_fields = snapshot.form_fields(DEFAULT_FORM_PREFIX);
    let payload = json!({
        "snapshot": snapshot,
        "form_fields": form_fields,
    });
    Ok((StatusCode::OK, axum::Json(payload)).into_response())
}
