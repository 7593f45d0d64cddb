use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use crate::workflows::preferences::router::{command_handler, submission_handler};
use crate::workflows::preferences::{
    preference_router, ItemId, PreferenceCommand, PreferenceLimits, PreferenceSession,
    RecordingSink, SubmissionWindow,
};

fn command_request(body: serde_json::Value) -> Request<Body> {
    Request::post("/api/v1/preferences/commands")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn command_route_applies_and_returns_session() {
    let session = shared_session(&["P1", "P2", "P3"]);
    let router = preference_router(session.clone());

    let response = router
        .oneshot(command_request(
            json!({ "command": "remove", "item_id": "P2" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["applied"], json!(true));
    assert_eq!(body["change"]["kind"], json!("removed"));
    assert_eq!(body["session"]["total_count"], json!(2));
    assert_eq!(body["session"]["entries"][1]["item_id"], json!("P3"));
    assert_eq!(body["session"]["entries"][1]["rank"], json!(2));

    let guard = session.lock().expect("session mutex poisoned");
    assert_eq!(guard.sink().events().len(), 1);
}

#[tokio::test]
async fn duplicate_add_returns_conflict() {
    let session = shared_session(&["P1"]);
    let response = command_handler(
        State(session),
        axum::Json(PreferenceCommand::Add(ItemId::new("P1"))),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_item_returns_not_found() {
    let session = shared_session(&["P1"]);
    let response = command_handler(
        State(session),
        axum::Json(PreferenceCommand::MoveDown(ItemId::new("P7"))),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("P7"));
}

#[tokio::test]
async fn boundary_move_is_reported_as_ignored() {
    let session = shared_session(&["P1", "P2"]);
    let response = command_handler(
        State(session),
        axum::Json(PreferenceCommand::MoveUp(ItemId::new("P1"))),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["applied"], json!(false));
    assert_eq!(body["ignored"], json!(true));
    assert_eq!(body["direction"], json!("up"));
}

#[tokio::test]
async fn view_route_lists_entries_in_rank_order() {
    let router = preference_router(shared_session(&["P5", "P2"]));
    let response = router
        .oneshot(
            Request::get("/api/v1/preferences")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["entries"][0]["item_id"], json!("P5"));
    assert_eq!(body["entries"][0]["can_move_up"], json!(false));
    assert_eq!(body["entries"][1]["can_move_down"], json!(false));
}

#[tokio::test]
async fn submission_route_returns_form_fields() {
    let router = preference_router(shared_session(&["P1", "P2"]));
    let response = router
        .oneshot(
            Request::get("/api/v1/preferences/submission")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["snapshot"]["total_forms"], json!(2));
    assert_eq!(body["form_fields"][0], json!(["form-TOTAL_FORMS", "2"]));
}

#[tokio::test]
async fn submission_below_minimum_is_unprocessable() {
    let session = PreferenceSession::new(list_of(&["P1"]), RecordingSink::default()).with_limits(
        PreferenceLimits {
            min: Some(3),
            max: None,
        },
    );
    let response = submission_handler(State(Arc::new(Mutex::new(session))))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn submission_outside_window_is_forbidden() {
    let session = session_of(&["P1"]).with_window(SubmissionWindow::default());
    let response = submission_handler(State(Arc::new(Mutex::new(session))))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json_body(response).await;
    assert_eq!(
        body["error"],
        json!("submission error: preference submissions are closed")
    );
}
