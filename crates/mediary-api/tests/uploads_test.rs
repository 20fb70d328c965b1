mod helpers;

use axum::http::StatusCode;
use helpers::{api_path, cookie_header, login, setup_test_app, MAX_FILE_SIZE_BYTES};
use mediary_core::models::{UploadIntent, UploadStatus, UploadTicket};
use mediary_db::UploadIntentStore;

#[tokio::test]
async fn test_request_then_confirm_over_http() {
    let app = setup_test_app();
    let (user, token) = login(&app, "google-1", "jo@example.com").await;

    let (name, value) = cookie_header(&token);
    let response = app
        .server
        .post(&api_path("/uploads"))
        .add_header(name, value)
        .json(&serde_json::json!({
            "file_name": "photo.jpg",
            "content_type": "image/jpeg",
            "size_bytes": 50_000_000u64,
        }))
        .await;
    response.assert_status_ok();

    let ticket: UploadTicket = response.json();
    assert!(ticket.key.starts_with(&format!("uploads/{}/", user.id)));
    assert!(ticket.upload_url.contains(&ticket.key));
    assert_eq!(app.issuer.sign_count(), 1);

    let (name, value) = cookie_header(&token);
    let response = app
        .server
        .post(&api_path("/uploads/confirm"))
        .add_header(name, value)
        .json(&serde_json::json!({ "intent_id": ticket.intent_id }))
        .await;
    response.assert_status_ok();

    let (name, value) = cookie_header(&token);
    let response = app
        .server
        .get(&api_path("/uploads"))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let intents: Vec<UploadIntent> = response.json();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].status, UploadStatus::Uploaded);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_without_side_effects() {
    let app = setup_test_app();
    let (_user, token) = login(&app, "google-1", "jo@example.com").await;

    let (name, value) = cookie_header(&token);
    let response = app
        .server
        .post(&api_path("/uploads"))
        .add_header(name, value)
        .json(&serde_json::json!({
            "file_name": "huge.mp4",
            "content_type": "video/mp4",
            "size_bytes": MAX_FILE_SIZE_BYTES * 2,
        }))
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");

    assert_eq!(app.issuer.sign_count(), 0);
    assert_eq!(app.intents.intent_count(), 0);
}

#[tokio::test]
async fn test_unauthenticated_upload_request_is_rejected() {
    let app = setup_test_app();

    let response = app
        .server
        .post(&api_path("/uploads"))
        .json(&serde_json::json!({
            "file_name": "photo.jpg",
            "content_type": "image/jpeg",
            "size_bytes": 1_000u64,
        }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(app.issuer.sign_count(), 0);
}

#[tokio::test]
async fn test_confirming_anothers_intent_is_forbidden() {
    let app = setup_test_app();
    let (_owner, owner_token) = login(&app, "google-owner", "owner@example.com").await;
    let (_intruder, intruder_token) = login(&app, "google-intruder", "intruder@example.com").await;

    let (name, value) = cookie_header(&owner_token);
    let response = app
        .server
        .post(&api_path("/uploads"))
        .add_header(name, value)
        .json(&serde_json::json!({
            "file_name": "photo.jpg",
            "content_type": "image/jpeg",
            "size_bytes": 1_000u64,
        }))
        .await;
    let ticket: UploadTicket = response.json();

    let (name, value) = cookie_header(&intruder_token);
    let response = app
        .server
        .post(&api_path("/uploads/confirm"))
        .add_header(name, value)
        .json(&serde_json::json!({ "intent_id": ticket.intent_id }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "FORBIDDEN");

    // Fail closed: no state change.
    let intent = app
        .intents
        .find_by_id(ticket.intent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(intent.status, UploadStatus::Pending);
}

#[tokio::test]
async fn test_confirming_unknown_intent_is_not_found() {
    let app = setup_test_app();
    let (_user, token) = login(&app, "google-1", "jo@example.com").await;

    let (name, value) = cookie_header(&token);
    let response = app
        .server
        .post(&api_path("/uploads/confirm"))
        .add_header(name, value)
        .json(&serde_json::json!({ "intent_id": 999 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_double_confirm_conflicts() {
    let app = setup_test_app();
    let (_user, token) = login(&app, "google-1", "jo@example.com").await;

    let (name, value) = cookie_header(&token);
    let response = app
        .server
        .post(&api_path("/uploads"))
        .add_header(name, value)
        .json(&serde_json::json!({
            "file_name": "photo.jpg",
            "content_type": "image/jpeg",
            "size_bytes": 1_000u64,
        }))
        .await;
    let ticket: UploadTicket = response.json();

    for expected in [StatusCode::OK, StatusCode::CONFLICT] {
        let (name, value) = cookie_header(&token);
        let response = app
            .server
            .post(&api_path("/uploads/confirm"))
            .add_header(name, value)
            .json(&serde_json::json!({ "intent_id": ticket.intent_id }))
            .await;
        response.assert_status(expected);
    }
}
