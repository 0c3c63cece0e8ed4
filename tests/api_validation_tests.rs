// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.
//!
//! Every case here must be rejected before the database is touched; the
//! offline mock would otherwise turn them into 500s.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Utc};
use tower::ServiceExt;

mod common;

async fn post_steps(body: &str) -> StatusCode {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("walker", &state.config.jwt_signing_key);

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/steps")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
    .status()
}

#[tokio::test]
async fn test_negative_steps_rejected() {
    assert_eq!(post_steps(r#"{"steps": -5}"#).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fractional_steps_rejected() {
    assert_eq!(
        post_steps(r#"{"steps": 100.5}"#).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_large_step_count_accepted() {
    // Past validation, so the offline database answers
    assert_eq!(
        post_steps(r#"{"steps": 5000000}"#).await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_unrepresentable_step_count_rejected() {
    assert_eq!(
        post_steps(r#"{"steps": 1e300}"#).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_invalid_date_format() {
    assert_eq!(
        post_steps(r#"{"steps": 100, "date": "15/06/2026"}"#).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        post_steps(r#"{"steps": 100, "date": "2026-13-01"}"#).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_future_date_rejected() {
    let tomorrow = (Utc::now() + Duration::days(2)).date_naive();
    let body = format!(r#"{{"steps": 100, "date": "{}"}}"#, tomorrow);
    assert_eq!(post_steps(&body).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_date_outside_window_rejected() {
    let long_ago = (Utc::now() - Duration::days(30)).date_naive();
    let body = format!(r#"{{"steps": 100, "date": "{}"}}"#, long_ago);
    assert_eq!(post_steps(&body).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_valid_sync_reaches_database() {
    assert_eq!(
        post_steps(r#"{"steps": 8000}"#).await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_redeem_invalid_date() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("walker", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/earnings/not-a-date/redeem")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_phase_table_body() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/phases")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["rules"]["max_daily_steps"], 12_000);
    assert_eq!(body["rules"]["steps_per_unit"], 25);
    let phases = body["phases"].as_array().unwrap();
    assert_eq!(phases.len(), 9);
    assert_eq!(phases[0]["name"], "Paisa");
    assert_eq!(phases[8]["name"], "Immortal");
}
