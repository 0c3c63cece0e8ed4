// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use paisa_steps::engine::AccrualError;
use paisa_steps::error::AppError;

fn status_of(err: AccrualError) -> StatusCode {
    AppError::from(err).into_response().status()
}

#[test]
fn test_invalid_input_is_bad_request() {
    assert_eq!(
        status_of(AccrualError::InvalidInput("negative".to_string())),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn test_closed_earnings_are_conflicts() {
    assert_eq!(
        status_of(AccrualError::EarningClosed {
            date: "2026-07-01".to_string(),
            status: "redeemed".to_string(),
        }),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_of(AccrualError::NothingToRedeem("2026-07-01".to_string())),
        StatusCode::CONFLICT
    );
}

#[test]
fn test_phase_table_faults_are_server_errors() {
    assert_eq!(
        status_of(AccrualError::UnknownPhase(42)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_of(AccrualError::InvalidPhaseTable("empty".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_app_error_statuses() {
    assert_eq!(
        AppError::Unauthorized.into_response().status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        AppError::NotFound("x".to_string()).into_response().status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        AppError::Database("offline".to_string())
            .into_response()
            .status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_database_details_are_not_leaked() {
    let response = AppError::Database("connection string with secrets".to_string()).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_conflict_body_explains() {
    let response = AppError::from(AccrualError::EarningClosed {
        date: "2026-07-01".to_string(),
        status: "expired".to_string(),
    })
    .into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "conflict");
    assert!(body["details"].as_str().unwrap().contains("expired"));
}
