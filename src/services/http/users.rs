use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use super::{caller_id, error_response};
use crate::models::users::NewUser;
use crate::services::users::UserRequest;

pub async fn register(
    State(state): State<super::AppState>,
    Json(req): Json<NewUser>,
) -> impl IntoResponse {
    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .user_channel
        .send(UserRequest::Register {
            name: req.name,
            phone: req.phone,
            password: req.password,
            referred_by: req.referred_by,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Failed to process request: {}", e) })),
        );
    }

    match user_rx.await {
        Ok(Ok(referral_code)) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "User registered successfully",
                "referral_code": referral_code
            })),
        ),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Failed to receive response: {}", e) })),
        ),
    }
}

pub async fn profile(
    State(state): State<super::AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user_id = match caller_id(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let (user_tx, user_rx) = oneshot::channel();
    let send_result = state
        .user_channel
        .send(UserRequest::GetProfile {
            user_id,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Failed to process request: {}", e) })),
        );
    }

    match user_rx.await {
        Ok(Ok(profile)) => (StatusCode::OK, Json(json!(profile))),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Failed to receive response: {}", e) })),
        ),
    }
}

pub async fn list_members(
    State(state): State<super::AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let (user_tx, user_rx) = oneshot::channel();
    let send_result = state
        .user_channel
        .send(UserRequest::ListMembers {
            caller_id: caller,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Failed to process request: {}", e) })),
        );
    }

    match user_rx.await {
        Ok(Ok(members)) => (StatusCode::OK, Json(json!(members))),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Failed to receive response: {}", e) })),
        ),
    }
}
