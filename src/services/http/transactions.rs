use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use super::{caller_id, error_response};
use crate::models::transactions::{DecisionRequest, NewTransaction};
use crate::services::transactions::TransactionServiceRequest;

pub async fn submit(
    State(state): State<super::AppState>,
    headers: HeaderMap,
    Json(req): Json<NewTransaction>,
) -> impl IntoResponse {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let (transaction_tx, transaction_rx) = oneshot::channel();
    let send_result = state
        .transaction_channel
        .send(TransactionServiceRequest::Submit {
            caller_id: caller,
            user_id: req.user_id,
            amount_cents: req.amount_cents,
            external_ref: req.external_ref,
            screenshot_url: req.screenshot_url,
            response: transaction_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Failed to process request: {}", e) })),
        );
    }

    match transaction_rx.await {
        Ok(Ok(transaction)) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Transaction submitted successfully",
                "id": transaction.id
            })),
        ),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Failed to receive response: {}", e) })),
        ),
    }
}

pub async fn list_pending(
    State(state): State<super::AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let (transaction_tx, transaction_rx) = oneshot::channel();
    let send_result = state
        .transaction_channel
        .send(TransactionServiceRequest::ListPending {
            caller_id: caller,
            response: transaction_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Failed to process request: {}", e) })),
        );
    }

    match transaction_rx.await {
        Ok(Ok(pending)) => (StatusCode::OK, Json(json!(pending))),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Failed to receive response: {}", e) })),
        ),
    }
}

pub async fn decide(
    State(state): State<super::AppState>,
    headers: HeaderMap,
    Json(req): Json<DecisionRequest>,
) -> impl IntoResponse {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let decision = req.decision;
    let (transaction_tx, transaction_rx) = oneshot::channel();
    let send_result = state
        .transaction_channel
        .send(TransactionServiceRequest::Decide {
            caller_id: caller,
            transaction_id: req.transaction_id,
            decision,
            response: transaction_tx,
        })
        .await;
    if let Err(e) = send_result {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Failed to process request: {}", e) })),
        );
    }

    match transaction_rx.await {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(json!({ "message": format!("Transaction {}", decision.status()) })),
        ),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": format!("Failed to receive response: {}", e) })),
        ),
    }
}
