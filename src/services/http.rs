use axum::{
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use super::transactions::TransactionServiceRequest;
use super::users::UserRequest;
use super::ServiceError;

mod transactions;
mod users;

#[derive(Clone)]
struct AppState {
    user_channel: mpsc::Sender<UserRequest>,
    transaction_channel: mpsc::Sender<TransactionServiceRequest>,
}

fn error_response(error: ServiceError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &error {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(json!({ "message": error.to_string() })))
}

/// The session layer in front of this service resolves the caller and
/// forwards their id in `x-user-id`; role checks stay in the services.
fn caller_id(headers: &HeaderMap) -> Result<String, (StatusCode, Json<serde_json::Value>)> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Unauthorized" })),
        ))
}

pub async fn start_http_server(
    listen: &str,
    user_channel: mpsc::Sender<UserRequest>,
    transaction_channel: mpsc::Sender<TransactionServiceRequest>,
) -> Result<(), anyhow::Error> {
    let app_state = AppState {
        user_channel,
        transaction_channel,
    };

    let app = Router::new()
        .route("/register", post(users::register))
        .route("/users/me", get(users::profile))
        .route("/admin/users", get(users::list_members))
        .route("/transactions", post(transactions::submit))
        .route("/admin/transactions", get(transactions::list_pending))
        .route("/admin/approve", post(transactions::decide))
        .route("/health", get(|| async { "OK" }))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(listen).await?;
    println!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
