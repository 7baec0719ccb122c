use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::settings::Settings;

pub mod commissions;
mod http;
mod transactions;
mod users;

#[derive(Debug, thiserror::Error)]
enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Database error: {0}")]
    Database(String),
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(pool: PgPool, settings: Settings) -> Result<(), anyhow::Error> {
    let (user_tx, mut user_rx) = mpsc::channel(512);
    let (transaction_tx, mut transaction_rx) = mpsc::channel(512);

    let mut user_service = users::UserService::new();
    let mut transaction_service = transactions::TransactionService::new();

    println!("[*] Starting user service.");
    let user_pool_clone = pool.clone();
    tokio::spawn(async move {
        user_service
            .run(users::UserRequestHandler::new(user_pool_clone), &mut user_rx)
            .await;
    });

    println!("[*] Starting transaction service.");
    let transaction_pool_clone = pool.clone();
    tokio::spawn(async move {
        transaction_service
            .run(
                transactions::TransactionRequestHandler::new(transaction_pool_clone),
                &mut transaction_rx,
            )
            .await;
    });

    println!("[*] Starting HTTP server.");
    http::start_http_server(&settings.server.listen, user_tx, transaction_tx).await?;

    Ok(())
}
