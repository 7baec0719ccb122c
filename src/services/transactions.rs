use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{commissions, RequestHandler, Service, ServiceError};
use crate::models::transactions::{self, Decision};
use crate::repositories::transactions::TransactionRepository;
use crate::repositories::users::{PgReferralLedger, UserRepository};

pub enum TransactionServiceRequest {
    Submit {
        caller_id: String,
        user_id: String,
        amount_cents: i64,
        external_ref: String,
        screenshot_url: String,
        response: oneshot::Sender<Result<transactions::Transaction, ServiceError>>,
    },
    ListPending {
        caller_id: String,
        response: oneshot::Sender<Result<Vec<transactions::PendingTransaction>, ServiceError>>,
    },
    Decide {
        caller_id: String,
        transaction_id: String,
        decision: Decision,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
}

#[derive(Clone)]
pub struct TransactionRequestHandler {
    pool: PgPool,
    repository: TransactionRepository,
    users: UserRepository,
}

impl TransactionRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        let repository = TransactionRepository::new(sql_conn.clone());
        let users = UserRepository::new(sql_conn.clone());

        TransactionRequestHandler {
            pool: sql_conn,
            repository,
            users,
        }
    }

    async fn submit(
        &self,
        caller_id: &str,
        user_id: &str,
        amount_cents: i64,
        external_ref: &str,
        screenshot_url: &str,
    ) -> Result<transactions::Transaction, ServiceError> {
        self.require_registered(caller_id).await?;

        if user_id.trim().is_empty()
            || external_ref.trim().is_empty()
            || screenshot_url.trim().is_empty()
        {
            return Err(ServiceError::Validation(
                "user_id, external_ref and screenshot_url are required".to_string(),
            ));
        }
        if amount_cents <= 0 {
            return Err(ServiceError::Validation(
                "amount must be positive".to_string(),
            ));
        }

        let payer = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;
        if payer.is_none() {
            return Err(ServiceError::NotFound("user not found".to_string()));
        }

        let existing = self
            .repository
            .find_by_external_ref(external_ref.trim())
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "this payment reference has already been submitted".to_string(),
            ));
        }

        let transaction = self
            .repository
            .insert_transaction(user_id, amount_cents, external_ref.trim(), screenshot_url)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        log::info!(
            "Recorded pending transaction {} for user {}.",
            transaction.id,
            user_id
        );
        Ok(transaction)
    }

    async fn list_pending(
        &self,
        caller_id: &str,
    ) -> Result<Vec<transactions::PendingTransaction>, ServiceError> {
        self.require_admin(caller_id).await?;

        self.repository
            .list_pending()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    /// Settles the transaction and, on approval, activates the payer and
    /// distributes commissions. Status flip, activation and credits share
    /// one database transaction.
    async fn decide(
        &self,
        caller_id: &str,
        transaction_id: &str,
        decision: Decision,
    ) -> Result<(), ServiceError> {
        self.require_admin(caller_id).await?;

        let mut db = self
            .pool
            .begin()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        let settled = self
            .repository
            .settle_pending(&mut db, transaction_id, decision.status())
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        let transaction = match settled {
            Some(transaction) => transaction,
            None => {
                // CAS miss: tell an unknown id apart from a processed one
                let existing = self
                    .repository
                    .find_by_id(transaction_id)
                    .await
                    .map_err(|e| ServiceError::Database(e.to_string()))?;

                return match existing {
                    None => Err(ServiceError::NotFound("transaction not found".to_string())),
                    Some(_) => Err(ServiceError::Conflict(
                        "transaction already processed".to_string(),
                    )),
                };
            }
        };

        if decision == Decision::Approved {
            let payer = self
                .users
                .find_by_id(&transaction.user_id)
                .await
                .map_err(|e| ServiceError::Database(e.to_string()))?
                .ok_or_else(|| ServiceError::NotFound("payer not found".to_string()))?;

            let mut ledger = PgReferralLedger::new(&mut db);
            commissions::distribute(&mut ledger, &payer, transaction.amount_cents)
                .await
                .map_err(|e| ServiceError::Database(e.to_string()))?;
        }

        db.commit()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        log::info!("Transaction {} {}.", transaction_id, decision.status());
        Ok(())
    }

    async fn require_registered(&self, caller_id: &str) -> Result<(), ServiceError> {
        let caller = self
            .users
            .find_by_id(caller_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        match caller {
            Some(_) => Ok(()),
            None => Err(ServiceError::Unauthorized("unknown caller".to_string())),
        }
    }

    async fn require_admin(&self, caller_id: &str) -> Result<(), ServiceError> {
        let caller = self
            .users
            .find_by_id(caller_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        match caller {
            Some(user) if user.role == "admin" => Ok(()),
            Some(_) => Err(ServiceError::Unauthorized(
                "administrator capability required".to_string(),
            )),
            None => Err(ServiceError::Unauthorized("unknown caller".to_string())),
        }
    }
}

#[async_trait]
impl RequestHandler<TransactionServiceRequest> for TransactionRequestHandler {
    async fn handle_request(&self, request: TransactionServiceRequest) {
        match request {
            TransactionServiceRequest::Submit {
                caller_id,
                user_id,
                amount_cents,
                external_ref,
                screenshot_url,
                response,
            } => {
                let result = self
                    .submit(
                        &caller_id,
                        &user_id,
                        amount_cents,
                        &external_ref,
                        &screenshot_url,
                    )
                    .await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::ListPending {
                caller_id,
                response,
            } => {
                let result = self.list_pending(&caller_id).await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::Decide {
                caller_id,
                transaction_id,
                decision,
                response,
            } => {
                let result = self.decide(&caller_id, &transaction_id, decision).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct TransactionService;

impl TransactionService {
    pub fn new() -> Self {
        TransactionService {}
    }
}

#[async_trait]
impl Service<TransactionServiceRequest, TransactionRequestHandler> for TransactionService {}
