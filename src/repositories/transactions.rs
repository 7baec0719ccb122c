use crate::models::transactions;

use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct TransactionRepository {
    conn: PgPool,
}

impl TransactionRepository {
    pub fn new(conn: PgPool) -> Self {
        TransactionRepository { conn }
    }

    pub async fn insert_transaction(
        &self,
        user_id: &str,
        amount_cents: i64,
        external_ref: &str,
        screenshot_url: &str,
    ) -> Result<transactions::Transaction, anyhow::Error> {
        let transaction_id = Uuid::new_v4().hyphenated().to_string();

        let transaction = sqlx::query_as::<_, transactions::Transaction>(
            r#"
                INSERT INTO transactions
                (id, user_id, amount_cents, external_ref, screenshot_url, status)
                VALUES ($1, $2, $3, $4, $5, 'pending')
                RETURNING *
            "#,
        )
        .bind(&transaction_id)
        .bind(user_id)
        .bind(amount_cents)
        .bind(external_ref)
        .bind(screenshot_url)
        .fetch_one(&self.conn)
        .await?;

        Ok(transaction)
    }

    pub async fn find_by_id(
        &self,
        id: &str,
    ) -> Result<Option<transactions::Transaction>, anyhow::Error> {
        let transaction =
            sqlx::query_as::<_, transactions::Transaction>("SELECT * FROM transactions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.conn)
                .await?;

        Ok(transaction)
    }

    pub async fn find_by_external_ref(
        &self,
        external_ref: &str,
    ) -> Result<Option<transactions::Transaction>, anyhow::Error> {
        let transaction = sqlx::query_as::<_, transactions::Transaction>(
            "SELECT * FROM transactions WHERE external_ref = $1",
        )
        .bind(external_ref)
        .fetch_optional(&self.conn)
        .await?;

        Ok(transaction)
    }

    pub async fn list_pending(
        &self,
    ) -> Result<Vec<transactions::PendingTransaction>, anyhow::Error> {
        let pending = sqlx::query_as::<_, transactions::PendingTransaction>(
            r#"
                SELECT t.id, t.user_id, u.name AS user_name, u.phone AS user_phone,
                       t.amount_cents, t.external_ref, t.screenshot_url, t.created_at
                FROM transactions t
                JOIN users u ON u.id = t.user_id
                WHERE t.status = 'pending'
                ORDER BY t.created_at DESC
            "#,
        )
        .fetch_all(&self.conn)
        .await?;

        Ok(pending)
    }

    /// Settles a pending transaction into a terminal status. The status
    /// guard lives in the UPDATE itself, so two concurrent decisions for
    /// the same transaction cannot both pass it; `None` means the row is
    /// missing or already terminal.
    pub async fn settle_pending(
        &self,
        db: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: &str,
        status: &str,
    ) -> Result<Option<transactions::Transaction>, anyhow::Error> {
        let transaction = sqlx::query_as::<_, transactions::Transaction>(
            r#"
                UPDATE transactions
                SET status = $1, updated_at = CURRENT_TIMESTAMP
                WHERE id = $2 AND status = 'pending'
                RETURNING *
            "#,
        )
        .bind(status)
        .bind(id)
        .fetch_optional(&mut **db)
        .await?;

        Ok(transaction)
    }
}
