use crate::models::users;
use crate::services::commissions::ReferralLedger;
use crate::utils;

use anyhow::bail;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const CODE_GENERATION_ATTEMPTS: usize = 8;

#[derive(Clone)]
pub struct UserRepository {
    conn: PgPool,
}

impl UserRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn insert_user(
        &self,
        name: &str,
        phone: &str,
        password_hash: &str,
        referred_by: Option<String>,
    ) -> Result<users::User, anyhow::Error> {
        let user_id = Uuid::new_v4().hyphenated().to_string();
        let referral_code = self.mint_referral_code().await?;

        let user = sqlx::query_as::<_, users::User>(
            r#"
                INSERT INTO users (id, name, phone, password_hash, referral_code, referred_by)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            "#,
        )
        .bind(&user_id)
        .bind(name)
        .bind(phone)
        .bind(password_hash)
        .bind(&referral_code)
        .bind(&referred_by)
        .fetch_one(&self.conn)
        .await?;

        Ok(user)
    }

    async fn mint_referral_code(&self) -> Result<String, anyhow::Error> {
        for _ in 0..CODE_GENERATION_ATTEMPTS {
            let candidate = utils::referral_code();
            if self.find_by_referral_code(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }

        // short space kept colliding, switch to the larger one
        Ok(utils::fallback_referral_code())
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<users::User>, anyhow::Error> {
        let user = sqlx::query_as::<_, users::User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<users::User>, anyhow::Error> {
        let user = sqlx::query_as::<_, users::User>("SELECT * FROM users WHERE phone = $1")
            .bind(phone)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn find_by_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<users::User>, anyhow::Error> {
        let user = sqlx::query_as::<_, users::User>("SELECT * FROM users WHERE referral_code = $1")
            .bind(code)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn list_members(&self) -> Result<Vec<users::User>, anyhow::Error> {
        let members = sqlx::query_as::<_, users::User>(
            "SELECT * FROM users WHERE role = 'user' ORDER BY created_at DESC",
        )
        .fetch_all(&self.conn)
        .await?;

        Ok(members)
    }

    pub async fn team_members(
        &self,
        referral_code: &str,
    ) -> Result<Vec<users::TeamMember>, anyhow::Error> {
        let members = sqlx::query_as::<_, users::TeamMember>(
            r#"
                SELECT name, phone, status, created_at
                FROM users
                WHERE referred_by = $1
                ORDER BY created_at DESC
            "#,
        )
        .bind(referral_code)
        .fetch_all(&self.conn)
        .await?;

        Ok(members)
    }
}

/// `ReferralLedger` backed by the approval's open database transaction, so
/// the status flip and every wallet credit commit or roll back together.
pub struct PgReferralLedger<'a, 'c> {
    db: &'a mut sqlx::Transaction<'c, sqlx::Postgres>,
}

impl<'a, 'c> PgReferralLedger<'a, 'c> {
    pub fn new(db: &'a mut sqlx::Transaction<'c, sqlx::Postgres>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReferralLedger for PgReferralLedger<'_, '_> {
    async fn find_upline_by_code(
        &mut self,
        code: &str,
    ) -> Result<Option<users::User>, anyhow::Error> {
        let user = sqlx::query_as::<_, users::User>("SELECT * FROM users WHERE referral_code = $1")
            .bind(code)
            .fetch_optional(&mut **self.db)
            .await?;

        Ok(user)
    }

    async fn activate_user(&mut self, user_id: &str) -> Result<(), anyhow::Error> {
        let result = sqlx::query(
            "UPDATE users SET status = 'active', updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(user_id)
        .execute(&mut **self.db)
        .await?;

        if result.rows_affected() == 0 {
            bail!("User not found: {}", user_id)
        }

        Ok(())
    }

    async fn credit_wallet(
        &mut self,
        user_id: &str,
        amount_cents: i64,
    ) -> Result<(), anyhow::Error> {
        // atomic increment, not read-modify-write
        sqlx::query(
            r#"
                UPDATE users
                SET wallet_balance_cents = wallet_balance_cents + $1,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = $2
            "#,
        )
        .bind(amount_cents)
        .bind(user_id)
        .execute(&mut **self.db)
        .await?;

        Ok(())
    }
}
