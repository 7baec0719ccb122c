use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Clone, Debug, Serialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub referral_code: String,
    pub referred_by: Option<String>,
    pub status: String,
    pub wallet_balance_cents: i64,
    pub vip_level: i32,
    pub role: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub phone: String,
    pub password: String,
    pub referred_by: Option<String>,
}

#[derive(Clone, Debug, Serialize, FromRow)]
pub struct TeamMember {
    pub name: String,
    pub phone: String,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Serialize)]
pub struct Profile {
    pub name: String,
    pub phone: String,
    pub referral_code: String,
    pub status: String,
    pub wallet_balance_cents: i64,
    pub vip_level: i32,
    pub role: String,
    pub team_count: usize,
    pub team_members: Vec<TeamMember>,
}
