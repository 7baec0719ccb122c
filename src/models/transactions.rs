use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Clone, Debug, Serialize, FromRow)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub amount_cents: i64,
    pub external_ref: String,
    pub screenshot_url: String,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewTransaction {
    pub user_id: String,
    pub amount_cents: i64,
    pub external_ref: String,
    pub screenshot_url: String,
}

/// Pending transaction joined with the payer's identity for the admin queue.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct PendingTransaction {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_phone: String,
    pub amount_cents: i64,
    pub external_ref: String,
    pub screenshot_url: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn status(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DecisionRequest {
    pub transaction_id: String,
    pub decision: Decision,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_parses_lowercase_wire_values() {
        let approved: Decision = serde_json::from_str("\"approved\"").unwrap();
        let rejected: Decision = serde_json::from_str("\"rejected\"").unwrap();

        assert_eq!(approved, Decision::Approved);
        assert_eq!(rejected, Decision::Rejected);
        assert!(serde_json::from_str::<Decision>("\"settled\"").is_err());
    }

    #[test]
    fn decision_maps_to_terminal_status() {
        assert_eq!(Decision::Approved.status(), "approved");
        assert_eq!(Decision::Rejected.status(), "rejected");
    }
}
