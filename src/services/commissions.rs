use async_trait::async_trait;

use crate::models::users;

/// Per-level commission rates in basis points: 10%, 5%, 2%.
pub const COMMISSION_RATES_BPS: [i64; 3] = [1000, 500, 200];

/// Membership mutations the distribution walk needs. Backed by the open
/// database transaction in production and by an in-memory store in tests.
#[async_trait]
pub trait ReferralLedger: Send {
    /// Resolves a referral code to the user who owns it. `None` is a normal
    /// outcome and ends the walk.
    async fn find_upline_by_code(&mut self, code: &str)
        -> Result<Option<users::User>, anyhow::Error>;

    async fn activate_user(&mut self, user_id: &str) -> Result<(), anyhow::Error>;

    async fn credit_wallet(&mut self, user_id: &str, amount_cents: i64)
        -> Result<(), anyhow::Error>;
}

pub fn commission_cents(amount_cents: i64, rate_bps: i64) -> i64 {
    (amount_cents * rate_bps) / 10_000
}

/// Activates the payer and pays up to three uplines along the referral
/// chain. The walk is strictly linear parent-pointer traversal: a missing
/// link stops it even if deeper ancestors would be reachable another way.
pub async fn distribute<L: ReferralLedger>(
    ledger: &mut L,
    payer: &users::User,
    amount_cents: i64,
) -> Result<(), anyhow::Error> {
    ledger.activate_user(&payer.id).await?;

    let mut upline_code = payer.referred_by.clone();
    for rate_bps in COMMISSION_RATES_BPS {
        let Some(code) = upline_code else { break };
        let Some(upline) = ledger.find_upline_by_code(&code).await? else {
            break;
        };

        let commission = commission_cents(amount_cents, rate_bps);
        ledger.credit_wallet(&upline.id, commission).await?;
        log::info!(
            "Credited {} cents to user {} for payment by {}.",
            commission,
            upline.id,
            payer.id
        );

        upline_code = upline.referred_by;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MemoryLedger {
        users: Vec<users::User>,
        credits: Vec<(String, i64)>,
        activated: Vec<String>,
        fail_credits: bool,
    }

    impl MemoryLedger {
        fn with_users(users: Vec<users::User>) -> Self {
            MemoryLedger {
                users,
                ..Default::default()
            }
        }

        fn credited(&self, user_id: &str) -> i64 {
            self.credits
                .iter()
                .filter(|(id, _)| id == user_id)
                .map(|(_, cents)| cents)
                .sum()
        }
    }

    #[async_trait]
    impl ReferralLedger for MemoryLedger {
        async fn find_upline_by_code(
            &mut self,
            code: &str,
        ) -> Result<Option<users::User>, anyhow::Error> {
            Ok(self.users.iter().find(|u| u.referral_code == code).cloned())
        }

        async fn activate_user(&mut self, user_id: &str) -> Result<(), anyhow::Error> {
            self.activated.push(user_id.to_string());
            Ok(())
        }

        async fn credit_wallet(
            &mut self,
            user_id: &str,
            amount_cents: i64,
        ) -> Result<(), anyhow::Error> {
            if self.fail_credits {
                anyhow::bail!("wallet update failed");
            }
            self.credits.push((user_id.to_string(), amount_cents));
            Ok(())
        }
    }

    fn member(id: &str, referral_code: &str, referred_by: Option<&str>) -> users::User {
        users::User {
            id: id.to_string(),
            name: id.to_uppercase(),
            phone: format!("0300-{}", id),
            password_hash: String::new(),
            referral_code: referral_code.to_string(),
            referred_by: referred_by.map(str::to_string),
            status: "active".to_string(),
            wallet_balance_cents: 0,
            vip_level: 0,
            role: "user".to_string(),
            created_at: chrono::Utc::now().naive_utc(),
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn three_level_chain_pays_fixed_rates() {
        let payer = member("a", "AAAAAA", Some("BBBBBB"));
        let mut ledger = MemoryLedger::with_users(vec![
            member("b", "BBBBBB", Some("CCCCCC")),
            member("c", "CCCCCC", Some("DDDDDD")),
            member("d", "DDDDDD", Some("EEEEEE")),
            member("e", "EEEEEE", None),
        ]);

        distribute(&mut ledger, &payer, 100_000).await.unwrap();

        assert_eq!(ledger.activated, vec!["a".to_string()]);
        assert_eq!(ledger.credited("b"), 10_000);
        assert_eq!(ledger.credited("c"), 5_000);
        assert_eq!(ledger.credited("d"), 2_000);
        assert_eq!(ledger.credits.len(), 3, "nobody past level three is paid");
    }

    #[tokio::test]
    async fn short_chain_stops_after_last_upline() {
        let payer = member("a", "AAAAAA", Some("BBBBBB"));
        let mut ledger = MemoryLedger::with_users(vec![member("b", "BBBBBB", None)]);

        distribute(&mut ledger, &payer, 100_000).await.unwrap();

        assert_eq!(ledger.credited("b"), 10_000);
        assert_eq!(ledger.credits.len(), 1);
    }

    #[tokio::test]
    async fn payer_without_referrer_only_activates() {
        let payer = member("a", "AAAAAA", None);
        let mut ledger = MemoryLedger::with_users(vec![member("b", "BBBBBB", None)]);

        distribute(&mut ledger, &payer, 100_000).await.unwrap();

        assert_eq!(ledger.activated, vec!["a".to_string()]);
        assert!(ledger.credits.is_empty());
    }

    #[tokio::test]
    async fn dangling_code_ends_walk_immediately() {
        let payer = member("a", "AAAAAA", Some("GHOST1"));
        let mut ledger = MemoryLedger::with_users(vec![member("b", "BBBBBB", None)]);

        distribute(&mut ledger, &payer, 100_000).await.unwrap();

        assert!(ledger.credits.is_empty());
    }

    #[tokio::test]
    async fn dangling_link_mid_chain_skips_deeper_levels() {
        let payer = member("a", "AAAAAA", Some("BBBBBB"));
        // c exists but is only reachable through the broken link
        let mut ledger = MemoryLedger::with_users(vec![
            member("b", "BBBBBB", Some("GHOST2")),
            member("c", "CCCCCC", None),
        ]);

        distribute(&mut ledger, &payer, 100_000).await.unwrap();

        assert_eq!(ledger.credited("b"), 10_000);
        assert_eq!(ledger.credited("c"), 0);
        assert_eq!(ledger.credits.len(), 1);
    }

    #[tokio::test]
    async fn failed_credit_propagates_to_caller() {
        let payer = member("a", "AAAAAA", Some("BBBBBB"));
        let mut ledger = MemoryLedger {
            users: vec![member("b", "BBBBBB", None)],
            fail_credits: true,
            ..Default::default()
        };

        let result = distribute(&mut ledger, &payer, 100_000).await;

        assert!(result.is_err());
        assert!(ledger.credits.is_empty());
    }

    #[test]
    fn commission_truncates_toward_zero() {
        assert_eq!(commission_cents(100_000, 1000), 10_000);
        assert_eq!(commission_cents(999, 1000), 99);
        assert_eq!(commission_cents(999, 500), 49);
        assert_eq!(commission_cents(1, 200), 0);
    }
}
