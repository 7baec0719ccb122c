use sha2::{Digest, Sha256};
use uuid::Uuid;

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const REFERRAL_CODE_LEN: usize = 6;
pub const FALLBACK_CODE_LEN: usize = 12;

/// Mints a 6-character uppercase alphanumeric referral code.
pub fn referral_code() -> String {
    code_of_len(REFERRAL_CODE_LEN)
}

/// Longer code from the same charset, used once the short space keeps
/// colliding.
pub fn fallback_referral_code() -> String {
    code_of_len(FALLBACK_CODE_LEN)
}

fn code_of_len(len: usize) -> String {
    let mut code = String::with_capacity(len);

    while code.len() < len {
        for byte in Uuid::new_v4().as_bytes() {
            if code.len() == len {
                break;
            }
            code.push(CODE_CHARSET[*byte as usize % CODE_CHARSET.len()] as char);
        }
    }

    code
}

/// Salted digest stored as `salt$hex`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

pub fn verify_password(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());

    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_code_is_six_uppercase_alphanumerics() {
        let code = referral_code();

        assert_eq!(code.len(), REFERRAL_CODE_LEN);
        assert!(code.bytes().all(|b| CODE_CHARSET.contains(&b)));
    }

    #[test]
    fn fallback_code_uses_larger_space() {
        let code = fallback_referral_code();

        assert_eq!(code.len(), FALLBACK_CODE_LEN);
        assert!(code.bytes().all(|b| CODE_CHARSET.contains(&b)));
    }

    #[test]
    fn password_round_trips_through_salted_digest() {
        let stored = hash_password("hunter2");

        assert!(verify_password(&stored, "hunter2"));
        assert!(!verify_password(&stored, "hunter3"));
    }

    #[test]
    fn same_password_hashes_differently_per_user() {
        assert_ne!(hash_password("hunter2"), hash_password("hunter2"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("not-a-salted-hash", "hunter2"));
    }
}
