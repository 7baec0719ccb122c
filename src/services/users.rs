use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::{models::users, repositories::users::UserRepository, utils};

pub enum UserRequest {
    Register {
        name: String,
        phone: String,
        password: String,
        referred_by: Option<String>,
        response: oneshot::Sender<Result<String, ServiceError>>,
    },
    GetProfile {
        user_id: String,
        response: oneshot::Sender<Result<users::Profile, ServiceError>>,
    },
    ListMembers {
        caller_id: String,
        response: oneshot::Sender<Result<Vec<users::User>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct UserRequestHandler {
    repository: UserRepository,
}

impl UserRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        let repository = UserRepository::new(sql_conn);

        UserRequestHandler { repository }
    }

    async fn register(
        &self,
        name: &str,
        phone: &str,
        password: &str,
        referred_by: Option<String>,
    ) -> Result<String, ServiceError> {
        let name = name.trim();
        let phone = phone.trim();

        if name.is_empty() || phone.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "name, phone and password are required".to_string(),
            ));
        }

        let existing = self
            .repository
            .find_by_phone(phone)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "phone number already registered".to_string(),
            ));
        }

        let referred_by = match referred_by.filter(|code| !code.trim().is_empty()) {
            Some(code) => {
                let code = code.trim().to_uppercase();
                let upline = self
                    .repository
                    .find_by_referral_code(&code)
                    .await
                    .map_err(|e| ServiceError::Database(e.to_string()))?;

                match upline {
                    Some(upline) => Some(upline.referral_code),
                    None => {
                        return Err(ServiceError::Validation(format!(
                            "unknown referral code: {}",
                            code
                        )))
                    }
                }
            }
            None => None,
        };

        let password_hash = utils::hash_password(password);
        let user = self
            .repository
            .insert_user(name, phone, &password_hash, referred_by)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        log::info!(
            "Registered user {} with referral code {}.",
            user.id,
            user.referral_code
        );
        Ok(user.referral_code)
    }

    async fn get_profile(&self, user_id: &str) -> Result<users::Profile, ServiceError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .ok_or_else(|| ServiceError::NotFound("user not found".to_string()))?;

        let team_members = self
            .repository
            .team_members(&user.referral_code)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        Ok(users::Profile {
            name: user.name,
            phone: user.phone,
            referral_code: user.referral_code,
            status: user.status,
            wallet_balance_cents: user.wallet_balance_cents,
            vip_level: user.vip_level,
            role: user.role,
            team_count: team_members.len(),
            team_members,
        })
    }

    async fn list_members(&self, caller_id: &str) -> Result<Vec<users::User>, ServiceError> {
        self.require_admin(caller_id).await?;

        self.repository
            .list_members()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn require_admin(&self, caller_id: &str) -> Result<(), ServiceError> {
        let caller = self
            .repository
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
impl RequestHandler<UserRequest> for UserRequestHandler {
    async fn handle_request(&self, request: UserRequest) {
        match request {
            UserRequest::Register {
                name,
                phone,
                password,
                referred_by,
                response,
            } => {
                let result = self.register(&name, &phone, &password, referred_by).await;
                let _ = response.send(result);
            }
            UserRequest::GetProfile { user_id, response } => {
                let result = self.get_profile(&user_id).await;
                let _ = response.send(result);
            }
            UserRequest::ListMembers {
                caller_id,
                response,
            } => {
                let result = self.list_members(&caller_id).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct UserService;

impl UserService {
    pub fn new() -> Self {
        UserService {}
    }
}

#[async_trait]
impl Service<UserRequest, UserRequestHandler> for UserService {}
