use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{self, Claims};
use crate::config;
use crate::database::models::{User, UserProfile, UserRole};

use super::validation::{normalize_email, FieldErrors};
use super::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: u64,
    pub user: UserProfile,
}

pub(crate) const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, role, subscription_plan, created_at, updated_at, deleted_at";

impl RegisterRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        let mut errors = FieldErrors::default();
        errors.email("email", &self.email);
        errors.password("password", &self.password, config::config().security.min_password_length);
        errors.length("fullName", &self.full_name, 1, 100);
        errors.into_result()
    }
}

impl LoginRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        let mut errors = FieldErrors::default();
        errors.length("email", &self.email, 1, 254);
        errors.length("password", &self.password, 1, 1024);
        errors.into_result()
    }
}

/// Issue a signed token for `user`
pub fn issue_token(user: &User) -> ServiceResult<AuthResponse> {
    let claims = Claims::new(user.id, user.email.clone(), user.role);
    let token = auth::generate_jwt(&claims).map_err(|e| ServiceError::Internal(e.to_string()))?;
    Ok(AuthResponse {
        token,
        expires_in: config::config().security.jwt_expiry_hours * 3600,
        user: UserProfile::from(user),
    })
}

pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an OWNER account on the trial plan and sign it in
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<AuthResponse> {
        request.validate()?;
        let email = normalize_email(&request.email);

        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::conflict("An account with this email already exists"));
        }

        let password_hash = auth::hash_password(&request.password).map_err(ServiceError::Internal)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, full_name, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&email)
        .bind(&password_hash)
        .bind(request.full_name.trim())
        .bind(UserRole::Owner)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = %user.id, "Registered owner account");
        issue_token(&user)
    }

    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        request.validate()?;
        let email = normalize_email(&request.email);
        let invalid = || ServiceError::Unauthorized("Invalid email or password".to_string());

        let user = self.find_by_email(&email).await?.ok_or_else(invalid)?;
        let verified = auth::verify_password(&user.password_hash, &request.password).map_err(|e| {
            tracing::error!(user_id = %user.id, "Stored password hash unreadable: {}", e);
            invalid()
        })?;
        if !verified {
            tracing::warn!(user_id = %user.id, "Failed login attempt");
            return Err(invalid());
        }

        issue_token(&user)
    }

    pub async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
