use axum::{extract::Request, middleware::Next, response::Response};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{SubscriptionPlan, UserRole};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use super::auth::AuthUser;

/// Application pool, injected once the caller is known to be a live user
#[derive(Clone)]
pub struct DbPool(pub PgPool);

/// The caller as currently stored, not as remembered by the token
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ValidatedUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub subscription_plan: SubscriptionPlan,
}

/// Middleware that loads the JWT subject from the users table.
/// Deleted accounts and role changes since the token was issued are rejected.
pub async fn validate_user_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let pool = DatabaseManager::pool().await?;

    let user = sqlx::query_as::<_, ValidatedUser>(
        r#"
        SELECT id, email, full_name, role, subscription_plan
        FROM users
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(auth_user.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| {
        tracing::warn!(user_id = %auth_user.user_id, "User validation failed: account not found or deleted");
        ApiError::unauthorized("User account is not active")
    })?;

    if user.role != auth_user.role {
        tracing::warn!(
            user_id = %user.id,
            token_role = auth_user.role.as_str(),
            stored_role = user.role.as_str(),
            "User validation failed: role changed since token was issued"
        );
        return Err(ApiError::forbidden("User access level mismatch"));
    }

    tracing::debug!(user_id = %user.id, role = user.role.as_str(), "User validation successful");

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(DbPool(pool));

    Ok(next.run(request).await)
}
