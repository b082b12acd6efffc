use crate::database::DatabaseManager;
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth_service::{AuthResponse, LoginRequest, RegisterRequest};
use crate::services::AuthService;

/// POST /auth/register - Create an owner account on the trial plan
///
/// Input: `{"email", "password", "fullName"}`. Returns `{token, expiresIn, user}` with 201.
pub async fn register(ApiJson(request): ApiJson<RegisterRequest>) -> ApiResult<AuthResponse> {
    request.validate()?;
    let pool = DatabaseManager::pool().await?;
    let response = AuthService::new(pool).register(request).await?;
    Ok(ApiResponse::created(response))
}

/// POST /auth/login - Exchange credentials for a JWT
pub async fn login(ApiJson(request): ApiJson<LoginRequest>) -> ApiResult<AuthResponse> {
    request.validate()?;
    let pool = DatabaseManager::pool().await?;
    let response = AuthService::new(pool).login(request).await?;
    Ok(ApiResponse::success(response))
}
