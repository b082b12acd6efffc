use crate::database::DatabaseManager;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth_service::AuthResponse;
use crate::services::invitation_service::{check_code, AcceptInvitationRequest, InvitationPreview};
use crate::services::InvitationService;

/// GET /invitations/:code - Preview an invitation before accepting it
pub async fn validate(ApiPath(code): ApiPath<String>) -> ApiResult<InvitationPreview> {
    check_code(&code)?;
    let pool = DatabaseManager::pool().await?;
    let preview = InvitationService::new(pool).validate(&code).await?;
    Ok(ApiResponse::success(preview))
}

/// POST /invitations/:code/accept - Create the tenant's platform account
///
/// Input: `{"password", "fullName"?}`. Returns `{token, expiresIn, user}` with 201.
pub async fn accept(
    ApiPath(code): ApiPath<String>,
    ApiJson(request): ApiJson<AcceptInvitationRequest>,
) -> ApiResult<AuthResponse> {
    check_code(&code)?;
    let pool = DatabaseManager::pool().await?;
    let response = InvitationService::new(pool).accept(&code, request).await?;
    Ok(ApiResponse::created(response))
}
