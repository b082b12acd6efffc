use axum::Extension;
use uuid::Uuid;

use crate::database::models::Invitation;
use crate::handlers::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult, DbPool, ValidatedUser};
use crate::services::invitation_service::{InvitationFilters, InvitationIssued, InviteTenantRequest};
use crate::services::InvitationService;

/// GET /api/invitations?status= - Newest first; lapsed rows read as EXPIRED
pub async fn list(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiQuery(filters): ApiQuery<InvitationFilters>,
) -> ApiResult<Vec<Invitation>> {
    let invitations = InvitationService::new(pool).list(user.id, filters).await?;
    Ok(ApiResponse::success(invitations))
}

/// POST /api/invitations - Invite a tenant onto the platform
///
/// Input: `{"email", "firstName", "lastName", "phone"?, "propertyId"?, "unitId"?, "leaseId"?}`.
/// Returns `{invitationId, tenantId, email, status, expiresAt, invitationUrl}` with 201.
pub async fn create(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiJson(request): ApiJson<InviteTenantRequest>,
) -> ApiResult<InvitationIssued> {
    let issued = InvitationService::new(pool).invite(user.id, request).await?;
    crate::audit!(owner_id = %user.id, invitation_id = %issued.invitation_id, "Invitation sent");
    Ok(ApiResponse::created(issued))
}

/// POST /api/invitations/:id/resend - New code and expiry
pub async fn resend(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<InvitationIssued> {
    let issued = InvitationService::new(pool).resend(user.id, id).await?;
    Ok(ApiResponse::success(issued))
}

/// POST /api/invitations/:id/cancel
pub async fn cancel(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Invitation> {
    let invitation = InvitationService::new(pool).cancel(user.id, id).await?;
    Ok(ApiResponse::success(invitation))
}
