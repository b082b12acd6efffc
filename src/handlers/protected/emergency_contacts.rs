use axum::Extension;
use uuid::Uuid;

use crate::database::models::EmergencyContact;
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, DbPool, ValidatedUser};
use crate::services::emergency_contact_service::{CreateEmergencyContactRequest, UpdateEmergencyContactRequest};
use crate::services::EmergencyContactService;

/// GET /api/tenants/:id/emergency-contact - `data` is null when none is on file
pub async fn get(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(tenant_id): ApiPath<Uuid>,
) -> ApiResult<Option<EmergencyContact>> {
    let contact = EmergencyContactService::new(pool).get(user.id, tenant_id).await?;
    Ok(ApiResponse::success(contact))
}

/// POST /api/tenants/:id/emergency-contact
pub async fn create(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(tenant_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateEmergencyContactRequest>,
) -> ApiResult<EmergencyContact> {
    let contact = EmergencyContactService::new(pool).create(user.id, tenant_id, request).await?;
    Ok(ApiResponse::created(contact))
}

/// PATCH /api/tenants/:id/emergency-contact
pub async fn update(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(tenant_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateEmergencyContactRequest>,
) -> ApiResult<EmergencyContact> {
    let contact = EmergencyContactService::new(pool).update(user.id, tenant_id, request).await?;
    Ok(ApiResponse::success(contact))
}

/// DELETE /api/tenants/:id/emergency-contact
pub async fn delete(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(tenant_id): ApiPath<Uuid>,
) -> ApiResult<()> {
    EmergencyContactService::new(pool).delete(user.id, tenant_id).await?;
    Ok(ApiResponse::no_content())
}
