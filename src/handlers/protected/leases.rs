use axum::Extension;
use uuid::Uuid;

use crate::database::models::{Lease, LeaseWithRelations};
use crate::handlers::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult, DbPool, ValidatedUser};
use crate::services::lease_service::{
    CreateLeaseRequest, ExpiringQuery, LeaseFilters, TerminateLeaseRequest, UpdateLeaseRequest,
};
use crate::services::{LeaseService, Paginated};

/// GET /api/leases?status=&unitId=&propertyId=&tenantId=
pub async fn list(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiQuery(filters): ApiQuery<LeaseFilters>,
) -> ApiResult<Paginated<LeaseWithRelations>> {
    let page = LeaseService::new(pool).list(user.id, filters).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/leases/expiring?withinDays=30
pub async fn expiring(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiQuery(query): ApiQuery<ExpiringQuery>,
) -> ApiResult<Vec<LeaseWithRelations>> {
    let leases = LeaseService::new(pool).expiring(user.id, query).await?;
    Ok(ApiResponse::success(leases))
}

/// GET /api/leases/:id
pub async fn get(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<LeaseWithRelations> {
    let lease = LeaseService::new(pool).get(user.id, id).await?;
    Ok(ApiResponse::success(lease))
}

/// POST /api/leases
pub async fn create(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiJson(request): ApiJson<CreateLeaseRequest>,
) -> ApiResult<Lease> {
    let lease = LeaseService::new(pool).create(user.id, request).await?;
    Ok(ApiResponse::created(lease))
}

/// PATCH /api/leases/:id - DRAFT and ACTIVE leases only
pub async fn update(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateLeaseRequest>,
) -> ApiResult<Lease> {
    let lease = LeaseService::new(pool).update(user.id, id, request).await?;
    Ok(ApiResponse::success(lease))
}

/// POST /api/leases/:id/terminate
pub async fn terminate(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<TerminateLeaseRequest>,
) -> ApiResult<Lease> {
    let lease = LeaseService::new(pool).terminate(user.id, id, request).await?;
    Ok(ApiResponse::success(lease))
}
