use axum::Extension;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{LeaseWithRelations, Tenant, TenantWithCurrentLease};
use crate::handlers::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult, DbPool, ValidatedUser};
use crate::services::tenant_query_service::{TenantDetail, TenantFilters};
use crate::services::tenant_service::{CreateTenantRequest, MoveOutRequest, UpdateTenantRequest};
use crate::services::tenant_stats_service::TenantStats;
use crate::services::{LeaseService, Paginated, TenantQueryService, TenantService, TenantStatsService};

#[derive(Debug, Default, Deserialize)]
pub struct TenantViewQuery {
    /// `basic` returns the bare tenant row instead of the flattened detail
    pub view: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TenantView {
    Basic(Tenant),
    Detail(Box<TenantDetail>),
}

/// GET /api/tenants - Filtered, sorted, paginated list
pub async fn list(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiQuery(filters): ApiQuery<TenantFilters>,
) -> ApiResult<Paginated<TenantWithCurrentLease>> {
    let page = TenantQueryService::new(pool).list(user.id, filters).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/tenants/stats - Portfolio counts and plan headroom
pub async fn stats(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
) -> ApiResult<TenantStats> {
    let stats = TenantStatsService::new(pool).stats(user.id).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/tenants/:id[?view=basic]
pub async fn get(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<TenantViewQuery>,
) -> ApiResult<TenantView> {
    let service = TenantQueryService::new(pool);
    let view = match query.view.as_deref() {
        Some("basic") => TenantView::Basic(service.get(user.id, id).await?),
        _ => TenantView::Detail(Box::new(service.detail(user.id, id).await?)),
    };
    Ok(ApiResponse::success(view))
}

/// POST /api/tenants - Counts against the plan's tenant limit
pub async fn create(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiJson(request): ApiJson<CreateTenantRequest>,
) -> ApiResult<Tenant> {
    let tenant = TenantService::new(pool).create(user.id, request).await?;
    Ok(ApiResponse::created(tenant))
}

/// PATCH /api/tenants/:id
pub async fn update(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateTenantRequest>,
) -> ApiResult<Tenant> {
    let tenant = TenantService::new(pool).update(user.id, id, request).await?;
    Ok(ApiResponse::success(tenant))
}

/// DELETE /api/tenants/:id - Soft delete, 409 while a lease is active
pub async fn delete(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    TenantService::new(pool).delete(user.id, id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/tenants/:id/move-out - End active leases and free their units
pub async fn move_out(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<MoveOutRequest>,
) -> ApiResult<Tenant> {
    let tenant = TenantService::new(pool).mark_moved_out(user.id, id, request).await?;
    Ok(ApiResponse::success(tenant))
}

/// GET /api/tenants/:id/leases
pub async fn leases(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<LeaseWithRelations>> {
    let leases = LeaseService::new(pool).for_tenant(user.id, id).await?;
    Ok(ApiResponse::success(leases))
}
