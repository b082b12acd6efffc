use axum::Extension;
use uuid::Uuid;

use crate::database::models::Unit;
use crate::handlers::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult, DbPool, ValidatedUser};
use crate::services::unit_service::{CreateUnitRequest, UnitFilters, UpdateUnitRequest};
use crate::services::UnitService;

/// GET /api/units?propertyId=&status=
pub async fn list(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiQuery(filters): ApiQuery<UnitFilters>,
) -> ApiResult<Vec<Unit>> {
    let units = UnitService::new(pool).list(user.id, filters).await?;
    Ok(ApiResponse::success(units))
}

/// GET /api/units/:id
pub async fn get(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Unit> {
    let unit = UnitService::new(pool).get(user.id, id).await?;
    Ok(ApiResponse::success(unit))
}

/// POST /api/units - `propertyId` in the body must be one of the caller's properties
pub async fn create(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiJson(request): ApiJson<CreateUnitRequest>,
) -> ApiResult<Unit> {
    let unit = UnitService::new(pool).create(user.id, request).await?;
    Ok(ApiResponse::created(unit))
}

/// PATCH /api/units/:id
pub async fn update(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateUnitRequest>,
) -> ApiResult<Unit> {
    let unit = UnitService::new(pool).update(user.id, id, request).await?;
    Ok(ApiResponse::success(unit))
}

/// DELETE /api/units/:id
pub async fn delete(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    UnitService::new(pool).delete(user.id, id).await?;
    Ok(ApiResponse::no_content())
}
