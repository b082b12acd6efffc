use axum::Extension;
use uuid::Uuid;

use crate::database::models::{Property, PropertyWithCounts};
use crate::handlers::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult, DbPool, ValidatedUser};
use crate::services::property_service::{CreatePropertyRequest, PropertyFilters, UpdatePropertyRequest};
use crate::services::{Paginated, PropertyService};

/// GET /api/properties - List the caller's properties with unit counts
pub async fn list(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiQuery(filters): ApiQuery<PropertyFilters>,
) -> ApiResult<Paginated<PropertyWithCounts>> {
    let page = PropertyService::new(pool).list(user.id, filters).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/properties/:id
pub async fn get(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Property> {
    let property = PropertyService::new(pool).get(user.id, id).await?;
    Ok(ApiResponse::success(property))
}

/// POST /api/properties
pub async fn create(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiJson(request): ApiJson<CreatePropertyRequest>,
) -> ApiResult<Property> {
    let property = PropertyService::new(pool).create(user.id, request).await?;
    Ok(ApiResponse::created(property))
}

/// PATCH /api/properties/:id - Partial update
pub async fn update(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdatePropertyRequest>,
) -> ApiResult<Property> {
    let property = PropertyService::new(pool).update(user.id, id, request).await?;
    Ok(ApiResponse::success(property))
}

/// DELETE /api/properties/:id - Soft delete, 409 while any unit is leased
pub async fn delete(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    PropertyService::new(pool).delete(user.id, id).await?;
    Ok(ApiResponse::no_content())
}
