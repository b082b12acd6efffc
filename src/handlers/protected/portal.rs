use axum::Extension;

use crate::database::models::{PaymentWithRelations, TenantWithCurrentLease};
use crate::handlers::ApiQuery;
use crate::middleware::{ApiResponse, ApiResult, DbPool, ValidatedUser};
use crate::services::payment_service::PaymentFilters;
use crate::services::{Paginated, PaymentService, TenantQueryService};

/// GET /api/portal/profile - Tenant records linked to the caller's account
pub async fn profile(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
) -> ApiResult<Vec<TenantWithCurrentLease>> {
    let tenancies = TenantQueryService::new(pool).for_user(user.id).await?;
    Ok(ApiResponse::success(tenancies))
}

/// GET /api/portal/payments - The caller's own payment history
pub async fn payments(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiQuery(filters): ApiQuery<PaymentFilters>,
) -> ApiResult<Paginated<PaymentWithRelations>> {
    let page = PaymentService::new(pool).for_user(user.id, filters).await?;
    Ok(ApiResponse::success(page))
}
