use axum::Extension;
use uuid::Uuid;

use crate::database::models::{PaymentWithRelations, RentPayment};
use crate::handlers::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult, DbPool, ValidatedUser};
use crate::services::payment_service::{FailedQuery, PaymentFilters, PaymentSummary, RecordPaymentRequest};
use crate::services::{Paginated, PaymentService};

/// GET /api/tenants/:id/payments?status=&from=&to=
pub async fn history(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(tenant_id): ApiPath<Uuid>,
    ApiQuery(filters): ApiQuery<PaymentFilters>,
) -> ApiResult<Paginated<PaymentWithRelations>> {
    let page = PaymentService::new(pool).history(user.id, tenant_id, filters).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/tenants/:id/payments - Record a manual payment
pub async fn record(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(tenant_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<RecordPaymentRequest>,
) -> ApiResult<RentPayment> {
    let payment = PaymentService::new(pool).record(user.id, tenant_id, request).await?;
    crate::audit!(owner_id = %user.id, tenant_id = %tenant_id, payment_id = %payment.id, amount = %payment.amount, "Payment recorded");
    Ok(ApiResponse::created(payment))
}

/// GET /api/tenants/:id/payments/summary
pub async fn summary(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiPath(tenant_id): ApiPath<Uuid>,
) -> ApiResult<PaymentSummary> {
    let summary = PaymentService::new(pool).summary(user.id, tenant_id).await?;
    Ok(ApiResponse::success(summary))
}

/// GET /api/payments/failed?limit=
pub async fn failed(
    Extension(user): Extension<ValidatedUser>,
    Extension(DbPool(pool)): Extension<DbPool>,
    ApiQuery(query): ApiQuery<FailedQuery>,
) -> ApiResult<Vec<PaymentWithRelations>> {
    let payments = PaymentService::new(pool).failed(user.id, query).await?;
    Ok(ApiResponse::success(payments))
}
