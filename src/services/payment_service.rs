use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{PaymentMethod, PaymentStatus, PaymentWithRelations, RentPayment};
use crate::database::{ownership, ListQuery, Page};
use crate::events::{self, DomainEvent};

use super::validation::{clean_optional, FieldErrors};
use super::{Paginated, ServiceError, ServiceResult};

const PAYMENT_WITH_RELATIONS: &str = r#"
    SELECT rp.id, rp.tenant_id, rp.lease_id, rp.amount, rp.late_fee, rp.currency, rp.status,
           rp.payment_method, rp.due_date, rp.paid_at, rp.notes, rp.created_at,
           t.first_name || ' ' || t.last_name AS tenant_name, u.unit_number, p.name AS property_name
    FROM rent_payments rp
    JOIN tenants t ON t.id = rp.tenant_id
    JOIN leases l ON l.id = rp.lease_id
    JOIN units u ON u.id = l.unit_id
    JOIN properties p ON p.id = u.property_id
"#;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFilters {
    pub status: Option<PaymentStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub lease_id: Uuid,
    pub amount: Decimal,
    pub late_fee: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub due_date: NaiveDate,
    pub paid_at: Option<DateTime<Utc>>,
    pub status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FailedQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total_paid: Decimal,
    pub outstanding: Decimal,
    pub failed_count: i64,
    pub late_payment_count: i64,
    pub last_payment_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    pub next_due_date: Option<NaiveDate>,
}

/// Zero totals keep the column scale so they serialize as "0.00"
const PAYMENT_TOTALS: &str = r#"
    SELECT COALESCE(SUM(amount) FILTER (WHERE status = 'SUCCEEDED'), 0::numeric(12,2)) AS total_paid,
           COALESCE(SUM(amount) FILTER (WHERE status = 'PENDING'), 0::numeric(12,2)) AS outstanding,
           COUNT(*) FILTER (WHERE status = 'FAILED') AS failed_count,
           COUNT(*) FILTER (
               WHERE status = 'SUCCEEDED' AND paid_at IS NOT NULL
                 AND (paid_at AT TIME ZONE 'UTC')::date > due_date
           ) AS late_payment_count,
           MAX(paid_at) FILTER (WHERE status = 'SUCCEEDED') AS last_payment_at
    FROM rent_payments
    WHERE tenant_id = $1
"#;

impl RecordPaymentRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        let mut errors = FieldErrors::default();
        if self.amount <= Decimal::ZERO {
            errors.add("amount", "Must be greater than 0");
        }
        errors.money("amount", self.amount);
        if let Some(fee) = self.late_fee {
            if fee < Decimal::ZERO {
                errors.add("lateFee", "Must be 0 or more");
            }
            errors.money("lateFee", fee);
        }
        if self.notes.as_deref().map_or(false, |n| n.chars().count() > 1000) {
            errors.add("notes", "Must be at most 1000 characters");
        }
        errors.into_result()
    }
}

/// Only succeeded payments carry a paid timestamp
fn resolve_paid_at(status: PaymentStatus, paid_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match status {
        PaymentStatus::Succeeded => Some(paid_at.unwrap_or(now)),
        _ => None,
    }
}

/// Next date on or after `today` that falls on `payment_day`, if the lease is still running then
fn next_due_date(today: NaiveDate, payment_day: u32, lease_end: NaiveDate) -> Option<NaiveDate> {
    let this_month = today.with_day(payment_day)?;
    let due = if this_month >= today {
        this_month
    } else {
        this_month.checked_add_months(Months::new(1))?
    };
    (due <= lease_end).then_some(due)
}

pub struct PaymentService {
    pool: PgPool,
}

impl PaymentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn history(
        &self,
        owner_id: Uuid,
        tenant_id: Uuid,
        filters: PaymentFilters,
    ) -> ServiceResult<Paginated<PaymentWithRelations>> {
        if !ownership::tenant_owned(&self.pool, owner_id, tenant_id).await? {
            return Err(ServiceError::not_found("Tenant"));
        }
        if let (Some(from), Some(to)) = (filters.from, filters.to) {
            if from > to {
                return Err(ServiceError::invalid("from", "Must not be after 'to'"));
            }
        }

        let page = Page::new(filters.limit, filters.offset);
        let apply = |q: &mut ListQuery| {
            q.and_where_bind("rp.tenant_id = ", tenant_id);
            if let Some(status) = filters.status {
                q.and_where_bind("rp.status = ", status);
            }
            if let Some(from) = filters.from {
                q.and_where_bind("rp.due_date >= ", from);
            }
            if let Some(to) = filters.to {
                q.and_where_bind("rp.due_date <= ", to);
            }
        };

        let mut count = ListQuery::new("SELECT COUNT(*) FROM rent_payments rp");
        apply(&mut count);
        let total = count.fetch_count(&self.pool).await?;

        let mut query = ListQuery::new(PAYMENT_WITH_RELATIONS);
        apply(&mut query);
        query.push(" ORDER BY rp.created_at DESC, rp.id").paginate(page);
        let items = query.fetch_all::<PaymentWithRelations>(&self.pool).await?;

        Ok(Paginated { items, total, limit: page.limit, offset: page.offset })
    }

    pub async fn record(
        &self,
        owner_id: Uuid,
        tenant_id: Uuid,
        request: RecordPaymentRequest,
    ) -> ServiceResult<RentPayment> {
        request.validate()?;
        if !ownership::tenant_owned(&self.pool, owner_id, tenant_id).await? {
            return Err(ServiceError::not_found("Tenant"));
        }
        let lease_matches = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM leases WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(request.lease_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;
        if !lease_matches || !ownership::lease_owned(&self.pool, owner_id, request.lease_id).await? {
            return Err(ServiceError::not_found("Lease"));
        }

        let status = request.status.unwrap_or(PaymentStatus::Succeeded);
        let payment = sqlx::query_as::<_, RentPayment>(
            r#"
            INSERT INTO rent_payments
                (tenant_id, lease_id, amount, late_fee, status, payment_method, due_date, paid_at, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, tenant_id, lease_id, amount, late_fee, currency, status, payment_method,
                      due_date, paid_at, notes, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(request.lease_id)
        .bind(request.amount)
        .bind(request.late_fee.unwrap_or(Decimal::ZERO))
        .bind(status)
        .bind(request.payment_method)
        .bind(request.due_date)
        .bind(resolve_paid_at(status, request.paid_at, Utc::now()))
        .bind(clean_optional(request.notes))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(tenant_id = %tenant_id, payment_id = %payment.id, status = ?payment.status, "Recorded payment");
        events::publish(DomainEvent::PaymentRecorded {
            payment_id: payment.id,
            tenant_id,
            lease_id: payment.lease_id,
            amount: payment.amount,
        });
        Ok(payment)
    }

    pub async fn summary(&self, owner_id: Uuid, tenant_id: Uuid) -> ServiceResult<PaymentSummary> {
        if !ownership::tenant_owned(&self.pool, owner_id, tenant_id).await? {
            return Err(ServiceError::not_found("Tenant"));
        }
        self.summary_for(tenant_id).await
    }

    /// Summary without an ownership check; callers must have verified the tenant
    pub(crate) async fn summary_for(&self, tenant_id: Uuid) -> ServiceResult<PaymentSummary> {
        let mut summary = sqlx::query_as::<_, PaymentSummary>(PAYMENT_TOTALS)
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

        let active = sqlx::query_as::<_, (i16, NaiveDate)>(
            r#"
            SELECT payment_day, end_date FROM leases
            WHERE tenant_id = $1 AND status = 'ACTIVE'
            ORDER BY start_date DESC LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        summary.next_due_date = active.and_then(|(day, end)| {
            u32::try_from(day)
                .ok()
                .and_then(|day| next_due_date(Utc::now().date_naive(), day, end))
        });
        Ok(summary)
    }

    /// Most recent failed payments across all of the owner's leases
    pub async fn failed(&self, owner_id: Uuid, query: FailedQuery) -> ServiceResult<Vec<PaymentWithRelations>> {
        let page = Page::new(query.limit, None);
        let mut q = ListQuery::new(PAYMENT_WITH_RELATIONS);
        q.and_where_bind("p.owner_id = ", owner_id)
            .and_where("rp.status = 'FAILED'")
            .push(" ORDER BY rp.created_at DESC, rp.id")
            .paginate(page);
        Ok(q.fetch_all::<PaymentWithRelations>(&self.pool).await?)
    }

    /// Payments across every tenant record linked to a platform account
    pub async fn for_user(&self, user_id: Uuid, filters: PaymentFilters) -> ServiceResult<Paginated<PaymentWithRelations>> {
        let page = Page::new(filters.limit, filters.offset);
        let apply = |q: &mut ListQuery| {
            q.and_where_bind("t.user_id = ", user_id).and_where("t.deleted_at IS NULL");
            if let Some(status) = filters.status {
                q.and_where_bind("rp.status = ", status);
            }
        };

        let mut count = ListQuery::new("SELECT COUNT(*) FROM rent_payments rp JOIN tenants t ON t.id = rp.tenant_id");
        apply(&mut count);
        let total = count.fetch_count(&self.pool).await?;

        let mut query = ListQuery::new(PAYMENT_WITH_RELATIONS);
        apply(&mut query);
        query.push(" ORDER BY rp.created_at DESC, rp.id").paginate(page);
        let items = query.fetch_all::<PaymentWithRelations>(&self.pool).await?;

        Ok(Paginated { items, total, limit: page.limit, offset: page.offset })
    }
}
