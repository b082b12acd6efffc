use futures::TryFutureExt;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::SubscriptionPlan;
use crate::database::{ownership, ListQuery};

use super::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantStats {
    pub total: i64,
    pub active: i64,
    pub pending: i64,
    pub inactive: i64,
    pub moved_out: i64,
    pub with_active_lease: i64,
    pub new_this_month: i64,
    pub pending_invitations: i64,
    pub total_monthly_rent: Decimal,
    pub plan_limit: Option<i64>,
    pub remaining_slots: Option<i64>,
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
struct StatusCounts {
    total: i64,
    active: i64,
    pending: i64,
    inactive: i64,
    moved_out: i64,
    new_this_month: i64,
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
struct LeaseTotals {
    with_active_lease: i64,
    total_monthly_rent: Decimal,
}

#[derive(Debug, Clone, Copy)]
struct PlanUsage {
    plan: SubscriptionPlan,
    used: i64,
}

impl TenantStats {
    fn assemble(counts: StatusCounts, leases: LeaseTotals, pending_invitations: i64, usage: PlanUsage) -> Self {
        let plan_limit = usage.plan.tenant_limit();
        Self {
            total: counts.total,
            active: counts.active,
            pending: counts.pending,
            inactive: counts.inactive,
            moved_out: counts.moved_out,
            with_active_lease: leases.with_active_lease,
            new_this_month: counts.new_this_month,
            pending_invitations,
            total_monthly_rent: leases.total_monthly_rent,
            plan_limit,
            remaining_slots: plan_limit.map(|limit| (limit - usage.used).max(0)),
        }
    }
}

pub struct TenantStatsService {
    pool: PgPool,
}

impl TenantStatsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn stats(&self, owner_id: Uuid) -> ServiceResult<TenantStats> {
        let counts = status_counts_query(owner_id)
            .fetch_optional::<StatusCounts>(&self.pool)
            .map_err(ServiceError::from);

        let leases = lease_totals_query(owner_id)
            .fetch_optional::<LeaseTotals>(&self.pool)
            .map_err(ServiceError::from);

        let invitations = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM tenant_invitations
            WHERE owner_id = $1 AND status IN ('PENDING', 'SENT') AND expires_at > now()
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .map_err(ServiceError::from);

        // Plan usage counts the records the owner created, matching the capacity check
        let plan = sqlx::query_as::<_, (SubscriptionPlan, i64)>(
            r#"
            SELECT u.subscription_plan,
                   (SELECT COUNT(*) FROM tenants t WHERE t.owner_id = u.id AND t.deleted_at IS NULL)
            FROM users u WHERE u.id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .map_err(ServiceError::from);

        let (counts, leases, pending_invitations, plan) = futures::try_join!(counts, leases, invitations, plan)?;
        let (plan, plan_usage) =
            plan.ok_or_else(|| ServiceError::Unauthorized("Account no longer exists".to_string()))?;

        Ok(TenantStats::assemble(
            counts.unwrap_or_default(),
            leases.unwrap_or_default(),
            pending_invitations,
            PlanUsage { plan, used: plan_usage },
        ))
    }
}

/// Status breakdown over every tenant visible to the owner
fn status_counts_query(owner_id: Uuid) -> ListQuery {
    let mut query = ListQuery::new(
        r#"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (WHERE t.status = 'ACTIVE') AS active,
               COUNT(*) FILTER (WHERE t.status = 'PENDING') AS pending,
               COUNT(*) FILTER (WHERE t.status = 'INACTIVE') AS inactive,
               COUNT(*) FILTER (WHERE t.status = 'MOVED_OUT') AS moved_out,
               COUNT(*) FILTER (WHERE t.created_at >= date_trunc('month', now())) AS new_this_month
        FROM tenants t
        "#,
    );
    query
        .and_where("t.deleted_at IS NULL")
        .and_where_with(|b| ownership::push_tenant_owned(b, "t", owner_id));
    query
}

/// Active leases on the owner's properties held by tenants the owner can see
fn lease_totals_query(owner_id: Uuid) -> ListQuery {
    let mut query = ListQuery::new(
        r#"
        SELECT COUNT(DISTINCT l.tenant_id) AS with_active_lease,
               COALESCE(SUM(l.rent_amount), 0::numeric(12,2)) AS total_monthly_rent
        FROM leases l
        JOIN units u ON u.id = l.unit_id
        JOIN properties p ON p.id = u.property_id
        JOIN tenants t ON t.id = l.tenant_id
        "#,
    );
    query
        .and_where_bind("p.owner_id = ", owner_id)
        .and_where("l.status = 'ACTIVE'")
        .and_where("t.deleted_at IS NULL")
        .and_where_with(|b| ownership::push_tenant_owned(b, "t", owner_id));
    query
}
