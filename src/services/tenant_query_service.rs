use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{EmergencyContact, Tenant, TenantStatus, TenantWithCurrentLease};
use crate::database::{ownership, ListQuery, Page, SortDirection};

use super::emergency_contact_service::EmergencyContactService;
use super::payment_service::{PaymentService, PaymentSummary};
use super::{Paginated, ServiceError, ServiceResult};

pub(crate) const TENANT_COLUMNS: &str = "t.id, t.owner_id, t.user_id, t.first_name, t.last_name, t.email, t.phone, \
     t.date_of_birth, t.status, t.move_out_date, t.move_out_reason, t.notes, t.created_at, t.updated_at";

/// Tenant row plus its current lease: the ACTIVE one if any, else the latest by start date
const WITH_CURRENT_LEASE: &str = r#"
    cl.id AS lease_id, cl.status AS lease_status, cl.start_date AS lease_start_date,
    cl.end_date AS lease_end_date, cl.rent_amount, u.id AS unit_id, u.unit_number,
    p.id AS property_id, p.name AS property_name,
    CASE WHEN p.id IS NULL THEN NULL ELSE concat_ws(', ', p.address_line1, NULLIF(trim(p.address_line2), ''),
        p.city, p.state || ' ' || p.postal_code) END AS property_address
    FROM tenants t
    LEFT JOIN LATERAL (
        SELECT l.id, l.status, l.start_date, l.end_date, l.rent_amount, l.unit_id
        FROM leases l
        WHERE l.tenant_id = t.id
        ORDER BY (l.status = 'ACTIVE') DESC, l.start_date DESC, l.created_at DESC
        LIMIT 1
    ) cl ON true
    LEFT JOIN units u ON u.id = cl.unit_id
    LEFT JOIN properties p ON p.id = u.property_id
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TenantSortBy {
    FirstName,
    LastName,
    Email,
    #[default]
    CreatedAt,
}

impl TenantSortBy {
    fn column(&self) -> &'static str {
        match self {
            TenantSortBy::FirstName => "t.first_name",
            TenantSortBy::LastName => "t.last_name",
            TenantSortBy::Email => "t.email",
            TenantSortBy::CreatedAt => "t.created_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantFilters {
    pub status: Option<TenantStatus>,
    pub search: Option<String>,
    pub property_id: Option<Uuid>,
    pub sort_by: Option<TenantSortBy>,
    pub sort_order: Option<SortDirection>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Tenant with current lease, emergency contact and payment summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDetail {
    #[serde(flatten)]
    pub tenant: TenantWithCurrentLease,
    pub emergency_contact: Option<EmergencyContact>,
    pub payment_summary: PaymentSummary,
}

fn select_with_current_lease() -> String {
    format!("SELECT {}, {}", TENANT_COLUMNS, WITH_CURRENT_LEASE)
}

pub struct TenantQueryService {
    pool: PgPool,
}

impl TenantQueryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        filters: TenantFilters,
    ) -> ServiceResult<Paginated<TenantWithCurrentLease>> {
        let page = Page::new(filters.limit, filters.offset);
        let apply = |q: &mut ListQuery| {
            q.and_where("t.deleted_at IS NULL")
                .and_where_with(|b| ownership::push_tenant_owned(b, "t", owner_id));
            if let Some(status) = filters.status {
                q.and_where_bind("t.status = ", status);
            }
            if let Some(search) = filters.search.as_deref() {
                q.and_search(&["t.first_name", "t.last_name", "t.email", "t.phone"], search);
            }
            if let Some(property_id) = filters.property_id {
                q.and_where_with(|b| {
                    b.push(
                        "EXISTS (SELECT 1 FROM leases pl JOIN units pu ON pu.id = pl.unit_id \
                         WHERE pl.tenant_id = t.id AND pu.property_id = ",
                    )
                    .push_bind(property_id)
                    .push(")");
                });
            }
        };

        let mut count = ListQuery::new("SELECT COUNT(*) FROM tenants t");
        apply(&mut count);
        let total = count.fetch_count(&self.pool).await?;

        let mut query = ListQuery::new(&select_with_current_lease());
        apply(&mut query);
        query
            .order_by(
                filters.sort_by.unwrap_or_default().column(),
                filters.sort_order.unwrap_or_default(),
                "t.id",
            )
            .paginate(page);
        let items = query.fetch_all::<TenantWithCurrentLease>(&self.pool).await?;

        Ok(Paginated { items, total, limit: page.limit, offset: page.offset })
    }

    /// Bare tenant record
    pub async fn get(&self, owner_id: Uuid, tenant_id: Uuid) -> ServiceResult<Tenant> {
        let mut query = ListQuery::new(&format!("SELECT {} FROM tenants t", TENANT_COLUMNS));
        query
            .and_where_bind("t.id = ", tenant_id)
            .and_where("t.deleted_at IS NULL")
            .and_where_with(|b| ownership::push_tenant_owned(b, "t", owner_id));
        query
            .fetch_optional::<Tenant>(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant"))
    }

    pub async fn detail(&self, owner_id: Uuid, tenant_id: Uuid) -> ServiceResult<TenantDetail> {
        let mut query = ListQuery::new(&select_with_current_lease());
        query
            .and_where_bind("t.id = ", tenant_id)
            .and_where("t.deleted_at IS NULL")
            .and_where_with(|b| ownership::push_tenant_owned(b, "t", owner_id));
        let tenant = query
            .fetch_optional::<TenantWithCurrentLease>(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant"))?;

        let contacts = EmergencyContactService::new(self.pool.clone());
        let payments = PaymentService::new(self.pool.clone());
        let (emergency_contact, payment_summary) =
            futures::try_join!(contacts.find(tenant_id), payments.summary_for(tenant_id))?;

        Ok(TenantDetail { tenant, emergency_contact, payment_summary })
    }

    /// Tenant records linked to a platform account, for the tenant portal
    pub async fn for_user(&self, user_id: Uuid) -> ServiceResult<Vec<TenantWithCurrentLease>> {
        let mut query = ListQuery::new(&select_with_current_lease());
        query
            .and_where_bind("t.user_id = ", user_id)
            .and_where("t.deleted_at IS NULL")
            .push(" ORDER BY t.created_at, t.id");
        Ok(query.fetch_all::<TenantWithCurrentLease>(&self.pool).await?)
    }
}
