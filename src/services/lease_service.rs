use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::database::models::{Lease, LeaseStatus, LeaseWithRelations};
use crate::database::{ownership, ListQuery, Page};
use crate::events::{self, DomainEvent};

use super::validation::{clean_optional, FieldErrors};
use super::{Paginated, ServiceError, ServiceResult};

const LEASE_WITH_RELATIONS: &str = r#"
    SELECT l.id, l.unit_id, l.tenant_id, l.start_date, l.end_date, l.rent_amount, l.security_deposit,
           l.payment_day, l.status, l.terms, l.created_at, l.updated_at,
           t.first_name || ' ' || t.last_name AS tenant_name, t.email AS tenant_email,
           u.unit_number, p.id AS property_id, p.name AS property_name
    FROM leases l
    JOIN units u ON u.id = l.unit_id
    JOIN properties p ON p.id = u.property_id
    JOIN tenants t ON t.id = l.tenant_id
"#;

const RETURNING_LEASE: &str = "RETURNING id, unit_id, tenant_id, start_date, end_date, rent_amount, \
     security_deposit, payment_day, status, terms, created_at, updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseFilters {
    pub status: Option<LeaseStatus>,
    pub unit_id: Option<Uuid>,
    pub property_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeaseRequest {
    pub unit_id: Uuid,
    pub tenant_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rent_amount: Decimal,
    pub security_deposit: Option<Decimal>,
    pub payment_day: Option<i16>,
    pub status: Option<LeaseStatus>,
    pub terms: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeaseRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub rent_amount: Option<Decimal>,
    pub security_deposit: Option<Decimal>,
    pub payment_day: Option<i16>,
    pub status: Option<LeaseStatus>,
    pub terms: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminateLeaseRequest {
    pub termination_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringQuery {
    pub within_days: Option<i64>,
}

/// Terms of a lease after merging defaults or a partial update
#[derive(Debug, Clone, PartialEq)]
struct LeaseTerms {
    start_date: NaiveDate,
    end_date: NaiveDate,
    rent_amount: Decimal,
    security_deposit: Decimal,
    payment_day: i16,
    status: LeaseStatus,
}

impl LeaseTerms {
    fn validate(&self) -> ServiceResult<()> {
        let mut errors = FieldErrors::default();
        if self.end_date <= self.start_date {
            errors.add("endDate", "End date must be after start date");
        }
        if self.rent_amount <= Decimal::ZERO {
            errors.add("rentAmount", "Must be greater than 0");
        }
        errors.money("rentAmount", self.rent_amount);
        if self.security_deposit < Decimal::ZERO {
            errors.add("securityDeposit", "Must be 0 or more");
        }
        errors.money("securityDeposit", self.security_deposit);
        if !(1..=28).contains(&self.payment_day) {
            errors.add("paymentDay", "Must be between 1 and 28");
        }
        if !self.status.is_open() {
            errors.add("status", "Status must be DRAFT or ACTIVE");
        }
        errors.into_result()
    }
}

/// Append a dated termination note to existing terms
fn append_termination_note(terms: Option<&str>, date: NaiveDate, reason: &str) -> String {
    let note = format!("Terminated {}: {}", date, reason);
    match terms.map(str::trim).filter(|t| !t.is_empty()) {
        Some(existing) => format!("{}\n\n{}", existing, note),
        None => note,
    }
}

fn validate_within_days(within_days: Option<i64>) -> ServiceResult<i64> {
    let days = within_days.unwrap_or(30);
    if !(1..=365).contains(&days) {
        return Err(ServiceError::invalid("withinDays", "Must be between 1 and 365"));
    }
    Ok(days)
}

async fn ensure_no_overlap(
    conn: &mut PgConnection,
    unit_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    except: Option<Uuid>,
) -> ServiceResult<()> {
    let overlapping = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM leases
            WHERE unit_id = $1 AND status IN ('DRAFT', 'ACTIVE')
              AND daterange(start_date, end_date, '[]') && daterange($2, $3, '[]')
              AND ($4::uuid IS NULL OR id <> $4)
        )
        "#,
    )
    .bind(unit_id)
    .bind(start_date)
    .bind(end_date)
    .bind(except)
    .fetch_one(&mut *conn)
    .await?;

    if overlapping {
        return Err(ServiceError::conflict("Unit already has a lease overlapping these dates"));
    }
    Ok(())
}

/// Serialize lease writes on one unit for the rest of the transaction
async fn lock_unit(conn: &mut PgConnection, unit_id: Uuid) -> ServiceResult<()> {
    sqlx::query("SELECT id FROM units WHERE id = $1 FOR UPDATE")
        .bind(unit_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// An ACTIVE lease only leaves ACTIVE through termination or move-out
fn check_status_change(from: LeaseStatus, to: LeaseStatus) -> ServiceResult<()> {
    if from == LeaseStatus::Active && to == LeaseStatus::Draft {
        return Err(ServiceError::conflict("An active lease cannot return to DRAFT; terminate it instead"));
    }
    Ok(())
}

async fn occupy(conn: &mut PgConnection, unit_id: Uuid, tenant_id: Uuid) -> ServiceResult<()> {
    sqlx::query("UPDATE units SET status = 'OCCUPIED', updated_at = now() WHERE id = $1")
        .bind(unit_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE tenants SET status = 'ACTIVE', updated_at = now() WHERE id = $1")
        .bind(tenant_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub struct LeaseService {
    pool: PgPool,
}

impl LeaseService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, owner_id: Uuid, filters: LeaseFilters) -> ServiceResult<Paginated<LeaseWithRelations>> {
        let page = Page::new(filters.limit, filters.offset);
        let apply = |q: &mut ListQuery| {
            q.and_where_bind("p.owner_id = ", owner_id);
            if let Some(status) = filters.status {
                q.and_where_bind("l.status = ", status);
            }
            if let Some(unit_id) = filters.unit_id {
                q.and_where_bind("l.unit_id = ", unit_id);
            }
            if let Some(property_id) = filters.property_id {
                q.and_where_bind("u.property_id = ", property_id);
            }
            if let Some(tenant_id) = filters.tenant_id {
                q.and_where_bind("l.tenant_id = ", tenant_id);
            }
        };

        let mut count = ListQuery::new(
            "SELECT COUNT(*) FROM leases l JOIN units u ON u.id = l.unit_id JOIN properties p ON p.id = u.property_id",
        );
        apply(&mut count);
        let total = count.fetch_count(&self.pool).await?;

        let mut query = ListQuery::new(LEASE_WITH_RELATIONS);
        apply(&mut query);
        query.push(" ORDER BY l.start_date DESC, l.id").paginate(page);
        let items = query.fetch_all::<LeaseWithRelations>(&self.pool).await?;

        Ok(Paginated { items, total, limit: page.limit, offset: page.offset })
    }

    pub async fn get(&self, owner_id: Uuid, lease_id: Uuid) -> ServiceResult<LeaseWithRelations> {
        let mut query = ListQuery::new(LEASE_WITH_RELATIONS);
        query.and_where_bind("l.id = ", lease_id).and_where_bind("p.owner_id = ", owner_id);
        query
            .fetch_optional::<LeaseWithRelations>(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Lease"))
    }

    /// Every lease of one tenant, newest first
    pub async fn for_tenant(&self, owner_id: Uuid, tenant_id: Uuid) -> ServiceResult<Vec<LeaseWithRelations>> {
        if !ownership::tenant_owned(&self.pool, owner_id, tenant_id).await? {
            return Err(ServiceError::not_found("Tenant"));
        }
        let mut query = ListQuery::new(LEASE_WITH_RELATIONS);
        query
            .and_where_bind("l.tenant_id = ", tenant_id)
            .push(" ORDER BY l.start_date DESC, l.created_at DESC");
        Ok(query.fetch_all::<LeaseWithRelations>(&self.pool).await?)
    }

    pub async fn create(&self, owner_id: Uuid, request: CreateLeaseRequest) -> ServiceResult<Lease> {
        let terms = LeaseTerms {
            start_date: request.start_date,
            end_date: request.end_date,
            rent_amount: request.rent_amount,
            security_deposit: request.security_deposit.unwrap_or(Decimal::ZERO),
            payment_day: request.payment_day.unwrap_or(1),
            status: request.status.unwrap_or(LeaseStatus::Draft),
        };
        terms.validate()?;

        let mut tx = self.pool.begin().await?;
        if !ownership::unit_owned(&mut *tx, owner_id, request.unit_id).await? {
            return Err(ServiceError::not_found("Unit"));
        }
        if !ownership::tenant_owned(&mut *tx, owner_id, request.tenant_id).await? {
            return Err(ServiceError::not_found("Tenant"));
        }
        lock_unit(&mut tx, request.unit_id).await?;
        ensure_no_overlap(&mut tx, request.unit_id, terms.start_date, terms.end_date, None).await?;

        let lease = sqlx::query_as::<_, Lease>(&format!(
            "INSERT INTO leases (unit_id, tenant_id, start_date, end_date, rent_amount, security_deposit, \
             payment_day, status, terms) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) {}",
            RETURNING_LEASE
        ))
        .bind(request.unit_id)
        .bind(request.tenant_id)
        .bind(terms.start_date)
        .bind(terms.end_date)
        .bind(terms.rent_amount)
        .bind(terms.security_deposit)
        .bind(terms.payment_day)
        .bind(terms.status)
        .bind(clean_optional(request.terms))
        .fetch_one(&mut *tx)
        .await?;

        if lease.status == LeaseStatus::Active {
            occupy(&mut tx, lease.unit_id, lease.tenant_id).await?;
        }
        tx.commit().await?;

        tracing::info!(owner_id = %owner_id, lease_id = %lease.id, status = ?lease.status, "Created lease");
        events::publish(DomainEvent::LeaseCreated {
            lease_id: lease.id,
            unit_id: lease.unit_id,
            tenant_id: lease.tenant_id,
        });
        Ok(lease)
    }

    pub async fn update(&self, owner_id: Uuid, lease_id: Uuid, request: UpdateLeaseRequest) -> ServiceResult<Lease> {
        let mut tx = self.pool.begin().await?;
        if !ownership::lease_owned(&mut *tx, owner_id, lease_id).await? {
            return Err(ServiceError::not_found("Lease"));
        }
        let current = sqlx::query_as::<_, Lease>(
            "SELECT id, unit_id, tenant_id, start_date, end_date, rent_amount, security_deposit, payment_day, \
             status, terms, created_at, updated_at FROM leases WHERE id = $1 FOR UPDATE",
        )
        .bind(lease_id)
        .fetch_one(&mut *tx)
        .await?;

        if !current.status.is_open() {
            return Err(ServiceError::conflict("Only DRAFT or ACTIVE leases can be updated"));
        }

        let terms = LeaseTerms {
            start_date: request.start_date.unwrap_or(current.start_date),
            end_date: request.end_date.unwrap_or(current.end_date),
            rent_amount: request.rent_amount.unwrap_or(current.rent_amount),
            security_deposit: request.security_deposit.unwrap_or(current.security_deposit),
            payment_day: request.payment_day.unwrap_or(current.payment_day),
            status: request.status.unwrap_or(current.status),
        };
        terms.validate()?;
        check_status_change(current.status, terms.status)?;

        lock_unit(&mut tx, current.unit_id).await?;
        ensure_no_overlap(&mut tx, current.unit_id, terms.start_date, terms.end_date, Some(lease_id)).await?;

        let lease = sqlx::query_as::<_, Lease>(&format!(
            "UPDATE leases SET start_date = $2, end_date = $3, rent_amount = $4, security_deposit = $5, \
             payment_day = $6, status = $7, terms = $8, updated_at = now() WHERE id = $1 {}",
            RETURNING_LEASE
        ))
        .bind(lease_id)
        .bind(terms.start_date)
        .bind(terms.end_date)
        .bind(terms.rent_amount)
        .bind(terms.security_deposit)
        .bind(terms.payment_day)
        .bind(terms.status)
        .bind(match request.terms {
            Some(t) => clean_optional(Some(t)),
            None => current.terms,
        })
        .fetch_one(&mut *tx)
        .await?;

        if current.status == LeaseStatus::Draft && lease.status == LeaseStatus::Active {
            occupy(&mut tx, lease.unit_id, lease.tenant_id).await?;
        }
        tx.commit().await?;

        Ok(lease)
    }

    pub async fn terminate(
        &self,
        owner_id: Uuid,
        lease_id: Uuid,
        request: TerminateLeaseRequest,
    ) -> ServiceResult<Lease> {
        let termination_date = request.termination_date.unwrap_or_else(|| Utc::now().date_naive());
        let reason = clean_optional(request.reason);

        let mut tx = self.pool.begin().await?;
        if !ownership::lease_owned(&mut *tx, owner_id, lease_id).await? {
            return Err(ServiceError::not_found("Lease"));
        }
        let (status, start_date, terms) = sqlx::query_as::<_, (LeaseStatus, NaiveDate, Option<String>)>(
            "SELECT status, start_date, terms FROM leases WHERE id = $1 FOR UPDATE",
        )
        .bind(lease_id)
        .fetch_one(&mut *tx)
        .await?;

        if status != LeaseStatus::Active {
            return Err(ServiceError::conflict("Only ACTIVE leases can be terminated"));
        }
        if termination_date <= start_date {
            return Err(ServiceError::invalid("terminationDate", "Must be after the lease start date"));
        }

        let terms = match reason.as_deref() {
            Some(reason) => Some(append_termination_note(terms.as_deref(), termination_date, reason)),
            None => terms,
        };

        let lease = sqlx::query_as::<_, Lease>(&format!(
            "UPDATE leases SET status = 'TERMINATED', end_date = $2, terms = $3, updated_at = now() WHERE id = $1 {}",
            RETURNING_LEASE
        ))
        .bind(lease_id)
        .bind(termination_date)
        .bind(terms)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE units SET status = 'VACANT', updated_at = now() WHERE id = $1")
            .bind(lease.unit_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        crate::audit!(owner_id = %owner_id, lease_id = %lease_id, %termination_date, "Terminated lease");
        events::publish(DomainEvent::LeaseTerminated {
            lease_id,
            unit_id: lease.unit_id,
            end_date: termination_date,
        });
        Ok(lease)
    }

    /// ACTIVE leases ending between today and today + `within_days`
    pub async fn expiring(&self, owner_id: Uuid, query: ExpiringQuery) -> ServiceResult<Vec<LeaseWithRelations>> {
        let days = validate_within_days(query.within_days)?;
        let today = Utc::now().date_naive();

        let mut q = ListQuery::new(LEASE_WITH_RELATIONS);
        q.and_where_bind("p.owner_id = ", owner_id)
            .and_where("l.status = 'ACTIVE'")
            .and_where_bind("l.end_date >= ", today)
            .and_where_bind("l.end_date <= ", today + Duration::days(days))
            .push(" ORDER BY l.end_date, l.id");
        Ok(q.fetch_all::<LeaseWithRelations>(&self.pool).await?)
    }
}
