use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::database::models::{LeaseStatus, SubscriptionPlan, Tenant};
use crate::database::ownership;
use crate::events::{self, DomainEvent};

use super::tenant_query_service::TenantQueryService;
use super::validation::{clean_optional, normalize_email, FieldErrors};
use super::{ServiceError, ServiceResult};

const RETURNING_TENANT: &str = "RETURNING id, owner_id, user_id, first_name, last_name, email, phone, date_of_birth, \
     status, move_out_date, move_out_reason, notes, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutRequest {
    pub move_out_date: NaiveDate,
    pub reason: Option<String>,
}

pub(crate) fn validate_tenant_fields(
    errors: &mut FieldErrors,
    first_name: &str,
    last_name: &str,
    email: &str,
    phone: Option<&str>,
) {
    errors.length("firstName", first_name, 1, 100);
    errors.length("lastName", last_name, 1, 100);
    errors.email("email", email);
    if let Some(phone) = phone.filter(|p| !p.trim().is_empty()) {
        errors.phone("phone", phone);
    }
}

impl CreateTenantRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        let mut errors = FieldErrors::default();
        validate_tenant_fields(
            &mut errors,
            &self.first_name,
            &self.last_name,
            &self.email,
            self.phone.as_deref(),
        );
        errors.into_result()
    }
}

const LOCK_OWNER: &str = "SELECT subscription_plan FROM users WHERE id = $1 FOR UPDATE";

const ACTIVE_TENANT_COUNT: &str = "SELECT COUNT(*) FROM tenants WHERE owner_id = $1 AND deleted_at IS NULL";

/// Take the owner's row lock for the rest of the transaction and return the plan.
///
/// Tenant creation, invitations and acceptance all serialize on this lock, so a
/// count taken after it cannot be invalidated by a concurrent writer.
pub(crate) async fn lock_owner(conn: &mut PgConnection, owner_id: Uuid) -> ServiceResult<SubscriptionPlan> {
    sqlx::query_scalar::<_, SubscriptionPlan>(LOCK_OWNER)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("Account no longer exists".to_string()))
}

/// Refuse when adding `additional` tenant records would exceed the owner's plan.
/// Call after [`lock_owner`] on the same connection.
pub(crate) async fn ensure_tenant_capacity(
    conn: &mut PgConnection,
    owner_id: Uuid,
    plan: SubscriptionPlan,
    additional: i64,
) -> ServiceResult<()> {
    if plan.tenant_limit().is_none() {
        return Ok(());
    }
    let current = sqlx::query_scalar::<_, i64>(ACTIVE_TENANT_COUNT)
        .bind(owner_id)
        .fetch_one(&mut *conn)
        .await?;

    check_plan_limit(plan, current, additional)
}

fn check_plan_limit(plan: SubscriptionPlan, current: i64, additional: i64) -> ServiceResult<()> {
    match plan.tenant_limit() {
        Some(limit) if current + additional > limit => Err(ServiceError::PlanLimitReached {
            plan: plan.as_str().to_string(),
            limit,
        }),
        _ => Ok(()),
    }
}

pub(crate) async fn email_taken<'e, E>(
    executor: E,
    owner_id: Uuid,
    email: &str,
    except: Option<Uuid>,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM tenants
            WHERE owner_id = $1 AND lower(email) = lower($2) AND deleted_at IS NULL
              AND ($3::uuid IS NULL OR id <> $3)
        )
        "#,
    )
    .bind(owner_id)
    .bind(email)
    .bind(except)
    .fetch_one(executor)
    .await
}

pub struct TenantService {
    pool: PgPool,
}

impl TenantService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: Uuid, request: CreateTenantRequest) -> ServiceResult<Tenant> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let mut tx = self.pool.begin().await?;
        let plan = lock_owner(&mut tx, owner_id).await?;
        if email_taken(&mut *tx, owner_id, &email, None).await? {
            return Err(ServiceError::conflict("A tenant with this email already exists"));
        }
        ensure_tenant_capacity(&mut tx, owner_id, plan, 1).await?;

        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "INSERT INTO tenants (owner_id, first_name, last_name, email, phone, date_of_birth, notes, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'ACTIVE') {}",
            RETURNING_TENANT
        ))
        .bind(owner_id)
        .bind(request.first_name.trim())
        .bind(request.last_name.trim())
        .bind(&email)
        .bind(clean_optional(request.phone))
        .bind(request.date_of_birth)
        .bind(clean_optional(request.notes))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(owner_id = %owner_id, tenant_id = %tenant.id, "Created tenant");
        Ok(tenant)
    }

    pub async fn update(&self, owner_id: Uuid, tenant_id: Uuid, request: UpdateTenantRequest) -> ServiceResult<Tenant> {
        let current = TenantQueryService::new(self.pool.clone()).get(owner_id, tenant_id).await?;

        let first_name = request.first_name.unwrap_or(current.first_name);
        let last_name = request.last_name.unwrap_or(current.last_name);
        let email = request.email.map(|e| normalize_email(&e)).unwrap_or(current.email);
        let phone = match request.phone {
            Some(p) => clean_optional(Some(p)),
            None => current.phone,
        };

        let mut errors = FieldErrors::default();
        validate_tenant_fields(&mut errors, &first_name, &last_name, &email, phone.as_deref());
        errors.into_result()?;

        if email_taken(&self.pool, current.owner_id, &email, Some(tenant_id)).await? {
            return Err(ServiceError::conflict("A tenant with this email already exists"));
        }

        let notes = match request.notes {
            Some(n) => clean_optional(Some(n)),
            None => current.notes,
        };

        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "UPDATE tenants SET first_name = $2, last_name = $3, email = $4, phone = $5, \
             date_of_birth = $6, notes = $7, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL {}",
            RETURNING_TENANT
        ))
        .bind(tenant_id)
        .bind(first_name.trim())
        .bind(last_name.trim())
        .bind(&email)
        .bind(phone)
        .bind(request.date_of_birth.or(current.date_of_birth))
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Tenant"))?;

        Ok(tenant)
    }

    /// Soft delete; refused while the tenant holds an active lease
    pub async fn delete(&self, owner_id: Uuid, tenant_id: Uuid) -> ServiceResult<()> {
        if !ownership::tenant_owned(&self.pool, owner_id, tenant_id).await? {
            return Err(ServiceError::not_found("Tenant"));
        }
        if self.has_active_lease(tenant_id).await? {
            return Err(ServiceError::conflict("Tenant has an active lease and cannot be deleted"));
        }

        sqlx::query(
            "UPDATE tenants SET deleted_at = now(), status = 'INACTIVE', updated_at = now() WHERE id = $1",
        )
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        crate::audit!(owner_id = %owner_id, tenant_id = %tenant_id, "Deleted tenant");
        Ok(())
    }

    pub async fn mark_moved_out(&self, owner_id: Uuid, tenant_id: Uuid, request: MoveOutRequest) -> ServiceResult<Tenant> {
        let reason = clean_optional(request.reason);
        if reason.as_deref().map_or(false, |r| r.chars().count() > 500) {
            return Err(ServiceError::invalid("reason", "Must be at most 500 characters"));
        }

        let mut tx = self.pool.begin().await?;
        if !ownership::tenant_owned(&mut *tx, owner_id, tenant_id).await? {
            return Err(ServiceError::not_found("Tenant"));
        }

        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "UPDATE tenants SET status = 'MOVED_OUT', move_out_date = $2, move_out_reason = $3, updated_at = now() \
             WHERE id = $1 {}",
            RETURNING_TENANT
        ))
        .bind(tenant_id)
        .bind(request.move_out_date)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        let freed_units = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE leases SET status = $2, end_date = LEAST(end_date, GREATEST($3, start_date + 1)), updated_at = now()
            WHERE tenant_id = $1 AND status = 'ACTIVE'
            RETURNING unit_id
            "#,
        )
        .bind(tenant_id)
        .bind(LeaseStatus::Ended)
        .bind(request.move_out_date)
        .fetch_all(&mut *tx)
        .await?;

        for unit_id in &freed_units {
            sqlx::query("UPDATE units SET status = 'VACANT', updated_at = now() WHERE id = $1")
                .bind(unit_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!(tenant_id = %tenant_id, leases_ended = freed_units.len(), "Tenant moved out");
        events::publish(DomainEvent::TenantMovedOut {
            tenant_id,
            move_out_date: request.move_out_date,
        });
        Ok(tenant)
    }

    async fn has_active_lease(&self, tenant_id: Uuid) -> ServiceResult<bool> {
        let active = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM leases WHERE tenant_id = $1 AND status = 'ACTIVE')",
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(active)
    }
}
