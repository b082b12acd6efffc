//! Platform onboarding: owners invite tenants by email, tenants redeem a one-time code.
//!
//! Only the sha256 of each code is stored; the plain code exists in the invitation URL.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::config;
use crate::database::models::{Invitation, InvitationStatus, User, UserRole};
use crate::database::{ownership, ListQuery};
use crate::events::{self, DomainEvent};

use super::auth_service::{issue_token, AuthResponse, USER_COLUMNS};
use super::tenant_service::{ensure_tenant_capacity, lock_owner, validate_tenant_fields};
use super::validation::{clean_optional, normalize_email, FieldErrors};
use super::{ServiceError, ServiceResult};

const INVITATION_COLUMNS: &str = "i.id, i.owner_id, i.tenant_id, i.email, i.first_name, i.last_name, i.property_id, \
     i.unit_id, i.lease_id, i.code_hash, i.status, i.expires_at, i.accepted_at, i.accepted_by_user_id, \
     i.created_at, i.updated_at";

const RETURNING_INVITATION: &str = "RETURNING id, owner_id, tenant_id, email, first_name, last_name, property_id, \
     unit_id, lease_id, code_hash, status, expires_at, accepted_at, accepted_by_user_id, created_at, updated_at";

const EXPIRE_STALE: &str = "UPDATE tenant_invitations SET status = 'EXPIRED', updated_at = now() \
     WHERE status IN ('PENDING', 'SENT') AND expires_at <= now()";

const EXPIRE_LAPSED_FOR_EMAIL: &str = "UPDATE tenant_invitations SET status = 'EXPIRED', updated_at = now() \
     WHERE owner_id = $1 AND lower(email) = lower($2) AND status IN ('PENDING', 'SENT') AND expires_at <= now()";

const OUTSTANDING_FOR_EMAIL: &str = "SELECT EXISTS (SELECT 1 FROM tenant_invitations \
     WHERE owner_id = $1 AND lower(email) = lower($2) AND status IN ('PENDING', 'SENT') \
     AND expires_at > now() AND ($3::uuid IS NULL OR id <> $3))";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteTenantRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub property_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub lease_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInvitationRequest {
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvitationFilters {
    pub status: Option<InvitationStatus>,
}

/// Returned by invite and resend; the only place the plain code leaves the server
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationIssued {
    pub invitation_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub email: String,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub invitation_url: String,
}

/// Public preview shown on the accept page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationPreview {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub owner_name: String,
    pub property_name: Option<String>,
    pub unit_number: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct InvitationLookup {
    #[sqlx(flatten)]
    invitation: Invitation,
    owner_name: String,
    property_name: Option<String>,
    unit_number: Option<String>,
}

impl InviteTenantRequest {
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

/// 32 random bytes, lowercase hex
pub fn generate_code() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.to_ascii_lowercase().as_bytes()))
}

pub fn is_valid_code(code: &str) -> bool {
    code.len() == 64 && code.bytes().all(|b| b.is_ascii_hexdigit())
}

pub(crate) fn check_code(code: &str) -> ServiceResult<()> {
    if is_valid_code(code) {
        Ok(())
    } else {
        Err(ServiceError::bad_request("Invalid invitation code"))
    }
}

pub fn invitation_url(code: &str) -> String {
    format!(
        "{}/accept-invite?code={}",
        config::config().invitations.app_url.trim_end_matches('/'),
        code
    )
}

/// Reject invitations that can no longer be redeemed
fn ensure_redeemable(invitation: &Invitation, now: DateTime<Utc>) -> ServiceResult<()> {
    match invitation.effective_status(now) {
        InvitationStatus::Accepted => Err(ServiceError::conflict("Invitation has already been accepted")),
        InvitationStatus::Cancelled => Err(ServiceError::Gone("Invitation has been cancelled".to_string())),
        InvitationStatus::Expired => Err(ServiceError::Gone("Invitation has expired".to_string())),
        InvitationStatus::Pending | InvitationStatus::Sent => Ok(()),
    }
}

/// Resending is allowed until the invitation is accepted or cancelled
fn ensure_resendable(status: InvitationStatus) -> ServiceResult<()> {
    match status {
        InvitationStatus::Accepted => Err(ServiceError::conflict("Invitation has already been accepted")),
        InvitationStatus::Cancelled => Err(ServiceError::conflict("Invitation has been cancelled")),
        _ => Ok(()),
    }
}

/// Filter on the status a caller would observe, treating lapsed outstanding rows as expired
fn push_effective_status(q: &mut ListQuery, status: InvitationStatus) {
    match status {
        InvitationStatus::Expired => {
            q.and_where(
                "(i.status = 'EXPIRED' OR (i.status IN ('PENDING', 'SENT') AND i.expires_at <= now()))",
            );
        }
        InvitationStatus::Pending | InvitationStatus::Sent => {
            q.and_where_bind("i.status = ", status).and_where("i.expires_at > now()");
        }
        InvitationStatus::Accepted | InvitationStatus::Cancelled => {
            q.and_where_bind("i.status = ", status);
        }
    }
}

/// Expire this email's lapsed outstanding rows so they stop holding the one-outstanding slot
async fn release_lapsed(conn: &mut PgConnection, owner_id: Uuid, email: &str) -> ServiceResult<()> {
    sqlx::query(EXPIRE_LAPSED_FOR_EMAIL)
        .bind(owner_id)
        .bind(email)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn has_outstanding(conn: &mut PgConnection, owner_id: Uuid, email: &str, except: Option<Uuid>) -> ServiceResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>(OUTSTANDING_FOR_EMAIL)
        .bind(owner_id)
        .bind(email)
        .bind(except)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(config::config().invitations.expiry_days)
}

pub struct InvitationService {
    pool: PgPool,
}

impl InvitationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn invite(&self, owner_id: Uuid, request: InviteTenantRequest) -> ServiceResult<InvitationIssued> {
        request.validate()?;
        let email = normalize_email(&request.email);
        self.verify_links(owner_id, &request, &email).await?;

        let mut tx = self.pool.begin().await?;
        let plan = lock_owner(&mut tx, owner_id).await?;
        release_lapsed(&mut tx, owner_id, &email).await?;

        let existing = sqlx::query_as::<_, (Uuid, Option<Uuid>)>(
            "SELECT id, user_id FROM tenants WHERE owner_id = $1 AND lower(email) = $2 AND deleted_at IS NULL",
        )
        .bind(owner_id)
        .bind(&email)
        .fetch_optional(&mut *tx)
        .await?;
        if matches!(existing, Some((_, Some(_)))) {
            return Err(ServiceError::conflict("Tenant already has a platform account"));
        }

        if has_outstanding(&mut tx, owner_id, &email, None).await? {
            return Err(ServiceError::conflict("An active invitation already exists for this email"));
        }

        if existing.is_none() {
            ensure_tenant_capacity(&mut tx, owner_id, plan, 1).await?;
        }

        let code = generate_code();
        let expires_at = expiry_from(Utc::now());

        let tenant_id = match existing {
            Some((id, _)) => id,
            None => {
                sqlx::query_scalar::<_, Uuid>(
                    "INSERT INTO tenants (owner_id, first_name, last_name, email, phone, status) \
                     VALUES ($1, $2, $3, $4, $5, 'PENDING') RETURNING id",
                )
                .bind(owner_id)
                .bind(request.first_name.trim())
                .bind(request.last_name.trim())
                .bind(&email)
                .bind(clean_optional(request.phone.clone()))
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            "INSERT INTO tenant_invitations (owner_id, tenant_id, email, first_name, last_name, property_id, \
             unit_id, lease_id, code_hash, status, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'SENT', $10) {}",
            RETURNING_INVITATION
        ))
        .bind(owner_id)
        .bind(tenant_id)
        .bind(&email)
        .bind(request.first_name.trim())
        .bind(request.last_name.trim())
        .bind(request.property_id)
        .bind(request.unit_id)
        .bind(request.lease_id)
        .bind(hash_code(&code))
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(owner_id = %owner_id, invitation_id = %invitation.id, tenant_id = %tenant_id, "Invited tenant");
        Ok(self.issued(invitation, &code))
    }

    /// Every given link must be owned and consistent with the others
    async fn verify_links(&self, owner_id: Uuid, request: &InviteTenantRequest, email: &str) -> ServiceResult<()> {
        if let Some(property_id) = request.property_id {
            if !ownership::property_owned(&self.pool, owner_id, property_id).await? {
                return Err(ServiceError::not_found("Property"));
            }
        }
        if let Some(unit_id) = request.unit_id {
            if !ownership::unit_owned(&self.pool, owner_id, unit_id).await? {
                return Err(ServiceError::not_found("Unit"));
            }
            if let Some(property_id) = request.property_id {
                let unit_property = sqlx::query_scalar::<_, Uuid>("SELECT property_id FROM units WHERE id = $1")
                    .bind(unit_id)
                    .fetch_one(&self.pool)
                    .await?;
                if unit_property != property_id {
                    return Err(ServiceError::bad_request("Unit does not belong to the given property"));
                }
            }
        }
        if let Some(lease_id) = request.lease_id {
            if !ownership::lease_owned(&self.pool, owner_id, lease_id).await? {
                return Err(ServiceError::not_found("Lease"));
            }
            let lease_email = sqlx::query_scalar::<_, String>(
                "SELECT t.email FROM leases l JOIN tenants t ON t.id = l.tenant_id WHERE l.id = $1",
            )
            .bind(lease_id)
            .fetch_one(&self.pool)
            .await?;
            if normalize_email(&lease_email) != email {
                return Err(ServiceError::bad_request("Lease belongs to a tenant with a different email"));
            }
        }
        Ok(())
    }

    pub async fn list(&self, owner_id: Uuid, filters: InvitationFilters) -> ServiceResult<Vec<Invitation>> {
        let mut query = ListQuery::new(&format!("SELECT {} FROM tenant_invitations i", INVITATION_COLUMNS));
        query.and_where_bind("i.owner_id = ", owner_id);
        if let Some(status) = filters.status {
            push_effective_status(&mut query, status);
        }
        query.push(" ORDER BY i.created_at DESC, i.id");

        let now = Utc::now();
        let invitations = query
            .fetch_all::<Invitation>(&self.pool)
            .await?
            .into_iter()
            .map(|mut inv| {
                inv.status = inv.effective_status(now);
                inv
            })
            .collect();
        Ok(invitations)
    }

    pub async fn resend(&self, owner_id: Uuid, invitation_id: Uuid) -> ServiceResult<InvitationIssued> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, owner_id).await?;
        let current = self.lock_owned(&mut tx, owner_id, invitation_id).await?;
        ensure_resendable(current.status)?;

        release_lapsed(&mut tx, owner_id, &current.email).await?;
        if has_outstanding(&mut tx, owner_id, &current.email, Some(invitation_id)).await? {
            return Err(ServiceError::conflict("Another active invitation already exists for this email"));
        }

        let code = generate_code();
        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            "UPDATE tenant_invitations SET code_hash = $2, status = 'SENT', expires_at = $3, updated_at = now() \
             WHERE id = $1 {}",
            RETURNING_INVITATION
        ))
        .bind(invitation_id)
        .bind(hash_code(&code))
        .bind(expiry_from(Utc::now()))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(owner_id = %owner_id, invitation_id = %invitation_id, "Resent invitation");
        Ok(self.issued(invitation, &code))
    }

    pub async fn cancel(&self, owner_id: Uuid, invitation_id: Uuid) -> ServiceResult<Invitation> {
        let mut tx = self.pool.begin().await?;
        let current = self.lock_owned(&mut tx, owner_id, invitation_id).await?;
        if !current.effective_status(Utc::now()).is_outstanding() {
            return Err(ServiceError::conflict("Only pending or sent invitations can be cancelled"));
        }

        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            "UPDATE tenant_invitations SET status = 'CANCELLED', updated_at = now() WHERE id = $1 {}",
            RETURNING_INVITATION
        ))
        .bind(invitation_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        crate::audit!(owner_id = %owner_id, invitation_id = %invitation_id, "Cancelled invitation");
        Ok(invitation)
    }

    /// Public lookup by code
    pub async fn validate(&self, code: &str) -> ServiceResult<InvitationPreview> {
        check_code(code)?;
        let lookup = sqlx::query_as::<_, InvitationLookup>(&format!(
            "SELECT {}, o.full_name AS owner_name, p.name AS property_name, u.unit_number \
             FROM tenant_invitations i \
             JOIN users o ON o.id = i.owner_id \
             LEFT JOIN units u ON u.id = i.unit_id \
             LEFT JOIN properties p ON p.id = COALESCE(i.property_id, u.property_id) \
             WHERE i.code_hash = $1",
            INVITATION_COLUMNS
        ))
        .bind(hash_code(code))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Invitation"))?;

        ensure_redeemable(&lookup.invitation, Utc::now())?;

        let invitation = lookup.invitation;
        Ok(InvitationPreview {
            email: invitation.email,
            first_name: invitation.first_name,
            last_name: invitation.last_name,
            owner_name: lookup.owner_name,
            property_name: lookup.property_name,
            unit_number: lookup.unit_number,
            expires_at: invitation.expires_at,
        })
    }

    /// Redeem a code: create the TENANT account and link it to the tenant record
    pub async fn accept(&self, code: &str, request: AcceptInvitationRequest) -> ServiceResult<AuthResponse> {
        check_code(code)?;
        let mut errors = FieldErrors::default();
        errors.password("password", &request.password, config::config().security.min_password_length);
        if let Some(name) = request.full_name.as_deref() {
            errors.length("fullName", name, 1, 100);
        }
        errors.into_result()?;

        let password_hash = crate::auth::hash_password(&request.password).map_err(ServiceError::Internal)?;

        let mut tx = self.pool.begin().await?;
        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {} FROM tenant_invitations i WHERE i.code_hash = $1 FOR UPDATE",
            INVITATION_COLUMNS
        ))
        .bind(hash_code(code))
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Invitation"))?;
        ensure_redeemable(&invitation, Utc::now())?;

        let email_in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE lower(email) = lower($1))",
        )
        .bind(&invitation.email)
        .fetch_one(&mut *tx)
        .await?;
        if email_in_use {
            return Err(ServiceError::conflict("An account with this email already exists"));
        }

        let full_name = clean_optional(request.full_name)
            .unwrap_or_else(|| format!("{} {}", invitation.first_name, invitation.last_name));
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, full_name, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&invitation.email)
        .bind(&password_hash)
        .bind(&full_name)
        .bind(UserRole::Tenant)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(tenant_id) = invitation.tenant_id {
            sqlx::query(
                r#"
                UPDATE tenants SET user_id = $2,
                    status = CASE WHEN status = 'PENDING' THEN 'ACTIVE'::tenant_status ELSE status END,
                    updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(tenant_id)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE tenant_invitations SET status = 'ACCEPTED', accepted_at = now(), accepted_by_user_id = $2, \
             updated_at = now() WHERE id = $1",
        )
        .bind(invitation.id)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(invitation_id = %invitation.id, user_id = %user.id, "Invitation accepted");
        events::publish(DomainEvent::InvitationAccepted {
            invitation_id: invitation.id,
            owner_id: invitation.owner_id,
            tenant_id: invitation.tenant_id,
            user_id: user.id,
        });
        issue_token(&user)
    }

    /// Mark lapsed outstanding invitations as EXPIRED; returns how many changed
    pub async fn expire_stale(&self) -> ServiceResult<u64> {
        let result = sqlx::query(EXPIRE_STALE).execute(&self.pool).await?;
        let expired = result.rows_affected();
        if expired > 0 {
            tracing::info!(expired, "Expired stale invitations");
        }
        Ok(expired)
    }

    async fn lock_owned(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        owner_id: Uuid,
        invitation_id: Uuid,
    ) -> ServiceResult<Invitation> {
        sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {} FROM tenant_invitations i WHERE i.id = $1 AND i.owner_id = $2 FOR UPDATE",
            INVITATION_COLUMNS
        ))
        .bind(invitation_id)
        .bind(owner_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Invitation"))
    }

    /// Build the response and announce the invitation
    fn issued(&self, invitation: Invitation, code: &str) -> InvitationIssued {
        let url = invitation_url(code);
        events::publish(DomainEvent::TenantInvited {
            invitation_id: invitation.id,
            owner_id: invitation.owner_id,
            tenant_id: invitation.tenant_id.unwrap_or_default(),
            email: invitation.email.clone(),
            invitation_url: url.clone(),
            expires_at: invitation.expires_at,
        });
        InvitationIssued {
            invitation_id: invitation.id,
            tenant_id: invitation.tenant_id,
            email: invitation.email,
            status: invitation.status,
            expires_at: invitation.expires_at,
            invitation_url: url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation(status: InvitationStatus, expires_at: DateTime<Utc>) -> Invitation {
        let now = Utc::now();
        Invitation {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            tenant_id: Some(Uuid::new_v4()),
            email: "tina@example.com".into(),
            first_name: "Tina".into(),
            last_name: "Tenant".into(),
            property_id: None,
            unit_id: None,
            lease_id: None,
            code_hash: hash_code(&generate_code()),
            status,
            expires_at,
            accepted_at: None,
            accepted_by_user_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn codes_are_64_lowercase_hex_and_unique() {
        let a = generate_code();
        let b = generate_code();
        assert_eq!(a.len(), 64);
        assert!(is_valid_code(&a));
        assert_eq!(a, a.to_lowercase());
        assert_ne!(a, b);
    }

    #[test]
    fn code_format_check() {
        assert!(!is_valid_code("abc"));
        assert!(!is_valid_code(&"g".repeat(64)));
        assert!(!is_valid_code(&"a".repeat(65)));
        assert!(is_valid_code(&"A1".repeat(32)));
        assert!(matches!(check_code("not-a-code"), Err(ServiceError::BadRequest(_))));
    }

    #[test]
    fn malformed_code_is_the_public_bad_request() {
        let err = crate::error::ApiError::from(check_code("zzzz").unwrap_err());
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Invalid invitation code");
        assert!(check_code(&"ab".repeat(32)).is_ok());
    }

    #[test]
    fn hash_is_sha256_hex_and_case_insensitive() {
        let code = "ab".repeat(32);
        let hash = hash_code(&code);
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, code);
        assert_eq!(hash, hash_code(&code.to_uppercase()));
    }

    #[test]
    fn redeemable_statuses() {
        let now = Utc::now();
        let later = now + Duration::days(1);
        let earlier = now - Duration::days(1);

        assert!(ensure_redeemable(&invitation(InvitationStatus::Sent, later), now).is_ok());
        assert!(ensure_redeemable(&invitation(InvitationStatus::Pending, later), now).is_ok());
        assert!(matches!(
            ensure_redeemable(&invitation(InvitationStatus::Accepted, later), now),
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            ensure_redeemable(&invitation(InvitationStatus::Cancelled, later), now),
            Err(ServiceError::Gone(_))
        ));
        match ensure_redeemable(&invitation(InvitationStatus::Sent, earlier), now) {
            Err(ServiceError::Gone(message)) => assert_eq!(message, "Invitation has expired"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn resend_rules() {
        assert!(ensure_resendable(InvitationStatus::Pending).is_ok());
        assert!(ensure_resendable(InvitationStatus::Sent).is_ok());
        assert!(ensure_resendable(InvitationStatus::Expired).is_ok());
        assert!(ensure_resendable(InvitationStatus::Accepted).is_err());
        assert!(ensure_resendable(InvitationStatus::Cancelled).is_err());
    }

    #[test]
    fn url_carries_code() {
        let url = invitation_url("abc123");
        assert!(url.ends_with("/accept-invite?code=abc123"));
        assert!(!url.contains("//accept-invite"));
    }

    #[test]
    fn expired_filter_includes_lapsed_rows() {
        let mut q = ListQuery::new("SELECT * FROM tenant_invitations i");
        push_effective_status(&mut q, InvitationStatus::Expired);
        assert!(q.sql().contains("i.status IN ('PENDING', 'SENT') AND i.expires_at <= now()"));

        let mut q = ListQuery::new("SELECT * FROM tenant_invitations i");
        push_effective_status(&mut q, InvitationStatus::Sent);
        assert_eq!(
            q.sql(),
            "SELECT * FROM tenant_invitations i WHERE i.status = $1 AND i.expires_at > now()"
        );
    }

    #[test]
    fn sweep_and_reads_agree_on_the_expiry_instant() {
        let now = Utc::now();
        assert_eq!(invitation(InvitationStatus::Sent, now).effective_status(now), InvitationStatus::Expired);
        assert!(EXPIRE_STALE.contains("expires_at <= now()"));
        assert!(EXPIRE_LAPSED_FOR_EMAIL.contains("expires_at <= now()"));
        assert!(OUTSTANDING_FOR_EMAIL.contains("expires_at > now()"));
    }

    #[test]
    fn invite_validation() {
        let request = InviteTenantRequest {
            email: "bad".into(),
            first_name: "Tina".into(),
            last_name: "".into(),
            phone: None,
            property_id: None,
            unit_id: None,
            lease_id: None,
        };
        match request.validate() {
            Err(ServiceError::Validation(errors)) => {
                assert!(errors.get("email").is_some());
                assert!(errors.get("lastName").is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
