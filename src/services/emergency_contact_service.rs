use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::EmergencyContact;
use crate::database::ownership;

use super::validation::{clean_optional, normalize_email, FieldErrors};
use super::{ServiceError, ServiceResult};

const CONTACT_COLUMNS: &str = "id, tenant_id, contact_name, relationship, phone, email, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmergencyContactRequest {
    pub contact_name: String,
    pub relationship: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmergencyContactRequest {
    pub contact_name: Option<String>,
    pub relationship: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

fn validate_contact(contact_name: &str, relationship: &str, phone: &str, email: Option<&str>) -> ServiceResult<()> {
    let mut errors = FieldErrors::default();
    errors.length("contactName", contact_name, 1, 100);
    errors.length("relationship", relationship, 1, 50);
    errors.phone("phone", phone);
    if let Some(email) = email {
        errors.email("email", email);
    }
    errors.into_result()
}

pub struct EmergencyContactService {
    pool: PgPool,
}

impl EmergencyContactService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, owner_id: Uuid, tenant_id: Uuid) -> ServiceResult<Option<EmergencyContact>> {
        self.ensure_tenant(owner_id, tenant_id).await?;
        self.find(tenant_id).await
    }

    pub(crate) async fn find(&self, tenant_id: Uuid) -> ServiceResult<Option<EmergencyContact>> {
        let contact = sqlx::query_as::<_, EmergencyContact>(&format!(
            "SELECT {} FROM emergency_contacts WHERE tenant_id = $1",
            CONTACT_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contact)
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        tenant_id: Uuid,
        request: CreateEmergencyContactRequest,
    ) -> ServiceResult<EmergencyContact> {
        let email = clean_optional(request.email).map(|e| normalize_email(&e));
        validate_contact(&request.contact_name, &request.relationship, &request.phone, email.as_deref())?;
        self.ensure_tenant(owner_id, tenant_id).await?;

        if self.find(tenant_id).await?.is_some() {
            return Err(ServiceError::conflict("Tenant already has an emergency contact"));
        }

        let contact = sqlx::query_as::<_, EmergencyContact>(&format!(
            "INSERT INTO emergency_contacts (tenant_id, contact_name, relationship, phone, email) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            CONTACT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(request.contact_name.trim())
        .bind(request.relationship.trim())
        .bind(request.phone.trim())
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ServiceError::conflict("Tenant already has an emergency contact")
            }
            _ => ServiceError::from(e),
        })?;

        Ok(contact)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        tenant_id: Uuid,
        request: UpdateEmergencyContactRequest,
    ) -> ServiceResult<EmergencyContact> {
        self.ensure_tenant(owner_id, tenant_id).await?;
        let current = self
            .find(tenant_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Emergency contact"))?;

        let contact_name = request.contact_name.unwrap_or(current.contact_name);
        let relationship = request.relationship.unwrap_or(current.relationship);
        let phone = request.phone.unwrap_or(current.phone);
        let email = match request.email {
            Some(e) => clean_optional(Some(e)).map(|e| normalize_email(&e)),
            None => current.email,
        };
        validate_contact(&contact_name, &relationship, &phone, email.as_deref())?;

        let contact = sqlx::query_as::<_, EmergencyContact>(&format!(
            "UPDATE emergency_contacts SET contact_name = $2, relationship = $3, phone = $4, email = $5, \
             updated_at = now() WHERE tenant_id = $1 RETURNING {}",
            CONTACT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(contact_name.trim())
        .bind(relationship.trim())
        .bind(phone.trim())
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(contact)
    }

    pub async fn delete(&self, owner_id: Uuid, tenant_id: Uuid) -> ServiceResult<()> {
        self.ensure_tenant(owner_id, tenant_id).await?;
        let result = sqlx::query("DELETE FROM emergency_contacts WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("Emergency contact"));
        }
        Ok(())
    }

    async fn ensure_tenant(&self, owner_id: Uuid, tenant_id: Uuid) -> ServiceResult<()> {
        if ownership::tenant_owned(&self.pool, owner_id, tenant_id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("Tenant"))
        }
    }
}
