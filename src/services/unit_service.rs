use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Unit, UnitStatus};
use crate::database::{ownership, ListQuery};

use super::validation::FieldErrors;
use super::{ServiceError, ServiceResult};

const UNIT_COLUMNS: &str = "u.id, u.property_id, u.unit_number, u.bedrooms, u.bathrooms, u.square_feet, \
     u.rent_amount, u.status, u.created_at, u.updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitFilters {
    pub property_id: Option<Uuid>,
    pub status: Option<UnitStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUnitRequest {
    pub property_id: Uuid,
    pub unit_number: String,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<Decimal>,
    pub square_feet: Option<i32>,
    pub rent_amount: Decimal,
    pub status: Option<UnitStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUnitRequest {
    pub unit_number: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<Decimal>,
    pub square_feet: Option<i32>,
    pub rent_amount: Option<Decimal>,
    pub status: Option<UnitStatus>,
}

fn validate_unit(
    unit_number: &str,
    bedrooms: i32,
    bathrooms: Decimal,
    square_feet: Option<i32>,
    rent_amount: Decimal,
) -> ServiceResult<()> {
    let mut errors = FieldErrors::default();
    errors.length("unitNumber", unit_number, 1, 20);
    if bedrooms < 0 {
        errors.add("bedrooms", "Must be 0 or more");
    }
    if bathrooms < Decimal::ZERO {
        errors.add("bathrooms", "Must be 0 or more");
    }
    errors.numeric("bathrooms", bathrooms, 3, 1);
    if matches!(square_feet, Some(sq) if sq <= 0) {
        errors.add("squareFeet", "Must be greater than 0");
    }
    if rent_amount < Decimal::ZERO {
        errors.add("rentAmount", "Must be 0 or more");
    }
    errors.money("rentAmount", rent_amount);
    errors.into_result()
}

pub struct UnitService {
    pool: PgPool,
}

impl UnitService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, owner_id: Uuid, filters: UnitFilters) -> ServiceResult<Vec<Unit>> {
        let mut query = ListQuery::new(&format!(
            "SELECT {} FROM units u JOIN properties p ON p.id = u.property_id",
            UNIT_COLUMNS
        ));
        query
            .and_where("u.deleted_at IS NULL AND p.deleted_at IS NULL")
            .and_where_bind("p.owner_id = ", owner_id);
        if let Some(property_id) = filters.property_id {
            query.and_where_bind("u.property_id = ", property_id);
        }
        if let Some(status) = filters.status {
            query.and_where_bind("u.status = ", status);
        }
        query.push(" ORDER BY p.name, u.unit_number, u.id");
        Ok(query.fetch_all::<Unit>(&self.pool).await?)
    }

    pub async fn get(&self, owner_id: Uuid, unit_id: Uuid) -> ServiceResult<Unit> {
        sqlx::query_as::<_, Unit>(&format!(
            "SELECT {} FROM units u JOIN properties p ON p.id = u.property_id \
             WHERE u.id = $1 AND p.owner_id = $2 AND u.deleted_at IS NULL AND p.deleted_at IS NULL",
            UNIT_COLUMNS
        ))
        .bind(unit_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Unit"))
    }

    pub async fn create(&self, owner_id: Uuid, request: CreateUnitRequest) -> ServiceResult<Unit> {
        let bedrooms = request.bedrooms.unwrap_or(1);
        let bathrooms = request.bathrooms.unwrap_or(Decimal::ONE);
        validate_unit(&request.unit_number, bedrooms, bathrooms, request.square_feet, request.rent_amount)?;

        if !ownership::property_owned(&self.pool, owner_id, request.property_id).await? {
            return Err(ServiceError::not_found("Property"));
        }
        self.ensure_unit_number_free(request.property_id, &request.unit_number, None).await?;

        let unit = sqlx::query_as::<_, Unit>(
            r#"
            INSERT INTO units (property_id, unit_number, bedrooms, bathrooms, square_feet, rent_amount, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, property_id, unit_number, bedrooms, bathrooms, square_feet, rent_amount,
                      status, created_at, updated_at
            "#,
        )
        .bind(request.property_id)
        .bind(request.unit_number.trim())
        .bind(bedrooms)
        .bind(bathrooms)
        .bind(request.square_feet)
        .bind(request.rent_amount)
        .bind(request.status.unwrap_or(UnitStatus::Vacant))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(owner_id = %owner_id, unit_id = %unit.id, "Created unit");
        Ok(unit)
    }

    pub async fn update(&self, owner_id: Uuid, unit_id: Uuid, request: UpdateUnitRequest) -> ServiceResult<Unit> {
        let current = self.get(owner_id, unit_id).await?;

        let unit_number = request.unit_number.unwrap_or_else(|| current.unit_number.clone());
        let bedrooms = request.bedrooms.unwrap_or(current.bedrooms);
        let bathrooms = request.bathrooms.unwrap_or(current.bathrooms);
        let square_feet = request.square_feet.or(current.square_feet);
        let rent_amount = request.rent_amount.unwrap_or(current.rent_amount);
        validate_unit(&unit_number, bedrooms, bathrooms, square_feet, rent_amount)?;

        if !unit_number.trim().eq_ignore_ascii_case(current.unit_number.trim()) {
            self.ensure_unit_number_free(current.property_id, &unit_number, Some(unit_id)).await?;
        }

        let unit = sqlx::query_as::<_, Unit>(
            r#"
            UPDATE units SET
                unit_number = $2, bedrooms = $3, bathrooms = $4, square_feet = $5,
                rent_amount = $6, status = $7, updated_at = now()
            WHERE id = $1
            RETURNING id, property_id, unit_number, bedrooms, bathrooms, square_feet, rent_amount,
                      status, created_at, updated_at
            "#,
        )
        .bind(unit_id)
        .bind(unit_number.trim())
        .bind(bedrooms)
        .bind(bathrooms)
        .bind(square_feet)
        .bind(rent_amount)
        .bind(request.status.unwrap_or(current.status))
        .fetch_one(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Soft delete; refused while the unit is under an active lease
    pub async fn delete(&self, owner_id: Uuid, unit_id: Uuid) -> ServiceResult<()> {
        self.get(owner_id, unit_id).await?;

        let active = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM leases WHERE unit_id = $1 AND status = 'ACTIVE')",
        )
        .bind(unit_id)
        .fetch_one(&self.pool)
        .await?;
        if active {
            return Err(ServiceError::conflict("Unit has an active lease and cannot be deleted"));
        }

        sqlx::query("UPDATE units SET deleted_at = now(), updated_at = now() WHERE id = $1")
            .bind(unit_id)
            .execute(&self.pool)
            .await?;

        crate::audit!(owner_id = %owner_id, unit_id = %unit_id, "Deleted unit");
        Ok(())
    }

    async fn ensure_unit_number_free(
        &self,
        property_id: Uuid,
        unit_number: &str,
        except: Option<Uuid>,
    ) -> ServiceResult<()> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM units
                WHERE property_id = $1 AND lower(unit_number) = lower($2) AND deleted_at IS NULL
                  AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(property_id)
        .bind(unit_number.trim())
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        if taken {
            return Err(ServiceError::conflict(format!(
                "Unit number '{}' already exists for this property",
                unit_number.trim()
            )));
        }
        Ok(())
    }
}
