use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Property, PropertyStatus, PropertyType, PropertyWithCounts};
use crate::database::{ListQuery, Page};

use super::validation::{clean_optional, FieldErrors};
use super::{Paginated, ServiceError, ServiceResult};

const PROPERTY_COLUMNS: &str = "p.id, p.owner_id, p.name, p.address_line1, p.address_line2, p.city, p.state, \
     p.postal_code, p.country, p.property_type, p.status, p.created_at, p.updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilters {
    pub status: Option<PropertyStatus>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    pub name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: Option<String>,
    pub property_type: Option<PropertyType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyRequest {
    pub name: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub property_type: Option<PropertyType>,
    pub status: Option<PropertyStatus>,
}

fn validate_address(
    errors: &mut FieldErrors,
    name: &str,
    address_line1: &str,
    city: &str,
    state: &str,
    postal_code: &str,
    country: &str,
) {
    errors.length("name", name, 1, 200);
    errors.length("addressLine1", address_line1, 1, 200);
    errors.length("city", city, 1, 100);
    errors.length("state", state, 2, 50);
    errors.length("postalCode", postal_code, 3, 20);
    errors.length("country", country, 2, 2);
}

impl CreatePropertyRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        let mut errors = FieldErrors::default();
        validate_address(
            &mut errors,
            &self.name,
            &self.address_line1,
            &self.city,
            &self.state,
            &self.postal_code,
            self.country.as_deref().unwrap_or("US"),
        );
        errors.into_result()
    }
}

pub struct PropertyService {
    pool: PgPool,
}

impl PropertyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, owner_id: Uuid, filters: PropertyFilters) -> ServiceResult<Paginated<PropertyWithCounts>> {
        let page = Page::new(filters.limit, filters.offset);
        let apply = |q: &mut ListQuery| {
            q.and_where("p.deleted_at IS NULL").and_where_bind("p.owner_id = ", owner_id);
            if let Some(status) = filters.status {
                q.and_where_bind("p.status = ", status);
            }
            if let Some(search) = filters.search.as_deref() {
                q.and_search(&["p.name", "p.address_line1", "p.city"], search);
            }
        };

        let mut count = ListQuery::new("SELECT COUNT(*) FROM properties p");
        apply(&mut count);
        let total = count.fetch_count(&self.pool).await?;

        let mut query = ListQuery::new(&format!(
            "SELECT {}, \
                COUNT(u.id) AS unit_count, \
                COUNT(u.id) FILTER (WHERE u.status = 'OCCUPIED') AS occupied_units \
             FROM properties p \
             LEFT JOIN units u ON u.property_id = p.id AND u.deleted_at IS NULL",
            PROPERTY_COLUMNS
        ));
        apply(&mut query);
        query
            .push(" GROUP BY p.id")
            .push(" ORDER BY p.created_at DESC, p.id")
            .paginate(page);
        let items = query.fetch_all::<PropertyWithCounts>(&self.pool).await?;

        Ok(Paginated { items, total, limit: page.limit, offset: page.offset })
    }

    pub async fn get(&self, owner_id: Uuid, property_id: Uuid) -> ServiceResult<Property> {
        sqlx::query_as::<_, Property>(&format!(
            "SELECT {} FROM properties p WHERE p.id = $1 AND p.owner_id = $2 AND p.deleted_at IS NULL",
            PROPERTY_COLUMNS
        ))
        .bind(property_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Property"))
    }

    pub async fn create(&self, owner_id: Uuid, request: CreatePropertyRequest) -> ServiceResult<Property> {
        request.validate()?;
        let property = sqlx::query_as::<_, Property>(
            r#"
            INSERT INTO properties
                (owner_id, name, address_line1, address_line2, city, state, postal_code, country, property_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, owner_id, name, address_line1, address_line2, city, state, postal_code,
                      country, property_type, status, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(request.name.trim())
        .bind(request.address_line1.trim())
        .bind(clean_optional(request.address_line2))
        .bind(request.city.trim())
        .bind(request.state.trim())
        .bind(request.postal_code.trim())
        .bind(request.country.as_deref().unwrap_or("US").trim().to_uppercase())
        .bind(request.property_type.unwrap_or(PropertyType::SingleFamily))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(owner_id = %owner_id, property_id = %property.id, "Created property");
        Ok(property)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        property_id: Uuid,
        request: UpdatePropertyRequest,
    ) -> ServiceResult<Property> {
        let current = self.get(owner_id, property_id).await?;

        let name = request.name.unwrap_or(current.name);
        let address_line1 = request.address_line1.unwrap_or(current.address_line1);
        let address_line2 = match request.address_line2 {
            Some(v) => clean_optional(Some(v)),
            None => current.address_line2,
        };
        let city = request.city.unwrap_or(current.city);
        let state = request.state.unwrap_or(current.state);
        let postal_code = request.postal_code.unwrap_or(current.postal_code);
        let country = request.country.map(|c| c.trim().to_uppercase()).unwrap_or(current.country);

        let mut errors = FieldErrors::default();
        validate_address(&mut errors, &name, &address_line1, &city, &state, &postal_code, &country);
        errors.into_result()?;

        let property = sqlx::query_as::<_, Property>(
            r#"
            UPDATE properties SET
                name = $3, address_line1 = $4, address_line2 = $5, city = $6, state = $7,
                postal_code = $8, country = $9, property_type = $10, status = $11, updated_at = now()
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL
            RETURNING id, owner_id, name, address_line1, address_line2, city, state, postal_code,
                      country, property_type, status, created_at, updated_at
            "#,
        )
        .bind(property_id)
        .bind(owner_id)
        .bind(name.trim())
        .bind(address_line1.trim())
        .bind(address_line2)
        .bind(city.trim())
        .bind(state.trim())
        .bind(postal_code.trim())
        .bind(country)
        .bind(request.property_type.unwrap_or(current.property_type))
        .bind(request.status.unwrap_or(current.status))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Property"))?;

        Ok(property)
    }

    /// Soft delete; refused while any unit is under an active lease
    pub async fn delete(&self, owner_id: Uuid, property_id: Uuid) -> ServiceResult<()> {
        self.get(owner_id, property_id).await?;

        let active_leases = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM leases l
            JOIN units u ON u.id = l.unit_id
            WHERE u.property_id = $1 AND l.status = 'ACTIVE'
            "#,
        )
        .bind(property_id)
        .fetch_one(&self.pool)
        .await?;
        if active_leases > 0 {
            return Err(ServiceError::conflict("Property has active leases and cannot be deleted"));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE units SET deleted_at = now(), updated_at = now() WHERE property_id = $1 AND deleted_at IS NULL")
            .bind(property_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE properties SET deleted_at = now(), updated_at = now() WHERE id = $1 AND owner_id = $2")
            .bind(property_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        crate::audit!(owner_id = %owner_id, property_id = %property_id, "Deleted property");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreatePropertyRequest {
        CreatePropertyRequest {
            name: "Elm Street Duplex".into(),
            address_line1: "12 Elm St".into(),
            address_line2: None,
            city: "Austin".into(),
            state: "TX".into(),
            postal_code: "78701".into(),
            country: None,
            property_type: None,
        }
    }

    #[test]
    fn valid_property_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn country_must_be_two_letters() {
        let mut r = request();
        r.country = Some("USA".into());
        match r.validate() {
            Err(ServiceError::Validation(errors)) => assert!(errors.get("country").is_some()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn filters_deserialize_from_query_names() {
        let filters: PropertyFilters =
            serde_json::from_value(serde_json::json!({"status": "ACTIVE", "limit": 5})).unwrap();
        assert_eq!(filters.status, Some(PropertyStatus::Active));
        assert_eq!(filters.limit, Some(5));
    }
}
