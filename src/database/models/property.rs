use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "property_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    SingleFamily,
    Apartment,
    Condo,
    Townhouse,
    Commercial,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "property_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyStatus {
    Active,
    Inactive,
    Sold,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub property_type: PropertyType,
    pub status: PropertyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Property list row with unit occupancy counts joined in
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PropertyWithCounts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    pub unit_count: i64,
    pub occupied_units: i64,
}

impl Property {
    /// Single-line postal address used in flattened views
    pub fn full_address(&self) -> String {
        format_address(
            &self.address_line1,
            self.address_line2.as_deref(),
            &self.city,
            &self.state,
            &self.postal_code,
        )
    }
}

pub fn format_address(line1: &str, line2: Option<&str>, city: &str, state: &str, postal_code: &str) -> String {
    let mut street = line1.trim().to_string();
    if let Some(line2) = line2.map(str::trim).filter(|s| !s.is_empty()) {
        street.push_str(", ");
        street.push_str(line2);
    }
    format!("{}, {}, {} {}", street, city.trim(), state.trim(), postal_code.trim())
}
