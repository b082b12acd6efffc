use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::lease::LeaseStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tenant_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantStatus {
    Pending,
    Active,
    Inactive,
    MovedOut,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub status: TenantStatus,
    pub move_out_date: Option<NaiveDate>,
    pub move_out_reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Tenant joined with its current lease, unit and property, flattened into one row.
/// Lease columns are null when the tenant has no lease.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TenantWithCurrentLease {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tenant: Tenant,
    pub lease_id: Option<Uuid>,
    pub lease_status: Option<LeaseStatus>,
    pub lease_start_date: Option<NaiveDate>,
    pub lease_end_date: Option<NaiveDate>,
    pub rent_amount: Option<Decimal>,
    pub unit_id: Option<Uuid>,
    pub unit_number: Option<String>,
    pub property_id: Option<Uuid>,
    pub property_name: Option<String>,
    pub property_address: Option<String>,
}
