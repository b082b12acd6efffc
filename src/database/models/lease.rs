use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lease_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaseStatus {
    Draft,
    Active,
    Ended,
    Terminated,
}

impl LeaseStatus {
    /// Draft and active leases still hold the unit and may be edited
    pub fn is_open(&self) -> bool {
        matches!(self, LeaseStatus::Draft | LeaseStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub tenant_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rent_amount: Decimal,
    pub security_deposit: Decimal,
    pub payment_day: i16,
    pub status: LeaseStatus,
    pub terms: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lease flattened with its tenant, unit and property
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaseWithRelations {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub lease: Lease,
    pub tenant_name: String,
    pub tenant_email: String,
    pub unit_number: String,
    pub property_id: Uuid,
    pub property_name: String,
}
