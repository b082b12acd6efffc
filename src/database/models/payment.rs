use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    Ach,
    Cash,
    Check,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RentPayment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub lease_id: Uuid,
    pub amount: Decimal,
    pub late_fee: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub due_date: NaiveDate,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RentPayment {
    /// A succeeded payment counts as late when it was paid after its due date
    pub fn is_late(&self) -> bool {
        match (self.status, self.paid_at) {
            (PaymentStatus::Succeeded, Some(paid_at)) => paid_at.date_naive() > self.due_date,
            _ => false,
        }
    }
}

/// Payment flattened with the unit and property of its lease
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWithRelations {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: RentPayment,
    pub tenant_name: String,
    pub unit_number: String,
    pub property_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payment(status: PaymentStatus, due: NaiveDate, paid_at: Option<DateTime<Utc>>) -> RentPayment {
        RentPayment {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            lease_id: Uuid::new_v4(),
            amount: Decimal::new(150000, 2),
            late_fee: Decimal::ZERO,
            currency: "usd".into(),
            status,
            payment_method: PaymentMethod::Ach,
            due_date: due,
            paid_at,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn lateness_uses_paid_date() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let on_time = Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 3, 2, 0, 30, 0).unwrap();

        assert!(!payment(PaymentStatus::Succeeded, due, Some(on_time)).is_late());
        assert!(payment(PaymentStatus::Succeeded, due, Some(late)).is_late());
        assert!(!payment(PaymentStatus::Failed, due, Some(late)).is_late());
        assert!(!payment(PaymentStatus::Pending, due, None).is_late());
    }

    #[test]
    fn amounts_serialize_as_decimal_strings() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let v = serde_json::to_value(payment(PaymentStatus::Pending, due, None)).unwrap();
        assert_eq!(v["amount"], "1500.00");
        assert_eq!(v["paymentMethod"], "ACH");
        assert_eq!(v["dueDate"], "2026-03-01");
    }
}
