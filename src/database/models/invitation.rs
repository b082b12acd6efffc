use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
    Sent,
    Accepted,
    Expired,
    Cancelled,
}

impl InvitationStatus {
    /// Pending and sent invitations can still be accepted (subject to expiry)
    pub fn is_outstanding(&self) -> bool {
        matches!(self, InvitationStatus::Pending | InvitationStatus::Sent)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub property_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub lease_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub code_hash: String,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invitation {
    /// Status as observed at `now`: outstanding rows past their expiry read as expired
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.status.is_outstanding() && self.expires_at <= now {
            InvitationStatus::Expired
        } else {
            self.status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invitation(status: InvitationStatus, expires_at: DateTime<Utc>) -> Invitation {
        let now = Utc::now();
        Invitation {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            tenant_id: None,
            email: "tina@example.com".into(),
            first_name: "Tina".into(),
            last_name: "Tenant".into(),
            property_id: None,
            unit_id: None,
            lease_id: None,
            code_hash: "0".repeat(64),
            status,
            expires_at,
            accepted_at: None,
            accepted_by_user_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn outstanding_past_expiry_reads_expired() {
        let now = Utc::now();
        let inv = invitation(InvitationStatus::Sent, now - Duration::hours(1));
        assert_eq!(inv.effective_status(now), InvitationStatus::Expired);

        let inv = invitation(InvitationStatus::Pending, now + Duration::days(2));
        assert_eq!(inv.effective_status(now), InvitationStatus::Pending);
    }

    #[test]
    fn terminal_statuses_are_kept() {
        let now = Utc::now();
        let inv = invitation(InvitationStatus::Accepted, now - Duration::days(30));
        assert_eq!(inv.effective_status(now), InvitationStatus::Accepted);
        let inv = invitation(InvitationStatus::Cancelled, now - Duration::days(30));
        assert_eq!(inv.effective_status(now), InvitationStatus::Cancelled);
    }

    #[test]
    fn code_hash_is_never_serialized() {
        let inv = invitation(InvitationStatus::Sent, Utc::now());
        let v = serde_json::to_value(&inv).unwrap();
        assert!(v.get("codeHash").is_none());
        assert_eq!(v["firstName"], "Tina");
    }
}
