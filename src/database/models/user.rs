use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Owner,
    Tenant,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Owner => "OWNER",
            UserRole::Tenant => "TENANT",
            UserRole::Admin => "ADMIN",
        }
    }

    /// Admins are allowed through every owner guard
    pub fn can_manage_properties(&self) -> bool {
        matches!(self, UserRole::Owner | UserRole::Admin)
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OWNER" => Ok(UserRole::Owner),
            "TENANT" => Ok(UserRole::Tenant),
            "ADMIN" => Ok(UserRole::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_plan", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionPlan {
    Freetrial,
    Starter,
    Growth,
    Max,
}

impl SubscriptionPlan {
    /// Maximum number of tenant records an owner may hold. `None` means unlimited.
    pub fn tenant_limit(&self) -> Option<i64> {
        match self {
            SubscriptionPlan::Freetrial => Some(5),
            SubscriptionPlan::Starter => Some(25),
            SubscriptionPlan::Growth => Some(100),
            SubscriptionPlan::Max => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Freetrial => "FREETRIAL",
            SubscriptionPlan::Starter => "STARTER",
            SubscriptionPlan::Growth => "GROWTH",
            SubscriptionPlan::Max => "MAX",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub subscription_plan: SubscriptionPlan,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Public view of a user, returned by auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub subscription_plan: SubscriptionPlan,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            subscription_plan: user.subscription_plan,
        }
    }
}
