pub mod auth_service;
pub mod emergency_contact_service;
pub mod error;
pub mod invitation_service;
pub mod lease_service;
pub mod payment_service;
pub mod property_service;
pub mod tenant_query_service;
pub mod tenant_service;
pub mod tenant_stats_service;
pub mod unit_service;
pub mod validation;

pub use auth_service::AuthService;
pub use emergency_contact_service::EmergencyContactService;
pub use error::{ServiceError, ServiceResult};
pub use invitation_service::InvitationService;
pub use lease_service::LeaseService;
pub use payment_service::PaymentService;
pub use property_service::PropertyService;
pub use tenant_query_service::TenantQueryService;
pub use tenant_service::TenantService;
pub use tenant_stats_service::TenantStatsService;
pub use unit_service::UnitService;
pub use validation::FieldErrors;

use serde::Serialize;

/// One page of a list endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
