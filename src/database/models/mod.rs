pub mod emergency_contact;
pub mod invitation;
pub mod lease;
pub mod payment;
pub mod property;
pub mod tenant;
pub mod unit;
pub mod user;

pub use emergency_contact::EmergencyContact;
pub use invitation::{Invitation, InvitationStatus};
pub use lease::{Lease, LeaseStatus, LeaseWithRelations};
pub use payment::{PaymentMethod, PaymentStatus, PaymentWithRelations, RentPayment};
pub use property::{Property, PropertyStatus, PropertyType, PropertyWithCounts};
pub use tenant::{Tenant, TenantStatus, TenantWithCurrentLease};
pub use unit::{Unit, UnitStatus};
pub use user::{SubscriptionPlan, User, UserProfile, UserRole};
