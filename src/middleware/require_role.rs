use axum::{extract::Request, middleware::Next, response::Response};

use crate::database::models::UserRole;
use crate::error::ApiError;
use super::validate_user::ValidatedUser;

fn validated_role(request: &Request) -> Result<UserRole, ApiError> {
    request
        .extensions()
        .get::<ValidatedUser>()
        .map(|user| user.role)
        .ok_or_else(|| ApiError::unauthorized("User validation required before role check"))
}

/// Owner endpoints; admins pass as well
pub async fn require_owner(request: Request, next: Next) -> Result<Response, ApiError> {
    if !validated_role(&request)?.can_manage_properties() {
        return Err(ApiError::forbidden("Owner access required"));
    }
    Ok(next.run(request).await)
}

/// Tenant portal endpoints
pub async fn require_tenant(request: Request, next: Next) -> Result<Response, ApiError> {
    if validated_role(&request)? != UserRole::Tenant {
        return Err(ApiError::forbidden("Tenant access required"));
    }
    Ok(next.run(request).await)
}
