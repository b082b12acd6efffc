use axum::Extension;

use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};

/// GET /api/auth/whoami - The caller as currently stored
pub async fn whoami(Extension(user): Extension<ValidatedUser>) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(UserProfile {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        role: user.role,
        subscription_plan: user.subscription_plan,
    }))
}
