use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::database::DatabaseManager;

/// GET / - Service banner with the route map
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "TenantFlow API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Property management backend: owners, properties, units, tenants, leases, invitations, payments",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/register, /auth/login (public - token acquisition)",
                "invitations": "/invitations/:code[/accept] (public - invitation redemption)",
                "whoami": "/api/auth/whoami (protected)",
                "properties": "/api/properties[/:id] (owner)",
                "units": "/api/units[/:id] (owner)",
                "tenants": "/api/tenants[/:id][/leases|/payments|/emergency-contact|/move-out] (owner)",
                "leases": "/api/leases[/:id][/terminate], /api/leases/expiring (owner)",
                "owner_invitations": "/api/invitations[/:id/resend|/:id/cancel] (owner)",
                "payments": "/api/payments/failed (owner)",
                "portal": "/api/portal/profile, /api/portal/payments (tenant)",
            }
        }
    }))
}

/// GET /health - Liveness plus database reachability
pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable"
                    }
                })),
            )
        }
    }
}
