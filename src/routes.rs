use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, require_owner, require_tenant, validate_user_middleware};

/// Build the full application router
pub fn app() -> Router {
    let limits = &config::config().api;

    Router::new()
        .merge(public_routes())
        .merge(protected_routes())
        .layer(DefaultBodyLimit::max(limits.max_request_size_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/register", post(public::auth_register))
        .route("/auth/login", post(public::auth_login))
        .route("/invitations/:code", get(public::invitation_validate))
        .route("/invitations/:code/accept", post(public::invitation_accept))
}

/// Everything under /api. Layers added last run first: JWT, then user validation,
/// then the per-group role guard.
fn protected_routes() -> Router {
    Router::new()
        .route("/api/auth/whoami", get(protected::auth::whoami))
        .merge(owner_routes().route_layer(from_fn(require_owner)))
        .merge(portal_routes().route_layer(from_fn(require_tenant)))
        .route_layer(from_fn(validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn owner_routes() -> Router {
    Router::new()
        .merge(property_routes())
        .merge(unit_routes())
        .merge(tenant_routes())
        .merge(lease_routes())
        .merge(invitation_routes())
        .merge(payment_routes())
}

fn property_routes() -> Router {
    use protected::properties;

    Router::new()
        .route("/api/properties", get(properties::list).post(properties::create))
        .route(
            "/api/properties/:id",
            get(properties::get)
                .put(properties::update)
                .patch(properties::update)
                .delete(properties::delete),
        )
}

fn unit_routes() -> Router {
    use protected::units;

    Router::new()
        .route("/api/units", get(units::list).post(units::create))
        .route(
            "/api/units/:id",
            get(units::get).put(units::update).patch(units::update).delete(units::delete),
        )
}

fn tenant_routes() -> Router {
    use protected::{emergency_contacts, payments, tenants};

    Router::new()
        .route("/api/tenants", get(tenants::list).post(tenants::create))
        .route("/api/tenants/stats", get(tenants::stats))
        .route(
            "/api/tenants/:id",
            get(tenants::get)
                .put(tenants::update)
                .patch(tenants::update)
                .delete(tenants::delete),
        )
        .route("/api/tenants/:id/move-out", post(tenants::move_out))
        .route("/api/tenants/:id/leases", get(tenants::leases))
        .route("/api/tenants/:id/payments", get(payments::history).post(payments::record))
        .route("/api/tenants/:id/payments/summary", get(payments::summary))
        .route(
            "/api/tenants/:id/emergency-contact",
            get(emergency_contacts::get)
                .post(emergency_contacts::create)
                .put(emergency_contacts::update)
                .patch(emergency_contacts::update)
                .delete(emergency_contacts::delete),
        )
}

fn lease_routes() -> Router {
    use protected::leases;

    Router::new()
        .route("/api/leases", get(leases::list).post(leases::create))
        .route("/api/leases/expiring", get(leases::expiring))
        .route(
            "/api/leases/:id",
            get(leases::get).put(leases::update).patch(leases::update),
        )
        .route("/api/leases/:id/terminate", post(leases::terminate))
}

fn invitation_routes() -> Router {
    use protected::invitations;

    Router::new()
        .route("/api/invitations", get(invitations::list).post(invitations::create))
        .route("/api/invitations/:id/resend", post(invitations::resend))
        .route("/api/invitations/:id/cancel", post(invitations::cancel))
}

fn payment_routes() -> Router {
    Router::new().route("/api/payments/failed", get(protected::payments::failed))
}

fn portal_routes() -> Router {
    use protected::portal;

    Router::new()
        .route("/api/portal/profile", get(portal::profile))
        .route("/api/portal/payments", get(portal::payments))
}

fn cors_layer() -> CorsLayer {
    let origins = &config::config().security.cors_origins;
    if crate::is_development!() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
