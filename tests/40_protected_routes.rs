mod common;

use axum::http::{Method, StatusCode};
use uuid::Uuid;

fn protected_routes() -> Vec<(Method, String)> {
    let id = Uuid::new_v4();
    vec![
        (Method::GET, "/api/properties".into()),
        (Method::POST, "/api/properties".into()),
        (Method::GET, format!("/api/properties/{}", id)),
        (Method::PATCH, format!("/api/properties/{}", id)),
        (Method::DELETE, format!("/api/properties/{}", id)),
        (Method::GET, "/api/units".into()),
        (Method::GET, format!("/api/units/{}", id)),
        (Method::GET, "/api/tenants".into()),
        (Method::GET, "/api/tenants/stats".into()),
        (Method::GET, format!("/api/tenants/{}", id)),
        (Method::DELETE, format!("/api/tenants/{}", id)),
        (Method::POST, format!("/api/tenants/{}/move-out", id)),
        (Method::GET, format!("/api/tenants/{}/leases", id)),
        (Method::GET, format!("/api/tenants/{}/payments", id)),
        (Method::POST, format!("/api/tenants/{}/payments", id)),
        (Method::GET, format!("/api/tenants/{}/payments/summary", id)),
        (Method::GET, format!("/api/tenants/{}/emergency-contact", id)),
        (Method::GET, "/api/leases".into()),
        (Method::GET, "/api/leases/expiring".into()),
        (Method::GET, format!("/api/leases/{}", id)),
        (Method::POST, format!("/api/leases/{}/terminate", id)),
        (Method::GET, "/api/payments/failed".into()),
        (Method::GET, "/api/portal/profile".into()),
        (Method::GET, "/api/portal/payments".into()),
    ]
}

#[tokio::test]
async fn every_protected_route_requires_a_token() {
    for (method, uri) in protected_routes() {
        let (status, body) = common::call(method.clone(), &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["code"], "UNAUTHORIZED", "{} {}", method, uri);
    }
}
