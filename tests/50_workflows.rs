//! Service workflows against a real Postgres.
//!
//! Runs only when `DATABASE_URL` points at a disposable database; each test
//! creates its own owners so tests can share one schema.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use tenantflow_api::database::models::{LeaseStatus, UnitStatus};
use tenantflow_api::services::invitation_service::{AcceptInvitationRequest, InviteTenantRequest};
use tenantflow_api::services::lease_service::{CreateLeaseRequest, UpdateLeaseRequest};
use tenantflow_api::services::property_service::CreatePropertyRequest;
use tenantflow_api::services::tenant_service::{CreateTenantRequest, MoveOutRequest};
use tenantflow_api::services::unit_service::CreateUnitRequest;
use tenantflow_api::services::{
    InvitationService, LeaseService, PropertyService, ServiceError, TenantQueryService, TenantService,
    TenantStatsService, UnitService,
};

async fn test_pool() -> Option<PgPool> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            eprintln!("DATABASE_URL not set; skipping database workflow test");
            return None;
        }
    };
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");
    Some(pool)
}

fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4().simple())
}

async fn owner(pool: &PgPool) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (email, password_hash, full_name, role) VALUES ($1, 'x', 'Owner', 'OWNER') RETURNING id",
    )
    .bind(unique_email("owner"))
    .fetch_one(pool)
    .await
    .expect("insert owner")
}

fn tenant_request(email: &str) -> CreateTenantRequest {
    CreateTenantRequest {
        first_name: "Tina".into(),
        last_name: "Tenant".into(),
        email: email.into(),
        phone: None,
        date_of_birth: None,
        notes: None,
    }
}

fn invite_request(email: &str) -> InviteTenantRequest {
    InviteTenantRequest {
        email: email.into(),
        first_name: "Ivy".into(),
        last_name: "Invitee".into(),
        phone: None,
        property_id: None,
        unit_id: None,
        lease_id: None,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Property with one unit, returning the unit id
async fn unit(pool: &PgPool, owner_id: Uuid) -> Uuid {
    let property = PropertyService::new(pool.clone())
        .create(
            owner_id,
            CreatePropertyRequest {
                name: "Maple Court".into(),
                address_line1: "1 Maple St".into(),
                address_line2: None,
                city: "Austin".into(),
                state: "TX".into(),
                postal_code: "78701".into(),
                country: None,
                property_type: None,
            },
        )
        .await
        .expect("create property");
    UnitService::new(pool.clone())
        .create(
            owner_id,
            CreateUnitRequest {
                property_id: property.id,
                unit_number: "1A".into(),
                bedrooms: Some(2),
                bathrooms: Some(Decimal::new(15, 1)),
                square_feet: None,
                rent_amount: Decimal::new(150000, 2),
                status: None,
            },
        )
        .await
        .expect("create unit")
        .id
}

fn lease_request(unit_id: Uuid, tenant_id: Uuid, start: NaiveDate, end: NaiveDate, status: LeaseStatus) -> CreateLeaseRequest {
    CreateLeaseRequest {
        unit_id,
        tenant_id,
        start_date: start,
        end_date: end,
        rent_amount: Decimal::new(150000, 2),
        security_deposit: None,
        payment_day: None,
        status: Some(status),
        terms: None,
    }
}

#[tokio::test]
async fn other_owners_records_are_not_found() {
    let Some(pool) = test_pool().await else { return };
    let alice = owner(&pool).await;
    let bob = owner(&pool).await;

    let tenant = TenantService::new(pool.clone())
        .create(alice, tenant_request(&unique_email("tina")))
        .await
        .expect("create tenant");

    let err = TenantQueryService::new(pool.clone()).get(bob, tenant.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "{:?}", err);
}

#[tokio::test]
async fn duplicate_invitation_is_a_conflict() {
    let Some(pool) = test_pool().await else { return };
    let owner_id = owner(&pool).await;
    let email = unique_email("ivy");
    let service = InvitationService::new(pool.clone());

    service.invite(owner_id, invite_request(&email)).await.expect("first invite");
    let err = service.invite(owner_id, invite_request(&email.to_uppercase())).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)), "{:?}", err);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invites_for_one_email_issue_one_invitation() {
    let Some(pool) = test_pool().await else { return };
    let owner_id = owner(&pool).await;
    let email = unique_email("race");

    let mut handles = Vec::new();
    for _ in 0..6 {
        let service = InvitationService::new(pool.clone());
        let request = invite_request(&email);
        handles.push(tokio::spawn(async move { service.invite(owner_id, request).await }));
    }
    let mut issued = 0;
    for handle in handles {
        match handle.await.expect("join") {
            Ok(_) => issued += 1,
            Err(ServiceError::Conflict(_)) => {}
            Err(other) => panic!("unexpected {:?}", other),
        }
    }
    assert_eq!(issued, 1);

    let (invitations, tenants) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT (SELECT COUNT(*) FROM tenant_invitations WHERE owner_id = $1 AND lower(email) = $2),
               (SELECT COUNT(*) FROM tenants WHERE owner_id = $1 AND lower(email) = $2)
        "#,
    )
    .bind(owner_id)
    .bind(&email)
    .fetch_one(&pool)
    .await
    .expect("count");
    assert_eq!((invitations, tenants), (1, 1));
}

#[tokio::test]
async fn trial_plan_stops_at_five_tenants() {
    let Some(pool) = test_pool().await else { return };
    let owner_id = owner(&pool).await;
    let service = TenantService::new(pool.clone());

    for _ in 0..5 {
        service.create(owner_id, tenant_request(&unique_email("t"))).await.expect("within plan");
    }
    let err = service.create(owner_id, tenant_request(&unique_email("t"))).await.unwrap_err();
    assert!(matches!(err, ServiceError::PlanLimitReached { limit: 5, .. }), "{:?}", err);

    let err = InvitationService::new(pool.clone())
        .invite(owner_id, invite_request(&unique_email("i")))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PlanLimitReached { .. }), "{:?}", err);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_never_exceed_the_plan() {
    let Some(pool) = test_pool().await else { return };
    let owner_id = owner(&pool).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                TenantService::new(pool).create(owner_id, tenant_request(&unique_email("c"))).await.map(|_| ())
            } else {
                InvitationService::new(pool).invite(owner_id, invite_request(&unique_email("c"))).await.map(|_| ())
            }
        }));
    }
    let mut created = 0;
    for handle in handles {
        match handle.await.expect("join") {
            Ok(()) => created += 1,
            Err(ServiceError::PlanLimitReached { .. }) => {}
            Err(other) => panic!("unexpected {:?}", other),
        }
    }
    assert_eq!(created, 5);

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tenants WHERE owner_id = $1 AND deleted_at IS NULL")
        .bind(owner_id)
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(total, 5);
}

#[tokio::test]
async fn accepted_invitation_activates_the_tenant() {
    let Some(pool) = test_pool().await else { return };
    let owner_id = owner(&pool).await;
    let email = unique_email("accept");
    let service = InvitationService::new(pool.clone());

    let issued = service.invite(owner_id, invite_request(&email)).await.expect("invite");
    let code = issued
        .invitation_url
        .rsplit("code=")
        .next()
        .expect("code in url")
        .to_string();

    let auth = service
        .accept(&code, AcceptInvitationRequest { password: "a-long-enough-password".into(), full_name: None })
        .await
        .expect("accept");
    assert_eq!(auth.user.email, email);

    let tenant_id = issued.tenant_id.expect("tenant record");
    let tenant = TenantQueryService::new(pool.clone()).get(owner_id, tenant_id).await.expect("tenant");
    assert_eq!(tenant.user_id, Some(auth.user.id));

    let err = service
        .accept(&code, AcceptInvitationRequest { password: "a-long-enough-password".into(), full_name: None })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)), "{:?}", err);
}

#[tokio::test]
async fn move_out_ends_the_lease_and_frees_the_unit() {
    let Some(pool) = test_pool().await else { return };
    let owner_id = owner(&pool).await;
    let unit_id = unit(&pool, owner_id).await;
    let tenant = TenantService::new(pool.clone())
        .create(owner_id, tenant_request(&unique_email("move")))
        .await
        .expect("tenant");
    let lease = LeaseService::new(pool.clone())
        .create(owner_id, lease_request(unit_id, tenant.id, date(2026, 1, 1), date(2026, 12, 31), LeaseStatus::Active))
        .await
        .expect("lease");

    TenantService::new(pool.clone())
        .mark_moved_out(owner_id, tenant.id, MoveOutRequest { move_out_date: date(2026, 6, 15), reason: None })
        .await
        .expect("move out");

    let (status, end_date) = sqlx::query_as::<_, (LeaseStatus, NaiveDate)>("SELECT status, end_date FROM leases WHERE id = $1")
        .bind(lease.id)
        .fetch_one(&pool)
        .await
        .expect("lease row");
    assert_eq!(status, LeaseStatus::Ended);
    assert_eq!(end_date, date(2026, 6, 15));

    let unit = UnitService::new(pool.clone()).get(owner_id, unit_id).await.expect("unit");
    assert_eq!(unit.status, UnitStatus::Vacant);
}

#[tokio::test]
async fn overlapping_leases_are_refused() {
    let Some(pool) = test_pool().await else { return };
    let owner_id = owner(&pool).await;
    let unit_id = unit(&pool, owner_id).await;
    let tenant = TenantService::new(pool.clone())
        .create(owner_id, tenant_request(&unique_email("overlap")))
        .await
        .expect("tenant");
    let leases = LeaseService::new(pool.clone());

    leases
        .create(owner_id, lease_request(unit_id, tenant.id, date(2026, 1, 1), date(2026, 6, 30), LeaseStatus::Draft))
        .await
        .expect("first lease");
    let later = leases
        .create(owner_id, lease_request(unit_id, tenant.id, date(2026, 7, 1), date(2026, 12, 31), LeaseStatus::Draft))
        .await
        .expect("adjacent lease");

    let err = leases
        .update(owner_id, later.id, UpdateLeaseRequest { start_date: Some(date(2026, 6, 30)), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)), "{:?}", err);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lease_updates_cannot_both_take_the_same_dates() {
    let Some(pool) = test_pool().await else { return };
    let owner_id = owner(&pool).await;
    let unit_id = unit(&pool, owner_id).await;
    let tenant = TenantService::new(pool.clone())
        .create(owner_id, tenant_request(&unique_email("upd")))
        .await
        .expect("tenant");
    let leases = LeaseService::new(pool.clone());

    let first = leases
        .create(owner_id, lease_request(unit_id, tenant.id, date(2027, 1, 1), date(2027, 1, 31), LeaseStatus::Draft))
        .await
        .expect("first");
    let second = leases
        .create(owner_id, lease_request(unit_id, tenant.id, date(2027, 3, 1), date(2027, 3, 31), LeaseStatus::Draft))
        .await
        .expect("second");

    let mut handles = Vec::new();
    for lease_id in [first.id, second.id] {
        let service = LeaseService::new(pool.clone());
        handles.push(tokio::spawn(async move {
            service
                .update(
                    owner_id,
                    lease_id,
                    UpdateLeaseRequest {
                        start_date: Some(date(2027, 6, 1)),
                        end_date: Some(date(2027, 6, 30)),
                        ..Default::default()
                    },
                )
                .await
        }));
    }
    let mut moved = 0;
    for handle in handles {
        match handle.await.expect("join") {
            Ok(_) => moved += 1,
            Err(ServiceError::Conflict(_)) => {}
            Err(other) => panic!("unexpected {:?}", other),
        }
    }
    assert_eq!(moved, 1);
}

#[tokio::test]
async fn active_lease_cannot_be_set_back_to_draft() {
    let Some(pool) = test_pool().await else { return };
    let owner_id = owner(&pool).await;
    let unit_id = unit(&pool, owner_id).await;
    let tenant = TenantService::new(pool.clone())
        .create(owner_id, tenant_request(&unique_email("draft")))
        .await
        .expect("tenant");
    let leases = LeaseService::new(pool.clone());
    let lease = leases
        .create(owner_id, lease_request(unit_id, tenant.id, date(2026, 1, 1), date(2026, 12, 31), LeaseStatus::Active))
        .await
        .expect("lease");

    let err = leases
        .update(owner_id, lease.id, UpdateLeaseRequest { status: Some(LeaseStatus::Draft), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)), "{:?}", err);

    let unit = UnitService::new(pool.clone()).get(owner_id, unit_id).await.expect("unit");
    assert_eq!(unit.status, UnitStatus::Occupied);
}

#[tokio::test]
async fn stats_include_lease_linked_tenants() {
    let Some(pool) = test_pool().await else { return };
    let alice = owner(&pool).await;
    let bob = owner(&pool).await;

    let empty = TenantStatsService::new(pool.clone()).stats(alice).await.expect("stats");
    assert_eq!(empty.total, 0);
    assert_eq!(serde_json::to_value(&empty).expect("json")["totalMonthlyRent"], "0.00");

    // Bob's tenant leases Alice's unit, so Alice sees it without it using her plan
    let unit_id = unit(&pool, alice).await;
    let tenant = TenantService::new(pool.clone())
        .create(bob, tenant_request(&unique_email("linked")))
        .await
        .expect("tenant");
    sqlx::query(
        "INSERT INTO leases (unit_id, tenant_id, start_date, end_date, rent_amount, status) \
         VALUES ($1, $2, '2026-01-01', '2026-12-31', 1500.00, 'ACTIVE')",
    )
    .bind(unit_id)
    .bind(tenant.id)
    .execute(&pool)
    .await
    .expect("lease");

    let stats = TenantStatsService::new(pool.clone()).stats(alice).await.expect("stats");
    assert_eq!(stats.total, 1);
    assert_eq!(stats.with_active_lease, 1);
    assert_eq!(stats.total_monthly_rent, Decimal::new(150000, 2));
    assert_eq!(stats.remaining_slots, Some(5));
}
