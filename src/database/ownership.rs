//! Row-ownership predicates along the tenant -> lease -> unit -> property -> owner chain.
//!
//! Every owner-scoped read and write goes through these checks. A record that does not
//! exist and a record owned by someone else are indistinguishable to callers.

use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

const PROPERTY_OWNED: &str = r#"
    SELECT EXISTS (
        SELECT 1 FROM properties p
        WHERE p.id = $1 AND p.owner_id = $2 AND p.deleted_at IS NULL
    )
"#;

const UNIT_OWNED: &str = r#"
    SELECT EXISTS (
        SELECT 1 FROM units u
        JOIN properties p ON p.id = u.property_id
        WHERE u.id = $1 AND p.owner_id = $2
          AND u.deleted_at IS NULL AND p.deleted_at IS NULL
    )
"#;

const LEASE_OWNED: &str = r#"
    SELECT EXISTS (
        SELECT 1 FROM leases l
        JOIN units u ON u.id = l.unit_id
        JOIN properties p ON p.id = u.property_id
        WHERE l.id = $1 AND p.owner_id = $2
    )
"#;

const TENANT_OWNED: &str = r#"
    SELECT EXISTS (
        SELECT 1 FROM tenants t
        WHERE t.id = $1 AND t.deleted_at IS NULL
          AND (
            t.owner_id = $2
            OR EXISTS (
                SELECT 1 FROM leases ol
                JOIN units ou ON ou.id = ol.unit_id
                JOIN properties op ON op.id = ou.property_id
                WHERE ol.tenant_id = t.id AND op.owner_id = $2
            )
          )
    )
"#;

pub async fn property_owned<'e>(
    executor: impl PgExecutor<'e>,
    owner_id: Uuid,
    property_id: Uuid,
) -> Result<bool, sqlx::Error> {
    exists(executor, PROPERTY_OWNED, property_id, owner_id).await
}

pub async fn unit_owned<'e>(
    executor: impl PgExecutor<'e>,
    owner_id: Uuid,
    unit_id: Uuid,
) -> Result<bool, sqlx::Error> {
    exists(executor, UNIT_OWNED, unit_id, owner_id).await
}

pub async fn lease_owned<'e>(
    executor: impl PgExecutor<'e>,
    owner_id: Uuid,
    lease_id: Uuid,
) -> Result<bool, sqlx::Error> {
    exists(executor, LEASE_OWNED, lease_id, owner_id).await
}

pub async fn tenant_owned<'e>(
    executor: impl PgExecutor<'e>,
    owner_id: Uuid,
    tenant_id: Uuid,
) -> Result<bool, sqlx::Error> {
    exists(executor, TENANT_OWNED, tenant_id, owner_id).await
}

async fn exists<'e>(
    executor: impl PgExecutor<'e>,
    sql: &'static str,
    record_id: Uuid,
    owner_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(sql)
        .bind(record_id)
        .bind(owner_id)
        .fetch_one(executor)
        .await
}

/// Push the tenant ownership predicate for a tenants row aliased as `alias`
pub fn push_tenant_owned(b: &mut QueryBuilder<'static, Postgres>, alias: &str, owner_id: Uuid) {
    b.push(format!("{alias}.owner_id = "))
        .push_bind(owner_id)
        .push(format!(
            " OR EXISTS (SELECT 1 FROM leases ol JOIN units ou ON ou.id = ol.unit_id \
             JOIN properties op ON op.id = ou.property_id \
             WHERE ol.tenant_id = {alias}.id AND op.owner_id = "
        ))
        .push_bind(owner_id)
        .push(")");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_predicate_binds_owner_twice() {
        let mut b: QueryBuilder<'static, Postgres> = QueryBuilder::new("SELECT 1 FROM tenants t WHERE ");
        push_tenant_owned(&mut b, "t", Uuid::nil());
        let sql = b.sql();
        assert!(sql.contains("t.owner_id = $1"));
        assert!(sql.contains("ol.tenant_id = t.id AND op.owner_id = $2)"));
    }

    #[test]
    fn chain_queries_join_through_property() {
        for sql in [UNIT_OWNED, LEASE_OWNED, TENANT_OWNED] {
            assert!(sql.contains("owner_id = $2"));
            assert!(sql.contains("JOIN"));
        }
        assert!(PROPERTY_OWNED.contains("p.owner_id = $2"));
    }
}
