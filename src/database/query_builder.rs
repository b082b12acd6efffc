use serde::Deserialize;
use sqlx::{postgres::PgRow, Encode, FromRow, PgPool, Postgres, QueryBuilder, Type};
use std::time::Instant;

use crate::config;
use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Resolved LIMIT/OFFSET pair, already clamped against config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: config::config().page_size(limit),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

/// Escape LIKE wildcards in user input and wrap it for a substring match
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Incrementally composed SELECT with WHERE/AND chaining over bound parameters
pub struct ListQuery {
    builder: QueryBuilder<'static, Postgres>,
    has_where: bool,
}

impl ListQuery {
    /// `base_sql` is everything up to (not including) the WHERE clause
    pub fn new(base_sql: &str) -> Self {
        Self {
            builder: QueryBuilder::new(base_sql),
            has_where: false,
        }
    }

    fn start_condition(&mut self) {
        self.builder.push(if self.has_where { " AND " } else { " WHERE " });
        self.has_where = true;
    }

    /// Append a literal condition (no user input)
    pub fn and_where(&mut self, condition: &str) -> &mut Self {
        self.start_condition();
        self.builder.push(condition);
        self
    }

    /// Append `<lhs><bound value>`, e.g. `("t.status = ", status)`
    pub fn and_where_bind<T>(&mut self, lhs: &str, value: T) -> &mut Self
    where
        T: 'static + Encode<'static, Postgres> + Send + Type<Postgres>,
    {
        self.start_condition();
        self.builder.push(lhs).push_bind(value);
        self
    }

    /// Append a condition assembled by the caller, for predicates binding several values
    pub fn and_where_with(&mut self, build: impl FnOnce(&mut QueryBuilder<'static, Postgres>)) -> &mut Self {
        self.start_condition();
        self.builder.push("(");
        build(&mut self.builder);
        self.builder.push(")");
        self
    }

    /// Case-insensitive substring match across several columns
    pub fn and_search(&mut self, columns: &[&str], term: &str) -> &mut Self {
        if term.trim().is_empty() || columns.is_empty() {
            return self;
        }
        let pattern = like_pattern(term);
        self.and_where_with(|b| {
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    b.push(" OR ");
                }
                b.push(*column).push(" ILIKE ").push_bind(pattern.clone());
            }
        })
    }

    /// Append raw SQL after the WHERE clause (GROUP BY and the like)
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.builder.push(sql);
        self
    }

    /// ORDER BY a caller-whitelisted column with a stable tiebreaker
    pub fn order_by(&mut self, column: &str, direction: SortDirection, tiebreak: &str) -> &mut Self {
        self.builder
            .push(" ORDER BY ")
            .push(column)
            .push(" ")
            .push(direction.to_sql())
            .push(", ")
            .push(tiebreak);
        self
    }

    pub fn paginate(&mut self, page: Page) -> &mut Self {
        self.builder
            .push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);
        self
    }

    pub fn sql(&self) -> &str {
        self.builder.sql()
    }

    pub async fn fetch_all<T>(mut self, pool: &PgPool) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let started = Instant::now();
        let rows = self.builder.build_query_as::<T>().fetch_all(pool).await?;
        warn_if_slow(self.builder.sql(), started);
        Ok(rows)
    }

    pub async fn fetch_optional<T>(mut self, pool: &PgPool) -> Result<Option<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let started = Instant::now();
        let row = self.builder.build_query_as::<T>().fetch_optional(pool).await?;
        warn_if_slow(self.builder.sql(), started);
        Ok(row)
    }

    /// Run a `SELECT COUNT(*) ...` built with this query
    pub async fn fetch_count(mut self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let started = Instant::now();
        let count: i64 = self.builder.build_query_scalar::<i64>().fetch_one(pool).await?;
        warn_if_slow(self.builder.sql(), started);
        Ok(count)
    }
}

fn warn_if_slow(sql: &str, started: Instant) {
    let elapsed = started.elapsed().as_millis() as u64;
    if elapsed >= config::config().database.slow_query_threshold_ms {
        tracing::warn!(elapsed_ms = elapsed, "Slow query: {}", sql);
    }
}
