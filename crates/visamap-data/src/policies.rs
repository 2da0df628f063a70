//! `PostgreSQL` implementation of the policy store.
//!
//! Rows live in `visa_policies(passport, destination, policy, duration)`; the
//! column names are kept for compatibility with existing seed data.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use visamap_core::{
    PolicyCode, PolicyEntry, PolicyFilter, PolicyKey, PolicyStore, StoreError, StoreResult,
};

use crate::error::{DataError, Result};

const SELECT_POLICIES: &str = r"
    SELECT passport, destination, policy, duration
    FROM visa_policies
    WHERE ($1::text IS NULL OR passport = $1)
      AND ($2::text IS NULL OR destination = $2)
    ORDER BY destination ASC, passport ASC
";

const UPSERT_POLICY: &str = r"
    INSERT INTO visa_policies (passport, destination, policy, duration)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (passport, destination)
    DO UPDATE SET policy = EXCLUDED.policy,
                  duration = EXCLUDED.duration,
                  updated_at = now()
    RETURNING passport, destination, policy, duration
";

const DELETE_POLICY: &str = r"
    DELETE FROM visa_policies WHERE passport = $1 AND destination = $2
";

const SELECT_ALL_POLICIES: &str = r"
    SELECT passport, destination, policy, duration
    FROM visa_policies
    ORDER BY passport ASC, destination ASC
";

const COUNT_POLICIES: &str = r"SELECT COUNT(*) FROM visa_policies";

#[derive(Debug, FromRow)]
struct PolicyRow {
    passport: String,
    destination: String,
    policy: i16,
    duration: i32,
}

impl TryFrom<PolicyRow> for PolicyEntry {
    type Error = DataError;

    fn try_from(row: PolicyRow) -> Result<Self> {
        let policy_code =
            PolicyCode::try_from(i64::from(row.policy)).map_err(|_| DataError::InvalidRow {
                field: "policy",
                value: row.policy.to_string(),
            })?;
        let duration_days = u32::try_from(row.duration).map_err(|_| DataError::InvalidRow {
            field: "duration",
            value: row.duration.to_string(),
        })?;
        Ok(Self {
            origin: row.passport,
            destination: row.destination,
            policy_code,
            duration_days,
        })
    }
}

/// Policy repository backed by a shared connection pool.
#[derive(Clone)]
pub struct PgPolicyStore {
    pool: PgPool,
}

impl PgPolicyStore {
    /// Construct the store and apply pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MigrationFailed`] if the schema cannot be brought up to date.
    pub async fn new(pool: PgPool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|source| DataError::MigrationFailed { source })?;
        Ok(Self { pool })
    }

    /// Access the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fetch entries matching the filter, ordered by destination then origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub async fn list_entries(&self, filter: &PolicyFilter) -> Result<Vec<PolicyEntry>> {
        let rows: Vec<PolicyRow> = sqlx::query_as(SELECT_POLICIES)
            .bind(filter.origin())
            .bind(filter.destination())
            .fetch_all(&self.pool)
            .await
            .map_err(|source| DataError::query("select visa policies", source))?;
        rows.into_iter().map(PolicyEntry::try_from).collect()
    }

    /// Insert or replace the row for the entry's pair and return the stored values.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the returned row cannot be decoded.
    pub async fn upsert_entry(&self, entry: &PolicyEntry) -> Result<PolicyEntry> {
        let duration = i32::try_from(entry.duration_days).map_err(|_| DataError::InvalidRow {
            field: "duration",
            value: entry.duration_days.to_string(),
        })?;
        let row: PolicyRow = sqlx::query_as(UPSERT_POLICY)
            .bind(&entry.origin)
            .bind(&entry.destination)
            .bind(i16::from(entry.policy_code.code()))
            .bind(duration)
            .fetch_one(&self.pool)
            .await
            .map_err(|source| DataError::query("upsert visa policy", source))?;
        debug!(origin = %entry.origin, destination = %entry.destination, "visa policy upserted");
        PolicyEntry::try_from(row)
    }

    /// Delete the row for the pair, reporting whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_entry(&self, key: &PolicyKey) -> Result<bool> {
        let result = sqlx::query(DELETE_POLICY)
            .bind(&key.origin)
            .bind(&key.destination)
            .execute(&self.pool)
            .await
            .map_err(|source| DataError::query("delete visa policy", source))?;
        Ok(result.rows_affected() > 0)
    }

    /// Load every row ordered by origin then destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub async fn load_entries(&self) -> Result<Vec<PolicyEntry>> {
        let rows: Vec<PolicyRow> = sqlx::query_as(SELECT_ALL_POLICIES)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| DataError::query("load visa policies", source))?;
        rows.into_iter().map(PolicyEntry::try_from).collect()
    }

    /// Count stored rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_entries(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(COUNT_POLICIES)
            .fetch_one(&self.pool)
            .await
            .map_err(|source| DataError::query("count visa policies", source))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn into_store_error(operation: &'static str, err: DataError) -> StoreError {
    match err {
        DataError::InvalidRow { field, value } => StoreError::InvalidRow { field, value },
        other => StoreError::Unavailable {
            operation,
            source: Box::new(other),
        },
    }
}

#[async_trait]
impl PolicyStore for PgPolicyStore {
    async fn list(&self, filter: &PolicyFilter) -> StoreResult<Vec<PolicyEntry>> {
        self.list_entries(filter)
            .await
            .map_err(|err| into_store_error("pg.list", err))
    }

    async fn upsert(&self, entry: &PolicyEntry) -> StoreResult<PolicyEntry> {
        self.upsert_entry(entry)
            .await
            .map_err(|err| into_store_error("pg.upsert", err))
    }

    async fn delete(&self, key: &PolicyKey) -> StoreResult<bool> {
        self.delete_entry(key)
            .await
            .map_err(|err| into_store_error("pg.delete", err))
    }

    async fn load_all(&self) -> StoreResult<Vec<PolicyEntry>> {
        self.load_entries()
            .await
            .map_err(|err| into_store_error("pg.load_all", err))
    }

    async fn count(&self) -> StoreResult<u64> {
        self.count_entries()
            .await
            .map_err(|err| into_store_error("pg.count", err))
    }
}
