//! Postgres-backed tender store.
//!
//! ## Schema
//!
//! - `tenders`: current state, one row per tender
//! - `tender_versions`: append-only history, one row per `(tender_id, version)`
//! - `bids`
//! - `employee`, `organization`, `organization_responsible`: directory tables,
//!   read-only from this service's point of view
//!
//! Migrations under `crates/infra/migrations` run on [`PostgresTenderStore::connect`].
//!
//! ## Versioned writes
//!
//! `update_tender` runs in one transaction:
//! 1. `SELECT version ... FOR UPDATE` locks the tender row
//! 2. the locked version is compared with the caller's expectation
//! 3. the row is updated and the new revision appended
//!
//! Concurrent writers serialize on the row lock; the loser observes the bumped
//! version and fails with `StoreError::Conflict`. The primary key on
//! `tender_versions` backs this up: a duplicate `(tender_id, version)` is also
//! reported as a conflict.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any other | `Unexpected` |
//! | PoolTimedOut / PoolClosed / Io | N/A | `Unexpected` |

use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use tenderflow_auth::{Employee, Username};
use tenderflow_core::{
    AggregateRoot, BidId, EmployeeId, ExpectedVersion, OrganizationId, TenderId,
};
use tenderflow_tenders::{
    Bid, BidAuthor, BidAuthorType, Tender, TenderFields, TenderRevision,
};

use crate::config::PostgresConfig;

use super::r#trait::{Page, StoreError, StoreResult, TenderFilter, TenderStore};

const TENDER_COLUMNS: &str =
    "id, name, description, organization_id, creator_id, service_type, status, version, created_at";

/// Postgres-backed tender store.
///
/// `PgPool` is internally reference counted; cloning the store shares the pool.
#[derive(Debug, Clone)]
pub struct PostgresTenderStore {
    pool: PgPool,
}

impl PostgresTenderStore {
    /// Wrap an existing pool. Does not run migrations.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a bounded pool and bring the schema up to date.
    pub async fn connect(config: &PostgresConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect(&config.url)
            .await
            .context("failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TenderStore for PostgresTenderStore {
    #[instrument(skip(self), fields(username = %username), err)]
    async fn find_employee_by_username(
        &self,
        username: &Username,
    ) -> StoreResult<Option<Employee>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, organization_id
            FROM employee
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_employee_by_username", e))?;

        row.map(|r| EmployeeRow::from_row(&r).map_err(|e| map_sqlx_error("decode_employee", e)))
            .transpose()?
            .map(Employee::try_from)
            .transpose()
    }

    async fn employee_exists(&self, id: EmployeeId) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM employee WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("employee_exists", e))
    }

    async fn organization_exists(&self, id: OrganizationId) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM organization WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("organization_exists", e))
    }

    #[instrument(skip(self), fields(employee_id = %employee_id, organization_id = %organization_id), err)]
    async fn is_organization_responsible(
        &self,
        employee_id: EmployeeId,
        organization_id: OrganizationId,
    ) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM organization_responsible
                WHERE user_id = $1 AND organization_id = $2
            )
            "#,
        )
        .bind(employee_id.as_uuid())
        .bind(organization_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("is_organization_responsible", e))
    }

    #[instrument(skip(self), fields(tender_id = %id), err)]
    async fn find_tender(&self, id: TenderId) -> StoreResult<Option<Tender>> {
        let row = sqlx::query(&format!("SELECT {TENDER_COLUMNS} FROM tenders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_tender", e))?;

        row.map(|r| decode_tender(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_tenders(&self, filter: &TenderFilter) -> StoreResult<Vec<Tender>> {
        let service_types: Vec<String> = filter
            .service_types
            .iter()
            .map(|t| t.as_str().to_string())
            .collect();

        let rows = sqlx::query(&format!(
            r#"
            SELECT {TENDER_COLUMNS}
            FROM tenders
            WHERE cardinality($1::text[]) = 0 OR service_type = ANY($1)
            ORDER BY name ASC, id ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(service_types)
        .bind(i64::from(filter.page.limit))
        .bind(i64::from(filter.page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tenders", e))?;

        rows.iter().map(decode_tender).collect()
    }

    #[instrument(skip(self), fields(organization_id = %organization_id), err)]
    async fn list_organization_tenders(
        &self,
        organization_id: OrganizationId,
        page: Page,
    ) -> StoreResult<Vec<Tender>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TENDER_COLUMNS}
            FROM tenders
            WHERE organization_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(organization_id.as_uuid())
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_organization_tenders", e))?;

        rows.iter().map(decode_tender).collect()
    }

    #[instrument(skip(self), fields(tender_id = %id), err)]
    async fn find_revision(
        &self,
        id: TenderId,
        version: u64,
    ) -> StoreResult<Option<TenderRevision>> {
        let row = sqlx::query(
            r#"
            SELECT tender_id, version, name, description, service_type, status, recorded_at
            FROM tender_versions
            WHERE tender_id = $1 AND version = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(to_db_version(version)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_revision", e))?;

        row.map(|r| decode_revision(&r)).transpose()
    }

    #[instrument(skip(self), fields(tender_id = %id), err)]
    async fn list_revisions(&self, id: TenderId) -> StoreResult<Vec<TenderRevision>> {
        let rows = sqlx::query(
            r#"
            SELECT tender_id, version, name, description, service_type, status, recorded_at
            FROM tender_versions
            WHERE tender_id = $1
            ORDER BY version ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_revisions", e))?;

        rows.iter().map(decode_revision).collect()
    }

    #[instrument(skip(self, tender), fields(tender_id = %tender.id_typed()), err)]
    async fn insert_tender(&self, tender: &Tender) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let fields = tender.fields();
        sqlx::query(
            r#"
            INSERT INTO tenders
                (id, name, description, organization_id, creator_id, service_type, status, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(tender.id_typed().as_uuid())
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(tender.organization_id().as_uuid())
        .bind(tender.creator_id().as_uuid())
        .bind(fields.service_type.as_str())
        .bind(tender.status().as_str())
        .bind(to_db_version(tender.version())?)
        .bind(tender.created_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_tender", e))?;

        append_revision(&mut tx, tender).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(
        skip(self, tender),
        fields(
            tender_id = %tender.id_typed(),
            version = tender.version(),
            expected_version = ?expected
        ),
        err
    )]
    async fn update_tender(&self, tender: &Tender, expected: ExpectedVersion) -> StoreResult<()> {
        let id = tender.id_typed();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT version FROM tenders WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("lock_tender", e))?;

        let Some(current) = current else {
            return Err(StoreError::NotFound(format!("tender {id}")));
        };
        let current = from_db_version(current)?;

        if !expected.matches(current) {
            return Err(StoreError::Conflict(format!(
                "tender {id}: expected {expected:?}, found version {current}"
            )));
        }

        let fields = tender.fields();
        sqlx::query(
            r#"
            UPDATE tenders
            SET name = $1, description = $2, service_type = $3, status = $4, version = $5
            WHERE id = $6 AND version = $7
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.service_type.as_str())
        .bind(tender.status().as_str())
        .bind(to_db_version(tender.version())?)
        .bind(id.as_uuid())
        .bind(to_db_version(current)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_tender", e))?;

        append_revision(&mut tx, tender).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self, bid), fields(bid_id = %bid.id, tender_id = %bid.tender_id), err)]
    async fn insert_bid(&self, bid: &Bid) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bids
                (id, name, description, tender_id, author_type, author_id, status, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(bid.id.as_uuid())
        .bind(&bid.name)
        .bind(&bid.description)
        .bind(bid.tender_id.as_uuid())
        .bind(bid.author.author_type().as_str())
        .bind(bid.author.author_uuid())
        .bind(bid.status.as_str())
        .bind(to_db_version(bid.version)?)
        .bind(bid.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_bid", e))?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_bids_by_author(&self, author: BidAuthor, page: Page) -> StoreResult<Vec<Bid>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, tender_id, author_type, author_id, status, version, created_at
            FROM bids
            WHERE author_type = $1 AND author_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(author.author_type().as_str())
        .bind(author.author_uuid())
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_bids_by_author", e))?;

        rows.iter()
            .map(|r| {
                BidRow::from_row(r)
                    .map_err(|e| map_sqlx_error("decode_bid", e))
                    .and_then(Bid::try_from)
            })
            .collect()
    }
}

async fn append_revision(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    tender: &Tender,
) -> StoreResult<()> {
    let fields = tender.fields();
    sqlx::query(
        r#"
        INSERT INTO tender_versions
            (tender_id, version, name, description, service_type, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(tender.id_typed().as_uuid())
    .bind(to_db_version(tender.version())?)
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(fields.service_type.as_str())
    .bind(tender.status().as_str())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("append_revision", e))?;

    Ok(())
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::Conflict(format!("unique violation in {operation}"));
    }
    match err {
        sqlx::Error::Database(db_err) => StoreError::Unexpected(anyhow!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Unexpected(anyhow!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unexpected(anyhow!("timed out acquiring a connection in {operation}"))
        }
        other => StoreError::Unexpected(anyhow!("sqlx error in {operation}: {other}")),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

fn to_db_version(version: u64) -> StoreResult<i64> {
    i64::try_from(version)
        .map_err(|_| StoreError::Unexpected(anyhow!("version {version} exceeds BIGINT")))
}

fn from_db_version(version: i64) -> StoreResult<u64> {
    u64::try_from(version)
        .map_err(|_| StoreError::Unexpected(anyhow!("negative version {version} in database")))
}

fn decode<T, E>(column: &str, raw: &str, parsed: Result<T, E>) -> StoreResult<T>
where
    E: core::fmt::Display,
{
    parsed.map_err(|e| StoreError::Unexpected(anyhow!("bad {column} '{raw}' in database: {e}")))
}

fn decode_tender(row: &PgRow) -> StoreResult<Tender> {
    let row = TenderRow::from_row(row).map_err(|e| map_sqlx_error("decode_tender", e))?;
    Tender::try_from(row)
}

fn decode_revision(row: &PgRow) -> StoreResult<TenderRevision> {
    let row = RevisionRow::from_row(row).map_err(|e| map_sqlx_error("decode_revision", e))?;
    TenderRevision::try_from(row)
}

// SQLx row types

#[derive(Debug)]
struct EmployeeRow {
    id: Uuid,
    username: String,
    organization_id: Option<Uuid>,
}

impl<'r> FromRow<'r, PgRow> for EmployeeRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(EmployeeRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            organization_id: row.try_get("organization_id")?,
        })
    }
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(Employee {
            id: EmployeeId::from_uuid(row.id),
            username: decode("username", &row.username, Username::parse(&row.username))?,
            organization_id: row.organization_id.map(OrganizationId::from_uuid),
        })
    }
}

#[derive(Debug)]
struct TenderRow {
    id: Uuid,
    name: String,
    description: String,
    organization_id: Uuid,
    creator_id: Uuid,
    service_type: String,
    status: String,
    version: i64,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for TenderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TenderRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            organization_id: row.try_get("organization_id")?,
            creator_id: row.try_get("creator_id")?,
            service_type: row.try_get("service_type")?,
            status: row.try_get("status")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<TenderRow> for Tender {
    type Error = StoreError;

    fn try_from(row: TenderRow) -> Result<Self, Self::Error> {
        Ok(Tender::restore(
            TenderId::from_uuid(row.id),
            OrganizationId::from_uuid(row.organization_id),
            EmployeeId::from_uuid(row.creator_id),
            TenderFields {
                name: row.name,
                description: row.description,
                service_type: decode("service_type", &row.service_type, row.service_type.parse())?,
            },
            decode("status", &row.status, row.status.parse())?,
            from_db_version(row.version)?,
            row.created_at,
        ))
    }
}

#[derive(Debug)]
struct RevisionRow {
    tender_id: Uuid,
    version: i64,
    name: String,
    description: String,
    service_type: String,
    status: String,
    recorded_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for RevisionRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(RevisionRow {
            tender_id: row.try_get("tender_id")?,
            version: row.try_get("version")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            service_type: row.try_get("service_type")?,
            status: row.try_get("status")?,
            recorded_at: row.try_get("recorded_at")?,
        })
    }
}

impl TryFrom<RevisionRow> for TenderRevision {
    type Error = StoreError;

    fn try_from(row: RevisionRow) -> Result<Self, Self::Error> {
        Ok(TenderRevision {
            tender_id: TenderId::from_uuid(row.tender_id),
            version: from_db_version(row.version)?,
            fields: TenderFields {
                name: row.name,
                description: row.description,
                service_type: decode("service_type", &row.service_type, row.service_type.parse())?,
            },
            status: decode("status", &row.status, row.status.parse())?,
            recorded_at: row.recorded_at,
        })
    }
}

#[derive(Debug)]
struct BidRow {
    id: Uuid,
    name: String,
    description: String,
    tender_id: Uuid,
    author_type: String,
    author_id: Uuid,
    status: String,
    version: i64,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for BidRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(BidRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            tender_id: row.try_get("tender_id")?,
            author_type: row.try_get("author_type")?,
            author_id: row.try_get("author_id")?,
            status: row.try_get("status")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<BidRow> for Bid {
    type Error = StoreError;

    fn try_from(row: BidRow) -> Result<Self, Self::Error> {
        let author = match decode::<BidAuthorType, _>("author_type", &row.author_type, row.author_type.parse())? {
            BidAuthorType::User => BidAuthor::User(EmployeeId::from_uuid(row.author_id)),
            BidAuthorType::Organization => {
                BidAuthor::Organization(OrganizationId::from_uuid(row.author_id))
            }
        };
        Ok(Bid {
            id: BidId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            tender_id: TenderId::from_uuid(row.tender_id),
            author,
            status: decode("status", &row.status, row.status.parse())?,
            version: from_db_version(row.version)?,
            created_at: row.created_at,
        })
    }
}
