//! PostgreSQL backend over `public.announcements`.

use async_trait::async_trait;
use sqlx::postgres::PgDatabaseError;
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};

use super::{AnnouncementStore, StoreError};
use crate::models::announcement::{Announcement, NewAnnouncement};
use crate::services::metrics;

pub const TABLE: &str = "public.announcements";
pub const DEFAULT_FETCH_LIMIT: i64 = 200;

/// SQLSTATE `not_null_violation`.
const NOT_NULL_VIOLATION: &str = "23502";

/// What to do after the insert that relies on the column default failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertFallback {
    /// `id` has no default: retry once with a client-generated token.
    RetryWithGeneratedId,
    /// Anything else is a real failure and goes back to the caller.
    Abort,
}

impl InsertFallback {
    /// Decide from the SQLSTATE and the offending column, when the server
    /// reported one.
    pub fn classify(code: Option<&str>, column: Option<&str>) -> Self {
        match (code, column) {
            (Some(NOT_NULL_VIOLATION), None | Some("id")) => Self::RetryWithGeneratedId,
            _ => Self::Abort,
        }
    }

    fn for_error(err: &sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => {
                let column = db
                    .try_downcast_ref::<PgDatabaseError>()
                    .and_then(|pg| pg.column());
                Self::classify(db.code().as_deref(), column)
            }
            _ => Self::Abort,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    fetch_limit: i64,
}

impl PgStore {
    pub fn new(pool: PgPool, fetch_limit: i64) -> Self {
        Self { pool, fetch_limit }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Newest first, capped at `limit` rows. Equal timestamps order by id,
    /// descending, so repeated reads agree.
    pub async fn fetch(&self, limit: i64) -> Result<Vec<Announcement>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, Announcement>(&format!(
            r#"SELECT id::text AS id, title, text, created_at
               FROM {TABLE}
               ORDER BY created_at DESC, id DESC
               LIMIT $1"#
        ))
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Insert relying on the `id` default first, then fall back to a
    /// generated token when the table has none. The connection goes back to
    /// the pool when `conn` drops, on every path.
    pub async fn insert_new(&self, new: &NewAnnouncement) -> Result<Announcement, StoreError> {
        let mut conn = self.pool.acquire().await?;

        match insert_without_id(&mut conn, new).await {
            Ok(row) => Ok(row),
            Err(err) => match InsertFallback::for_error(&err) {
                InsertFallback::RetryWithGeneratedId => {
                    let id = new.generated_id();
                    info!(%id, "No default for announcements.id, retrying with generated id");
                    metrics::FALLBACK_IDS_COUNTER.inc();
                    Ok(insert_with_id(&mut conn, new, &id).await?)
                }
                InsertFallback::Abort => Err(err.into()),
            },
        }
    }
}

async fn insert_without_id(
    conn: &mut PgConnection,
    new: &NewAnnouncement,
) -> Result<Announcement, sqlx::Error> {
    let mut tx = sqlx::Connection::begin(&mut *conn).await?;
    let result = sqlx::query_as::<_, Announcement>(&format!(
        r#"INSERT INTO {TABLE} (title, text, created_at)
           VALUES ($1, $2, $3)
           RETURNING id::text AS id, title, text, created_at"#
    ))
    .bind(&new.title)
    .bind(&new.text)
    .bind(new.created_at)
    .fetch_one(&mut *tx)
    .await;

    match result {
        Ok(row) => {
            tx.commit().await?;
            Ok(row)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback after failed insert also failed");
            }
            Err(err)
        }
    }
}

async fn insert_with_id(
    conn: &mut PgConnection,
    new: &NewAnnouncement,
    id: &str,
) -> Result<Announcement, sqlx::Error> {
    let mut tx = sqlx::Connection::begin(&mut *conn).await?;
    let row = sqlx::query_as::<_, Announcement>(&format!(
        r#"INSERT INTO {TABLE} (id, title, text, created_at)
           VALUES ($1, $2, $3, $4)
           RETURNING id::text AS id, title, text, created_at"#
    ))
    .bind(id)
    .bind(&new.title)
    .bind(&new.text)
    .bind(new.created_at)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

#[async_trait]
impl AnnouncementStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self) -> Result<Vec<Announcement>, StoreError> {
        self.fetch(self.fetch_limit).await
    }

    async fn insert(&self, new: NewAnnouncement) -> Result<Announcement, StoreError> {
        self.insert_new(&new).await
    }

    async fn health(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}
