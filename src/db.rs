use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::models::user::Identity;

/// Resolves a user id to the identity published for authenticated requests.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_identity(&self, id: i64) -> Result<Option<Identity>, sqlx::Error>;
}

#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserLookup for SqliteStore {
    async fn find_identity(&self, id: i64) -> Result<Option<Identity>, sqlx::Error> {
        sqlx::query_as::<_, Identity>("SELECT id, name, email FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }
}

pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new().max_connections(5).connect(url).await
}

pub async fn migrate(db: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(db).await
}

/// True when a row with this id exists in `table`.
pub async fn id_exists(db: &SqlitePool, table: &'static str, id: i64) -> Result<bool, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ?");
    let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(db).await?;
    Ok(count > 0)
}

/// True when `column` already holds `value` in a row other than `except_id`.
pub async fn value_taken(
    db: &SqlitePool,
    table: &'static str,
    column: &'static str,
    value: &str,
    except_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE {column} = ? AND id != ?");
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(value)
        .bind(except_id.unwrap_or(0))
        .fetch_one(db)
        .await?;
    Ok(count > 0)
}
