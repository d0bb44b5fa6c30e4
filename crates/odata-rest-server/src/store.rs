//! Service record source.
//!
//! The store is read once per generation pass. Rows come back as
//! column → value maps so that every historical table layout reaches
//! [`normalize_row`](odata_rest_core::normalize_row) unchanged.

use std::str::FromStr;

use async_trait::async_trait;
use odata_rest_core::RawServiceRow;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, ValueRef};

/// Errors reading service rows.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The configured table name is not a plain SQL identifier.
    #[error("invalid table name `{table}`")]
    InvalidTable {
        /// The rejected name.
        table: String,
    },

    /// Connection or query failure.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Anything that can list the raw service rows.
#[async_trait]
pub trait ServiceStore: Send + Sync {
    /// Every row of the service table, inactive ones included.
    async fn fetch_rows(&self) -> Result<Vec<RawServiceRow>, StoreError>;
}

/// Rows held in memory, for list-only deployments and tests.
#[async_trait]
impl ServiceStore for Vec<RawServiceRow> {
    async fn fetch_rows(&self) -> Result<Vec<RawServiceRow>, StoreError> {
        Ok(self.clone())
    }
}

/// A SQLite table of service rows.
#[derive(Debug, Clone)]
pub struct SqliteServiceStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteServiceStore {
    /// Open `database` (a file path or `sqlite:` URL) read-only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTable`] before connecting if `table` is not
    /// an identifier, or [`StoreError::Database`] if the file cannot be opened.
    pub async fn connect(database: &str, table: &str) -> Result<Self, StoreError> {
        validate_table(table)?;

        let options = if database.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(database)?
        } else {
            SqliteConnectOptions::new().filename(database)
        };
        let options = options.read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await?;
        tracing::debug!(database, table, "connected to service store");
        Self::from_pool(pool, table)
    }

    /// Use an existing pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTable`] if `table` is not an identifier.
    pub fn from_pool(pool: SqlitePool, table: &str) -> Result<Self, StoreError> {
        validate_table(table)?;
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }
}

#[async_trait]
impl ServiceStore for SqliteServiceStore {
    async fn fetch_rows(&self) -> Result<Vec<RawServiceRow>, StoreError> {
        // The table name is validated as an identifier, never user-supplied per request.
        let sql = format!("SELECT * FROM \"{}\"", self.table);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        tracing::debug!(table = %self.table, rows = rows.len(), "read service rows");
        Ok(rows.iter().map(decode_row).collect())
    }
}

fn validate_table(table: &str) -> Result<(), StoreError> {
    let mut chars = table.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTable {
            table: table.to_string(),
        })
    }
}

fn decode_row(row: &SqliteRow) -> RawServiceRow {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), decode_value(row, column.ordinal())))
        .collect()
}

/// SQLite storage class → JSON value. BLOBs are read as UTF-8 text.
fn decode_value(row: &SqliteRow, index: usize) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => {}
        _ => return Value::Null,
    }
    if let Ok(n) = row.try_get::<i64, _>(index) {
        return Value::from(n);
    }
    if let Ok(x) = row.try_get::<f64, _>(index) {
        return Value::from(x);
    }
    if let Ok(s) = row.try_get::<String, _>(index) {
        return Value::String(s);
    }
    row.try_get::<Vec<u8>, _>(index)
        .map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[test]
    fn table_names() {
        assert!(validate_table("odata_services").is_ok());
        assert!(validate_table("_t2").is_ok());
        for bad in ["", "2fast", "services; DROP TABLE x", "a-b", "\"q\""] {
            assert!(
                matches!(validate_table(bad), Err(StoreError::InvalidTable { .. })),
                "{bad}",
            );
        }
    }

    #[tokio::test]
    async fn rows_decoded_by_storage_class() {
        let pool = memory_pool().await;
        sqlx::query(
            "CREATE TABLE odata_services (id INTEGER, service_name TEXT, active BOOLEAN, \
             weight REAL, metadata_xml BLOB, base_url TEXT)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO odata_services VALUES (1, 'demo', 1, 0.5, CAST('<edmx/>' AS BLOB), NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let store = SqliteServiceStore::from_pool(pool, "odata_services").unwrap();
        let rows = store.fetch_rows().await.unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["id"], json!(1));
        assert_eq!(row["service_name"], json!("demo"));
        assert_eq!(row["active"], json!(1));
        assert_eq!(row["weight"], json!(0.5));
        assert_eq!(row["metadata_xml"], json!("<edmx/>"));
        assert_eq!(row["base_url"], Value::Null);
    }

    #[tokio::test]
    async fn missing_table_is_database_error() {
        let store = SqliteServiceStore::from_pool(memory_pool().await, "nowhere").unwrap();
        assert!(matches!(
            store.fetch_rows().await,
            Err(StoreError::Database(_)),
        ));
    }

    #[tokio::test]
    async fn invalid_table_rejected_before_connecting() {
        let err = SqliteServiceStore::connect("/nonexistent/x.sqlite", "bad name")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTable { .. }));
    }

    #[tokio::test]
    async fn in_memory_rows() {
        let rows: Vec<RawServiceRow> = vec![[("name".to_string(), json!("demo"))].into()];
        assert_eq!(rows.fetch_rows().await.unwrap(), rows);
    }
}
