//! `SQLite` implementation of [`FieldRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use cmms_app::ports::FieldRepository;
use cmms_domain::error::CmmsError;
use cmms_domain::field::Field;

use crate::error::{StorageError, decode};

struct Wrapper(Field);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        Ok(Self(Field {
            id: decode(&id)?,
            name: row.try_get("name")?,
            group: row.try_get("group_name")?,
        }))
    }
}

/// `SQLite`-backed field catalog.
#[derive(Clone)]
pub struct SqliteFieldRepository {
    pool: SqlitePool,
}

impl SqliteFieldRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl FieldRepository for SqliteFieldRepository {
    async fn create(&self, field: Field) -> Result<Field, CmmsError> {
        sqlx::query("INSERT INTO fields (id, name, group_name) VALUES (?, ?, ?)")
            .bind(field.id.to_string())
            .bind(&field.name)
            .bind(&field.group)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(field)
    }

    async fn get_all(&self) -> Result<Vec<Field>, CmmsError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM fields ORDER BY group_name, name")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
