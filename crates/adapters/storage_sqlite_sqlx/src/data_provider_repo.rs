//! `SQLite` implementation of [`DataProviderRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use cmms_app::ports::DataProviderRepository;
use cmms_domain::data_provider::{DataProvider, JobId};
use cmms_domain::error::CmmsError;
use cmms_domain::id::DataProviderId;

use crate::error::{StorageError, decode, not_found};

const INSERT: &str = "INSERT INTO data_providers (id, name, file_name, endpoint, port, field_object_id, equipment_id, recurrence, is_activated, job_id) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
const UPDATE: &str = "UPDATE data_providers SET name = ?, file_name = ?, endpoint = ?, port = ?, field_object_id = ?, equipment_id = ?, recurrence = ?, is_activated = ?, job_id = ? WHERE id = ?";

struct Wrapper(DataProvider);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let field_object_id: String = row.try_get("field_object_id")?;
        let equipment_id: String = row.try_get("equipment_id")?;
        let port: Option<i64> = row.try_get("port")?;
        let job_id: Option<String> = row.try_get("job_id")?;

        let port = port
            .map(u16::try_from)
            .transpose()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(DataProvider {
            id: decode(&id)?,
            name: row.try_get("name")?,
            file_name: row.try_get("file_name")?,
            endpoint: row.try_get("endpoint")?,
            port,
            field_object_id: decode(&field_object_id)?,
            equipment_id: decode(&equipment_id)?,
            recurrence: row.try_get("recurrence")?,
            is_activated: row.try_get("is_activated")?,
            job_id: job_id.map(JobId::from),
        }))
    }
}

/// `SQLite`-backed data provider repository.
#[derive(Clone)]
pub struct SqliteDataProviderRepository {
    pool: SqlitePool,
}

impl SqliteDataProviderRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DataProviderRepository for SqliteDataProviderRepository {
    async fn create(&self, provider: DataProvider) -> Result<DataProvider, CmmsError> {
        sqlx::query(INSERT)
            .bind(provider.id.to_string())
            .bind(&provider.name)
            .bind(&provider.file_name)
            .bind(&provider.endpoint)
            .bind(provider.port)
            .bind(provider.field_object_id.to_string())
            .bind(provider.equipment_id.to_string())
            .bind(&provider.recurrence)
            .bind(provider.is_activated)
            .bind(provider.job_id.as_ref().map(JobId::as_str))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(provider)
    }

    async fn get_by_id(&self, id: DataProviderId) -> Result<Option<DataProvider>, CmmsError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM data_providers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(|w| w.0))
    }

    async fn get_all(&self) -> Result<Vec<DataProvider>, CmmsError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM data_providers ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get_activated(&self) -> Result<Vec<DataProvider>, CmmsError> {
        let rows: Vec<Wrapper> =
            sqlx::query_as("SELECT * FROM data_providers WHERE is_activated = 1 ORDER BY rowid")
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, provider: DataProvider) -> Result<DataProvider, CmmsError> {
        let result = sqlx::query(UPDATE)
            .bind(&provider.name)
            .bind(&provider.file_name)
            .bind(&provider.endpoint)
            .bind(provider.port)
            .bind(provider.field_object_id.to_string())
            .bind(provider.equipment_id.to_string())
            .bind(&provider.recurrence)
            .bind(provider.is_activated)
            .bind(provider.job_id.as_ref().map(JobId::as_str))
            .bind(provider.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(not_found("DataProvider", provider.id));
        }
        Ok(provider)
    }

    async fn set_job_id(&self, id: DataProviderId, job_id: Option<JobId>) -> Result<(), CmmsError> {
        let result = sqlx::query("UPDATE data_providers SET job_id = ? WHERE id = ?")
            .bind(job_id.as_ref().map(JobId::as_str))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(not_found("DataProvider", id));
        }
        Ok(())
    }

    async fn delete(&self, id: DataProviderId) -> Result<(), CmmsError> {
        sqlx::query("DELETE FROM data_providers WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
