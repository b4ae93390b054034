//! `SQLite` implementation of [`EquipmentRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use cmms_app::ports::EquipmentRepository;
use cmms_domain::equipment::Equipment;
use cmms_domain::error::CmmsError;
use cmms_domain::id::EquipmentId;

use crate::error::{StorageError, decode, decode_opt};

struct Wrapper(Equipment);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        Ok(Self(Equipment {
            id: decode(&id)?,
            name: row.try_get("name")?,
            equipment_type_id: decode_opt(row.try_get("equipment_type_id")?)?,
        }))
    }
}

/// `SQLite`-backed equipment repository.
#[derive(Clone)]
pub struct SqliteEquipmentRepository {
    pool: SqlitePool,
}

impl SqliteEquipmentRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl EquipmentRepository for SqliteEquipmentRepository {
    async fn create(&self, equipment: Equipment) -> Result<Equipment, CmmsError> {
        sqlx::query("INSERT INTO equipment (id, name, equipment_type_id) VALUES (?, ?, ?)")
            .bind(equipment.id.to_string())
            .bind(&equipment.name)
            .bind(equipment.equipment_type_id.map(|id| id.to_string()))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(equipment)
    }

    async fn get_by_id(&self, id: EquipmentId) -> Result<Option<Equipment>, CmmsError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM equipment WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(|w| w.0))
    }

    async fn get_all(&self) -> Result<Vec<Equipment>, CmmsError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM equipment ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use cmms_domain::id::EquipmentTypeId;

    async fn setup() -> SqliteEquipmentRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteEquipmentRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn should_create_and_retrieve_equipment() {
        let repo = setup().await;
        let equipment = Equipment::builder()
            .name("Press #4")
            .equipment_type_id(EquipmentTypeId::new())
            .build()
            .unwrap();

        repo.create(equipment.clone()).await.unwrap();

        assert_eq!(repo.get_by_id(equipment.id).await.unwrap(), Some(equipment));
    }

    #[tokio::test]
    async fn should_return_none_for_unknown_equipment() {
        let repo = setup().await;
        assert!(repo.get_by_id(EquipmentId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_list_equipment_by_name() {
        let repo = setup().await;
        for name in ["Lathe", "Compressor"] {
            repo.create(Equipment::builder().name(name).build().unwrap())
                .await
                .unwrap();
        }

        let names: Vec<String> = repo
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Compressor", "Lathe"]);
    }
}
