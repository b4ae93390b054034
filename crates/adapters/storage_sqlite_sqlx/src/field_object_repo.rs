//! `SQLite` implementation of [`FieldObjectRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteExecutor, SqlitePool};

use cmms_app::ports::FieldObjectRepository;
use cmms_domain::error::CmmsError;
use cmms_domain::field_object::{FieldObject, Owner, OwnerKind};
use cmms_domain::id::FieldObjectId;

use crate::error::{StorageError, decode, decode_opt, not_found};

const INSERT: &str = "INSERT INTO field_objects (id, owner_kind, owner_id, field_id, value, field_value_id, description) VALUES (?, ?, ?, ?, ?, ?, ?)";
const UPDATE: &str = "UPDATE field_objects SET owner_kind = ?, owner_id = ?, field_id = ?, value = ?, field_value_id = ?, description = ? WHERE id = ?";

struct Wrapper(FieldObject);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let owner_kind: String = row.try_get("owner_kind")?;
        let owner_id: String = row.try_get("owner_id")?;
        let field_id: String = row.try_get("field_id")?;

        let kind: OwnerKind = decode(&owner_kind)?;
        Ok(Self(FieldObject {
            id: decode(&id)?,
            owner: Owner::from_parts(kind, decode(&owner_id)?),
            field_id: decode(&field_id)?,
            value: row.try_get("value")?,
            field_value_id: decode_opt(row.try_get("field_value_id")?)?,
            description: row.try_get("description")?,
        }))
    }
}

/// Insert a field object through any executor, a transaction included.
pub(crate) async fn insert<'e, E>(executor: E, field_object: &FieldObject) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(INSERT)
        .bind(field_object.id.to_string())
        .bind(field_object.owner.kind().tag())
        .bind(field_object.owner.uuid().to_string())
        .bind(field_object.field_id.to_string())
        .bind(&field_object.value)
        .bind(field_object.field_value_id.map(|id| id.to_string()))
        .bind(field_object.description.as_deref())
        .execute(executor)
        .await?;
    Ok(())
}

/// `SQLite`-backed field object repository.
#[derive(Clone)]
pub struct SqliteFieldObjectRepository {
    pool: SqlitePool,
}

impl SqliteFieldObjectRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl FieldObjectRepository for SqliteFieldObjectRepository {
    async fn create(&self, field_object: FieldObject) -> Result<FieldObject, CmmsError> {
        insert(&self.pool, &field_object)
            .await
            .map_err(StorageError::from)?;
        Ok(field_object)
    }

    async fn get_by_id(&self, id: FieldObjectId) -> Result<Option<FieldObject>, CmmsError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM field_objects WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(|w| w.0))
    }

    async fn find_by_owner(&self, owner: Owner) -> Result<Vec<FieldObject>, CmmsError> {
        let rows: Vec<Wrapper> = sqlx::query_as(
            "SELECT * FROM field_objects WHERE owner_kind = ? AND owner_id = ? ORDER BY rowid",
        )
        .bind(owner.kind().tag())
        .bind(owner.uuid().to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, field_object: FieldObject) -> Result<FieldObject, CmmsError> {
        let result = sqlx::query(UPDATE)
            .bind(field_object.owner.kind().tag())
            .bind(field_object.owner.uuid().to_string())
            .bind(field_object.field_id.to_string())
            .bind(&field_object.value)
            .bind(field_object.field_value_id.map(|id| id.to_string()))
            .bind(field_object.description.as_deref())
            .bind(field_object.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(not_found("FieldObject", field_object.id));
        }
        Ok(field_object)
    }

    async fn delete(&self, id: FieldObjectId) -> Result<(), CmmsError> {
        sqlx::query("DELETE FROM field_objects WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_repo::SqliteFieldRepository;
    use crate::pool::{Config, Database};
    use cmms_app::ports::FieldRepository;
    use cmms_domain::field::{Field, FieldCatalog};
    use cmms_domain::id::{EquipmentId, FieldId, TaskId};
    use cmms_domain::trigger::TriggerKind;

    async fn setup() -> (Database, SqliteFieldObjectRepository) {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        let repo = SqliteFieldObjectRepository::new(db.pool().clone());
        (db, repo)
    }

    async fn trigger_field(db: &Database, kind: TriggerKind) -> FieldId {
        let fields = SqliteFieldRepository::new(db.pool().clone());
        let catalog = FieldCatalog::new(fields.get_all().await.unwrap());
        catalog.trigger_field(kind).unwrap().id
    }

    #[tokio::test]
    async fn should_create_and_retrieve_field_object() {
        let (db, repo) = setup().await;
        let field = trigger_field(&db, TriggerKind::AboveThreshold).await;
        let fo = FieldObject::builder(Owner::Task(TaskId::new()), field)
            .value("10|fo-1")
            .description("temperature watch")
            .build();

        repo.create(fo.clone()).await.unwrap();

        assert_eq!(repo.get_by_id(fo.id).await.unwrap(), Some(fo));
    }

    #[tokio::test]
    async fn should_find_by_owner_in_insertion_order() {
        let (db, repo) = setup().await;
        let fields = SqliteFieldRepository::new(db.pool().clone());
        let pressure = fields
            .create(Field::new("Pressure", "Sensors").unwrap())
            .await
            .unwrap();
        let owner = Owner::Equipment(EquipmentId::new());
        let mut expected = Vec::new();
        for value in ["3", "1", "2"] {
            let fo = FieldObject::builder(owner, pressure.id).value(value).build();
            repo.create(fo.clone()).await.unwrap();
            expected.push(fo);
        }
        repo.create(FieldObject::builder(Owner::Equipment(EquipmentId::new()), pressure.id).build())
            .await
            .unwrap();

        assert_eq!(repo.find_by_owner(owner).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn should_update_value_and_delete() {
        let (db, repo) = setup().await;
        let field = trigger_field(&db, TriggerKind::Frequency).await;
        let fo = FieldObject::builder(Owner::Task(TaskId::new()), field)
            .value("250|1000|fo-2")
            .build();
        repo.create(fo.clone()).await.unwrap();

        repo.update(FieldObject {
            value: "250|1250|fo-2".into(),
            ..fo.clone()
        })
        .await
        .unwrap();
        assert_eq!(
            repo.get_by_id(fo.id).await.unwrap().unwrap().value,
            "250|1250|fo-2"
        );

        repo.delete(fo.id).await.unwrap();
        assert!(repo.get_by_id(fo.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_return_not_found_when_updating_missing_field_object() {
        let (db, repo) = setup().await;
        let field = trigger_field(&db, TriggerKind::Recurrence).await;
        let fo = FieldObject::builder(Owner::Task(TaskId::new()), field).build();

        let result = repo.update(fo).await;
        assert!(matches!(result, Err(CmmsError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_reject_field_object_with_unknown_field() {
        let (_db, repo) = setup().await;
        let fo = FieldObject::builder(Owner::Task(TaskId::new()), FieldId::new()).build();

        let result = repo.create(fo).await;
        assert!(matches!(result, Err(CmmsError::Storage(_))));
    }
}
