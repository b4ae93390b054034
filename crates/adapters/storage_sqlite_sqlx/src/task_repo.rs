//! `SQLite` implementation of [`TaskRepository`].
//!
//! Teams and files are stored as JSON arrays, deadlines as `YYYY-MM-DD`
//! text and durations in the `Nd Nh Nm` period grammar.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteExecutor, SqlitePool};

use cmms_app::ports::TaskRepository;
use cmms_domain::error::CmmsError;
use cmms_domain::id::TaskId;
use cmms_domain::task::Task;
use cmms_domain::time::Date;
use cmms_domain::trigger::Successor;

use crate::error::{StorageError, decode, decode_opt, not_found};
use crate::field_object_repo;

const INSERT: &str = "INSERT INTO tasks (id, name, description, end_date, duration, is_template, over, is_triggered, equipment_id, equipment_type_id, teams, files, created_by) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
const UPDATE: &str = "UPDATE tasks SET name = ?, description = ?, end_date = ?, duration = ?, is_template = ?, is_triggered = ?, equipment_id = ?, equipment_type_id = ?, teams = ?, files = ?, created_by = ? WHERE id = ? RETURNING over";
const MARK_TRIGGERED: &str = "UPDATE tasks SET is_triggered = 1, end_date = ? WHERE id = ? AND over = 0 AND is_triggered = 0";
const SELECT_PENDING: &str =
    "SELECT * FROM tasks WHERE over = 0 AND is_triggered = 0 AND is_template = 0 ORDER BY rowid";

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Task);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Task> {
        value.map(|w| w.0)
    }

    fn list(values: Vec<Self>) -> Vec<Task> {
        values.into_iter().map(|w| w.0).collect()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let teams_json: String = row.try_get("teams")?;
        let files_json: String = row.try_get("files")?;

        Ok(Self(Task {
            id: decode(&id)?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            end_date: decode_opt(row.try_get("end_date")?)?,
            duration: decode_opt(row.try_get("duration")?)?,
            is_template: row.try_get("is_template")?,
            over: row.try_get("over")?,
            is_triggered: row.try_get("is_triggered")?,
            equipment_id: decode_opt(row.try_get("equipment_id")?)?,
            equipment_type_id: decode_opt(row.try_get("equipment_type_id")?)?,
            teams: serde_json::from_str(&teams_json)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            files: serde_json::from_str(&files_json)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            created_by: decode_opt(row.try_get("created_by")?)?,
        }))
    }
}

async fn insert<'e, E>(executor: E, task: &Task) -> Result<(), StorageError>
where
    E: SqliteExecutor<'e>,
{
    let teams_json = serde_json::to_string(&task.teams)?;
    let files_json = serde_json::to_string(&task.files)?;

    sqlx::query(INSERT)
        .bind(task.id.to_string())
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.end_date.map(|d| d.to_string()))
        .bind(task.duration.map(|p| p.to_string()))
        .bind(task.is_template)
        .bind(task.over)
        .bind(task.is_triggered)
        .bind(task.equipment_id.map(|id| id.to_string()))
        .bind(task.equipment_type_id.map(|id| id.to_string()))
        .bind(&teams_json)
        .bind(&files_json)
        .bind(task.created_by.map(|id| id.to_string()))
        .execute(executor)
        .await?;
    Ok(())
}

/// `SQLite`-backed task repository.
#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, task: Task) -> Result<Task, CmmsError> {
        insert(&self.pool, &task).await?;
        Ok(task)
    }

    async fn get_by_id(&self, id: TaskId) -> Result<Option<Task>, CmmsError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Task>, CmmsError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM tasks ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::list(rows))
    }

    async fn list_pending(&self) -> Result<Vec<Task>, CmmsError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_PENDING)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::list(rows))
    }

    async fn update(&self, task: Task) -> Result<Task, CmmsError> {
        let teams_json = serde_json::to_string(&task.teams).map_err(StorageError::from)?;
        let files_json = serde_json::to_string(&task.files).map_err(StorageError::from)?;

        let stored: Option<(bool,)> = sqlx::query_as(UPDATE)
            .bind(&task.name)
            .bind(&task.description)
            .bind(task.end_date.map(|d| d.to_string()))
            .bind(task.duration.map(|p| p.to_string()))
            .bind(task.is_template)
            .bind(task.is_triggered)
            .bind(task.equipment_id.map(|id| id.to_string()))
            .bind(task.equipment_type_id.map(|id| id.to_string()))
            .bind(&teams_json)
            .bind(&files_json)
            .bind(task.created_by.map(|id| id.to_string()))
            .bind(task.id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        match stored {
            Some((over,)) => Ok(Task { over, ..task }),
            None => Err(not_found("Task", task.id)),
        }
    }

    async fn mark_triggered(&self, id: TaskId, end_date: Option<Date>) -> Result<bool, CmmsError> {
        let result = sqlx::query(MARK_TRIGGERED)
            .bind(end_date.map(|d| d.to_string()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: TaskId) -> Result<(), CmmsError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        sqlx::query("DELETE FROM field_objects WHERE owner_kind = 'task' AND owner_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }

    async fn complete_and_spawn(
        &self,
        id: TaskId,
        successor: Option<Successor>,
    ) -> Result<bool, CmmsError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        let flipped = sqlx::query("UPDATE tasks SET over = 1 WHERE id = ? AND over = 0")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        if flipped.rows_affected() == 0 {
            let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM tasks WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            tx.rollback().await.map_err(StorageError::from)?;
            return match exists {
                Some(_) => Ok(false),
                None => Err(not_found("Task", id)),
            };
        }

        if let Some(successor) = successor {
            insert(&mut *tx, &successor.task).await?;
            for field_object in &successor.field_objects {
                field_object_repo::insert(&mut *tx, field_object)
                    .await
                    .map_err(StorageError::from)?;
            }
        }

        tx.commit().await.map_err(StorageError::from)?;
        Ok(true)
    }
}
