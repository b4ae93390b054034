//! Task completion — marking a task over and spawning its next occurrence.
//!
//! The transition `over: false → true` and the creation of the successor
//! are persisted in one repository call, which compares and sets `over`.
//! Only the first of two concurrent completions spawns a successor.

use cmms_domain::error::{CmmsError, NotFoundError};
use cmms_domain::id::TaskId;
use cmms_domain::task::Task;
use cmms_domain::trigger::plan_successor;

use crate::condition_evaluator::ConditionEvaluator;
use crate::ports::{Clock, FieldObjectRepository, FieldRepository, TaskRepository};

/// Result of a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The task was already over; nothing was written.
    AlreadyOver,
    /// The task is now over.
    Completed {
        /// The spawned next occurrence, for recurrences and frequencies.
        successor: Option<Task>,
    },
}

/// Completes tasks and spawns successors.
pub struct TaskCompletion<TR, FR, FOR, C> {
    tasks: TR,
    evaluator: ConditionEvaluator<FR, FOR>,
    clock: C,
}

impl<TR, FR, FOR, C> TaskCompletion<TR, FR, FOR, C>
where
    TR: TaskRepository,
    FR: FieldRepository,
    FOR: FieldObjectRepository,
    C: Clock,
{
    pub fn new(tasks: TR, fields: FR, field_objects: FOR, clock: C) -> Self {
        Self {
            tasks,
            evaluator: ConditionEvaluator::new(fields, field_objects),
            clock,
        }
    }

    /// Mark a task over, spawning its successor when it recurs.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::NotFound`] if the task does not exist, or a
    /// storage error from the repositories. On error nothing is written.
    #[tracing::instrument(skip(self))]
    pub async fn complete(&self, id: TaskId) -> Result<CompletionOutcome, CmmsError> {
        let task = self.tasks.get_by_id(id).await?.ok_or_else(|| NotFoundError {
            entity: "Task",
            id: id.to_string(),
        })?;
        if task.over {
            return Ok(CompletionOutcome::AlreadyOver);
        }

        let catalog = self.evaluator.catalog().await?;
        let conditions = self.evaluator.conditions(&catalog, id).await?;
        let successor = plan_successor(
            &task,
            &conditions.triggers,
            &conditions.end_conditions,
            self.clock.now(),
        );
        let spawned = successor.as_ref().map(|s| s.task.clone());

        if !self.tasks.complete_and_spawn(id, successor).await? {
            tracing::debug!(task_id = %id, "task completed concurrently");
            return Ok(CompletionOutcome::AlreadyOver);
        }

        match &spawned {
            Some(next) => tracing::info!(
                task_id = %id,
                successor_id = %next.id,
                end_date = ?next.end_date,
                "task completed, successor spawned"
            ),
            None => tracing::info!(task_id = %id, "task completed"),
        }
        Ok(CompletionOutcome::Completed { successor: spawned })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedClock, InMemoryStore, test_now};
    use chrono::Days;
    use cmms_domain::field::{END_CONDITIONS, EndConditionKind};
    use cmms_domain::field_object::{FieldObject, Owner};
    use cmms_domain::id::{EquipmentId, FieldObjectId, TeamId};
    use cmms_domain::period::Period;
    use cmms_domain::trigger::TriggerKind;
    use std::sync::Arc;

    type Completion =
        TaskCompletion<Arc<InMemoryStore>, Arc<InMemoryStore>, Arc<InMemoryStore>, FixedClock>;

    fn setup() -> (Arc<InMemoryStore>, Completion) {
        let store = Arc::new(InMemoryStore::seeded());
        let completion = TaskCompletion::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            FixedClock::default(),
        );
        (store, completion)
    }

    fn recurring_task(store: &InMemoryStore) -> Task {
        let task = store.add_task(
            Task::builder()
                .name("T1")
                .description("Monthly lubrication")
                .end_date(test_now().date_naive() + Days::new(5))
                .duration(Period::new(0, 2, 0))
                .equipment_id(EquipmentId::new())
                .team(TeamId::new())
                .triggered(true)
                .build()
                .unwrap(),
        );
        store.add_trigger(task.id, TriggerKind::Recurrence, "30d|5d");
        task
    }

    #[tokio::test]
    async fn should_spawn_recurrence_successor_one_period_ahead() {
        let (store, completion) = setup();
        let task = recurring_task(&store);

        let CompletionOutcome::Completed { successor: Some(next) } =
            completion.complete(task.id).await.unwrap()
        else {
            panic!("expected a successor");
        };

        assert!(store.task(task.id).over);
        let stored = store.task(next.id);
        assert_eq!(stored.end_date, Some(test_now().date_naive() + Days::new(30)));
        assert!(!stored.is_triggered);
        assert!(!stored.over);
        assert_eq!(stored.teams, task.teams);
        assert_eq!(stored.equipment_id, task.equipment_id);
        assert_eq!(stored.duration, task.duration);
        assert_eq!(stored.description, task.description);

        let copied = store.owned_by(Owner::Task(next.id));
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].value, "30d|5d");
    }

    #[tokio::test]
    async fn should_spawn_frequency_successor_with_advanced_next_trigger() {
        let (store, completion) = setup();
        let source = FieldObjectId::new();
        let task = store.add_task(Task::builder().name("T").triggered(true).build().unwrap());
        store.add_trigger(task.id, TriggerKind::Frequency, &format!("10000|{source}|7d|50000"));

        let CompletionOutcome::Completed { successor: Some(next) } =
            completion.complete(task.id).await.unwrap()
        else {
            panic!("expected a successor");
        };

        assert!(store.task(next.id).end_date.is_none());
        let copied = store.owned_by(Owner::Task(next.id));
        assert_eq!(copied[0].value, format!("10000|{source}|7d|60000"));
    }

    #[tokio::test]
    async fn should_not_spawn_for_threshold_only_tasks() {
        let (store, completion) = setup();
        let task = store.add_task(Task::builder().name("T").build().unwrap());
        store.add_trigger(
            task.id,
            TriggerKind::AboveThreshold,
            &format!("40000|{}|7d", FieldObjectId::new()),
        );

        let outcome = completion.complete(task.id).await.unwrap();
        assert_eq!(outcome, CompletionOutcome::Completed { successor: None });
        assert_eq!(store.tasks().len(), 1);
        assert!(store.task(task.id).over);
    }

    #[tokio::test]
    async fn should_spawn_only_once_when_completed_twice() {
        let (store, completion) = setup();
        let task = recurring_task(&store);

        let first = completion.complete(task.id).await.unwrap();
        let second = completion.complete(task.id).await.unwrap();

        assert!(matches!(first, CompletionOutcome::Completed { successor: Some(_) }));
        assert_eq!(second, CompletionOutcome::AlreadyOver);
        assert_eq!(store.tasks().len(), 2);
    }

    #[tokio::test]
    async fn should_spawn_only_once_when_completions_race() {
        let (store, completion) = setup();
        let task = recurring_task(&store);

        let (a, b) = tokio::join!(completion.complete(task.id), completion.complete(task.id));
        let spawned = [a.unwrap(), b.unwrap()]
            .into_iter()
            .filter(|o| matches!(o, CompletionOutcome::Completed { .. }))
            .count();

        assert_eq!(spawned, 1);
        assert_eq!(store.tasks().len(), 2);
    }

    #[tokio::test]
    async fn should_copy_end_conditions_with_cleared_values() {
        let (store, completion) = setup();
        let task = recurring_task(&store);
        let photo = store
            .catalog()
            .find(END_CONDITIONS, EndConditionKind::Photo.field_name())
            .unwrap()
            .id;
        store.add_field_object(
            FieldObject::builder(Owner::Task(task.id), photo)
                .value("photo-42.jpg")
                .build(),
        );

        let CompletionOutcome::Completed { successor: Some(next) } =
            completion.complete(task.id).await.unwrap()
        else {
            panic!("expected a successor");
        };

        let copied = store.owned_by(Owner::Task(next.id));
        let photo_copy = copied.iter().find(|fo| fo.field_id == photo).unwrap();
        assert!(photo_copy.value.is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_task() {
        let (_store, completion) = setup();
        let result = completion.complete(TaskId::new()).await;
        assert!(matches!(result, Err(CmmsError::NotFound(_))));
    }
}
