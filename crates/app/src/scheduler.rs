//! Task trigger scheduler — the periodic tick activating pending tasks.
//!
//! Each tick loads every pending task (not over, not triggered, not a
//! template), evaluates it and persists the ones whose trigger fires before
//! moving to the next. The write only lands while the task is still pending,
//! so a completion racing the evaluation is never undone. Ticks never overlap: the loop awaits a tick before
//! waiting for the next one. A failure on one task is reported and does not
//! stop the tick.

use std::sync::Arc;
use std::time::Duration;

use cmms_domain::error::CmmsError;
use cmms_domain::field::FieldCatalog;
use cmms_domain::task::Task;
use cmms_domain::time::Timestamp;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::condition_evaluator::ConditionEvaluator;
use crate::ports::{Clock, FieldObjectRepository, FieldRepository, TaskRepository};

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Pending tasks examined.
    pub evaluated: usize,
    /// Tasks whose trigger fired and were persisted as triggered.
    pub triggered: usize,
    /// Tasks left unchanged because of a storage failure.
    pub failed: usize,
}

/// Periodically triggers tasks whose conditions fire.
pub struct TaskTriggerScheduler<TR, FR, FOR, C> {
    tasks: TR,
    evaluator: ConditionEvaluator<FR, FOR>,
    clock: C,
}

impl<TR, FR, FOR, C> TaskTriggerScheduler<TR, FR, FOR, C>
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

    /// Run one tick over every pending task.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the catalog or the pending tasks cannot
    /// be loaded. Failures on individual tasks are counted in the report.
    pub async fn tick(&self) -> Result<TickReport, CmmsError> {
        let now = self.clock.now();
        let catalog = self.evaluator.catalog().await?;
        let pending = self.tasks.list_pending().await?;
        let mut report = TickReport::default();

        for task in pending {
            report.evaluated += 1;
            let task_id = task.id;
            match self.process(&catalog, task, now).await {
                Ok(true) => report.triggered += 1,
                Ok(false) => {}
                Err(err) => {
                    report.failed += 1;
                    tracing::error!(task_id = %task_id, error = %err, "failed to evaluate task");
                }
            }
        }

        tracing::debug!(
            evaluated = report.evaluated,
            triggered = report.triggered,
            failed = report.failed,
            "trigger tick complete"
        );
        Ok(report)
    }

    async fn process(
        &self,
        catalog: &FieldCatalog,
        mut task: Task,
        now: Timestamp,
    ) -> Result<bool, CmmsError> {
        let Some(firing) = self.evaluator.evaluate_with(catalog, &task, now).await? else {
            return Ok(false);
        };
        firing.apply(&mut task, now);
        if !self.tasks.mark_triggered(task.id, task.end_date).await? {
            tracing::debug!(task_id = %task.id, "task left pending state during evaluation");
            return Ok(false);
        }
        tracing::info!(
            task_id = %task.id,
            kind = %firing.condition.kind(),
            end_date = ?task.end_date,
            "task triggered"
        );
        Ok(true)
    }
}

impl<TR, FR, FOR, C> TaskTriggerScheduler<TR, FR, FOR, C>
where
    TR: TaskRepository + Send + Sync + 'static,
    FR: FieldRepository + Send + Sync + 'static,
    FOR: FieldObjectRepository + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Spawn the tick loop. The first tick runs immediately.
    ///
    /// The loop stops between ticks once `cancel` is cancelled.
    #[must_use]
    pub fn start(self: Arc<Self>, every: Duration, cancel: CancellationToken) -> SchedulerHandle {
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval_secs = every.as_secs(), "task trigger scheduler started");

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(err) = self.tick().await {
                            tracing::error!(error = %err, "trigger tick failed");
                        }
                    }
                }
            }
            tracing::info!("task trigger scheduler stopped");
        });
        SchedulerHandle { cancel, task }
    }
}

/// Handle on a running tick loop.
#[derive(Debug)]
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the loop after the current tick, and wait for it.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "task trigger scheduler did not stop cleanly");
        }
    }
}
