//! Data-provider runtime — polls external endpoints into field objects.
//!
//! Every activated [`DataProvider`] gets one background job: a loop that
//! waits for the provider's recurrence, takes a worker permit, runs the
//! job body and goes back to sleep. Because a provider owns a single loop,
//! it never runs concurrently with itself; the shared semaphore bounds how
//! many providers run at once.
//!
//! The job body resolves the acquisition routine named by the provider,
//! reads one value and overwrites the target field object with its string
//! form. Failures are reported and the loop waits for its next tick.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cmms_domain::data_provider::{DataProvider, JobId};
use cmms_domain::error::{AcquisitionError, CmmsError, InvariantViolation};
use cmms_domain::id::DataProviderId;
use cmms_domain::period::Period;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::acquisition_registry::AcquisitionRegistry;
use crate::ports::{DataProviderRepository, FieldObjectRepository, Reading};

/// A registered job, as listed by [`DataProviderRuntime::jobs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub job_id: JobId,
    pub provider_id: DataProviderId,
    pub every: Period,
    /// Whether the job loop is still alive.
    pub running: bool,
}

struct Job {
    provider_id: DataProviderId,
    every: Period,
    handle: JoinHandle<()>,
}

struct JobContext<FOR> {
    field_objects: FOR,
    registry: Arc<AcquisitionRegistry>,
    workers: Semaphore,
}

impl<FOR: FieldObjectRepository> JobContext<FOR> {
    async fn run(&self, provider: &DataProvider) -> Result<Reading, CmmsError> {
        let reading = self
            .registry
            .acquire(&provider.file_name, &provider.endpoint, provider.port)
            .await?;

        let mut target = self
            .field_objects
            .get_by_id(provider.field_object_id)
            .await?
            .ok_or_else(|| InvariantViolation::MissingTarget(provider.field_object_id.to_string()))?;
        target.value = reading.to_string();
        self.field_objects.update(target).await?;
        Ok(reading)
    }
}

/// Owns the polling jobs of every activated data provider.
pub struct DataProviderRuntime<DR, FOR> {
    providers: DR,
    context: Arc<JobContext<FOR>>,
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl<DR, FOR> DataProviderRuntime<DR, FOR> {
    /// Create a runtime running at most `workers` jobs at once.
    pub fn new(
        providers: DR,
        field_objects: FOR,
        registry: Arc<AcquisitionRegistry>,
        workers: usize,
    ) -> Self {
        Self {
            providers,
            context: Arc::new(JobContext {
                field_objects,
                registry,
                workers: Semaphore::new(workers.max(1)),
            }),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<JobId, Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registered jobs.
    #[must_use]
    pub fn jobs(&self) -> Vec<JobInfo> {
        self.lock_jobs()
            .iter()
            .map(|(job_id, job)| JobInfo {
                job_id: job_id.clone(),
                provider_id: job.provider_id,
                every: job.every,
                running: !job.handle.is_finished(),
            })
            .collect()
    }

    /// Cancel the job of `provider`, clearing its `job_id`.
    ///
    /// Any other job still registered for the same provider is cancelled
    /// too. Returns `false` when nothing was registered.
    pub fn remove_job(&self, provider: &mut DataProvider) -> bool {
        let stale = provider.job_id.take();
        let mut jobs = self.lock_jobs();
        let ids: Vec<JobId> = jobs
            .iter()
            .filter(|(id, job)| job.provider_id == provider.id || stale.as_ref() == Some(*id))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &ids {
            if let Some(job) = jobs.remove(id) {
                job.handle.abort();
                tracing::info!(provider_id = %provider.id, job_id = %id, "data provider job removed");
            }
        }
        !ids.is_empty()
    }

    /// Cancel every job.
    pub fn shutdown(&self) {
        let mut jobs = self.lock_jobs();
        for (_, job) in jobs.drain() {
            job.handle.abort();
        }
        tracing::info!("data provider runtime stopped");
    }
}

impl<DR, FOR> DataProviderRuntime<DR, FOR>
where
    DR: DataProviderRepository,
    FOR: FieldObjectRepository + Send + Sync + 'static,
{
    /// Register a job for every activated provider.
    ///
    /// Jobs registered by a previous call are replaced. Providers that
    /// cannot be scheduled are reported and skipped. Returns the number of
    /// registered jobs.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the providers cannot be loaded.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<usize, CmmsError> {
        let providers = self.providers.get_activated().await?;

        let active: Vec<DataProviderId> = providers.iter().map(|p| p.id).collect();
        self.lock_jobs().retain(|_, job| {
            let keep = active.contains(&job.provider_id);
            if !keep {
                job.handle.abort();
            }
            keep
        });

        let mut registered = 0;
        for mut provider in providers {
            match self.add_job(&mut provider).await {
                Ok(_) => registered += 1,
                Err(err) => report_skipped(&provider, &err),
            }
        }
        tracing::info!(jobs = registered, "data provider runtime started");
        Ok(registered)
    }

    /// Register a job for `provider` and record its handle.
    ///
    /// A job previously registered for the provider is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::InvalidConfig`] when the recurrence does not
    /// parse, [`CmmsError::Acquisition`] when the routine cannot be
    /// resolved, or a storage error when the handle cannot be recorded.
    #[tracing::instrument(skip(self, provider), fields(provider_id = %provider.id))]
    pub async fn add_job(&self, provider: &mut DataProvider) -> Result<JobId, CmmsError> {
        let every = provider.recurrence_period()?;
        self.context.registry.resolve(&provider.file_name)?;

        self.remove_job(provider);
        let job_id = JobId::generate();
        let handle = tokio::spawn(run_job(
            Arc::clone(&self.context),
            provider.clone(),
            every,
            job_id.clone(),
        ));
        self.lock_jobs().insert(
            job_id.clone(),
            Job {
                provider_id: provider.id,
                every,
                handle,
            },
        );

        if let Err(err) = self.providers.set_job_id(provider.id, Some(job_id.clone())).await {
            self.remove_job(provider);
            return Err(err);
        }
        provider.job_id = Some(job_id.clone());
        tracing::info!(job_id = %job_id, every = %every, "data provider job registered");
        Ok(job_id)
    }

    /// Invoke the routine `file_name` once against `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns the [`AcquisitionError`] of the failed step.
    pub async fn test_configuration(
        &self,
        file_name: &str,
        endpoint: &str,
        port: Option<u16>,
    ) -> Result<Reading, AcquisitionError> {
        self.context.registry.acquire(file_name, endpoint, port).await
    }

    /// Run the job body of `provider` once, now.
    ///
    /// # Errors
    ///
    /// Returns the error of the failed step; the target is left unchanged.
    pub async fn run_job_once(&self, provider: &DataProvider) -> Result<Reading, CmmsError> {
        self.context.run(provider).await
    }
}

impl<DR, FOR> Drop for DataProviderRuntime<DR, FOR> {
    fn drop(&mut self) {
        for (_, job) in self.lock_jobs().drain() {
            job.handle.abort();
        }
    }
}

async fn run_job<FOR>(
    context: Arc<JobContext<FOR>>,
    provider: DataProvider,
    every: Period,
    job_id: JobId,
) where
    FOR: FieldObjectRepository + Send + Sync + 'static,
{
    let mut interval = tokio::time::interval(every.to_std());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let Ok(_permit) = context.workers.acquire().await else {
            break;
        };
        match context.run(&provider).await {
            Ok(reading) => tracing::debug!(
                provider_id = %provider.id,
                job_id = %job_id,
                field_object_id = %provider.field_object_id,
                value = %reading,
                "data provider sample stored"
            ),
            Err(err) => report_failure(&provider, &job_id, &err),
        }
    }
}

fn report_skipped(provider: &DataProvider, err: &CmmsError) {
    match err {
        CmmsError::InvalidConfig(_) | CmmsError::Acquisition(_) | CmmsError::Validation(_) => {
            tracing::warn!(provider_id = %provider.id, error = %err, kind = error_kind(err), "data provider not scheduled");
        }
        _ => tracing::error!(provider_id = %provider.id, error = %err, "data provider not scheduled"),
    }
}

fn report_failure(provider: &DataProvider, job_id: &JobId, err: &CmmsError) {
    match err {
        CmmsError::Acquisition(_) | CmmsError::InvalidConfig(_) => tracing::warn!(
            provider_id = %provider.id,
            job_id = %job_id,
            kind = error_kind(err),
            error = %err,
            "data provider sample failed"
        ),
        _ => tracing::error!(
            provider_id = %provider.id,
            job_id = %job_id,
            error = %err,
            "data provider sample failed"
        ),
    }
}

fn error_kind(err: &CmmsError) -> &'static str {
    match err {
        CmmsError::Acquisition(err) => err.kind(),
        CmmsError::InvalidConfig(_) => "config-invalid",
        CmmsError::Validation(_) => "validation",
        CmmsError::NotFound(_) => "not-found",
        CmmsError::Storage(_) => "storage",
        CmmsError::Invariant(_) => "invariant-violation",
    }
}
