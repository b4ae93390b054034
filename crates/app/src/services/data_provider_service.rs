//! Data provider service — CRUD that keeps the polling jobs in sync.
//!
//! New or reconfigured providers are checked end to end with
//! [`test_configuration`](DataProviderRuntime::test_configuration) before
//! being persisted. After every write the runtime is updated: the prior job
//! is removed and, if the provider is activated, a new one registered.

use std::sync::Arc;

use cmms_domain::data_provider::DataProvider;
use cmms_domain::error::{CmmsError, InvariantViolation, NotFoundError};
use cmms_domain::id::DataProviderId;

use crate::data_provider_runtime::DataProviderRuntime;
use crate::ports::{DataProviderRepository, FieldObjectRepository, Reading};

/// Application service for data provider CRUD.
pub struct DataProviderService<DR, FOR> {
    providers: DR,
    field_objects: FOR,
    runtime: Arc<DataProviderRuntime<DR, FOR>>,
}

impl<DR, FOR> DataProviderService<DR, FOR>
where
    DR: DataProviderRepository,
    FOR: FieldObjectRepository + Send + Sync + 'static,
{
    /// Create a new service driving `runtime`.
    pub fn new(providers: DR, field_objects: FOR, runtime: Arc<DataProviderRuntime<DR, FOR>>) -> Self {
        Self {
            providers,
            field_objects,
            runtime,
        }
    }

    /// Look up a data provider by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::NotFound`] when no provider with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_provider(&self, id: DataProviderId) -> Result<DataProvider, CmmsError> {
        self.providers.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "DataProvider",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all data providers.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_providers(&self) -> Result<Vec<DataProvider>, CmmsError> {
        self.providers.get_all().await
    }

    /// Validate, probe and persist a new provider, then schedule it.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::Validation`] or [`CmmsError::InvalidConfig`] for
    /// an unusable configuration, [`CmmsError::Invariant`] when the target
    /// field object does not exist, [`CmmsError::Acquisition`] when the probe
    /// read fails, or a storage error.
    #[tracing::instrument(skip(self, provider), fields(provider_id = %provider.id))]
    pub async fn create_provider(&self, mut provider: DataProvider) -> Result<DataProvider, CmmsError> {
        let reading = self.check(&provider).await?;
        tracing::debug!(value = %reading, "data provider configuration probed");

        provider.job_id = None;
        let mut created = self.providers.create(provider).await?;
        if created.is_activated {
            self.runtime.add_job(&mut created).await?;
        }
        Ok(created)
    }

    /// Persist changes to a provider and reschedule it.
    ///
    /// The probe read runs again only when the routine or its endpoint
    /// changed.
    ///
    /// # Errors
    ///
    /// Same as [`create_provider`](Self::create_provider), plus
    /// [`CmmsError::NotFound`] when the provider does not exist.
    #[tracing::instrument(skip(self, provider), fields(provider_id = %provider.id))]
    pub async fn update_provider(&self, mut provider: DataProvider) -> Result<DataProvider, CmmsError> {
        let mut existing = self.get_provider(provider.id).await?;
        let reconnect = existing.file_name != provider.file_name
            || existing.endpoint != provider.endpoint
            || existing.port != provider.port;
        if reconnect {
            self.check(&provider).await?;
        } else {
            provider.validate()?;
            provider.recurrence_period()?;
            self.ensure_target(&provider).await?;
        }

        self.runtime.remove_job(&mut existing);
        provider.job_id = None;
        let mut updated = self.providers.update(provider).await?;
        if updated.is_activated {
            self.runtime.add_job(&mut updated).await?;
        }
        Ok(updated)
    }

    /// Cancel the job of a provider and delete it.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::NotFound`] when the provider does not exist, or
    /// a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete_provider(&self, id: DataProviderId) -> Result<(), CmmsError> {
        let mut existing = self.get_provider(id).await?;
        self.runtime.remove_job(&mut existing);
        self.providers.delete(id).await
    }

    async fn check(&self, provider: &DataProvider) -> Result<Reading, CmmsError> {
        provider.validate()?;
        provider.recurrence_period()?;
        self.ensure_target(provider).await?;
        let reading = self
            .runtime
            .test_configuration(&provider.file_name, &provider.endpoint, provider.port)
            .await?;
        Ok(reading)
    }

    async fn ensure_target(&self, provider: &DataProvider) -> Result<(), CmmsError> {
        if self
            .field_objects
            .get_by_id(provider.field_object_id)
            .await?
            .is_none()
        {
            return Err(InvariantViolation::MissingTarget(provider.field_object_id.to_string()).into());
        }
        Ok(())
    }
}
