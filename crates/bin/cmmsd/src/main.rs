//! # cmmsd — CMMS task triggering daemon
//!
//! Composition root that wires all adapters together and runs the engine.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the diagnostics subscriber (stderr or a log file)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Register acquisition routines and start the data-provider jobs
//! - Start the task trigger scheduler
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use cmms_adapter_modbus::{ModbusTcpRoutine, ROUTINE_NAME};
use cmms_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteDataProviderRepository, SqliteFieldObjectRepository,
    SqliteFieldRepository, SqliteTaskRepository,
};
use cmms_app::acquisition_registry::AcquisitionRegistry;
use cmms_app::data_provider_runtime::DataProviderRuntime;
use cmms_app::ports::SystemClock;
use cmms_app::scheduler::TaskTriggerScheduler;

use crate::config::{Config, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let _guard = init_logging(&config.logging)?;

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("failed to open database")?;
    let pool = db.pool().clone();

    // Repositories
    let task_repo = SqliteTaskRepository::new(pool.clone());
    let field_repo = SqliteFieldRepository::new(pool.clone());
    let field_object_repo = SqliteFieldObjectRepository::new(pool.clone());
    let provider_repo = SqliteDataProviderRepository::new(pool);

    // Acquisition routines
    let registry = AcquisitionRegistry::new().with(
        ROUTINE_NAME,
        Arc::new(ModbusTcpRoutine::new(config.modbus.clone())),
    );
    tracing::info!(routines = ?registry.names(), "acquisition routines registered");

    // Data-provider runtime
    let runtime = DataProviderRuntime::new(
        provider_repo,
        field_object_repo.clone(),
        Arc::new(registry),
        config.data_providers.workers,
    );
    runtime
        .start()
        .await
        .context("failed to start data providers")?;

    // Task trigger scheduler
    let scheduler = Arc::new(TaskTriggerScheduler::new(
        task_repo,
        field_repo,
        field_object_repo,
        SystemClock,
    ));
    let handle = scheduler.start(config.tick_interval(), CancellationToken::new());

    tracing::info!("cmmsd running");
    wait_for_shutdown_signal().await?;

    handle.shutdown().await;
    runtime.shutdown();
    tracing::info!("cmmsd stopped");
    Ok(())
}

/// Install the global subscriber. The returned guard flushes the log file
/// when dropped and must live until the end of `main`.
fn init_logging(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid log filter `{}`", config.filter))?;
    let registry = tracing_subscriber::registry().with(filter);

    let Some(path) = &config.file else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("failed to install log subscriber")?;
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("log file `{}` has no file name", path.display()))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    registry
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("failed to install log subscriber")?;
    Ok(Some(guard))
}

async fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    let terminate = {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?;
        async move {
            signal.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            tracing::info!("received Ctrl-C");
        }
        () = terminate => tracing::info!("received SIGTERM"),
    }
    Ok(())
}
