use std::future::Future;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use visamap_api::ApiServer;
use visamap_config::AppConfig;
use visamap_core::{PolicyGateway, SharedPolicyStore};
use visamap_data::PgPolicyStore;
use visamap_publish::{ArtifactReader, ArtifactWriter, Publisher};
use visamap_telemetry::{GlobalContextGuard, LoggingConfig, Metrics};

use crate::error::{AppError, AppResult};

/// Dependencies required to run the server.
pub(crate) struct BootstrapDependencies {
    config: AppConfig,
    store: SharedPolicyStore,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Connect to `PostgreSQL`, apply migrations, and build the metrics registry.
    pub(crate) async fn connect(config: AppConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .map_err(|err| AppError::database("pool.connect", err))?;
        let store = PgPolicyStore::new(pool)
            .await
            .map_err(|err| AppError::data("policy_store.new", err))?;
        info!("policy store ready");

        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            config,
            store: Arc::new(store),
            telemetry,
        })
    }
}

/// Entry point for the visamap boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, logging, the database, or the listener fail.
pub async fn run_app() -> AppResult<()> {
    let config = AppConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
    let logging = LoggingConfig {
        level: &config.log_level,
        format: config.log_format,
        build_sha: visamap_telemetry::build_sha(),
    };
    visamap_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("bootstrap");

    info!(
        build_sha = visamap_telemetry::build_sha(),
        "visamap bootstrap starting"
    );
    let dependencies = BootstrapDependencies::connect(config).await?;
    run_app_with(dependencies, shutdown_signal()).await
}

/// Boot sequence over injected dependencies; returns once `shutdown` resolves.
pub(crate) async fn run_app_with<F>(dependencies: BootstrapDependencies, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let BootstrapDependencies {
        config,
        store,
        telemetry,
    } = dependencies;

    let gateway = PolicyGateway::new(Arc::clone(&store), config.admin_secret.clone());
    let publisher = Publisher::new(
        store,
        config.admin_secret,
        ArtifactWriter::new(&config.artifact_dir),
    );
    let reader = ArtifactReader::new(&config.artifact_dir);
    let api = ApiServer::new(gateway, publisher, reader, telemetry);

    info!(
        addr = %config.bind_addr,
        artifact_dir = %config.artifact_dir.display(),
        "launching api listener"
    );
    api.serve_with_shutdown(config.bind_addr, shutdown)
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("visamap shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c; shutting down");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::TcpListener;

    use anyhow::Result;
    use visamap_core::MemoryPolicyStore;
    use visamap_test_support::{ADMIN_PASSWORD, sample_entries, scratch_dir};

    use super::*;

    fn config_for(bind_addr: &str, artifact_dir: &std::path::Path) -> Result<AppConfig> {
        let vars: HashMap<&str, String> = HashMap::from([
            ("DATABASE_URL", "postgres://localhost/visamap".to_string()),
            ("ADMIN_PASSWORD", ADMIN_PASSWORD.to_string()),
            ("VISAMAP_BIND_ADDR", bind_addr.to_string()),
            (
                "VISAMAP_ARTIFACT_DIR",
                artifact_dir.to_string_lossy().into_owned(),
            ),
        ]);
        Ok(AppConfig::from_lookup(|name| vars.get(name).cloned())?)
    }

    fn dependencies(config: AppConfig) -> Result<BootstrapDependencies> {
        Ok(BootstrapDependencies {
            config,
            store: Arc::new(MemoryPolicyStore::with_entries(sample_entries())),
            telemetry: Metrics::new()?,
        })
    }

    #[tokio::test]
    async fn run_app_with_stops_on_shutdown_signal() -> Result<()> {
        let scratch = scratch_dir()?;
        let config = config_for("127.0.0.1:0", scratch.path())?;
        run_app_with(dependencies(config)?, async {}).await?;
        Ok(())
    }

    #[tokio::test]
    async fn occupied_port_reports_bind_failure() -> Result<()> {
        let scratch = scratch_dir()?;
        let occupied = TcpListener::bind("127.0.0.1:0")?;
        let addr = occupied.local_addr()?.to_string();
        let config = config_for(&addr, scratch.path())?;

        let result = run_app_with(dependencies(config)?, async {}).await;
        assert!(matches!(
            result,
            Err(AppError::ApiServer {
                operation: "api_server.serve",
                source: visamap_api::ApiServerError::Bind { .. },
            })
        ));
        Ok(())
    }
}
