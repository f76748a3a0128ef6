use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use psb_portal::config::AppConfig;
use psb_portal::error::AppError;
use psb_portal::reference::seed::{development_catalog, seed_locations};
use psb_portal::schema::Role;
use psb_portal::storage::{MemoryStorage, PgStorage, Storage};
use tracing::{info, warn};

/// State behind the operational endpoints, separate from the API state.
#[derive(Clone)]
pub(crate) struct OpsState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Postgres when `DATABASE_URL` is set, otherwise seeded in-memory storage.
pub(crate) async fn connect_storage(
    config: &AppConfig,
    force_memory: bool,
) -> Result<Arc<dyn Storage>, AppError> {
    match config.database.url.as_deref() {
        Some(url) if !force_memory => {
            let storage = PgStorage::connect(url, config.database.max_connections).await?;
            storage.ensure_schema().await?;
            info!(
                max_connections = config.database.max_connections,
                "connected to postgres"
            );
            Ok(Arc::new(storage))
        }
        _ => {
            if config.environment.is_production() {
                warn!("running production without DATABASE_URL; data will not persist");
            }
            Ok(Arc::new(seeded_memory_storage().await?))
        }
    }
}

pub(crate) async fn seeded_memory_storage() -> Result<MemoryStorage, AppError> {
    let storage = MemoryStorage::with_catalog(development_catalog());
    seed_locations(&storage).await?;
    info!("using in-memory storage with development reference data");
    Ok(storage)
}

pub(crate) fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse::<Role>().map_err(|err| err.to_string())
}
