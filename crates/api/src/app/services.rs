use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use tenderflow_infra::{
    AppConfig, DirectorySeed, InMemoryTenderStore, PostgresTenderStore, StoreBackend,
    TenderService, TenderStore,
};

/// Tender service over whichever store the process was configured with.
pub type SharedTenderService = TenderService<Arc<dyn TenderStore>>;

#[derive(Clone)]
pub enum AppServices {
    InMemory {
        tenders: SharedTenderService,
        store: Arc<InMemoryTenderStore>,
    },
    Persistent {
        tenders: SharedTenderService,
        pool: PgPool,
    },
}

impl AppServices {
    /// Wrap an existing in-memory store (tests seed it before serving).
    pub fn in_memory(store: Arc<InMemoryTenderStore>) -> Self {
        let erased: Arc<dyn TenderStore> = store.clone();
        AppServices::InMemory {
            tenders: TenderService::new(erased),
            store,
        }
    }

    pub fn persistent(store: PostgresTenderStore) -> Self {
        let pool = store.pool().clone();
        let erased: Arc<dyn TenderStore> = Arc::new(store);
        AppServices::Persistent {
            tenders: TenderService::new(erased),
            pool,
        }
    }

    pub fn tenders(&self) -> &SharedTenderService {
        match self {
            AppServices::InMemory { tenders, .. } | AppServices::Persistent { tenders, .. } => {
                tenders
            }
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            AppServices::InMemory { .. } => "in_memory",
            AppServices::Persistent { .. } => "postgres",
        }
    }

    /// Cheap liveness probe of the backing store.
    pub async fn ping_store(&self) -> anyhow::Result<()> {
        match self {
            AppServices::InMemory { .. } => Ok(()),
            AppServices::Persistent { pool, .. } => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .context("postgres ping failed")?;
                Ok(())
            }
        }
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match &config.store {
        StoreBackend::InMemory => {
            tracing::warn!("USE_PERSISTENT_STORES is not set; tenders live in memory only");
            let store = InMemoryTenderStore::new();
            match &config.demo_directory {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    let seed = DirectorySeed::from_json(&raw)?;
                    store
                        .seed_directory(&seed)
                        .with_context(|| format!("failed to seed from {}", path.display()))?;
                    tracing::info!(
                        organizations = seed.organizations.len(),
                        employees = seed.employee_count(),
                        "seeded in-memory directory"
                    );
                }
                None => tracing::warn!(
                    "DEMO_DIRECTORY is not set; the directory is empty and every request \
                     will be rejected as an unknown user"
                ),
            }
            Ok(AppServices::in_memory(Arc::new(store)))
        }
        StoreBackend::Postgres(pg) => {
            if config.demo_directory.is_some() {
                tracing::warn!("DEMO_DIRECTORY is ignored by the postgres backend");
            }
            let store = PostgresTenderStore::connect(pg)
                .await
                .context("failed to initialize the postgres tender store")?;
            tracing::info!(max_connections = pg.max_connections, "connected to postgres");
            Ok(AppServices::persistent(store))
        }
    }
}
