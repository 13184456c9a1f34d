//! Model lifecycle control plane
//!
//! Wires configuration, the metadata store, the artifact store, the
//! inference runtime client and owner resolution into a ready-to-use
//! [`ControlPlane`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use config::ConfigManager;
use inference_engine::HttpRuntimeClient;
use model_manager::{InMemoryStore, MetadataStore, ModelRegistry, SqliteStore};
use orchestrator_core::{Orchestrator, OrchestratorOptions};
use security::{Credentials, InMemoryTokenCache, LocalMembership, OwnerResolver, User};
use storage_adapter::ArtifactStore;

/// Fully wired control plane
pub struct ControlPlane {
    /// Configuration manager
    config: ConfigManager,

    /// Model service
    orchestrator: Arc<Orchestrator>,

    /// Users known to this process
    membership: Arc<LocalMembership>,

    /// API tokens known to this process
    tokens: Arc<InMemoryTokenCache>,

    /// Request owner resolution
    resolver: OwnerResolver,
}

impl ControlPlane {
    /// Builds every component from configuration
    pub fn new(config: ConfigManager) -> Result<Self> {
        let settings = config.get();

        let store: Arc<dyn MetadataStore> = match settings.database.sqlite_path() {
            Some(path) => {
                info!("Using SQLite metadata store at {:?}", path);
                Arc::new(SqliteStore::open(&path).context("Failed to open metadata store")?)
            }
            None => {
                info!("Using in-memory metadata store");
                Arc::new(InMemoryStore::new())
            }
        };

        let artifacts = ArtifactStore::new(settings.artifact_store.root.clone())
            .context("Failed to open artifact store")?;

        let runtime = HttpRuntimeClient::new(
            &settings.runtime.url,
            settings.runtime.control_timeout(),
            settings.runtime.infer_timeout(),
        )?;

        let orchestrator = Arc::new(Orchestrator::new(
            ModelRegistry::new(store),
            artifacts,
            Arc::new(runtime),
            OrchestratorOptions {
                control_timeout: settings.runtime.control_timeout(),
                infer_timeout: settings.runtime.infer_timeout(),
            },
        ));

        let (membership, owner) = LocalMembership::single(&settings.identity.default_owner);
        let membership = Arc::new(membership);
        let tokens = Arc::new(InMemoryTokenCache::new());
        let resolver = OwnerResolver::new(
            tokens.clone(),
            membership.clone(),
            settings.identity.lookup_timeout(),
        );

        info!(owner = %owner.id, runtime = %settings.runtime.url, "Control plane ready");

        Ok(Self {
            config,
            orchestrator,
            membership,
            tokens,
            resolver,
        })
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    /// The model service
    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        self.orchestrator.clone()
    }

    /// Registers a user with the local membership
    pub fn add_user(&self, id: &str) -> User {
        let user = User::new(id);
        self.membership.add(user.clone());
        user
    }

    /// Registers an API token for a user
    pub fn add_token(&self, token: &str, user: &User) {
        self.tokens.insert_token(token, user.permalink());
    }

    /// Resolves the namespace a request acts in
    pub async fn namespace(&self, credentials: &Credentials) -> Result<String> {
        let user = self.resolver.resolve(credentials).await?;
        Ok(user.name())
    }
}
