//! Application context shared by all handlers.
//!
//! [`AppContext`] wraps the avatar services and the runtime-editable
//! [`SettingsStore`]. It is cheap to clone.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use la_avatar::{
    AssetLibrary, AvatarServices, AvatarStore, FallbackStrategy, Resolver, UploadPolicy,
    UploadStorage,
};
use la_core::config::{AvatarSettings, Config};
use la_db::pool::DbPool;

// ---------------------------------------------------------------------------
// SettingsStore
// ---------------------------------------------------------------------------

/// Avatar settings editable at runtime, with the fallback strategy derived
/// from them whenever they change.
#[derive(Debug)]
pub struct SettingsStore {
    current: RwLock<(AvatarSettings, FallbackStrategy)>,
    /// Full config as loaded; only the `avatars` section is replaced on
    /// persist.
    base: Config,
    config_path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn new(config: &Config, config_path: Option<PathBuf>) -> Self {
        let strategy = FallbackStrategy::from_settings(&config.avatars);
        tracing::info!(?strategy, "Avatar fallback strategy selected");
        Self {
            current: RwLock::new((config.avatars.clone(), strategy)),
            base: config.clone(),
            config_path,
        }
    }

    pub fn get(&self) -> AvatarSettings {
        self.current.read().0.clone()
    }

    pub fn strategy(&self) -> FallbackStrategy {
        self.current.read().1
    }

    /// Settings and strategy read under one lock.
    pub fn snapshot(&self) -> (AvatarSettings, FallbackStrategy) {
        self.current.read().clone()
    }

    pub fn set(&self, settings: AvatarSettings) -> FallbackStrategy {
        let strategy = FallbackStrategy::from_settings(&settings);
        *self.current.write() = (settings, strategy);
        strategy
    }

    /// Write the config file back with the current avatar settings.
    ///
    /// Best-effort: failures are logged, not returned.
    pub fn persist(&self) {
        let Some(ref path) = self.config_path else {
            return;
        };

        let mut config = self.base.clone();
        config.avatars = self.get();

        match serde_json::to_string_pretty(&config) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::warn!("Failed to persist config to {}: {e}", path.display());
                }
            }
            Err(e) => tracing::warn!("Failed to serialize config: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// AppContext
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppContext {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub settings: Arc<SettingsStore>,
    pub store: AvatarStore,
    pub resolver: Resolver,
    pub upload_policy: UploadPolicy,
}

impl AppContext {
    /// Build a context with the default SQLite-backed collaborators.
    pub fn new(config: Config, config_path: Option<PathBuf>, db: DbPool) -> Self {
        let storage = UploadStorage::new(
            &config.uploads.dir,
            &config.uploads.base_url,
            &config.server.public_url,
        );
        let services = AvatarServices::with_defaults(db, storage);
        Self::with_services(config, config_path, services)
    }

    /// Build a context around an explicit set of collaborators.
    pub fn with_services(
        config: Config,
        config_path: Option<PathBuf>,
        services: AvatarServices,
    ) -> Self {
        let db = services.pool.clone();
        let store = AvatarStore::new(services);
        Self {
            settings: Arc::new(SettingsStore::new(&config, config_path)),
            resolver: Resolver::new(store.clone()),
            upload_policy: UploadPolicy::new(config.uploads.max_upload_bytes),
            config: Arc::new(config),
            store,
            db,
        }
    }

    pub fn storage(&self) -> &UploadStorage {
        &self.store.services().storage
    }

    /// The media library the avatar services resolve assets through.
    pub fn library(&self) -> &dyn AssetLibrary {
        self.store.services().library.as_ref()
    }
}
