//! Shared entry point for user records.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::store::{KeyValueStore, MemoryStore};
use crate::{AppConfig, Backend, KeySpace, User, UserError};

/// Hands out [`User`] accessors bound to one shared store connection.
///
/// Build one directory at startup and clone it wherever records are needed;
/// clones share the connection.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    store: Arc<dyn KeyValueStore>,
    keys: KeySpace,
}

impl UserDirectory {
    /// Creates a directory over `store` using the `keys` naming scheme.
    #[instrument(skip(store))]
    pub fn new(store: Arc<dyn KeyValueStore>, keys: KeySpace) -> Self {
        info!("Creating UserDirectory");
        Self { store, keys }
    }

    /// Connects to the backend selected in `config`.
    ///
    /// # Errors
    ///
    /// Returns a `StoreUnavailable` [`UserError`] if the store cannot be
    /// reached, or if Redis is selected but support was not compiled in.
    #[instrument(skip(config), fields(backend = %config.backend()))]
    pub async fn connect(config: &AppConfig) -> Result<Self, UserError> {
        let store: Arc<dyn KeyValueStore> = match config.backend() {
            Backend::Memory => Arc::new(MemoryStore::new()),
            #[cfg(feature = "redis")]
            Backend::Redis => Arc::new(crate::store::RedisStore::connect(config.redis_url()).await?),
            #[cfg(not(feature = "redis"))]
            Backend::Redis => {
                return Err(UserError::store_unavailable(
                    "Redis backend requested but the `redis` feature is disabled",
                ));
            }
        };
        Ok(Self::new(store, config.keys().clone()))
    }

    /// Returns the key naming scheme.
    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Returns the shared store.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Returns an accessor for user `id`. Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` [`UserError`] if `id` is empty.
    #[track_caller]
    pub fn user(&self, id: impl Into<String>) -> Result<User, UserError> {
        User::new(id, Arc::clone(&self.store), self.keys.clone())
    }

    /// Checks that the backing store is reachable.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), UserError> {
        debug!("Pinging backing store");
        self.store.ping().await?;
        Ok(())
    }
}
