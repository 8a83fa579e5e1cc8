use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::{CatalogController, ProductsApi};
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::gateway::AuthGateway;
use crate::guards::RouteGuard;
use crate::navigation::Navigator;
use crate::session::SessionStore;
use crate::storage::{AuthStorage, JsonFileStorage, MemoryStorage, Storage};

/// The two persistence scopes of the session.
#[derive(Clone)]
pub struct Storages {
    /// Survives restarts; holds "remember me" sessions.
    pub durable: Arc<dyn Storage>,
    /// Lives as long as the process.
    pub session: Arc<dyn Storage>,
}

impl Storages {
    /// Both scopes in memory; nothing survives the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            durable: Arc::new(MemoryStorage::new()),
            session: Arc::new(MemoryStorage::new()),
        }
    }

    /// Durable scope in a JSON document at `path`, session scope in memory.
    #[must_use]
    pub fn file_backed(path: impl Into<PathBuf>) -> Self {
        Self {
            durable: Arc::new(JsonFileStorage::new(path)),
            session: Arc::new(MemoryStorage::new()),
        }
    }
}

impl std::fmt::Debug for Storages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storages").finish_non_exhaustive()
    }
}

/// Every dashboard component, wired to one session.
#[derive(Debug, Clone)]
pub struct Portal {
    config: Arc<ClientConfig>,
    store: SessionStore,
    auth: Arc<AuthGateway>,
    guard: RouteGuard,
    products: ProductsApi,
}

impl Portal {
    /// Build the components and restore any persisted session.
    ///
    /// Call from within a Tokio runtime so a restored session can schedule its
    /// refresh.
    #[must_use]
    pub fn connect(
        config: ClientConfig,
        storages: Storages,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let config = Arc::new(config);
        let storage = AuthStorage::new(
            storages.durable,
            storages.session,
            config.storage_keys().clone(),
        );
        let store = SessionStore::new(storage, config.refresh_lead());
        let api = ApiClient::new(config.clone(), store.clone(), navigator.clone());
        let auth = AuthGateway::new(api.clone(), navigator);
        let guard = RouteGuard::new(store.clone(), &config);
        let products = ProductsApi::new(api);

        let restored = store.hydrate();
        tracing::info!(api_url = %config.api_url(), restored, "Portal connected");

        Self {
            config,
            store,
            auth,
            guard,
            products,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn auth(&self) -> &AuthGateway {
        &self.auth
    }

    #[must_use]
    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    #[must_use]
    pub fn products(&self) -> &ProductsApi {
        &self.products
    }

    /// A fresh catalog controller using the configured page size and debounce window.
    #[must_use]
    pub fn catalog(&self) -> CatalogController {
        CatalogController::new(&self.config)
    }
}
