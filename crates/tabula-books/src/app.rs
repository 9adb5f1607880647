//! Wiring: stores, registry, dispatcher and server from one config.

use crate::errors;
use crate::methods::{
    DeleteBooksWithId, GetBooks, GetBooksWithId, GetSessionInfo, PostBooks, PostRefresh,
    PostSessions, PutBooksWithId, REFRESH_METHOD,
};
use crate::store::{BookStore, StoreError};
use crate::tokens::TokenStore;
use crate::users::UserDirectory;
use std::sync::Arc;
use tabula_config::TabulaConfig;
use tabula_contract::MethodRegistry;
use tabula_server::{Dispatcher, DispatcherConfig, Server};
use tracing::warn;

/// The books service and its state.
#[derive(Debug)]
pub struct BooksApp {
    config: TabulaConfig,
    store: Arc<BookStore>,
    users: Arc<UserDirectory>,
    tokens: Arc<TokenStore>,
}

impl BooksApp {
    /// Assembles the service around existing stores.
    #[must_use]
    pub fn new(config: TabulaConfig, store: BookStore, users: UserDirectory) -> Self {
        let users = Arc::new(users);
        let tokens = Arc::new(TokenStore::from_config(&config.auth, Arc::clone(&users)));
        Self {
            config,
            store: Arc::new(store),
            users,
            tokens,
        }
    }

    /// Assembles the service with the bundled books and users.
    pub fn seeded(config: TabulaConfig) -> Result<Self, StoreError> {
        Ok(Self::new(config, BookStore::seeded()?, UserDirectory::seeded()))
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &TabulaConfig {
        &self.config
    }

    /// Returns the book store.
    #[must_use]
    pub fn store(&self) -> &Arc<BookStore> {
        &self.store
    }

    /// Returns the user directory.
    #[must_use]
    pub fn users(&self) -> &Arc<UserDirectory> {
        &self.users
    }

    /// Returns the token store.
    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Every method of the API.
    #[must_use]
    pub fn registry(&self) -> MethodRegistry {
        MethodRegistry::new()
            .with_immutable(GetBooks::new(
                Arc::clone(&self.store),
                self.config.api.limit_max,
            ))
            .with_immutable(GetBooksWithId::new(Arc::clone(&self.store)))
            .with_mutable(PostBooks::new(Arc::clone(&self.store)))
            .with_mutable(PutBooksWithId::new(Arc::clone(&self.store)))
            .with_mutable(DeleteBooksWithId::new(Arc::clone(&self.store)))
            .with_mutable(GetSessionInfo::new(Arc::clone(&self.users)))
            .with_immutable(PostSessions::new(
                Arc::clone(&self.users),
                Arc::clone(&self.tokens),
            ))
            .with_mutable(PostRefresh::new(Arc::clone(&self.tokens)))
    }

    /// A dispatcher over [`Self::registry`], resolving tokens through the
    /// token store.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher {
        if self.config.api.refresh_method != REFRESH_METHOD {
            warn!(
                configured = %self.config.api.refresh_method,
                registered = REFRESH_METHOD,
                "configured refresh method is not registered"
            );
        }

        let config = DispatcherConfig::default()
            .with_base_path(self.config.server.base_path.clone())
            .with_default_locale(self.config.default_locale())
            .with_refresh_method(self.config.api.refresh_method.clone())
            .with_expose_throwables(self.config.api.expose_throwables);

        Dispatcher::new(self.registry())
            .with_descriptions(Arc::new(errors::descriptions()))
            .with_resolver(Arc::clone(&self.tokens) as Arc<dyn tabula_server::SessionResolver>)
            .with_config(config)
    }

    /// The HTTP server, configured from the `server` section.
    #[must_use]
    pub fn server(&self) -> Server {
        Server::builder(self.dispatcher())
            .http_addr(self.config.server.http_addr.clone())
            .request_timeout(self.config.request_timeout())
            .max_body_bytes(self.config.server.max_body_bytes)
            .shutdown_timeout(self.config.shutdown_timeout())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contents() {
        let app = BooksApp::seeded(TabulaConfig::default()).unwrap();
        let registry = app.registry();
        assert_eq!(registry.len(), 8);
        assert!(registry.contains("getBooks"));
        assert!(registry.contains(REFRESH_METHOD));
        assert!(registry.get("postBooks").unwrap().is_mutable());
        assert!(!registry.get("postSessions").unwrap().is_mutable());
    }

    #[test]
    fn test_dispatcher_follows_config() {
        let mut config = TabulaConfig::default();
        config.server.base_path = "/books-api".to_string();
        config.api.default_locale = "en".to_string();
        let app = BooksApp::new(config, BookStore::new(), UserDirectory::new());

        let dispatcher = app.dispatcher();
        assert_eq!(dispatcher.config().base_path, "/books-api");
        assert_eq!(dispatcher.config().default_locale, tabula_core::Locale::En);
        assert_eq!(dispatcher.config().refresh_method, REFRESH_METHOD);
    }

    #[test]
    fn test_server_settings() {
        let mut config = TabulaConfig::default();
        config.server.http_addr = "127.0.0.1:9999".to_string();
        config.server.max_body_bytes = 2048;
        let app = BooksApp::new(config, BookStore::new(), UserDirectory::new());
        let server = app.server();
        assert_eq!(server.settings().http_addr, "127.0.0.1:9999");
        assert_eq!(server.settings().max_body_bytes, 2048);
    }
}
