//! Application state shared across handlers.

use std::sync::Arc;

use crate::cache::CatalogCache;
use crate::config::{AuthConfig, CatalogConfig};
use crate::db::Store;
use crate::services::auth::{AuthService, TokenKeys};
use crate::services::catalog::CatalogService;
use crate::services::commerce::CommerceService;
use crate::services::email::EmailService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, the catalog cache, token keys and the optional mailer.
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    store: S,
    cache: CatalogCache,
    tokens: TokenKeys,
    admin_username: String,
    books_per_page: u32,
    mailer: Option<Arc<EmailService>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Store> AppState<S> {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Persistence backend
    /// * `cache` - Catalog cache
    /// * `auth` - Token and admin settings
    /// * `catalog` - Pagination settings
    /// * `mailer` - Email service, `None` when SMTP is not configured
    #[must_use]
    pub fn new(
        store: S,
        cache: CatalogCache,
        auth: &AuthConfig,
        catalog: &CatalogConfig,
        mailer: Option<EmailService>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                cache,
                tokens: TokenKeys::new(&auth.jwt_secret, auth.token_ttl),
                admin_username: auth.admin_username.clone(),
                books_per_page: catalog.books_per_page,
                mailer: mailer.map(Arc::new),
            }),
        }
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Get a reference to the catalog cache.
    #[must_use]
    pub fn cache(&self) -> &CatalogCache {
        &self.inner.cache
    }

    /// Get a reference to the token keys.
    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        &self.inner.tokens
    }

    /// The username allowed to import books.
    #[must_use]
    pub fn admin_username(&self) -> &str {
        &self.inner.admin_username
    }

    /// Get the mailer, if email is configured.
    #[must_use]
    pub fn mailer(&self) -> Option<Arc<EmailService>> {
        self.inner.mailer.clone()
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_, S> {
        AuthService::new(&self.inner.store)
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_, S> {
        CatalogService::new(&self.inner.store, &self.inner.cache, self.inner.books_per_page)
    }

    #[must_use]
    pub fn commerce(&self) -> CommerceService<'_, S> {
        CommerceService::new(&self.inner.store)
    }
}
