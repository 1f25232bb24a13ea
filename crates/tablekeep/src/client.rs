//! `Client` builder and the resource reads.
//!
//! This is the entry point for applications. It ties together all the
//! layers: transport → cache → session → router.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tablekeep_cache::QueryCache;
use tablekeep_protocol::{ApiError, UNEXPECTED_ERROR};
use tablekeep_router::{GuardDecision, Location, RedirectResolver, RouteGuard, RouteTable};
use tablekeep_session::{SessionConfig, SessionController};
use tablekeep_transport::{HttpTransport, Transport};
use tracing::debug;

use crate::resources::{ResourceQuery, Reservation, Restaurant, decode_list};
use crate::{ClientConfig, TablekeepError};

/// Builder for a [`Client`] talking to the API over HTTP.
///
/// # Example
///
/// ```rust,no_run
/// use tablekeep::prelude::*;
///
/// # fn main() -> Result<(), TablekeepError> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Creates a builder with the default config.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Replaces the whole config.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the API base URL.
    pub fn base_url(mut self, url: &str) -> Self {
        self.config.base_url = url.to_string();
        self
    }

    /// Sets the current-user resource configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Sets the login, root, and landing routes.
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.config.routes = routes;
        self
    }

    /// Builds the client with an [`HttpTransport`].
    ///
    /// # Errors
    /// [`TablekeepError::Transport`] if the base URL is not an absolute
    /// `http(s)` URL or the HTTP client can't be created.
    pub fn build(self) -> Result<Client<HttpTransport>, TablekeepError> {
        let config = self.config.validated();
        let transport = HttpTransport::new(&config.base_url)?;
        Ok(Client::with_transport(transport, config))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One logged-in (or not) user's view of the API.
///
/// Owns the shared [`QueryCache`] and the [`SessionController`] that is
/// its only writer for the current user. Cheap to share: wrap it in an
/// `Arc`, every method takes `&self`.
pub struct Client<T: Transport = HttpTransport> {
    transport: Arc<T>,
    cache: QueryCache,
    controller: Arc<SessionController<T>>,
    guard: RouteGuard,
    resolver: RedirectResolver,
    config: ClientConfig,
}

impl Client<HttpTransport> {
    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<T: Transport> Client<T> {
    /// Wires a client over any transport. Used by tests with a scripted
    /// server; applications go through [`Client::builder`].
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        let config = config.validated();
        let transport = Arc::new(transport);
        let cache = QueryCache::new(config.cache.clone());
        let controller = Arc::new(SessionController::new(
            Arc::clone(&transport),
            cache.clone(),
            config.session.clone(),
        ));
        debug!(base_url = %config.base_url, "client ready");

        Self {
            transport,
            cache,
            controller,
            guard: RouteGuard::new(config.routes.clone()),
            resolver: RedirectResolver::new(config.routes.clone()),
            config,
        }
    }

    pub fn session(&self) -> &Arc<SessionController<T>> {
        &self.controller
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn resolver(&self) -> &RedirectResolver {
        &self.resolver
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shorthand for [`RouteGuard::authorize`] with this client's session.
    pub async fn authorize(&self, location: &Location) -> GuardDecision {
        self.guard.authorize(&self.controller, location).await
    }

    // -- Resources --------------------------------------------------------

    /// The logged-in customer's reservations.
    pub async fn my_reservations(&self) -> Result<Arc<Vec<Reservation>>, TablekeepError> {
        self.list(ResourceQuery::my_reservations(
            self.config.resource_stale_time,
            self.config.resource_retry.clone(),
        ))
        .await
    }

    /// Reservations at the logged-in owner's restaurants.
    pub async fn owner_reservations(&self) -> Result<Arc<Vec<Reservation>>, TablekeepError> {
        self.list(ResourceQuery::owner_reservations(
            self.config.resource_stale_time,
            self.config.resource_retry.clone(),
        ))
        .await
    }

    /// Restaurants no owner has claimed yet.
    pub async fn unowned_restaurants(&self) -> Result<Arc<Vec<Restaurant>>, TablekeepError> {
        self.list(ResourceQuery::unowned_restaurants()).await
    }

    async fn list<R>(&self, query: ResourceQuery) -> Result<Arc<Vec<R>>, TablekeepError>
    where
        R: DeserializeOwned + Send + Sync + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let path = query.path;
        let list = self
            .cache
            .read_with(&query.key, query.options, move || {
                let transport = Arc::clone(&transport);
                async move {
                    let body = transport.get_json(path).await?;
                    decode_list::<R>(body).map_err(|e| {
                        debug!(path, error = %e, "unexpected list body");
                        ApiError::new(200, UNEXPECTED_ERROR)
                    })
                }
            })
            .await?;
        Ok(list)
    }
}
