//! The endpoint registry.
//!
//! A [`Service`] owns a set of endpoints keyed by path. Raw [`Handler`]s are
//! stored as given; endpoint functions are validated against the endpoint
//! contract and adapted into handlers once, at registration. Registry-wide
//! adapters are kept separately and applied fresh each time [`Service::endpoints`]
//! assembles the table, so asking for the table twice never double-wraps.

use http::Method;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use endpoint_kit_core::ContractError;

use crate::adapter::{adapt_handler, SharedAdapter};
use crate::config::{ConfigError, DispatchConfig};
use crate::dispatch::DispatchOptions;
use crate::endpoint::IntoEndpoint;
use crate::handler::Handler;

/// An endpoint as handed to the router.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Methods the endpoint answers to
    pub methods: Vec<Method>,
    /// Fully adapted handler
    pub handler: Handler,
}

/// Endpoint table keyed by path.
pub type Endpoints = BTreeMap<String, Endpoint>;

#[derive(Clone)]
struct Stored {
    methods: Vec<Method>,
    base: Handler,
}

#[derive(Default)]
struct Registry {
    endpoints: HashMap<String, Stored>,
    adapters: Vec<SharedAdapter>,
}

/// A set of endpoints plus the adapters wrapped around all of them.
///
/// All methods take `&self`; the registry is safe to share between threads.
///
/// # Example
///
/// ```ignore
/// use endpoint_kit_web::{middleware, Service};
/// use http::Method;
///
/// let service = Service::new();
/// service.register_endpoint(Method::POST, "/greet", greet, &[])?;
/// service.adapt(&[middleware::correlation_id()]);
///
/// let app = service.router();
/// ```
pub struct Service {
    config: DispatchConfig,
    registry: Mutex<Registry>,
}

impl Service {
    /// An empty service with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(DispatchConfig::default())
    }

    /// An empty service with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` does not validate.
    pub fn with_config(config: DispatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: DispatchConfig) -> Self {
        Self {
            config,
            registry: Mutex::new(Registry::default()),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The service's configuration.
    #[must_use]
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Path prefix the endpoints are mounted under.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    /// Register a raw handler at `path`, wrapped in `adapters`.
    ///
    /// A later registration at the same path replaces this one.
    pub fn register_handler(
        &self,
        method: Method,
        path: impl Into<String>,
        handler: Handler,
        adapters: &[SharedAdapter],
    ) {
        self.insert(method, path.into(), adapt_handler(&handler, adapters));
    }

    /// Register an endpoint function at `path`, wrapped in `adapters`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] if the endpoint violates the contract; the
    /// registry is left unchanged.
    pub fn register_endpoint<M, E>(
        &self,
        method: Method,
        path: impl Into<String>,
        endpoint: E,
        adapters: &[SharedAdapter],
    ) -> Result<(), ContractError>
    where
        E: IntoEndpoint<M>,
    {
        let path = path.into();
        let options = DispatchOptions::new(path.as_str(), self.config.body_limit);

        let handler = endpoint.into_handler(options).inspect_err(|err| {
            tracing::warn!(%method, %path, error = %err, "Rejected endpoint registration");
        })?;

        self.insert(method, path, adapt_handler(&handler, adapters));
        Ok(())
    }

    /// Register an endpoint function, panicking on a contract violation.
    ///
    /// Meant for wiring done once at startup, where a bad endpoint is a
    /// programming error.
    ///
    /// # Panics
    ///
    /// Panics if the endpoint violates the contract.
    #[allow(clippy::panic)]
    pub fn must_register_endpoint<M, E>(
        &self,
        method: Method,
        path: impl Into<String>,
        endpoint: E,
        adapters: &[SharedAdapter],
    ) where
        E: IntoEndpoint<M>,
    {
        let path = path.into();
        if let Err(err) = self.register_endpoint(method, path.clone(), endpoint, adapters) {
            panic!("could not register endpoint {path}: {err}");
        }
    }

    /// Replace the registry-wide adapters.
    ///
    /// They wrap every endpoint, outside each endpoint's own adapters, the
    /// next time [`Service::endpoints`] is called.
    pub fn adapt(&self, adapters: &[SharedAdapter]) {
        self.registry().adapters = adapters.to_vec();
    }

    /// Snapshot of the endpoint table with the registry-wide adapters applied.
    ///
    /// Each call builds the handlers anew from the stored base handlers.
    #[must_use]
    pub fn endpoints(&self) -> Endpoints {
        let (stored, adapters) = {
            let registry = self.registry();
            (registry.endpoints.clone(), registry.adapters.clone())
        };

        stored
            .into_iter()
            .map(|(path, Stored { methods, base })| {
                let handler = adapt_handler(&base, &adapters);
                (path, Endpoint { methods, handler })
            })
            .collect()
    }

    /// Number of registered endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry().endpoints.len()
    }

    /// Whether no endpoint is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry().endpoints.is_empty()
    }

    fn insert(&self, method: Method, path: String, base: Handler) {
        tracing::debug!(%method, %path, "Registered endpoint");

        let stored = Stored {
            methods: vec![method],
            base,
        };
        if self.registry().endpoints.insert(path.clone(), stored).is_some() {
            tracing::info!(%path, "Replaced existing endpoint");
        }
    }
}

impl Default for Service {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry();
        let mut paths: Vec<&str> = registry.endpoints.keys().map(String::as_str).collect();
        paths.sort_unstable();

        f.debug_struct("Service")
            .field("config", &self.config)
            .field("endpoints", &paths)
            .field("adapters", &registry.adapters.len())
            .finish()
    }
}
