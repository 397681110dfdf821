//! Application kernel.
//!
//! # Responsibilities
//! - Boot: register handlers, load the route table, validate, build the Router
//! - Run the request lifecycle (`handle`)
//! - Swap the route table at runtime (cache hot reload)
//!
//! # Data Flow
//! ```text
//! ApplicationBuilder (config, providers, named middleware, fallback)
//!     → build()
//!         1. providers → Dispatcher (handlers)
//!         2. route table: cache file (routing.use_cache) or Collector
//!         3. Router::new (validates handlers + middleware names)
//!     → Application { ArcSwap<Router> }
//!
//! Request → Application::handle → current Router → Response
//! ```

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::http::{Dispatcher, Middleware, MiddlewareRegistry};
use crate::routing::{
    cache, Collection, Collector, Fallback, RouteProvider, Router, RouterOptions, RoutingError,
    UrlGenerator,
};

/// Errors that stop an application from booting.
#[derive(Debug, Error)]
pub enum BootError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

/// Collects everything an [`Application`] is made of.
pub struct ApplicationBuilder {
    config: AppConfig,
    providers: Vec<Box<dyn RouteProvider>>,
    middleware: MiddlewareRegistry,
    fallback: Option<Arc<dyn Fallback>>,
}

impl ApplicationBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            providers: Vec::new(),
            middleware: MiddlewareRegistry::new(),
            fallback: None,
        }
    }

    pub fn provider<P: RouteProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Register middleware under `name`, for routes, groups and `routing.middleware`.
    pub fn middleware<M: Middleware>(mut self, name: impl Into<String>, middleware: M) -> Self {
        self.middleware.register(name, middleware);
        self
    }

    /// Answer unmatched requests instead of the JSON 404 / 405.
    pub fn fallback<F: Fallback>(mut self, fallback: F) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    /// Run every provider's route declarations, ignoring any cache.
    pub fn collect(&self) -> Result<Collection, RoutingError> {
        Collector::collect(self.providers.iter().map(Box::as_ref))
    }

    pub fn build(self) -> Result<Application, BootError> {
        // 1. Handlers
        let mut dispatcher = Dispatcher::new();
        for provider in &self.providers {
            provider.handlers(&mut dispatcher);
        }

        // 2. Route table
        let collection = self.load_routes()?;

        // 3. Router
        let dispatcher = Arc::new(dispatcher);
        let middleware = Arc::new(self.middleware);
        let router = build_router(&self.config, &dispatcher, &middleware, &self.fallback, collection)?;
        let app = Application {
            config: self.config,
            dispatcher,
            middleware,
            fallback: self.fallback,
            router: ArcSwap::from_pointee(router),
        };

        tracing::info!(
            app = %app.config.app.name,
            env = %app.config.app.env,
            routes = app.router().collection().len(),
            handlers = app.dispatcher.len(),
            "Application booted"
        );
        Ok(app)
    }

    /// The route table `build` would use: the cache file when enabled and present, else the providers.
    pub fn load_routes(&self) -> Result<Collection, RoutingError> {
        let routing = &self.config.routing;
        if routing.use_cache {
            let path = Path::new(&routing.cache_path);
            if path.exists() {
                return cache::load(path);
            }
            tracing::warn!(path = %path.display(), "Route cache enabled but missing, collecting routes");
        }
        self.collect()
    }
}

/// A booted application.
pub struct Application {
    config: AppConfig,
    dispatcher: Arc<Dispatcher>,
    middleware: Arc<MiddlewareRegistry>,
    fallback: Option<Arc<dyn Fallback>>,
    router: ArcSwap<Router>,
}

impl Application {
    pub fn builder(config: AppConfig) -> ApplicationBuilder {
        ApplicationBuilder::new(config)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The router currently serving requests.
    pub fn router(&self) -> Arc<Router> {
        self.router.load_full()
    }

    pub fn collection(&self) -> Arc<Collection> {
        self.router().collection().clone()
    }

    pub fn urls(&self) -> UrlGenerator {
        self.router().urls().clone()
    }

    /// Run one request through the current router.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let router = self.router.load_full();
        router.handle(request).await
    }

    /// Replace the route table. The old one keeps serving requests already in flight.
    pub fn swap_collection(&self, collection: Collection) -> Result<(), RoutingError> {
        let router = build_router(
            &self.config,
            &self.dispatcher,
            &self.middleware,
            &self.fallback,
            collection,
        )?;
        self.router.store(Arc::new(router));
        Ok(())
    }
}

fn build_router(
    config: &AppConfig,
    dispatcher: &Arc<Dispatcher>,
    middleware: &Arc<MiddlewareRegistry>,
    fallback: &Option<Arc<dyn Fallback>>,
    collection: Collection,
) -> Result<Router, RoutingError> {
    let options = RouterOptions {
        global_middleware: config.routing.middleware.clone(),
        debug: config.app.debug,
        base_url: Some(config.app.url.clone()).filter(|url| !url.is_empty()),
        fallback: fallback.clone(),
    };
    Router::new(Arc::new(collection), dispatcher.clone(), middleware.clone(), options)
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.config.app.name)
            .field("router", &self.router())
            .finish()
    }
}
