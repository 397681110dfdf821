//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router whose fallback is the kernel
//! - Wire up tower-http layers (trace, request ID, timeout, body limit)
//! - Bind to a listener and serve until shutdown
//! - Apply route table updates from the cache watcher

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::Application;
use crate::config::AppConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::routing::Collection;

/// Application state injected into the kernel handler.
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<Application>,
}

/// HTTP server running an [`Application`].
pub struct HttpServer {
    router: Router,
    app: Arc<Application>,
}

impl HttpServer {
    pub fn new(app: Arc<Application>) -> Self {
        let state = AppState { app: app.clone() };
        let router = Self::build_router(app.config(), state);
        Self { router, app }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let layers = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = request.request_id().unwrap_or("-"),
                )
            }))
            .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)));

        Router::new()
            .fallback(kernel_handler)
            .with_state(state)
            .layer(layers)
    }

    /// The fully layered axum router, for embedding or in-process tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut route_updates: mpsc::UnboundedReceiver<Collection>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            app = %self.app.config().app.name,
            routes = self.app.router().collection().len(),
            "HTTP server starting"
        );

        // Route table hot reload
        let app = self.app.clone();
        let reloader = tokio::spawn(async move {
            while let Some(collection) = route_updates.recv().await {
                match app.swap_collection(collection) {
                    Ok(()) => tracing::info!("Route table reloaded"),
                    Err(e) => tracing::error!(error = %e, "Rejected route table update. Keeping current routes."),
                }
            }
        });

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn app(&self) -> &Arc<Application> {
        &self.app
    }
}

/// Every request goes through the kernel.
async fn kernel_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.app.handle(request).await
}
