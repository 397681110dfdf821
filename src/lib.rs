//! Valkyrja HTTP routing core.
//!
//! Routes are declared by [`RouteProvider`]s, compiled once into an immutable
//! [`Collection`](routing::Collection), and served by an [`Application`]
//! through axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http::server (axum + tower-http layers)
//!                        │
//!                        ▼
//!                    app::Application::handle
//!                        │
//!                        ▼
//!                    routing::Router
//!                      global middleware
//!                        → Matcher (static, then dynamic)
//!                        → route middleware
//!                        → http::Dispatcher → handler
//!                        │
//!     Client Response    ▼
//!     ◀───────────── Response (or JSON 404 / 405 / error)
//!
//!     Cross-cutting: config · observability · lifecycle · console
//! ```

pub mod app;
pub mod config;
pub mod console;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use app::{Application, ApplicationBuilder, BootError};
pub use config::AppConfig;
pub use http::{Dispatcher, HandlerError, HttpServer, RouteContext};
pub use lifecycle::Shutdown;
pub use routing::{Collector, Dispatch, Group, RouteProvider};
