//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, tower-http layers: request id, trace, timeout, body limit)
//!     → Application::handle (kernel)
//!     → routing::Router (middleware.rs chains, dispatcher.rs → handler.rs)
//!     → response.rs (errors, 404 / 405, redirects)
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::Dispatcher;
pub use handler::{Handler, HandlerError, RouteContext};
pub use middleware::{Middleware, MiddlewareRegistry, Next};
pub use request::{MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
pub use response::ErrorResponder;
pub use server::HttpServer;
