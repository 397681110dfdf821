//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at boot):
//!     RouteProvider[] → Collector (or RouteCache file)
//!     → RouteDefinition[]
//!     → compile: parse path, resolve pattern aliases, build regex
//!     → Collection (static map + ordered dynamic list + name index)
//!     → freeze behind Arc
//!
//! Incoming Request (method, path)
//!     → router.rs (global middleware)
//!     → matcher.rs (static lookup, then dynamic scan)
//!     → Found: route middleware → Dispatcher → handler
//!     → NotFound / MethodNotAllowed: fallback or JSON 404 / 405
//! ```
//!
//! # Design Decisions
//! - Routes compiled at boot, immutable at runtime; reload swaps a whole table
//! - Every configuration error surfaces at boot as a `RoutingError`
//! - Deterministic: static routes first, then first registered dynamic route

pub mod cache;
pub mod collection;
pub mod collector;
pub mod dispatch;
pub mod error;
pub mod matcher;
pub mod path;
pub mod patterns;
pub mod route;
pub mod router;
pub mod url;
pub mod watcher;

pub use cache::{CacheError, RouteCache, CACHE_VERSION};
pub use collection::Collection;
pub use collector::{Collector, Group, RouteBuilder, RouteProvider};
pub use dispatch::Dispatch;
pub use error::RoutingError;
pub use matcher::{MatchOutcome, Matcher, RouteMatch};
pub use route::{Cast, MatchedParam, ParamValue, Parameter, Params, Redirect, Route, RouteDefinition, Target};
pub use router::{Fallback, RequestState, Router, RouterOptions};
pub use url::UrlGenerator;
pub use watcher::CacheWatcher;
