//! Request middleware.
//!
//! # Responsibilities
//! - Define the [`Middleware`] contract (request in, response out)
//! - Chain middleware around an endpoint ([`Next`])
//! - Resolve middleware names declared on routes ([`MiddlewareRegistry`])
//!
//! # Design Decisions
//! - Onion model: each middleware may act before and after `next.run`,
//!   or answer on its own without calling it
//! - Chains are immutable slices shared by every request
//! - Names are resolved when the router is built, never per request

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::routing::RoutingError;

/// Innermost step of a chain.
pub type Endpoint = Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Response> + Send + Sync>;

/// An ordered, shared middleware chain.
pub type Chain = Arc<[Arc<dyn Middleware>]>;

pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, request: Request<Body>, next: Next) -> BoxFuture<'static, Response>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request<Body>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle(&self, request: Request<Body>, next: Next) -> BoxFuture<'static, Response> {
        self(request, next).boxed()
    }
}

/// Wrap an async function as an [`Endpoint`].
pub fn endpoint<F, Fut>(f: F) -> Endpoint
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |request| f(request).boxed())
}

/// The rest of the chain, as seen from inside a middleware.
#[derive(Clone)]
pub struct Next {
    chain: Chain,
    index: usize,
    endpoint: Endpoint,
}

impl Next {
    pub fn new(chain: Chain, endpoint: Endpoint) -> Self {
        Self {
            chain,
            index: 0,
            endpoint,
        }
    }

    /// Pass the request to the next middleware, or to the endpoint.
    pub async fn run(self, request: Request<Body>) -> Response {
        match self.chain.get(self.index).cloned() {
            Some(middleware) => {
                let next = Next {
                    chain: self.chain,
                    index: self.index + 1,
                    endpoint: self.endpoint,
                };
                middleware.handle(request, next).await
            }
            None => (self.endpoint)(request).await,
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("len", &self.chain.len())
            .finish()
    }
}

/// Named middleware routes can refer to.
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    entries: HashMap<String, Arc<dyn Middleware>>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: Middleware>(&mut self, name: impl Into<String>, middleware: M) -> &mut Self {
        self.entries.insert(name.into(), Arc::new(middleware));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Build the chain for `names`, in order. `owner` labels the error.
    pub fn resolve(&self, owner: &str, names: &[String]) -> Result<Chain, RoutingError> {
        names
            .iter()
            .map(|name| {
                self.entries
                    .get(name)
                    .cloned()
                    .ok_or_else(|| RoutingError::UnknownMiddleware {
                        route: owner.to_string(),
                        middleware: name.clone(),
                    })
            })
            .collect()
    }
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("MiddlewareRegistry").field("entries", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use axum::response::IntoResponse;
    use std::sync::Mutex;

    fn recorder(log: Arc<Mutex<Vec<String>>>, label: &'static str) -> impl Middleware {
        move |request: Request<Body>, next: Next| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(format!("{label}:before"));
                let response = next.run(request).await;
                log.lock().unwrap().push(format!("{label}:after"));
                response
            }
        }
    }

    #[tokio::test]
    async fn test_onion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Chain = Arc::new([
            Arc::new(recorder(log.clone(), "outer")) as Arc<dyn Middleware>,
            Arc::new(recorder(log.clone(), "inner")) as Arc<dyn Middleware>,
        ]);
        let endpoint_log = log.clone();
        let endpoint = endpoint(move |_request| {
            let log = endpoint_log.clone();
            async move {
                log.lock().unwrap().push("handler".to_string());
                "ok".into_response()
            }
        });

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = Next::new(chain, endpoint).run(request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["outer:before", "inner:before", "handler", "inner:after", "outer:after"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_and_response_mutation() {
        let deny = |_request: Request<Body>, _next: Next| async {
            StatusCode::UNAUTHORIZED.into_response()
        };
        let tag = |request: Request<Body>, next: Next| async move {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert("x-tagged", HeaderValue::from_static("yes"));
            response
        };
        let chain: Chain = Arc::new([
            Arc::new(tag) as Arc<dyn Middleware>,
            Arc::new(deny) as Arc<dyn Middleware>,
        ]);
        let endpoint = endpoint(|_request| async { StatusCode::OK.into_response() });

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = Next::new(chain, endpoint).run(request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["x-tagged"], "yes");
    }

    #[test]
    fn test_registry_resolve() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("auth", |request: Request<Body>, next: Next| next.run(request));

        let chain = registry.resolve("home", &["auth".to_string()]).unwrap();
        assert_eq!(chain.len(), 1);

        let err = registry
            .resolve("home", &["auth".to_string(), "csrf".to_string()])
            .err()
            .expect("csrf is not registered");
        assert!(matches!(
            err,
            RoutingError::UnknownMiddleware { route, middleware } if route == "home" && middleware == "csrf"
        ));
    }
}
