//! Request routing and dispatch.
//!
//! # Responsibilities
//! - Run global middleware, match, run route middleware, dispatch
//! - Answer redirect routes without a handler
//! - Answer unmatched requests (fallback, or JSON 404 / 405)
//! - Report each request's progress as [`RequestState`] events
//!
//! # Design Decisions
//! - Immutable after construction; a new route table means a new Router
//! - Every middleware name and dispatch target is checked in `Router::new`,
//!   so nothing is resolved lazily on the request path
//! - Handler errors are responses, never panics

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::http::middleware::{endpoint, Chain, MiddlewareRegistry, Next};
use crate::http::response::{self, ErrorResponder};
use crate::http::{Dispatcher, HandlerError, RequestIdExt, RouteContext};
use crate::observability::metrics;
use crate::routing::collection::Collection;
use crate::routing::error::RoutingError;
use crate::routing::matcher::{MatchOutcome, Matcher, RouteMatch};
use crate::routing::route::Route;
use crate::routing::url::UrlGenerator;

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Matched,
    NotMatched,
    Dispatched,
    Responded,
    ErrorResponded,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestState::Responded | RequestState::ErrorResponded)
    }
}

/// Answers requests no route matched.
pub trait Fallback: Send + Sync + 'static {
    fn respond(&self, request: Request<Body>, outcome: MatchOutcome) -> BoxFuture<'static, Response>;
}

impl<F, Fut> Fallback for F
where
    F: Fn(Request<Body>, MatchOutcome) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn respond(&self, request: Request<Body>, outcome: MatchOutcome) -> BoxFuture<'static, Response> {
        self(request, outcome).boxed()
    }
}

/// Router settings that do not come from the route table.
#[derive(Clone, Default)]
pub struct RouterOptions {
    /// Names of middleware run around every request, outermost first.
    pub global_middleware: Vec<String>,
    /// Include error details in error responses.
    pub debug: bool,
    /// Base for absolute URLs.
    pub base_url: Option<String>,
    pub fallback: Option<Arc<dyn Fallback>>,
}

/// Routes requests through middleware to handlers.
#[derive(Clone)]
pub struct Router {
    inner: Arc<Inner>,
}

struct Inner {
    matcher: Matcher,
    urls: UrlGenerator,
    dispatcher: Arc<Dispatcher>,
    middleware: Arc<MiddlewareRegistry>,
    global: Chain,
    /// Route middleware keyed by route address.
    chains: HashMap<usize, Chain>,
    responder: ErrorResponder,
    fallback: Option<Arc<dyn Fallback>>,
}

impl Router {
    /// Build a router, failing on any unknown handler or middleware name.
    pub fn new(
        collection: Arc<Collection>,
        dispatcher: Arc<Dispatcher>,
        middleware: Arc<MiddlewareRegistry>,
        options: RouterOptions,
    ) -> Result<Self, RoutingError> {
        dispatcher.validate(&collection)?;
        let mut chains = HashMap::new();
        for route in collection.all() {
            chains.insert(route_key(route), middleware.resolve(route.label(), route.middleware())?);
        }
        let global = middleware.resolve("<global>", &options.global_middleware)?;

        let mut urls = UrlGenerator::new(collection.clone());
        if let Some(base_url) = options.base_url {
            urls = urls.with_base_url(base_url);
        }

        Ok(Self {
            inner: Arc::new(Inner {
                matcher: Matcher::new(collection),
                urls,
                dispatcher,
                middleware,
                global,
                chains,
                responder: ErrorResponder::new(options.debug),
                fallback: options.fallback,
            }),
        })
    }

    pub fn collection(&self) -> &Arc<Collection> {
        self.inner.matcher.collection()
    }

    pub fn matcher(&self) -> &Matcher {
        &self.inner.matcher
    }

    pub fn urls(&self) -> &UrlGenerator {
        &self.inner.urls
    }

    pub fn responder(&self) -> ErrorResponder {
        self.inner.responder
    }

    /// Run one request through the whole pipeline.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let inner = self.inner.clone();
        let route = endpoint(move |request| inner.clone().route(request));
        Next::new(self.inner.global.clone(), route).run(request).await
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.collection().len())
            .field("dispatcher", &self.inner.dispatcher)
            .field("middleware", &self.inner.middleware)
            .field("debug", &self.inner.responder.debug())
            .finish()
    }
}

fn route_key(route: &Arc<Route>) -> usize {
    Arc::as_ptr(route) as usize
}

impl Inner {
    fn chain(&self, route: &Arc<Route>) -> Chain {
        self.chains
            .get(&route_key(route))
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    async fn route(self: Arc<Self>, mut request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let request_id = request.request_id().unwrap_or("-").to_string();

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            state = ?RequestState::Received,
            "Request received"
        );

        // 1. Match
        let matched = match self.matcher.match_request(&path, &method) {
            MatchOutcome::Found(matched) => matched,
            outcome => {
                tracing::debug!(
                    request_id = %request_id,
                    path = %path,
                    state = ?RequestState::NotMatched,
                    "No route matched"
                );
                metrics::record_route_miss(method.as_str(), outcome.is_method_not_allowed());

                let response = match &self.fallback {
                    Some(fallback) => fallback.respond(request, outcome).await,
                    None => self.responder.not_matched(&outcome),
                };
                tracing::debug!(
                    request_id = %request_id,
                    status = response.status().as_u16(),
                    state = ?RequestState::ErrorResponded,
                    "Request answered"
                );
                metrics::record_request(method.as_str(), response.status().as_u16(), "none", start);
                return response;
            }
        };

        let label = matched.route.label().to_string();
        tracing::debug!(
            request_id = %request_id,
            route = %label,
            params = matched.params.len(),
            state = ?RequestState::Matched,
            "Route matched"
        );

        // 2. Redirect routes answer directly
        if let Some(redirect) = matched.route.redirect() {
            let response = response::redirect(redirect);
            tracing::debug!(
                request_id = %request_id,
                route = %label,
                location = %redirect.to,
                state = ?RequestState::Responded,
                "Redirected"
            );
            metrics::record_request(method.as_str(), response.status().as_u16(), &label, start);
            return response;
        }

        // 3. Route middleware, then the handler
        let chain = self.chain(&matched.route);
        request.extensions_mut().insert(matched);

        let inner = self.clone();
        let handler = endpoint(move |request| inner.clone().dispatch(request));
        let response = Next::new(chain, handler).run(request).await;

        metrics::record_request(method.as_str(), response.status().as_u16(), &label, start);
        response
    }

    async fn dispatch(self: Arc<Self>, mut request: Request<Body>) -> Response {
        let Some(matched) = request.extensions_mut().remove::<RouteMatch>() else {
            return self
                .responder
                .render(&HandlerError::internal("matched route missing from request"));
        };
        let request_id = request.request_id().unwrap_or("-").to_string();
        let label = matched.route.label().to_string();

        tracing::debug!(
            request_id = %request_id,
            route = %label,
            state = ?RequestState::Dispatched,
            "Dispatching"
        );

        match self.dispatcher.dispatch(RouteContext::new(request, matched)).await {
            Ok(response) => {
                tracing::debug!(
                    request_id = %request_id,
                    route = %label,
                    status = response.status().as_u16(),
                    state = ?RequestState::Responded,
                    "Request answered"
                );
                response
            }
            Err(error) => {
                tracing::debug!(
                    request_id = %request_id,
                    route = %label,
                    status = error.status().as_u16(),
                    state = ?RequestState::ErrorResponded,
                    "Handler failed"
                );
                self.responder.render(&error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Dispatch, RouteDefinition, Target};
    use axum::http::{Method, StatusCode};

    fn collection() -> Arc<Collection> {
        let mut def = RouteDefinition::new(
            [Method::GET],
            "/secure",
            Target::Dispatch(Dispatch::function("secure")),
        );
        def.middleware = vec!["auth".into()];
        Arc::new(Collection::from_definitions(&[def]).unwrap())
    }

    fn dispatcher() -> Arc<Dispatcher> {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Dispatch::function("secure"), |_ctx: RouteContext| async {
            Ok::<_, HandlerError>("secret")
        });
        Arc::new(dispatcher)
    }

    #[test]
    fn test_unknown_middleware_rejected_at_build() {
        let err = Router::new(
            collection(),
            dispatcher(),
            Arc::new(MiddlewareRegistry::new()),
            RouterOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RoutingError::UnknownMiddleware { middleware, .. } if middleware == "auth"));
    }

    #[test]
    fn test_unknown_global_middleware_rejected_at_build() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("auth", |request: Request<Body>, next: Next| next.run(request));
        let options = RouterOptions {
            global_middleware: vec!["cors".into()],
            ..RouterOptions::default()
        };
        let err = Router::new(collection(), dispatcher(), Arc::new(registry), options).unwrap_err();
        assert!(matches!(err, RoutingError::UnknownMiddleware { route, .. } if route == "<global>"));
    }

    #[tokio::test]
    async fn test_route_middleware_sees_match() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("auth", |request: Request<Body>, next: Next| async move {
            let matched = request.extensions().get::<RouteMatch>().cloned();
            match matched {
                Some(m) if m.route.path() == "/secure" => next.run(request).await,
                _ => Response::builder()
                    .status(StatusCode::FORBIDDEN)
                    .body(Body::empty())
                    .unwrap(),
            }
        });
        let router = Router::new(
            collection(),
            dispatcher(),
            Arc::new(registry),
            RouterOptions::default(),
        )
        .unwrap();

        let request = Request::builder().uri("/secure").body(Body::empty()).unwrap();
        let response = router.handle(request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_route_chains_resolved_once_at_build() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("auth", |request: Request<Body>, next: Next| next.run(request));

        let mut open = RouteDefinition::new(
            [Method::GET],
            "/open",
            Target::Dispatch(Dispatch::function("secure")),
        );
        open.name = Some("open".into());
        let mut secure = RouteDefinition::new(
            [Method::GET],
            "/secure",
            Target::Dispatch(Dispatch::function("secure")),
        );
        secure.middleware = vec!["auth".into(), "auth".into()];
        let collection = Arc::new(Collection::from_definitions(&[open, secure]).unwrap());

        let router = Router::new(collection.clone(), dispatcher(), Arc::new(registry), RouterOptions::default())
            .unwrap();
        let inner = &router.inner;
        assert_eq!(inner.chains.len(), 2);

        let first = inner.chain(&collection.all()[1]);
        let second = inner.chain(&collection.all()[1]);
        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(inner.chain(&collection.all()[0]).is_empty());
    }

    #[test]
    fn test_terminal_states() {
        assert!(RequestState::Responded.is_terminal());
        assert!(RequestState::ErrorResponded.is_terminal());
        assert!(!RequestState::Matched.is_terminal());
    }
}
