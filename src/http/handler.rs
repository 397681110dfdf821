//! Route handlers and the context they receive.
//!
//! Any `Fn(RouteContext) -> impl Future<Output = Result<R, HandlerError>>`
//! with `R: IntoResponse` is a [`Handler`]. Return values are normalized into
//! a response by axum's `IntoResponse`; errors go to the
//! [`ErrorResponder`](crate::http::ErrorResponder).

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Query;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::de::DeserializeOwned;

use crate::http::request::RequestIdExt;
use crate::routing::{ParamValue, Params, Route, RouteMatch};

/// Boxed future returned by [`Handler::call`].
pub type HandlerFuture = BoxFuture<'static, Result<Response, HandlerError>>;

/// A callable a route dispatches to.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: RouteContext) -> HandlerFuture;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(RouteContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, ctx: RouteContext) -> HandlerFuture {
        self(ctx)
            .map(|result| result.map(IntoResponse::into_response))
            .boxed()
    }
}

/// Error raised by a handler. Carries the status it should be rendered with.
#[derive(Debug)]
pub struct HandlerError {
    status: StatusCode,
    message: String,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 500 wrapping an underlying error.
    pub fn internal<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let error = error.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
            source: Some(error),
        }
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        self.source = Some(source.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Messages of the source chain, outermost first.
    pub fn causes(&self) -> Vec<String> {
        let mut causes = Vec::new();
        let mut current = StdError::source(self);
        while let Some(error) = current {
            causes.push(error.to_string());
            current = error.source();
        }
        causes
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

impl StdError for HandlerError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Everything a handler gets: the request, the matched route, its params.
#[derive(Debug)]
pub struct RouteContext {
    request: Request<Body>,
    route: Arc<Route>,
    params: Params,
}

impl RouteContext {
    pub fn new(request: Request<Body>, matched: RouteMatch) -> Self {
        Self {
            request,
            route: matched.route,
            params: matched.params,
        }
    }

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn into_request(self) -> Request<Body> {
        self.request
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// Captured substring, before casting.
    pub fn param_raw(&self, name: &str) -> Option<&str> {
        self.params.raw(name)
    }

    /// Raw value of a parameter the route guarantees, or a 400.
    pub fn require(&self, name: &str) -> Result<&str, HandlerError> {
        self.param_raw(name)
            .ok_or_else(|| HandlerError::bad_request(format!("missing route parameter `{name}`")))
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request.request_id()
    }

    /// Deserialize the query string.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        Query::<T>::try_from_uri(self.request.uri())
            .map(|Query(query)| query)
            .map_err(|rejection| HandlerError::bad_request(rejection.body_text()))
    }

    /// Read and deserialize a JSON body. Size is bounded by the server's body limit.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HandlerError> {
        let bytes = axum::body::to_bytes(self.request.into_body(), usize::MAX)
            .await
            .map_err(|e| HandlerError::bad_request("failed to read request body").with_source(e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            HandlerError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).with_source(e)
        })
    }
}
