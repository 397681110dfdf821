//! Dispatch targets → registered handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;

use crate::http::handler::{Handler, HandlerError, RouteContext};
use crate::routing::{Collection, Dispatch, RoutingError};

/// Registry of handlers keyed by the [`Dispatch`] that names them.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<Dispatch, Arc<dyn Handler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `dispatch`. A second registration replaces the first.
    pub fn register<H: Handler>(&mut self, dispatch: Dispatch, handler: H) -> &mut Self {
        if self.handlers.contains_key(&dispatch) {
            tracing::warn!(dispatch = %dispatch, "Handler replaced");
        }
        self.handlers.insert(dispatch, Arc::new(handler));
        self
    }

    pub fn contains(&self, dispatch: &Dispatch) -> bool {
        self.handlers.contains_key(dispatch)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Every dispatch target in `collection` must have a handler.
    pub fn validate(&self, collection: &Collection) -> Result<(), RoutingError> {
        for route in collection.all() {
            if let Some(dispatch) = route.dispatch() {
                if !self.contains(dispatch) {
                    return Err(RoutingError::UnknownHandler {
                        route: route.label().to_string(),
                        handler: dispatch.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Invoke the handler of the matched route.
    pub async fn dispatch(&self, ctx: RouteContext) -> Result<Response, HandlerError> {
        let handler = {
            let Some(dispatch) = ctx.route().dispatch() else {
                return Err(HandlerError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("route `{}` has no dispatch target", ctx.route().label()),
                ));
            };
            self.handlers.get(dispatch).cloned().ok_or_else(|| {
                HandlerError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("no handler registered for `{dispatch}`"),
                )
            })?
        };
        handler.call(ctx).await
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut targets: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        targets.sort();
        f.debug_struct("Dispatcher").field("handlers", &targets).finish()
    }
}
