//! Route matching logic.
//!
//! # Responsibilities
//! - Resolve a request path + method to a route
//! - Extract and cast path parameters
//! - Tell "no such path" (404) apart from "wrong method" (405)
//!
//! # Design Decisions
//! - Static routes first: exact hash lookup, no regex
//! - Dynamic routes next, scanned in registration order; first match wins
//! - A capture that fails its cast makes the route not match, scanning goes on
//! - Request paths are normalized the same way route paths are

use std::sync::Arc;

use axum::http::Method;

use crate::routing::collection::Collection;
use crate::routing::path;
use crate::routing::route::{Params, Route};

/// A successful match. Also stored in request extensions for middleware.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub params: Params,
}

/// Result of matching a request.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Found(RouteMatch),
    /// The path exists but not for this method.
    MethodNotAllowed { allowed: Vec<Method> },
    NotFound,
}

impl MatchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchOutcome::Found(_))
    }

    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self, MatchOutcome::MethodNotAllowed { .. })
    }
}

/// Resolves requests against a shared [`Collection`].
#[derive(Debug, Clone)]
pub struct Matcher {
    collection: Arc<Collection>,
}

impl Matcher {
    pub fn new(collection: Arc<Collection>) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &Arc<Collection> {
        &self.collection
    }

    /// Match `path` (without query string) for `method`.
    pub fn match_request(&self, path: &str, method: &Method) -> MatchOutcome {
        let path = path::normalize(path);
        let mut allowed: Vec<Method> = Vec::new();

        // 1. Exact static lookup
        for route in self.collection.static_routes(&path) {
            if route.accepts(method) {
                return MatchOutcome::Found(RouteMatch {
                    route: route.clone(),
                    params: Params::default(),
                });
            }
            allow(&mut allowed, route);
        }

        // 2. Dynamic scan, registration order
        for route in self.collection.dynamic_routes() {
            let Some(params) = route.captures(&path) else {
                continue;
            };
            if !route.accepts(method) {
                allow(&mut allowed, route);
                continue;
            }
            return MatchOutcome::Found(RouteMatch {
                route: route.clone(),
                params,
            });
        }

        if allowed.is_empty() {
            MatchOutcome::NotFound
        } else {
            MatchOutcome::MethodNotAllowed { allowed }
        }
    }
}

fn allow(allowed: &mut Vec<Method>, route: &Route) {
    for method in route.methods() {
        if !allowed.contains(method) {
            allowed.push(method.clone());
        }
    }
}
