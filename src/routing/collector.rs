//! Route discovery.
//!
//! Routes are declared in code by [`RouteProvider`]s instead of being
//! discovered through reflection. A provider plays the part of an annotated
//! controller: `routes` is its metadata, `handlers` its callable actions.
//!
//! # Data Flow
//! ```text
//! providers
//!     → Collector (builder calls, groups add prefixes / names / middleware)
//!     → Vec<RouteDefinition>
//!     → into_collection() (compile; any error is fatal at boot)
//! ```

use axum::http::Method;

use crate::http::Dispatcher;
use crate::routing::collection::Collection;
use crate::routing::dispatch::Dispatch;
use crate::routing::error::RoutingError;
use crate::routing::route::{Parameter, Redirect, RouteDefinition, Target};

/// A source of routes and the handlers they dispatch to.
pub trait RouteProvider: Send + Sync {
    /// Declare routes.
    fn routes(&self, routes: &mut Collector);

    /// Register the callables named by this provider's dispatch targets.
    fn handlers(&self, handlers: &mut Dispatcher);
}

/// Attributes shared by every route declared inside a group.
#[derive(Debug, Clone, Default)]
pub struct Group {
    path: String,
    name: String,
    middleware: Vec<String>,
}

impl Group {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Prefix prepended to route names (e.g. `admin.`).
    pub fn name(mut self, prefix: impl Into<String>) -> Self {
        self.name = prefix.into();
        self
    }

    pub fn middleware(mut self, name: impl Into<String>) -> Self {
        self.middleware.push(name.into());
        self
    }
}

/// Builder collecting route definitions.
#[derive(Debug, Default)]
pub struct Collector {
    definitions: Vec<RouteDefinition>,
    prefix: String,
    name_prefix: String,
    middleware: Vec<String>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every provider's `routes` and compile the result.
    pub fn collect<'a, I, P>(providers: I) -> Result<Collection, RoutingError>
    where
        I: IntoIterator<Item = &'a P>,
        P: RouteProvider + ?Sized + 'a,
    {
        let mut collector = Collector::new();
        for provider in providers {
            provider.routes(&mut collector);
        }
        collector.into_collection()
    }

    pub fn get(&mut self, path: &str, dispatch: Dispatch) -> RouteBuilder<'_> {
        self.matches([Method::GET], path, dispatch)
    }

    pub fn post(&mut self, path: &str, dispatch: Dispatch) -> RouteBuilder<'_> {
        self.matches([Method::POST], path, dispatch)
    }

    pub fn put(&mut self, path: &str, dispatch: Dispatch) -> RouteBuilder<'_> {
        self.matches([Method::PUT], path, dispatch)
    }

    pub fn patch(&mut self, path: &str, dispatch: Dispatch) -> RouteBuilder<'_> {
        self.matches([Method::PATCH], path, dispatch)
    }

    pub fn delete(&mut self, path: &str, dispatch: Dispatch) -> RouteBuilder<'_> {
        self.matches([Method::DELETE], path, dispatch)
    }

    pub fn options(&mut self, path: &str, dispatch: Dispatch) -> RouteBuilder<'_> {
        self.matches([Method::OPTIONS], path, dispatch)
    }

    /// Every common method.
    pub fn any(&mut self, path: &str, dispatch: Dispatch) -> RouteBuilder<'_> {
        self.matches(
            [
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ],
            path,
            dispatch,
        )
    }

    pub fn matches<I>(&mut self, methods: I, path: &str, dispatch: Dispatch) -> RouteBuilder<'_>
    where
        I: IntoIterator<Item = Method>,
    {
        self.push(methods, path, Target::Dispatch(dispatch))
    }

    /// A GET route answering with a redirect instead of a handler.
    pub fn redirect(&mut self, path: &str, to: impl Into<String>, status: u16) -> RouteBuilder<'_> {
        let redirect = Redirect {
            to: to.into(),
            status,
        };
        self.push([Method::GET], path, Target::Redirect(redirect))
    }

    /// Declare routes sharing a path prefix, name prefix and middleware.
    pub fn group<F>(&mut self, group: Group, routes: F)
    where
        F: FnOnce(&mut Collector),
    {
        let mut child = Collector {
            definitions: Vec::new(),
            prefix: join(&self.prefix, &group.path),
            name_prefix: format!("{}{}", self.name_prefix, group.name),
            middleware: self
                .middleware
                .iter()
                .chain(&group.middleware)
                .cloned()
                .collect(),
        };
        routes(&mut child);
        self.definitions.append(&mut child.definitions);
    }

    pub fn definitions(&self) -> &[RouteDefinition] {
        &self.definitions
    }

    /// Compile everything collected so far.
    pub fn into_collection(self) -> Result<Collection, RoutingError> {
        let collection = Collection::from_definitions(&self.definitions)?;
        tracing::info!(routes = collection.len(), "Routes collected");
        Ok(collection)
    }

    fn push<I>(&mut self, methods: I, path: &str, target: Target) -> RouteBuilder<'_>
    where
        I: IntoIterator<Item = Method>,
    {
        let mut definition = RouteDefinition::new(methods, join(&self.prefix, path), target);
        definition.middleware = self.middleware.clone();
        self.definitions.push(definition);

        let index = self.definitions.len() - 1;
        RouteBuilder {
            definition: &mut self.definitions[index],
            name_prefix: &self.name_prefix,
        }
    }
}

/// Adjusts the route just declared.
pub struct RouteBuilder<'a> {
    definition: &'a mut RouteDefinition,
    name_prefix: &'a str,
}

impl RouteBuilder<'_> {
    /// Name the route (the group's name prefix is prepended).
    pub fn name(self, name: &str) -> Self {
        self.definition.name = Some(format!("{}{}", self.name_prefix, name));
        self
    }

    pub fn middleware(self, name: impl Into<String>) -> Self {
        self.definition.middleware.push(name.into());
        self
    }

    pub fn parameter(self, parameter: Parameter) -> Self {
        self.definition.parameters.push(parameter);
        self
    }

    /// Also accept `method`.
    pub fn method(self, method: Method) -> Self {
        self.definition.methods.push(method);
        self
    }
}

fn join(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else if path.starts_with('[') {
        format!("{}{}", prefix.trim_end_matches('/'), path)
    } else {
        format!(
            "{}/{}",
            prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
