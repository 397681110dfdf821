//! Indexed route store.
//!
//! # Responsibilities
//! - Own every compiled route (`Arc<Route>`) in registration order
//! - Index routes by name and by normalized path pattern
//! - Keep dynamic routes in a separate list for the regex scan
//!
//! # Design Decisions
//! - Built once at boot, then wrapped in `Arc` and never mutated
//! - Duplicate names are rejected; duplicate paths are allowed (one per method)

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::routing::error::RoutingError;
use crate::routing::path;
use crate::routing::route::{Route, RouteDefinition};

/// Read-only route table.
#[derive(Debug, Default)]
pub struct Collection {
    routes: Vec<Arc<Route>>,
    named: HashMap<String, usize>,
    by_path: HashMap<String, Vec<usize>>,
    dynamic: Vec<usize>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every definition, in order.
    pub fn from_definitions<'a, I>(definitions: I) -> Result<Self, RoutingError>
    where
        I: IntoIterator<Item = &'a RouteDefinition>,
    {
        let mut collection = Self::new();
        for definition in definitions {
            collection.add(definition.compile()?)?;
        }
        Ok(collection)
    }

    /// Add a compiled route.
    pub fn add(&mut self, route: Route) -> Result<Arc<Route>, RoutingError> {
        let index = self.routes.len();
        if let Some(name) = route.name() {
            if self.named.contains_key(name) {
                return Err(RoutingError::DuplicateName(name.to_string()));
            }
            self.named.insert(name.to_string(), index);
        }
        self.by_path
            .entry(route.path().to_string())
            .or_default()
            .push(index);
        if route.is_dynamic() {
            self.dynamic.push(index);
        }

        let route = Arc::new(route);
        self.routes.push(route.clone());
        Ok(route)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Arc<Route>> {
        self.named.get(name).map(|&i| &self.routes[i])
    }

    /// Route registered with exactly this path pattern that accepts `method`.
    pub fn get_by_path(&self, path: &str, method: &Method) -> Option<&Arc<Route>> {
        self.by_path
            .get(path::normalize(path).as_ref())?
            .iter()
            .map(|&i| &self.routes[i])
            .find(|route| route.accepts(method))
    }

    pub fn all(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Static routes registered for exactly `path`.
    pub fn static_routes<'a>(&'a self, path: &str) -> impl Iterator<Item = &'a Arc<Route>> + 'a {
        self.by_path
            .get(path)
            .into_iter()
            .flatten()
            .map(|&i| &self.routes[i])
            .filter(|route| !route.is_dynamic())
    }

    /// Dynamic routes in registration order.
    pub fn dynamic_routes(&self) -> impl Iterator<Item = &Arc<Route>> + '_ {
        self.dynamic.iter().map(|&i| &self.routes[i])
    }

    /// Export the table in a form the cache can store.
    pub fn definitions(&self) -> Vec<RouteDefinition> {
        self.routes
            .iter()
            .map(|route| route.definition().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::dispatch::Dispatch;
    use crate::routing::route::Target;

    fn route(methods: &[Method], path: &str, name: Option<&str>) -> Route {
        let mut def = RouteDefinition::new(
            methods.to_vec(),
            path,
            Target::Dispatch(Dispatch::function("f")),
        );
        def.name = name.map(str::to_string);
        def.compile().unwrap()
    }

    #[test]
    fn test_get_by_name_returns_same_route() {
        let mut collection = Collection::new();
        let added = collection
            .add(route(&[Method::GET], "/article/{slug}", Some("article")))
            .unwrap();
        let found = collection.get_by_name("article").unwrap();
        assert!(Arc::ptr_eq(&added, found));
        assert!(collection.get_by_name("missing").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut collection = Collection::new();
        collection
            .add(route(&[Method::GET], "/a", Some("dup")))
            .unwrap();
        let err = collection
            .add(route(&[Method::GET], "/b", Some("dup")))
            .unwrap_err();
        assert!(matches!(err, RoutingError::DuplicateName(name) if name == "dup"));
    }

    #[test]
    fn test_get_by_path_filters_method() {
        let mut collection = Collection::new();
        collection.add(route(&[Method::GET], "/users", None)).unwrap();
        collection.add(route(&[Method::POST], "/users/", None)).unwrap();
        collection
            .add(route(&[Method::GET], "/users/{id}", None))
            .unwrap();

        let post = collection.get_by_path("/users", &Method::POST).unwrap();
        assert_eq!(post.methods(), &[Method::POST]);
        assert!(collection.get_by_path("/users", &Method::DELETE).is_none());
        assert!(collection
            .get_by_path("/users/{id}", &Method::GET)
            .unwrap()
            .is_dynamic());
    }

    #[test]
    fn test_static_and_dynamic_partition() {
        let mut collection = Collection::new();
        collection.add(route(&[Method::GET], "/", None)).unwrap();
        collection.add(route(&[Method::GET], "/{page}", None)).unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.static_routes("/").count(), 1);
        assert_eq!(collection.dynamic_routes().count(), 1);
        assert_eq!(collection.definitions().len(), 2);
    }
}
