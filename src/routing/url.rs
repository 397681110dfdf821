//! Reverse routing: build URLs from route names.
//!
//! # Design Decisions
//! - Values are validated against the parameter pattern, so a generated
//!   path always matches the route it was generated from
//! - An optional group is rendered only when every parameter directly
//!   inside it was supplied; defaults never force a group to render
//! - Values are checked unencoded, then percent-encoded per `/`-separated
//!   piece, so a `path` parameter keeps its slashes

use std::collections::HashMap;
use std::sync::Arc;

use crate::routing::collection::Collection;
use crate::routing::error::RoutingError;
use crate::routing::path::Segment;
use crate::routing::route::Route;

/// Generates paths and absolute URLs for named routes.
#[derive(Debug, Clone)]
pub struct UrlGenerator {
    collection: Arc<Collection>,
    base_url: Option<String>,
}

impl UrlGenerator {
    pub fn new(collection: Arc<Collection>) -> Self {
        Self {
            collection,
            base_url: None,
        }
    }

    /// Prefix for absolute URLs, e.g. `https://example.com`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    /// Path for route `name`. Values are percent-encoded; the matcher
    /// decodes them again.
    pub fn path<I, K, V>(&self, name: &str, params: I) -> Result<String, RoutingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let route = self
            .collection
            .get_by_name(name)
            .ok_or_else(|| RoutingError::UnknownRoute(name.to_string()))?;
        let params: HashMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut out = String::new();
        render(route, route.segments(), &params, &mut out)?;
        if out.is_empty() {
            out.push('/');
        }
        Ok(out)
    }

    /// Path, or absolute URL when `absolute` is set and a base URL is known.
    pub fn url<I, K, V>(&self, name: &str, params: I, absolute: bool) -> Result<String, RoutingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let path = self.path(name, params)?;
        match (&self.base_url, absolute) {
            (Some(base), true) => Ok(format!("{base}{path}")),
            _ => Ok(path),
        }
    }
}

fn render(
    route: &Route,
    segments: &[Segment],
    params: &HashMap<String, String>,
    out: &mut String,
) -> Result<(), RoutingError> {
    for segment in segments {
        match segment {
            Segment::Static(text) => out.push_str(text),
            Segment::Param(name) => {
                let value = match params.get(name) {
                    Some(value) => value.as_str(),
                    None => route
                        .parameters()
                        .iter()
                        .find(|p| p.name() == name)
                        .and_then(|p| p.default_value())
                        .ok_or_else(|| RoutingError::MissingParameter {
                            route: route.label().to_string(),
                            parameter: name.clone(),
                        })?,
                };
                if route.check_parameter(name, value) == Some(false) {
                    let pattern = route
                        .parameters()
                        .iter()
                        .find(|p| p.name() == name)
                        .map(|p| p.pattern().to_string())
                        .unwrap_or_default();
                    return Err(RoutingError::InvalidParameterValue {
                        route: route.label().to_string(),
                        parameter: name.clone(),
                        value: value.to_string(),
                        pattern,
                    });
                }
                push_encoded(value, out);
            }
            Segment::Optional(inner) => {
                let supplied = inner.iter().all(|s| match s {
                    Segment::Param(name) => params.contains_key(name),
                    _ => true,
                });
                if supplied {
                    render(route, inner, params, out)?;
                }
            }
        }
    }
    Ok(())
}

fn push_encoded(value: &str, out: &mut String) {
    for (i, piece) in value.split('/').enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(&urlencoding::encode(piece));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::dispatch::Dispatch;
    use crate::routing::matcher::{MatchOutcome, Matcher};
    use crate::routing::route::{RouteDefinition, Target};
    use axum::http::Method;

    fn collection() -> Arc<Collection> {
        let defs: Vec<RouteDefinition> = [
            ("/article/{slug:slug}", "article"),
            ("/users/{id:num}/posts/{post:num}", "users.posts"),
            ("/archive[/{year:num}[/{month:num}]]", "archive"),
            ("/", "home"),
            ("/search/{term}", "search"),
            ("/files/{file:path}", "files"),
        ]
        .into_iter()
        .map(|(path, name)| {
            let mut def = RouteDefinition::new(
                [Method::GET],
                path,
                Target::Dispatch(Dispatch::function(name)),
            );
            def.name = Some(name.to_string());
            def
        })
        .collect();
        Arc::new(Collection::from_definitions(&defs).unwrap())
    }

    #[test]
    fn test_generate_path() {
        let urls = UrlGenerator::new(collection());
        assert_eq!(
            urls.path("article", [("slug", "hello-world")]).unwrap(),
            "/article/hello-world"
        );
        assert_eq!(urls.path("home", Vec::<(String, String)>::new()).unwrap(), "/");
    }

    #[test]
    fn test_generate_encodes_values() {
        let urls = UrlGenerator::new(collection());
        assert_eq!(
            urls.path("search", [("term", "hello world")]).unwrap(),
            "/search/hello%20world"
        );
        assert_eq!(
            urls.path("files", [("file", "docs/a b.txt")]).unwrap(),
            "/files/docs/a%20b.txt"
        );
    }

    #[test]
    fn test_generate_optional_groups() {
        let urls = UrlGenerator::new(collection());
        let none: [(&str, &str); 0] = [];
        assert_eq!(urls.path("archive", none).unwrap(), "/archive");
        assert_eq!(urls.path("archive", [("year", "2024")]).unwrap(), "/archive/2024");
        assert_eq!(
            urls.path("archive", [("year", "2024"), ("month", "5")]).unwrap(),
            "/archive/2024/5"
        );
    }

    #[test]
    fn test_generate_errors() {
        let urls = UrlGenerator::new(collection());
        assert!(matches!(
            urls.path("nope", [("a", "b")]),
            Err(RoutingError::UnknownRoute(_))
        ));
        assert!(matches!(
            urls.path("users.posts", [("id", "1")]),
            Err(RoutingError::MissingParameter { parameter, .. }) if parameter == "post"
        ));
        assert!(matches!(
            urls.path("users.posts", [("id", "x"), ("post", "2")]),
            Err(RoutingError::InvalidParameterValue { parameter, .. }) if parameter == "id"
        ));
    }

    #[test]
    fn test_absolute_url() {
        let urls = UrlGenerator::new(collection()).with_base_url("https://example.com/");
        assert_eq!(
            urls.url("article", [("slug", "a")], true).unwrap(),
            "https://example.com/article/a"
        );
        assert_eq!(urls.url("article", [("slug", "a")], false).unwrap(), "/article/a");
    }

    #[test]
    fn test_generate_then_match_roundtrip() {
        let collection = collection();
        let urls = UrlGenerator::new(collection.clone());
        let matcher = Matcher::new(collection);

        let cases = [
            ("article", vec![("slug", "rust-2024")]),
            ("users.posts", vec![("id", "10"), ("post", "3")]),
            ("archive", vec![("year", "1999"), ("month", "12")]),
            ("search", vec![("term", "café & crème")]),
            ("files", vec![("file", "docs/a b.txt")]),
        ];
        for (name, params) in cases {
            let path = urls.path(name, params.clone()).unwrap();
            let MatchOutcome::Found(matched) = matcher.match_request(&path, &Method::GET) else {
                panic!("{path} did not match");
            };
            assert_eq!(matched.route.name(), Some(name));
            for (key, value) in params {
                assert_eq!(matched.params.raw(key), Some(value));
            }
        }
    }
}
