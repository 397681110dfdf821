//! Route data model.
//!
//! # Data Flow
//! ```text
//! RouteDefinition (collector output / cache file, serializable)
//!     → compile() (parse path, merge parameters, build regexes)
//!     → Route (immutable, shared as Arc<Route> by the Collection)
//! ```
//!
//! # Design Decisions
//! - A compiled Route keeps its normalized definition, so exporting the
//!   table to the cache is a clone, and recompiling it is idempotent
//! - Static routes carry no regex; they are looked up by exact path

use std::fmt;

use axum::http::Method;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::routing::dispatch::Dispatch;
use crate::routing::error::RoutingError;
use crate::routing::path::{self, Segment};
use crate::routing::patterns;

/// How a captured parameter is converted before reaching the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cast {
    #[default]
    String,
    Int,
    UInt,
    Float,
    Bool,
}

impl Cast {
    /// Convert a raw capture. `None` when the value does not fit the cast.
    pub fn apply(self, raw: &str) -> Option<ParamValue> {
        match self {
            Cast::String => Some(ParamValue::String(raw.to_string())),
            Cast::Int => raw.parse().ok().map(ParamValue::Int),
            Cast::UInt => raw.parse().ok().map(ParamValue::UInt),
            Cast::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(ParamValue::Float),
            Cast::Bool => parse_bool(raw).map(ParamValue::Bool),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// A typed route parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ParamValue::Int(v) => Some(v),
            ParamValue::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            ParamValue::UInt(v) => Some(v),
            ParamValue::Int(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ParamValue::Float(v) => Some(v),
            ParamValue::Int(v) => Some(v as f64),
            ParamValue::UInt(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            ParamValue::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::String(v) => f.write_str(v),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::UInt(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// A path placeholder's constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    #[serde(default)]
    optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(default)]
    cast: Cast,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: None,
            optional: false,
            default: None,
            cast: Cast::default(),
        }
    }

    /// Constrain the parameter. Accepts aliases such as `num` or `slug`.
    pub fn with_pattern(mut self, pattern: impl AsRef<str>) -> Self {
        self.pattern = Some(patterns::resolve(pattern.as_ref()).to_string());
        self
    }

    pub fn with_cast(mut self, cast: Cast) -> Self {
        self.cast = cast;
        self
    }

    /// Value used when an optional placeholder is absent.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective regex (without anchors).
    pub fn pattern(&self) -> &str {
        self.pattern.as_deref().unwrap_or(patterns::ANY)
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn cast(&self) -> Cast {
        self.cast
    }
}

/// Redirect target for routes that never reach a handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub to: String,
    #[serde(default = "default_redirect_status")]
    pub status: u16,
}

fn default_redirect_status() -> u16 {
    302
}

/// What a matched route does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Dispatch(Dispatch),
    Redirect(Redirect),
}

/// Uncompiled, serializable route description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub path: String,
    #[serde(with = "method_list")]
    pub methods: Vec<Method>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub target: Target,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middleware: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
}

impl RouteDefinition {
    pub fn new(methods: impl IntoIterator<Item = Method>, path: impl Into<String>, target: Target) -> Self {
        Self {
            path: path.into(),
            methods: methods.into_iter().collect(),
            name: None,
            target,
            middleware: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Validate and compile into a matchable [`Route`].
    pub fn compile(&self) -> Result<Route, RoutingError> {
        let parsed = path::parse(&self.path)?;
        let route_path = parsed.path.clone();

        if self.methods.is_empty() {
            return Err(RoutingError::NoMethods(route_path));
        }
        if let Some(unknown) = self
            .parameters
            .iter()
            .find(|p| !parsed.placeholders.iter().any(|ph| ph.name == p.name))
        {
            return Err(RoutingError::UnknownParameter {
                path: route_path,
                parameter: unknown.name.clone(),
            });
        }
        if let Target::Redirect(redirect) = &self.target {
            if !matches!(redirect.status, 301 | 302 | 303 | 307 | 308) {
                return Err(RoutingError::InvalidRedirect {
                    path: route_path,
                    status: redirect.status,
                });
            }
        }

        // Explicit parameters override what the placeholder declared inline.
        let parameters: Vec<Parameter> = parsed
            .placeholders
            .iter()
            .map(|ph| {
                let explicit = self.parameters.iter().find(|p| p.name == ph.name);
                Parameter {
                    name: ph.name.clone(),
                    pattern: explicit
                        .and_then(|p| p.pattern.clone())
                        .or_else(|| ph.pattern.clone()),
                    optional: ph.optional,
                    default: explicit.and_then(|p| p.default.clone()),
                    cast: explicit.map(|p| p.cast).unwrap_or_default(),
                }
            })
            .collect();

        let mut checks = Vec::with_capacity(parameters.len());
        for parameter in &parameters {
            let check = Regex::new(&format!("^(?:{})$", parameter.pattern())).map_err(|e| {
                RoutingError::InvalidRegex {
                    path: route_path.clone(),
                    parameter: parameter.name.clone(),
                    source: Box::new(e),
                }
            })?;
            if let Some(default) = &parameter.default {
                if !check.is_match(default) {
                    return Err(RoutingError::InvalidParameterValue {
                        route: route_path,
                        parameter: parameter.name.clone(),
                        value: default.clone(),
                        pattern: parameter.pattern().to_string(),
                    });
                }
            }
            checks.push(check);
        }

        let regex = if parsed.is_static() {
            None
        } else {
            let source = path::regex_source(&parsed.segments, &|name: &str| {
                parameters
                    .iter()
                    .find(|p| p.name == name)
                    .map(|p| p.pattern().to_string())
                    .unwrap_or_else(|| patterns::ANY.to_string())
            });
            Some(Regex::new(&source).map_err(|e| RoutingError::invalid_path(&route_path, e.to_string()))?)
        };

        let mut methods: Vec<Method> = Vec::with_capacity(self.methods.len());
        for method in &self.methods {
            if !methods.contains(method) {
                methods.push(method.clone());
            }
        }

        Ok(Route {
            definition: RouteDefinition {
                path: route_path,
                methods,
                name: self.name.clone(),
                target: self.target.clone(),
                middleware: self.middleware.clone(),
                parameters,
            },
            segments: parsed.segments,
            regex,
            checks,
        })
    }
}

/// A compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    definition: RouteDefinition,
    segments: Vec<Segment>,
    regex: Option<Regex>,
    /// Anchored per-parameter patterns, parallel to `definition.parameters`.
    checks: Vec<Regex>,
}

impl Route {
    pub fn path(&self) -> &str {
        &self.definition.path
    }

    pub fn name(&self) -> Option<&str> {
        self.definition.name.as_deref()
    }

    pub fn methods(&self) -> &[Method] {
        &self.definition.methods
    }

    /// HEAD is served by GET routes.
    pub fn accepts(&self, method: &Method) -> bool {
        self.definition.methods.contains(method)
            || (*method == Method::HEAD && self.definition.methods.contains(&Method::GET))
    }

    pub fn target(&self) -> &Target {
        &self.definition.target
    }

    pub fn dispatch(&self) -> Option<&Dispatch> {
        match &self.definition.target {
            Target::Dispatch(dispatch) => Some(dispatch),
            Target::Redirect(_) => None,
        }
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match &self.definition.target {
            Target::Redirect(redirect) => Some(redirect),
            Target::Dispatch(_) => None,
        }
    }

    pub fn middleware(&self) -> &[String] {
        &self.definition.middleware
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.definition.parameters
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_dynamic(&self) -> bool {
        self.regex.is_some()
    }

    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    /// Label used in logs and metrics: the name, or the path when unnamed.
    pub fn label(&self) -> &str {
        self.name().unwrap_or(self.path())
    }

    pub fn definition(&self) -> &RouteDefinition {
        &self.definition
    }

    /// Whether `value` satisfies the pattern of parameter `name`.
    pub fn check_parameter(&self, name: &str, value: &str) -> Option<bool> {
        self.definition
            .parameters
            .iter()
            .position(|p| p.name == name)
            .map(|i| self.checks[i].is_match(value))
    }

    /// Match `path` against the route regex and cast the captures.
    ///
    /// Static routes match only their exact path.
    pub fn captures(&self, path: &str) -> Option<Params> {
        match &self.regex {
            None => (self.path() == path).then(Params::default),
            Some(regex) => regex.captures(path).and_then(|caps| self.extract(&caps)),
        }
    }

    fn extract(&self, caps: &Captures<'_>) -> Option<Params> {
        let mut params = Params::default();
        for parameter in &self.definition.parameters {
            let raw = match caps.name(&parameter.name) {
                Some(m) => urlencoding::decode(m.as_str())
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| m.as_str().to_string()),
                None => match &parameter.default {
                    Some(default) => default.clone(),
                    None => continue,
                },
            };
            let value = parameter.cast.apply(&raw)?;
            params.0.push(MatchedParam {
                name: parameter.name.clone(),
                raw,
                value,
            });
        }
        Some(params)
    }
}

/// One extracted parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedParam {
    pub name: String,
    /// Percent-decoded capture from the path (or the default).
    pub raw: String,
    pub value: ParamValue,
}

/// Parameters extracted by a match, in path order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<MatchedParam>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.find(name).map(|p| &p.value)
    }

    pub fn raw(&self, name: &str) -> Option<&str> {
        self.find(name).map(|p| p.raw.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchedParam> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn find(&self, name: &str) -> Option<&MatchedParam> {
        self.0.iter().find(|p| p.name == name)
    }
}

/// Parse a method token, case-insensitively.
pub fn parse_method(token: &str) -> Result<Method, RoutingError> {
    Method::from_bytes(token.to_ascii_uppercase().as_bytes())
        .map_err(|_| RoutingError::InvalidMethod(token.to_string()))
}

mod method_list {
    use axum::http::Method;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(methods: &Vec<Method>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(methods.iter().map(Method::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Method>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|token| super::parse_method(token).map_err(D::Error::custom))
            .collect()
    }
}
