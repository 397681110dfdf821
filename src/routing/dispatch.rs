//! Dispatch targets.
//!
//! A [`Dispatch`] only *describes* what a route invokes. The
//! [`Dispatcher`](crate::http::Dispatcher) resolves it against the handlers
//! registered at boot, so a route table loaded from a cache file can be
//! wired to the same callables as a freshly collected one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a route invokes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dispatch {
    /// An action on a controller.
    Method {
        class: String,
        method: String,
        #[serde(default)]
        is_static: bool,
    },
    /// A free function.
    Function { name: String },
    /// An anonymous handler identified by a caller-chosen id.
    Closure { id: String },
}

impl Dispatch {
    /// Instance method `class->method`.
    pub fn method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Method {
            class: class.into(),
            method: method.into(),
            is_static: false,
        }
    }

    /// Static method `class::method`.
    pub fn static_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Method {
            class: class.into(),
            method: method.into(),
            is_static: true,
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::Function { name: name.into() }
    }

    pub fn closure(id: impl Into<String>) -> Self {
        Self::Closure { id: id.into() }
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Method {
                class,
                method,
                is_static: true,
            } => write!(f, "{class}::{method}"),
            Dispatch::Method { class, method, .. } => write!(f, "{class}->{method}"),
            Dispatch::Function { name } => f.write_str(name),
            Dispatch::Closure { id } => write!(f, "closure:{id}"),
        }
    }
}
