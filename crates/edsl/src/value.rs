//! Dynamic values and the dispatch capability
//!
//! Page objects talk to the driver, to elements and to each other through
//! one narrow interface: [`Dispatch`]. An operation is named by a string
//! and receives a list of [`Value`]s, which is all the accessor engine
//! needs to stay polymorphic over whatever automation backend sits below.

use crate::result::{EdslError, EdslResult};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Anything that can receive named operations: driver objects, elements,
/// containers and hooked proxies.
pub trait Dispatch: Any + Send + Sync + fmt::Debug {
    /// Name used in error messages
    fn type_name(&self) -> &str;

    /// Invoke `operation` with `args`.
    ///
    /// Implementations return [`crate::EdslError::UnsupportedOperation`]
    /// for operations they do not know.
    fn call(&self, operation: &str, args: &[Value]) -> EdslResult<Value>;

    /// Whether `operation` would be handled by [`Dispatch::call`]
    fn responds_to(&self, operation: &str) -> bool;

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a dispatchable object
pub type ObjectRef = Arc<dyn Dispatch>;

/// Identity comparison for object handles.
#[must_use]
pub fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// A dynamically typed value flowing through accessors and hooks.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value (an unresolved element, a void result)
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Str(String),
    /// Ordered list
    List(Vec<Value>),
    /// Ordered mapping
    Map(Options),
    /// Dispatchable object, compared by identity
    Object(ObjectRef),
}

impl Value {
    /// Wrap a dispatchable object
    pub fn object<T: Dispatch>(object: T) -> Self {
        Self::Object(Arc::new(object))
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Ruby-style truthiness: only `Null` and `false` are falsy.
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        !matches!(self, Self::Null | Self::Bool(false))
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&Options> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrow the concrete type behind an object value
    #[must_use]
    pub fn downcast_ref<T: Dispatch>(&self) -> Option<&T> {
        self.as_object()
            .and_then(|object| object.as_any().downcast_ref::<T>())
    }

    /// True when both values hold the very same object instance
    #[must_use]
    pub fn is_same_object(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => same_object(a, b),
            _ => false,
        }
    }

    /// Dispatch `operation` on the object held by this value
    pub fn call(&self, operation: &str, args: &[Value]) -> EdslResult<Value> {
        match self {
            Self::Object(object) => object.call(operation, args),
            other => Err(EdslError::UnsupportedOperation {
                object: other.kind().to_string(),
                operation: operation.to_string(),
            }),
        }
    }

    /// Short description of the value's kind, for diagnostics
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(object) => object.type_name(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => same_object(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<Options> for Value {
    fn from(value: Options) -> Self {
        Self::Map(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or_default()), Self::Int),
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Insertion-ordered, string keyed mapping.
///
/// Used for locator options passed to the driver and for population data.
/// Replacing a key keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    entries: Vec<(String, Value)>,
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.insert(key, value);
        self
    }

    /// Insert a value, returning the one it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Shallow merge: every top-level key of `overrides` replaces ours.
    #[must_use]
    pub fn merged(&self, overrides: &Options) -> Options {
        let mut merged = self.clone();
        for (key, value) in overrides.iter() {
            let _ = merged.insert(key, value.clone());
        }
        merged
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (key, value) in iter {
            let _ = options.insert(key, value);
        }
        options
    }
}

impl IntoIterator for Options {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Build an [`Options`] mapping from `key => value` pairs.
///
/// ```
/// let opts = edsl::options! { "id" => "username", "index" => 2 };
/// assert_eq!(opts.len(), 2);
/// ```
#[macro_export]
macro_rules! options {
    () => {
        $crate::Options::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Options::new()$(.with($key, $value))+
    };
}
