//! Fixture data lookup
//!
//! `fixture_fetch(key)` pulls external test data for a container. The
//! source is, in order:
//!
//! 1. the fetcher given to the container at construction (inherited by
//!    its sections),
//! 2. the process-wide fetcher set with [`install_global`],
//! 3. nothing: every key resolves to [`Value::Null`].
//!
//! A fetcher is either a function of the key or the name of an operation
//! dispatched on the container with the key. [`FixtureData`] loads a YAML
//! or JSON document of fixtures and turns it into a fetcher.
//!
//! Tests that install a global fetcher should [`reset_global`] when done.

use crate::accessor_spec::Behavior;
use crate::container::Container;
use crate::result::{EdslError, EdslResult};
use crate::value::{Options, Value};
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, trace};

/// Fixture lookup function: `key -> value`
pub type FixtureFn = Arc<dyn Fn(&str) -> EdslResult<Value> + Send + Sync>;

/// Function or operation name used to look fixtures up
pub type FixtureFetcher = Behavior<FixtureFn>;

/// Fetcher backed by a function
pub fn fetcher_fn<F>(fetch: F) -> FixtureFetcher
where
    F: Fn(&str) -> EdslResult<Value> + Send + Sync + 'static,
{
    Behavior::Function(Arc::new(fetch))
}

/// Fetcher that dispatches `operation` on the container
pub fn fetcher_operation(operation: impl Into<String>) -> FixtureFetcher {
    Behavior::dispatch(operation)
}

fn global_slot() -> &'static RwLock<Option<FixtureFetcher>> {
    static GLOBAL: OnceLock<RwLock<Option<FixtureFetcher>>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(None))
}

/// Install the process-wide fetcher, returning the one it replaces
pub fn install_global(fetcher: FixtureFetcher) -> Option<FixtureFetcher> {
    debug!(fetcher = ?fetcher, "installing global fixture fetcher");
    global_slot()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(fetcher)
}

/// Remove the process-wide fetcher
pub fn reset_global() -> Option<FixtureFetcher> {
    global_slot()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}

/// The process-wide fetcher, if one is installed
#[must_use]
pub fn global() -> Option<FixtureFetcher> {
    global_slot()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

impl Container {
    /// Look `key` up in this container's fixture source
    pub fn fixture_fetch(&self, key: &str) -> EdslResult<Value> {
        let fetcher = match self.fixtures() {
            Some(fetcher) => fetcher.clone(),
            None => match global() {
                Some(fetcher) => fetcher,
                None => {
                    trace!(container = self.type_name(), key, "no fixture source");
                    return Ok(Value::Null);
                }
            },
        };
        trace!(container = self.type_name(), key, "fixture fetch");
        match fetcher {
            Behavior::Function(fetch) => fetch(key),
            Behavior::Dispatch(operation) => self.dispatch(&operation, &[Value::from(key)]),
        }
    }
}

/// Fixtures loaded from a YAML or JSON mapping document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureData {
    data: Options,
}

impl FixtureData {
    /// Wrap an existing mapping
    #[must_use]
    pub const fn new(data: Options) -> Self {
        Self { data }
    }

    /// Parse a JSON object
    pub fn from_json_str(json: &str) -> EdslResult<Self> {
        let document: serde_json::Value = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Parse a YAML mapping
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> EdslResult<Self> {
        let document: serde_json::Value = serde_yaml_ng::from_str(yaml)?;
        Self::from_document(document)
    }

    /// Load a file; `.json` files are parsed as JSON, anything else as
    /// YAML.
    pub fn from_file(path: impl AsRef<Path>) -> EdslResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            return Self::from_json_str(&text);
        }
        Self::from_yaml_text(&text)
    }

    #[cfg(feature = "yaml")]
    fn from_yaml_text(text: &str) -> EdslResult<Self> {
        Self::from_yaml_str(text)
    }

    #[cfg(not(feature = "yaml"))]
    fn from_yaml_text(_text: &str) -> EdslResult<Self> {
        Err(EdslError::FixtureError {
            message: "YAML support is disabled (enable the `yaml` feature)".to_string(),
        })
    }

    fn from_document(document: serde_json::Value) -> EdslResult<Self> {
        match Value::from(document) {
            Value::Map(data) => Ok(Self { data }),
            Value::Null => Ok(Self::default()),
            other => Err(EdslError::FixtureError {
                message: format!("fixture document must be a mapping, got {}", other.kind()),
            }),
        }
    }

    /// Value stored under `key` (a missing key is `Null`)
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.data.get(key).cloned().unwrap_or_default()
    }

    #[must_use]
    pub const fn data(&self) -> &Options {
        &self.data
    }

    /// Fetcher serving lookups from this data
    #[must_use]
    pub fn into_fetcher(self) -> FixtureFetcher {
        let data = Arc::new(self);
        fetcher_fn(move |key| Ok(data.get(key)))
    }
}
