//! Result and error types for EDSL.

use thiserror::Error;

/// Result type for EDSL operations
pub type EdslResult<T> = Result<T, EdslError>;

/// Errors that can occur while declaring or using page objects
#[derive(Debug, Error)]
pub enum EdslError {
    /// An accessor resolved to no element and something tried to use it
    #[error("Element not found: accessor `{accessor}` on {container} resolved to nothing")]
    ElementNotFound {
        /// Accessor name
        accessor: String,
        /// Container type name
        container: String,
    },

    /// No accessor with this name is declared on the container type
    #[error("Unknown accessor `{name}` on {container}")]
    UnknownAccessor {
        /// Accessor name
        name: String,
        /// Container type name
        container: String,
    },

    /// The accessor was declared without an assign behavior
    #[error("Accessor `{name}` on {container} is read-only")]
    ReadOnlyAccessor {
        /// Accessor name
        name: String,
        /// Container type name
        container: String,
    },

    /// Two accessors with the same name were declared on one type
    #[error("Accessor `{name}` is declared more than once on {container}")]
    DuplicateAccessor {
        /// Accessor name
        name: String,
        /// Container type name
        container: String,
    },

    /// Accessor names must be identifiers
    #[error("Invalid accessor name `{name}`: must be an identifier")]
    InvalidAccessorName {
        /// Offending name
        name: String,
    },

    /// An accessor was declared without a way to find its element
    #[error("Accessor `{name}` has no access strategy")]
    MissingAccessStrategy {
        /// Accessor name
        name: String,
    },

    /// A preset name was used that was never defined
    #[error("Unknown preset `{name}`")]
    UnknownPreset {
        /// Preset name
        name: String,
    },

    /// An object was asked to perform an operation it does not support
    #[error("{object} does not respond to `{operation}`")]
    UnsupportedOperation {
        /// Receiver type name
        object: String,
        /// Operation name
        operation: String,
    },

    /// An operation received arguments it cannot use
    #[error("Invalid arguments for `{operation}`: {message}")]
    InvalidArguments {
        /// Operation name
        operation: String,
        /// Error message
        message: String,
    },

    /// A page did not become ready in time
    #[error("Timeout limit {limit_secs}s reached waiting for {container} to be ready")]
    ReadyTimeout {
        /// Limit in seconds
        limit_secs: f64,
        /// Container type name
        container: String,
    },

    /// Generic wait timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// No ancestor of a container satisfied a lookup
    #[error("Could not locate {capability} in {container}")]
    NoAncestor {
        /// What was being looked for
        capability: String,
        /// Container type name
        container: String,
    },

    /// No browser is reachable from a container
    #[error("Could not locate a browser in {container}")]
    BrowserNotFound {
        /// Container type name
        container: String,
    },

    /// Page type has no URL declared
    #[error("{container} has no page URL")]
    NoPageUrl {
        /// Container type name
        container: String,
    },

    /// URL template references a parameter with no value
    #[error("URL template for {container} needs parameter `{param}`")]
    MissingUrlParam {
        /// Parameter name
        param: String,
        /// Container type name
        container: String,
    },

    /// Fixture data could not be loaded
    #[error("Fixture error: {message}")]
    FixtureError {
        /// Error message
        message: String,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Error message
        message: String,
    },

    /// A container handle outlived its container
    #[error("{container} was dropped while still referenced")]
    ContainerReleased {
        /// Container type name
        container: String,
    },

    /// Error raised by user supplied behavior
    #[error("{0}")]
    Custom(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid pattern
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// YAML error
    #[cfg(feature = "yaml")]
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl EdslError {
    /// Build an error from a user supplied message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}
