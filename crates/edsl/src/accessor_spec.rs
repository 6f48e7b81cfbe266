//! Accessor specifications
//!
//! An [`AccessorSpec`] is the validated, immutable description of one
//! declared property on a container type. It is built from
//! [`AccessorOptions`], the loose mergeable form that presets store and
//! declarations override.
//!
//! Every behavior is a [`Behavior`]: either the name of an operation to
//! dispatch, or a function supplied by the page author. Functions for
//! read/write/presence bypass element resolution entirely and receive only
//! the accessor name and the container.

use crate::container::Container;
use crate::hooks::HookSet;
use crate::result::{EdslError, EdslResult};
use crate::value::{Options, Value};
use std::fmt;
use std::sync::Arc;

/// Operation a container's elements answer for the default presence check
pub const DEFAULT_PRESENCE_OPERATION: &str = "present?";

/// Finds an element: `(name, container, extra_options) -> element`
pub type LocateFn = Arc<dyn Fn(&str, &Container, &Options) -> EdslResult<Value> + Send + Sync>;

/// Produces the accessor's value: `(name, container) -> value`
pub type ReadFn = Arc<dyn Fn(&str, &Container) -> EdslResult<Value> + Send + Sync>;

/// Writes the accessor: `(name, container, value)`
pub type AssignFn = Arc<dyn Fn(&str, &Container, Value) -> EdslResult<()> + Send + Sync>;

/// Presence check: `(name, container) -> present`
pub type PresenceFn = Arc<dyn Fn(&str, &Container) -> EdslResult<bool> + Send + Sync>;

/// Decorates a freshly resolved element: `(element, container) -> element`
pub type WrapperFn = Arc<dyn Fn(Value, &Container) -> EdslResult<Value> + Send + Sync>;

/// Either an operation dispatched by name or a function.
#[derive(Clone)]
pub enum Behavior<F> {
    /// Dispatch the named operation
    Dispatch(String),
    /// Call the function
    Function(F),
}

impl<F> Behavior<F> {
    /// Dispatch-by-name behavior
    pub fn dispatch(operation: impl Into<String>) -> Self {
        Self::Dispatch(operation.into())
    }

    #[must_use]
    pub fn operation(&self) -> Option<&str> {
        match self {
            Self::Dispatch(op) => Some(op),
            Self::Function(_) => None,
        }
    }

    #[must_use]
    pub const fn is_function(&self) -> bool {
        matches!(self, Self::Function(_))
    }
}

impl<F> fmt::Debug for Behavior<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatch(op) => f.debug_tuple("Dispatch").field(op).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// How an accessor finds its element
pub type AccessStrategy = Behavior<LocateFn>;
/// What reading the accessor returns
pub type DefaultBehavior = Behavior<ReadFn>;
/// How the accessor is written
pub type AssignBehavior = Behavior<AssignFn>;
/// How presence is determined
pub type PresenceBehavior = Behavior<PresenceFn>;

/// Loose, mergeable accessor options.
///
/// Presets store these; a declaration's own options are merged over the
/// preset's with [`AccessorOptions::merged`]. The merge is shallow: any
/// field or extra option key set on the override replaces the default
/// outright.
#[derive(Clone, Default)]
pub struct AccessorOptions {
    how: Option<AccessStrategy>,
    default_behavior: Option<DefaultBehavior>,
    assign_behavior: Option<AssignBehavior>,
    presence_behavior: Option<PresenceBehavior>,
    wrapper: Option<WrapperFn>,
    hooks: Option<HookSet>,
    locate_block: Option<LocateFn>,
    extra: Options,
}

impl fmt::Debug for AccessorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorOptions")
            .field("how", &self.how)
            .field("default_behavior", &self.default_behavior)
            .field("assign_behavior", &self.assign_behavior)
            .field("presence_behavior", &self.presence_behavior)
            .field("wrapper", &self.wrapper.is_some())
            .field("hooks", &self.hooks)
            .field("extra", &self.extra)
            .finish()
    }
}

impl AccessorOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locate the element by dispatching `operation` on the driver
    #[must_use]
    pub fn how(mut self, operation: impl Into<String>) -> Self {
        self.how = Some(Behavior::dispatch(operation));
        self
    }

    /// Locate the element with a function
    #[must_use]
    pub fn how_fn<F>(mut self, locate: F) -> Self
    where
        F: Fn(&str, &Container, &Options) -> EdslResult<Value> + Send + Sync + 'static,
    {
        self.how = Some(Behavior::Function(Arc::new(locate)));
        self
    }

    /// Read by dispatching `operation` on the element
    #[must_use]
    pub fn default_method(mut self, operation: impl Into<String>) -> Self {
        self.default_behavior = Some(Behavior::dispatch(operation));
        self
    }

    /// Read with a function that bypasses element resolution
    #[must_use]
    pub fn default_fn<F>(mut self, read: F) -> Self
    where
        F: Fn(&str, &Container) -> EdslResult<Value> + Send + Sync + 'static,
    {
        self.default_behavior = Some(Behavior::Function(Arc::new(read)));
        self
    }

    /// Write by dispatching `operation` on the element with the value
    #[must_use]
    pub fn assign_method(mut self, operation: impl Into<String>) -> Self {
        self.assign_behavior = Some(Behavior::dispatch(operation));
        self
    }

    /// Write with a function that bypasses element resolution
    #[must_use]
    pub fn assign_fn<F>(mut self, assign: F) -> Self
    where
        F: Fn(&str, &Container, Value) -> EdslResult<()> + Send + Sync + 'static,
    {
        self.assign_behavior = Some(Behavior::Function(Arc::new(assign)));
        self
    }

    /// Check presence by dispatching `operation` on the element
    #[must_use]
    pub fn presence_method(mut self, operation: impl Into<String>) -> Self {
        self.presence_behavior = Some(Behavior::dispatch(operation));
        self
    }

    /// Check presence with a function that bypasses element resolution
    #[must_use]
    pub fn presence_fn<F>(mut self, present: F) -> Self
    where
        F: Fn(&str, &Container) -> EdslResult<bool> + Send + Sync + 'static,
    {
        self.presence_behavior = Some(Behavior::Function(Arc::new(present)));
        self
    }

    /// Wrap every resolved element
    #[must_use]
    pub fn wrapper<F>(mut self, wrap: F) -> Self
    where
        F: Fn(Value, &Container) -> EdslResult<Value> + Send + Sync + 'static,
    {
        self.wrapper = Some(Arc::new(wrap));
        self
    }

    /// Attach before/after hooks to the resolved element
    #[must_use]
    pub fn hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Custom resolution tried before the access strategy.
    ///
    /// A `Null` result falls through to the strategy.
    #[must_use]
    pub fn locate_with<F>(mut self, block: F) -> Self
    where
        F: Fn(&str, &Container, &Options) -> EdslResult<Value> + Send + Sync + 'static,
    {
        self.locate_block = Some(Arc::new(block));
        self
    }

    /// Add one option passed through to the access strategy
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.extra.insert(key, value);
        self
    }

    /// Add several options passed through to the access strategy
    #[must_use]
    pub fn options(mut self, options: Options) -> Self {
        self.extra = self.extra.merged(&options);
        self
    }

    #[must_use]
    pub const fn extra_options(&self) -> &Options {
        &self.extra
    }

    #[must_use]
    pub const fn access_strategy(&self) -> Option<&AccessStrategy> {
        self.how.as_ref()
    }

    /// Shallow merge, `overrides` wins on every field it sets.
    #[must_use]
    pub fn merged(&self, overrides: &AccessorOptions) -> AccessorOptions {
        AccessorOptions {
            how: overrides.how.clone().or_else(|| self.how.clone()),
            default_behavior: overrides
                .default_behavior
                .clone()
                .or_else(|| self.default_behavior.clone()),
            assign_behavior: overrides
                .assign_behavior
                .clone()
                .or_else(|| self.assign_behavior.clone()),
            presence_behavior: overrides
                .presence_behavior
                .clone()
                .or_else(|| self.presence_behavior.clone()),
            wrapper: overrides.wrapper.clone().or_else(|| self.wrapper.clone()),
            hooks: overrides.hooks.clone().or_else(|| self.hooks.clone()),
            locate_block: overrides
                .locate_block
                .clone()
                .or_else(|| self.locate_block.clone()),
            extra: self.extra.merged(&overrides.extra),
        }
    }

    /// Validate and freeze into a spec for accessor `name`.
    pub fn into_spec(self, name: impl Into<String>) -> EdslResult<AccessorSpec> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(EdslError::InvalidAccessorName { name });
        }
        let Some(access_strategy) = self.how else {
            return Err(EdslError::MissingAccessStrategy { name });
        };
        Ok(AccessorSpec {
            name,
            access_strategy,
            default_behavior: self.default_behavior,
            assign_behavior: self.assign_behavior,
            presence_behavior: self
                .presence_behavior
                .unwrap_or_else(|| Behavior::dispatch(DEFAULT_PRESENCE_OPERATION)),
            wrapper: self.wrapper,
            hooks: self.hooks,
            locate_block: self.locate_block,
            extra_options: self.extra,
        })
    }
}

impl From<Options> for AccessorOptions {
    /// Plain options become extra locator options with no behaviors set.
    fn from(extra: Options) -> Self {
        Self::new().options(extra)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One declared property of a container type.
#[derive(Clone)]
pub struct AccessorSpec {
    name: String,
    access_strategy: AccessStrategy,
    default_behavior: Option<DefaultBehavior>,
    assign_behavior: Option<AssignBehavior>,
    presence_behavior: PresenceBehavior,
    wrapper: Option<WrapperFn>,
    hooks: Option<HookSet>,
    locate_block: Option<LocateFn>,
    extra_options: Options,
}

impl fmt::Debug for AccessorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorSpec")
            .field("name", &self.name)
            .field("access_strategy", &self.access_strategy)
            .field("default_behavior", &self.default_behavior)
            .field("assign_behavior", &self.assign_behavior)
            .field("presence_behavior", &self.presence_behavior)
            .field("wrapper", &self.wrapper.is_some())
            .field("hooks", &self.hooks)
            .field("extra_options", &self.extra_options)
            .finish()
    }
}

impl AccessorSpec {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn access_strategy(&self) -> &AccessStrategy {
        &self.access_strategy
    }

    #[must_use]
    pub const fn default_behavior(&self) -> Option<&DefaultBehavior> {
        self.default_behavior.as_ref()
    }

    #[must_use]
    pub const fn assign_behavior(&self) -> Option<&AssignBehavior> {
        self.assign_behavior.as_ref()
    }

    #[must_use]
    pub const fn presence_behavior(&self) -> &PresenceBehavior {
        &self.presence_behavior
    }

    #[must_use]
    pub const fn wrapper(&self) -> Option<&WrapperFn> {
        self.wrapper.as_ref()
    }

    #[must_use]
    pub const fn hooks(&self) -> Option<&HookSet> {
        self.hooks.as_ref()
    }

    #[must_use]
    pub const fn locate_block(&self) -> Option<&LocateFn> {
        self.locate_block.as_ref()
    }

    #[must_use]
    pub const fn extra_options(&self) -> &Options {
        &self.extra_options
    }

    /// The four generated operation names, in the order
    /// read, write, presence, element.
    #[must_use]
    pub fn method_names(&self) -> [String; 4] {
        [
            self.name.clone(),
            format!("{}=", self.name),
            format!("{}?", self.name),
            format!("{}_element", self.name),
        ]
    }
}
