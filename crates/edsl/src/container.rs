//! Container types and instances
//!
//! A [`ContainerType`] is the compiled, immutable description of a page,
//! section or custom element: its accessor table, explicit methods, ready
//! predicate and URL. It is declared once through [`ContainerTypeBuilder`]
//! and shared as `Arc<ContainerType>`.
//!
//! A [`Container`] is a live instance over one driver object. Calls are
//! routed explicitly, first match wins:
//!
//! 1. generated accessor operations (`x`, `x=`, `x?`, `x_element`)
//! 2. built-ins (`populate_with`, `populate_key`, `fixture_fetch`,
//!    `ready?`, `browser`, plus `goto` / `page_url_value` for types with a
//!    URL)
//! 3. explicit methods declared with [`ContainerTypeBuilder::method`]
//! 4. the driver object
//!
//! ## Example
//!
//! ```
//! use edsl::mock::{MockDriver, MockElement};
//! use edsl::{AccessorOptions, Container, ContainerType, Value};
//! use std::sync::Arc;
//!
//! let search = ContainerType::section("SearchBox")
//!     .preset("text_field", "query", edsl::options! { "name" => "q" })
//!     .preset("button", "go", edsl::options! { "type" => "submit" })
//!     .build()
//!     .unwrap();
//! let home = ContainerType::page("HomePage")
//!     .section("search", search, AccessorOptions::new().option("id", "search"))
//!     .build()
//!     .unwrap();
//!
//! let driver = MockDriver::new().with_element(
//!     "div",
//!     MockElement::builder("search").child("text_field", MockElement::new("q")).build(),
//! );
//! let page = Container::new(home, Arc::new(driver));
//! page.write("search", Value::Map(edsl::options! { "query" => "rust" })).unwrap();
//!
//! let section = page.read("search").unwrap();
//! assert_eq!(section.call("query", &[]).unwrap(), Value::from("rust"));
//! ```

use crate::accessor_spec::AccessorOptions;
use crate::config::EdslConfig;
use crate::fixture::FixtureFetcher;
use crate::page::PageUrl;
use crate::presets::PresetRegistry;
use crate::result::{EdslError, EdslResult};
use crate::synthesis::{synthesize, Accessor};
use crate::value::{Dispatch, ObjectRef, Options, Value};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Explicit method: `(container, args) -> value`
pub type MethodFn = Arc<dyn Fn(&Container, &[Value]) -> EdslResult<Value> + Send + Sync>;

/// Ready predicate
pub type ReadyFn = Arc<dyn Fn(&Container) -> EdslResult<bool> + Send + Sync>;

/// What a container stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainerKind {
    /// A whole page; its driver is the browser
    Page,
    /// A region of a page; its driver is the section's root element
    Section,
    /// Any other element wrapper
    #[default]
    Element,
}

// =============================================================================
// CONTAINER TYPE
// =============================================================================

/// Compiled description of a container type
pub struct ContainerType {
    name: String,
    kind: ContainerKind,
    accessors: HashMap<String, Accessor>,
    order: Vec<String>,
    methods: HashMap<String, MethodFn>,
    ready: Option<ReadyFn>,
    page_url: Option<PageUrl>,
    params: Options,
}

impl fmt::Debug for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("ContainerType")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("accessors", &self.order)
            .field("methods", &methods)
            .field("ready", &self.ready.is_some())
            .field("page_url", &self.page_url)
            .field("params", &self.params)
            .finish()
    }
}

impl ContainerType {
    /// Declare a generic element container type
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ContainerTypeBuilder {
        ContainerTypeBuilder::new(name, ContainerKind::Element)
    }

    /// Declare a page type
    #[must_use]
    pub fn page(name: impl Into<String>) -> ContainerTypeBuilder {
        ContainerTypeBuilder::new(name, ContainerKind::Page)
    }

    /// Declare a section type
    #[must_use]
    pub fn section(name: impl Into<String>) -> ContainerTypeBuilder {
        ContainerTypeBuilder::new(name, ContainerKind::Section)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ContainerKind {
        self.kind
    }

    #[must_use]
    pub fn accessor(&self, name: &str) -> Option<&Accessor> {
        self.accessors.get(name)
    }

    /// Accessor names in declaration order
    #[must_use]
    pub fn accessor_names(&self) -> &[String] {
        &self.order
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodFn> {
        self.methods.get(name)
    }

    #[must_use]
    pub const fn ready_predicate(&self) -> Option<&ReadyFn> {
        self.ready.as_ref()
    }

    #[must_use]
    pub const fn page_url(&self) -> Option<&PageUrl> {
        self.page_url.as_ref()
    }

    /// Default URL parameters
    #[must_use]
    pub const fn params(&self) -> &Options {
        &self.params
    }

    /// Resolve a generated operation name to its accessor
    fn generated(&self, operation: &str) -> Option<(&Accessor, Generated)> {
        if let Some(accessor) = self.accessors.get(operation) {
            return Some((accessor, Generated::Read));
        }
        if let Some(name) = operation.strip_suffix('=') {
            return self
                .accessors
                .get(name)
                .filter(|accessor| accessor.is_writable())
                .map(|accessor| (accessor, Generated::Write));
        }
        if let Some(name) = operation.strip_suffix('?') {
            return self
                .accessors
                .get(name)
                .map(|accessor| (accessor, Generated::Present));
        }
        operation
            .strip_suffix("_element")
            .and_then(|name| self.accessors.get(name))
            .map(|accessor| (accessor, Generated::Element))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Generated {
    Read,
    Write,
    Present,
    Element,
}

// =============================================================================
// BUILDER
// =============================================================================

enum Declaration {
    Element {
        name: String,
        options: AccessorOptions,
    },
    Preset {
        preset: String,
        name: String,
        options: AccessorOptions,
    },
}

/// Declarative builder for a [`ContainerType`].
///
/// Declarations are validated by [`ContainerTypeBuilder::build`], in the
/// order they were made.
pub struct ContainerTypeBuilder {
    name: String,
    kind: ContainerKind,
    registry: Arc<PresetRegistry>,
    declarations: Vec<Declaration>,
    methods: HashMap<String, MethodFn>,
    ready: Option<ReadyFn>,
    page_url: Option<PageUrl>,
    params: Options,
}

impl fmt::Debug for ContainerTypeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerTypeBuilder")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("declarations", &self.declarations.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}

impl ContainerTypeBuilder {
    /// Start a declaration using the standard presets
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ContainerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            registry: PresetRegistry::shared_standard(),
            declarations: Vec::new(),
            methods: HashMap::new(),
            ready: None,
            page_url: None,
            params: Options::new(),
        }
    }

    /// Expand presets from `registry` instead of the standard one
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<PresetRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Declare an accessor from raw options
    #[must_use]
    pub fn element(mut self, name: impl Into<String>, options: impl Into<AccessorOptions>) -> Self {
        self.declarations.push(Declaration::Element {
            name: name.into(),
            options: options.into(),
        });
        self
    }

    /// Declare an accessor with a custom resolution block tried before
    /// the access strategy
    #[must_use]
    pub fn element_with<F>(
        self,
        name: impl Into<String>,
        options: impl Into<AccessorOptions>,
        block: F,
    ) -> Self
    where
        F: Fn(&str, &Container, &Options) -> EdslResult<Value> + Send + Sync + 'static,
    {
        let options = options.into().locate_with(block);
        self.element(name, options)
    }

    /// Declare an accessor through a named preset
    #[must_use]
    pub fn preset(
        mut self,
        preset: impl Into<String>,
        name: impl Into<String>,
        options: impl Into<AccessorOptions>,
    ) -> Self {
        self.declarations.push(Declaration::Preset {
            preset: preset.into(),
            name: name.into(),
            options: options.into(),
        });
        self
    }

    /// Declare a nested section.
    ///
    /// Reading it yields a `section_type` container over the located
    /// element (a `div` unless overridden); writing it populates the
    /// section.
    #[must_use]
    pub fn section(
        self,
        name: impl Into<String>,
        section_type: Arc<ContainerType>,
        options: impl Into<AccessorOptions>,
    ) -> Self {
        let defaults = AccessorOptions::new()
            .how("div")
            .assign_method("populate_with")
            .wrapper(move |element, container| match element {
                Value::Object(root) => {
                    let child: ObjectRef = container.child(&section_type, root);
                    Ok(Value::Object(child))
                }
                other => Ok(other),
            });
        self.element(name, defaults.merged(&options.into()))
    }

    /// Declare a list of sections, one per item found by dispatching
    /// `item_how` with `item_options` on the container.
    #[must_use]
    pub fn sections(
        self,
        name: impl Into<String>,
        section_type: Arc<ContainerType>,
        item_how: impl Into<String>,
        item_options: Options,
        options: impl Into<AccessorOptions>,
    ) -> Self {
        let item_how = item_how.into();
        let defaults = AccessorOptions::new().how("div").default_fn(move |_, container| {
            let found = container.dispatch(&item_how, &[Value::Map(item_options.clone())])?;
            let items = match found {
                Value::Null => Vec::new(),
                Value::List(items) => items,
                other => {
                    return Err(EdslError::InvalidArguments {
                        operation: item_how.clone(),
                        message: format!("expected a list of elements, got {}", other.kind()),
                    })
                }
            };
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(root) => {
                        let child: ObjectRef = container.child(&section_type, root);
                        Ok(Value::Object(child))
                    }
                    other => Err(EdslError::InvalidArguments {
                        operation: item_how.clone(),
                        message: format!("expected an element, got {}", other.kind()),
                    }),
                })
                .collect::<EdslResult<Vec<_>>>()
                .map(Value::List)
        });
        self.element(name, defaults.merged(&options.into()))
    }

    /// Declare an explicit method, callable through
    /// [`Container::dispatch`]
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&Container, &[Value]) -> EdslResult<Value> + Send + Sync + 'static,
    {
        let _ = self.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// Readiness predicate used by `ready?` and `when_ready`
    #[must_use]
    pub fn ready_when<F>(mut self, ready: F) -> Self
    where
        F: Fn(&Container) -> EdslResult<bool> + Send + Sync + 'static,
    {
        self.ready = Some(Arc::new(ready));
        self
    }

    /// URL template with `{param}` placeholders
    #[must_use]
    pub fn page_url(mut self, template: impl Into<String>) -> Self {
        self.page_url = Some(PageUrl::Template(template.into()));
        self
    }

    /// Take the URL template from the result of `operation`
    #[must_use]
    pub fn page_url_from(mut self, operation: impl Into<String>) -> Self {
        self.page_url = Some(PageUrl::Operation(operation.into()));
        self
    }

    /// Default URL parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.params.insert(key, value);
        self
    }

    /// Validate every declaration and synthesize the accessor table.
    pub fn build(self) -> EdslResult<Arc<ContainerType>> {
        let mut accessors = HashMap::with_capacity(self.declarations.len());
        let mut order = Vec::with_capacity(self.declarations.len());

        for declaration in self.declarations {
            let spec = match declaration {
                Declaration::Element { name, options } => options.into_spec(name)?,
                Declaration::Preset {
                    preset,
                    name,
                    options,
                } => self.registry.expand(&preset, &name, &options)?,
            };
            if accessors.contains_key(spec.name()) {
                return Err(EdslError::DuplicateAccessor {
                    name: spec.name().to_string(),
                    container: self.name,
                });
            }
            let name = spec.name().to_string();
            order.push(name.clone());
            let _ = accessors.insert(name, synthesize(spec));
        }

        debug!(
            container = %self.name,
            kind = ?self.kind,
            accessors = order.len(),
            methods = self.methods.len(),
            "container type built"
        );
        Ok(Arc::new(ContainerType {
            name: self.name,
            kind: self.kind,
            accessors,
            order,
            methods: self.methods,
            ready: self.ready,
            page_url: self.page_url,
            params: self.params,
        }))
    }
}

// =============================================================================
// CONTAINER
// =============================================================================

/// Construction options for a [`Container`]
#[derive(Debug, Clone, Default)]
pub struct ContainerOptions {
    parent: Option<Weak<Container>>,
    config: Option<EdslConfig>,
    fixtures: Option<FixtureFetcher>,
    params: Options,
}

impl ContainerOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-owning link to the enclosing container
    #[must_use]
    pub fn with_parent(mut self, parent: &Arc<Container>) -> Self {
        self.parent = Some(Arc::downgrade(parent));
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: EdslConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Fixture source consulted before the process-wide one
    #[must_use]
    pub fn with_fixtures(mut self, fixtures: FixtureFetcher) -> Self {
        self.fixtures = Some(fixtures);
        self
    }

    /// Per-instance URL parameters, laid over the type defaults
    #[must_use]
    pub fn with_params(mut self, params: Options) -> Self {
        self.params = params;
        self
    }
}

/// A live page object over one driver object
pub struct Container {
    ty: Arc<ContainerType>,
    driver: ObjectRef,
    parent: Option<Weak<Container>>,
    me: Weak<Container>,
    config: EdslConfig,
    fixtures: Option<FixtureFetcher>,
    params: Options,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("type", &self.ty.name)
            .field("kind", &self.ty.kind)
            .field("driver", &self.driver.type_name())
            .field("parent", &self.parent().map(|p| p.type_name().to_string()))
            .finish_non_exhaustive()
    }
}

impl Container {
    /// Container of type `ty` over `driver`
    #[must_use]
    pub fn new(ty: Arc<ContainerType>, driver: ObjectRef) -> Arc<Self> {
        Self::with_options(ty, driver, ContainerOptions::default())
    }

    #[must_use]
    pub fn with_options(
        ty: Arc<ContainerType>,
        driver: ObjectRef,
        options: ContainerOptions,
    ) -> Arc<Self> {
        let params = ty.params.merged(&options.params);
        trace!(container = %ty.name, driver = driver.type_name(), "container created");
        Arc::new_cyclic(|me| Self {
            ty,
            driver,
            parent: options.parent,
            me: me.clone(),
            config: options.config.unwrap_or_default(),
            fixtures: options.fixtures,
            params,
        })
    }

    /// Nested container over `driver` sharing this container's config and
    /// fixture source
    #[must_use]
    pub fn child(&self, ty: &Arc<ContainerType>, driver: ObjectRef) -> Arc<Self> {
        let mut options = ContainerOptions::new().with_config(self.config.clone());
        options.parent = Some(self.me.clone());
        options.fixtures.clone_from(&self.fixtures);
        Self::with_options(Arc::clone(ty), driver, options)
    }

    /// Owning handle to this container
    pub fn handle(&self) -> EdslResult<Arc<Self>> {
        self.me.upgrade().ok_or_else(|| EdslError::ContainerReleased {
            container: self.ty.name.clone(),
        })
    }

    /// This container as an object value
    pub fn as_value(&self) -> EdslResult<Value> {
        let handle: ObjectRef = self.handle()?;
        Ok(Value::Object(handle))
    }

    #[must_use]
    pub const fn container_type(&self) -> &Arc<ContainerType> {
        &self.ty
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.ty.name
    }

    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        self.ty.kind
    }

    /// The wrapped driver object
    #[must_use]
    pub const fn driver(&self) -> &ObjectRef {
        &self.driver
    }

    /// Enclosing container, if it is still alive
    #[must_use]
    pub fn parent(&self) -> Option<Arc<Self>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    #[must_use]
    pub const fn config(&self) -> &EdslConfig {
        &self.config
    }

    pub(crate) const fn fixtures(&self) -> Option<&FixtureFetcher> {
        self.fixtures.as_ref()
    }

    /// URL parameters: type defaults overlaid with per-instance values
    #[must_use]
    pub const fn params(&self) -> &Options {
        &self.params
    }

    /// Accessor `name`, or [`EdslError::UnknownAccessor`]
    pub fn accessor(&self, name: &str) -> EdslResult<&Accessor> {
        self.ty
            .accessor(name)
            .ok_or_else(|| EdslError::UnknownAccessor {
                name: name.to_string(),
                container: self.ty.name.clone(),
            })
    }

    /// `name`
    pub fn read(&self, name: &str) -> EdslResult<Value> {
        self.accessor(name)?.read(self)
    }

    /// `name=`
    pub fn write(&self, name: &str, value: Value) -> EdslResult<()> {
        self.accessor(name)?.write(self, value)
    }

    /// `name?`
    pub fn present(&self, name: &str) -> EdslResult<bool> {
        self.accessor(name)?.present(self)
    }

    /// `name_element`
    pub fn element(&self, name: &str) -> EdslResult<Value> {
        self.accessor(name)?.resolve_element(self)
    }

    /// Whether `{name}=` would do something here
    #[must_use]
    pub fn has_writer(&self, name: &str) -> bool {
        self.ty
            .accessor(name)
            .is_some_and(Accessor::is_writable)
            || self.ty.methods.contains_key(&format!("{name}="))
    }

    /// Route `operation` through accessors, built-ins, explicit methods
    /// and finally the driver.
    pub fn dispatch(&self, operation: &str, args: &[Value]) -> EdslResult<Value> {
        if let Some((accessor, generated)) = self.ty.generated(operation) {
            return match generated {
                Generated::Read => accessor.read(self),
                Generated::Write => {
                    let value = single_arg(operation, args)?;
                    accessor.write(self, value.clone()).map(|()| Value::Null)
                }
                Generated::Present => accessor.present(self).map(Value::Bool),
                Generated::Element => accessor.resolve_element(self),
            };
        }
        if let Some(result) = self.builtin(operation, args) {
            return result;
        }
        if let Some(method) = self.ty.methods.get(operation) {
            trace!(container = %self.ty.name, operation, "explicit method");
            return method(self, args);
        }
        trace!(container = %self.ty.name, operation, "delegating to driver");
        self.driver.call(operation, args)
    }

    fn builtin(&self, operation: &str, args: &[Value]) -> Option<EdslResult<Value>> {
        let result = match operation {
            "populate_with" => single_arg(operation, args).and_then(|data| match data {
                Value::Map(data) => self.populate_with(data).map(|()| Value::Null),
                other => Err(EdslError::InvalidArguments {
                    operation: operation.to_string(),
                    message: format!("expected a mapping, got {}", other.kind()),
                }),
            }),
            "populate_key" => Ok(Value::Str(self.populate_key())),
            "fixture_fetch" => single_arg(operation, args).and_then(|key| match key.as_str() {
                Some(key) => self.fixture_fetch(key),
                None => Err(EdslError::InvalidArguments {
                    operation: operation.to_string(),
                    message: format!("expected a string key, got {}", key.kind()),
                }),
            }),
            "ready?" => Ok(Value::Bool(self.is_ready())),
            "browser" => self.browser().map(Value::Object),
            "goto" if self.ty.page_url.is_some() => self.goto(),
            "page_url_value" if self.ty.page_url.is_some() => self.page_url_value().map(Value::Str),
            _ => return None,
        };
        Some(result)
    }

    fn answers(&self, operation: &str) -> bool {
        self.ty.generated(operation).is_some()
            || matches!(
                operation,
                "populate_with" | "populate_key" | "fixture_fetch" | "ready?" | "browser"
            )
            || (self.ty.page_url.is_some() && matches!(operation, "goto" | "page_url_value"))
            || self.ty.methods.contains_key(operation)
            || self.driver.responds_to(operation)
    }

    /// Nearest ancestor (starting at the parent) matching `predicate`.
    ///
    /// `capability` names what is being looked for in the error.
    pub fn find_ancestor<P>(&self, capability: &str, predicate: P) -> EdslResult<Arc<Self>>
    where
        P: Fn(&Self) -> bool,
    {
        let mut current = self.parent();
        while let Some(container) = current {
            if predicate(container.as_ref()) {
                return Ok(container);
            }
            current = container.parent();
        }
        Err(EdslError::NoAncestor {
            capability: capability.to_string(),
            container: self.ty.name.clone(),
        })
    }

    /// The browser: a page's own driver, otherwise the driver of the
    /// nearest enclosing page.
    pub fn browser(&self) -> EdslResult<ObjectRef> {
        if self.kind() == ContainerKind::Page {
            return Ok(Arc::clone(&self.driver));
        }
        self.find_ancestor("a browser", |c| c.kind() == ContainerKind::Page)
            .map(|page| Arc::clone(page.driver()))
            .map_err(|_| EdslError::BrowserNotFound {
                container: self.ty.name.clone(),
            })
    }
}

fn single_arg<'a>(operation: &str, args: &'a [Value]) -> EdslResult<&'a Value> {
    match args {
        [value] => Ok(value),
        _ => Err(EdslError::InvalidArguments {
            operation: operation.to_string(),
            message: format!("expected 1 argument, got {}", args.len()),
        }),
    }
}

impl Dispatch for Container {
    fn type_name(&self) -> &str {
        &self.ty.name
    }

    fn call(&self, operation: &str, args: &[Value]) -> EdslResult<Value> {
        self.dispatch(operation, args)
    }

    fn responds_to(&self, operation: &str) -> bool {
        self.answers(operation)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};

    fn object(element: &Arc<MockElement>) -> Value {
        let object: ObjectRef = element.clone();
        Value::Object(object)
    }

    mod builder_tests {
        use super::*;

        #[test]
        fn test_accessor_order_and_kind() {
            let ty = ContainerType::page("LoginPage")
                .preset("text_field", "username", Options::new())
                .preset("text_field", "password", Options::new())
                .preset("button", "login", Options::new())
                .build()
                .unwrap();
            assert_eq!(ty.name(), "LoginPage");
            assert_eq!(ty.kind(), ContainerKind::Page);
            assert_eq!(ty.accessor_names(), ["username", "password", "login"]);
        }

        #[test]
        fn test_duplicate_accessor_rejected() {
            let err = ContainerType::builder("Dup")
                .element("a", AccessorOptions::new().how("div"))
                .preset("span", "a", Options::new())
                .build()
                .unwrap_err();
            assert!(matches!(
                err,
                EdslError::DuplicateAccessor { name, container } if name == "a" && container == "Dup"
            ));
        }

        #[test]
        fn test_unknown_preset_rejected() {
            let err = ContainerType::builder("P")
                .preset("blink", "x", Options::new())
                .build()
                .unwrap_err();
            assert!(matches!(err, EdslError::UnknownPreset { .. }));
        }

        #[test]
        fn test_missing_strategy_rejected() {
            let err = ContainerType::builder("P")
                .element("x", AccessorOptions::new().default_method("text"))
                .build()
                .unwrap_err();
            assert!(matches!(err, EdslError::MissingAccessStrategy { .. }));
        }

        #[test]
        fn test_custom_registry() {
            let registry = PresetRegistry::new().with_preset(
                "widget",
                AccessorOptions::new().how("widget").default_method("state"),
            );
            let ty = ContainerType::builder("P")
                .with_registry(Arc::new(registry))
                .preset("widget", "w", Options::new())
                .build()
                .unwrap();
            let el = MockElement::builder("w")
                .response("state", Value::from("on"))
                .build();
            let page = Container::new(ty, Arc::new(MockDriver::new().with_element("widget", el)));
            assert_eq!(page.read("w").unwrap(), Value::from("on"));
        }

        #[test]
        fn test_preset_shorthand_with_options() {
            let el = MockElement::new("u");
            let ty = ContainerType::page("LoginPage")
                .preset("text_field", "username", crate::options! { "id" => "u" })
                .build()
                .unwrap();
            let page = Container::new(
                ty,
                Arc::new(MockDriver::new().with_element("text_field", el.clone())),
            );
            let _ = page.read("username").unwrap();
            let driver = page.driver().as_any().downcast_ref::<MockDriver>().unwrap();
            assert_eq!(
                driver.log().calls_to("text_field")[0].args,
                vec![Value::Map(crate::options! { "id" => "u" })]
            );
            assert_eq!(el.log().count("value"), 1);
        }

        #[test]
        fn test_element_with_block() {
            let el = MockElement::new("found");
            let target = object(&el);
            let ty = ContainerType::builder("P")
                .element_with("x", AccessorOptions::new().how("div"), move |name, _, _| {
                    assert_eq!(name, "x");
                    Ok(target.clone())
                })
                .build()
                .unwrap();
            let page = Container::new(ty, Arc::new(MockDriver::new()));
            assert!(page.element("x").unwrap().is_same_object(&object(&el)));
        }
    }

    mod dispatch_tests {
        use super::*;

        fn login_page(driver: MockDriver) -> Arc<Container> {
            let ty = ContainerType::page("LoginPage")
                .preset("text_field", "username", Options::new())
                .preset("div", "banner", Options::new())
                .method("greet", |c, args| {
                    Ok(Value::from(format!(
                        "hello from {} with {}",
                        c.type_name(),
                        args.len()
                    )))
                })
                .build()
                .unwrap();
            Container::new(ty, Arc::new(driver))
        }

        #[test]
        fn test_generated_operations() {
            let el = MockElement::new("u");
            let page = login_page(MockDriver::new().with_element("text_field", el.clone()));
            let _ = page.dispatch("username=", &[Value::from("bob")]).unwrap();
            assert_eq!(page.dispatch("username", &[]).unwrap(), Value::from("bob"));
            assert_eq!(page.dispatch("username?", &[]).unwrap(), Value::Bool(true));
            assert!(page
                .dispatch("username_element", &[])
                .unwrap()
                .is_same_object(&object(&el)));
        }

        #[test]
        fn test_write_needs_one_argument() {
            let page = login_page(MockDriver::new().with_element("text_field", MockElement::new("u")));
            assert!(matches!(
                page.dispatch("username=", &[]),
                Err(EdslError::InvalidArguments { .. })
            ));
        }

        #[test]
        fn test_read_only_write_falls_to_driver() {
            let driver = MockDriver::new().with_response("banner=", Value::from("driver"));
            let page = login_page(driver);
            assert_eq!(
                page.dispatch("banner=", &[Value::from("x")]).unwrap(),
                Value::from("driver")
            );
            assert!(matches!(
                page.write("banner", Value::from("x")),
                Err(EdslError::ReadOnlyAccessor { .. })
            ));
        }

        #[test]
        fn test_explicit_method() {
            let page = login_page(MockDriver::new());
            assert_eq!(
                page.dispatch("greet", &[Value::Null]).unwrap(),
                Value::from("hello from LoginPage with 1")
            );
        }

        #[test]
        fn test_unknown_operation_goes_to_driver() {
            let page = login_page(MockDriver::new().with_response("title", Value::from("Login")));
            assert_eq!(page.dispatch("title", &[]).unwrap(), Value::from("Login"));
            assert!(matches!(
                page.dispatch("nope", &[]),
                Err(EdslError::UnsupportedOperation { .. })
            ));
        }

        #[test]
        fn test_responds_to() {
            let page = login_page(MockDriver::new().with_response("title", Value::Null));
            for op in ["username", "username=", "username?", "username_element", "greet", "title", "ready?"] {
                assert!(Dispatch::responds_to(&*page, op), "{op}");
            }
            assert!(!Dispatch::responds_to(&*page, "banner="));
            assert!(!Dispatch::responds_to(&*page, "nope"));
        }

        #[test]
        fn test_unknown_accessor() {
            let page = login_page(MockDriver::new());
            assert!(matches!(
                page.read("password"),
                Err(EdslError::UnknownAccessor { name, .. }) if name == "password"
            ));
        }

        #[test]
        fn test_as_value_is_identity() {
            let page = login_page(MockDriver::new());
            let a = page.as_value().unwrap();
            let b = page.as_value().unwrap();
            assert_eq!(a, b);
            assert!(a.downcast_ref::<Container>().is_some());
        }
    }

    mod section_tests {
        use super::*;

        fn search_box() -> Arc<ContainerType> {
            ContainerType::section("SearchBox")
                .preset("text_field", "query", Options::new())
                .build()
                .unwrap()
        }

        #[test]
        fn test_section_wraps_element_with_parent() {
            let root = MockElement::new("search-root");
            let home = ContainerType::page("HomePage")
                .section("search", search_box(), Options::new())
                .build()
                .unwrap();
            let driver = MockDriver::new().with_element("div", root.clone());
            let page = Container::new(home, Arc::new(driver));

            let section = page.read("search").unwrap();
            let section = section.downcast_ref::<Container>().unwrap();
            assert_eq!(section.type_name(), "SearchBox");
            assert_eq!(section.kind(), ContainerKind::Section);
            assert!(Arc::ptr_eq(&section.parent().unwrap(), &page));
            let root_value: ObjectRef = root;
            assert!(crate::value::same_object(section.driver(), &root_value));
        }

        #[test]
        fn test_section_write_populates() {
            let field = MockElement::new("q");
            let root = MockElement::builder("search-root")
                .child("text_field", field.clone())
                .build();
            let home = ContainerType::page("HomePage")
                .section("search", search_box(), Options::new())
                .build()
                .unwrap();
            let page = Container::new(home, Arc::new(MockDriver::new().with_element("div", root)));

            page.write("search", Value::Map(crate::options! { "query" => "rust" }))
                .unwrap();
            assert_eq!(field.value(), Value::from("rust"));
        }

        #[test]
        fn test_section_strategy_override() {
            let root = MockElement::new("nav");
            let home = ContainerType::page("HomePage")
                .section("nav", search_box(), AccessorOptions::new().how("nav"))
                .build()
                .unwrap();
            let page = Container::new(home, Arc::new(MockDriver::new().with_element("nav", root)));
            assert!(page.read("nav").unwrap().downcast_ref::<Container>().is_some());
        }

        #[test]
        fn test_sections_list() {
            let first = MockElement::new("r1");
            let second = MockElement::new("r2");
            let items: Vec<Value> = vec![object(&first), object(&second)];
            let row = ContainerType::section("Row").build().unwrap();
            let table = ContainerType::page("TablePage")
                .sections("rows", row, "trs", crate::options! { "class" => "row" }, Options::new())
                .build()
                .unwrap();
            let driver = MockDriver::new().with_response("trs", Value::List(items));
            let page = Container::new(table, Arc::new(driver));

            let rows = page.read("rows").unwrap();
            let rows = rows.as_list().unwrap();
            assert_eq!(rows.len(), 2);
            for row in rows {
                let row = row.downcast_ref::<Container>().unwrap();
                assert_eq!(row.type_name(), "Row");
                assert!(Arc::ptr_eq(&row.parent().unwrap(), &page));
            }
            let driver = page.driver().as_any().downcast_ref::<MockDriver>().unwrap();
            assert_eq!(
                driver.log().calls_to("trs")[0].args,
                vec![Value::Map(crate::options! { "class" => "row" })]
            );
        }

        #[test]
        fn test_sections_none_found() {
            let row = ContainerType::section("Row").build().unwrap();
            let table = ContainerType::page("TablePage")
                .sections("rows", row, "trs", Options::new(), Options::new())
                .build()
                .unwrap();
            let page = Container::new(table, Arc::new(MockDriver::new().with_response("trs", Value::Null)));
            assert_eq!(page.read("rows").unwrap(), Value::List(Vec::new()));
        }

        #[test]
        fn test_children_inherit_config() {
            let home = ContainerType::page("HomePage")
                .section("search", search_box(), Options::new())
                .build()
                .unwrap();
            let config = EdslConfig::new().with_poll_interval_ms(7);
            let page = Container::with_options(
                home,
                Arc::new(MockDriver::new().with_element("div", MockElement::new("root"))),
                ContainerOptions::new().with_config(config.clone()),
            );
            let section = page.read("search").unwrap();
            assert_eq!(section.downcast_ref::<Container>().unwrap().config(), &config);
        }
    }

    mod ancestor_tests {
        use super::*;

        fn nested() -> (Arc<Container>, Arc<Container>, Arc<Container>) {
            let leaf_ty = ContainerType::section("Leaf").build().unwrap();
            let mid_ty = ContainerType::section("Mid").build().unwrap();
            let page_ty = ContainerType::page("Root").build().unwrap();
            let page = Container::new(page_ty, Arc::new(MockDriver::named("browser")));
            let mid = page.child(&mid_ty, MockElement::new("mid"));
            let leaf = mid.child(&leaf_ty, MockElement::new("leaf"));
            (page, mid, leaf)
        }

        #[test]
        fn test_browser_found_through_ancestors() {
            let (page, _mid, leaf) = nested();
            let browser = leaf.browser().unwrap();
            assert!(crate::value::same_object(&browser, page.driver()));
            assert_eq!(browser.type_name(), "browser");
        }

        #[test]
        fn test_instance_kind_follows_type() {
            let (page, mid, leaf) = nested();
            assert_eq!(page.kind(), ContainerKind::Page);
            assert_eq!(mid.kind(), ContainerKind::Section);
            assert_eq!(leaf.kind(), leaf.container_type().kind());
        }

        #[test]
        fn test_page_browser_is_driver() {
            let (page, _, _) = nested();
            assert!(crate::value::same_object(&page.browser().unwrap(), page.driver()));
        }

        #[test]
        fn test_browser_missing() {
            let orphan_ty = ContainerType::section("Orphan").build().unwrap();
            let orphan = Container::new(orphan_ty, MockElement::new("root"));
            assert!(matches!(
                orphan.browser(),
                Err(EdslError::BrowserNotFound { container }) if container == "Orphan"
            ));
        }

        #[test]
        fn test_find_ancestor_by_name() {
            let (_page, mid, leaf) = nested();
            let found = leaf.find_ancestor("Mid", |c| c.type_name() == "Mid").unwrap();
            assert!(Arc::ptr_eq(&found, &mid));
            assert!(matches!(
                leaf.find_ancestor("Leaf", |c| c.type_name() == "Leaf"),
                Err(EdslError::NoAncestor { .. })
            ));
        }

        #[test]
        fn test_parent_link_does_not_own() {
            let (page, mid, _leaf) = nested();
            drop(page);
            assert!(mid.parent().is_none());
            assert!(matches!(mid.browser(), Err(EdslError::BrowserNotFound { .. })));
        }

        #[test]
        fn test_browser_builtin() {
            let (page, _mid, leaf) = nested();
            let browser = leaf.dispatch("browser", &[]).unwrap();
            let page_driver = Value::Object(Arc::clone(page.driver()));
            assert!(browser.is_same_object(&page_driver));
        }
    }
}
