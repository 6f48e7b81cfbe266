//! Accessor synthesis
//!
//! [`synthesize`] turns one [`AccessorSpec`] into an [`Accessor`]: four
//! bound behaviors stored in the owning type's accessor table and invoked
//! against a live [`Container`].
//!
//! | behavior          | generated name  |
//! |-------------------|-----------------|
//! | `read`            | `name`          |
//! | `write`           | `name=`         |
//! | `present`         | `name?`         |
//! | `resolve_element` | `name_element`  |
//!
//! Element resolution runs: custom block, then the access strategy
//! (function or driver dispatch), then the wrapper, then hook decoration.
//! Function behaviors for read/write/presence skip resolution entirely.

use crate::accessor_spec::{AccessorSpec, Behavior};
use crate::container::Container;
use crate::hooks;
use crate::result::{EdslError, EdslResult};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Bound element resolution or read: `container -> value`
pub type ResolveFn = Arc<dyn Fn(&Container) -> EdslResult<Value> + Send + Sync>;

/// Bound write: `(container, value)`
pub type WriteFn = Arc<dyn Fn(&Container, Value) -> EdslResult<()> + Send + Sync>;

/// Bound presence check: `container -> present`
pub type PresentFn = Arc<dyn Fn(&Container) -> EdslResult<bool> + Send + Sync>;

/// The generated behaviors of one accessor
#[derive(Clone)]
pub struct Accessor {
    spec: Arc<AccessorSpec>,
    resolve_element: ResolveFn,
    read: ResolveFn,
    write: Option<WriteFn>,
    present: PresentFn,
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("name", &self.spec.name())
            .field("writable", &self.write.is_some())
            .finish()
    }
}

impl Accessor {
    #[must_use]
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    #[must_use]
    pub fn spec(&self) -> &AccessorSpec {
        &self.spec
    }

    /// Whether a `name=` behavior was generated
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.write.is_some()
    }

    /// `name_element`: the resolved, wrapped and decorated element
    pub fn resolve_element(&self, container: &Container) -> EdslResult<Value> {
        trace!(accessor = self.name(), container = container.type_name(), "resolve element");
        (self.resolve_element)(container)
    }

    /// `name`
    pub fn read(&self, container: &Container) -> EdslResult<Value> {
        trace!(accessor = self.name(), container = container.type_name(), "read");
        (self.read)(container)
    }

    /// `name=`
    pub fn write(&self, container: &Container, value: Value) -> EdslResult<()> {
        trace!(accessor = self.name(), container = container.type_name(), "write");
        match &self.write {
            Some(write) => write(container, value),
            None => Err(EdslError::ReadOnlyAccessor {
                name: self.name().to_string(),
                container: container.type_name().to_string(),
            }),
        }
    }

    /// `name?`
    pub fn present(&self, container: &Container) -> EdslResult<bool> {
        trace!(accessor = self.name(), container = container.type_name(), "present");
        (self.present)(container)
    }
}

/// Build the bound behaviors for `spec`.
#[must_use]
pub fn synthesize(spec: AccessorSpec) -> Accessor {
    debug!(
        accessor = spec.name(),
        strategy = ?spec.access_strategy(),
        writable = spec.assign_behavior().is_some(),
        hooks = spec.hooks().map_or(0, |hooks| hooks.len()),
        "synthesizing accessor"
    );
    let spec = Arc::new(spec);
    let resolve_element = resolver(&spec);
    Accessor {
        read: reader(&spec, &resolve_element),
        write: writer(&spec, &resolve_element),
        present: presence(&spec, &resolve_element),
        resolve_element,
        spec,
    }
}

fn resolver(spec: &Arc<AccessorSpec>) -> ResolveFn {
    let spec = Arc::clone(spec);
    Arc::new(move |container: &Container| {
        let name = spec.name();
        let options = spec.extra_options();

        let mut element = match spec.locate_block() {
            Some(block) => block(name, container, options)?,
            None => Value::Null,
        };
        if element.is_null() {
            element = match spec.access_strategy() {
                Behavior::Function(locate) => locate(name, container, options)?,
                Behavior::Dispatch(operation) => container
                    .driver()
                    .call(operation, &[Value::Map(options.clone())])?,
            };
        }
        if element.is_null() {
            trace!(accessor = name, container = container.type_name(), "element not resolved");
            return Ok(Value::Null);
        }

        if let Some(wrap) = spec.wrapper() {
            element = wrap(element, container)?;
        }
        match spec.hooks() {
            Some(hooks) => hooks::decorate(element, hooks, container),
            None => Ok(element),
        }
    })
}

fn reader(spec: &Arc<AccessorSpec>, resolve: &ResolveFn) -> ResolveFn {
    let spec = Arc::clone(spec);
    let resolve = Arc::clone(resolve);
    Arc::new(move |container: &Container| match spec.default_behavior() {
        Some(Behavior::Function(read)) => read(spec.name(), container),
        Some(Behavior::Dispatch(operation)) => {
            let element = resolve(container)?;
            dispatch_on(&element, operation, &[], spec.name(), container)
        }
        None => resolve(container),
    })
}

fn writer(spec: &Arc<AccessorSpec>, resolve: &ResolveFn) -> Option<WriteFn> {
    let assign = spec.assign_behavior()?.clone();
    let spec = Arc::clone(spec);
    let resolve = Arc::clone(resolve);
    Some(Arc::new(move |container: &Container, value: Value| match &assign {
        Behavior::Function(write) => write(spec.name(), container, value),
        Behavior::Dispatch(operation) => {
            let element = resolve(container)?;
            dispatch_on(&element, operation, &[value], spec.name(), container).map(drop)
        }
    }))
}

fn presence(spec: &Arc<AccessorSpec>, resolve: &ResolveFn) -> PresentFn {
    let spec = Arc::clone(spec);
    let resolve = Arc::clone(resolve);
    Arc::new(move |container: &Container| match spec.presence_behavior() {
        Behavior::Function(present) => present(spec.name(), container),
        Behavior::Dispatch(operation) => {
            let element = resolve(container)?;
            dispatch_on(&element, operation, &[], spec.name(), container)
                .map(|answer| answer.is_truthy())
        }
    })
}

/// Send `operation` to a resolved element, naming the accessor when the
/// element never resolved.
fn dispatch_on(
    element: &Value,
    operation: &str,
    args: &[Value],
    accessor: &str,
    container: &Container,
) -> EdslResult<Value> {
    if element.is_null() {
        return Err(EdslError::ElementNotFound {
            accessor: accessor.to_string(),
            container: container.type_name().to_string(),
        });
    }
    element.call(operation, args)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::accessor_spec::AccessorOptions;
    use crate::container::ContainerType;
    use crate::mock::{MockDriver, MockElement};
    use crate::value::{ObjectRef, Options};

    fn page(driver: MockDriver) -> Arc<Container> {
        let ty = ContainerType::builder("SynthPage").build().unwrap();
        Container::new(ty, Arc::new(driver))
    }

    fn object(element: &Arc<MockElement>) -> Value {
        let object: ObjectRef = element.clone();
        Value::Object(object)
    }

    fn accessor(options: AccessorOptions) -> Accessor {
        synthesize(options.into_spec("test_div").unwrap())
    }

    mod resolution_tests {
        use super::*;

        #[test]
        fn test_dispatch_strategy_passes_extra_options() {
            let el = MockElement::new("el");
            let driver = MockDriver::new().with_element("link", el.clone());
            let container = page(driver);
            let acc = accessor(AccessorOptions::new().how("link").option("id", "foo"));

            let resolved = acc.resolve_element(&container).unwrap();
            assert!(resolved.is_same_object(&object(&el)));

            let driver = container.driver().as_any().downcast_ref::<MockDriver>().unwrap();
            let lookup = &driver.log().calls_to("link")[0];
            assert_eq!(
                lookup.args,
                vec![Value::Map(crate::options! { "id" => "foo" })]
            );
        }

        #[test]
        fn test_function_strategy_receives_name_container_options() {
            let el = MockElement::new("el");
            let target = object(&el);
            let acc = accessor(AccessorOptions::new().option("id", "foo").how_fn(
                move |name, container, options| {
                    assert_eq!(name, "test_div");
                    assert_eq!(container.type_name(), "SynthPage");
                    assert_eq!(options.get("id"), Some(&Value::from("foo")));
                    Ok(target.clone())
                },
            ));
            let resolved = acc.resolve_element(&page(MockDriver::new())).unwrap();
            assert!(resolved.is_same_object(&object(&el)));
        }

        #[test]
        fn test_locate_block_wins_when_non_null() {
            let from_block = MockElement::new("block");
            let from_driver = MockElement::new("driver");
            let target = object(&from_block);
            let acc = accessor(
                AccessorOptions::new()
                    .how("div")
                    .locate_with(move |_, _, _| Ok(target.clone())),
            );
            let container = page(MockDriver::new().with_element("div", from_driver));
            let resolved = acc.resolve_element(&container).unwrap();
            assert!(resolved.is_same_object(&object(&from_block)));
        }

        #[test]
        fn test_locate_block_null_falls_through() {
            let el = MockElement::new("el");
            let acc = accessor(
                AccessorOptions::new()
                    .how("div")
                    .locate_with(|_, _, _| Ok(Value::Null)),
            );
            let container = page(MockDriver::new().with_element("div", el.clone()));
            let resolved = acc.resolve_element(&container).unwrap();
            assert!(resolved.is_same_object(&object(&el)));
        }

        #[test]
        fn test_wrapper_applied() {
            let el = MockElement::new("el");
            let acc = accessor(AccessorOptions::new().how("div").wrapper(|element, _| {
                Ok(Value::List(vec![element]))
            }));
            let container = page(MockDriver::new().with_element("div", el.clone()));
            let resolved = acc.read(&container).unwrap();
            let items = resolved.as_list().unwrap();
            assert!(items[0].is_same_object(&object(&el)));
        }

        #[test]
        fn test_null_resolution_skips_wrapper() {
            let acc = accessor(
                AccessorOptions::new()
                    .how("div")
                    .wrapper(|_, _| Err(EdslError::custom("wrapper should not run"))),
            );
            let container = page(MockDriver::new().with_response("div", Value::Null));
            assert_eq!(acc.resolve_element(&container).unwrap(), Value::Null);
        }
    }

    mod read_tests {
        use super::*;

        #[test]
        fn test_read_without_default_returns_element() {
            let el = MockElement::new("el");
            let acc = accessor(AccessorOptions::new().how("link"));
            let container = page(MockDriver::new().with_element("link", el.clone()));
            assert!(acc.read(&container).unwrap().is_same_object(&object(&el)));
        }

        #[test]
        fn test_read_dispatches_default_method() {
            let el = MockElement::builder("el").text("text").build();
            let acc = accessor(AccessorOptions::new().how("div").default_method("text"));
            let container = page(MockDriver::new().with_element("div", el.clone()));
            assert_eq!(acc.read(&container).unwrap(), Value::from("text"));
            assert_eq!(el.log().count("text"), 1);
        }

        #[test]
        fn test_read_function_bypasses_resolution() {
            let acc = accessor(
                AccessorOptions::new()
                    .how("div")
                    .default_fn(|name, _| Ok(Value::from(format!("{name}!")))),
            );
            let container = page(MockDriver::new());
            assert_eq!(acc.read(&container).unwrap(), Value::from("test_div!"));
            let driver = container.driver().as_any().downcast_ref::<MockDriver>().unwrap();
            assert!(driver.log().calls().is_empty());
        }

        #[test]
        fn test_read_function_can_reach_element() {
            let el = MockElement::builder("el")
                .response("default_method", Value::from("default"))
                .build();
            let acc = accessor(AccessorOptions::new().how("div").default_fn(|name, container| {
                container.element(name)?.call("default_method", &[])
            }));
            let ty = ContainerType::builder("SynthPage")
                .element(
                    "test_div",
                    AccessorOptions::new().how("div"),
                )
                .build()
                .unwrap();
            let container = Container::new(ty, Arc::new(MockDriver::new().with_element("div", el)));
            assert_eq!(acc.read(&container).unwrap(), Value::from("default"));
        }

        #[test]
        fn test_read_on_missing_element_names_accessor() {
            let acc = accessor(AccessorOptions::new().how("div").default_method("text"));
            let container = page(MockDriver::new().with_response("div", Value::Null));
            let err = acc.read(&container).unwrap_err();
            match err {
                EdslError::ElementNotFound {
                    accessor,
                    container,
                } => {
                    assert_eq!(accessor, "test_div");
                    assert_eq!(container, "SynthPage");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    mod write_tests {
        use super::*;
        use std::sync::Mutex;

        #[test]
        fn test_no_assign_means_read_only() {
            let acc = accessor(AccessorOptions::new().how("div"));
            assert!(!acc.is_writable());
            let err = acc.write(&page(MockDriver::new()), Value::from("x")).unwrap_err();
            assert!(matches!(err, EdslError::ReadOnlyAccessor { .. }));
        }

        #[test]
        fn test_write_dispatches_assign_method() {
            let el = MockElement::new("el");
            let acc = accessor(AccessorOptions::new().how("div").assign_method("set"));
            let container = page(MockDriver::new().with_element("div", el.clone()));
            acc.write(&container, Value::from("test")).unwrap();
            assert_eq!(el.log().calls_to("set")[0].args, vec![Value::from("test")]);
        }

        #[test]
        fn test_write_function_receives_value() {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = seen.clone();
            let acc = accessor(AccessorOptions::new().how("div").assign_fn(
                move |name, _, value| {
                    sink.lock().unwrap().push((name.to_string(), value));
                    Ok(())
                },
            ));
            let container = page(MockDriver::new());
            acc.write(&container, Value::from("test")).unwrap();
            assert_eq!(
                *seen.lock().unwrap(),
                vec![("test_div".to_string(), Value::from("test"))]
            );
        }

        #[test]
        fn test_round_trip_goes_through_element() {
            let el = MockElement::new("el");
            let acc = accessor(
                AccessorOptions::new()
                    .how("text_field")
                    .default_method("value")
                    .assign_method("set"),
            );
            let container = page(MockDriver::new().with_element("text_field", el.clone()));
            acc.write(&container, Value::from("bob")).unwrap();
            assert_eq!(acc.read(&container).unwrap(), Value::from("bob"));
            assert_eq!(el.log().count("value"), 1);
        }
    }

    mod presence_tests {
        use super::*;

        #[test]
        fn test_default_presence_uses_present() {
            let el = MockElement::builder("el").present(false).build();
            let acc = accessor(AccessorOptions::new().how("div"));
            let container = page(MockDriver::new().with_element("div", el.clone()));
            assert!(!acc.present(&container).unwrap());
            el.set_present(true);
            assert!(acc.present(&container).unwrap());
            assert_eq!(el.log().count("present?"), 2);
        }

        #[test]
        fn test_presence_method_override() {
            let el = MockElement::builder("el")
                .response("is_here?", Value::Bool(true))
                .present(false)
                .build();
            let acc = accessor(AccessorOptions::new().how("div").presence_method("is_here?"));
            let container = page(MockDriver::new().with_element("div", el.clone()));
            assert!(acc.present(&container).unwrap());
            assert_eq!(el.log().count("present?"), 0);
        }

        #[test]
        fn test_presence_function_override() {
            let acc = accessor(
                AccessorOptions::new()
                    .how("div")
                    .presence_fn(|name, _| Ok(name == "test_div")),
            );
            assert!(acc.present(&page(MockDriver::new())).unwrap());
        }

        #[test]
        fn test_presence_on_missing_element_fails() {
            let acc = accessor(AccessorOptions::new().how("div"));
            let container = page(MockDriver::new().with_response("div", Value::Null));
            assert!(matches!(
                acc.present(&container),
                Err(EdslError::ElementNotFound { .. })
            ));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_strategy_only_read_is_identity(
                name in "[a-z_][a-z0-9_]{0,12}",
                key in "[a-z]{1,8}",
                val in "[a-z0-9]{0,8}",
            ) {
                let el = MockElement::new("el");
                let spec = AccessorOptions::new()
                    .how("div")
                    .options(Options::new().with(key, val))
                    .into_spec(name)
                    .unwrap();
                let acc = synthesize(spec);
                let container = page(MockDriver::new().with_element("div", el.clone()));
                prop_assert!(acc.read(&container).unwrap().is_same_object(&object(&el)));
            }

            #[test]
            fn prop_write_then_read_round_trips(text in ".{0,24}") {
                let el = MockElement::new("el");
                let acc = accessor(
                    AccessorOptions::new()
                        .how("text_field")
                        .default_method("value")
                        .assign_method("set"),
                );
                let container = page(MockDriver::new().with_element("text_field", el));
                acc.write(&container, Value::from(text.clone())).unwrap();
                prop_assert_eq!(acc.read(&container).unwrap(), Value::from(text));
            }
        }
    }
}
