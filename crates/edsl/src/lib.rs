//! EDSL: declarative page objects
//!
//! Page objects declare named accessors once; each declaration is compiled
//! into four behaviors stored in the type's accessor table:
//!
//! | operation       | behavior                                        |
//! |-----------------|-------------------------------------------------|
//! | `name`          | read (default behavior, or the element itself)  |
//! | `name=`         | write (only when an assign behavior exists)     |
//! | `name?`         | presence check (`present?` unless overridden)   |
//! | `name_element`  | the located, wrapped and hooked element         |
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Preset       │──►│ Accessor     │──►│ Synthesis    │──►│ Container    │
//! │ Registry     │   │ Spec         │   │ (4 closures) │   │ Type table   │
//! └──────────────┘   └──────────────┘   └──────┬───────┘   └──────┬───────┘
//!                                              │ hooks            │ unknown calls
//!                                       ┌──────▼───────┐   ┌──────▼───────┐
//!                                       │ HookedElement│   │ Driver object│
//!                                       └──────────────┘   └──────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use edsl::mock::{MockDriver, MockElement};
//! use edsl::prelude::*;
//! use std::sync::Arc;
//!
//! let login = ContainerType::page("LoginPage")
//!     .preset("text_field", "username", edsl::options! { "id" => "user" })
//!     .preset("checkbox", "remember_me", Options::new())
//!     .build()
//!     .unwrap();
//!
//! let driver = MockDriver::new()
//!     .with_element("text_field", MockElement::new("user"))
//!     .with_element("checkbox", MockElement::new("remember"));
//! let page = Container::new(login, Arc::new(driver));
//!
//! page.populate_with(&edsl::options! {
//!     "login_page" => edsl::options! { "username" => "bob", "remember_me" => true },
//! })
//! .unwrap();
//! assert_eq!(page.read("username").unwrap(), Value::from("bob"));
//! assert_eq!(page.read("remember_me").unwrap(), Value::Bool(true));
//! ```

#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Accessor options, specs and the dispatch-or-function behavior variant
#[allow(clippy::missing_const_for_fn)]
pub mod accessor_spec;
/// Runtime configuration
pub mod config;
#[allow(clippy::missing_const_for_fn, clippy::too_many_lines)]
mod container;
/// Fixture data lookup and fixture files
pub mod fixture;
/// Hook decoration: before/after call chains around element operations
pub mod hooks;
/// Tracing subscriber installation
pub mod logging;
/// Recording driver and element doubles
pub mod mock;
mod navigation;
mod page;
mod population;
/// Named accessor presets
pub mod presets;
mod result;
/// Accessor synthesis
pub mod synthesis;
mod value;
/// Blocking wait mechanism
pub mod wait;

pub use accessor_spec::{
    AccessStrategy, AccessorOptions, AccessorSpec, AssignBehavior, Behavior, DefaultBehavior,
    PresenceBehavior, DEFAULT_PRESENCE_OPERATION,
};
pub use config::EdslConfig;
pub use container::{
    Container, ContainerKind, ContainerOptions, ContainerType, ContainerTypeBuilder, MethodFn,
    ReadyFn,
};
pub use fixture::{FixtureData, FixtureFetcher};
pub use hooks::{CallChain, CallStep, Hook, HookSet, HookedElement, ReceiverSource, Trigger};
pub use navigation::Navigator;
pub use page::PageUrl;
pub use population::snake_case;
pub use presets::PresetRegistry;
pub use result::{EdslError, EdslResult};
pub use synthesis::{synthesize, Accessor};
pub use value::{same_object, Dispatch, ObjectRef, Options, Value};

/// Everything needed to declare and use page objects
pub mod prelude {
    pub use super::accessor_spec::{AccessorOptions, AccessorSpec, Behavior};
    pub use super::config::EdslConfig;
    pub use super::container::{
        Container, ContainerKind, ContainerOptions, ContainerType, ContainerTypeBuilder,
    };
    pub use super::fixture::{FixtureData, FixtureFetcher};
    pub use super::hooks::{ArgSource, CallChain, CallStep, HookSet, ReceiverSource, Trigger};
    pub use super::navigation::Navigator;
    pub use super::presets::PresetRegistry;
    pub use super::result::{EdslError, EdslResult};
    pub use super::value::{Dispatch, ObjectRef, Options, Value};
}
