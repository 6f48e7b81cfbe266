//! Recording test doubles for drivers and elements
//!
//! [`MockDriver`] and [`MockElement`] stand in for a real automation
//! backend so page objects can be exercised without a browser. Every call
//! they receive is appended to a [`CallLog`], which can be shared between
//! several doubles to assert on the interleaving of calls.
//!
//! ## Example
//!
//! ```
//! use edsl::mock::{MockDriver, MockElement};
//! use edsl::{Container, ContainerType, Value};
//! use std::sync::Arc;
//!
//! let field = MockElement::new("username");
//! let driver = MockDriver::new().with_element("text_field", field.clone());
//!
//! let login = ContainerType::page("LoginPage")
//!     .preset("text_field", "username", edsl::options! { "id" => "u" })
//!     .build()
//!     .unwrap();
//! let page = Container::new(login, Arc::new(driver));
//!
//! page.write("username", Value::from("bob")).unwrap();
//! assert_eq!(page.read("username").unwrap(), Value::from("bob"));
//! ```

use crate::result::{EdslError, EdslResult};
use crate::value::{Dispatch, ObjectRef, Value};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Handler invoked for an operation: `args -> result`
pub type MockHandler = Arc<dyn Fn(&[Value]) -> EdslResult<Value> + Send + Sync>;

/// One recorded invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Name of the double that received the call
    pub target: String,
    /// Operation name
    pub operation: String,
    /// Arguments as received
    pub args: Vec<Value>,
}

impl RecordedCall {
    /// `target.operation`, handy for order assertions
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}.{}", self.target, self.operation)
    }
}

/// Shared, append-only call log
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call
    pub fn record(&self, target: &str, operation: &str, args: &[Value]) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                target: target.to_string(),
                operation: operation.to_string(),
                args: args.to_vec(),
            });
    }

    /// Snapshot of every call so far
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `target.operation` labels in call order
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.calls().iter().map(RecordedCall::label).collect()
    }

    /// Calls of one operation, on any target
    #[must_use]
    pub fn calls_to(&self, operation: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation == operation)
            .collect()
    }

    /// Number of calls of one operation
    #[must_use]
    pub fn count(&self, operation: &str) -> usize {
        self.calls_to(operation).len()
    }

    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Canned responses and handlers shared by both doubles
#[derive(Default)]
struct Script {
    responses: HashMap<String, Value>,
    handlers: HashMap<String, MockHandler>,
}

impl Script {
    fn knows(&self, operation: &str) -> bool {
        self.handlers.contains_key(operation) || self.responses.contains_key(operation)
    }

    fn run(&self, operation: &str, args: &[Value]) -> Option<EdslResult<Value>> {
        if let Some(handler) = self.handlers.get(operation) {
            return Some(handler(args));
        }
        self.responses.get(operation).cloned().map(Ok)
    }

    fn operations(&self) -> Vec<&str> {
        self.responses
            .keys()
            .chain(self.handlers.keys())
            .map(String::as_str)
            .collect()
    }
}

fn unsupported(object: &str, operation: &str) -> EdslError {
    EdslError::UnsupportedOperation {
        object: object.to_string(),
        operation: operation.to_string(),
    }
}

/// Driver double: answers element lookups and arbitrary scripted calls.
pub struct MockDriver {
    name: String,
    script: Script,
    log: CallLog,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDriver")
            .field("name", &self.name)
            .field("operations", &self.script.operations())
            .finish()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::named("driver")
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Script::default(),
            log: CallLog::new(),
        }
    }

    /// Record into a shared log
    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Answer `operation` with this element, whatever the options
    #[must_use]
    pub fn with_element(self, operation: impl Into<String>, element: Arc<MockElement>) -> Self {
        let element: ObjectRef = element;
        self.with_response(operation, Value::Object(element))
    }

    /// Answer `operation` with a fixed value
    #[must_use]
    pub fn with_response(mut self, operation: impl Into<String>, value: Value) -> Self {
        let _ = self.script.responses.insert(operation.into(), value);
        self
    }

    /// Answer `operation` by running a handler
    #[must_use]
    pub fn with_handler<F>(mut self, operation: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[Value]) -> EdslResult<Value> + Send + Sync + 'static,
    {
        let _ = self
            .script
            .handlers
            .insert(operation.into(), Arc::new(handler));
        self
    }

    #[must_use]
    pub const fn log(&self) -> &CallLog {
        &self.log
    }
}

impl Dispatch for MockDriver {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn call(&self, operation: &str, args: &[Value]) -> EdslResult<Value> {
        self.log.record(&self.name, operation, args);
        self.script
            .run(operation, args)
            .unwrap_or_else(|| Err(unsupported(&self.name, operation)))
    }

    fn responds_to(&self, operation: &str) -> bool {
        self.script.knows(operation)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone)]
struct ElementState {
    text: String,
    value: Value,
    checked: bool,
    present: bool,
}

/// Element double with the usual text / value / set / click / presence
/// contract, plus scripted extras.
///
/// `set(v)` stores `v` as the value (and as the checked state when `v` is
/// a bool); `value` returns it.
pub struct MockElement {
    name: String,
    state: Mutex<ElementState>,
    script: Script,
    log: CallLog,
}

impl fmt::Debug for MockElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockElement")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

/// Operations every [`MockElement`] understands
pub const ELEMENT_OPERATIONS: &[&str] = &["text", "value", "set", "set?", "click", "present?"];

impl MockElement {
    /// New present element with empty text and value
    #[must_use]
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::builder(name).build()
    }

    /// Start configuring an element
    #[must_use]
    pub fn builder(name: impl Into<String>) -> MockElementBuilder {
        MockElementBuilder {
            name: name.into(),
            state: ElementState {
                text: String::new(),
                value: Value::Null,
                checked: false,
                present: true,
            },
            script: Script::default(),
            log: CallLog::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn log(&self) -> &CallLog {
        &self.log
    }

    /// Current value as last `set`
    #[must_use]
    pub fn value(&self) -> Value {
        self.state().value
    }

    pub fn set_present(&self, present: bool) {
        self.lock_state().present = present;
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.lock_state().text = text.into();
    }

    fn state(&self) -> ElementState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ElementState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Dispatch for MockElement {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn call(&self, operation: &str, args: &[Value]) -> EdslResult<Value> {
        self.log.record(&self.name, operation, args);
        if let Some(result) = self.script.run(operation, args) {
            return result;
        }
        match operation {
            "text" => Ok(Value::Str(self.state().text)),
            "value" => Ok(self.state().value),
            "set?" => Ok(Value::Bool(self.state().checked)),
            "present?" => Ok(Value::Bool(self.state().present)),
            "click" => Ok(Value::Null),
            "set" => {
                let value = args.first().cloned().unwrap_or(Value::Bool(true));
                let mut state = self.lock_state();
                if let Value::Bool(checked) = value {
                    state.checked = checked;
                }
                state.value = value;
                Ok(Value::Null)
            }
            _ => Err(unsupported(&self.name, operation)),
        }
    }

    fn responds_to(&self, operation: &str) -> bool {
        ELEMENT_OPERATIONS.contains(&operation) || self.script.knows(operation)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builder for [`MockElement`]
pub struct MockElementBuilder {
    name: String,
    state: ElementState,
    script: Script,
    log: CallLog,
}

impl fmt::Debug for MockElementBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockElementBuilder")
            .field("name", &self.name)
            .finish()
    }
}

impl MockElementBuilder {
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.state.text = text.into();
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.state.value = value.into();
        self
    }

    #[must_use]
    pub const fn checked(mut self, checked: bool) -> Self {
        self.state.checked = checked;
        self
    }

    #[must_use]
    pub const fn present(mut self, present: bool) -> Self {
        self.state.present = present;
        self
    }

    /// Record into a shared log
    #[must_use]
    pub fn log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Answer `operation` with a fixed value (overrides built-ins)
    #[must_use]
    pub fn response(mut self, operation: impl Into<String>, value: Value) -> Self {
        let _ = self.script.responses.insert(operation.into(), value);
        self
    }

    /// Answer `operation` with a child element
    #[must_use]
    pub fn child(self, operation: impl Into<String>, element: Arc<MockElement>) -> Self {
        let element: ObjectRef = element;
        self.response(operation, Value::Object(element))
    }

    /// Answer `operation` by running a handler (overrides built-ins)
    #[must_use]
    pub fn handler<F>(mut self, operation: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[Value]) -> EdslResult<Value> + Send + Sync + 'static,
    {
        let _ = self
            .script
            .handlers
            .insert(operation.into(), Arc::new(handler));
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<MockElement> {
        Arc::new(MockElement {
            name: self.name,
            state: Mutex::new(self.state),
            script: self.script,
            log: self.log,
        })
    }
}
