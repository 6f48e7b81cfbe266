//! Element hooks
//!
//! A [`HookSet`] attaches call chains to named operations of a resolved
//! element. Each chain runs before or after the real operation:
//!
//! ```text
//! before[0] .. before[n]  ->  element.op(args)  ->  after[0] .. after[n]
//! ```
//!
//! Hook sets are declared once alongside the accessor and never mutated.
//! Decorating an element binds a clone of the set to the live container;
//! receivers and arguments are resolved at the moment a hooked operation
//! fires, so deferred sources see the state of that call.
//!
//! ## Example
//!
//! ```
//! use edsl::hooks::{ArgSource, CallStep, HookSet, ReceiverSource};
//!
//! let hooks = HookSet::new()
//!     .before("click", CallStep::call("scroll_into_view"))
//!     .after(
//!         "click",
//!         CallStep::call("wait_for_ajax").using(ReceiverSource::Parent),
//!     )
//!     .after("set", CallStep::call("log_change").with(ArgSource::Element));
//! assert_eq!(hooks.len(), 3);
//! ```

use crate::accessor_spec::Behavior;
use crate::container::Container;
use crate::result::EdslResult;
use crate::value::{Dispatch, ObjectRef, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Function callee: receives the resolved arguments
pub type HookFn = Arc<dyn Fn(&[Value]) -> EdslResult<Value> + Send + Sync>;

/// Lazily evaluated source, given the live container
pub type DeferredFn = Arc<dyn Fn(&Container) -> EdslResult<Value> + Send + Sync>;

/// What a call step invokes
pub type Callee = Behavior<HookFn>;

/// When a hook fires relative to its target operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Before,
    After,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// Where an operation callee is dispatched
#[derive(Clone)]
pub enum ReceiverSource {
    /// The container that owns the accessor
    Parent,
    /// The element being decorated
    Element,
    /// A fixed object
    Constant(Value),
    /// Computed from the container each time the hook fires
    Deferred(DeferredFn),
}

impl ReceiverSource {
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    pub fn deferred<F>(source: F) -> Self
    where
        F: Fn(&Container) -> EdslResult<Value> + Send + Sync + 'static,
    {
        Self::Deferred(Arc::new(source))
    }
}

impl fmt::Debug for ReceiverSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => f.write_str("Parent"),
            Self::Element => f.write_str("Element"),
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// One argument of a call step
#[derive(Clone)]
pub enum ArgSource {
    Literal(Value),
    /// The element being decorated
    Element,
    /// The container that owns the accessor
    Parent,
    /// Computed from the container each time the hook fires
    Deferred(DeferredFn),
}

impl ArgSource {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn deferred<F>(source: F) -> Self
    where
        F: Fn(&Container) -> EdslResult<Value> + Send + Sync + 'static,
    {
        Self::Deferred(Arc::new(source))
    }
}

impl fmt::Debug for ArgSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Element => f.write_str("Element"),
            Self::Parent => f.write_str("Parent"),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// A single invocation inside a call chain.
///
/// With no explicit receiver an operation is sent to the element when the
/// element responds to it, otherwise to the parent container.
#[derive(Debug, Clone)]
pub struct CallStep {
    callee: Callee,
    receiver: Option<ReceiverSource>,
    args: Vec<ArgSource>,
}

impl CallStep {
    /// Dispatch `operation` on the step's receiver
    pub fn call(operation: impl Into<String>) -> Self {
        Self {
            callee: Behavior::dispatch(operation),
            receiver: None,
            args: Vec::new(),
        }
    }

    /// Call a function with the resolved arguments
    pub fn call_fn<F>(function: F) -> Self
    where
        F: Fn(&[Value]) -> EdslResult<Value> + Send + Sync + 'static,
    {
        Self {
            callee: Behavior::Function(Arc::new(function)),
            receiver: None,
            args: Vec::new(),
        }
    }

    /// Append an argument
    #[must_use]
    pub fn with(mut self, arg: ArgSource) -> Self {
        self.args.push(arg);
        self
    }

    /// Set the receiver
    #[must_use]
    pub fn using(mut self, receiver: ReceiverSource) -> Self {
        self.receiver = Some(receiver);
        self
    }

    #[must_use]
    pub const fn callee(&self) -> &Callee {
        &self.callee
    }

    #[must_use]
    pub const fn receiver(&self) -> Option<&ReceiverSource> {
        self.receiver.as_ref()
    }

    #[must_use]
    pub fn args(&self) -> &[ArgSource] {
        &self.args
    }
}

/// Ordered steps run by one hook
#[derive(Debug, Clone, Default)]
pub struct CallChain {
    steps: Vec<CallStep>,
}

impl CallChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    #[must_use]
    pub fn then(mut self, step: CallStep) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn steps(&self) -> &[CallStep] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl From<CallStep> for CallChain {
    fn from(step: CallStep) -> Self {
        Self { steps: vec![step] }
    }
}

impl FromIterator<CallStep> for CallChain {
    fn from_iter<I: IntoIterator<Item = CallStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

/// A call chain bound to one operation and trigger
#[derive(Debug, Clone)]
pub struct Hook {
    trigger: Trigger,
    target_operation: String,
    call_chain: CallChain,
}

impl Hook {
    pub fn new(trigger: Trigger, target_operation: impl Into<String>, chain: CallChain) -> Self {
        Self {
            trigger,
            target_operation: target_operation.into(),
            call_chain: chain,
        }
    }

    #[must_use]
    pub const fn trigger(&self) -> Trigger {
        self.trigger
    }

    #[must_use]
    pub fn target_operation(&self) -> &str {
        &self.target_operation
    }

    #[must_use]
    pub const fn call_chain(&self) -> &CallChain {
        &self.call_chain
    }
}

/// Ordered collection of hooks declared for an accessor
#[derive(Debug, Clone, Default)]
pub struct HookSet {
    hooks: Vec<Hook>,
}

impl HookSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `chain` before `operation`
    #[must_use]
    pub fn before(self, operation: impl Into<String>, chain: impl Into<CallChain>) -> Self {
        self.hook(Hook::new(Trigger::Before, operation, chain.into()))
    }

    /// Run `chain` after `operation`
    #[must_use]
    pub fn after(self, operation: impl Into<String>, chain: impl Into<CallChain>) -> Self {
        self.hook(Hook::new(Trigger::After, operation, chain.into()))
    }

    /// Append a hook
    #[must_use]
    pub fn hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hook> {
        self.hooks.iter()
    }

    /// Whether any hook wraps `operation`
    #[must_use]
    pub fn targets(&self, operation: &str) -> bool {
        self.hooks
            .iter()
            .any(|hook| hook.target_operation == operation)
    }

    /// Hooks for `operation` firing at `trigger`, in declared order
    pub fn matching<'a>(
        &'a self,
        trigger: Trigger,
        operation: &'a str,
    ) -> impl Iterator<Item = &'a Hook> + 'a {
        self.hooks
            .iter()
            .filter(move |hook| hook.trigger == trigger && hook.target_operation == operation)
    }
}

/// Wrap `element` so the operations named in `hooks` run their chains.
///
/// Values that are not objects (null, lists produced by a wrapper, ...)
/// are returned unchanged, as is everything when the set is empty.
pub fn decorate(element: Value, hooks: &HookSet, container: &Container) -> EdslResult<Value> {
    match element {
        Value::Object(inner) if !hooks.is_empty() => {
            let parent = container.handle()?;
            Ok(Value::object(HookedElement {
                inner,
                hooks: hooks.clone(),
                parent,
            }))
        }
        other => Ok(other),
    }
}

/// Proxy that runs hook chains around selected operations and passes
/// everything else straight to the wrapped element.
pub struct HookedElement {
    inner: ObjectRef,
    hooks: HookSet,
    parent: Arc<Container>,
}

impl fmt::Debug for HookedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookedElement")
            .field("inner", &self.inner)
            .field("hooks", &self.hooks.len())
            .field("parent", &self.parent.type_name())
            .finish()
    }
}

impl HookedElement {
    /// The undecorated element
    #[must_use]
    pub const fn inner(&self) -> &ObjectRef {
        &self.inner
    }

    #[must_use]
    pub const fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    fn run(&self, trigger: Trigger, operation: &str) -> EdslResult<()> {
        for hook in self.hooks.matching(trigger, operation) {
            trace!(%trigger, operation, steps = hook.call_chain.len(), "running hook chain");
            for step in hook.call_chain.steps() {
                let _ = self.invoke(step)?;
            }
        }
        Ok(())
    }

    fn invoke(&self, step: &CallStep) -> EdslResult<Value> {
        let args = step
            .args
            .iter()
            .map(|arg| self.resolve_arg(arg))
            .collect::<EdslResult<Vec<_>>>()?;
        match &step.callee {
            Behavior::Function(function) => function(&args),
            Behavior::Dispatch(operation) => {
                let receiver = self.resolve_receiver(step.receiver.as_ref(), operation)?;
                trace!(operation, receiver = receiver.kind(), "hook step");
                receiver.call(operation, &args)
            }
        }
    }

    fn resolve_receiver(
        &self,
        source: Option<&ReceiverSource>,
        operation: &str,
    ) -> EdslResult<Value> {
        Ok(match source {
            Some(ReceiverSource::Parent) => self.parent_value(),
            Some(ReceiverSource::Element) => self.element_value(),
            Some(ReceiverSource::Constant(value)) => value.clone(),
            Some(ReceiverSource::Deferred(source)) => source(&self.parent)?,
            None if self.inner.responds_to(operation) => self.element_value(),
            None => self.parent_value(),
        })
    }

    fn resolve_arg(&self, source: &ArgSource) -> EdslResult<Value> {
        Ok(match source {
            ArgSource::Literal(value) => value.clone(),
            ArgSource::Element => self.element_value(),
            ArgSource::Parent => self.parent_value(),
            ArgSource::Deferred(source) => source(&self.parent)?,
        })
    }

    fn element_value(&self) -> Value {
        Value::Object(Arc::clone(&self.inner))
    }

    fn parent_value(&self) -> Value {
        let parent: ObjectRef = self.parent.clone();
        Value::Object(parent)
    }
}

impl Dispatch for HookedElement {
    fn type_name(&self) -> &str {
        self.inner.type_name()
    }

    fn call(&self, operation: &str, args: &[Value]) -> EdslResult<Value> {
        if !self.hooks.targets(operation) {
            return self.inner.call(operation, args);
        }
        self.run(Trigger::Before, operation)?;
        let result = self.inner.call(operation, args)?;
        self.run(Trigger::After, operation)?;
        Ok(result)
    }

    fn responds_to(&self, operation: &str) -> bool {
        self.inner.responds_to(operation)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
