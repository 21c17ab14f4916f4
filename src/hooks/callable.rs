//! Hook callbacks and their identities.
//!
//! A `Callable` is either a closure or the name of a function defined on the
//! registry with `HookRegistry::define`. Named callables are resolved when
//! they are registered, so an unknown name is rejected up front instead of
//! failing at dispatch time.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::registry::HookRegistry;
use super::value::HookValue;
use crate::error::Result;

/// Signature every hook callback is invoked with.
///
/// The registry is passed back in so callbacks can fire or register hooks
/// themselves. The slice is already truncated to the callback's arity.
pub type CallbackFn = dyn Fn(&HookRegistry, &[HookValue]) -> Result<HookValue>;

/// Stable identity of a registered callback, used for removal and lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallbackId {
    /// A function defined on the registry under this name
    Named(String),
    /// A closure, numbered when it was wrapped
    Function(u64),
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{}", name),
            Self::Function(n) => write!(f, "closure#{}", n),
        }
    }
}

static NEXT_FUNCTION_ID: AtomicU64 = AtomicU64::new(1);

/// Something that can be registered on a hook
///
/// Clones share the closure and its number; wrapping a closure again gives
/// a new number, even when an earlier one has been dropped.
#[derive(Clone)]
pub enum Callable {
    Function { id: u64, f: Rc<CallbackFn> },
    Named(String),
}

impl Callable {
    /// Wrap a filter callback; its return value replaces the filtered value.
    pub fn filter<F>(f: F) -> Self
    where
        F: Fn(&HookRegistry, &[HookValue]) -> Result<HookValue> + 'static,
    {
        Self::function(Rc::new(f))
    }

    /// Wrap an action callback; it returns nothing.
    pub fn action<F>(f: F) -> Self
    where
        F: Fn(&HookRegistry, &[HookValue]) -> Result<()> + 'static,
    {
        Self::function(Rc::new(move |hooks: &HookRegistry, args: &[HookValue]| {
            f(hooks, args)?;
            Ok(HookValue::Null)
        }))
    }

    fn function(f: Rc<CallbackFn>) -> Self {
        let id = NEXT_FUNCTION_ID.fetch_add(1, Ordering::Relaxed);
        Self::Function { id, f }
    }

    /// Refer to a function defined on the registry.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn id(&self) -> CallbackId {
        match self {
            Self::Named(name) => CallbackId::Named(name.clone()),
            Self::Function { id, .. } => CallbackId::Function(*id),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callable").field(&self.id()).finish()
    }
}
