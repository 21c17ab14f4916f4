//! Hook registry and dispatch
//!
//! Callbacks are stored per hook name in priority buckets (`BTreeMap`),
//! registration order within a bucket. Dispatch looks the next bucket up
//! again after each bucket completes, so a callback registered during a
//! dispatch at a priority that has not been reached yet still runs in that
//! pass, while one registered at an already-passed priority does not.
//!
//! All state is behind `RefCell` and no borrow is held while a callback
//! runs, which is what allows callbacks to register, remove and fire hooks
//! re-entrantly.

use log::{debug, warn};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::rc::Rc;

use super::callable::{Callable, CallbackFn, CallbackId};
use super::value::HookValue;
use crate::error::Result;

/// Priority used when none is given
pub const DEFAULT_PRIORITY: i32 = 10;

/// Number of positional arguments a callback receives when none is given
pub const DEFAULT_ARITY: usize = 1;

/// Callbacks on this hook run before every dispatch of any hook, receiving
/// the dispatched hook's name followed by its arguments.
pub const ALL_HOOK: &str = "all";

#[derive(Clone)]
struct HookEntry {
    id: CallbackId,
    callback: Rc<CallbackFn>,
    arity: usize,
}

#[derive(Default)]
struct HookTable {
    buckets: BTreeMap<i32, Vec<HookEntry>>,
}

impl HookTable {
    fn is_empty(&self) -> bool {
        self.buckets.values().all(|b| b.is_empty())
    }

    fn priority_of(&self, id: &CallbackId) -> Option<i32> {
        self.buckets
            .iter()
            .find(|(_, bucket)| bucket.iter().any(|e| &e.id == id))
            .map(|(priority, _)| *priority)
    }

    fn callback_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

/// Pops the hook stack when dropped, including on early return and unwind.
struct StackGuard<'a> {
    stack: &'a RefCell<Vec<String>>,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

/// Request-scoped filter and action registry
#[derive(Default)]
pub struct HookRegistry {
    hooks: RefCell<HashMap<String, HookTable>>,
    functions: RefCell<HashMap<String, Rc<CallbackFn>>>,
    stack: RefCell<Vec<String>>,
    fired: RefCell<HashMap<String, u64>>,
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.hooks.borrow().len())
            .field("stack", &self.stack.borrow())
            .finish_non_exhaustive()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    //=== Registration ===

    /// Define a named function that `Callable::named(name)` resolves to.
    pub fn define<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(&HookRegistry, &[HookValue]) -> Result<HookValue> + 'static,
    {
        self.functions.borrow_mut().insert(name.into(), Rc::new(f));
    }

    /// Register at the default priority and arity.
    pub fn on(&self, hook: &str, callable: &Callable) -> Option<CallbackId> {
        self.on_with(hook, callable, DEFAULT_PRIORITY, DEFAULT_ARITY)
    }

    /// Register a callback on `hook`.
    ///
    /// Returns the callback's identity, or `None` when the callable cannot
    /// be invoked (a name with no defined function). Registering the same
    /// identity at the same priority again replaces the earlier entry in
    /// place.
    pub fn on_with(&self, hook: &str, callable: &Callable, priority: i32, arity: usize) -> Option<CallbackId> {
        let id = callable.id();
        let callback = match callable {
            Callable::Function { f, .. } => f.clone(),
            Callable::Named(name) => match self.functions.borrow().get(name) {
                Some(f) => f.clone(),
                None => {
                    warn!("Rejected callback '{}' on hook '{}': not defined", name, hook);
                    return None;
                }
            },
        };

        let entry = HookEntry {
            id: id.clone(),
            callback,
            arity,
        };

        let mut hooks = self.hooks.borrow_mut();
        let bucket = hooks.entry(hook.to_string()).or_default().buckets.entry(priority).or_default();
        match bucket.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = entry,
            None => bucket.push(entry),
        }
        debug!("Registered {} on '{}' at priority {}", id, hook, priority);
        Some(id)
    }

    /// Remove a callback registered at the default priority.
    pub fn off(&self, hook: &str, id: &CallbackId) -> bool {
        self.off_at(hook, id, DEFAULT_PRIORITY)
    }

    /// Remove the exact `(hook, id, priority)` registration.
    ///
    /// The priority must match the one used at registration.
    pub fn off_at(&self, hook: &str, id: &CallbackId, priority: i32) -> bool {
        let mut hooks = self.hooks.borrow_mut();
        let Some(table) = hooks.get_mut(hook) else {
            return false;
        };
        let Some(bucket) = table.buckets.get_mut(&priority) else {
            return false;
        };

        let before = bucket.len();
        bucket.retain(|e| &e.id != id);
        let removed = bucket.len() != before;

        if bucket.is_empty() {
            table.buckets.remove(&priority);
        }
        if table.is_empty() {
            hooks.remove(hook);
        }
        removed
    }

    /// Remove every callback on `hook`, or only those at `priority`.
    pub fn remove_all(&self, hook: &str, priority: Option<i32>) -> usize {
        let mut hooks = self.hooks.borrow_mut();
        let Some(table) = hooks.get_mut(hook) else {
            return 0;
        };
        let removed = match priority {
            Some(p) => table.buckets.remove(&p).map_or(0, |b| b.len()),
            None => table.callback_count(),
        };
        if priority.is_none() || table.is_empty() {
            hooks.remove(hook);
        }
        removed
    }

    //=== Lookup ===

    /// Whether any callback is registered on `hook`
    pub fn has_hook(&self, hook: &str) -> bool {
        self.hooks.borrow().get(hook).is_some_and(|t| !t.is_empty())
    }

    /// Priority at which `id` is registered on `hook`
    pub fn hook_priority(&self, hook: &str, id: &CallbackId) -> Option<i32> {
        self.hooks.borrow().get(hook).and_then(|t| t.priority_of(id))
    }

    pub fn callback_count(&self, hook: &str) -> usize {
        self.hooks.borrow().get(hook).map_or(0, HookTable::callback_count)
    }

    //=== Dispatch ===

    /// Pass `value` through every callback on `hook`.
    ///
    /// Each callback receives `[value, extra...]` truncated to its arity and
    /// returns the value handed to the next one. With nothing registered the
    /// value comes back untouched.
    pub fn apply_filters(&self, hook: &str, value: HookValue, extra: &[HookValue]) -> Result<HookValue> {
        let has_all = self.has_hook(ALL_HOOK);
        if !has_all && !self.has_hook(hook) {
            return Ok(value);
        }

        let mut args = Vec::with_capacity(extra.len() + 1);
        args.push(value);
        args.extend_from_slice(extra);

        let _guard = self.enter(hook);
        if has_all {
            self.call_all(hook, &args)?;
        }
        self.run(hook, &mut args, true)?;
        Ok(args.swap_remove(0))
    }

    /// Run every callback on `hook` for its side effects.
    ///
    /// The fire counter for `hook` is bumped even when nothing listens.
    pub fn do_action(&self, hook: &str, args: &[HookValue]) -> Result<()> {
        *self.fired.borrow_mut().entry(hook.to_string()).or_insert(0) += 1;

        let has_all = self.has_hook(ALL_HOOK);
        if !has_all && !self.has_hook(hook) {
            return Ok(());
        }

        let mut args = args.to_vec();
        let _guard = self.enter(hook);
        if has_all {
            self.call_all(hook, &args)?;
        }
        self.run(hook, &mut args, false)
    }

    fn enter(&self, hook: &str) -> StackGuard<'_> {
        self.stack.borrow_mut().push(hook.to_string());
        StackGuard { stack: &self.stack }
    }

    fn call_all(&self, hook: &str, args: &[HookValue]) -> Result<()> {
        if hook == ALL_HOOK {
            return Ok(());
        }
        let mut all_args = Vec::with_capacity(args.len() + 1);
        all_args.push(HookValue::Text(hook.to_string()));
        all_args.extend_from_slice(args);
        self.run(ALL_HOOK, &mut all_args, false)
    }

    fn run(&self, hook: &str, args: &mut [HookValue], chain: bool) -> Result<()> {
        let mut last: Option<i32> = None;
        while let Some((priority, bucket)) = self.next_bucket(hook, last) {
            for entry in bucket {
                let n = entry.arity.min(args.len());
                let out = (entry.callback)(self, &args[..n])?;
                if chain {
                    if let Some(first) = args.first_mut() {
                        *first = out;
                    }
                }
            }
            last = Some(priority);
        }
        Ok(())
    }

    /// Snapshot of the lowest bucket above `after`.
    fn next_bucket(&self, hook: &str, after: Option<i32>) -> Option<(i32, Vec<HookEntry>)> {
        let hooks = self.hooks.borrow();
        let table = hooks.get(hook)?;
        let lower = match after {
            Some(p) => Bound::Excluded(p),
            None => Bound::Unbounded,
        };
        table
            .buckets
            .range((lower, Bound::Unbounded))
            .find(|(_, bucket)| !bucket.is_empty())
            .map(|(priority, bucket)| (*priority, bucket.clone()))
    }

    //=== Introspection ===

    /// The innermost hook currently being dispatched
    pub fn current_hook(&self) -> Option<String> {
        self.stack.borrow().last().cloned()
    }

    /// Hooks being dispatched, outermost first
    pub fn hook_stack(&self) -> Vec<String> {
        self.stack.borrow().clone()
    }

    /// Whether `hook` is anywhere on the dispatch stack
    pub fn doing(&self, hook: &str) -> bool {
        self.stack.borrow().iter().any(|h| h == hook)
    }

    /// How many times `do_action(hook, ..)` has been called
    pub fn did_action(&self, hook: &str) -> u64 {
        self.fired.borrow().get(hook).copied().unwrap_or(0)
    }
}
