//! Scope chain managing name bindings and control-flow flags
//!
//! A scope is created for every function call, block statement, `for`
//! iteration, switch case group, and lambda body. Scopes hold an ordered
//! symbol list, a parent link, and the two transient control-flow flags
//! (`broke`, `hasret`) that block executors bubble upward. Closures keep
//! their defining scope alive through the shared `ScopeRef` handle; a
//! call splices that scope under the fresh call scope via `set_parent`.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::object::Object;
use crate::value::Value;

/// Shared handle to a scope. Lifetime is the longest holder's.
pub type ScopeRef = Arc<Scope>;

struct ScopeInner {
    parent: Option<ScopeRef>,
    symbols: Vec<(String, Value)>,
    broke: bool,
    hasret: bool,
    retval: Value,
    /// Set on the root scope only; consulted as last-resort lookup
    global: Option<Arc<Object>>,
}

/// A single scope in the chain.
pub struct Scope {
    /// Whom this scope was created for; debug/tracing only
    name: &'static str,
    inner: Mutex<ScopeInner>,
}

impl Scope {
    /// Create a scope with an optional parent.
    pub fn new(name: &'static str, parent: Option<ScopeRef>) -> ScopeRef {
        Arc::new(Scope {
            name,
            inner: Mutex::new(ScopeInner {
                parent,
                symbols: Vec::new(),
                broke: false,
                hasret: false,
                retval: Value::Nil,
                global: None,
            }),
        })
    }

    /// The debug name this scope was created with.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Install the global object on this (root) scope.
    pub fn set_global(&self, global: Arc<Object>) {
        self.inner.lock().global = Some(global);
    }

    /// The global object, if this is the root scope carrying it.
    pub fn global(&self) -> Option<Arc<Object>> {
        self.inner.lock().global.clone()
    }

    /// The parent scope.
    pub fn parent(&self) -> Option<ScopeRef> {
        self.inner.lock().parent.clone()
    }

    /// Splice a new parent under this scope. Used when invoking a closure:
    /// the defining scope becomes the parent of the fresh call scope.
    pub fn set_parent(&self, parent: ScopeRef) {
        self.inner.lock().parent = Some(parent);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Symbols
    // ═══════════════════════════════════════════════════════════════════

    /// Find a symbol in this scope, and optionally up the chain. The root
    /// scope falls back to the global object's properties.
    pub fn find_symbol(&self, name: &str, outer: bool) -> Option<Value> {
        {
            let inner = self.inner.lock();
            if let Some((_, value)) = inner.symbols.iter().find(|(n, _)| n == name) {
                return Some(value.clone());
            }
            if !outer {
                return None;
            }
        }
        match self.parent() {
            Some(parent) => parent.find_symbol(name, true),
            None => self
                .inner
                .lock()
                .global
                .as_ref()
                .and_then(|g| g.lookup_prop(name)),
        }
    }

    /// Find a symbol or fail with a `Name` error.
    pub fn must_find(&self, name: &str, outer: bool) -> Result<Value> {
        self.find_symbol(name, outer)
            .ok_or_else(|| Error::Name(format!("name `{}' not defined", name)))
    }

    /// Declare a new symbol in this scope. Redeclaring a name already
    /// present in this same scope is a `Name` error.
    pub fn add_symbol(&self, name: &str, value: Value) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.symbols.iter().any(|(n, _)| n == name) {
            return Err(Error::Name(format!("name `{}' redefined", name)));
        }
        inner.symbols.push((name.to_string(), value));
        Ok(())
    }

    /// Assign to an existing symbol, searching up the chain. A missing
    /// name is a `Name` error.
    pub fn set_symbol(&self, name: &str, value: Value) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if let Some((_, slot)) = inner.symbols.iter_mut().find(|(n, _)| n == name) {
                *slot = value;
                return Ok(());
            }
        }
        match self.parent() {
            Some(parent) => parent.set_symbol(name, value),
            None => Err(Error::Name(format!("name `{}' not defined", name))),
        }
    }

    /// Names declared in this scope, in declaration order.
    pub fn symbol_names(&self) -> Vec<String> {
        self.inner
            .lock()
            .symbols
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Control-flow flags
    // ═══════════════════════════════════════════════════════════════════

    /// Record that a `break` executed in this scope.
    pub fn set_break(&self) {
        self.inner.lock().broke = true;
    }

    /// Has a `break` executed in this scope?
    pub fn broke(&self) -> bool {
        self.inner.lock().broke
    }

    /// Record a `return` with its value.
    pub fn set_return(&self, retval: Value) {
        let mut inner = self.inner.lock();
        inner.hasret = true;
        inner.retval = retval;
    }

    /// Has a `return` executed in this scope?
    pub fn has_return(&self) -> bool {
        self.inner.lock().hasret
    }

    /// The recorded return value (Nil when none).
    pub fn return_value(&self) -> Value {
        self.inner.lock().retval.clone()
    }
}
