//! Call-stack context
//!
//! One [`Ctx`] exists per running session and tracks the ordered stack of
//! active callables for the lifetime of a top-level invocation. Push and pop
//! are a scoped acquisition/release pair: [`Ctx::push_call`] returns a
//! [`CallGuard`] that pops on drop, so the pop happens on every exit path,
//! including error unwinding.
//!
//! Entries within one context are mutated by a single logical thread of
//! control at any instant (invocation is synchronous and strictly nested);
//! the mutex exists so independent sessions can live on different threads
//! and share values safely.

use crate::security::SecurityContext;
use std::sync::{Arc, Mutex};

/// Which callable variant a stack entry belongs to.
///
/// A `Script` entry corresponds to a live execution frame; that frame is
/// exclusively owned by the invocation itself, so the context records the
/// pairing rather than the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Script,
    Native,
}

/// One active call, innermost last on the stack.
#[derive(Debug, Clone)]
pub struct CallEntry {
    pub name: String,
    pub kind: CallKind,
}

/// Session-wide call-stack state.
pub struct Ctx {
    stack: Mutex<Vec<CallEntry>>,
    /// Call chain captured at the moment of the innermost failure,
    /// handed to the embedding boundary when the error surfaces.
    fault: Mutex<Option<Vec<String>>>,
    security: SecurityContext,
}

impl Ctx {
    /// Create a context with the given security configuration.
    pub fn new(security: SecurityContext) -> Arc<Self> {
        Arc::new(Ctx {
            stack: Mutex::new(Vec::new()),
            fault: Mutex::new(None),
            security,
        })
    }

    /// Push an entry for a call that is about to run.
    ///
    /// The returned guard pops the entry when dropped. Guards must be held
    /// for the duration of the call body and nothing else; the strictly
    /// nested call/return discipline keeps pops in LIFO order.
    pub fn push_call(self: &Arc<Self>, name: impl Into<String>, kind: CallKind) -> CallGuard {
        let name = name.into();
        log::trace!("call push: {} ({:?})", name, kind);
        self.stack
            .lock()
            .expect("call stack lock poisoned")
            .push(CallEntry { name, kind });
        CallGuard { ctx: Arc::clone(self) }
    }

    /// Current recursion depth (number of active calls).
    pub fn depth(&self) -> usize {
        self.stack.lock().expect("call stack lock poisoned").len()
    }

    /// Names of the still-active calls, innermost first.
    pub fn call_chain(&self) -> Vec<String> {
        let stack = self.stack.lock().expect("call stack lock poisoned");
        stack.iter().rev().map(|e| e.name.clone()).collect()
    }

    /// Security configuration consulted by native modules before host I/O.
    pub fn security(&self) -> &SecurityContext {
        &self.security
    }

    /// Record the active call chain for a failure in flight.
    ///
    /// The first recorder wins: the innermost failing call captures the
    /// deepest chain, and outer frames unwinding past it leave the snapshot
    /// alone.
    pub(crate) fn record_fault(&self) {
        let mut fault = self.fault.lock().expect("fault lock poisoned");
        if fault.is_none() {
            *fault = Some(self.call_chain());
        }
    }

    /// Take the recorded failure chain, clearing it.
    pub(crate) fn take_fault(&self) -> Option<Vec<String>> {
        self.fault.lock().expect("fault lock poisoned").take()
    }

    /// Discard any stale failure chain before a fresh top-level call.
    pub(crate) fn clear_fault(&self) {
        *self.fault.lock().expect("fault lock poisoned") = None;
    }
}

/// Scoped pop for one pushed call entry.
pub struct CallGuard {
    ctx: Arc<Ctx>,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        let popped = self
            .ctx
            .stack
            .lock()
            .expect("call stack lock poisoned")
            .pop();
        debug_assert!(popped.is_some(), "call stack pop without matching push");
        if let Some(entry) = popped {
            log::trace!("call pop: {}", entry.name);
        }
    }
}
