//! Vela runtime API for embedding
//!
//! [`Engine`] is what a host application holds: it owns the call-stack
//! context, registers standard-library modules, binds compiled prototypes
//! and host closures into callables, and is the single recovery point where
//! every error unwinding out of a top-level call becomes a typed [`Fault`]
//! instead of crashing the host process.

use crate::ctx::Ctx;
use crate::function::{Func, Prototype};
use crate::module::Module;
use crate::native::NativeFunc;
use crate::security::SecurityContext;
use crate::value::{RuntimeError, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A failure that escaped a top-level call.
///
/// Carries the runtime error plus the chain of call names that were still
/// active at the moment of failure, innermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub error: RuntimeError,
    pub call_chain: Vec<String>,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if !self.call_chain.is_empty() {
            write!(f, " [in {}]", self.call_chain.join(" <- "))?;
        }
        Ok(())
    }
}

impl std::error::Error for Fault {}

/// Vela runtime instance
///
/// # Examples
///
/// ```
/// use vela_runtime::{Engine, SecurityContext, Value};
///
/// let engine = Engine::with_security(SecurityContext::allow_all());
/// let double = engine.native_fn("double", |args| {
///     Ok(Value::Number(args[0].as_number()? * 2.0))
/// });
/// let result = engine.call(&double, Value::Nil, &[Value::Number(21.0)]);
/// assert_eq!(result.unwrap(), Value::Number(42.0));
/// ```
pub struct Engine {
    ctx: Arc<Ctx>,
    modules: Mutex<HashMap<String, Box<dyn Module>>>,
}

impl Engine {
    /// Create an engine with the secure-by-default configuration
    /// (all host I/O denied until granted).
    pub fn new() -> Self {
        Self::with_security(SecurityContext::new())
    }

    /// Create an engine with an explicit security configuration.
    pub fn with_security(security: SecurityContext) -> Self {
        Engine {
            ctx: Ctx::new(security),
            modules: Mutex::new(HashMap::new()),
        }
    }

    /// The call-stack context shared by everything this engine runs.
    pub fn context(&self) -> &Arc<Ctx> {
        &self.ctx
    }

    /// Register a standard-library module, handing it the context.
    ///
    /// Must be called once per module before the first `load_module`.
    pub fn register_module(&self, mut module: Box<dyn Module>) {
        module.set_ctx(Arc::clone(&self.ctx));
        let id = module.id().to_string();
        log::debug!("module registered: {}", id);
        self.modules
            .lock()
            .expect("module registry lock poisoned")
            .insert(id, module);
    }

    /// Run a registered module, returning its namespace object.
    ///
    /// The namespace is built lazily on the first load and cached by the
    /// module; later loads return the same object.
    pub fn load_module(&self, id: &str) -> Result<Value, Fault> {
        self.ctx.clear_fault();
        // Take the module out of the registry while it runs so a build that
        // loads other modules does not re-enter the registry lock.
        let mut module = self
            .modules
            .lock()
            .expect("module registry lock poisoned")
            .remove(id)
            .ok_or_else(|| Fault {
                error: RuntimeError::UnknownModule { id: id.to_string() },
                call_chain: Vec::new(),
            })?;
        let result = module.run();
        self.modules
            .lock()
            .expect("module registry lock poisoned")
            .insert(id.to_string(), module);
        result.map_err(|error| self.to_fault(error))
    }

    /// Bind a compiled prototype to this engine's context.
    pub fn script_fn(&self, module_id: impl Into<String>, proto: Arc<Prototype>) -> Func {
        Func::script(&self.ctx, module_id, proto)
    }

    /// Wrap a host closure as a callable bound to this engine's context.
    pub fn native_fn(
        &self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    ) -> Func {
        NativeFunc::new(&self.ctx, name, f)
    }

    /// Invoke a top-level callable.
    ///
    /// This is the single conversion point for the whole runtime: any error
    /// that unwound through nested frames and native calls arrives here with
    /// the stack bookkeeping already settled, and is returned as a [`Fault`]
    /// carrying the call chain captured at the moment of failure.
    pub fn call(&self, f: &Func, receiver: Value, args: &[Value]) -> Result<Value, Fault> {
        self.ctx.clear_fault();
        f.call(receiver, args).map_err(|error| self.to_fault(error))
    }

    fn to_fault(&self, error: RuntimeError) -> Fault {
        let call_chain = self.ctx.take_fault().unwrap_or_default();
        log::debug!("top-level failure: {} [depth now {}]", error, self.ctx.depth());
        Fault { error, call_chain }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::with_security(SecurityContext::allow_all())
    }

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new();
        assert_eq!(engine.context().depth(), 0);
    }

    #[test]
    fn call_returns_the_value() {
        let engine = engine();
        let f = engine.native_fn("id", |args| Ok(args.first().cloned().unwrap_or(Value::Nil)));
        let result = engine.call(&f, Value::Nil, &[Value::string("x")]).unwrap();
        assert_eq!(result, Value::string("x"));
    }

    #[test]
    fn fault_carries_the_call_chain() {
        let engine = engine();
        let f = engine.native_fn("exploder", |_| {
            Err(RuntimeError::Io {
                message: "disk on fire".to_string(),
            })
        });
        let fault = engine.call(&f, Value::Nil, &[]).unwrap_err();
        assert!(matches!(fault.error, RuntimeError::Io { .. }));
        assert_eq!(fault.call_chain, vec!["exploder"]);
        assert_eq!(engine.context().depth(), 0);
    }

    #[test]
    fn fault_display_includes_chain() {
        let fault = Fault {
            error: RuntimeError::DivideByZero,
            call_chain: vec!["inner".to_string(), "outer".to_string()],
        };
        assert_eq!(fault.to_string(), "division by zero [in inner <- outer]");
    }

    #[test]
    fn unknown_module_is_a_typed_error() {
        let engine = engine();
        let fault = engine.load_module("no_such_module").unwrap_err();
        assert_eq!(
            fault.error,
            RuntimeError::UnknownModule {
                id: "no_such_module".to_string()
            }
        );
    }
}
