//! Callable values
//!
//! A [`Func`] is any value invocable as `call(receiver, args) -> result`.
//! Exactly two variants exist: a script function instantiated from a
//! compiled [`Prototype`], and a host function wrapped by the native bridge.
//! The invocation protocol is closed over these two — call sites never need
//! to know which one they hold.

use crate::bytecode::Instr;
use crate::ctx::{CallKind, Ctx};
use crate::frame::Frame;
use crate::native::NativeFunc;
use crate::value::{RuntimeError, Value};
use std::fmt;
use std::sync::{Arc, Weak};

/// Compiled description of a script function.
///
/// Produced by the compiler, immutable afterwards, shared read-only by every
/// frame instantiated from it. The `parent` link is a non-owning
/// back-reference to the lexically enclosing prototype: nested prototypes
/// form an acyclic tree rooted at top-level prototypes, never a
/// reference-counted cycle.
pub struct Prototype {
    /// Diagnostic name for stack traces and errors
    pub name: String,
    /// Declared argument count. Extra call arguments are ignored; missing
    /// ones are padded with nil.
    pub expected_args: usize,
    /// Number of local variable slots a frame must allocate
    pub stack_size: usize,
    /// Constant table, referenced by index from instructions
    pub constants: Vec<Value>,
    /// Local variable names, parallel to slots, for debugging/reflection
    pub local_names: Vec<String>,
    /// Instruction sequence
    pub code: Vec<Instr>,
    /// Lexically enclosing prototype, if any
    pub parent: Option<Weak<Prototype>>,
}

impl Prototype {
    /// The enclosing prototype, if it is still alive.
    pub fn parent(&self) -> Option<Arc<Prototype>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }
}

impl fmt::Debug for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prototype")
            .field("name", &self.name)
            .field("expected_args", &self.expected_args)
            .field("stack_size", &self.stack_size)
            .field("code_len", &self.code.len())
            .finish()
    }
}

/// A script function: a prototype bound to its owning module and the active
/// context.
pub struct ScriptFn {
    pub proto: Arc<Prototype>,
    /// Id of the owning module/compilation unit
    pub module_id: String,
    ctx: Arc<Ctx>,
}

/// A callable value, script or native.
#[derive(Clone)]
pub enum Func {
    Script(Arc<ScriptFn>),
    Native(Arc<NativeFunc>),
}

impl Func {
    /// Bind a compiled prototype to a context, producing a callable.
    pub fn script(ctx: &Arc<Ctx>, module_id: impl Into<String>, proto: Arc<Prototype>) -> Func {
        Func::Script(Arc::new(ScriptFn {
            proto,
            module_id: module_id.into(),
            ctx: Arc::clone(ctx),
        }))
    }

    /// Diagnostic name of this callable.
    pub fn name(&self) -> &str {
        match self {
            Func::Script(sf) => &sf.proto.name,
            Func::Native(nf) => nf.name(),
        }
    }

    /// Invoke this callable: exactly one value or an error.
    ///
    /// The context entry pushed here is popped on every exit path (the guard
    /// drops during unwinding too), so the stack depth after a call always
    /// equals the depth before it. A failing body records the active call
    /// chain before the entry is popped; the embedding boundary picks the
    /// snapshot up when the error surfaces.
    pub fn call(&self, receiver: Value, args: &[Value]) -> Result<Value, RuntimeError> {
        match self {
            Func::Script(sf) => {
                let _guard = sf.ctx.push_call(sf.proto.name.as_str(), CallKind::Script);
                let mut frame = Frame::new(Arc::clone(&sf.proto), receiver);
                let result = frame.run(self, args);
                if result.is_err() {
                    sf.ctx.record_fault();
                }
                result
            }
            Func::Native(nf) => {
                let _guard = nf.ctx().push_call(nf.name(), CallKind::Native);
                let result = nf.invoke(args);
                if result.is_err() {
                    nf.ctx().record_fault();
                }
                result
            }
        }
    }
}

impl PartialEq for Func {
    /// Script functions compare by prototype identity, native functions by
    /// closure identity. Two independently built callables are never equal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Func::Script(a), Func::Script(b)) => Arc::ptr_eq(&a.proto, &b.proto),
            (Func::Native(a), Func::Native(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Func::Script(sf) => write!(f, "Script({})", sf.proto.name),
            Func::Native(nf) => write!(f, "Native({})", nf.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::SecurityContext;

    fn proto(name: &str, code: Vec<Instr>) -> Arc<Prototype> {
        Arc::new(Prototype {
            name: name.to_string(),
            expected_args: 0,
            stack_size: 0,
            constants: Vec::new(),
            local_names: Vec::new(),
            code,
            parent: None,
        })
    }

    #[test]
    fn parent_chain_is_non_owning() {
        let outer = proto("outer", vec![Instr::Nil, Instr::Return]);
        let inner = Arc::new(Prototype {
            name: "inner".to_string(),
            expected_args: 0,
            stack_size: 0,
            constants: Vec::new(),
            local_names: Vec::new(),
            code: vec![Instr::Nil, Instr::Return],
            parent: Some(Arc::downgrade(&outer)),
        });
        assert_eq!(inner.parent().unwrap().name, "outer");
        drop(outer);
        // The weak link does not keep the enclosing prototype alive.
        assert!(inner.parent().is_none());
    }

    #[test]
    fn script_call_returns_nil_for_empty_body() {
        let ctx = Ctx::new(SecurityContext::allow_all());
        let f = Func::script(&ctx, "test", proto("empty", vec![Instr::Return]));
        let result = f.call(Value::Nil, &[]).unwrap();
        assert_eq!(result, Value::Nil);
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn func_equality_is_identity() {
        let ctx = Ctx::new(SecurityContext::allow_all());
        let p = proto("f", vec![Instr::Return]);
        let a = Func::script(&ctx, "test", Arc::clone(&p));
        let b = Func::script(&ctx, "test", Arc::clone(&p));
        let c = Func::script(&ctx, "test", proto("f", vec![Instr::Return]));
        assert_eq!(a, b); // same prototype
        assert_ne!(a, c); // equal-looking but distinct prototype
    }
}
