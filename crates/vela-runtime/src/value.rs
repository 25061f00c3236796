//! Runtime value representation
//!
//! Shared value representation for the call core and native modules.
//! - Numbers, Bools, Nil: immediate values (stack-allocated)
//! - Strings: heap-allocated, reference-counted (Arc<String>), immutable
//! - Objects: shared property bags with reference semantics (see [`Object`])
//! - Funcs: callable values, script or native (see [`Func`])

use crate::function::Func;
use crate::object::Object;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Runtime value type
#[derive(Clone)]
pub enum Value {
    /// Numeric value (IEEE 754 double-precision)
    Number(f64),
    /// String value (reference-counted, immutable)
    String(Arc<String>),
    /// Boolean value
    Bool(bool),
    /// The absent value (missing arguments, missing results)
    Nil,
    /// Property bag with reference semantics
    Object(Object),
    /// Callable value (script function or native function)
    Func(Func),
}

impl Value {
    /// Create a new string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Arc::new(s.into()))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Nil => "nil",
            Value::Object(_) => "object",
            Value::Func(_) => "func",
        }
    }

    /// Check if this value is the absent value
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Check if this value is truthy
    ///
    /// `false` and `nil` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Nil)
    }

    /// Numeric view of this value, or a type error
    pub fn as_number(&self) -> Result<f64, RuntimeError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(RuntimeError::Type {
                msg: format!("expected number, got {}", other.type_name()),
            }),
        }
    }

    /// String view of this value, or a type error
    pub fn as_str(&self) -> Result<&str, RuntimeError> {
        match self {
            Value::String(s) => Ok(s.as_ref()),
            other => Err(RuntimeError::Type {
                msg: format!("expected string, got {}", other.type_name()),
            }),
        }
    }

    /// Object view of this value, or a type error
    pub fn as_object(&self) -> Result<&Object, RuntimeError> {
        match self {
            Value::Object(ob) => Ok(ob),
            other => Err(RuntimeError::Type {
                msg: format!("expected object, got {}", other.type_name()),
            }),
        }
    }

    /// Callable view of this value, or a type error
    pub fn as_func(&self) -> Result<&Func, RuntimeError> {
        match self {
            Value::Func(f) => Ok(f),
            other => Err(RuntimeError::Type {
                msg: format!("value of type {} is not callable", other.type_name()),
            }),
        }
    }
}

impl PartialEq for Value {
    /// Equality contract:
    ///
    /// **Value types** (content equality):
    /// - Number, String, Bool, Nil: primitive equality
    /// - Func (script): compare by prototype identity
    ///
    /// **Reference types** (identity equality — only the same allocation is equal):
    /// - Object: shared storage, `Arc::ptr_eq`
    /// - Func (native): closures have no meaningful content equality
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                // No trailing .0 for whole numbers
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s.as_ref()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Nil => write!(f, "nil"),
            Value::Object(ob) => write!(f, "<object size={}>", ob.len()),
            Value::Func(func) => write!(f, "<fn {}>", func.name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Nil => write!(f, "Nil"),
            Value::Object(ob) => write!(f, "Object(size={})", ob.len()),
            Value::Func(func) => write!(f, "Func({:?})", func.name()),
        }
    }
}

/// Runtime error type
///
/// One propagation channel for all three failure kinds: argument errors,
/// host-operation errors (converted at the native bridge), and execution
/// errors intrinsic to running instructions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    /// Type error
    #[error("type error: {msg}")]
    Type { msg: String },
    /// Argument-count error, raised at the callee's entry
    #[error("{name}: expected at least {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
    /// Division by zero
    #[error("division by zero")]
    DivideByZero,
    /// Host I/O failure, converted at the native bridge
    #[error("I/O error: {message}")]
    Io { message: String },
    /// Denied by the security context
    #[error("permission denied: {operation} access to {target}")]
    PermissionDenied { operation: String, target: String },
    /// Module id not registered with the engine
    #[error("unknown module: {id}")]
    UnknownModule { id: String },
    /// Operand stack underflow (execution error)
    #[error("operand stack underflow")]
    StackUnderflow,
    /// Constant table index out of range (execution error)
    #[error("constant index {index} out of range")]
    BadConstant { index: usize },
    /// Local slot out of range (execution error)
    #[error("local slot {slot} out of range")]
    BadLocal { slot: usize },
    /// Jump target out of range (execution error)
    #[error("jump target {target} out of range")]
    BadJump { target: usize },
}

impl RuntimeError {
    /// Build the I/O variant from a host error
    pub fn io(err: impl fmt::Display) -> Self {
        RuntimeError::Io {
            message: err.to_string(),
        }
    }
}
