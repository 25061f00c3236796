//! Vela runtime
//!
//! The execution core of the Vela scripting language: dynamically typed
//! values, compiled function prototypes, execution frames, a call-stack
//! context with guaranteed push/pop pairing, a native bridge for host
//! closures, and lazily-built standard-library modules.
//!
//! Hosts embed the runtime through [`Engine`], which owns the session
//! context and converts every escaping error into a [`Fault`] carrying the
//! call chain captured at the moment of failure.
//!
//! # Example
//!
//! ```
//! use vela_runtime::{Engine, SecurityContext, Value};
//!
//! let engine = Engine::with_security(SecurityContext::allow_all());
//! let greet = engine.native_fn("greet", |args| {
//!     let who = args.first().map(|v| v.to_string()).unwrap_or_default();
//!     Ok(Value::string(format!("hello, {}", who)))
//! });
//! let out = engine.call(&greet, Value::Nil, &[Value::string("world")]).unwrap();
//! assert_eq!(out, Value::string("hello, world"));
//! ```

pub mod bytecode;
pub mod ctx;
pub mod frame;
pub mod function;
pub mod module;
pub mod native;
pub mod object;
pub mod runtime;
pub mod security;
pub mod stdlib;
pub mod value;

pub use bytecode::Instr;
pub use ctx::{CallKind, Ctx};
pub use frame::Frame;
pub use function::{Func, Prototype, ScriptFn};
pub use module::Module;
pub use native::NativeFunc;
pub use object::Object;
pub use runtime::{Engine, Fault};
pub use security::{SecurityContext, SecurityError};
pub use value::{RuntimeError, Value};

/// Runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
