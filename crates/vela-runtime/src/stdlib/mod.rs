//! Standard library modules
//!
//! Each module implements [`Module`](crate::module::Module) and builds its
//! namespace object lazily on first load. Namespaces hold constants and
//! native callables that check the session's [`SecurityContext`]
//! (crate::security::SecurityContext) before touching the host.

pub mod os;

pub use os::OsMod;

use crate::value::{RuntimeError, Value};

/// Extract a required string argument.
fn str_arg(name: &str, args: &[Value], idx: usize) -> Result<String, RuntimeError> {
    match args.get(idx) {
        Some(v) => Ok(v.as_str()?.to_string()),
        None => Err(RuntimeError::Arity {
            name: name.to_string(),
            expected: idx + 1,
            got: args.len(),
        }),
    }
}

/// Extract a required numeric argument.
fn num_arg(name: &str, args: &[Value], idx: usize) -> Result<f64, RuntimeError> {
    match args.get(idx) {
        Some(v) => v.as_number(),
        None => Err(RuntimeError::Arity {
            name: name.to_string(),
            expected: idx + 1,
            got: args.len(),
        }),
    }
}
