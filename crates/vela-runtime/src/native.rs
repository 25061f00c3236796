//! Native function bridge
//!
//! Wraps a host closure (variadic argument slice in, one value out) so it
//! satisfies the same callable contract as a script function. Callers cannot
//! tell the two apart through [`Func::call`](crate::function::Func::call);
//! a host-level failure surfaces as the same [`RuntimeError`] channel a
//! script failure uses, differing only in kind and message.

use crate::ctx::Ctx;
use crate::function::Func;
use crate::value::{RuntimeError, Value};
use std::sync::Arc;

/// Host closure callable from scripts.
pub type NativeImpl = Arc<dyn Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync>;

/// A host-implemented function exposed as a callable value.
pub struct NativeFunc {
    name: String,
    ctx: Arc<Ctx>,
    f: NativeImpl,
}

impl NativeFunc {
    /// Wrap a host closure as a callable bound to the given context.
    ///
    /// `name` is the diagnostic name used in stack traces and errors
    /// (by convention `module.operation`, e.g. `os.open`).
    pub fn new(
        ctx: &Arc<Ctx>,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    ) -> Func {
        Func::Native(Arc::new(NativeFunc {
            name: name.into(),
            ctx: Arc::clone(ctx),
            f: Arc::new(f),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn ctx(&self) -> &Arc<Ctx> {
        &self.ctx
    }

    pub(crate) fn invoke(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        (self.f)(args)
    }
}

/// Fail with an argument-count error unless at least `n` arguments were
/// passed. Native functions use this at entry to enforce required arity
/// without duplicating validation logic.
pub fn expect_at_least_n_args(name: &str, n: usize, args: &[Value]) -> Result<(), RuntimeError> {
    if args.len() < n {
        return Err(RuntimeError::Arity {
            name: name.to_string(),
            expected: n,
            got: args.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::SecurityContext;

    #[test]
    fn arity_guard() {
        let args = [Value::Number(1.0)];
        assert!(expect_at_least_n_args("f", 1, &args).is_ok());
        assert!(expect_at_least_n_args("f", 0, &[]).is_ok());
        let err = expect_at_least_n_args("f", 2, &args).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::Arity {
                name: "f".to_string(),
                expected: 2,
                got: 1,
            }
        );
    }

    #[test]
    fn native_call_is_tracked_on_the_stack() {
        let ctx = Ctx::new(SecurityContext::allow_all());
        let observer = Arc::clone(&ctx);
        let f = NativeFunc::new(&ctx, "depth_probe", move |_args| {
            assert_eq!(observer.depth(), 1);
            assert_eq!(observer.call_chain(), vec!["depth_probe"]);
            Ok(Value::Nil)
        });
        assert_eq!(ctx.depth(), 0);
        f.call(Value::Nil, &[]).unwrap();
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn native_failure_pops_the_stack() {
        let ctx = Ctx::new(SecurityContext::allow_all());
        let f = NativeFunc::new(&ctx, "fails", |_args| {
            Err(RuntimeError::Io {
                message: "backing store unavailable".to_string(),
            })
        });
        let err = f.call(Value::Nil, &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::Io { .. }));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn native_receives_arguments_and_returns_one_value() {
        let ctx = Ctx::new(SecurityContext::allow_all());
        let f = NativeFunc::new(&ctx, "sum", |args| {
            let mut total = 0.0;
            for a in args {
                total += a.as_number()?;
            }
            Ok(Value::Number(total))
        });
        let result = f
            .call(Value::Nil, &[Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)])
            .unwrap();
        assert_eq!(result, Value::Number(6.0));
    }
}
