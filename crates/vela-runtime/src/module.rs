//! Module contract
//!
//! A standard-library unit plugs into the core by implementing [`Module`]:
//! a unique id, a context hook called once before first use, and a `run`
//! operation that lazily builds the module's namespace object.
//!
//! Lifecycle per instance: uninitialized (no context) → context-bound
//! ([`Module::set_ctx`] called) → ready (first successful [`Module::run`]
//! cached its namespace). `run` on a ready module returns the cached
//! namespace without re-running setup; a build failure leaves the module
//! context-bound so a later `run` may retry.

use crate::ctx::Ctx;
use crate::value::{RuntimeError, Value};
use std::sync::Arc;

/// Contract a standard-library unit presents to the core.
pub trait Module: Send {
    /// Unique module id (the name scripts import it by).
    fn id(&self) -> &str;

    /// Hand the module the active call-stack context. Called exactly once,
    /// before the first `run`.
    fn set_ctx(&mut self, ctx: Arc<Ctx>);

    /// Return the module's namespace object, building it on first call.
    fn run(&mut self) -> Result<Value, RuntimeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;
    use crate::security::SecurityContext;
    use crate::value::Value;

    /// Minimal module that counts how many times its namespace was built.
    struct CountingMod {
        ctx: Option<Arc<Ctx>>,
        ob: Option<Object>,
        builds: usize,
    }

    impl Module for CountingMod {
        fn id(&self) -> &str {
            "counting"
        }

        fn set_ctx(&mut self, ctx: Arc<Ctx>) {
            self.ctx = Some(ctx);
        }

        fn run(&mut self) -> Result<Value, RuntimeError> {
            if self.ob.is_none() {
                self.builds += 1;
                let ob = Object::new();
                ob.set("builds", Value::Number(self.builds as f64));
                self.ob = Some(ob);
            }
            Ok(Value::Object(self.ob.clone().expect("namespace just built")))
        }
    }

    #[test]
    fn run_builds_once_and_returns_the_same_namespace() {
        let mut m = CountingMod {
            ctx: None,
            ob: None,
            builds: 0,
        };
        m.set_ctx(Ctx::new(SecurityContext::allow_all()));

        let first = m.run().unwrap();
        let second = m.run().unwrap();
        assert_eq!(m.builds, 1);
        // Identity equality: both runs hand out the same object.
        assert_eq!(first, second);
    }
}
