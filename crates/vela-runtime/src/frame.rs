//! Execution frame
//!
//! A [`Frame`] is the mutable activation for exactly one call of a script
//! function: local slots sized by the prototype, the bound receiver, and the
//! instruction loop that drives the call to a single result. Frames are
//! created immediately before execution and discarded right after; recursive
//! invocations of the same prototype each get an independent frame, and the
//! prototype itself is never mutated.

use crate::bytecode::Instr;
use crate::function::{Func, Prototype};
use crate::value::{RuntimeError, Value};
use std::sync::Arc;

/// One call's activation, instantiated from a [`Prototype`].
pub struct Frame {
    receiver: Value,
    locals: Vec<Value>,
    proto: Arc<Prototype>,
}

impl Frame {
    /// Allocate a fresh frame with nil-filled local slots.
    pub fn new(proto: Arc<Prototype>, receiver: Value) -> Self {
        let locals = vec![Value::Nil; proto.stack_size];
        Frame {
            receiver,
            locals,
            proto,
        }
    }

    /// Bind arguments and run the instruction sequence to completion.
    ///
    /// Arguments beyond `expected_args` are ignored; missing ones stay nil
    /// (the slots were nil-initialized). `current` is the callable being
    /// executed, pushed back onto the operand stack by `LoadSelf`.
    pub fn run(&mut self, current: &Func, args: &[Value]) -> Result<Value, RuntimeError> {
        let bound = self
            .proto
            .expected_args
            .min(args.len())
            .min(self.locals.len());
        self.locals[..bound].clone_from_slice(&args[..bound]);

        let mut stack: Vec<Value> = Vec::new();
        let mut ip = 0usize;
        let code = &self.proto.code;

        while let Some(instr) = code.get(ip) {
            ip += 1;
            match *instr {
                Instr::Const(idx) => {
                    let value = self
                        .proto
                        .constants
                        .get(idx as usize)
                        .cloned()
                        .ok_or(RuntimeError::BadConstant { index: idx as usize })?;
                    stack.push(value);
                }
                Instr::Nil => stack.push(Value::Nil),
                Instr::True => stack.push(Value::Bool(true)),
                Instr::False => stack.push(Value::Bool(false)),

                Instr::GetLocal(slot) => {
                    let value = self
                        .locals
                        .get(slot as usize)
                        .cloned()
                        .ok_or(RuntimeError::BadLocal { slot: slot as usize })?;
                    stack.push(value);
                }
                Instr::SetLocal(slot) => {
                    let value = pop(&mut stack)?;
                    let slot = slot as usize;
                    if slot >= self.locals.len() {
                        return Err(RuntimeError::BadLocal { slot });
                    }
                    self.locals[slot] = value;
                }

                Instr::Add => {
                    let b = pop(&mut stack)?;
                    let a = pop(&mut stack)?;
                    let value = match (&a, &b) {
                        (Value::Number(x), Value::Number(y)) => Value::Number(x + y),
                        (Value::String(x), Value::String(y)) => {
                            Value::string(format!("{}{}", x, y))
                        }
                        _ => {
                            return Err(RuntimeError::Type {
                                msg: format!(
                                    "cannot add {} and {}",
                                    a.type_name(),
                                    b.type_name()
                                ),
                            })
                        }
                    };
                    stack.push(value);
                }
                Instr::Sub => binary_number(&mut stack, |a, b| Ok(a - b))?,
                Instr::Mul => binary_number(&mut stack, |a, b| Ok(a * b))?,
                Instr::Div => binary_number(&mut stack, |a, b| {
                    if b == 0.0 {
                        Err(RuntimeError::DivideByZero)
                    } else {
                        Ok(a / b)
                    }
                })?,
                Instr::Neg => {
                    let a = pop(&mut stack)?.as_number()?;
                    stack.push(Value::Number(-a));
                }

                Instr::Eq => {
                    let b = pop(&mut stack)?;
                    let a = pop(&mut stack)?;
                    stack.push(Value::Bool(a == b));
                }
                Instr::Ne => {
                    let b = pop(&mut stack)?;
                    let a = pop(&mut stack)?;
                    stack.push(Value::Bool(a != b));
                }
                Instr::Lt => binary_compare(&mut stack, |a, b| a < b)?,
                Instr::Le => binary_compare(&mut stack, |a, b| a <= b)?,
                Instr::Gt => binary_compare(&mut stack, |a, b| a > b)?,
                Instr::Ge => binary_compare(&mut stack, |a, b| a >= b)?,
                Instr::Not => {
                    let a = pop(&mut stack)?;
                    stack.push(Value::Bool(!a.is_truthy()));
                }

                Instr::Jump(target) => {
                    ip = jump_target(code.len(), target)?;
                }
                Instr::JumpIfFalse(target) => {
                    let cond = pop(&mut stack)?;
                    if !cond.is_truthy() {
                        ip = jump_target(code.len(), target)?;
                    }
                }

                Instr::GetField(key) => {
                    let ob = pop(&mut stack)?;
                    let key = self.constant_str(key)?;
                    // Missing fields read as nil, matching dynamic lookup.
                    let value = ob.as_object()?.get(&key).unwrap_or(Value::Nil);
                    stack.push(value);
                }
                Instr::SetField(key) => {
                    let value = pop(&mut stack)?;
                    let ob = pop(&mut stack)?;
                    let key = self.constant_str(key)?;
                    ob.as_object()?.set(key, value);
                }

                Instr::Call(argc) => {
                    let argc = argc as usize;
                    if stack.len() < argc + 1 {
                        return Err(RuntimeError::StackUnderflow);
                    }
                    let args = stack.split_off(stack.len() - argc);
                    let callee = pop(&mut stack)?;
                    let result = callee.as_func()?.call(Value::Nil, &args)?;
                    stack.push(result);
                }
                Instr::LoadSelf => stack.push(Value::Func(current.clone())),
                Instr::LoadThis => stack.push(self.receiver.clone()),

                Instr::Pop => {
                    pop(&mut stack)?;
                }
                Instr::Dup => {
                    let top = stack.last().cloned().ok_or(RuntimeError::StackUnderflow)?;
                    stack.push(top);
                }

                Instr::Return => return Ok(stack.pop().unwrap_or(Value::Nil)),
            }
        }

        // Running off the end of the code yields the absent value.
        Ok(Value::Nil)
    }

    fn constant_str(&self, index: u16) -> Result<String, RuntimeError> {
        let value = self
            .proto
            .constants
            .get(index as usize)
            .ok_or(RuntimeError::BadConstant { index: index as usize })?;
        Ok(value.as_str()?.to_string())
    }
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, RuntimeError> {
    stack.pop().ok_or(RuntimeError::StackUnderflow)
}

fn binary_number(
    stack: &mut Vec<Value>,
    op: impl FnOnce(f64, f64) -> Result<f64, RuntimeError>,
) -> Result<(), RuntimeError> {
    let b = pop(stack)?.as_number()?;
    let a = pop(stack)?.as_number()?;
    stack.push(Value::Number(op(a, b)?));
    Ok(())
}

fn binary_compare(
    stack: &mut Vec<Value>,
    op: impl FnOnce(f64, f64) -> bool,
) -> Result<(), RuntimeError> {
    let b = pop(stack)?.as_number()?;
    let a = pop(stack)?.as_number()?;
    stack.push(Value::Bool(op(a, b)));
    Ok(())
}

fn jump_target(code_len: usize, target: u16) -> Result<usize, RuntimeError> {
    let target = target as usize;
    if target >= code_len {
        return Err(RuntimeError::BadJump { target });
    }
    Ok(target)
}
