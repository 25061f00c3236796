//! Bytecode instruction set
//!
//! Stack-based instructions executed by a [`Frame`](crate::frame::Frame).
//! Operands are carried inline on the enum; jump targets are absolute
//! instruction indices. The compiler producing these is an external
//! collaborator — the core assumes well-formed input and reports the few
//! conditions it must check (bad indices, underflow) as execution errors.

/// A single stack-machine instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    // ===== Constants =====
    /// Push constant from the prototype's constant table
    Const(u16),
    /// Push nil
    Nil,
    /// Push true
    True,
    /// Push false
    False,

    // ===== Locals =====
    /// Push local slot
    GetLocal(u16),
    /// Pop into local slot
    SetLocal(u16),

    // ===== Arithmetic =====
    /// Pop b, pop a, push a + b (numbers add, strings concatenate)
    Add,
    /// Pop b, pop a, push a - b
    Sub,
    /// Pop b, pop a, push a * b
    Mul,
    /// Pop b, pop a, push a / b
    Div,
    /// Pop a, push -a
    Neg,

    // ===== Comparison / logic =====
    /// Pop b, pop a, push a == b
    Eq,
    /// Pop b, pop a, push a != b
    Ne,
    /// Pop b, pop a, push a < b
    Lt,
    /// Pop b, pop a, push a <= b
    Le,
    /// Pop b, pop a, push a > b
    Gt,
    /// Pop b, pop a, push a >= b
    Ge,
    /// Pop a, push !truthy(a)
    Not,

    // ===== Control flow =====
    /// Unconditional jump to absolute instruction index
    Jump(u16),
    /// Pop condition, jump to absolute index if falsy
    JumpIfFalse(u16),

    // ===== Objects =====
    /// Pop object, push object[key]; key is a string constant
    GetField(u16),
    /// Pop value, pop object, object[key] = value; key is a string constant
    SetField(u16),

    // ===== Invocation =====
    /// Pop argc args then the callee, call with nil receiver, push result
    Call(u8),
    /// Push the currently-executing callable (recursion without a
    /// prototype-to-constant reference cycle)
    LoadSelf,
    /// Push the receiver bound for this call
    LoadThis,

    // ===== Stack manipulation =====
    /// Pop and discard top of stack
    Pop,
    /// Duplicate top of stack
    Dup,

    /// Return top of stack (nil if the stack is empty)
    Return,
}
