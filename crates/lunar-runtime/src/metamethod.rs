//! Metamethod event names
//!
//! A metamethod is a handler stored in a metatable under a well-known string
//! key. Tables carry their own metatable; every other type shares one
//! registered on the [`State`](crate::vm::State).

use std::fmt;

/// Metamethod events understood by the VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metamethod {
    Index,
    NewIndex,
    Call,
    Add,
    Sub,
    Mul,
    Div,
    Unm,
    Len,
    Eq,
    Lt,
    Le,
    Concat,
    ToString,
}

impl Metamethod {
    /// Metatable key for this event
    pub fn name(self) -> &'static str {
        match self {
            Metamethod::Index => "__index",
            Metamethod::NewIndex => "__newindex",
            Metamethod::Call => "__call",
            Metamethod::Add => "__add",
            Metamethod::Sub => "__sub",
            Metamethod::Mul => "__mul",
            Metamethod::Div => "__div",
            Metamethod::Unm => "__unm",
            Metamethod::Len => "__len",
            Metamethod::Eq => "__eq",
            Metamethod::Lt => "__lt",
            Metamethod::Le => "__le",
            Metamethod::Concat => "__concat",
            Metamethod::ToString => "__tostring",
        }
    }
}

impl fmt::Display for Metamethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
