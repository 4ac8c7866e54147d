//! Call-target resolution for in-flight call instructions.

use crate::bytecode::Instruction;
use crate::metamethod::Metamethod;
use crate::value::{Function, Value};
use crate::vm::{CallStackFrame, State, ValueStack};

/// The callable an instruction's register A would invoke
#[derive(Debug, Clone)]
pub struct CallTarget {
    pub function: Function,
    /// Reached through the value's `__call` handler rather than directly
    pub via_metamethod: bool,
}

impl CallTarget {
    pub fn is_direct(&self) -> bool {
        !self.via_metamethod
    }
}

/// Resolve `R(A)` of `frame` to a callable.
///
/// Absence is the common case (the instruction is not a call, or R(A) is
/// plain data) and is reported as `None`, never as an error. The metamethod
/// probe is a raw metatable read.
pub fn resolve_call_target(
    state: &State,
    stack: &ValueStack,
    frame: &CallStackFrame,
    instruction: Instruction,
) -> Option<CallTarget> {
    let register = frame.base + instruction.a() as usize;
    let value = stack.get(register);

    if let Value::Function(function) = value {
        return Some(CallTarget {
            function: function.clone(),
            via_metamethod: false,
        });
    }

    match value.metamethod(state, Metamethod::Call)? {
        Value::Function(handler) => Some(CallTarget {
            function: handler,
            via_metamethod: true,
        }),
        _ => None,
    }
}
