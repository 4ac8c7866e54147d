//! Instruction pointer to source position mapping.

use crate::source::SourcePosition;
use crate::value::Function;
use crate::vm::CallStackFrame;

/// Source position of instruction `pc` in `frame`.
///
/// Guards are checked in order and any failure yields
/// [`SourcePosition::UNKNOWN`]:
/// 1. `pc` is non-negative
/// 2. the frame is not a tail call (its creating call site is gone)
/// 3. the frame runs a closure, and `pc` is inside its source map
pub fn source_position_for(frame: &CallStackFrame, pc: i32) -> SourcePosition {
    if pc < 0 || frame.is_tail_call {
        return SourcePosition::UNKNOWN;
    }
    match &frame.function {
        Function::Closure(closure) => closure
            .chunk
            .source_positions
            .get(pc as usize)
            .copied()
            .unwrap_or(SourcePosition::UNKNOWN),
        Function::Native(_) => SourcePosition::UNKNOWN,
    }
}
