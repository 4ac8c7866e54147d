//! Call frame implementation for function calls

use crate::value::Function;

/// Call frame for one active function invocation
///
/// ## Stack Layout Example
///
/// ```text
/// Fixed-arity closure f(x, y) called with two arguments:
///
///   [f][x][y][r2][r3]...
///    ^  ^
///    |  base          R(0) = x, R(1) = y
///    return_base
///
/// Vararg closure g(x, ...) called with g(1, 2, 3):
///
///   [g][1][2][3][x=1][r1]...
///    ^  ^     ^  ^
///    |  |     |  base
///    |  varargs (2, 3) live just below base
///    return_base
/// ```
///
/// Results are written back starting at `return_base`, the slot that held
/// the callee, so that `CALL A` finds them in R(A) of the caller.
#[derive(Debug, Clone)]
pub struct CallStackFrame {
    /// The callable that created this frame
    pub function: Function,
    /// Absolute stack index of register 0
    pub base: usize,
    /// Absolute stack index where results are delivered
    pub return_base: usize,
    /// Extra arguments beyond the fixed parameters
    pub variable_argument_count: usize,
    /// Number of results the caller wants; `None` keeps all of them
    pub expected_results: Option<usize>,
    /// The frame replaced its caller through a tail call, so the call
    /// instruction that created it no longer exists
    pub is_tail_call: bool,
    /// Index of the next instruction to fetch; while a hook runs, the
    /// instruction about to execute
    pub pc: usize,
}

impl CallStackFrame {
    pub fn new(function: Function, base: usize, return_base: usize) -> Self {
        Self {
            function,
            base,
            return_base,
            variable_argument_count: 0,
            expected_results: None,
            is_tail_call: false,
            pc: 0,
        }
    }

    /// One past the highest register of this frame
    pub fn top(&self) -> usize {
        match self.function.as_closure() {
            Some(closure) => self.base + closure.chunk.max_stack_size as usize,
            None => self.base,
        }
    }
}
