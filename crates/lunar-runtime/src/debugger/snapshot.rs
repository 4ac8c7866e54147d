//! Execution snapshot handed to debug hooks.
//!
//! A [`HookSnapshot`] is a view of the interpreter at one instruction
//! boundary. It is built by the VM right before the instruction executes,
//! passed to the hook by shared reference, and dropped when the hook
//! returns.
//!
//! The snapshot only borrows: the thread, the global state, the register
//! stack and the current frame all stay owned by the VM, which resumes
//! mutating them as soon as the hook returns. The lifetime `'a` ties the
//! snapshot to that window, so it cannot be stored past the hook call.
//!
//! Construction does no work beyond copying references. Call-target and
//! source-position information is derived only when the hook asks for it:
//!
//! ```rust
//! use lunar_runtime::bytecode::{ChunkBuilder, Opcode};
//! use lunar_runtime::debugger::HookSnapshot;
//! use lunar_runtime::vm::{HookTrigger, VM};
//!
//! let mut b = ChunkBuilder::new("main");
//! b.op(Opcode::LoadNil, 0, 0, 0, 1);
//! b.op(Opcode::Return, 0, 1, 0, 2);
//!
//! let mut vm = VM::new();
//! let main = vm.load(b.build()).unwrap();
//!
//! let mut lines = Vec::new();
//! let mut hook = |snap: &HookSnapshot<'_>| lines.push(snap.source_position().line);
//! vm.call_with_hook(&main, &[], &mut hook, HookTrigger::EveryInstruction).unwrap();
//! assert_eq!(lines, vec![1, 2]);
//! ```

use super::call_target::{resolve_call_target, CallTarget};
use super::source_map::source_position_for;
use crate::bytecode::{Chunk, Instruction};
use crate::source::SourcePosition;
use crate::vm::{CallStackFrame, State, Thread, ValueStack};
use std::marker::PhantomData;

// ── HookSnapshot ─────────────────────────────────────────────────────────────

/// Borrowed, immutable view of the VM at one instruction boundary.
///
/// Not `Send` or `Sync`: a snapshot belongs to the thread whose hook
/// produced it. Inspecting another interpreter thread means taking a
/// snapshot on that thread.
#[derive(Clone, Copy)]
pub struct HookSnapshot<'a> {
    thread: &'a Thread,
    state: &'a State,
    stack: &'a ValueStack,
    frame: &'a CallStackFrame,
    pc: i32,
    instruction: Instruction,
    _not_send: PhantomData<*const ()>,
}

impl<'a> HookSnapshot<'a> {
    /// Capture the current execution context.
    ///
    /// `pc` is the index of `instruction` in the running function; a
    /// negative value means no instruction position is available.
    pub fn new(
        thread: &'a Thread,
        state: &'a State,
        stack: &'a ValueStack,
        frame: &'a CallStackFrame,
        pc: i32,
        instruction: Instruction,
    ) -> Self {
        Self {
            thread,
            state,
            stack,
            frame,
            pc,
            instruction,
            _not_send: PhantomData,
        }
    }

    pub fn thread(&self) -> &'a Thread {
        self.thread
    }

    pub fn state(&self) -> &'a State {
        self.state
    }

    pub fn stack(&self) -> &'a ValueStack {
        self.stack
    }

    /// Innermost active frame
    pub fn frame(&self) -> &'a CallStackFrame {
        self.frame
    }

    /// Instruction pointer, negative when unavailable
    pub fn pc(&self) -> i32 {
        self.pc
    }

    /// The instruction about to execute
    pub fn instruction(&self) -> Instruction {
        self.instruction
    }

    /// Absolute stack index of the frame's register 0
    pub fn frame_base(&self) -> usize {
        self.frame.base
    }

    pub fn variable_argument_count(&self) -> usize {
        self.frame.variable_argument_count
    }

    /// Bytecode of the running function, `None` for a native frame
    pub fn closure_chunk(&self) -> Option<&'a Chunk> {
        self.frame.function.as_closure().map(|c| c.chunk.as_ref())
    }

    /// What the instruction's register A would invoke.
    ///
    /// Reads `R(A)` of the current frame. A function is returned as a direct
    /// target; a value whose type has a callable `__call` handler yields that
    /// handler, flagged as metamethod-mediated. Anything else (including a
    /// non-call instruction whose A register holds data) yields `None`.
    ///
    /// The lookup never mutates the stack or any table.
    pub fn call_target(&self) -> Option<CallTarget> {
        resolve_call_target(self.state, self.stack, self.frame, self.instruction)
    }

    /// Source location of the current instruction.
    ///
    /// Total: returns [`SourcePosition::UNKNOWN`] when the pc is negative,
    /// the frame is a tail call, the function is native, or the pc is past
    /// the end of the source map.
    pub fn source_position(&self) -> SourcePosition {
        source_position_for(self.frame, self.pc)
    }
}

impl std::fmt::Debug for HookSnapshot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSnapshot")
            .field("thread", &self.thread.id())
            .field("function", &self.frame.function)
            .field("base", &self.frame.base)
            .field("pc", &self.pc)
            .field("instruction", &self.instruction)
            .finish()
    }
}
