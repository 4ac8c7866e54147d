//! Interpreter threads
//!
//! A thread is one independent instruction stream: its own register stack
//! and its own chain of call frames.

use super::frame::CallStackFrame;
use super::stack::ValueStack;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub struct Thread {
    id: u64,
    pub(crate) stack: ValueStack,
    pub(crate) frames: Vec<CallStackFrame>,
}

impl Thread {
    pub fn new(stack_capacity: usize) -> Self {
        Self {
            id: NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed),
            stack: ValueStack::with_capacity(stack_capacity),
            frames: Vec::new(),
        }
    }

    /// Process-unique thread identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn stack(&self) -> &ValueStack {
        &self.stack
    }

    /// Innermost active frame
    pub fn current_frame(&self) -> Option<&CallStackFrame> {
        self.frames.last()
    }

    /// Active frames, outermost first
    pub fn frames(&self) -> &[CallStackFrame] {
        &self.frames
    }

    /// Number of active frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for Thread {
    fn default() -> Self {
        Self::new(lunar_config::loader::DEFAULT_STACK_CAPACITY)
    }
}
