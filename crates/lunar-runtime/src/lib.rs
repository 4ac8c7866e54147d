//! Lunar Runtime - register bytecode VM with execution introspection
//!
//! This library provides:
//! - A chunk model with per-instruction source positions, plus a validator
//!   and disassembler
//! - A register VM over reference-semantics tables with metatables
//! - Debug hooks that receive a read-only [`HookSnapshot`] of the running
//!   thread, with call-target and source-position queries
//! - The `vec3`, `vec4` and `mat4` numeric libraries

/// Lunar runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod bytecode;
pub mod debugger;
pub mod metamethod;
pub mod native;
pub mod source;
pub mod stdlib;
pub mod table;
pub mod value;
pub mod vm;

// Re-export commonly used types
pub use bytecode::{Chunk, ChunkBuilder, Instruction, Opcode};
pub use debugger::{CallTarget, HookSnapshot, Profiler, Tracer};
pub use metamethod::Metamethod;
pub use native::{FunctionContext, NativeFunction};
pub use source::SourcePosition;
pub use table::TableRef;
pub use value::{Function, RuntimeError, Value};
pub use vm::{CallStackFrame, DebugHook, HookTrigger, State, Thread, VM};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke() {
        assert_eq!(VERSION, "0.1.0");
    }
}
