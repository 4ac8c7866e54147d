//! Register bytecode
//!
//! Fixed-width 32-bit instructions over a per-frame register window, in the
//! classic A/B/C operand layout. Chunks are produced by an external compiler
//! (or by [`ChunkBuilder`] in tests and tools) and loaded as JSON.

mod chunk;
pub mod disasm;
mod instruction;
mod opcode;
pub mod validator;

pub use chunk::{Chunk, ChunkBuilder, Constant};
pub use disasm::{disassemble, disassemble_instruction};
pub use instruction::{Instruction, MAX_A, MAX_B, MAX_BX, MAX_C, MAX_SBX};
pub use opcode::Opcode;
pub use validator::{validate, ValidationError, ValidationErrorKind};
