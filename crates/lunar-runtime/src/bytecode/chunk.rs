//! Compiled function prototypes

use super::validator::highest_register;
use super::{Instruction, Opcode};
use crate::source::SourcePosition;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Constant pool entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constant {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Constant {
    pub fn to_value(&self) -> Value {
        match self {
            Constant::Nil => Value::Nil,
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Number(n) => Value::Number(*n),
            Constant::String(s) => Value::string(s.as_str()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Constant {
    fn from(n: f64) -> Self {
        Constant::Number(n)
    }
}

impl From<&str> for Constant {
    fn from(s: &str) -> Self {
        Constant::String(s.to_string())
    }
}

impl From<bool> for Constant {
    fn from(b: bool) -> Self {
        Constant::Bool(b)
    }
}

/// A compiled function
///
/// `source_positions[pc]` is the location of `code[pc]`. The map may be
/// shorter than `code` (stripped or partial debug info); lookups past its
/// end report an unknown position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub name: String,
    #[serde(default)]
    pub parameter_count: u8,
    #[serde(default)]
    pub is_vararg: bool,
    /// Number of registers the frame needs
    #[serde(default)]
    pub max_stack_size: u16,
    pub code: Vec<Instruction>,
    #[serde(default)]
    pub constants: Vec<Constant>,
    #[serde(default)]
    pub source_positions: Vec<SourcePosition>,
    /// Nested prototypes referenced by `CLOSURE`
    #[serde(default)]
    pub functions: Vec<Arc<Chunk>>,
}

impl Chunk {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter_count: 0,
            is_vararg: false,
            max_stack_size: 0,
            code: Vec::new(),
            constants: Vec::new(),
            source_positions: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Parse a chunk from its JSON form
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Incremental chunk construction
///
/// Keeps `code` and `source_positions` the same length and computes
/// `max_stack_size` from the registers the code touches.
#[derive(Debug)]
pub struct ChunkBuilder {
    chunk: Chunk,
}

impl ChunkBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            chunk: Chunk::new(name),
        }
    }

    pub fn parameters(mut self, count: u8) -> Self {
        self.chunk.parameter_count = count;
        self
    }

    pub fn vararg(mut self) -> Self {
        self.chunk.is_vararg = true;
        self
    }

    /// Append an instruction, returning its pc
    pub fn emit(&mut self, instruction: Instruction, position: SourcePosition) -> usize {
        self.chunk.code.push(instruction);
        self.chunk.source_positions.push(position);
        self.chunk.code.len() - 1
    }

    /// Shorthand for an iABC instruction on `line`
    pub fn op(&mut self, op: Opcode, a: u32, b: u32, c: u32, line: u32) -> usize {
        self.emit(Instruction::abc(op, a, b, c), SourcePosition::new(line, 1))
    }

    /// Add a constant, reusing an existing equal entry
    pub fn add_constant(&mut self, constant: impl Into<Constant>) -> u32 {
        let constant = constant.into();
        if let Some(index) = self.chunk.constants.iter().position(|c| *c == constant) {
            return index as u32;
        }
        self.chunk.constants.push(constant);
        (self.chunk.constants.len() - 1) as u32
    }

    pub fn add_function(&mut self, chunk: Chunk) -> u32 {
        self.chunk.functions.push(Arc::new(chunk));
        (self.chunk.functions.len() - 1) as u32
    }

    /// Index the next emitted instruction will get
    pub fn current_pc(&self) -> usize {
        self.chunk.code.len()
    }

    /// Point the `JMP` at `jump_pc` to `target`
    pub fn patch_jump(&mut self, jump_pc: usize, target: usize) {
        let offset = target as i32 - (jump_pc as i32 + 1);
        let a = self.chunk.code[jump_pc].a();
        self.chunk.code[jump_pc] = Instruction::asbx(Opcode::Jmp, a, offset);
    }

    pub fn build(mut self) -> Chunk {
        let used = self
            .chunk
            .code
            .iter()
            .filter_map(|instr| instr.opcode().and_then(|op| highest_register(*instr, op)))
            .map(|r| r + 1)
            .max()
            .unwrap_or(0);
        let params = self.chunk.parameter_count as u32;
        self.chunk.max_stack_size = used.max(params) as u16;
        self.chunk
    }
}
