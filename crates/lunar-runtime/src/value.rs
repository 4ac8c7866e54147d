//! Runtime value representation
//!
//! Values are cheap to clone: strings, tables and functions are all
//! reference-counted handles. Tables and functions compare by identity,
//! everything else by value.

use crate::bytecode::Chunk;
use crate::metamethod::Metamethod;
use crate::native::NativeFunction;
use crate::source::SourcePosition;
use crate::table::TableRef;
use crate::vm::State;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Runtime value type
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    /// IEEE 754 double-precision number
    Number(f64),
    /// Immutable, reference-counted string
    String(Arc<str>),
    /// Table handle (reference semantics)
    Table(TableRef),
    /// Compiled closure or native function
    Function(Function),
}

/// Type tag of a [`Value`], used to key the per-type metatable registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Nil,
    Boolean,
    Number,
    String,
    Table,
    Function,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Nil => "nil",
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Table => "table",
            ValueType::Function => "function",
        }
    }
}

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Nil => ValueType::Nil,
            Value::Bool(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Table(_) => ValueType::Table,
            Value::Function(_) => ValueType::Function,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Only nil and false are falsy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Look up a metamethod handler for this value
    ///
    /// Tables consult their own metatable; all other types consult the
    /// state's per-type registry. The lookup is a raw read and never runs
    /// script code. Returns `None` when no handler is set.
    pub fn metamethod(&self, state: &State, event: Metamethod) -> Option<Value> {
        let metatable = match self {
            Value::Table(t) => t.metatable(),
            other => state.type_metatable(other.value_type()),
        }?;
        let handler = metatable.raw_get_str(event.name());
        if handler.is_nil() {
            None
        } else {
            Some(handler)
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Table(t) => write!(f, "table: {:p}", t.as_ptr()),
            Value::Function(func) => write!(f, "function: {}", func.name()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<TableRef> for Value {
    fn from(t: TableRef) -> Self {
        Value::Table(t)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

// ── Callables ───────────────────────────────────────────────────────────────

/// A compiled function instance
#[derive(Debug)]
pub struct Closure {
    pub chunk: Arc<Chunk>,
}

impl Closure {
    pub fn new(chunk: Arc<Chunk>) -> Self {
        Self { chunk }
    }

    pub fn name(&self) -> &str {
        &self.chunk.name
    }
}

/// Callable entity: a compiled closure or a native function
///
/// Code that needs closure-only data (the bytecode and its source map)
/// matches on the variant.
#[derive(Clone)]
pub enum Function {
    Closure(Arc<Closure>),
    Native(Arc<NativeFunction>),
}

impl Function {
    pub fn closure(chunk: Arc<Chunk>) -> Self {
        Function::Closure(Arc::new(Closure::new(chunk)))
    }

    pub fn name(&self) -> &str {
        match self {
            Function::Closure(c) => c.name(),
            Function::Native(n) => &n.name,
        }
    }

    pub fn as_closure(&self) -> Option<&Closure> {
        match self {
            Function::Closure(c) => Some(c),
            Function::Native(_) => None,
        }
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Closure(a), Function::Closure(b)) => Arc::ptr_eq(a, b),
            (Function::Native(a), Function::Native(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Closure(c) => write!(f, "Closure({})", c.name()),
            Function::Native(n) => write!(f, "Native({})", n.name),
        }
    }
}

// ── Errors ──────────────────────────────────────────────────────────────────

/// Runtime error type
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Invalid argument to a library function (1-based position)
    #[error("bad argument #{position} to '{function}' ({message})")]
    BadArgument {
        position: usize,
        function: String,
        message: String,
    },
    /// Operation not supported by the operand type
    #[error("attempt to {action} a {type_name} value")]
    TypeError {
        action: &'static str,
        type_name: &'static str,
    },
    /// Called a value with no function and no `__call` handler
    #[error("attempt to call a {type_name} value")]
    NotCallable { type_name: &'static str },
    /// Too many nested calls
    #[error("stack overflow (call depth exceeded {limit})")]
    StackOverflow { limit: usize },
    /// Undecodable instruction word
    #[error("invalid instruction 0x{raw:08x} at pc {pc}")]
    InvalidInstruction { pc: usize, raw: u32 },
    /// Chunk failed validation
    #[error("invalid chunk '{chunk}': {reason}")]
    InvalidChunk { chunk: String, reason: String },
    /// Table key that cannot be stored
    #[error("invalid table key: {message}")]
    InvalidKey { message: String },
    /// Error raised while executing a closure, tagged with its location
    #[error("{}: {source}", location_label(.chunk, .position))]
    At {
        chunk: String,
        position: SourcePosition,
        source: Box<RuntimeError>,
    },
}

fn location_label(chunk: &str, position: &SourcePosition) -> String {
    if position.is_unknown() {
        chunk.to_string()
    } else {
        format!("{}:{}", chunk, position)
    }
}

impl RuntimeError {
    /// Strip location wrappers
    pub fn root(&self) -> &RuntimeError {
        match self {
            RuntimeError::At { source, .. } => source.root(),
            other => other,
        }
    }

    /// Innermost known source position, if any wrapper carries one
    pub fn position(&self) -> Option<SourcePosition> {
        match self {
            RuntimeError::At {
                position, source, ..
            } => source
                .position()
                .or_else(|| (!position.is_unknown()).then_some(*position)),
            _ => None,
        }
    }
}
