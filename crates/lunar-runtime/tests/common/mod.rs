//! Shared helpers for runtime integration tests

#![allow(dead_code)]

use lunar_runtime::bytecode::{Chunk, ChunkBuilder, Instruction, Opcode};
use lunar_runtime::native::FunctionContext;
use lunar_runtime::vm::{HookTrigger, State};
use lunar_runtime::{Function, HookSnapshot, NativeFunction, RuntimeError, SourcePosition, Value, VM};
use std::sync::Arc;

pub use pretty_assertions::{assert_eq, assert_ne};

/// What a hook saw at one instruction boundary
#[derive(Debug, Clone, PartialEq)]
pub struct Observed {
    pub function: String,
    pub depth: usize,
    pub base: usize,
    pub pc: i32,
    pub opcode: Option<Opcode>,
    pub position: SourcePosition,
    /// Target name and whether it came through `__call`
    pub target: Option<(String, bool)>,
    pub is_tail_call: bool,
    pub varargs: usize,
}

impl Observed {
    pub fn capture(snap: &HookSnapshot<'_>) -> Self {
        Self {
            function: snap.frame().function.name().to_string(),
            depth: snap.thread().depth(),
            base: snap.frame_base(),
            pc: snap.pc(),
            opcode: snap.instruction().opcode(),
            position: snap.source_position(),
            target: snap
                .call_target()
                .map(|t| (t.function.name().to_string(), t.via_metamethod)),
            is_tail_call: snap.frame().is_tail_call,
            varargs: snap.variable_argument_count(),
        }
    }
}

/// Call `function` with a hook that records every firing
pub fn observe(
    vm: &mut VM,
    function: &Value,
    args: &[Value],
    trigger: HookTrigger,
) -> (Result<Vec<Value>, RuntimeError>, Vec<Observed>) {
    let mut seen = Vec::new();
    let mut hook = |snap: &HookSnapshot<'_>| seen.push(Observed::capture(snap));
    let result = vm.call_with_hook(function, args, &mut hook, trigger);
    (result, seen)
}

/// Native function value that is not registered anywhere
pub fn native<F>(name: &str, func: F) -> Value
where
    F: Fn(&FunctionContext<'_>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
{
    Value::Function(Function::Native(Arc::new(NativeFunction::new(name, func))))
}

/// Register a native that returns its first argument plus one
pub fn register_increment(state: &State) {
    state.register_function("inc", |ctx| Ok(Value::Number(ctx.number_argument(0)? + 1.0)));
}

/// Emit `GETGLOBAL a name` on `line`
pub fn get_global(b: &mut ChunkBuilder, a: u32, name: &str, line: u32) -> usize {
    let k = b.add_constant(name);
    b.emit(Instruction::abx(Opcode::GetGlobal, a, k), SourcePosition::new(line, 1))
}

/// Emit `LOADK a number` on `line`
pub fn load_number(b: &mut ChunkBuilder, a: u32, n: f64, line: u32) -> usize {
    let k = b.add_constant(n);
    b.emit(Instruction::abx(Opcode::LoadK, a, k), SourcePosition::new(line, 1))
}

/// Emit `CLOSURE a <nested>` on `line`
pub fn closure(b: &mut ChunkBuilder, a: u32, nested: Chunk, line: u32) -> usize {
    let index = b.add_function(nested);
    b.emit(Instruction::abx(Opcode::Closure, a, index), SourcePosition::new(line, 1))
}

/// Table value holding `values` in its array part
pub fn numbers(values: &[f64]) -> Value {
    Value::Table(lunar_runtime::TableRef::from_numbers(values.iter().copied()))
}

/// Numbers in the array part of a table value
pub fn table_numbers(value: &Value) -> Vec<f64> {
    value
        .as_table()
        .expect("expected a table")
        .with(|t| t.array.iter().map(|v| v.as_number().expect("number")).collect())
}
