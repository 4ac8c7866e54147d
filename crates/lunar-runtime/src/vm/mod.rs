//! Register virtual machine
//!
//! Executes validated [`Chunk`]s over a single [`Thread`]. A debug hook may be
//! installed; it fires synchronously before an instruction executes and
//! receives a borrowed [`HookSnapshot`] of the live thread.

mod frame;
mod hook;
mod stack;
mod state;
mod thread;

pub use frame::CallStackFrame;
pub use hook::{DebugHook, HookTrigger};
pub use stack::ValueStack;
pub use state::State;
pub use thread::Thread;

use crate::bytecode::{validate, Chunk, Instruction, Opcode};
use crate::debugger::{source_position_for, HookSnapshot};
use crate::metamethod::Metamethod;
use crate::native::{FunctionContext, NativeFunction};
use crate::table::TableRef;
use crate::value::{Closure, Function, RuntimeError, Value};
use lunar_config::Config;
use std::sync::Arc;
use tracing::{debug, trace};

/// Longest `__index` table chain followed before giving up
const MAX_INDEX_CHAIN: usize = 100;

/// Hook borrowed for the duration of one host call
type ActiveHook<'h> = Option<(&'h mut dyn DebugHook, HookTrigger)>;

/// Virtual machine state
pub struct VM {
    state: State,
    thread: Thread,
    max_call_depth: usize,
    hook: Option<(Box<dyn DebugHook>, HookTrigger)>,
    instructions_executed: u64,
}

impl VM {
    /// Create a VM with default limits and no libraries opened
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Create a VM using the `[runtime]` limits of a config
    pub fn with_config(config: &Config) -> Self {
        Self {
            state: State::new(),
            thread: Thread::new(config.stack_capacity()),
            max_call_depth: config.max_call_depth(),
            hook: None,
            instructions_executed: 0,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    pub fn set_max_call_depth(&mut self, depth: usize) {
        self.max_call_depth = depth.max(1);
    }

    /// Total instructions executed since the VM was created
    pub fn instructions_executed(&self) -> u64 {
        self.instructions_executed
    }

    /// Install a hook that stays active across calls
    pub fn set_hook(&mut self, hook: Box<dyn DebugHook>, trigger: HookTrigger) {
        debug!(?trigger, "debug hook installed");
        self.hook = Some((hook, trigger));
    }

    pub fn clear_hook(&mut self) {
        self.hook = None;
    }

    /// Remove and return the installed hook
    pub fn take_hook(&mut self) -> Option<Box<dyn DebugHook>> {
        self.hook.take().map(|(hook, _)| hook)
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Validate a chunk and wrap it in a closure value
    pub fn load(&self, chunk: Chunk) -> Result<Value, RuntimeError> {
        if let Some(error) = validate(&chunk).into_iter().next() {
            return Err(RuntimeError::InvalidChunk {
                chunk: error.chunk.clone(),
                reason: error.to_string(),
            });
        }
        debug!(
            chunk = %chunk.name,
            instructions = chunk.code.len(),
            functions = chunk.functions.len(),
            "chunk loaded"
        );
        Ok(Value::Function(Function::closure(Arc::new(chunk))))
    }

    /// Load a chunk and call it with no arguments
    pub fn run(&mut self, chunk: Chunk) -> Result<Vec<Value>, RuntimeError> {
        let main = self.load(chunk)?;
        self.call(&main, &[])
    }

    /// Call a value, running the installed hook if any
    pub fn call(&mut self, function: &Value, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        let mut installed = self.hook.take();
        let hook = installed
            .as_mut()
            .map(|(hook, trigger)| (hook.as_mut() as &mut dyn DebugHook, *trigger));
        let result = self.call_internal(function, args, hook);
        self.hook = installed;
        result
    }

    /// Call a value with a hook borrowed for this call only
    ///
    /// Any installed hook is not run during this call.
    pub fn call_with_hook(
        &mut self,
        function: &Value,
        args: &[Value],
        hook: &mut dyn DebugHook,
        trigger: HookTrigger,
    ) -> Result<Vec<Value>, RuntimeError> {
        self.call_internal(function, args, Some((hook, trigger)))
    }

    // ── Call machinery ──────────────────────────────────────────────────────

    fn call_internal(
        &mut self,
        function: &Value,
        args: &[Value],
        mut hook: ActiveHook<'_>,
    ) -> Result<Vec<Value>, RuntimeError> {
        let entry_depth = self.thread.depth();
        let func_slot = self.thread.stack.len();
        debug!(function = %function, args = args.len(), "call");

        self.thread.stack.push(function.clone());
        for arg in args {
            self.thread.stack.push(arg.clone());
        }

        let result = self
            .resolve_callable(func_slot, args.len())
            .and_then(|(callee, nargs)| match callee {
                Function::Native(native) => self
                    .invoke_native(&native, func_slot, nargs, None)
                    .map(|value| vec![value]),
                Function::Closure(closure) => {
                    self.enter_closure(closure, func_slot, nargs, None)?;
                    self.execute(entry_depth, &mut hook)
                }
            });

        if let Err(err) = &result {
            debug!(error = %err, "call failed, unwinding");
            self.thread.frames.truncate(entry_depth);
        }
        self.thread.stack.truncate(func_slot);
        result
    }

    /// Find the function to run for the value in `func_slot`
    ///
    /// A non-function with a `__call` handler is replaced by the handler and
    /// passed as the first argument. Returns the function and the final
    /// argument count.
    fn resolve_callable(
        &mut self,
        func_slot: usize,
        nargs: usize,
    ) -> Result<(Function, usize), RuntimeError> {
        let callee = self.thread.stack.get(func_slot).clone();
        if let Value::Function(function) = callee {
            return Ok((function, nargs));
        }

        match callee.metamethod(&self.state, Metamethod::Call) {
            Some(Value::Function(handler)) => {
                let stack = &mut self.thread.stack;
                for i in (0..nargs).rev() {
                    let arg = stack.get(func_slot + 1 + i).clone();
                    stack.set(func_slot + 2 + i, arg);
                }
                stack.set(func_slot + 1, callee);
                stack.set(func_slot, Value::Function(handler.clone()));
                Ok((handler, nargs + 1))
            }
            _ => Err(RuntimeError::NotCallable {
                type_name: callee.type_name(),
            }),
        }
    }

    fn check_depth(&self) -> Result<(), RuntimeError> {
        if self.thread.depth() >= self.max_call_depth {
            return Err(RuntimeError::StackOverflow {
                limit: self.max_call_depth,
            });
        }
        Ok(())
    }

    /// Push a frame for a closure whose arguments sit above `func_slot`
    fn enter_closure(
        &mut self,
        closure: Arc<Closure>,
        func_slot: usize,
        nargs: usize,
        expected_results: Option<usize>,
    ) -> Result<(), RuntimeError> {
        self.check_depth()?;

        let chunk = &closure.chunk;
        let params = chunk.parameter_count as usize;
        let frame_size = (chunk.max_stack_size as usize).max(params);
        let stack = &mut self.thread.stack;

        let (base, variable_argument_count) = if chunk.is_vararg {
            // Fixed parameters move above the varargs, which stay in place
            let base = func_slot + 1 + nargs;
            for i in 0..params {
                let value = if i < nargs {
                    stack.get(func_slot + 1 + i).clone()
                } else {
                    Value::Nil
                };
                stack.set(base + i, value);
            }
            (base, nargs.saturating_sub(params))
        } else {
            let base = func_slot + 1;
            for i in nargs..params {
                stack.set(base + i, Value::Nil);
            }
            (base, 0)
        };

        // Registers past the parameters start out nil
        for i in params..frame_size {
            stack.set(base + i, Value::Nil);
        }
        stack.ensure_len(base + frame_size);

        trace!(
            function = %chunk.name,
            base,
            varargs = variable_argument_count,
            depth = self.thread.depth() + 1,
            "enter"
        );

        self.thread.frames.push(CallStackFrame {
            function: Function::Closure(closure),
            base,
            return_base: func_slot,
            variable_argument_count,
            expected_results,
            is_tail_call: false,
            pc: 0,
        });
        Ok(())
    }

    /// Run a native function inside its own frame
    fn invoke_native(
        &mut self,
        native: &Arc<NativeFunction>,
        func_slot: usize,
        nargs: usize,
        expected_results: Option<usize>,
    ) -> Result<Value, RuntimeError> {
        self.check_depth()?;

        let args = self
            .thread
            .stack
            .copy_range(func_slot + 1..func_slot + 1 + nargs);
        let mut frame =
            CallStackFrame::new(Function::Native(Arc::clone(native)), func_slot + 1, func_slot);
        frame.expected_results = expected_results;
        self.thread.frames.push(frame);

        trace!(function = %native.name, args = nargs, "native call");
        let result = native.invoke(&FunctionContext::new(&self.state, &args, &native.name));
        self.thread.frames.pop();
        result
    }

    /// Write results for the caller, padding or truncating to `expected`
    fn place_results(&mut self, return_base: usize, values: Vec<Value>, expected: Option<usize>) {
        let count = expected.unwrap_or(values.len());
        let mut values = values.into_iter();
        for i in 0..count {
            self.thread
                .stack
                .set(return_base + i, values.next().unwrap_or(Value::Nil));
        }
    }

    /// Pop the current frame and deliver its results
    ///
    /// Returns the values when the frame was the outermost one of this host
    /// call, `None` when execution continues in the caller.
    fn return_from_frame(&mut self, values: Vec<Value>, entry_depth: usize) -> Option<Vec<Value>> {
        let frame = match self.thread.frames.pop() {
            Some(frame) => frame,
            None => return Some(values),
        };
        trace!(
            function = frame.function.name(),
            results = values.len(),
            "return"
        );

        if self.thread.depth() <= entry_depth {
            return Some(values);
        }

        let delivered = frame.expected_results.unwrap_or(values.len());
        self.place_results(frame.return_base, values, frame.expected_results);
        let caller_top = self.thread.current_frame().map_or(0, CallStackFrame::top);
        self.thread
            .stack
            .truncate(caller_top.max(frame.return_base + delivered));
        None
    }

    // ── Interpreter loop ────────────────────────────────────────────────────

    fn execute(
        &mut self,
        entry_depth: usize,
        hook: &mut ActiveHook<'_>,
    ) -> Result<Vec<Value>, RuntimeError> {
        loop {
            let (chunk, base, pc) = match self.thread.frames.last() {
                Some(frame) => match &frame.function {
                    Function::Closure(closure) => {
                        (Arc::clone(&closure.chunk), frame.base, frame.pc)
                    }
                    Function::Native(_) => unreachable!("native frames never run bytecode"),
                },
                None => return Ok(Vec::new()),
            };

            // Falling off the end is an implicit `return` with no values
            let instr = match chunk.code.get(pc) {
                Some(instr) => *instr,
                None => match self.return_from_frame(Vec::new(), entry_depth) {
                    Some(values) => return Ok(values),
                    None => continue,
                },
            };

            let op = match instr.opcode() {
                Some(op) => op,
                None => {
                    let err = RuntimeError::InvalidInstruction {
                        pc,
                        raw: instr.raw(),
                    };
                    return Err(self.locate(&chunk, pc, err));
                }
            };

            self.instructions_executed += 1;
            if let Some((hook, trigger)) = hook.as_mut() {
                if trigger.should_fire(op, self.instructions_executed) {
                    if let Some(frame) = self.thread.frames.last() {
                        let snapshot = HookSnapshot::new(
                            &self.thread,
                            &self.state,
                            &self.thread.stack,
                            frame,
                            pc as i32,
                            instr,
                        );
                        hook.on_instruction(&snapshot);
                    }
                }
            }

            if let Some(frame) = self.thread.frames.last_mut() {
                frame.pc = pc + 1;
            }

            match self.step(&chunk, base, pc, instr, op, entry_depth) {
                Ok(Some(values)) => return Ok(values),
                Ok(None) => {}
                Err(err) => return Err(self.locate(&chunk, pc, err)),
            }
        }
    }

    /// Tag an error with the chunk and source position of the faulting pc
    fn locate(&self, chunk: &Chunk, pc: usize, err: RuntimeError) -> RuntimeError {
        let position = self
            .thread
            .current_frame()
            .map(|frame| source_position_for(frame, pc as i32))
            .unwrap_or_default();
        debug!(chunk = %chunk.name, pc, %position, error = %err, "runtime error");
        RuntimeError::At {
            chunk: chunk.name.clone(),
            position,
            source: Box::new(err),
        }
    }

    /// Execute one decoded instruction
    fn step(
        &mut self,
        chunk: &Chunk,
        base: usize,
        pc: usize,
        instr: Instruction,
        op: Opcode,
        entry_depth: usize,
    ) -> Result<Option<Vec<Value>>, RuntimeError> {
        let a = instr.a() as usize;
        let b = instr.b() as usize;
        let c = instr.c() as usize;
        let ra = base + a;

        match op {
            Opcode::Move => {
                let value = self.register(base + b);
                self.set_register(ra, value);
            }
            Opcode::LoadK => {
                let value = constant(chunk, instr.bx())?;
                self.set_register(ra, value);
            }
            Opcode::LoadNil => {
                for i in 0..=b {
                    self.set_register(ra + i, Value::Nil);
                }
            }
            Opcode::LoadBool => {
                self.set_register(ra, Value::Bool(b != 0));
                if c != 0 {
                    self.jump_to(pc + 2);
                }
            }
            Opcode::GetGlobal => {
                let value = self.state.global(constant_name(chunk, instr.bx())?);
                self.set_register(ra, value);
            }
            Opcode::SetGlobal => {
                let name = constant_name(chunk, instr.bx())?;
                self.state.set_global(name, self.register(ra));
            }
            Opcode::NewTable => {
                self.set_register(ra, Value::Table(TableRef::new()));
            }
            Opcode::GetField => {
                let key = Value::string(constant_name(chunk, c as u32)?);
                let value = self.get_field(&self.register(base + b), &key)?;
                self.set_register(ra, value);
            }
            Opcode::SetField => {
                let key = Value::string(constant_name(chunk, b as u32)?);
                set_field(&self.register(ra), &key, self.register(base + c))?;
            }
            Opcode::GetIndex => {
                let value = self.get_field(&self.register(base + b), &self.register(base + c))?;
                self.set_register(ra, value);
            }
            Opcode::SetIndex => {
                set_field(
                    &self.register(ra),
                    &self.register(base + b),
                    self.register(base + c),
                )?;
            }
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                let value = arithmetic(op, &self.register(base + b), &self.register(base + c))?;
                self.set_register(ra, value);
            }
            Opcode::Unm => {
                let value = match self.register(base + b) {
                    Value::Number(n) => Value::Number(-n),
                    other => {
                        return Err(RuntimeError::TypeError {
                            action: "perform arithmetic on",
                            type_name: other.type_name(),
                        })
                    }
                };
                self.set_register(ra, value);
            }
            Opcode::Not => {
                let value = Value::Bool(!self.register(base + b).is_truthy());
                self.set_register(ra, value);
            }
            Opcode::Len => {
                let value = match self.register(base + b) {
                    Value::Table(t) => Value::Number(t.array_length() as f64),
                    Value::String(s) => Value::Number(s.len() as f64),
                    other => {
                        return Err(RuntimeError::TypeError {
                            action: "get length of",
                            type_name: other.type_name(),
                        })
                    }
                };
                self.set_register(ra, value);
            }
            Opcode::Eq => {
                let equal = self.register(base + b) == self.register(base + c);
                self.set_register(ra, Value::Bool(equal));
            }
            Opcode::Lt | Opcode::Le => {
                let value = compare(op, &self.register(base + b), &self.register(base + c))?;
                self.set_register(ra, Value::Bool(value));
            }
            Opcode::Test => {
                if self.register(ra).is_truthy() != (c != 0) {
                    self.jump_to(pc + 2);
                }
            }
            Opcode::Jmp => {
                let target = pc as i64 + 1 + instr.sbx() as i64;
                self.jump_to(target.max(0) as usize);
            }
            Opcode::Call => {
                let (callee, nargs) = self.resolve_callable(ra, b)?;
                let expected = Some(c);
                match callee {
                    Function::Closure(closure) => self.enter_closure(closure, ra, nargs, expected)?,
                    Function::Native(native) => {
                        let value = self.invoke_native(&native, ra, nargs, expected)?;
                        self.place_results(ra, vec![value], expected);
                    }
                }
            }
            Opcode::TailCall => {
                let (callee, nargs) = self.resolve_callable(ra, b)?;
                match callee {
                    Function::Native(native) => {
                        let value = self.invoke_native(&native, ra, nargs, None)?;
                        return Ok(self.return_from_frame(vec![value], entry_depth));
                    }
                    Function::Closure(closure) => {
                        let frame = match self.thread.frames.pop() {
                            Some(frame) => frame,
                            None => return Ok(Some(Vec::new())),
                        };
                        let target = frame.return_base;
                        for i in 0..=nargs {
                            let value = self.register(ra + i);
                            self.set_register(target + i, value);
                        }
                        self.thread.stack.truncate(target + 1 + nargs);
                        trace!(
                            from = frame.function.name(),
                            to = closure.name(),
                            "tail call"
                        );
                        self.enter_closure(closure, target, nargs, frame.expected_results)?;
                        if let Some(new_frame) = self.thread.frames.last_mut() {
                            new_frame.is_tail_call = true;
                        }
                    }
                }
            }
            Opcode::Return => {
                let values = self.thread.stack.copy_range(ra..ra + b);
                return Ok(self.return_from_frame(values, entry_depth));
            }
            Opcode::Closure => {
                let proto = chunk.functions.get(instr.bx() as usize).ok_or_else(|| {
                    RuntimeError::InvalidChunk {
                        chunk: chunk.name.clone(),
                        reason: format!("no nested function {}", instr.bx()),
                    }
                })?;
                self.set_register(ra, Value::Function(Function::closure(Arc::clone(proto))));
            }
            Opcode::VarArg => {
                let available = self
                    .thread
                    .current_frame()
                    .map_or(0, |frame| frame.variable_argument_count);
                let first = base - available;
                for i in 0..b {
                    let value = if i < available {
                        self.register(first + i)
                    } else {
                        Value::Nil
                    };
                    self.set_register(ra + i, value);
                }
            }
        }

        Ok(None)
    }

    // ── Helpers ─────────────────────────────────────────────────────────────

    fn register(&self, index: usize) -> Value {
        self.thread.stack.get(index).clone()
    }

    fn set_register(&mut self, index: usize, value: Value) {
        self.thread.stack.set(index, value);
    }

    fn jump_to(&mut self, target: usize) {
        if let Some(frame) = self.thread.frames.last_mut() {
            frame.pc = target;
        }
    }

    /// Indexed read with `__index` table chaining
    ///
    /// Function-valued `__index` handlers are not invoked; they read as nil.
    fn get_field(&self, object: &Value, key: &Value) -> Result<Value, RuntimeError> {
        let mut current = object.clone();
        for _ in 0..MAX_INDEX_CHAIN {
            if let Value::Table(table) = &current {
                let raw = match key {
                    Value::String(name) => table.raw_get_str(name),
                    Value::Number(n) => array_index(*n).map_or(Value::Nil, |i| table.raw_get_index(i)),
                    _ => Value::Nil,
                };
                if !raw.is_nil() {
                    return Ok(raw);
                }
            }
            match current.metamethod(&self.state, Metamethod::Index) {
                Some(next @ Value::Table(_)) => current = next,
                _ if current.as_table().is_some() => return Ok(Value::Nil),
                _ => {
                    return Err(RuntimeError::TypeError {
                        action: "index",
                        type_name: current.type_name(),
                    })
                }
            }
        }
        Ok(Value::Nil)
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VM {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VM")
            .field("depth", &self.thread.depth())
            .field("max_call_depth", &self.max_call_depth)
            .field("hooked", &self.hook.is_some())
            .field("instructions_executed", &self.instructions_executed)
            .finish()
    }
}

fn constant(chunk: &Chunk, index: u32) -> Result<Value, RuntimeError> {
    chunk
        .constants
        .get(index as usize)
        .map(|c| c.to_value())
        .ok_or_else(|| RuntimeError::InvalidChunk {
            chunk: chunk.name.clone(),
            reason: format!("no constant {}", index),
        })
}

fn constant_name(chunk: &Chunk, index: u32) -> Result<&str, RuntimeError> {
    chunk
        .constants
        .get(index as usize)
        .and_then(|c| c.as_str())
        .ok_or_else(|| RuntimeError::InvalidChunk {
            chunk: chunk.name.clone(),
            reason: format!("constant {} is not a name", index),
        })
}

/// 1-based array index for an integral positive number
fn array_index(n: f64) -> Option<usize> {
    (n >= 1.0 && n.fract() == 0.0 && n <= usize::MAX as f64).then_some(n as usize)
}

/// Raw indexed write
fn set_field(object: &Value, key: &Value, value: Value) -> Result<(), RuntimeError> {
    let table = object.as_table().ok_or(RuntimeError::TypeError {
        action: "index",
        type_name: object.type_name(),
    })?;

    match key {
        Value::String(name) => {
            table.raw_set_str(Arc::clone(name), value);
            Ok(())
        }
        Value::Number(n) => {
            let index = array_index(*n).ok_or_else(|| RuntimeError::InvalidKey {
                message: format!("{} is not a positive integer", key),
            })?;
            if table.raw_set_index(index, value) {
                Ok(())
            } else {
                Err(RuntimeError::InvalidKey {
                    message: format!(
                        "index {} out of range (array length {})",
                        index,
                        table.array_length()
                    ),
                })
            }
        }
        other => Err(RuntimeError::InvalidKey {
            message: format!("cannot use a {} value as a key", other.type_name()),
        }),
    }
}

fn arithmetic(op: Opcode, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    let (x, y) = match (lhs, rhs) {
        (Value::Number(x), Value::Number(y)) => (*x, *y),
        (Value::Number(_), other) | (other, _) => {
            return Err(RuntimeError::TypeError {
                action: "perform arithmetic on",
                type_name: other.type_name(),
            })
        }
    };
    let result = match op {
        Opcode::Add => x + y,
        Opcode::Sub => x - y,
        Opcode::Mul => x * y,
        Opcode::Div => x / y,
        _ => unreachable!("not an arithmetic opcode: {:?}", op),
    };
    Ok(Value::Number(result))
}

fn compare(op: Opcode, lhs: &Value, rhs: &Value) -> Result<bool, RuntimeError> {
    let ordering = match (lhs, rhs) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Number(_), other) | (Value::String(_), other) | (other, _) => {
            return Err(RuntimeError::TypeError {
                action: "compare",
                type_name: other.type_name(),
            })
        }
    };
    Ok(match (op, ordering) {
        (_, None) => false,
        (Opcode::Lt, Some(ord)) => ord.is_lt(),
        (_, Some(ord)) => ord.is_le(),
    })
}
