//! Instruction tracer built on the debug hook.
//!
//! Records one [`TraceRecord`] per hook firing, up to a configurable limit.
//! Call instructions are annotated with their resolved call target.

use super::HookSnapshot;
use crate::bytecode::disassemble_instruction;
use crate::source::SourcePosition;
use crate::vm::DebugHook;
use lunar_config::Config;
use serde::Serialize;
use std::fmt;

// ── Records ──────────────────────────────────────────────────────────────────

/// One traced instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRecord {
    /// Number of active frames, 1 for the outermost function
    pub depth: usize,
    pub function: String,
    pub pc: i32,
    pub opcode: &'static str,
    /// Disassembled instruction
    pub text: String,
    pub position: SourcePosition,
    /// Resolved target, for call instructions only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<TracedCall>,
}

/// Call target attached to a call instruction record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TracedCall {
    pub target: String,
    pub via_metamethod: bool,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:indent$}{}:{} {:04}  {}",
            "",
            self.function,
            self.position,
            self.pc,
            self.text,
            indent = self.depth.saturating_sub(1) * 2
        )?;
        if let Some(call) = &self.call {
            write!(f, "  -> {}", call.target)?;
            if call.via_metamethod {
                write!(f, " (via __call)")?;
            }
        }
        Ok(())
    }
}

// ── Tracer ───────────────────────────────────────────────────────────────────

/// Bounded instruction recorder
#[derive(Debug, Clone)]
pub struct Tracer {
    records: Vec<TraceRecord>,
    max_records: usize,
    resolve_calls: bool,
    dropped: u64,
}

impl Tracer {
    pub fn new(max_records: usize) -> Self {
        Self {
            records: Vec::new(),
            max_records,
            resolve_calls: true,
            dropped: 0,
        }
    }

    /// Tracer sized and configured from the `[debug]` section
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_trace_records()).with_call_targets(config.trace_call_targets())
    }

    /// Whether call instructions get their target resolved
    pub fn with_call_targets(mut self, enabled: bool) -> Self {
        self.resolve_calls = enabled;
        self
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    /// Hook firings not recorded because the limit was reached
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.dropped = 0;
    }
}

impl DebugHook for Tracer {
    fn on_instruction(&mut self, snapshot: &HookSnapshot<'_>) {
        if self.records.len() >= self.max_records {
            self.dropped += 1;
            return;
        }

        let instr = snapshot.instruction();
        let opcode = match instr.opcode() {
            Some(op) => op,
            None => return,
        };
        let function = snapshot.frame().function.name().to_string();
        let position = snapshot.source_position();
        let text = match snapshot.closure_chunk() {
            Some(chunk) => disassemble_instruction(chunk, snapshot.pc().max(0) as usize, instr),
            None => opcode.mnemonic().to_string(),
        };

        let call = if self.resolve_calls && opcode.is_call() {
            snapshot.call_target().map(|target| TracedCall {
                target: target.function.name().to_string(),
                via_metamethod: target.via_metamethod,
            })
        } else {
            None
        };

        tracing::trace!(
            function = %function,
            pc = snapshot.pc(),
            %position,
            op = opcode.mnemonic(),
            "instruction"
        );

        self.records.push(TraceRecord {
            depth: snapshot.thread().depth(),
            function,
            pc: snapshot.pc(),
            opcode: opcode.mnemonic(),
            text,
            position,
            call,
        });
    }
}
