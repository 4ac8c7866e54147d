//! Bytecode disassembler
//!
//! Converts chunks back to a human-readable listing.
//! Used for debugging, tracing, and `lunar disasm` output.

use super::{Chunk, Constant, Instruction, Opcode};
use std::fmt::Write;

/// Disassemble a chunk and its nested prototypes
///
/// # Format
/// ```text
/// === function main (0 params, 3 registers) ===
/// === Constants ===
/// 0: "print"
/// 1: 42
///
/// === Instructions ===
/// 0000  [1:1]  GETGLOBAL  0 0      ; "print"
/// 0001  [1:7]  LOADK      1 1      ; 42
/// 0002  [1:1]  CALL       0 1 1
/// ```
pub fn disassemble(chunk: &Chunk) -> String {
    let mut output = String::new();
    disassemble_into(chunk, &mut output);
    output
}

fn disassemble_into(chunk: &Chunk, output: &mut String) {
    let _ = writeln!(
        output,
        "=== function {} ({} params{}, {} registers) ===",
        chunk.name,
        chunk.parameter_count,
        if chunk.is_vararg { ", vararg" } else { "" },
        chunk.max_stack_size
    );

    if !chunk.constants.is_empty() {
        let _ = writeln!(output, "=== Constants ===");
        for (idx, constant) in chunk.constants.iter().enumerate() {
            let _ = writeln!(output, "{}: {}", idx, format_constant(constant));
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "=== Instructions ===");
    for (pc, instr) in chunk.code.iter().enumerate() {
        let position = chunk
            .source_positions
            .get(pc)
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(
            output,
            "{:04}  [{}]  {}",
            pc,
            position,
            disassemble_instruction(chunk, pc, *instr)
        );
    }

    for nested in &chunk.functions {
        let _ = writeln!(output);
        disassemble_into(nested, output);
    }
}

/// Format one instruction with its operands and a constant/target comment
pub fn disassemble_instruction(chunk: &Chunk, pc: usize, instr: Instruction) -> String {
    let op = match instr.opcode() {
        Some(op) => op,
        None => return format!("<invalid opcode: 0x{:08x}>", instr.raw()),
    };
    let (a, b, c) = (instr.a(), instr.b(), instr.c());

    let constant = |index: u32| {
        chunk
            .constants
            .get(index as usize)
            .map(format_constant)
            .unwrap_or_else(|| "<bad constant>".to_string())
    };

    let (operands, comment) = match op {
        Opcode::LoadK | Opcode::GetGlobal | Opcode::SetGlobal => {
            (format!("{} {}", a, instr.bx()), Some(constant(instr.bx())))
        }
        Opcode::Closure => (
            format!("{} {}", a, instr.bx()),
            chunk
                .functions
                .get(instr.bx() as usize)
                .map(|f| format!("function {}", f.name)),
        ),
        Opcode::GetField => (format!("{} {} {}", a, b, c), Some(constant(c))),
        Opcode::SetField => (format!("{} {} {}", a, b, c), Some(constant(b))),
        Opcode::Jmp => {
            let target = pc as i64 + 1 + instr.sbx() as i64;
            (format!("{}", instr.sbx()), Some(format!("to {:04}", target)))
        }
        Opcode::NewTable | Opcode::Test => (format!("{} {}", a, c), None),
        Opcode::Move
        | Opcode::LoadNil
        | Opcode::Unm
        | Opcode::Not
        | Opcode::Len
        | Opcode::TailCall
        | Opcode::Return
        | Opcode::VarArg => (format!("{} {}", a, b), None),
        Opcode::LoadBool
        | Opcode::GetIndex
        | Opcode::SetIndex
        | Opcode::Add
        | Opcode::Sub
        | Opcode::Mul
        | Opcode::Div
        | Opcode::Eq
        | Opcode::Lt
        | Opcode::Le
        | Opcode::Call => (format!("{} {} {}", a, b, c), None),
    };

    match comment {
        Some(comment) => format!("{:<10} {:<8} ; {}", op.mnemonic(), operands, comment),
        None => format!("{:<10} {}", op.mnemonic(), operands),
    }
}

/// Format a constant for pool display
fn format_constant(constant: &Constant) -> String {
    match constant {
        Constant::Nil => "nil".to_string(),
        Constant::Bool(b) => b.to_string(),
        Constant::Number(n) => {
            // Show integers without decimal point
            if n.fract() == 0.0 && n.is_finite() {
                format!("{:.0}", n)
            } else {
                n.to_string()
            }
        }
        Constant::String(s) => format!("\"{}\"", s),
    }
}
