//! Chunk validator: static checks before a chunk is loaded
//!
//! Performs four checks on every prototype, recursively:
//! 1. **Decode pass**: every word carries a known opcode
//! 2. **Register bounds**: every register operand fits in `max_stack_size`
//! 3. **Pool refs**: constant and prototype indices are in range, and name
//!    operands refer to string constants
//! 4. **Jump targets**: every jump or skip lands inside `0..=code.len()`
//!
//! A source map shorter than the code is accepted; position lookups guard it.

use super::{Chunk, Instruction, Opcode, MAX_A};

// ============================================================================
// Public API
// ============================================================================

/// A validation error with the chunk and pc where it was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the prototype containing the error
    pub chunk: String,
    /// Instruction index, `None` for chunk-level problems
    pub pc: Option<usize>,
    pub kind: ValidationErrorKind,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.pc {
            Some(pc) => write!(f, "pc {}: {}", pc, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Kinds of errors the validator can detect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Opcode bits that do not name an instruction.
    UnknownOpcode(u32),
    /// A register operand at or beyond the frame size.
    RegisterOutOfBounds { register: u32, frame_size: u16 },
    /// The frame is larger than register operands can address.
    FrameTooLarge { size: u16 },
    /// More fixed parameters than registers.
    TooManyParameters { count: u8, frame_size: u16 },
    /// A constant index exceeds the pool size.
    ConstantIndexOutOfBounds { index: u32, pool_size: usize },
    /// A global or field name operand that is not a string constant.
    NonStringName { index: u32 },
    /// A `CLOSURE` operand beyond the nested prototype list.
    FunctionIndexOutOfBounds { index: u32, count: usize },
    /// A jump or skip target outside the code.
    JumpOutOfBounds { target: i64, len: usize },
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownOpcode(bits) => write!(f, "unknown opcode {}", bits),
            Self::RegisterOutOfBounds {
                register,
                frame_size,
            } => write!(
                f,
                "register R{} out of bounds (frame size={})",
                register, frame_size
            ),
            Self::FrameTooLarge { size } => {
                write!(f, "frame size {} exceeds {}", size, MAX_A + 1)
            }
            Self::TooManyParameters { count, frame_size } => write!(
                f,
                "{} parameters do not fit in {} registers",
                count, frame_size
            ),
            Self::ConstantIndexOutOfBounds { index, pool_size } => write!(
                f,
                "constant index {} out of bounds (pool size={})",
                index, pool_size
            ),
            Self::NonStringName { index } => {
                write!(f, "constant {} is used as a name but is not a string", index)
            }
            Self::FunctionIndexOutOfBounds { index, count } => write!(
                f,
                "function index {} out of bounds ({} nested functions)",
                index, count
            ),
            Self::JumpOutOfBounds { target, len } => {
                write!(f, "jump target {} is out of bounds (len={})", target, len)
            }
        }
    }
}

/// Validate a chunk and all nested prototypes.
///
/// Returns every error found; an empty vector means the chunk is safe to load.
pub fn validate(chunk: &Chunk) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validate_into(chunk, &mut errors);
    errors
}

/// Highest register index an instruction reads or writes
///
/// `None` for instructions that touch no register.
pub fn highest_register(instr: Instruction, op: Opcode) -> Option<u32> {
    let (a, b, c) = (instr.a(), instr.b(), instr.c());
    match op {
        Opcode::Jmp => None,
        Opcode::LoadK
        | Opcode::LoadBool
        | Opcode::GetGlobal
        | Opcode::SetGlobal
        | Opcode::NewTable
        | Opcode::Closure
        | Opcode::Test => Some(a),
        Opcode::LoadNil => Some(a + b),
        Opcode::Move | Opcode::Unm | Opcode::Not | Opcode::Len | Opcode::GetField => {
            Some(a.max(b))
        }
        Opcode::SetField => Some(a.max(c)),
        Opcode::GetIndex
        | Opcode::SetIndex
        | Opcode::Add
        | Opcode::Sub
        | Opcode::Mul
        | Opcode::Div
        | Opcode::Eq
        | Opcode::Lt
        | Opcode::Le => Some(a.max(b).max(c)),
        Opcode::Call => Some((a + b).max((a + c).saturating_sub(1))),
        Opcode::TailCall => Some(a + b),
        Opcode::Return | Opcode::VarArg => (b > 0).then(|| a + b - 1),
    }
}

// ============================================================================
// Checks
// ============================================================================

fn validate_into(chunk: &Chunk, errors: &mut Vec<ValidationError>) {
    let mut report = |pc: Option<usize>, kind: ValidationErrorKind| {
        errors.push(ValidationError {
            chunk: chunk.name.clone(),
            pc,
            kind,
        })
    };

    let frame_size = chunk.max_stack_size;
    if frame_size as u32 > MAX_A + 1 {
        report(None, ValidationErrorKind::FrameTooLarge { size: frame_size });
    }
    if chunk.parameter_count as u16 > frame_size {
        report(
            None,
            ValidationErrorKind::TooManyParameters {
                count: chunk.parameter_count,
                frame_size,
            },
        );
    }

    let len = chunk.code.len();
    for (pc, instr) in chunk.code.iter().enumerate() {
        let op = match instr.opcode() {
            Some(op) => op,
            None => {
                report(Some(pc), ValidationErrorKind::UnknownOpcode(instr.raw() & 0x3f));
                continue;
            }
        };

        if let Some(register) = highest_register(*instr, op) {
            if register >= frame_size as u32 {
                report(
                    Some(pc),
                    ValidationErrorKind::RegisterOutOfBounds {
                        register,
                        frame_size,
                    },
                );
            }
        }

        let constant_ref = match op {
            Opcode::LoadK => Some((instr.bx(), false)),
            Opcode::GetGlobal | Opcode::SetGlobal => Some((instr.bx(), true)),
            Opcode::GetField => Some((instr.c(), true)),
            Opcode::SetField => Some((instr.b(), true)),
            _ => None,
        };
        if let Some((index, must_be_name)) = constant_ref {
            match chunk.constants.get(index as usize) {
                None => report(
                    Some(pc),
                    ValidationErrorKind::ConstantIndexOutOfBounds {
                        index,
                        pool_size: chunk.constants.len(),
                    },
                ),
                Some(constant) if must_be_name && constant.as_str().is_none() => {
                    report(Some(pc), ValidationErrorKind::NonStringName { index })
                }
                Some(_) => {}
            }
        }

        if op == Opcode::Closure && instr.bx() as usize >= chunk.functions.len() {
            report(
                Some(pc),
                ValidationErrorKind::FunctionIndexOutOfBounds {
                    index: instr.bx(),
                    count: chunk.functions.len(),
                },
            );
        }

        let target = match op {
            Opcode::Jmp => Some(pc as i64 + 1 + instr.sbx() as i64),
            Opcode::Test => Some(pc as i64 + 2),
            Opcode::LoadBool if instr.c() != 0 => Some(pc as i64 + 2),
            _ => None,
        };
        if let Some(target) = target {
            if target < 0 || target > len as i64 {
                report(
                    Some(pc),
                    ValidationErrorKind::JumpOutOfBounds { target, len },
                );
            }
        }
    }

    for nested in &chunk.functions {
        validate_into(nested, errors);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{ChunkBuilder, Constant};
    use crate::source::SourcePosition;
    use pretty_assertions::assert_eq;

    fn chunk_with(code: Vec<Instruction>, constants: Vec<Constant>, frame: u16) -> Chunk {
        let mut chunk = Chunk::new("test");
        chunk.code = code;
        chunk.constants = constants;
        chunk.max_stack_size = frame;
        chunk
    }

    #[test]
    fn test_valid_chunk() {
        let mut b = ChunkBuilder::new("ok");
        let name = b.add_constant("print");
        b.emit(
            Instruction::abx(Opcode::GetGlobal, 0, name),
            SourcePosition::new(1, 1),
        );
        b.op(Opcode::Call, 0, 0, 1, 1);
        b.op(Opcode::Return, 0, 1, 0, 2);
        assert_eq!(validate(&b.build()), vec![]);
    }

    #[test]
    fn test_unknown_opcode() {
        let errors = validate(&chunk_with(vec![Instruction(63)], vec![], 1));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::UnknownOpcode(63));
        assert_eq!(errors[0].pc, Some(0));
    }

    #[test]
    fn test_register_out_of_frame() {
        let errors = validate(&chunk_with(
            vec![Instruction::abc(Opcode::Move, 0, 4, 0)],
            vec![],
            2,
        ));
        assert_eq!(
            errors[0].kind,
            ValidationErrorKind::RegisterOutOfBounds {
                register: 4,
                frame_size: 2
            }
        );
    }

    #[test]
    fn test_global_name_must_be_string() {
        let errors = validate(&chunk_with(
            vec![Instruction::abx(Opcode::GetGlobal, 0, 0)],
            vec![Constant::Number(1.0)],
            1,
        ));
        assert_eq!(errors[0].kind, ValidationErrorKind::NonStringName { index: 0 });
    }

    #[test]
    fn test_jump_past_end() {
        let errors = validate(&chunk_with(
            vec![Instruction::asbx(Opcode::Jmp, 0, 5)],
            vec![],
            0,
        ));
        assert_eq!(
            errors[0].kind,
            ValidationErrorKind::JumpOutOfBounds { target: 6, len: 1 }
        );
    }

    #[test]
    fn test_nested_prototypes_checked() {
        let inner = chunk_with(vec![Instruction::abx(Opcode::LoadK, 0, 9)], vec![], 1);
        let mut outer = chunk_with(vec![Instruction::abx(Opcode::Closure, 0, 0)], vec![], 1);
        outer.functions.push(std::sync::Arc::new(inner));

        let errors = validate(&outer);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0].kind,
            ValidationErrorKind::ConstantIndexOutOfBounds { index: 9, .. }
        ));
    }

    #[test]
    fn test_short_source_map_accepted() {
        let mut chunk = chunk_with(
            vec![
                Instruction::abc(Opcode::LoadNil, 0, 0, 0),
                Instruction::abc(Opcode::Return, 0, 0, 0),
            ],
            vec![],
            1,
        );
        chunk.source_positions = vec![SourcePosition::new(1, 1)];
        assert!(validate(&chunk).is_empty());
    }
}
