//! Register-machine instruction set
//!
//! Every instruction is one 32-bit word (see [`Instruction`](super::Instruction)).
//! Register operands are relative to the current frame's base; `K(x)`
//! denotes constant `x` of the running chunk.

/// Bytecode opcode (28 instructions)
///
/// Explicit byte values so chunk files stay stable across releases.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // ===== Loads (0-3) =====
    /// R(A) = R(B)
    Move = 0,
    /// R(A) = K(Bx)
    LoadK = 1,
    /// R(A) ..= R(A+B) = nil
    LoadNil = 2,
    /// R(A) = (B != 0); if C != 0 skip next instruction
    LoadBool = 3,

    // ===== Globals (4-5) =====
    /// R(A) = globals[K(Bx)]
    GetGlobal = 4,
    /// globals[K(Bx)] = R(A)
    SetGlobal = 5,

    // ===== Tables (6-10) =====
    /// R(A) = {}
    NewTable = 6,
    /// R(A) = R(B)[K(C)]
    GetField = 7,
    /// R(A)[K(B)] = R(C)
    SetField = 8,
    /// R(A) = R(B)[R(C)]
    GetIndex = 9,
    /// R(A)[R(B)] = R(C)
    SetIndex = 10,

    // ===== Arithmetic (11-15) =====
    /// R(A) = R(B) + R(C)
    Add = 11,
    /// R(A) = R(B) - R(C)
    Sub = 12,
    /// R(A) = R(B) * R(C)
    Mul = 13,
    /// R(A) = R(B) / R(C)
    Div = 14,
    /// R(A) = -R(B)
    Unm = 15,

    // ===== Logic and comparison (16-21) =====
    /// R(A) = not R(B)
    Not = 16,
    /// R(A) = #R(B)
    Len = 17,
    /// R(A) = R(B) == R(C)
    Eq = 18,
    /// R(A) = R(B) < R(C)
    Lt = 19,
    /// R(A) = R(B) <= R(C)
    Le = 20,
    /// if truthy(R(A)) != (C != 0) skip next instruction
    Test = 21,

    // ===== Control flow (22-27) =====
    /// pc += sBx
    Jmp = 22,
    /// R(A) ..= R(A+C-1) = R(A)(R(A+1) ..= R(A+B))
    Call = 23,
    /// return R(A)(R(A+1) ..= R(A+B)), reusing the caller's frame slot
    TailCall = 24,
    /// return R(A) ..= R(A+B-1)
    Return = 25,
    /// R(A) = closure(functions[Bx])
    Closure = 26,
    /// R(A) ..= R(A+B-1) = vararg
    VarArg = 27,
}

/// Static decode table indexed by the raw opcode bits
static OPCODE_TABLE: [Option<Opcode>; 64] = {
    let mut table: [Option<Opcode>; 64] = [None; 64];

    table[0] = Some(Opcode::Move);
    table[1] = Some(Opcode::LoadK);
    table[2] = Some(Opcode::LoadNil);
    table[3] = Some(Opcode::LoadBool);

    table[4] = Some(Opcode::GetGlobal);
    table[5] = Some(Opcode::SetGlobal);

    table[6] = Some(Opcode::NewTable);
    table[7] = Some(Opcode::GetField);
    table[8] = Some(Opcode::SetField);
    table[9] = Some(Opcode::GetIndex);
    table[10] = Some(Opcode::SetIndex);

    table[11] = Some(Opcode::Add);
    table[12] = Some(Opcode::Sub);
    table[13] = Some(Opcode::Mul);
    table[14] = Some(Opcode::Div);
    table[15] = Some(Opcode::Unm);

    table[16] = Some(Opcode::Not);
    table[17] = Some(Opcode::Len);
    table[18] = Some(Opcode::Eq);
    table[19] = Some(Opcode::Lt);
    table[20] = Some(Opcode::Le);
    table[21] = Some(Opcode::Test);

    table[22] = Some(Opcode::Jmp);
    table[23] = Some(Opcode::Call);
    table[24] = Some(Opcode::TailCall);
    table[25] = Some(Opcode::Return);
    table[26] = Some(Opcode::Closure);
    table[27] = Some(Opcode::VarArg);

    table
};

impl Opcode {
    /// Decode an opcode from its 6-bit field
    #[inline(always)]
    pub fn from_bits(bits: u8) -> Option<Opcode> {
        OPCODE_TABLE.get(bits as usize).copied().flatten()
    }

    /// Call-family opcodes, whose register A holds the callee
    pub fn is_call(self) -> bool {
        matches!(self, Opcode::Call | Opcode::TailCall)
    }

    /// Upper-case mnemonic used by the disassembler
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Move => "MOVE",
            Opcode::LoadK => "LOADK",
            Opcode::LoadNil => "LOADNIL",
            Opcode::LoadBool => "LOADBOOL",
            Opcode::GetGlobal => "GETGLOBAL",
            Opcode::SetGlobal => "SETGLOBAL",
            Opcode::NewTable => "NEWTABLE",
            Opcode::GetField => "GETFIELD",
            Opcode::SetField => "SETFIELD",
            Opcode::GetIndex => "GETINDEX",
            Opcode::SetIndex => "SETINDEX",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Unm => "UNM",
            Opcode::Not => "NOT",
            Opcode::Len => "LEN",
            Opcode::Eq => "EQ",
            Opcode::Lt => "LT",
            Opcode::Le => "LE",
            Opcode::Test => "TEST",
            Opcode::Jmp => "JMP",
            Opcode::Call => "CALL",
            Opcode::TailCall => "TAILCALL",
            Opcode::Return => "RETURN",
            Opcode::Closure => "CLOSURE",
            Opcode::VarArg => "VARARG",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ();

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Opcode::from_bits(byte).ok_or(())
    }
}
