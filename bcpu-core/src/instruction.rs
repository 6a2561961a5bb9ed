//! Instruction set
//!
//! `Opcode` is the closed mnemonic table the parser dispatches on (22
//! entries, `BLOCK` included). `Instruction` is what a block holds after
//! parsing: one variant per executable opcode, operands already validated.

use std::fmt;

use num_bigint::BigUint;
use serde::Serialize;

use crate::literal::format_data;
use crate::operand::{BlockId, OperandKind, Register};

use OperandKind::{AddressRegister as A, Block as B, Data as D, Register as R};

// ═══════════════════════════════════════════════════════════════════════════════
// OPCODES
// ═══════════════════════════════════════════════════════════════════════════════

/// Mnemonics accepted as the first token of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Opcode {
    // ─── Blocks / control ───
    Block,
    End,
    Jmp,
    Jne,
    Jie,
    // ─── Selection ───
    Cmp,
    Gt,
    Lt,
    // ─── Arithmetic ───
    Add,
    Mul,
    Shup,
    Shdo,
    // ─── Bitwise ───
    Not,
    And,
    Or,
    Xor,
    // ─── Memory / data movement ───
    Load,
    Store,
    Set,
    Copy,
    SetMemad,
    AddMemad,
}

impl Opcode {
    /// Every opcode, in table order
    pub const ALL: [Opcode; 22] = [
        Self::Block,
        Self::End,
        Self::Jmp,
        Self::Jne,
        Self::Jie,
        Self::Cmp,
        Self::Gt,
        Self::Lt,
        Self::Add,
        Self::Mul,
        Self::Shup,
        Self::Shdo,
        Self::Not,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Load,
        Self::Store,
        Self::Set,
        Self::Copy,
        Self::SetMemad,
        Self::AddMemad,
    ];

    pub fn from_mnemonic(token: &str) -> Option<Self> {
        Some(match token {
            "BLOCK" => Self::Block,
            "END" => Self::End,
            "JMP" => Self::Jmp,
            "JNE" => Self::Jne,
            "JIE" => Self::Jie,
            "CMP" => Self::Cmp,
            "GT" => Self::Gt,
            "LT" => Self::Lt,
            "ADD" => Self::Add,
            "MUL" => Self::Mul,
            "SHUP" => Self::Shup,
            "SHDO" => Self::Shdo,
            "NOT" => Self::Not,
            "AND" => Self::And,
            "OR" => Self::Or,
            "XOR" => Self::Xor,
            "LOAD" => Self::Load,
            "STORE" => Self::Store,
            "SET" => Self::Set,
            "COPY" => Self::Copy,
            "SETMEMAD" => Self::SetMemad,
            "ADDMEMAD" => Self::AddMemad,
            _ => return None,
        })
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Block => "BLOCK",
            Self::End => "END",
            Self::Jmp => "JMP",
            Self::Jne => "JNE",
            Self::Jie => "JIE",
            Self::Cmp => "CMP",
            Self::Gt => "GT",
            Self::Lt => "LT",
            Self::Add => "ADD",
            Self::Mul => "MUL",
            Self::Shup => "SHUP",
            Self::Shdo => "SHDO",
            Self::Not => "NOT",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Load => "LOAD",
            Self::Store => "STORE",
            Self::Set => "SET",
            Self::Copy => "COPY",
            Self::SetMemad => "SETMEMAD",
            Self::AddMemad => "ADDMEMAD",
        }
    }

    /// Operand kinds in source order; the length is the arity
    pub fn operand_kinds(&self) -> &'static [OperandKind] {
        match self {
            Self::Block => &[B],
            Self::End => &[],
            Self::Jmp => &[B],
            Self::Jne | Self::Jie => &[R, R, B],
            Self::Cmp | Self::Gt | Self::Lt => &[R, R, R, R, R],
            Self::Add
            | Self::Mul
            | Self::Shup
            | Self::Shdo
            | Self::And
            | Self::Or
            | Self::Xor => &[R, R, R],
            Self::Not | Self::Copy => &[R, R],
            Self::Set => &[R, D],
            Self::Load | Self::Store => &[R],
            Self::SetMemad => &[D],
            Self::AddMemad => &[A],
        }
    }

    pub fn arity(&self) -> usize {
        self.operand_kinds().len()
    }

    pub fn is_jump(&self) -> bool {
        matches!(self, Self::Jmp | Self::Jne | Self::Jie)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INSTRUCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Decoded instruction. `BLOCK` is a declaration and has no variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    End,
    Jmp { target: BlockId },
    Jne { lhs: Register, rhs: Register, target: BlockId },
    Jie { lhs: Register, rhs: Register, target: BlockId },
    Cmp { lhs: Register, rhs: Register, if_true: Register, if_false: Register, dest: Register },
    Gt { lhs: Register, rhs: Register, if_true: Register, if_false: Register, dest: Register },
    Lt { lhs: Register, rhs: Register, if_true: Register, if_false: Register, dest: Register },
    Add { lhs: Register, rhs: Register, dest: Register },
    Mul { lhs: Register, rhs: Register, dest: Register },
    Shup { value: Register, amount: Register, dest: Register },
    Shdo { value: Register, amount: Register, dest: Register },
    Not { src: Register, dest: Register },
    And { lhs: Register, rhs: Register, dest: Register },
    Or { lhs: Register, rhs: Register, dest: Register },
    Xor { lhs: Register, rhs: Register, dest: Register },
    Load { dest: Register },
    Store { src: Register },
    Set { dest: Register, value: BigUint },
    Copy { src: Register, dest: Register },
    SetMemad { address: BigUint },
    AddMemad { offset: Register },
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::End => Opcode::End,
            Self::Jmp { .. } => Opcode::Jmp,
            Self::Jne { .. } => Opcode::Jne,
            Self::Jie { .. } => Opcode::Jie,
            Self::Cmp { .. } => Opcode::Cmp,
            Self::Gt { .. } => Opcode::Gt,
            Self::Lt { .. } => Opcode::Lt,
            Self::Add { .. } => Opcode::Add,
            Self::Mul { .. } => Opcode::Mul,
            Self::Shup { .. } => Opcode::Shup,
            Self::Shdo { .. } => Opcode::Shdo,
            Self::Not { .. } => Opcode::Not,
            Self::And { .. } => Opcode::And,
            Self::Or { .. } => Opcode::Or,
            Self::Xor { .. } => Opcode::Xor,
            Self::Load { .. } => Opcode::Load,
            Self::Store { .. } => Opcode::Store,
            Self::Set { .. } => Opcode::Set,
            Self::Copy { .. } => Opcode::Copy,
            Self::SetMemad { .. } => Opcode::SetMemad,
            Self::AddMemad { .. } => Opcode::AddMemad,
        }
    }

    /// Block this instruction may transfer control to
    pub fn jump_target(&self) -> Option<&BlockId> {
        match self {
            Self::Jmp { target } | Self::Jne { target, .. } | Self::Jie { target, .. } => {
                Some(target)
            }
            _ => None,
        }
    }

    /// Operands in source order, rendered as source tokens
    pub fn operands(&self) -> Vec<String> {
        fn regs(list: &[&Register]) -> Vec<String> {
            list.iter().map(|r| r.to_string()).collect()
        }

        match self {
            Self::End => Vec::new(),
            Self::Jmp { target } => vec![target.to_string()],
            Self::Jne { lhs, rhs, target } | Self::Jie { lhs, rhs, target } => {
                vec![lhs.to_string(), rhs.to_string(), target.to_string()]
            }
            Self::Cmp { lhs, rhs, if_true, if_false, dest }
            | Self::Gt { lhs, rhs, if_true, if_false, dest }
            | Self::Lt { lhs, rhs, if_true, if_false, dest } => {
                regs(&[lhs, rhs, if_true, if_false, dest])
            }
            Self::Add { lhs, rhs, dest }
            | Self::Mul { lhs, rhs, dest }
            | Self::And { lhs, rhs, dest }
            | Self::Or { lhs, rhs, dest }
            | Self::Xor { lhs, rhs, dest } => regs(&[lhs, rhs, dest]),
            Self::Shup { value, amount, dest } | Self::Shdo { value, amount, dest } => {
                regs(&[value, amount, dest])
            }
            Self::Not { src, dest } | Self::Copy { src, dest } => regs(&[src, dest]),
            Self::Load { dest } => regs(&[dest]),
            Self::Store { src } => regs(&[src]),
            Self::Set { dest, value } => vec![dest.to_string(), format_data(value)],
            Self::SetMemad { address } => vec![format_data(address)],
            Self::AddMemad { offset } => regs(&[offset]),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode())?;
        for operand in self.operands() {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}
