//! Error types for bcpu-core

use thiserror::Error;

use crate::instruction::Opcode;
use crate::operand::{BlockId, OperandKind};
use crate::program::Cursor;

/// Result of parsing assembly source
pub type ParseResult<T> = Result<T, ParseError>;

/// Result of engine operations
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Why a token was refused by an operand validator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("collides with the register prefix")]
    RegisterPrefixCollision,

    #[error("collides with special register {0}")]
    SpecialRegisterCollision(String),

    #[error("collides with a data literal prefix")]
    DataPrefixCollision,

    #[error("uses the reserved placeholder block id")]
    ReservedPlaceholder,

    #[error("uses the reserved end-of-execution block id")]
    ReservedEnd,

    #[error("MEMAD is not allowed here")]
    MemadNotAllowed,

    #[error("not a special register and missing the register prefix")]
    NotARegister,

    #[error("data prefix missing")]
    MissingDataPrefix,

    #[error("invalid data prefix {0:?}")]
    InvalidDataPrefix(String),

    #[error("character {digit:?} is not a base-{radix} digit")]
    InvalidDigit { radix: u32, digit: char },
}

/// What went wrong while parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid prefix {0:?}")]
    UnknownOpcode(String),

    #[error("{opcode} takes {expected} operand(s), found {found}")]
    Arity {
        opcode: Opcode,
        expected: usize,
        found: usize,
    },

    #[error("invalid {kind} operand #{position} {token:?} for {opcode}: {reason}")]
    InvalidOperand {
        opcode: Opcode,
        position: usize,
        kind: OperandKind,
        token: String,
        reason: Rejection,
    },

    #[error("block {0} already declared")]
    DuplicateBlock(BlockId),

    #[error("missing \"START\" block, the program will not run")]
    MissingStart,

    #[error("jump target {target} is never declared (referenced on lines {})", join_lines(.lines))]
    UnresolvedJumpTarget { target: BlockId, lines: Vec<usize> },
}

/// Malformed assembly source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 0-based index of the offending line (None for whole-program failures)
    pub line: Option<usize>,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn at(line: usize, kind: ParseErrorKind) -> Self {
        Self { line: Some(line), kind }
    }

    pub fn program(kind: ParseErrorKind) -> Self {
        Self { line: None, kind }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

fn join_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure of the current run; the failed step is not rolled back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("program has not been loaded")]
    NoProgramLoaded,

    #[error("bit width {0} is outside 1..={max}", max = crate::cpu::MAX_BIT_WIDTH)]
    InvalidBitWidth(u32),

    #[error("block {0} does not exist")]
    UnknownBlock(BlockId),

    #[error("no instruction at {cursor} (block has {len}) and autoloop is disabled")]
    IndexOutOfRange { cursor: Cursor, len: usize },

    #[error("block {0} has no instructions to loop over")]
    EmptyBlock(BlockId),
}
