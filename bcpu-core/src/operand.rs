//! Typed operands
//!
//! Registers and block identifiers are only built through their validators,
//! so an `Instruction` never carries raw text.

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;

use crate::error::Rejection;
use crate::namespace::{CARRY, END_BLOCK, MEMAD, NO_BLOCK_ID, START_BLOCK};
use crate::validate::{validate_block_id, validate_register};

/// Register name (`R_*`, `CARRY` or `MEMAD`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Register(String);

impl Register {
    /// Validates `token` as a register operand
    pub fn parse(token: &str, allow_memad: bool) -> Result<Self, Rejection> {
        validate_register(token, allow_memad)?;
        Ok(Self(token.to_string()))
    }

    pub fn carry() -> Self {
        Self(CARRY.to_string())
    }

    pub fn memad() -> Self {
        Self(MEMAD.to_string())
    }

    pub fn is_carry(&self) -> bool {
        self.0 == CARRY
    }

    pub fn is_memad(&self) -> bool {
        self.0 == MEMAD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Register {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Block identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Validates `token` as a block identifier
    pub fn parse(token: &str) -> Result<Self, Rejection> {
        validate_block_id(token)?;
        Ok(Self(token.to_string()))
    }

    /// Entry block
    pub fn start() -> Self {
        Self(START_BLOCK.to_string())
    }

    /// Sentinel of a halted cursor; never a declared block
    pub fn end() -> Self {
        Self(END_BLOCK.to_string())
    }

    pub(crate) fn placeholder() -> Self {
        Self(NO_BLOCK_ID.to_string())
    }

    pub(crate) fn new_unchecked(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn is_end(&self) -> bool {
        self.0 == END_BLOCK
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == NO_BLOCK_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for BlockId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operand classes checked by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Any register except `MEMAD`
    Register,
    /// Any register including `MEMAD` (`ADDMEMAD` only)
    AddressRegister,
    /// Data literal
    Data,
    /// Block identifier
    Block,
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register | Self::AddressRegister => write!(f, "register"),
            Self::Data => write!(f, "data"),
            Self::Block => write!(f, "block id"),
        }
    }
}
