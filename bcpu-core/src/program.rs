//! Parsed program and execution cursor

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::{ExecutionError, ExecutionResult};
use crate::instruction::{Instruction, Opcode};
use crate::operand::BlockId;

/// Position of the next instruction: `(block_id, instruction_index)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Cursor {
    pub block: BlockId,
    pub index: usize,
}

impl Cursor {
    pub fn new(block: BlockId, index: usize) -> Self {
        Self { block, index }
    }

    /// `("START", 0)`
    pub fn start() -> Self {
        Self::new(BlockId::start(), 0)
    }

    /// `("END", 0)`, the terminal position
    pub fn halted() -> Self {
        Self::new(BlockId::end(), 0)
    }

    pub fn is_halted(&self) -> bool {
        self.block.is_end() && self.index == 0
    }

    /// Next index in the same block
    pub fn next(&self) -> Self {
        Self::new(self.block.clone(), self.index + 1)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.block, self.index)
    }
}

/// Validated, block-structured program. Immutable once built by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    block_ids: Vec<BlockId>,
    blocks: HashMap<BlockId, Vec<Instruction>>,
}

impl Program {
    pub(crate) fn new(block_ids: Vec<BlockId>, blocks: HashMap<BlockId, Vec<Instruction>>) -> Self {
        Self { block_ids, blocks }
    }

    /// Declared blocks in declaration order
    pub fn block_ids(&self) -> &[BlockId] {
        &self.block_ids
    }

    pub fn block(&self, id: &str) -> Option<&[Instruction]> {
        self.blocks.get(id).map(Vec::as_slice)
    }

    pub fn contains_block(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    /// Total number of instructions across all blocks
    pub fn instruction_count(&self) -> usize {
        self.blocks.values().map(Vec::len).sum()
    }

    /// Instructions per opcode, in table order, zero counts omitted
    pub fn opcode_histogram(&self) -> Vec<(Opcode, usize)> {
        Opcode::ALL
            .iter()
            .map(|&opcode| {
                let count = self
                    .blocks
                    .values()
                    .flatten()
                    .filter(|instr| instr.opcode() == opcode)
                    .count();
                (opcode, count)
            })
            .filter(|&(_, count)| count > 0)
            .collect()
    }

    /// Fetches the instruction under `cursor`.
    ///
    /// Returns the effective index together with the instruction. With
    /// `autoloop` an index past the end wraps modulo the block length.
    pub fn fetch(&self, cursor: &Cursor, autoloop: bool) -> ExecutionResult<(usize, &Instruction)> {
        let block = self
            .blocks
            .get(&cursor.block)
            .ok_or_else(|| ExecutionError::UnknownBlock(cursor.block.clone()))?;

        if let Some(instr) = block.get(cursor.index) {
            return Ok((cursor.index, instr));
        }
        if !autoloop {
            return Err(ExecutionError::IndexOutOfRange {
                cursor: cursor.clone(),
                len: block.len(),
            });
        }
        if block.is_empty() {
            return Err(ExecutionError::EmptyBlock(cursor.block.clone()));
        }
        let index = cursor.index % block.len();
        Ok((index, &block[index]))
    }
}

/// Renders the program as assembly source that parses back to an equal program
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.block_ids.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{} {}", Opcode::Block, id)?;
            for instr in self.block(id.as_str()).unwrap_or_default() {
                writeln!(f, "    {}", instr)?;
            }
        }
        Ok(())
    }
}
