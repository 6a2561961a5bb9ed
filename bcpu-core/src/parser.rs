//! Block assembly parser
//!
//! One instruction per line. The first token selects the opcode, the rest
//! are operands checked against the opcode's operand kinds. Jump targets are
//! collected during the scan and resolved once the full set of declared
//! blocks is known.
//!
//! ```text
//! # doubles R_A into R_B
//! BLOCK START
//!     SET R_A 0d5
//!     ADD R_A R_A R_B
//!     END
//! ```

use std::collections::HashMap;

use crate::error::{ParseError, ParseErrorKind, ParseResult, Rejection};
use crate::instruction::{Instruction, Opcode};
use crate::literal::parse_data;
use crate::namespace::COMMENT_PREFIX;
use crate::operand::{BlockId, OperandKind, Register};
use crate::program::Program;

// ═══════════════════════════════════════════════════════════════════════════════
// OPERAND DECODER
// ═══════════════════════════════════════════════════════════════════════════════

/// Walks the operand tokens of one line in order
struct Operands<'a> {
    opcode: Opcode,
    line: usize,
    tokens: &'a [&'a str],
    position: usize,
}

impl<'a> Operands<'a> {
    fn new(opcode: Opcode, line: usize, tokens: &'a [&'a str]) -> Self {
        Self { opcode, line, tokens, position: 0 }
    }

    fn take<T>(
        &mut self,
        kind: OperandKind,
        check: impl FnOnce(&str) -> Result<T, Rejection>,
    ) -> ParseResult<T> {
        let token = self.tokens.get(self.position).copied().ok_or_else(|| {
            ParseError::at(
                self.line,
                ParseErrorKind::Arity {
                    opcode: self.opcode,
                    expected: self.opcode.arity(),
                    found: self.tokens.len(),
                },
            )
        })?;
        self.position += 1;

        check(token).map_err(|reason| {
            ParseError::at(
                self.line,
                ParseErrorKind::InvalidOperand {
                    opcode: self.opcode,
                    position: self.position,
                    kind,
                    token: token.to_string(),
                    reason,
                },
            )
        })
    }

    fn register(&mut self) -> ParseResult<Register> {
        self.take(OperandKind::Register, |t| Register::parse(t, false))
    }

    fn address_register(&mut self) -> ParseResult<Register> {
        self.take(OperandKind::AddressRegister, |t| Register::parse(t, true))
    }

    fn data(&mut self) -> ParseResult<num_bigint::BigUint> {
        self.take(OperandKind::Data, parse_data)
    }

    fn block(&mut self) -> ParseResult<BlockId> {
        self.take(OperandKind::Block, BlockId::parse)
    }
}

/// A decoded source line
enum Line {
    Declare(BlockId),
    Instruction(Instruction),
}

fn decode(opcode: Opcode, ops: &mut Operands<'_>) -> ParseResult<Line> {
    use Instruction as I;

    let instr = match opcode {
        Opcode::Block => return Ok(Line::Declare(ops.block()?)),
        Opcode::End => I::End,
        Opcode::Jmp => I::Jmp { target: ops.block()? },
        Opcode::Jne => I::Jne { lhs: ops.register()?, rhs: ops.register()?, target: ops.block()? },
        Opcode::Jie => I::Jie { lhs: ops.register()?, rhs: ops.register()?, target: ops.block()? },
        Opcode::Cmp => I::Cmp {
            lhs: ops.register()?,
            rhs: ops.register()?,
            if_true: ops.register()?,
            if_false: ops.register()?,
            dest: ops.register()?,
        },
        Opcode::Gt => I::Gt {
            lhs: ops.register()?,
            rhs: ops.register()?,
            if_true: ops.register()?,
            if_false: ops.register()?,
            dest: ops.register()?,
        },
        Opcode::Lt => I::Lt {
            lhs: ops.register()?,
            rhs: ops.register()?,
            if_true: ops.register()?,
            if_false: ops.register()?,
            dest: ops.register()?,
        },
        Opcode::Add => I::Add { lhs: ops.register()?, rhs: ops.register()?, dest: ops.register()? },
        Opcode::Mul => I::Mul { lhs: ops.register()?, rhs: ops.register()?, dest: ops.register()? },
        Opcode::Shup => I::Shup { value: ops.register()?, amount: ops.register()?, dest: ops.register()? },
        Opcode::Shdo => I::Shdo { value: ops.register()?, amount: ops.register()?, dest: ops.register()? },
        Opcode::Not => I::Not { src: ops.register()?, dest: ops.register()? },
        Opcode::And => I::And { lhs: ops.register()?, rhs: ops.register()?, dest: ops.register()? },
        Opcode::Or => I::Or { lhs: ops.register()?, rhs: ops.register()?, dest: ops.register()? },
        Opcode::Xor => I::Xor { lhs: ops.register()?, rhs: ops.register()?, dest: ops.register()? },
        Opcode::Load => I::Load { dest: ops.register()? },
        Opcode::Store => I::Store { src: ops.register()? },
        Opcode::Set => I::Set { dest: ops.register()?, value: ops.data()? },
        Opcode::Copy => I::Copy { src: ops.register()?, dest: ops.register()? },
        Opcode::SetMemad => I::SetMemad { address: ops.data()? },
        Opcode::AddMemad => I::AddMemad { offset: ops.address_register()? },
    };
    Ok(Line::Instruction(instr))
}

/// Returns true for lines that carry no instruction
fn is_skipped(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSER
// ═══════════════════════════════════════════════════════════════════════════════

/// Single-use parser state
pub struct Parser {
    /// Block receiving instructions (placeholder until the first `BLOCK`)
    current: BlockId,
    /// Declared blocks, declaration order
    declared: Vec<BlockId>,
    /// Instructions per block, placeholder included
    blocks: HashMap<BlockId, Vec<Instruction>>,
    /// Jump targets with every line referencing them, first-reference order
    unresolved: Vec<(BlockId, Vec<usize>)>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        let placeholder = BlockId::placeholder();
        let mut blocks = HashMap::new();
        blocks.insert(placeholder.clone(), Vec::new());
        Self {
            current: placeholder,
            declared: Vec::new(),
            blocks,
            unresolved: Vec::new(),
        }
    }

    /// Parses `lines` into a validated program
    pub fn parse<S: AsRef<str>>(mut self, lines: &[S]) -> ParseResult<Program> {
        for (index, line) in lines.iter().enumerate() {
            self.parse_line(index, line.as_ref())?;
        }
        self.finish()
    }

    fn parse_line(&mut self, index: usize, line: &str) -> ParseResult<()> {
        if is_skipped(line) {
            return Ok(());
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (mnemonic, operands) = match tokens.split_first() {
            Some(split) => split,
            None => return Ok(()),
        };
        let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| {
            ParseError::at(index, ParseErrorKind::UnknownOpcode(mnemonic.to_string()))
        })?;
        if operands.len() != opcode.arity() {
            return Err(ParseError::at(
                index,
                ParseErrorKind::Arity {
                    opcode,
                    expected: opcode.arity(),
                    found: operands.len(),
                },
            ));
        }

        let mut ops = Operands::new(opcode, index, operands);
        match decode(opcode, &mut ops)? {
            Line::Declare(id) => self.declare(index, id),
            Line::Instruction(instr) => {
                self.emit(index, instr);
                Ok(())
            }
        }
    }

    fn declare(&mut self, index: usize, id: BlockId) -> ParseResult<()> {
        if self.blocks.contains_key(&id) {
            return Err(ParseError::at(index, ParseErrorKind::DuplicateBlock(id)));
        }
        tracing::debug!("block {} declared at line {}", id, index);
        self.blocks.insert(id.clone(), Vec::new());
        self.declared.push(id.clone());
        self.current = id;
        Ok(())
    }

    fn emit(&mut self, index: usize, instr: Instruction) {
        if let Some(target) = instr.jump_target() {
            match self.unresolved.iter_mut().find(|(id, _)| id == target) {
                Some((_, lines)) => lines.push(index),
                None => self.unresolved.push((target.clone(), vec![index])),
            }
        }
        self.blocks.entry(self.current.clone()).or_default().push(instr);
    }

    fn finish(mut self) -> ParseResult<Program> {
        if !self.blocks.contains_key(&BlockId::start()) {
            return Err(ParseError::program(ParseErrorKind::MissingStart));
        }

        for (target, lines) in &self.unresolved {
            if !self.blocks.contains_key(target) {
                return Err(ParseError {
                    line: lines.first().copied(),
                    kind: ParseErrorKind::UnresolvedJumpTarget {
                        target: target.clone(),
                        lines: lines.clone(),
                    },
                });
            }
        }

        if let Some(orphans) = self.blocks.remove(&BlockId::placeholder()) {
            if !orphans.is_empty() {
                tracing::warn!(
                    "{} instruction(s) before the first BLOCK were discarded",
                    orphans.len()
                );
            }
        }

        Ok(Program::new(self.declared, self.blocks))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONVENIENCE FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Parses an ordered sequence of source lines
pub fn parse<S: AsRef<str>>(lines: &[S]) -> ParseResult<Program> {
    Parser::new().parse(lines)
}

/// Parses a whole source text
pub fn parse_source(source: &str) -> ParseResult<Program> {
    let lines: Vec<&str> = source.lines().collect();
    parse(&lines)
}
