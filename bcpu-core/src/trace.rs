//! Execution trace
//!
//! Every executed step yields one `TraceEntry`: the opcode, the operands it
//! touched with their values before the step (`involved`), the operands it
//! wrote with their values after the step (`changed`), and the cursor
//! before and after.

use std::fmt;
use std::io::{self, BufWriter, Write};

use num_bigint::BigUint;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::instruction::Opcode;
use crate::operand::{BlockId, Register};
use crate::program::Cursor;

/// Serializes a big integer as a decimal string
fn decimal<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Operand role inside one instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// n-th register operand, 1-based
    Reg(u8),
    Carry,
    Memad,
    /// Memory cell addressed by `MEMAD`
    Memory,
    /// Literal operand
    Data,
    JumpTarget,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reg(n) => write!(f, "Reg_{}", n),
            Self::Carry => write!(f, "CARRY"),
            Self::Memad => write!(f, "MEMAD"),
            Self::Memory => write!(f, "Memory"),
            Self::Data => write!(f, "Data"),
            Self::JumpTarget => write!(f, "Jump target"),
        }
    }
}

/// Value recorded for one slot
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SnapshotValue {
    Register {
        name: Register,
        #[serde(serialize_with = "decimal")]
        value: BigUint,
    },
    Memory {
        #[serde(serialize_with = "decimal")]
        address: BigUint,
        #[serde(serialize_with = "decimal")]
        value: BigUint,
    },
    Literal {
        #[serde(serialize_with = "decimal")]
        value: BigUint,
    },
    Block {
        id: BlockId,
    },
}

impl SnapshotValue {
    /// Numeric content, if the slot holds one
    pub fn value(&self) -> Option<&BigUint> {
        match self {
            Self::Register { value, .. } | Self::Memory { value, .. } | Self::Literal { value } => {
                Some(value)
            }
            Self::Block { .. } => None,
        }
    }
}

impl fmt::Display for SnapshotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register { name, value } => write!(f, "{}={}", name, value),
            Self::Memory { address, value } => write!(f, "[{}]={}", address, value),
            Self::Literal { value } => write!(f, "{}", value),
            Self::Block { id } => write!(f, "{}", id),
        }
    }
}

/// Ordered slot → value record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperandSnapshot(Vec<(Slot, SnapshotValue)>);

impl OperandSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, slot: Slot, name: &Register, value: BigUint) {
        self.push(slot, SnapshotValue::Register { name: name.clone(), value });
    }

    /// Adds or replaces the entry for `slot`
    pub(crate) fn push(&mut self, slot: Slot, value: SnapshotValue) {
        match self.0.iter_mut().find(|(s, _)| *s == slot) {
            Some(entry) => entry.1 = value,
            None => self.0.push((slot, value)),
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&SnapshotValue> {
        self.0.iter().find(|(s, _)| *s == slot).map(|(_, v)| v)
    }

    /// Numeric value recorded for `slot`
    pub fn value(&self, slot: Slot) -> Option<&BigUint> {
        self.get(slot).and_then(SnapshotValue::value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Slot, SnapshotValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for OperandSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (slot, value) in &self.0 {
            map.serialize_entry(&slot.to_string(), value)?;
        }
        map.end()
    }
}

impl fmt::Display for OperandSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (slot, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", slot, value)?;
        }
        Ok(())
    }
}

/// One executed step
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TraceEntry {
    pub opcode: Opcode,
    pub involved: OperandSnapshot,
    pub changed: OperandSnapshot,
    pub before: Cursor,
    pub after: Cursor,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}  {:<8}", self.before, self.after, self.opcode.mnemonic())?;
        if !self.involved.is_empty() {
            write!(f, " [{}]", self.involved)?;
        }
        if !self.changed.is_empty() {
            write!(f, " => [{}]", self.changed)?;
        }
        Ok(())
    }
}

/// Writes one JSON object per entry, newline separated
pub fn write_jsonl<'a, W, I>(writer: W, entries: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a TraceEntry>,
{
    let mut out = BufWriter::new(writer);
    let mut count = 0;
    for entry in entries {
        serde_json::to_writer(&mut out, entry)?;
        out.write_all(b"\n")?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}
