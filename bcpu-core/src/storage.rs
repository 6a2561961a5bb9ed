//! Sparse default-zero storage
//!
//! One implementation backs both the register file (keyed by register name)
//! and memory (keyed by address). The two aliases keep them distinct types.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::operand::Register;

/// Key → value store; absent keys read as zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storage<K: Ord> {
    cells: BTreeMap<K, BigUint>,
}

/// Registers by name
pub type RegisterFile = Storage<Register>;

/// Memory cells by address
pub type MemoryBank = Storage<BigUint>;

impl<K: Ord> Default for Storage<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> Storage<K> {
    pub fn new() -> Self {
        Self { cells: BTreeMap::new() }
    }

    /// Value under `key`, or zero when it was never written
    pub fn get<Q>(&self, key: &Q) -> BigUint
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.cells.get(key).cloned().unwrap_or_else(BigUint::zero)
    }

    /// Inserts or overwrites
    pub fn update(&mut self, key: K, value: BigUint) {
        self.cells.insert(key, value);
    }

    /// Whether `key` has been written
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.cells.contains_key(key)
    }

    /// Written cells in key order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &BigUint)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl RegisterFile {
    /// Register file with `CARRY` and `MEMAD` present and zero
    pub fn with_special_registers() -> Self {
        let mut registers = Self::new();
        registers.update(Register::carry(), BigUint::zero());
        registers.update(Register::memad(), BigUint::zero());
        registers
    }
}

/// Keys and values as strings (values in decimal)
impl<K: Ord + fmt::Display> Serialize for Storage<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (key, value) in &self.cells {
            map.serialize_entry(&key.to_string(), &value.to_string())?;
        }
        map.end()
    }
}
