//! Reserved names shared by the parser, the validators and the engine.
//!
//! Block identifiers, registers and data literals live in one lexical space
//! at the operand boundary; these constants are the only place the prefixes
//! and reserved words are spelled out.

/// Prefix of every general-purpose register (`R_A`, `R_counter`, ...)
pub const REGISTER_PREFIX: &str = "R_";

/// Overflow bit written by `ADD`
pub const CARRY: &str = "CARRY";

/// Memory address used by `LOAD`/`STORE`
pub const MEMAD: &str = "MEMAD";

/// Registers that exist without the `R_` prefix
pub const SPECIAL_REGISTERS: [&str; 2] = [CARRY, MEMAD];

/// Binary literal prefix
pub const BINARY_PREFIX: &str = "0b";
/// Decimal literal prefix
pub const DECIMAL_PREFIX: &str = "0d";
/// Hexadecimal literal prefix
pub const HEX_PREFIX: &str = "0x";

/// All data literal prefixes, each exactly two characters
pub const DATA_PREFIXES: [&str; 3] = [BINARY_PREFIX, DECIMAL_PREFIX, HEX_PREFIX];

/// Entry block every program must declare
pub const START_BLOCK: &str = "START";

/// Sentinel block of a halted cursor
pub const END_BLOCK: &str = "END";

/// Owner of instructions that precede the first `BLOCK` line (discarded)
pub const NO_BLOCK_ID: &str = "NO_BLOCK_ID";

/// First character of a comment line
pub const COMMENT_PREFIX: char = '#';

/// Returns true when `id` starts with one of the data literal prefixes
pub fn has_data_prefix(id: &str) -> bool {
    DATA_PREFIXES.iter().any(|prefix| id.starts_with(prefix))
}

/// Returns true for `CARRY` and `MEMAD`
pub fn is_special_register(id: &str) -> bool {
    SPECIAL_REGISTERS.contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_are_two_chars() {
        assert_eq!(REGISTER_PREFIX.len(), 2);
        for prefix in DATA_PREFIXES {
            assert_eq!(prefix.len(), 2);
        }
    }

    #[test]
    fn test_namespaces_disjoint() {
        assert!(!has_data_prefix(REGISTER_PREFIX));
        for name in SPECIAL_REGISTERS {
            assert!(!name.starts_with(REGISTER_PREFIX));
            assert!(!has_data_prefix(name));
        }
        assert!(has_data_prefix("0x1F"));
        assert!(!has_data_prefix("0"));
    }
}
