//! Operand validators
//!
//! Pure classifiers for the three operand namespaces. A token that passes
//! one validator can never pass another one, so operands stay unambiguous
//! without a type tag in the source text.

use crate::error::Rejection;
use crate::literal::Radix;
use crate::namespace::{
    self, END_BLOCK, MEMAD, NO_BLOCK_ID, REGISTER_PREFIX,
};

/// Checks a block identifier against the register, data and reserved namespaces
pub fn validate_block_id(id: &str) -> Result<(), Rejection> {
    if id.starts_with(REGISTER_PREFIX) {
        return Err(Rejection::RegisterPrefixCollision);
    }
    if namespace::is_special_register(id) {
        return Err(Rejection::SpecialRegisterCollision(id.to_string()));
    }
    if namespace::has_data_prefix(id) {
        return Err(Rejection::DataPrefixCollision);
    }
    match id {
        NO_BLOCK_ID => Err(Rejection::ReservedPlaceholder),
        END_BLOCK => Err(Rejection::ReservedEnd),
        _ => Ok(()),
    }
}

/// Checks a register operand.
///
/// `CARRY` is always accepted. `MEMAD` is a real register but only the
/// `ADDMEMAD` operand position passes `allow_memad = true`.
pub fn validate_register(id: &str, allow_memad: bool) -> Result<(), Rejection> {
    if id.starts_with(REGISTER_PREFIX) {
        return Ok(());
    }
    if !namespace::is_special_register(id) {
        return Err(Rejection::NotARegister);
    }
    if id == MEMAD && !allow_memad {
        return Err(Rejection::MemadNotAllowed);
    }
    Ok(())
}

/// Checks a data literal: `0b`/`0d`/`0x` followed by digits of that base.
/// The digit string may be empty (`0x` is zero).
pub fn validate_data(text: &str) -> Result<(), Rejection> {
    let mut chars = text.char_indices();
    let split = match (chars.next(), chars.next()) {
        (Some(_), Some((idx, c))) => idx + c.len_utf8(),
        _ => return Err(Rejection::MissingDataPrefix),
    };
    let (prefix, digits) = text.split_at(split);
    let radix = Radix::from_prefix(prefix)
        .ok_or_else(|| Rejection::InvalidDataPrefix(prefix.to_string()))?;

    match digits.chars().find(|c| !c.is_digit(radix.base())) {
        Some(digit) => Err(Rejection::InvalidDigit {
            radix: radix.base(),
            digit,
        }),
        None => Ok(()),
    }
}
