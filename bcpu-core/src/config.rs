//! Environment configuration loading from .env files
//!
//! Defaults for the engine and the command-line runner. Each value can be
//! set in the environment or in a `.env` file next to the working directory.

use std::env;

use once_cell::sync::Lazy;

use crate::cpu::MAX_BIT_WIDTH;

// Load .env the first time any value is read
static DOTENV_INIT: Lazy<()> = Lazy::new(|| {
    let _ = dotenv::dotenv();
});

#[inline]
fn ensure_loaded() {
    let _ = &*DOTENV_INIT;
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Register width in bits
/// Default: 8
pub fn default_bit_width() -> u32 {
    ensure_loaded();
    env::var("BCPU_BIT_WIDTH")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|w: &u32| (1..=MAX_BIT_WIDTH).contains(w))
        .unwrap_or(8)
}

/// Wrap past the end of a block instead of failing
/// Default: false
pub fn default_autoloop() -> bool {
    ensure_loaded();
    env::var("BCPU_AUTOLOOP")
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(false)
}

/// Step budget for a bounded run
/// Default: 100
pub fn default_max_steps() -> usize {
    ensure_loaded();
    env::var("BCPU_MAX_STEPS")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(100)
}

/// Cached values
pub static BIT_WIDTH: Lazy<u32> = Lazy::new(default_bit_width);
pub static AUTOLOOP: Lazy<bool> = Lazy::new(default_autoloop);
pub static MAX_STEPS: Lazy<usize> = Lazy::new(default_max_steps);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" on "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_cached_bit_width_is_positive() {
        assert!(*BIT_WIDTH > 0);
        assert!(*BIT_WIDTH <= MAX_BIT_WIDTH);
    }
}
