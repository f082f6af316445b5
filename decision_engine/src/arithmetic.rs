//! Decision Engine v1: integer primitives.
//!
//! All rules math is pure integer. No float. No f64. No f32.

use crate::error::EngineError;

/// Arithmetic mean truncated toward zero. Empty input yields 0.
pub fn truncated_mean(values: &[i32]) -> i32 {
    if values.is_empty() {
        return 0;
    }
    let total: i64 = values.iter().map(|&v| i64::from(v)).sum();
    // |mean| <= max |value|, so the narrowing cannot overflow.
    (total / values.len() as i64) as i32
}

/// `floor(value * 0.5)` without going through float.
pub fn half_floor(value: i64) -> i64 {
    value.div_euclid(2)
}

/// True if `id` matches `[A-Za-z0-9_-]+`.
pub fn is_valid_card_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

/// Validate that a card id matches `[A-Za-z0-9_-]+`.
pub fn validate_card_id(id: &str) -> Result<(), EngineError> {
    if is_valid_card_id(id) {
        Ok(())
    } else {
        Err(EngineError::InvalidCardId(id.to_string()))
    }
}
