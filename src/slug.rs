//! Obfuscated public identifiers for events.
//!
//! Invitation links carry a slug instead of the raw database id so guests
//! cannot enumerate events. The transform is a reversible linear map, not
//! cryptography: it only keeps casual guessing out of shared links.

const PREFIX: &str = "EVT-";
const MULTIPLIER: i64 = 387_423;
const OFFSET: i64 = 91_274;

/// Largest id that encodes without overflow.
pub const MAX_ID: i64 = (i64::MAX - OFFSET) / MULTIPLIER;

/// Encode a positive event id into its public slug.
/// Returns `None` for ids outside `1..=MAX_ID`.
#[must_use]
pub fn encode(id: i64) -> Option<String> {
    if !(1..=MAX_ID).contains(&id) {
        return None;
    }
    Some(format!("{PREFIX}{}", id * MULTIPLIER + OFFSET))
}

/// Decode a slug back to the event id. Returns `None` unless the input
/// carries the prefix and the remainder is a value `encode` could have
/// produced.
#[must_use]
pub fn decode(slug: &str) -> Option<i64> {
    let digits = slug.strip_prefix(PREFIX)?;
    let value: i64 = digits.parse().ok()?;
    let shifted = value.checked_sub(OFFSET)?;
    if shifted <= 0 || shifted % MULTIPLIER != 0 {
        return None;
    }
    Some(shifted / MULTIPLIER)
}

#[cfg(test)]
#[path = "slug_test.rs"]
mod tests;
