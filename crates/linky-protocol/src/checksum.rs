//! TIC dataset checksum.
//!
//! Every dataset record carries a one-byte checksum computed as the sum of
//! the bytes in scope, truncated to 6 bits and offset into printable ASCII:
//!
//! ```text
//! checksum = (sum(scope) & 0x3F) + 0x20
//! ```
//!
//! Which bytes are in scope depends on the protocol mode — see
//! [`TicMode::checksum_scope`](crate::TicMode::checksum_scope). The
//! functions here are pure and hold no state.

use linky_core::constants::{CHECKSUM_MASK, CHECKSUM_OFFSET};

/// Compute the TIC checksum over a byte range.
///
/// # Example
///
/// ```
/// use linky_protocol::checksum;
///
/// // Historical-mode scope: label, separator, value
/// assert_eq!(checksum::compute(b"PAPP 01230"), b'\'');
/// ```
#[must_use]
pub fn compute(scope: &[u8]) -> u8 {
    let sum = scope.iter().fold(0u32, |acc, &b| acc.wrapping_add(u32::from(b)));
    (sum as u8 & CHECKSUM_MASK) + CHECKSUM_OFFSET
}

/// Check a byte range against its expected checksum byte.
#[must_use]
pub fn verify(scope: &[u8], expected: u8) -> bool {
    compute(scope) == expected
}
