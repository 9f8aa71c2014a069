use crate::constants::UNKNOWN_POWER;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decoder synchronization state.
///
/// Starts at `NoSync` and moves to `InSync` once the decoder has seen at
/// least one complete frame. Whether it ever moves back is a configurable
/// policy of the frame parser, not a property of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// No complete frame decoded yet; the stream position is unknown.
    #[default]
    NoSync,

    /// At least one complete frame has been decoded.
    InSync,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::NoSync => write!(f, "no sync"),
            SyncState::InSync => write!(f, "in sync"),
        }
    }
}

/// Measurement context fed by the TIC frame parser.
///
/// This is the one piece of shared state between the decoding pipeline and
/// its consumers (display, reporting). The parser is the only writer;
/// consumers receive copies, never references into a half-updated struct.
///
/// All counters are monotonically increasing and reset only at process
/// restart.
///
/// # Example
///
/// ```
/// use linky_core::{SyncState, TicContext};
///
/// let ctx = TicContext::default();
/// assert_eq!(ctx.withdrawn_power(), None);
/// assert_eq!(ctx.last_tic_decode_state, SyncState::NoSync);
/// assert!(!ctx.beat);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicContext {
    /// Last successfully decoded withdrawn apparent power, in volt-amperes.
    ///
    /// Negative means the installation is injecting power into the grid.
    /// Holds [`UNKNOWN_POWER`] until the first valid power dataset;
    /// prefer [`withdrawn_power`](Self::withdrawn_power) for reading.
    pub last_valid_withdrawn_power: i32,

    /// Checksum/framing failures that occurred after sync had been acquired.
    pub late_tic_decode_count: u32,

    /// Measurement updates applied to this context.
    pub tic_updates: u32,

    /// Bytes discarded by the decoder (framing noise, bad checksums,
    /// oversized or truncated records).
    pub lost_tic_bytes: u32,

    /// Complete frames decoded.
    pub nb_frames_parsed: u32,

    /// Heartbeat, toggled on every completed frame.
    pub beat: bool,

    /// Last known synchronization state.
    pub last_tic_decode_state: SyncState,
}

impl TicContext {
    pub fn new() -> Self {
        TicContext {
            last_valid_withdrawn_power: UNKNOWN_POWER,
            late_tic_decode_count: 0,
            tic_updates: 0,
            lost_tic_bytes: 0,
            nb_frames_parsed: 0,
            beat: false,
            last_tic_decode_state: SyncState::NoSync,
        }
    }

    /// The last valid withdrawn power, or `None` if never decoded.
    #[must_use]
    pub fn withdrawn_power(&self) -> Option<i32> {
        if self.last_valid_withdrawn_power == UNKNOWN_POWER {
            None
        } else {
            Some(self.last_valid_withdrawn_power)
        }
    }

    /// Whether at least one complete frame has been decoded.
    #[must_use]
    pub fn is_in_sync(&self) -> bool {
        self.last_tic_decode_state == SyncState::InSync
    }
}

impl Default for TicContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_is_unknown() {
        let ctx = TicContext::default();

        assert_eq!(ctx.last_valid_withdrawn_power, UNKNOWN_POWER);
        assert_eq!(ctx.withdrawn_power(), None);
        assert_eq!(ctx.nb_frames_parsed, 0);
        assert_eq!(ctx.lost_tic_bytes, 0);
        assert_eq!(ctx.tic_updates, 0);
        assert_eq!(ctx.late_tic_decode_count, 0);
        assert!(!ctx.beat);
        assert!(!ctx.is_in_sync());
    }

    #[test]
    fn test_withdrawn_power_accessor() {
        let mut ctx = TicContext::new();

        ctx.last_valid_withdrawn_power = 1234;
        assert_eq!(ctx.withdrawn_power(), Some(1234));

        // Negative means injection, still a known value
        ctx.last_valid_withdrawn_power = -560;
        assert_eq!(ctx.withdrawn_power(), Some(-560));
    }

    #[test]
    fn test_sync_state_display() {
        assert_eq!(SyncState::NoSync.to_string(), "no sync");
        assert_eq!(SyncState::InSync.to_string(), "in sync");
    }

    #[test]
    fn test_context_serde_roundtrip() {
        let mut ctx = TicContext::new();
        ctx.last_valid_withdrawn_power = 750;
        ctx.nb_frames_parsed = 42;
        ctx.beat = true;
        ctx.last_tic_decode_state = SyncState::InSync;

        let json = serde_json::to_string(&ctx).unwrap();
        let back: TicContext = serde_json::from_str(&json).unwrap();

        assert_eq!(back, ctx);
    }
}
