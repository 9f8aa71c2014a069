//! Synchronous decoder facade.
//!
//! [`TicDecoder`] wires the [`Unframer`] to a [`FrameParser`] and is the
//! entry point for callers that feed raw bytes themselves (interrupt
//! handlers, blocking readers, tests). Async callers go through
//! [`TicCodec`](crate::TicCodec) instead, which wraps a decoder behind
//! `tokio_util`'s `Decoder` trait.
//!
//! # Example
//!
//! ```
//! use linky_protocol::TicDecoder;
//!
//! let mut decoder = TicDecoder::new();
//!
//! // "PAPP 01230 '" is a historical-mode record with a valid checksum
//! decoder.feed(b"\x02\x0aPAPP 01230 '\x0d\x03");
//!
//! let ctx = decoder.context();
//! assert_eq!(ctx.nb_frames_parsed, 1);
//! assert_eq!(ctx.withdrawn_power(), Some(1230));
//! ```

use linky_core::TicContext;

use crate::mode::TicMode;
use crate::parser::{DecoderConfig, FrameParser};
use crate::unframer::Unframer;

/// Complete TIC decoding pipeline behind a single `feed` call.
///
/// Feeding is synchronous and non-blocking; all processing happens inline
/// before `feed` returns, so the context read afterwards is always
/// consistent. `&mut self` makes the entry point a critical section by
/// construction.
#[derive(Debug)]
pub struct TicDecoder {
    unframer: Unframer,
    parser: FrameParser,
}

impl TicDecoder {
    /// Decoder with default policy: auto-detected mode, sync never
    /// reverts.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        TicDecoder {
            unframer: Unframer::new(),
            parser: FrameParser::with_config(config),
        }
    }

    /// Process raw bytes from the meter. Never fails, never blocks;
    /// corruption shows up in the context counters.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.unframer.feed(bytes, &mut self.parser);
    }

    /// The measurement context. Consistent between `feed` calls.
    #[must_use]
    pub fn context(&self) -> &TicContext {
        self.parser.context()
    }

    /// Copy of the context, for handing to consumers.
    #[must_use]
    pub fn snapshot(&self) -> TicContext {
        *self.parser.context()
    }

    /// The session's resolved protocol mode, once known.
    #[must_use]
    pub fn mode(&self) -> Option<TicMode> {
        self.parser.mode()
    }

    /// Accept a measurement from an external instantaneous-power sensor.
    pub fn on_new_inst_power_measurement(&mut self, power: u32) {
        self.parser.on_new_inst_power_measurement(power);
    }

    #[must_use]
    pub fn last_inst_power(&self) -> Option<u32> {
        self.parser.last_inst_power()
    }
}

impl Default for TicDecoder {
    fn default() -> Self {
        Self::new()
    }
}
