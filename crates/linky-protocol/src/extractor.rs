//! Dataset extractor for bytes delivered inside a TIC frame.
//!
//! The extractor splits the inside-frame byte stream into dataset records
//! delimited by LF/CR, validates each record's checksum for the active
//! mode, and queues the result for the frame parser to pull. Invalid
//! records are queued too — the parser needs them for loss accounting —
//! but flagged so their value is never applied.
//!
//! # State machine
//!
//! ```text
//! ┌──────┐   LF                ┌──────────────┐   CR, record queued
//! │ Idle │───────────────────>│ Accumulating │──────────────────────┐
//! └──────┘                    └──────────────┘                      │
//!    ^  │ other bytes            │        │ LF (unterminated        │
//!    │  │ (counted lost)         │        │  predecessor discarded) │
//!    │  │                        │        └───> stays Accumulating  │
//!    │  └────────────────────────│                                  │
//!    │       buffer > MAX_DATASET_SIZE (discarded, counted lost)    │
//!    └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The accumulation buffer is pre-sized to the maximum record length and
//! never grows past it, so a stream that loses its CR cannot exhaust
//! memory.
//!
//! # Frame boundaries
//!
//! [`reset`](DatasetExtractor::reset) must be called on *every* frame
//! boundary, whatever state the extractor is in. Skipping it would let an
//! unterminated dataset swallow bytes from the next frame, corrupting the
//! label/value pairing — unterminated datasets do happen in historical
//! TIC streams. The resolved mode survives the reset: it is a property of
//! the session, not of one frame.

use bytes::{Bytes, BytesMut};
use linky_core::constants::{DATASET_END_BYTE, DATASET_START_BYTE, MAX_DATASET_SIZE};
use std::collections::VecDeque;

use crate::dataset::RawDataset;
use crate::mode::TicMode;

/// Queue capacity covering the datasets of a typical frame.
const INITIAL_RECORD_QUEUE_CAPACITY: usize = 16;

/// Extractor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorState {
    /// No partial record buffered; waiting for LF.
    Idle,

    /// Building a record; waiting for CR.
    Accumulating,
}

/// Splits inside-frame bytes into checksum-validated dataset records.
#[derive(Debug)]
pub struct DatasetExtractor {
    state: ExtractorState,

    /// Accumulation buffer for the record being built. Bounded by
    /// [`MAX_DATASET_SIZE`].
    buffer: BytesMut,

    /// Complete records ready for the parser to pull.
    records: VecDeque<RawDataset>,

    /// Active mode; `None` until configured or detected from the first
    /// complete record.
    mode: Option<TicMode>,

    /// Mode fixed at construction, if any. Restored by [`clear`](Self::clear).
    configured_mode: Option<TicMode>,

    /// Bytes discarded since the last [`take_lost_bytes`](Self::take_lost_bytes).
    lost_bytes: usize,
}

impl DatasetExtractor {
    /// Extractor that auto-detects the mode from the first record.
    pub fn new() -> Self {
        Self::with_mode(None)
    }

    /// Extractor with the mode fixed (`None` = auto-detect).
    pub fn with_mode(mode: Option<TicMode>) -> Self {
        DatasetExtractor {
            state: ExtractorState::Idle,
            buffer: BytesMut::with_capacity(MAX_DATASET_SIZE),
            records: VecDeque::with_capacity(INITIAL_RECORD_QUEUE_CAPACITY),
            mode,
            configured_mode: mode,
            lost_bytes: 0,
        }
    }

    /// Consume bytes delivered while inside a frame.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push_byte(byte);
        }
    }

    fn push_byte(&mut self, byte: u8) {
        match byte {
            DATASET_START_BYTE => {
                if self.state == ExtractorState::Accumulating {
                    // Unterminated predecessor: its CR never came
                    self.lost_bytes += self.buffer.len();
                    self.buffer.clear();
                }
                self.state = ExtractorState::Accumulating;
            }
            DATASET_END_BYTE => {
                match self.state {
                    ExtractorState::Accumulating => self.finish_record(),
                    // Stray CR between records
                    ExtractorState::Idle => self.lost_bytes += 1,
                }
                self.state = ExtractorState::Idle;
            }
            _ => match self.state {
                ExtractorState::Accumulating => {
                    if self.buffer.len() >= MAX_DATASET_SIZE {
                        // No CR in sight; abandon rather than grow
                        self.lost_bytes += self.buffer.len() + 1;
                        self.buffer.clear();
                        self.state = ExtractorState::Idle;
                    } else {
                        self.buffer.extend_from_slice(&[byte]);
                    }
                }
                // Bytes between a CR and the next LF
                ExtractorState::Idle => self.lost_bytes += 1,
            },
        }
    }

    fn finish_record(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let record = Bytes::copy_from_slice(&self.buffer);
        self.buffer.clear();

        let mode = *self.mode.get_or_insert_with(|| TicMode::detect(&record));
        let valid = mode.verify_record(&record);
        self.records.push_back(RawDataset::new(record, valid));
    }

    /// Pull the next extracted record, valid or invalid.
    pub fn next_dataset(&mut self) -> Option<RawDataset> {
        self.records.pop_front()
    }

    /// Number of records ready to pull.
    #[must_use]
    pub fn datasets_available(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn state(&self) -> ExtractorState {
        self.state
    }

    /// The resolved mode, once the first record has been seen (or the
    /// configured one, if fixed at construction).
    #[must_use]
    pub fn mode(&self) -> Option<TicMode> {
        self.mode
    }

    /// Mandatory frame-boundary reset: discard any partial accumulation
    /// and return to [`ExtractorState::Idle`].
    ///
    /// Returns the number of bytes discarded so the caller can account
    /// them. Idempotent: calling with nothing pending returns 0 and
    /// changes nothing. Queued complete records and the resolved mode are
    /// untouched.
    pub fn reset(&mut self) -> usize {
        let discarded = self.buffer.len();
        self.buffer.clear();
        self.state = ExtractorState::Idle;
        discarded
    }

    /// Drain the tally of bytes discarded by the extractor itself
    /// (stray bytes, unterminated or oversized records).
    pub fn take_lost_bytes(&mut self) -> usize {
        std::mem::take(&mut self.lost_bytes)
    }

    /// Full session reset: accumulation, queue, lost-byte tally, and the
    /// mode back to its configured value.
    pub fn clear(&mut self) {
        self.reset();
        self.records.clear();
        self.lost_bytes = 0;
        self.mode = self.configured_mode;
    }
}

impl Default for DatasetExtractor {
    fn default() -> Self {
        Self::new()
    }
}
