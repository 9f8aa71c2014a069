//! Frame parser: binds unframer and extractor events to the measurement
//! context.
//!
//! The parser owns the [`DatasetExtractor`] and the [`TicContext`] and is
//! the pipeline's only writer of the latter. It implements
//! [`FrameListener`], so the [`Unframer`](crate::Unframer) drives it
//! directly: frame content is forwarded to the extractor, extracted
//! records are pulled back immediately and folded into the context, and
//! frame boundaries trigger the mandatory extractor reset plus the frame
//! bookkeeping (frame counter, heartbeat, sync state).
//!
//! Only recognized labels mutate measurements; everything else is ignored,
//! which keeps the decoder forward compatible. An invalid record never
//! touches a measurement — it only moves counters.

use linky_core::constants::UNKNOWN_POWER;
use linky_core::{SyncState, TicContext};
use serde::{Deserialize, Serialize};

use crate::dataset::{Quantity, RawDataset};
use crate::extractor::DatasetExtractor;
use crate::mode::TicMode;
use crate::unframer::FrameListener;

/// Decode policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Force a protocol mode instead of auto-detecting it from the first
    /// record of the session.
    pub mode: Option<TicMode>,

    /// Revert from `InSync` to `NoSync` after this many consecutive
    /// invalid records. `None` (the default) never reverts: sync, once
    /// acquired, is permanent.
    pub desync_after: Option<u32>,
}

/// Interprets extracted datasets and maintains the measurement context.
#[derive(Debug)]
pub struct FrameParser {
    ctx: TicContext,
    extractor: DatasetExtractor,
    config: DecoderConfig,

    /// Consecutive invalid records, feeding the desync policy.
    invalid_streak: u32,

    /// Corruption observed inside the current frame. Sync is only
    /// (re)acquired by a frame that decoded cleanly.
    frame_failures: u32,

    /// Reading from an external instantaneous-power sensor. Independent
    /// of the TIC-derived fields, never folded into the context.
    last_inst_power: Option<u32>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        FrameParser {
            ctx: TicContext::new(),
            extractor: DatasetExtractor::with_mode(config.mode),
            config,
            invalid_streak: 0,
            frame_failures: 0,
            last_inst_power: None,
        }
    }

    /// The measurement context, consistent between `feed` calls.
    #[must_use]
    pub fn context(&self) -> &TicContext {
        &self.ctx
    }

    /// The session's resolved protocol mode, once known.
    #[must_use]
    pub fn mode(&self) -> Option<TicMode> {
        self.extractor.mode()
    }

    /// Accept a refreshed measurement from an external instantaneous-power
    /// sensor. Stored alongside, never conflated with the TIC-decoded
    /// withdrawn power.
    pub fn on_new_inst_power_measurement(&mut self, power: u32) {
        self.last_inst_power = Some(power);
    }

    #[must_use]
    pub fn last_inst_power(&self) -> Option<u32> {
        self.last_inst_power
    }

    /// Pull everything the extractor has queued and fold it in.
    fn drain_records(&mut self) {
        while let Some(record) = self.extractor.next_dataset() {
            self.apply_record(&record);
        }

        let lost = self.extractor.take_lost_bytes();
        if lost > 0 {
            self.ctx.lost_tic_bytes += lost as u32;
            self.frame_failures += 1;
        }
    }

    fn apply_record(&mut self, record: &RawDataset) {
        if !record.is_valid() {
            self.record_failure(record.len());
            return;
        }

        // The extractor resolved the mode before validating this record
        let Some(mode) = self.extractor.mode() else {
            return;
        };

        let dataset = match record.split(mode) {
            Ok(dataset) => dataset,
            Err(_) => {
                self.record_failure(record.len());
                return;
            }
        };

        self.invalid_streak = 0;

        match dataset.quantity() {
            Some(Quantity::ApparentPower) => {
                if let Ok(power) = dataset.value_as_i32() {
                    self.apply_power(power);
                }
            }
            Some(Quantity::InjectedPower) => {
                // Injection is reported as negative withdrawn power
                if let Ok(power) = dataset.value_as_i32() {
                    self.apply_power(-power);
                }
            }
            // Recognized but carrying no measurement for this context
            Some(Quantity::MeterAddress | Quantity::TariffPeriod) => {}
            // Unknown label: ignored by design
            None => {}
        }
    }

    fn apply_power(&mut self, power: i32) {
        if power == UNKNOWN_POWER {
            // The sentinel itself can never be a measurement
            return;
        }
        self.ctx.last_valid_withdrawn_power = power;
        self.ctx.tic_updates += 1;
    }

    fn record_failure(&mut self, record_len: usize) {
        self.ctx.lost_tic_bytes += record_len as u32;
        self.frame_failures += 1;

        if self.ctx.is_in_sync() {
            self.ctx.late_tic_decode_count += 1;
        }

        self.invalid_streak += 1;
        if let Some(limit) = self.config.desync_after
            && self.invalid_streak >= limit
        {
            self.ctx.last_tic_decode_state = SyncState::NoSync;
            self.invalid_streak = 0;
        }
    }
}

impl FrameListener for FrameParser {
    fn on_frame_start(&mut self) {
        // Guarantee a clean accumulation buffer at every frame start. The
        // discarded length is not re-counted: when a frame is abandoned the
        // unframer already reported all of its bytes lost.
        let _ = self.extractor.reset();
        self.frame_failures = 0;
    }

    fn on_frame_bytes(&mut self, bytes: &[u8]) {
        self.extractor.feed(bytes);
        self.drain_records();
    }

    fn on_frame_complete(&mut self) {
        self.drain_records();

        // Mandatory reset: a dataset truncated by the frame end must not
        // leak into the next frame
        let discarded = self.extractor.reset();
        if discarded > 0 {
            self.ctx.lost_tic_bytes += discarded as u32;
            self.frame_failures += 1;
        }

        self.ctx.nb_frames_parsed += 1;
        self.ctx.beat = !self.ctx.beat;

        // A frame that decoded cleanly (re)acquires sync
        if self.ctx.last_tic_decode_state == SyncState::NoSync && self.frame_failures == 0 {
            self.ctx.last_tic_decode_state = SyncState::InSync;
        }
        self.frame_failures = 0;
    }

    fn on_bytes_lost(&mut self, count: usize) {
        self.ctx.lost_tic_bytes += count as u32;
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}
