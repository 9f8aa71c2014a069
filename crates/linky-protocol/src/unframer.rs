//! Frame boundary detection over the raw TIC byte stream.
//!
//! The unframer is the first pipeline stage: it watches a raw, possibly
//! corrupted byte stream for the STX/ETX frame delimiters and streams
//! everything in between to a [`FrameListener`]. It holds no buffer —
//! frame content is forwarded the moment it arrives, in on-wire order,
//! batched into the longest delimiter-free runs available.
//!
//! # State machine
//!
//! ```text
//! ┌──────────────┐    STX     ┌─────────────┐
//! │ OutsideFrame │──────────>│ InsideFrame │
//! └──────────────┘            └─────────────┘
//!       ^  │ other bytes        │    │  STX (frame abandoned,
//!       │  │ (counted lost)     │    │   bytes counted lost)
//!       │  │                    │    └───> stays InsideFrame
//!       │  └────────────────────│
//!       │     ETX (frame complete) or EOT (frame abandoned)
//!       └───────────────────────┘
//! ```
//!
//! Every byte has a defined next state; nothing the meter sends can wedge
//! the unframer. An STX received while already inside a frame means the
//! previous frame was truncated: its bytes are reported lost and decoding
//! restarts immediately on the new frame (implicit resync). An EOT means
//! the meter broke off transmission; the partial frame is dropped without
//! a completion event.
//!
//! A stray ETX while outside a frame still emits a completion event, so
//! the number of completions always equals the number of ETX bytes seen —
//! that equality is what the frame counter downstream is defined against,
//! and it gives resynchronization a deterministic anchor when the decoder
//! joins mid-frame.

use linky_core::constants::{FRAME_END_BYTE, FRAME_INTERRUPT_BYTE, FRAME_START_BYTE};

/// Receiver of unframer events.
///
/// Implemented by the frame parser; methods are invoked synchronously and
/// in stream order while [`Unframer::feed`] runs.
pub trait FrameListener {
    /// A frame has started (STX seen).
    fn on_frame_start(&mut self) {}

    /// Content bytes received inside a frame, in on-wire order.
    fn on_frame_bytes(&mut self, bytes: &[u8]);

    /// A frame has ended (ETX seen). Emitted before any further byte is
    /// processed.
    fn on_frame_complete(&mut self);

    /// Bytes were discarded: noise outside a frame, or the content of an
    /// abandoned frame.
    fn on_bytes_lost(&mut self, count: usize) {
        let _ = count;
    }
}

/// Unframer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnframerState {
    /// Scanning for STX; everything else is noise.
    #[default]
    OutsideFrame,

    /// Forwarding frame content; scanning for ETX.
    InsideFrame,
}

/// Finds frame boundaries in a raw byte stream.
#[derive(Debug, Default)]
pub struct Unframer {
    state: UnframerState,

    /// Content bytes forwarded for the current frame, for loss accounting
    /// when the frame is abandoned.
    frame_len: usize,
}

impl Unframer {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> UnframerState {
        self.state
    }

    /// Process raw bytes, emitting events on `listener` as they resolve.
    pub fn feed<L: FrameListener>(&mut self, bytes: &[u8], listener: &mut L) {
        let mut rest = bytes;

        while !rest.is_empty() {
            rest = match self.state {
                UnframerState::OutsideFrame => self.scan_outside(rest, listener),
                UnframerState::InsideFrame => self.scan_inside(rest, listener),
            };
        }
    }

    fn scan_outside<'a, L: FrameListener>(
        &mut self,
        bytes: &'a [u8],
        listener: &mut L,
    ) -> &'a [u8] {
        let Some(pos) = bytes
            .iter()
            .position(|&b| b == FRAME_START_BYTE || b == FRAME_END_BYTE)
        else {
            listener.on_bytes_lost(bytes.len());
            return &[];
        };

        if pos > 0 {
            listener.on_bytes_lost(pos);
        }

        match bytes[pos] {
            FRAME_START_BYTE => {
                self.state = UnframerState::InsideFrame;
                self.frame_len = 0;
                listener.on_frame_start();
            }
            // Stray ETX: completion count mirrors the delimiter count
            _ => listener.on_frame_complete(),
        }

        &bytes[pos + 1..]
    }

    fn scan_inside<'a, L: FrameListener>(
        &mut self,
        bytes: &'a [u8],
        listener: &mut L,
    ) -> &'a [u8] {
        let Some(pos) = bytes.iter().position(|&b| {
            b == FRAME_START_BYTE || b == FRAME_END_BYTE || b == FRAME_INTERRUPT_BYTE
        }) else {
            self.frame_len += bytes.len();
            listener.on_frame_bytes(bytes);
            return &[];
        };

        if pos > 0 {
            self.frame_len += pos;
            listener.on_frame_bytes(&bytes[..pos]);
        }

        match bytes[pos] {
            FRAME_END_BYTE => {
                self.state = UnframerState::OutsideFrame;
                self.frame_len = 0;
                listener.on_frame_complete();
            }
            FRAME_START_BYTE => {
                // Truncated frame: the meter started over. Drop what we
                // forwarded and resync on the new frame.
                listener.on_bytes_lost(self.frame_len);
                self.frame_len = 0;
                listener.on_frame_start();
            }
            _ => {
                // EOT: transmission interrupted, no completion
                listener.on_bytes_lost(self.frame_len);
                self.frame_len = 0;
                self.state = UnframerState::OutsideFrame;
            }
        }

        &bytes[pos + 1..]
    }
}
