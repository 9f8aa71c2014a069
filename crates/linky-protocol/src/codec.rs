//! Tokio codec wrapping the TIC decoding pipeline.
//!
//! [`TicCodec`] adapts a [`TicDecoder`] to `tokio_util`'s [`Decoder`]
//! trait so a serial port or a ser2net-style TCP bridge can be read with
//! `FramedRead`. Each item is a [`TicContext`] snapshot taken right after
//! a frame completed — one item per frame, taken while no update is in
//! flight, so consumers never observe a half-applied frame.
//!
//! There is no `Encoder`: the customer tele-information link is strictly
//! one-way, the meter transmits and never listens.
//!
//! # Usage with FramedRead
//!
//! ```no_run
//! use futures::StreamExt;
//! use linky_protocol::TicCodec;
//! use tokio::net::TcpStream;
//! use tokio_util::codec::FramedRead;
//!
//! # async fn example() -> linky_core::Result<()> {
//! let stream = TcpStream::connect("192.168.1.17:2000").await?;
//! let mut framed = FramedRead::new(stream, TicCodec::new());
//!
//! while let Some(snapshot) = framed.next().await.transpose()? {
//!     println!("power: {:?} VA", snapshot.withdrawn_power());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error handling
//!
//! Decoding itself never errors: meter-side corruption is absorbed by the
//! pipeline and surfaces as context counters. The error type exists for
//! the transport (`io::Error` bubbling up through `FramedRead`).

use bytes::BytesMut;
use linky_core::constants::FRAME_END_BYTE;
use linky_core::{Result, TicContext};
use tokio_util::codec::Decoder;

use crate::decoder::TicDecoder;
use crate::parser::DecoderConfig;

/// Tokio [`Decoder`] yielding one context snapshot per decoded frame.
#[derive(Debug, Default)]
pub struct TicCodec {
    decoder: TicDecoder,
}

impl TicCodec {
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        TicCodec {
            decoder: TicDecoder::with_config(config),
        }
    }

    /// The wrapped decoder, for inspecting context or mode out of band.
    #[must_use]
    pub fn decoder(&self) -> &TicDecoder {
        &self.decoder
    }

    /// Mutable access, e.g. to forward an external instantaneous-power
    /// measurement into the pipeline.
    pub fn decoder_mut(&mut self) -> &mut TicDecoder {
        &mut self.decoder
    }
}

impl Decoder for TicCodec {
    type Item = TicContext;
    type Error = linky_core::Error;

    /// Feed buffered bytes up to and including the next frame end, and
    /// yield the context snapshot for that frame.
    ///
    /// The input is consumed one ETX-delimited slice at a time so that a
    /// read containing several frames yields one snapshot per frame
    /// rather than only the final state.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<TicContext>> {
        match src.iter().position(|&b| b == FRAME_END_BYTE) {
            Some(pos) => {
                let chunk = src.split_to(pos + 1);
                self.decoder.feed(&chunk);
                Ok(Some(self.decoder.snapshot()))
            }
            None => {
                // No frame boundary in sight; push what we have through
                // the pipeline and wait for more
                if !src.is_empty() {
                    self.decoder.feed(&src[..]);
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}
