//! Async TIC stream reader.
//!
//! [`TicReader`] wraps any `AsyncRead` in a `FramedRead` with the TIC
//! codec and republishes each per-frame context snapshot on a
//! `tokio::sync::watch` channel. Consumers (display refresh, reporting)
//! hold a receiver and always observe a complete, consistent snapshot —
//! never a context in the middle of an update.
//!
//! The reader never fails on meter-side corruption; that shows up in the
//! published counters. [`run`](TicReader::run) only returns on transport
//! errors or end of stream.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use linky_core::TicContext;
use linky_protocol::{DecoderConfig, TicCodec, TicMode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::watch;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

/// Configuration for a TIC reader
///
/// # Example
///
/// ```
/// use linky_protocol::TicMode;
/// use linky_reader::ReaderConfig;
///
/// let config = ReaderConfig {
///     mode: Some(TicMode::Standard),
///     desync_after: Some(10),
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Force a protocol mode instead of auto-detecting it from the
    /// stream.
    pub mode: Option<TicMode>,

    /// Consecutive checksum failures before the decoder reverts to
    /// no-sync. `None` never reverts.
    pub desync_after: Option<u32>,
}

impl ReaderConfig {
    fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            mode: self.mode,
            desync_after: self.desync_after,
        }
    }
}

/// Errors that can occur while reading a TIC stream
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Failed to open or read the local serial port
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Error surfaced through the decoding stream (transport I/O)
    #[error("Decode stream error: {0}")]
    Decode(#[from] linky_core::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads a TIC byte stream and broadcasts per-frame context snapshots.
///
/// # Lifecycle
///
/// 1. Build with [`new`](Self::new), [`connect`](Self::connect) or
///    [`open_serial`](Self::open_serial); this also yields the first
///    watch receiver.
/// 2. Hand additional receivers out with [`subscribe`](Self::subscribe).
/// 3. Drive with [`run`](Self::run), typically on its own task.
///
/// # Thread safety
///
/// The reader itself lives on a single task; sharing happens exclusively
/// through the watch channel, whose receivers are freely cloneable.
pub struct TicReader<R> {
    framed: FramedRead<R, TicCodec>,
    tx: watch::Sender<TicContext>,

    /// When this reader was built.
    started_at: DateTime<Utc>,

    /// When the last complete frame was decoded.
    last_frame_at: Option<DateTime<Utc>>,

    /// Loss total already reported, to log only deltas.
    reported_lost: u32,

    was_in_sync: bool,
}

impl<R: AsyncRead + Unpin> TicReader<R> {
    /// Build a reader over any async byte source.
    pub fn new(io: R, config: ReaderConfig) -> (Self, watch::Receiver<TicContext>) {
        let (tx, rx) = watch::channel(TicContext::default());

        let reader = TicReader {
            framed: FramedRead::new(io, TicCodec::with_config(config.decoder_config())),
            tx,
            started_at: Utc::now(),
            last_frame_at: None,
            reported_lost: 0,
            was_in_sync: false,
        };

        (reader, rx)
    }

    /// Another receiver for the snapshot channel.
    pub fn subscribe(&self) -> watch::Receiver<TicContext> {
        self.tx.subscribe()
    }

    /// The decoder's current context.
    pub fn context(&self) -> &TicContext {
        self.framed.decoder().decoder().context()
    }

    /// The session's resolved protocol mode, once known.
    pub fn mode(&self) -> Option<TicMode> {
        self.framed.decoder().decoder().mode()
    }

    /// When this reader was built.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the last complete frame was decoded, if any.
    pub fn last_frame_at(&self) -> Option<DateTime<Utc>> {
        self.last_frame_at
    }

    /// Forward a measurement from an external instantaneous-power sensor
    /// into the pipeline. Independent of the TIC-decoded fields.
    pub fn on_new_inst_power_measurement(&mut self, power: u32) {
        self.framed
            .decoder_mut()
            .decoder_mut()
            .on_new_inst_power_measurement(power);
    }

    /// Read until the stream ends, publishing one snapshot per decoded
    /// frame.
    ///
    /// # Errors
    /// Returns an error only for transport failures; meter-side
    /// corruption is absorbed and published as counters.
    pub async fn run(mut self) -> Result<(), ReaderError> {
        info!("TIC reader started");

        while let Some(snapshot) = self.framed.next().await.transpose()? {
            self.publish(snapshot);
        }

        info!(
            frames = self.context().nb_frames_parsed,
            "TIC stream ended"
        );
        Ok(())
    }

    fn publish(&mut self, snapshot: TicContext) {
        self.last_frame_at = Some(Utc::now());

        if snapshot.is_in_sync() != self.was_in_sync {
            if snapshot.is_in_sync() {
                info!(frame = snapshot.nb_frames_parsed, "TIC decoder acquired sync");
            } else {
                warn!(frame = snapshot.nb_frames_parsed, "TIC decoder lost sync");
            }
            self.was_in_sync = snapshot.is_in_sync();
        }

        if snapshot.lost_tic_bytes > self.reported_lost {
            warn!(
                lost = snapshot.lost_tic_bytes - self.reported_lost,
                total = snapshot.lost_tic_bytes,
                "TIC bytes discarded"
            );
            self.reported_lost = snapshot.lost_tic_bytes;
        }

        debug!(
            frame = snapshot.nb_frames_parsed,
            power = ?snapshot.withdrawn_power(),
            "TIC frame decoded"
        );

        // send_replace publishes even when every receiver is gone; the
        // reader keeps decoding so late subscribers see fresh state
        self.tx.send_replace(snapshot);
    }
}

impl TicReader<TcpStream> {
    /// Connect to a ser2net-style TCP bridge exposing a meter's TIC
    /// output.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        config: ReaderConfig,
    ) -> Result<(Self, watch::Receiver<TicContext>), ReaderError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream, config))
    }
}
