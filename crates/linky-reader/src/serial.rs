//! Local serial-port source for the TIC line.
//!
//! The meter's customer tele-information output is a current-loop serial
//! line, usually brought to the host through an opto-isolated adapter
//! that enumerates as a plain serial port. Line settings are fixed by the
//! protocol: 7 data bits, even parity, one stop bit, at 1200 baud
//! (historical) or 9600 baud (standard).
//!
//! `serialport` reads are blocking, so the port is pumped on a dedicated
//! thread into an async byte stream the [`TicReader`] can drive.

use bytes::Bytes;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use linky_core::TicContext;
use linky_protocol::TicMode;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::io::Read;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use crate::reader::{ReaderConfig, ReaderError, TicReader};

/// Async byte stream pumped from a blocking serial port.
pub type SerialStream = StreamReader<UnboundedReceiver<std::io::Result<Bytes>>, Bytes>;

/// Poll interval for the blocking read loop. The TIC line idles between
/// frames, so timeouts are routine, not errors.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Read buffer for the pump thread. A full historical frame is ~200
/// bytes; one buffer comfortably holds anything a single poll returns.
const READ_BUFFER_SIZE: usize = 512;

/// Open `path` with the TIC line settings for `mode` and pump it into an
/// async byte stream.
///
/// # Errors
/// Returns [`ReaderError::Serial`] if the port cannot be opened or
/// configured, and [`ReaderError::Io`] if the pump thread cannot be
/// spawned.
pub fn open_serial(path: &str, mode: TicMode) -> Result<SerialStream, ReaderError> {
    let port = serialport::new(path, mode.baud_rate())
        .data_bits(DataBits::Seven)
        .parity(Parity::Even)
        .stop_bits(StopBits::One)
        .timeout(READ_TIMEOUT)
        .open()?;

    debug!(path, baud = mode.baud_rate(), "serial port opened");

    let (tx, rx) = mpsc::unbounded();
    std::thread::Builder::new()
        .name("tic-serial-pump".into())
        .spawn(move || pump(port, tx))?;

    Ok(StreamReader::new(rx))
}

impl TicReader<SerialStream> {
    /// Open a local serial port and build a reader over it.
    ///
    /// The line settings follow `mode`, which is also forced on the
    /// decoder — a port opened at the historical baud rate cannot carry a
    /// standard-mode stream, so there is nothing left to auto-detect.
    ///
    /// # Errors
    /// Returns an error if the port cannot be opened.
    pub fn open_serial(
        path: &str,
        mode: TicMode,
        config: ReaderConfig,
    ) -> Result<(Self, watch::Receiver<TicContext>), ReaderError> {
        let stream = open_serial(path, mode)?;
        let config = ReaderConfig {
            mode: Some(mode),
            ..config
        };
        Ok(Self::new(stream, config))
    }
}

/// Blocking read loop feeding the async side. Ends on port error, end of
/// stream, or when every receiver is gone.
fn pump(mut port: Box<dyn SerialPort>, tx: UnboundedSender<std::io::Result<Bytes>>) {
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        match port.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx
                    .unbounded_send(Ok(Bytes::copy_from_slice(&buf[..n])))
                    .is_err()
                {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => {
                warn!(error = %e, "serial read failed");
                let _ = tx.unbounded_send(Err(e));
                break;
            }
        }
    }
}
