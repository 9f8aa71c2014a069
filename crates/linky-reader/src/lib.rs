//! Transport plumbing for TIC decoding.
//!
//! This crate feeds the `linky-protocol` pipeline from real byte sources
//! and publishes the resulting measurement snapshots to consumers:
//!
//! - **TicReader**: drives any `AsyncRead` (a TCP connection to a
//!   ser2net-style bridge, a test duplex, ...) through the TIC codec and
//!   broadcasts one [`TicContext`](linky_core::TicContext) snapshot per
//!   decoded frame on a `tokio::sync::watch` channel.
//! - **Serial source**: opens a local serial port with the TIC line
//!   settings (7 data bits, even parity, one stop bit, baud rate per
//!   mode) and pumps it into the async reader.
//!
//! # Example
//!
//! ```no_run
//! use linky_reader::{ReaderConfig, TicReader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (reader, mut updates) =
//!     TicReader::connect("192.168.1.17:2000", ReaderConfig::default()).await?;
//!
//! tokio::spawn(reader.run());
//!
//! while updates.changed().await.is_ok() {
//!     let ctx = *updates.borrow();
//!     println!("power: {:?} VA, frames: {}", ctx.withdrawn_power(), ctx.nb_frames_parsed);
//! }
//! # Ok(())
//! # }
//! ```

mod reader;
mod serial;

pub use reader::{ReaderConfig, ReaderError, TicReader};
pub use serial::{SerialStream, open_serial};
