//! Core constants for TIC (Télé-Information Client) decoding.
//!
//! This module defines the protocol-level constants used throughout the
//! workspace. Byte values come from the Enedis customer tele-information
//! specification (the interface every French residential meter exposes on
//! its I1/I2 terminals); they are identical for Linky meters and their
//! electromechanical ancestors.
//!
//! # Frame structure
//!
//! The meter repeats frames continuously:
//!
//! ```text
//! <STX> <dataset> <dataset> ... <dataset> <ETX>
//! 0x02                                    0x03
//! ```
//!
//! Each dataset is itself delimited:
//!
//! ```text
//! <LF> LABEL <sep> [HORODATE <sep>] VALUE <sep> CHECKSUM <CR>
//! 0x0A                                          0x0D
//! ```
//!
//! # Mode differences
//!
//! | | Historical | Standard |
//! |---|---|---|
//! | Field separator | SP (0x20) | HT (0x09) |
//! | Checksum scope | label through value | label through last separator |
//! | Horodate field | never | on some labels |
//! | Line rate | 1200 baud | 9600 baud |
//!
//! Both modes run 7 data bits, even parity, 1 stop bit.

// ============================================================================
// Frame delimiters
// ============================================================================

/// Start of a TIC frame (ASCII STX).
pub const FRAME_START_BYTE: u8 = 0x02;

/// End of a TIC frame (ASCII ETX).
pub const FRAME_END_BYTE: u8 = 0x03;

/// Transmission interrupt marker (ASCII EOT).
///
/// The meter emits EOT when it has to break off mid-frame. Everything
/// received for the current frame must be discarded.
pub const FRAME_INTERRUPT_BYTE: u8 = 0x04;

// ============================================================================
// Dataset delimiters
// ============================================================================

/// Start of a dataset record inside a frame (ASCII LF).
pub const DATASET_START_BYTE: u8 = 0x0A;

/// End of a dataset record (ASCII CR).
pub const DATASET_END_BYTE: u8 = 0x0D;

/// Field separator in historical mode (ASCII space).
pub const SEPARATOR_HISTORICAL: u8 = 0x20;

/// Field separator in standard mode (ASCII horizontal tab).
///
/// The presence of this byte inside the first complete record of a session
/// is what distinguishes a standard-mode meter from a historical-mode one.
pub const SEPARATOR_STANDARD: u8 = 0x09;

// ============================================================================
// Checksum
// ============================================================================

/// Mask applied to the byte sum before offsetting.
///
/// The TIC checksum keeps only the low 6 bits of the sum so that the
/// resulting byte always lands in the printable ASCII range:
///
/// ```
/// use linky_core::constants::{CHECKSUM_MASK, CHECKSUM_OFFSET};
///
/// let sum: u32 = 0x1_5F3;
/// let checksum = (sum & CHECKSUM_MASK as u32) as u8 + CHECKSUM_OFFSET;
/// assert!((0x20..=0x5F).contains(&checksum));
/// ```
pub const CHECKSUM_MASK: u8 = 0x3F;

/// Offset added after masking, mapping the checksum into printable ASCII.
pub const CHECKSUM_OFFSET: u8 = 0x20;

// ============================================================================
// Size bounds
// ============================================================================

/// Maximum accumulated size of a single dataset record, in bytes.
///
/// The longest legitimate standard-mode record (8-char label, 13-char
/// horodate, up to 98-char value, separators and checksum) stays under
/// 123 bytes. Anything longer means the stream lost its CR and the
/// accumulation must be abandoned rather than grow without bound.
pub const MAX_DATASET_SIZE: usize = 128;

// ============================================================================
// Measurement sentinels
// ============================================================================

/// Sentinel stored in the context while no power value has been decoded yet.
///
/// ```
/// use linky_core::constants::UNKNOWN_POWER;
/// use linky_core::TicContext;
///
/// let ctx = TicContext::default();
/// assert_eq!(ctx.last_valid_withdrawn_power, UNKNOWN_POWER);
/// assert_eq!(ctx.withdrawn_power(), None);
/// ```
pub const UNKNOWN_POWER: i32 = i32::MIN;

// ============================================================================
// Recognized dataset labels
// ============================================================================

/// Apparent power currently withdrawn, historical mode (volt-amperes).
pub const LABEL_APPARENT_POWER_HISTORICAL: &[u8] = b"PAPP";

/// Apparent power currently withdrawn, standard mode (volt-amperes).
pub const LABEL_APPARENT_POWER_STANDARD: &[u8] = b"SINSTS";

/// Apparent power currently injected, standard mode (producers only).
pub const LABEL_INJECTED_POWER_STANDARD: &[u8] = b"SINSTI";

/// Meter address, historical mode (12 digits).
pub const LABEL_METER_ADDRESS_HISTORICAL: &[u8] = b"ADCO";

/// Meter address, standard mode.
pub const LABEL_METER_ADDRESS_STANDARD: &[u8] = b"ADSC";

/// Current tariff period, historical mode.
pub const LABEL_TARIFF_PERIOD_HISTORICAL: &[u8] = b"PTEC";

/// Current tariff period, standard mode.
pub const LABEL_TARIFF_PERIOD_STANDARD: &[u8] = b"LTARF";

// ============================================================================
// Serial line settings
// ============================================================================

/// Line rate of a historical-mode meter, in baud.
pub const BAUD_HISTORICAL: u32 = 1200;

/// Line rate of a standard-mode meter, in baud.
pub const BAUD_STANDARD: u32 = 9600;
