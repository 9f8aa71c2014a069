//! Protocol mode variants.
//!
//! French meters speak one of two TIC flavours. The frame and dataset
//! delimiters are identical; what differs is the field separator, the
//! checksum scope and the line rate:
//!
//! - **Historical** — the legacy format emitted by electromechanical and
//!   first-generation electronic meters (and by Linky meters configured
//!   for compatibility). Fields are separated by a space; the checksum
//!   covers label, separator and value but *not* the separator preceding
//!   the checksum byte. 1200 baud.
//! - **Standard** — the Linky-native format. Fields are separated by a
//!   horizontal tab, some records carry a timestamp (*horodate*) between
//!   label and value, and the checksum covers everything up to and
//!   *including* the separator preceding the checksum byte. 9600 baud.
//!
//! A mode is selected once per session: either configured explicitly, or
//! auto-detected from the first complete record (standard mode is the only
//! one that puts a tab inside a record).

use linky_core::constants::{
    BAUD_HISTORICAL, BAUD_STANDARD, SEPARATOR_HISTORICAL, SEPARATOR_STANDARD,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::checksum;

/// On-wire TIC dataset format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicMode {
    /// Legacy space-separated format, 1200 baud.
    Historical,

    /// Linky tab-separated format with optional horodate, 9600 baud.
    Standard,
}

impl TicMode {
    /// Field separator byte for this mode.
    #[must_use]
    pub fn separator(self) -> u8 {
        match self {
            TicMode::Historical => SEPARATOR_HISTORICAL,
            TicMode::Standard => SEPARATOR_STANDARD,
        }
    }

    /// Serial line rate for this mode, in baud.
    #[must_use]
    pub fn baud_rate(self) -> u32 {
        match self {
            TicMode::Historical => BAUD_HISTORICAL,
            TicMode::Standard => BAUD_STANDARD,
        }
    }

    /// Detect the mode from a complete record (boundary bytes stripped).
    ///
    /// Only standard-mode records contain the tab separator, so its
    /// presence anywhere in the record is decisive.
    ///
    /// # Example
    ///
    /// ```
    /// use linky_protocol::TicMode;
    ///
    /// assert_eq!(TicMode::detect(b"PAPP 01230 '"), TicMode::Historical);
    /// assert_eq!(TicMode::detect(b"SINSTS\t01230\tK"), TicMode::Standard);
    /// ```
    #[must_use]
    pub fn detect(record: &[u8]) -> TicMode {
        if record.contains(&SEPARATOR_STANDARD) {
            TicMode::Standard
        } else {
            TicMode::Historical
        }
    }

    /// The byte range covered by the checksum of `record`, or `None` if the
    /// record is too short (or, in historical mode, lacks the separator
    /// that must precede the checksum byte).
    ///
    /// `record` is a complete dataset with LF/CR boundary bytes stripped;
    /// its last byte is the checksum itself.
    #[must_use]
    pub fn checksum_scope(self, record: &[u8]) -> Option<&[u8]> {
        match self {
            // label SP value SP checksum — scope stops before the last SP
            TicMode::Historical => {
                if record.len() < 4 || record[record.len() - 2] != SEPARATOR_HISTORICAL {
                    return None;
                }
                Some(&record[..record.len() - 2])
            }
            // label HT [horodate HT] value HT checksum — scope includes
            // everything up to the checksum byte
            TicMode::Standard => {
                if record.len() < 3 || record[record.len() - 2] != SEPARATOR_STANDARD {
                    return None;
                }
                Some(&record[..record.len() - 1])
            }
        }
    }

    /// Validate a complete record against its trailing checksum byte.
    #[must_use]
    pub fn verify_record(self, record: &[u8]) -> bool {
        let Some(scope) = self.checksum_scope(record) else {
            return false;
        };
        checksum::verify(scope, record[record.len() - 1])
    }
}

impl fmt::Display for TicMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicMode::Historical => write!(f, "historical"),
            TicMode::Standard => write!(f, "standard"),
        }
    }
}
