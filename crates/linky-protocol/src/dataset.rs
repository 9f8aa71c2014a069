//! Dataset records and their structured view.
//!
//! A [`RawDataset`] is one record as delimited on the wire (label through
//! checksum byte, LF/CR boundaries stripped) together with the outcome of
//! its checksum validation. Invalid records are still surfaced so the
//! aggregator can account for them; their value must never be applied.
//!
//! [`Dataset`] is a borrowed split of the raw bytes according to the
//! active [`TicMode`] — no copy is made. Recognized labels map to a
//! [`Quantity`]; anything else is ignored by design, which keeps the
//! decoder forward compatible with meter firmware adding new fields.

use bytes::Bytes;
use linky_core::constants::{
    LABEL_APPARENT_POWER_HISTORICAL, LABEL_APPARENT_POWER_STANDARD,
    LABEL_INJECTED_POWER_STANDARD, LABEL_METER_ADDRESS_HISTORICAL, LABEL_METER_ADDRESS_STANDARD,
    LABEL_TARIFF_PERIOD_HISTORICAL, LABEL_TARIFF_PERIOD_STANDARD,
};
use linky_core::{Error, Result};
use std::fmt;

use crate::mode::TicMode;

/// One dataset record as received, plus its validation outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDataset {
    data: Bytes,
    valid: bool,
}

impl RawDataset {
    pub(crate) fn new(data: Bytes, valid: bool) -> Self {
        RawDataset { data, valid }
    }

    /// Raw record bytes: label through checksum, boundary bytes stripped.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Record length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the record's checksum validated on extraction.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Split into a structured view per the active mode.
    ///
    /// # Errors
    /// Returns [`Error::MalformedDataset`] if the record does not have the
    /// mode's field layout.
    pub fn split(&self, mode: TicMode) -> Result<Dataset<'_>> {
        Dataset::split(&self.data, mode)
    }
}

impl fmt::Display for RawDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dataset[len={}, valid={}, data='{}']",
            self.data.len(),
            self.valid,
            String::from_utf8_lossy(&self.data),
        )
    }
}

/// Meter quantity identified by a recognized dataset label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// Apparent power withdrawn from the grid (`PAPP` / `SINSTS`), in VA.
    ApparentPower,

    /// Apparent power injected into the grid (`SINSTI`), in VA.
    InjectedPower,

    /// Meter address / serial (`ADCO` / `ADSC`).
    MeterAddress,

    /// Current tariff period (`PTEC` / `LTARF`).
    TariffPeriod,
}

/// Borrowed structured view over a raw dataset record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dataset<'a> {
    label: &'a [u8],
    horodate: Option<&'a [u8]>,
    value: &'a [u8],
    checksum: u8,
}

impl<'a> Dataset<'a> {
    /// Split a complete record (boundary bytes stripped) per `mode`.
    ///
    /// Historical layout: `label SP value SP checksum` — the label runs to
    /// the first separator, the value is everything after it.
    ///
    /// Standard layout: `label HT [horodate HT] value HT checksum` — two
    /// separated fields are label and value, three are label, horodate and
    /// value.
    ///
    /// # Errors
    /// Returns [`Error::MalformedDataset`] when the layout does not match.
    pub fn split(record: &'a [u8], mode: TicMode) -> Result<Self> {
        let separator = mode.separator();

        if record.len() < 3 || record[record.len() - 2] != separator {
            return Err(Error::MalformedDataset(format!(
                "record of {} bytes lacks a '{}'-separated checksum field",
                record.len(),
                separator.escape_ascii(),
            )));
        }

        let checksum = record[record.len() - 1];
        let fields = &record[..record.len() - 2];

        match mode {
            TicMode::Historical => {
                let sep_pos = fields
                    .iter()
                    .position(|&b| b == separator)
                    .ok_or_else(|| {
                        Error::MalformedDataset("no separator between label and value".into())
                    })?;

                Ok(Dataset {
                    label: &fields[..sep_pos],
                    horodate: None,
                    value: &fields[sep_pos + 1..],
                    checksum,
                })
            }
            TicMode::Standard => {
                let mut parts = fields.split(|&b| b == separator);
                let label = parts.next().unwrap_or_default();
                let (horodate, value) = match (parts.next(), parts.next(), parts.next()) {
                    (Some(value), None, _) => (None, value),
                    (Some(horodate), Some(value), None) => (Some(horodate), value),
                    _ => {
                        return Err(Error::MalformedDataset(
                            "expected two or three tab-separated fields".into(),
                        ));
                    }
                };

                if label.is_empty() {
                    return Err(Error::MalformedDataset("empty label".into()));
                }

                Ok(Dataset {
                    label,
                    horodate,
                    value,
                    checksum,
                })
            }
        }
    }

    #[must_use]
    pub fn label(&self) -> &'a [u8] {
        self.label
    }

    /// Label as UTF-8, if it is (TIC labels are plain ASCII).
    #[must_use]
    pub fn label_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.label).ok()
    }

    /// The timestamp field standard-mode records may carry. Carried
    /// through verbatim, never interpreted.
    #[must_use]
    pub fn horodate(&self) -> Option<&'a [u8]> {
        self.horodate
    }

    #[must_use]
    pub fn value(&self) -> &'a [u8] {
        self.value
    }

    #[must_use]
    pub fn value_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.value).ok()
    }

    /// Trailing checksum byte as received.
    #[must_use]
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Parse the value as a decimal integer (optional leading sign,
    /// leading zeros allowed — meters zero-pad numeric fields).
    ///
    /// # Errors
    /// Returns [`Error::InvalidValue`] for anything that is not a
    /// well-formed integer.
    pub fn value_as_i32(&self) -> Result<i32> {
        self.value_str()
            .and_then(|s| s.parse::<i32>().ok())
            .ok_or_else(|| Error::InvalidValue {
                label: String::from_utf8_lossy(self.label).into_owned(),
                value: String::from_utf8_lossy(self.value).into_owned(),
            })
    }

    /// Look the label up in the fixed table of recognized quantities.
    #[must_use]
    pub fn quantity(&self) -> Option<Quantity> {
        match self.label {
            l if l == LABEL_APPARENT_POWER_HISTORICAL || l == LABEL_APPARENT_POWER_STANDARD => {
                Some(Quantity::ApparentPower)
            }
            l if l == LABEL_INJECTED_POWER_STANDARD => Some(Quantity::InjectedPower),
            l if l == LABEL_METER_ADDRESS_HISTORICAL || l == LABEL_METER_ADDRESS_STANDARD => {
                Some(Quantity::MeterAddress)
            }
            l if l == LABEL_TARIFF_PERIOD_HISTORICAL || l == LABEL_TARIFF_PERIOD_STANDARD => {
                Some(Quantity::TariffPeriod)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;
    use rstest::rstest;

    fn historical(label: &str, value: &str) -> Vec<u8> {
        let mut record = format!("{label} {value}").into_bytes();
        let ck = checksum::compute(&record);
        record.push(b' ');
        record.push(ck);
        record
    }

    fn standard(label: &str, horodate: Option<&str>, value: &str) -> Vec<u8> {
        let mut record = match horodate {
            Some(h) => format!("{label}\t{h}\t{value}\t"),
            None => format!("{label}\t{value}\t"),
        }
        .into_bytes();
        let ck = checksum::compute(&record);
        record.push(ck);
        record
    }

    #[test]
    fn test_split_historical() {
        let record = historical("PAPP", "01230");
        let ds = Dataset::split(&record, TicMode::Historical).unwrap();

        assert_eq!(ds.label(), b"PAPP");
        assert_eq!(ds.value(), b"01230");
        assert_eq!(ds.horodate(), None);
        assert_eq!(ds.checksum(), checksum::compute(b"PAPP 01230"));
    }

    #[test]
    fn test_split_standard_without_horodate() {
        let record = standard("SINSTS", None, "00750");
        let ds = Dataset::split(&record, TicMode::Standard).unwrap();

        assert_eq!(ds.label(), b"SINSTS");
        assert_eq!(ds.value(), b"00750");
        assert_eq!(ds.horodate(), None);
    }

    #[test]
    fn test_split_standard_with_horodate() {
        let record = standard("SMAXSN", Some("H240812150000"), "02250");
        let ds = Dataset::split(&record, TicMode::Standard).unwrap();

        assert_eq!(ds.label(), b"SMAXSN");
        assert_eq!(ds.horodate(), Some(b"H240812150000".as_slice()));
        assert_eq!(ds.value(), b"02250");
    }

    #[test]
    fn test_split_standard_empty_value() {
        // Records like DATE carry a horodate and an empty value
        let record = standard("DATE", Some("H240812150000"), "");
        let ds = Dataset::split(&record, TicMode::Standard).unwrap();

        assert_eq!(ds.value(), b"");
        assert!(ds.value_as_i32().is_err());
    }

    #[test]
    fn test_split_rejects_malformed() {
        assert!(Dataset::split(b"PAPP01230X", TicMode::Historical).is_err());
        assert!(Dataset::split(b"", TicMode::Historical).is_err());
        assert!(Dataset::split(b"A\tB\tC\tD\tE\tF", TicMode::Standard).is_err());
    }

    #[rstest]
    #[case::zero_padded("01230", 1230)]
    #[case::plain("750", 750)]
    #[case::zero("00000", 0)]
    #[case::negative("-120", -120)]
    fn test_value_as_i32(#[case] value: &str, #[case] expected: i32) {
        let record = historical("PAPP", value);
        let ds = Dataset::split(&record, TicMode::Historical).unwrap();

        assert_eq!(ds.value_as_i32().unwrap(), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::letters("12AB")]
    #[case::spaces("1 2")]
    #[case::overflow("99999999999")]
    fn test_value_as_i32_rejects(#[case] value: &str) {
        let record = historical("PAPP", value);
        // "1 2" moves the separator; split at the first space instead
        if let Ok(ds) = Dataset::split(&record, TicMode::Historical) {
            assert!(ds.value_as_i32().is_err());
        }
    }

    #[rstest]
    #[case::papp(b"PAPP".as_slice(), Some(Quantity::ApparentPower))]
    #[case::sinsts(b"SINSTS".as_slice(), Some(Quantity::ApparentPower))]
    #[case::sinsti(b"SINSTI".as_slice(), Some(Quantity::InjectedPower))]
    #[case::adco(b"ADCO".as_slice(), Some(Quantity::MeterAddress))]
    #[case::adsc(b"ADSC".as_slice(), Some(Quantity::MeterAddress))]
    #[case::ptec(b"PTEC".as_slice(), Some(Quantity::TariffPeriod))]
    #[case::ltarf(b"LTARF".as_slice(), Some(Quantity::TariffPeriod))]
    #[case::unknown(b"MOTDETAT".as_slice(), None)]
    fn test_quantity_table(#[case] label: &[u8], #[case] expected: Option<Quantity>) {
        let ds = Dataset {
            label,
            horodate: None,
            value: b"0",
            checksum: b' ',
        };

        assert_eq!(ds.quantity(), expected);
    }

    #[test]
    fn test_raw_dataset_display() {
        let raw = RawDataset::new(Bytes::from_static(b"PAPP 01230 '"), true);
        let display = format!("{raw}");

        assert!(display.contains("len=12"));
        assert!(display.contains("valid=true"));
        assert!(display.contains("PAPP 01230"));
    }
}
