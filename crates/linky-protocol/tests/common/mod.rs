//! Common test utilities for integration tests.
//!
//! Builders for well-formed (and deliberately corrupted) TIC wire data:
//!
//! 1. **Record helpers** (`historical_record`, `standard_record`) — one
//!    dataset with a correct checksum for the mode.
//! 2. **Frame helpers** (`frame`, `historical_frame`) — records wrapped in
//!    LF/CR boundaries between STX and ETX.
//! 3. **Corruption helpers** (`corrupt_checksum`) — targeted damage for
//!    negative tests.
//!
//! Not every test file uses every helper.
#![allow(dead_code)]

use linky_protocol::checksum;

pub const STX: u8 = 0x02;
pub const ETX: u8 = 0x03;
pub const EOT: u8 = 0x04;
pub const LF: u8 = 0x0A;
pub const CR: u8 = 0x0D;

/// Historical-mode record (`label SP value SP checksum`) with a correct
/// checksum, boundary bytes not included.
pub fn historical_record(label: &str, value: &str) -> Vec<u8> {
    let mut record = format!("{label} {value}").into_bytes();
    let ck = checksum::compute(&record);
    record.push(b' ');
    record.push(ck);
    record
}

/// Standard-mode record (`label HT [horodate HT] value HT checksum`) with
/// a correct checksum, boundary bytes not included.
pub fn standard_record(label: &str, horodate: Option<&str>, value: &str) -> Vec<u8> {
    let mut record = match horodate {
        Some(h) => format!("{label}\t{h}\t{value}\t"),
        None => format!("{label}\t{value}\t"),
    }
    .into_bytes();
    let ck = checksum::compute(&record);
    record.push(ck);
    record
}

/// Flip the trailing checksum byte of a record.
pub fn corrupt_checksum(record: &mut [u8]) {
    let last = record.len() - 1;
    record[last] = record[last].wrapping_add(1);
}

/// Wrap records in dataset boundaries inside an STX/ETX frame.
pub fn frame(records: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = vec![STX];
    for record in records {
        bytes.push(LF);
        bytes.extend_from_slice(record);
        bytes.push(CR);
    }
    bytes.push(ETX);
    bytes
}

/// Complete historical-mode frame from label/value pairs.
pub fn historical_frame(pairs: &[(&str, &str)]) -> Vec<u8> {
    let records: Vec<Vec<u8>> = pairs
        .iter()
        .map(|(label, value)| historical_record(label, value))
        .collect();
    frame(&records)
}
