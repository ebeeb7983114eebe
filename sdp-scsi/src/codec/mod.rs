//! Byte-exact layouts of the SCSI structures this crate speaks.
//!
//! Every multi-byte field on the wire is big-endian. Decoding never hands out a partially
//! filled structure: it either returns the whole value or a [`DecodeError`].

use thiserror::Error;

pub mod capacity;
pub mod cdb;
pub mod inquiry;
pub mod mode;

pub use capacity::{ReadCapacity10, ReadCapacity16};
pub use cdb::{CommandLength, PageControl, StartStopUnit};
pub use inquiry::{BlockDeviceCharacteristics, SerialNumberPage, StandardInquiry};
pub use mode::{ModeHeader, PowerConditionData, PowerConditionPage};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{what} needs {need} bytes, got {got}")]
    Truncated {
        what: &'static str,
        need: usize,
        got: usize,
    },
    #[error("{what}: expected page code {expected:#04x}, got {got:#04x}")]
    UnexpectedPage {
        what: &'static str,
        expected: u8,
        got: u8,
    },
    #[error("{what}: page length {got} is shorter than {min}")]
    ShortPage {
        what: &'static str,
        min: usize,
        got: usize,
    },
}

pub(crate) fn ensure_len(what: &'static str, buf: &[u8], need: usize) -> Result<(), DecodeError> {
    if buf.len() < need {
        Err(DecodeError::Truncated {
            what,
            need,
            got: buf.len(),
        })
    } else {
        Ok(())
    }
}

pub(crate) const fn be_u16(buf: &[u8], off: usize) -> u16 {
    u16::from_be_bytes([buf[off], buf[off + 1]])
}

pub(crate) const fn be_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

pub(crate) const fn be_u64(buf: &[u8], off: usize) -> u64 {
    u64::from_be_bytes([
        buf[off],
        buf[off + 1],
        buf[off + 2],
        buf[off + 3],
        buf[off + 4],
        buf[off + 5],
        buf[off + 6],
        buf[off + 7],
    ])
}

pub(crate) fn put_be_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_be_bytes());
}

pub(crate) fn put_be_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_be_bytes());
}

pub(crate) fn put_be_u64(buf: &mut [u8], off: usize, v: u64) {
    buf[off..off + 8].copy_from_slice(&v.to_be_bytes());
}

/// Length of `raw` once trailing ASCII spaces and NULs are dropped.
pub fn trimmed_len(raw: &[u8]) -> usize {
    raw.iter()
        .rposition(|&c| c != b' ' && c != 0)
        .map_or(0, |i| i + 1)
}

/// Fixed-width identification text to a `String`. Only the tail is trimmed.
pub fn normalize_text(raw: &[u8]) -> String {
    raw[..trimmed_len(raw)].iter().map(|&b| char::from(b)).collect()
}
