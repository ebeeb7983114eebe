//! Device name lists and disk number validation.

use crate::{Error, Result};

/// Split a NUL separated, double NUL terminated UTF-16 list.
pub fn split_multi_string(buf: &[u16]) -> Vec<String> {
    buf.split(|&c| c == 0)
        .take_while(|s| !s.is_empty())
        .map(String::from_utf16_lossy)
        .collect()
}

/// Names starting with `prefix`, in list order.
///
/// Counts first so the result is allocated once at its exact size.
pub fn starting_with<'a, S: AsRef<str>>(names: &'a [S], prefix: &str) -> Vec<&'a str> {
    let count = names
        .iter()
        .filter(|n| n.as_ref().starts_with(prefix))
        .count();

    let mut out = Vec::with_capacity(count);
    out.extend(
        names
            .iter()
            .map(AsRef::as_ref)
            .filter(|n| n.starts_with(prefix)),
    );
    out
}

/// Decimal disk number. Anything but ASCII digits, or a value above `u32::MAX`, is rejected.
pub fn parse_disk_id(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    s.bytes().try_fold(0u32, |n, b| {
        if !b.is_ascii_digit() {
            return None;
        }
        n.checked_mul(10)?.checked_add(u32::from(b - b'0'))
    })
}

/// Check `requested` against the disks present.
///
/// An empty request selects every present disk in ascending order.
pub fn validate_disk_ids(requested: &[u32], available: &[u32]) -> Result<Vec<u32>> {
    if available.is_empty() {
        return Err(Error::NoDrive);
    }

    if requested.is_empty() {
        let mut all = available.to_vec();
        all.sort_unstable();
        all.dedup();
        return Ok(all);
    }

    if requested.len() > available.len() {
        return Err(Error::TooManyIds);
    }
    for (i, id) in requested.iter().enumerate() {
        if requested[i + 1..].contains(id) {
            return Err(Error::DuplicateIds);
        }
    }
    if let Some(&id) = requested.iter().find(|id| !available.contains(id)) {
        return Err(Error::NoSuchDrive(id));
    }

    Ok(requested.to_vec())
}
