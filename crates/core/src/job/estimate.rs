//! Time estimates.

use chrono::{DateTime, Utc};

use crate::format::FormatCategory;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Initial estimate from input size and category, in milliseconds.
///
/// PDF on either side costs 1.5x.
pub fn initial_estimate_ms(
    size_bytes: u64,
    category: FormatCategory,
    input_format: &str,
    output_format: &str,
) -> u64 {
    let mut per_mib = category.estimate_ms_per_mib();
    if input_format == "pdf" || output_format == "pdf" {
        per_mib *= 1.5;
    }
    (size_bytes as f64 / BYTES_PER_MIB * per_mib).ceil() as u64
}

/// Remaining time from elapsed time per percent.
///
/// `None` until some progress exists.
pub fn remaining_ms(started_at: DateTime<Utc>, now: DateTime<Utc>, progress: u8) -> Option<u64> {
    if progress == 0 {
        return None;
    }
    if progress >= 100 {
        return Some(0);
    }
    let elapsed = (now - started_at).num_milliseconds().max(0) as f64;
    let per_percent = elapsed / f64::from(progress);
    Some((per_percent * f64::from(100 - progress)).round() as u64)
}
