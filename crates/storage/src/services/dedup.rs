use chrono::NaiveDateTime;

/// Default window within which a repeated read is treated as the same punch.
pub const DEFAULT_DEDUP_WINDOW_MS: i64 = 5_000;

/// A punch duplicates an earlier original from the same transponder at the
/// same control when the two lie within `window_ms` of each other, in
/// either direction. The boundary itself counts as a duplicate.
///
/// Only processed originals are passed in as `originals`, so a duplicate
/// never extends the window for later reads.
pub fn is_duplicate(candidate: NaiveDateTime, originals: &[NaiveDateTime], window_ms: i64) -> bool {
    originals
        .iter()
        .any(|original| (candidate - *original).num_milliseconds().abs() <= window_ms)
}
