//! Descending candidate heights `L - k*S`, `k = 1, 2, ...`, all positive.

/// Candidate heights below `latest`, spaced by `interval`, at most `max` of them.
pub fn candidate_heights(latest: u64, interval: u64, max: usize) -> Vec<u64> {
    if interval == 0 {
        return Vec::new();
    }
    (1..=max as u64)
        .map_while(|k| k.checked_mul(interval).and_then(|step| latest.checked_sub(step)))
        .take_while(|h| *h > 0)
        .collect()
}
