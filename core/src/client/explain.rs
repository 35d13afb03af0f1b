use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Matches planner lines such as `Granules: 123/456`.
    static ref GRANULES_RE: Regex = Regex::new(r"Granules:\s*(\d+)/(\d+)").unwrap();
}

/// Smallest scanned-granule count (the first number of each `X/Y` pair)
/// found in EXPLAIN output, or 0 when there is none.
pub fn extract_granules(explain_text: &str) -> u64 {
    GRANULES_RE
        .captures_iter(explain_text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
        .min()
        .unwrap_or(0)
}

/// True if the plan mentions a projection (case-insensitive).
pub fn projection_used(explain_text: &str) -> bool {
    explain_text.to_lowercase().contains("projection")
}
