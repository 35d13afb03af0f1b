use std::sync::atomic::{AtomicU64, Ordering};

/// Shared source of cache-busting offsets. Values start at 1 and are never
/// handed out twice.
#[derive(Debug)]
pub struct OffsetCounter {
    next: AtomicU64,
}

impl OffsetCounter {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Draws the next offset, or `None` once the counter is exhausted.
    /// Exhaustion is sticky: the counter never wraps.
    pub fn next(&self) -> Option<u64> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_add(1))
            .ok()
    }
}

impl Default for OffsetCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_starts_at_one() {
        let counter = OffsetCounter::new();
        assert_eq!(counter.next(), Some(1));
        assert_eq!(counter.next(), Some(2));
        assert_eq!(counter.next(), Some(3));
    }

    #[test]
    fn test_exhaustion_stops_instead_of_wrapping() {
        let counter = OffsetCounter::starting_at(u64::MAX - 2);
        assert_eq!(counter.next(), Some(u64::MAX - 2));
        assert_eq!(counter.next(), Some(u64::MAX - 1));
        assert_eq!(counter.next(), None);
        assert_eq!(counter.next(), None);
    }

    #[test]
    fn test_unique_across_threads() {
        let counter = Arc::new(OffsetCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || (0..1000).filter_map(|_| counter.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for v in h.join().unwrap() {
                assert!(seen.insert(v), "offset {v} handed out twice");
            }
        }
        assert_eq!(seen.len(), 8000);
        assert_eq!(seen.iter().min(), Some(&1));
        assert_eq!(seen.iter().max(), Some(&8000));
    }
}
