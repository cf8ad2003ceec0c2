//! Strictly increasing request nonces.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out Unix-second nonces that never repeat within a process.
///
/// Two calls inside the same wall-clock second get consecutive values, so
/// the exchange never sees a reused nonce from this source.
#[derive(Debug, Default)]
pub struct NonceSource {
    last: AtomicU64,
}

impl NonceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next nonce: the current Unix second, or one past the previous nonce if
    /// the clock has not advanced.
    pub fn next(&self) -> u64 {
        self.next_at(chrono::Utc::now().timestamp().max(0) as u64)
    }

    fn next_at(&self, now: u64) -> u64 {
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self.last.compare_exchange_weak(
                prev,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_follows_wall_clock() {
        let source = NonceSource::new();
        assert_eq!(source.next_at(1_000), 1_000);
        assert_eq!(source.next_at(1_005), 1_005);
    }

    #[test]
    fn test_same_second_is_bumped() {
        let source = NonceSource::new();
        assert_eq!(source.next_at(1_000), 1_000);
        assert_eq!(source.next_at(1_000), 1_001);
        // Clock went backwards.
        assert_eq!(source.next_at(900), 1_002);
    }

    #[test]
    fn test_unique_across_threads() {
        let source = Arc::new(NonceSource::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let source = Arc::clone(&source);
                std::thread::spawn(move || (0..250).map(|_| source.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for nonce in handle.join().unwrap() {
                assert!(seen.insert(nonce), "duplicate nonce {}", nonce);
            }
        }
        assert_eq!(seen.len(), 1_000);
    }
}
