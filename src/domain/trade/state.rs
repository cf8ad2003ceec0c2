//! Trade state container — bounded, insertion-ordered, shared across threads.

use super::Trade;
use parking_lot::RwLock;
use std::collections::VecDeque;

/// Default number of trades kept per adapter.
pub const DEFAULT_TRADE_CAPACITY: usize = 100;

/// Rolling trade history, oldest first.
///
/// Written only by the adapter's stream dispatch path; read by any number of
/// callers. Reads take a shared lock and never block each other.
#[derive(Debug)]
pub struct TradeBuffer {
    trades: RwLock<VecDeque<Trade>>,
    capacity: usize,
}

impl TradeBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            trades: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Number of oldest entries an append of `incoming` trades must evict.
    pub fn overflow(current: usize, incoming: usize, capacity: usize) -> usize {
        (current + incoming).saturating_sub(capacity).min(current)
    }

    /// Append an oldest-first batch, evicting the oldest entries first.
    ///
    /// A batch longer than the capacity keeps only its newest `capacity`
    /// entries.
    pub(crate) fn append(&self, batch: Vec<Trade>) {
        if batch.is_empty() {
            return;
        }
        let skip = batch.len().saturating_sub(self.capacity);

        let mut trades = self.trades.write();
        let overflow = Self::overflow(trades.len(), batch.len(), self.capacity);
        trades.drain(..overflow);
        trades.extend(batch.into_iter().skip(skip));
    }

    /// Point-in-time copy of the buffer, oldest first.
    pub fn snapshot(&self) -> Vec<Trade> {
        self.trades.read().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<Trade> {
        self.trades.read().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.trades.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TradeBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_TRADE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::TradeAction;
    use chrono::{Local, TimeZone};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn make_trade(id: &str, secs: i64) -> Trade {
        Trade {
            id: id.to_string(),
            create_time: Local.timestamp_opt(secs, 0).single().unwrap(),
            price: Decimal::from(100),
            amount: Decimal::from(1),
            action: TradeAction::OpenLong,
        }
    }

    fn ids(buffer: &TradeBuffer) -> Vec<String> {
        buffer.snapshot().into_iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_append_keeps_order() {
        let buffer = TradeBuffer::new(10);
        buffer.append(vec![make_trade("a", 1), make_trade("b", 2)]);
        buffer.append(vec![make_trade("c", 3)]);
        assert_eq!(ids(&buffer), ["a", "b", "c"]);
        assert_eq!(buffer.latest().unwrap().id, "c");
    }

    #[test]
    fn test_capacity_three_evicts_oldest() {
        let buffer = TradeBuffer::new(3);
        buffer.append(vec![make_trade("A", 1), make_trade("B", 2)]);
        buffer.append(vec![make_trade("C", 3), make_trade("D", 4)]);
        assert_eq!(ids(&buffer), ["B", "C", "D"]);
    }

    #[test]
    fn test_overflow_formula() {
        assert_eq!(TradeBuffer::overflow(0, 2, 3), 0);
        assert_eq!(TradeBuffer::overflow(2, 2, 3), 1);
        assert_eq!(TradeBuffer::overflow(3, 3, 3), 3);
        // Never evicts more than is stored.
        assert_eq!(TradeBuffer::overflow(2, 10, 3), 2);
    }

    #[test]
    fn test_oversized_batch_keeps_newest() {
        let buffer = TradeBuffer::new(2);
        buffer.append(vec![make_trade("x", 0)]);
        buffer.append(vec![make_trade("a", 1), make_trade("b", 2), make_trade("c", 3)]);
        assert_eq!(ids(&buffer), ["b", "c"]);
    }

    #[test]
    fn test_length_bounded_over_many_batches() {
        let buffer = TradeBuffer::new(5);
        let mut total = 0;
        for batch in 0..20i64 {
            let size = (batch % 4 + 1) as usize;
            let trades = (0..size)
                .map(|i| make_trade(&format!("{}-{}", batch, i), batch * 10 + i as i64))
                .collect();
            buffer.append(trades);
            total += size;
            assert!(buffer.len() <= buffer.capacity());
            assert_eq!(buffer.len(), total.min(5));
        }

        let snapshot = buffer.snapshot();
        for pair in snapshot.windows(2) {
            assert!(pair[0].create_time <= pair[1].create_time);
        }
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let buffer = TradeBuffer::new(3);
        buffer.append(vec![make_trade("a", 1)]);
        buffer.append(Vec::new());
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let buffer = Arc::new(TradeBuffer::new(50));
        let writer = {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                for i in 0..200i64 {
                    buffer.append(vec![make_trade(&i.to_string(), i)]);
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let buffer = Arc::clone(&buffer);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        assert!(buffer.snapshot().len() <= 50);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(buffer.len(), 50);
        assert_eq!(buffer.latest().unwrap().id, "199");
    }
}
