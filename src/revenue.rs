//! Per-stream revenue totals.
//!
//! Only settlement credits revenue, and only by addition.

use crate::amount::Amount;
use crate::types::StreamId;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct RevenueLedger {
    totals: BTreeMap<StreamId, Amount>,
}

impl RevenueLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative amount settled for `stream`.
    pub fn total(&self, stream: StreamId) -> Amount {
        self.totals.get(&stream).copied().unwrap_or(Amount::ZERO)
    }

    /// Total after crediting `amount`, or `None` if it would overflow.
    pub(crate) fn preview_credit(&self, stream: StreamId, amount: Amount) -> Option<Amount> {
        self.total(stream).checked_add(amount)
    }

    /// Caller must have checked the credit with [`preview_credit`](Self::preview_credit).
    pub(crate) fn credit(&mut self, stream: StreamId, amount: Amount) {
        let total = self.totals.entry(stream).or_default();
        match total.checked_add(amount) {
            Some(sum) => *total = sum,
            None => debug_assert!(false, "revenue overflow on stream {}", stream),
        }
    }
}
