//! Payment stream registry.
//!
//! Holds the current record for each (stream, subscriber) pair. A pair that
//! closes and opens again keeps its id: the closed term is archived and the
//! current record carries its checkpoint and paid total forward.

use crate::amount::Amount;
use crate::catalog::Stream;
use crate::error::{LedgerError, LedgerResult};
use crate::rate::validate_rate;
use crate::types::{Height, PaymentStreamId, Principal, StreamId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Active,
    /// Terminal. No further settlement.
    Closed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Active => f.write_str("active"),
            PaymentStatus::Closed => f.write_str("closed"),
        }
    }
}

/// A subscriber's rate agreement with one stream.
///
/// # Invariants
///
/// - `rate` is positive and meets the stream's minimum at open time
/// - `checkpoint` never moves backward, including across a reopen
/// - `total_paid` never decreases; it is cumulative over every term of the pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentStream {
    pub id: PaymentStreamId,

    /// Owner of the stream, credited on settlement.
    pub provider: Principal,

    /// Amount owed per block.
    pub rate: Amount,

    pub status: PaymentStatus,

    /// Height up to which the stream has been settled.
    pub checkpoint: Height,

    pub total_paid: Amount,

    /// Height at which the current term was opened.
    pub opened_at: Height,
}

impl PaymentStream {
    pub fn is_active(&self) -> bool {
        self.status == PaymentStatus::Active
    }
}

#[derive(Debug, Default, Clone)]
pub struct PaymentStreamRegistry {
    records: BTreeMap<PaymentStreamId, PaymentStream>,
    archive: BTreeMap<PaymentStreamId, Vec<PaymentStream>>,
}

impl PaymentStreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a payment stream from `subscriber` to `stream` at `rate`.
    ///
    /// The checkpoint starts at `now`, so nothing accrues for earlier blocks.
    /// Reopening a closed pair archives the closed term and fails with
    /// `ClockRegression` if `now` is before its checkpoint.
    pub fn open(
        &mut self,
        stream: &Stream,
        subscriber: &Principal,
        rate: Amount,
        now: Height,
    ) -> LedgerResult<PaymentStreamId> {
        validate_rate(stream, rate)?;

        let id = PaymentStreamId::new(stream.id, subscriber.clone());
        let mut total_paid = Amount::ZERO;
        if let Some(previous) = self.records.get(&id) {
            if previous.is_active() {
                return Err(LedgerError::AlreadySubscribed(id));
            }
            if now < previous.checkpoint {
                return Err(LedgerError::ClockRegression {
                    checkpoint: previous.checkpoint,
                    now,
                });
            }
            total_paid = previous.total_paid;
        }

        let record = PaymentStream {
            id: id.clone(),
            provider: stream.provider.clone(),
            rate,
            status: PaymentStatus::Active,
            checkpoint: now,
            total_paid,
            opened_at: now,
        };
        if let Some(closed) = self.records.insert(id.clone(), record) {
            self.archive.entry(id.clone()).or_default().push(closed);
        }
        Ok(id)
    }

    pub fn get(&self, id: &PaymentStreamId) -> LedgerResult<&PaymentStream> {
        self.records
            .get(id)
            .ok_or_else(|| LedgerError::PaymentStreamNotFound(id.clone()))
    }

    /// Earlier closed terms of a pair, oldest first.
    pub fn closed_terms(&self, id: &PaymentStreamId) -> &[PaymentStream] {
        self.archive.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaymentStream> {
        self.records.values()
    }

    pub fn active_count(&self, stream: StreamId) -> usize {
        self.records
            .values()
            .filter(|r| r.id.stream == stream && r.is_active())
            .count()
    }

    /// Moves the checkpoint to `now` and adds `amount` to the paid total.
    ///
    /// Settlement validates the record, the clock and the arithmetic first.
    pub(crate) fn advance(&mut self, id: &PaymentStreamId, now: Height, amount: Amount) {
        if let Some(record) = self.records.get_mut(id) {
            debug_assert!(now >= record.checkpoint);
            record.checkpoint = now;
            match record.total_paid.checked_add(amount) {
                Some(total) => record.total_paid = total,
                None => debug_assert!(false, "paid total overflow on {}", id),
            }
        }
    }

    pub(crate) fn close(&mut self, id: &PaymentStreamId) {
        if let Some(record) = self.records.get_mut(id) {
            record.status = PaymentStatus::Closed;
        }
    }
}
