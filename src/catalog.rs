//! Stream catalog: descriptive metadata, published payloads and plain
//! subscriptions.
//!
//! Payloads are opaque; the catalog stores them without inspection.

use crate::amount::Amount;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{Height, Principal, StreamId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Provider-supplied description of a new stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub base_price: Amount,
    /// Minimum per-block payment rate. `None` means any positive rate.
    pub min_rate: Option<Amount>,
}

/// A catalog entry. Immutable after creation; revenue lives in
/// [`RevenueLedger`](crate::revenue::RevenueLedger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stream {
    pub id: StreamId,
    pub provider: Principal,
    pub title: String,
    pub description: String,
    pub category: String,
    pub base_price: Amount,
    pub min_rate: Option<Amount>,
    pub created_at: Height,
}

/// One published payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPoint {
    pub sequence: u64,
    pub published_at: Height,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default, Clone)]
pub struct Catalog {
    streams: BTreeMap<StreamId, Stream>,
    data: BTreeMap<StreamId, Vec<DataPoint>>,
    subscribers: BTreeMap<StreamId, BTreeSet<Principal>>,
    next_id: u64,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stream owned by `provider` and returns its id.
    ///
    /// Provider registration is checked by the caller.
    pub fn create(&mut self, provider: &Principal, draft: StreamDraft, now: Height) -> StreamId {
        let id = StreamId(self.next_id);
        self.next_id += 1;

        self.streams.insert(
            id,
            Stream {
                id,
                provider: provider.clone(),
                title: draft.title,
                description: draft.description,
                category: draft.category,
                base_price: draft.base_price,
                min_rate: draft.min_rate,
                created_at: now,
            },
        );
        id
    }

    pub fn get(&self, id: StreamId) -> LedgerResult<&Stream> {
        self.streams.get(&id).ok_or(LedgerError::StreamNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stream> {
        self.streams.values()
    }

    /// Appends an opaque payload to a stream. Only the owning provider may publish.
    ///
    /// Returns the payload's sequence number within the stream.
    pub fn publish(
        &mut self,
        caller: &Principal,
        id: StreamId,
        payload: Vec<u8>,
        now: Height,
    ) -> LedgerResult<u64> {
        let stream = self.get(id)?;
        if &stream.provider != caller {
            return Err(LedgerError::NotStreamOwner {
                stream: id,
                principal: caller.clone(),
            });
        }

        let points = self.data.entry(id).or_default();
        let sequence = points.len() as u64;
        points.push(DataPoint {
            sequence,
            published_at: now,
            payload,
        });
        Ok(sequence)
    }

    /// Records a plain subscription. Subscribing twice is harmless.
    pub fn subscribe(&mut self, caller: &Principal, id: StreamId) -> LedgerResult<()> {
        self.get(id)?;
        self.subscribers.entry(id).or_default().insert(caller.clone());
        Ok(())
    }

    pub fn is_subscribed(&self, caller: &Principal, id: StreamId) -> bool {
        self.subscribers
            .get(&id)
            .map(|s| s.contains(caller))
            .unwrap_or(false)
    }

    pub fn subscriber_count(&self, id: StreamId) -> usize {
        self.subscribers.get(&id).map(BTreeSet::len).unwrap_or(0)
    }

    pub fn data(&self, id: StreamId) -> &[DataPoint] {
        self.data.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}
