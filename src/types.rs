//! Identifiers shared across the ledger components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Block height supplied by the sequencer. Never read from a wall clock.
pub type Height = u64;

/// Opaque identifier of a caller (wallet address, account name, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Catalog identifier of a stream. Allocated sequentially from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of a payment stream: one subscriber paying for one stream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaymentStreamId {
    pub stream: StreamId,
    pub subscriber: Principal,
}

impl PaymentStreamId {
    pub fn new(stream: StreamId, subscriber: impl Into<Principal>) -> Self {
        Self {
            stream,
            subscriber: subscriber.into(),
        }
    }
}

impl fmt::Display for PaymentStreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.stream, self.subscriber)
    }
}
