//! Command log models for CSV parsing and internal representation.

use crate::amount::Amount;
use crate::catalog::StreamDraft;
use crate::error::{EngineError, Result};
use crate::types::{Height, Principal, StreamId};
use serde::Deserialize;
use std::str::FromStr;

/// Raw command record as read from CSV.
///
/// Columns not used by an operation are left empty.
#[derive(Debug, Default, Deserialize)]
pub struct CommandRecord {
    /// Operation name, e.g. `start-payment-stream`
    pub op: String,

    /// Principal issuing the command
    pub caller: String,

    /// Block height; empty means "same height as the previous command"
    pub height: Option<u64>,

    pub stream: Option<u64>,

    /// Payment stream owner for `process-payment` / `close-payment-stream`
    pub subscriber: Option<String>,

    /// Fund amount or stream base price
    pub amount: Option<String>,

    /// Payment rate or stream minimum rate
    pub rate: Option<String>,

    /// Provider display name or stream title
    pub name: Option<String>,

    pub description: Option<String>,

    pub category: Option<String>,

    /// Opaque data for `publish-data`
    pub payload: Option<String>,
}

impl CommandRecord {
    /// Parses the raw CSV record into a typed command.
    ///
    /// `last_height` fills in a missing height column.
    pub fn parse(&self, row: usize, last_height: Height) -> Result<ParsedCommand> {
        let invalid = |message: String| EngineError::InvalidRecord { row, message };

        let caller = self.caller.trim();
        if caller.is_empty() {
            return Err(invalid("missing caller".to_string()));
        }

        let op = self.op.trim().to_lowercase();
        let kind = match op.as_str() {
            "fund" => Command::Fund {
                amount: self.required_amount(&self.amount, "amount", row)?,
            },
            "register-provider" => Command::RegisterProvider {
                name: self.text(&self.name),
            },
            "create-stream" => Command::CreateStream(StreamDraft {
                title: self.text(&self.name),
                description: self.text(&self.description),
                category: self.text(&self.category),
                base_price: self.required_amount(&self.amount, "amount", row)?,
                min_rate: self.optional_amount(&self.rate, "rate", row)?,
            }),
            "start-payment-stream" => Command::StartPaymentStream {
                stream: self.required_stream(row)?,
                rate: self.required_amount(&self.rate, "rate", row)?,
            },
            "process-payment" => Command::ProcessPayment {
                stream: self.required_stream(row)?,
                subscriber: self.subscriber(),
            },
            "close-payment-stream" => Command::ClosePaymentStream {
                stream: self.required_stream(row)?,
                subscriber: self.subscriber(),
            },
            "publish-data" => Command::PublishData {
                stream: self.required_stream(row)?,
                payload: self.text(&self.payload).into_bytes(),
            },
            "subscribe-to-stream" => Command::SubscribeToStream {
                stream: self.required_stream(row)?,
            },
            other => return Err(invalid(format!("unknown operation '{}'", other))),
        };

        Ok(ParsedCommand {
            caller: Principal::new(caller),
            height: self.height.unwrap_or(last_height),
            kind,
        })
    }

    fn text(&self, field: &Option<String>) -> String {
        field.as_deref().map(str::trim).unwrap_or_default().to_string()
    }

    fn subscriber(&self) -> Option<Principal> {
        self.subscriber
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Principal::new)
    }

    fn required_stream(&self, row: usize) -> Result<StreamId> {
        self.stream
            .map(StreamId)
            .ok_or_else(|| EngineError::InvalidRecord {
                row,
                message: "missing stream".to_string(),
            })
    }

    fn required_amount(&self, field: &Option<String>, name: &str, row: usize) -> Result<Amount> {
        self.optional_amount(field, name, row)?
            .ok_or_else(|| EngineError::InvalidRecord {
                row,
                message: format!("missing {}", name),
            })
    }

    fn optional_amount(
        &self,
        field: &Option<String>,
        name: &str,
        row: usize,
    ) -> Result<Option<Amount>> {
        let trimmed = match field.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => return Ok(None),
        };
        Amount::from_str(trimmed)
            .map(Some)
            .map_err(|e| EngineError::InvalidRecord {
                row,
                message: format!("invalid {} '{}': {}", name, trimmed, e),
            })
    }
}

/// A parsed command ready to apply to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub caller: Principal,
    pub height: Height,
    pub kind: Command,
}

/// Ledger operations with their arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Credit the caller's balance.
    Fund { amount: Amount },

    RegisterProvider { name: String },

    CreateStream(StreamDraft),

    StartPaymentStream { stream: StreamId, rate: Amount },

    /// Settle a payment stream. Subscriber defaults to the caller.
    ProcessPayment {
        stream: StreamId,
        subscriber: Option<Principal>,
    },

    /// Final settlement, then close. Subscriber defaults to the caller.
    ClosePaymentStream {
        stream: StreamId,
        subscriber: Option<Principal>,
    },

    PublishData { stream: StreamId, payload: Vec<u8> },

    SubscribeToStream { stream: StreamId },
}

impl Command {
    /// Operation name as written in the command log.
    pub fn op_name(&self) -> &'static str {
        match self {
            Command::Fund { .. } => "fund",
            Command::RegisterProvider { .. } => "register-provider",
            Command::CreateStream(_) => "create-stream",
            Command::StartPaymentStream { .. } => "start-payment-stream",
            Command::ProcessPayment { .. } => "process-payment",
            Command::ClosePaymentStream { .. } => "close-payment-stream",
            Command::PublishData { .. } => "publish-data",
            Command::SubscribeToStream { .. } => "subscribe-to-stream",
        }
    }
}
