//! Error types for the settlement ledger.

use crate::amount::Amount;
use crate::types::{Height, PaymentStreamId, Principal, StreamId};
use thiserror::Error;

/// Result type alias for process-level operations (I/O, CSV, config).
pub type Result<T> = std::result::Result<T, EngineError>;

/// Result type alias for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Domain errors returned by ledger operations.
///
/// A failed operation never leaves partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{principal} is not a registered provider")]
    NotAProvider { principal: Principal },

    #[error("provider {principal} not found")]
    ProviderNotFound { principal: Principal },

    #[error("provider {principal} is already registered")]
    AlreadyRegistered { principal: Principal },

    #[error("stream {0} not found")]
    StreamNotFound(StreamId),

    #[error("{principal} does not own stream {stream}")]
    NotStreamOwner { stream: StreamId, principal: Principal },

    #[error("payment stream {0} is already active")]
    AlreadySubscribed(PaymentStreamId),

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },

    /// Rate is zero, or below the stream's configured minimum.
    #[error("payment rate {rate} is zero or below the minimum of stream {stream}")]
    RateTooLow { stream: StreamId, rate: Amount },

    #[error("payment stream {0} not found")]
    PaymentStreamNotFound(PaymentStreamId),

    #[error("payment stream {0} is closed")]
    PaymentStreamClosed(PaymentStreamId),

    /// The sequencer supplied a height older than the last checkpoint.
    #[error("clock regression: checkpoint {checkpoint}, now {now}")]
    ClockRegression { checkpoint: Height, now: Height },

    #[error("{principal} is not allowed to act on payment stream {id}")]
    Unauthorized { id: PaymentStreamId, principal: Principal },

    #[error("amount overflow")]
    AmountOverflow,
}

/// Errors that can occur while driving the ledger from a command log.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Failed to open or read an input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid or unreadable configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Command row that decoded but could not be turned into a command
    #[error("Invalid command at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Genesis balance rejected by the ledger
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: data-loop <commands.csv> [--config <file>] [--report <name>]")]
    MissingArgument,

    /// Unrecognized command line argument
    #[error("Unknown argument: {0}")]
    UnknownArgument(String),
}
