//! Command receipts and the stable numeric error codes reported to callers.
//!
//! Codes are part of the external contract. Internally every failure is a
//! [`LedgerError`]; this is the only place that maps it to a number.

use crate::error::LedgerError;
use std::fmt;

pub const ERR_NOT_A_PROVIDER: u32 = 100;
pub const ERR_PROVIDER_NOT_FOUND: u32 = 101;
pub const ERR_ALREADY_REGISTERED: u32 = 102;
pub const ERR_STREAM_NOT_FOUND: u32 = 103;
pub const ERR_NOT_STREAM_OWNER: u32 = 104;
pub const ERR_ALREADY_SUBSCRIBED: u32 = 105;
pub const ERR_INSUFFICIENT_FUNDS: u32 = 106;
/// Rate is zero or below the stream minimum (`err-zero-payment-rate`).
pub const ERR_ZERO_PAYMENT_RATE: u32 = 107;
pub const ERR_PAYMENT_STREAM_NOT_FOUND: u32 = 108;
pub const ERR_PAYMENT_STREAM_CLOSED: u32 = 109;
pub const ERR_CLOCK_REGRESSION: u32 = 110;
pub const ERR_UNAUTHORIZED: u32 = 111;
pub const ERR_AMOUNT_OVERFLOW: u32 = 112;

/// Numeric code for a ledger error.
pub fn error_code(err: &LedgerError) -> u32 {
    match err {
        LedgerError::NotAProvider { .. } => ERR_NOT_A_PROVIDER,
        LedgerError::ProviderNotFound { .. } => ERR_PROVIDER_NOT_FOUND,
        LedgerError::AlreadyRegistered { .. } => ERR_ALREADY_REGISTERED,
        LedgerError::StreamNotFound(_) => ERR_STREAM_NOT_FOUND,
        LedgerError::NotStreamOwner { .. } => ERR_NOT_STREAM_OWNER,
        LedgerError::AlreadySubscribed(_) => ERR_ALREADY_SUBSCRIBED,
        LedgerError::InsufficientFunds { .. } => ERR_INSUFFICIENT_FUNDS,
        LedgerError::RateTooLow { .. } => ERR_ZERO_PAYMENT_RATE,
        LedgerError::PaymentStreamNotFound(_) => ERR_PAYMENT_STREAM_NOT_FOUND,
        LedgerError::PaymentStreamClosed(_) => ERR_PAYMENT_STREAM_CLOSED,
        LedgerError::ClockRegression { .. } => ERR_CLOCK_REGRESSION,
        LedgerError::Unauthorized { .. } => ERR_UNAUTHORIZED,
        LedgerError::AmountOverflow => ERR_AMOUNT_OVERFLOW,
    }
}

/// Result of one applied command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Success value rendered as text (amount, id, sequence number, ...).
    Ok(String),
    /// Numeric error code.
    Err(u32),
}

impl Outcome {
    pub fn from_result<T: fmt::Display>(result: &Result<T, LedgerError>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value.to_string()),
            Err(e) => Outcome::Err(error_code(e)),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    fn status(&self) -> &'static str {
        match self {
            Outcome::Ok(_) => "ok",
            Outcome::Err(_) => "err",
        }
    }

    fn value(&self) -> String {
        match self {
            Outcome::Ok(v) => v.clone(),
            Outcome::Err(code) => code.to_string(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ok(v) => write!(f, "(ok {})", v),
            Outcome::Err(code) => write!(f, "(err u{})", code),
        }
    }
}

/// Receipt for a command applied from the command log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// 1-indexed CSV line, header included
    pub row: usize,
    pub op: &'static str,
    pub outcome: Outcome,
}

impl Receipt {
    pub fn csv_fields(&self) -> [String; 4] {
        [
            self.row.to_string(),
            self.op.to_string(),
            self.outcome.status().to_string(),
            self.outcome.value(),
        ]
    }
}
