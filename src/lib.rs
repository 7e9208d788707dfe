//! # Data Loop
//!
//! A settlement ledger for a data-stream marketplace. Providers register and
//! publish metered streams; subscribers open rate-based payment streams and
//! settle what has accrued since their last checkpoint.
//!
//! ## Design Principles
//!
//! - **Explicit state**: all balances and records live in a [`Ledger`] value
//! - **Explicit time**: the block height is a parameter of every operation
//! - **Atomic operations**: a rejected operation leaves the ledger unchanged
//! - **Integer arithmetic**: accrual is `elapsed * rate`, checked for overflow
//! - **Stable error codes**: [`receipt::error_code`] maps errors to numbers
//!
//! ## Example
//!
//! ```
//! use data_loop::{Amount, Ledger, Principal, StreamDraft};
//!
//! let provider = Principal::from("wallet_1");
//! let subscriber = Principal::from("wallet_2");
//!
//! let mut ledger = Ledger::new();
//! ledger.fund(&subscriber, Amount::new(1_000)).unwrap();
//! ledger.register_provider(&provider, "Test Provider", 0).unwrap();
//! let stream = ledger
//!     .create_stream(&provider, StreamDraft { base_price: Amount::new(100), ..Default::default() }, 0)
//!     .unwrap();
//!
//! let id = ledger.start_payment_stream(&subscriber, stream, Amount::new(10), 1).unwrap();
//! assert_eq!(ledger.process_payment(&subscriber, &id, 6).unwrap(), Amount::new(50));
//! assert_eq!(ledger.revenue(stream), Amount::new(50));
//! ```

pub mod account;
pub mod amount;
pub mod catalog;
pub mod command;
pub mod config;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod rate;
pub mod receipt;
pub mod registry;
pub mod revenue;
pub mod settlement;
pub mod types;

pub use account::{Account, Accounts};
pub use amount::Amount;
pub use catalog::{Catalog, DataPoint, Stream, StreamDraft};
pub use command::{Command, CommandRecord, ParsedCommand};
pub use config::{ClosePolicy, GenesisAccount, LedgerConfig, SettlePolicy};
pub use directory::{Directory, Provider};
pub use error::{EngineError, LedgerError, LedgerResult, Result};
pub use ledger::{Ledger, ReceiptWriter, ReplaySummary, StreamInfo};
pub use rate::validate_rate;
pub use receipt::{error_code, Outcome, Receipt};
pub use registry::{PaymentStatus, PaymentStream, PaymentStreamRegistry};
pub use revenue::RevenueLedger;
pub use settlement::{Settlement, SettlementEngine};
pub use types::{Height, PaymentStreamId, Principal, StreamId};
