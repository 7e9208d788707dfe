//! The ledger store and its boundary operations.
//!
//! Every operation takes the calling principal and the current block height
//! explicitly and runs to completion against `&mut self`. Operations either
//! succeed or return a [`LedgerError`] with state untouched.

use crate::account::Accounts;
use crate::amount::Amount;
use crate::catalog::{Catalog, Stream, StreamDraft};
use crate::command::{Command, CommandRecord, ParsedCommand};
use crate::config::{ClosePolicy, LedgerConfig, SettlePolicy};
use crate::directory::{Directory, Provider};
use crate::error::{LedgerError, LedgerResult, Result};
use crate::receipt::{Outcome, Receipt};
use crate::registry::{PaymentStream, PaymentStreamRegistry};
use crate::revenue::RevenueLedger;
use crate::settlement::SettlementEngine;
use crate::types::{Height, PaymentStreamId, Principal, StreamId};
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use std::io::{Read, Write};

/// Read-only view of a stream with the figures the ledger tracks for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub stream: Stream,
    pub revenue: Amount,
    pub active_payment_streams: usize,
    pub subscribers: usize,
    pub publications: usize,
}

/// The settlement ledger.
///
/// Owns balances, the provider directory, the stream catalog, payment
/// streams and revenue totals. Reports are sorted by key so output is
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    config: LedgerConfig,
    accounts: Accounts,
    directory: Directory,
    catalog: Catalog,
    registry: PaymentStreamRegistry,
    revenue: RevenueLedger,
}

impl Ledger {
    /// Creates an empty ledger with default policies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger and credits the configured genesis balances.
    pub fn with_config(config: LedgerConfig) -> LedgerResult<Self> {
        let mut ledger = Ledger {
            config: config.clone(),
            ..Default::default()
        };
        for account in &config.genesis {
            ledger.fund(&account.principal, account.balance)?;
        }
        Ok(ledger)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Credits `amount` to `principal` and returns the new balance.
    pub fn fund(&mut self, principal: &Principal, amount: Amount) -> LedgerResult<Amount> {
        let account = self.accounts.entry(principal);
        if !account.deposit(amount) {
            return Err(LedgerError::AmountOverflow);
        }
        debug!("Funded {} with {}", principal, amount);
        Ok(account.balance)
    }

    pub fn balance(&self, principal: &Principal) -> Amount {
        self.accounts.balance(principal)
    }

    /// Sum of all balances. Settlement never changes it.
    pub fn total_balance(&self) -> Option<Amount> {
        self.accounts.total()
    }

    pub fn register_provider(
        &mut self,
        caller: &Principal,
        name: &str,
        now: Height,
    ) -> LedgerResult<Principal> {
        self.directory.register(caller, name, now)?;
        debug!("Registered provider {} ({})", caller, name);
        Ok(caller.clone())
    }

    pub fn create_stream(
        &mut self,
        caller: &Principal,
        draft: StreamDraft,
        now: Height,
    ) -> LedgerResult<StreamId> {
        if !self.directory.is_registered(caller) {
            return Err(LedgerError::NotAProvider {
                principal: caller.clone(),
            });
        }
        let id = self.catalog.create(caller, draft, now);
        debug!("Provider {} created stream {}", caller, id);
        Ok(id)
    }

    /// Opens a payment stream from `caller` to `stream` at `rate` per block.
    pub fn start_payment_stream(
        &mut self,
        caller: &Principal,
        stream: StreamId,
        rate: Amount,
        now: Height,
    ) -> LedgerResult<PaymentStreamId> {
        let stream = self.catalog.get(stream)?;
        let id = self.registry.open(stream, caller, rate, now)?;
        debug!("Opened payment stream {} at rate {} from height {}", id, rate, now);
        Ok(id)
    }

    /// Settles accrued payment for `id` up to `now`.
    pub fn process_payment(
        &mut self,
        caller: &Principal,
        id: &PaymentStreamId,
        now: Height,
    ) -> LedgerResult<Amount> {
        self.registry.get(id)?;
        let allowed = match self.config.settlement {
            SettlePolicy::Subscriber => caller == &id.subscriber,
            SettlePolicy::Anyone => true,
        };
        if !allowed {
            return Err(unauthorized(id, caller));
        }

        self.settlement().settle(id, now)
    }

    /// Settles what is owed up to `now`, then closes the payment stream.
    ///
    /// Returns the amount of the final settlement. If that settlement fails
    /// the stream stays open and nothing changes.
    pub fn close_payment_stream(
        &mut self,
        caller: &Principal,
        id: &PaymentStreamId,
        now: Height,
    ) -> LedgerResult<Amount> {
        let record = self.registry.get(id)?;
        let allowed = match self.config.close {
            ClosePolicy::Subscriber => caller == &id.subscriber,
            ClosePolicy::Provider => caller == &record.provider,
            ClosePolicy::Either => caller == &id.subscriber || caller == &record.provider,
        };
        if !allowed {
            return Err(unauthorized(id, caller));
        }

        let amount = self.settlement().settle(id, now)?;
        self.registry.close(id);
        debug!("Closed payment stream {} at height {}", id, now);
        Ok(amount)
    }

    /// Stores an opaque payload on a stream owned by `caller`.
    pub fn publish_data(
        &mut self,
        caller: &Principal,
        stream: StreamId,
        payload: Vec<u8>,
        now: Height,
    ) -> LedgerResult<u64> {
        let sequence = self.catalog.publish(caller, stream, payload, now)?;
        debug!("Published payload {} on stream {}", sequence, stream);
        Ok(sequence)
    }

    pub fn subscribe_to_stream(&mut self, caller: &Principal, stream: StreamId) -> LedgerResult<()> {
        self.catalog.subscribe(caller, stream)
    }

    pub fn get_provider_info(&self, principal: &Principal) -> LedgerResult<&Provider> {
        self.directory.get(principal)
    }

    pub fn get_stream_info(&self, id: StreamId) -> LedgerResult<StreamInfo> {
        let stream = self.catalog.get(id)?;
        Ok(StreamInfo {
            stream: stream.clone(),
            revenue: self.revenue.total(id),
            active_payment_streams: self.registry.active_count(id),
            subscribers: self.catalog.subscriber_count(id),
            publications: self.catalog.data(id).len(),
        })
    }

    pub fn get_payment_stream(&self, id: &PaymentStreamId) -> LedgerResult<&PaymentStream> {
        self.registry.get(id)
    }

    /// Closed terms of a payment stream that was later reopened, oldest first.
    pub fn closed_payment_terms(&self, id: &PaymentStreamId) -> &[PaymentStream] {
        self.registry.closed_terms(id)
    }

    pub fn is_subscribed(&self, caller: &Principal, stream: StreamId) -> bool {
        self.catalog.is_subscribed(caller, stream)
    }

    pub fn revenue(&self, stream: StreamId) -> Amount {
        self.revenue.total(stream)
    }

    fn settlement(&mut self) -> SettlementEngine<'_> {
        SettlementEngine::new(&mut self.registry, &mut self.accounts, &mut self.revenue)
    }

    /// Applies one parsed command and reports its outcome.
    pub fn apply(&mut self, command: ParsedCommand) -> Outcome {
        let ParsedCommand {
            caller,
            height: now,
            kind,
        } = command;

        match kind {
            Command::Fund { amount } => Outcome::from_result(&self.fund(&caller, amount)),
            Command::RegisterProvider { name } => {
                Outcome::from_result(&self.register_provider(&caller, &name, now))
            }
            Command::CreateStream(draft) => {
                Outcome::from_result(&self.create_stream(&caller, draft, now))
            }
            Command::StartPaymentStream { stream, rate } => {
                Outcome::from_result(&self.start_payment_stream(&caller, stream, rate, now))
            }
            Command::ProcessPayment { stream, subscriber } => {
                let id = PaymentStreamId::new(stream, subscriber.unwrap_or_else(|| caller.clone()));
                Outcome::from_result(&self.process_payment(&caller, &id, now))
            }
            Command::ClosePaymentStream { stream, subscriber } => {
                let id = PaymentStreamId::new(stream, subscriber.unwrap_or_else(|| caller.clone()));
                Outcome::from_result(&self.close_payment_stream(&caller, &id, now))
            }
            Command::PublishData { stream, payload } => {
                Outcome::from_result(&self.publish_data(&caller, stream, payload, now))
            }
            Command::SubscribeToStream { stream } => {
                Outcome::from_result(&self.subscribe_to_stream(&caller, stream).map(|()| true))
            }
        }
    }

    /// Replays a CSV command log in file order.
    ///
    /// Rows that fail to decode or parse are logged at warn level and
    /// skipped; every other row is applied and counted, including rejected ones.
    pub fn process_csv<R: Read>(&mut self, reader: R) -> Result<ReplaySummary> {
        self.replay(reader, |_| Ok(()))
    }

    /// Like [`process_csv`](Self::process_csv), handing each receipt to
    /// `on_receipt` as soon as its command has been applied.
    pub fn replay<R, F>(&mut self, reader: R, mut on_receipt: F) -> Result<ReplaySummary>
    where
        R: Read,
        F: FnMut(Receipt) -> Result<()>,
    {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut summary = ReplaySummary::default();
        let mut last_height: Height = 0;

        for (row_idx, result) in csv_reader.deserialize::<CommandRecord>().enumerate() {
            let row = row_idx + 2; // 1-indexed, accounting for header row

            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row, e);
                    continue;
                }
            };

            let command = match record.parse(row, last_height) {
                Ok(command) => command,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };

            last_height = command.height;
            let op = command.kind.op_name();
            let outcome = self.apply(command);
            summary.applied += 1;
            match &outcome {
                Outcome::Ok(value) => debug!("Row {}: {} -> {}", row, op, value),
                Outcome::Err(code) => {
                    summary.rejected += 1;
                    warn!("Row {}: {} rejected with code {}", row, op, code);
                }
            }
            on_receipt(Receipt { row, op, outcome })?;
        }

        info!(
            "Applied {} commands ({} rejected)",
            summary.applied, summary.rejected
        );
        Ok(summary)
    }

    /// Writes every balance as CSV, sorted by principal.
    pub fn write_balances<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["principal", "balance"])?;

        for account in self.accounts.iter() {
            csv_writer.write_record([account.principal.to_string(), account.balance.to_string()])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Writes the stream catalog with revenue totals, sorted by stream id.
    pub fn write_streams<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["stream", "provider", "title", "base_price", "min_rate", "revenue"])?;

        for stream in self.catalog.iter() {
            csv_writer.write_record([
                stream.id.to_string(),
                stream.provider.to_string(),
                stream.title.clone(),
                stream.base_price.to_string(),
                stream.min_rate.map(|r| r.to_string()).unwrap_or_default(),
                self.revenue.total(stream.id).to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Writes every payment stream, sorted by stream then subscriber.
    pub fn write_payments<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "stream",
            "subscriber",
            "provider",
            "rate",
            "status",
            "checkpoint",
            "total_paid",
        ])?;

        for record in self.registry.iter() {
            csv_writer.write_record([
                record.id.stream.to_string(),
                record.id.subscriber.to_string(),
                record.provider.to_string(),
                record.rate.to_string(),
                record.status.to_string(),
                record.checkpoint.to_string(),
                record.total_paid.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

fn unauthorized(id: &PaymentStreamId, caller: &Principal) -> LedgerError {
    LedgerError::Unauthorized {
        id: id.clone(),
        principal: caller.clone(),
    }
}

/// Counts from one command log replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
}

/// Writes command receipts as CSV in the order they arrive.
pub struct ReceiptWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> ReceiptWriter<W> {
    /// Creates the writer and emits the header row.
    pub fn new(writer: W) -> Result<Self> {
        let mut inner = csv::Writer::from_writer(writer);
        inner.write_record(["row", "op", "status", "value"])?;
        Ok(ReceiptWriter { inner })
    }

    pub fn write(&mut self, receipt: &Receipt) -> Result<()> {
        self.inner.write_record(receipt.csv_fields())?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}
