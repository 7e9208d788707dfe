//! Settlement of accrued payments.
//!
//! A settlement is computed from read-only state first ([`SettlementEngine::quote`]),
//! and only once every precondition holds is it committed. The commit cannot
//! fail, so the five mutations (subscriber debit, provider credit, checkpoint,
//! paid total, stream revenue) apply together or not at all.

use crate::account::Accounts;
use crate::amount::Amount;
use crate::error::{LedgerError, LedgerResult};
use crate::registry::PaymentStreamRegistry;
use crate::revenue::RevenueLedger;
use crate::types::{Height, PaymentStreamId, Principal};
use log::debug;

/// A validated, not yet applied settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub id: PaymentStreamId,
    pub provider: Principal,
    /// Blocks since the last checkpoint.
    pub elapsed: u64,
    pub amount: Amount,
    pub now: Height,
}

/// Mutable view over the state a settlement touches.
pub struct SettlementEngine<'a> {
    registry: &'a mut PaymentStreamRegistry,
    accounts: &'a mut Accounts,
    revenue: &'a mut RevenueLedger,
}

impl<'a> SettlementEngine<'a> {
    pub fn new(
        registry: &'a mut PaymentStreamRegistry,
        accounts: &'a mut Accounts,
        revenue: &'a mut RevenueLedger,
    ) -> Self {
        SettlementEngine {
            registry,
            accounts,
            revenue,
        }
    }

    /// Computes what settling `id` at `now` would transfer, without changing anything.
    pub fn quote(&self, id: &PaymentStreamId, now: Height) -> LedgerResult<Settlement> {
        let record = self.registry.get(id)?;
        if !record.is_active() {
            return Err(LedgerError::PaymentStreamClosed(id.clone()));
        }
        if now < record.checkpoint {
            return Err(LedgerError::ClockRegression {
                checkpoint: record.checkpoint,
                now,
            });
        }

        let elapsed = now - record.checkpoint;
        let amount = record
            .rate
            .accrued(elapsed)
            .ok_or(LedgerError::AmountOverflow)?;

        let available = self.accounts.balance(&id.subscriber);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available,
            });
        }

        if record.provider != id.subscriber {
            self.accounts
                .balance(&record.provider)
                .checked_add(amount)
                .ok_or(LedgerError::AmountOverflow)?;
        }
        record
            .total_paid
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        self.revenue
            .preview_credit(id.stream, amount)
            .ok_or(LedgerError::AmountOverflow)?;

        Ok(Settlement {
            id: id.clone(),
            provider: record.provider.clone(),
            elapsed,
            amount,
            now,
        })
    }

    /// Settles accrued payment for `id` up to `now` and returns the amount moved.
    ///
    /// Settling twice at the same height transfers zero the second time.
    pub fn settle(&mut self, id: &PaymentStreamId, now: Height) -> LedgerResult<Amount> {
        let settlement = self.quote(id, now)?;
        self.commit(&settlement);
        Ok(settlement.amount)
    }

    fn commit(&mut self, settlement: &Settlement) {
        let Settlement {
            id,
            provider,
            amount,
            now,
            ..
        } = settlement;

        if !amount.is_zero() {
            let debited = self.accounts.entry(&id.subscriber).withdraw(*amount);
            let credited = self.accounts.entry(provider).deposit(*amount);
            debug_assert!(debited && credited, "settlement committed without a valid quote");
            self.revenue.credit(id.stream, *amount);
        }
        self.registry.advance(id, *now, *amount);

        debug!(
            "Settled {} for payment stream {} over {} blocks, checkpoint {}",
            amount, id, settlement.elapsed, now
        );
    }
}
