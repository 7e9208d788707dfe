//! Principal balances.
//!
//! Balances never go negative: a debit larger than the balance is refused.

use crate::amount::Amount;
use crate::types::Principal;
use serde::Serialize;
use std::collections::BTreeMap;

/// A principal's spendable balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub principal: Principal,
    pub balance: Amount,
}

impl Account {
    /// Creates a new account with a zero balance.
    pub fn new(principal: Principal) -> Self {
        Account {
            principal,
            balance: Amount::ZERO,
        }
    }

    /// Credits `amount`. Returns `false` and leaves the balance untouched on overflow.
    pub fn deposit(&mut self, amount: Amount) -> bool {
        match self.balance.checked_add(amount) {
            Some(balance) => {
                self.balance = balance;
                true
            }
            None => false,
        }
    }

    /// Debits `amount`.
    ///
    /// Returns `false` if the balance is smaller than `amount`.
    pub fn withdraw(&mut self, amount: Amount) -> bool {
        match self.balance.checked_sub(amount) {
            Some(balance) => {
                self.balance = balance;
                true
            }
            None => false,
        }
    }
}

/// All known balances, ordered by principal for deterministic reports.
#[derive(Debug, Default, Clone)]
pub struct Accounts {
    accounts: BTreeMap<Principal, Account>,
}

impl Accounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `principal`; unknown principals hold zero.
    pub fn balance(&self, principal: &Principal) -> Amount {
        self.accounts
            .get(principal)
            .map(|a| a.balance)
            .unwrap_or(Amount::ZERO)
    }

    /// Returns the account for `principal`, creating an empty one if needed.
    pub fn entry(&mut self, principal: &Principal) -> &mut Account {
        self.accounts
            .entry(principal.clone())
            .or_insert_with(|| Account::new(principal.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Sum of every balance, or `None` if it does not fit in an `Amount`.
    pub fn total(&self) -> Option<Amount> {
        self.accounts
            .values()
            .try_fold(Amount::ZERO, |acc, a| acc.checked_add(a.balance))
    }
}
