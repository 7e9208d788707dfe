//! Provider directory.

use crate::error::{LedgerError, LedgerResult};
use crate::types::{Height, Principal};
use serde::Serialize;
use std::collections::BTreeMap;

/// A registered data provider. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provider {
    pub principal: Principal,
    pub name: String,
    pub registered_at: Height,
}

#[derive(Debug, Default, Clone)]
pub struct Directory {
    providers: BTreeMap<Principal, Provider>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `principal` under a display name.
    pub fn register(&mut self, principal: &Principal, name: &str, now: Height) -> LedgerResult<()> {
        if self.providers.contains_key(principal) {
            return Err(LedgerError::AlreadyRegistered {
                principal: principal.clone(),
            });
        }

        self.providers.insert(
            principal.clone(),
            Provider {
                principal: principal.clone(),
                name: name.to_string(),
                registered_at: now,
            },
        );
        Ok(())
    }

    pub fn get(&self, principal: &Principal) -> LedgerResult<&Provider> {
        self.providers
            .get(principal)
            .ok_or_else(|| LedgerError::ProviderNotFound {
                principal: principal.clone(),
            })
    }

    pub fn is_registered(&self, principal: &Principal) -> bool {
        self.providers.contains_key(principal)
    }
}
