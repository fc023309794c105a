use std::collections::{BTreeMap, BTreeSet};

use fundme_types::{Address, Wei};

use crate::error::StateError;

/// Funder registry and contribution ledger as one structure.
///
/// The registry is an append-only log of funding events (an address appears once per
/// accepted `fund`), the ledger maps each address to its cumulative contribution.
/// Both are only mutated together through [`crate::MeteredBook`], which keeps every
/// key with a nonzero amount present in the registry and vice versa. Zeroed ledger
/// entries are removed rather than stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunderBook {
    pub(crate) funders: Vec<Address>,
    pub(crate) amounts: BTreeMap<Address, Wei>,
}

impl FunderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a book from persisted parts, rejecting inconsistent inputs.
    pub fn from_parts(
        funders: Vec<Address>,
        amounts: BTreeMap<Address, Wei>,
    ) -> Result<Self, StateError> {
        let book = Self { funders, amounts };
        book.verify()?;
        Ok(book)
    }

    /// Registry in insertion order, duplicates included.
    pub fn funders(&self) -> &[Address] {
        &self.funders
    }

    pub fn len(&self) -> usize {
        self.funders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funders.is_empty()
    }

    pub fn funder(&self, index: usize) -> Option<Address> {
        self.funders.get(index).copied()
    }

    /// Cumulative contribution of `address`; zero for unknown addresses.
    pub fn amount_funded(&self, address: &Address) -> Wei {
        self.amounts.get(address).copied().unwrap_or_default()
    }

    /// Addresses with a nonzero contribution, in address order.
    pub fn contributions(&self) -> impl Iterator<Item = (&Address, Wei)> {
        self.amounts.iter().map(|(address, amount)| (address, *amount))
    }

    pub fn contributor_count(&self) -> usize {
        self.amounts.len()
    }

    /// Sum of all contributions (saturating).
    pub fn total(&self) -> Wei {
        self.amounts.values().copied().sum()
    }

    /// Check the registry/ledger correspondence.
    pub fn verify(&self) -> Result<(), StateError> {
        if let Some(address) = self
            .amounts
            .iter()
            .find(|(_, amount)| amount.is_zero())
            .map(|(address, _)| address)
        {
            return Err(StateError::InvariantViolation(format!(
                "ledger stores a zero contribution for {}",
                address
            )));
        }

        let registered: BTreeSet<&Address> = self.funders.iter().collect();
        if let Some(address) = self.amounts.keys().find(|a| !registered.contains(a)) {
            return Err(StateError::InvariantViolation(format!(
                "{} has a contribution but is not in the funder registry",
                address
            )));
        }
        if let Some(address) = registered.iter().find(|a| !self.amounts.contains_key(**a)) {
            return Err(StateError::InvariantViolation(format!(
                "{} is registered but has no contribution",
                address
            )));
        }

        Ok(())
    }
}
