use fundme_types::{Address, Wei};
use serde::{Deserialize, Serialize};

use crate::book::FunderBook;

/// Count of persistent-storage accesses made by one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageMeter {
    pub reads: u64,
    pub writes: u64,
    /// Words copied into transient working memory.
    pub memory_words: u64,
}

impl StorageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&mut self, count: u64) {
        self.reads += count;
    }

    fn write(&mut self, count: u64) {
        self.writes += count;
    }

    fn copy(&mut self, words: u64) {
        self.memory_words += words;
    }

    /// Price of the recorded accesses under `schedule`.
    pub fn cost(&self, schedule: &GasSchedule) -> u64 {
        self.reads
            .saturating_mul(schedule.storage_read)
            .saturating_add(self.writes.saturating_mul(schedule.storage_write))
            .saturating_add(self.memory_words.saturating_mul(schedule.memory_word))
    }
}

/// Unit prices of storage and memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSchedule {
    pub storage_read: u64,
    pub storage_write: u64,
    pub memory_word: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            storage_read: 2100,
            storage_write: 5000,
            memory_word: 3,
        }
    }
}

/// Metered mutable access to a [`FunderBook`].
///
/// All state-mutating contract paths go through this cursor, so every persistent
/// read and write is counted. Registry length and each registry slot are separate
/// storage words.
pub struct MeteredBook<'a> {
    book: &'a mut FunderBook,
    meter: &'a mut StorageMeter,
}

impl<'a> MeteredBook<'a> {
    pub fn new(book: &'a mut FunderBook, meter: &'a mut StorageMeter) -> Self {
        Self { book, meter }
    }

    /// Read the registry length word.
    pub fn funder_count(&mut self) -> usize {
        self.meter.read(1);
        self.book.funders.len()
    }

    /// Read one registry slot.
    pub fn funder_at(&mut self, index: usize) -> Option<Address> {
        self.meter.read(1);
        self.book.funders.get(index).copied()
    }

    pub fn amount_of(&mut self, address: &Address) -> Wei {
        self.meter.read(1);
        self.book.amount_funded(address)
    }

    /// Write a ledger entry; zero deletes it.
    pub fn set_amount(&mut self, address: Address, amount: Wei) {
        self.meter.write(1);
        if amount.is_zero() {
            self.book.amounts.remove(&address);
        } else {
            self.book.amounts.insert(address, amount);
        }
    }

    /// Append to the registry: read length, write slot, write length.
    pub fn push_funder(&mut self, address: Address) {
        self.meter.read(1);
        self.meter.write(2);
        self.book.funders.push(address);
    }

    /// Copy the whole registry into working memory with one pass over storage.
    pub fn copy_funders(&mut self) -> Vec<Address> {
        let funders = self.book.funders.clone();
        let words = funders.len() as u64;
        self.meter.read(1 + words);
        self.meter.copy(words);
        funders
    }

    /// Clear the registry slot by slot, then its length.
    pub fn delete_funder_slots(&mut self) {
        let slots = self.book.funders.len() as u64;
        self.meter.write(slots + 1);
        self.book.funders.clear();
    }

    /// Clear the registry with a single length write.
    pub fn truncate_funders(&mut self) {
        self.meter.write(1);
        self.book.funders.clear();
    }
}
