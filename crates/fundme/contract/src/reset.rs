use fundme_types::Wei;
use serde::{Deserialize, Serialize};

use crate::storage::MeteredBook;

/// How the withdrawal reset walks persistent storage.
///
/// Both strategies leave the book in the same state; they differ only in how many
/// storage accesses they make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetStrategy {
    /// Re-read the registry length and each slot from storage on every iteration,
    /// then delete the registry slot by slot.
    Direct,
    /// Copy the registry into working memory once, zero ledger entries from the copy,
    /// then clear the registry with a single write.
    CopyThenBulkClear,
}

impl ResetStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::CopyThenBulkClear => "copy_then_bulk_clear",
        }
    }
}

impl std::fmt::Display for ResetStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zero every registered funder's contribution and empty the registry.
///
/// Returns the number of registry entries processed (duplicates counted).
pub fn reset_funders(book: &mut MeteredBook<'_>, strategy: ResetStrategy) -> usize {
    match strategy {
        ResetStrategy::Direct => {
            let mut index = 0;
            while index < book.funder_count() {
                if let Some(funder) = book.funder_at(index) {
                    book.set_amount(funder, Wei::ZERO);
                }
                index += 1;
            }
            book.delete_funder_slots();
            index
        }
        ResetStrategy::CopyThenBulkClear => {
            let funders = book.copy_funders();
            for funder in &funders {
                book.set_amount(*funder, Wei::ZERO);
            }
            book.truncate_funders();
            funders.len()
        }
    }
}
