//! Prompt history
//!
//! The store owns the collection; media only move the serialized blob.

mod medium;
mod store;

pub use medium::{FileMedium, KeyValueMedium, MemoryMedium};
pub use store::{HISTORY_KEY, HistoryId, HistoryItem, HistoryStore, StoreError};
