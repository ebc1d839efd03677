//! Persisted prompt history
//!
//! Newest-first list of accepted prompts. Every mutation is written to the
//! medium before it is committed in memory, so a failed write leaves the
//! store exactly as it was.

use std::collections::HashSet;
use std::io;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::medium::KeyValueMedium;

/// Key the history blob is stored under
pub const HISTORY_KEY: &str = "promptHistory";

/// Unique within a store, never reissued
pub type HistoryId = u64;

/// An accepted prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: HistoryId,
    pub prompt: String,
    /// ISO-8601 creation time, display only
    pub timestamp: String,
}

/// Errors writing history
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("History storage error: {0}")]
    Io(#[from] io::Error),

    #[error("History serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("History ids exhausted")]
    IdsExhausted,
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryBlob {
    #[serde(default)]
    next_id: HistoryId,
    items: Vec<HistoryItem>,
}

/// Accepted on-disk shapes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Current(HistoryBlob),
    /// Bare array written by older clients; ids were creation timestamps
    Legacy(Vec<HistoryItem>),
}

/// The history collection and the medium it round-trips through
pub struct HistoryStore<M: KeyValueMedium> {
    medium: M,
    items: Vec<HistoryItem>,
    next_id: HistoryId,
}

impl<M: KeyValueMedium> HistoryStore<M> {
    /// Load history from `medium`
    ///
    /// Never fails: unreadable or malformed data yields an empty history.
    pub fn load(medium: M) -> Self {
        debug!("HistoryStore::load: called");
        let blob = read_blob(&medium);
        info!(count = blob.items.len(), next_id = blob.next_id, "History loaded");
        Self {
            medium,
            items: blob.items,
            next_id: blob.next_id,
        }
    }

    /// In-memory items, newest first
    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: HistoryId) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Re-read the collection from the medium
    pub fn load_all(&self) -> Vec<HistoryItem> {
        read_blob(&self.medium).items
    }

    /// Record `prompt` as the newest item
    pub fn save(&mut self, prompt: impl Into<String>) -> Result<HistoryItem, StoreError> {
        let next_id = self.next_id.checked_add(1).ok_or(StoreError::IdsExhausted)?;
        let item = HistoryItem {
            id: self.next_id,
            prompt: prompt.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        debug!(id = item.id, prompt_len = item.prompt.len(), "save: called");

        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.push(item.clone());
        items.extend(self.items.iter().cloned());

        self.commit(items, next_id)?;
        info!(id = item.id, "Saved prompt to history");
        Ok(item)
    }

    /// Remove the item with `id`; returns whether anything was removed
    pub fn delete(&mut self, id: HistoryId) -> Result<bool, StoreError> {
        debug!(id, "delete: called");
        if self.get(id).is_none() {
            debug!(id, "delete: no such item");
            return Ok(false);
        }

        let items = self.items.iter().filter(|item| item.id != id).cloned().collect();
        self.commit(items, self.next_id)?;
        info!(id, "Deleted prompt from history");
        Ok(true)
    }

    /// Remove every item; ids are still not reused
    pub fn clear(&mut self) -> Result<(), StoreError> {
        debug!("clear: called");
        self.commit(Vec::new(), self.next_id)
    }

    /// Replace the whole collection
    ///
    /// Items must already be newest-first. Duplicate ids are renumbered.
    pub fn persist_all(&mut self, items: Vec<HistoryItem>) -> Result<(), StoreError> {
        debug!(count = items.len(), "persist_all: called");
        let blob = normalize(items, self.next_id);
        self.commit(blob.items, blob.next_id)
    }

    pub fn into_medium(self) -> M {
        self.medium
    }

    /// Write first, then swap in-memory state
    fn commit(&mut self, items: Vec<HistoryItem>, next_id: HistoryId) -> Result<(), StoreError> {
        let blob = HistoryBlob { next_id, items };
        let json = serde_json::to_string(&blob)?;
        if let Err(e) = self.medium.set(HISTORY_KEY, &json) {
            warn!(error = %e, "commit: persisting history failed, in-memory state unchanged");
            return Err(e.into());
        }
        self.items = blob.items;
        self.next_id = blob.next_id;
        Ok(())
    }
}

fn read_blob<M: KeyValueMedium>(medium: &M) -> HistoryBlob {
    let raw = match medium.get(HISTORY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("read_blob: nothing stored");
            return HistoryBlob { next_id: 1, items: vec![] };
        }
        Err(e) => {
            warn!(error = %e, "Failed to read history, starting empty");
            return HistoryBlob { next_id: 1, items: vec![] };
        }
    };

    match serde_json::from_str::<StoredHistory>(&raw) {
        Ok(StoredHistory::Current(blob)) => normalize(blob.items, blob.next_id),
        Ok(StoredHistory::Legacy(items)) => {
            debug!(count = items.len(), "read_blob: legacy array format");
            normalize(items, 1)
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse history, starting empty");
            HistoryBlob { next_id: 1, items: vec![] }
        }
    }
}

/// Make ids unique and push the counter past every id in use
///
/// A counter with no room left for renumbering plus one save restarts the
/// ids from 1, oldest item first.
fn normalize(mut items: Vec<HistoryItem>, next_id: HistoryId) -> HistoryBlob {
    let max_id = items.iter().map(|item| item.id).max().unwrap_or(0);
    let mut next_id = next_id.max(max_id.saturating_add(1));

    let count = items.len() as HistoryId;
    if max_id == HistoryId::MAX || next_id.checked_add(count + 1).is_none() {
        warn!(next_id, max_id, count, "History id counter saturated, renumbering");
        for (item, id) in items.iter_mut().zip((1..=count).rev()) {
            item.id = id;
        }
        return HistoryBlob {
            next_id: count + 1,
            items,
        };
    }

    let mut seen = HashSet::new();
    for item in items.iter_mut() {
        if !seen.insert(item.id) {
            warn!(id = item.id, new_id = next_id, "Duplicate history id renumbered");
            item.id = next_id;
            seen.insert(next_id);
            next_id += 1;
        }
    }

    HistoryBlob { next_id, items }
}
