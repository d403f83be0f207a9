//! Emotional state store
//!
//! The append-only history is the single source of truth for a persona's
//! state: `current` is always the last appended entry (or the default state
//! when nothing has been written yet). Personas never share storage.

use eyre::Result;

use crate::model::{EmotionalState, StateHistoryEntry, TimeIndex};

pub mod jsonl;
#[cfg(test)]
pub mod memory;

pub use jsonl::JsonlStateStore;

/// Per-persona history storage
pub trait StateStore: Send + Sync {
    /// Full history in write order
    fn entries(&self, persona: &str) -> Result<Vec<StateHistoryEntry>>;

    /// Append one entry; readers observe either the old or the new history, never a partial write
    fn append(&self, persona: &str, entry: &StateHistoryEntry) -> Result<()>;

    /// Persisted history summary, if one has been generated
    fn load_summary(&self, persona: &str) -> Result<Option<String>>;

    fn save_summary(&self, persona: &str, summary: &str) -> Result<()>;

    /// Latest state, or the default when there is no history
    fn current(&self, persona: &str) -> Result<EmotionalState> {
        Ok(self
            .entries(persona)?
            .last()
            .map(|e| e.emotion)
            .unwrap_or_default())
    }

    /// Time index of the most recent entry
    fn last_time(&self, persona: &str) -> Result<Option<TimeIndex>> {
        Ok(self.entries(persona)?.last().map(|e| e.time))
    }

    /// Up to `limit` most recent entries, oldest first
    fn latest(&self, persona: &str, limit: usize) -> Result<Vec<StateHistoryEntry>> {
        Ok(select_latest(self.entries(persona)?, limit))
    }

    /// Up to `limit` most recent entries strictly before `(week, day)`, oldest first
    fn history_before(
        &self,
        persona: &str,
        week: u32,
        day: Option<u32>,
        limit: usize,
    ) -> Result<Vec<StateHistoryEntry>> {
        let entries = self.entries(persona)?;
        Ok(select_before(entries, TimeIndex { week, day }, limit))
    }
}

/// Lookback selection over a history
pub fn select_before(entries: Vec<StateHistoryEntry>, before: TimeIndex, limit: usize) -> Vec<StateHistoryEntry> {
    let earlier = entries.into_iter().filter(|e| e.time < before).collect();
    select_latest(earlier, limit)
}

/// The last `limit` entries in time order
pub fn select_latest(mut entries: Vec<StateHistoryEntry>, limit: usize) -> Vec<StateHistoryEntry> {
    // Stable: equal time indices keep write order
    entries.sort_by(|a, b| a.time.cmp(&b.time));

    let skip = entries.len().saturating_sub(limit);
    entries.split_off(skip)
}
