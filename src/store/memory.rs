//! In-memory store for tests

use eyre::Result;
use std::collections::HashMap;
use std::sync::Mutex;

use super::StateStore;
use crate::model::StateHistoryEntry;

#[derive(Default)]
pub struct MemoryStateStore {
    entries: Mutex<HashMap<String, Vec<StateHistoryEntry>>>,
    summaries: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn entries(&self, persona: &str) -> Result<Vec<StateHistoryEntry>> {
        Ok(self.entries.lock().unwrap().get(persona).cloned().unwrap_or_default())
    }

    fn append(&self, persona: &str, entry: &StateHistoryEntry) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .entry(persona.to_string())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    fn load_summary(&self, persona: &str) -> Result<Option<String>> {
        Ok(self.summaries.lock().unwrap().get(persona).cloned())
    }

    fn save_summary(&self, persona: &str, summary: &str) -> Result<()> {
        self.summaries
            .lock()
            .unwrap()
            .insert(persona.to_string(), summary.to_string());
        Ok(())
    }
}
