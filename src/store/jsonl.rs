//! JSONL-backed state store
//!
//! Layout under the output directory:
//! - `<persona>_history.jsonl`: one entry per line, in time-step order
//! - `<persona>_state.json`: latest state only, for external readers
//! - `<persona>_summary.md`: optional history summary
//!
//! Every write goes to a temporary file in the same directory which is
//! flushed, synced and then renamed over the target.

use eyre::{Context, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::StateStore;
use crate::model::StateHistoryEntry;

pub struct JsonlStateStore {
    dir: PathBuf,
}

impl JsonlStateStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn history_path(&self, persona: &str) -> PathBuf {
        self.dir.join(format!("{}_history.jsonl", persona))
    }

    pub fn snapshot_path(&self, persona: &str) -> PathBuf {
        self.dir.join(format!("{}_state.json", persona))
    }

    pub fn summary_path(&self, persona: &str) -> PathBuf {
        self.dir.join(format!("{}_summary.md", persona))
    }

    /// Latest-state snapshot as written after the last append
    #[cfg(test)]
    pub fn read_snapshot(&self, persona: &str) -> Result<Option<crate::model::EmotionalState>> {
        let path = self.snapshot_path(persona);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let state = serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(state))
    }

    fn temp_file(&self) -> Result<NamedTempFile> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory: {}", self.dir.display()))?;
        NamedTempFile::new_in(&self.dir).context("Failed to create temporary file")
    }

    fn commit(mut tmp: NamedTempFile, target: &Path) -> Result<()> {
        tmp.flush().context("Failed to flush temporary file")?;
        tmp.as_file().sync_all().context("Failed to sync temporary file")?;
        tmp.persist(target)
            .with_context(|| format!("Failed to replace {}", target.display()))?;
        Ok(())
    }

    fn write_atomic(&self, target: &Path, contents: &[u8]) -> Result<()> {
        let mut tmp = self.temp_file()?;
        tmp.write_all(contents).context("Failed to write temporary file")?;
        Self::commit(tmp, target)
    }
}

impl StateStore for JsonlStateStore {
    fn entries(&self, persona: &str) -> Result<Vec<StateHistoryEntry>> {
        let path = self.history_path(persona);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let mut entries = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: StateHistoryEntry = serde_json::from_str(line)
                .with_context(|| format!("Failed to parse {} line {}", path.display(), idx + 1))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    fn append(&self, persona: &str, entry: &StateHistoryEntry) -> Result<()> {
        let path = self.history_path(persona);
        let line = serde_json::to_string(entry).context("Failed to serialize history entry")?;

        let mut tmp = self.temp_file()?;
        if path.exists() {
            let mut existing = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
            io::copy(&mut existing, &mut tmp).context("Failed to copy existing history")?;
        }
        writeln!(tmp, "{}", line).context("Failed to write history entry")?;
        Self::commit(tmp, &path)?;

        let snapshot = serde_json::to_string_pretty(&entry.emotion).context("Failed to serialize state")?;
        self.write_atomic(&self.snapshot_path(persona), snapshot.as_bytes())?;

        log::debug!("Appended {} entry to {}", entry.time, path.display());
        Ok(())
    }

    fn load_summary(&self, persona: &str) -> Result<Option<String>> {
        let path = self.summary_path(persona);
        if !path.exists() {
            return Ok(None);
        }
        let summary = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(summary))
    }

    fn save_summary(&self, persona: &str, summary: &str) -> Result<()> {
        let path = self.summary_path(persona);
        self.write_atomic(&path, summary.as_bytes())?;
        log::info!("Stored summary: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EmotionalState, TimeIndex};
    use crate::store::testing::entry_at;
    use tempfile::TempDir;

    #[test]
    fn test_current_defaults_without_history() {
        let temp = TempDir::new().unwrap();
        let store = JsonlStateStore::new(temp.path().to_path_buf());

        assert_eq!(store.current("u01").unwrap(), EmotionalState::default());
        assert!(store.entries("u01").unwrap().is_empty());
        assert!(store.read_snapshot("u01").unwrap().is_none());
    }

    #[test]
    fn test_append_then_current() {
        let temp = TempDir::new().unwrap();
        let store = JsonlStateStore::new(temp.path().join("out"));

        store.append("u01", &entry_at(TimeIndex::week(1), 10)).unwrap();
        store.append("u01", &entry_at(TimeIndex::week(2), 20)).unwrap();

        assert_eq!(store.current("u01").unwrap().stress, 20);
        assert_eq!(store.read_snapshot("u01").unwrap().unwrap().stress, 20);

        let content = fs::read_to_string(store.history_path("u01")).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_personas_are_isolated() {
        let temp = TempDir::new().unwrap();
        let store = JsonlStateStore::new(temp.path().to_path_buf());

        store.append("u01", &entry_at(TimeIndex::week(1), 10)).unwrap();
        store.append("u02", &entry_at(TimeIndex::week(1), 90)).unwrap();

        assert_eq!(store.current("u01").unwrap().happy, 10);
        assert_eq!(store.current("u02").unwrap().happy, 90);
        assert_eq!(store.entries("u01").unwrap().len(), 1);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let temp = TempDir::new().unwrap();
        let store = JsonlStateStore::new(temp.path().to_path_buf());

        store.append("u01", &entry_at(TimeIndex::week(1), 10)).unwrap();
        store.save_summary("u01", "summary").unwrap();

        let mut names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["u01_history.jsonl", "u01_state.json", "u01_summary.md"]);
    }

    #[test]
    fn test_history_before_from_disk() {
        let temp = TempDir::new().unwrap();
        let store = JsonlStateStore::new(temp.path().to_path_buf());
        for week in 1..=4 {
            store.append("u01", &entry_at(TimeIndex::week(week), week as i64)).unwrap();
        }

        let lookback = store.history_before("u01", 4, None, 2).unwrap();
        let weeks: Vec<u32> = lookback.iter().map(|e| e.time.week).collect();
        assert_eq!(weeks, vec![2, 3]);
    }

    #[test]
    fn test_corrupt_line_reports_location() {
        let temp = TempDir::new().unwrap();
        let store = JsonlStateStore::new(temp.path().to_path_buf());
        store.append("u01", &entry_at(TimeIndex::week(1), 10)).unwrap();

        let path = store.history_path("u01");
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("{\"week\": 2, \"emo\n");
        fs::write(&path, content).unwrap();

        let err = store.entries("u01").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_summary_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = JsonlStateStore::new(temp.path().to_path_buf());

        assert!(store.load_summary("u01").unwrap().is_none());
        store.save_summary("u01", "A steady semester.").unwrap();
        assert_eq!(store.load_summary("u01").unwrap().as_deref(), Some("A steady semester."));
    }
}
