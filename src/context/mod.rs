//! Context assembly for a single time step
//!
//! Gathers schedule, deadlines, sensing, class experience and lookback
//! memory for one persona. Missing inputs become placeholder text; the only
//! errors surfaced are from the state store.

use eyre::Result;
use std::path::{Path, PathBuf};

use crate::dataset::sensing::{read_class_experience, read_sensing};
use crate::dataset::{Datasets, PersonaFiles, schedule};
use crate::model::{StateHistoryEntry, TimeIndex};
use crate::store::StateStore;

pub const NO_SENSING: &str = "(No sensing data recorded.)";
pub const NO_CLASS_EXPERIENCE: &str = "(No class experience recorded this week.)";
pub const NO_CLASSES: &str = "(No enrolled classes.)";

const MEMORY_NARRATIVE_CHARS: usize = 200;

/// Anything that can hold a per-step context
pub trait PersonaContext {
    fn set_week_context(&mut self, week: u32, context: AssembledContext);
    fn set_day_context(&mut self, week: u32, day: u32, context: AssembledContext);
}

/// Route a context to the setter matching its time index
pub fn apply_context(target: &mut dyn PersonaContext, context: AssembledContext) {
    let time = context.time;
    match time.day {
        Some(day) => target.set_day_context(time.week, day, context),
        None => target.set_week_context(time.week, context),
    }
}

/// Everything the narrative step needs besides traits and state
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    pub time: TimeIndex,
    pub schedule: Vec<String>,
    pub deadlines: Vec<String>,
    pub sensing: Vec<String>,
    pub class_experience: Vec<String>,
    pub memory: Option<String>,
}

impl AssembledContext {
    pub fn schedule_text(&self) -> String {
        or_placeholder(&self.schedule, NO_CLASSES)
    }

    pub fn sensing_text(&self) -> String {
        or_placeholder(&self.sensing, NO_SENSING)
    }

    pub fn class_experience_text(&self) -> String {
        or_placeholder(&self.class_experience, NO_CLASS_EXPERIENCE)
    }

    /// `None` when there are no upcoming deadlines
    pub fn deadlines_text(&self) -> Option<String> {
        (!self.deadlines.is_empty()).then(|| self.deadlines.join("\n"))
    }
}

fn or_placeholder(lines: &[String], placeholder: &str) -> String {
    if lines.is_empty() {
        placeholder.to_string()
    } else {
        lines.join("\n")
    }
}

pub struct ContextAssembler<'a> {
    datasets: &'a Datasets,
    store: &'a dyn StateStore,
    students_dir: PathBuf,
    lookback: usize,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(datasets: &'a Datasets, store: &'a dyn StateStore, students_dir: &Path, lookback: usize) -> Self {
        Self {
            datasets,
            store,
            students_dir: students_dir.to_path_buf(),
            lookback,
        }
    }

    pub fn assemble(&self, uid: &str, time: TimeIndex) -> Result<AssembledContext> {
        let files = PersonaFiles::new(&self.students_dir, uid);

        let schedule = schedule::format_schedule(self.datasets.enrolment.classes_for(uid), &self.datasets.catalog);
        let deadlines = self
            .datasets
            .deadlines
            .for_uid(uid)
            .iter()
            .map(|d| d.describe())
            .collect();

        let sensing = optional_lines(&files.sensing(time), read_sensing);
        let class_experience = optional_lines(&files.class_experience(time), read_class_experience);

        let memory = if self.lookback == 0 {
            None
        } else {
            let recent = self.store.history_before(uid, time.week, time.day, self.lookback)?;
            render_memory(&recent)
        };

        Ok(AssembledContext {
            time,
            schedule,
            deadlines,
            sensing,
            class_experience,
            memory,
        })
    }
}

/// Read a per-step file; absent or unreadable files yield no lines
fn optional_lines(path: &Path, read: fn(&Path) -> Result<Vec<String>>) -> Vec<String> {
    if !path.exists() {
        log::debug!("No file at {}", path.display());
        return Vec::new();
    }
    match read(path) {
        Ok(lines) => lines,
        Err(e) => {
            log::warn!("Ignoring unreadable {}: {:#}", path.display(), e);
            Vec::new()
        }
    }
}

/// Lookback entries as prompt text, oldest first
pub fn render_memory(entries: &[StateHistoryEntry]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let blocks: Vec<String> = entries
        .iter()
        .map(|entry| {
            let label = match entry.time.day {
                Some(day) => format!("Week {}, day {}", entry.time.week, day),
                None => format!("Week {}", entry.time.week),
            };
            format!("{}: {}\n  {}", label, entry.emotion, shorten(&entry.narrative, MEMORY_NARRATIVE_CHARS))
        })
        .collect();

    Some(blocks.join("\n"))
}

fn shorten(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::deadlines::DeadlineTable;
    use crate::dataset::exams::ExamBank;
    use crate::dataset::schedule::{ClassCatalog, Enrolment};
    use crate::personality::TraitTable;
    use crate::store::memory::MemoryStateStore;
    use crate::store::testing::entry_at;
    use std::fs;
    use tempfile::TempDir;

    fn datasets() -> Datasets {
        Datasets {
            traits: TraitTable::default(),
            survey_items: Vec::new(),
            enrolment: Enrolment::parse("u01,cs65,cs99\n").unwrap(),
            catalog: ClassCatalog::parse(
                r#"{"cs65": {"location": "Sudikoff 045", "describe": "Smartphone Programming", "periods": [{"day": 1, "start": "10:00", "end": "11:05"}]}}"#,
            )
            .unwrap(),
            deadlines: DeadlineTable::parse("uid,2013-04-01,2013-04-02\nu01,2,0\n").unwrap(),
            exams: ExamBank::default(),
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl PersonaContext for Recorder {
        fn set_week_context(&mut self, week: u32, _context: AssembledContext) {
            self.calls.push(format!("week {}", week));
        }

        fn set_day_context(&mut self, week: u32, day: u32, _context: AssembledContext) {
            self.calls.push(format!("week {} day {}", week, day));
        }
    }

    #[test]
    fn test_assemble_with_missing_files_uses_placeholders() {
        let temp = TempDir::new().unwrap();
        let datasets = datasets();
        let store = MemoryStateStore::new();
        let assembler = ContextAssembler::new(&datasets, &store, temp.path(), 3);

        let context = assembler.assemble("u01", TimeIndex::week(1)).unwrap();

        assert_eq!(context.sensing_text(), NO_SENSING);
        assert_eq!(context.class_experience_text(), NO_CLASS_EXPERIENCE);
        assert!(context.memory.is_none());
        assert_eq!(context.deadlines_text().as_deref(), Some("Mon 23:59 (count: 2)"));

        let schedule = context.schedule_text();
        assert!(schedule.contains("- cs65 (Smartphone Programming): Mon 10:00-11:05 at Sudikoff 045"));
        assert!(schedule.contains("- cs99 (Unknown): TBA at unknown location"));
    }

    #[test]
    fn test_assemble_unknown_persona() {
        let temp = TempDir::new().unwrap();
        let datasets = datasets();
        let store = MemoryStateStore::new();
        let assembler = ContextAssembler::new(&datasets, &store, temp.path(), 3);

        let context = assembler.assemble("u42", TimeIndex::week(1)).unwrap();
        assert_eq!(context.schedule_text(), NO_CLASSES);
        assert!(context.deadlines_text().is_none());
    }

    #[test]
    fn test_assemble_reads_step_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("u01");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("data_per_week2.csv"),
            "times, activity inference,location,location_des\n2013-04-01 10:00:00,1,Sudikoff,lab\n",
        )
        .unwrap();

        let datasets = datasets();
        let store = MemoryStateStore::new();
        let assembler = ContextAssembler::new(&datasets, &store, temp.path(), 3);

        let context = assembler.assemble("u01", TimeIndex::week(2)).unwrap();
        assert_eq!(context.sensing, vec!["Mon 10:00 | Activity: Yes | Location: Sudikoff | lab"]);
    }

    #[test]
    fn test_memory_from_lookback() {
        let temp = TempDir::new().unwrap();
        let datasets = datasets();
        let store = MemoryStateStore::new();
        for week in 1..=4 {
            store.append("u01", &entry_at(TimeIndex::week(week), week as i64)).unwrap();
        }

        let assembler = ContextAssembler::new(&datasets, &store, temp.path(), 2);
        let memory = assembler.assemble("u01", TimeIndex::week(4)).unwrap().memory.unwrap();

        assert!(memory.starts_with("Week 2: stamina=2"));
        assert!(memory.contains("Week 3: stamina=3"));
        assert!(!memory.contains("Week 1:"));
        assert!(!memory.contains("Week 4:"));
    }

    #[test]
    fn test_zero_lookback_disables_memory() {
        let temp = TempDir::new().unwrap();
        let datasets = datasets();
        let store = MemoryStateStore::new();
        store.append("u01", &entry_at(TimeIndex::week(1), 1)).unwrap();

        let assembler = ContextAssembler::new(&datasets, &store, temp.path(), 0);
        assert!(assembler.assemble("u01", TimeIndex::week(2)).unwrap().memory.is_none());
    }

    #[test]
    fn test_apply_context_dispatch() {
        let context = |time| AssembledContext {
            time,
            schedule: Vec::new(),
            deadlines: Vec::new(),
            sensing: Vec::new(),
            class_experience: Vec::new(),
            memory: None,
        };

        let mut recorder = Recorder::default();
        apply_context(&mut recorder, context(TimeIndex::week(3)));
        apply_context(&mut recorder, context(TimeIndex::day(3, 5)));
        assert_eq!(recorder.calls, vec!["week 3", "week 3 day 5"]);
    }

    #[test]
    fn test_shorten_long_narrative() {
        let long = "word ".repeat(100);
        let short = shorten(&long, 20);
        assert!(short.ends_with("..."));
        assert!(short.chars().count() <= 23);
        assert_eq!(shorten("  a\n b ", 20), "a b");
    }
}
