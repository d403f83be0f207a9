//! Input datasets
//!
//! Static tables (survey, enrolment, class details, deadlines, exams) are
//! loaded once per run. Per-step files (sensing, class experience) live in
//! each persona's folder and are read by the context assembler.

use eyre::{Context, Result};
use lazy_regex::regex_captures;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::PathsConfig;
use crate::model::TimeIndex;
use crate::personality::TraitTable;

pub mod deadlines;
pub mod exams;
pub mod schedule;
pub mod sensing;
pub mod survey;

use deadlines::DeadlineTable;
use exams::ExamBank;
use schedule::{ClassCatalog, Enrolment};
use survey::SurveyItem;

/// Every static table a run needs
pub struct Datasets {
    pub traits: TraitTable,
    pub survey_items: Vec<SurveyItem>,
    pub enrolment: Enrolment,
    pub catalog: ClassCatalog,
    pub deadlines: DeadlineTable,
    pub exams: ExamBank,
}

impl Datasets {
    /// Load all static tables; any missing file is an error
    pub fn load(paths: &PathsConfig) -> Result<Self> {
        let missing: Vec<String> = paths
            .required_files()
            .into_iter()
            .filter(|(_, path)| !path.exists())
            .map(|(name, path)| format!("{} ({})", name, path.display()))
            .collect();
        if !missing.is_empty() {
            eyre::bail!("Missing required files: {}", missing.join(", "));
        }

        let survey = survey::load(&paths.big_five)?;
        let traits = TraitTable::from_responses(&survey.responses);

        Ok(Self {
            traits,
            survey_items: survey.items,
            enrolment: Enrolment::load(&paths.class_csv)?,
            catalog: ClassCatalog::load(&paths.class_info)?,
            deadlines: DeadlineTable::load(&paths.deadlines)?,
            exams: ExamBank::load(&paths.exams)?,
        })
    }
}

/// Per-persona file layout under the students directory
#[derive(Debug, Clone)]
pub struct PersonaFiles {
    dir: PathBuf,
}

impl PersonaFiles {
    pub fn new(students_dir: &Path, uid: &str) -> Self {
        Self {
            dir: students_dir.join(uid),
        }
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Behavioral sensing for a step
    pub fn sensing(&self, time: TimeIndex) -> PathBuf {
        match time.day {
            Some(day) => self.dir.join(format!("data_per_week{}_day{}.csv", time.week, day)),
            None => self.dir.join(format!("data_per_week{}.csv", time.week)),
        }
    }

    /// Class experience survey for a step
    pub fn class_experience(&self, time: TimeIndex) -> PathBuf {
        match time.day {
            Some(day) => self.dir.join(format!("class_1_week{}_day{}.csv", time.week, day)),
            None => self.dir.join(format!("class_1_week{}.csv", time.week)),
        }
    }
}

/// Persona folders named u00..u59, sorted by number
pub fn discover_personas(students_dir: &Path) -> Result<Vec<String>> {
    let mut found: Vec<(u32, String)> = Vec::new();

    for entry in WalkDir::new(students_dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to scan {}", students_dir.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if let Some((_, number)) = regex_captures!(r"^u([0-5][0-9])$", name)
            && let Ok(n) = number.parse::<u32>()
        {
            found.push((n, name.to_string()));
        }
    }

    found.sort();
    let personas: Vec<String> = found.into_iter().map(|(_, name)| name).collect();
    log::info!("Discovered {} personas in {}", personas.len(), students_dir.display());
    Ok(personas)
}
