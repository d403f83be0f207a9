//! Class enrolment and class details

use eyre::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const UNKNOWN_LOCATION: &str = "unknown location";
pub const TBA: &str = "TBA";
const UNKNOWN_DESCRIPTION: &str = "Unknown";

/// One weekly meeting of a class
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Period {
    pub day: u32,
    pub start: String,
    pub end: String,
}

/// Details for one class id
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassInfo {
    pub location: Option<String>,
    pub describe: Option<String>,
    pub instructor: Option<String>,
    pub periods: Vec<Period>,
}

/// Class id -> details, in file order
#[derive(Debug, Default)]
pub struct ClassCatalog {
    classes: IndexMap<String, ClassInfo>,
}

impl ClassCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse class info {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let classes: IndexMap<String, ClassInfo> = serde_json::from_str(content)?;
        Ok(Self { classes })
    }

    pub fn get(&self, class_id: &str) -> Option<&ClassInfo> {
        self.classes.get(class_id)
    }
}

/// Persona -> enrolled class ids
#[derive(Debug, Default)]
pub struct Enrolment {
    classes: HashMap<String, Vec<String>>,
}

impl Enrolment {
    /// Ragged CSV rows: `uid, class, class, ...`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse enrolment {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut classes = HashMap::new();
        for record in reader.records() {
            let record = record?;
            if record.len() < 2 {
                continue;
            }
            let uid = record[0].trim().to_string();
            let enrolled: Vec<String> = record
                .iter()
                .skip(1)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
            classes.entry(uid).or_insert(enrolled);
        }

        Ok(Self { classes })
    }

    /// Enrolled classes; empty when the persona is not listed
    pub fn classes_for(&self, uid: &str) -> &[String] {
        self.classes.get(uid).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn day_name(day: u32) -> String {
    match day {
        1 => "Mon".to_string(),
        2 => "Tue".to_string(),
        3 => "Wed".to_string(),
        4 => "Thu".to_string(),
        5 => "Fri".to_string(),
        6 => "Sat".to_string(),
        7 => "Sun".to_string(),
        other => format!("Day{}", other),
    }
}

/// One schedule line per enrolled class, with placeholders for unknown classes
pub fn format_schedule(classes: &[String], catalog: &ClassCatalog) -> Vec<String> {
    let unknown = ClassInfo::default();

    classes
        .iter()
        .map(|class_id| {
            let info = catalog.get(class_id).unwrap_or(&unknown);
            let location = info.location.as_deref().unwrap_or(UNKNOWN_LOCATION);
            let describe = info.describe.as_deref().unwrap_or(UNKNOWN_DESCRIPTION);

            let schedule = if info.periods.is_empty() {
                TBA.to_string()
            } else {
                let mut times: Vec<String> = info
                    .periods
                    .iter()
                    .map(|p| format!("{} {}-{}", day_name(p.day), p.start, p.end))
                    .collect();
                times.sort();
                times.join(", ")
            };

            format!("- {} ({}): {} at {}", class_id, describe, schedule, location)
        })
        .collect()
}
