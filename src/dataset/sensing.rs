//! Per-step behavioral sensing and class experience files

use chrono::NaiveDateTime;
use eyre::{Context, Result};
use std::fs;
use std::path::Path;

const TIMESTAMP_FORMATS: [&str; 4] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

const ASSIGNMENT_COLUMN: &str = "Do you have an assignment (due), quizz or exam today?";
const ENJOYMENT_COLUMN: &str = "I enjoyed the class today.";

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn format_timestamp(raw: &str) -> String {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.format("%a %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn is_active(raw: &str) -> bool {
    match raw.trim().to_lowercase().as_str() {
        "" | "0" | "0.0" | "false" | "no" => false,
        _ => true,
    }
}

/// `<Weekday HH:MM> | Activity: Yes/No | Location: <loc> | <description>` per row
pub fn read_sensing(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_sensing(&content).with_context(|| format!("Failed to parse sensing data {}", path.display()))
}

pub fn parse_sensing(content: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let times = column(&headers, "times").ok_or_else(|| eyre::eyre!("Missing 'times' column"))?;
    let activity = column(&headers, "activity inference");
    let location = column(&headers, "location");
    let description = column(&headers, "location_des");

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

        let when = format_timestamp(field(Some(times)));
        let active = if is_active(field(activity)) { "Yes" } else { "No" };
        let place = match field(location) {
            "" => "Unknown",
            loc => loc,
        };

        lines.push(format!(
            "{} | Activity: {} | Location: {} | {}",
            when,
            active,
            place,
            field(description)
        ));
    }

    Ok(lines)
}

fn enjoyment_phrase(level: &str) -> &'static str {
    match level.trim().parse::<f64>().ok().map(|v| v as i64) {
        Some(1) => "felt neutral",
        Some(2) => "strongly agreed",
        Some(3) => "agreed",
        Some(4) => "disagreed",
        Some(5) => "strongly disagreed",
        _ => "had unknown feelings about",
    }
}

/// One paragraph per class-experience row
pub fn read_class_experience(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_class_experience(&content).with_context(|| format!("Failed to parse class experience {}", path.display()))
}

pub fn parse_class_experience(content: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let course = column(&headers, "course_id").ok_or_else(|| eyre::eyre!("Missing 'course_id' column"))?;
    let assignment = column(&headers, ASSIGNMENT_COLUMN);
    let enjoyment = column(&headers, ENJOYMENT_COLUMN);

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

        lines.push(format!(
            "In class {}:\n→ I had {} assignment(s)/quiz/exam this week.\n→ I {} enjoying this class.",
            field(Some(course)),
            field(assignment),
            enjoyment_phrase(field(enjoyment))
        ));
    }

    Ok(lines)
}
