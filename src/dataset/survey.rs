//! Personality survey CSV
//!
//! Layout: `uid, type, <item columns...>`. Item headers carry the item number
//! as `- <n>.` followed by the statement. Lines starting with `/` are comments.

use eyre::{Context, Result};
use lazy_regex::regex_captures;
use std::collections::BTreeMap;
use std::path::Path;

use crate::personality::scoring::likert_value;
use crate::personality::{Administration, SurveyResponse};

/// An inventory item taken from a column header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyItem {
    pub number: u8,
    pub statement: String,
}

/// Parsed survey file
#[derive(Debug, Default)]
pub struct Survey {
    pub items: Vec<SurveyItem>,
    pub responses: Vec<SurveyResponse>,
}

pub fn load(path: &Path) -> Result<Survey> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&content).with_context(|| format!("Failed to parse survey {}", path.display()))
}

fn parse_item_header(header: &str) -> Option<SurveyItem> {
    let (_, number, statement) = regex_captures!(r"-\s*(\d+)\.\s*(.*)$", header)?;
    Some(SurveyItem {
        number: number.parse().ok()?,
        statement: statement.trim().to_string(),
    })
}

pub fn parse(content: &str) -> Result<Survey> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'/'))
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers().context("Failed to read header row")?.clone();
    if headers.len() < 3 {
        eyre::bail!("Expected uid, type and item columns, found {} columns", headers.len());
    }

    // Column index -> item
    let mut columns: Vec<(usize, SurveyItem)> = Vec::new();
    for (idx, header) in headers.iter().enumerate().skip(2) {
        match parse_item_header(header) {
            Some(item) => columns.push((idx, item)),
            None => log::warn!("Ignoring survey column without item number: {:?}", header),
        }
    }

    let mut responses = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed survey row {}", row + 2))?;
        let uid = record.get(0).unwrap_or("").trim();
        if uid.is_empty() {
            continue;
        }

        let administration: Administration = match record.get(1).unwrap_or("").parse() {
            Ok(a) => a,
            Err(e) => {
                log::warn!("Skipping survey row for {}: {}", uid, e);
                continue;
            }
        };

        let mut answers = BTreeMap::new();
        for (idx, item) in &columns {
            let cell = record.get(*idx).unwrap_or("").trim();
            if cell.is_empty() {
                continue;
            }
            let value = likert_value(cell)
                .ok_or_else(|| eyre::eyre!("Unrecognised answer {:?} for item {} of {}", cell, item.number, uid))?;
            answers.insert(item.number, value);
        }

        responses.push(SurveyResponse {
            uid: uid.to_string(),
            administration,
            answers,
        });
    }

    log::debug!("Parsed {} survey items, {} responses", columns.len(), responses.len());

    Ok(Survey {
        items: columns.into_iter().map(|(_, item)| item).collect(),
        responses,
    })
}
