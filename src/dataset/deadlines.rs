//! Per-persona deadline counts
//!
//! CSV header: `uid, <YYYY-MM-DD>, <YYYY-MM-DD>, ...`; each cell is the number
//! of deadlines falling on that date.

use chrono::NaiveDate;
use eyre::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Deadline {
    pub date: NaiveDate,
    pub count: u32,
}

impl Deadline {
    /// e.g. `Mon 23:59 (count: 2)`
    pub fn describe(&self) -> String {
        format!("{} 23:59 (count: {})", self.date.format("%a"), self.count)
    }
}

#[derive(Debug, Default)]
pub struct DeadlineTable {
    by_uid: HashMap<String, Vec<Deadline>>,
}

impl DeadlineTable {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse deadlines {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let mut dates: Vec<(usize, NaiveDate)> = Vec::new();
        for (idx, header) in headers.iter().enumerate().skip(1) {
            match NaiveDate::parse_from_str(header, "%Y-%m-%d") {
                Ok(date) => dates.push((idx, date)),
                Err(_) => log::warn!("Ignoring deadline column {:?}: not a date", header),
            }
        }

        let mut by_uid = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let Some(uid) = record.get(0).filter(|u| !u.is_empty()) else {
                continue;
            };

            let mut deadlines = Vec::new();
            for (idx, date) in &dates {
                let cell = record.get(*idx).unwrap_or("");
                let count = cell.parse::<f64>().unwrap_or(0.0);
                if count > 0.0 {
                    deadlines.push(Deadline {
                        date: *date,
                        count: count.round() as u32,
                    });
                }
            }
            by_uid.entry(uid.to_string()).or_insert(deadlines);
        }

        Ok(Self { by_uid })
    }

    /// Deadlines with a positive count; empty when the persona is not listed
    pub fn for_uid(&self, uid: &str) -> &[Deadline] {
        self.by_uid.get(uid).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_counts_only() {
        let table = DeadlineTable::parse("uid,2013-04-01,2013-04-03,notes\nu01,2,0,x\nu02,0,1.0,\n").unwrap();

        let u01 = table.for_uid("u01");
        assert_eq!(u01.len(), 1);
        assert_eq!(u01[0].date, NaiveDate::from_ymd_opt(2013, 4, 1).unwrap());
        assert_eq!(u01[0].count, 2);

        assert_eq!(table.for_uid("u02")[0].count, 1);
        assert!(table.for_uid("u03").is_empty());
    }

    #[test]
    fn test_describe() {
        let deadline = Deadline {
            date: NaiveDate::from_ymd_opt(2013, 4, 1).unwrap(),
            count: 2,
        };
        assert_eq!(deadline.describe(), "Mon 23:59 (count: 2)");
    }
}
