//! Weekly exam question bank

use eyre::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One multiple-choice question
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExamQuestion {
    pub week: u32,
    pub topic: String,
    pub question: String,
    /// Correct letter (A-D)
    pub answer: String,
    pub point: f64,
}

#[derive(Debug, Default)]
pub struct ExamBank {
    questions: Vec<ExamQuestion>,
}

impl ExamBank {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse exams {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut questions = Vec::new();
        for (row, record) in reader.deserialize::<ExamQuestion>().enumerate() {
            let mut question = record.with_context(|| format!("Malformed exam row {}", row + 2))?;
            question.answer = question.answer.to_uppercase();
            questions.push(question);
        }

        Ok(Self { questions })
    }

    /// Questions for a week, in file order
    pub fn for_week(&self, week: u32) -> Vec<&ExamQuestion> {
        self.questions.iter().filter(|q| q.week == week).collect()
    }

    #[cfg(test)]
    pub fn from_questions(questions: Vec<ExamQuestion>) -> Self {
        Self { questions }
    }
}
