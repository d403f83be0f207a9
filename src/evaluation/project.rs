//! Final project judging

use eyre::Result;
use lazy_regex::regex_captures;

use crate::generator::Generator;
use crate::model::ProjectAssessment;

pub const PROJECT_MAX_SCORE: f64 = 30.0;

const JUDGE_SYSTEM_PROMPT: &str = "You are an expert university instructor and judge for a smartphone programming class.
Your task is to evaluate student mobile app project ideas based on the following criteria.

Evaluation Criteria (30 - Project Idea):
- Is the idea innovative or unique compared to existing apps?
- Does it clearly address a real problem or user need?
- Is the idea technically feasible for implementation by a student team within one semester?
- Is the scope appropriate (not too simple, not too ambitious)?
- Does it demonstrate thoughtful consideration of user experience and impact?

Instructions:
1. Evaluate the idea out of 30 based on the above criteria.
2. Answer in the form x/30.";

/// First `<number>/30` in a judge reply
pub fn extract_score(text: &str) -> Option<f64> {
    let (_, number) = regex_captures!(r"(\d+(?:\.\d+)?)\s*/\s*30", text)?;
    number.parse().ok()
}

/// Judge a submission; an unparseable reply keeps `score` as `None`
pub fn evaluate_project(generator: &dyn Generator, submission: &str) -> Result<ProjectAssessment> {
    let prompt = format!("Student Submission:\n{}\n\nPlease provide your evaluation.", submission);
    let feedback = generator.generate(&prompt, JUDGE_SYSTEM_PROMPT)?;

    let score = extract_score(&feedback);
    if score.is_none() {
        log::warn!("No <n>/30 score found in project feedback");
    }

    Ok(ProjectAssessment {
        score,
        max_score: PROJECT_MAX_SCORE,
        feedback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::scripted::ScriptedGenerator;

    #[test]
    fn test_extract_score() {
        assert_eq!(extract_score("Score: 24/30. Solid idea."), Some(24.0));
        assert_eq!(extract_score("I'd give it 27.5 / 30"), Some(27.5));
        assert_eq!(extract_score("Great idea, well scoped."), None);
    }

    #[test]
    fn test_evaluate_project_keeps_feedback() {
        let generator = ScriptedGenerator::new().reply("Feasible and useful. 22/30");
        let calls = generator.calls();

        let assessment = evaluate_project(&generator, "A study-buddy matching app").unwrap();

        assert_eq!(assessment.score, Some(22.0));
        assert_eq!(assessment.max_score, 30.0);
        assert_eq!(assessment.feedback, "Feasible and useful. 22/30");
        assert!(calls.lock().unwrap()[0].0.contains("A study-buddy matching app"));
    }

    #[test]
    fn test_unparsed_score_is_none_not_zero() {
        let generator = ScriptedGenerator::new().reply("Nice idea overall.");
        let assessment = evaluate_project(&generator, "idea").unwrap();
        assert_eq!(assessment.score, None);
    }
}
