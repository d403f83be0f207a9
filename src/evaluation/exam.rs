//! Weekly exam evaluation

use eyre::Result;

use super::answer::extract_answer;
use crate::dataset::exams::{ExamBank, ExamQuestion};
use crate::generator::Generator;
use crate::model::{AcademicScoreRecord, EmotionalState};
use crate::personality::TraitProfile;

fn student_profile(profile: &TraitProfile, state: &EmotionalState) -> String {
    format!(
        "You are a student with the following characteristics:\n\
         - Big Five Personality: {}\n\
         - Current Status: Stamina={}, Knowledge={}, Stress={}, Happy={}, Sleep={}, Social={}",
        profile, state.stamina, state.knowledge, state.stress, state.happy, state.sleep, state.social
    )
}

fn question_prompt(profile_text: &str, question: &ExamQuestion) -> String {
    format!(
        "{}\n\n\
         You are taking a smartphone programming class exam. Here's the question:\n\n\
         Topic: {}\n\
         Question: {}\n\n\
         Please provide your answer as a single letter (A, B, C, or D).",
        profile_text, question.topic, question.question
    )
}

/// Answer every question of `week` in character and score the result.
///
/// A week without questions yields the zero "no exam" record without calling
/// the generator. Generator errors propagate.
pub fn evaluate_week(
    generator: &dyn Generator,
    bank: &ExamBank,
    week: u32,
    profile: &TraitProfile,
    state: &EmotionalState,
) -> Result<AcademicScoreRecord> {
    let questions = bank.for_week(week);
    let Some(first) = questions.first() else {
        log::info!("No exam questions for week {}", week);
        return Ok(AcademicScoreRecord::no_exam(week));
    };

    let profile_text = student_profile(profile, state);
    let mut score = 0.0;
    let mut correct = 0;

    for question in &questions {
        let response = generator.generate(&question_prompt(&profile_text, question), "")?;
        let answer = extract_answer(&response);
        log::debug!(
            "Week {} question {:?}: expected {}, extracted {:?}",
            week,
            question.question,
            question.answer,
            answer
        );

        if answer.as_deref() == Some(question.answer.as_str()) {
            score += question.point;
            correct += 1;
        }
    }

    Ok(AcademicScoreRecord {
        week,
        topic: first.topic.clone(),
        score,
        max_score: questions.iter().map(|q| q.point).sum(),
        correct_answers: correct,
        total_questions: questions.len() as u32,
    })
}
