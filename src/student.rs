//! The simulated student
//!
//! A [`StudentAgent`] holds one persona's traits, the state it starts the
//! step with, and the context for that step. It composes every prompt the
//! persona "writes"; it never retries and never swallows generator errors.

use eyre::Result;

use crate::context::{AssembledContext, PersonaContext};
use crate::generator::Generator;
use crate::model::EmotionalState;
use crate::personality::TraitProfile;

pub struct StudentAgent {
    profile: TraitProfile,
    state: EmotionalState,
    context: Option<AssembledContext>,
    summary: Option<String>,
}

impl PersonaContext for StudentAgent {
    fn set_week_context(&mut self, week: u32, context: AssembledContext) {
        log::debug!("Context set for week {}", week);
        self.context = Some(context);
    }

    fn set_day_context(&mut self, week: u32, day: u32, context: AssembledContext) {
        log::debug!("Context set for week {}, day {}", week, day);
        self.context = Some(context);
    }
}

impl StudentAgent {
    pub fn new(profile: TraitProfile, state: EmotionalState) -> Self {
        Self {
            profile,
            state,
            context: None,
            summary: None,
        }
    }

    /// Prepend a persisted history summary to narrative prompts
    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn state(&self) -> &EmotionalState {
        &self.state
    }

    /// Replace the state after a parsed update
    pub fn set_state(&mut self, state: EmotionalState) {
        self.state = state;
    }

    fn status_block(&self) -> String {
        EmotionalState::FIELDS
            .iter()
            .zip(self.state_values())
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn state_values(&self) -> [i64; 6] {
        let s = &self.state;
        [s.stamina, s.knowledge, s.stress, s.happy, s.sleep, s.social]
    }

    fn persona_header(&self, schedule: &str) -> String {
        format!(
            "Personality:\n{}\n\nEnrolled Classes:\n{}\n\nCurrent Student status:\n{}",
            self.profile.prompt_block(),
            schedule,
            self.status_block()
        )
    }

    /// (prompt, system prompt) for the step's journal entry
    pub fn journal_prompts(&self) -> Result<(String, String)> {
        let Some(context) = &self.context else {
            eyre::bail!("No context set for journal entry");
        };

        let period = match context.time.day {
            Some(_) => "day",
            None => "week",
        };

        let mut system_prompt = String::from(
            "You are a university student simulator.\n\
             You will generate a self-reflection journal based on class schedule and real-world sensing data.\n\
             Write naturally and personally, as if you were the student reflecting on your ",
        );
        system_prompt.push_str(period);
        system_prompt.push_str(".\nFocus only on context - DO NOT add unnecessary elements like name or date.\n\n");

        if let Some(summary) = &self.summary {
            system_prompt.push_str(&format!("Your semester so far:\n{}\n\n", summary.trim()));
        }

        system_prompt.push_str(&self.persona_header(&context.schedule_text()));
        system_prompt.push_str(&format!(
            "\n\nYour Class Experience Summary:\n{}",
            context.class_experience_text()
        ));

        if let Some(memory) = &context.memory {
            system_prompt.push_str(&format!("\n\nWhat happened recently:\n{}", memory));
        }
        if let Some(deadlines) = context.deadlines_text() {
            system_prompt.push_str(&format!("\n\nHere are the upcoming deadlines:\n{}", deadlines));
        }

        let prompt = format!(
            "You are a university student. This is your activity for {}.\n\
             Sensing Data:\n\
             (Each entry: Timestamp | Activity | Location | Location description)\n\
             {}\n\n\
             TASK: Reflect on your experience this {} in class, on campus, and in your social life. \
             How did you feel? Any challenges? What are your goals for next {}?",
            context.time,
            context.sensing_text(),
            period,
            period
        );

        Ok((prompt, system_prompt))
    }

    /// Generate the step's journal entry; a single generator call
    pub fn write_journal(&self, generator: &dyn Generator) -> Result<String> {
        let (prompt, system_prompt) = self.journal_prompts()?;
        generator.generate(&prompt, &system_prompt)
    }

    /// (prompt, system prompt) asking for a state update from a journal entry
    pub fn analysis_prompts(&self, journal: &str) -> (String, String) {
        let keys = EmotionalState::FIELDS
            .iter()
            .map(|f| format!("'{}'", f))
            .collect::<Vec<_>>()
            .join(", ");
        let example = EmotionalState::FIELDS
            .iter()
            .map(|f| format!("  \"{}\": value", f))
            .collect::<Vec<_>>()
            .join(",\n");

        let system_prompt = format!(
            "You are an emotional state analyzer.\n\
             Your task is to analyze a student's self-reflection journal and infer their emotional state.\n\n\
             You must:\n\
             1. Output a dictionary with keys: [{}]\n\
             - Each value should be an integer between 0 and 100.\n\n\
             2. Explain briefly why each emotional value was chosen.\n\
             - Use reasoning directly from the journal text.\n\
             - Match student words/phrases with your judgment.\n\n\
             Current Student status:\n{}\n\n\
             Output format:\n{{\n{}\n}}\n\n\
             Reasoning:\n\
             - Stamina: because the student mentioned feeling drained after class.\n\
             - Stress: because they worried about deadlines, etc.",
            keys,
            self.state,
            example
        );

        let prompt = format!(
            "Here is the journal entry from the student:\n\n{}\n\n\
             Please analyze and output both the emotional dictionary and reasoning.",
            journal
        );

        (prompt, system_prompt)
    }

    /// Generate the terminal-milestone project idea
    pub fn write_project_submission(&self, generator: &dyn Generator) -> Result<String> {
        let schedule = self
            .context
            .as_ref()
            .map(AssembledContext::schedule_text)
            .unwrap_or_default();

        let system_prompt = format!(
            "You are a university student simulator.\n{}",
            self.persona_header(&schedule)
        );
        let prompt = "You are a university student. This is your last week to present final project \
                      (ideas) on smartphone programming to get 30 score.\n\n\
                      Please generate a creative and feasible mobile app project idea that demonstrates \
                      your understanding of smartphone programming concepts.";

        generator.generate(prompt, &system_prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::apply_context;
    use crate::generator::scripted::ScriptedGenerator;
    use crate::model::TimeIndex;

    fn profile() -> TraitProfile {
        TraitProfile {
            openness: 72.0,
            conscientiousness: 55.5,
            extraversion: 40.0,
            agreeableness: 80.0,
            neuroticism: 35.0,
        }
    }

    fn context(time: TimeIndex) -> AssembledContext {
        AssembledContext {
            time,
            schedule: vec!["- cs65 (Smartphone Programming): Mon 10:00-11:05 at Sudikoff".to_string()],
            deadlines: vec!["Mon 23:59 (count: 2)".to_string()],
            sensing: Vec::new(),
            class_experience: Vec::new(),
            memory: Some("Week 1: stamina=80".to_string()),
        }
    }

    #[test]
    fn test_journal_requires_context() {
        let agent = StudentAgent::new(profile(), EmotionalState::default());
        assert!(agent.journal_prompts().is_err());
    }

    #[test]
    fn test_journal_prompts_include_everything() {
        let mut agent = StudentAgent::new(profile(), EmotionalState::default())
            .with_summary(Some("Started strong, then fell behind.".to_string()));
        apply_context(&mut agent, context(TimeIndex::week(2)));

        let (prompt, system_prompt) = agent.journal_prompts().unwrap();

        assert!(system_prompt.contains("- Openness: 72.0"));
        assert!(system_prompt.contains("Mon 10:00-11:05 at Sudikoff"));
        assert!(system_prompt.contains("stress: 50"));
        assert!(system_prompt.contains("(No class experience recorded this week.)"));
        assert!(system_prompt.contains("Week 1: stamina=80"));
        assert!(system_prompt.contains("Mon 23:59 (count: 2)"));
        assert!(system_prompt.contains("Started strong, then fell behind."));
        assert!(prompt.contains("(No sensing data recorded.)"));
        assert!(prompt.contains("this week"));
    }

    #[test]
    fn test_daily_journal_wording() {
        let mut agent = StudentAgent::new(profile(), EmotionalState::default());
        apply_context(&mut agent, context(TimeIndex::day(2, 3)));

        let (prompt, _) = agent.journal_prompts().unwrap();
        assert!(prompt.contains("week 2, day 3"));
        assert!(prompt.contains("this day"));
    }

    #[test]
    fn test_write_journal_propagates_failure() {
        let mut agent = StudentAgent::new(profile(), EmotionalState::default());
        apply_context(&mut agent, context(TimeIndex::week(1)));

        let generator = ScriptedGenerator::new().fail("connection reset");
        let err = agent.write_journal(&generator).unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_write_journal_single_call() {
        let mut agent = StudentAgent::new(profile(), EmotionalState::default());
        apply_context(&mut agent, context(TimeIndex::week(1)));

        let generator = ScriptedGenerator::new().reply("Dear diary");
        let calls = generator.calls();
        assert_eq!(agent.write_journal(&generator).unwrap(), "Dear diary");
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_analysis_prompts_embed_journal_and_state() {
        let agent = StudentAgent::new(profile(), EmotionalState::default());
        let (prompt, system_prompt) = agent.analysis_prompts("I slept badly.");

        assert!(prompt.contains("I slept badly."));
        assert!(system_prompt.contains("'stamina', 'knowledge', 'stress', 'happy', 'sleep', 'social'"));
        assert!(system_prompt.contains("stamina=100 knowledge=50"));
        assert!(system_prompt.contains("\"social\": value"));
    }

    #[test]
    fn test_project_submission_prompt() {
        let agent = StudentAgent::new(profile(), EmotionalState::default());
        let generator = ScriptedGenerator::new().reply("A campus sleep tracker");
        let calls = generator.calls();

        assert_eq!(agent.write_project_submission(&generator).unwrap(), "A campus sleep tracker");
        let calls = calls.lock().unwrap();
        assert!(calls[0].0.contains("30 score"));
        assert!(calls[0].1.contains("- Neuroticism: 35.0"));
    }
}
