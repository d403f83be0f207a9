//! Step driver
//!
//! Each time step walks the same phases:
//!
//! ```text
//! AwaitingContext -> Generating -> Parsing -> Updated | DegradedFallback -> Evaluating -> Recorded
//! ```
//!
//! A generation failure jumps straight to `Recorded` with a `failed` entry
//! carrying the previous state. Every step writes exactly one entry and
//! nothing is rolled back.

use eyre::Result;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::analysis::parse_state_update;
use crate::config::{Granularity, SimulationConfig};
use crate::context::{ContextAssembler, apply_context};
use crate::dataset::{Datasets, PersonaFiles};
use crate::error::SimError;
use crate::evaluation::project::PROJECT_MAX_SCORE;
use crate::evaluation::{evaluate_project, evaluate_week};
use crate::generator::Generator;
use crate::model::{AcademicScoreRecord, ProjectAssessment, StateHistoryEntry, StepOutcome, TimeIndex};
use crate::personality::TraitProfile;
use crate::store::StateStore;
use crate::student::StudentAgent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    AwaitingContext,
    Generating,
    Parsing,
    Updated,
    DegradedFallback,
    Evaluating,
    Recorded,
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepPhase::AwaitingContext => "awaiting-context",
            StepPhase::Generating => "generating",
            StepPhase::Parsing => "parsing",
            StepPhase::Updated => "updated",
            StepPhase::DegradedFallback => "degraded-fallback",
            StepPhase::Evaluating => "evaluating",
            StepPhase::Recorded => "recorded",
        };
        write!(f, "{}", s)
    }
}

struct PhaseTracker<'a> {
    uid: &'a str,
    time: TimeIndex,
    phase: StepPhase,
}

impl<'a> PhaseTracker<'a> {
    fn new(uid: &'a str, time: TimeIndex) -> Self {
        log::debug!("{} {}: {}", uid, time, StepPhase::AwaitingContext);
        Self {
            uid,
            time,
            phase: StepPhase::AwaitingContext,
        }
    }

    fn advance(&mut self, next: StepPhase) {
        log::debug!("{} {}: {} -> {}", self.uid, self.time, self.phase, next);
        self.phase = next;
    }
}

/// Every step index for the configured range, in chronological order
pub fn time_steps(settings: &SimulationConfig) -> Vec<TimeIndex> {
    let weeks = settings.first_week..=settings.last_week;
    match settings.granularity {
        Granularity::Week => weeks.map(TimeIndex::week).collect(),
        Granularity::Day => weeks
            .flat_map(|week| (1..=settings.days_per_week).map(move |day| TimeIndex::day(week, day)))
            .collect(),
    }
}

/// Results for one persona
#[derive(Debug, Clone)]
pub struct PersonaReport {
    pub uid: String,
    pub entries: Vec<StateHistoryEntry>,
}

impl PersonaReport {
    pub fn count(&self, outcome: StepOutcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }
}

/// Results for a multi-persona run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: Vec<PersonaReport>,
    /// Personas that stopped early, with the reason
    pub failed: Vec<(String, String)>,
}

pub struct Simulation<'a> {
    generator: &'a dyn Generator,
    store: &'a dyn StateStore,
    datasets: &'a Datasets,
    students_dir: PathBuf,
    settings: SimulationConfig,
}

impl<'a> Simulation<'a> {
    pub fn new(
        generator: &'a dyn Generator,
        store: &'a dyn StateStore,
        datasets: &'a Datasets,
        students_dir: &Path,
        settings: SimulationConfig,
    ) -> Self {
        Self {
            generator,
            store,
            datasets,
            students_dir: students_dir.to_path_buf(),
            settings,
        }
    }

    /// Weekly steps, or the last day of the week in daily mode
    fn is_week_end(&self, time: TimeIndex) -> bool {
        time.day.is_none_or(|d| d == self.settings.days_per_week)
    }

    fn is_project_step(&self, time: TimeIndex) -> bool {
        time.week == self.settings.project_week && self.is_week_end(time)
    }

    /// Run one time step and append its entry. Steps must come strictly after
    /// the last recorded one.
    pub fn run_step(&self, uid: &str, profile: &TraitProfile, time: TimeIndex) -> Result<StateHistoryEntry> {
        if let Some(last) = self.store.last_time(uid)?
            && time <= last
        {
            return Err(SimError::OutOfOrderStep { time, last }.into());
        }

        let mut phase = PhaseTracker::new(uid, time);

        let previous = self.store.current(uid)?;
        let assembler = ContextAssembler::new(self.datasets, self.store, &self.students_dir, self.settings.lookback);
        let context = assembler.assemble(uid, time)?;
        let summary = if self.settings.use_summary {
            self.store.load_summary(uid)?
        } else {
            None
        };

        let mut agent = StudentAgent::new(*profile, previous).with_summary(summary);
        apply_context(&mut agent, context);

        phase.advance(StepPhase::Generating);
        let generated = agent.write_journal(self.generator).and_then(|journal| {
            let (prompt, system_prompt) = agent.analysis_prompts(&journal);
            let analysis = self.generator.generate(&prompt, &system_prompt)?;
            Ok((journal, analysis))
        });

        let (journal, analysis) = match generated {
            Ok(generated) => generated,
            Err(e) => {
                let err = SimError::generation(e);
                log::error!("{} {}: {}", uid, time, err);

                let entry = StateHistoryEntry {
                    time,
                    emotion: previous,
                    outcome: StepOutcome::Failed,
                    narrative: String::new(),
                    reasoning: err.to_string(),
                    assessment: AcademicScoreRecord::evaluation_error(time.week),
                    project: None,
                };
                phase.advance(StepPhase::Recorded);
                self.store.append(uid, &entry)?;
                return Ok(entry);
            }
        };

        phase.advance(StepPhase::Parsing);
        let update = parse_state_update(&analysis, &previous);
        phase.advance(match update.outcome {
            StepOutcome::Updated => StepPhase::Updated,
            _ => StepPhase::DegradedFallback,
        });
        agent.set_state(update.state);

        phase.advance(StepPhase::Evaluating);
        let assessment = if self.is_week_end(time) {
            match evaluate_week(self.generator, &self.datasets.exams, time.week, profile, agent.state()) {
                Ok(record) => record,
                Err(e) => {
                    log::error!("{} {}: exam evaluation failed: {:#}", uid, time, e);
                    AcademicScoreRecord::evaluation_error(time.week)
                }
            }
        } else {
            AcademicScoreRecord::no_exam(time.week)
        };

        let project = self
            .is_project_step(time)
            .then(|| self.judge_project(uid, &agent));

        let entry = StateHistoryEntry {
            time,
            emotion: update.state,
            outcome: update.outcome,
            narrative: journal,
            reasoning: update.reasoning,
            assessment,
            project,
        };

        phase.advance(StepPhase::Recorded);
        self.store.append(uid, &entry)?;
        log::info!(
            "{} {}: {} (exam {}/{}) {}",
            uid,
            time,
            entry.outcome,
            entry.assessment.score,
            entry.assessment.max_score,
            entry.emotion
        );

        Ok(entry)
    }

    fn judge_project(&self, uid: &str, agent: &StudentAgent) -> ProjectAssessment {
        let judged = agent
            .write_project_submission(self.generator)
            .and_then(|submission| evaluate_project(self.generator, &submission));

        match judged {
            Ok(assessment) => assessment,
            Err(e) => {
                log::error!("{}: project evaluation failed: {:#}", uid, e);
                ProjectAssessment {
                    score: None,
                    max_score: PROJECT_MAX_SCORE,
                    feedback: format!("{}: {:#}", AcademicScoreRecord::ERROR_TOPIC, e),
                }
            }
        }
    }

    /// Run every configured step for one persona
    pub fn run_persona(&self, uid: &str) -> Result<PersonaReport> {
        let profile = *self.datasets.traits.get(uid, self.settings.administration)?;

        let files = PersonaFiles::new(&self.students_dir, uid);
        if !files.exists() {
            return Err(SimError::missing(format!(
                "persona folder {}",
                self.students_dir.join(uid).display()
            ))
            .into());
        }

        log::info!("Simulating {} ({})", uid, profile);
        let mut steps = time_steps(&self.settings);
        if let Some(last) = self.store.last_time(uid)? {
            let total = steps.len();
            steps.retain(|time| *time > last);
            if steps.len() < total {
                log::info!(
                    "{}: history ends at {}, skipping {} recorded step(s)",
                    uid,
                    last,
                    total - steps.len()
                );
            }
        }

        let mut entries = Vec::new();
        for time in steps {
            entries.push(self.run_step(uid, &profile, time)?);
        }

        Ok(PersonaReport {
            uid: uid.to_string(),
            entries,
        })
    }

    /// Run personas one after another; a failing persona never stops the rest
    pub fn run_batch(&self, uids: &[String]) -> BatchReport {
        let mut report = BatchReport::default();

        for uid in uids {
            match self.run_persona(uid) {
                Ok(persona) => report.completed.push(persona),
                Err(e) => {
                    log::error!("Persona {} stopped: {:#}", uid, e);
                    report.failed.push((uid.clone(), format!("{:#}", e)));
                }
            }
        }

        report
    }
}
