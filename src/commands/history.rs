use colored::*;
use eyre::{Context, Result};

use crate::cli::{HistoryAction, OutputFormat};
use crate::commands::open_store;
use crate::config::Config;
use crate::model::{EmotionalState, StateHistoryEntry, StepOutcome};
use crate::store::StateStore;

pub fn run(action: HistoryAction, config: &Config) -> Result<()> {
    let store = open_store(config);

    match action {
        HistoryAction::Show { persona, last, format } => show(&store, &persona, last, OutputFormat::resolve(format)),
        HistoryAction::Current { persona, format } => current(&store, &persona, OutputFormat::resolve(format)),
        HistoryAction::Lookback {
            persona,
            week,
            day,
            limit,
            format,
        } => {
            let entries = store
                .history_before(&persona, week, day, limit)
                .with_context(|| format!("Failed to read history for {}", persona))?;
            print_entries(&persona, &entries, OutputFormat::resolve(format))
        }
    }
}

fn show(store: &dyn StateStore, persona: &str, last: Option<usize>, format: OutputFormat) -> Result<()> {
    let mut entries = store
        .entries(persona)
        .with_context(|| format!("Failed to read history for {}", persona))?;

    if let Some(n) = last {
        let skip = entries.len().saturating_sub(n);
        entries = entries.split_off(skip);
    }

    print_entries(persona, &entries, format)
}

fn current(store: &dyn StateStore, persona: &str, format: OutputFormat) -> Result<()> {
    let entries = store
        .entries(persona)
        .with_context(|| format!("Failed to read history for {}", persona))?;
    let state = entries.last().map(|e| e.emotion).unwrap_or_default();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&state)?),
        OutputFormat::Text => {
            match entries.last() {
                Some(entry) => println!("{} {} as of {}", "→".blue(), persona.bold(), entry.time),
                None => println!("{} {} has no history; default state", "⚠".yellow(), persona.bold()),
            }
            print_state(&state);
        }
    }

    Ok(())
}

fn print_state(state: &EmotionalState) {
    let values = [
        state.stamina,
        state.knowledge,
        state.stress,
        state.happy,
        state.sleep,
        state.social,
    ];
    for (name, value) in EmotionalState::FIELDS.iter().zip(values) {
        println!("  {:10} {}", name.cyan(), value);
    }
}

fn print_entries(persona: &str, entries: &[StateHistoryEntry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(entries)?),
        OutputFormat::Text => {
            println!("{} History for {} ({} entries):", "📋".blue(), persona.bold(), entries.len());
            println!();

            if entries.is_empty() {
                println!("  {}", "(no history yet)".dimmed());
            }
            for entry in entries {
                print_entry_summary(entry);
            }
        }
    }

    Ok(())
}

fn print_entry_summary(entry: &StateHistoryEntry) {
    let outcome = match entry.outcome {
        StepOutcome::Updated => entry.outcome.to_string().green(),
        StepOutcome::Fallback => entry.outcome.to_string().yellow(),
        StepOutcome::Failed => entry.outcome.to_string().red(),
    };

    println!("  {:16} {:9} {}", entry.time.to_string().cyan(), outcome, entry.emotion);
    println!(
        "    exam: {}/{} ({}, {}/{} correct)",
        entry.assessment.score,
        entry.assessment.max_score,
        entry.assessment.topic,
        entry.assessment.correct_answers,
        entry.assessment.total_questions
    );
    if let Some(project) = &entry.project {
        let score = project
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unscored".to_string());
        println!("    project: {}/{}", score, project.max_score);
    }
}
