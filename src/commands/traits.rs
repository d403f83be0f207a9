use colored::*;
use eyre::{Context, Result};
use serde::Serialize;

use crate::cli::{OutputFormat, TraitsAction};
use crate::commands::open_store;
use crate::config::Config;
use crate::context::render_memory;
use crate::dataset::{Datasets, survey};
use crate::generator;
use crate::personality::survey_sim::SurveySimulator;
use crate::personality::{Administration, Trait, TraitProfile, TraitTable, score_answers};
use crate::store::StateStore;

#[derive(Serialize)]
struct ProfileView {
    uid: String,
    administration: Administration,
    profile: TraitProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    baseline: Option<TraitProfile>,
}

pub fn run(action: TraitsAction, config: &Config) -> Result<()> {
    match action {
        TraitsAction::Show {
            persona,
            administration,
            format,
        } => show(&persona, administration, OutputFormat::resolve(format), config),
        TraitsAction::Simulate { persona, format } => simulate(&persona, OutputFormat::resolve(format), config),
    }
}

fn show(persona: &str, administration: Administration, format: OutputFormat, config: &Config) -> Result<()> {
    let paths = config.resolved_paths();
    let survey = survey::load(&paths.big_five)?;
    let table = TraitTable::from_responses(&survey.responses);
    let profile = *table.get(persona, administration)?;

    print_view(
        &ProfileView {
            uid: persona.to_string(),
            administration,
            profile,
            baseline: None,
        },
        format,
    )
}

fn simulate(persona: &str, format: OutputFormat, config: &Config) -> Result<()> {
    let paths = config.resolved_paths();
    let datasets = Datasets::load(&paths).context("Failed to load datasets")?;
    let store = open_store(config);
    let generator = generator::build(&config.generator)?;

    let state = store.current(persona)?;
    let recent = store.latest(persona, config.simulation.lookback)?;
    let memory = render_memory(&recent);

    let simulator = SurveySimulator::new(
        generator.as_ref(),
        config.survey.max_attempts,
        config.survey.fallback_value,
    )?;
    let response = simulator.administer(persona, &datasets.survey_items, &state, memory.as_deref())?;
    let profile = score_answers(&response.answers)?;

    print_view(
        &ProfileView {
            uid: persona.to_string(),
            administration: Administration::Agent,
            profile,
            baseline: datasets.traits.get(persona, config.simulation.administration).ok().copied(),
        },
        format,
    )
}

fn print_view(view: &ProfileView, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(view)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(view)?),
        OutputFormat::Text => {
            println!(
                "{} {} ({})",
                "Trait profile:".bold(),
                view.uid.cyan(),
                view.administration
            );
            println!();
            for t in Trait::ALL {
                match &view.baseline {
                    Some(baseline) => println!(
                        "  {:18} {:5.1}  {}",
                        t.name(),
                        view.profile.get(t),
                        format!("(baseline {:.1})", baseline.get(t)).dimmed()
                    ),
                    None => println!("  {:18} {:5.1}", t.name(), view.profile.get(t)),
                }
            }
        }
    }

    Ok(())
}
