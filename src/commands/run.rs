use colored::*;
use eyre::{Context, Result};

use crate::commands::open_store;
use crate::config::{Config, Granularity};
use crate::dataset::{self, Datasets};
use crate::generator;
use crate::model::StepOutcome;
use crate::simulation::{Simulation, time_steps};

pub fn run(
    personas: Vec<String>,
    from: Option<u32>,
    to: Option<u32>,
    daily: bool,
    quiet: bool,
    config: &Config,
) -> Result<()> {
    let paths = config.resolved_paths();

    let mut settings = config.simulation.clone();
    if let Some(first) = from {
        settings.first_week = first;
    }
    if let Some(last) = to {
        settings.last_week = last;
    }
    if daily {
        settings.granularity = Granularity::Day;
    }
    if settings.first_week > settings.last_week {
        eyre::bail!(
            "Invalid week range: {} is after {}",
            settings.first_week,
            settings.last_week
        );
    }

    let datasets = Datasets::load(&paths).context("Failed to load datasets")?;

    let personas = if personas.is_empty() {
        dataset::discover_personas(&paths.students)?
    } else {
        personas
    };
    if personas.is_empty() {
        eyre::bail!("No persona folders (u00-u59) found in {}", paths.students.display());
    }

    let generator = generator::build(&config.generator)?;
    let store = open_store(config);
    let steps = time_steps(&settings).len();

    if !quiet {
        println!(
            "{} Simulating {} persona(s), weeks {}-{} ({} steps each)",
            "→".blue(),
            personas.len(),
            settings.first_week,
            settings.last_week,
            steps
        );
    }

    let simulation = Simulation::new(generator.as_ref(), &store, &datasets, &paths.students, settings);
    let report = simulation.run_batch(&personas);

    if !quiet {
        for persona in &report.completed {
            println!(
                "  {} {}: {} steps ({} updated, {} fallback, {} failed)",
                "✓".green(),
                persona.uid.bold(),
                persona.entries.len(),
                persona.count(StepOutcome::Updated),
                persona.count(StepOutcome::Fallback),
                persona.count(StepOutcome::Failed)
            );
        }
    }
    for (uid, reason) in &report.failed {
        eprintln!("  {} {}: {}", "✗".red(), uid.bold(), reason);
    }

    if report.completed.is_empty() {
        eyre::bail!("No persona completed");
    }

    if !quiet {
        println!("{} Results written to {}", "✓".green(), paths.output.display());
    }
    Ok(())
}
