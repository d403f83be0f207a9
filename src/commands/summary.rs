use colored::*;
use eyre::Result;

use crate::commands::open_store;
use crate::config::Config;
use crate::generator;
use crate::summary::summarize;

pub fn run(persona: &str, config: &Config) -> Result<()> {
    let store = open_store(config);
    let generator = generator::build(&config.generator)?;

    let summary = summarize(generator.as_ref(), &store, persona)?;

    println!("{} Summary for {}", "✓".green(), persona.bold());
    println!();
    println!("{}", summary);
    println!();
    println!("  Saved to {}", store.summary_path(persona).display().to_string().dimmed());
    Ok(())
}
