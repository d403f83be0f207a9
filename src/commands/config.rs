use colored::*;
use eyre::Result;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::Config;

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
        ConfigAction::Path => path(),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(config)?);
        }
        OutputFormat::Text => {
            let paths = config.resolved_paths();
            println!("{}", "studentsim Configuration".bold());
            println!();

            println!("{}: {}", "log_level".cyan(), config.log_level.as_filter());
            println!();

            println!("{}:", "paths".cyan());
            for (name, path) in paths.required_files() {
                println!("  {}: {}", name, path.display());
            }
            println!("  students: {}", paths.students.display());
            println!("  output: {}", paths.output.display());
            println!();

            let generator = &config.generator;
            println!("{}:", "generator".cyan());
            println!("  provider: {:?}", generator.provider);
            println!("  model: {}", generator.model);
            println!("  api_key_env: {}", generator.api_key_env);
            if let Some(base_url) = &generator.base_url {
                println!("  base_url: {}", base_url);
            }
            println!(
                "  timeout: {}s, attempts: {}, backoff: {}ms (max {}ms)",
                generator.timeout_secs, generator.max_attempts, generator.backoff_ms, generator.max_backoff_ms
            );
            println!();

            let sim = &config.simulation;
            println!("{}:", "simulation".cyan());
            println!("  weeks: {}-{}", sim.first_week, sim.last_week);
            println!("  granularity: {:?} ({} days/week)", sim.granularity, sim.days_per_week);
            println!("  project_week: {}", sim.project_week);
            println!("  lookback: {}", sim.lookback);
            println!("  use_summary: {}", sim.use_summary);
            println!("  administration: {}", sim.administration);
            println!();

            println!("{}:", "survey".cyan());
            println!("  max_attempts: {}", config.survey.max_attempts);
            println!("  fallback_value: {}", config.survey.fallback_value);
        }
    }

    Ok(())
}

fn path() -> Result<()> {
    if let Ok(env_path) = std::env::var("STUDENTSIM_CONFIG") {
        println!("{} (STUDENTSIM_CONFIG)", env_path);
    }
    println!("{}", Config::app_dir().join("studentsim.yaml").display());
    println!("{}", "./studentsim.yaml".dimmed());
    Ok(())
}
