//! Diagnose studentsim setup issues

use colored::*;
use eyre::Result;
use std::path::Path;

use crate::config::Config;
use crate::dataset::discover_personas;
use crate::generator::resolve_api_key;

pub fn run(config: &Config) -> Result<()> {
    println!("{}", "studentsim Doctor".bold());
    println!("{}", "═".repeat(50));
    println!();

    let mut issues = 0;

    // Config location
    let app_dir = Config::app_dir();
    let config_file = app_dir.join("studentsim.yaml");
    if config_file.exists() {
        println!("{} Config file: {}", "✓".green(), config_file.display());
    } else {
        println!("{} No config file at {} (using defaults)", "⚠".yellow(), config_file.display());
    }

    println!();

    // Datasets
    let paths = config.resolved_paths();
    println!("{}", "Datasets:".bold());
    for (name, path) in paths.required_files() {
        if path.is_file() {
            println!("  {} {}: {}", "✓".green(), name, path.display());
        } else {
            println!("  {} {} missing: {}", "✗".red(), name, path.display());
            issues += 1;
        }
    }

    println!();

    // Personas
    println!("{}", "Personas:".bold());
    if paths.students.is_dir() {
        match discover_personas(&paths.students) {
            Ok(personas) if personas.is_empty() => {
                println!("  {} No persona folders in {}", "✗".red(), paths.students.display());
                issues += 1;
            }
            Ok(personas) => {
                println!(
                    "  {} {} persona(s) in {}",
                    "✓".green(),
                    personas.len(),
                    paths.students.display()
                );
                println!("    {}", personas.join(", ").dimmed());
            }
            Err(e) => {
                println!("  {} Cannot scan {}: {}", "✗".red(), paths.students.display(), e);
                issues += 1;
            }
        }
    } else {
        println!("  {} Students directory missing: {}", "✗".red(), paths.students.display());
        issues += 1;
    }

    println!();

    // Output
    println!("{}", "Output:".bold());
    if paths.output.is_dir() {
        let count = count_histories(&paths.output);
        println!(
            "  {} {} ({} histories)",
            "✓".green(),
            paths.output.display(),
            count
        );
    } else {
        println!(
            "  {} {} does not exist yet (created on first run)",
            "⚠".yellow(),
            paths.output.display()
        );
    }

    println!();

    // Generator
    println!("{}", "Generator:".bold());
    println!("  provider: {:?}, model: {}", config.generator.provider, config.generator.model);
    match resolve_api_key(&config.generator.api_key_env) {
        Ok(_) => println!("  {} {} found", "✓".green(), config.generator.api_key_env),
        Err(_) => {
            println!("  {} {} not set", "✗".red(), config.generator.api_key_env);
            println!("    Export it or add it to {}", app_dir.join(".env").display().to_string().cyan());
            issues += 1;
        }
    }

    println!();

    // Summary
    println!("{}", "═".repeat(50));
    if issues == 0 {
        println!("{} All checks passed!", "✓".green().bold());
    } else {
        println!("{} {} issue(s) found", "⚠".yellow().bold(), issues);
    }

    Ok(())
}

fn count_histories(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().ends_with("_history.jsonl"))
                .count()
        })
        .unwrap_or(0)
}
