use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::personality::Administration;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "studentsim",
    about = "Simulate student personas over a semester with a language model",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/studentsim/logs/studentsim.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to studentsim.yaml config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the simulation loop
    Run {
        /// Persona id to simulate (repeatable; defaults to every persona folder)
        #[arg(short, long = "persona")]
        personas: Vec<String>,

        /// First week (overrides config)
        #[arg(long)]
        from: Option<u32>,

        /// Last week, inclusive (overrides config)
        #[arg(long)]
        to: Option<u32>,

        /// Simulate one step per day instead of per week
        #[arg(long)]
        daily: bool,
    },

    /// Inspect or simulate personality profiles
    Traits {
        #[command(subcommand)]
        action: TraitsAction,
    },

    /// Inspect persisted emotional state history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Generate and store a summary of a persona's history
    Summary {
        /// Persona id
        #[arg(short, long)]
        persona: String,
    },

    /// Diagnose setup issues
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum TraitsAction {
    /// Show the trait profile computed from the survey
    Show {
        /// Persona id
        #[arg(short, long)]
        persona: String,

        /// Survey administration (pre, post, agent, llm)
        #[arg(short, long, default_value = "pre")]
        administration: Administration,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(short = 'o', long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Have the persona answer the survey in character
    Simulate {
        /// Persona id
        #[arg(short, long)]
        persona: String,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(short = 'o', long, value_enum)]
        format: Option<OutputFormat>,
    },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recorded steps
    Show {
        /// Persona id
        #[arg(short, long)]
        persona: String,

        /// Only the most recent N entries
        #[arg(short = 'n', long)]
        last: Option<usize>,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(short = 'o', long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show the latest emotional state
    Current {
        /// Persona id
        #[arg(short, long)]
        persona: String,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(short = 'o', long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show the entries a step would receive as memory
    Lookback {
        /// Persona id
        #[arg(short, long)]
        persona: String,

        /// Week of the step
        #[arg(short, long)]
        week: u32,

        /// Day of the step
        #[arg(short, long)]
        day: Option<u32>,

        /// Maximum entries
        #[arg(short, long, default_value = "3")]
        limit: usize,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(short = 'o', long, value_enum)]
        format: Option<OutputFormat>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(short = 'o', long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Print where the config file is looked up
    Path,
}
