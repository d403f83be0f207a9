use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::personality::Administration;

/// Main studentsim configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    pub paths: PathsConfig,
    pub generator: GeneratorConfig,
    pub simulation: SimulationConfig,
    pub survey: SurveyConfig,
}

/// Log verbosity
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

/// Input datasets and output location
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Personality survey CSV
    pub big_five: PathBuf,
    /// Class enrolment CSV (uid, class, class, ...)
    pub class_csv: PathBuf,
    /// Class details JSON keyed by class id
    pub class_info: PathBuf,
    /// Exam question CSV
    pub exams: PathBuf,
    /// Deadline count CSV
    pub deadlines: PathBuf,
    /// Directory of per-persona folders (u00..u59)
    pub students: PathBuf,
    /// Where histories, snapshots and summaries are written
    pub output: PathBuf,
}

/// Generation backend provider
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(alias = "open_ai")]
    OpenAi,
    Anthropic,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub provider: Provider,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Override the provider's API base URL
    pub base_url: Option<String>,
    pub max_tokens: u32,
    /// Per-call timeout
    pub timeout_secs: u64,
    /// Total attempts per call, including the first
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
}

/// Step granularity
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Week,
    Day,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub first_week: u32,
    pub last_week: u32,
    pub granularity: Granularity,
    pub days_per_week: u32,
    /// Week whose step also evaluates the final project
    pub project_week: u32,
    /// Prior entries supplied as lookback memory (0 disables)
    pub lookback: usize,
    /// Prepend the persisted history summary to narrative prompts
    pub use_summary: bool,
    /// Survey administration whose trait profile drives the persona
    pub administration: Administration,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Attempts per simulated survey item before falling back
    pub max_attempts: u32,
    /// Likert value used when no attempt produces a recognisable answer
    pub fallback_value: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            paths: PathsConfig::default(),
            generator: GeneratorConfig::default(),
            simulation: SimulationConfig::default(),
            survey: SurveyConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            big_five: PathBuf::from("./dataset/BigFive.csv"),
            class_csv: PathBuf::from("./dataset/education/class.csv"),
            class_info: PathBuf::from("./dataset/education/class_info.json"),
            exams: PathBuf::from("./dataset/education/lab_assignment.csv"),
            deadlines: PathBuf::from("./dataset/education/deadlines.csv"),
            students: PathBuf::from("./student_info"),
            output: PathBuf::from("./output"),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: None,
            max_tokens: 2048,
            timeout_secs: 120,
            max_attempts: 3,
            backoff_ms: 2000,
            max_backoff_ms: 30_000,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            first_week: 1,
            last_week: 10,
            granularity: Granularity::Week,
            days_per_week: 7,
            project_week: 10,
            lookback: 3,
            use_summary: false,
            administration: Administration::Pre,
        }
    }
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            fallback_value: 3,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Check STUDENTSIM_CONFIG env var
        if let Ok(env_path) = std::env::var("STUDENTSIM_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from STUDENTSIM_CONFIG: {}", e);
                    }
                }
            }
        }

        // Try STUDENTSIM_DIR/studentsim.yaml, then ~/.config/studentsim/studentsim.yaml
        let app_config = Self::app_dir().join("studentsim.yaml");
        if app_config.exists() {
            match Self::load_from_file(&app_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", app_config.display(), e);
                }
            }
        }

        // Try ./studentsim.yaml (for development)
        let local_config = PathBuf::from("studentsim.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        let fallback = self.survey.fallback_value;
        if !(1..=5).contains(&fallback) {
            eyre::bail!("survey.fallback_value must be a Likert value 1-5, got {}", fallback);
        }
        if self.simulation.days_per_week == 0 {
            eyre::bail!("simulation.days_per_week must be at least 1");
        }
        Ok(())
    }

    /// Get the application directory (config file, .env)
    pub fn app_dir() -> PathBuf {
        std::env::var("STUDENTSIM_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("studentsim"))
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }

    /// Paths with `~` and env vars expanded
    pub fn resolved_paths(&self) -> PathsConfig {
        PathsConfig {
            big_five: Self::expand_path(&self.paths.big_five),
            class_csv: Self::expand_path(&self.paths.class_csv),
            class_info: Self::expand_path(&self.paths.class_info),
            exams: Self::expand_path(&self.paths.exams),
            deadlines: Self::expand_path(&self.paths.deadlines),
            students: Self::expand_path(&self.paths.students),
            output: Self::expand_path(&self.paths.output),
        }
    }
}

impl PathsConfig {
    /// Dataset files every persona run requires
    pub fn required_files(&self) -> Vec<(&'static str, &Path)> {
        vec![
            ("big_five", self.big_five.as_path()),
            ("class_csv", self.class_csv.as_path()),
            ("class_info", self.class_info.as_path()),
            ("exams", self.exams.as_path()),
            ("deadlines", self.deadlines.as_path()),
        ]
    }
}
