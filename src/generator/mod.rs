//! Generative text capability
//!
//! Every language-model call in the simulation goes through [`Generator`].
//! Calls are stateless: the full context is supplied in each prompt.

use eyre::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::config::{Config, GeneratorConfig, Provider};

pub mod anthropic;
pub mod openai;
pub mod reliable;
#[cfg(test)]
pub mod scripted;

pub use reliable::{ReliableGenerator, RetryPolicy};

/// A text generation backend
pub trait Generator: Send + Sync {
    /// Generate a completion for `prompt` under an optional system prompt
    fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String>;

    /// Human-readable backend name for logs
    fn name(&self) -> String;
}

/// Build the configured backend wrapped in the timeout/retry policy
pub fn build(config: &GeneratorConfig) -> Result<Box<dyn Generator>> {
    let api_key = resolve_api_key(&config.api_key_env)?;
    let timeout = std::time::Duration::from_secs(config.timeout_secs);

    let backend: Box<dyn Generator> = match config.provider {
        Provider::OpenAi => Box::new(openai::OpenAiGenerator::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            config.max_tokens,
            timeout,
        )),
        Provider::Anthropic => Box::new(anthropic::AnthropicGenerator::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            config.max_tokens,
            timeout,
        )),
    };

    log::info!(
        "Using generator {} (timeout {}s, {} attempts)",
        backend.name(),
        config.timeout_secs,
        config.max_attempts
    );

    Ok(Box::new(ReliableGenerator::new(backend, RetryPolicy::from_config(config))))
}

/// Look up an API key in the environment, then in `.env` files
pub fn resolve_api_key(env_var: &str) -> Result<String> {
    if let Ok(key) = std::env::var(env_var)
        && !key.trim().is_empty()
    {
        return Ok(key);
    }

    for env_file in env_file_candidates() {
        if !env_file.exists() {
            continue;
        }
        let content = fs::read_to_string(&env_file).context("Failed to read .env file")?;
        if let Some(value) = find_env_value(&content, env_var) {
            log::debug!("Loaded {} from {}", env_var, env_file.display());
            return Ok(value);
        }
    }

    eyre::bail!(
        "Missing API key: {} not found in environment or .env (checked ./.env and {})",
        env_var,
        Config::app_dir().join(".env").display()
    )
}

fn env_file_candidates() -> Vec<PathBuf> {
    vec![PathBuf::from(".env"), Config::app_dir().join(".env")]
}

fn find_env_value(content: &str, env_var: &str) -> Option<String> {
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') || line.is_empty() {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, value)) = line.split_once('=')
            && key.trim() == env_var
        {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            return Some(value.to_string());
        }
    }
    None
}
