//! OpenAI chat completions backend

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Generator;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiGenerator {
    agent: ureq::Agent,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String, base_url: Option<String>, max_tokens: u32, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            agent,
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_tokens,
        }
    }

    fn request_body(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system_prompt,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        };
        serde_json::to_string(&request).context("Failed to serialize request")
    }
}

impl Generator for OpenAiGenerator {
    fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let request_body = self.request_body(prompt, system_prompt)?;

        log::debug!("POST {} ({} bytes)", url, request_body.len());

        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send(request_body.as_bytes())
            .context("Failed to call OpenAI API")?;

        let response_body = response
            .body_mut()
            .read_to_string()
            .context("Failed to read response")?;
        let response: ChatResponse = serde_json::from_str(&response_body).context("Failed to parse OpenAI response")?;

        response
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| eyre::eyre!("No message content in OpenAI response"))
    }

    fn name(&self) -> String {
        format!("openai/{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> OpenAiGenerator {
        OpenAiGenerator::new(
            "sk-test".to_string(),
            "gpt-4o-mini".to_string(),
            None,
            512,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_request_body_with_system_prompt() {
        let body = generator().request_body("hello", "be brief").unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn test_request_body_without_system_prompt() {
        let body = generator().request_body("hello", "").unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_parse_response() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Dear journal"}}]}"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("Dear journal"));
    }
}
