//! Anthropic messages backend

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Generator;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicGenerator {
    agent: ureq::Agent,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl AnthropicGenerator {
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
}

impl Generator for AnthropicGenerator {
    fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: Some(system_prompt).filter(|s| !s.is_empty()),
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        let request_body = serde_json::to_string(&request).context("Failed to serialize request")?;

        log::debug!("POST {} ({} bytes)", url, request_body.len());

        let mut response = self
            .agent
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .send(request_body.as_bytes())
            .context("Failed to call Anthropic API")?;

        let response_body = response
            .body_mut()
            .read_to_string()
            .context("Failed to read response")?;
        let response: MessagesResponse =
            serde_json::from_str(&response_body).context("Failed to parse Anthropic response")?;

        let text: Vec<String> = response
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();

        if text.is_empty() {
            eyre::bail!("No text content in Anthropic response");
        }
        Ok(text.join(""))
    }

    fn name(&self) -> String {
        format!("anthropic/{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_empty_system() {
        let request = MessagesRequest {
            model: "claude",
            max_tokens: 100,
            system: None,
            messages: vec![Message {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_parse_response_text_blocks() {
        let raw = r#"{"content":[{"type":"text","text":"Week "},{"type":"text","text":"one"}]}"#;
        let response: MessagesResponse = serde_json::from_str(raw).unwrap();
        let text: String = response.content.into_iter().filter_map(|b| b.text).collect();
        assert_eq!(text, "Week one");
    }
}
