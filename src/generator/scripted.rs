//! Scripted generator for tests
//!
//! Replays a fixed sequence of replies and failures and records every prompt.

use eyre::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::Generator;

type CallLog = Arc<Mutex<Vec<(String, String)>>>;

pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: CallLog,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.script.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    /// Shared handle to the recorded (prompt, system_prompt) pairs
    pub fn calls(&self) -> CallLog {
        Arc::clone(&self.calls)
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), system_prompt.to_string()));

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(eyre::eyre!(message)),
            None => eyre::bail!("script exhausted"),
        }
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}
