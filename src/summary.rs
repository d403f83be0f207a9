//! History summary artifact

use eyre::Result;

use crate::generator::Generator;
use crate::model::StateHistoryEntry;
use crate::store::StateStore;

const SUMMARY_SYSTEM_PROMPT: &str = "You summarize a university student's semester from their journal entries \
and emotional state readings. Write in the first person, as the student. Keep it under 250 words and mention \
how energy, stress, and social life changed over time.";

fn history_prompt(entries: &[StateHistoryEntry]) -> String {
    let mut prompt = String::from("Here is my semester so far:\n");
    for entry in entries {
        prompt.push_str(&format!(
            "\n[{}] {} ({})\n{}\n",
            entry.time,
            entry.emotion,
            entry.outcome,
            entry.narrative.trim()
        ));
    }
    prompt.push_str("\nSummarize how my semester has gone.");
    prompt
}

/// Summarize a persona's history and store the result
pub fn summarize(generator: &dyn Generator, store: &dyn StateStore, uid: &str) -> Result<String> {
    let entries = store.entries(uid)?;
    if entries.is_empty() {
        eyre::bail!("No history recorded for {}", uid);
    }

    log::info!("Summarizing {} entries for {}", entries.len(), uid);
    let summary = generator.generate(&history_prompt(&entries), SUMMARY_SYSTEM_PROMPT)?;
    store.save_summary(uid, summary.trim())?;
    Ok(summary.trim().to_string())
}
