//! Big Five trait profiles
//!
//! Profiles are computed once per (persona, administration) from survey
//! answers and never change afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::SimError;

pub mod scoring;
pub mod survey_sim;

pub use scoring::{SurveyResponse, score_answers};

/// Which survey administration a profile comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Administration {
    /// Baseline survey taken before the semester
    Pre,
    /// Survey taken after the semester
    Post,
    /// Simulated by the persona agent
    Agent,
    /// Simulated by a bare language model
    Llm,
}

impl fmt::Display for Administration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Administration::Pre => "pre",
            Administration::Post => "post",
            Administration::Agent => "agent",
            Administration::Llm => "llm",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Administration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pre" => Ok(Administration::Pre),
            "post" => Ok(Administration::Post),
            "agent" => Ok(Administration::Agent),
            "llm" => Ok(Administration::Llm),
            _ => Err(format!("Unknown survey administration: {}", s)),
        }
    }
}

/// The five personality dimensions, in scoring order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trait {
    Extraversion,
    Agreeableness,
    Conscientiousness,
    Neuroticism,
    Openness,
}

impl Trait {
    pub const ALL: [Trait; 5] = [
        Trait::Extraversion,
        Trait::Agreeableness,
        Trait::Conscientiousness,
        Trait::Neuroticism,
        Trait::Openness,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Trait::Extraversion => "Extraversion",
            Trait::Agreeableness => "Agreeableness",
            Trait::Conscientiousness => "Conscientiousness",
            Trait::Neuroticism => "Neuroticism",
            Trait::Openness => "Openness",
        }
    }
}

/// Five trait scores on a 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitProfile {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

impl TraitProfile {
    pub fn get(&self, t: Trait) -> f64 {
        match t {
            Trait::Openness => self.openness,
            Trait::Conscientiousness => self.conscientiousness,
            Trait::Extraversion => self.extraversion,
            Trait::Agreeableness => self.agreeableness,
            Trait::Neuroticism => self.neuroticism,
        }
    }

    /// Multi-line block for system prompts
    pub fn prompt_block(&self) -> String {
        format!(
            "- Openness: {:.1}\n- Conscientiousness: {:.1}\n- Extraversion: {:.1}\n- Agreeableness: {:.1}\n- Neuroticism: {:.1}",
            self.openness, self.conscientiousness, self.extraversion, self.agreeableness, self.neuroticism
        )
    }
}

impl fmt::Display for TraitProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Openness={:.1}, Conscientiousness={:.1}, Extraversion={:.1}, Agreeableness={:.1}, Neuroticism={:.1}",
            self.openness, self.conscientiousness, self.extraversion, self.agreeableness, self.neuroticism
        )
    }
}

/// Computed profiles keyed by persona and administration
#[derive(Debug, Default)]
pub struct TraitTable {
    profiles: HashMap<(String, Administration), TraitProfile>,
}

impl TraitTable {
    /// Score every response; rows that cannot be scored are skipped with a warning
    pub fn from_responses(responses: &[SurveyResponse]) -> Self {
        let mut profiles = HashMap::new();

        for response in responses {
            let key = (response.uid.clone(), response.administration);
            if profiles.contains_key(&key) {
                log::warn!(
                    "Duplicate survey row for {} ({}); keeping the first",
                    response.uid,
                    response.administration
                );
                continue;
            }

            match score_answers(&response.answers) {
                Ok(profile) => {
                    profiles.insert(key, profile);
                }
                Err(e) => {
                    log::warn!("Cannot score {} ({}): {}", response.uid, response.administration, e);
                }
            }
        }

        log::info!("Computed {} trait profiles", profiles.len());
        Self { profiles }
    }

    /// Look up a profile; absence means the persona cannot be simulated
    pub fn get(&self, uid: &str, administration: Administration) -> Result<&TraitProfile, SimError> {
        self.profiles
            .get(&(uid.to_string(), administration))
            .ok_or_else(|| SimError::missing(format!("no trait profile for uid={}, type={}", uid, administration)))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn response(uid: &str, administration: Administration, value: u8) -> SurveyResponse {
        SurveyResponse {
            uid: uid.to_string(),
            administration,
            answers: (1..=44).map(|n| (n, value)).collect::<BTreeMap<u8, u8>>(),
        }
    }

    #[test]
    fn test_administration_from_str() {
        assert_eq!("pre".parse::<Administration>().unwrap(), Administration::Pre);
        assert_eq!("AGENT".parse::<Administration>().unwrap(), Administration::Agent);
        assert!("later".parse::<Administration>().is_err());
    }

    #[test]
    fn test_table_lookup() {
        let table = TraitTable::from_responses(&[
            response("u01", Administration::Pre, 3),
            response("u01", Administration::Agent, 5),
        ]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("u01", Administration::Pre).unwrap().openness, 60.0);
    }

    #[test]
    fn test_table_missing_persona_signals() {
        let table = TraitTable::from_responses(&[response("u01", Administration::Pre, 3)]);

        let err = table.get("u02", Administration::Pre).unwrap_err();
        assert!(matches!(err, SimError::MissingInputData(_)));
        assert!(table.get("u01", Administration::Post).is_err());
    }

    #[test]
    fn test_table_keeps_first_duplicate() {
        let table = TraitTable::from_responses(&[
            response("u01", Administration::Pre, 1),
            response("u01", Administration::Pre, 5),
        ]);

        assert_eq!(table.len(), 1);
        // All-ones row: eight plain openness items score 1, two reverse-coded score 5
        let openness = table.get("u01", Administration::Pre).unwrap().openness;
        assert_eq!(openness, 36.0);
    }

    #[test]
    fn test_table_skips_unscorable_rows() {
        let empty = SurveyResponse {
            uid: "u03".to_string(),
            administration: Administration::Pre,
            answers: BTreeMap::new(),
        };
        let table = TraitTable::from_responses(&[empty]);
        assert!(table.get("u03", Administration::Pre).is_err());
    }

    #[test]
    fn test_prompt_block_format() {
        let profile = TraitProfile {
            openness: 62.25,
            conscientiousness: 50.0,
            extraversion: 40.0,
            agreeableness: 70.0,
            neuroticism: 30.0,
        };
        let block = profile.prompt_block();
        assert!(block.contains("- Openness: 62.2") || block.contains("- Openness: 62.3"));
        assert!(block.contains("- Neuroticism: 30.0"));
    }
}
