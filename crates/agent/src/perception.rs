//! Fact extraction: one oracle call that turns the raw request into
//! structured facts before the loop starts.

use crate::oracle::Oracle;
use ironloop_core::memory::Fact;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const UNKNOWN_TASK: &str = "Unknown task";

/// Structured intent pulled out of the user's request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFacts {
    pub task: String,
    pub entities: Vec<String>,
    pub characteristics: Vec<(String, String)>,
    pub preferences: Vec<(String, String)>,
    pub requirements: Vec<String>,
}

impl Default for ExtractedFacts {
    fn default() -> Self {
        Self {
            task: UNKNOWN_TASK.into(),
            entities: Vec::new(),
            characteristics: Vec::new(),
            preferences: Vec::new(),
            requirements: Vec::new(),
        }
    }
}

impl ExtractedFacts {
    /// The facts worth remembering, in the order they are stored.
    pub fn to_facts(&self) -> Vec<Fact> {
        let entities = self.entities.iter().map(|e| Fact::entity(e));
        let characteristics = self
            .characteristics
            .iter()
            .map(|(k, v)| Fact::characteristic(k, v));
        let preferences = self.preferences.iter().map(|(k, v)| Fact::preference(k, v));
        entities.chain(characteristics).chain(preferences).collect()
    }
}

/// The result of perceiving one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    pub facts: ExtractedFacts,
    pub processed_query: String,
    pub confidence: f32,
}

impl Perception {
    /// A perception that extracted nothing: the query passes through as-is.
    pub fn unextracted(query: &str) -> Self {
        Self {
            facts: ExtractedFacts::default(),
            processed_query: query.to_string(),
            confidence: 0.1,
        }
    }
}

pub struct FactExtractor {
    oracle: Arc<Oracle>,
}

impl FactExtractor {
    pub fn new(oracle: Arc<Oracle>) -> Self {
        Self { oracle }
    }

    /// Extract facts from `query`. Never fails: if the oracle is unavailable
    /// the query passes through with an unknown task.
    pub async fn extract(&self, query: &str) -> Perception {
        match self.oracle.generate(&extraction_prompt(query)).await {
            Ok(reply) => {
                let perception = parse_extraction(&reply, query);
                debug!(
                    task = %perception.facts.task,
                    entities = perception.facts.entities.len(),
                    "Extracted facts"
                );
                perception
            }
            Err(e) => {
                warn!(error = %e, "Fact extraction failed, continuing without facts");
                Perception::unextracted(query)
            }
        }
    }
}

fn extraction_prompt(query: &str) -> String {
    format!(
        "Extract important facts from the user input.\n\
         \n\
         User Input: {query}\n\
         \n\
         Identify the main task, the entities mentioned (people, places, things, \
         email addresses), the user's characteristics (communication style, tone), \
         the user's preferences, and any specific requirements.\n\
         \n\
         Format your response EXACTLY as:\n\
         TASK: <main task description>\n\
         ENTITIES: <comma-separated list, or None>\n\
         CHARACTERISTICS: <key:value pairs separated by commas, or None>\n\
         PREFERENCES: <key:value pairs separated by commas, or None>\n\
         REQUIREMENTS: <comma-separated list, or None>\n\
         PROCESSED_QUERY: <cleaned and structured version of the query>"
    )
}

/// Parse the labelled lines of an extraction reply.
///
/// Unlabelled lines are ignored. A section whose value is `None` is empty.
fn parse_extraction(reply: &str, query: &str) -> Perception {
    let mut facts = ExtractedFacts {
        task: String::new(),
        ..ExtractedFacts::default()
    };
    let mut processed_query = None;

    for line in reply.lines().map(str::trim) {
        if let Some(value) = line.strip_prefix("TASK:") {
            facts.task = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("ENTITIES:") {
            facts.entities = split_list(value);
        } else if let Some(value) = line.strip_prefix("CHARACTERISTICS:") {
            facts.characteristics = split_pairs(value);
        } else if let Some(value) = line.strip_prefix("PREFERENCES:") {
            facts.preferences = split_pairs(value);
        } else if let Some(value) = line.strip_prefix("REQUIREMENTS:") {
            facts.requirements = split_list(value);
        } else if let Some(value) = line.strip_prefix("PROCESSED_QUERY:") {
            let value = value.trim();
            if !value.is_empty() {
                processed_query = Some(value.to_string());
            }
        }
    }

    if facts.task.is_empty() {
        facts.task = UNKNOWN_TASK.into();
    }

    Perception {
        facts,
        processed_query: processed_query.unwrap_or_else(|| query.to_string()),
        confidence: 0.8,
    }
}

fn section_body(value: &str) -> Option<&str> {
    let value = value.trim();
    let value = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value)
        .trim();
    (!value.is_empty() && value != "None").then_some(value)
}

fn split_list(value: &str) -> Vec<String> {
    section_body(value)
        .map(|body| {
            body.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// `k:v, k2:v2` pairs. A repeated key keeps its latest value.
fn split_pairs(value: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let Some(body) = section_body(value) else {
        return pairs;
    };

    for (key, val) in body.split(',').filter_map(|pair| pair.split_once(':')) {
        let (key, val) = (key.trim().to_string(), val.trim().to_string());
        match pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = val,
            None => pairs.push((key, val)),
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingOracle, ScriptedOracle};

    const REPLY: &str = "TASK: Compute the exponential sum of INDIA\n\
        ENTITIES: INDIA, alice@example.com\n\
        CHARACTERISTICS: style:funny, tone:comedy\n\
        PREFERENCES: color:red\n\
        REQUIREMENTS: None\n\
        PROCESSED_QUERY: sum of exp of ASCII values of INDIA";

    #[test]
    fn parses_all_sections() {
        let perception = parse_extraction(REPLY, "raw");
        let facts = &perception.facts;
        assert_eq!(facts.task, "Compute the exponential sum of INDIA");
        assert_eq!(facts.entities, vec!["INDIA", "alice@example.com"]);
        assert_eq!(
            facts.characteristics,
            vec![
                ("style".to_string(), "funny".to_string()),
                ("tone".to_string(), "comedy".to_string())
            ]
        );
        assert_eq!(facts.preferences, vec![("color".to_string(), "red".to_string())]);
        assert!(facts.requirements.is_empty());
        assert_eq!(
            perception.processed_query,
            "sum of exp of ASCII values of INDIA"
        );
    }

    #[test]
    fn missing_sections_fall_back() {
        let perception = parse_extraction("nothing useful here", "what is 2+2");
        assert_eq!(perception.facts.task, "Unknown task");
        assert_eq!(perception.processed_query, "what is 2+2");
        assert!(perception.facts.to_facts().is_empty());
    }

    #[test]
    fn bracketed_and_malformed_pairs() {
        assert_eq!(split_list("[a, b,  , c]"), vec!["a", "b", "c"]);
        assert_eq!(split_list(" None "), Vec::<String>::new());
        assert_eq!(
            split_pairs("[format:informal, nonsense, url:http://x]"),
            vec![
                ("format".to_string(), "informal".to_string()),
                ("url".to_string(), "http://x".to_string())
            ]
        );
        assert_eq!(
            split_pairs("color:red, color:blue"),
            vec![("color".to_string(), "blue".to_string())]
        );
    }

    #[test]
    fn facts_are_rendered_for_storage() {
        let facts = parse_extraction(REPLY, "raw").facts.to_facts();
        let contents: Vec<_> = facts.iter().map(|f| f.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "Entity mentioned: INDIA",
                "Entity mentioned: alice@example.com",
                "User characteristic: style = funny",
                "User characteristic: tone = comedy",
                "User preference: color = red",
            ]
        );
    }

    #[tokio::test]
    async fn extract_uses_the_oracle() {
        let provider = Arc::new(ScriptedOracle::new([REPLY]));
        let extractor = FactExtractor::new(Arc::new(Oracle::new(provider.clone(), "m")));

        let perception = extractor.extract("what is INDIA's exponential sum?").await;
        assert_eq!(perception.facts.entities.len(), 2);
        assert!(provider.prompts()[0].contains("User Input: what is INDIA's exponential sum?"));
    }

    #[tokio::test]
    async fn oracle_failure_passes_query_through() {
        let extractor = FactExtractor::new(Arc::new(Oracle::new(Arc::new(FailingOracle), "m")));
        let perception = extractor.extract("add 5 and 3").await;
        assert_eq!(perception, Perception::unextracted("add 5 and 3"));
    }
}
