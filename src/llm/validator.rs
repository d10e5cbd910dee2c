//! Strict validation of generation output against the answer schema

use serde::Deserialize;
use tracing::debug;

use crate::models::AnswerMeta;
use crate::models::RetrievedDoc;
use crate::models::Source;
use crate::models::StructuredAnswer;

/// Maximum number of actions in a valid answer
const MAX_ACTIONS: usize = 3;

/// Maximum snippet length in a cited source
const SNIPPET_MAX_CHARS: usize = 150;

/// Outcome of validating a raw provider payload
#[derive(Debug)]
pub enum Validation {
    Valid(Box<StructuredAnswer>),
    Invalid(String),
}

/// The provider-facing answer shape. All four fields are required; extra
/// fields are ignored. Source entries only require a title.
#[derive(Deserialize)]
struct ProviderAnswer {
    answer: String,
    confidence: f64,
    actions: Vec<String>,
    sources: Vec<ProviderSource>,
}

#[derive(Deserialize)]
struct ProviderSource {
    title: String,
    #[serde(default = "default_source_url")]
    url: String,
    #[serde(default)]
    snippet: String,
}

fn default_source_url() -> String {
    "#".to_string()
}

/// Validate a raw generation payload against the answer schema.
///
/// Strips surrounding code fences, parses, and requires `answer`,
/// `confidence`, `actions` and `sources` with compatible types; any parse
/// failure, missing field or wrong type yields [`Validation::Invalid`],
/// never an error. On success the answer is normalized to the caller
/// contract (confidence clamped to [0, 1], at most three actions, snippets
/// bounded) and `meta` is attached server-side from `docs` and `agent_hint`;
/// provider-supplied metadata is never trusted.
#[must_use]
pub fn validate(raw: &str, docs: &[RetrievedDoc], agent_hint: &str) -> Validation {
    let stripped = strip_code_fences(raw);

    let parsed: ProviderAnswer = match serde_json::from_str(stripped) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Generation output failed schema parse: {e}");
            return Validation::Invalid(format!("schema parse failed: {e}"));
        }
    };

    if parsed.actions.is_empty() {
        return Validation::Invalid("actions must contain 1-3 entries".to_string());
    }

    let mut actions = parsed.actions;
    actions.truncate(MAX_ACTIONS);

    let sources = parsed
        .sources
        .into_iter()
        .map(|s| Source {
            title: s.title,
            url: s.url,
            snippet: crate::truncate_chars(&s.snippet, SNIPPET_MAX_CHARS),
        })
        .collect();

    Validation::Valid(Box::new(StructuredAnswer {
        answer: parsed.answer,
        confidence: parsed.confidence.clamp(0.0, 1.0),
        actions,
        sources,
        meta: AnswerMeta {
            agent: agent_hint.to_string(),
            retrieved_ids: docs.iter().map(|d| d.id).collect(),
        },
    }))
}

/// Strip a surrounding markdown code fence (``` or ```json) if present
fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_doc() -> RetrievedDoc {
        RetrievedDoc {
            id: Uuid::nil(),
            title: "Irrigation basics".to_string(),
            content: "Check soil moisture before watering.".to_string(),
            source_url: Some("https://example.org/irrigation".to_string()),
            score: 0.9,
        }
    }

    const VALID_PAYLOAD: &str = r#"{
        "answer": "Water early in the morning.",
        "confidence": 0.8,
        "actions": ["Check soil moisture", "Water at dawn"],
        "sources": [{"title": "Irrigation basics", "url": "https://example.org", "snippet": "soil moisture"}]
    }"#;

    #[test]
    fn test_valid_payload_is_accepted() {
        let docs = vec![sample_doc()];
        match validate(VALID_PAYLOAD, &docs, "crop") {
            Validation::Valid(answer) => {
                assert_eq!(answer.answer, "Water early in the morning.");
                assert!((answer.confidence - 0.8).abs() < 1e-9);
                assert_eq!(answer.actions.len(), 2);
                assert_eq!(answer.meta.agent, "crop");
                assert_eq!(answer.meta.retrieved_ids, vec![Uuid::nil()]);
            }
            Validation::Invalid(reason) => panic!("expected valid, got: {reason}"),
        }
    }

    #[test]
    fn test_code_fenced_payload_is_accepted() {
        let fenced = format!("```json\n{VALID_PAYLOAD}\n```");
        assert!(matches!(
            validate(&fenced, &[], "general"),
            Validation::Valid(_)
        ));
    }

    #[test]
    fn test_missing_sources_is_invalid_and_deterministic() {
        let payload = r#"{"answer": "x", "confidence": 0.5, "actions": ["a"]}"#;
        for _ in 0..3 {
            assert!(matches!(
                validate(payload, &[], "general"),
                Validation::Invalid(_)
            ));
        }
    }

    #[test]
    fn test_non_json_is_invalid() {
        assert!(matches!(
            validate("I think you should water daily.", &[], "general"),
            Validation::Invalid(_)
        ));
    }

    #[test]
    fn test_wrong_confidence_type_is_invalid() {
        let payload =
            r#"{"answer": "x", "confidence": "high", "actions": ["a"], "sources": []}"#;
        assert!(matches!(
            validate(payload, &[], "general"),
            Validation::Invalid(_)
        ));
    }

    #[test]
    fn test_empty_actions_is_invalid() {
        let payload = r#"{"answer": "x", "confidence": 0.5, "actions": [], "sources": []}"#;
        assert!(matches!(
            validate(payload, &[], "general"),
            Validation::Invalid(_)
        ));
    }

    #[test]
    fn test_confidence_is_clamped_and_actions_truncated() {
        let payload = r#"{
            "answer": "x",
            "confidence": 1.7,
            "actions": ["a", "b", "c", "d", "e"],
            "sources": []
        }"#;
        match validate(payload, &[], "general") {
            Validation::Valid(answer) => {
                assert!((answer.confidence - 1.0).abs() < 1e-9);
                assert_eq!(answer.actions, vec!["a", "b", "c"]);
            }
            Validation::Invalid(reason) => panic!("expected valid, got: {reason}"),
        }
    }

    #[test]
    fn test_provider_meta_is_ignored() {
        let payload = r#"{
            "answer": "x",
            "confidence": 0.5,
            "actions": ["a"],
            "sources": [],
            "meta": {"agent": "attacker", "retrieved_ids": ["11111111-1111-1111-1111-111111111111"]}
        }"#;
        match validate(payload, &[sample_doc()], "general") {
            Validation::Valid(answer) => {
                assert_eq!(answer.meta.agent, "general");
                assert_eq!(answer.meta.retrieved_ids, vec![Uuid::nil()]);
            }
            Validation::Invalid(reason) => panic!("expected valid, got: {reason}"),
        }
    }
}
