//! Deterministic rule-based answer synthesis
//!
//! Used whenever no documents were retrieved, generation failed, or the
//! generated payload did not validate. Every answer here is conservative and
//! non-prescriptive: treatment and chemical decisions are always deferred to
//! a human expert, and no dosage text is ever composed, even from retrieved
//! content.

use crate::models::AnswerMeta;
use crate::models::RetrievedDoc;
use crate::models::Source;
use crate::models::StructuredAnswer;
use crate::NO_ANSWER_SENTINEL;

/// Maximum snippet length in a cited source
const SNIPPET_MAX_CHARS: usize = 150;

/// How much of each top snippet feeds the generic answer
const GENERIC_SNIPPET_CHARS: usize = 200;

/// Synthesize an answer without the generation provider. Total and
/// side-effect-free: the same inputs always produce the same answer.
///
/// Zero documents yield the fixed "I don't know" sentinel at zero
/// confidence. Otherwise the question is classified into keyword buckets,
/// first match wins: irrigation, pest management, fertilizer, then a generic
/// answer built from the top retrieved snippets.
#[must_use]
pub fn synthesize(question: &str, docs: &[RetrievedDoc], agent_hint: &str) -> StructuredAnswer {
    let meta = AnswerMeta {
        agent: agent_hint.to_string(),
        retrieved_ids: docs.iter().map(|d| d.id).collect(),
    };

    if docs.is_empty() {
        return StructuredAnswer {
            answer: NO_ANSWER_SENTINEL.to_string(),
            confidence: 0.0,
            actions: vec!["Ask a local agricultural expert".to_string()],
            sources: Vec::new(),
            meta,
        };
    }

    let question_lower = question.to_lowercase();
    let matches_any = |keywords: &[&str]| keywords.iter().any(|k| question_lower.contains(k));

    let (answer, actions, confidence) = if matches_any(&["water", "irrigat", "rain"]) {
        (
            "Check soil moisture at 2-3 inch depth before watering.".to_string(),
            vec![
                "Check soil moisture".to_string(),
                "Monitor weather forecast".to_string(),
                "Water early morning if needed".to_string(),
            ],
            0.7,
        )
    } else if matches_any(&["pest", "disease", "bug"]) {
        (
            "Consider Integrated Pest Management (IPM) approaches and consult local experts."
                .to_string(),
            vec![
                "Remove affected plant parts".to_string(),
                "Use neem-based treatments".to_string(),
                "Consult KVK expert".to_string(),
            ],
            0.5,
        )
    } else if matches_any(&["fertilizer", "nutrient"]) {
        (
            "Conduct a soil test first, then apply balanced fertilizers as recommended."
                .to_string(),
            vec![
                "Get a soil test done".to_string(),
                "Apply as the soil test report recommends".to_string(),
                "Consult local extension for product choice".to_string(),
            ],
            0.6,
        )
    } else {
        // No bucket matched: compose from the top retrieved snippets, kept
        // short and closed with a consult-an-expert deferral.
        let combined = docs
            .iter()
            .take(2)
            .map(|d| crate::truncate_chars(&d.content, GENERIC_SNIPPET_CHARS))
            .collect::<Vec<_>>()
            .join(" ");
        (
            format!(
                "{}... Please consult local agricultural experts for specific guidance.",
                crate::truncate_chars(&combined, 100)
            ),
            vec![
                "Consult an agricultural extension officer".to_string(),
                "Visit the nearest KVK".to_string(),
            ],
            0.4,
        )
    };

    StructuredAnswer {
        answer,
        confidence,
        actions,
        sources: format_sources(docs),
        meta,
    }
}

fn format_sources(docs: &[RetrievedDoc]) -> Vec<Source> {
    docs.iter()
        .map(|doc| Source {
            title: doc.title.clone(),
            url: doc.source_url.clone().unwrap_or_else(|| "#".to_string()),
            snippet: crate::truncate_chars(&doc.content, SNIPPET_MAX_CHARS),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn doc(title: &str, content: &str) -> RetrievedDoc {
        RetrievedDoc {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            source_url: Some(format!("https://example.org/{title}")),
            score: 0.8,
        }
    }

    #[test]
    fn test_no_docs_yields_sentinel_at_zero_confidence() {
        let answer = synthesize("how do I grow rice?", &[], "general");
        assert_eq!(answer.answer, NO_ANSWER_SENTINEL);
        assert!((answer.confidence - 0.0).abs() < f64::EPSILON);
        assert_eq!(answer.actions.len(), 1);
        assert!(answer.sources.is_empty());
        assert!(answer.meta.retrieved_ids.is_empty());
    }

    #[test]
    fn test_pest_bucket() {
        let docs = vec![doc("IPM guide", "Integrated pest management basics.")];
        let answer = synthesize("pest damage on leaves", &docs, "crop");
        assert!((answer.confidence - 0.5).abs() < f64::EPSILON);
        assert!(answer.actions.iter().any(|a| a.contains("KVK")));
        assert_eq!(answer.sources.len(), 1);
    }

    #[test]
    fn test_irrigation_bucket_wins_over_pest() {
        // First match wins in priority order, water before pest.
        let docs = vec![doc("Guide", "content")];
        let answer = synthesize("should I water plants with pest damage?", &docs, "general");
        assert!((answer.confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fertilizer_bucket() {
        let docs = vec![doc("Soil guide", "Soil testing practices.")];
        let answer = synthesize("which fertilizer for maize?", &docs, "general");
        assert!((answer.confidence - 0.6).abs() < f64::EPSILON);
        assert!(answer.answer.contains("soil test"));
    }

    #[test]
    fn test_generic_bucket_composes_from_snippets() {
        let docs = vec![doc("Wheat guide", "Wheat grows best in well-drained loam soils.")];
        let answer = synthesize("tell me about wheat", &docs, "general");
        assert!((answer.confidence - 0.4).abs() < f64::EPSILON);
        assert!(answer.answer.contains("Wheat grows best"));
        assert!(answer.answer.contains("consult local agricultural experts"));
    }

    #[test]
    fn test_sources_are_bounded_and_formatted() {
        let long_content = "x".repeat(400);
        let docs = vec![RetrievedDoc {
            id: Uuid::nil(),
            title: "Guide".to_string(),
            content: long_content,
            source_url: None,
            score: 0.9,
        }];
        let answer = synthesize("anything about crops", &docs, "general");
        assert_eq!(answer.sources[0].url, "#");
        assert_eq!(answer.sources[0].snippet.chars().count(), 150);
        assert_eq!(answer.meta.retrieved_ids, vec![Uuid::nil()]);
    }

    #[test]
    fn test_same_inputs_same_answer() {
        let docs = vec![doc("IPM guide", "Integrated pest management basics.")];
        let first = synthesize("pest on tomato", &docs, "crop");
        let second = synthesize("pest on tomato", &docs, "crop");
        assert_eq!(first, second);
    }
}
