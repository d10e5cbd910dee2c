//! Pure unit tests (no database or network required)
//!
//! These tests verify core pipeline behavior without external dependencies.

#[cfg(test)]
mod unit_tests {
    use uuid::Uuid;

    use crate::llm::fallback;
    use crate::llm::validator;
    use crate::llm::Validation;
    use crate::models::RetrievedDoc;
    use crate::truncate_chars;
    use crate::NO_ANSWER_SENTINEL;

    fn sample_docs() -> Vec<RetrievedDoc> {
        vec![RetrievedDoc {
            id: Uuid::from_u128(7),
            title: "Pest management".to_string(),
            content: "Scout fields weekly and remove affected plant parts early.".to_string(),
            source_url: Some("https://example.org/ipm".to_string()),
            score: 0.82,
        }]
    }

    // ====== Sentinel and helpers ======

    #[test]
    fn test_sentinel_phrase_is_exact() {
        assert_eq!(
            NO_ANSWER_SENTINEL,
            "I don't know — please consult a local expert."
        );
    }

    #[test]
    fn test_truncate_chars_short_input_unchanged() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_chars_bounds_by_characters_not_bytes() {
        // Multi-byte characters must not be split
        let text = "मिट्टी की नमी जांचें";
        let truncated = truncate_chars(text, 6);
        assert_eq!(truncated.chars().count(), 6);
    }

    // ====== Error handling ======

    #[test]
    fn test_error_from_io() {
        use std::io;

        use crate::errors::FarmGuruError;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: FarmGuruError = io_err.into();

        assert!(matches!(err, FarmGuruError::Io(_)));
    }

    #[test]
    fn test_generation_unavailable_display() {
        use crate::errors::FarmGuruError;

        let err = FarmGuruError::GenerationUnavailable("rate limited".to_string());
        assert!(format!("{err}").contains("rate limited"));
    }

    // ====== Idempotent degrade (malformed output == fallback output) ======

    #[test]
    fn test_malformed_generation_degrades_to_fallback_deterministically() {
        let docs = sample_docs();
        let question = "pest damage on leaves";

        // The validator rejects the malformed payload the same way every
        // time, and the fallback is a pure function of the same inputs, so
        // the degraded answer is identical across repeated invocations.
        let malformed = "Sorry, here is some advice: spray something strong.";
        let expected = fallback::synthesize(question, &docs, "crop");

        for _ in 0..3 {
            match validator::validate(malformed, &docs, "crop") {
                Validation::Invalid(_) => {
                    let degraded = fallback::synthesize(question, &docs, "crop");
                    assert_eq!(degraded, expected);
                }
                Validation::Valid(_) => panic!("malformed payload must not validate"),
            }
        }
    }

    #[test]
    fn test_fallback_answer_satisfies_caller_contract() {
        let docs = sample_docs();
        for question in [
            "pest damage on leaves",
            "when to water tomatoes",
            "which nutrient is missing",
            "something entirely else",
        ] {
            let answer = fallback::synthesize(question, &docs, "general");
            assert!((0.0..=1.0).contains(&answer.confidence));
            assert!(!answer.actions.is_empty() && answer.actions.len() <= 3);
            assert!(answer
                .sources
                .iter()
                .all(|s| s.snippet.chars().count() <= 150));
        }
    }

    #[test]
    fn test_no_docs_contract() {
        let answer = fallback::synthesize("anything", &[], "general");
        assert_eq!(answer.answer, NO_ANSWER_SENTINEL);
        assert!((answer.confidence - 0.0).abs() < f64::EPSILON);
    }
}
