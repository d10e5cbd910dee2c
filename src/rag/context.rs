//! Bounded prompt assembly from retrieved documents

use crate::models::RetrievedDoc;
use crate::NO_ANSWER_SENTINEL;

/// Character budget per document block; bounds the request size
const DOC_CHAR_BUDGET: usize = 500;

/// Builder for the generation prompt.
///
/// Formats retrieved documents as labeled `[DOC1]..[DOCn]` blocks, each
/// truncated to a fixed character budget, together with the verbatim question
/// and the grounding instructions. The instructions are part of the safety
/// design: they are what keeps the provider from inventing facts or emitting
/// prescriptive chemical guidance.
pub struct PromptBuilder {
    max_doc_chars: usize,
}

impl PromptBuilder {
    /// Create a prompt builder with a custom per-document budget
    #[must_use]
    pub const fn new(max_doc_chars: usize) -> Self {
        Self { max_doc_chars }
    }

    /// Build the full generation prompt
    #[must_use]
    pub fn build(&self, question: &str, docs: &[RetrievedDoc]) -> String {
        format!(
            r#"You are FarmGuru, an agricultural assistant. Use ONLY the retrieved passages below (labeled [DOC1],[DOC2]...[DOCn]). Do NOT invent facts. If none of the passages support the user's question, reply exactly: "{NO_ANSWER_SENTINEL}" Output must be strict JSON with fields: answer (short, 1-2 sentences), confidence (0-1), actions (array of 1-3 concise actions), sources (array with title, url, snippet). For chemical suggestions: do NOT provide dosages or prescriptive application guidance; give broad IPM steps and advise consulting the local extension service.

User question: {question}

Retrieved docs:
{docs}

Return only JSON."#,
            question = question,
            docs = self.format_docs(docs),
        )
    }

    /// Format documents as labeled blocks
    fn format_docs(&self, docs: &[RetrievedDoc]) -> String {
        let formatted: Vec<String> = docs
            .iter()
            .enumerate()
            .map(|(idx, doc)| {
                format!(
                    "[DOC{}] Title: {}, URL: {}\n{}",
                    idx + 1,
                    doc.title,
                    doc.source_url.as_deref().unwrap_or("No URL"),
                    crate::truncate_chars(&doc.content, self.max_doc_chars),
                )
            })
            .collect();

        formatted.join("\n\n")
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DOC_CHAR_BUDGET)
    }
}
