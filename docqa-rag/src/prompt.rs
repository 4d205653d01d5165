//! Prompt assembly for retrieval-augmented answers.

use crate::document::SearchResult;
use crate::llm::ChatMessage;

/// Separator placed between retrieved chunks in the context string.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Answer returned when retrieval finds nothing relevant enough.
pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find any relevant information to answer your question.";

/// Join retrieved chunk texts, in the order given, into a single context string.
///
/// No deduplication and no length cap: the caller's order (descending score)
/// is preserved verbatim.
pub fn build_context(results: &[SearchResult]) -> String {
    results.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join(CONTEXT_SEPARATOR)
}

/// Build the system + user messages sent to the chat model.
pub fn build_messages(system_prompt: &str, query: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(format!("Context:\n{context}\n\nQuestion: {query}")),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::llm::Role;

    fn result(text: &str, score: f32) -> SearchResult {
        SearchResult { text: text.into(), score, metadata: HashMap::new() }
    }

    #[test]
    fn context_preserves_score_order() {
        let context = build_context(&[result("A", 0.9), result("B", 0.7)]);
        assert_eq!(context, format!("A{CONTEXT_SEPARATOR}B"));
    }

    #[test]
    fn context_keeps_duplicates() {
        let context = build_context(&[result("A", 0.9), result("A", 0.9)]);
        assert_eq!(context, "A\n\nA");
    }

    #[test]
    fn messages_wrap_query_with_context() {
        let messages = build_messages("Be brief.", "Who approves?", "Managers approve.");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "Be brief.");
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Context:\nManagers approve.\n\nQuestion: Who approves?");
    }
}
