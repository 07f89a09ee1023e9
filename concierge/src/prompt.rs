//! Prompt builder for the concierge persona.
//!
//! Output is deterministic for a given persona, document and question, so the
//! exact text sent upstream can be asserted in tests without a network.

use std::fmt::Write;

use ai_llm_service::{ResponseSchema, SchemaField};

use crate::knowledge::KnowledgeDocument;

/// Reply used when the document does not cover the question.
pub const DEFAULT_FALLBACK_PHRASE: &str =
    "I cannot find specific guidance on that in the current knowledge document.";

pub const FIELD_REPLY: &str = "conversationalReply";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_LINK: &str = "recommendedLink";

/// Persona knobs that change the rules text.
#[derive(Debug, Clone, Copy)]
pub struct Persona<'a> {
    /// Exact phrase for out-of-scope questions.
    pub fallback_phrase: &'a str,
    /// Allow web search for general (non-brand) design questions.
    pub web_search: bool,
}

/// Final prompt pair: system channel + user channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptEnvelope {
    pub system: String,
    pub user: String,
}

/// Structured-output contract: three required strings.
pub fn response_schema() -> ResponseSchema {
    ResponseSchema {
        name: "concierge_response",
        fields: vec![
            SchemaField {
                name: FIELD_REPLY,
                description: "Friendly, conversational summary (2-3 sentences) of the answer, based only on the knowledge base.",
                required: true,
            },
            SchemaField {
                name: FIELD_STATUS,
                description: "\"FOUND\" if the knowledge base answers the question, \"NOT_FOUND\" otherwise.",
                required: true,
            },
            SchemaField {
                name: FIELD_LINK,
                description: "The URL or path from the knowledge base for the detailed resource, or \"none\" if the document gives no link for this answer.",
                required: true,
            },
        ],
    }
}

/// Persona and rules for the system channel.
pub fn build_system_instruction(persona: &Persona<'_>) -> String {
    let mut s = String::with_capacity(1536);

    writeln!(
        s,
        "You are the \"Brand Concierge\", a friendly, expert and hyper-efficient assistant for the design team. \
Your tone is warm, supportive and professional."
    )
    .ok();
    writeln!(
        s,
        "Your core task is to answer the user's question based STRICTLY on the KNOWLEDGE_BASE DOCUMENT provided in the message."
    )
    .ok();

    writeln!(s, "\nRULES:").ok();
    let mut n = 1;
    writeln!(
        s,
        "{n}. Read and prioritize the KNOWLEDGE_BASE DOCUMENT. Never invent brand facts, colors, fonts or links."
    )
    .ok();
    n += 1;
    writeln!(
        s,
        "{n}. `{FIELD_REPLY}` is a friendly, conversational summary (2-3 sentences) that directly references the information found in the document."
    )
    .ok();
    n += 1;
    if persona.web_search {
        writeln!(
            s,
            "{n}. For general design questions that are not brand-specific (e.g. \"What is CMYK?\"), you may use web search to give an accurate answer; set `{FIELD_STATUS}` to \"FOUND\" only if you answered."
        )
        .ok();
        n += 1;
    }
    writeln!(
        s,
        "{n}. If the document does not contain the answer, or the question is clearly out of scope, `{FIELD_REPLY}` must be exactly: \"{}\" and `{FIELD_STATUS}` must be \"NOT_FOUND\".",
        persona.fallback_phrase
    )
    .ok();
    n += 1;
    writeln!(
        s,
        "{n}. `{FIELD_STATUS}` is \"FOUND\" when the document answers the question, \"NOT_FOUND\" otherwise."
    )
    .ok();
    n += 1;
    writeln!(
        s,
        "{n}. `{FIELD_LINK}` is the URL or path the document gives for this answer; use \"none\" if there is no such link."
    )
    .ok();
    n += 1;
    writeln!(
        s,
        "{n}. Always return exactly one JSON object with the keys `{FIELD_REPLY}`, `{FIELD_STATUS}` and `{FIELD_LINK}`, all strings, and no text before or after it."
    )
    .ok();

    s
}

/// Knowledge document between sentinel markers, then the literal question.
///
/// The document is copied verbatim; a newline is added only when it does not
/// already end with one, so the closing marker sits on its own line.
pub fn build_user_prompt(knowledge: &KnowledgeDocument, question: &str) -> String {
    let doc = knowledge.as_str();
    let mut s = String::with_capacity(doc.len() + question.len() + 256);

    writeln!(s, "KNOWLEDGE_BASE DOCUMENT:").ok();
    writeln!(s, "---").ok();
    s.push_str(doc);
    if !doc.ends_with('\n') {
        s.push('\n');
    }
    writeln!(s, "---").ok();
    writeln!(s, "USER QUESTION: \"{question}\"").ok();
    write!(
        s,
        "Based on the document, provide the best {FIELD_REPLY}, {FIELD_STATUS}, and {FIELD_LINK}."
    )
    .ok();

    s
}

pub fn build_prompt(
    persona: &Persona<'_>,
    knowledge: &KnowledgeDocument,
    question: &str,
) -> PromptEnvelope {
    PromptEnvelope {
        system: build_system_instruction(persona),
        user: build_user_prompt(knowledge, question),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSONA: Persona<'static> = Persona {
        fallback_phrase: DEFAULT_FALLBACK_PHRASE,
        web_search: false,
    };

    #[test]
    fn user_prompt_orders_document_then_question() {
        let doc = KnowledgeDocument::new("Primary color: #4A90E2 (Indigo)\n");
        let user = build_user_prompt(&doc, "What is our primary brand color?");

        let doc_at = user.find("#4A90E2").unwrap();
        let q_at = user
            .find("USER QUESTION: \"What is our primary brand color?\"")
            .unwrap();
        assert!(user.starts_with("KNOWLEDGE_BASE DOCUMENT:\n---\n"));
        assert!(doc_at < q_at);
        assert!(user.contains("(Indigo)\n---\nUSER QUESTION"));
    }

    #[test]
    fn persona_stays_out_of_user_content() {
        let doc = KnowledgeDocument::new("ZQX-DOC-MARKER");
        let env = build_prompt(&PERSONA, &doc, "q");
        assert!(env.system.contains("Brand Concierge"));
        assert!(env.system.contains(DEFAULT_FALLBACK_PHRASE));
        assert!(!env.user.contains("Brand Concierge"));
        assert!(env.user.contains("ZQX-DOC-MARKER"));
        assert!(!env.system.contains("ZQX-DOC-MARKER"));
    }

    #[test]
    fn document_is_copied_verbatim() {
        let text = "Spacing: 8px grid\n\n  Logo clear space: 2x   \n\n";
        let user = build_user_prompt(&KnowledgeDocument::new(text), "q");
        assert!(user.contains(&format!("---\n{text}---\n")));

        let user = build_user_prompt(&KnowledgeDocument::new("Inter only"), "q");
        assert!(user.contains("---\nInter only\n---\n"));
    }

    #[test]
    fn deterministic_and_bom_insensitive() {
        let a = build_prompt(&PERSONA, &KnowledgeDocument::new("doc"), "q");
        let b = build_prompt(&PERSONA, &KnowledgeDocument::new("\u{feff}doc"), "q");
        assert_eq!(a, b);
    }

    #[test]
    fn web_search_rule_is_optional() {
        let plain = build_system_instruction(&PERSONA);
        let search = build_system_instruction(&Persona {
            web_search: true,
            ..PERSONA
        });
        assert!(!plain.contains("web search"));
        assert!(search.contains("web search"));
    }

    #[test]
    fn custom_fallback_phrase_is_used() {
        let s = build_system_instruction(&Persona {
            fallback_phrase: "Sorry, that's outside the brand book.",
            web_search: false,
        });
        assert!(s.contains("\"Sorry, that's outside the brand book.\""));
    }

    #[test]
    fn schema_has_three_required_strings() {
        let schema = response_schema();
        assert_eq!(schema.required(), vec![FIELD_REPLY, FIELD_STATUS, FIELD_LINK]);
    }
}
