//! Context assembly and prompt construction.
//!
//! Turns a retrieval result and a session transcript into the prompt sent
//! to the generation provider. The grounding mode picks the rule block:
//! strict confines the model to the supplied context, open allows general
//! knowledge while still forbidding invented university-internal facts.
//!
//! Citations are derived here too, as the distinct `source – title` pairs
//! of the retrieved chunks in first-occurrence order. The orchestrator
//! appends them to the final reply.

use crate::models::{ScoredChunk, Turn};

/// How tightly generation is bound to the supplied context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundingMode {
    /// Answer only from context; decline when it lacks the answer.
    Strict,
    /// General knowledge allowed; no invented university-internal facts.
    Open,
}

/// A context block plus the citations it was built from.
#[derive(Debug, Default)]
pub struct AssembledContext {
    pub context_block: String,
    pub citations: Vec<String>,
}

/// Build the tagged context block and deduplicated citation list from
/// retrieved chunks, preserving rank order.
pub fn assemble_context(chunks: &[ScoredChunk]) -> AssembledContext {
    let mut blocks = Vec::with_capacity(chunks.len());
    let mut citations: Vec<String> = Vec::new();

    for chunk in chunks {
        let tag = format!("{} – {}", chunk.source, chunk.title);
        blocks.push(format!("[{}]\n{}", tag, chunk.text));
        if !citations.contains(&tag) {
            citations.push(tag);
        }
    }

    AssembledContext {
        context_block: blocks.join("\n\n"),
        citations,
    }
}

/// Serialize session turns as `role: content` lines.
pub fn transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role, t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

const PERSONA: &str =
    "You are LPU VertoSewa, an AI assistant for Lovely Professional University (LPU).";

const STRICT_RULES: &str = "STRICT RULES:
- If context is provided, answer ONLY from it
- Do NOT assume or invent LPU-specific rules
- Be precise, factual, and concise
- Do NOT generate dates or numbers unless present in context
- If the context does not contain the answer, say the information is insufficient and suggest contacting the relevant university office";

const OPEN_RULES: &str = "GUIDELINES:
- Use the context when it is relevant
- You may use general public knowledge
- Do NOT claim LPU-specific rules or facts that are not present in the context
- Be helpful, clear, and concise";

/// Assemble the full generation prompt.
///
/// The transcript section is labeled as tone and continuity only so the
/// model doesn't treat old turns as evidence. The context section is
/// always present, even when empty, so strict-mode instructions keep
/// their referent.
pub fn build_prompt(
    mode: GroundingMode,
    context_block: &str,
    conversation: &str,
    question: &str,
) -> String {
    let rules = match mode {
        GroundingMode::Strict => STRICT_RULES,
        GroundingMode::Open => OPEN_RULES,
    };

    let mut prompt = format!("{}\n\n{}\n\n", PERSONA, rules);

    if !conversation.is_empty() {
        prompt.push_str(&format!(
            "CONVERSATION (tone and continuity only, not a source of facts):\n{}\n\n",
            conversation
        ));
    }

    prompt.push_str(&format!(
        "CONTEXT:\n{}\n\nQUESTION: {}\n\nANSWER:",
        context_block, question
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;

    fn scored(source: SourceKind, title: &str, text: &str) -> ScoredChunk {
        ScoredChunk {
            score: 0.9,
            source,
            title: title.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_assemble_empty() {
        let assembled = assemble_context(&[]);
        assert_eq!(assembled.context_block, "");
        assert!(assembled.citations.is_empty());
    }

    #[test]
    fn test_assemble_tags_and_order() {
        let chunks = vec![
            scored(SourceKind::Administrative, "Fee Notice", "Fees due in July."),
            scored(SourceKind::Static, "LPU Knowledge Base", "LPU is in Phagwara."),
        ];

        let assembled = assemble_context(&chunks);
        assert_eq!(
            assembled.context_block,
            "[Administrative – Fee Notice]\nFees due in July.\n\n\
             [Static – LPU Knowledge Base]\nLPU is in Phagwara."
        );
        assert_eq!(
            assembled.citations,
            vec!["Administrative – Fee Notice", "Static – LPU Knowledge Base"]
        );
    }

    #[test]
    fn test_assemble_dedupes_citations() {
        let chunks = vec![
            scored(SourceKind::Static, "LPU Knowledge Base", "part one"),
            scored(SourceKind::Static, "LPU Knowledge Base", "part two"),
        ];

        let assembled = assemble_context(&chunks);
        assert_eq!(assembled.citations.len(), 1);
        // Both chunks still appear in the block.
        assert!(assembled.context_block.contains("part one"));
        assert!(assembled.context_block.contains("part two"));
    }

    #[test]
    fn test_transcript_lines() {
        let turns = vec![Turn::user("hello"), Turn::assistant("hi there")];
        assert_eq!(transcript(&turns), "user: hello\nassistant: hi there");
    }

    #[test]
    fn test_strict_prompt_shape() {
        let prompt = build_prompt(GroundingMode::Strict, "some context", "", "fees?");
        assert!(prompt.starts_with("You are LPU VertoSewa"));
        assert!(prompt.contains("STRICT RULES:"));
        assert!(prompt.contains("answer ONLY from it"));
        assert!(!prompt.contains("CONVERSATION"));
        assert!(prompt.contains("CONTEXT:\nsome context"));
        assert!(prompt.contains("QUESTION: fees?"));
        assert!(prompt.ends_with("ANSWER:"));
    }

    #[test]
    fn test_open_prompt_shape() {
        let prompt = build_prompt(GroundingMode::Open, "", "user: hi", "what is rust?");
        assert!(prompt.contains("GUIDELINES:"));
        assert!(!prompt.contains("STRICT RULES:"));
        assert!(prompt.contains("CONVERSATION (tone and continuity only, not a source of facts):\nuser: hi"));
        // Context section present even when empty.
        assert!(prompt.contains("CONTEXT:\n\n"));
    }
}
