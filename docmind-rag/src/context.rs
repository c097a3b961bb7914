//! Prompt context assembly.
//!
//! Ranked chunks are grouped by source document and rendered as one text
//! block, ready to be embedded in a system prompt.

use std::collections::{HashMap, HashSet};

use crate::document::ScoredChunk;

/// Returned by [`assemble_context`] when nothing relevant was retrieved.
pub const NO_CONTEXT: &str = "No relevant document content found.";

/// Render ranked chunks grouped by document.
///
/// Documents appear in the order of their best-ranked chunk, and chunks keep
/// their ranked order inside each group (not their position in the document).
/// Each group starts with a `--- Document: {name} ---` header and chunk
/// bodies are separated by blank lines.
///
/// # Example
///
/// ```rust,ignore
/// let context = assemble_context(&ranked);
/// let system_prompt = format!("Document Context:\n{context}");
/// ```
pub fn assemble_context(chunks: &[ScoredChunk]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT.to_string();
    }

    let mut groups: Vec<Vec<&ScoredChunk>> = Vec::new();
    let mut group_of: HashMap<&str, usize> = HashMap::new();
    for scored in chunks {
        let slot = *group_of.entry(scored.chunk.document_id.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(scored);
    }

    let mut context = String::new();
    for group in groups {
        context.push_str(&format!("\n--- Document: {} ---\n", group[0].chunk.document_name));
        for scored in group {
            context.push('\n');
            context.push_str(&scored.chunk.content);
            context.push('\n');
        }
    }
    context.trim().to_string()
}

/// Document names in ranked order with duplicates removed, for citing sources.
pub fn cited_sources(chunks: &[ScoredChunk]) -> Vec<String> {
    let mut seen = HashSet::new();
    chunks
        .iter()
        .filter(|scored| seen.insert(scored.chunk.document_name.as_str()))
        .map(|scored| scored.chunk.document_name.clone())
        .collect()
}
