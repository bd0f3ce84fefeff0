//! Context assembly.
//!
//! The last stage renders the surviving results into the prompt handed to
//! the downstream generator. Results are grouped by source document in
//! first-occurrence order after reranking — not alphabetically — so the
//! most relevant source leads. Within a group, chunks keep the reranker's
//! order and each is rendered with an explicit chunk-index label under a
//! header naming the source. Groups are joined by a fixed separator and
//! the whole block is interpolated into the fixed Question/Context/Answer
//! template.
//!
//! The assembler always exposes the assembled lengths so a caller can
//! enforce its own character budget. [`ContextAssembler::assemble_bounded`]
//! applies the crate's documented policy instead: drop the lowest-ranked
//! group first, then trailing chunks of the last surviving group, never
//! the top chunk of the top group.

use crate::config::ContextConfig;
use crate::schema::{SearchResponse, SearchResult};

/// Instruction preamble of the generation prompt.
const PROMPT_PREAMBLE: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, just say that you don't know. \
Use three sentences maximum and keep the answer concise.";

/// Separator between source groups in the assembled context.
const GROUP_SEPARATOR: &str =
    "\n\n==================================================\n\n";

/// One source document's chunks, rendered together under a header.
#[derive(Debug, Clone)]
struct SourceGroup<'a> {
    source_id: &'a str,
    chunks: Vec<&'a SearchResult>,
}

impl SourceGroup<'_> {
    fn render(&self) -> String {
        let body: Vec<String> = self
            .chunks
            .iter()
            .map(|chunk| format!("[Chunk {}]\n{}", chunk.metadata.chunk_index, chunk.content))
            .collect();
        format!("=== {} ===\n\n{}", self.source_id, body.join("\n\n"))
    }
}

/// The rendered prompt plus the measurements callers budget against.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    /// The full prompt: preamble, question, context, answer cue.
    pub prompt: String,
    /// The context block alone, as interpolated into the prompt.
    pub context: String,
    /// Number of source groups that made it into the context.
    pub group_count: usize,
    /// Number of chunks that made it into the context.
    pub chunk_count: usize,
}

impl AssembledContext {
    /// Character length of the context block.
    #[must_use]
    pub fn context_len(&self) -> usize {
        self.context.chars().count()
    }

    /// Character length of the full prompt.
    #[must_use]
    pub fn prompt_len(&self) -> usize {
        self.prompt.chars().count()
    }
}

/// Renders reranked results into the generation prompt.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    config: ContextConfig,
}

impl ContextAssembler {
    /// Creates an assembler from its config section.
    #[must_use]
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    /// The active assembly configuration.
    #[must_use]
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Assembles the full context with no budget applied.
    #[must_use]
    pub fn assemble(&self, response: &SearchResponse) -> AssembledContext {
        let groups = group_by_source(&response.results);
        self.render(response, groups)
    }

    /// Assembles the context trimmed to `max_context_chars`.
    ///
    /// Whole groups are dropped from the tail of the group order first;
    /// when a single group remains, its trailing chunks go next. The top
    /// chunk of the top group is always kept, so a non-empty response
    /// never assembles to an empty context even under an impossible
    /// budget.
    #[must_use]
    pub fn assemble_bounded(&self, response: &SearchResponse) -> AssembledContext {
        let mut groups = group_by_source(&response.results);
        let budget = self.config.max_context_chars;

        loop {
            let assembled = self.render(response, groups.clone());
            if assembled.context_len() <= budget || groups.is_empty() {
                return assembled;
            }
            if groups.len() > 1 {
                let dropped = groups.pop().expect("groups is non-empty");
                tracing::debug!(
                    source_id = dropped.source_id,
                    chunks = dropped.chunks.len(),
                    "dropped lowest-ranked group to fit context budget"
                );
                continue;
            }
            let last = groups.last_mut().expect("groups is non-empty");
            if last.chunks.len() > 1 {
                last.chunks.pop();
                continue;
            }
            tracing::debug!(
                budget,
                context_chars = assembled.context_len(),
                "context exceeds budget but only the top chunk remains"
            );
            return assembled;
        }
    }

    fn render(&self, response: &SearchResponse, groups: Vec<SourceGroup<'_>>) -> AssembledContext {
        let sections: Vec<String> = groups.iter().map(SourceGroup::render).collect();
        let context = sections.join(GROUP_SEPARATOR);
        let chunk_count = groups.iter().map(|group| group.chunks.len()).sum();
        let prompt = format!(
            "{PROMPT_PREAMBLE}\nQuestion: {} \nContext: {} \nAnswer:\n",
            response.query, context
        );

        tracing::debug!(
            sections = sections.len(),
            context_chars = context.chars().count(),
            "context assembled"
        );
        AssembledContext {
            prompt,
            context,
            group_count: groups.len(),
            chunk_count,
        }
    }
}

/// Groups results by source in first-occurrence order.
fn group_by_source(results: &[SearchResult]) -> Vec<SourceGroup<'_>> {
    let mut groups: Vec<SourceGroup<'_>> = Vec::new();
    for result in results {
        match groups
            .iter_mut()
            .find(|group| group.source_id == result.metadata.source_id)
        {
            Some(group) => group.chunks.push(result),
            None => groups.push(SourceGroup {
                source_id: &result.metadata.source_id,
                chunks: vec![result],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ChunkMetadata;
    use chrono::Utc;

    fn result(source: &str, index: usize, content: &str) -> SearchResult {
        SearchResult {
            content: content.to_string(),
            metadata: ChunkMetadata {
                id: format!("{source}-{index}"),
                source_id: source.to_string(),
                chunk_index: index,
                chunk_size: content.chars().count(),
                added_at: Utc::now(),
                content_type: None,
            },
            relevance_score: None,
        }
    }

    fn response(results: Vec<SearchResult>) -> SearchResponse {
        SearchResponse {
            query: "what is chunking?".to_string(),
            total_found: results.len(),
            results,
            search_time_ms: 0.0,
        }
    }

    fn assembler() -> ContextAssembler {
        ContextAssembler::new(ContextConfig::default())
    }

    #[test]
    fn groups_follow_first_occurrence_order() {
        let response = response(vec![
            result("b.md", 0, "from b"),
            result("a.md", 0, "from a"),
            result("b.md", 1, "more from b"),
        ]);

        let assembled = assembler().assemble(&response);
        assert_eq!(assembled.group_count, 2);
        let b_pos = assembled.context.find("=== b.md ===").unwrap();
        let a_pos = assembled.context.find("=== a.md ===").unwrap();
        assert!(b_pos < a_pos, "b.md occurs first, so its group leads");

        // Both b chunks render inside the single b group.
        let b_section = &assembled.context[b_pos..a_pos];
        assert!(b_section.contains("[Chunk 0]\nfrom b"));
        assert!(b_section.contains("[Chunk 1]\nmore from b"));
    }

    #[test]
    fn prompt_follows_the_fixed_template() {
        let response = response(vec![result("a.md", 2, "the content")]);
        let assembled = assembler().assemble(&response);

        assert!(assembled.prompt.starts_with("You are an assistant"));
        assert!(assembled.prompt.contains("Question: what is chunking?"));
        assert!(assembled.prompt.contains("Context: === a.md ==="));
        assert!(assembled.prompt.trim_end().ends_with("Answer:"));
        assert!(assembled.prompt.contains("[Chunk 2]\nthe content"));
    }

    #[test]
    fn groups_are_joined_by_the_fixed_separator() {
        let response = response(vec![
            result("a.md", 0, "alpha"),
            result("b.md", 0, "beta"),
        ]);
        let assembled = assembler().assemble(&response);
        assert!(assembled.context.contains(GROUP_SEPARATOR));
    }

    #[test]
    fn empty_response_assembles_an_empty_context() {
        let assembled = assembler().assemble(&response(Vec::new()));
        assert_eq!(assembled.group_count, 0);
        assert_eq!(assembled.chunk_count, 0);
        assert_eq!(assembled.context_len(), 0);
        assert!(assembled.prompt.contains("Context:  \nAnswer:"));
    }

    #[test]
    fn exposed_lengths_match_the_rendered_text() {
        let response = response(vec![result("a.md", 0, "alpha")]);
        let assembled = assembler().assemble(&response);
        assert_eq!(assembled.context_len(), assembled.context.chars().count());
        assert!(assembled.prompt_len() > assembled.context_len());
    }

    #[test]
    fn bounded_assembly_drops_lowest_ranked_group_first() {
        let assembler = ContextAssembler::new(ContextConfig {
            max_context_chars: 60,
            enforce_budget: true,
        });
        let response = response(vec![
            result("top.md", 0, "highest ranked content"),
            result("tail.md", 0, "this trailing group will not fit the budget"),
        ]);

        let assembled = assembler.assemble_bounded(&response);
        assert_eq!(assembled.group_count, 1);
        assert!(assembled.context.contains("top.md"));
        assert!(!assembled.context.contains("tail.md"));
        assert!(assembled.context_len() <= 60);
    }

    #[test]
    fn bounded_assembly_trims_trailing_chunks_of_the_last_group() {
        let assembler = ContextAssembler::new(ContextConfig {
            max_context_chars: 50,
            enforce_budget: true,
        });
        let response = response(vec![
            result("only.md", 0, "kept chunk"),
            result("only.md", 1, "this later chunk is trimmed away"),
        ]);

        let assembled = assembler.assemble_bounded(&response);
        assert_eq!(assembled.group_count, 1);
        assert_eq!(assembled.chunk_count, 1);
        assert!(assembled.context.contains("[Chunk 0]\nkept chunk"));
        assert!(!assembled.context.contains("[Chunk 1]"));
    }

    #[test]
    fn bounded_assembly_never_drops_the_top_chunk() {
        let assembler = ContextAssembler::new(ContextConfig {
            max_context_chars: 5,
            enforce_budget: true,
        });
        let response = response(vec![result("only.md", 0, "far larger than the budget")]);

        let assembled = assembler.assemble_bounded(&response);
        assert_eq!(assembled.chunk_count, 1);
        assert!(assembled.context.contains("far larger than the budget"));
    }
}
