//! Context assembly from the final ranked selection.

use tracing::debug;

use sift_core::{ChatMessage, ContextConfig, ScoredChunk};

use crate::tokens::TokenCounter;

/// Per-occurrence priority weight of query keywords.
const KEYWORD_WEIGHT: f32 = 0.1;

/// Priority bonus for content in the presentation sweet spot.
const LENGTH_BONUS: f32 = 0.2;

/// Priority bonuses for present metadata.
const CATEGORY_BONUS: f32 = 0.15;
const SOURCE_BONUS: f32 = 0.1;

/// Priority bonus for authoritative document kinds.
const KIND_BONUS: f32 = 0.25;

/// History messages excerpted into the header.
const HEADER_HISTORY: usize = 2;

/// Assemble the final context string.
///
/// Chunks are reordered by presentation priority, then appended until the
/// next section would exceed `max_tokens`; the overflowing section is
/// sentence-wise truncated into the remaining budget (never mid-sentence,
/// and only when at least `min_tail_tokens` remain). Each section carries
/// its available metadata; the whole is wrapped with a header naming the
/// question and a short excerpt of the recent history.
pub fn assemble(
    selected: &[ScoredChunk],
    question: &str,
    query_terms: &[String],
    history: &[ChatMessage],
    counter: &dyn TokenCounter,
    config: &ContextConfig,
) -> String {
    let mut context = header(question, history);
    let mut used_tokens = counter.count(&context);

    let prioritized = prioritize(selected, query_terms);

    for (index, candidate) in prioritized.iter().enumerate() {
        let section = render_section(candidate, index);
        let section_tokens = counter.count(&section);

        if used_tokens + section_tokens > config.max_tokens {
            let remaining = config.max_tokens.saturating_sub(used_tokens);
            if remaining >= config.min_tail_tokens {
                let truncated = truncate_sentencewise(&section, remaining, counter);
                if !truncated.is_empty() {
                    used_tokens += counter.count(&truncated);
                    context.push_str(&truncated);
                }
            }
            break;
        }

        used_tokens += section_tokens;
        context.push_str(&section);
    }

    debug!(tokens = used_tokens, budget = config.max_tokens, "context assembled");
    context
}

/// Reorder by presentation priority: base score plus keyword occurrence
/// count, length sweet spot, metadata presence and kind bonuses.
fn prioritize(selected: &[ScoredChunk], query_terms: &[String]) -> Vec<ScoredChunk> {
    let mut prioritized: Vec<(f32, ScoredChunk)> = selected
        .iter()
        .map(|candidate| {
            let text = candidate.chunk.content.to_lowercase();
            let mut priority = candidate.precision_score;

            for term in query_terms {
                priority += text.matches(term.as_str()).count() as f32 * KEYWORD_WEIGHT;
            }

            let length = candidate.chunk.content.chars().count();
            if (100..1500).contains(&length) {
                priority += LENGTH_BONUS;
            }

            let metadata = &candidate.chunk.metadata;
            if metadata.category.is_some() {
                priority += CATEGORY_BONUS;
            }
            if metadata.source.is_some() {
                priority += SOURCE_BONUS;
            }
            if metadata.is_authoritative() {
                priority += KIND_BONUS;
            }

            (priority, candidate.clone())
        })
        .collect();

    prioritized.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    prioritized.into_iter().map(|(_, c)| c).collect()
}

fn header(question: &str, history: &[ChatMessage]) -> String {
    let mut header = String::from("=== KNOWLEDGE BASE CONTEXT ===\n");
    header.push_str(&format!("Question: \"{}\"\n", question));

    if !history.is_empty() {
        let excerpt: Vec<&str> = history
            .iter()
            .rev()
            .take(HEADER_HISTORY)
            .map(|m| m.content.as_str())
            .collect();
        let excerpt: Vec<&str> = excerpt.into_iter().rev().collect();
        header.push_str(&format!("Recent conversation: {}\n", excerpt.join(" | ")));
    }

    header.push_str("\n=== RELEVANT DOCUMENTS ===\n\n");
    header
}

fn render_section(candidate: &ScoredChunk, index: usize) -> String {
    let mut labels = String::new();
    let metadata = &candidate.chunk.metadata;

    if let Some(category) = &metadata.category {
        labels.push_str(&format!("[CATEGORY: {}] ", category));
    }
    if let Some(source) = &metadata.source {
        labels.push_str(&format!("[SOURCE: {}] ", source));
    }

    format!(
        "DOCUMENT {}:\n{}{}\n\n",
        index + 1,
        labels,
        candidate.chunk.content
    )
}

/// Fit a section into `budget` tokens without cutting a sentence.
fn truncate_sentencewise(section: &str, budget: usize, counter: &dyn TokenCounter) -> String {
    let mut truncated = String::new();
    let mut used = 0;

    for sentence in section.split_inclusive(['.', '!', '?']) {
        let tokens = counter.count(sentence);
        if used + tokens > budget {
            break;
        }
        truncated.push_str(sentence);
        used += tokens;
    }

    if truncated.trim().is_empty() {
        return String::new();
    }

    if truncated.len() < section.len() {
        truncated.push_str("...\n\n");
    }
    truncated
}
