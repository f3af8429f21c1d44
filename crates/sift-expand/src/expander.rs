//! Query expansion.
//!
//! Four additive stages in fixed order: synonyms, morphology,
//! conversation context, domain associations. A stage with no table hit
//! passes its input through; expansion never fails.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use sift_core::{ChatMessage, ExpansionConfig, Role};

use crate::keywords::extract_keywords;
use crate::lexicon::Lexicon;

/// User turns consulted for contextual expansion.
const CONTEXT_TURNS: usize = 3;

/// Context terms pulled per expansion.
const CONTEXT_TERMS: usize = 3;

/// Morphological variants taken per root.
const MORPH_VARIANTS: usize = 2;

/// Domain associations taken per term.
const DOMAIN_TERMS: usize = 2;

/// The outcome of query expansion.
#[derive(Debug, Clone)]
pub struct ExpandedQuery {
    /// The unmodified question.
    pub original: String,

    /// Question text with expansion terms appended.
    pub expanded_text: String,

    /// Keywords of the original question.
    pub original_terms: Vec<String>,

    /// Original keywords followed by expansion terms, deduplicated.
    pub all_terms: Vec<String>,
}

impl ExpandedQuery {
    /// Whether a term came from the unexpanded query.
    pub fn is_original_term(&self, term: &str) -> bool {
        self.original_terms.iter().any(|t| t == term)
    }

    /// Terms added by expansion only.
    pub fn expansion_terms(&self) -> impl Iterator<Item = &String> {
        self.all_terms
            .iter()
            .filter(move |t| !self.is_original_term(t))
    }
}

/// Expands queries against a lexicon.
pub struct QueryExpander {
    lexicon: Arc<Lexicon>,
    config: ExpansionConfig,
}

impl QueryExpander {
    pub fn new(lexicon: Arc<Lexicon>, config: ExpansionConfig) -> Self {
        Self { lexicon, config }
    }

    /// Expand a query using the conversation history.
    ///
    /// Strictly additive; the result is capped at
    /// `original_term_count + max_expansion_terms` terms.
    pub fn expand(&self, question: &str, history: &[ChatMessage]) -> ExpandedQuery {
        let original_terms = extract_keywords(question, &self.lexicon);

        if !self.config.enabled {
            return self.unexpanded(question, original_terms);
        }

        let mut present: HashSet<String> = original_terms.iter().cloned().collect();
        let mut added: Vec<String> = Vec::new();

        if self.config.synonyms {
            self.synonym_stage(&original_terms, &mut present, &mut added);
        }

        if self.config.morphological {
            self.morphology_stage(question, &mut present, &mut added);
        }

        if self.config.contextual && !history.is_empty() {
            self.context_stage(history, &mut present, &mut added);
        }

        if self.config.domain {
            self.domain_stage(&original_terms, &mut present, &mut added);
        }

        added.truncate(self.config.max_expansion_terms);

        let expanded_text = if added.is_empty() {
            question.to_string()
        } else {
            format!("{} {}", question, added.join(" "))
        };

        debug!(
            original = original_terms.len(),
            added = added.len(),
            "query expanded"
        );

        let mut all_terms = original_terms.clone();
        all_terms.extend(added);

        ExpandedQuery {
            original: question.to_string(),
            expanded_text,
            original_terms,
            all_terms,
        }
    }

    fn unexpanded(&self, question: &str, original_terms: Vec<String>) -> ExpandedQuery {
        ExpandedQuery {
            original: question.to_string(),
            expanded_text: question.to_string(),
            all_terms: original_terms.clone(),
            original_terms,
        }
    }

    fn synonym_stage(
        &self,
        original_terms: &[String],
        present: &mut HashSet<String>,
        added: &mut Vec<String>,
    ) {
        for term in original_terms {
            if let Some(synonyms) = self.lexicon.synonyms.get(term) {
                for synonym in synonyms.iter().take(self.config.max_synonyms_per_term) {
                    push_unique(synonym, present, added);
                }
            }
        }
    }

    fn morphology_stage(
        &self,
        question: &str,
        present: &mut HashSet<String>,
        added: &mut Vec<String>,
    ) {
        let lower = question.to_lowercase();
        for (root, variants) in &self.lexicon.morphology {
            if lower.contains(root.as_str()) {
                for variant in variants.iter().take(MORPH_VARIANTS) {
                    push_unique(variant, present, added);
                }
            }
        }
    }

    fn context_stage(
        &self,
        history: &[ChatMessage],
        present: &mut HashSet<String>,
        added: &mut Vec<String>,
    ) {
        let history_text: String = history
            .iter()
            .filter(|m| m.role == Role::User)
            .rev()
            .take(CONTEXT_TURNS)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let mut pulled = 0;
        for term in extract_keywords(&history_text, &self.lexicon) {
            if pulled >= CONTEXT_TERMS {
                break;
            }
            if push_unique(&term, present, added) {
                pulled += 1;
            }
        }
    }

    fn domain_stage(
        &self,
        original_terms: &[String],
        present: &mut HashSet<String>,
        added: &mut Vec<String>,
    ) {
        for term in original_terms {
            if let Some(associated) = self.lexicon.domain.get(term) {
                for assoc in associated.iter().take(DOMAIN_TERMS) {
                    push_unique(assoc, present, added);
                }
            }
        }
    }
}

fn push_unique(term: &str, present: &mut HashSet<String>, added: &mut Vec<String>) -> bool {
    if present.insert(term.to_string()) {
        added.push(term.to_string());
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::ExpansionConfig;

    fn expander() -> QueryExpander {
        QueryExpander::new(Arc::new(Lexicon::default()), ExpansionConfig::default())
    }

    #[test]
    fn test_synonym_expansion_is_additive() {
        let expanded = expander().expand("izin başvurusu", &[]);

        assert!(expanded.expanded_text.starts_with("izin başvurusu"));
        assert!(expanded.all_terms.contains(&"tatil".to_string()));
        assert!(expanded.is_original_term("izin"));
        assert!(!expanded.is_original_term("tatil"));
    }

    #[test]
    fn test_expansion_cap() {
        let config = ExpansionConfig {
            max_expansion_terms: 2,
            ..Default::default()
        };
        let expander = QueryExpander::new(Arc::new(Lexicon::default()), config);

        let expanded = expander.expand("maaş izin eğitim performans", &[]);
        assert!(expanded.all_terms.len() <= expanded.original_terms.len() + 2);
    }

    #[test]
    fn test_unknown_terms_pass_through() {
        let expanded = expander().expand("frobnicate widget", &[]);
        assert_eq!(expanded.expanded_text, "frobnicate widget");
        assert_eq!(expanded.all_terms, expanded.original_terms);
    }

    #[test]
    fn test_context_stage_pulls_recent_user_terms() {
        let history = vec![
            ChatMessage::user("yıllık izin süresi hakkında"),
            ChatMessage::assistant("izin 14 gündür"),
            ChatMessage::user("peki bordro kesintisi olur mu"),
        ];

        let expanded = expander().expand("başka sorum var acaba", &[]);
        assert!(!expanded.all_terms.contains(&"bordro".to_string()));

        let expanded = expander().expand("başka sorum var acaba", &history);
        assert!(expanded.all_terms.contains(&"bordro".to_string()));
    }

    #[test]
    fn test_disabled_expansion_passes_through() {
        let config = ExpansionConfig {
            enabled: false,
            ..Default::default()
        };
        let expander = QueryExpander::new(Arc::new(Lexicon::default()), config);

        let expanded = expander.expand("izin kaç gün", &[]);
        assert_eq!(expanded.expanded_text, "izin kaç gün");
    }

    #[test]
    fn test_empty_question_degrades_to_empty_terms() {
        let expanded = expander().expand("", &[]);
        assert!(expanded.original_terms.is_empty());
        assert!(expanded.all_terms.is_empty());
        assert_eq!(expanded.expanded_text, "");
    }
}
