//! Configuration for the retrieval engine.
//!
//! Weight constants are hand-tuned; the formula shapes are the contract,
//! the numeric defaults are not. Everything here is overridable from a
//! TOML file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration, one section per pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiftConfig {
    /// Query expansion.
    #[serde(default)]
    pub expansion: ExpansionConfig,

    /// BM25 lexical scoring.
    #[serde(default)]
    pub bm25: Bm25Config,

    /// Multi-metric vector scoring.
    #[serde(default)]
    pub vector: VectorConfig,

    /// Hybrid fusion.
    #[serde(default)]
    pub fusion: FusionConfig,

    /// Diversity filtering.
    #[serde(default)]
    pub diversity: DiversityConfig,

    /// Precision re-ranking.
    #[serde(default)]
    pub rerank: RerankConfig,

    /// Anti-repetition session state.
    #[serde(default)]
    pub session: SessionConfig,

    /// Context assembly.
    #[serde(default)]
    pub context: ContextConfig,

    /// User-facing message templates.
    #[serde(default)]
    pub messages: Messages,
}

/// Query expansion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    /// Master switch; disabled expansion passes the query through.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Synonym substitution stage.
    #[serde(default = "default_true")]
    pub synonyms: bool,

    /// Morphological variant stage.
    #[serde(default = "default_true")]
    pub morphological: bool,

    /// Conversation-context term pull.
    #[serde(default = "default_true")]
    pub contextual: bool,

    /// Domain-association stage.
    #[serde(default = "default_true")]
    pub domain: bool,

    /// Cap on added terms beyond the original term count.
    #[serde(default = "default_max_expansion_terms")]
    pub max_expansion_terms: usize,

    /// Synonyms considered per query token.
    #[serde(default = "default_synonyms_per_term")]
    pub max_synonyms_per_term: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            synonyms: true,
            morphological: true,
            contextual: true,
            domain: true,
            max_expansion_terms: 8,
            max_synonyms_per_term: 3,
        }
    }
}

/// BM25 parameters and lexical bonuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Config {
    /// Term frequency saturation.
    #[serde(default = "default_k1")]
    pub k1: f32,

    /// Document length normalization.
    #[serde(default = "default_b")]
    pub b: f32,

    /// Multiplier for terms present in the unexpanded query.
    #[serde(default = "default_original_term_weight")]
    pub original_term_weight: f32,

    /// Bonus per term matching the chunk category name.
    #[serde(default = "default_category_bonus")]
    pub category_bonus: f32,

    /// Bonus per term found in the document-start window.
    #[serde(default = "default_doc_start_bonus")]
    pub doc_start_bonus: f32,

    /// Characters considered the document-start window.
    #[serde(default = "default_doc_start_window")]
    pub doc_start_window: usize,

    /// Bonus for exact-phrase containment of the original query.
    #[serde(default = "default_exact_phrase_bonus")]
    pub exact_phrase_bonus: f32,

    /// Bonus for content length in the optimal range.
    #[serde(default = "default_length_bonus")]
    pub length_bonus: f32,

    /// Minimum score; chunks at or below are dropped.
    #[serde(default = "default_score_floor")]
    pub score_floor: f32,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            original_term_weight: 1.5,
            category_bonus: 0.8,
            doc_start_bonus: 0.6,
            doc_start_window: 150,
            exact_phrase_bonus: 1.2,
            length_bonus: 0.3,
            score_floor: 0.1,
        }
    }
}

/// Vector similarity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Weighted multi-metric mode; off means cosine only.
    #[serde(default = "default_true")]
    pub multi_metric: bool,

    /// Metric weights used in multi-metric mode.
    #[serde(default)]
    pub weights: MetricWeights,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            multi_metric: true,
            weights: MetricWeights::default(),
        }
    }
}

/// Per-metric weights for the combined similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricWeights {
    #[serde(default = "default_cosine_weight")]
    pub cosine: f32,
    #[serde(default = "default_euclidean_weight")]
    pub euclidean: f32,
    #[serde(default = "default_manhattan_weight")]
    pub manhattan: f32,
    #[serde(default = "default_jaccard_weight")]
    pub jaccard: f32,
    #[serde(default = "default_pearson_weight")]
    pub pearson: f32,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            cosine: 0.4,
            euclidean: 0.2,
            manhattan: 0.1,
            jaccard: 0.15,
            pearson: 0.15,
        }
    }
}

/// Hybrid fusion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Weight for the vector list (0.0 to 1.0).
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f32,

    /// Weight for the keyword list (0.0 to 1.0).
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,

    /// Rank-position bonus at the top of a list, decaying linearly to 0.
    #[serde(default = "default_position_bonus")]
    pub position_bonus: f32,

    /// Fixed bonus for chunks present in both lists.
    #[serde(default = "default_agreement_bonus")]
    pub agreement_bonus: f32,

    /// Candidates fetched per retriever in the wide pass.
    #[serde(default = "default_initial_top_k")]
    pub initial_top_k: usize,

    /// Results kept after fusion.
    #[serde(default = "default_hybrid_top_k")]
    pub hybrid_top_k: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            vector_weight: 0.7,
            keyword_weight: 0.3,
            position_bonus: 0.2,
            agreement_bonus: 0.15,
            initial_top_k: 20,
            hybrid_top_k: 10,
        }
    }
}

/// Diversity filter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiversityConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum pairwise word-Jaccard overlap between accepted chunks.
    #[serde(default = "default_diversity_threshold")]
    pub threshold: f32,

    /// Maximum accepted chunks per category.
    #[serde(default = "default_max_per_category")]
    pub max_per_category: usize,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.7,
            max_per_category: 2,
        }
    }
}

/// Precision re-ranking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankConfig {
    /// Shortlist size entering the precision passes.
    #[serde(default = "default_pre_rerank_top_k")]
    pub pre_rerank_top_k: usize,

    /// Final selection size.
    #[serde(default = "default_final_top_k")]
    pub final_top_k: usize,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            pre_rerank_top_k: 8,
            final_top_k: 3,
        }
    }
}

/// Anti-repetition session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Ring buffer capacity for remembered turns.
    #[serde(default = "default_memory_size")]
    pub memory_size: usize,

    /// Term-usage counter TTL in seconds.
    #[serde(default = "default_usage_ttl_secs")]
    pub usage_ttl_secs: u64,

    /// Per-use penalty factor applied at medium/high risk.
    #[serde(default = "default_diversity_enforcement")]
    pub diversity_enforcement: f32,

    /// Answer-overlap threshold triggering the diversifying suffix.
    #[serde(default = "default_repetition_threshold")]
    pub repetition_threshold: f32,

    /// Bonus for unseen-category chunks at high risk.
    #[serde(default = "default_novelty_bonus")]
    pub novelty_bonus: f32,

    /// Risk above this is high.
    #[serde(default = "default_high_risk")]
    pub high_risk: f32,

    /// Risk above this (and at most `high_risk`) is medium.
    #[serde(default = "default_medium_risk")]
    pub medium_risk: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            memory_size: 5,
            usage_ttl_secs: 3600,
            diversity_enforcement: 0.1,
            repetition_threshold: 0.8,
            novelty_bonus: 0.3,
            high_risk: 0.7,
            medium_risk: 0.4,
        }
    }
}

/// Context assembly configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Token budget for the assembled context.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Minimum remaining budget worth truncating a chunk into.
    #[serde(default = "default_min_tail_tokens")]
    pub min_tail_tokens: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            min_tail_tokens: 50,
        }
    }
}

/// User-facing message templates. Defaults match the Turkish HR assistant
/// this engine was built for; deployments substitute their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Messages {
    /// Static answer when no relevant chunk survives the pipeline.
    #[serde(default = "default_fallback_message")]
    pub fallback: String,

    /// Suffix appended when consecutive answers overlap too much.
    #[serde(default = "default_diversify_suffix")]
    pub diversify_suffix: String,

    /// Base generation directive.
    #[serde(default = "default_prompt_base")]
    pub prompt_base: String,

    /// Directive addition at medium repetition risk.
    #[serde(default = "default_prompt_moderate")]
    pub prompt_moderate: String,

    /// Directive addition at high repetition risk.
    #[serde(default = "default_prompt_aggressive")]
    pub prompt_aggressive: String,

    /// Label prefixing the previous-answer excerpt in diversification
    /// directives.
    #[serde(default = "default_previous_answer_label")]
    pub previous_answer_label: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            fallback: default_fallback_message(),
            diversify_suffix: default_diversify_suffix(),
            prompt_base: default_prompt_base(),
            prompt_moderate: default_prompt_moderate(),
            prompt_aggressive: default_prompt_aggressive(),
            previous_answer_label: default_previous_answer_label(),
        }
    }
}

// Default value functions

fn default_true() -> bool {
    true
}

fn default_max_expansion_terms() -> usize {
    8
}

fn default_synonyms_per_term() -> usize {
    3
}

fn default_k1() -> f32 {
    1.5
}

fn default_b() -> f32 {
    0.75
}

fn default_original_term_weight() -> f32 {
    1.5
}

fn default_category_bonus() -> f32 {
    0.8
}

fn default_doc_start_bonus() -> f32 {
    0.6
}

fn default_doc_start_window() -> usize {
    150
}

fn default_exact_phrase_bonus() -> f32 {
    1.2
}

fn default_length_bonus() -> f32 {
    0.3
}

fn default_score_floor() -> f32 {
    0.1
}

fn default_cosine_weight() -> f32 {
    0.4
}

fn default_euclidean_weight() -> f32 {
    0.2
}

fn default_manhattan_weight() -> f32 {
    0.1
}

fn default_jaccard_weight() -> f32 {
    0.15
}

fn default_pearson_weight() -> f32 {
    0.15
}

fn default_vector_weight() -> f32 {
    0.7
}

fn default_keyword_weight() -> f32 {
    0.3
}

fn default_position_bonus() -> f32 {
    0.2
}

fn default_agreement_bonus() -> f32 {
    0.15
}

fn default_initial_top_k() -> usize {
    20
}

fn default_hybrid_top_k() -> usize {
    10
}

fn default_diversity_threshold() -> f32 {
    0.7
}

fn default_max_per_category() -> usize {
    2
}

fn default_pre_rerank_top_k() -> usize {
    8
}

fn default_final_top_k() -> usize {
    3
}

fn default_memory_size() -> usize {
    5
}

fn default_usage_ttl_secs() -> u64 {
    3600
}

fn default_diversity_enforcement() -> f32 {
    0.1
}

fn default_repetition_threshold() -> f32 {
    0.8
}

fn default_novelty_bonus() -> f32 {
    0.3
}

fn default_high_risk() -> f32 {
    0.7
}

fn default_medium_risk() -> f32 {
    0.4
}

fn default_fallback_message() -> String {
    "Üzgünüm, bu konu hakkında bilgi bulunamadı. Lütfen başka bir soru sorun \
     veya destek ekibiyle iletişime geçin."
        .to_string()
}

fn default_diversify_suffix() -> String {
    "\n\n*Bu konuda farklı açılardan daha detaylı bilgi almak isterseniz, \
     spesifik sorular sorabilirsiniz.*"
        .to_string()
}

fn default_prompt_base() -> String {
    "Sen bir uzman asistansın ve aşağıdaki soruya yanıt veriyorsun. Doğru ve \
     açık bir şekilde yanıtla."
        .to_string()
}

fn default_prompt_moderate() -> String {
    "NOT: Bu konuda daha önce bilgi verildi. Mevcut bilgiyi genişlet, ek \
     detaylar ekle, farklı açılardan değerlendir."
        .to_string()
}

fn default_prompt_aggressive() -> String {
    "ÖNEMLİ: Bu soru daha önce benzer sorularla yanıtlandı. Farklı bir \
     perspektif sun, yeni örnekler ver, önceki yanıtlarını tekrar etme."
        .to_string()
}

fn default_previous_answer_label() -> String {
    "Önceki yanıt".to_string()
}

fn default_max_tokens() -> usize {
    2048
}

fn default_min_tail_tokens() -> usize {
    50
}

impl SiftConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::SiftError::Config {
                message: format!("Failed to parse config: {}", e),
            }
        })?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> crate::error::Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sift").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("sift.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        // Return defaults
        Ok(Self::default())
    }
}
