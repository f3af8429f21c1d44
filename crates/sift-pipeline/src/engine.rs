//! The per-query retrieval pipeline.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, info, warn};

use sift_context::{assemble, TokenCounter, WordEstimateCounter};
use sift_core::{
    ChatMessage, Chunk, ChunkStore, Embedder, Generator, Result, RetrievedContext, ScoredChunk,
    SiftConfig, SiftError,
};
use sift_expand::{Lexicon, QueryExpander};
use sift_rank::{content_quality, context_coherence, diversify, fuse, query_relevance, RerankContext};
use sift_score::{score_lexical, score_vectors};
use sift_session::SessionState;

use crate::answer::Answer;
use crate::prompt::build_directive;

/// Orchestrates one retrieval sequence per incoming question.
///
/// All scoring stages are pure; the only shared mutable state is the
/// per-session anti-repetition memory, read during scoring and written
/// exactly once at query completion. The mutex serializes that
/// read-then-append-then-write sequence when the host runs queries
/// concurrently.
pub struct RetrievalPipeline<S, E> {
    store: Arc<S>,
    embedder: Arc<E>,
    config: SiftConfig,
    lexicon: Arc<Lexicon>,
    expander: QueryExpander,
    session: Mutex<SessionState>,
    counter: Arc<dyn TokenCounter>,
}

impl<S, E> RetrievalPipeline<S, E>
where
    S: ChunkStore + Send + Sync,
    E: Embedder + Send + Sync,
{
    /// Create a pipeline with the built-in lexicon and the word-estimate
    /// token counter.
    pub fn new(store: Arc<S>, embedder: Arc<E>, config: SiftConfig) -> Self {
        Self::with_lexicon(store, embedder, config, Arc::new(Lexicon::default()))
    }

    /// Create a pipeline with a custom lexicon.
    pub fn with_lexicon(
        store: Arc<S>,
        embedder: Arc<E>,
        config: SiftConfig,
        lexicon: Arc<Lexicon>,
    ) -> Self {
        let expander = QueryExpander::new(lexicon.clone(), config.expansion.clone());
        let session = Mutex::new(SessionState::new(
            config.session.clone(),
            lexicon.clone(),
            config.messages.diversify_suffix.clone(),
        ));

        Self {
            store,
            embedder,
            config,
            lexicon,
            expander,
            session,
            counter: Arc::new(WordEstimateCounter),
        }
    }

    /// Replace the token counter (e.g. with an exact tokenizer).
    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    /// Retrieve and rank context for a question.
    ///
    /// Never fails on upstream unavailability: a dead embedder degrades
    /// to keyword-only scoring, a dead store (or an empty final
    /// selection) yields the well-defined fallback shape.
    pub async fn retrieve_context(
        &self,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<RetrievedContext> {
        let start = Instant::now();
        info!("retrieving context for {:?}", question);

        let analysis = self.lock_session()?.analyze(question, history);
        debug!(risk = ?analysis.level, strategy = %analysis.strategy, "risk analyzed");

        let expanded = self.expander.expand(question, history);
        debug!(expanded = %expanded.expanded_text, "query expanded");

        let query_embedding = match self.embedder.embed(&expanded.expanded_text).await {
            Ok(v) if !v.is_empty() => Some(v),
            Ok(_) => None,
            Err(e) => {
                warn!("embedder unavailable, falling back to keyword-only: {}", e);
                None
            }
        };

        let chunks = match self.store.fetch_all().await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("store unavailable: {}", e);
                Vec::new()
            }
        };

        if chunks.is_empty() {
            info!("no corpus available, returning fallback");
            return Ok(RetrievedContext::fallback(question, analysis.strategy));
        }

        // The two wide passes share the same immutable inputs and join
        // before fusion; fusion is commutative so completion order is
        // irrelevant.
        let fetch_k = self.config.fusion.initial_top_k;
        let (vector_results, keyword_results) = tokio::join!(
            self.vector_pass(&chunks, query_embedding.as_deref(), fetch_k),
            async { score_lexical(&chunks, &expanded, &self.config.bm25, fetch_k) },
        );

        debug!(
            vector = vector_results.len(),
            keyword = keyword_results.len(),
            "wide passes complete"
        );

        let fused = fuse(
            vector_results,
            keyword_results,
            &self.config.fusion,
            self.config.fusion.hybrid_top_k,
        );

        let mut shortlist = diversify(fused, &self.config.diversity);
        shortlist.truncate(self.config.rerank.pre_rerank_top_k);

        let ctx = RerankContext {
            expanded: &expanded,
            history,
            lexicon: &self.lexicon,
            now_ms: now_ms(),
        };
        let ranked = query_relevance(shortlist, &ctx);
        let ranked = context_coherence(ranked, &ctx);
        let mut ranked = content_quality(ranked, &ctx);

        self.lock_session()?.apply_penalties(&mut ranked, &analysis);

        sift_core::sort_descending_by(&mut ranked, |c| c.precision_score);
        ranked.truncate(self.config.rerank.final_top_k);

        if ranked.is_empty() {
            info!("no chunk survived ranking, returning fallback");
            return Ok(RetrievedContext::fallback(question, analysis.strategy));
        }

        let context_string = assemble(
            &ranked,
            question,
            &expanded.all_terms,
            history,
            self.counter.as_ref(),
            &self.config.context,
        );

        info!(
            selected = ranked.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "context retrieved"
        );

        Ok(RetrievedContext {
            question: question.to_string(),
            context_string,
            selected_chunks: ranked,
            strategy: analysis.strategy,
            fallback: false,
        })
    }

    /// Finalize an answer and commit the turn to session memory.
    ///
    /// Appends the diversifying suffix when the answer repeats the
    /// previous one, then performs the single end-of-query memory update.
    /// Returns the possibly-adjusted answer.
    pub fn complete_turn(
        &self,
        question: &str,
        answer: String,
        retrieved: &RetrievedContext,
    ) -> Result<String> {
        let mut session = self.lock_session()?;
        let finalized = session.finalize_answer(answer);
        session.record_turn(
            question,
            &finalized,
            &retrieved.selected_chunks,
            retrieved.strategy,
        );
        Ok(finalized)
    }

    /// Retrieve context and generate an answer.
    ///
    /// The application-edge composition: fallback retrieval short-circuits
    /// to the configured static message without invoking the generator; a
    /// generator failure degrades to the same message with the error
    /// recorded, never a crash.
    pub async fn answer(
        &self,
        question: &str,
        history: &[ChatMessage],
        generator: &dyn Generator,
    ) -> Result<Answer> {
        let start = Instant::now();
        let retrieved = self.retrieve_context(question, history).await?;

        if retrieved.fallback {
            return Ok(Answer::fallback(
                question,
                &self.config.messages.fallback,
                retrieved.strategy,
                start.elapsed().as_millis() as u64,
                None,
            ));
        }

        let directive = build_directive(&self.config.messages, retrieved.strategy, history);
        let raw = match generator
            .generate(&directive, &retrieved.context_string, question, history)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("generator failed: {}", e);
                return Ok(Answer::fallback(
                    question,
                    &self.config.messages.fallback,
                    retrieved.strategy,
                    start.elapsed().as_millis() as u64,
                    Some(e.to_string()),
                ));
            }
        };

        let answer = self.complete_turn(question, raw, &retrieved)?;

        let total_tokens = self.counter.count(&retrieved.context_string)
            + self.counter.count(question)
            + self.counter.count(&answer);

        Ok(Answer {
            question: question.to_string(),
            answer,
            sources: retrieved.selected_chunks.iter().map(Into::into).collect(),
            metadata: crate::answer::AnswerMetadata {
                retrieved_documents: retrieved.selected_chunks.len(),
                total_tokens,
                response_time_ms: start.elapsed().as_millis() as u64,
                strategy: retrieved.strategy,
                fallback: false,
                error: None,
            },
        })
    }

    /// Vector wide pass: native store search when available, in-process
    /// multi-metric scoring otherwise. No embedding means no vector list.
    async fn vector_pass(
        &self,
        chunks: &[Chunk],
        embedding: Option<&[f32]>,
        k: usize,
    ) -> Vec<ScoredChunk> {
        let Some(embedding) = embedding else {
            return Vec::new();
        };

        if self.store.supports_vector_search() {
            match self.store.vector_search(embedding, k).await {
                Ok(results) => return results,
                Err(e) => {
                    warn!("native vector search failed, scoring in-process: {}", e);
                }
            }
        }

        score_vectors(chunks, embedding, &self.config.vector, k)
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.session
            .lock()
            .map_err(|e| SiftError::internal(format!("session lock poisoned: {}", e)))
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
