//! BM25-style lexical scoring with phrase bonuses.
//!
//! A candidate's score is the sum of three parts:
//!
//! - a BM25 term score over stop-word-filtered tokens, using normalized term
//!   frequencies on both sides and a fixed assumed average chunk length,
//! - a flat bonus when the chunk contains the whole query verbatim,
//! - a per-pair bonus for each adjacent pair of raw query words found verbatim.
//!
//! All comparisons are case-insensitive. Candidates scoring `0.0` or less are
//! dropped before ranking.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::{Bm25Params, DEFAULT_TOP_K, RagConfig};
use crate::document::{Chunk, ScoredChunk};
use crate::error::{RagError, Result};
use crate::tokenizer::{TermFrequencies, build_term_frequencies, tokenize};

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// A query analysed once and scored against many chunks.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    lowered: String,
    terms: TermFrequencies,
    words: Vec<String>,
}

impl PreparedQuery {
    /// Tokenize and lowercase `query`.
    pub fn new(query: &str) -> Self {
        let lowered = query.to_lowercase();
        let terms = build_term_frequencies(&tokenize(query));
        // Bigrams use raw words: stop words and short words still count here.
        // Leading or trailing whitespace yields an empty edge word, so " word"
        // is checked as a bigram too.
        let words = WHITESPACE_RUN.split(&lowered).map(str::to_string).collect();
        Self { lowered, terms, words }
    }

    /// Returns `true` if no chunk can match this query.
    pub fn is_blank(&self) -> bool {
        self.lowered.trim().is_empty()
    }

    /// The query's normalized term frequencies.
    pub fn terms(&self) -> &TermFrequencies {
        &self.terms
    }

    fn bigrams(&self) -> impl Iterator<Item = String> + '_ {
        self.words.windows(2).map(|pair| format!("{} {}", pair[0], pair[1]))
    }
}

/// Scores chunks against a query and ranks them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalScorer {
    params: Bm25Params,
    phrase_bonus: f64,
    bigram_bonus: f64,
}

impl Default for LexicalScorer {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

impl LexicalScorer {
    /// Create a scorer with explicit parameters.
    pub fn new(params: Bm25Params, phrase_bonus: f64, bigram_bonus: f64) -> Self {
        Self { params, phrase_bonus, bigram_bonus }
    }

    /// Create a scorer from the scoring fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.bm25, config.phrase_bonus, config.bigram_bonus)
    }

    /// BM25 contribution of the query terms present in `chunk_terms`, summed in
    /// the query's term order.
    pub fn term_score(&self, query_terms: &TermFrequencies, chunk_terms: &TermFrequencies) -> f64 {
        let Bm25Params { k1, b, avg_chunk_len } = self.params;
        let length_ratio = chunk_terms.token_count() as f64 / avg_chunk_len;

        query_terms
            .iter()
            .filter_map(|(term, query_tf)| {
                let tf = chunk_terms.get(term);
                if tf == 0.0 {
                    return None;
                }
                let numerator = tf * (k1 + 1.0);
                let denominator = tf + k1 * (1.0 - b + b * length_ratio);
                Some(query_tf * numerator / denominator)
            })
            .sum()
    }

    /// Score one chunk against a prepared query.
    pub fn score(&self, query: &PreparedQuery, chunk: &Chunk) -> f64 {
        if query.is_blank() {
            return 0.0;
        }

        let content = chunk.content.to_lowercase();
        let mut score = if query.terms.is_empty() {
            0.0
        } else {
            let chunk_terms = build_term_frequencies(&tokenize(&chunk.content));
            self.term_score(&query.terms, &chunk_terms)
        };

        if content.contains(&query.lowered) {
            score += self.phrase_bonus;
        }

        let matched_bigrams = query.bigrams().filter(|bigram| content.contains(bigram)).count();
        score += self.bigram_bonus * matched_bigrams as f64;

        score
    }

    /// Score every candidate, keep the positive ones and return the best `top_k`
    /// in descending score order. Ties keep their input order.
    pub fn rank(&self, query: &str, candidates: &[Chunk], top_k: usize) -> Vec<ScoredChunk> {
        let prepared = PreparedQuery::new(query);
        if prepared.is_blank() || candidates.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<ScoredChunk> = candidates
            .iter()
            .filter_map(|chunk| {
                let score = self.score(&prepared, chunk);
                (score > 0.0).then(|| ScoredChunk { chunk: chunk.clone(), score })
            })
            .collect();

        let matched = scored.len();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);

        debug!(candidate_count = candidates.len(), matched, returned = scored.len(), "ranked chunks");
        scored
    }
}

/// Rank `candidates` against `query` with the default parameters.
pub fn score_and_rank(query: &str, candidates: &[Chunk], top_k: usize) -> Vec<ScoredChunk> {
    LexicalScorer::default().rank(query, candidates, top_k)
}

/// [`score_and_rank`] with the default `top_k` of 6.
pub fn score_and_rank_default(query: &str, candidates: &[Chunk]) -> Vec<ScoredChunk> {
    score_and_rank(query, candidates, DEFAULT_TOP_K)
}

/// Convert a caller-supplied, possibly signed `top_k` into a result count.
///
/// # Errors
///
/// Returns [`RagError::InvalidArgument`] if `top_k` is negative.
pub fn validate_top_k(top_k: i64) -> Result<usize> {
    usize::try_from(top_k)
        .map_err(|_| RagError::InvalidArgument(format!("top_k must not be negative, got {top_k}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, document_id: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: document_id.to_string(),
            document_name: format!("{document_id}.txt"),
            content: content.to_string(),
            chunk_index: 0,
        }
    }

    #[test]
    fn containing_chunk_ranks_and_other_is_excluded() {
        let candidates = vec![
            chunk("c1", "bio", "Cellular respiration releases stored energy in the mitochondria."),
            chunk("c2", "bio", "Photosynthesis captures light energy inside chloroplasts."),
        ];
        let ranked = score_and_rank("photosynthesis", &candidates, 6);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].chunk.id, "c2");
        assert!(ranked[0].score > 0.0);
    }

    #[test]
    fn matches_hand_computed_score() {
        let candidate = chunk("c1", "bio", "Photosynthesis converts light energy");
        let ranked = score_and_rank("photosynthesis", &[candidate], 6);

        // tf = 1/4 over 4 tokens; plus the exact-phrase bonus.
        let tf = 0.25_f64;
        let bm25 = tf * 2.5 / (tf + 1.5 * (0.25 + 0.75 * (4.0 / 400.0)));
        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].score - (bm25 + 2.0)).abs() < 1e-5, "score was {}", ranked[0].score);
    }

    #[test]
    fn top_k_keeps_the_highest_scores() {
        let candidates = vec![
            chunk("c1", "d", "enzymes catalyse reactions"),
            chunk("c2", "d", "enzymes enzymes enzymes everywhere in the cell today"),
            chunk("c3", "d", "protein enzymes fold into shapes and bind substrates quickly"),
            chunk("c4", "d", "enzymes lower activation energy"),
            chunk("c5", "d", "some enzymes need cofactors to work properly in cells"),
        ];
        let all = score_and_rank("enzymes", &candidates, 10);
        assert_eq!(all.len(), 5);

        let top = score_and_rank("enzymes", &candidates, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].chunk.id, all[0].chunk.id);
        assert_eq!(top[1].chunk.id, all[1].chunk.id);
        assert!(top[0].score >= top[1].score);
    }

    #[test]
    fn phrase_bonus_is_exactly_two() {
        let scorer = LexicalScorer::default();
        let query = PreparedQuery::new("light reactions");
        let with_phrase = chunk("a", "d", "The light reactions happen in thylakoids");
        let without_phrase = chunk("b", "d", "The reactions light happen in thylakoids");

        let difference = scorer.score(&query, &with_phrase) - scorer.score(&query, &without_phrase);
        // The phrase also counts as the query's single bigram.
        assert!((difference - 2.5).abs() < 1e-5, "difference was {difference}");
    }

    #[test]
    fn bigram_bonus_uses_raw_words_including_stop_words() {
        let scorer = LexicalScorer::default();
        // Every token is a stop word, so only the bigram can score.
        let query = PreparedQuery::new("is the way");
        assert!(query.terms().is_empty());
        let candidate = chunk("a", "d", "Nobody knows which is the best path forward");
        assert!((scorer.score(&query, &candidate) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn leading_whitespace_adds_an_edge_bigram() {
        let scorer = LexicalScorer::default();
        let candidate = chunk("a", "d", "During the light reactions water is split");
        let plain = scorer.score(&PreparedQuery::new("light reactions"), &candidate);
        let padded = scorer.score(&PreparedQuery::new(" light reactions"), &candidate);
        assert!((padded - plain - 0.5).abs() < 1e-9, "difference was {}", padded - plain);
    }

    #[test]
    fn stop_word_query_without_bonus_yields_nothing() {
        let candidates = vec![chunk("a", "d", "Completely unrelated passage about geology")];
        assert!(score_and_rank("what is it", &candidates, 6).is_empty());
    }

    #[test]
    fn blank_query_and_empty_candidates_yield_nothing() {
        let candidates = vec![chunk("a", "d", "Some passage about astronomy and stars")];
        assert!(score_and_rank("", &candidates, 6).is_empty());
        assert!(score_and_rank("   ", &candidates, 6).is_empty());
        assert!(score_and_rank("astronomy", &[], 6).is_empty());
        assert!(score_and_rank("astronomy", &candidates, 0).is_empty());
    }

    #[test]
    fn ties_keep_input_order() {
        let candidates = vec![
            chunk("first", "d", "glucose storage"),
            chunk("second", "d", "glucose storage"),
        ];
        let ranked = score_and_rank_default("glucose", &candidates);
        let ids: Vec<&str> = ranked.iter().map(|s| s.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn repeated_ranking_is_bit_identical() {
        let candidates = vec![
            chunk("a", "d", "alpha beta beta gamma gamma gamma"),
            chunk("b", "d", "alpha alpha beta beta beta gamma"),
        ];
        let baseline: Vec<(String, u64)> = score_and_rank_default("alpha beta gamma", &candidates)
            .into_iter()
            .map(|s| (s.chunk.id, s.score.to_bits()))
            .collect();
        assert_eq!(baseline.len(), 2);

        for _ in 0..300 {
            let ranked: Vec<(String, u64)> =
                score_and_rank_default("alpha beta gamma", &candidates)
                    .into_iter()
                    .map(|s| (s.chunk.id, s.score.to_bits()))
                    .collect();
            assert_eq!(ranked, baseline);
        }
    }

    #[test]
    fn negative_top_k_is_rejected() {
        assert!(matches!(validate_top_k(-1), Err(RagError::InvalidArgument(_))));
        assert_eq!(validate_top_k(0).unwrap(), 0);
        assert_eq!(validate_top_k(6).unwrap(), 6);
    }
}
