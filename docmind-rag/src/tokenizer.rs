//! Term normalization for lexical scoring.
//!
//! Text is lowercased, every character outside `[a-z0-9]` and whitespace is
//! replaced by a space, and the result is split on whitespace. Tokens of two
//! characters or fewer and English stop words are discarded. Token order is
//! preserved.

use std::collections::HashSet;
use std::sync::LazyLock;

use indexmap::IndexMap;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "be", "to", "of", "and", "a", "in", "that", "have", "it", "for", "not", "on",
        "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
        "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their",
        "what", "so", "up", "out", "if", "about", "who", "get", "which", "go", "me", "when",
        "make", "can", "like", "time", "no", "just", "him", "know", "take", "people", "into",
        "year", "your", "good", "some", "could", "them", "see", "other", "than", "then", "now",
        "look", "only", "come", "its", "over", "think", "also", "back", "after", "use", "two",
        "how", "our", "work", "first", "well", "way", "even", "new", "want", "because", "any",
        "these", "give", "day", "most", "us", "is", "are", "was", "were", "has", "had", "been",
        "being", "am", "does", "did", "doing",
    ]
    .into_iter()
    .collect()
});

/// Shortest token length that survives tokenization.
const MIN_TOKEN_LEN: usize = 3;

/// Returns `true` if `word` (already lowercased) is ignored during scoring.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Tokenize text into scoring terms, in order of appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() { c } else { ' ' }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| token.len() >= MIN_TOKEN_LEN && !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Term frequencies of one text unit, normalized by its token count.
///
/// Terms keep the order of their first occurrence so that sums over them are
/// reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermFrequencies {
    frequencies: IndexMap<String, f64>,
    token_count: usize,
}

impl TermFrequencies {
    /// Normalized frequency of `term`, or `0.0` if it does not occur.
    pub fn get(&self, term: &str) -> f64 {
        self.frequencies.get(term).copied().unwrap_or(0.0)
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Returns `true` if the unit produced no tokens.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Total token count of the unit the frequencies were built from.
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Iterate over `(term, normalized frequency)` pairs in first-occurrence order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, f64> {
        self.frequencies.iter()
    }
}

/// Count each token and divide by the total number of tokens.
///
/// An empty token sequence produces an empty map.
pub fn build_term_frequencies(tokens: &[String]) -> TermFrequencies {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for token in tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }

    let total = tokens.len() as f64;
    let frequencies =
        counts.into_iter().map(|(term, count)| (term, count as f64 / total)).collect();

    TermFrequencies { frequencies, token_count: tokens.len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_short_tokens_and_stop_words() {
        let tokens = tokenize("The Calvin-cycle (in C3 plants) fixes CO2, doesn't it?");
        assert_eq!(tokens, vec!["calvin", "cycle", "plants", "fixes", "co2", "doesn"]);
    }

    #[test]
    fn preserves_token_order_and_duplicates() {
        let tokens = tokenize("enzyme substrate enzyme");
        assert_eq!(tokens, vec!["enzyme", "substrate", "enzyme"]);
    }

    #[test]
    fn non_ascii_letters_become_separators() {
        assert_eq!(tokenize("naïve café"), vec!["caf"]);
        assert_eq!(tokenize("résumé writing"), vec!["sum", "writing"]);
    }

    #[test]
    fn stop_word_list_is_fixed() {
        assert!(is_stop_word("because"));
        assert!(is_stop_word("doing"));
        assert!(!is_stop_word("photosynthesis"));
        assert_eq!(STOP_WORDS.len(), 111);
    }

    #[test]
    fn term_frequencies_are_normalized_by_token_count() {
        let tokens = tokenize("mitochondria produce energy mitochondria");
        let tf = build_term_frequencies(&tokens);
        assert_eq!(tf.token_count(), 4);
        assert_eq!(tf.len(), 3);
        assert!((tf.get("mitochondria") - 0.5).abs() < f64::EPSILON);
        assert!((tf.get("energy") - 0.25).abs() < f64::EPSILON);
        assert_eq!(tf.get("absent"), 0.0);
    }

    #[test]
    fn terms_iterate_in_first_occurrence_order() {
        let tokens = tokenize("xylem phloem xylem cambium phloem stomata");
        let tf = build_term_frequencies(&tokens);
        let terms: Vec<&str> = tf.iter().map(|(term, _)| term.as_str()).collect();
        assert_eq!(terms, vec!["xylem", "phloem", "cambium", "stomata"]);
    }

    #[test]
    fn empty_tokens_give_empty_frequencies() {
        let tf = build_term_frequencies(&tokenize("it is a to be"));
        assert!(tf.is_empty());
        assert_eq!(tf.token_count(), 0);
    }
}
