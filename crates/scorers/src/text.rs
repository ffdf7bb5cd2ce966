//! Text utilities: tokenization, TF-IDF vectorization, cosine similarity,
//! and a small lexicon-based sentiment polarity score.
//!
//! The vectorizer keeps a bounded vocabulary (most frequent terms across the
//! corpus, ties broken alphabetically for determinism), applies smoothed
//! inverse document frequency, and L2-normalizes each vector so that the dot
//! product of two vectors is their cosine similarity.

use std::collections::HashMap;

/// English stop words stripped before vectorization and keyword matching.
const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "because",
    "been", "before", "but", "by", "can", "could", "did", "do", "does", "down", "each", "few",
    "for", "from", "had", "has", "have", "he", "her", "here", "him", "his", "how", "i", "if",
    "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "out", "over", "own", "she", "so", "some",
    "such", "than", "that", "the", "their", "them", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "up", "very", "was", "we", "were", "what", "when",
    "where", "which", "while", "who", "why", "will", "with", "you", "your",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Lowercase a text and split it into alphanumeric tokens, dropping
/// single characters and stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1 && !is_stop_word(t))
        .map(|t| t.to_string())
        .collect()
}

/// Sparse L2-normalized vector: (term index, weight) pairs sorted by index
#[derive(Debug, Clone, Default)]
pub struct SparseVector(Vec<(u32, f32)>);

impl SparseVector {
    /// Dot product of two sparse vectors (cosine similarity when both are
    /// L2-normalized). Merge walk over the sorted index lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].0.cmp(&other.0[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.0[i].1 * other.0[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// TF-IDF vectorizer with a bounded vocabulary
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
}

impl TfIdfVectorizer {
    /// Fit the vectorizer on a tokenized corpus.
    ///
    /// Vocabulary keeps the `max_features` most frequent terms across the
    /// whole corpus; idf is smoothed (`ln((1+n)/(1+df)) + 1`) so no term
    /// gets a zero weight.
    pub fn fit(corpus: &[Vec<String>], max_features: usize) -> Self {
        let mut collection_counts: HashMap<&str, u64> = HashMap::new();
        let mut document_counts: HashMap<&str, u32> = HashMap::new();

        for doc in corpus {
            let mut seen: HashMap<&str, ()> = HashMap::new();
            for token in doc {
                *collection_counts.entry(token.as_str()).or_insert(0) += 1;
                if seen.insert(token.as_str(), ()).is_none() {
                    *document_counts.entry(token.as_str()).or_insert(0) += 1;
                }
            }
        }

        // Most frequent first; alphabetical tie-break keeps the vocabulary
        // stable across rebuilds.
        let mut terms: Vec<(&str, u64)> = collection_counts.into_iter().collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(max_features);
        terms.sort_by(|a, b| a.0.cmp(b.0));

        let n_docs = corpus.len() as f32;
        let mut vocabulary = HashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (index, (term, _)) in terms.into_iter().enumerate() {
            let df = document_counts.get(term).copied().unwrap_or(0) as f32;
            vocabulary.insert(term.to_string(), index as u32);
            idf.push(((1.0 + n_docs) / (1.0 + df)).ln() + 1.0);
        }

        Self { vocabulary, idf }
    }

    /// Number of terms in the fitted vocabulary
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Transform a tokenized document into an L2-normalized TF-IDF vector
    pub fn transform(&self, tokens: &[String]) -> SparseVector {
        let mut tf: HashMap<u32, f32> = HashMap::new();
        for token in tokens {
            if let Some(&index) = self.vocabulary.get(token) {
                *tf.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(u32, f32)> = tf
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index as usize]))
            .collect();
        entries.sort_unstable_by_key(|(index, _)| *index);

        let norm: f32 = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        }

        SparseVector(entries)
    }
}

/// Cosine similarity between two dense vectors of equal length.
/// Returns 0.0 when either vector is all zeros.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

// Sentiment lexicons. Reviews are short free text; a word-polarity average
// is enough signal for mood compatibility scoring.

const POSITIVE_WORDS: &[&str] = &[
    "amazing", "awesome", "beautiful", "brilliant", "charming", "delightful", "enjoyable",
    "excellent", "fantastic", "fun", "good", "great", "gripping", "hilarious", "incredible",
    "love", "loved", "masterpiece", "perfect", "spectacular", "stunning", "uplifting",
    "wonderful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "awful", "bad", "boring", "creepy", "depressing", "disappointing", "disturbing", "dreadful",
    "dull", "frightening", "hate", "hated", "horrible", "mediocre", "painful", "poor", "scary",
    "tedious", "terrible", "terrifying", "unwatchable", "worst",
];

/// Lexicon-based sentiment polarity of a text, in [-1, 1].
///
/// Average of matched word polarities; 0.0 when no lexicon word appears.
pub fn sentiment_polarity(text: &str) -> f32 {
    let mut total = 0.0f32;
    let mut matched = 0u32;
    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        if POSITIVE_WORDS.binary_search(&token).is_ok() {
            total += 1.0;
            matched += 1;
        } else if NEGATIVE_WORDS.binary_search(&token).is_ok() {
            total -= 1.0;
            matched += 1;
        }
    }
    if matched == 0 {
        0.0
    } else {
        (total / matched as f32).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Vec<String> {
        tokenize(text)
    }

    #[test]
    fn test_lexicons_are_sorted_for_binary_search() {
        assert!(STOP_WORDS.windows(2).all(|w| w[0] < w[1]));
        assert!(POSITIVE_WORDS.windows(2).all(|w| w[0] < w[1]));
        assert!(NEGATIVE_WORDS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_tokenize_strips_stop_words_and_short_tokens() {
        let tokens = tokenize("The quick brown fox is on a hill");
        assert_eq!(tokens, vec!["quick", "brown", "fox", "hill"]);
    }

    #[test]
    fn test_identical_documents_have_unit_similarity() {
        let corpus = vec![doc("space pirates raid the station"), doc("romance in paris")];
        let vectorizer = TfIdfVectorizer::fit(&corpus, 1000);

        let v = vectorizer.transform(&corpus[0]);
        assert!((v.dot(&v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_disjoint_documents_have_zero_similarity() {
        let corpus = vec![doc("space pirates raid station"), doc("romance paris love")];
        let vectorizer = TfIdfVectorizer::fit(&corpus, 1000);

        let a = vectorizer.transform(&corpus[0]);
        let b = vectorizer.transform(&corpus[1]);
        assert!(a.dot(&b).abs() < 1e-6);
    }

    #[test]
    fn test_vocabulary_is_bounded() {
        let corpus = vec![doc("alpha beta gamma delta epsilon zeta")];
        let vectorizer = TfIdfVectorizer::fit(&corpus, 3);
        assert_eq!(vectorizer.vocabulary_size(), 3);
    }

    #[test]
    fn test_dense_cosine() {
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_sentiment_polarity_signs() {
        assert!(sentiment_polarity("an amazing, wonderful masterpiece") > 0.5);
        assert!(sentiment_polarity("boring, terrible and dull") < -0.5);
        assert_eq!(sentiment_polarity("the plot concerns a detective"), 0.0);
    }

    #[test]
    fn test_sentiment_polarity_sees_every_lexicon_word() {
        for word in POSITIVE_WORDS {
            assert!(sentiment_polarity(word) > 0.0, "{word} should read positive");
        }
        for word in NEGATIVE_WORDS {
            assert!(sentiment_polarity(word) < 0.0, "{word} should read negative");
        }
    }

    #[test]
    fn test_sentiment_polarity_mixed() {
        let polarity = sentiment_polarity("great acting but a terrible script");
        assert!(polarity.abs() < 1e-6);
    }
}
