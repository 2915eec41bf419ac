// Vectorizers: token sequences to sparse feature vectors.
//
// Both flavors are two-phase: `fit` builds a vocabulary (and, for TF-IDF, the
// idf table) from a corpus once; `transform` maps any token sequence into that
// fixed feature space. Terms the vocabulary has never seen are skipped, so
// transforming unseen text is always safe.
//
// Vocabulary indices are assigned in ascending term order. That keeps fitting
// deterministic (HashMap iteration order never leaks into column indices) and
// makes fitting the same corpus twice produce an identical vectorizer.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Sparse feature vector: `(column, value)` pairs sorted by column, no zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dim: usize,
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Build from unsorted entries; zero values are dropped.
    pub fn new(dim: usize, mut entries: Vec<(usize, f64)>) -> Self {
        entries.retain(|&(_, v)| v != 0.0);
        entries.sort_by_key(|&(i, _)| i);
        Self { dim, entries }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.entries.iter().map(|&(i, v)| v * dense[i]).sum()
    }

    pub fn squared_norm(&self) -> f64 {
        self.entries.iter().map(|&(_, v)| v * v).sum()
    }

    /// Squared Euclidean distance to a dense point whose squared norm is known.
    pub fn squared_distance(&self, dense: &[f64], dense_squared_norm: f64) -> f64 {
        (self.squared_norm() - 2.0 * self.dot_dense(dense) + dense_squared_norm).max(0.0)
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for &(i, v) in &self.entries {
            dense[i] = v;
        }
        dense
    }
}

/// Term to column index mapping, fixed once fitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build from any collection of terms; duplicates collapse.
    pub fn from_terms<I: IntoIterator<Item = String>>(terms: I) -> Self {
        let sorted: BTreeSet<String> = terms.into_iter().collect();
        let terms: Vec<String> = sorted.into_iter().collect();
        let mut vocabulary = Self {
            terms,
            index: HashMap::new(),
        };
        vocabulary.rebuild_index();
        vocabulary
    }

    /// Restore the lookup table after deserialization (only `terms` is stored).
    pub(crate) fn rebuild_index(&mut self) {
        self.index = self
            .terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// Shared fit/transform contract of both vectorizer flavors.
pub trait Vectorizer: Sized {
    /// Build the feature space from a corpus of token sequences.
    fn fit(corpus: &[Vec<String>]) -> Self;

    /// Map one token sequence into the fitted feature space.
    fn transform(&self, tokens: &[String]) -> SparseVector;

    fn vocabulary(&self) -> &Vocabulary;

    fn transform_all(&self, corpus: &[Vec<String>]) -> Vec<SparseVector> {
        corpus.iter().map(|doc| self.transform(doc)).collect()
    }

    fn fit_transform(corpus: &[Vec<String>]) -> (Self, Vec<SparseVector>) {
        let vectorizer = Self::fit(corpus);
        let vectors = vectorizer.transform_all(corpus);
        (vectorizer, vectors)
    }
}

/// All n-grams of `tokens` for n in `min_n..=max_n`, joined with single spaces.
pub fn ngrams(tokens: &[String], min_n: usize, max_n: usize) -> Vec<String> {
    let mut grams = Vec::new();
    for n in min_n.max(1)..=max_n {
        if n > tokens.len() {
            break;
        }
        grams.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    grams
}

/// Raw occurrence counts over unigrams and bigrams.
#[derive(Debug, Clone, PartialEq)]
pub struct CountVectorizer {
    vocabulary: Vocabulary,
}

impl CountVectorizer {
    const MIN_N: usize = 1;
    const MAX_N: usize = 2;
}

impl Vectorizer for CountVectorizer {
    fn fit(corpus: &[Vec<String>]) -> Self {
        let terms = corpus
            .iter()
            .flat_map(|doc| ngrams(doc, Self::MIN_N, Self::MAX_N));
        Self {
            vocabulary: Vocabulary::from_terms(terms),
        }
    }

    fn transform(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for gram in ngrams(tokens, Self::MIN_N, Self::MAX_N) {
            if let Some(idx) = self.vocabulary.get(&gram) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        SparseVector::new(self.vocabulary.len(), counts.into_iter().collect())
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

/// Unigram TF-IDF with smoothed idf: `ln((1 + N) / (1 + df)) + 1`.
///
/// TF is the term's count divided by the document's total token count
/// (out-of-vocabulary tokens included), so a document's weights do not grow
/// with its length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    vocabulary: Vocabulary,
    idf: Vec<f64>,
    n_documents: usize,
}

impl TfIdfVectorizer {
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn idf_of(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|i| self.idf[i])
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// Restore lookup state after deserialization and check the idf table
    /// matches the vocabulary.
    pub(crate) fn restore(&mut self) -> Result<(), String> {
        self.vocabulary.rebuild_index();
        if self.idf.len() != self.vocabulary.len() {
            return Err(format!(
                "idf table has {} entries for a vocabulary of {}",
                self.idf.len(),
                self.vocabulary.len()
            ));
        }
        Ok(())
    }
}

impl Vectorizer for TfIdfVectorizer {
    fn fit(corpus: &[Vec<String>]) -> Self {
        let vocabulary = Vocabulary::from_terms(corpus.iter().flatten().cloned());

        let mut doc_freq = vec![0usize; vocabulary.len()];
        for doc in corpus {
            let mut seen: Vec<usize> = doc.iter().filter_map(|t| vocabulary.get(t)).collect();
            seen.sort_unstable();
            seen.dedup();
            for idx in seen {
                doc_freq[idx] += 1;
            }
        }

        let n = corpus.len() as f64;
        let idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Self {
            vocabulary,
            idf,
            n_documents: corpus.len(),
        }
    }

    fn transform(&self, tokens: &[String]) -> SparseVector {
        if tokens.is_empty() {
            return SparseVector::new(self.vocabulary.len(), Vec::new());
        }
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for token in tokens {
            if let Some(idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }
        let total = tokens.len() as f64;
        let entries = counts
            .into_iter()
            .map(|(idx, count)| (idx, count as f64 / total * self.idf[idx]))
            .collect();
        SparseVector::new(self.vocabulary.len(), entries)
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(raw: &[&str]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|d| d.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_ngrams_stay_inside_a_document() {
        let corpus = docs(&["cat dog", "cat cat", "dog"]);
        let cv = CountVectorizer::fit(&corpus);
        let terms: Vec<&str> = cv.vocabulary().terms().iter().map(String::as_str).collect();
        assert_eq!(terms, vec!["cat", "cat cat", "cat dog", "dog"]);
        assert!(cv.vocabulary().get("dog cat").is_none());
    }

    #[test]
    fn test_count_transform() {
        let corpus = docs(&["good good battery", "bad battery"]);
        let cv = CountVectorizer::fit(&corpus);
        let v = cv.transform(&corpus[0]);
        assert_eq!(v.get(cv.vocabulary().get("good").unwrap()), 2.0);
        assert_eq!(v.get(cv.vocabulary().get("good good").unwrap()), 1.0);
        assert_eq!(v.get(cv.vocabulary().get("bad").unwrap()), 0.0);
        assert_eq!(v.dim(), cv.vocabulary().len());
    }

    #[test]
    fn test_idf_formula() {
        let corpus = docs(&["a b", "a c", "a"]);
        let tfidf = TfIdfVectorizer::fit(&corpus);
        // a: df = 3 -> ln(4/4) + 1 = 1
        assert!((tfidf.idf_of("a").unwrap() - 1.0).abs() < 1e-12);
        // b: df = 1 -> ln(4/2) + 1
        assert!((tfidf.idf_of("b").unwrap() - (2.0f64.ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_tf_uses_total_tokens_including_oov() {
        let tfidf = TfIdfVectorizer::fit(&docs(&["x y"]));
        let v = tfidf.transform(&docs(&["x unseen unseen unseen"])[0]);
        let x = tfidf.vocabulary().get("x").unwrap();
        assert!((v.get(x) - 0.25 * tfidf.idf()[x]).abs() < 1e-12);
        assert_eq!(v.nnz(), 1);
    }

    #[test]
    fn test_empty_document_is_zero_vector() {
        let tfidf = TfIdfVectorizer::fit(&docs(&["x y"]));
        assert!(tfidf.transform(&[]).is_zero());
    }

    #[test]
    fn test_fit_is_idempotent() {
        let corpus = docs(&["zeta alpha", "beta alpha gamma"]);
        assert_eq!(TfIdfVectorizer::fit(&corpus), TfIdfVectorizer::fit(&corpus));
    }

    #[test]
    fn test_sparse_distance_matches_dense() {
        let v = SparseVector::new(3, vec![(2, 3.0), (0, 1.0), (1, 0.0)]);
        assert_eq!(v.nnz(), 2);
        let c = vec![1.0, 1.0, 1.0];
        let expected: f64 = v
            .to_dense()
            .iter()
            .zip(&c)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        assert!((v.squared_distance(&c, 3.0) - expected).abs() < 1e-12);
    }
}
