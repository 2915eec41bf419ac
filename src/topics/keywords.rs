// Keyword ranking by raw n-gram frequency.
//
// Every unigram and bigram of the normalized corpus is counted with a count
// vectorizer, the columns are summed over all documents, and the most frequent
// terms win. Ties are broken alphabetically so the ranking never depends on
// hash order.

use tracing::info;

use crate::text::{default_normalizer, CountVectorizer, Vectorizer};

/// Rank the `top_n` most frequent unigrams and bigrams in a set of raw texts.
pub fn rank<S: AsRef<str>>(texts: &[S], top_n: usize) -> Vec<(String, usize)> {
    let corpus = default_normalizer().normalize_all(texts);
    rank_tokens(&corpus, top_n)
}

/// Rank over already normalized token sequences.
pub fn rank_tokens(corpus: &[Vec<String>], top_n: usize) -> Vec<(String, usize)> {
    if top_n == 0 || corpus.is_empty() {
        return Vec::new();
    }

    let (vectorizer, vectors) = CountVectorizer::fit_transform(corpus);
    let mut totals = vec![0.0f64; vectorizer.vocabulary().len()];
    for vector in &vectors {
        for (idx, count) in vector.iter() {
            totals[idx] += count;
        }
    }

    let mut ranked: Vec<(String, usize)> = vectorizer
        .vocabulary()
        .terms()
        .iter()
        .zip(totals)
        .map(|(term, total)| (term.clone(), total as usize))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(top_n);

    if let Some((term, freq)) = ranked.first() {
        info!(
            keywords = ranked.len(),
            top_keyword = term.as_str(),
            top_frequency = freq,
            "Ranked keywords"
        );
    }
    ranked
}
