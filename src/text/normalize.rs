// Text normalization: raw review text to a token sequence.
//
// Steps, in order: lowercase, strip URLs, replace everything that is not a
// lowercase ASCII letter or whitespace with a space, split on whitespace,
// drop stop words, lemmatize. Every step is total, so any input (including
// the empty string) produces a token list and never an error.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex_lite::Regex;

use super::lemma::Lemmatizer;
use super::stopwords::StopWordSet;

/// A token starting with "http", a "scheme://" prefix or "www." up to the
/// next whitespace. The match must begin the text or follow a character that
/// is neither a letter nor a digit, so "thehttpclient" is left alone.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^a-z0-9])(?:http\S*|[a-z][a-z0-9+.-]*://\S*|www\.\S*)")
        .expect("URL pattern is valid")
});

static CLASSIC_NORMALIZER: LazyLock<Normalizer> =
    LazyLock::new(|| Normalizer::new(StopWordSet::Classic));
static EXTENDED_NORMALIZER: LazyLock<Normalizer> =
    LazyLock::new(|| Normalizer::new(StopWordSet::Extended));

/// The process-wide normalizer for a stop-word set, built on first use.
pub fn shared_normalizer(stop_word_set: StopWordSet) -> &'static Normalizer {
    match stop_word_set {
        StopWordSet::Classic => &CLASSIC_NORMALIZER,
        StopWordSet::Extended => &EXTENDED_NORMALIZER,
    }
}

/// The process-wide normalizer with the classic stop-word set.
pub fn default_normalizer() -> &'static Normalizer {
    shared_normalizer(StopWordSet::Classic)
}

/// Normalize with the process-wide default normalizer.
pub fn normalize(text: &str) -> Vec<String> {
    default_normalizer().normalize(text)
}

/// Stop-word filter and lemmatizer, built once and read-only afterwards.
pub struct Normalizer {
    stop_words: HashSet<String>,
    stop_word_set: StopWordSet,
    lemmatizer: Lemmatizer,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(StopWordSet::Classic)
    }
}

impl Normalizer {
    pub fn new(stop_word_set: StopWordSet) -> Self {
        Self {
            stop_words: stop_word_set.load(),
            stop_word_set,
            lemmatizer: Lemmatizer::new(),
        }
    }

    pub fn stop_word_set(&self) -> StopWordSet {
        self.stop_word_set
    }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let without_urls = URL_PATTERN.replace_all(&lower, " ");

        let letters_only: String = without_urls
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect();

        letters_only
            .split_whitespace()
            .filter(|token| !self.stop_words.contains(*token))
            .map(|token| self.lemmatizer.lemmatize(token))
            .collect()
    }

    pub fn normalize_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Vec<String>> {
        texts.iter().map(|t| self.normalize(t.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_pipeline() {
        let tokens = normalize("The batteries were GREAT, but shipping was slow!!");
        assert_eq!(tokens, vec!["battery", "great", "shipping", "slow"]);
    }

    #[test]
    fn test_strips_urls() {
        let tokens =
            normalize("See https://example.com/review?id=3 and www.shop.io/x for ftp://files kettle");
        assert_eq!(tokens, vec!["see", "kettle"]);
    }

    #[test]
    fn test_url_must_start_a_token() {
        assert_eq!(normalize("thehttpclient works"), vec!["thehttpclient", "work"]);
        assert_eq!(normalize("(http://a.io)kettle"), Vec::<String>::new());
        assert_eq!(normalize("kettle,www.shop.io lamp"), vec!["kettle", "lamp"]);
    }

    #[test]
    fn test_digits_and_accents_become_separators() {
        // The accented letter and the digits all turn into token breaks.
        let tokens = normalize("café 4stars product2go");
        assert_eq!(tokens, vec!["caf", "star", "product", "go"]);
    }

    #[test]
    fn test_empty_and_stopword_only_input() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \n\t ").is_empty());
        assert!(normalize("it is what it is").is_empty());
    }

    #[test]
    fn test_default_normalizer_is_classic() {
        assert_eq!(default_normalizer().stop_word_set(), StopWordSet::Classic);
    }
}
