// English stop-word sets.
//
// The classic set is NLTK's 179-word English list with the 26 apostrophe
// forms removed, leaving 153 words. The normalizer replaces apostrophes with
// spaces before filtering, so "don't" reaches this stage as "don" and "t",
// both of which are in the list.
//
// The extended set is the much larger stopwords-iso list shipped by the
// `stop-words` crate. It removes more noise from keyword rankings, but it also
// drops words like "great" and "fine" that carry sentiment, so it is opt-in.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stop_words::{get, LANGUAGE};

const CLASSIC_ENGLISH: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
    "will", "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain",
    "aren", "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn",
    "mustn", "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
];

/// Which stop-word list the normalizer filters with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopWordSet {
    #[default]
    Classic,
    Extended,
}

impl StopWordSet {
    /// Materialize the list as a lookup set.
    pub fn load(self) -> HashSet<String> {
        match self {
            StopWordSet::Classic => CLASSIC_ENGLISH.iter().map(|w| w.to_string()).collect(),
            StopWordSet::Extended => {
                let words: Vec<String> = get(LANGUAGE::English);
                words.into_iter().map(|w| w.to_lowercase()).collect()
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StopWordSet::Classic => "classic",
            StopWordSet::Extended => "extended",
        }
    }
}

impl FromStr for StopWordSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" | "nltk" => Ok(StopWordSet::Classic),
            "extended" | "iso" => Ok(StopWordSet::Extended),
            other => Err(format!(
                "unknown stop-word set `{other}` (expected `classic` or `extended`)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_has_every_listed_word() {
        let set = StopWordSet::Classic.load();
        assert_eq!(CLASSIC_ENGLISH.len(), 153);
        assert_eq!(set.len(), CLASSIC_ENGLISH.len(), "list has duplicates");
        assert!(set.contains("the"));
        assert!(set.contains("don"));
        assert!(!set.contains("great"));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("classic".parse::<StopWordSet>(), Ok(StopWordSet::Classic));
        assert_eq!("ISO".parse::<StopWordSet>(), Ok(StopWordSet::Extended));
        assert!("french".parse::<StopWordSet>().is_err());
    }
}
