// Noun lemmatizer.
//
// Reduces plural nouns to their dictionary form with a fixed irregular table
// followed by suffix rules. Only noun forms are handled, so verbs and
// adjectives pass through unchanged ("running" stays "running"). The mapping
// is total and deterministic: every input has exactly one output.

use std::collections::HashMap;

/// Irregular plurals and forms the suffix rules would get wrong.
const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("women", "woman"),
    ("men", "man"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("lives", "life"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("wolves", "wolf"),
    ("thieves", "thief"),
    ("loaves", "loaf"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
    ("diagnoses", "diagnosis"),
    ("indices", "index"),
    ("data", "datum"),
    ("headaches", "headache"),
    ("aches", "ache"),
    ("niches", "niche"),
    ("caches", "cache"),
    ("buses", "bus"),
];

/// Nouns whose singular ends in "ie"; the "ies" rule must not turn them into "y".
const IE_NOUNS: &[&str] = &[
    "movie", "cookie", "pie", "tie", "lie", "calorie", "rookie", "selfie", "zombie", "goalie",
    "hoodie", "freebie", "smoothie", "brownie", "genie", "veggie", "sweetie", "budgie", "auntie",
];

/// Words ending in "s" that are already base forms.
const INVARIANT: &[&str] = &[
    "news", "series", "species", "lens", "always", "perhaps", "sometimes", "afterwards",
    "towards", "whereas", "besides", "headphones", "pants", "jeans", "scissors", "glasses",
    "clothes", "thanks", "physics", "electronics", "graphics", "mathematics",
];

const MIN_LEMMA_LEN: usize = 3;

pub struct Lemmatizer {
    irregular: HashMap<&'static str, &'static str>,
    ie_nouns: Vec<&'static str>,
    invariant: Vec<&'static str>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer {
    pub fn new() -> Self {
        Self {
            irregular: IRREGULAR.iter().copied().collect(),
            ie_nouns: IE_NOUNS.to_vec(),
            invariant: INVARIANT.to_vec(),
        }
    }

    /// Reduce a lowercase ASCII token to its lemma.
    pub fn lemmatize(&self, token: &str) -> String {
        if let Some(lemma) = self.irregular.get(token) {
            return (*lemma).to_string();
        }
        if token.len() <= MIN_LEMMA_LEN || self.invariant.contains(&token) {
            return token.to_string();
        }

        let candidate = self.strip_plural(token);
        match candidate {
            Some(lemma) if lemma.len() >= MIN_LEMMA_LEN => lemma,
            _ => token.to_string(),
        }
    }

    fn strip_plural(&self, token: &str) -> Option<String> {
        if let Some(stem) = token.strip_suffix("ies") {
            let ie_form = format!("{stem}ie");
            if self.ie_nouns.contains(&ie_form.as_str()) {
                return Some(ie_form);
            }
            return Some(format!("{stem}y"));
        }
        for suffix in ["sses", "xes", "zzes", "ches", "shes"] {
            if token.ends_with(suffix) {
                return Some(token[..token.len() - 2].to_string());
            }
        }
        // "ss" (glass), "us" (status, bonus) and "is" (basis) are already singular.
        if token.ends_with("ss") || token.ends_with("us") || token.ends_with("is") {
            return None;
        }
        token.strip_suffix('s').map(str::to_string)
    }
}
