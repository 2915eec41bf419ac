// Text processing: normalization and vectorization shared by every model.

pub mod lemma;
pub mod normalize;
pub mod stopwords;
pub mod vectorize;

pub use normalize::{default_normalizer, normalize, shared_normalizer, Normalizer};
pub use stopwords::StopWordSet;
pub use vectorize::{CountVectorizer, SparseVector, TfIdfVectorizer, Vectorizer, Vocabulary};
