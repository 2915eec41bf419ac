// Sentiment classification: multinomial logistic regression over TF-IDF.

pub mod metrics;
pub mod model;
pub mod train;
pub mod traits;

pub use model::SentimentModel;
pub use train::{train, train_with_evaluation, SplitParams, TrainingParams};
pub use traits::{Prediction, SentimentClassifier};
