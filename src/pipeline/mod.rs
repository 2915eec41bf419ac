// Analysis workflows that combine the models over a whole dataset.

pub mod batch;

pub use batch::{analyze, AnalysisParams, AnalysisSession};
