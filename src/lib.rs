// reviewlens: sentiment, keyword and topic analysis for product reviews.
//
// This is the library root. `text` turns raw reviews into feature vectors,
// `sentiment` and `topics` are the models built on top, `pipeline` runs them
// over a whole dataset, and `data` / `output` are the file and terminal edges.

pub mod config;
pub mod data;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod sentiment;
pub mod status;
pub mod text;
pub mod topics;
