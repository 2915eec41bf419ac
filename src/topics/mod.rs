// Corpus-level analysis: keyword ranking and k-means topic clustering.

pub mod keywords;
pub mod kmeans;

pub use keywords::{rank, rank_tokens};
pub use kmeans::{cluster, cluster_tokens, Clustering, KMeans, TopicClustering};
