// Topic clustering: k-means over TF-IDF vectors.
//
// Lloyd's algorithm with k-means++ seeding:
//
// 1. Seed: first centroid drawn uniformly, each next one drawn with
//    probability proportional to its squared distance from the nearest
//    centroid chosen so far.
// 2. Assign every document to its nearest centroid.
// 3. Refill empty clusters (see below), then move every centroid to the mean
//    of its documents.
// 4. Repeat until no document changes cluster or the iteration cap is hit.
//
// Documents stay sparse; only the k centroids are dense, so distances use
// ||x - c||^2 = ||x||^2 - 2 x.c + ||c||^2.
//
// An empty cluster takes the document that is farthest from its own centroid
// among clusters that can spare one, so a cluster is never left without a
// mean. Ties during assignment keep a document where it is, which is what lets
// a refilled cluster hold on to its document in the next round.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, ConvergenceWarning, Result};
use crate::text::{default_normalizer, SparseVector, TfIdfVectorizer, Vectorizer};

/// Distances closer than this are treated as ties.
const TIE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    n_clusters: usize,
    max_iter: usize,
    seed: u64,
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: 300,
            seed: 42,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Partition vectors (all of the same dimension) into `n_clusters` groups.
    pub fn fit(&self, vectors: &[SparseVector]) -> Result<Clustering> {
        let k = self.n_clusters;
        if k == 0 {
            return Err(AnalysisError::Input("number of topics must be at least 1".to_string()));
        }
        let dim = vectors.first().map(SparseVector::dim).unwrap_or(0);
        let n = vectors.len();

        // One document per topic; nothing to iterate.
        if n <= k {
            let mut centroids: Vec<Vec<f64>> = vectors.iter().map(SparseVector::to_dense).collect();
            centroids.resize(k, vec![0.0; dim]);
            return Ok(Clustering {
                assignments: (0..n).collect(),
                centroids,
                iterations: 0,
                inertia: 0.0,
                warning: None,
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = seed_plus_plus(vectors, k, &mut rng);
        let mut centroid_norms: Vec<f64> = centroids.iter().map(|c| squared(c)).collect();

        let mut assignments: Vec<Option<usize>> = vec![None; n];
        let mut iterations = 0;
        let mut last_changed = 0;
        let mut converged = false;

        for iter in 1..=self.max_iter {
            iterations = iter;
            let mut changed = 0;

            for (i, x) in vectors.iter().enumerate() {
                let nearest = nearest_centroid(x, &centroids, &centroid_norms, assignments[i]);
                if assignments[i] != Some(nearest) {
                    assignments[i] = Some(nearest);
                    changed += 1;
                }
            }

            let mut labels: Vec<usize> = assignments.iter().map(|a| a.unwrap_or(0)).collect();
            changed += refill_empty_clusters(vectors, &mut labels, &mut centroids, &centroid_norms);
            for (slot, &label) in assignments.iter_mut().zip(&labels) {
                *slot = Some(label);
            }

            centroids = means(vectors, &labels, k, dim);
            centroid_norms = centroids.iter().map(|c| squared(c)).collect();

            debug!(iteration = iter, changed, "k-means iteration");
            last_changed = changed;
            if changed == 0 {
                converged = true;
                break;
            }
        }

        let assignments: Vec<usize> = assignments.into_iter().map(|a| a.unwrap_or(0)).collect();
        let inertia = vectors
            .iter()
            .zip(&assignments)
            .map(|(x, &c)| x.squared_distance(&centroids[c], centroid_norms[c]))
            .sum();

        let warning = (!converged).then(|| ConvergenceWarning {
            algorithm: "k-means",
            iterations,
            last_change: last_changed as f64,
        });
        if let Some(warning) = &warning {
            warn!(%warning, "Topic clustering stopped at the iteration cap");
        }

        Ok(Clustering {
            assignments,
            centroids,
            iterations,
            inertia,
            warning,
        })
    }
}

/// Result of a k-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Topic id of every input vector, in input order.
    pub assignments: Vec<usize>,
    /// One dense centroid per topic.
    pub centroids: Vec<Vec<f64>>,
    pub iterations: usize,
    /// Sum of squared distances from each vector to its centroid.
    pub inertia: f64,
    pub warning: Option<ConvergenceWarning>,
}

impl Clustering {
    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Member indices of every topic, each list in input order.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.n_clusters()];
        for (doc, &topic) in self.assignments.iter().enumerate() {
            groups[topic].push(doc);
        }
        groups
    }
}

/// Clustering of raw texts, with the vectorizer that defined the space.
#[derive(Debug, Clone)]
pub struct TopicClustering {
    pub clustering: Clustering,
    pub vectorizer: TfIdfVectorizer,
}

impl TopicClustering {
    /// The `n` heaviest terms of a topic's centroid.
    pub fn top_terms(&self, topic: usize, n: usize) -> Vec<String> {
        let Some(centroid) = self.clustering.centroids.get(topic) else {
            return Vec::new();
        };
        let mut weighted: Vec<(usize, f64)> = centroid
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, w)| w > 0.0)
            .collect();
        weighted.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        weighted
            .into_iter()
            .take(n)
            .filter_map(|(i, _)| self.vectorizer.vocabulary().term(i).map(str::to_string))
            .collect()
    }

    /// Human-readable label from a topic's top three terms.
    pub fn label(&self, topic: usize) -> String {
        let terms = self.top_terms(topic, 3);
        if terms.is_empty() {
            format!("topic {topic}")
        } else {
            terms.join(" / ")
        }
    }
}

/// Normalize, vectorize with TF-IDF and cluster raw texts into `k` topics.
pub fn cluster<S: AsRef<str>>(texts: &[S], k: usize, seed: u64) -> Result<TopicClustering> {
    let corpus = default_normalizer().normalize_all(texts);
    cluster_tokens(&corpus, &KMeans::new(k).with_seed(seed))
}

/// Cluster already normalized token sequences.
pub fn cluster_tokens(corpus: &[Vec<String>], kmeans: &KMeans) -> Result<TopicClustering> {
    let (vectorizer, vectors) = TfIdfVectorizer::fit_transform(corpus);
    let clustering = kmeans.fit(&vectors)?;
    info!(
        documents = corpus.len(),
        topics = clustering.n_clusters(),
        iterations = clustering.iterations,
        inertia = clustering.inertia,
        "Clustered documents into topics"
    );
    Ok(TopicClustering {
        clustering,
        vectorizer,
    })
}

fn squared(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// k-means++ seeding. When every remaining document coincides with a chosen
/// centroid, the lowest-index unchosen document is used.
fn seed_plus_plus(vectors: &[SparseVector], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = vectors.len();
    let mut chosen = vec![false; n];
    let first = rng.random_range(0..n);
    chosen[first] = true;
    let mut centroids = vec![vectors[first].to_dense()];

    let first_norm = squared(&centroids[0]);
    let mut nearest: Vec<f64> = vectors
        .iter()
        .map(|x| x.squared_distance(&centroids[0], first_norm))
        .collect();

    while centroids.len() < k {
        let total: f64 = (0..n).filter(|&i| !chosen[i]).map(|i| nearest[i]).sum();
        let pick = if total > TIE_EPSILON {
            let mut target = rng.random::<f64>() * total;
            let mut pick = None;
            for i in (0..n).filter(|&i| !chosen[i] && nearest[i] > 0.0) {
                pick = Some(i);
                target -= nearest[i];
                if target <= 0.0 {
                    break;
                }
            }
            pick
        } else {
            None
        };
        let Some(next) = pick.or_else(|| (0..n).find(|&i| !chosen[i])) else {
            break;
        };

        chosen[next] = true;
        let centroid = vectors[next].to_dense();
        let norm = squared(&centroid);
        for (i, x) in vectors.iter().enumerate() {
            nearest[i] = nearest[i].min(x.squared_distance(&centroid, norm));
        }
        centroids.push(centroid);
    }
    centroids
}

/// Nearest centroid; the current cluster wins ties, otherwise the lowest id.
fn nearest_centroid(
    x: &SparseVector,
    centroids: &[Vec<f64>],
    norms: &[f64],
    current: Option<usize>,
) -> usize {
    let distances: Vec<f64> = centroids
        .iter()
        .zip(norms)
        .map(|(c, &norm)| x.squared_distance(c, norm))
        .collect();

    let mut best = 0;
    for (c, &d) in distances.iter().enumerate().skip(1) {
        if d < distances[best] - TIE_EPSILON {
            best = c;
        }
    }
    match current {
        Some(cur) if distances[cur] <= distances[best] + TIE_EPSILON => cur,
        _ => best,
    }
}

/// Move a document into every empty cluster; returns the number of moves.
///
/// The donor is the document farthest from its current centroid among
/// clusters holding more than one document (lowest index on ties). The empty
/// cluster's centroid becomes that document's vector.
fn refill_empty_clusters(
    vectors: &[SparseVector],
    labels: &mut [usize],
    centroids: &mut [Vec<f64>],
    norms: &[f64],
) -> usize {
    let k = centroids.len();
    let mut sizes = vec![0usize; k];
    for &l in labels.iter() {
        sizes[l] += 1;
    }

    let mut moves = 0;
    for empty in 0..k {
        if sizes[empty] > 0 {
            continue;
        }
        let mut donor: Option<(usize, f64)> = None;
        for (i, x) in vectors.iter().enumerate() {
            let own = labels[i];
            if sizes[own] < 2 {
                continue;
            }
            let d = x.squared_distance(&centroids[own], norms[own]);
            if donor.map_or(true, |(_, best)| d > best) {
                donor = Some((i, d));
            }
        }
        let Some((doc, _)) = donor else {
            break;
        };

        debug!(topic = empty, document = doc, "Refilling empty cluster");
        sizes[labels[doc]] -= 1;
        sizes[empty] += 1;
        labels[doc] = empty;
        centroids[empty] = vectors[doc].to_dense();
        moves += 1;
    }
    moves
}

/// Mean vector of every cluster; an empty cluster keeps a zero centroid.
fn means(vectors: &[SparseVector], labels: &[usize], k: usize, dim: usize) -> Vec<Vec<f64>> {
    let mut sums = vec![vec![0.0; dim]; k];
    let mut counts = vec![0usize; k];
    for (x, &l) in vectors.iter().zip(labels) {
        counts[l] += 1;
        for (j, v) in x.iter() {
            sums[l][j] += v;
        }
    }
    for (sum, &count) in sums.iter_mut().zip(&counts) {
        if count > 0 {
            let inv = 1.0 / count as f64;
            sum.iter_mut().for_each(|v| *v *= inv);
        }
    }
    sums
}
