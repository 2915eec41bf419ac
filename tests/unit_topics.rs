// Unit tests for keyword ranking and topic clustering.
//
// Tests the corpus-level contracts: ranking is deterministic including tie
// order, and k-means assigns every document to exactly one topic.

use reviewlens::error::AnalysisError;
use reviewlens::text::{normalize, SparseVector, TfIdfVectorizer, Vectorizer};
use reviewlens::topics::{cluster, cluster_tokens, rank, KMeans};

const REVIEWS: [&str; 9] = [
    "Battery life is great, battery lasts all day",
    "Battery drains fast, poor battery",
    "Battery charges quickly, long battery life",
    "Shipping was slow and the box was crushed",
    "Slow shipping, crushed packaging",
    "Delivery took weeks, shipping slow",
    "Screen is bright and sharp",
    "Sharp screen, vivid colours",
    "Bright screen, sharp display",
];

// ============================================================
// Keyword ranking
// ============================================================

#[test]
fn rank_scenario_cat_dog() {
    assert_eq!(
        rank(&["cat dog", "cat cat", "dog"], 2),
        vec![("cat".to_string(), 3), ("dog".to_string(), 2)]
    );
}

#[test]
fn rank_is_deterministic() {
    let first = rank(&REVIEWS, 10);
    for _ in 0..5 {
        assert_eq!(rank(&REVIEWS, 10), first);
    }
    assert_eq!(first[0], ("battery".to_string(), 6));
}

#[test]
fn rank_includes_bigrams_and_sorts_descending() {
    let ranked = rank(&REVIEWS, 50);
    assert!(ranked.iter().any(|(t, _)| t == "slow shipping"), "{ranked:?}");
    assert!(ranked.windows(2).all(|w| {
        w[0].1 > w[1].1 || (w[0].1 == w[1].1 && w[0].0 < w[1].0)
    }));
}

#[test]
fn rank_returns_fewer_when_vocabulary_is_small() {
    let ranked = rank(&["kettle"], 10);
    assert_eq!(ranked, vec![("kettle".to_string(), 1)]);
}

// ============================================================
// Clustering
// ============================================================

#[test]
fn cluster_scenario_two_groups() {
    let topics = cluster(&["a a a", "b b b", "a a b"], 2, 42).unwrap();
    let groups = topics.clustering.groups();

    assert_eq!(groups.len(), 2);
    let mut covered: Vec<usize> = groups.iter().flatten().copied().collect();
    covered.sort_unstable();
    assert_eq!(covered, vec![0, 1, 2], "every document in exactly one group");
    assert!(groups.iter().all(|g| !g.is_empty()), "{groups:?}");
}

#[test]
fn cluster_scenario_separates_raw_terms() {
    // Raw tokens, so "a" is not dropped as a stop word.
    let corpus: Vec<Vec<String>> = ["a a a", "b b b", "a a b"]
        .iter()
        .map(|doc| doc.split_whitespace().map(str::to_string).collect())
        .collect();

    for seed in 0..20 {
        let topics = cluster_tokens(&corpus, &KMeans::new(2).with_seed(seed)).unwrap();
        assert_eq!(topics.vectorizer.vocabulary().len(), 2);
        assert!(topics.clustering.warning.is_none(), "seed {seed}");

        let groups = topics.clustering.groups();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| !g.is_empty()), "seed {seed}: {groups:?}");
        let mut covered: Vec<usize> = groups.iter().flatten().copied().collect();
        covered.sort_unstable();
        assert_eq!(covered, vec![0, 1, 2], "seed {seed}");
    }
}

#[test]
fn cluster_partitions_every_document_once() {
    for k in 1..=5 {
        let topics = cluster(&REVIEWS, k, 42).unwrap();
        assert_eq!(topics.clustering.assignments.len(), REVIEWS.len());
        assert!(topics.clustering.assignments.iter().all(|&t| t < k));
        let sizes: usize = topics.clustering.groups().iter().map(Vec::len).sum();
        assert_eq!(sizes, REVIEWS.len());
    }
}

#[test]
fn more_topics_never_fit_worse() {
    let one = cluster(&REVIEWS, 1, 42).unwrap();
    let three = cluster(&REVIEWS, 3, 42).unwrap();
    assert!(
        three.clustering.inertia <= one.clustering.inertia + 1e-9,
        "{} > {}",
        three.clustering.inertia,
        one.clustering.inertia
    );
}

#[test]
fn cluster_is_reproducible_per_seed() {
    let first = cluster(&REVIEWS, 3, 7).unwrap();
    let second = cluster(&REVIEWS, 3, 7).unwrap();
    assert_eq!(first.clustering, second.clustering);
}

#[test]
fn topic_labels_use_centroid_terms() {
    let topics = cluster(&REVIEWS, 3, 42).unwrap();
    let battery_topic = topics.clustering.assignments[0];
    assert!(
        topics.label(battery_topic).contains("battery"),
        "label was {}",
        topics.label(battery_topic)
    );
}

#[test]
fn zero_topics_is_input_error() {
    let err = cluster(&REVIEWS, 0, 42).unwrap_err();
    assert!(matches!(err, AnalysisError::Input(_)));
}

#[test]
fn identical_documents_still_terminate() {
    let corpus: Vec<Vec<String>> = (0..6).map(|_| normalize("same words here")).collect();
    let (_, vectors) = TfIdfVectorizer::fit_transform(&corpus);
    let clustering = KMeans::new(3).fit(&vectors).unwrap();
    assert_eq!(clustering.assignments.len(), 6);
    assert!(clustering.groups().iter().all(|g| !g.is_empty()));
    assert!(clustering.inertia.abs() < 1e-12);
}

#[test]
fn zero_vectors_cluster_without_panicking() {
    let vectors = vec![SparseVector::new(4, Vec::new()); 5];
    let clustering = KMeans::new(2).fit(&vectors).unwrap();
    assert_eq!(clustering.assignments.len(), 5);
}

#[test]
fn iteration_cap_is_a_warning() {
    let corpus: Vec<Vec<String>> = REVIEWS.iter().map(|r| normalize(r)).collect();
    let (_, vectors) = TfIdfVectorizer::fit_transform(&corpus);
    let clustering = KMeans::new(3).with_max_iter(1).fit(&vectors).unwrap();
    assert_eq!(clustering.iterations, 1);
    let warning = clustering.warning.expect("one iteration cannot confirm convergence");
    assert_eq!(warning.algorithm, "k-means");
}
