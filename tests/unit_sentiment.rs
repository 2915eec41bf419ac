// Unit tests for the sentiment classifier.
//
// Trains small models end to end (normalize -> TF-IDF -> logistic regression)
// and checks the probability contract, tie-breaking, and that a saved model
// predicts exactly like the one that was saved.

use reviewlens::data::models::LabeledReview;
use reviewlens::error::AnalysisError;
use reviewlens::sentiment::metrics::stratified_split;
use reviewlens::sentiment::{
    train, train_with_evaluation, SentimentClassifier, SentimentModel, SplitParams, TrainingParams,
};
use reviewlens::text::StopWordSet;

fn reviews(rows: &[(&str, &str)]) -> Vec<LabeledReview> {
    rows.iter().map(|(t, l)| LabeledReview::new(*t, *l)).collect()
}

fn three_label_model() -> SentimentModel {
    let data = reviews(&[
        ("great product", "positive"),
        ("terrible and slow", "negative"),
        ("it is fine", "neutral"),
    ]);
    train(&data, &TrainingParams::default()).unwrap().model
}

fn product_reviews() -> Vec<LabeledReview> {
    reviews(&[
        ("Great kettle, boils fast and looks lovely", "positive"),
        ("Love the sturdy build, great value", "positive"),
        ("Excellent lamp, bright and great", "positive"),
        ("Works great, very happy with it", "positive"),
        ("Lovely colour and excellent quality", "positive"),
        ("Terrible, broke after a week", "negative"),
        ("Awful smell and slow shipping", "negative"),
        ("Broken on arrival, terrible packaging", "negative"),
        ("Slow, noisy and awful", "negative"),
        ("Cheap plastic broke instantly", "negative"),
        ("It is fine, does the job", "neutral"),
        ("Average product, nothing special", "neutral"),
        ("Okay for the price", "neutral"),
        ("Fine, average build", "neutral"),
        ("Does the job, nothing more", "neutral"),
    ])
}

// ============================================================
// Probability contract
// ============================================================

#[test]
fn scenario_great_and_fine() {
    let model = three_label_model();
    let prediction = model.predict("great and fine").unwrap();

    assert!(
        prediction.label == "positive" || prediction.label == "neutral",
        "got {}",
        prediction.label
    );
    assert_eq!(prediction.probabilities.len(), 3);
    let sum: f64 = prediction.probabilities.iter().map(|(_, p)| p).sum();
    assert!((sum - 1.0).abs() < 1e-9, "probabilities sum to {sum}");
    assert!(prediction.probabilities.iter().all(|(_, p)| *p > 0.0));
}

#[test]
fn probabilities_sum_to_one_for_any_text() {
    let model = three_label_model();
    for text in ["great", "terrible terrible terrible", "completely unrelated words", "?!"] {
        let prediction = model.predict(text).unwrap();
        let sum: f64 = prediction.probabilities.iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-9, "{text:?}: probabilities sum to {sum}");
        assert!(prediction.probabilities.iter().all(|(_, p)| *p >= 0.0));
        let max = prediction
            .probabilities
            .iter()
            .map(|(_, p)| *p)
            .fold(0.0, f64::max);
        assert_eq!(prediction.confidence, max);
    }
}

#[test]
fn probabilities_follow_class_order() {
    let model = three_label_model();
    let prediction = model.predict("great").unwrap();
    let labels: Vec<&str> = prediction
        .probabilities
        .iter()
        .map(|(l, _)| l.as_str())
        .collect();
    assert_eq!(labels, vec!["negative", "neutral", "positive"]);
    assert_eq!(prediction.label, "positive");
}

#[test]
fn blank_text_is_input_error() {
    let model = three_label_model();
    let err = model.predict("   ").unwrap_err();
    assert!(matches!(err, AnalysisError::Input(_)));
}

#[test]
fn stopword_only_text_predicts_from_biases() {
    let model = three_label_model();
    let a = model.predict("the and of").unwrap();
    let b = model.predict("is it").unwrap();
    assert_eq!(a, b, "texts with no known terms share one prediction");
}

#[test]
fn trained_model_separates_clear_cases() {
    let model = train(&product_reviews(), &TrainingParams::default())
        .unwrap()
        .model;
    assert_eq!(model.predict("great lovely kettle").unwrap().label, "positive");
    assert_eq!(model.predict("awful, broke, terrible").unwrap().label, "negative");
    assert_eq!(model.predict("average, does the job").unwrap().label, "neutral");
}

#[test]
fn top_terms_reflect_class() {
    let model = train(&product_reviews(), &TrainingParams::default())
        .unwrap()
        .model;
    let positive = model.classes().iter().position(|c| c == "positive").unwrap();
    let top = model.top_terms(positive, 5);
    assert!(!top.is_empty());
    assert!(top.iter().all(|(_, w)| *w > 0.0));
    assert!(
        top.windows(2).all(|w| w[0].1 >= w[1].1),
        "terms come heaviest first: {top:?}"
    );
    for (term, _) in &top {
        assert!(
            !["terrible", "awful", "broke"].contains(&term.as_str()),
            "negative term {term:?} ranked for positive"
        );
    }
}

// ============================================================
// Training validation
// ============================================================

#[test]
fn missing_label_is_data_error() {
    let data = reviews(&[("great", "positive"), ("awful", "")]);
    let err = train(&data, &TrainingParams::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::Data(_)));
}

#[test]
fn invalid_test_size_is_input_error() {
    let split = SplitParams {
        test_size: 1.5,
        seed: 42,
    };
    let err = train_with_evaluation(&product_reviews(), &TrainingParams::default(), &split)
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Input(_)));
}

#[test]
fn evaluation_holds_out_every_class() {
    let report = train_with_evaluation(
        &product_reviews(),
        &TrainingParams::default(),
        &SplitParams::default(),
    )
    .unwrap();

    assert_eq!(report.train_size + report.test_size, 15);
    assert_eq!(report.test_size, 3, "one of five per class at 20%");
    let evaluation = report.evaluation.expect("held-out rows exist");
    assert_eq!(evaluation.classes.len(), 3);
    assert!((0.0..=1.0).contains(&evaluation.accuracy));
}

#[test]
fn singleton_classes_skip_evaluation() {
    let data = reviews(&[
        ("great product", "positive"),
        ("terrible and slow", "negative"),
    ]);
    let report =
        train_with_evaluation(&data, &TrainingParams::default(), &SplitParams::default()).unwrap();
    assert!(report.evaluation.is_none());
    assert_eq!(report.test_size, 0);
}

#[test]
fn split_is_reproducible_per_seed() {
    let labels: Vec<String> = product_reviews().into_iter().map(|r| r.label).collect();
    assert_eq!(
        stratified_split(&labels, 0.2, 42),
        stratified_split(&labels, 0.2, 42)
    );
}

// ============================================================
// Artifact round-trip
// ============================================================

#[test]
fn save_load_predicts_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("model.json");

    let model = train(&product_reviews(), &TrainingParams::default())
        .unwrap()
        .model;
    model.save(&path).unwrap();
    let loaded = SentimentModel::load(&path).unwrap();

    assert_eq!(loaded, model);
    for text in ["great kettle", "slow and awful", "fine", "never seen words"] {
        assert_eq!(loaded.predict(text).unwrap(), model.predict(text).unwrap());
    }
}

#[test]
fn stop_word_set_is_saved_with_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    let params = TrainingParams {
        stop_words: StopWordSet::Extended,
        ..TrainingParams::default()
    };

    train(&product_reviews(), &params)
        .unwrap()
        .model
        .save(&path)
        .unwrap();
    let loaded = SentimentModel::load(&path).unwrap();
    assert_eq!(loaded.stop_words(), StopWordSet::Extended);
}

#[test]
fn missing_artifact_is_model_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = SentimentModel::load(dir.path().join("absent.json")).unwrap_err();
    match err.downcast_ref::<AnalysisError>() {
        Some(AnalysisError::ModelNotFound(path)) => assert!(path.ends_with("absent.json")),
        other => panic!("expected ModelNotFound, got {other:?}"),
    }
}

#[test]
fn corrupt_artifact_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(&path, "not json at all").unwrap();
    let err = SentimentModel::load(&path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AnalysisError>(),
        Some(AnalysisError::Artifact(_))
    ));
}
