//! Scorer implementations and selection.
//!
//! - **[`DisabledScorer`]**: gives every candidate a neutral `tfidf_score` of 0.0.
//! - **[`TfidfScorer`]**: retrains a TF-IDF ridge regressor on the rated
//!   history at every call and predicts a 0..1 relevance for each candidate.
//!
//! # Degenerate input
//!
//! | Rated history | Behaviour |
//! |---------------|-----------|
//! | empty | pass-through, every `tfidf_score` set to 0.0 |
//! | one rating class | fitted as is, no resampling |
//! | both classes | minority class resampled up to the majority count |

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ScoringConfig;
use crate::models::Document;
use crate::tfidf::{RidgeModel, SparseRow, TfidfVectorizer};
use crate::traits::Scorer;

// ============ Disabled Scorer ============

/// Neutral scorer used when `scoring.provider = "disabled"`.
pub struct DisabledScorer;

#[async_trait]
impl Scorer for DisabledScorer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn score(&self, _rated: &[Document], candidates: &[Document]) -> Result<Vec<Document>> {
        Ok(neutral(candidates))
    }
}

fn neutral(candidates: &[Document]) -> Vec<Document> {
    candidates
        .iter()
        .cloned()
        .map(|mut doc| {
            doc.tfidf_score = 0.0;
            doc
        })
        .collect()
}

// ============ TF-IDF Scorer ============

/// TF-IDF ridge regression over title and abstract.
///
/// Training runs on a blocking worker thread so that a timeout at the
/// call site can fire while the model is being fitted.
pub struct TfidfScorer {
    min_df: usize,
    max_df: f64,
    alpha: f64,
    seed: Option<u64>,
}

impl TfidfScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            min_df: config.min_df,
            max_df: config.max_df,
            alpha: config.alpha,
            seed: None,
        }
    }

    /// Fix the resampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[async_trait]
impl Scorer for TfidfScorer {
    fn name(&self) -> &str {
        "tfidf"
    }

    async fn score(&self, rated: &[Document], candidates: &[Document]) -> Result<Vec<Document>> {
        if rated.is_empty() {
            tracing::debug!("no rated documents, passing candidates through");
            return Ok(neutral(candidates));
        }
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let training = training_set(rated)?;
        let candidates = candidates.to_vec();
        let (min_df, max_df, alpha) = (self.min_df, self.max_df, self.alpha);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        tokio::task::spawn_blocking(move || {
            let training = resample(training, &mut rng);
            fit_and_predict(training, candidates, min_df, max_df, alpha)
        })
        .await
        .context("TF-IDF scoring worker panicked")
    }
}

/// One labelled training example.
#[derive(Debug, Clone)]
struct Example {
    text: String,
    target: f64,
    positive: bool,
}

fn training_set(rated: &[Document]) -> Result<Vec<Example>> {
    rated
        .iter()
        .map(|doc| match doc.rating {
            Some(rating) => Ok(Example {
                text: doc.scoring_text(),
                target: rating.target(),
                positive: rating.is_positive(),
            }),
            None => bail!("rated document '{}' has no rating", doc.id),
        })
        .collect()
}

/// Upsample the minority class with replacement to the majority count.
fn resample(examples: Vec<Example>, rng: &mut StdRng) -> Vec<Example> {
    let (positive, negative): (Vec<Example>, Vec<Example>) =
        examples.into_iter().partition(|e| e.positive);

    if positive.is_empty() || negative.is_empty() {
        tracing::debug!(
            positive = positive.len(),
            negative = negative.len(),
            "single rating class, skipping resampling"
        );
        return positive.into_iter().chain(negative).collect();
    }

    let (majority, minority) = if positive.len() >= negative.len() {
        (positive, negative)
    } else {
        (negative, positive)
    };
    let pre_size = minority.len();
    let upsampled: Vec<Example> = (0..majority.len())
        .map(|_| minority[rng.gen_range(0..minority.len())].clone())
        .collect();
    tracing::debug!("resampled from {} to {}", pre_size, upsampled.len());

    upsampled.into_iter().chain(majority).collect()
}

fn fit_and_predict(
    training: Vec<Example>,
    mut candidates: Vec<Document>,
    min_df: usize,
    max_df: f64,
    alpha: f64,
) -> Vec<Document> {
    let texts: Vec<String> = training.iter().map(|e| e.text.clone()).collect();
    let targets: Vec<f64> = training.iter().map(|e| e.target).collect();

    let vectorizer = TfidfVectorizer::fit(&texts, min_df, max_df);
    let rows: Vec<SparseRow> = texts.iter().map(|t| vectorizer.transform(t)).collect();
    let model = RidgeModel::fit(&rows, &targets, vectorizer.vocabulary_len(), alpha);

    tracing::debug!(
        train = rows.len(),
        test = candidates.len(),
        features = vectorizer.vocabulary_len(),
        "fitted TF-IDF ridge model"
    );

    for doc in candidates.iter_mut() {
        let row = vectorizer.transform(&doc.scoring_text());
        doc.tfidf_score = model.predict(&row);
    }
    candidates
}

/// Create the [`Scorer`] named by `scoring.provider`.
pub fn create_scorer(config: &ScoringConfig) -> Result<Box<dyn Scorer>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledScorer)),
        "tfidf" => Ok(Box::new(TfidfScorer::new(config))),
        other => bail!("Unknown scoring provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;

    const GYROVER: &str = "The single wheel, gyroscopically stabilized robot - Gyrover, is a dynamically\nstable but statically unstable, underactuated system. In this paper, based on\nthe dynamic model of the robot, we investigate two classes of nonholonomic\nconstraints associated with the system. Then, based on the backstepping\ntechnology, we propose a control law for balance control of Gyrover. Next,\nthrough transferring the systems states from Cartesian coordinate to polar\ncoordinate, control laws for point-to-point control and line tracking in\nCartesian space are provided.";

    fn rated(id: &str, title: &str, abstract_text: &str, rating: Rating) -> Document {
        let mut doc = Document::with_prng(id, title, abstract_text, 0.98);
        doc.rating = Some(rating);
        doc
    }

    fn sample_ratings() -> Vec<Document> {
        vec![
            rated("1", "A", GYROVER, Rating::Interested),
            rated("2", "B", GYROVER, Rating::Read),
            rated("3", "B", "lobsters pinwheels kafka kubernetes", Rating::Disliked),
        ]
    }

    fn sample_candidates() -> Vec<Document> {
        vec![
            Document::with_prng("Y", "", "lobsters", 0.1),
            Document::with_prng("Z", "", "gyroscopically", 0.2),
        ]
    }

    fn scorer() -> TfidfScorer {
        TfidfScorer::new(&ScoringConfig::default()).with_seed(7)
    }

    #[tokio::test]
    async fn test_liked_vocabulary_scores_higher() {
        let scored = scorer()
            .score(&sample_ratings(), &sample_candidates())
            .await
            .unwrap();
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].id, "Y");
        assert_eq!(scored[1].id, "Z");
        assert!(scored[0].tfidf_score < scored[1].tfidf_score);
    }

    #[tokio::test]
    async fn test_only_tfidf_score_changes() {
        let candidates = sample_candidates();
        let scored = scorer().score(&sample_ratings(), &candidates).await.unwrap();
        for (before, after) in candidates.iter().zip(&scored) {
            assert_eq!(before.prng_score, after.prng_score);
            assert_eq!(before.abstract_text, after.abstract_text);
            assert!(after.rating.is_none());
        }
    }

    #[tokio::test]
    async fn test_zero_rated_is_neutral() {
        let mut candidates = sample_candidates();
        candidates[0].tfidf_score = 0.4;
        let scored = scorer().score(&[], &candidates).await.unwrap();
        assert_eq!(scored.len(), candidates.len());
        assert!(scored.iter().all(|d| d.tfidf_score == 0.0));
    }

    #[tokio::test]
    async fn test_single_class_does_not_fail() {
        let ratings = vec![
            rated("1", "A", GYROVER, Rating::Liked),
            rated("2", "B", "kalman filtering for drones", Rating::Read),
        ];
        let scored = scorer().score(&ratings, &sample_candidates()).await.unwrap();
        assert_eq!(scored.len(), 2);
        assert!(scored.iter().all(|d| d.tfidf_score.is_finite()));
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let scored = scorer().score(&sample_ratings(), &[]).await.unwrap();
        assert!(scored.is_empty());
    }

    #[tokio::test]
    async fn test_unrated_history_is_rejected() {
        let mut ratings = sample_ratings();
        ratings[0].rating = None;
        assert!(scorer().score(&ratings, &sample_candidates()).await.is_err());
    }

    #[test]
    fn test_resample_balances_classes() {
        let examples = vec![
            Example { text: "a".into(), target: 1.0, positive: true },
            Example { text: "b".into(), target: 0.75, positive: true },
            Example { text: "c".into(), target: 0.5, positive: true },
            Example { text: "d".into(), target: 0.0, positive: false },
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let out = resample(examples, &mut rng);
        assert_eq!(out.len(), 6);
        assert_eq!(out.iter().filter(|e| e.positive).count(), 3);
        assert_eq!(out.iter().filter(|e| e.text == "d").count(), 3);
    }

    #[tokio::test]
    async fn test_disabled_scorer() {
        let scorer = create_scorer(&ScoringConfig {
            provider: "disabled".to_string(),
            ..ScoringConfig::default()
        })
        .unwrap();
        assert_eq!(scorer.name(), "disabled");
        let scored = scorer.score(&sample_ratings(), &sample_candidates()).await.unwrap();
        assert!(scored.iter().all(|d| d.tfidf_score == 0.0));
    }
}
