//! Core data models used throughout abstract-stream.
//!
//! A [`Document`] is the unit that flows from a source provider, through
//! deduplication and scoring, into the unrated queue and finally into the
//! rated or skipped collection. Identity is the `id` field alone.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user rating. Skipping is not a rating and has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Rating {
    Disliked,
    Interested,
    Read,
    Liked,
}

impl Rating {
    /// Every rating in ascending order of value.
    pub const ALL: [Rating; 4] = [
        Rating::Disliked,
        Rating::Interested,
        Rating::Read,
        Rating::Liked,
    ];

    /// Integer stored in the snapshot: -1, 1, 2 or 3.
    pub fn value(self) -> i64 {
        match self {
            Rating::Disliked => -1,
            Rating::Interested => 1,
            Rating::Read => 2,
            Rating::Liked => 3,
        }
    }

    /// Regression target on a 0..=1 scale: `(value + 1) / 4`.
    pub fn target(self) -> f64 {
        (self.value() as f64 + 1.0) / 4.0
    }

    /// Ratings above zero form the positive class for resampling.
    pub fn is_positive(self) -> bool {
        self.value() > 0
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::Disliked => "disliked",
            Rating::Interested => "interested",
            Rating::Read => "read",
            Rating::Liked => "liked",
        }
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

impl TryFrom<i64> for Rating {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Rating::Disliked),
            1 => Ok(Rating::Interested),
            2 => Ok(Rating::Read),
            3 => Ok(Rating::Liked),
            other => Err(format!(
                "invalid rating {} (expected -1, 1, 2 or 3)",
                other
            )),
        }
    }
}

/// A candidate or rated document.
///
/// The record is open: fields this crate does not know about are kept in
/// [`extra`](Document::extra) and written back unchanged on store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub prng_score: f64,
    #[serde(default)]
    pub tfidf_score: f64,
    #[serde(default)]
    pub citation_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    /// When the rating was applied. Keeps the rated history time ordered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Create a freshly sourced document with a new `prng_score` draw.
    pub fn new(id: impl Into<String>, title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        let prng_score = rand::thread_rng().gen::<f64>();
        Self::with_prng(id, title, abstract_text, prng_score)
    }

    /// Create a document with a caller-chosen `prng_score`.
    pub fn with_prng(
        id: impl Into<String>,
        title: impl Into<String>,
        abstract_text: impl Into<String>,
        prng_score: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            abstract_text: abstract_text.into(),
            prng_score,
            tfidf_score: 0.0,
            citation_score: 0.0,
            rating: None,
            rated_at: None,
            extra: Map::new(),
        }
    }

    /// Best of the three signals, used by discovery ordering.
    pub fn best_signal(&self) -> f64 {
        self.prng_score
            .max(self.tfidf_score)
            .max(self.citation_score)
    }

    /// Text fed to the scorer.
    pub fn scoring_text(&self) -> String {
        format!("{}   {}", self.title, self.abstract_text)
    }

    pub fn view(&self) -> DocumentView<'_> {
        DocumentView { document: self }
    }
}

/// Read-only rendering of a document for display.
///
/// Formatting has no side effects; rating actions live on
/// [`Session`](crate::session::Session).
#[derive(Debug, Clone, Copy)]
pub struct DocumentView<'a> {
    document: &'a Document,
}

impl<'a> DocumentView<'a> {
    pub fn document(&self) -> &'a Document {
        self.document
    }
}

impl fmt::Display for DocumentView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = self.document;
        writeln!(f, "{}", doc.title)?;
        writeln!(
            f,
            "Scores: PRNG {:.4} TFIDF {:.4} Citation {:.4}",
            doc.prng_score, doc.tfidf_score, doc.citation_score
        )?;
        writeln!(f)?;
        for line in doc.abstract_text.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
