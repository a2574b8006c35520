//! The interactive triage session.
//!
//! A [`Session`] owns the repository, the refill pipeline and the scorer, and
//! drives the tick cycle: refill when the queue runs low, sort the queue by
//! the current [`SortKey`], and promote the front document to active. Rating
//! actions move the active document out, persist, and tick again.
//!
//! ```text
//!   explore / discover ──► requeue active ──► tick
//!   mark_* / skip ───────► rated | skipped ──► store ──► tick (no store)
//!
//!   tick: refill? ──► stable sort desc ──► pop front ──► active
//! ```

use std::cmp::Ordering;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

use crate::config::Config;
use crate::error::TriageError;
use crate::models::{Document, DocumentView, Rating};
use crate::refill::RefillPipeline;
use crate::repository::{ItemRepository, RepositoryStats};
use crate::scoring::create_scorer;
use crate::telemetry::UsageCounter;
use crate::traits::{Scorer, SourceRegistry, TelemetrySink};

/// Which score orders the unrated queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// `prng_score` only: a random walk through the queue.
    ByNovelty,
    /// Highest of the prng, tfidf and citation scores.
    #[default]
    ByBestSignal,
}

impl SortKey {
    pub fn key(self, doc: &Document) -> f64 {
        match self {
            SortKey::ByNovelty => doc.prng_score,
            SortKey::ByBestSignal => doc.best_signal(),
        }
    }

    /// Descending by key under the IEEE total order.
    fn compare(self, a: &Document, b: &Document) -> Ordering {
        self.key(b).total_cmp(&self.key(a))
    }
}

pub struct Session {
    repo: ItemRepository,
    pipeline: RefillPipeline,
    scorer: Box<dyn Scorer>,
    sort_key: SortKey,
    low_water: usize,
    telemetry: Option<Box<dyn TelemetrySink>>,
}

impl Session {
    pub fn new(
        repo: ItemRepository,
        pipeline: RefillPipeline,
        scorer: Box<dyn Scorer>,
        low_water: usize,
    ) -> Self {
        Self {
            repo,
            pipeline,
            scorer,
            sort_key: SortKey::default(),
            low_water,
            telemetry: None,
        }
    }

    /// Build a session from configuration: snapshot path, sources, scorer
    /// and, when `[telemetry] path` is set, a [`UsageCounter`].
    ///
    /// The snapshot is not loaded; call [`Session::load`].
    pub fn from_config(config: &Config) -> Result<Self> {
        let sources = SourceRegistry::from_config(config)?;
        let pipeline = RefillPipeline::new(
            sources,
            config.session.query.clone(),
            config.session.high_water,
            Duration::from_secs(config.scoring.timeout_secs),
        );
        let scorer = create_scorer(&config.scoring)?;
        let repo = ItemRepository::new(config.snapshot.path.clone());

        let mut session = Self::new(repo, pipeline, scorer, config.session.low_water);
        if let Some(path) = &config.telemetry.path {
            session = session.with_telemetry(Box::new(UsageCounter::open(path.clone())?));
        }
        Ok(session)
    }

    pub fn with_telemetry(mut self, sink: Box<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    pub fn repository(&self) -> &ItemRepository {
        &self.repo
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn active(&self) -> Option<DocumentView<'_>> {
        self.repo.active().map(Document::view)
    }

    pub fn load(&mut self) -> Result<()> {
        self.record("load");
        self.repo.load()
    }

    pub fn store(&mut self) -> Result<()> {
        self.record("store");
        self.repo.store()
    }

    pub fn stats(&mut self) -> RepositoryStats {
        self.record("stats");
        self.repo.stats()
    }

    /// Show documents in random order from now on.
    pub async fn explore(&mut self, store: bool) -> Result<Option<DocumentView<'_>>> {
        self.record("explore");
        self.sort_key = SortKey::ByNovelty;
        self.repo.requeue_active();
        self.tick(store).await
    }

    /// Show the strongest-signal documents first from now on.
    pub async fn discover(&mut self, store: bool) -> Result<Option<DocumentView<'_>>> {
        self.record("discover");
        self.sort_key = SortKey::ByBestSignal;
        self.repo.requeue_active();
        self.tick(store).await
    }

    pub async fn mark_disliked(&mut self) -> Result<Option<DocumentView<'_>>> {
        self.record("mark_disliked");
        self.rate(Rating::Disliked).await
    }

    pub async fn mark_interested(&mut self) -> Result<Option<DocumentView<'_>>> {
        self.record("mark_interested");
        self.rate(Rating::Interested).await
    }

    pub async fn mark_read(&mut self) -> Result<Option<DocumentView<'_>>> {
        self.record("mark_read");
        self.rate(Rating::Read).await
    }

    pub async fn mark_liked(&mut self) -> Result<Option<DocumentView<'_>>> {
        self.record("mark_liked");
        self.rate(Rating::Liked).await
    }

    /// Move the active document to the skipped list without a rating.
    pub async fn skip(&mut self) -> Result<Option<DocumentView<'_>>> {
        self.record("skip");
        let doc = self.repo.take_active().ok_or(TriageError::NoActiveItem)?;
        tracing::debug!(id = %doc.id, "skipped");
        self.repo.push_skipped(doc);
        self.repo.store()?;
        self.tick(false).await
    }

    async fn rate(&mut self, rating: Rating) -> Result<Option<DocumentView<'_>>> {
        let mut doc = self.repo.take_active().ok_or(TriageError::NoActiveItem)?;
        doc.rating = Some(rating);
        doc.rated_at = Some(Utc::now());
        tracing::debug!(id = %doc.id, rating = rating.label(), "rated");
        self.repo.push_rated(doc);
        self.repo.store()?;
        self.tick(false).await
    }

    async fn tick(&mut self, store: bool) -> Result<Option<DocumentView<'_>>> {
        if self.repo.unrated().len() <= self.low_water {
            let report = self
                .pipeline
                .refill(&mut self.repo, self.scorer.as_ref())
                .await?;
            tracing::debug!(added = report.added, rounds = report.rounds, "refill finished");
            if store {
                self.repo.store()?;
            }
        }

        let key = self.sort_key;
        let queue = self.repo.unrated_mut();
        queue.sort_by(|a, b| key.compare(a, b));
        let next = if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        };
        self.repo.set_active(next);
        self.repo.check_disjoint()?;

        Ok(self.repo.active().map(Document::view))
    }

    fn record(&mut self, operation: &str) {
        if let Some(sink) = self.telemetry.as_mut() {
            if let Err(e) = sink.record(operation) {
                tracing::warn!("telemetry failed for '{}': {:#}", operation, e);
            }
        }
    }
}
