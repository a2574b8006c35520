//! Refill pipeline: sources → round-robin merge → dedup → unrated → scoring.
//!
//! Runs when the unrated queue is low. Draws rounds from every configured
//! source, drops anything already seen, and appends the rest to the unrated
//! queue until the sources run dry or the queue passes the high-water mark.
//! The whole queue is then rescored against the full rated history.
//!
//! Within a session the open merger is kept between refills, so a paused
//! refill resumes where it stopped. Documents drawn after the pause are held
//! back and offered first next time. Once every source is exhausted the
//! merger is dropped; the following refill reopens the sources from the
//! beginning and the deduplicator filters out what was already seen.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::dedup::unseen;
use crate::error::TriageError;
use crate::merge::RoundRobin;
use crate::models::Document;
use crate::repository::ItemRepository;
use crate::traits::{Scorer, SourceRegistry};

/// Outcome of one refill, for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefillReport {
    /// Documents appended to the unrated queue.
    pub added: usize,
    /// True when the high-water mark stopped the refill early.
    pub paused: bool,
    /// True when every source ran dry during this refill.
    pub exhausted: bool,
    /// Non-empty merge rounds drawn since the sources were opened.
    pub rounds: u64,
}

pub struct RefillPipeline {
    sources: SourceRegistry,
    query: String,
    high_water: usize,
    score_timeout: Duration,
    merger: Option<RoundRobin>,
    pending: VecDeque<Document>,
}

impl RefillPipeline {
    pub fn new(
        sources: SourceRegistry,
        query: impl Into<String>,
        high_water: usize,
        score_timeout: Duration,
    ) -> Self {
        Self {
            sources,
            query: query.into(),
            high_water,
            score_timeout,
            merger: None,
            pending: VecDeque::new(),
        }
    }

    async fn open(&self) -> Result<RoundRobin> {
        let mut cursors = Vec::with_capacity(self.sources.len());
        for source in self.sources.sources() {
            let label = source.source_label();
            let cursor = source
                .records(&self.query)
                .await
                .with_context(|| format!("source '{}' failed to start", label))?;
            cursors.push((label, cursor));
        }
        Ok(RoundRobin::new(cursors))
    }

    /// Replenish `repo`'s unrated queue and rescore it.
    ///
    /// A source or scoring failure is returned after any documents already
    /// appended have been kept; nothing is retried.
    pub async fn refill(
        &mut self,
        repo: &mut ItemRepository,
        scorer: &dyn Scorer,
    ) -> Result<RefillReport> {
        let before = repo.unrated().len();
        let mut seen = repo.seen_ids();
        let mut report = RefillReport::default();

        let held: Vec<Document> = self.pending.drain(..).collect();
        report.paused = self.append(repo, held, &mut seen);

        if !report.paused {
            let mut merger = match self.merger.take() {
                Some(merger) => merger,
                None => self.open().await?,
            };
            loop {
                match merger.next_round().await? {
                    Some(batch) => {
                        if self.append(repo, batch, &mut seen) {
                            report.paused = true;
                            break;
                        }
                    }
                    None => {
                        report.exhausted = true;
                        break;
                    }
                }
            }
            report.rounds = merger.rounds();
            if report.paused {
                self.merger = Some(merger);
            }
        }

        report.added = repo.unrated().len() - before;
        if report.paused {
            tracing::info!(
                unrated = repo.unrated().len(),
                held = self.pending.len(),
                rounds = report.rounds,
                "early pause at high-water mark"
            );
        } else {
            tracing::info!(
                added = report.added,
                rounds = report.rounds,
                "sources exhausted"
            );
        }

        self.rescore(repo, scorer).await?;
        Ok(report)
    }

    /// Append unseen documents, holding back the rest once past high water.
    /// Returns true if the high-water mark was crossed.
    fn append<I>(&mut self, repo: &mut ItemRepository, docs: I, seen: &mut HashSet<String>) -> bool
    where
        I: IntoIterator<Item = Document>,
    {
        let mut fresh = unseen(docs, seen);
        while repo.unrated().len() <= self.high_water {
            match fresh.next() {
                Some(doc) => repo.push_unrated(doc),
                None => return false,
            }
        }
        self.pending.extend(fresh);
        true
    }

    async fn rescore(&self, repo: &mut ItemRepository, scorer: &dyn Scorer) -> Result<()> {
        let scored = tokio::time::timeout(
            self.score_timeout,
            scorer.score(repo.rated(), repo.unrated()),
        )
        .await
        .map_err(|_| TriageError::ScoringTimeout(self.score_timeout))??;

        let unrated = repo.unrated_mut();
        if scored.len() != unrated.len() {
            return Err(TriageError::ScoreMismatch {
                expected: unrated.len(),
                got: scored.len(),
            }
            .into());
        }
        if let Some((doc, got)) = unrated.iter().zip(&scored).find(|(a, b)| a.id != b.id) {
            return Err(TriageError::ScoreOrder {
                expected: doc.id.clone(),
                got: got.id.clone(),
            }
            .into());
        }
        if let Some(doc) = scored.iter().find(|d| !d.tfidf_score.is_finite()) {
            return Err(TriageError::NonFiniteScore {
                id: doc.id.clone(),
                score: doc.tfidf_score,
            }
            .into());
        }
        for (doc, scored) in unrated.iter_mut().zip(scored) {
            doc.tfidf_score = scored.tfidf_score;
        }
        tracing::debug!(scorer = scorer.name(), count = unrated.len(), "rescored unrated queue");
        Ok(())
    }
}
