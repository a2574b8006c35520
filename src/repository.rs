//! The four item collections and their snapshot.
//!
//! ```text
//!  source ──▶ unrated ──▶ active ──┬──▶ rated     (rating transition)
//!                ▲          │      └──▶ skipped   (skip)
//!                └──────────┘ explore / discover re-queue
//! ```
//!
//! Between operations the id sets of `rated`, `unrated`, `skipped` and
//! `{active}` are pairwise disjoint; their union is the seen set used for
//! deduplication.
//!
//! # Snapshot
//!
//! ```json
//! { "rated_items": [Document...], "unrated_items": [Document...] }
//! ```
//!
//! On store, the active document is prepended and the skipped documents are
//! appended to `unrated_items`, so skipped papers can come back in a later
//! session. Writes overwrite the file wholesale and are not transactional.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dedup::unseen;
use crate::error::TriageError;
use crate::models::{Document, Rating};

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    rated_items: Vec<Document>,
    #[serde(default)]
    unrated_items: Vec<Document>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    rated_items: &'a [Document],
    unrated_items: Vec<&'a Document>,
}

/// Aggregate counts for reporting. Computing them never mutates state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryStats {
    pub rated: usize,
    /// Rated documents per rating value, keyed by the stored integer.
    pub by_rating: BTreeMap<i64, usize>,
    pub active: usize,
    pub unrated: usize,
    pub skipped: usize,
}

impl RepositoryStats {
    pub fn count(&self, rating: Rating) -> usize {
        self.by_rating.get(&rating.value()).copied().unwrap_or(0)
    }
}

impl fmt::Display for RepositoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rated {} (", self.rated)?;
        for (i, rating) in Rating::ALL.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", rating.label(), self.count(*rating))?;
        }
        write!(
            f,
            "), active {}, unrated {}, skipped {}",
            self.active, self.unrated, self.skipped
        )
    }
}

/// Owner of the rated, unrated, skipped and active collections.
#[derive(Debug)]
pub struct ItemRepository {
    path: PathBuf,
    rated: Vec<Document>,
    unrated: Vec<Document>,
    skipped: Vec<Document>,
    active: Option<Document>,
}

impl ItemRepository {
    /// Empty repository persisted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rated: Vec::new(),
            unrated: Vec::new(),
            skipped: Vec::new(),
            active: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace state with the snapshot on disk.
    ///
    /// A missing file leaves the repository untouched. Any other read or
    /// parse failure is returned. `rated` is deduplicated against itself and
    /// `unrated` against the surviving rated ids; `active` and `skipped` are
    /// cleared.
    pub fn load(&mut self) -> Result<()> {
        let start = Instant::now();

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no snapshot yet, starting empty");
                return Ok(());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))
            }
        };

        let snapshot: Snapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", self.path.display()))?;

        if let Some(doc) = snapshot.rated_items.iter().find(|d| d.rating.is_none()) {
            return Err(self.invalid(format!("rated item '{}' has no rating", doc.id)));
        }
        if let Some(doc) = snapshot.unrated_items.iter().find(|d| d.rating.is_some()) {
            return Err(self.invalid(format!("unrated item '{}' carries a rating", doc.id)));
        }

        let mut seen = HashSet::new();
        let rated: Vec<Document> = unseen(snapshot.rated_items, &mut seen).collect();
        let unrated: Vec<Document> = unseen(snapshot.unrated_items, &mut seen).collect();

        self.rated = rated;
        self.unrated = unrated;
        self.skipped.clear();
        self.active = None;

        tracing::info!(
            rated = self.rated.len(),
            unrated = self.unrated.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded snapshot {}",
            self.path.display()
        );
        Ok(())
    }

    /// Overwrite the snapshot with the current state.
    pub fn store(&self) -> Result<()> {
        let start = Instant::now();

        let snapshot = SnapshotRef {
            rated_items: &self.rated,
            unrated_items: self
                .active
                .iter()
                .chain(self.unrated.iter())
                .chain(self.skipped.iter())
                .collect(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create snapshot directory: {}", parent.display())
                })?;
            }
        }
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write snapshot: {}", self.path.display()))?;

        tracing::info!(
            rated = self.rated.len(),
            unrated = snapshot.unrated_items.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "stored snapshot {}",
            self.path.display()
        );
        Ok(())
    }

    pub fn stats(&self) -> RepositoryStats {
        let mut by_rating = BTreeMap::new();
        for rating in self.rated.iter().filter_map(|d| d.rating) {
            *by_rating.entry(rating.value()).or_insert(0) += 1;
        }
        RepositoryStats {
            rated: self.rated.len(),
            by_rating,
            active: usize::from(self.active.is_some()),
            unrated: self.unrated.len(),
            skipped: self.skipped.len(),
        }
    }

    /// Ids across all four collections.
    pub fn seen_ids(&self) -> HashSet<String> {
        self.all_documents().map(|d| d.id.clone()).collect()
    }

    /// Fail with [`TriageError::DuplicateId`] if any id lives in two places.
    pub fn check_disjoint(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for doc in self.all_documents() {
            if !ids.insert(doc.id.as_str()) {
                return Err(TriageError::DuplicateId(doc.id.clone()).into());
            }
        }
        Ok(())
    }

    fn all_documents(&self) -> impl Iterator<Item = &Document> {
        self.rated
            .iter()
            .chain(self.unrated.iter())
            .chain(self.skipped.iter())
            .chain(self.active.iter())
    }

    fn invalid(&self, reason: String) -> anyhow::Error {
        TriageError::InvalidSnapshot {
            path: self.path.clone(),
            reason,
        }
        .into()
    }

    pub fn rated(&self) -> &[Document] {
        &self.rated
    }

    pub fn unrated(&self) -> &[Document] {
        &self.unrated
    }

    pub fn skipped(&self) -> &[Document] {
        &self.skipped
    }

    pub fn active(&self) -> Option<&Document> {
        self.active.as_ref()
    }

    // Mutators used by the refill pipeline and the session. They keep the
    // collections consistent but do not check disjointness themselves.

    pub(crate) fn push_unrated(&mut self, doc: Document) {
        self.unrated.push(doc);
    }

    pub(crate) fn unrated_mut(&mut self) -> &mut Vec<Document> {
        &mut self.unrated
    }

    pub(crate) fn push_rated(&mut self, doc: Document) {
        debug_assert!(doc.rating.is_some());
        self.rated.push(doc);
    }

    pub(crate) fn push_skipped(&mut self, mut doc: Document) {
        doc.rating = None;
        self.skipped.push(doc);
    }

    pub(crate) fn take_active(&mut self) -> Option<Document> {
        self.active.take()
    }

    pub(crate) fn set_active(&mut self, doc: Option<Document>) {
        self.active = doc;
    }

    /// Put the active document back at the front of the queue.
    pub(crate) fn requeue_active(&mut self) {
        if let Some(doc) = self.active.take() {
            self.unrated.insert(0, doc);
        }
    }
}
