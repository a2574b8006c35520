//! Extension traits for sources, scorers and telemetry.
//!
//! The core never talks to the network or a model directly. It goes through
//! three narrow seams:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        SourceRegistry        │
//! │  ┌─────────┐ ┌────────────┐  │
//! │  │ arXiv   │ │  Custom    │  │ ── records(query) ──▶ RecordCursor
//! │  │ (Atom)  │ │  (Rust)    │  │
//! │  └─────────┘ └────────────┘  │
//! └──────────────────────────────┘
//!
//!   Scorer::score(rated, candidates)   ── TF-IDF ridge, disabled, custom
//!   TelemetrySink::record(operation)   ── optional usage counters
//! ```
//!
//! # Usage
//!
//! ```rust
//! use abstract_stream::traits::SourceRegistry;
//!
//! let mut sources = SourceRegistry::new();
//! // sources.register(Box::new(MySource::new()));
//! assert!(sources.is_empty());
//! ```

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::models::Document;

// ═══════════════════════════════════════════════════════════════════════
// Source Provider
// ═══════════════════════════════════════════════════════════════════════

/// A paginated external source of candidate documents.
///
/// Each call to [`records`](SourceProvider::records) starts a fresh,
/// lazy pass over the results for `query`. Pages are fetched on demand as
/// the returned cursor is drained.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use abstract_stream::models::Document;
/// use abstract_stream::traits::{IterCursor, RecordCursor, SourceProvider};
///
/// pub struct FixedSource;
///
/// #[async_trait]
/// impl SourceProvider for FixedSource {
///     fn name(&self) -> &str { "fixed" }
///
///     async fn records(&self, _query: &str) -> Result<Box<dyn RecordCursor>> {
///         let docs = vec![Document::new("1", "A title", "An abstract")];
///         Ok(Box::new(IterCursor::new(docs)))
///     }
/// }
/// ```
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Instance name (e.g. `"main"`).
    fn name(&self) -> &str;

    /// Provider type (e.g. `"arxiv"`). Custom providers default to `"custom"`.
    fn source_type(&self) -> &str {
        "custom"
    }

    /// Label used in logs and errors: `"{type}:{name}"`.
    fn source_label(&self) -> String {
        format!("{}:{}", self.source_type(), self.name())
    }

    /// Begin a new pass over the results for `query`.
    async fn records(&self, query: &str) -> Result<Box<dyn RecordCursor>>;
}

/// A single-pass, lazily filled sequence of documents.
#[async_trait]
pub trait RecordCursor: Send {
    /// Next document, `Ok(None)` once the source is exhausted.
    ///
    /// Transport failures are returned as errors and are never retried here.
    async fn next_record(&mut self) -> Result<Option<Document>>;
}

/// Cursor over an in-memory sequence.
pub struct IterCursor<I> {
    inner: I,
}

impl<I> IterCursor<I>
where
    I: Iterator<Item = Document> + Send,
{
    pub fn new<T>(docs: T) -> Self
    where
        T: IntoIterator<Item = Document, IntoIter = I>,
    {
        Self {
            inner: docs.into_iter(),
        }
    }
}

#[async_trait]
impl<I> RecordCursor for IterCursor<I>
where
    I: Iterator<Item = Document> + Send,
{
    async fn next_record(&mut self) -> Result<Option<Document>> {
        Ok(self.inner.next())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Scoring Port
// ═══════════════════════════════════════════════════════════════════════

/// A relevance model retrained from scratch on every call.
///
/// Implementations must:
/// - return exactly one document per candidate, in candidate order, with
///   only `tfidf_score` changed;
/// - not fail when `rated` is empty or holds a single rating class.
#[async_trait]
pub trait Scorer: Send + Sync {
    fn name(&self) -> &str;

    async fn score(&self, rated: &[Document], candidates: &[Document]) -> Result<Vec<Document>>;
}

// ═══════════════════════════════════════════════════════════════════════
// Telemetry
// ═══════════════════════════════════════════════════════════════════════

/// Receives the name of every public session operation.
///
/// Failures are reported back so the caller can log them; the session never
/// lets a sink error fail the operation itself.
pub trait TelemetrySink: Send {
    fn record(&mut self, operation: &str) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry of source providers, drawn from in registration order.
pub struct SourceRegistry {
    sources: Vec<Box<dyn SourceProvider>>,
}

impl SourceRegistry {
    /// Create an empty source registry.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Create a registry pre-loaded with every source in the config.
    pub fn from_config(config: &Config) -> Result<Self> {
        use crate::source_arxiv::ArxivSource;

        let mut registry = Self::new();
        for (name, cfg) in &config.sources.arxiv {
            registry.register(Box::new(ArxivSource::new(name.clone(), cfg.clone())?));
        }
        Ok(registry)
    }

    /// Register a source.
    pub fn register(&mut self, source: Box<dyn SourceProvider>) {
        self.sources.push(source);
    }

    /// Get all registered sources.
    pub fn sources(&self) -> &[Box<dyn SourceProvider>] {
        &self.sources
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Return the count of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
