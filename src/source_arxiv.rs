//! arXiv source provider.
//!
//! Pages through the arXiv export API (an Atom feed) for a search query and
//! yields one [`Document`] per entry. Pages are fetched lazily as the cursor
//! is drained, with a pause between requests to stay polite to the API.
//!
//! # Configuration
//!
//! ```toml
//! [sources.arxiv.main]
//! page_size = 5        # entries per request
//! max_results = 20     # stop after this many entries
//! wait_secs = 3        # pause between page requests
//! # query = "kalman"   # overrides session.query
//! ```
//!
//! # Termination
//!
//! A page with fewer entries than requested means the query has no more
//! results; the cursor ends there. Transport and HTTP errors are returned to
//! the caller and never retried.

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;

use crate::config::ArxivSourceConfig;
use crate::models::Document;
use crate::traits::{RecordCursor, SourceProvider};

// ═══════════════════════════════════════════════════════════════════════
// SourceProvider implementation
// ═══════════════════════════════════════════════════════════════════════

/// An arXiv source instance.
pub struct ArxivSource {
    /// Instance name (e.g. `"main"`).
    name: String,
    config: ArxivSourceConfig,
    client: reqwest::Client,
}

impl ArxivSource {
    pub fn new(name: String, config: ArxivSourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            name,
            config,
            client,
        })
    }
}

#[async_trait]
impl SourceProvider for ArxivSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> &str {
        "arxiv"
    }

    async fn records(&self, query: &str) -> Result<Box<dyn RecordCursor>> {
        let query = self.config.query.as_deref().unwrap_or(query);
        tracing::info!(source = %self.source_label(), "searching arXiv for all:{}", query);
        Ok(Box::new(ArxivCursor {
            client: self.client.clone(),
            config: self.config.clone(),
            search_query: format!("all:{}", query),
            start: 0,
            pages: 0,
            buffer: VecDeque::new(),
            done: false,
        }))
    }
}

/// Lazy pager over one query.
struct ArxivCursor {
    client: reqwest::Client,
    config: ArxivSourceConfig,
    search_query: String,
    start: usize,
    pages: u32,
    buffer: VecDeque<Document>,
    done: bool,
}

impl ArxivCursor {
    async fn fetch_page(&self, start: usize, size: usize) -> Result<Vec<Document>> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("search_query", self.search_query.clone()),
                ("start", start.to_string()),
                ("max_results", size.to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("arXiv request failed ({})", self.config.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("arXiv API error {}: {}", status, body);
        }

        let body = response
            .text()
            .await
            .context("Failed to read arXiv response body")?;
        parse_feed(&body)
    }
}

#[async_trait]
impl RecordCursor for ArxivCursor {
    async fn next_record(&mut self) -> Result<Option<Document>> {
        loop {
            if let Some(doc) = self.buffer.pop_front() {
                return Ok(Some(doc));
            }
            if self.done || self.start >= self.config.max_results {
                self.done = true;
                return Ok(None);
            }

            if self.pages > 0 && self.config.wait_secs > 0 {
                tracing::debug!("sleeping for {} seconds", self.config.wait_secs);
                tokio::time::sleep(Duration::from_secs(self.config.wait_secs)).await;
            }

            let size = self
                .config
                .page_size
                .min(self.config.max_results - self.start);
            tracing::info!("results {} - {}", self.start, self.start + size);

            let docs = self.fetch_page(self.start, size).await?;
            self.pages += 1;
            self.start += size;
            if docs.len() < size {
                tracing::info!(
                    received = docs.len(),
                    requested = size,
                    "early termination"
                );
                self.done = true;
            }
            self.buffer.extend(docs);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Atom parsing
// ═══════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
enum Field {
    Id,
    Title,
    Summary,
}

#[derive(Default)]
struct Entry {
    id: String,
    title: String,
    summary: String,
}

impl Entry {
    fn push(&mut self, field: Field, text: &str) {
        match field {
            Field::Id => self.id.push_str(text),
            Field::Title => self.title.push_str(text),
            Field::Summary => self.summary.push_str(text),
        }
    }

    fn into_document(self) -> Option<Document> {
        let id = self.id.trim();
        let id = id.rsplit("/abs/").next().unwrap_or(id).trim();
        if id.is_empty() {
            return None;
        }
        let title = self.title.split_whitespace().collect::<Vec<_>>().join(" ");
        Some(Document::new(id, title, self.summary.trim()))
    }
}

/// Extract documents from an arXiv Atom feed.
///
/// Only `entry/id`, `entry/title` and `entry/summary` are read; the feed's
/// own `<id>` and `<title>` are ignored. The document id is the part of the
/// entry id after `/abs/` (e.g. `cs/0412050v1`).
pub fn parse_feed(xml: &str) -> Result<Vec<Document>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut docs = Vec::new();
    let mut entry: Option<Entry> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"entry" => entry = Some(Entry::default()),
                b"id" if entry.is_some() => field = Some(Field::Id),
                b"title" if entry.is_some() => field = Some(Field::Title),
                b"summary" if entry.is_some() => field = Some(Field::Summary),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let (Some(entry), Some(field)) = (entry.as_mut(), field) {
                    let text = t.unescape().context("Invalid text in arXiv feed")?;
                    entry.push(field, &text);
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some(entry), Some(field)) = (entry.as_mut(), field) {
                    entry.push(field, &String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    field = None;
                    if let Some(done) = entry.take() {
                        match done.into_document() {
                            Some(doc) => docs.push(doc),
                            None => tracing::warn!("skipping arXiv entry without an id"),
                        }
                    }
                }
                b"id" | b"title" | b"summary" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => bail!(
                "Failed to parse arXiv feed at position {}: {}",
                reader.buffer_position(),
                e
            ),
            _ => {}
        }
    }

    Ok(docs)
}
