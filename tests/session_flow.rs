//! End-to-end session flows against in-memory sources and a temp snapshot.

use std::time::Duration;

use abstract_stream::config::ScoringConfig;
use abstract_stream::models::{Document, Rating};
use abstract_stream::refill::RefillPipeline;
use abstract_stream::repository::ItemRepository;
use abstract_stream::scoring::{DisabledScorer, TfidfScorer};
use abstract_stream::session::Session;
use abstract_stream::traits::{IterCursor, RecordCursor, Scorer, SourceProvider, SourceRegistry};
use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

struct ListSource {
    name: String,
    docs: Vec<Document>,
}

#[async_trait]
impl SourceProvider for ListSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> &str {
        "list"
    }

    async fn records(&self, _query: &str) -> Result<Box<dyn RecordCursor>> {
        Ok(Box::new(IterCursor::new(self.docs.clone())))
    }
}

fn list(name: &str, docs: Vec<Document>) -> Box<dyn SourceProvider> {
    Box::new(ListSource {
        name: name.to_string(),
        docs,
    })
}

fn doc(id: &str, title: &str, prng: f64) -> Document {
    Document::with_prng(id, title, "", prng)
}

fn session(tmp: &TempDir, sources: Vec<Box<dyn SourceProvider>>, scorer: Box<dyn Scorer>) -> Session {
    let mut registry = SourceRegistry::new();
    for source in sources {
        registry.register(source);
    }
    Session::new(
        ItemRepository::new(tmp.path().join("snapshot.json")),
        RefillPipeline::new(registry, "q", 50, Duration::from_secs(5)),
        scorer,
        2,
    )
}

fn active_id(session: &Session) -> Option<String> {
    session.repository().active().map(|d| d.id.clone())
}

#[tokio::test]
async fn test_refill_interleaves_sources_and_drops_duplicates() {
    let tmp = TempDir::new().unwrap();
    let a = list(
        "a",
        vec![doc("a1", "A1", 0.5), doc("a2", "A2", 0.5), doc("a3", "A3", 0.5)],
    );
    let b = list("b", vec![doc("b1", "B1", 0.5), doc("a2", "A2 again", 0.5)]);
    let mut s = session(&tmp, vec![a, b], Box::new(DisabledScorer));

    s.explore(false).await.unwrap();
    let mut order = vec![active_id(&s).unwrap()];
    order.extend(s.repository().unrated().iter().map(|d| d.id.clone()));
    assert_eq!(order, vec!["a1", "b1", "a2", "a3"]);
}

#[tokio::test]
async fn test_ratings_survive_a_new_session() {
    let tmp = TempDir::new().unwrap();
    let docs = vec![
        doc("1", "First", 0.9),
        doc("2", "Second", 0.8),
        doc("3", "Third", 0.7),
        doc("4", "Fourth", 0.6),
    ];

    {
        let mut s = session(&tmp, vec![list("l", docs.clone())], Box::new(DisabledScorer));
        s.load().unwrap();
        s.discover(true).await.unwrap();
        s.mark_liked().await.unwrap();
        s.skip().await.unwrap();
        s.mark_disliked().await.unwrap();
    }

    let mut s = session(&tmp, vec![list("l", docs)], Box::new(DisabledScorer));
    s.load().unwrap();
    let stats = s.repository().stats();
    assert_eq!(stats.count(Rating::Liked), 1);
    assert_eq!(stats.count(Rating::Disliked), 1);
    assert_eq!(stats.rated, 2);
    // Skipped "2" and still-queued "4" come back as unrated.
    assert_eq!(stats.unrated, 2);

    let mut seen = Vec::new();
    s.discover(false).await.unwrap();
    while let Some(id) = active_id(&s) {
        seen.push(id);
        s.skip().await.unwrap();
    }
    seen.sort();
    assert_eq!(seen, vec!["2", "4"]);
}

#[tokio::test]
async fn test_tfidf_ranks_similar_documents_first() {
    let tmp = TempDir::new().unwrap();
    let first = vec![
        doc("r1", "gyroscope balance control of a wheel robot", 0.99),
        doc("r2", "lobster fishing regulations in maine", 0.98),
    ];
    let later = vec![
        doc("c1", "lobster harvest quotas", 0.1),
        doc("c2", "gyroscope stabilized wheel robot", 0.1),
    ];
    let scorer = TfidfScorer::new(&ScoringConfig::default()).with_seed(7);
    let mut s = session(
        &tmp,
        vec![list("first", first), list("later", later)],
        Box::new(scorer),
    );

    s.explore(false).await.unwrap();
    assert_eq!(active_id(&s).as_deref(), Some("r1"));
    s.mark_liked().await.unwrap();
    assert_eq!(active_id(&s).as_deref(), Some("r2"));
    s.mark_disliked().await.unwrap();

    // Both candidates tie on prng; discover ranks by the fitted scores.
    s.discover(false).await.unwrap();
    assert_eq!(active_id(&s).as_deref(), Some("c2"));
    let remaining = &s.repository().unrated()[0];
    assert_eq!(remaining.id, "c1");
    let active = s.repository().active().unwrap();
    assert!(active.tfidf_score > remaining.tfidf_score);
}
