//! Lazy deduplication against a growing seen set.

use std::collections::HashSet;

use crate::models::Document;

/// Iterator returned by [`unseen`].
pub struct Unseen<'a, I> {
    inner: I,
    seen: &'a mut HashSet<String>,
}

/// Yield only documents whose id is not yet in `seen`.
///
/// Each emitted id is inserted into `seen` before the document is returned,
/// so the set grows while the iterator is being consumed. Dropped documents
/// are logged by title. Input order is kept.
pub fn unseen<'a, T>(documents: T, seen: &'a mut HashSet<String>) -> Unseen<'a, T::IntoIter>
where
    T: IntoIterator<Item = Document>,
{
    Unseen {
        inner: documents.into_iter(),
        seen,
    }
}

impl<I> Iterator for Unseen<'_, I>
where
    I: Iterator<Item = Document>,
{
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        for doc in self.inner.by_ref() {
            if self.seen.insert(doc.id.clone()) {
                return Some(doc);
            }
            tracing::info!(id = %doc.id, "discarding duplicate: {}", doc.title);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(ids: &[&str]) -> Vec<Document> {
        ids.iter()
            .map(|id| Document::with_prng(*id, format!("title {}", id), "", 0.0))
            .collect()
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_drops_seen_and_repeats() {
        let mut seen: HashSet<String> = ["b".to_string()].into_iter().collect();
        let out: Vec<Document> = unseen(docs(&["a", "b", "c", "a"]), &mut seen).collect();
        assert_eq!(ids(&out), vec!["a", "c"]);
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_second_pass_is_empty() {
        let input = docs(&["1", "2", "2", "3"]);
        let mut seen: HashSet<String> = ["9".to_string()].into_iter().collect();
        let first: Vec<Document> = unseen(input.clone(), &mut seen).collect();
        assert_eq!(ids(&first), vec!["1", "2", "3"]);
        let second: Vec<Document> = unseen(input, &mut seen).collect();
        assert!(second.is_empty());
    }

    #[test]
    fn test_seen_grows_lazily() {
        let mut seen = HashSet::new();
        {
            let mut iter = unseen(docs(&["x", "y"]), &mut seen);
            assert_eq!(iter.next().unwrap().id, "x");
        }
        assert!(seen.contains("x"));
        assert!(!seen.contains("y"));
    }
}
