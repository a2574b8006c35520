//! Fair round-robin interleaving of several lazy sources.
//!
//! Each round draws exactly one document from every source that has not yet
//! run dry, in registration order, and hands the drawn documents back as a
//! single batch. A round in which nothing was drawn ends the merge.
//!
//! ```text
//! A: a1 a2 a3        round 1: [a1, b1]
//! B: b1          ──▶ round 2: [a2]
//!                    round 3: [a3]
//!                    round 4: end
//! ```

use anyhow::{Context, Result};

use crate::models::Document;
use crate::traits::RecordCursor;

struct Lane {
    name: String,
    cursor: Box<dyn RecordCursor>,
    exhausted: bool,
}

/// Round-robin merger over named cursors.
pub struct RoundRobin {
    lanes: Vec<Lane>,
    rounds: u64,
}

impl RoundRobin {
    pub fn new(sources: Vec<(String, Box<dyn RecordCursor>)>) -> Self {
        let lanes = sources
            .into_iter()
            .map(|(name, cursor)| Lane {
                name,
                cursor,
                exhausted: false,
            })
            .collect();
        Self { lanes, rounds: 0 }
    }

    /// Draw the next round.
    ///
    /// Returns `Ok(None)` once no source produced a document. A source error
    /// aborts the round and is returned with the source name attached.
    pub async fn next_round(&mut self) -> Result<Option<Vec<Document>>> {
        let mut batch = Vec::with_capacity(self.lanes.len());

        for lane in self.lanes.iter_mut().filter(|l| !l.exhausted) {
            let next = lane
                .cursor
                .next_record()
                .await
                .with_context(|| format!("source '{}' failed", lane.name))?;
            match next {
                Some(doc) => batch.push(doc),
                None => {
                    tracing::debug!(source = %lane.name, "source exhausted");
                    lane.exhausted = true;
                }
            }
        }

        if batch.is_empty() {
            return Ok(None);
        }
        self.rounds += 1;
        Ok(Some(batch))
    }

    /// Number of non-empty rounds produced so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }
}
