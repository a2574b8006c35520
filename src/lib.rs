//! # Abstract Stream
//!
//! A personal literature-triage engine.
//!
//! Abstract Stream pulls candidate papers (title + abstract + id) from one
//! or more paginated sources, keeps a growing record of your ratings, and
//! keeps surfacing the single best next unseen paper according to a
//! pluggable scorer. You rate or skip it; the engine updates its queue and
//! persists state to a JSON snapshot.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐   ┌──────────┐
//! │  Sources    │──▶│ Round-robin │──▶│  Dedup   │──▶│ Unrated  │
//! │ arXiv, ...  │   │   merger    │   │ (seen)   │   │  queue   │
//! └─────────────┘   └─────────────┘   └──────────┘   └────┬─────┘
//!                                                         │ score + sort
//!                        ┌──────────┐   rate / skip  ┌────▼─────┐
//!                        │  Rated / │◀───────────────│  Active  │
//!                        │ Skipped  │                └──────────┘
//!                        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! astream sources                 # show configured sources
//! astream session                 # rate papers interactively
//! astream session --explore       # random order instead of best signal
//! astream stats                   # what the snapshot holds
//! astream download 2101.00001v2   # fetch a PDF
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Document and rating types |
//! | [`error`] | Typed error conditions |
//! | [`traits`] | Source, scorer and telemetry extension points |
//! | [`dedup`] | Drop already-seen documents |
//! | [`merge`] | Round-robin merge of sources |
//! | [`source_arxiv`] | arXiv Atom feed source |
//! | [`tfidf`] | TF-IDF vectors and ridge regression |
//! | [`scoring`] | Scorer implementations |
//! | [`repository`] | Rated / unrated / skipped / active collections and the snapshot |
//! | [`refill`] | Replenish and rescore the unrated queue |
//! | [`session`] | Tick cycle and rating transitions |
//! | [`telemetry`] | File-backed usage counters |
//! | [`download`] | PDF download |
//! | [`stats`] | Snapshot statistics |
//! | [`sources`] | Source listing |

pub mod config;
pub mod dedup;
pub mod download;
pub mod error;
pub mod merge;
pub mod models;
pub mod refill;
pub mod repository;
pub mod scoring;
pub mod session;
pub mod source_arxiv;
pub mod sources;
pub mod stats;
pub mod telemetry;
pub mod tfidf;
pub mod traits;
