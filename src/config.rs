use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./data/abstract_stream.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_query")]
    pub query: String,
    /// Refill runs when the unrated queue holds this many items or fewer.
    #[serde(default = "default_low_water")]
    pub low_water: usize,
    /// Refill pauses once the unrated queue grows past this many items.
    #[serde(default = "default_high_water")]
    pub high_water: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            query: default_query(),
            low_water: default_low_water(),
            high_water: default_high_water(),
        }
    }
}

fn default_query() -> String {
    "state estimation".to_string()
}
fn default_low_water() -> usize {
    2
}
fn default_high_water() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    #[serde(default = "default_scoring_provider")]
    pub provider: String,
    #[serde(default = "default_scoring_timeout_secs")]
    pub timeout_secs: u64,
    /// Minimum number of training documents a term must appear in.
    #[serde(default = "default_min_df")]
    pub min_df: usize,
    /// Maximum fraction of training documents a term may appear in.
    #[serde(default = "default_max_df")]
    pub max_df: f64,
    /// Ridge regularization strength.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            provider: default_scoring_provider(),
            timeout_secs: default_scoring_timeout_secs(),
            min_df: default_min_df(),
            max_df: default_max_df(),
            alpha: default_alpha(),
        }
    }
}

fn default_scoring_provider() -> String {
    "tfidf".to_string()
}
fn default_scoring_timeout_secs() -> u64 {
    60
}
fn default_min_df() -> usize {
    1
}
fn default_max_df() -> f64 {
    0.95
}
fn default_alpha() -> f64 {
    1.0
}

/// Usage counters are only recorded when `path` is set.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DownloadConfig {
    #[serde(default = "default_download_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_download_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: default_download_dir(),
            base_url: default_download_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./papers")
}
fn default_download_base_url() -> String {
    "https://arxiv.org".to_string()
}

/// Source providers, keyed by type then instance name.
///
/// ```toml
/// [sources.arxiv.robotics]
/// query = "gyroscopic stabilization"
/// page_size = 5
/// ```
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub arxiv: BTreeMap<String, ArxivSourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArxivSourceConfig {
    #[serde(default = "default_arxiv_base_url")]
    pub base_url: String,
    /// Overrides `session.query` for this source.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Pause between page requests.
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ArxivSourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_arxiv_base_url(),
            query: None,
            page_size: default_page_size(),
            max_results: default_max_results(),
            wait_secs: default_wait_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_arxiv_base_url() -> String {
    "http://export.arxiv.org/api/query".to_string()
}
fn default_page_size() -> usize {
    5
}
fn default_max_results() -> usize {
    20
}
fn default_wait_secs() -> u64 {
    3
}
fn default_timeout_secs() -> u64 {
    30
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate session
    if config.session.high_water <= config.session.low_water {
        anyhow::bail!(
            "session.high_water ({}) must be greater than session.low_water ({})",
            config.session.high_water,
            config.session.low_water
        );
    }

    // Validate scoring
    if config.scoring.timeout_secs == 0 {
        anyhow::bail!("scoring.timeout_secs must be > 0");
    }
    if !(config.scoring.max_df > 0.0 && config.scoring.max_df <= 1.0) {
        anyhow::bail!("scoring.max_df must be in (0.0, 1.0]");
    }
    if config.scoring.alpha <= 0.0 {
        anyhow::bail!("scoring.alpha must be > 0");
    }
    match config.scoring.provider.as_str() {
        "disabled" | "tfidf" => {}
        other => anyhow::bail!(
            "Unknown scoring provider: '{}'. Must be disabled or tfidf.",
            other
        ),
    }

    // Validate sources
    for (name, source) in &config.sources.arxiv {
        if source.page_size == 0 {
            anyhow::bail!("sources.arxiv.{}.page_size must be > 0", name);
        }
        if source.timeout_secs == 0 {
            anyhow::bail!("sources.arxiv.{}.timeout_secs must be > 0", name);
        }
    }

    Ok(())
}
