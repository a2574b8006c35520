//! Snapshot statistics.
//!
//! Summarizes what the snapshot holds: how many documents were rated and
//! how, how many wait in the queue, and when the last rating happened. Used
//! by `astream stats`.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::models::Rating;
use crate::repository::ItemRepository;

/// Run the stats command: load the snapshot and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let mut repo = ItemRepository::new(config.snapshot.path.clone());
    repo.load()?;
    let stats = repo.stats();

    let size = std::fs::metadata(repo.path()).map(|m| m.len()).unwrap_or(0);
    let last_rated = repo.rated().iter().filter_map(|d| d.rated_at).max();

    println!("Abstract Stream: Snapshot Stats");
    println!("================================");
    println!();
    println!("  Snapshot:    {}", repo.path().display());
    println!("  Size:        {}", format_bytes(size));
    println!();
    println!("  Rated:       {}", stats.rated);
    for rating in Rating::ALL {
        println!("    {:<11}{}", rating.label(), stats.count(rating));
    }
    println!("  Unrated:     {}", stats.unrated);
    println!(
        "  Last rated:  {}",
        match last_rated {
            Some(ts) => format_relative(ts, Utc::now()),
            None => "never".to_string(),
        }
    );
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Format a timestamp relative to `now` (e.g. "3 hours ago").
fn format_relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = (now - ts).num_seconds();

    if delta < 0 {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        ts.format("%Y-%m-%d %H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_format_relative() {
        let now = Utc::now();
        assert_eq!(format_relative(now - Duration::seconds(5), now), "just now");
        assert_eq!(format_relative(now - Duration::minutes(1), now), "1 min ago");
        assert_eq!(format_relative(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(format_relative(now - Duration::days(2), now), "2 days ago");
    }
}
