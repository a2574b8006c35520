use anyhow::Result;

use crate::config::Config;

/// Print every configured source with its effective query and paging.
pub fn list_sources(config: &Config) -> Result<()> {
    if config.sources.arxiv.is_empty() {
        println!("No sources configured. Add a [sources.arxiv.<name>] section.");
        return Ok(());
    }

    println!(
        "{:<24} {:<32} {:>6} {:>8}",
        "SOURCE", "QUERY", "PAGE", "MAX"
    );
    for (name, source) in &config.sources.arxiv {
        let query = source.query.as_deref().unwrap_or(&config.session.query);
        println!(
            "{:<24} {:<32} {:>6} {:>8}",
            format!("arxiv:{}", name),
            query,
            source.page_size,
            source.max_results
        );
    }

    Ok(())
}
