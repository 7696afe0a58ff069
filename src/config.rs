use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::fallback::FallbackPost;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// RSS-to-JSON conversion endpoint
    #[serde(default = "default_converter_endpoint")]
    pub converter_endpoint: String,
    /// Transport timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default)]
    pub newsletter: NewsletterConfig,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

fn default_converter_endpoint() -> String {
    "https://api.rss2json.com/v1/api.json".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub name: String,
    pub title: String,
    pub url: String,
    pub max_entries: usize,
    pub id_base: i64,
    pub fallback_author: String,
    #[serde(default = "default_fallback_category")]
    pub fallback_category: String,
    /// Source name used in the default advisory ("Failed to fetch <label> feed ...")
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default)]
    pub advisory_suffix: Option<String>,
    #[serde(default = "default_profile_url")]
    pub profile_url: String,
    /// Replaces the built-in fallback dataset when non-empty
    #[serde(default)]
    pub fallback: Vec<FallbackPost>,
}

fn default_fallback_category() -> String {
    "Article".to_string()
}

fn default_label() -> String {
    "content".to_string()
}

fn default_profile_url() -> String {
    "#".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewsletterConfig {
    #[serde(default = "default_newsletter_source")]
    pub source: String,
    #[serde(default)]
    pub fallback_url: Option<String>,
    #[serde(default)]
    pub database_url: Option<String>,
}

fn default_newsletter_source() -> String {
    "hero_section".to_string()
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            source: default_newsletter_source(),
            fallback_url: None,
            database_url: None,
        }
    }
}

impl FeedConfig {
    /// Synthetic ids handed out for this feed: `(id_base, id_base + max_entries]`.
    /// `None` when the range does not fit in an `i64`.
    pub fn id_range(&self) -> Option<(i64, i64)> {
        let count = i64::try_from(self.max_entries).ok()?;
        Some((self.id_base.checked_add(1)?, self.id_base.checked_add(count)?))
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let mut names = HashSet::new();
        let mut ranges = Vec::with_capacity(self.feeds.len());
        for feed in &self.feeds {
            if feed.max_entries == 0 {
                anyhow::bail!("feed '{}': max_entries must be at least 1", feed.name);
            }
            if !names.insert(feed.name.as_str()) {
                anyhow::bail!("duplicate feed name '{}'", feed.name);
            }
            let Some(range) = feed.id_range() else {
                anyhow::bail!(
                    "feed '{}': id_base {} overflows with {} entries",
                    feed.name,
                    feed.id_base,
                    feed.max_entries
                );
            };
            ranges.push((feed.name.as_str(), range));
        }

        // Cards from different feeds share one page, so their ids must never collide
        for (i, (a, (a_lo, a_hi))) in ranges.iter().enumerate() {
            for (b, (b_lo, b_hi)) in &ranges[i + 1..] {
                if a_lo <= b_hi && b_lo <= a_hi {
                    anyhow::bail!("feeds '{}' and '{}' have overlapping id ranges", a, b);
                }
            }
        }

        Ok(())
    }
}
