use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{Config, FeedConfig};
use crate::error::FeedError;
use crate::extract;
use crate::fallback::fallback_entries;
use crate::models::{
    non_empty, parse_pub_date, EntrySource, Envelope, FeedEntry, FeedSection, RawItem, STATUS_OK,
};

/// Feed aggregator backed by an RSS-to-JSON conversion service.
///
/// One request per feed load, no retries and no caching. The only timeout
/// is the HTTP client's.
pub struct Fetcher {
    client: Client,
    endpoint: Url,
}

impl Fetcher {
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("PortfolioSite/1.0 (Feed Aggregator)")
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            &config.converter_endpoint,
            Duration::from_secs(config.request_timeout),
        )
    }

    /// `<endpoint>?rss_url=<url-encoded feed URL>`
    pub fn conversion_url(&self, feed_url: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("rss_url", feed_url);
        url
    }

    /// Fetch and normalize up to `max_entries` entries of one feed.
    pub async fn fetch_entries(&self, feed: &FeedConfig) -> Result<Vec<FeedEntry>, FeedError> {
        info!("Fetching feed: {} ({})", feed.name, feed.url);

        let response = self
            .client
            .get(self.conversion_url(&feed.url))
            .send()
            .await
            .map_err(FeedError::Network)?;

        let status = response.status();
        if !status.is_success() {
            debug!("Conversion service answered {} for feed '{}'", status, feed.name);
            return Err(FeedError::HttpStatus(status.as_u16()));
        }

        let envelope: Envelope = response.json().await.map_err(FeedError::Decode)?;
        let items = check_envelope(envelope, feed)?;

        Ok(normalize_items(items, feed))
    }

    /// Load one feed section. Never fails: on any error the feed's fallback
    /// entries are returned together with an advisory note.
    pub async fn load_section(&self, feed: &FeedConfig) -> FeedSection {
        let result = match self.fetch_entries(feed).await {
            Ok(entries) if entries.is_empty() => Err(FeedError::Envelope(empty_feed_message(feed))),
            other => other,
        };

        match result {
            Ok(entries) => {
                info!("Loaded {} entries for feed '{}'", entries.len(), feed.name);
                FeedSection {
                    name: feed.name.clone(),
                    title: feed.title.clone(),
                    source: EntrySource::Remote,
                    advisory: None,
                    entries,
                }
            }
            Err(e) => {
                if let FeedError::Network(source) | FeedError::Decode(source) = &e {
                    warn!("Feed '{}' unavailable ({}), using fallback: {}", feed.name, e, source);
                } else {
                    warn!("Feed '{}' unavailable, using fallback: {}", feed.name, e);
                }
                FeedSection {
                    name: feed.name.clone(),
                    title: feed.title.clone(),
                    source: EntrySource::Fallback,
                    advisory: Some(advisory(&e, feed)),
                    entries: fallback_entries(feed),
                }
            }
        }
    }

    /// Load every configured feed concurrently, keeping configuration order.
    pub async fn load_all(&self, feeds: &[FeedConfig]) -> Vec<FeedSection> {
        join_all(feeds.iter().map(|feed| self.load_section(feed))).await
    }
}

fn empty_feed_message(feed: &FeedConfig) -> String {
    format!("Failed to fetch {} feed or the feed is empty.", feed.label)
}

/// Accept only an "ok" envelope that carries at least one item.
pub fn check_envelope(envelope: Envelope, feed: &FeedConfig) -> Result<Vec<RawItem>, FeedError> {
    match envelope.items {
        Some(items) if envelope.status == STATUS_OK && !items.is_empty() => Ok(items),
        _ => {
            let message = non_empty(envelope.message.as_deref())
                .map(str::to_string)
                .unwrap_or_else(|| empty_feed_message(feed));
            Err(FeedError::Envelope(message))
        }
    }
}

/// Advisory shown next to fallback entries.
pub fn advisory(error: &FeedError, feed: &FeedConfig) -> String {
    match non_empty(feed.advisory_suffix.as_deref()) {
        Some(suffix) => format!("{} {}", error, suffix),
        None => error.to_string(),
    }
}

/// Drop items without a title or link, keep the first `max_entries` in feed
/// order, and derive the card fields. Ids run from `id_base + 1`.
pub fn normalize_items(items: Vec<RawItem>, feed: &FeedConfig) -> Vec<FeedEntry> {
    items
        .into_iter()
        .filter(|item| {
            let keep = non_empty(item.title.as_deref()).is_some()
                && non_empty(item.link.as_deref()).is_some();
            if !keep {
                debug!("Skipping item without title or link in feed '{}'", feed.name);
            }
            keep
        })
        .take(feed.max_entries)
        .zip(1..)
        .map(|(item, offset)| normalize_item(&item, feed.id_base + offset, feed))
        .collect()
}

fn normalize_item(item: &RawItem, id: i64, feed: &FeedConfig) -> FeedEntry {
    let description = item.description.as_deref().unwrap_or_default();

    let category = item
        .categories
        .as_ref()
        .and_then(|c| non_empty(c.first().map(String::as_str)))
        .unwrap_or(&feed.fallback_category);

    FeedEntry {
        id,
        title: non_empty(item.title.as_deref()).unwrap_or_default().to_string(),
        author: non_empty(item.author.as_deref())
            .unwrap_or(&feed.fallback_author)
            .to_string(),
        published_at: item.pub_date.as_deref().and_then(parse_pub_date),
        excerpt: extract::excerpt(description),
        image_url: extract::image_url(description, item.thumbnail.as_deref(), id),
        category: category.to_string(),
        read_time_minutes: extract::read_time_minutes(description),
        link: non_empty(item.link.as_deref()).unwrap_or_default().to_string(),
    }
}
