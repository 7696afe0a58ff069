use serde::Deserialize;

use crate::config::FeedConfig;
use crate::extract::{self, MAX_READ_TIME, MIN_READ_TIME};
use crate::models::{non_empty, parse_pub_date, FeedEntry};

/// A locally stored post shown when a feed cannot be fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackPost {
    pub title: String,
    pub excerpt: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub read_time: u32,
    pub image: String,
    pub category: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl FallbackPost {
    fn new(
        title: &str,
        excerpt: &str,
        date: &str,
        read_time: u32,
        image: &str,
        category: &str,
    ) -> Self {
        Self {
            title: title.to_string(),
            excerpt: excerpt.to_string(),
            date: date.to_string(),
            read_time,
            image: image.to_string(),
            category: category.to_string(),
            link: None,
        }
    }
}

/// Built-in posts used by feeds that configure none of their own.
pub fn default_posts() -> Vec<FallbackPost> {
    vec![
        FallbackPost::new(
            "The Future of Web Development",
            "Exploring emerging trends and technologies that will shape the future of web development.",
            "2024-01-15",
            8,
            "https://images.pexels.com/photos/1181263/pexels-photo-1181263.jpeg?auto=compress&cs=tinysrgb&w=600&h=400&fit=crop",
            "Technology",
        ),
        FallbackPost::new(
            "Design Systems at Scale",
            "How to build and maintain design systems for large organizations.",
            "2024-01-10",
            12,
            "https://images.pexels.com/photos/196644/pexels-photo-196644.jpeg?auto=compress&cs=tinysrgb&w=600&h=400&fit=crop",
            "Design",
        ),
        FallbackPost::new(
            "Performance Optimization Tips",
            "Practical strategies to improve web application performance.",
            "2024-01-05",
            6,
            "https://images.pexels.com/photos/590020/pexels-photo-590020.jpeg?auto=compress&cs=tinysrgb&w=600&h=400&fit=crop",
            "Development",
        ),
    ]
}

/// The feed's fallback posts, normalized to the same shape as remote
/// entries: capped at `max_entries`, ids continuing from `id_base`.
pub fn fallback_entries(feed: &FeedConfig) -> Vec<FeedEntry> {
    let defaults;
    let posts: &[FallbackPost] = if feed.fallback.is_empty() {
        defaults = default_posts();
        &defaults
    } else {
        &feed.fallback
    };

    posts
        .iter()
        .take(feed.max_entries)
        .zip(1..)
        .map(|(post, offset)| FeedEntry {
            id: feed.id_base + offset,
            title: post.title.clone(),
            author: feed.fallback_author.clone(),
            published_at: parse_pub_date(&post.date),
            excerpt: extract::finish_excerpt(&extract::strip_html(&post.excerpt)),
            image_url: post.image.clone(),
            category: non_empty(Some(post.category.as_str()))
                .unwrap_or(&feed.fallback_category)
                .to_string(),
            read_time_minutes: post.read_time.clamp(MIN_READ_TIME, MAX_READ_TIME),
            link: non_empty(post.link.as_deref())
                .unwrap_or(&feed.profile_url)
                .to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_config(max_entries: usize, fallback: Vec<FallbackPost>) -> FeedConfig {
        FeedConfig {
            name: "blog".to_string(),
            title: "Latest Insight".to_string(),
            url: "https://medium.com/feed/@someone".to_string(),
            max_entries,
            id_base: 100,
            fallback_author: "Some One".to_string(),
            fallback_category: "Article".to_string(),
            label: "Medium".to_string(),
            advisory_suffix: None,
            profile_url: "https://medium.com/@someone".to_string(),
            fallback,
        }
    }

    #[test]
    fn test_default_posts_not_empty() {
        assert_eq!(default_posts().len(), 3);
    }

    #[test]
    fn test_builtin_fallback_normalized() {
        let entries = fallback_entries(&feed_config(6, vec![]));

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].id, 101);
        assert_eq!(entries[2].id, 103);
        assert_eq!(entries[0].title, "The Future of Web Development");
        assert_eq!(entries[0].author, "Some One");
        assert_eq!(entries[0].read_time_minutes, 8);
        assert_eq!(entries[0].display_date(), "Jan 15, 2024");
        assert_eq!(entries[0].link, "https://medium.com/@someone");
    }

    #[test]
    fn test_fallback_respects_cap() {
        let entries = fallback_entries(&feed_config(2, vec![]));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_configured_fallback_replaces_builtin() {
        let mut post = FallbackPost::new(
            "Offline",
            "<p>Cached <b>copy</b></p>",
            "2024-03-01",
            99,
            "https://example.com/i.png",
            "",
        );
        post.link = Some("https://example.com/offline".to_string());

        let entries = fallback_entries(&feed_config(4, vec![post]));

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].excerpt, "Cached copy");
        assert_eq!(entries[0].category, "Article");
        assert_eq!(entries[0].read_time_minutes, 20);
        assert_eq!(entries[0].link, "https://example.com/offline");
    }
}
