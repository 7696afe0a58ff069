use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel `status` value of a successful conversion response.
pub const STATUS_OK: &str = "ok";

/// JSON envelope returned by the RSS-to-JSON conversion service.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub items: Option<Vec<RawItem>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One feed item as the conversion service delivers it.
///
/// Every field is optional on the wire; the service also sends empty
/// strings for missing values, which are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

/// A normalized card ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEntry {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub excerpt: String,
    pub image_url: String,
    pub category: String,
    pub read_time_minutes: u32,
    pub link: String,
}

impl FeedEntry {
    /// Date as shown on a card, e.g. "Jan 5, 2024".
    pub fn display_date(&self) -> String {
        self.published_at
            .map(|d| d.format("%b %-d, %Y").to_string())
            .unwrap_or_default()
    }

    pub fn is_external(&self) -> bool {
        self.link.starts_with("http")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Remote,
    Fallback,
}

/// What one feed section renders: either remote entries or the fallback
/// set, with an advisory note in the latter case.
#[derive(Debug, Clone, Serialize)]
pub struct FeedSection {
    pub name: String,
    pub title: String,
    pub source: EntrySource,
    pub advisory: Option<String>,
    pub entries: Vec<FeedEntry>,
}

/// Parse a `pubDate` value. The conversion service emits
/// `YYYY-MM-DD HH:MM:SS` in UTC; RFC 3339 and RFC 2822 are accepted too.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    }

    None
}

/// `Some` only for non-blank strings.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    mod envelope_tests {
        use super::*;

        #[test]
        fn test_parse_ok_envelope() {
            let json = r#"{
                "status": "ok",
                "feed": {"url": "https://medium.com/feed/@someone"},
                "items": [{
                    "title": "Hello",
                    "pubDate": "2024-01-15 10:30:00",
                    "link": "https://medium.com/p/hello",
                    "guid": "https://medium.com/p/hello",
                    "author": "Some One",
                    "thumbnail": "",
                    "description": "<p>Hi</p>",
                    "content": "<p>Hi</p>",
                    "enclosure": {},
                    "categories": ["rust", "web"]
                }]
            }"#;

            let envelope: Envelope = serde_json::from_str(json).unwrap();
            assert_eq!(envelope.status, STATUS_OK);
            let items = envelope.items.unwrap();
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].title.as_deref(), Some("Hello"));
            assert_eq!(items[0].pub_date.as_deref(), Some("2024-01-15 10:30:00"));
            assert_eq!(items[0].thumbnail.as_deref(), Some(""));
            assert_eq!(items[0].categories.as_ref().unwrap()[0], "rust");
        }

        #[test]
        fn test_parse_error_envelope() {
            let json = r#"{"status": "error", "message": "Cannot download this RSS feed"}"#;

            let envelope: Envelope = serde_json::from_str(json).unwrap();
            assert_eq!(envelope.status, "error");
            assert!(envelope.items.is_none());
            assert_eq!(
                envelope.message.as_deref(),
                Some("Cannot download this RSS feed")
            );
        }

        #[test]
        fn test_parse_envelope_without_status() {
            let envelope: Envelope = serde_json::from_str("{}").unwrap();
            assert!(envelope.status.is_empty());
        }
    }

    mod date_tests {
        use super::*;

        #[test]
        fn test_converter_format() {
            let dt = parse_pub_date("2024-01-15 10:30:00").unwrap();
            assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 1, 15));
            assert_eq!(dt.hour(), 10);
        }

        #[test]
        fn test_rfc3339() {
            let dt = parse_pub_date("2024-01-15T12:00:00+02:00").unwrap();
            assert_eq!(dt.hour(), 10);
        }

        #[test]
        fn test_rfc2822() {
            let dt = parse_pub_date("Mon, 15 Jan 2024 10:00:00 GMT").unwrap();
            assert_eq!(dt.day(), 15);
        }

        #[test]
        fn test_date_only() {
            let dt = parse_pub_date("2024-01-05").unwrap();
            assert_eq!((dt.month(), dt.day()), (1, 5));
        }

        #[test]
        fn test_garbage_and_blank() {
            assert!(parse_pub_date("yesterday").is_none());
            assert!(parse_pub_date("   ").is_none());
        }
    }

    mod entry_tests {
        use super::*;

        fn entry(link: &str, published_at: Option<DateTime<Utc>>) -> FeedEntry {
            FeedEntry {
                id: 101,
                title: "Title".to_string(),
                author: "Author".to_string(),
                published_at,
                excerpt: String::new(),
                image_url: String::new(),
                category: "Article".to_string(),
                read_time_minutes: 1,
                link: link.to_string(),
            }
        }

        #[test]
        fn test_display_date() {
            let e = entry("https://a.com", parse_pub_date("2024-01-05 08:00:00"));
            assert_eq!(e.display_date(), "Jan 5, 2024");
        }

        #[test]
        fn test_display_date_missing() {
            assert_eq!(entry("https://a.com", None).display_date(), "");
        }

        #[test]
        fn test_is_external() {
            assert!(entry("https://a.com", None).is_external());
            assert!(!entry("#", None).is_external());
        }

        #[test]
        fn test_section_serializes_source_lowercase() {
            let section = FeedSection {
                name: "blog".to_string(),
                title: "Blog".to_string(),
                source: EntrySource::Fallback,
                advisory: Some("note".to_string()),
                entries: vec![],
            };
            let json = serde_json::to_value(&section).unwrap();
            assert_eq!(json["source"], "fallback");
            assert_eq!(json["advisory"], "note");
        }
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some(" x ")), Some("x"));
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(None), None);
    }
}
