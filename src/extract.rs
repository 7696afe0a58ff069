//! Card fields mined out of a feed item's HTML description.
//!
//! Descriptions are untrusted third-party markup. Everything here works on
//! a parsed fragment (via `scraper`) rather than on raw strings, except the
//! "N min read" lookup, which scans the raw text.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::non_empty;

pub const EXCERPT_MAX_CHARS: usize = 150;
pub const ELLIPSIS: &str = "...";
pub const MIN_READ_TIME: u32 = 1;
pub const MAX_READ_TIME: u32 = 20;

/// Paragraphs shorter than this are assumed to be a title echo or a caption.
const MIN_PARAGRAPH_CHARS: usize = 50;
const BOILERPLATE: &str = "Continue reading on Medium »";
const WORDS_PER_MINUTE: usize = 200;

const IMAGE_CDN_HOST: &str = "miro.medium.com";
const CDN_RESIZE_DIRECTIVE: &str = "resize:fit:800";

static PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("paragraph selector"));

static SECOND_PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p:nth-of-type(2)").expect("nth-of-type selector"));

static IMAGES: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("image selector"));

static READ_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*min\s*read").expect("read time regex"));

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Plain text of an HTML fragment.
pub fn strip_html(html: &str) -> String {
    element_text(Html::parse_fragment(html).root_element())
}

/// Plain-text excerpt of a description, at most 150 characters plus ellipsis.
///
/// Feed descriptions usually open with a copy of the title, so the second
/// paragraph is preferred when it is substantial. Otherwise the first
/// paragraph longer than 50 characters wins, then the first paragraph, then
/// the whole fragment.
pub fn excerpt(description: &str) -> String {
    let fragment = Html::parse_fragment(description);

    let text = paragraph_text(&fragment)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| element_text(fragment.root_element()));

    finish_excerpt(&text)
}

/// Boilerplate removal, bracket scrubbing and truncation shared by remote
/// and locally stored excerpts.
pub fn finish_excerpt(text: &str) -> String {
    let text = text.trim().replace(BOILERPLATE, "");
    let text: String = text.chars().filter(|c| *c != '<' && *c != '>').collect();

    truncate_excerpt(text.trim())
}

fn paragraph_text(fragment: &Html) -> Option<String> {
    if let Some(second) = fragment.select(&SECOND_PARAGRAPH).next() {
        let text = element_text(second);
        if char_len(&text) >= MIN_PARAGRAPH_CHARS {
            return Some(text);
        }
    }

    fragment
        .select(&PARAGRAPHS)
        .map(element_text)
        .find(|t| char_len(t) > MIN_PARAGRAPH_CHARS)
        .or_else(|| fragment.select(&PARAGRAPHS).next().map(element_text))
}

/// Cut `text` to 150 characters at the last space and append an ellipsis.
/// A run without any space is cut hard.
pub fn truncate_excerpt(text: &str) -> String {
    if char_len(text) <= EXCERPT_MAX_CHARS {
        return text.to_string();
    }

    let head: String = text.chars().take(EXCERPT_MAX_CHARS).collect();
    let cut = match head.rfind(' ') {
        Some(idx) => &head[..idx],
        None => head.as_str(),
    };

    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

/// Representative image for a card: the first `<img>` in the description,
/// then the item's thumbnail, then a placeholder keyed by `seed`.
pub fn image_url(description: &str, thumbnail: Option<&str>, seed: i64) -> String {
    if let Some(src) = first_image_src(description) {
        return upsize_cdn_image(&src);
    }

    match non_empty(thumbnail) {
        Some(thumb) => thumb.to_string(),
        None => placeholder_image(seed),
    }
}

fn first_image_src(description: &str) -> Option<String> {
    let fragment = Html::parse_fragment(description);
    let img = fragment.select(&IMAGES).next()?;

    img.value()
        .attr("src")
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(str::to_string)
}

/// Rewrite the resize directive of a CDN image URL to a fixed 800px width.
/// Anything that is not a parseable CDN URL is returned unchanged.
pub fn upsize_cdn_image(src: &str) -> String {
    let Ok(mut url) = Url::parse(src) else {
        return src.to_string();
    };

    if url.host_str() != Some(IMAGE_CDN_HOST) {
        return src.to_string();
    }

    // "/v2/resize:fit:200/abc.png" -> ["", "v2", "resize:fit:200", "abc.png"]
    let mut parts: Vec<&str> = url.path().split('/').collect();
    if parts.len() > 2 && parts[2].starts_with("resize:") {
        parts[2] = CDN_RESIZE_DIRECTIVE;
        let path = parts.join("/");
        url.set_path(&path);
        return url.to_string();
    }

    src.to_string()
}

pub fn placeholder_image(seed: i64) -> String {
    format!("https://picsum.photos/seed/{}/800/600", seed)
}

/// Estimated reading time in minutes, always within [1, 20].
///
/// A stated "N min read" wins; otherwise the word count of the stripped
/// text is divided by 200 words per minute, rounding up.
pub fn read_time_minutes(description: &str) -> u32 {
    let stated = READ_TIME
        .captures(description)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());

    let minutes = match stated {
        Some(minutes) => minutes,
        None => {
            let words = strip_html(description).split_whitespace().count();
            words
                .div_ceil(WORDS_PER_MINUTE)
                .min(MAX_READ_TIME as usize) as u32
        }
    };

    minutes.clamp(MIN_READ_TIME, MAX_READ_TIME)
}
