use scraper::{Html, Selector};
use std::sync::LazyLock;

// CSS selector strings
const TITLE_SELECTOR_STR: &str = "title";
const META_SELECTOR_STR: &str = "meta[content]";

// Meta tags that identify the page subject on social platforms
const SOCIAL_META_KEYS: &[&str] = &[
    "og:title",
    "og:url",
    "og:description",
    "profile:username",
    "twitter:title",
    "twitter:creator",
];

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(TITLE_SELECTOR_STR).expect("Failed to parse title selector - this is a bug")
});

static META_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(META_SELECTOR_STR).expect("Failed to parse meta selector - this is a bug")
});

/// Extracts the page title from raw HTML.
///
/// Returns the text content of the first `<title>` element, trimmed, with
/// HTML entities decoded by the parser. Returns `None` when the document
/// has no title or the title is empty.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let element = document.select(&TITLE_SELECTOR).next()?;
    let title: String = element.text().collect::<String>().trim().to_string();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Extracts the content of social meta tags (Open Graph, Twitter card,
/// `profile:username`) from raw HTML.
///
/// Only tags whose `property` or `name` attribute is in the known social
/// set are returned. Used by the confidence scorer to check whether the
/// page's own metadata references the target username.
pub fn social_meta_contents(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&META_SELECTOR)
        .filter(|element| {
            let key = element
                .value()
                .attr("property")
                .or_else(|| element.value().attr("name"))
                .unwrap_or_default();
            SOCIAL_META_KEYS.contains(&key)
        })
        .filter_map(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .collect()
}
