use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::error::AppError;

/// Extensions that never lead to a page worth scanning.
const SKIPPED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".zip", ".gz", ".rar",
    ".mp3", ".mp4", ".avi", ".mov", ".css", ".js", ".xml", ".doc", ".docx", ".xls", ".xlsx",
];

/// Outbound links of a document, resolved against `base`.
///
/// Only http(s) targets are kept. Fragments are stripped and the result is
/// deduplicated in document order.
pub fn discover(html: &str, base: &str) -> Result<Vec<String>, AppError> {
    let base = Url::parse(base).map_err(|e| AppError::ParseError(format!("base URL: {e}")))?;
    let selector = Selector::parse("a[href], area[href]")
        .map_err(|e| AppError::ParseError(format!("link selector: {e}")))?;

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(link) = resolve(&base, href) else {
            continue;
        };
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    tracing::debug!(base = %base, count = links.len(), "Discovered links");
    Ok(links)
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);

    let path = url.path().to_ascii_lowercase();
    if SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return None;
    }

    Some(url.to_string())
}
