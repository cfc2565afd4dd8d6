
use anyhow::{Result, anyhow};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Paragraphs at or below this many characters are discarded
pub const DEFAULT_MIN_PARAGRAPH_CHARS: usize = 30;

/// Extract the text of every `<p>` element in document order.
///
/// A paragraph is kept when its trimmed text is strictly longer than
/// `min_chars` characters. Kept text has internal whitespace runs collapsed.
#[inline]
pub fn extract_paragraphs(html: &str, min_chars: usize) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse("p").map_err(|e| anyhow!("Failed to create CSS selector: {:?}", e))?;

    let mut total = 0_usize;
    let paragraphs: Vec<String> = document
        .select(&selector)
        .inspect(|_| total += 1)
        .map(raw_text)
        .filter(|raw| raw.trim().chars().count() > min_chars)
        .map(|raw| collapse_whitespace(&raw))
        .collect();

    debug!(
        "Kept {} of {} paragraphs longer than {} characters",
        paragraphs.len(),
        total,
        min_chars
    );

    Ok(paragraphs)
}

/// Concatenated text of an element and all its descendants
fn raw_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
