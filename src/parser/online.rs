//! Aggregate online-count parser

use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;
use tracing::{debug, instrument};

use super::{first_text, parse_count, selector};
use crate::errors::{ParseError, ParseResult};
use crate::utils::RawResponse;

const ONLINE_TEXT_PATTERN: &str = r"(?i)(?:players online|online|в сети|онлайн)\D{0,20}?(\d[\d\s,.\u{00a0}]*)";

/// Compiled once per process; `None` only if the pattern itself is invalid
fn online_text_regex() -> ParseResult<&'static Regex> {
    static ONLINE_RE: OnceLock<Option<Regex>> = OnceLock::new();
    ONLINE_RE
        .get_or_init(|| Regex::new(ONLINE_TEXT_PATTERN).ok())
        .as_ref()
        .ok_or_else(|| ParseError::InvalidSelector {
            selector: ONLINE_TEXT_PATTERN.to_string(),
            message: "online count pattern failed to compile".to_string(),
        })
}

/// Extract the number of players currently online
///
/// Looks for a dedicated counter element first (`.online-count`, or any
/// element with a `data-online` attribute), then falls back to text such as
/// `Online: 1 234` anywhere in the page.
#[instrument(skip(response), fields(url = %response.url), level = "debug")]
pub fn parse_online_count(response: &RawResponse) -> ParseResult<u64> {
    let document = Html::parse_document(&response.body);
    let root = document.root_element();

    if let Some(count) =
        first_text(&root, &selector(".online-count")?).and_then(|t| parse_count(&t, "online"))
    {
        debug!(count, "Online count from counter element");
        return Ok(count);
    }

    if let Some(count) = root
        .select(&selector("[data-online]")?)
        .filter_map(|el| el.value().attr("data-online"))
        .find_map(|value| parse_count(value, "online"))
    {
        debug!(count, "Online count from data attribute");
        return Ok(count);
    }

    let text = root.text().collect::<Vec<_>>().join(" ");
    let count = online_text_regex()?
        .captures_iter(&text)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| parse_count(m.as_str(), "online"))
        .ok_or(ParseError::MissingOnlineCount)?;
    debug!(count, "Online count from page text");
    Ok(count)
}
