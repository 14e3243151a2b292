//! HTML extraction for profile and aggregate pages
//!
//! Parsing is synchronous and never holds a document across an await point.
//! Every optional field is extracted independently; only a missing identity
//! block (or an aggregate page without any counter) is an error.

pub mod online;
pub mod profile;

pub use online::parse_online_count;
pub use profile::parse_profile;

use scraper::{ElementRef, Selector};
use tracing::warn;

use crate::errors::{ParseError, ParseResult};

/// Compile a CSS selector, reporting failures as [`ParseError::InvalidSelector`]
pub(crate) fn selector(css: &str) -> ParseResult<Selector> {
    Selector::parse(css).map_err(|e| ParseError::InvalidSelector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Text content of an element with whitespace runs collapsed
pub(crate) fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match of `selector` under `root`, if non-empty
pub(crate) fn first_text(root: &ElementRef, selector: &Selector) -> Option<String> {
    root.select(selector)
        .next()
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
}

fn is_group_separator(c: char) -> bool {
    matches!(c, ' ' | ',' | '.' | '\'' | '\u{00a0}' | '\u{202f}' | '\u{2009}')
}

/// Parse the first integer in `raw`, ignoring thousands separators
///
/// A leading minus sign clamps the value to zero with a warning; the site
/// never legitimately shows negative counters.
pub fn parse_count(raw: &str, field: &str) -> Option<u64> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let negative = raw[..start].trim_end().ends_with('-');

    let mut digits = String::new();
    for c in raw[start..].chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !is_group_separator(c) {
            break;
        }
    }

    let value = digits.parse::<u64>().ok()?;
    if negative {
        warn!(field, raw, "Negative value on profile page clamped to zero");
        return Some(0);
    }
    Some(value)
}

/// Parse a decimal ratio such as `3.25` or `3,25`
pub fn parse_ratio(raw: &str, field: &str) -> Option<f64> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let negative = raw[..start].trim_end().ends_with('-');

    let mut number = String::new();
    let mut seen_point = false;
    for c in raw[start..].chars() {
        if c.is_ascii_digit() {
            number.push(c);
        } else if matches!(c, '.' | ',') && !seen_point {
            seen_point = true;
            number.push('.');
        } else {
            break;
        }
    }

    let value = number.trim_end_matches('.').parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    if negative {
        warn!(field, raw, "Negative ratio on profile page clamped to zero");
        return Some(0.0);
    }
    Some(value)
}
