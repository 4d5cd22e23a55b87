//! Extraction of `@media` blocks and their width conditions from raw
//! stylesheet text.
//!
//! This is not a CSS parser. A brace-depth scanner finds top-level `@media`
//! blocks (comments and strings are skipped so braces inside them do not
//! count), the prelude is split into comma-separated conditions, and each
//! condition is reduced to a media type plus optional `min-width` /
//! `max-width` bounds. Anything unrecognized degrades to "always matches".

use crate::style::rules::{LengthUnit, MediaCondition, WidthBound};

/// One `@media` block: its conditions and the CSS text it guards.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaBlock {
    pub conditions: Vec<MediaCondition>,
    /// Inner CSS with relative `url(...)` references made absolute.
    pub body: String,
}

/// Parses a stylesheet into its conditional blocks.
///
/// When the text has no `@media` blocks, a non-empty `media_attr` (the
/// `media` attribute of the link that loaded the sheet) guards the whole
/// sheet instead. A sheet with neither yields no blocks. When both are
/// present the attribute is ignored.
pub fn parse_media_blocks(
    style_text: &str,
    base_href: &str,
    media_attr: Option<&str>,
) -> Vec<MediaBlock> {
    let dir = base_dir(base_href);
    let raw_blocks = extract_media_blocks(style_text);

    if raw_blocks.is_empty() {
        return match media_attr.map(str::trim).filter(|m| !m.is_empty()) {
            Some(media) => vec![MediaBlock {
                conditions: parse_media_query_list(media),
                body: rewrite_urls(style_text, dir),
            }],
            None => Vec::new(),
        };
    }

    raw_blocks
        .into_iter()
        .map(|(prelude, body)| MediaBlock {
            conditions: parse_media_query_list(prelude),
            body: rewrite_urls(body, dir),
        })
        .collect()
}

/// Splits a media query list on top-level commas and parses each entry.
///
/// Always returns at least one condition.
pub fn parse_media_query_list(list: &str) -> Vec<MediaCondition> {
    let conditions: Vec<MediaCondition> = split_top_level(list, b',')
        .into_iter()
        .filter(|entry| !entry.trim().is_empty())
        .map(parse_condition)
        .collect();
    if conditions.is_empty() {
        vec![MediaCondition::all()]
    } else {
        conditions
    }
}

/// Parses a single condition such as `only screen and (min-width: 600px)`.
pub fn parse_condition(condition: &str) -> MediaCondition {
    let min_width = find_width_bound(condition, "min-width");
    let max_width = find_width_bound(condition, "max-width");
    MediaCondition {
        media_type: media_type(condition),
        has_constraint: min_width.is_some() || max_width.is_some(),
        min_width,
        max_width,
    }
}

/// The device class before the first parenthesis, skipping a leading `only`.
fn media_type(condition: &str) -> String {
    let prefix = condition.split('(').next().unwrap_or_default();
    let mut words = prefix
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|word| !word.is_empty());
    let keyword = match words.next() {
        Some(word) if word.eq_ignore_ascii_case("only") => words.next().or(Some(word)),
        other => other,
    };
    keyword.unwrap_or("all").to_ascii_lowercase()
}

/// Finds the first `(<feature>: <number><px|em>)` in `condition`.
fn find_width_bound(condition: &str, feature: &str) -> Option<WidthBound> {
    let bytes = condition.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'(')
        .find_map(|(open, _)| width_bound_at(bytes, open + 1, feature))
}

fn width_bound_at(bytes: &[u8], start: usize, feature: &str) -> Option<WidthBound> {
    let mut i = skip_whitespace(bytes, start);
    let name = bytes.get(i..i + feature.len())?;
    if !name.eq_ignore_ascii_case(feature.as_bytes()) {
        return None;
    }
    i = skip_whitespace(bytes, i + feature.len());
    if bytes.get(i) != Some(&b':') {
        return None;
    }
    i = skip_whitespace(bytes, i + 1);

    let number_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    let value = leading_float(std::str::from_utf8(&bytes[number_start..i]).ok()?)?;

    let unit = match bytes.get(i..i + 2) {
        Some(u) if u.eq_ignore_ascii_case(b"px") => LengthUnit::Px,
        Some(u) if u.eq_ignore_ascii_case(b"em") => LengthUnit::Em,
        _ => return None,
    };
    i = skip_whitespace(bytes, i + 2);
    if bytes.get(i) != Some(&b')') {
        return None;
    }
    Some(WidthBound { value, unit })
}

/// Parses the longest `digits[.digits]` prefix, so `1.5.2` reads as `1.5`.
fn leading_float(run: &str) -> Option<f64> {
    let end = run
        .match_indices('.')
        .nth(1)
        .map_or(run.len(), |(index, _)| index);
    run[..end].parse().ok()
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// If a comment or string starts at `i`, returns the index just past it.
fn skip_opaque(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes[i] {
        b'/' if bytes.get(i + 1) == Some(&b'*') => {
            let end = bytes[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(bytes.len(), |p| i + 2 + p + 2);
            Some(end)
        }
        quote @ (b'"' | b'\'') => {
            let mut j = i + 1;
            while j < bytes.len() {
                match bytes[j] {
                    b'\\' => j += 2,
                    b if b == quote => return Some(j + 1),
                    _ => j += 1,
                }
            }
            Some(bytes.len())
        }
        _ => None,
    }
}

/// Scans for top-level `@media` blocks, returning `(prelude, body)` pairs.
///
/// Nested blocks inside a body are kept verbatim; `@media` rules nested in
/// other blocks are not extracted. An unterminated block ends the scan.
pub(crate) fn extract_media_blocks(text: &str) -> Vec<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut blocks = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(next) = skip_opaque(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'@' if depth == 0 && is_media_keyword(bytes, i) => {
                let prelude_start = i + "@media".len();
                let Some(open) = find_block_open(bytes, prelude_start) else {
                    log::warn!("@media rule at byte {} has no block", i);
                    break;
                };
                if bytes[open] == b';' {
                    i = open + 1;
                    continue;
                }
                let Some(close) = find_block_close(bytes, open + 1) else {
                    log::warn!("unterminated @media block at byte {}", i);
                    break;
                };
                blocks.push((&text[prelude_start..open], &text[open + 1..close]));
                i = close + 1;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    blocks
}

fn is_media_keyword(bytes: &[u8], at: usize) -> bool {
    let end = at + "@media".len();
    match bytes.get(at..end) {
        Some(word) if word.eq_ignore_ascii_case(b"@media") => {
            matches!(bytes.get(end), Some(b) if b.is_ascii_whitespace() || *b == b'(')
        }
        _ => false,
    }
}

/// Index of the `{` opening the block, or of a `;` ending a blockless rule.
fn find_block_open(bytes: &[u8], mut i: usize) -> Option<usize> {
    while i < bytes.len() {
        if let Some(next) = skip_opaque(bytes, i) {
            i = next;
            continue;
        }
        if bytes[i] == b'{' || bytes[i] == b';' {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Index of the `}` matching an already consumed `{`.
fn find_block_close(bytes: &[u8], mut i: usize) -> Option<usize> {
    let mut depth = 1usize;
    while i < bytes.len() {
        if let Some(next) = skip_opaque(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Splits on `sep` outside parentheses.
fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, &b) in text.as_bytes().iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b if b == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Directory part of `href` including the trailing slash; empty when `href`
/// has no slash at all.
pub fn base_dir(href: &str) -> &str {
    href.rfind('/').map_or("", |slash| &href[..=slash])
}

/// Prefixes relative `url(...)` references in `css` with `dir`.
///
/// A reference is relative when it does not start with `/` or `#` and
/// contains no `:` (which rules out `http:`, `data:` and the like). Quotes
/// around rewritten references are dropped.
pub fn rewrite_urls(css: &str, dir: &str) -> String {
    if dir.is_empty() {
        return css.to_string();
    }
    let mut out = String::with_capacity(css.len() + dir.len());
    let mut rest = css;
    while let Some(pos) = rest.find("url(") {
        let after = pos + "url(".len();
        out.push_str(&rest[..after]);
        rest = &rest[after..];
        if let Some((path, consumed)) = relative_url(rest) {
            out.push_str(dir);
            out.push_str(path);
            out.push(')');
            rest = &rest[consumed..];
        }
    }
    out.push_str(rest);
    out
}

/// Reads a relative reference at the start of a `url(` argument, returning
/// the path and the number of bytes consumed through the closing `)`.
fn relative_url(arg: &str) -> Option<(&str, usize)> {
    let bytes = arg.as_bytes();
    let mut i = skip_whitespace(bytes, 0);
    if matches!(bytes.get(i).copied(), Some(b'"' | b'\'')) {
        i += 1;
    }
    let path_start = i;
    while i < bytes.len() && !matches!(bytes[i], b':' | b')' | b'"' | b'\'') {
        i += 1;
    }
    let path = arg[path_start..i].trim_end();
    match path.as_bytes().first().copied() {
        None | Some(b'/' | b'#') => return None,
        Some(_) if path.len() < 2 => return None,
        Some(_) => {}
    }
    if matches!(bytes.get(i).copied(), Some(b'"' | b'\'')) {
        i += 1;
    }
    i = skip_whitespace(bytes, i);
    if bytes.get(i) != Some(&b')') {
        return None;
    }
    Some((path, i + 1))
}
