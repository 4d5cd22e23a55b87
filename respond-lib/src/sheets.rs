//! Loading the text of linked stylesheets.
//!
//! Fetching is the host's job; the engine only asks a [`SheetSource`] for
//! the text behind an `href` it has decided to parse.

use crate::error::{RespondError, Result};
use std::fs;
use std::path::PathBuf;
use url::Url;

/// Provides stylesheet text by `href`.
pub trait SheetSource {
    /// Returns the sheet text, or `None` when this source cannot serve the
    /// `href` at all.
    fn fetch(&mut self, href: &str) -> Result<Option<String>>;
}

/// Serves stylesheets from a directory, resolving hrefs as relative paths.
#[derive(Debug, Clone)]
pub struct FsSheetSource {
    root: PathBuf,
}

impl FsSheetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsSheetSource { root: root.into() }
    }
}

impl SheetSource for FsSheetSource {
    fn fetch(&mut self, href: &str) -> Result<Option<String>> {
        if has_scheme_or_authority(href) {
            return Ok(None);
        }
        let path = href
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_start_matches('/');
        fs::read_to_string(self.root.join(path))
            .map(Some)
            .map_err(|source| RespondError::Sheet {
                href: href.to_string(),
                source,
            })
    }
}

/// Whether `href` starts with a scheme and/or `//` authority prefix.
fn has_scheme_or_authority(href: &str) -> bool {
    let prefix_len = href
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic() || *b == b':')
        .count();
    href[prefix_len..].starts_with("//")
}

fn host_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Whether a stylesheet at `href` may be fetched for a page on `page_host`.
///
/// Plain relative hrefs are same-origin unless a `<base>` element redirects
/// them; anything else must resolve to `page_host`.
pub fn is_same_origin(href: &str, base_href: Option<&str>, page_host: Option<&str>) -> bool {
    let resolved = if has_scheme_or_authority(href) {
        let absolute = if href.starts_with("//") {
            format!("http:{}", href)
        } else {
            href.to_string()
        };
        Url::parse(&absolute).ok()
    } else {
        match base_href.map(Url::parse) {
            None => return true,
            Some(Ok(base)) => base.join(href).ok(),
            // A relative base keeps the page's own origin.
            Some(Err(_)) => return true,
        }
    };
    match (resolved.as_ref().and_then(host_of), page_host) {
        (Some(host), Some(page)) => host.eq_ignore_ascii_case(page),
        _ => false,
    }
}
