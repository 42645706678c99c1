//! `Link` header parsing (RFC 8288 subset used by GitHub pagination).
//!
//! `<https://api.github.com/search/users?page=2>; rel="next", <...>; rel="last"`

use reqwest::header::{HeaderMap, LINK};

use topcontrib_core::header_str;

/// One `<url>; param=value` entry of a `Link` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link<'a> {
    pub url: &'a str,
    pub rels: Vec<&'a str>,
}

impl Link<'_> {
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r.eq_ignore_ascii_case(rel))
    }
}

/// Split on commas that are not inside `<...>`
fn split_entries(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_url = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '<' => in_url = true,
            '>' => in_url = false,
            ',' if !in_url => {
                entries.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&value[start..]);
    entries
}

fn parse_entry(entry: &str) -> Option<Link<'_>> {
    let rest = entry.trim().strip_prefix('<')?;
    let (url, params) = rest.split_once('>')?;

    let mut rels = Vec::new();
    for param in params.split(';') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("rel") {
            continue;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        rels.extend(value.split_whitespace());
    }
    Some(Link {
        url: url.trim(),
        rels,
    })
}

/// Parse every well-formed entry; malformed ones are skipped.
pub fn parse_link_header(value: &str) -> Vec<Link<'_>> {
    split_entries(value)
        .into_iter()
        .filter_map(|entry| {
            let link = parse_entry(entry);
            if link.is_none() && !entry.trim().is_empty() {
                log::debug!("skipping malformed Link entry: {entry:?}");
            }
            link
        })
        .collect()
}

/// URL of the first entry carrying `rel`
pub fn find_rel<'a>(value: &'a str, rel: &str) -> Option<&'a str> {
    parse_link_header(value)
        .into_iter()
        .find(|link| link.has_rel(rel))
        .map(|link| link.url)
}

/// Next-page cursor from response headers; `None` on the last page.
pub fn next_page(headers: &HeaderMap) -> Option<String> {
    let value = header_str(headers, LINK.as_str())?;
    find_rel(value, "next")
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}
