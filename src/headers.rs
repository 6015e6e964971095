//! Header storage and the case-insensitive name comparisons the parser and
//! session controller need (`Connection`, `Content-Length`).
//!
//! Name case is preserved on insert (spec.md §3); lookups of the two header
//! names this crate actually reads are case-insensitive, same as the
//! original's `strncasecmp`-based field lookup.

#[inline(always)]
fn eq_ascii_ci(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.bytes().zip(b.bytes())
        .all(|(x, y)| x.to_ascii_lowercase() == y.to_ascii_lowercase())
}

#[inline(always)]
pub fn is_connection(name: &str) -> bool {
    eq_ascii_ci(name, "Connection")
}

#[inline(always)]
pub fn is_content_length(name: &str) -> bool {
    eq_ascii_ci(name, "Content-Length")
}

/// An append-only multimap from header name to value, preserving every
/// occurrence in insertion order (mirrors the original's `multimap`).
#[derive(Debug, Default, Clone)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Headers {
        Headers { entries: Vec::new() }
    }

    pub fn insert(&mut self, name: String, value: String) {
        self.entries.push((name, value));
    }

    /// First value whose name matches `name` case-insensitively.
    pub fn get_ci(&self, name: &str) -> Option<&str> {
        self.entries.iter()
            .find(|&&(ref n, _)| eq_ascii_ci(n, name))
            .map(|&(_, ref v)| v.as_str())
    }

    /// First `Connection` header value, found via [`is_connection`].
    pub fn connection(&self) -> Option<&str> {
        self.entries.iter()
            .find(|&&(ref n, _)| is_connection(n))
            .map(|&(_, ref v)| v.as_str())
    }

    /// First `Content-Length` header value, found via [`is_content_length`].
    pub fn content_length(&self) -> Option<&str> {
        self.entries.iter()
            .find(|&&(ref n, _)| is_content_length(n))
            .map(|&(_, ref v)| v.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.entries.iter()
    }
}
