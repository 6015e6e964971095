//! The URL normalizer (C2, spec.md §4.2): a single left-to-right state
//! machine that collapses `//`, resolves `.`/`..`, percent-decodes, and
//! splits `path?query` in one pass over the raw request target.
//!
//! Ported from the state machine in
//! `examples/original_source/src/http2/http_session.cc`'s
//! `ParseComplexUrl`, restructured as an explicit Rust enum match (the
//! teacher's preferred shape for small protocol state machines) rather
//! than a `switch` with a captured "trap" variable.

use error::ParseError;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum PathState {
    Usual,
    Slash,
    Dot,
    DoubleDot,
}

enum Step {
    /// Advance to this state; byte already pushed to the output if needed.
    Next(PathState),
    /// `%` encountered in `state`: the caller should decode the following
    /// two hex digits and re-enter via `step` with `allow_escape = false`.
    StartEscape(PathState),
}

/// Applies one input byte to the path half of the state machine.
///
/// `allow_escape` is `false` when `c` is itself the result of decoding a
/// `%HH` escape: a decoded `%` is emitted literally rather than starting a
/// *second* decode, which would let a client smuggle `%252e` past a single
/// decoding pass. A decoded `/` or `.` still re-enters the normal
/// classification, so `/a%2e%2e%2fb` collapses exactly like `/a/../b`.
fn step(state: PathState, c: u8, out: &mut Vec<u8>, allow_escape: bool) -> Step {
    use self::PathState::*;
    match (state, c) {
        (Usual, b'/') => { out.push(b'/'); Step::Next(Slash) }
        (Usual, b'%') if allow_escape => Step::StartEscape(Usual),
        (Usual, _) => { out.push(c); Step::Next(Usual) }

        (Slash, b'/') => Step::Next(Slash), // collapse duplicate slash
        (Slash, b'.') => Step::Next(Dot),
        (Slash, b'%') if allow_escape => Step::StartEscape(Slash),
        (Slash, _) => { out.push(c); Step::Next(Usual) }

        (Dot, b'/') => Step::Next(Slash), // collapse "/./"
        (Dot, b'.') => Step::Next(DoubleDot),
        (Dot, b'%') if allow_escape => Step::StartEscape(Dot),
        (Dot, _) => { out.push(c); Step::Next(Usual) }

        (DoubleDot, b'/') => { pop_segment(out); Step::Next(Slash) }
        (DoubleDot, b'%') if allow_escape => Step::StartEscape(DoubleDot),
        (DoubleDot, _) => { out.push(c); Step::Next(Usual) }
    }
}

/// Removes the last emitted path segment, same truncation point as the
/// original's `transfer_url.erase(transfer_url.rfind('/', size - 2) + 1)`.
///
/// Above-root escapes are not rejected: popping past the root simply has
/// nowhere left to find a `/` before the trailing one, so the output stays
/// rooted at `/` rather than going negative (spec.md §9 Open Questions).
fn pop_segment(out: &mut Vec<u8>) {
    let len = out.len();
    let bound = if len >= 2 { len - 2 } else { 0 };
    let pos = out[..=bound].iter().rposition(|&b| b == b'/').unwrap_or(0);
    out.truncate(pos + 1);
}

fn hex_value(c: u8) -> Result<u8, ParseError> {
    if c.is_ascii_digit() {
        return Ok(c - b'0');
    }
    let folded = c | 0x20;
    if folded >= b'a' && folded <= b'f' {
        return Ok(folded - b'a' + 10);
    }
    Err(ParseError::BadPercentEncoding)
}

/// Runs the normalizer over `raw` (the request target exactly as it
/// appeared on the wire, including its leading `/`).
///
/// For static requests the whole decoded path is returned as `url` and
/// `query` is empty. For dynamic requests (`is_static = false`) the output
/// is split on the first `?`; if none is present after decoding, `query`
/// stays empty (spec.md §9: a POST whose URL lacks `?` is not an error).
pub fn normalize(raw: &[u8], is_static: bool) -> Result<(Vec<u8>, Vec<u8>), ParseError> {
    let mut out = Vec::with_capacity(raw.len());
    let mut state = PathState::Usual;
    let mut trap = PathState::Usual;
    let mut i = 0;
    while i < raw.len() {
        let c = raw[i];
        i += 1;
        match step(state, c, &mut out, true) {
            Step::Next(s) => state = s,
            Step::StartEscape(t) => {
                trap = t;
                if i >= raw.len() {
                    return Err(ParseError::BadPercentEncoding);
                }
                let hi = hex_value(raw[i])?;
                i += 1;
                if i >= raw.len() {
                    return Err(ParseError::BadPercentEncoding);
                }
                let lo = hex_value(raw[i])?;
                i += 1;
                let decoded = (hi << 4) | lo;
                match step(trap, decoded, &mut out, false) {
                    Step::Next(s) => state = s,
                    Step::StartEscape(_) => unreachable!("escape disallowed on decoded byte"),
                }
            }
        }
    }

    if is_static {
        Ok((out, Vec::new()))
    } else {
        match out.iter().position(|&b| b == b'?') {
            Some(pos) => {
                let query = out[pos + 1..].to_vec();
                out.truncate(pos);
                Ok((out, query))
            }
            None => Ok((out, Vec::new())),
        }
    }
}

/// Pre-scan used by the request-line parser (spec.md §4.1) to decide
/// whether the normalizer needs to run at all, and whether a `?` forces
/// the request to be treated as dynamic.
///
/// `path` is the request target with its leading `/` already stripped.
/// Every `/`-delimited segment is checked, including the final one after
/// the last slash — spec.md is explicit that *any* segment counts, unlike
/// the original's scan loop which only inspected segments followed by
/// another slash.
pub fn scan_complexity(path: &[u8]) -> (bool, bool) {
    let mut is_complex = false;
    let mut is_dynamic = false;
    for segment in path.split(|&b| b == b'/') {
        if segment.is_empty() || segment == b"." || segment == b".."
            || segment.contains(&b'%')
        {
            is_complex = true;
        }
        if segment.contains(&b'?') {
            is_complex = true;
            is_dynamic = true;
        }
    }
    (is_complex, is_dynamic)
}

#[cfg(test)]
mod test {
    use super::{normalize, scan_complexity};

    fn norm_static(s: &str) -> String {
        let (url, _) = normalize(s.as_bytes(), true).unwrap();
        String::from_utf8(url).unwrap()
    }

    #[test]
    fn collapses_duplicate_slashes() {
        assert_eq!(norm_static("/a///b"), norm_static("/a/b"));
    }

    #[test]
    fn collapses_dot_segment() {
        assert_eq!(norm_static("/a/./b"), norm_static("/a/b"));
    }

    #[test]
    fn pops_dot_dot_segment() {
        assert_eq!(norm_static("/a/b/../c"), norm_static("/a/c"));
    }

    #[test]
    fn dot_dot_above_root_clamps_instead_of_escaping() {
        assert_eq!(norm_static("/../x"), "/x");
        assert_eq!(norm_static("/../../x"), "/x");
    }

    #[test]
    fn percent_decodes_normal_bytes() {
        assert_eq!(norm_static("/a%41b"), "/aAb");
        assert_eq!(norm_static("/a%61b"), "/aab");
    }

    #[test]
    fn percent_decoded_slash_reenters_collapsing() {
        // %2F decodes to '/', must behave like a literal slash.
        assert_eq!(norm_static("/x%2Fy"), "/x/y");
    }

    #[test]
    fn percent_decoded_dot_dot_still_pops() {
        assert_eq!(norm_static("/a/b/%2e%2e/c"), norm_static("/a/c"));
    }

    #[test]
    fn bad_percent_encoding_is_an_error() {
        assert!(normalize(b"/a%zzb", true).is_err());
        assert!(normalize(b"/a%4", true).is_err());
        assert!(normalize(b"/a%", true).is_err());
    }

    #[test]
    fn idempotent_on_already_normalized_paths() {
        for path in &["/a/b", "/", "/a", "/a/b/c"] {
            let first = norm_static(path);
            let second = norm_static(&first);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn dynamic_split_on_question_mark() {
        let (url, query) = normalize(b"/app.so?k=1&k2=v", false).unwrap();
        assert_eq!(url, b"/app.so");
        assert_eq!(query, b"k=1&k2=v");
    }

    #[test]
    fn dynamic_without_query_mark_is_not_an_error() {
        let (url, query) = normalize(b"/app.so", false).unwrap();
        assert_eq!(url, b"/app.so");
        assert!(query.is_empty());
    }

    #[test]
    fn scan_flags_dot_segments_and_percent_and_empty() {
        assert_eq!(scan_complexity(b"a/./b"), (true, false));
        assert_eq!(scan_complexity(b"a/../b"), (true, false));
        assert_eq!(scan_complexity(b"a//b"), (true, false));
        assert_eq!(scan_complexity(b"a%20b"), (true, false));
        assert_eq!(scan_complexity(b"a/b"), (false, false));
    }

    #[test]
    fn scan_flags_query_as_complex_and_dynamic() {
        assert_eq!(scan_complexity(b"app.so?k=1"), (true, true));
    }
}
