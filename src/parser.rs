//! The request parser (C1, spec.md §4.1): incremental parse of the request
//! line, header block and body, restartable across I/O events.
//!
//! Grounded in `examples/original_source/src/http2/http_session.cc`'s
//! `Parse`/`ParseHeaderLine`/`ParseHeaderField`/`ExtractBody`/
//! `SetHeaderMetadata`, reshaped into small free functions over an explicit
//! `RequestState`, the way the teacher keeps parsing logic (`server/parser.rs`)
//! separate from the connection-lifecycle glue (`session.rs` here, `http1.rs`
//! there).

use error::ParseError;
use headers::Headers;
use method::Method;
use url;
use version::Version;

/// Read side of the buffer primitive spec.md §1 names as externally
/// supplied (here: `rotor_stream::Buf`, adapted in `session.rs`). Kept as a
/// small trait so the phase machine can be unit-tested without an event
/// loop, the same way `message.rs` tests the response side against a bare
/// `rotor_stream::Buf` rather than a live connection.
pub trait ReadBuf {
    fn as_slice(&self) -> &[u8];
    fn consume(&mut self, n: usize);
}

impl ReadBuf for Vec<u8> {
    fn as_slice(&self) -> &[u8] {
        &self[..]
    }
    fn consume(&mut self, n: usize) {
        self.drain(..n);
    }
}

/// spec.md §3 `parse_phase`. Declaration order doubles as the "monotonically
/// non-decreasing" ordering tested in spec.md §8.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub enum ParsePhase {
    HeaderLine,
    HeaderFields,
    Body,
    Finished,
}

/// The request-related fields of a `Session` (spec.md §3), kept apart from
/// connection-lifecycle state (timers, id) so the phase machine is testable
/// in isolation.
#[derive(Debug)]
pub struct RequestState {
    pub phase: ParsePhase,
    pub method: Method,
    pub version: Version,
    /// Raw request target while parsing; the normalized filesystem path
    /// once `Finished`.
    pub url: Vec<u8>,
    pub query: Vec<u8>,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub is_static: bool,
    pub is_complex: bool,
    pub is_keep_alive: bool,
    pub content_length: Option<u64>,
}

impl RequestState {
    pub fn new() -> RequestState {
        RequestState {
            phase: ParsePhase::HeaderLine,
            method: Method::Unsupported,
            version: Version::Unsupported,
            url: Vec::new(),
            query: Vec::new(),
            headers: Headers::new(),
            body: Vec::new(),
            is_static: true,
            is_complex: false,
            is_keep_alive: false,
            content_length: None,
        }
    }

    /// Invariant 4 (spec.md §3): headers cleared, flags reset to their
    /// initial values, `url`/`query` contents left for the next parse to
    /// overwrite (their heap allocation is kept).
    pub fn reset(&mut self) {
        self.phase = ParsePhase::HeaderLine;
        self.method = Method::Unsupported;
        self.version = Version::Unsupported;
        self.headers.clear();
        self.body.clear();
        self.is_static = true;
        self.is_complex = false;
        self.is_keep_alive = false;
        self.content_length = None;
    }
}

/// Result of one parser invocation (spec.md §4.1).
pub enum ParseOutcome {
    /// Full request parsed; `state` now reflects it.
    Good,
    /// Not enough bytes yet; call again once more arrive.
    Short,
    /// Fatal: `state`'s fields up to the failure point are not meaningful,
    /// the buffer position is unspecified, and the caller must not parse
    /// further on this connection.
    Error(ParseError),
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Drives the phase machine forward as far as the available bytes allow.
/// `Reset()` runs lazily here, the single `Finished -> HeaderLine`
/// transition allowed by invariant 1.
pub fn parse(state: &mut RequestState, buf: &mut impl ReadBuf) -> ParseOutcome {
    if state.phase == ParsePhase::Finished {
        state.reset();
    }

    loop {
        match state.phase {
            ParsePhase::HeaderLine => {
                let line_len = match find_crlf(buf.as_slice()) {
                    Some(n) => n,
                    None => return ParseOutcome::Short,
                };
                let line = buf.as_slice()[..line_len].to_vec();
                match parse_header_line(state, &line) {
                    Ok(()) => {
                        buf.consume(line_len + 2);
                        state.phase = ParsePhase::HeaderFields;
                    }
                    Err(e) => return ParseOutcome::Error(e),
                }
            }
            ParsePhase::HeaderFields => {
                let line_len = match find_crlf(buf.as_slice()) {
                    Some(n) => n,
                    None => return ParseOutcome::Short,
                };
                let line = buf.as_slice()[..line_len].to_vec();
                match parse_header_field(state, &line) {
                    Ok(end_of_headers) => {
                        buf.consume(line_len + 2);
                        if end_of_headers {
                            state.phase = ParsePhase::Body;
                        }
                    }
                    Err(e) => return ParseOutcome::Error(e),
                }
            }
            ParsePhase::Body => {
                set_header_metadata(state);
                match state.content_length {
                    Some(len) => {
                        if buf.as_slice().len() as u64 >= len {
                            let body = buf.as_slice()[..len as usize].to_vec();
                            buf.consume(len as usize);
                            state.body = body;
                            state.phase = ParsePhase::Finished;
                        } else {
                            return ParseOutcome::Short;
                        }
                    }
                    None => {
                        state.phase = ParsePhase::Finished;
                    }
                }
            }
            ParsePhase::Finished => {
                return ParseOutcome::Good;
            }
        }
    }
}

fn parse_header_line(state: &mut RequestState, line: &[u8]) -> Result<(), ParseError> {
    let method_end = position(line, b' ').ok_or(ParseError::MissingMethod)?;
    state.method = Method::parse(&line[..method_end]);
    if state.method == Method::Unsupported {
        return Err(ParseError::UnsupportedMethod);
    }
    if state.method == Method::Post {
        state.is_static = false;
    }

    let rest = &line[method_end + 1..];
    let url_end = position(rest, b' ').ok_or(ParseError::MissingUrl)?;
    let raw_url = &rest[..url_end];
    if raw_url.is_empty() {
        return Err(ParseError::EmptyUrl);
    }
    if raw_url[0] != b'/' {
        return Err(ParseError::UrlMustBeAbsolute);
    }
    state.url = raw_url.to_vec();

    let (is_complex, is_dynamic) = url::scan_complexity(&raw_url[1..]);
    state.is_complex = is_complex;
    if is_dynamic {
        state.is_static = false;
    }

    let version_token = &rest[url_end + 1..];
    if version_token.is_empty() {
        return Err(ParseError::MissingVersion);
    }
    if !version_token.starts_with(b"HTTP/") {
        return Err(ParseError::MalformedVersion);
    }
    let digits = &version_token[5..];
    let dot = position(digits, b'.').ok_or(ParseError::MalformedVersion)?;
    let major = parse_digits(&digits[..dot]).ok_or(ParseError::MalformedVersion)?;
    let minor = parse_digits(&digits[dot + 1..]).ok_or(ParseError::MalformedVersion)?;
    state.version = Version::from_code(major * 100 + minor);
    if state.version == Version::Unsupported {
        return Err(ParseError::UnsupportedVersion);
    }

    if state.is_complex {
        let (url, query) = url::normalize(&state.url, state.is_static)?;
        state.url = url;
        state.query = query;
    }

    Ok(())
}

fn parse_header_field(state: &mut RequestState, line: &[u8]) -> Result<bool, ParseError> {
    if line.is_empty() {
        return Ok(true);
    }
    let colon = position(line, b':').ok_or(ParseError::MissingColon)?;
    let name = String::from_utf8_lossy(&line[..colon]).into_owned();
    let value_start = (colon + 2).min(line.len());
    let value = String::from_utf8_lossy(&line[value_start..]).into_owned();
    state.headers.insert(name, value);
    Ok(false)
}

fn set_header_metadata(state: &mut RequestState) {
    state.is_keep_alive = match state.headers.connection() {
        Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
        Some(v) if v.eq_ignore_ascii_case("close") => false,
        _ => state.version == Version::Http11,
    };
    state.content_length = state.headers.content_length()
        .and_then(|v| v.trim().parse::<u64>().ok());
}

fn position(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}

fn parse_digits(s: &[u8]) -> Option<u32> {
    if s.is_empty() || !s.iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut n: u32 = 0;
    for &b in s {
        n = n.checked_mul(10)?.checked_add((b - b'0') as u32)?;
    }
    Some(n)
}

#[cfg(test)]
mod test {
    use super::*;
    use method::Method;
    use version::Version;

    fn buf(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn minimal_get_root() {
        let mut st = RequestState::new();
        let mut b = buf("GET / HTTP/1.1\r\nHost: x\r\n\r\n");
        match parse(&mut st, &mut b) {
            ParseOutcome::Good => {}
            _ => panic!("expected Good"),
        }
        assert_eq!(st.method, Method::Get);
        assert_eq!(st.version, Version::Http11);
        assert_eq!(st.url, b"/");
        assert!(st.is_static);
        assert!(st.is_keep_alive);
    }

    #[test]
    fn partial_receive_one_byte_at_a_time_matches_single_buffer() {
        let full = "GET /a HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhello";
        let mut one_shot_state = RequestState::new();
        let mut one_shot_buf = buf(full);
        assert!(matches!(parse(&mut one_shot_state, &mut one_shot_buf), ParseOutcome::Good));

        let mut incremental_state = RequestState::new();
        let mut incremental_buf: Vec<u8> = Vec::new();
        let mut outcome_was_good = false;
        for &byte in full.as_bytes() {
            incremental_buf.push(byte);
            match parse(&mut incremental_state, &mut incremental_buf) {
                ParseOutcome::Good => { outcome_was_good = true; break; }
                ParseOutcome::Short => {}
                ParseOutcome::Error(_) => panic!("unexpected parse error"),
            }
        }
        assert!(outcome_was_good);
        assert_eq!(incremental_state.url, one_shot_state.url);
        assert_eq!(incremental_state.body, one_shot_state.body);
        assert_eq!(incremental_state.is_keep_alive, one_shot_state.is_keep_alive);
    }

    #[test]
    fn unsupported_version_is_error() {
        let mut st = RequestState::new();
        let mut b = buf("GET / HTTP/2.0\r\n\r\n");
        match parse(&mut st, &mut b) {
            ParseOutcome::Error(e) => assert_eq!(e.status().code(), 400),
            _ => panic!("expected error"),
        }
    }

    #[test]
    fn unsupported_method_is_405() {
        let mut st = RequestState::new();
        let mut b = buf("DELETE / HTTP/1.1\r\n\r\n");
        match parse(&mut st, &mut b) {
            ParseOutcome::Error(e) => assert_eq!(e.status().code(), 405),
            _ => panic!("expected error"),
        }
    }

    #[test]
    fn bad_percent_encoding_is_400() {
        let mut st = RequestState::new();
        let mut b = buf("GET /a%zz HTTP/1.1\r\n\r\n");
        match parse(&mut st, &mut b) {
            ParseOutcome::Error(e) => assert_eq!(e.status().code(), 400),
            _ => panic!("expected error"),
        }
    }

    #[test]
    fn post_forces_dynamic_without_requiring_query_mark() {
        let mut st = RequestState::new();
        let mut b = buf("POST /app.so HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello");
        assert!(matches!(parse(&mut st, &mut b), ParseOutcome::Good));
        assert!(!st.is_static);
        assert_eq!(st.url, b"/app.so");
        assert_eq!(st.body, b"hello");
    }

    #[test]
    fn get_with_query_splits_dynamic_target() {
        let mut st = RequestState::new();
        let mut b = buf("GET /app.so?k=1&k2=v HTTP/1.1\r\n\r\n");
        assert!(matches!(parse(&mut st, &mut b), ParseOutcome::Good));
        assert!(!st.is_static);
        assert_eq!(st.url, b"/app.so");
        assert_eq!(st.query, b"k=1&k2=v");
    }

    #[test]
    fn connection_close_wins_over_http11_default() {
        let mut st = RequestState::new();
        let mut b = buf("GET / HTTP/1.1\r\nConnection: close\r\n\r\n");
        assert!(matches!(parse(&mut st, &mut b), ParseOutcome::Good));
        assert!(!st.is_keep_alive);
    }

    #[test]
    fn reset_clears_request_scoped_fields_but_keeps_buffers() {
        let mut st = RequestState::new();
        st.url = b"/leftover".to_vec();
        st.is_keep_alive = true;
        st.content_length = Some(4);
        st.headers.insert("X".into(), "Y".into());
        st.phase = ParsePhase::Finished;
        st.reset();
        assert_eq!(st.phase, ParsePhase::HeaderLine);
        assert!(st.is_static);
        assert!(!st.is_complex);
        assert!(!st.is_keep_alive);
        assert_eq!(st.content_length, None);
        assert_eq!(st.method, Method::Unsupported);
        assert!(st.headers.is_empty());
        // url is left for the next parse to overwrite, not explicitly cleared
        assert_eq!(st.url, b"/leftover");
    }

    #[test]
    fn phase_is_monotonic_within_one_message() {
        let mut st = RequestState::new();
        let full = "GET / HTTP/1.1\r\n\r\n";
        let mut seen = Vec::new();
        let mut b: Vec<u8> = Vec::new();
        for &byte in full.as_bytes() {
            b.push(byte);
            seen.push(st.phase);
            let _ = parse(&mut st, &mut b);
        }
        for w in seen.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }
}
