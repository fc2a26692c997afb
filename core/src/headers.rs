//! Header parsing and the two per-call header lists.
//!
//! # Design
//! Outgoing headers are kept as the raw `Name: Value` lines the caller added,
//! in insertion order, because the transport consumes them verbatim.
//! Incoming headers are parsed into key/value pairs and pushed to the *front*
//! of a deque. Lookup scans front-to-back, so when a key repeats the value
//! received last wins.

use std::collections::VecDeque;

/// Parse one raw response header line into a `(key, value)` pair.
///
/// Returns `None` for lines without a colon (status lines, the blank line
/// terminating the header block) and for lines with an empty key. The key is
/// kept verbatim; the value has leading and trailing whitespace removed.
pub fn parse_header_line(line: &[u8]) -> Option<(String, String)> {
    let split = line.iter().position(|&b| b == b':')?;
    if split == 0 {
        return None;
    }
    let key = String::from_utf8_lossy(&line[..split]).into_owned();
    let value = trim_whitespace(&line[split + 1..]);
    Some((key, String::from_utf8_lossy(value).into_owned()))
}

/// C `isspace` set: ASCII whitespace plus vertical tab.
fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0x0b
}

fn trim_whitespace(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if !is_space(*first) {
            break;
        }
        bytes = rest;
    }
    while let [rest @ .., last] = bytes {
        if !is_space(*last) {
            break;
        }
        bytes = rest;
    }
    bytes
}

/// Header name of a raw request line: everything before the first colon, or
/// the whole line when there is none.
fn line_name(line: &str) -> &str {
    line.split_once(':').map_or(line, |(name, _)| name)
}

/// Raw request header lines, consumed by exactly one call.
#[derive(Debug, Default, Clone)]
pub struct RequestHeaders {
    lines: Vec<String>,
}

impl RequestHeaders {
    pub fn push(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    /// Drop every line whose name case-insensitively equals `name`.
    pub fn remove(&mut self, name: &str) {
        self.lines
            .retain(|line| !line_name(line).eq_ignore_ascii_case(name));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn as_slice(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Parsed response headers of the most recent call, newest first.
#[derive(Debug, Default, Clone)]
pub struct ResponseHeaders {
    pairs: VecDeque<(String, String)>,
}

impl ResponseHeaders {
    /// Parse `line` and, if it is a header, record it ahead of all earlier ones.
    pub fn push_line(&mut self, line: &[u8]) {
        if let Some(pair) = parse_header_line(line) {
            self.pairs.push_front(pair);
        }
    }

    /// Case-insensitive lookup returning the most recently received value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Iterate newest first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_header() {
        let pair = parse_header_line(b"Content-Type: text/html\r\n").unwrap();
        assert_eq!(pair, ("Content-Type".to_string(), "text/html".to_string()));
    }

    #[test]
    fn status_line_is_not_a_header() {
        assert!(parse_header_line(b"HTTP/1.1 200 OK\r\n").is_none());
        assert!(parse_header_line(b"\r\n").is_none());
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(parse_header_line(b": value\r\n").is_none());
    }

    #[test]
    fn value_is_trimmed_on_both_ends() {
        let (_, value) = parse_header_line(b"X-Pad:\t  spaced out \x0b\r\n").unwrap();
        assert_eq!(value, "spaced out");
    }

    #[test]
    fn empty_value_is_kept() {
        let pair = parse_header_line(b"X-Empty:   \r\n").unwrap();
        assert_eq!(pair, ("X-Empty".to_string(), String::new()));
    }

    #[test]
    fn only_first_colon_splits() {
        let (key, value) = parse_header_line(b"Location: http://host:8080/x").unwrap();
        assert_eq!(key, "Location");
        assert_eq!(value, "http://host:8080/x");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = ResponseHeaders::default();
        headers.push_line(b"Content-Type: text/html\r\n");
        assert_eq!(headers.get("content-type"), Some("text/html"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/html"));
        assert_eq!(headers.get("content"), None);
    }

    #[test]
    fn duplicate_header_returns_last_received() {
        let mut headers = ResponseHeaders::default();
        headers.push_line(b"X-A: 1\r\n");
        headers.push_line(b"X-A: 2\r\n");
        assert_eq!(headers.get("x-a"), Some("2"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn non_header_lines_are_ignored() {
        let mut headers = ResponseHeaders::default();
        headers.push_line(b"HTTP/1.1 204 No Content\r\n");
        headers.push_line(b"\r\n");
        assert!(headers.is_empty());
    }

    #[test]
    fn request_headers_keep_insertion_order() {
        let mut headers = RequestHeaders::default();
        headers.push("X-First: 1");
        headers.push("X-Second: 2");
        assert_eq!(headers.as_slice(), ["X-First: 1", "X-Second: 2"]);
    }

    #[test]
    fn remove_matches_name_case_insensitively() {
        let mut headers = RequestHeaders::default();
        headers.push("X-Foo: a");
        headers.push("Accept: */*");
        headers.push("x-foo: b");
        headers.push("X-Foo-Bar: c");
        headers.push("X-FOO");
        headers.remove("X-Foo");
        assert_eq!(headers.as_slice(), ["Accept: */*", "X-Foo-Bar: c"]);
    }

    #[test]
    fn clear_keeps_list_usable() {
        let mut headers = RequestHeaders::default();
        headers.push("A: 1");
        headers.clear();
        assert!(headers.is_empty());
        headers.push("B: 2");
        assert_eq!(headers.len(), 1);
    }
}
