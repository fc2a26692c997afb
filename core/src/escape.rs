//! Percent-encoding helpers exposed next to the call surface.
//!
//! Stateless and independent of any slot. Every byte outside the RFC 3986
//! unreserved set is encoded; decoding leaves `+` and malformed escapes alone.

const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

pub fn escape(input: &str) -> String {
    escape_bytes(input.as_bytes())
}

/// Percent-encode arbitrary bytes; the input need not be UTF-8.
pub fn escape_bytes(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[usize::from(b >> 4)] as char);
            out.push(HEX[usize::from(b & 0x0f)] as char);
        }
    }
    out
}

/// Decode `%XX` sequences. Invalid UTF-8 in the result is replaced lossily.
pub fn unescape(input: &str) -> String {
    String::from_utf8_lossy(&unescape_bytes(input.as_bytes())).into_owned()
}

/// Decode `%XX` sequences into raw bytes.
pub fn unescape_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
