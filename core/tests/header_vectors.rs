//! Verify header parsing against JSON test vectors stored in `test-vectors/`.
//!
//! Single-line cases pin the parser's key/value split; sequences replay a
//! whole header block and check lookups on the resulting list.

use fetch_core::{parse_header_line, ResponseHeaders};

fn vectors() -> serde_json::Value {
    let raw = include_str!("../../test-vectors/header_lines.json");
    serde_json::from_str(raw).unwrap()
}

#[test]
fn single_line_vectors() {
    for case in vectors()["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let line = case["line"].as_str().unwrap();

        let expected = case["expected"].as_array().map(|pair| {
            (
                pair[0].as_str().unwrap().to_string(),
                pair[1].as_str().unwrap().to_string(),
            )
        });
        assert_eq!(parse_header_line(line.as_bytes()), expected, "{name}");
    }
}

#[test]
fn sequence_vectors() {
    for case in vectors()["sequences"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();

        let mut headers = ResponseHeaders::default();
        for line in case["lines"].as_array().unwrap() {
            headers.push_line(line.as_str().unwrap().as_bytes());
        }

        for (key, expected) in case["lookups"].as_object().unwrap() {
            assert_eq!(headers.get(key), expected.as_str(), "{name}: {key}");
        }
    }
}
