//! Header block parsing and request-header normalization.

use std::collections::BTreeMap;

use crate::config::Headers;

/// Parse a raw `name: value` header block (CRLF or LF separated) into a map
/// with lower-cased names and trimmed values. Lines without a colon or with an
/// empty name are skipped; repeated names are joined with `", "`.
pub fn parse_headers(raw: &str) -> BTreeMap<String, String> {
    let mut parsed: BTreeMap<String, String> = BTreeMap::new();
    for line in raw.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            continue;
        }
        let value = value.trim();
        parsed
            .entry(name)
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    parsed
}

/// Drop every `Content-Type` header (any case) when there is no body, so an
/// absent payload never advertises a content type.
pub(crate) fn strip_content_type_without_body(headers: &mut Headers, has_body: bool) {
    if !has_body {
        headers.retain(|name, _| !name.eq_ignore_ascii_case("content-type"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lowercases_and_trims() {
        let parsed = parse_headers("Content-Type: application/json\r\nX-Request-Id:  42 \r\n");
        assert_eq!(parsed["content-type"], "application/json");
        assert_eq!(parsed["x-request-id"], "42");
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn parse_keeps_colons_in_values() {
        let parsed = parse_headers("Date: Tue, 21 Mar 2023 10:00:00 GMT");
        assert_eq!(parsed["date"], "Tue, 21 Mar 2023 10:00:00 GMT");
    }

    #[test]
    fn parse_skips_malformed_lines() {
        let parsed = parse_headers("garbage\n: no-name\nok: yes\n\n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["ok"], "yes");
    }

    #[test]
    fn parse_joins_repeated_headers() {
        let parsed = parse_headers("Vary: Accept\nvary: Origin\n");
        assert_eq!(parsed["vary"], "Accept, Origin");
    }

    #[test]
    fn parse_empty_block() {
        assert!(parse_headers("").is_empty());
    }

    #[test]
    fn content_type_removed_without_body() {
        let mut headers = Headers::new();
        headers.insert("content-TYPE".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "*/*".to_string());
        strip_content_type_without_body(&mut headers, false);
        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key("Accept"));
    }

    #[test]
    fn content_type_kept_with_body() {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        strip_content_type_without_body(&mut headers, true);
        assert_eq!(headers["Content-Type"], "application/json");
    }
}
