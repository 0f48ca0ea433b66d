//! Parsing of the Meraki Dashboard API's `Link` header.
//!
//! Meraki paginates with an opaque `startingAfter` cursor rather than page
//! numbers, exposed via a standard `Link: <url>; rel="next"` response
//! header. We only ever need the `next` relation.

use reqwest::header::HeaderMap;

pub fn next_link(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("Link")?.to_str().ok()?;
    parse_link_header(raw)
}

fn parse_link_header(raw: &str) -> Option<String> {
    for part in raw.split(',') {
        let mut segments = part.split(';');
        let url_part = segments.next()?.trim();
        let is_next = segments.any(|s| s.trim() == "rel=\"next\"");
        if is_next {
            let url = url_part.trim_start_matches('<').trim_end_matches('>');
            return Some(url.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_next_relation() {
        let raw = "<https://api.meraki.com/api/v1/x?startingAfter=abc>; rel=\"next\"";
        assert_eq!(
            parse_link_header(raw),
            Some("https://api.meraki.com/api/v1/x?startingAfter=abc".to_string())
        );
    }

    #[test]
    fn returns_none_when_only_last_relation_present() {
        let raw = "<https://api.meraki.com/api/v1/x?startingAfter=zzz>; rel=\"last\"";
        assert_eq!(parse_link_header(raw), None);
    }

    #[test]
    fn handles_multiple_relations_in_one_header() {
        let raw = "<https://x/prev>; rel=\"prev\", <https://x/next>; rel=\"next\"";
        assert_eq!(parse_link_header(raw), Some("https://x/next".to_string()));
    }
}
