//! Pagination and hit-count response headers.
//!
//! The list endpoint paginates with an RFC 5988 style `Link` header:
//!
//! ```text
//! <https://host/.../issues/?cursor=0:0:1>; rel="previous"; results="false"; cursor="0:0:1",
//! <https://host/.../issues/?cursor=0:25:0>; rel="next"; results="true"; cursor="0:25:0"
//! ```
//!
//! Missing or malformed headers are never errors: they parse to empty links / zero hits.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageLink {
    pub href: String,
    pub results: bool,
    pub cursor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageLinks {
    pub previous: Option<PageLink>,
    pub next: Option<PageLink>,
}

impl PageLinks {
    pub fn has_previous(&self) -> bool {
        self.previous.as_ref().is_some_and(|l| l.results)
    }

    pub fn has_next(&self) -> bool {
        self.next.as_ref().is_some_and(|l| l.results)
    }

    /// Cursor to navigate to, only if that direction has results.
    pub fn previous_cursor(&self) -> Option<&str> {
        self.previous
            .as_ref()
            .filter(|l| l.results)
            .map(|l| l.cursor.as_str())
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next
            .as_ref()
            .filter(|l| l.results)
            .map(|l| l.cursor.as_str())
    }
}

pub fn parse_link_header(header: Option<&str>) -> PageLinks {
    let mut links = PageLinks::default();
    let Some(header) = header else {
        return links;
    };

    for part in split_links(header) {
        let mut segments = part.split(';').map(str::trim);
        let Some(href) = segments
            .next()
            .and_then(|s| s.strip_prefix('<'))
            .and_then(|s| s.strip_suffix('>'))
        else {
            continue;
        };

        let mut rel = None;
        let mut link = PageLink {
            href: href.to_string(),
            ..PageLink::default()
        };
        for segment in segments {
            let Some((key, value)) = segment.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"');
            match key.trim() {
                "rel" => rel = Some(value.to_string()),
                "results" => link.results = value == "true",
                "cursor" => link.cursor = value.to_string(),
                _ => {}
            }
        }

        match rel.as_deref() {
            Some("previous") => links.previous = Some(link),
            Some("next") => links.next = Some(link),
            _ => {}
        }
    }
    links
}

/// Splits on commas that separate links, not commas inside `<...>` or quotes.
fn split_links(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_angle = false;
    let mut in_quote = false;
    for (i, c) in header.char_indices() {
        match c {
            '<' if !in_quote => in_angle = true,
            '>' if !in_quote => in_angle = false,
            '"' if !in_angle => in_quote = !in_quote,
            ',' if !in_angle && !in_quote => {
                parts.push(header[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = header[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

/// `X-Hits` / `X-Max-Hits`: absent or unparsable means 0.
pub fn parse_hits(header: Option<&str>) -> u64 {
    header.and_then(|h| h.trim().parse().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = concat!(
        "<https://sentry.io/api/0/organizations/acme/issues/?cursor=1700000000000:0:1>; ",
        r#"rel="previous"; results="false"; cursor="1700000000000:0:1", "#,
        "<https://sentry.io/api/0/organizations/acme/issues/?cursor=1700000000000:0:0>; ",
        r#"rel="next"; results="true"; cursor="1700000000000:0:0""#,
    );

    #[test]
    fn parses_both_directions() {
        let links = parse_link_header(Some(HEADER));
        let prev = links.previous.as_ref().unwrap();
        assert_eq!(
            prev.href,
            "https://sentry.io/api/0/organizations/acme/issues/?cursor=1700000000000:0:1"
        );
        assert!(!prev.results);
        assert_eq!(prev.cursor, "1700000000000:0:1");
        assert!(links.has_next());
        assert!(!links.has_previous());
        assert_eq!(links.next_cursor(), Some("1700000000000:0:0"));
        assert_eq!(links.previous_cursor(), None);
    }

    #[test]
    fn absent_header_is_empty() {
        let links = parse_link_header(None);
        assert_eq!(links, PageLinks::default());
        assert!(!links.has_next());
        assert!(!links.has_previous());
    }

    #[test]
    fn garbage_header_is_empty() {
        assert_eq!(parse_link_header(Some("not a link")), PageLinks::default());
        assert_eq!(parse_link_header(Some("")), PageLinks::default());
    }

    #[test]
    fn commas_inside_href_do_not_split() {
        let header = r#"<https://h/x?query=a,b>; rel="next"; results="true"; cursor="c""#;
        let links = parse_link_header(Some(header));
        assert_eq!(links.next.unwrap().href, "https://h/x?query=a,b");
    }

    #[test]
    fn hits_parsing() {
        assert_eq!(parse_hits(Some("42")), 42);
        assert_eq!(parse_hits(Some(" 100 ")), 100);
        assert_eq!(parse_hits(Some("lots")), 0);
        assert_eq!(parse_hits(None), 0);
    }
}
