use std::{ops::Range, sync::LazyLock};

use log::{debug, warn};
use regex::Regex;

/// Fenced forms of the feed directive, tried in order.
static DIRECTIVE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?ms)^```\{feed\}[^\n]*\n(.*?)^```[ \t]*\r?$",
        r"(?ms)^:::\{feed\}[^\n]*\n(.*?)^:::[ \t]*\r?$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

pub(crate) static ENTRY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})-(\S+)$").unwrap());

/// The feed directive block found in an index document.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FeedDirective {
    /// Byte range of the whole block, fences included.
    pub span: Range<usize>,
    /// Entry identifiers in listed order, duplicates kept.
    pub ids: Vec<String>,
}

/// Locates the feed directive in `text`. Returns `None` when the document has
/// no directive; callers treat that as "nothing to publish".
pub(crate) fn find_feed_directive(text: &str) -> Option<FeedDirective> {
    for pattern in DIRECTIVE_PATTERNS.iter() {
        let mut found = pattern.captures_iter(text);
        let Some(caps) = found.next() else {
            continue;
        };
        if found.next().is_some() {
            warn!("More than one feed directive found. Only the first one is used.");
        }
        let (whole, block) = (caps.get(0)?, caps.get(1)?);
        return Some(FeedDirective {
            span: whole.range(),
            ids: parse_ids(block.as_str()),
        });
    }
    None
}

fn parse_ids(block: &str) -> Vec<String> {
    let mut ids = vec![];
    let mut listing = false;
    for line in block.lines() {
        let line = line.trim();
        if !listing && (line.is_empty() || line.starts_with(':')) {
            continue;
        }
        if ENTRY_ID.is_match(line) {
            listing = true;
            ids.push(line.to_string());
        } else if !line.is_empty() {
            debug!("Ignoring line in feed directive: {line:?}");
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "# News\n\nSome intro.\n\n```{feed}\n:rss: index.rss\n:title: News\n\n20250106-release\n20241212-launch\n```\n\nFooter.\n";

    #[test]
    fn reads_ids_in_listed_order() {
        let directive = find_feed_directive(INDEX).unwrap();
        assert_eq!(directive.ids, vec!["20250106-release", "20241212-launch"]);
        assert!(INDEX[directive.span.clone()].starts_with("```{feed}"));
        assert!(INDEX[directive.span.clone()].ends_with("```"));
        assert_eq!(&INDEX[directive.span.end..], "\n\nFooter.\n");
    }

    #[test]
    fn keeps_duplicates_and_skips_noise() {
        let text = "```{feed}\n:param: x\n20240101-a\nnot an id\n20230101-b\n20240101-a\n```\n";
        let directive = find_feed_directive(text).unwrap();
        assert_eq!(directive.ids, vec!["20240101-a", "20230101-b", "20240101-a"]);
    }

    #[test]
    fn accepts_colon_fence() {
        let text = "intro\n:::{feed}\n20240101-a\n:::\n";
        let directive = find_feed_directive(text).unwrap();
        assert_eq!(directive.ids, vec!["20240101-a"]);
        assert_eq!(&text[directive.span.end..], "\n");
    }

    #[test]
    fn empty_block_yields_no_ids() {
        let directive = find_feed_directive("```{feed}\n```\n").unwrap();
        assert!(directive.ids.is_empty());
    }

    #[test]
    fn missing_directive_is_none() {
        assert!(find_feed_directive("# News\n\n```python\nprint(1)\n```\n").is_none());
    }
}
