use anyhow::Context as _;
use handlebars::Handlebars;

use crate::{directive::FeedDirective, metadata::Entry, renderer::FRAGMENT_TEMPLATE};

use super::{
    data::FragmentData,
    utils::{anchor, collapse_blank_lines},
};

const DIVIDER: &str = "\n\n---\n\n";

/// Replaces the directive block of `index` with one fragment per entry, in the
/// order given. Entries are expected in directive order.
pub(super) fn compose_digest(
    handlebars: &Handlebars<'static>,
    index: &str,
    directive: &FeedDirective,
    entries: &[&Entry],
) -> anyhow::Result<String> {
    let mut fragments = Vec::with_capacity(entries.len());
    for &entry in entries {
        let data = FragmentData {
            entry,
            href: format!("{}.html#{}", entry.id, anchor(&entry.title)),
            published: entry.date.format("%Y-%m-%d %H:%M").to_string(),
        };
        let fragment = handlebars
            .render(FRAGMENT_TEMPLATE, &data)
            .with_context(|| format!("while rendering {}", entry.id))?;
        fragments.push(fragment.trim_end().to_string());
    }

    let digest = format!(
        "{}{}{}",
        &index[..directive.span.start],
        fragments.join(DIVIDER),
        &index[directive.span.end..]
    );
    Ok(collapse_blank_lines(&digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{directive::find_feed_directive, entry::parse_entry, renderer::generate_renderer};

    const INDEX: &str = "# News\n\n```{feed}\n20250106-release\n20241212-launch\n```\n\nOlder news is archived.\n";

    #[test]
    fn fragments_in_directive_order_with_dividers() {
        let handlebars = generate_renderer(None).unwrap();
        let directive = find_feed_directive(INDEX).unwrap();
        let launch = parse_entry("20241212-launch", "# Launch Day!\n\nWe launched.\n", "").unwrap();
        let release = parse_entry(
            "20250106-release",
            "# Release\n% feed-entry: date: 2025-01-06 10:30\n\nIt is out.\n\n\n\nMore soon.\n",
            "",
        )
        .unwrap();

        let out = compose_digest(&handlebars, INDEX, &directive, &[&release, &launch]).unwrap();
        assert_eq!(
            out,
            concat!(
                "# News\n\n",
                "## [Release](20250106-release.html#release)\n\n",
                "*Published on 2025-01-06 10:30*\n\n",
                "It is out.\n\nMore soon.\n\n",
                "---\n\n",
                "## [Launch Day!](20241212-launch.html#launch-day)\n\n",
                "*Published on 2024-12-12 00:00*\n\n",
                "We launched.\n\n",
                "Older news is archived.\n",
            )
        );
        assert_eq!(out.matches("---").count(), 1);
    }

    #[test]
    fn no_entries_leaves_empty_region() {
        let handlebars = generate_renderer(None).unwrap();
        let directive = find_feed_directive(INDEX).unwrap();
        let out = compose_digest(&handlebars, INDEX, &directive, &[]).unwrap();
        assert_eq!(out, "# News\n\nOlder news is archived.\n");
    }
}
