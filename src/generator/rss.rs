use anyhow::anyhow;
use atom_syndication::LinkBuilder;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::info;
use rss::{
    extension::atom::AtomExtension, validation::Validate, Channel, ChannelBuilder, GuidBuilder,
    Item, ItemBuilder,
};

use crate::{context::Context, metadata::Entry};

use super::utils::{sort_entry, write_atomic};

/// RFC 822 as used by RSS. Dates carry no zone and are published as GMT.
const RFC822: &str = "%a, %d %b %Y %H:%M:%S GMT";
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>";
pub(crate) const MAX_ITEMS: usize = 10;

pub(super) fn write_rss(ctx: &Context, channel: &Channel) -> anyhow::Result<()> {
    let xml = to_xml(channel)?;
    write_atomic(&ctx.output_path, &xml)
        .map_err(|e| e.context(format!("while writing {:?}", ctx.output_path)))?;

    info!(
        "Generated RSS feed {:?} with {} items",
        ctx.output_path,
        channel.items().len()
    );
    Ok(())
}

pub(super) fn build_channel(
    ctx: &Context,
    entries: &[Entry],
    now: DateTime<Utc>,
) -> anyhow::Result<Channel> {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by(sort_entry);

    let items: Vec<Item> = sorted
        .into_iter()
        .take(MAX_ITEMS)
        .map(|entry| entry_to_item(entry, &ctx.base_url))
        .collect();

    let feed_name = ctx
        .output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index.rss".to_string());
    let self_link = LinkBuilder::default()
        .href(format!("{}{feed_name}", ctx.base_url))
        .rel("self".to_string())
        .mime_type(Some("application/rss+xml".to_string()))
        .build();

    let channel = ChannelBuilder::default()
        .title(ctx.feed_title.clone())
        .link(ctx.base_url.clone())
        .description(ctx.feed_description.clone())
        .language(Some(ctx.language.clone()))
        .last_build_date(Some(now.format(RFC822).to_string()))
        .atom_ext(Some(AtomExtension {
            links: vec![self_link],
        }))
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("RSS validation failed: {e}"))?;
    Ok(channel)
}

/// Two-space indented document with a single UTF-8 declaration on top.
fn to_xml(channel: &Channel) -> anyhow::Result<String> {
    let xml = String::from_utf8(channel.pretty_write_to(Vec::new(), b' ', 2)?)?;
    let body = match xml.strip_prefix("<?xml") {
        Some(rest) => rest.split_once("?>").map_or(rest, |(_, body)| body),
        None => &xml,
    };
    Ok(format!("{XML_DECLARATION}\n{}\n", body.trim()))
}

fn entry_to_item(entry: &Entry, base_url: &str) -> Item {
    let link = format!("{base_url}{}", entry.link);
    ItemBuilder::default()
        .title(Some(entry.title.clone()))
        .description(Some(handlebars::html_escape(&entry.description)))
        .link(Some(link.clone()))
        .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
        .pub_date(Some(pub_date(&entry.date)))
        .build()
}

fn pub_date(date: &NaiveDateTime) -> String {
    date.format(RFC822).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::parse_entry;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn make_context() -> Context {
        Context::new(
            PathBuf::from("news"),
            None,
            PathBuf::from("_build/index.rss"),
            "https://example.com/docs",
            handlebars::Handlebars::new(),
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn two_entries_newest_first() {
        let ctx = make_context();
        let entries = vec![
            parse_entry("20241212-launch", "# Launch\n\nFirst.\n", &ctx.entry_path).unwrap(),
            parse_entry("20250106-release", "# Release\n\nSecond & last.\n", &ctx.entry_path)
                .unwrap(),
        ];
        let channel = build_channel(&ctx, &entries, now()).unwrap();

        assert_eq!(channel.title(), "App Python API News");
        assert_eq!(channel.link(), "https://example.com/docs/");
        assert_eq!(channel.language(), Some("en-us"));
        assert_eq!(channel.last_build_date(), Some("Sat, 01 Feb 2025 12:00:00 GMT"));

        let items = channel.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title(), Some("Release"));
        assert_eq!(
            items[0].link(),
            Some("https://example.com/docs/news/20250106-release.html")
        );
        assert_eq!(items[0].guid().map(|g| g.value()), items[0].link());
        assert_eq!(items[0].pub_date(), Some("Mon, 06 Jan 2025 00:00:00 GMT"));
        assert_eq!(items[0].description(), Some("Second &amp; last."));
        assert_eq!(items[1].title(), Some("Launch"));
        assert_eq!(items[1].pub_date(), Some("Thu, 12 Dec 2024 00:00:00 GMT"));

        let atom = channel.atom_ext().unwrap();
        assert_eq!(atom.links()[0].href(), "https://example.com/docs/index.rss");
        assert_eq!(atom.links()[0].rel(), "self");
    }

    #[test]
    fn caps_at_ten_items_by_date() {
        let ctx = make_context();
        let entries: Vec<Entry> = (1..=12)
            .map(|day| {
                parse_entry(&format!("202501{day:02}-day"), "# Day\n", &ctx.entry_path).unwrap()
            })
            .collect();
        let channel = build_channel(&ctx, &entries, now()).unwrap();

        let items = channel.items();
        assert_eq!(items.len(), MAX_ITEMS);
        assert_eq!(items[0].pub_date(), Some("Sun, 12 Jan 2025 00:00:00 GMT"));
        assert_eq!(items[9].pub_date(), Some("Fri, 03 Jan 2025 00:00:00 GMT"));
        let dates: Vec<DateTime<chrono::FixedOffset>> = items
            .iter()
            .map(|i| DateTime::parse_from_rfc2822(i.pub_date().unwrap()).unwrap())
            .collect();
        assert!(dates.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn override_date_wins_in_ordering() {
        let ctx = make_context();
        let entries = vec![
            parse_entry("20250101-a", "# A\n% feed-entry: date: 2025-03-01\n", &ctx.entry_path)
                .unwrap(),
            parse_entry("20250201-b", "# B\n", &ctx.entry_path).unwrap(),
        ];
        let channel = build_channel(&ctx, &entries, now()).unwrap();
        assert_eq!(channel.items()[0].title(), Some("A"));
    }

    #[test]
    fn pretty_output_has_declaration_and_namespace() {
        let ctx = make_context();
        let entries = vec![parse_entry("20250106-release", "# R\n\nBody\n", "news/").unwrap()];
        let channel = build_channel(&ctx, &entries, now()).unwrap();
        let xml = to_xml(&channel).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<rss"));
        assert_eq!(xml.matches("<?xml").count(), 1);
        assert!(xml.contains("xmlns:atom=\"http://www.w3.org/2005/Atom\""));
        assert!(xml.contains("\n  <channel>"));
        assert_eq!(xml.matches("<item>").count(), 1);
    }
}
