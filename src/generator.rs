use std::collections::{HashMap, HashSet};

use anyhow::Context as _;
use chrono::Utc;
use log::{info, warn};

use crate::{context::Context, directive::find_feed_directive, entry::read_entry, metadata::Entry};

mod data;
mod digest;
mod rss;
mod utils;

/// Parses every listed entry once, in first-listed order. Missing or
/// malformed entries are logged and skipped.
fn collect_entries(ctx: &Context, ids: &[String]) -> Vec<Entry> {
    let mut seen = HashSet::new();
    let mut entries = vec![];
    for id in ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        let path = ctx.entry_file(id);
        if !path.is_file() {
            warn!("Entry {id} listed in the feed directive but {path:?} does not exist. skipping...");
            continue;
        }
        match read_entry(ctx, id) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("Skipping {path:?}: {e:#}"),
        }
    }
    entries
}

pub(crate) fn generate(ctx: &Context) -> anyhow::Result<()> {
    if !ctx.index_path.is_file() {
        warn!(
            "Index document {:?} not found. Nothing to publish.",
            ctx.index_path
        );
        return Ok(());
    }
    let index = std::fs::read_to_string(&ctx.index_path)
        .with_context(|| format!("while reading {:?}", ctx.index_path))?;

    let Some(directive) = find_feed_directive(&index) else {
        warn!(
            "No feed directive found in {:?}. Nothing to publish.",
            ctx.index_path
        );
        return Ok(());
    };
    info!("Feed directive lists {} entries", directive.ids.len());

    let entries = collect_entries(ctx, &directive.ids);
    if entries.is_empty() {
        info!("No news items found");
        return Ok(());
    }
    info!("Parsed {} entries", entries.len());

    // validated before the index is consumed
    let channel = rss::build_channel(ctx, &entries, Utc::now())?;

    if ctx.digest {
        let by_id: HashMap<&str, &Entry> = entries.iter().map(|e| (e.id.as_str(), e)).collect();
        let listed: Vec<&Entry> = directive
            .ids
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .collect();
        let digest = digest::compose_digest(&ctx.handlebars, &index, &directive, &listed)?;
        utils::write_atomic(&ctx.index_path, &digest)
            .with_context(|| format!("while rewriting {:?}", ctx.index_path))?;
        info!(
            "Rewrote {:?} with {} digest fragments",
            ctx.index_path,
            listed.len()
        );
    }

    rss::write_rss(ctx, &channel)
}
