use anyhow::{bail, Context as _};
use clap::{command, value_parser, Arg, ArgAction};
use context::{Context, DEFAULT_BASE_URL, DEFAULT_DESCRIPTION, DEFAULT_TITLE};
use generator::generate;
use renderer::generate_renderer;
use std::path::PathBuf;

mod context;
mod directive;
mod entry;
mod generator;
mod metadata;
mod renderer;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = command!()
        .args([
            Arg::new("news_dir")
                .help("Directory of news entries (YYYYMMDD-slug.md)")
                .value_parser(value_parser!(PathBuf))
                .default_value("news"),
            Arg::new("index")
                .long("index")
                .help("Index document holding the feed directive. Defaults to <news_dir>/index.md. It is rewritten in place.")
                .value_parser(value_parser!(PathBuf)),
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Path of the generated RSS document")
                .value_parser(value_parser!(PathBuf))
                .default_value("_build/index.rss"),
            Arg::new("base_url")
                .long("base-url")
                .help("Base URL of the published site. Falls back to NEWSFEED_BASE_URL."),
            Arg::new("entry_path")
                .long("entry-path")
                .help("Path of the entry pages relative to the base URL")
                .default_value("news/"),
            Arg::new("title")
                .long("title")
                .help("Channel title")
                .default_value(DEFAULT_TITLE),
            Arg::new("description")
                .long("description")
                .help("Channel description")
                .default_value(DEFAULT_DESCRIPTION),
            Arg::new("template")
                .long("template")
                .help("Handlebars template for one digest fragment")
                .value_parser(value_parser!(PathBuf)),
            Arg::new("no_digest")
                .long("no-digest")
                .help("Only write the RSS document; leave the index document untouched")
                .action(ArgAction::SetTrue),
        ])
        .get_matches();

    let news_dir = matches.get_one::<PathBuf>("news_dir").context("news_dir")?;
    if !news_dir.is_dir() {
        bail!("news_dir must be a directory.");
    }
    let output = matches.get_one::<PathBuf>("output").context("output")?;
    if output.is_dir() {
        bail!("output must be a file path.");
    }

    let base_url = matches
        .get_one::<String>("base_url")
        .cloned()
        .or_else(|| std::env::var("NEWSFEED_BASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let handlebars = generate_renderer(matches.get_one::<PathBuf>("template").map(|p| p.as_path()))?;

    let mut ctx = Context::new(
        news_dir.to_owned(),
        matches.get_one::<PathBuf>("index").cloned(),
        output.to_owned(),
        &base_url,
        handlebars,
    );
    if let Some(entry_path) = matches.get_one::<String>("entry_path") {
        ctx.entry_path = entry_path.to_owned();
    }
    if let Some(title) = matches.get_one::<String>("title") {
        ctx.feed_title = title.to_owned();
    }
    if let Some(description) = matches.get_one::<String>("description") {
        ctx.feed_description = description.to_owned();
    }
    ctx.digest = !matches.get_flag("no_digest");

    generate(&ctx)
}
