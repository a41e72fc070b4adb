use std::sync::LazyLock;

use anyhow::{anyhow, Context as _};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use regex::Regex;

use crate::{context::Context, directive::ENTRY_ID, metadata::Entry};

const NO_DESCRIPTION: &str = "No description available.";

/// Accumulation stops once the joined description reaches this many characters.
const SOFT_CAP: usize = 400;
/// Hard limit of the final description, ellipsis included.
const HARD_CAP: usize = 500;
const ELLIPSIS: &str = "...";

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[ \t]+(.+?)[ \t]*$").unwrap());

// The two annotation syntaxes are matched separately; older entries use the
// directive form.
static COMMENT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^%[ \t]*feed-entry:[ \t]*date:[ \t]*(.+?)[ \t]*\r?$").unwrap()
});
static DIRECTIVE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\.\.[ \t]+feed-entry::[ \t]*\r?\n(?:[ \t]*:[\w-]+:[^\n]*\n)*?[ \t]*:date:[ \t]*(.+?)[ \t]*\r?$",
    )
    .unwrap()
});

// Only `key: value` lines (and indented continuations) make a front matter
// block; a leading `---` rule followed by prose does not.
static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)\A---[ \t]*\r?\n[\w-]+[ \t]*:[^\n]*\n(?:(?:[\w-]+[ \t]*:|[ \t]+\S|[ \t]*\r?$)[^\n]*\n)*?---[ \t]*(?:\r?\n|\z)",
    )
    .unwrap()
});

static MARKUP: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"!?\[([^\]]*)\]\([^)]*\)", "$1"),
        (r"\{[\w:-]+\}`([^`]*)`", "$1"),
        (r"\*\*([^*]+)\*\*", "$1"),
        (r"__([^_]+)__", "$1"),
        (r"(^|[^\w])_([^_]+)_([^\w]|$)", "${1}${2}${3}"),
        (r"\*([^*]+)\*", "$1"),
        (r"`([^`]*)`", "$1"),
    ]
    .iter()
    .map(|(p, rep)| (Regex::new(p).unwrap(), *rep))
    .collect()
});

static STRAY_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*+\b|\b\*+").unwrap());

const DATE_FORMATS: [(&str, bool); 4] = [
    ("%Y-%m-%d %H:%M", true),
    ("%Y-%m-%d", false),
    ("%Y/%m/%d %H:%M", true),
    ("%Y/%m/%d", false),
];

/// Reads `<news_dir>/<id>.md` and parses it.
pub(crate) fn read_entry(ctx: &Context, id: &str) -> anyhow::Result<Entry> {
    let path = ctx.entry_file(id);
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("while reading {path:?}"))?;
    parse_entry(id, &content, &ctx.entry_path).with_context(|| format!("while parsing {path:?}"))
}

pub(crate) fn parse_entry(id: &str, content: &str, entry_path: &str) -> anyhow::Result<Entry> {
    let (filename_date, slug) = parse_identifier(id)?;
    let content = strip_front_matter(content);

    let date = override_date(content).unwrap_or(filename_date);
    let title = extract_title(content).unwrap_or_else(|| title_from_slug(slug));

    Ok(Entry {
        id: id.to_string(),
        title,
        description: extract_description(content),
        date,
        link: format!("{entry_path}{id}.html"),
        body: entry_body(content),
    })
}

/// Splits `YYYYMMDD-slug` into the date at midnight and the slug.
fn parse_identifier(id: &str) -> anyhow::Result<(NaiveDateTime, &str)> {
    let caps = ENTRY_ID
        .captures(id)
        .ok_or_else(|| anyhow!("Invalid entry identifier: {id}"))?;
    let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let date = NaiveDate::from_ymd_opt(field(1).parse()?, field(2).parse()?, field(3).parse()?)
        .ok_or_else(|| anyhow!("Invalid date in entry identifier: {id}"))?;
    let slug = caps.get(4).map_or("", |m| m.as_str());

    Ok((date.and_time(chrono::NaiveTime::MIN), slug))
}

fn override_date(content: &str) -> Option<NaiveDateTime> {
    let content = outside_code(content);
    for matcher in [&*COMMENT_DATE, &*DIRECTIVE_DATE] {
        let Some(value) = matcher.captures(&content).and_then(|c| c.get(1)) else {
            continue;
        };
        match parse_date_value(value.as_str()) {
            Some(date) => return Some(date),
            None => warn!("Ignoring unparsable feed-entry date: {:?}", value.as_str()),
        }
    }
    None
}

/// The document with fenced code blocks (fences included) removed.
fn outside_code(content: &str) -> String {
    let mut in_code = false;
    let mut lines = vec![];
    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            in_code = !in_code;
            continue;
        }
        if !in_code {
            lines.push(line);
        }
    }
    lines.join("\n")
}

fn parse_date_value(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATE_FORMATS.iter().find_map(|(format, with_time)| {
        if *with_time {
            NaiveDateTime::parse_from_str(value, format).ok()
        } else {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        }
    })
}

fn strip_front_matter(content: &str) -> &str {
    match FRONT_MATTER.find(content) {
        Some(m) => &content[m.end()..],
        None => content,
    }
}

fn extract_title(content: &str) -> Option<String> {
    let mut in_code = false;
    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            in_code = !in_code;
            continue;
        }
        if in_code {
            continue;
        }
        if let Some(caps) = TITLE.captures(line.trim_end()) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }
    }
    None
}

fn title_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn is_comment_annotation(trimmed: &str) -> bool {
    trimmed
        .strip_prefix('%')
        .is_some_and(|rest| rest.trim_start().starts_with("feed-entry:"))
}

fn is_directive_annotation(trimmed: &str) -> bool {
    trimmed
        .strip_prefix("..")
        .is_some_and(|rest| rest.trim_start().starts_with("feed-entry::"))
}

fn extract_description(content: &str) -> String {
    let mut parts: Vec<&str> = vec![];
    let mut length = 0;
    let mut soft_capped = false;
    let mut in_code = false;
    let mut in_annotation = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if in_annotation {
            if trimmed.starts_with(':') {
                continue;
            }
            in_annotation = false;
        }
        if trimmed.starts_with("```") {
            in_code = !in_code;
            continue;
        }
        if in_code {
            continue;
        }
        if is_directive_annotation(trimmed) {
            in_annotation = true;
            continue;
        }
        if trimmed.starts_with("##") || trimmed.starts_with("---") {
            if parts.is_empty() {
                continue;
            }
            debug!("description stops at {trimmed:?}");
            break;
        }
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with('%')
            || trimmed.starts_with(":::")
        {
            continue;
        }

        length += trimmed.chars().count() + usize::from(!parts.is_empty());
        parts.push(trimmed);
        if length >= SOFT_CAP {
            soft_capped = true;
            break;
        }
    }

    let text = strip_markup(&parts.join(" "));
    if text.is_empty() {
        return NO_DESCRIPTION.to_string();
    }
    truncate(&text, soft_capped)
}

/// Collapses links to their text and drops emphasis and code markers.
fn strip_markup(text: &str) -> String {
    let mut text = text.to_string();
    // nested emphasis only opens up after the inner markers are gone
    loop {
        let mut stripped = text.clone();
        for (pattern, replacement) in MARKUP.iter() {
            stripped = pattern.replace_all(&stripped, *replacement).into_owned();
        }
        if stripped == text {
            break;
        }
        text = stripped;
    }
    STRAY_EMPHASIS
        .replace_all(&text, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(text: &str, soft_capped: bool) -> String {
    let count = text.chars().count();
    if count <= HARD_CAP && !soft_capped {
        return text.to_string();
    }
    let keep = count.min(HARD_CAP - ELLIPSIS.len());
    let kept: String = text.chars().take(keep).collect();
    format!("{}{ELLIPSIS}", kept.trim_end())
}

/// The document as inlined into the digest: title heading and annotation removed.
fn entry_body(content: &str) -> String {
    let mut lines = vec![];
    let mut title_removed = false;
    let mut in_code = false;
    let mut in_annotation = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if in_annotation {
            if trimmed.starts_with(':') {
                continue;
            }
            in_annotation = false;
        }
        if trimmed.starts_with("```") {
            in_code = !in_code;
        } else if !in_code {
            if !title_removed && TITLE.is_match(line.trim_end()) {
                title_removed = true;
                continue;
            }
            if is_comment_annotation(trimmed) {
                continue;
            }
            if is_directive_annotation(trimmed) {
                in_annotation = true;
                continue;
            }
        }
        lines.push(line.trim_end_matches('\r'));
    }

    lines.join("\n").trim().to_string()
}
