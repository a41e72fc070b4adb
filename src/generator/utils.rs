use std::{borrow::Borrow, cmp::Ordering, io::Write, path::Path, sync::LazyLock};

use log::debug;
use regex::Regex;
use tempfile::NamedTempFile;

use crate::metadata::Entry;

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n[ \t]*){2,}\r?\n").unwrap());

/// Newest first. `sort_by` is stable, so equal dates keep their listed order.
pub(super) fn sort_entry<T: Borrow<Entry>>(a: &T, b: &T) -> Ordering {
    b.borrow().date.cmp(&a.borrow().date)
}

/// `Release 1.0: Notes!` -> `release-10-notes`
pub(super) fn anchor(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .collect::<String>()
        .replace(' ', "-")
}

/// Two or more consecutive blank lines become one.
pub(super) fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUN.replace_all(text, "\n\n").into_owned()
}

/// Writes `contents` to a temporary file next to `path` and renames it over
/// `path`, so readers never see a partially written file.
pub(super) fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !dir.exists() {
        fs_extra::dir::create_all(dir, false)?;
    }

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    debug!("wrote {path:?}");

    Ok(())
}
