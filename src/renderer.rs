use std::path::Path;

use anyhow::Context;
use handlebars::Handlebars;

pub(crate) const FRAGMENT_TEMPLATE: &str = "fragment";

const DEFAULT_FRAGMENT: &str = concat!(
    "## [{{title}}]({{href}})\n",
    "\n",
    "*Published on {{published}}*\n",
    "\n",
    "{{body}}\n",
);

/// Registry holding the `fragment` template, either the built-in one or the
/// file given on the command line.
pub(super) fn generate_renderer(template: Option<&Path>) -> anyhow::Result<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();
    // the digest is markdown, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    match template {
        Some(path) => handlebars
            .register_template_file(FRAGMENT_TEMPLATE, path)
            .with_context(|| format!("{path:?}"))?,
        None => handlebars.register_template_string(FRAGMENT_TEMPLATE, DEFAULT_FRAGMENT)?,
    }

    Ok(handlebars)
}
