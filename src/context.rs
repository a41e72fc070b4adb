use std::path::PathBuf;

pub(crate) const DEFAULT_BASE_URL: &str = "https://zeiss.github.io/zeiss-inspect-app-api/main/";
pub(crate) const DEFAULT_TITLE: &str = "App Python API News";
pub(crate) const DEFAULT_DESCRIPTION: &str = "Latest updates and news for App development";

#[derive(Debug)]
pub(crate) struct Context {
    pub news_dir: PathBuf,
    pub index_path: PathBuf,
    pub output_path: PathBuf,

    pub base_url: String,
    pub entry_path: String,
    pub feed_title: String,
    pub feed_description: String,
    pub language: String,

    pub digest: bool,
    pub handlebars: handlebars::Handlebars<'static>,
}

impl Context {
    pub fn new(
        news_dir: PathBuf,
        index_path: Option<PathBuf>,
        output_path: PathBuf,
        base_url: &str,
        handlebars: handlebars::Handlebars<'static>,
    ) -> Self {
        let index_path = index_path.unwrap_or_else(|| news_dir.join("index.md"));
        Self {
            news_dir,
            index_path,
            output_path,
            base_url: normalize_base_url(base_url),
            entry_path: "news/".to_string(),
            feed_title: DEFAULT_TITLE.to_string(),
            feed_description: DEFAULT_DESCRIPTION.to_string(),
            language: "en-us".to_string(),
            digest: true,
            handlebars,
        }
    }

    /// Path of the entry document for `id`.
    pub fn entry_file(&self, id: &str) -> PathBuf {
        self.news_dir.join(format!("{id}.md"))
    }
}

pub(crate) fn normalize_base_url(url: &str) -> String {
    let url = url.trim();
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}
