/// A parsed news entry. Built once per run from `<id>.md` and never mutated.
#[derive(serde::Serialize, Debug, Clone)]
pub(crate) struct Entry {
    /// Entry identifier, also the file stem.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Effective date: the override annotation if present, else the filename date.
    pub date: chrono::NaiveDateTime,
    pub link: String,
    /// Document body without the title heading and the date annotation.
    pub body: String,
}
