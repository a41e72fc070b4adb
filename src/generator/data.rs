use serde::Serialize;

use crate::metadata::Entry;

#[derive(Serialize, Debug)]
pub(super) struct FragmentData<'a> {
    #[serde(flatten)]
    pub entry: &'a Entry,
    /// `<id>.html#<anchor>`
    pub href: String,
    /// `YYYY-MM-DD HH:MM`
    pub published: String,
}
