use serde::{Deserialize, Serialize};

/// Phrase pools and tone descriptors for one story genre.
///
/// `settings` and `conflicts` are noun phrases spliced into sentences
/// (`"a foggy harbor"`, `"missing evidence"`); `hooks` are complete opening
/// sentences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreProfile {
    pub tone: String,
    pub settings: Vec<String>,
    pub hooks: Vec<String>,
    pub conflicts: Vec<String>,
    pub style: String,
}

impl GenreProfile {
    /// Names and contents of the pools that must never be empty.
    pub fn pools(&self) -> [(&'static str, &[String]); 3] {
        [
            ("settings", self.settings.as_slice()),
            ("hooks", self.hooks.as_slice()),
            ("conflicts", self.conflicts.as_slice()),
        ]
    }
}
