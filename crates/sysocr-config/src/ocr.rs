use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Language hints used when a request carries none. Empty means the
    /// user profile languages of the system.
    pub languages: Vec<String>,
}

impl OcrConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let languages = lookup("SYSOCR_LANGUAGES")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self { languages }
    }
}
