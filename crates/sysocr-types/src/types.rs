use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Location of a text block, normalized to `[0, 1]` with a top-left origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A recognized line of text and where it sits in the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrOutput {
    pub blocks: Vec<TextBlock>,
    /// All block texts, one per line
    pub text: String,
}

/// Image source. Exactly one field must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Input {
    pub file_path: Option<PathBuf>,
    /// Remote image, `http://` or `https://` only
    pub url: Option<String>,
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
}

impl Input {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Options {
    pub input: Input,
    /// Language hints such as "ja" or "zh-Hans", tried in order
    #[serde(default)]
    pub languages: Vec<String>,
}

impl Options {
    pub fn new(input: Input) -> Self {
        Self {
            input,
            languages: Vec::new(),
        }
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }
}
