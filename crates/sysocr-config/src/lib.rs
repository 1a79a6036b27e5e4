use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use self::input::InputConfig;
pub use self::ocr::OcrConfig;
pub use self::pipeline::PipelineConfig;

pub mod input;
pub mod ocr;
pub mod pipeline;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub input: InputConfig,
    pub ocr: OcrConfig,
}

impl Config {
    /// Build the configuration from `SYSOCR_*` environment variables
    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Config {
            pipeline: PipelineConfig::from_lookup(&lookup),
            input: InputConfig::from_lookup(&lookup),
            ocr: OcrConfig::from_lookup(&lookup),
        }
    }
}

/// Parsed value of `key`, or `default` when unset or malformed
pub(crate) fn parse_or<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
