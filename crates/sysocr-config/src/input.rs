use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::parse_or;

fn default_http_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("sysocr/", env!("CARGO_PKG_VERSION")).to_string()
}

/// HTTP client settings used when the input is a URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl InputConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            http_timeout_secs: parse_or(&lookup, "SYSOCR_HTTP_TIMEOUT_SECS", default_http_timeout()),
            user_agent: lookup("SYSOCR_USER_AGENT").unwrap_or_else(default_user_agent),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
