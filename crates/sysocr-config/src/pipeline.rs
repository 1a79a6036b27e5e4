use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::parse_or;

fn default_stage_timeout() -> u64 {
    30
}

fn default_recognize_timeout() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    10
}

fn default_cancel_on_timeout() -> bool {
    true
}

/// Per-stage timeouts of the native recognition pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    #[serde(default = "default_stage_timeout")]
    pub store_timeout_secs: u64,
    #[serde(default = "default_stage_timeout")]
    pub flush_timeout_secs: u64,
    #[serde(default = "default_stage_timeout")]
    pub decode_timeout_secs: u64,
    #[serde(default = "default_stage_timeout")]
    pub bitmap_timeout_secs: u64,
    #[serde(default = "default_recognize_timeout")]
    pub recognize_timeout_secs: u64,
    /// How often a pending native operation is polled
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Ask the native operation to cancel when we stop waiting for it
    #[serde(default = "default_cancel_on_timeout")]
    pub cancel_on_timeout: bool,

    /// Sub-second overrides, only settable from code
    #[serde(skip)]
    overrides: Option<Timeouts>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timeouts {
    stage: Duration,
    recognize: Duration,
    poll_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store_timeout_secs: default_stage_timeout(),
            flush_timeout_secs: default_stage_timeout(),
            decode_timeout_secs: default_stage_timeout(),
            bitmap_timeout_secs: default_stage_timeout(),
            recognize_timeout_secs: default_recognize_timeout(),
            poll_interval_ms: default_poll_interval(),
            cancel_on_timeout: default_cancel_on_timeout(),
            overrides: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            store_timeout_secs: parse_or(&lookup, "SYSOCR_STORE_TIMEOUT_SECS", defaults.store_timeout_secs),
            flush_timeout_secs: parse_or(&lookup, "SYSOCR_FLUSH_TIMEOUT_SECS", defaults.flush_timeout_secs),
            decode_timeout_secs: parse_or(&lookup, "SYSOCR_DECODE_TIMEOUT_SECS", defaults.decode_timeout_secs),
            bitmap_timeout_secs: parse_or(&lookup, "SYSOCR_BITMAP_TIMEOUT_SECS", defaults.bitmap_timeout_secs),
            recognize_timeout_secs: parse_or(
                &lookup,
                "SYSOCR_RECOGNIZE_TIMEOUT_SECS",
                defaults.recognize_timeout_secs,
            ),
            poll_interval_ms: parse_or(&lookup, "SYSOCR_POLL_INTERVAL_MS", defaults.poll_interval_ms),
            cancel_on_timeout: parse_or(&lookup, "SYSOCR_CANCEL_ON_TIMEOUT", defaults.cancel_on_timeout),
            overrides: None,
        }
    }

    /// Same timeout for the four 30-second stages, a separate one for
    /// recognition. Used where seconds are too coarse.
    pub fn with_timeouts(stage: Duration, recognize: Duration, poll_interval: Duration) -> Self {
        Self {
            overrides: Some(Timeouts {
                stage,
                recognize,
                poll_interval,
            }),
            ..Self::default()
        }
    }

    pub fn store_timeout(&self) -> Duration {
        self.stage_timeout(self.store_timeout_secs)
    }

    pub fn flush_timeout(&self) -> Duration {
        self.stage_timeout(self.flush_timeout_secs)
    }

    pub fn decode_timeout(&self) -> Duration {
        self.stage_timeout(self.decode_timeout_secs)
    }

    pub fn bitmap_timeout(&self) -> Duration {
        self.stage_timeout(self.bitmap_timeout_secs)
    }

    pub fn recognize_timeout(&self) -> Duration {
        match self.overrides {
            Some(t) => t.recognize,
            None => Duration::from_secs(self.recognize_timeout_secs),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        match self.overrides {
            Some(t) => t.poll_interval,
            None => Duration::from_millis(self.poll_interval_ms),
        }
    }

    fn stage_timeout(&self, secs: u64) -> Duration {
        match self.overrides {
            Some(t) => t.stage,
            None => Duration::from_secs(secs),
        }
    }
}
