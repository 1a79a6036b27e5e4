//! Turning an [`Input`] into encoded image bytes.

use std::path::{Path, PathBuf};

use sysocr_config::input::InputConfig;
use sysocr_types::Input;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("no input provided: set one of file path, URL or data")]
    NoInput,

    #[error("multiple inputs provided: set exactly one of file path, URL or data")]
    MultipleInputs,

    #[error("invalid URL scheme: {0} (only http and https are supported)")]
    InvalidUrlScheme(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch image: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("image download failed with HTTP status {0}")]
    HttpStatus(u16),
}

/// The one input field that is set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source<'a> {
    Path(&'a Path),
    Url(&'a str),
    Bytes(&'a [u8]),
}

/// Exactly one of path, URL and data must be present
pub fn source(input: &Input) -> Result<Source<'_>, InputError> {
    let mut sources = [
        input.file_path.as_deref().map(Source::Path),
        input.url.as_deref().map(Source::Url),
        input.data.as_deref().map(Source::Bytes),
    ]
    .into_iter()
    .flatten();

    match (sources.next(), sources.next()) {
        (None, _) => Err(InputError::NoInput),
        (Some(source), None) => Ok(source),
        (Some(_), Some(_)) => Err(InputError::MultipleInputs),
    }
}

/// Accept only `http://` and `https://` URLs
pub fn validate_url(url: &str) -> Result<(), InputError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(InputError::InvalidUrlScheme(url.to_string()))
    }
}

/// Load the image bytes `input` points at
pub async fn resolve(input: &Input, config: &InputConfig) -> Result<Vec<u8>, InputError> {
    match source(input)? {
        Source::Bytes(data) => Ok(data.to_vec()),
        Source::Path(path) => read_file(path).await,
        Source::Url(url) => {
            validate_url(url)?;
            fetch(url, config).await
        }
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, InputError> {
    let data = tokio::fs::read(path).await.map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

async fn fetch(url: &str, config: &InputConfig) -> Result<Vec<u8>, InputError> {
    let client = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .user_agent(config.user_agent.as_str())
        .build()?;

    tracing::debug!("fetching image from {}", url);
    let response = client.get(url).send().await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(InputError::HttpStatus(status.as_u16()));
    }

    let data = response.bytes().await?;
    tracing::debug!("downloaded {} bytes", data.len());
    Ok(data.to_vec())
}
