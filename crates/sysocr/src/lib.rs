//! Recognize text in images with the operating system's OCR engine.
//!
//! ```no_run
//! # async fn run() -> Result<(), sysocr::Error> {
//! let options = sysocr::Options::new(sysocr::Input::from_path("receipt.png")).with_languages(["en-US"]);
//! let output = sysocr::recognize(&options).await?;
//! for block in &output.blocks {
//!     println!("{} at {:?}", block.text, block.bounding_box);
//! }
//! # Ok(())
//! # }
//! ```

use sysocr_config::pipeline::PipelineConfig;

pub use sysocr_config::Config;
pub use sysocr_input::InputError;
pub use sysocr_types::{BoundingBox, Input, OcrOutput, Options, TextBlock};
pub use sysocr_winrt::{OcrError, Stage};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Recognition(#[from] OcrError),

    #[error("text recognition is not supported on this platform")]
    UnsupportedPlatform,

    #[error("recognition worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Recognize the text of `options.input`, configured from the environment
pub async fn recognize(options: &Options) -> Result<OcrOutput, Error> {
    recognize_with_config(options, &Config::new()).await
}

pub async fn recognize_with_config(options: &Options, config: &Config) -> Result<OcrOutput, Error> {
    let image = sysocr_input::resolve(&options.input, &config.input).await?;
    let languages = languages(options, config);
    let pipeline = config.pipeline.clone();

    tracing::debug!("recognizing {} bytes, language hints {:?}", image.len(), languages);
    // The native calls block and their handles must stay on one thread.
    tokio::task::spawn_blocking(move || recognize_bytes(&image, &languages, &pipeline)).await?
}

/// Request hints, or the configured defaults when the request has none
fn languages(options: &Options, config: &Config) -> Vec<String> {
    if options.languages.is_empty() {
        config.ocr.languages.clone()
    } else {
        options.languages.clone()
    }
}

/// Synchronous recognition of encoded image bytes on the calling thread
#[cfg(windows)]
pub fn recognize_bytes(image: &[u8], languages: &[String], config: &PipelineConfig) -> Result<OcrOutput, Error> {
    let runtime = sysocr_winrt::SystemRuntime;
    let output = sysocr_winrt::Pipeline::new(&runtime, config.clone()).recognize(image, languages)?;
    Ok(output)
}

#[cfg(not(windows))]
pub fn recognize_bytes(_image: &[u8], _languages: &[String], _config: &PipelineConfig) -> Result<OcrOutput, Error> {
    Err(Error::UnsupportedPlatform)
}
