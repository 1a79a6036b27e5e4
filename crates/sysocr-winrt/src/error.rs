use std::fmt;
use std::time::Duration;

use crate::abi::HRESULT;

/// Pipeline stage, carried by errors so callers can tell where a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Stream,
    Write,
    Store,
    Flush,
    Seek,
    Decode,
    Bitmap,
    Dimensions,
    Engine,
    Recognize,
    Results,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Stream => "stream creation",
            Stage::Write => "byte write",
            Stage::Store => "store",
            Stage::Flush => "flush",
            Stage::Seek => "seek",
            Stage::Decode => "image decode",
            Stage::Bitmap => "bitmap snapshot",
            Stage::Dimensions => "image dimensions",
            Stage::Engine => "engine creation",
            Stage::Recognize => "recognition",
            Stage::Results => "result read",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("failed to initialize the Windows Runtime: {0}")]
    Init(HRESULT),

    #[error("image data is empty")]
    EmptyImage,

    #[error("failed to activate {class}: {code}")]
    Activation { class: &'static str, code: HRESULT },

    #[error("object does not implement {interface}: {code}")]
    Interface { interface: &'static str, code: HRESULT },

    #[error("native call failed during {stage}: {code}")]
    Native { stage: Stage, code: HRESULT },

    #[error("no OCR engine available: no supported recognizer language")]
    EngineUnavailable,

    #[error("image data could not be decoded: {0}")]
    DecodeFailed(HRESULT),

    #[error("invalid image dimensions {width}x{height}")]
    InvalidImageDimensions { width: i32, height: i32 },

    #[error("store operation timed out after {0:?}")]
    StoreTimeout(Duration),

    #[error("flush operation timed out after {0:?}")]
    FlushTimeout(Duration),

    #[error("bitmap decoder creation timed out after {0:?}")]
    DecodeTimeout(Duration),

    #[error("software bitmap retrieval timed out after {0:?}")]
    BitmapTimeout(Duration),

    #[error("text recognition timed out after {0:?}")]
    RecognitionTimeout(Duration),

    #[error("text recognition failed: {0}")]
    RecognitionFailed(HRESULT),

    #[error("{stage} failed: {code}")]
    StageFailed { stage: Stage, code: HRESULT },

    #[error("{0} was canceled")]
    Canceled(Stage),
}

impl OcrError {
    /// The stage a run stopped at, when the failure belongs to one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            OcrError::Init(_) | OcrError::EmptyImage => None,
            OcrError::Activation { .. } | OcrError::Interface { .. } => None,
            OcrError::Native { stage, .. } | OcrError::StageFailed { stage, .. } => Some(*stage),
            OcrError::Canceled(stage) => Some(*stage),
            OcrError::EngineUnavailable => Some(Stage::Engine),
            OcrError::DecodeFailed(_) | OcrError::DecodeTimeout(_) => Some(Stage::Decode),
            OcrError::InvalidImageDimensions { .. } => Some(Stage::Dimensions),
            OcrError::StoreTimeout(_) => Some(Stage::Store),
            OcrError::FlushTimeout(_) => Some(Stage::Flush),
            OcrError::BitmapTimeout(_) => Some(Stage::Bitmap),
            OcrError::RecognitionTimeout(_) | OcrError::RecognitionFailed(_) => Some(Stage::Recognize),
        }
    }

    pub(crate) fn native(stage: Stage) -> impl Fn(HRESULT) -> OcrError {
        move |code| OcrError::Native { stage, code }
    }
}
