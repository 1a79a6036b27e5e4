pub mod types;

pub use types::{BoundingBox, Input, OcrOutput, Options, TextBlock};
