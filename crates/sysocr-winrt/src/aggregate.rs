//! Turning recognized lines into normalized text blocks.

use sysocr_types::{BoundingBox, OcrOutput, TextBlock};

/// Joins block texts in [`OcrOutput::text`]
pub const LINE_SEPARATOR: &str = "\n";

/// `Windows.Foundation.Rect`: device pixels, top-left origin
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Word {
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub words: Vec<Word>,
}

/// Lines and word geometry copied out of a native `OcrResult`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionTree {
    pub lines: Vec<Line>,
}

/// Corners of a union rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    fn of(rect: &Rect) -> Self {
        Self {
            min_x: rect.x,
            min_y: rect.y,
            max_x: rect.x + rect.width,
            max_y: rect.y + rect.height,
        }
    }

    fn extend(mut self, rect: &Rect) -> Self {
        let other = Bounds::of(rect);
        if other.min_x < self.min_x {
            self.min_x = other.min_x;
        }
        if other.min_y < self.min_y {
            self.min_y = other.min_y;
        }
        if other.max_x > self.max_x {
            self.max_x = other.max_x;
        }
        if other.max_y > self.max_y {
            self.max_y = other.max_y;
        }
        self
    }
}

/// Smallest rectangle containing every word, `None` for no words
pub fn union_bounds<'a>(words: impl IntoIterator<Item = &'a Word>) -> Option<Bounds> {
    let mut words = words.into_iter();
    let first = Bounds::of(&words.next()?.rect);
    Some(words.fold(first, |bounds, word| bounds.extend(&word.rect)))
}

/// Scale pixel bounds into `[0, 1]` image space
pub fn normalize(bounds: Bounds, image_width: u32, image_height: u32) -> BoundingBox {
    let width = f64::from(image_width);
    let height = f64::from(image_height);
    BoundingBox {
        x: f64::from(bounds.min_x) / width,
        y: f64::from(bounds.min_y) / height,
        width: f64::from(bounds.max_x - bounds.min_x) / width,
        height: f64::from(bounds.max_y - bounds.min_y) / height,
    }
}

/// One block per line that has at least one word, in line order
pub fn aggregate(tree: &RecognitionTree, image_width: u32, image_height: u32) -> OcrOutput {
    let blocks: Vec<TextBlock> = tree
        .lines
        .iter()
        .filter_map(|line| {
            let bounds = union_bounds(&line.words)?;
            Some(TextBlock {
                text: line.text.clone(),
                bounding_box: normalize(bounds, image_width, image_height),
            })
        })
        .collect();

    let text = blocks
        .iter()
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR);

    OcrOutput { blocks, text }
}
