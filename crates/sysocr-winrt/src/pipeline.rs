//! The native call chain from encoded image bytes to [`OcrOutput`].
//!
//! Each stage either hands its handles to the next one or returns early,
//! in which case everything acquired so far is released on scope exit.
//! Handles whose last use is behind us are dropped explicitly so the native
//! side can free them as the run progresses.

use std::time::Duration;

use sysocr_config::PipelineConfig;
use sysocr_types::OcrOutput;

use crate::abi::{HRESULT, HString, Interface};
use crate::activation::{Activator, cast};
use crate::aggregate::{self, Line, RecognitionTree, Word};
use crate::async_op::{AsyncOperation, AsyncResult, AwaitError, PollingWaiter, Waiter};
use crate::error::{OcrError, Stage};
use crate::interfaces::globalization::LANGUAGE;
use crate::interfaces::imaging::BITMAP_DECODER;
use crate::interfaces::ocr::OCR_ENGINE;
use crate::interfaces::streams::{DATA_WRITER, IN_MEMORY_RANDOM_ACCESS_STREAM};
use crate::interfaces::{
    BitmapDecoderStatics, BitmapFrameWithSoftwareBitmap, DataWriterFactory, LanguageFactory, OcrEngine,
    OcrEngineStatics, OcrResult, OutputStream, RandomAccessStream, SoftwareBitmap,
};
use crate::runtime::Runtime;

/// The stages that wait on a native async operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    Store,
    Flush,
    Decode,
    Bitmap,
    Recognize,
}

impl Wait {
    fn stage(self) -> Stage {
        match self {
            Wait::Store => Stage::Store,
            Wait::Flush => Stage::Flush,
            Wait::Decode => Stage::Decode,
            Wait::Bitmap => Stage::Bitmap,
            Wait::Recognize => Stage::Recognize,
        }
    }

    fn timeout(self, config: &PipelineConfig) -> Duration {
        match self {
            Wait::Store => config.store_timeout(),
            Wait::Flush => config.flush_timeout(),
            Wait::Decode => config.decode_timeout(),
            Wait::Bitmap => config.bitmap_timeout(),
            Wait::Recognize => config.recognize_timeout(),
        }
    }

    /// The operation finished in the `Error` state, or its results could
    /// not be read
    fn failed(self, code: HRESULT) -> OcrError {
        match self {
            Wait::Decode => OcrError::DecodeFailed(code),
            Wait::Recognize => OcrError::RecognitionFailed(code),
            other => OcrError::StageFailed {
                stage: other.stage(),
                code,
            },
        }
    }

    fn error(self, err: AwaitError) -> OcrError {
        match err {
            AwaitError::Failed(code) => self.failed(code),
            AwaitError::Canceled => OcrError::Canceled(self.stage()),
            AwaitError::Status(code) => OcrError::Native {
                stage: self.stage(),
                code,
            },
            AwaitError::TimedOut(after) => match self {
                Wait::Store => OcrError::StoreTimeout(after),
                Wait::Flush => OcrError::FlushTimeout(after),
                Wait::Decode => OcrError::DecodeTimeout(after),
                Wait::Bitmap => OcrError::BitmapTimeout(after),
                Wait::Recognize => OcrError::RecognitionTimeout(after),
            },
        }
    }
}

/// Runs text recognition through a [`Runtime`].
///
/// A pipeline holds no native state between calls; every
/// [`recognize`](Pipeline::recognize) acquires and releases its own objects.
pub struct Pipeline<'r> {
    activator: Activator<'r>,
    config: PipelineConfig,
    waiter: Box<dyn Waiter + 'r>,
}

impl<'r> Pipeline<'r> {
    pub fn new(runtime: &'r dyn Runtime, config: PipelineConfig) -> Self {
        let waiter = PollingWaiter::new(config.poll_interval()).cancel_on_timeout(config.cancel_on_timeout);
        Self {
            activator: Activator::new(runtime),
            config,
            waiter: Box::new(waiter),
        }
    }

    /// Replace the polling strategy
    pub fn with_waiter(mut self, waiter: impl Waiter + 'r) -> Self {
        self.waiter = Box::new(waiter);
        self
    }

    fn runtime(&self) -> &'r dyn Runtime {
        self.activator.runtime()
    }

    /// Recognize the text in an encoded image (PNG, JPEG, BMP, ...).
    ///
    /// `languages` are BCP-47 hints tried in order; when none of them has an
    /// installed recognizer the user profile languages are used.
    pub fn recognize(&self, image: &[u8], languages: &[String]) -> Result<OcrOutput, OcrError> {
        self.runtime().initialize().map_err(OcrError::Init)?;
        if image.is_empty() {
            return Err(OcrError::EmptyImage);
        }

        let stream = self.load_stream(image)?;
        let bitmap = self.decode(stream)?;

        let width = bitmap.pixel_width().map_err(OcrError::native(Stage::Dimensions))?;
        let height = bitmap.pixel_height().map_err(OcrError::native(Stage::Dimensions))?;
        if width <= 0 || height <= 0 {
            return Err(OcrError::InvalidImageDimensions { width, height });
        }
        tracing::debug!("decoded image: {}x{}", width, height);

        let engine = self.engine(languages)?;
        self.log_recognizer_language(&engine);

        let op = engine
            .recognize_async(&bitmap)
            .map_err(OcrError::native(Stage::Recognize))?;
        let handle = self.complete(op, Wait::Recognize)?;
        drop(bitmap);
        drop(engine);

        let result = cast::<OcrResult>(&handle)?;
        drop(handle);
        let tree = read_tree(self.runtime(), &result).map_err(OcrError::native(Stage::Results))?;
        drop(result);

        let output = aggregate::aggregate(&tree, width as u32, height as u32);
        tracing::debug!(
            "recognized {} lines, kept {} blocks",
            tree.lines.len(),
            output.blocks.len()
        );
        Ok(output)
    }

    /// Wait for `op` and read its result, classifying failures by stage
    fn complete<T: AsyncResult>(&self, op: AsyncOperation<T>, wait: Wait) -> Result<T, OcrError> {
        op.wait(self.waiter.as_ref(), wait.timeout(&self.config))
            .map_err(|err| wait.error(err))?
            .get_results()
            .map_err(|code| wait.failed(code))
    }

    /// A random-access stream holding `image`, positioned at its start
    fn load_stream(&self, image: &[u8]) -> Result<RandomAccessStream, OcrError> {
        let stream = self
            .activator
            .instance::<RandomAccessStream>(IN_MEMORY_RANDOM_ACCESS_STREAM)?;
        let output = cast::<OutputStream>(stream.handle())?;

        let factory = self.activator.factory::<DataWriterFactory>(DATA_WRITER)?;
        let writer = factory
            .create_data_writer(&output)
            .map_err(OcrError::native(Stage::Stream))?;
        drop(factory);
        drop(output);

        writer.write_bytes(image).map_err(OcrError::native(Stage::Write))?;
        tracing::debug!("wrote {} image bytes", image.len());

        let op = writer.store_async().map_err(OcrError::native(Stage::Store))?;
        let stored = self.complete(op, Wait::Store)?;
        tracing::debug!("stored {} bytes", stored);

        let op = writer.flush_async().map_err(OcrError::native(Stage::Flush))?;
        self.complete(op, Wait::Flush)?;

        // Keeps the stream usable once the writer is gone.
        let detached = writer.detach_stream().map_err(OcrError::native(Stage::Write))?;
        drop(detached);
        drop(writer);

        stream.seek(0).map_err(OcrError::native(Stage::Seek))?;
        Ok(stream)
    }

    /// Decode the stream and take a pixel-buffer snapshot of its first frame
    fn decode(&self, stream: RandomAccessStream) -> Result<SoftwareBitmap, OcrError> {
        let statics = self.activator.factory::<BitmapDecoderStatics>(BITMAP_DECODER)?;
        let op = statics.create_async(&stream).map_err(OcrError::DecodeFailed)?;
        drop(statics);
        let decoder = self.complete(op, Wait::Decode)?;
        drop(stream);

        let frame = cast::<BitmapFrameWithSoftwareBitmap>(&decoder)?;
        drop(decoder);
        let op = frame
            .software_bitmap_async()
            .map_err(OcrError::native(Stage::Bitmap))?;
        let handle = self.complete(op, Wait::Bitmap)?;
        drop(frame);

        cast::<SoftwareBitmap>(&handle)
    }

    fn engine(&self, languages: &[String]) -> Result<OcrEngine, OcrError> {
        let statics = self.activator.factory::<OcrEngineStatics>(OCR_ENGINE)?;

        if !languages.is_empty() {
            let factory = self.activator.factory::<LanguageFactory>(LANGUAGE)?;
            for tag in languages {
                match self.engine_for(&statics, &factory, tag) {
                    Ok(Some(engine)) => return Ok(engine),
                    Ok(None) => tracing::warn!("no recognizer installed for language {:?}, skipping", tag),
                    Err(code) => tracing::warn!("ignoring language hint {:?}: {}", tag, code),
                }
            }
        }

        statics
            .try_create_from_user_profile_languages()
            .map_err(OcrError::native(Stage::Engine))?
            .ok_or(OcrError::EngineUnavailable)
    }

    fn engine_for(
        &self,
        statics: &OcrEngineStatics,
        factory: &LanguageFactory,
        tag: &str,
    ) -> Result<Option<OcrEngine>, HRESULT> {
        let name = HString::new(self.runtime(), tag)?;
        let language = factory.create_language(&name)?;
        statics.try_create_from_language(&language)
    }

    fn log_recognizer_language(&self, engine: &OcrEngine) {
        let tag = engine
            .recognizer_language()
            .and_then(|language| language.language_tag(self.runtime()));
        match tag {
            Ok(tag) => tracing::debug!("recognizer language: {}", tag),
            Err(code) => tracing::debug!("could not read recognizer language: {}", code),
        }
    }
}

/// Copy lines and word rectangles out of a native result. Each native line
/// and word is released as soon as it has been read.
fn read_tree(runtime: &dyn Runtime, result: &OcrResult) -> Result<RecognitionTree, HRESULT> {
    let lines = result.lines()?;
    let mut tree = RecognitionTree::default();

    lines.try_for_each(
        |line| -> Result<(), HRESULT> {
            let text = line.text(runtime)?;
            let mut words = Vec::new();
            line.words()?.try_for_each(
                |word| -> Result<(), HRESULT> {
                    words.push(Word {
                        rect: word.bounding_rect()?,
                    });
                    Ok(())
                },
                |code| code,
            )?;
            tree.lines.push(Line { text, words });
            Ok(())
        },
        |code| code,
    )?;

    Ok(tree)
}
