//! Typed adapters over the native interfaces the pipeline needs.
//!
//! Each adapter owns its handle and exposes only the slots that are called.
//! Raw vtable access stays inside these modules.

macro_rules! native_interface {
    ($(#[$meta:meta])* $name:ident: $vtbl:ty = $iid:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        #[repr(transparent)]
        pub struct $name($crate::abi::NativeHandle);

        unsafe impl $crate::abi::Interface for $name {
            const IID: $crate::abi::GUID = $crate::abi::GUID::from_u128($iid);
            const NAME: &'static str = stringify!($name);
            type Vtable = $vtbl;

            unsafe fn from_handle(handle: $crate::abi::NativeHandle) -> Self {
                Self(handle)
            }

            fn handle(&self) -> &$crate::abi::NativeHandle {
                &self.0
            }
        }
    };
}

pub(crate) use native_interface;

pub mod collections;
pub mod globalization;
pub mod imaging;
pub mod ocr;
pub mod streams;

pub use collections::VectorView;
pub use globalization::{Language, LanguageFactory};
pub use imaging::{BitmapDecoderStatics, BitmapFrameWithSoftwareBitmap, SoftwareBitmap};
pub use ocr::{OcrEngine, OcrEngineStatics, OcrLine, OcrResult, OcrWord};
pub use streams::{DataWriter, DataWriterFactory, OutputStream, RandomAccessStream};
