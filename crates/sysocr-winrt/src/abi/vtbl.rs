//! Vtable layouts of the native interfaces the pipeline calls.
//!
//! Fields follow the declared slot order exactly. Slots this crate never
//! calls are `usize` placeholders so the offsets of the used ones stay right.

use std::ffi::c_void;

use super::{GUID, HRESULT, RawHString, RawPtr};
use crate::aggregate::Rect;

pub const IID_IUNKNOWN: GUID = GUID::from_u128(0x00000000_0000_0000_c000_000000000046);

pub type QueryInterfaceFn = unsafe extern "system" fn(this: RawPtr, iid: *const GUID, out: *mut RawPtr) -> HRESULT;
pub type RefCountFn = unsafe extern "system" fn(this: RawPtr) -> u32;
pub type MethodFn = unsafe extern "system" fn(this: RawPtr) -> HRESULT;
pub type GetObjectFn = unsafe extern "system" fn(this: RawPtr, out: *mut RawPtr) -> HRESULT;
pub type GetStringFn = unsafe extern "system" fn(this: RawPtr, out: *mut RawHString) -> HRESULT;
pub type GetU32Fn = unsafe extern "system" fn(this: RawPtr, out: *mut u32) -> HRESULT;
pub type GetI32Fn = unsafe extern "system" fn(this: RawPtr, out: *mut i32) -> HRESULT;
pub type WithObjectFn = unsafe extern "system" fn(this: RawPtr, arg: RawPtr, out: *mut RawPtr) -> HRESULT;

#[repr(C)]
pub struct IUnknownVtbl {
    pub query_interface: QueryInterfaceFn,
    pub add_ref: RefCountFn,
    pub release: RefCountFn,
}

#[repr(C)]
pub struct IInspectableVtbl {
    pub base: IUnknownVtbl,
    pub get_iids: usize,
    pub get_runtime_class_name: usize,
    pub get_trust_level: usize,
}

/// Windows.Foundation.IActivationFactory
#[repr(C)]
pub struct IActivationFactoryVtbl {
    pub base: IInspectableVtbl,
    pub activate_instance: GetObjectFn,
}

/// Windows.Foundation.IAsyncInfo
#[repr(C)]
pub struct IAsyncInfoVtbl {
    pub base: IInspectableVtbl,
    pub id: usize,
    pub status: GetI32Fn,
    pub error_code: unsafe extern "system" fn(this: RawPtr, out: *mut HRESULT) -> HRESULT,
    pub cancel: MethodFn,
    pub close: MethodFn,
}

/// Windows.Foundation.IAsyncOperation<T>, shared by every `T`.
/// `get_results` writes a `T` in its ABI form.
#[repr(C)]
pub struct IAsyncOperationVtbl {
    pub base: IInspectableVtbl,
    pub put_completed: usize,
    pub get_completed: usize,
    pub get_results: unsafe extern "system" fn(this: RawPtr, out: *mut c_void) -> HRESULT,
}

/// Windows.Foundation.Collections.IVectorView<T> for object `T`
#[repr(C)]
pub struct IVectorViewVtbl {
    pub base: IInspectableVtbl,
    pub get_at: unsafe extern "system" fn(this: RawPtr, index: u32, out: *mut RawPtr) -> HRESULT,
    pub size: GetU32Fn,
    pub index_of: usize,
    pub get_many: usize,
}

/// Windows.Storage.Streams.IRandomAccessStream
#[repr(C)]
pub struct IRandomAccessStreamVtbl {
    pub base: IInspectableVtbl,
    pub size: usize,
    pub put_size: usize,
    pub get_input_stream_at: usize,
    pub get_output_stream_at: usize,
    pub position: unsafe extern "system" fn(this: RawPtr, out: *mut u64) -> HRESULT,
    pub seek: unsafe extern "system" fn(this: RawPtr, position: u64) -> HRESULT,
    pub clone_stream: usize,
    pub can_read: usize,
    pub can_write: usize,
}

/// Windows.Storage.Streams.IOutputStream
#[repr(C)]
pub struct IOutputStreamVtbl {
    pub base: IInspectableVtbl,
    pub write_async: usize,
    pub flush_async: usize,
}

/// Windows.Storage.Streams.IDataWriterFactory
#[repr(C)]
pub struct IDataWriterFactoryVtbl {
    pub base: IInspectableVtbl,
    pub create_data_writer: WithObjectFn,
}

/// Windows.Storage.Streams.IDataWriter
#[repr(C)]
pub struct IDataWriterVtbl {
    pub base: IInspectableVtbl,
    pub unstored_buffer_length: usize,
    pub unicode_encoding: usize,
    pub put_unicode_encoding: usize,
    pub byte_order: usize,
    pub put_byte_order: usize,
    pub write_byte: usize,
    pub write_bytes: unsafe extern "system" fn(this: RawPtr, len: u32, data: *const u8) -> HRESULT,
    /// WriteBuffer through MeasureString
    pub write_other: [usize; 16],
    pub store_async: GetObjectFn,
    pub flush_async: GetObjectFn,
    pub detach_buffer: usize,
    pub detach_stream: GetObjectFn,
}

/// Windows.Graphics.Imaging.IBitmapDecoderStatics
#[repr(C)]
pub struct IBitmapDecoderStaticsVtbl {
    pub base: IInspectableVtbl,
    /// Bmp, Jpeg, Png, Tiff, Gif, JpegXR and Ico decoder ids
    pub decoder_ids: [usize; 7],
    pub get_decoder_information_enumerator: usize,
    pub create_async: WithObjectFn,
    pub create_with_id_async: usize,
}

/// Windows.Graphics.Imaging.IBitmapFrameWithSoftwareBitmap
#[repr(C)]
pub struct IBitmapFrameWithSoftwareBitmapVtbl {
    pub base: IInspectableVtbl,
    pub get_software_bitmap_async: GetObjectFn,
    pub get_software_bitmap_converted_async: usize,
    pub get_software_bitmap_transformed_async: usize,
}

/// Windows.Graphics.Imaging.ISoftwareBitmap
#[repr(C)]
pub struct ISoftwareBitmapVtbl {
    pub base: IInspectableVtbl,
    pub bitmap_pixel_format: usize,
    pub bitmap_alpha_mode: usize,
    pub pixel_width: GetI32Fn,
    pub pixel_height: GetI32Fn,
    /// IsReadOnly through GetReadOnlyView
    pub other: [usize; 10],
}

/// Windows.Media.Ocr.IOcrEngineStatics
#[repr(C)]
pub struct IOcrEngineStaticsVtbl {
    pub base: IInspectableVtbl,
    pub max_image_dimension: usize,
    pub available_recognizer_languages: usize,
    pub is_language_supported: usize,
    pub try_create_from_language: WithObjectFn,
    pub try_create_from_user_profile_languages: GetObjectFn,
}

/// Windows.Media.Ocr.IOcrEngine
#[repr(C)]
pub struct IOcrEngineVtbl {
    pub base: IInspectableVtbl,
    pub recognize_async: WithObjectFn,
    pub recognizer_language: GetObjectFn,
}

/// Windows.Media.Ocr.IOcrResult
#[repr(C)]
pub struct IOcrResultVtbl {
    pub base: IInspectableVtbl,
    pub lines: GetObjectFn,
    pub text_angle: usize,
    pub text: usize,
}

/// Windows.Media.Ocr.IOcrLine
#[repr(C)]
pub struct IOcrLineVtbl {
    pub base: IInspectableVtbl,
    pub words: GetObjectFn,
    pub text: GetStringFn,
}

/// Windows.Media.Ocr.IOcrWord
#[repr(C)]
pub struct IOcrWordVtbl {
    pub base: IInspectableVtbl,
    pub bounding_rect: unsafe extern "system" fn(this: RawPtr, out: *mut Rect) -> HRESULT,
    pub text: usize,
}

/// Windows.Globalization.ILanguageFactory
#[repr(C)]
pub struct ILanguageFactoryVtbl {
    pub base: IInspectableVtbl,
    pub create_language: unsafe extern "system" fn(this: RawPtr, tag: RawHString, out: *mut RawPtr) -> HRESULT,
}

/// Windows.Globalization.ILanguage
#[repr(C)]
pub struct ILanguageVtbl {
    pub base: IInspectableVtbl,
    pub language_tag: GetStringFn,
    pub display_name: usize,
    pub native_name: usize,
    pub script: usize,
}
