use std::ptr;

use super::collections::VectorView;
use super::globalization::Language;
use super::imaging::SoftwareBitmap;
use crate::abi::vtbl::{IOcrEngineStaticsVtbl, IOcrEngineVtbl, IOcrLineVtbl, IOcrResultVtbl, IOcrWordVtbl};
use crate::abi::{Check, HRESULT, Interface, NativeHandle, read_string, take_optional, take_out};
use crate::aggregate::Rect;
use crate::async_op::AsyncOperation;
use crate::runtime::Runtime;

pub const OCR_ENGINE: &str = "Windows.Media.Ocr.OcrEngine";

native_interface! {
    OcrEngineStatics: IOcrEngineStaticsVtbl = 0x5bffa85a_3384_3540_9940_699120d428a8
}

impl OcrEngineStatics {
    /// `None` when no recognizer is installed for `language`
    pub fn try_create_from_language(&self, language: &Language) -> Result<Option<OcrEngine>, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().try_create_from_language)(self.as_raw(), language.as_raw(), &mut out) };
        unsafe { take_optional(hr, out) }
    }

    /// `None` when none of the user profile languages is supported
    pub fn try_create_from_user_profile_languages(&self) -> Result<Option<OcrEngine>, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().try_create_from_user_profile_languages)(self.as_raw(), &mut out) };
        unsafe { take_optional(hr, out) }
    }
}

native_interface! {
    OcrEngine: IOcrEngineVtbl = 0x5a14bc41_5b76_3140_b680_8825562683ac
}

impl OcrEngine {
    /// Completes with an `OcrResult`
    pub fn recognize_async(&self, bitmap: &SoftwareBitmap) -> Result<AsyncOperation<NativeHandle>, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().recognize_async)(self.as_raw(), bitmap.as_raw(), &mut out) };
        unsafe { AsyncOperation::from_out(hr, out) }
    }

    pub fn recognizer_language(&self) -> Result<Language, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().recognizer_language)(self.as_raw(), &mut out) };
        unsafe { take_out(hr, out) }
    }
}

native_interface! {
    OcrResult: IOcrResultVtbl = 0x9bd235b2_175b_3d6a_92e2_388c206e2f63
}

impl OcrResult {
    pub fn lines(&self) -> Result<VectorView<OcrLine>, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().lines)(self.as_raw(), &mut out) };
        unsafe { VectorView::from_out(hr, out) }
    }
}

native_interface! {
    OcrLine: IOcrLineVtbl = 0x0043a16f_e31f_3a24_899c_d444bd088124
}

impl OcrLine {
    pub fn words(&self) -> Result<VectorView<OcrWord>, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().words)(self.as_raw(), &mut out) };
        unsafe { VectorView::from_out(hr, out) }
    }

    pub fn text(&self, runtime: &dyn Runtime) -> Result<String, HRESULT> {
        read_string(runtime, self.vtable().text, self.as_raw())
    }
}

native_interface! {
    OcrWord: IOcrWordVtbl = 0x3c2a477a_5cd9_3525_ba2a_23d1e0a68a1d
}

impl OcrWord {
    pub fn bounding_rect(&self) -> Result<Rect, HRESULT> {
        let mut rect = Rect::default();
        unsafe { (self.vtable().bounding_rect)(self.as_raw(), &mut rect) }.check()?;
        Ok(rect)
    }
}
