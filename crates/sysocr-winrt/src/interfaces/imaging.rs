use std::ptr;

use super::streams::RandomAccessStream;
use crate::abi::vtbl::{IBitmapDecoderStaticsVtbl, IBitmapFrameWithSoftwareBitmapVtbl, ISoftwareBitmapVtbl};
use crate::abi::{Check, HRESULT, Interface, NativeHandle};
use crate::async_op::AsyncOperation;

pub const BITMAP_DECODER: &str = "Windows.Graphics.Imaging.BitmapDecoder";

native_interface! {
    BitmapDecoderStatics: IBitmapDecoderStaticsVtbl = 0x438ccb26_bcef_4e95_bad6_23a822e58d01
}

impl BitmapDecoderStatics {
    /// Start decoding `stream`. The container format is detected from the
    /// bytes; the operation completes with a `BitmapDecoder`.
    pub fn create_async(&self, stream: &RandomAccessStream) -> Result<AsyncOperation<NativeHandle>, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().create_async)(self.as_raw(), stream.as_raw(), &mut out) };
        unsafe { AsyncOperation::from_out(hr, out) }
    }
}

native_interface! {
    BitmapFrameWithSoftwareBitmap: IBitmapFrameWithSoftwareBitmapVtbl = 0xfe287c9a_420c_4963_87ad_691436e08383
}

impl BitmapFrameWithSoftwareBitmap {
    /// Completes with a `SoftwareBitmap`
    pub fn software_bitmap_async(&self) -> Result<AsyncOperation<NativeHandle>, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().get_software_bitmap_async)(self.as_raw(), &mut out) };
        unsafe { AsyncOperation::from_out(hr, out) }
    }
}

native_interface! {
    SoftwareBitmap: ISoftwareBitmapVtbl = 0x689e0708_7eef_483f_963f_da938818e073
}

impl SoftwareBitmap {
    pub fn pixel_width(&self) -> Result<i32, HRESULT> {
        let mut width = 0;
        unsafe { (self.vtable().pixel_width)(self.as_raw(), &mut width) }.check()?;
        Ok(width)
    }

    pub fn pixel_height(&self) -> Result<i32, HRESULT> {
        let mut height = 0;
        unsafe { (self.vtable().pixel_height)(self.as_raw(), &mut height) }.check()?;
        Ok(height)
    }
}
