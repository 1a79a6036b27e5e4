use std::marker::PhantomData;
use std::ptr;

use crate::abi::vtbl::IVectorViewVtbl;
use crate::abi::{Check, HRESULT, Interface, NativeHandle, hresult, take_out};

/// `IVectorView<T>` over object elements
pub struct VectorView<T: Interface> {
    handle: NativeHandle,
    _element: PhantomData<fn() -> T>,
}

impl<T: Interface> VectorView<T> {
    /// # Safety
    /// `handle` must be an `IVectorView<T>` pointer.
    pub(crate) unsafe fn from_handle(handle: NativeHandle) -> Self {
        Self {
            handle,
            _element: PhantomData,
        }
    }

    pub(crate) unsafe fn from_out(hr: HRESULT, out: *mut std::ffi::c_void) -> Result<Self, HRESULT> {
        hr.check()?;
        let handle = unsafe { NativeHandle::from_raw(out) }.ok_or(hresult::E_POINTER)?;
        Ok(unsafe { Self::from_handle(handle) })
    }

    fn vtable(&self) -> &IVectorViewVtbl {
        unsafe { self.handle.vtable() }
    }

    pub fn size(&self) -> Result<u32, HRESULT> {
        let mut size = 0;
        unsafe { (self.vtable().size)(self.handle.as_raw(), &mut size) }.check()?;
        Ok(size)
    }

    pub fn get_at(&self, index: u32) -> Result<T, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().get_at)(self.handle.as_raw(), index, &mut out) };
        unsafe { take_out(hr, out) }
    }

    /// Visit every element in order. Each element is released before the
    /// next one is fetched.
    pub fn try_for_each<E>(
        &self,
        mut f: impl FnMut(T) -> Result<(), E>,
        on_native: impl Fn(HRESULT) -> E,
    ) -> Result<(), E> {
        let size = self.size().map_err(&on_native)?;
        for index in 0..size {
            let element = self.get_at(index).map_err(&on_native)?;
            f(element)?;
        }
        Ok(())
    }
}
