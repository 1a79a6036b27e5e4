use std::cell::Cell;
use std::ffi::c_void;
use std::ptr;

use windows::Win32::System::WinRT::{RO_INIT_MULTITHREADED, RoInitialize};

use super::Runtime;
use crate::abi::{Check, GUID, HRESULT, RawHString, RawPtr, hresult};

windows_link::link!("combase.dll" "system" fn RoGetActivationFactory(activatableclassid: *mut c_void, iid: *const GUID, factory: *mut *mut c_void) -> HRESULT);
windows_link::link!("combase.dll" "system" fn WindowsCreateString(sourcestring: *const u16, length: u32, string: *mut *mut c_void) -> HRESULT);
windows_link::link!("combase.dll" "system" fn WindowsDeleteString(string: *mut c_void) -> HRESULT);
windows_link::link!("combase.dll" "system" fn WindowsGetStringRawBuffer(string: *mut c_void, length: *mut u32) -> *const u16);

thread_local! {
    static INITIALIZED: Cell<bool> = const { Cell::new(false) };
}

/// The Windows Runtime of the current process
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRuntime;

impl Runtime for SystemRuntime {
    /// Join the multithreaded apartment once per thread. The apartment is
    /// left joined for the thread's lifetime.
    fn initialize(&self) -> Result<(), HRESULT> {
        if INITIALIZED.with(Cell::get) {
            return Ok(());
        }

        match unsafe { RoInitialize(RO_INIT_MULTITHREADED) } {
            Ok(()) => {}
            Err(e) if e.code() == hresult::RPC_E_CHANGED_MODE => {
                tracing::debug!("thread already belongs to another apartment, reusing it");
            }
            Err(e) => return Err(e.code()),
        }

        INITIALIZED.with(|flag| flag.set(true));
        Ok(())
    }

    fn create_string(&self, utf16: &[u16]) -> Result<RawHString, HRESULT> {
        if utf16.is_empty() {
            return Ok(ptr::null_mut());
        }
        let len = u32::try_from(utf16.len()).map_err(|_| hresult::E_INVALIDARG)?;
        let mut out = ptr::null_mut();
        unsafe { WindowsCreateString(utf16.as_ptr(), len, &mut out) }.check()?;
        Ok(out)
    }

    unsafe fn delete_string(&self, string: RawHString) {
        let _ = unsafe { WindowsDeleteString(string) };
    }

    unsafe fn string_to_utf16(&self, string: RawHString) -> Vec<u16> {
        let mut len = 0u32;
        let buffer = unsafe { WindowsGetStringRawBuffer(string, &mut len) };
        if buffer.is_null() {
            return Vec::new();
        }
        unsafe { std::slice::from_raw_parts(buffer, len as usize) }.to_vec()
    }

    unsafe fn activation_factory(&self, class: RawHString, iid: &GUID) -> Result<RawPtr, HRESULT> {
        let mut out = ptr::null_mut();
        unsafe { RoGetActivationFactory(class, iid, &mut out) }.check()?;
        if out.is_null() {
            return Err(hresult::E_POINTER);
        }
        Ok(out)
    }
}
