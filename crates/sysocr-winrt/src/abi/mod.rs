//! Raw types of the WinRT binary interface.
//!
//! Everything that crosses the native boundary is declared here: interface
//! identifiers, status codes, owned object references and string handles.
//! The vtable layouts live in [`vtbl`].

use std::ffi::c_void;
use std::fmt;
use std::ptr::{self, NonNull};

use crate::runtime::Runtime;

pub mod vtbl;

/// Untyped pointer to a native object
pub type RawPtr = *mut c_void;

/// Untyped `HSTRING`. Null is the empty string.
pub type RawHString = *mut c_void;

pub use windows_core::{GUID, HRESULT};

/// Status codes this crate produces or matches on
pub mod hresult {
    use super::HRESULT;

    pub const S_OK: HRESULT = HRESULT(0);
    pub const S_FALSE: HRESULT = HRESULT(1);
    pub const E_NOTIMPL: HRESULT = HRESULT(0x8000_4001_u32 as i32);
    pub const E_NOINTERFACE: HRESULT = HRESULT(0x8000_4002_u32 as i32);
    pub const E_POINTER: HRESULT = HRESULT(0x8000_4003_u32 as i32);
    pub const E_FAIL: HRESULT = HRESULT(0x8000_4005_u32 as i32);
    pub const E_UNEXPECTED: HRESULT = HRESULT(0x8000_FFFF_u32 as i32);
    pub const E_ILLEGAL_METHOD_CALL: HRESULT = HRESULT(0x8000_000E_u32 as i32);
    pub const E_INVALIDARG: HRESULT = HRESULT(0x8007_0057_u32 as i32);
    pub const E_BOUNDS: HRESULT = HRESULT(0x8000_000B_u32 as i32);
    pub const REGDB_E_CLASSNOTREG: HRESULT = HRESULT(0x8004_0154_u32 as i32);
    pub const RPC_E_CHANGED_MODE: HRESULT = HRESULT(0x8001_0106_u32 as i32);
    /// No imaging component understands the byte stream
    pub const WINCODEC_ERR_COMPONENTNOTFOUND: HRESULT = HRESULT(0x8898_2F50_u32 as i32);
}

/// `HRESULT::ok` builds a rich error object. Native slots only need the bare
/// code propagated.
pub trait Check {
    fn check(self) -> Result<(), HRESULT>;
}

impl Check for HRESULT {
    fn check(self) -> Result<(), HRESULT> {
        if self.is_ok() { Ok(()) } else { Err(self) }
    }
}

/// An owned reference to a native object.
///
/// Holding a `NativeHandle` means holding exactly one reference count.
/// `Clone` calls `AddRef`, `Drop` calls `Release`, so every reference this
/// crate obtains is released once and never touched afterwards.
#[repr(transparent)]
pub struct NativeHandle(NonNull<c_void>);

impl NativeHandle {
    /// Take ownership of one reference. A null pointer yields `None`.
    ///
    /// # Safety
    /// `raw` must be null or point at a live object whose first field is a
    /// vtable starting with the `IUnknown` slots, and the caller must own the
    /// reference being transferred.
    pub unsafe fn from_raw(raw: RawPtr) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    pub fn as_raw(&self) -> RawPtr {
        self.0.as_ptr()
    }

    /// Give up ownership without releasing
    pub fn into_raw(self) -> RawPtr {
        let raw = self.as_raw();
        std::mem::forget(self);
        raw
    }

    /// Reinterpret the object's vtable.
    ///
    /// # Safety
    /// The object must implement an interface whose vtable layout is `V` at
    /// this pointer.
    pub unsafe fn vtable<V>(&self) -> &V {
        unsafe { &**(self.0.as_ptr() as *const *const V) }
    }

    fn unknown(&self) -> &vtbl::IUnknownVtbl {
        // Every native interface begins with the IUnknown slots.
        unsafe { self.vtable() }
    }

    /// `QueryInterface`: a new, independently released reference to the
    /// capability `iid` of the same object
    pub fn query(&self, iid: &GUID) -> Result<NativeHandle, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.unknown().query_interface)(self.as_raw(), iid, &mut out) };
        hr.check()?;
        unsafe { Self::from_raw(out) }.ok_or(hresult::E_POINTER)
    }

    /// COM identity: both handles resolve to the same `IUnknown`
    pub fn same_object(&self, other: &NativeHandle) -> Result<bool, HRESULT> {
        let left = self.query(&vtbl::IID_IUNKNOWN)?;
        let right = other.query(&vtbl::IID_IUNKNOWN)?;
        Ok(left.as_raw() == right.as_raw())
    }
}

impl Clone for NativeHandle {
    fn clone(&self) -> Self {
        unsafe { (self.unknown().add_ref)(self.as_raw()) };
        Self(self.0)
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        unsafe { (self.unknown().release)(self.as_raw()) };
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({:p})", self.0)
    }
}

/// A typed capability view of a native object.
///
/// # Safety
/// `Vtable` must be the exact layout of the interface identified by `IID`.
pub unsafe trait Interface: Sized {
    const IID: GUID;
    const NAME: &'static str;
    type Vtable;

    /// # Safety
    /// `handle` must point at the `Self::IID` interface of its object.
    unsafe fn from_handle(handle: NativeHandle) -> Self;

    fn handle(&self) -> &NativeHandle;

    fn vtable(&self) -> &Self::Vtable {
        unsafe { self.handle().vtable() }
    }

    fn as_raw(&self) -> RawPtr {
        self.handle().as_raw()
    }
}

/// Wrap an out-parameter produced by a slot whose declared return type is `I`.
///
/// # Safety
/// `out` must be what the native method wrote for an `I`-typed result.
pub(crate) unsafe fn take_out<I: Interface>(hr: HRESULT, out: RawPtr) -> Result<I, HRESULT> {
    hr.check()?;
    let handle = unsafe { NativeHandle::from_raw(out) }.ok_or(hresult::E_POINTER)?;
    Ok(unsafe { I::from_handle(handle) })
}

/// Like [`take_out`] for `Try*` methods where a null result is a valid
/// "nothing".
///
/// # Safety
/// Same as [`take_out`].
pub(crate) unsafe fn take_optional<I: Interface>(hr: HRESULT, out: RawPtr) -> Result<Option<I>, HRESULT> {
    hr.check()?;
    Ok(unsafe { NativeHandle::from_raw(out) }.map(|handle| unsafe { I::from_handle(handle) }))
}

/// Call a string getter slot and free the native copy after converting it
pub(crate) fn read_string(runtime: &dyn Runtime, getter: vtbl::GetStringFn, this: RawPtr) -> Result<String, HRESULT> {
    let mut raw = ptr::null_mut();
    unsafe { getter(this, &mut raw) }.check()?;
    let text = unsafe { HString::from_raw(runtime, raw) };
    Ok(text.to_string_lossy())
}

/// An owned native string, freed exactly once on drop.
pub struct HString<'r> {
    raw: RawHString,
    runtime: &'r dyn Runtime,
}

impl<'r> HString<'r> {
    pub fn new(runtime: &'r dyn Runtime, text: &str) -> Result<Self, HRESULT> {
        let utf16: Vec<u16> = text.encode_utf16().collect();
        let raw = runtime.create_string(&utf16)?;
        Ok(Self { raw, runtime })
    }

    /// Adopt a string returned by a native getter.
    ///
    /// # Safety
    /// `raw` must be null or a live string created by `runtime`, owned by
    /// the caller.
    pub unsafe fn from_raw(runtime: &'r dyn Runtime, raw: RawHString) -> Self {
        Self { raw, runtime }
    }

    pub fn as_raw(&self) -> RawHString {
        self.raw
    }

    pub fn to_string_lossy(&self) -> String {
        if self.raw.is_null() {
            return String::new();
        }
        let utf16 = unsafe { self.runtime.string_to_utf16(self.raw) };
        String::from_utf16_lossy(&utf16)
    }
}

impl Drop for HString<'_> {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            unsafe { self.runtime.delete_string(self.raw) };
        }
    }
}

impl fmt::Debug for HString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HString").field(&self.to_string_lossy()).finish()
    }
}
