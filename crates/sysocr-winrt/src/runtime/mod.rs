//! The operating-system surface the ABI layer is built on.

use crate::abi::{GUID, HRESULT, RawHString, RawPtr};

#[cfg(windows)]
mod system;

#[cfg(windows)]
pub use system::SystemRuntime;

/// Process-level services of a WinRT-style object runtime.
///
/// [`SystemRuntime`] forwards to `combase.dll`. Anything else implementing
/// this trait must hand out objects that follow the `IUnknown` contract.
pub trait Runtime {
    /// Prepare the calling thread for activation. Idempotent, and "already
    /// initialized" counts as success.
    fn initialize(&self) -> Result<(), HRESULT>;

    /// Allocate an immutable string. The empty string may be returned as null.
    fn create_string(&self, utf16: &[u16]) -> Result<RawHString, HRESULT>;

    /// # Safety
    /// `string` must be a live, non-null string from this runtime. It is
    /// invalid afterwards.
    unsafe fn delete_string(&self, string: RawHString);

    /// # Safety
    /// `string` must be a live, non-null string from this runtime.
    unsafe fn string_to_utf16(&self, string: RawHString) -> Vec<u16>;

    /// Resolve the activation factory (or statics) `iid` of `class`.
    /// The returned pointer carries one reference owned by the caller.
    ///
    /// # Safety
    /// `class` must be a live string from this runtime.
    unsafe fn activation_factory(&self, class: RawHString, iid: &GUID) -> Result<RawPtr, HRESULT>;
}
