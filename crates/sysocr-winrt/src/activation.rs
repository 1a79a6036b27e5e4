//! Class activation and capability casts.

use std::ptr;

use crate::abi::vtbl::IActivationFactoryVtbl;
use crate::abi::{Check, GUID, HRESULT, HString, Interface, NativeHandle, hresult};
use crate::error::OcrError;
use crate::interfaces::native_interface;
use crate::runtime::Runtime;

native_interface! {
    /// `IActivationFactory`: default constructor of a runtime class
    ActivationFactory: IActivationFactoryVtbl = 0x00000035_0000_0000_c000_000000000046
}

impl ActivationFactory {
    pub fn activate_instance(&self) -> Result<NativeHandle, HRESULT> {
        let mut out = ptr::null_mut();
        unsafe { (self.vtable().activate_instance)(self.as_raw(), &mut out) }.check()?;
        unsafe { NativeHandle::from_raw(out) }.ok_or(hresult::E_POINTER)
    }
}

/// Resolves runtime class names through a [`Runtime`]
#[derive(Clone, Copy)]
pub struct Activator<'r> {
    runtime: &'r dyn Runtime,
}

impl<'r> Activator<'r> {
    pub fn new(runtime: &'r dyn Runtime) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &'r dyn Runtime {
        self.runtime
    }

    /// The `iface` factory or statics object of `class`
    pub fn activate(&self, class: &'static str, iface: &GUID) -> Result<NativeHandle, OcrError> {
        let activation_error = |code| OcrError::Activation { class, code };

        let name = HString::new(self.runtime, class).map_err(activation_error)?;
        let raw = unsafe { self.runtime.activation_factory(name.as_raw(), iface) }.map_err(activation_error)?;
        unsafe { NativeHandle::from_raw(raw) }.ok_or_else(|| activation_error(hresult::E_POINTER))
    }

    /// Typed [`Activator::activate`]
    pub fn factory<I: Interface>(&self, class: &'static str) -> Result<I, OcrError> {
        let handle = self.activate(class, &I::IID)?;
        Ok(unsafe { I::from_handle(handle) })
    }

    /// Default-construct `class` and view the new object as `I`
    pub fn instance<I: Interface>(&self, class: &'static str) -> Result<I, OcrError> {
        let factory = self.factory::<ActivationFactory>(class)?;
        let object = factory
            .activate_instance()
            .map_err(|code| OcrError::Activation { class, code })?;
        cast(&object)
    }
}

/// Another capability view of the same object, as an independent reference
pub fn query_capability(handle: &NativeHandle, iface: &GUID, name: &'static str) -> Result<NativeHandle, OcrError> {
    handle
        .query(iface)
        .map_err(|code| OcrError::Interface { interface: name, code })
}

/// Typed [`query_capability`]
pub fn cast<I: Interface>(handle: &NativeHandle) -> Result<I, OcrError> {
    let view = query_capability(handle, &I::IID, I::NAME)?;
    Ok(unsafe { I::from_handle(view) })
}
