use std::ptr;

use crate::abi::vtbl::{ILanguageFactoryVtbl, ILanguageVtbl};
use crate::abi::{HRESULT, HString, Interface, read_string, take_out};
use crate::runtime::Runtime;

pub const LANGUAGE: &str = "Windows.Globalization.Language";

native_interface! {
    LanguageFactory: ILanguageFactoryVtbl = 0x9b0252ac_0c27_44f8_b792_9793fb66c63e
}

impl LanguageFactory {
    /// Fails with `E_INVALIDARG` for a malformed BCP-47 tag
    pub fn create_language(&self, tag: &HString<'_>) -> Result<Language, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().create_language)(self.as_raw(), tag.as_raw(), &mut out) };
        unsafe { take_out(hr, out) }
    }
}

native_interface! {
    Language: ILanguageVtbl = 0xea79a752_f7c2_4265_b1bd_c4dec4e4f080
}

impl Language {
    pub fn language_tag(&self, runtime: &dyn Runtime) -> Result<String, HRESULT> {
        read_string(runtime, self.vtable().language_tag, self.as_raw())
    }
}
