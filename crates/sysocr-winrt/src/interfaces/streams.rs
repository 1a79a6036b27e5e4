use std::ptr;

use crate::abi::vtbl::{IDataWriterFactoryVtbl, IDataWriterVtbl, IOutputStreamVtbl, IRandomAccessStreamVtbl};
use crate::abi::{Check, HRESULT, Interface, NativeHandle, hresult, take_out};
use crate::async_op::AsyncOperation;

pub const IN_MEMORY_RANDOM_ACCESS_STREAM: &str = "Windows.Storage.Streams.InMemoryRandomAccessStream";
pub const DATA_WRITER: &str = "Windows.Storage.Streams.DataWriter";

native_interface! {
    RandomAccessStream: IRandomAccessStreamVtbl = 0x905a0fe1_bc53_11df_8c49_001e4fc686da
}

impl RandomAccessStream {
    pub fn seek(&self, position: u64) -> Result<(), HRESULT> {
        unsafe { (self.vtable().seek)(self.as_raw(), position) }.check()
    }

    pub fn position(&self) -> Result<u64, HRESULT> {
        let mut position = 0;
        unsafe { (self.vtable().position)(self.as_raw(), &mut position) }.check()?;
        Ok(position)
    }
}

native_interface! {
    OutputStream: IOutputStreamVtbl = 0x905a0fe6_bc53_11df_8c49_001e4fc686da
}

native_interface! {
    DataWriterFactory: IDataWriterFactoryVtbl = 0x338c67c2_8b84_4c2b_9c50_7b8767847a1f
}

impl DataWriterFactory {
    pub fn create_data_writer(&self, stream: &OutputStream) -> Result<DataWriter, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().create_data_writer)(self.as_raw(), stream.as_raw(), &mut out) };
        unsafe { take_out(hr, out) }
    }
}

native_interface! {
    DataWriter: IDataWriterVtbl = 0x64b89265_d341_4922_b38a_dd4af8808c4e
}

impl DataWriter {
    pub fn write_bytes(&self, data: &[u8]) -> Result<(), HRESULT> {
        let len = u32::try_from(data.len()).map_err(|_| hresult::E_INVALIDARG)?;
        unsafe { (self.vtable().write_bytes)(self.as_raw(), len, data.as_ptr()) }.check()
    }

    /// Commit the buffered bytes; completes with the number stored
    pub fn store_async(&self) -> Result<AsyncOperation<u32>, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().store_async)(self.as_raw(), &mut out) };
        unsafe { AsyncOperation::from_out(hr, out) }
    }

    pub fn flush_async(&self) -> Result<AsyncOperation<bool>, HRESULT> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.vtable().flush_async)(self.as_raw(), &mut out) };
        unsafe { AsyncOperation::from_out(hr, out) }
    }

    /// Detach the writer from its stream, returning the writer's reference
    /// to it
    pub fn detach_stream(&self) -> Result<Option<NativeHandle>, HRESULT> {
        let mut out = ptr::null_mut();
        unsafe { (self.vtable().detach_stream)(self.as_raw(), &mut out) }.check()?;
        Ok(unsafe { NativeHandle::from_raw(out) })
    }
}
