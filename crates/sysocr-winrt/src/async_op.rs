//! Waiting on native asynchronous operations from synchronous code.
//!
//! A native operation only reports its status through `IAsyncInfo`. The
//! [`Waiter`] trait turns that into a blocking call with a deadline;
//! [`PollingWaiter`] is the implementation used by the pipeline.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr;
use std::thread;
use std::time::{Duration, Instant};

use crate::abi::vtbl::{IAsyncInfoVtbl, IAsyncOperationVtbl};
use crate::abi::{Check, HRESULT, Interface, NativeHandle, RawPtr, hresult};
use crate::interfaces::native_interface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncStatus {
    Started,
    Completed,
    Canceled,
    Error,
}

impl AsyncStatus {
    pub fn from_abi(value: i32) -> Option<Self> {
        match value {
            0 => Some(AsyncStatus::Started),
            1 => Some(AsyncStatus::Completed),
            2 => Some(AsyncStatus::Canceled),
            3 => Some(AsyncStatus::Error),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != AsyncStatus::Started
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AwaitError {
    #[error("operation failed: {0}")]
    Failed(HRESULT),

    #[error("operation was canceled")]
    Canceled,

    #[error("operation still running after {0:?}")]
    TimedOut(Duration),

    #[error("could not read operation status: {0}")]
    Status(HRESULT),
}

/// Something whose completion status can be observed
pub trait StatusSource {
    fn status(&self) -> Result<AsyncStatus, HRESULT>;

    /// Failure code of an operation in the `Error` state
    fn error_code(&self) -> HRESULT;

    /// Best-effort request to stop the operation
    fn cancel(&self) -> Result<(), HRESULT>;
}

/// Blocks until a [`StatusSource`] reaches a terminal state or `timeout`
/// elapses.
pub trait Waiter {
    fn wait(&self, op: &dyn StatusSource, timeout: Duration) -> Result<(), AwaitError>;
}

/// Checks the status every `interval`. Completion is noticed at most one
/// interval late.
#[derive(Debug, Clone, Copy)]
pub struct PollingWaiter {
    interval: Duration,
    cancel_on_timeout: bool,
}

impl PollingWaiter {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10);

    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cancel_on_timeout: true,
        }
    }

    /// Whether to call `Cancel` on an operation we stop waiting for
    pub fn cancel_on_timeout(mut self, cancel: bool) -> Self {
        self.cancel_on_timeout = cancel;
        self
    }
}

impl Default for PollingWaiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

impl Waiter for PollingWaiter {
    fn wait(&self, op: &dyn StatusSource, timeout: Duration) -> Result<(), AwaitError> {
        // A timeout past the end of the clock never expires.
        let deadline = Instant::now().checked_add(timeout);
        let mut polls = 0u32;

        loop {
            polls = polls.saturating_add(1);
            match op.status().map_err(AwaitError::Status)? {
                AsyncStatus::Completed => {
                    tracing::trace!("operation completed after {} polls", polls);
                    return Ok(());
                }
                AsyncStatus::Error => return Err(AwaitError::Failed(op.error_code())),
                AsyncStatus::Canceled => return Err(AwaitError::Canceled),
                AsyncStatus::Started => {}
            }

            let Some(deadline) = deadline else {
                thread::sleep(self.interval);
                continue;
            };
            let now = Instant::now();
            if now >= deadline {
                if self.cancel_on_timeout {
                    if let Err(code) = op.cancel() {
                        tracing::warn!("could not cancel timed out operation: {}", code);
                    }
                }
                return Err(AwaitError::TimedOut(timeout));
            }
            thread::sleep(self.interval.min(deadline - now));
        }
    }
}

native_interface! {
    /// `IAsyncInfo`: status view shared by every native async operation
    AsyncInfo: IAsyncInfoVtbl = 0x00000036_0000_0000_c000_000000000046
}

impl StatusSource for AsyncInfo {
    fn status(&self) -> Result<AsyncStatus, HRESULT> {
        let mut raw = 0i32;
        unsafe { (self.vtable().status)(self.as_raw(), &mut raw) }.check()?;
        AsyncStatus::from_abi(raw).ok_or(hresult::E_UNEXPECTED)
    }

    fn error_code(&self) -> HRESULT {
        let mut code = hresult::S_OK;
        match unsafe { (self.vtable().error_code)(self.as_raw(), &mut code) }.check() {
            Ok(()) if !code.is_ok() => code,
            _ => hresult::E_FAIL,
        }
    }

    fn cancel(&self) -> Result<(), HRESULT> {
        unsafe { (self.vtable().cancel)(self.as_raw()) }.check()
    }
}

/// Value produced by a completed operation, in its ABI form
pub trait AsyncResult: Sized {
    type Abi: Copy;
    const EMPTY: Self::Abi;

    /// # Safety
    /// `abi` must be what `GetResults` wrote for this result type.
    unsafe fn from_abi(abi: Self::Abi) -> Result<Self, HRESULT>;
}

impl AsyncResult for u32 {
    type Abi = u32;
    const EMPTY: u32 = 0;

    unsafe fn from_abi(abi: u32) -> Result<Self, HRESULT> {
        Ok(abi)
    }
}

impl AsyncResult for bool {
    type Abi = u8;
    const EMPTY: u8 = 0;

    unsafe fn from_abi(abi: u8) -> Result<Self, HRESULT> {
        Ok(abi != 0)
    }
}

impl AsyncResult for NativeHandle {
    type Abi = RawPtr;
    const EMPTY: RawPtr = ptr::null_mut();

    unsafe fn from_abi(abi: RawPtr) -> Result<Self, HRESULT> {
        unsafe { NativeHandle::from_raw(abi) }.ok_or(hresult::E_POINTER)
    }
}

/// A running `IAsyncOperation<T>`.
///
/// Results are only reachable through [`Completed`], which [`wait`]
/// returns once the operation has finished successfully.
///
/// [`wait`]: AsyncOperation::wait
pub struct AsyncOperation<T: AsyncResult> {
    handle: NativeHandle,
    _result: PhantomData<fn() -> T>,
}

impl<T: AsyncResult> AsyncOperation<T> {
    /// # Safety
    /// `handle` must be an `IAsyncOperation<T>` pointer.
    pub(crate) unsafe fn from_handle(handle: NativeHandle) -> Self {
        Self {
            handle,
            _result: PhantomData,
        }
    }

    pub(crate) unsafe fn from_out(hr: HRESULT, out: RawPtr) -> Result<Self, HRESULT> {
        hr.check()?;
        let handle = unsafe { NativeHandle::from_raw(out) }.ok_or(hresult::E_POINTER)?;
        Ok(unsafe { Self::from_handle(handle) })
    }

    /// Block until the operation succeeds, fails, is canceled or `timeout`
    /// elapses. The operation is released on every error path.
    pub fn wait(self, waiter: &dyn Waiter, timeout: Duration) -> Result<Completed<T>, AwaitError> {
        let info = self.handle.query(&AsyncInfo::IID).map_err(AwaitError::Status)?;
        let info = unsafe { AsyncInfo::from_handle(info) };
        waiter.wait(&info, timeout)?;
        drop(info);

        Ok(Completed {
            handle: self.handle,
            _result: PhantomData,
        })
    }
}

/// An operation that reached `Completed`
pub struct Completed<T: AsyncResult> {
    handle: NativeHandle,
    _result: PhantomData<fn() -> T>,
}

impl<T: AsyncResult> Completed<T> {
    /// `GetResults`. Consumes the operation, which is released afterwards.
    pub fn get_results(self) -> Result<T, HRESULT> {
        let vtbl: &IAsyncOperationVtbl = unsafe { self.handle.vtable() };
        let mut abi = T::EMPTY;
        unsafe { (vtbl.get_results)(self.handle.as_raw(), &mut abi as *mut T::Abi as *mut c_void) }.check()?;
        unsafe { T::from_abi(abi) }
    }
}
