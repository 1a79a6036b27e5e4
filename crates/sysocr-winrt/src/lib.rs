//! Text recognition through the Windows Runtime object model.
//!
//! The crate talks to the native engine over its binary interface directly:
//! reference-counted objects behind vtables, natively allocated strings, and
//! asynchronous operations that are polled to completion. [`Pipeline`] strings
//! those calls together; [`Runtime`] is the seam to the operating system.

pub mod abi;
pub mod activation;
pub mod aggregate;
pub mod async_op;
pub mod error;
pub mod interfaces;
pub mod pipeline;
pub mod runtime;

pub use abi::{GUID, HRESULT, HString, Interface, NativeHandle};
pub use activation::Activator;
pub use aggregate::{LINE_SEPARATOR, Rect, RecognitionTree, aggregate};
pub use async_op::{AsyncOperation, AsyncStatus, AwaitError, Completed, PollingWaiter, StatusSource, Waiter};
pub use error::{OcrError, Stage};
pub use pipeline::Pipeline;
pub use runtime::Runtime;
#[cfg(windows)]
pub use runtime::SystemRuntime;
