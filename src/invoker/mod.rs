//! Invoker Module
//!
//! Wraps an asynchronous external call with cache-first lookup and bounded
//! retries for transient failures.

mod policy;
mod retryable;

pub use policy::{is_retryable, is_retryable_status, InvokeOptions, RetryPolicy, RetryableError};
pub use retryable::{InvocationResult, RetryableInvoker};
