//! Asynchronously resolved values
//!
//! An [`Output`] is a value the engine (or another stack) will produce later:
//! a resource's live identifier, an attribute the provider computes, or an
//! export read from another stack. Consumers chain on it with
//! [`Output::map`] / [`Output::and_then`] or suspend on
//! [`Output::resolve`]; nothing ever reads it synchronously.
//!
//! Outputs are cheap to clone. The underlying future runs at most once and
//! every clone observes the same result.

use crate::error::{EngineError, Result};
use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use std::future::Future;

/// A shared, lazily-driven asynchronous value
pub struct Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Shared<BoxFuture<'static, Result<T>>>,
}

impl<T> Clone for Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Output<T>
where
    T: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.peek() {
            Some(Ok(value)) => f.debug_tuple("Output").field(value).finish(),
            Some(Err(e)) => f.debug_tuple("Output").field(e).finish(),
            None => f.write_str("Output(<pending>)"),
        }
    }
}

impl<T> Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wrap a future producing the value
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            inner: fut.boxed().shared(),
        }
    }

    /// An output that is already known
    pub fn ready(value: T) -> Self {
        Self::from_future(future::ready(Ok(value)))
    }

    /// An output that resolves to an error
    pub fn failed(error: EngineError) -> Self {
        Self::from_future(future::ready(Err(error)))
    }

    /// Wait for the value
    ///
    /// The returned future owns its handle, so it may outlive `self`.
    pub fn resolve(&self) -> Shared<BoxFuture<'static, Result<T>>> {
        self.inner.clone()
    }

    /// The value if it has already been resolved
    pub fn peek(&self) -> Option<Result<T>> {
        self.inner.peek().cloned()
    }

    /// Transform the value once it resolves
    pub fn map<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let inner = self.inner.clone();
        Output::from_future(async move { inner.await.map(f) })
    }

    /// Transform the value with a fallible function
    pub fn try_map<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        let inner = self.inner.clone();
        Output::from_future(async move { inner.await.and_then(f) })
    }

    /// Chain another asynchronous step on the value
    pub fn and_then<U, F, Fut>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U>> + Send + 'static,
    {
        let inner = self.inner.clone();
        Output::from_future(async move { f(inner.await?).await })
    }

    /// Resolve every output, failing on the first error
    pub fn all(outputs: Vec<Output<T>>) -> Output<Vec<T>> {
        Output::from_future(async move {
            future::try_join_all(outputs.into_iter().map(|o| o.inner)).await
        })
    }
}

impl Output<String> {
    /// Require a non-empty string; `what` names the value in the error
    pub fn non_empty(&self, what: impl Into<String>) -> Output<String> {
        let what = what.into();
        self.try_map(move |value| {
            if value.is_empty() {
                Err(EngineError::InvalidInput(format!("{} resolved to an empty value", what)))
            } else {
                Ok(value)
            }
        })
    }
}

impl<T> From<T> for Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from(value: T) -> Self {
        Output::ready(value)
    }
}
