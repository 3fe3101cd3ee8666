//! Builder-style stream surface.
//!
//! Some producer methods return a [`StreamBuilder`] instead of a bare
//! stream. The mediator unwraps the builder with [`StreamBuilder::build`]
//! and handles the result exactly like its non-builder counterpart; the
//! builder is purely an API-surface convenience.

use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;

use crate::error::BoxError;

/// A composable wrapper around a stream of items.
pub struct StreamBuilder<I> {
    inner: BoxStream<'static, Result<I, BoxError>>,
}

impl<I: Send + 'static> StreamBuilder<I> {
    /// Build from a fixed collection of items.
    #[must_use]
    pub fn from_iter<It>(items: It) -> Self
    where
        It: IntoIterator<Item = I>,
        It::IntoIter: Send + 'static,
    {
        Self {
            inner: stream::iter(items.into_iter().map(Ok)).boxed(),
        }
    }

    /// Build from an infallible stream.
    #[must_use]
    pub fn from_stream<S>(source: S) -> Self
    where
        S: futures_util::Stream<Item = I> + Send + 'static,
    {
        Self {
            inner: source.map(Ok).boxed(),
        }
    }

    /// Build from a fallible stream.
    #[must_use]
    pub fn from_try_stream<S>(source: S) -> Self
    where
        S: futures_util::Stream<Item = Result<I, BoxError>> + Send + 'static,
    {
        Self {
            inner: source.boxed(),
        }
    }

    /// Transform each item.
    #[must_use]
    pub fn map<J, F>(self, mut f: F) -> StreamBuilder<J>
    where
        J: Send + 'static,
        F: FnMut(I) -> J + Send + 'static,
    {
        StreamBuilder {
            inner: self.inner.map(move |item| item.map(&mut f)).boxed(),
        }
    }

    /// Keep only items satisfying the predicate. Failures pass through.
    #[must_use]
    pub fn filter<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(&I) -> bool + Send + 'static,
    {
        Self {
            inner: self
                .inner
                .filter(move |item| {
                    let keep = match item {
                        Ok(value) => predicate(value),
                        Err(_) => true,
                    };
                    futures_util::future::ready(keep)
                })
                .boxed(),
        }
    }

    /// Unwrap into the underlying stream.
    #[must_use]
    pub fn build(self) -> BoxStream<'static, Result<I, BoxError>> {
        self.inner
    }
}
