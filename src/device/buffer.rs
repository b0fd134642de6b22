//! Typed GPU buffer for element data.

use core::marker::PhantomData;

use alloc::format;

use crate::Element;

/// Typed GPU buffer for element storage.
///
/// The buffer physically holds `T::Native` values; `len` counts logical
/// elements of `T`, which coincides with the native element count for every
/// implementor of [`Element`] in this crate.
#[derive(Clone)]
pub struct Buffer<T: Element> {
    inner: wgpu::Buffer,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> Buffer<T> {
    /// Creates a new buffer wrapper around an already-sized `wgpu::Buffer`.
    pub(crate) fn new(buffer: wgpu::Buffer, len: usize) -> Self {
        Self {
            inner: buffer,
            len,
            _marker: PhantomData,
        }
    }

    /// Returns the buffer size in bytes.
    pub(crate) fn byte_size(&self) -> u64 {
        self.inner.size()
    }

    /// Returns the number of elements.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if empty.
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the underlying wgpu buffer.
    pub(crate) fn inner(&self) -> &wgpu::Buffer {
        &self.inner
    }
}

impl<T: Element> core::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct(&format!("Buffer<{}>", T::wgsl_type()))
            .field("byte_size", &self.inner.size())
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
