//! Tensor descriptor — the minimal shape/stride/buffer view the reduction
//! engine operates on.
//!
//! This is a deliberately thin stand-in for an external `GpuArray`
//! collaborator (out of scope here: a full tensor algebra, broadcasting,
//! views with reference counting). It carries
//! exactly what the planner needs: a rank, a per-axis length, a per-axis
//! **element** stride (signed, so negative / reversed layouts are
//! representable), an element offset into the buffer, and the buffer itself.

use alloc::vec::Vec;

use crate::device::Buffer;
use crate::element::Element;
use crate::error::{Error, ReduceError};

/// Shape + stride + device-buffer descriptor for one tensor argument to a
/// reduction call.
///
/// Strides are counted in elements, not bytes — `Buffer<T>` is already
/// typed, so converting to a byte offset is the kernel-argument layer's job.
#[derive(Clone)]
pub struct TensorDesc<T: Element> {
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
    buffer: Buffer<T>,
}

impl<T: Element> TensorDesc<T> {
    /// Creates a descriptor for a contiguous (row-major) tensor over the
    /// whole of `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`ReduceError::BadShape`] if the product of `shape` does not
    /// equal `buffer.len()`.
    pub fn new(buffer: Buffer<T>, shape: &[usize]) -> Result<Self, Error> {
        let volume: usize = shape.iter().product();
        if volume != buffer.len() {
            return Err(ReduceError::BadShape(format!(
                "shape {shape:?} has volume {volume} but the buffer holds {} elements",
                buffer.len()
            ))
            .into());
        }

        let strides = Self::contiguous_strides(shape);
        Self::with_strides(buffer, shape, &strides, 0)
    }

    /// Creates a descriptor over an arbitrarily strided (and possibly
    /// non-contiguous, reversed, or overlapping) view of `buffer`.
    ///
    /// `offset` and `strides` are counted in elements. The caller is
    /// responsible for ensuring every accessed element lies within
    /// `buffer`; overlapping strides are only safe when the tensor is
    /// read-only, which the engine cannot itself verify.
    ///
    /// # Errors
    ///
    /// Returns [`ReduceError::BadShape`] if `shape.len() != strides.len()`.
    pub fn with_strides(
        buffer: Buffer<T>,
        shape: &[usize],
        strides: &[isize],
        offset: usize,
    ) -> Result<Self, Error> {
        if shape.len() != strides.len() {
            return Err(ReduceError::BadShape(format!(
                "shape rank {} does not match strides rank {}",
                shape.len(),
                strides.len()
            ))
            .into());
        }

        Ok(Self {
            shape: shape.to_vec(),
            strides: strides.to_vec(),
            offset,
            buffer,
        })
    }

    /// Returns the tensor rank (number of axes).
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Returns the per-axis lengths.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the per-axis element strides.
    #[must_use]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Returns the element offset into the backing buffer.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the logical element count (product of `shape`; `1` for a
    /// rank-0 tensor).
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape.iter().product::<usize>()
    }

    /// Returns `true` if any axis has length zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// Returns the backing device buffer.
    pub(crate) fn buffer(&self) -> &Buffer<T> {
        &self.buffer
    }

    fn contiguous_strides(shape: &[usize]) -> Vec<isize> {
        let mut strides = alloc::vec![1isize; shape.len()];
        for i in (0..shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * shape[i + 1] as isize;
        }
        strides
    }
}

impl<T: Element> core::fmt::Debug for TensorDesc<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TensorDesc")
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}
