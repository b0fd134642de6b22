//! A GPU-first, N-dimensional tensor reduction engine built from scratch in
//! Rust on top of `wgpu`.
//!
//! Given a source tensor and a subset of its axes, the engine folds those
//! axes by one of a fixed set of associative operators (`sum`, `prod`,
//! `max`, `argmax`, …), planning, generating, compiling, caching and
//! launching a single runtime-programmable WGSL kernel per
//! `(operator, element type, reduction width)` signature, reused across
//! every call shape that signature covers.
//!
//! # Types
//!
//! - [`Context`] — GPU context for buffer and pipeline management.
//! - [`Buffer`] — Typed GPU buffer for element data.
//! - [`TensorDesc`] — Shape/stride/buffer descriptor for one reduction operand.
//! - [`Element`] — Trait for GPU-compatible types (`f32`, `i32`, `u32`, `bool`).
//! - [`NumericElement`] — Marker trait for numeric types (`f32`, `i32`, `u32`).
//! - [`IntegerElement`] — Marker trait for the bitwise operators' types (`i32`, `u32`).
//! - [`LogicalElement`] — Marker trait for the truthy-test operators' types (`u32`, `bool`).
//! - [`SignedElement`] — Marker trait for signed types (`f32`, `i32`).
//! - [`FloatElement`] — Marker trait for floating-point types (`f32`).
//! - [`Error`] — Error type for reduction calls and GPU operations.
//!
//! # Operators
//!
//! One free function per row of the operator table:
//! [`reduce_sum`], [`reduce_prod`], [`reduce_prodnz`], [`reduce_max`],
//! [`reduce_min`], [`reduce_and`], [`reduce_or`], [`reduce_xor`],
//! [`reduce_any`], [`reduce_all`], [`reduce_argmax`], [`reduce_argmin`],
//! [`reduce_maxandargmax`], [`reduce_minandargmin`].

#![warn(missing_docs)]

extern crate alloc;

pub mod error;

mod device;
mod element;
mod engine;
mod tensor;

pub use device::{Buffer, Context};
pub use element::{Element, FloatElement, IntegerElement, LogicalElement, NumericElement, SignedElement};
pub use engine::{
    reduce_all, reduce_and, reduce_any, reduce_argmax, reduce_argmin, reduce_max,
    reduce_maxandargmax, reduce_min, reduce_minandargmin, reduce_or, reduce_prod, reduce_prodnz,
    reduce_sum, reduce_xor,
};
pub use error::Error;
pub use tensor::TensorDesc;
