//! Shared fixtures for the reduction scenario and property tests.

use gpureduce::{Context, Element, TensorDesc};

pub fn contiguous_strides(shape: &[usize]) -> Vec<isize> {
    let mut strides = vec![1isize; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1] as isize;
    }
    strides
}

pub fn tensor<T: Element>(ctx: &Context, shape: &[usize], data: &[T]) -> TensorDesc<T> {
    let buffer = ctx.create_buffer_from_slice(data).unwrap();
    TensorDesc::new(buffer, shape).unwrap()
}

/// A destination tensor pre-filled with the spec's `memset(dst, -1)`
/// overwrite sentinel: every byte set to `0xff`, which for `f32` is a quiet
/// NaN bit pattern rather than the value `-1.0`.
pub fn sentinel_f32(ctx: &Context, shape: &[usize]) -> TensorDesc<f32> {
    let len = shape.iter().product();
    tensor(ctx, shape, &vec![f32::from_bits(0xffff_ffff); len])
}

pub fn sentinel_u32(ctx: &Context, shape: &[usize]) -> TensorDesc<u32> {
    let len = shape.iter().product();
    tensor(ctx, shape, &vec![0xffff_ffffu32; len])
}
