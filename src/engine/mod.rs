//! The reduction engine's public entry points.
//!
//! Wires the planner ([`plan`]), the fixed operator table ([`op`]) and the
//! kernel-source generator ([`kernel`]) into one free function per operator,
//! each shaped `reduce_<op>(ctx, dst, [dst_idx,] src, reduce_axes) ->
//! Result<(), Error>`.
//!
//! Every function is generic over the [`crate::element`] marker trait its
//! row of the operator table requires: [`NumericElement`] for the
//! arithmetic/extremum/argument family, [`IntegerElement`] for the bitwise
//! family, [`LogicalElement`] for the truthy-test family. Which of `dst` and
//! `dst_idx` a function accepts is likewise fixed by its own signature. So,
//! unlike a dynamically-typed binding, this crate's `BAD_TYPE` and
//! `MISSING_INDEX`/`UNEXPECTED_INDEX` error kinds can never actually be
//! returned through this API — the compiler rejects the call before the
//! engine sees it. See `DESIGN.md`.

mod kernel;
mod op;
mod plan;

use alloc::vec::Vec;

use kernel::{build_params, cache_key, generate_source};
use op::{BindingShape, Op};
use plan::ReductionPlan;

use crate::device::Context;
use crate::element::{Element, IntegerElement, LogicalElement, NumericElement};
use crate::error::{Error, ReduceError};
use crate::tensor::TensorDesc;

/// Computes the sum of `src` along `reduce_axes`, writing it to `dst`.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_sum<T: NumericElement>(
    ctx: &Context,
    dst: &TensorDesc<T>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_value(ctx, Op::Sum, dst, src, reduce_axes)
}

/// Computes the product of `src` along `reduce_axes`, writing it to `dst`.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_prod<T: NumericElement>(
    ctx: &Context,
    dst: &TensorDesc<T>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_value(ctx, Op::Prod, dst, src, reduce_axes)
}

/// Computes the product of `src` along `reduce_axes` with every zero element
/// treated as the multiplicative identity, writing it to `dst`.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_prodnz<T: NumericElement>(
    ctx: &Context,
    dst: &TensorDesc<T>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_value(ctx, Op::ProdNz, dst, src, reduce_axes)
}

/// Computes the maximum of `src` along `reduce_axes`, writing it to `dst`.
/// NaN propagates: a fibre containing any NaN produces NaN.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_max<T: NumericElement>(
    ctx: &Context,
    dst: &TensorDesc<T>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_value(ctx, Op::Max, dst, src, reduce_axes)
}

/// Computes the minimum of `src` along `reduce_axes`, writing it to `dst`.
/// NaN propagates: a fibre containing any NaN produces NaN.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_min<T: NumericElement>(
    ctx: &Context,
    dst: &TensorDesc<T>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_value(ctx, Op::Min, dst, src, reduce_axes)
}

/// Computes the bitwise AND of `src` along `reduce_axes`, writing it to `dst`.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_and<T: IntegerElement>(
    ctx: &Context,
    dst: &TensorDesc<T>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_value(ctx, Op::And, dst, src, reduce_axes)
}

/// Computes the bitwise OR of `src` along `reduce_axes`, writing it to `dst`.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_or<T: IntegerElement>(
    ctx: &Context,
    dst: &TensorDesc<T>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_value(ctx, Op::Or, dst, src, reduce_axes)
}

/// Computes the bitwise XOR of `src` along `reduce_axes`, writing it to `dst`.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_xor<T: IntegerElement>(
    ctx: &Context,
    dst: &TensorDesc<T>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_value(ctx, Op::Xor, dst, src, reduce_axes)
}

/// Computes whether any element of `src` along `reduce_axes` is truthy
/// (nonzero), writing the result to `dst`.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_any<T: LogicalElement>(
    ctx: &Context,
    dst: &TensorDesc<T>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_value(ctx, Op::Any, dst, src, reduce_axes)
}

/// Computes whether every element of `src` along `reduce_axes` is truthy
/// (nonzero), writing the result to `dst`.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_all<T: LogicalElement>(
    ctx: &Context,
    dst: &TensorDesc<T>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_value(ctx, Op::All, dst, src, reduce_axes)
}

/// Writes the flat index, within each fibre, of the greatest element of
/// `src` along `reduce_axes` to `dst_idx`. Ties are broken in favor of the
/// lowest flat index; the flat index decomposes against `reduce_axes` in the
/// caller's order.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_argmax<T: NumericElement>(
    ctx: &Context,
    dst_idx: &TensorDesc<u32>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_index(ctx, Op::ArgMax, dst_idx, src, reduce_axes)
}

/// Writes the flat index, within each fibre, of the least element of `src`
/// along `reduce_axes` to `dst_idx`. Ties are broken in favor of the lowest
/// flat index; the flat index decomposes against `reduce_axes` in the
/// caller's order.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_argmin<T: NumericElement>(
    ctx: &Context,
    dst_idx: &TensorDesc<u32>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_index(ctx, Op::ArgMin, dst_idx, src, reduce_axes)
}

/// Computes both the maximum of `src` along `reduce_axes` and its winning
/// flat index, writing the value to `dst` and the index to `dst_idx`. The
/// value and index written for a given cell always come from the same
/// source element.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_maxandargmax<T: NumericElement>(
    ctx: &Context,
    dst: &TensorDesc<T>,
    dst_idx: &TensorDesc<u32>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_value_and_index(ctx, Op::MaxAndArgMax, dst, dst_idx, src, reduce_axes)
}

/// Computes both the minimum of `src` along `reduce_axes` and its winning
/// flat index, writing the value to `dst` and the index to `dst_idx`. The
/// value and index written for a given cell always come from the same
/// source element.
///
/// # Errors
///
/// See [`crate::error::ReduceError`].
pub fn reduce_minandargmin<T: NumericElement>(
    ctx: &Context,
    dst: &TensorDesc<T>,
    dst_idx: &TensorDesc<u32>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    reduce_value_and_index(ctx, Op::MinAndArgMin, dst, dst_idx, src, reduce_axes)
}

/// Shared implementation for the `BindingShape::ValueOnly` operators: plans
/// the call, short-circuits on an empty destination, and launches the
/// generated kernel writing only `dst`.
fn reduce_value<T: Element>(
    ctx: &Context,
    op: Op,
    dst: &TensorDesc<T>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    let plan = ReductionPlan::build(
        op,
        src.shape(),
        src.strides(),
        dst.shape(),
        dst.strides(),
        None,
        reduce_axes,
    )?;

    if plan.m == 0 {
        // No free cells exist in `dst`; nothing to write, nothing to launch.
        return Ok(());
    }

    let params = build_params(&plan, src.offset(), dst.offset(), 0)?;
    launch::<T>(ctx, op, &plan, &params, src, Some(dst), None)
}

/// Shared implementation for the `BindingShape::IndexOnly` operators
/// (`ArgMax`/`ArgMin`): plans against `dst_idx`'s shape directly (there is
/// no value destination to plan against), short-circuits on an empty
/// destination, and launches the generated kernel writing only `dst_idx`.
fn reduce_index<T: Element>(
    ctx: &Context,
    op: Op,
    dst_idx: &TensorDesc<u32>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    let plan = ReductionPlan::build(
        op,
        src.shape(),
        src.strides(),
        dst_idx.shape(),
        dst_idx.strides(),
        Some(dst_idx.strides()),
        reduce_axes,
    )?;

    if plan.m == 0 {
        return Ok(());
    }

    let params = build_params(&plan, src.offset(), 0, dst_idx.offset())?;
    launch::<T>(ctx, op, &plan, &params, src, None, Some(dst_idx))
}

/// Shared implementation for the `BindingShape::ValueAndIndex` operators
/// (`MaxAndArgMax`/`MinAndArgMin`): validates that `dst` and `dst_idx` agree
/// on shape, plans the call, short-circuits on an empty destination, and
/// launches the generated kernel writing both streams from the same winning
/// element.
fn reduce_value_and_index<T: Element>(
    ctx: &Context,
    op: Op,
    dst: &TensorDesc<T>,
    dst_idx: &TensorDesc<u32>,
    src: &TensorDesc<T>,
    reduce_axes: &[usize],
) -> Result<(), Error> {
    if dst.shape() != dst_idx.shape() {
        return Err(ReduceError::BadShape(alloc::format!(
            "value destination shape {:?} does not match index destination shape {:?}",
            dst.shape(),
            dst_idx.shape()
        ))
        .into());
    }

    let plan = ReductionPlan::build(
        op,
        src.shape(),
        src.strides(),
        dst.shape(),
        dst.strides(),
        Some(dst_idx.strides()),
        reduce_axes,
    )?;

    if plan.m == 0 {
        return Ok(());
    }

    let params = build_params(&plan, src.offset(), dst.offset(), dst_idx.offset())?;
    launch::<T>(ctx, op, &plan, &params, src, Some(dst), Some(dst_idx))
}

/// Binds a plan's buffers and uniform parameters to the (cached, or freshly
/// generated and compiled) kernel for `(op, T, plan.threads_per_reduction)`
/// and submits one dispatch covering `plan.grid` workgroups.
///
/// This crate's `@workgroup_size(256)` kernel template never splits a single
/// reduction fibre across more than one workgroup — a large reduction length
/// tops out at one 256-wide workgroup cooperating via shared memory, with
/// each thread striding further — so no inter-block scratch buffer is ever
/// allocated here; see `DESIGN.md`.
fn launch<T: Element>(
    ctx: &Context,
    op: Op,
    plan: &ReductionPlan,
    params: &kernel::Params,
    src: &TensorDesc<T>,
    dst: Option<&TensorDesc<T>>,
    dst_idx: Option<&TensorDesc<u32>>,
) -> Result<(), Error> {
    let key = cache_key(op, T::wgsl_type(), plan.threads_per_reduction);
    let threads_per_reduction = plan.threads_per_reduction;
    let pipeline = ctx.get_or_create_kernel_pipeline(key, op.name(), || {
        generate_source::<T>(op, threads_per_reduction)
    });

    let uniform = ctx.create_uniform_buffer(params);

    let mut entries = Vec::with_capacity(4);
    entries.push(wgpu::BindGroupEntry {
        binding: 0,
        resource: src.buffer().inner().as_entire_binding(),
    });

    let uniform_binding = match op.binding_shape() {
        BindingShape::ValueOnly => {
            let dst = dst.ok_or_else(|| {
                Error::Device("internal error: value-only operator missing dst".into())
            })?;
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: dst.buffer().inner().as_entire_binding(),
            });
            2
        }
        BindingShape::IndexOnly => {
            let dst_idx = dst_idx.ok_or_else(|| {
                Error::Device("internal error: index-only operator missing dst_idx".into())
            })?;
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: dst_idx.buffer().inner().as_entire_binding(),
            });
            2
        }
        BindingShape::ValueAndIndex => {
            let dst = dst.ok_or_else(|| {
                Error::Device("internal error: value-and-index operator missing dst".into())
            })?;
            let dst_idx = dst_idx.ok_or_else(|| {
                Error::Device("internal error: value-and-index operator missing dst_idx".into())
            })?;
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: dst.buffer().inner().as_entire_binding(),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2,
                resource: dst_idx.buffer().inner().as_entire_binding(),
            });
            3
        }
    };
    entries.push(wgpu::BindGroupEntry {
        binding: uniform_binding,
        resource: uniform.as_entire_binding(),
    });

    let bind_group_layout = pipeline.get_bind_group_layout(0);
    let bind_group = ctx.device().create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(op.name()),
        layout: &bind_group_layout,
        entries: &entries,
    });

    let mut encoder = ctx
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(op.name()),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(plan.grid, 1, 1);
    }
    ctx.queue().submit(Some(encoder.finish()));

    Ok(())
}
