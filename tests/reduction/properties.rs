//! The universal properties every operator and admissible shape must satisfy.

use gpureduce::{reduce_argmax, reduce_max, reduce_maxandargmax, reduce_prod, reduce_sum};

use crate::pcg::Pcg32;
use crate::support::{contiguous_strides, tensor};
use gpureduce::{Context, TensorDesc};

#[test]
fn test_shape_law_reduced_axes_removed_from_dst_shape() {
    let ctx = Context::try_default().unwrap();
    let data: Vec<f32> = (0..60).map(|i| i as f32).collect();
    let src = tensor(&ctx, &[3, 4, 5], &data);
    let dst_buf = ctx.create_buffer::<f32>(20).unwrap();
    let dst = TensorDesc::new(dst_buf, &[4, 5]).unwrap();

    reduce_sum(&ctx, &dst, &src, &[0]).unwrap();
    ctx.poll().unwrap();

    assert_eq!(dst.shape(), &[4, 5]);
}

#[test]
fn test_identity_law_zero_length_fibre_yields_op_identity() {
    let ctx = Context::try_default().unwrap();

    let sum_src = TensorDesc::new(ctx.create_buffer::<f32>(0).unwrap(), &[3, 0]).unwrap();
    let sum_dst = tensor(&ctx, &[3], &[-1.0f32; 3]);
    reduce_sum(&ctx, &sum_dst, &sum_src, &[1]).unwrap();
    ctx.poll().unwrap();
    for v in ctx.read_buffer(sum_dst.buffer()).unwrap() {
        assert!((v - 0.0).abs() < 1e-6);
    }

    let prod_src = TensorDesc::new(ctx.create_buffer::<f32>(0).unwrap(), &[3, 0]).unwrap();
    let prod_dst = tensor(&ctx, &[3], &[-1.0f32; 3]);
    reduce_prod(&ctx, &prod_dst, &prod_src, &[1]).unwrap();
    ctx.poll().unwrap();
    for v in ctx.read_buffer(prod_dst.buffer()).unwrap() {
        assert!((v - 1.0).abs() < 1e-6);
    }
}

#[test]
fn test_all_axes_law_matches_naive_fold() {
    let ctx = Context::try_default().unwrap();
    let mut rng = Pcg32::new(1);
    let data: Vec<f32> = (0..400).map(|_| rng.rand01()).collect();
    let expected: f32 = data.iter().sum();

    let src = tensor(&ctx, &[20, 20], &data);
    let dst_buf = ctx.create_buffer::<f32>(1).unwrap();
    let dst = TensorDesc::new(dst_buf, &[]).unwrap();

    reduce_sum(&ctx, &dst, &src, &[0, 1]).unwrap();
    ctx.poll().unwrap();

    let result = ctx.read_buffer(dst.buffer()).unwrap()[0];
    assert!((result - expected).abs() < 1e-2, "{result} vs {expected}");
}

#[test]
fn test_permutation_invariance_matches_per_cell_reference() {
    // shape [4, 6, 5], reduce axis 1: each dst[i, k] must equal the
    // independently-computed sum over j of src[i, j, k], regardless of how
    // the planner internally reorders the free axes (0, 2) for locality.
    let ctx = Context::try_default().unwrap();
    let mut rng = Pcg32::new(1);
    let shape = [4usize, 6, 5];
    let data: Vec<f32> = (0..120).map(|_| rng.rand01()).collect();
    let strides = contiguous_strides(&shape);

    let src = tensor(&ctx, &shape, &data);
    let dst_buf = ctx.create_buffer::<f32>(20).unwrap();
    let dst = TensorDesc::new(dst_buf, &[4, 5]).unwrap();

    reduce_sum(&ctx, &dst, &src, &[1]).unwrap();
    ctx.poll().unwrap();
    let result = ctx.read_buffer(dst.buffer()).unwrap();

    for i in 0..4 {
        for k in 0..5 {
            let expected: f32 = (0..6)
                .map(|j| data[(i as isize * strides[0] + j as isize * strides[1] + k as isize * strides[2]) as usize])
                .sum();
            let got = result[i * 5 + k];
            assert!((got - expected).abs() < 1e-4, "[{i},{k}]: {got} vs {expected}");
        }
    }
}

#[test]
fn test_argmax_sensitivity_reversing_axes_transposes_index() {
    let ctx = Context::try_default().unwrap();
    let mut rng = Pcg32::new(1);
    let shape = [6usize, 7];
    let data: Vec<f32> = (0..42).map(|_| rng.rand01()).collect();
    let src = tensor(&ctx, &shape, &data);

    let idx_forward = TensorDesc::new(ctx.create_buffer::<u32>(1).unwrap(), &[]).unwrap();
    reduce_argmax(&ctx, &idx_forward, &src, &[0, 1]).unwrap();
    ctx.poll().unwrap();
    let k0 = ctx.read_buffer(idx_forward.buffer()).unwrap()[0];

    let idx_reversed = TensorDesc::new(ctx.create_buffer::<u32>(1).unwrap(), &[]).unwrap();
    reduce_argmax(&ctx, &idx_reversed, &src, &[1, 0]).unwrap();
    ctx.poll().unwrap();
    let k1 = ctx.read_buffer(idx_reversed.buffer()).unwrap()[0];

    let (i, j) = ((k0 / 7), (k0 % 7));
    assert_eq!(k1, j * 6 + i);
}

#[test]
fn test_value_index_agreement_maxandargmax() {
    let ctx = Context::try_default().unwrap();
    let mut rng = Pcg32::new(1);
    let shape = [9usize, 11];
    let data: Vec<f32> = (0..99).map(|_| rng.rand01()).collect();
    let src = tensor(&ctx, &shape, &data);

    let dst = TensorDesc::new(ctx.create_buffer::<f32>(1).unwrap(), &[]).unwrap();
    let dst_idx = TensorDesc::new(ctx.create_buffer::<u32>(1).unwrap(), &[]).unwrap();
    reduce_maxandargmax(&ctx, &dst, &dst_idx, &src, &[0, 1]).unwrap();
    ctx.poll().unwrap();

    let value = ctx.read_buffer(dst.buffer()).unwrap()[0];
    let index = ctx.read_buffer(dst_idx.buffer()).unwrap()[0] as usize;
    assert!((data[index] - value).abs() < 1e-6);
}

#[test]
fn test_determinism_identical_inputs_identical_outputs() {
    let ctx = Context::try_default().unwrap();
    let mut rng = Pcg32::new(1);
    let data: Vec<f32> = (0..64).map(|_| rng.rand01()).collect();

    let run = || {
        let src = tensor(&ctx, &[8, 8], &data);
        let dst = TensorDesc::new(ctx.create_buffer::<f32>(1).unwrap(), &[]).unwrap();
        let dst_idx = TensorDesc::new(ctx.create_buffer::<u32>(1).unwrap(), &[]).unwrap();
        reduce_maxandargmax(&ctx, &dst, &dst_idx, &src, &[0, 1]).unwrap();
        ctx.poll().unwrap();
        (
            ctx.read_buffer(dst.buffer()).unwrap()[0],
            ctx.read_buffer(dst_idx.buffer()).unwrap()[0],
        )
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);

    // Also cover the plain extremum op, for good measure.
    let src = tensor(&ctx, &[8, 8], &data);
    let a = TensorDesc::new(ctx.create_buffer::<f32>(1).unwrap(), &[]).unwrap();
    let b = TensorDesc::new(ctx.create_buffer::<f32>(1).unwrap(), &[]).unwrap();
    reduce_max(&ctx, &a, &src, &[0, 1]).unwrap();
    reduce_max(&ctx, &b, &src, &[0, 1]).unwrap();
    ctx.poll().unwrap();
    assert_eq!(
        ctx.read_buffer(a.buffer()).unwrap(),
        ctx.read_buffer(b.buffer()).unwrap()
    );
}
