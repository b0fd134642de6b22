//! The concrete reduction scenarios, all seeded from `Pcg32::new(1)`.
//!
//! Every destination is pre-filled with the `-1` overwrite sentinel first,
//! confirming the kernel always replaces it rather than folding it in.

use gpureduce::{reduce_and, reduce_maxandargmax, reduce_minandargmin, reduce_prodnz, reduce_sum};

use crate::pcg::Pcg32;
use crate::support::{contiguous_strides, sentinel_f32, sentinel_u32, tensor};
use gpureduce::{Context, TensorDesc};

#[test]
fn test_scenario_3d_maxandargmax_reduce_0_2() {
    let ctx = Context::try_default().unwrap();
    let mut rng = Pcg32::new(1);
    let shape = [32usize, 50, 79];
    let data: Vec<f32> = (0..32 * 50 * 79).map(|_| rng.rand01()).collect();
    let strides = contiguous_strides(&shape);

    let src = tensor(&ctx, &shape, &data);
    let dst = sentinel_f32(&ctx, &[50]);
    let dst_idx = sentinel_u32(&ctx, &[50]);

    reduce_maxandargmax(&ctx, &dst, &dst_idx, &src, &[0, 2]).unwrap();
    ctx.poll().unwrap();

    let values = ctx.read_buffer(dst.buffer()).unwrap();
    let indices = ctx.read_buffer(dst_idx.buffer()).unwrap();

    for j in 0..50 {
        let mut best = f32::MIN;
        let mut best_idx = (0usize, 0usize);
        for i in 0..32 {
            for k in 0..79 {
                let v = data[(i as isize * strides[0] + j as isize * strides[1] + k as isize * strides[2]) as usize];
                if v > best {
                    best = v;
                    best_idx = (i, k);
                }
            }
        }
        assert!((values[j] - best).abs() < 1e-6);
        assert_eq!(indices[j] as usize, best_idx.0 * 79 + best_idx.1);
    }
}

#[test]
fn test_scenario_3d_maxandargmax_reduce_2_0_transposes_digits() {
    let ctx = Context::try_default().unwrap();
    let mut rng = Pcg32::new(1);
    let shape = [32usize, 50, 79];
    let data: Vec<f32> = (0..32 * 50 * 79).map(|_| rng.rand01()).collect();
    let strides = contiguous_strides(&shape);

    let src = tensor(&ctx, &shape, &data);
    let dst_forward = sentinel_f32(&ctx, &[50]);
    let idx_forward = sentinel_u32(&ctx, &[50]);
    reduce_maxandargmax(&ctx, &dst_forward, &idx_forward, &src, &[0, 2]).unwrap();
    ctx.poll().unwrap();
    let forward_values = ctx.read_buffer(dst_forward.buffer()).unwrap();
    let forward_indices = ctx.read_buffer(idx_forward.buffer()).unwrap();

    let src = tensor(&ctx, &shape, &data);
    let dst_reversed = sentinel_f32(&ctx, &[50]);
    let idx_reversed = sentinel_u32(&ctx, &[50]);
    reduce_maxandargmax(&ctx, &dst_reversed, &idx_reversed, &src, &[2, 0]).unwrap();
    ctx.poll().unwrap();
    let reversed_values = ctx.read_buffer(dst_reversed.buffer()).unwrap();
    let reversed_indices = ctx.read_buffer(idx_reversed.buffer()).unwrap();

    for j in 0..50 {
        assert!((forward_values[j] - reversed_values[j]).abs() < 1e-6);
        let i = forward_indices[j] as usize / 79;
        let k = forward_indices[j] as usize % 79;
        assert_eq!(reversed_indices[j] as usize, k * 32 + i);
    }
}

#[test]
fn test_scenario_8d_minandargmin_reduce_2_4_7_5() {
    // src.shape = [1171, 373, 2, 1, 2, 1, 2, 1], reducing axes {2, 4, 7, 5}.
    // Axes 3, 6 stay free alongside 0 and 1; axes 7 and 5 have length 1, so
    // only axes 2 and 4 (each length 2) actually vary the winning index —
    // every other digit in the reduce-axis-order weighting collapses to 0.
    let ctx = Context::try_default().unwrap();
    let shape = [1171usize, 373, 2, 1, 2, 1, 2, 1];
    let strides = contiguous_strides(&shape);
    let total: usize = shape.iter().product();

    let mut rng = Pcg32::new(1);
    let data: Vec<f32> = (0..total).map(|_| rng.rand01()).collect();

    let src = tensor(&ctx, &shape, &data);
    let dst_shape = [1171usize, 373, 1, 2];
    let dst = sentinel_f32(&ctx, &dst_shape);
    let dst_idx = sentinel_u32(&ctx, &dst_shape);

    reduce_minandargmin(&ctx, &dst, &dst_idx, &src, &[2, 4, 7, 5]).unwrap();
    ctx.poll().unwrap();

    let values = ctx.read_buffer(dst.buffer()).unwrap();
    let indices = ctx.read_buffer(dst_idx.buffer()).unwrap();

    // Spot-check representative free cells rather than all ~874k of them.
    let sample_points = [(0usize, 0usize, 0usize), (3, 100, 1), (1170, 372, 1)];
    for &(i, j, o) in &sample_points {
        let dst_flat = (i * 373 + j) * 2 + o;
        let mut best = f32::MAX;
        let mut best_km = (0usize, 0usize);
        for k in 0..2 {
            for m in 0..2 {
                let off = i as isize * strides[0]
                    + j as isize * strides[1]
                    + k as isize * strides[2]
                    + m as isize * strides[4]
                    + o as isize * strides[6];
                let v = data[off as usize];
                if v < best {
                    best = v;
                    best_km = (k, m);
                }
            }
        }
        assert!((values[dst_flat] - best).abs() < 1e-6);
        assert_eq!(indices[dst_flat] as usize, best_km.0 * 2 + best_km.1);
    }
}

#[test]
fn test_scenario_reduce_all_sum() {
    let ctx = Context::try_default().unwrap();
    let mut rng = Pcg32::new(1);
    let shape = [32usize, 50, 79];
    let total: usize = shape.iter().product();
    let data: Vec<f32> = (0..total).map(|_| rng.rand01()).collect();
    let naive: f64 = data.iter().map(|&v| f64::from(v)).sum();

    let src = tensor(&ctx, &shape, &data);
    let dst = sentinel_f32(&ctx, &[]);

    reduce_sum(&ctx, &dst, &src, &[0, 1, 2]).unwrap();
    ctx.poll().unwrap();

    let result = f64::from(ctx.read_buffer(dst.buffer()).unwrap()[0]);
    assert!((result - naive).abs() / naive.abs() < 1e-4, "{result} vs {naive}");
}

#[test]
fn test_scenario_prodnz_with_10pct_zeros() {
    let ctx = Context::try_default().unwrap();
    let mut rng = Pcg32::new(1);
    let n = 4096;
    let mut data = Vec::with_capacity(n);
    let mut expected = 1.0f64;
    for _ in 0..n {
        let value = 0.95 + 0.1 * rng.rand01();
        let zeroed = rng.rand01() < 0.1;
        let v = if zeroed { 0.0 } else { value };
        if v != 0.0 {
            expected *= f64::from(v);
        }
        data.push(v);
    }

    let src = tensor(&ctx, &[n], &data);
    let dst = sentinel_f32(&ctx, &[]);

    reduce_prodnz(&ctx, &dst, &src, &[0]).unwrap();
    ctx.poll().unwrap();

    let result = f64::from(ctx.read_buffer(dst.buffer()).unwrap()[0]);
    assert!((result - expected).abs() / expected.abs() < 1e-3, "{result} vs {expected}");
}

#[test]
fn test_scenario_bitwise_and_saturated_u32() {
    let ctx = Context::try_default().unwrap();
    let mut rng = Pcg32::new(1);
    let n = 512;
    // Biased toward mostly-set bits so the AND fold exercises real masking
    // rather than degenerating to all-zero after a few elements.
    let data: Vec<u32> = (0..n).map(|_| rng.next_u32() | 0xffff_0000).collect();
    let expected = data.iter().fold(0xffff_ffffu32, |acc, &v| acc & v);

    let src = tensor(&ctx, &[n], &data);
    let dst = sentinel_u32(&ctx, &[]);

    reduce_and(&ctx, &dst, &src, &[0]).unwrap();
    ctx.poll().unwrap();

    assert_eq!(ctx.read_buffer(dst.buffer()).unwrap()[0], expected);
}
