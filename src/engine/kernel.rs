//! WGSL kernel-source generation and the generated kernel's uniform
//! argument layout.
//!
//! One generated kernel handles every rank up to [`MAX_RANK`] and every
//! axis permutation for a given `(operator, element type, threads-per-
//! reduction)` triple: axis counts, lengths, strides, and decomposition
//! weights are runtime uniform data, not baked into the shader text, so
//! the [`crate::device::Context`] pipeline cache stays small regardless of
//! how many distinct shapes a caller reduces.
//!
//! Grounded directly in `tensor/ops/reduce/min.rs`'s `MinReduceParams` /
//! `create_shader` pair: the padded `[[u32; 4]; MAX_RANK / 4]` argument
//! layout, the `get_input_dim`/`is_reduced`-style accessor functions, and
//! the unrolled shared-memory segment tree are all that kernel's pattern,
//! generalized from a single fixed reduction-per-workgroup to the
//! `reductions_per_block` launch shape [`crate::engine::plan::ReductionPlan`]
//! computes.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use bytemuck::{Pod, Zeroable};

use crate::element::Element;
use crate::engine::op::{BindingShape, Op};
use crate::engine::plan::{ReductionPlan, MAX_RANK, WORKGROUP_SIZE};
use crate::error::ReduceError;

const MAX_VEC4: usize = MAX_RANK / 4;

/// The uniform argument block every generated kernel binds, whatever its
/// operator or binding shape — unused fields (e.g. `free_dst_idx_stride`
/// for an operator with no index destination) simply go unread by the
/// shader text for that call.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct Params {
    m: u32,
    n: u32,
    free_rank: u32,
    reduced_rank: u32,
    reductions_per_block: u32,
    src_offset: u32,
    dst_offset: u32,
    dst_idx_offset: u32,
    free_len: [[u32; 4]; MAX_VEC4],
    free_weight: [[u32; 4]; MAX_VEC4],
    free_src_stride: [[i32; 4]; MAX_VEC4],
    free_dst_stride: [[i32; 4]; MAX_VEC4],
    free_dst_idx_stride: [[i32; 4]; MAX_VEC4],
    reduced_len: [[u32; 4]; MAX_VEC4],
    reduced_weight: [[u32; 4]; MAX_VEC4],
    reduced_src_stride: [[i32; 4]; MAX_VEC4],
}

fn pack_u32(values: impl Iterator<Item = usize>) -> Result<[[u32; 4]; MAX_VEC4], ReduceError> {
    let mut packed = [[0u32; 4]; MAX_VEC4];
    for (i, value) in values.enumerate() {
        let value = u32::try_from(value)
            .map_err(|_| ReduceError::BadShape("axis length or weight overflows u32".into()))?;
        packed[i / 4][i % 4] = value;
    }
    Ok(packed)
}

fn pack_i32(values: impl Iterator<Item = isize>) -> Result<[[i32; 4]; MAX_VEC4], ReduceError> {
    let mut packed = [[0i32; 4]; MAX_VEC4];
    for (i, value) in values.enumerate() {
        let value =
            i32::try_from(value).map_err(|_| ReduceError::BadShape("stride overflows i32".into()))?;
        packed[i / 4][i % 4] = value;
    }
    Ok(packed)
}

/// Builds the uniform argument block for one reduction call from its plan
/// and the per-tensor base element offsets.
pub(crate) fn build_params(
    plan: &ReductionPlan,
    src_offset: usize,
    dst_offset: usize,
    dst_idx_offset: usize,
) -> Result<Params, ReduceError> {
    let m = u32::try_from(plan.m).map_err(|_| ReduceError::BadShape("m overflows u32".into()))?;
    let n = u32::try_from(plan.n).map_err(|_| ReduceError::BadShape("n overflows u32".into()))?;
    let free_rank = u32::try_from(plan.free.len()).unwrap_or(0);
    let reduced_rank = u32::try_from(plan.reduced.len()).unwrap_or(0);

    Ok(Params {
        m,
        n,
        free_rank,
        reduced_rank,
        reductions_per_block: plan.reductions_per_block,
        src_offset: u32::try_from(src_offset)
            .map_err(|_| ReduceError::BadShape("src offset overflows u32".into()))?,
        dst_offset: u32::try_from(dst_offset)
            .map_err(|_| ReduceError::BadShape("dst offset overflows u32".into()))?,
        dst_idx_offset: u32::try_from(dst_idx_offset)
            .map_err(|_| ReduceError::BadShape("dst_idx offset overflows u32".into()))?,
        free_len: pack_u32(plan.free.iter().map(|a| a.length))?,
        free_weight: pack_u32(plan.free.iter().map(|a| a.weight))?,
        free_src_stride: pack_i32(plan.free.iter().map(|a| a.src_stride))?,
        free_dst_stride: pack_i32(plan.free.iter().map(|a| a.dst_stride))?,
        free_dst_idx_stride: pack_i32(plan.free.iter().map(|a| a.dst_idx_stride))?,
        reduced_len: pack_u32(plan.reduced.iter().map(|a| a.length))?,
        reduced_weight: pack_u32(plan.reduced.iter().map(|a| a.weight))?,
        reduced_src_stride: pack_i32(plan.reduced.iter().map(|a| a.src_stride))?,
    })
}

/// The FNV-1a hash of a kernel's structural signature: the operator, the
/// element type's WGSL spelling, and the thread count one reduction fibre
/// uses (which determines how many shared-memory tree-reduce steps the
/// shader text unrolls). Rank, shape, and stride data are runtime uniform
/// arguments, not part of the signature.
pub(crate) fn cache_key(op: Op, wgsl_type: &str, threads_per_reduction: u32) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    let mut mix = |bytes: &[u8]| {
        for &byte in bytes {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
    };
    mix(op.name().as_bytes());
    mix(b"|");
    mix(wgsl_type.as_bytes());
    mix(b"|");
    mix(&threads_per_reduction.to_le_bytes());
    hash
}

/// Generates the WGSL source for one `(operator, element type, threads-
/// per-reduction)` kernel signature.
pub(crate) fn generate_source<T: Element>(op: Op, threads_per_reduction: u32) -> String {
    let ty = T::wgsl_type();
    let reductions_per_block = WORKGROUP_SIZE / threads_per_reduction;

    let bindings = bindings_section(op, ty);
    let identity = identity_for(op, ty);
    let workgroup_vars = if threads_per_reduction == 1 {
        String::new()
    } else if op.tracks_index() {
        format!("var<workgroup> sdata: array<{ty}, {WORKGROUP_SIZE}u>;\nvar<workgroup> sidx: array<u32, {WORKGROUP_SIZE}u>;\n")
    } else {
        format!("var<workgroup> sdata: array<{ty}, {WORKGROUP_SIZE}u>;\n")
    };

    let helpers = helper_functions(op, ty);
    let load_and_combine = load_and_combine_section(op, ty);
    let tree_reduce = tree_reduce_section(op, ty, threads_per_reduction);
    let write_output = write_output_section(op, ty, threads_per_reduction);

    format!(
        r"
{bindings}

const MAX_VEC4: u32 = {max_vec4}u;
const TPR: u32 = {threads_per_reduction}u;
const RPB: u32 = {reductions_per_block}u;

{workgroup_vars}

fn get_free_len(i: u32) -> u32 {{ return params.free_len[i / 4u][i % 4u]; }}
fn get_free_weight(i: u32) -> u32 {{ return params.free_weight[i / 4u][i % 4u]; }}
fn get_free_src_stride(i: u32) -> i32 {{ return params.free_src_stride[i / 4u][i % 4u]; }}
fn get_free_dst_stride(i: u32) -> i32 {{ return params.free_dst_stride[i / 4u][i % 4u]; }}
fn get_free_dst_idx_stride(i: u32) -> i32 {{ return params.free_dst_idx_stride[i / 4u][i % 4u]; }}
fn get_reduced_len(i: u32) -> u32 {{ return params.reduced_len[i / 4u][i % 4u]; }}
fn get_reduced_weight(i: u32) -> u32 {{ return params.reduced_weight[i / 4u][i % 4u]; }}
fn get_reduced_src_stride(i: u32) -> i32 {{ return params.reduced_src_stride[i / 4u][i % 4u]; }}

{helpers}

@compute @workgroup_size({WORKGROUP_SIZE}u)
fn main(
    @builtin(local_invocation_id) lid: vec3<u32>,
    @builtin(workgroup_id) wid: vec3<u32>
) {{
    let tid = lid.x;
    let lane = tid % TPR;
    let sub = tid / TPR;
    let output_idx = wid.x * RPB + sub;
    let valid = output_idx < params.m;
    var safe_idx = output_idx;
    if !valid {{
        safe_idx = 0u;
    }}

    var src_base: i32 = i32(params.src_offset);
    var dst_base: i32 = i32(params.dst_offset);
    var dst_idx_base: i32 = i32(params.dst_idx_offset);
    for (var i = 0u; i < params.free_rank; i = i + 1u) {{
        let len = get_free_len(i);
        var coord = 0u;
        if len > 0u {{
            coord = (safe_idx / get_free_weight(i)) % len;
        }}
        let icoord = i32(coord);
        src_base = src_base + icoord * get_free_src_stride(i);
        dst_base = dst_base + icoord * get_free_dst_stride(i);
        dst_idx_base = dst_idx_base + icoord * get_free_dst_idx_stride(i);
    }}

    {identity}

    {load_and_combine}

    {tree_reduce}

    {write_output}
}}
",
        max_vec4 = MAX_VEC4,
    )
}

fn bindings_section(op: Op, ty: &str) -> String {
    match op.binding_shape() {
        BindingShape::ValueOnly => format!(
            "struct Params {{\n    m: u32,\n    n: u32,\n    free_rank: u32,\n    reduced_rank: u32,\n    reductions_per_block: u32,\n    src_offset: u32,\n    dst_offset: u32,\n    dst_idx_offset: u32,\n    free_len: array<vec4<u32>, MAX_VEC4>,\n    free_weight: array<vec4<u32>, MAX_VEC4>,\n    free_src_stride: array<vec4<i32>, MAX_VEC4>,\n    free_dst_stride: array<vec4<i32>, MAX_VEC4>,\n    free_dst_idx_stride: array<vec4<i32>, MAX_VEC4>,\n    reduced_len: array<vec4<u32>, MAX_VEC4>,\n    reduced_weight: array<vec4<u32>, MAX_VEC4>,\n    reduced_src_stride: array<vec4<i32>, MAX_VEC4>,\n}}\n\n@group(0) @binding(0) var<storage, read> src: array<{ty}>;\n@group(0) @binding(1) var<storage, read_write> dst: array<{ty}>;\n@group(0) @binding(2) var<uniform> params: Params;"
        ),
        BindingShape::IndexOnly => format!(
            "struct Params {{\n    m: u32,\n    n: u32,\n    free_rank: u32,\n    reduced_rank: u32,\n    reductions_per_block: u32,\n    src_offset: u32,\n    dst_offset: u32,\n    dst_idx_offset: u32,\n    free_len: array<vec4<u32>, MAX_VEC4>,\n    free_weight: array<vec4<u32>, MAX_VEC4>,\n    free_src_stride: array<vec4<i32>, MAX_VEC4>,\n    free_dst_stride: array<vec4<i32>, MAX_VEC4>,\n    free_dst_idx_stride: array<vec4<i32>, MAX_VEC4>,\n    reduced_len: array<vec4<u32>, MAX_VEC4>,\n    reduced_weight: array<vec4<u32>, MAX_VEC4>,\n    reduced_src_stride: array<vec4<i32>, MAX_VEC4>,\n}}\n\n@group(0) @binding(0) var<storage, read> src: array<{ty}>;\n@group(0) @binding(1) var<storage, read_write> dst_idx: array<u32>;\n@group(0) @binding(2) var<uniform> params: Params;"
        ),
        BindingShape::ValueAndIndex => format!(
            "struct Params {{\n    m: u32,\n    n: u32,\n    free_rank: u32,\n    reduced_rank: u32,\n    reductions_per_block: u32,\n    src_offset: u32,\n    dst_offset: u32,\n    dst_idx_offset: u32,\n    free_len: array<vec4<u32>, MAX_VEC4>,\n    free_weight: array<vec4<u32>, MAX_VEC4>,\n    free_src_stride: array<vec4<i32>, MAX_VEC4>,\n    free_dst_stride: array<vec4<i32>, MAX_VEC4>,\n    free_dst_idx_stride: array<vec4<i32>, MAX_VEC4>,\n    reduced_len: array<vec4<u32>, MAX_VEC4>,\n    reduced_weight: array<vec4<u32>, MAX_VEC4>,\n    reduced_src_stride: array<vec4<i32>, MAX_VEC4>,\n}}\n\n@group(0) @binding(0) var<storage, read> src: array<{ty}>;\n@group(0) @binding(1) var<storage, read_write> dst: array<{ty}>;\n@group(0) @binding(2) var<storage, read_write> dst_idx: array<u32>;\n@group(0) @binding(3) var<uniform> params: Params;"
        ),
    }
}

/// The WGSL literal an accumulator seeds from — the extremum sentinel for
/// the min/max family (provably equivalent to "seed from the first real
/// element", including NaN propagation, for every non-empty fibre; see
/// `DESIGN.md`), or the operator's algebraic identity otherwise.
fn identity_for(op: Op, ty: &str) -> String {
    let value = match op {
        Op::Sum | Op::Or | Op::Xor => wgsl_zero(ty),
        Op::Prod | Op::ProdNz => wgsl_one(ty),
        Op::And => wgsl_and_identity(ty),
        Op::Any => "0u",
        Op::All => "1u",
        Op::Max | Op::ArgMax | Op::MaxAndArgMax => wgsl_min_literal(ty),
        Op::Min | Op::ArgMin | Op::MinAndArgMin => wgsl_max_literal(ty),
    };

    if op.tracks_index() {
        format!("var acc: {ty} = {value};\n    var acc_idx: u32 = 0xffffffffu;")
    } else {
        format!("var acc: {ty} = {value};")
    }
}

fn wgsl_zero(ty: &str) -> &'static str {
    match ty {
        "f32" => "0.0",
        "i32" => "0i",
        _ => "0u",
    }
}

fn wgsl_one(ty: &str) -> &'static str {
    match ty {
        "f32" => "1.0",
        "i32" => "1i",
        _ => "1u",
    }
}

fn wgsl_and_identity(ty: &str) -> &'static str {
    match ty {
        "i32" => "-1i",
        _ => "0xffffffffu",
    }
}

fn wgsl_max_literal(ty: &str) -> &'static str {
    match ty {
        "f32" => "3.402823466e+38",
        "i32" => "0x7fffffffi",
        _ => "0xffffffffu",
    }
}

fn wgsl_min_literal(ty: &str) -> &'static str {
    match ty {
        "f32" => "-3.402823466e+38",
        "i32" => "(-0x7fffffffi - 1i)",
        _ => "0u",
    }
}

/// Helper functions referenced by the main body: the NaN-aware compare for
/// plain `Max`/`Min`, and the tie-breaking `b_wins` compare for the four
/// index-tracking operators.
fn helper_functions(op: Op, ty: &str) -> String {
    let is_float = ty == "f32";
    match op {
        Op::Max => combine_fn("combine_max", ty, true, is_float),
        Op::Min => combine_fn("combine_min", ty, false, is_float),
        _ if op.tracks_index() => b_wins_fn(ty, op.is_min_family(), is_float),
        _ => String::new(),
    }
}

fn combine_fn(name: &str, ty: &str, is_max: bool, is_float: bool) -> String {
    let builtin = if is_max { "max" } else { "min" };
    if is_float {
        format!(
            "fn {name}(a: {ty}, b: {ty}) -> {ty} {{\n    if a != a {{ return a; }}\n    if b != b {{ return b; }}\n    return {builtin}(a, b);\n}}"
        )
    } else {
        format!("fn {name}(a: {ty}, b: {ty}) -> {ty} {{ return {builtin}(a, b); }}")
    }
}

fn b_wins_fn(ty: &str, is_min_family: bool, is_float: bool) -> String {
    let (better, worse) = if is_min_family { ("<", ">") } else { (">", "<") };
    let nan_guard = if is_float {
        "if a_val != a_val { return false; }\n    if b_val != b_val { return true; }\n    "
    } else {
        ""
    };

    format!(
        "fn b_wins(a_val: {ty}, a_idx: u32, b_val: {ty}, b_idx: u32) -> bool {{\n    {nan_guard}if b_val {better} a_val {{ return true; }}\n    if b_val {worse} a_val {{ return false; }}\n    return b_idx < a_idx;\n}}"
    )
}

fn load_and_combine_section(op: Op, ty: &str) -> String {
    let src_offset_decode = "var src_off: i32 = 0;\n        for (var i = 0u; i < params.reduced_rank; i = i + 1u) {\n            let len = get_reduced_len(i);\n            var coord = 0u;\n            if len > 0u {\n                coord = (reduction_idx / get_reduced_weight(i)) % len;\n            }\n            src_off = src_off + i32(coord) * get_reduced_src_stride(i);\n        }\n        let elem = src[u32(src_base + src_off)];";

    let combine = match op {
        Op::Sum | Op::And | Op::Or | Op::Xor => {
            format!("acc = acc {} elem;", op.combine_operator())
        }
        Op::Prod => "acc = acc * elem;".into(),
        Op::ProdNz => format!(
            "var factor = elem;\n        if factor == {zero} {{ factor = {one}; }}\n        acc = acc * factor;",
            zero = wgsl_zero(ty),
            one = wgsl_one(ty)
        ),
        Op::Any => "if elem != 0u { acc = 1u; }".into(),
        Op::All => "if elem == 0u { acc = 0u; }".into(),
        Op::Max => "acc = combine_max(acc, elem);".into(),
        Op::Min => "acc = combine_min(acc, elem);".into(),
        Op::ArgMax | Op::ArgMin | Op::MaxAndArgMax | Op::MinAndArgMin => {
            "if b_wins(acc, acc_idx, elem, reduction_idx) {\n            acc = elem;\n            acc_idx = reduction_idx;\n        }".into()
        }
    };

    format!(
        "var reduction_idx = lane;\n    while reduction_idx < params.n {{\n        {src_offset_decode}\n        {combine}\n        reduction_idx = reduction_idx + TPR;\n    }}"
    )
}

fn tree_reduce_section(op: Op, ty: &str, threads_per_reduction: u32) -> String {
    if threads_per_reduction == 1 {
        return String::new();
    }

    let indexed = op.tracks_index();
    let mut steps = Vec::new();
    let mut half = threads_per_reduction / 2;
    while half >= 1 {
        let body = if indexed {
            format!(
                "if lane < {half}u {{\n        if b_wins(sdata[tid], sidx[tid], sdata[tid + {half}u], sidx[tid + {half}u]) {{\n            sdata[tid] = sdata[tid + {half}u];\n            sidx[tid] = sidx[tid + {half}u];\n        }}\n    }}\n    workgroupBarrier();"
            )
        } else {
            let combine = match op {
                Op::Max => format!("combine_max(sdata[tid], sdata[tid + {half}u])"),
                Op::Min => format!("combine_min(sdata[tid], sdata[tid + {half}u])"),
                Op::Any => format!("sdata[tid] | sdata[tid + {half}u]"),
                Op::All => format!("sdata[tid] & sdata[tid + {half}u]"),
                _ => format!("sdata[tid] {} sdata[tid + {half}u]", op.combine_operator()),
            };
            format!("if lane < {half}u {{ sdata[tid] = {combine}; }}\n    workgroupBarrier();")
        };
        steps.push(body);
        if half == 1 {
            break;
        }
        half /= 2;
    }

    let seed = if indexed {
        "sdata[tid] = acc;\n    sidx[tid] = acc_idx;\n    workgroupBarrier();".to_string()
    } else {
        let _ = ty;
        "sdata[tid] = acc;\n    workgroupBarrier();".to_string()
    };

    format!("{seed}\n    {}", steps.join("\n    "))
}

fn write_output_section(op: Op, _ty: &str, threads_per_reduction: u32) -> String {
    let (value_src, idx_src) = if threads_per_reduction == 1 {
        ("acc".to_string(), "acc_idx".to_string())
    } else {
        ("sdata[tid]".to_string(), "sidx[tid]".to_string())
    };
    let guard = if threads_per_reduction == 1 {
        "valid".to_string()
    } else {
        "lane == 0u && valid".to_string()
    };

    match op.binding_shape() {
        BindingShape::ValueOnly => {
            format!("if {guard} {{\n        dst[u32(dst_base)] = {value_src};\n    }}")
        }
        BindingShape::IndexOnly => {
            format!("if {guard} {{\n        dst_idx[u32(dst_idx_base)] = {idx_src};\n    }}")
        }
        BindingShape::ValueAndIndex => format!(
            "if {guard} {{\n        dst[u32(dst_base)] = {value_src};\n        dst_idx[u32(dst_idx_base)] = {idx_src};\n    }}"
        ),
    }
}
