//! Element type registry for GPU-compatible tensor element types.
//!
//! [`Element`] is the root of a small marker-trait hierarchy describing what
//! the reduction engine needs to know about a type to generate and drive a
//! kernel for it: its WGSL spelling, its `wgsl_zero`/`wgsl_one`/`wgsl_max`/
//! `wgsl_min` literals (used as operator identities and as min/max seed
//! sentinels), and the conversion between the Rust-side logical type and its
//! GPU buffer representation (`Native`).
//!
//! `Native` is usually `Self` — `f32`, `i32` and `u32` are stored exactly as
//! they are used. `bool` is the one exception: `bool` is not a plain-old-data
//! type (not every bit pattern of its size is a valid `bool`), so it is
//! backed by a `u32` in device buffers, with `0` meaning `false` and any
//! nonzero value meaning `true`.

use bytemuck::{Pod, Zeroable};

/// Trait for GPU-compatible element types.
///
/// Implemented for `f32`, `i32`, `u32` and `bool`.
pub trait Element: Copy + Clone + 'static {
    /// The type actually stored in a GPU buffer for this element.
    type Native: Pod + Zeroable + Copy + Send + Sync + 'static;

    /// Size in bytes of the native GPU representation.
    const NATIVE_SIZE: usize;

    /// Returns the WGSL type name used to declare buffers and locals.
    fn wgsl_type() -> &'static str;

    /// Returns the WGSL literal for the additive/logical-false identity.
    fn wgsl_zero() -> &'static str;

    /// Returns the WGSL literal for the multiplicative/logical-true identity.
    fn wgsl_one() -> &'static str;

    /// Returns the WGSL literal for the largest representable value.
    fn wgsl_max() -> &'static str;

    /// Returns the WGSL literal for the smallest representable value.
    fn wgsl_min() -> &'static str;

    /// Converts from the native GPU representation to the logical type.
    fn from_native(native: Self::Native) -> Self;

    /// Converts the logical value to its native GPU representation.
    fn to_native(self) -> Self::Native;
}

/// Marker trait for element types the arithmetic operators (`sum`, `prod`,
/// `prodnz`, `max`, `min`) and the argument-returning operators accept.
pub trait NumericElement: Element<Native = Self> {}

/// Marker trait for floating-point element types.
pub trait FloatElement: NumericElement {
    /// Converts from an `f64` host value, narrowing as needed.
    fn from_f64(value: f64) -> Self;

    /// Converts to an `f64` host value, widening as needed.
    fn to_f64(self) -> f64;
}

/// Marker trait for signed element types.
pub trait SignedElement: NumericElement {}

/// Marker trait for integer element types accepted by the bitwise operators
/// (`and`, `or`, `xor`).
pub trait IntegerElement: NumericElement {}

/// Marker trait for element types accepted by the logical operators (`any`,
/// `all`), where any nonzero value is truthy.
pub trait LogicalElement: Element {}

impl Element for f32 {
    type Native = f32;

    const NATIVE_SIZE: usize = 4;

    #[inline]
    fn wgsl_type() -> &'static str {
        "f32"
    }

    #[inline]
    fn wgsl_zero() -> &'static str {
        "0.0"
    }

    #[inline]
    fn wgsl_one() -> &'static str {
        "1.0"
    }

    #[inline]
    fn wgsl_max() -> &'static str {
        "3.402823466e+38"
    }

    #[inline]
    fn wgsl_min() -> &'static str {
        "-3.402823466e+38"
    }

    #[inline]
    fn from_native(native: Self::Native) -> Self {
        native
    }

    #[inline]
    fn to_native(self) -> Self::Native {
        self
    }
}

impl NumericElement for f32 {}
impl SignedElement for f32 {}

impl FloatElement for f32 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Element for i32 {
    type Native = i32;

    const NATIVE_SIZE: usize = 4;

    #[inline]
    fn wgsl_type() -> &'static str {
        "i32"
    }

    #[inline]
    fn wgsl_zero() -> &'static str {
        "0i"
    }

    #[inline]
    fn wgsl_one() -> &'static str {
        "1i"
    }

    #[inline]
    fn wgsl_max() -> &'static str {
        "0x7fffffffi"
    }

    #[inline]
    fn wgsl_min() -> &'static str {
        "(-0x7fffffffi - 1i)"
    }

    #[inline]
    fn from_native(native: Self::Native) -> Self {
        native
    }

    #[inline]
    fn to_native(self) -> Self::Native {
        self
    }
}

impl NumericElement for i32 {}
impl SignedElement for i32 {}
impl IntegerElement for i32 {}

impl Element for u32 {
    type Native = u32;

    const NATIVE_SIZE: usize = 4;

    #[inline]
    fn wgsl_type() -> &'static str {
        "u32"
    }

    #[inline]
    fn wgsl_zero() -> &'static str {
        "0u"
    }

    #[inline]
    fn wgsl_one() -> &'static str {
        "1u"
    }

    #[inline]
    fn wgsl_max() -> &'static str {
        "0xffffffffu"
    }

    #[inline]
    fn wgsl_min() -> &'static str {
        "0u"
    }

    #[inline]
    fn from_native(native: Self::Native) -> Self {
        native
    }

    #[inline]
    fn to_native(self) -> Self::Native {
        self
    }
}

impl NumericElement for u32 {}
impl IntegerElement for u32 {}
impl LogicalElement for u32 {}

impl Element for bool {
    type Native = u32;

    const NATIVE_SIZE: usize = 4;

    #[inline]
    fn wgsl_type() -> &'static str {
        "u32"
    }

    #[inline]
    fn wgsl_zero() -> &'static str {
        "0u"
    }

    #[inline]
    fn wgsl_one() -> &'static str {
        "1u"
    }

    #[inline]
    fn wgsl_max() -> &'static str {
        "0xffffffffu"
    }

    #[inline]
    fn wgsl_min() -> &'static str {
        "0u"
    }

    #[inline]
    fn from_native(native: Self::Native) -> Self {
        native != 0
    }

    #[inline]
    fn to_native(self) -> Self::Native {
        u32::from(self)
    }
}

impl LogicalElement for bool {}
