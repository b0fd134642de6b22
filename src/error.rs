//! Error types for the reduction engine and its device layer.
//!
//! - [`Error`] — top-level error type returned by every public entry point.
//! - [`ReduceError`] — the nine validation/device error kinds a reduction call
//!   may fail with.

/// Top-level error type for GPU operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A reduction request was rejected, either during validation or during
    /// device execution.
    #[error(transparent)]
    Reduce(#[from] ReduceError),

    /// A device-layer operation (context creation, buffer allocation,
    /// mapping) failed outside of a specific reduction call.
    #[error("{0}")]
    Device(String),
}

/// Error kinds a reduction call may return.
///
/// Validation kinds (`BadRank` through `UnexpectedIndex`) are always detected
/// before any device work is submitted. The remaining kinds wrap the
/// underlying device failure text verbatim.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReduceError {
    /// `dst` rank is inconsistent with `src` rank minus the reduce count.
    #[error("bad rank: {0}")]
    BadRank(String),

    /// A reduce axis is out of range or repeated.
    #[error("bad axis: {0}")]
    BadAxis(String),

    /// Free-axis lengths of `src` do not match the axes of `dst`.
    #[error("bad shape: {0}")]
    BadShape(String),

    /// The operator/element-type combination is unsupported.
    #[error("bad type: {0}")]
    BadType(String),

    /// The operator requires an index destination that was not supplied.
    #[error("missing index: {0}")]
    MissingIndex(String),

    /// An index destination was supplied for an operator that does not
    /// produce one.
    #[error("unexpected index: {0}")]
    UnexpectedIndex(String),

    /// Scratch or uniform-buffer allocation failed on the device.
    #[error("device allocation failed: {0}")]
    DeviceAllocFail(String),

    /// The generated kernel source was rejected by the shader compiler.
    #[error("kernel compilation failed: {0}")]
    CompileFail(String),

    /// GPU submission of the reduction kernel was rejected.
    #[error("kernel launch failed: {0}")]
    LaunchFail(String),
}
