//! The fixed operator table.
//!
//! Each [`Op`] carries only the *static* facts the planner, kernel generator
//! and validation path need: whether it tracks a winning index, which
//! extremum family it belongs to, and which [`crate::element`] marker trait
//! the element type must satisfy.

/// One of the fixed set of associative reduction operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    /// `+`, identity 0.
    Sum,
    /// `*`, identity 1.
    Prod,
    /// `*` with zero elements substituted by the identity on load.
    ProdNz,
    /// Greatest element; NaN propagates for floats.
    Max,
    /// Least element; NaN propagates for floats.
    Min,
    /// Bitwise AND, identity all-ones.
    And,
    /// Bitwise OR, identity 0.
    Or,
    /// Bitwise XOR, identity 0.
    Xor,
    /// Logical OR over truthy elements, identity false.
    Any,
    /// Logical AND over truthy elements, identity true.
    All,
    /// Index of the greatest element (lowest index wins ties).
    ArgMax,
    /// Index of the least element (lowest index wins ties).
    ArgMin,
    /// Greatest element and its index, reduced as a pair.
    MaxAndArgMax,
    /// Least element and its index, reduced as a pair.
    MinAndArgMin,
}

impl Op {
    /// Stable name used in kernel labels, the cache key, and error messages.
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Prod => "prod",
            Self::ProdNz => "prodnz",
            Self::Max => "max",
            Self::Min => "min",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Any => "any",
            Self::All => "all",
            Self::ArgMax => "argmax",
            Self::ArgMin => "argmin",
            Self::MaxAndArgMax => "maxandargmax",
            Self::MinAndArgMin => "minandargmin",
        }
    }

    /// Whether this op belongs to the min/max family: seeds its accumulator
    /// from the first element assigned to each thread (rather than from a
    /// written identity) and propagates NaN for floating element types.
    pub(crate) fn is_extremum(self) -> bool {
        matches!(
            self,
            Self::Max | Self::Min | Self::ArgMax | Self::ArgMin | Self::MaxAndArgMax | Self::MinAndArgMin
        )
    }

    /// Whether ties/comparisons run in the `min` direction (`Min`, `ArgMin`,
    /// `MinAndArgMin`) rather than the `max` direction.
    pub(crate) fn is_min_family(self) -> bool {
        matches!(self, Self::Min | Self::ArgMin | Self::MinAndArgMin)
    }

    /// Whether this op writes a winning flat index to `dst_idx`.
    pub(crate) fn tracks_index(self) -> bool {
        matches!(
            self,
            Self::ArgMax | Self::ArgMin | Self::MaxAndArgMax | Self::MinAndArgMin
        )
    }

    /// Whether this op writes a reduced value to `dst`.
    ///
    /// `ArgMax`/`ArgMin` write only the index stream; every other op,
    /// including the paired `MaxAndArgMax`/`MinAndArgMin`, writes a value.
    pub(crate) fn writes_value(self) -> bool {
        !matches!(self, Self::ArgMax | Self::ArgMin)
    }

    /// Whether this is one of the truthy-test logical operators (`Any`,
    /// `All`), which combine via a nonzero test rather than an arithmetic
    /// or bitwise operator.
    pub(crate) fn is_logical(self) -> bool {
        matches!(self, Self::Any | Self::All)
    }

    /// The WGSL binary operator combining two accumulators, for operators
    /// that need neither the min/max extremum treatment nor the logical
    /// truthy-test treatment.
    pub(crate) fn combine_operator(self) -> &'static str {
        match self {
            Self::Sum => "+",
            Self::Prod | Self::ProdNz => "*",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            _ => unreachable!("combine_operator called on an extremum or logical op"),
        }
    }

    /// Which storage buffers the generated kernel binds, driven by whether
    /// the operator writes a value, a winning index, or both.
    pub(crate) fn binding_shape(self) -> BindingShape {
        match (self.writes_value(), self.tracks_index()) {
            (true, false) => BindingShape::ValueOnly,
            (false, true) => BindingShape::IndexOnly,
            (true, true) => BindingShape::ValueAndIndex,
            (false, false) => unreachable!("every operator writes a value, an index, or both"),
        }
    }
}

/// The shape of storage-buffer bindings a generated kernel declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingShape {
    /// `src` (binding 0), `dst` (binding 1), uniform `params` (binding 2).
    ValueOnly,
    /// `src` (binding 0), `dst_idx` (binding 1), uniform `params` (binding 2).
    IndexOnly,
    /// `src` (binding 0), `dst` (binding 1), `dst_idx` (binding 2), uniform
    /// `params` (binding 3).
    ValueAndIndex,
}
