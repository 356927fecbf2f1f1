//! Error types for grid binning.
//!
//! Every variant is a violated precondition of the binning kernel, detected by the checked
//! entry points before the hot loop runs.

use thiserror::Error;

/// Errors reported by the validating entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BinError {
    /// The grid has no axes.
    #[error("grid must have at least one axis")]
    EmptyGrid,

    /// More axes than the fixed scratch capacity.
    #[error("grid has {ndim} axes, at most {max} are supported")]
    TooManyDims {
        /// Number of axes requested.
        ndim: usize,
        /// Maximum supported number of axes.
        max: usize,
    },

    /// An axis with zero cells.
    #[error("axis {axis} has zero extent")]
    ZeroExtent {
        /// The offending axis.
        axis: usize,
    },

    /// An axis extent that does not fit the `i32` coordinate space of patch bounds.
    #[error("axis {axis} extent {extent} exceeds the coordinate range")]
    ExtentTooLarge {
        /// The offending axis.
        axis: usize,
        /// The requested extent.
        extent: usize,
    },

    /// The total number of cells overflows `usize`.
    #[error("number of grid cells overflows")]
    TooManyCells,

    /// Left/right bound matrices do not form two `ndim x npoint` matrices.
    #[error("bound matrices of length {left} and {right} do not form two {ndim} x npoint matrices")]
    ShapeMismatch {
        /// Number of axes the matrices were interpreted with.
        ndim: usize,
        /// Length of the left bound matrix.
        left: usize,
        /// Length of the right bound matrix.
        right: usize,
    },

    /// Patches were built for a different number of axes than the grid has.
    #[error("patches have {got} axes, grid has {expected}")]
    DimsMismatch {
        /// Number of grid axes.
        expected: usize,
        /// Number of patch axes.
        got: usize,
    },

    /// A patch with `right < left` on some axis.
    #[error("patch of point {point} is inverted on axis {axis}: [{left}, {right})")]
    InvertedPatch {
        /// The offending point.
        point: usize,
        /// The offending axis.
        axis: usize,
        /// Lower bound.
        left: i32,
        /// Exclusive upper bound.
        right: i32,
    },

    /// A patch reaching outside the grid of a non-periodic binner.
    #[error("patch of point {point} on axis {axis} spans [{left}, {right}) outside [0, {extent})")]
    OutOfRange {
        /// The offending point.
        point: usize,
        /// The offending axis.
        axis: usize,
        /// Lower bound.
        left: i32,
        /// Exclusive upper bound.
        right: i32,
        /// Axis extent.
        extent: usize,
    },

    /// The counts buffer does not have one entry per grid cell.
    #[error("counts buffer has {got} entries, grid has {expected} cells")]
    CountsLength {
        /// Number of grid cells.
        expected: usize,
        /// Length of the counts buffer.
        got: usize,
    },

    /// The counts handed to a grouping pass disagree with the actual overlaps.
    #[error("cell {cell} is overlapped by {expected} patches but counts say {got}")]
    CountMismatch {
        /// First cell whose count is wrong.
        cell: usize,
        /// Actual number of overlapping patches.
        expected: usize,
        /// Count supplied by the caller.
        got: usize,
    },
}
