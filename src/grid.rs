use crate::error::BinError;
use crate::MAX_DIMS;

/// The shape of a regular N-dimensional grid.
///
/// Cells are flattened in row-major order: the last axis is the fastest varying one, so
/// `strides[ndim - 1] == 1` and `strides[j] == strides[j + 1] * dims[j + 1]`.
/// Extents and strides live in fixed-size arrays so that no heap allocation is needed per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridShape {
    ndim: usize,
    dims: [usize; MAX_DIMS],
    strides: [usize; MAX_DIMS],
    len: usize,
}

impl GridShape {
    /// Creates a new `GridShape` from the number of cells along each axis.
    pub fn new(dims: &[usize]) -> Result<Self, BinError> {
        let ndim = dims.len();
        if ndim == 0 {
            return Err(BinError::EmptyGrid);
        }
        if ndim > MAX_DIMS {
            return Err(BinError::TooManyDims { ndim, max: MAX_DIMS });
        }

        let mut shape_dims = [0usize; MAX_DIMS];
        let mut strides = [0usize; MAX_DIMS];
        let mut len = 1usize;
        for axis in (0..ndim).rev() {
            let extent = dims[axis];
            if extent == 0 {
                return Err(BinError::ZeroExtent { axis });
            }
            if extent > i32::MAX as usize {
                return Err(BinError::ExtentTooLarge { axis, extent });
            }
            shape_dims[axis] = extent;
            strides[axis] = len;
            len = len.checked_mul(extent).ok_or(BinError::TooManyCells)?;
        }

        Ok(GridShape {
            ndim,
            dims: shape_dims,
            strides,
            len,
        })
    }

    /// Number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Number of cells along each axis.
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims[..self.ndim]
    }

    /// Row-major strides of each axis.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides[..self.ndim]
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: a valid shape has at least one cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Wraps a coordinate into `[0, dims[axis])`, exact for any distance outside the range.
    #[inline]
    pub fn wrap(&self, axis: usize, coord: i32) -> usize {
        coord.rem_euclid(self.dims[axis] as i32) as usize
    }

    /// Calculates the linear index of the cell at the given in-range coordinates.
    pub fn linear_index(&self, coords: &[usize]) -> usize {
        debug_assert_eq!(coords.len(), self.ndim);
        coords
            .iter()
            .zip(self.strides())
            .map(|(&c, &s)| c * s)
            .sum()
    }

    /// Inverse of [`GridShape::linear_index`].
    pub fn unravel(&self, cell: usize) -> Vec<usize> {
        debug_assert!(cell < self.len);
        self.strides()
            .iter()
            .zip(self.dims())
            .map(|(&s, &d)| (cell / s) % d)
            .collect()
    }
}
