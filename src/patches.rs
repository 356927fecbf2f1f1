use crate::error::BinError;

/// A borrowed batch of axis-aligned integer boxes, one per point.
///
/// `left` and `right` are C-order `ndim x npoint` matrices: the bounds of point `i` on axis `j`
/// are `left[j * npoint + i]` and `right[j * npoint + i]`, describing the half-open box
/// `[left, right)`. A zero-size axis gives an empty patch that overlaps no cell.
#[derive(Clone, Copy, Debug)]
pub struct Patches<'a> {
    ndim: usize,
    npoint: usize,
    left: &'a [i32],
    right: &'a [i32],
}

impl<'a> Patches<'a> {
    /// Wraps two bound matrices with `ndim` rows each.
    pub fn new(ndim: usize, left: &'a [i32], right: &'a [i32]) -> Result<Self, BinError> {
        let mismatch = BinError::ShapeMismatch {
            ndim,
            left: left.len(),
            right: right.len(),
        };
        if ndim == 0 || left.len() != right.len() || left.len() % ndim != 0 {
            return Err(mismatch);
        }
        Ok(Patches {
            ndim,
            npoint: left.len() / ndim,
            left,
            right,
        })
    }

    /// Number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Number of points (patches).
    #[inline]
    pub fn npoint(&self) -> usize {
        self.npoint
    }

    /// Lower bound of `point` on `axis`.
    #[inline]
    pub fn left(&self, axis: usize, point: usize) -> i32 {
        self.left[axis * self.npoint + point]
    }

    /// Exclusive upper bound of `point` on `axis`.
    #[inline]
    pub fn right(&self, axis: usize, point: usize) -> i32 {
        self.right[axis * self.npoint + point]
    }

    #[inline]
    pub(crate) unsafe fn left_unchecked(&self, axis: usize, point: usize) -> i32 {
        debug_assert!(axis < self.ndim && point < self.npoint);
        unsafe { *self.left.get_unchecked(axis * self.npoint + point) }
    }

    #[inline]
    pub(crate) unsafe fn right_unchecked(&self, axis: usize, point: usize) -> i32 {
        debug_assert!(axis < self.ndim && point < self.npoint);
        unsafe { *self.right.get_unchecked(axis * self.npoint + point) }
    }

    /// Number of grid cells the patch of `point` covers, counting wrapped repeats.
    ///
    /// Inverted patches count as empty.
    pub fn volume(&self, point: usize) -> usize {
        (0..self.ndim)
            .map(|axis| (self.right(axis, point) as i64 - self.left(axis, point) as i64).max(0) as usize)
            .product()
    }

    /// Total number of (point, cell) overlap pairs of the batch.
    pub fn total_volume(&self) -> usize {
        (0..self.npoint).map(|i| self.volume(i)).sum()
    }
}
