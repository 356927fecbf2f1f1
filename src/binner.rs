use crate::error::BinError;
use crate::grid::GridShape;
use crate::patches::Patches;
use crate::raster::rasterize_all;

/// Selects the per-cell action of a binning pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Add one to the count of every overlapped cell.
    Count,
    /// Scatter point indices into per-cell buckets sized by previously computed counts.
    Group,
}

/// Point indices grouped by grid cell, in compressed sparse row layout.
///
/// The points overlapping cell `c` are `indices[offsets[c]..offsets[c + 1]]`, in increasing
/// point order. A point whose patch covers `c` several times (periodic patches longer than one
/// period) appears once per cover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellGroups {
    offsets: Vec<usize>,
    indices: Vec<usize>,
}

impl CellGroups {
    /// Start of each cell's bucket, plus the total length. `offsets[0] == 0`.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Point indices of all buckets, concatenated.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Points overlapping `cell`.
    pub fn cell(&self, cell: usize) -> &[usize] {
        &self.indices[self.offsets[cell]..self.offsets[cell + 1]]
    }

    /// Number of overlaps per cell.
    pub fn counts(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Number of grid cells.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of (point, cell) overlaps.
    pub fn total(&self) -> usize {
        self.indices.len()
    }

    /// Iterates over `(cell, points)` for every cell, empty ones included.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        (0..self.len()).map(move |c| (c, self.cell(c)))
    }

    /// Returns `(offsets, indices)`.
    pub fn into_parts(self) -> (Vec<usize>, Vec<usize>) {
        (self.offsets, self.indices)
    }
}

/// Bins patches onto a fixed grid.
///
/// A `GridBinner` holds the grid shape and the periodicity flag. The checked methods validate
/// their inputs once and then run the unchecked loop; the `_unchecked` methods skip validation.
///
/// Binning is usually done in two passes over the same patches: [`GridBinner::count`] into a
/// zeroed buffer, then [`GridBinner::group`] with the resulting counts. [`GridBinner::bin`] does both.
#[derive(Clone, Copy, Debug)]
pub struct GridBinner {
    shape: GridShape,
    periodic: bool,
}

impl GridBinner {
    /// Creates a new `GridBinner` for a grid with `dims` cells along each axis.
    ///
    /// With `periodic` set, patch coordinates outside `[0, dims[j])` wrap around on every axis.
    pub fn new(dims: &[usize], periodic: bool) -> Result<Self, BinError> {
        Ok(GridBinner {
            shape: GridShape::new(dims)?,
            periodic,
        })
    }

    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    pub fn periodic(&self) -> bool {
        self.periodic
    }

    /// Total number of grid cells.
    pub fn cells(&self) -> usize {
        self.shape.len()
    }

    /// Checks that every patch is well formed and, for a non-periodic grid, inside the grid.
    pub fn validate(&self, patches: &Patches) -> Result<(), BinError> {
        if patches.ndim() != self.shape.ndim() {
            return Err(BinError::DimsMismatch {
                expected: self.shape.ndim(),
                got: patches.ndim(),
            });
        }

        for point in 0..patches.npoint() {
            let mut empty = false;
            for axis in 0..patches.ndim() {
                let (left, right) = (patches.left(axis, point), patches.right(axis, point));
                if right < left {
                    return Err(BinError::InvertedPatch { point, axis, left, right });
                }
                empty |= left == right;
            }
            if self.periodic || empty {
                continue;
            }
            for (axis, &extent) in self.shape.dims().iter().enumerate() {
                let (left, right) = (patches.left(axis, point), patches.right(axis, point));
                if left < 0 || right as usize > extent {
                    return Err(BinError::OutOfRange { point, axis, left, right, extent });
                }
            }
        }
        Ok(())
    }

    fn check_counts_len(&self, len: usize) -> Result<(), BinError> {
        if len != self.shape.len() {
            return Err(BinError::CountsLength {
                expected: self.shape.len(),
                got: len,
            });
        }
        Ok(())
    }

    /// Adds the number of overlapping patches to the count of every cell.
    ///
    /// `counts` is accumulated into, not overwritten, so repeated calls add up.
    pub fn count(&self, counts: &mut [usize], patches: &Patches) -> Result<(), BinError> {
        self.check_counts_len(counts.len())?;
        self.validate(patches)?;
        unsafe { self.count_unchecked(counts, patches) };
        Ok(())
    }

    /// Groups point indices by overlapped cell.
    ///
    /// `counts` must hold the exact per-cell overlap counts of `patches`, as produced by
    /// [`GridBinner::count`] on a zeroed buffer. This is verified with a recount, so prefer
    /// [`GridBinner::bin`] when the counts are not needed separately.
    pub fn group(&self, counts: &[usize], patches: &Patches) -> Result<CellGroups, BinError> {
        self.check_counts_len(counts.len())?;
        self.validate(patches)?;

        let mut actual = vec![0usize; self.shape.len()];
        unsafe { self.count_unchecked(&mut actual, patches) };
        if let Some(cell) = (0..actual.len()).find(|&c| actual[c] != counts[c]) {
            log::trace!("counts rejected at cell {}", cell);
            return Err(BinError::CountMismatch {
                cell,
                expected: actual[cell],
                got: counts[cell],
            });
        }

        Ok(unsafe { self.group_unchecked(counts, patches) })
    }

    /// Counts and groups in one call.
    pub fn bin(&self, patches: &Patches) -> Result<CellGroups, BinError> {
        self.validate(patches)?;
        let mut counts = vec![0usize; self.shape.len()];
        unsafe {
            self.count_unchecked(&mut counts, patches);
            Ok(self.group_unchecked(&counts, patches))
        }
    }

    /// Unchecked version of [`GridBinner::count`].
    ///
    /// # Safety
    ///
    /// `counts.len()` must equal the number of cells and `patches` must pass
    /// [`GridBinner::validate`]. Otherwise the counts buffer is written out of bounds.
    pub unsafe fn count_unchecked(&self, counts: &mut [usize], patches: &Patches) {
        log::debug!(
            "counting {} patches on {} cells (periodic: {})",
            patches.npoint(),
            self.shape.len(),
            self.periodic
        );
        debug_assert_eq!(counts.len(), self.shape.len());

        unsafe {
            rasterize_all(&self.shape, self.periodic, patches, &mut |_, cell| {
                debug_assert!(cell < counts.len());
                *counts.get_unchecked_mut(cell) += 1;
            });
        }
    }

    /// Unchecked version of [`GridBinner::group`].
    ///
    /// # Safety
    ///
    /// Same as [`GridBinner::count_unchecked`], and `counts` must equal the exact per-cell
    /// overlap counts of `patches`. Otherwise the index buffer is written out of bounds.
    pub unsafe fn group_unchecked(&self, counts: &[usize], patches: &Patches) -> CellGroups {
        debug_assert_eq!(counts.len(), self.shape.len());

        // Exclusive prefix sum
        let mut offsets = Vec::with_capacity(counts.len() + 1);
        offsets.push(0);
        let mut sum = 0usize;
        for &count in counts {
            sum += count;
            offsets.push(sum);
        }
        log::debug!(
            "grouping {} patches into {} overlaps on {} cells (periodic: {})",
            patches.npoint(),
            sum,
            self.shape.len(),
            self.periodic
        );

        // Scatter, using a copy of the offsets as write cursors.
        let mut indices = vec![0usize; sum];
        let mut cursors = offsets[..counts.len()].to_vec();
        unsafe {
            rasterize_all(&self.shape, self.periodic, patches, &mut |point, cell| {
                debug_assert!(cell < cursors.len());
                let cursor = cursors.get_unchecked_mut(cell);
                debug_assert!(*cursor < offsets[cell + 1], "cell {} overflows its bucket", cell);
                *indices.get_unchecked_mut(*cursor) = point;
                *cursor += 1;
            });
        }
        debug_assert!(cursors.iter().zip(&offsets[1..]).all(|(c, o)| c == o));

        CellGroups { offsets, indices }
    }
}

/// Counts or groups patches on a grid of extents `dims`.
///
/// `left` and `right` are C-order `dims.len() x npoint` bound matrices (see [`Patches`]).
/// In [`Mode::Count`], `counts` is accumulated into and `None` is returned. In [`Mode::Group`],
/// `counts` must hold the exact overlap counts and the grouped point indices are returned;
/// the matching offsets are the exclusive prefix sum of `counts`.
///
/// All preconditions are validated before any buffer is touched.
pub fn run(
    mode: Mode,
    counts: &mut [usize],
    dims: &[usize],
    left: &[i32],
    right: &[i32],
    periodic: bool,
) -> Result<Option<Vec<usize>>, BinError> {
    let binner = GridBinner::new(dims, periodic)?;
    let patches = Patches::new(dims.len(), left, right)?;
    match mode {
        Mode::Count => binner.count(counts, &patches).map(|_| None),
        Mode::Group => binner.group(counts, &patches).map(|g| Some(g.into_parts().1)),
    }
}

/// [`run`] without per-patch validation.
///
/// Grid extents and matrix shapes are still checked, as that costs nothing per point.
///
/// # Safety
///
/// `counts.len()` must equal the number of cells, every patch must satisfy `left <= right`,
/// non-periodic patches must lie inside the grid, and in [`Mode::Group`] `counts` must equal
/// the exact per-cell overlap counts. Violations write out of bounds.
pub unsafe fn run_unchecked(
    mode: Mode,
    counts: &mut [usize],
    dims: &[usize],
    left: &[i32],
    right: &[i32],
    periodic: bool,
) -> Result<Option<Vec<usize>>, BinError> {
    let binner = GridBinner::new(dims, periodic)?;
    let patches = Patches::new(dims.len(), left, right)?;
    unsafe {
        match mode {
            Mode::Count => {
                binner.count_unchecked(counts, &patches);
                Ok(None)
            }
            Mode::Group => Ok(Some(binner.group_unchecked(counts, &patches).into_parts().1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_then_group_3x3() {
        let binner = GridBinner::new(&[3, 3], false).unwrap();
        let patches = Patches::new(2, &[1, 1], &[3, 3]).unwrap();

        let mut counts = vec![0; 9];
        binner.count(&mut counts, &patches).unwrap();
        assert_eq!(counts, vec![0, 0, 0, 0, 1, 1, 0, 1, 1]);

        let groups = binner.group(&counts, &patches).unwrap();
        assert_eq!(groups.offsets(), &[0, 0, 0, 0, 0, 1, 2, 2, 3, 4]);
        assert_eq!(groups.indices(), &[0, 0, 0, 0]);
        for cell in [4, 5, 7, 8] {
            assert_eq!(groups.cell(cell), &[0]);
        }
        assert_eq!(groups.counts(), counts);
    }

    #[test]
    fn test_group_orders_by_point() {
        // Points 0 and 2 share cell 1; point 1 lands in cells 2 and 3.
        let left = [1, 2, 0];
        let right = [2, 4, 2];
        let binner = GridBinner::new(&[4], false).unwrap();
        let patches = Patches::new(1, &left, &right).unwrap();
        let groups = binner.bin(&patches).unwrap();

        assert_eq!(groups.cell(0), &[2]);
        assert_eq!(groups.cell(1), &[0, 2]);
        assert_eq!(groups.cell(2), &[1]);
        assert_eq!(groups.cell(3), &[1]);
        assert_eq!(groups.total(), patches.total_volume());
        assert_eq!(groups.len(), 4);
    }

    #[test]
    fn test_count_accumulates() {
        let binner = GridBinner::new(&[2, 2], true).unwrap();
        let patches = Patches::new(2, &[-1, 0], &[1, 1]).unwrap();
        let mut counts = vec![0; 4];
        binner.count(&mut counts, &patches).unwrap();
        binner.count(&mut counts, &patches).unwrap();
        assert_eq!(counts, vec![2, 0, 2, 0]);
    }

    #[test]
    fn test_validation_errors() {
        let binner = GridBinner::new(&[4, 4], false).unwrap();

        let inverted = Patches::new(2, &[0, 3], &[1, 2]).unwrap();
        assert_eq!(
            binner.validate(&inverted),
            Err(BinError::InvertedPatch { point: 0, axis: 1, left: 3, right: 2 })
        );

        let outside = Patches::new(2, &[0, 3], &[1, 5]).unwrap();
        assert_eq!(
            binner.validate(&outside),
            Err(BinError::OutOfRange { point: 0, axis: 1, left: 3, right: 5, extent: 4 })
        );

        // Empty patches never touch the grid, wherever they are.
        let empty = Patches::new(2, &[-7, 9], &[-7, 12]).unwrap();
        assert!(binner.validate(&empty).is_ok());

        let mut short = vec![0; 15];
        let inside = Patches::new(2, &[0, 0], &[1, 1]).unwrap();
        assert_eq!(
            binner.count(&mut short, &inside),
            Err(BinError::CountsLength { expected: 16, got: 15 })
        );

        let wrong = vec![0; 16];
        assert_eq!(
            binner.group(&wrong, &inside),
            Err(BinError::CountMismatch { cell: 0, expected: 1, got: 0 })
        );
    }

    #[test]
    fn test_periodic_accepts_any_range() {
        let binner = GridBinner::new(&[4, 4], true).unwrap();
        let outside = Patches::new(2, &[0, 3], &[1, 5]).unwrap();
        assert!(binner.validate(&outside).is_ok());
        let groups = binner.bin(&outside).unwrap();
        assert_eq!(groups.cell(3), &[0]);
        assert_eq!(groups.cell(0), &[0]);
    }

    #[test]
    fn test_run_contract() {
        let dims = [3, 3];
        let (left, right) = ([1, 1], [3, 3]);
        let mut counts = vec![0; 9];
        assert_eq!(run(Mode::Count, &mut counts, &dims, &left, &right, false), Ok(None));
        let indices = run(Mode::Group, &mut counts, &dims, &left, &right, false).unwrap();
        assert_eq!(indices, Some(vec![0, 0, 0, 0]));

        let mut unchecked = vec![0; 9];
        unsafe {
            run_unchecked(Mode::Count, &mut unchecked, &dims, &left, &right, false).unwrap();
        }
        assert_eq!(unchecked, counts);
    }
}
