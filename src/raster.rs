use crate::error::BinError;
use crate::grid::GridShape;
use crate::patches::Patches;
use crate::MAX_DIMS;

/// Visits the linear index of every cell covered by the patch of `point`.
///
/// Cells are visited in row-major order of the patch box (last axis fastest). With `periodic`
/// set, coordinates outside the grid wrap around; otherwise they must already lie inside the
/// grid. A patch that spans more than one period visits the same cell more than once.
///
/// # Panics
///
/// Panics if `point` is out of range. Debug builds also panic on an out-of-range coordinate
/// of a non-periodic grid.
pub fn for_each_cell<F>(
    shape: &GridShape,
    periodic: bool,
    patches: &Patches,
    point: usize,
    visit: F,
) -> Result<(), BinError>
where
    F: FnMut(usize),
{
    check_dims(shape, patches)?;
    assert!(point < patches.npoint(), "point {} out of range", point);
    unsafe { rasterize(shape, periodic, patches, point, visit) };
    Ok(())
}

/// Visits every `(point, cell)` overlap of the batch, points in index order.
///
/// See [`for_each_cell`] for the traversal order within one patch.
pub fn for_each_overlap<F>(
    shape: &GridShape,
    periodic: bool,
    patches: &Patches,
    mut visit: F,
) -> Result<(), BinError>
where
    F: FnMut(usize, usize),
{
    check_dims(shape, patches)?;
    unsafe { rasterize_all(shape, periodic, patches, &mut visit) };
    Ok(())
}

fn check_dims(shape: &GridShape, patches: &Patches) -> Result<(), BinError> {
    if shape.ndim() != patches.ndim() {
        return Err(BinError::DimsMismatch {
            expected: shape.ndim(),
            got: patches.ndim(),
        });
    }
    Ok(())
}

/// Runs [`rasterize`] for every point.
///
/// # Safety
///
/// `patches.ndim()` must equal `shape.ndim()`.
#[inline]
pub(crate) unsafe fn rasterize_all<F>(shape: &GridShape, periodic: bool, patches: &Patches, visit: &mut F)
where
    F: FnMut(usize, usize),
{
    for point in 0..patches.npoint() {
        unsafe { rasterize(shape, periodic, patches, point, |cell| visit(point, cell)) };
    }
}

/// Odometer walk over the patch box of one point.
///
/// Inverted patches are treated as empty.
///
/// # Safety
///
/// `patches.ndim()` must equal `shape.ndim()` and `point < patches.npoint()`.
#[inline]
pub(crate) unsafe fn rasterize<F>(shape: &GridShape, periodic: bool, patches: &Patches, point: usize, mut visit: F)
where
    F: FnMut(usize),
{
    let ndim = shape.ndim();
    let dims = shape.dims();
    let strides = shape.strides();
    debug_assert_eq!(ndim, patches.ndim());

    let mut cursor = [0i32; MAX_DIMS];
    let mut left = [0i32; MAX_DIMS];
    let mut right = [0i32; MAX_DIMS];
    for axis in 0..ndim {
        let (l, r) = unsafe { (patches.left_unchecked(axis, point), patches.right_unchecked(axis, point)) };
        debug_assert!(l <= r, "inverted patch for point {} on axis {}", point, axis);
        if l >= r {
            return;
        }
        left[axis] = l;
        right[axis] = r;
        cursor[axis] = l;
    }

    loop {
        let mut target = 0usize;
        for axis in 0..ndim {
            let coord = if periodic {
                shape.wrap(axis, cursor[axis])
            } else {
                debug_assert!(
                    cursor[axis] >= 0 && (cursor[axis] as usize) < dims[axis],
                    "coordinate {} outside axis {} of extent {}",
                    cursor[axis],
                    axis,
                    dims[axis]
                );
                cursor[axis] as usize
            };
            target = target.wrapping_add(coord.wrapping_mul(strides[axis]));
        }
        visit(target);

        // Advance the last axis and carry towards the first.
        let mut axis = ndim - 1;
        loop {
            cursor[axis] += 1;
            if cursor[axis] < right[axis] {
                break;
            }
            cursor[axis] = left[axis];
            if axis == 0 {
                return;
            }
            axis -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells_of(dims: &[usize], periodic: bool, left: &[i32], right: &[i32]) -> Vec<usize> {
        let shape = GridShape::new(dims).unwrap();
        let patches = Patches::new(dims.len(), left, right).unwrap();
        let mut cells = Vec::new();
        for_each_cell(&shape, periodic, &patches, 0, |c| cells.push(c)).unwrap();
        cells
    }

    #[test]
    fn test_row_major_visit_order() {
        assert_eq!(cells_of(&[3, 3], false, &[1, 1], &[3, 3]), vec![4, 5, 7, 8]);
        assert_eq!(cells_of(&[2, 2, 2], false, &[0, 0, 0], &[2, 2, 2]), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_patch_visits_nothing() {
        assert!(cells_of(&[4, 4], false, &[1, 2], &[3, 2]).is_empty());
        assert!(cells_of(&[4], true, &[-3], &[-3]).is_empty());
    }

    #[test]
    fn test_periodic_wraparound() {
        assert_eq!(cells_of(&[5], true, &[-2], &[3]), vec![3, 4, 0, 1, 2]);
        assert_eq!(cells_of(&[5], true, &[-12], &[-10]), vec![3, 4]);
        // Longer than one period: every cell once, then again.
        assert_eq!(cells_of(&[2], true, &[0], &[4]), vec![0, 1, 0, 1]);
        // Wrapping on the leading axis of a 2D grid.
        assert_eq!(cells_of(&[3, 2], true, &[2, 1], &[4, 2]), vec![5, 1]);
    }

    #[test]
    fn test_overlap_point_order() {
        let shape = GridShape::new(&[4]).unwrap();
        let left = [2, 0];
        let right = [4, 1];
        let patches = Patches::new(1, &left, &right).unwrap();
        let mut pairs = Vec::new();
        for_each_overlap(&shape, false, &patches, |p, c| pairs.push((p, c))).unwrap();
        assert_eq!(pairs, vec![(0, 2), (0, 3), (1, 0)]);
    }

    #[test]
    fn test_dims_mismatch() {
        let shape = GridShape::new(&[4, 4]).unwrap();
        let patches = Patches::new(1, &[0], &[1]).unwrap();
        assert_eq!(
            for_each_overlap(&shape, false, &patches, |_, _| {}),
            Err(BinError::DimsMismatch { expected: 2, got: 1 })
        );
    }
}
