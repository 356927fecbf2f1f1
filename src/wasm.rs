use crate::binner::{CellGroups, GridBinner};
use crate::error::BinError;
use crate::patches::Patches;
use js_sys::{Array, Uint32Array};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(typescript_custom_section)]
const TS_CONSTANTS_GRID: &'static str = r#"
export const MAX_DIMS = 32;
"#;

/// WASM wrapper for [`GridBinner`].
///
/// Buffers cross the boundary as typed arrays: counts, offsets and indices as `Uint32Array`,
/// patch bounds as `Int32Array` in axis-major `ndim x npoint` layout.
#[wasm_bindgen]
pub struct GridBinnerWasm {
    inner: GridBinner,
}

#[wasm_bindgen]
impl GridBinnerWasm {
    #[wasm_bindgen(constructor)]
    pub fn new(dims: Vec<u32>, periodic: bool) -> Result<GridBinnerWasm, JsValue> {
        let dims: Vec<usize> = dims.iter().map(|&d| d as usize).collect();
        let inner = GridBinner::new(&dims, periodic).map_err(to_js)?;
        Ok(GridBinnerWasm { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn ndim(&self) -> usize {
        self.inner.shape().ndim()
    }

    #[wasm_bindgen(getter)]
    pub fn cells(&self) -> usize {
        self.inner.cells()
    }

    #[wasm_bindgen(getter)]
    pub fn periodic(&self) -> bool {
        self.inner.periodic()
    }

    /// Accumulates per-cell overlap counts into `counts`.
    pub fn count(&self, counts: &mut [u32], left: &[i32], right: &[i32]) -> Result<(), JsValue> {
        count_u32(&self.inner, counts, left, right).map_err(to_js)
    }

    /// Groups point indices by cell, given the exact counts of a previous `count`.
    pub fn group(&self, counts: &[u32], left: &[i32], right: &[i32]) -> Result<Vec<u32>, JsValue> {
        group_u32(&self.inner, counts, left, right).map_err(to_js)
    }

    /// Exclusive prefix sum of `counts`, the bucket offsets matching `group`.
    pub fn offsets(counts: &[u32]) -> Vec<u32> {
        offsets_u32(counts)
    }

    /// Counts and groups in one call, returning `[offsets, indices]`.
    pub fn bin(&self, left: &[i32], right: &[i32]) -> Result<Array, JsValue> {
        let groups = bin_patches(&self.inner, left, right).map_err(to_js)?;
        let (offsets, indices) = to_u32(groups);
        let result = Array::new();
        result.push(&Uint32Array::from(&offsets[..]));
        result.push(&Uint32Array::from(&indices[..]));
        Ok(result)
    }
}

fn to_js(err: BinError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn patches<'a>(binner: &GridBinner, left: &'a [i32], right: &'a [i32]) -> Result<Patches<'a>, BinError> {
    Patches::new(binner.shape().ndim(), left, right)
}

fn count_u32(binner: &GridBinner, counts: &mut [u32], left: &[i32], right: &[i32]) -> Result<(), BinError> {
    let mut wide: Vec<usize> = counts.iter().map(|&c| c as usize).collect();
    binner.count(&mut wide, &patches(binner, left, right)?)?;
    for (c, w) in counts.iter_mut().zip(wide) {
        *c = w as u32;
    }
    Ok(())
}

fn group_u32(binner: &GridBinner, counts: &[u32], left: &[i32], right: &[i32]) -> Result<Vec<u32>, BinError> {
    let wide: Vec<usize> = counts.iter().map(|&c| c as usize).collect();
    let groups = binner.group(&wide, &patches(binner, left, right)?)?;
    Ok(to_u32(groups).1)
}

fn bin_patches(binner: &GridBinner, left: &[i32], right: &[i32]) -> Result<CellGroups, BinError> {
    binner.bin(&patches(binner, left, right)?)
}

fn offsets_u32(counts: &[u32]) -> Vec<u32> {
    let mut offsets = Vec::with_capacity(counts.len() + 1);
    offsets.push(0);
    let mut sum = 0u32;
    for &c in counts {
        sum += c;
        offsets.push(sum);
    }
    offsets
}

fn to_u32(groups: CellGroups) -> (Vec<u32>, Vec<u32>) {
    let (offsets, indices) = groups.into_parts();
    (
        offsets.into_iter().map(|o| o as u32).collect(),
        indices.into_iter().map(|i| i as u32).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_buffers() {
        let binner = GridBinner::new(&[3, 3], false).unwrap();
        let (left, right) = ([1, 1], [3, 3]);

        let mut counts = vec![0u32; 9];
        count_u32(&binner, &mut counts, &left, &right).unwrap();
        assert_eq!(counts, vec![0, 0, 0, 0, 1, 1, 0, 1, 1]);

        assert_eq!(offsets_u32(&counts), vec![0, 0, 0, 0, 0, 1, 2, 2, 3, 4]);
        assert_eq!(group_u32(&binner, &counts, &left, &right).unwrap(), vec![0, 0, 0, 0]);

        let (offsets, indices) = to_u32(bin_patches(&binner, &left, &right).unwrap());
        assert_eq!(offsets, offsets_u32(&counts));
        assert_eq!(indices, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_u32_errors() {
        let binner = GridBinner::new(&[3, 3], false).unwrap();
        let mut counts = vec![0u32; 9];
        assert!(matches!(
            count_u32(&binner, &mut counts, &[1, 1, 1], &[3, 3, 3]),
            Err(BinError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            group_u32(&binner, &counts, &[1, 1], &[3, 3]),
            Err(BinError::CountMismatch { .. })
        ));
    }
}
