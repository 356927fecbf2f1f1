//! # gridbin
//!
//! `gridbin` is a Rust library for binning axis-aligned integer boxes ("patches") onto a regular
//! N-dimensional grid, designed to be used in Rust as well as compiled to WebAssembly (WASM).
//! Every patch belongs to one input point. The library either counts, per grid cell, how many
//! patches overlap it, or groups the point indices by overlapped cell with a counting sort.
//!
//! ## Features
//!
//! - **N-dimensional**: Up to [`MAX_DIMS`] axes, flattened with row-major strides (last axis fastest).
//! - **Periodic grids**: Out-of-range coordinates wrap modulo the axis extent, however far outside.
//! - **Two passes, one loop**: Counting and grouping share the same patch rasterization.
//! - **CSR output**: Grouping yields a [`CellGroups`] offsets/indices pair for neighbor queries.
//! - **Checked and unchecked entry points**: Validate once up front, then run a bounds-check free hot loop.
//!
//! ## Example
//!
//! ```
//! use gridbin::{GridBinner, Patches};
//!
//! // One point whose patch covers cells (1,1), (1,2), (2,1), (2,2) of a 3x3 grid.
//! let binner = GridBinner::new(&[3, 3], false).unwrap();
//! let patches = Patches::new(2, &[1, 1], &[3, 3]).unwrap();
//!
//! let groups = binner.bin(&patches).unwrap();
//! assert_eq!(groups.cell(4), &[0]);
//! assert_eq!(groups.total(), 4);
//! ```
//!
//! ## Main Interface
//!
//! The primary entry point is the [`GridBinner`] struct. The free functions [`run`] and
//! [`run_unchecked`] expose the raw count/group contract on plain buffers.

mod binner;
mod error;
mod grid;
mod patches;
mod raster;
mod wasm;

/// Maximum number of grid axes.
pub const MAX_DIMS: usize = 32;

pub use binner::run;
pub use binner::run_unchecked;
pub use binner::CellGroups;
pub use binner::GridBinner;
pub use binner::Mode;
pub use error::BinError;
pub use grid::GridShape;
pub use patches::Patches;
pub use raster::for_each_cell;
pub use raster::for_each_overlap;
pub use wasm::GridBinnerWasm;
