use std::mem::size_of;

use bitvec::vec::BitVec;
use thiserror::Error;

use crate::voxel_grid::geometry::Vec3;

/// Largest voxel count whose per-voxel energy arrays can still be addressed.
const MAX_VOXELS: usize = isize::MAX as usize / size_of::<f64>();

/// Configuration failures of the scoring grid. These are the only fatal errors
/// of the core; everything at runtime is clamped or dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
	#[error("voxel pitch must be positive and finite, got ({dx}, {dy}, {dz})")]
	InvalidPitch { dx: f64, dy: f64, dz: f64 },
	#[error("invalid grid dimensions {nx} x {ny} x {nz}")]
	InvalidDimensions { nx: i64, ny: i64, nz: i64 },
	#[error("grid of {nx} x {ny} x {nz} voxels is too large")]
	TooManyVoxels { nx: f64, ny: f64, nz: f64 },
}

/// Integer voxel address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Index3 {
	pub ix: usize,
	pub iy: usize,
	pub iz: usize,
}

impl Index3 {
	pub fn new(ix: usize, iy: usize, iz: usize) -> Self {
		Self { ix, iy, iz }
	}

	/// Manhattan (taxicab) distance between two voxels.
	pub fn manhattan(&self, other: &Index3) -> usize {
		self.ix.abs_diff(other.ix) + self.iy.abs_diff(other.iy) + self.iz.abs_diff(other.iz)
	}
}

/// 3D energy-deposition accumulator over an axis-aligned box `[min, max)`.
///
/// Holds the per-run and per-event energy of every voxel plus the list of voxels
/// touched during the current event, in the order they were first touched.
#[derive(Clone, Debug)]
pub struct EdepGrid {
	pub(super) nx: usize,  // Number of voxels along X
	pub(super) ny: usize,  // Number of voxels along Y
	pub(super) nz: usize,  // Number of voxels along Z
	pub(super) total_voxels: usize,
	pub(super) min: Vec3,
	pub(super) max: Vec3,
	pub(super) dx: f64,
	pub(super) dy: f64,
	pub(super) dz: f64,
	pub(super) seed: Index3,
	pub(super) edep_run: Vec<f64>,
	pub(super) edep_event: Vec<f64>,
	pub(super) touched_flags: BitVec,  // 1-bit per voxel
	pub(super) touched: Vec<usize>,
}

impl EdepGrid {
	/// Build a grid over `[min, max)` with voxel pitch `(dx, dy, dz)`.
	///
	/// All accumulators start at zero and the seed voxel is placed at the
	/// geometric centre `(nx/2, ny/2, nz/2)`.
	pub fn configure(min: Vec3, max: Vec3, dx: f64, dy: f64, dz: f64) -> Result<Self, GridError> {
		let pitch_ok = |d: f64| d.is_finite() && d > 0.0;
		if !(pitch_ok(dx) && pitch_ok(dy) && pitch_ok(dz)) {
			return Err(GridError::InvalidPitch { dx, dy, dz });
		}

		let nx = calculate_dimension(min.x, max.x, dx);
		let ny = calculate_dimension(min.y, max.y, dy);
		let nz = calculate_dimension(min.z, max.z, dz);
		// NaN spans fail this test too.
		if !(nx >= 1.0 && ny >= 1.0 && nz >= 1.0) {
			return Err(GridError::InvalidDimensions {
				nx: nx as i64,
				ny: ny as i64,
				nz: nz as i64,
			});
		}
		let too_many = GridError::TooManyVoxels { nx, ny, nz };
		if nx > MAX_VOXELS as f64 || ny > MAX_VOXELS as f64 || nz > MAX_VOXELS as f64 {
			return Err(too_many);
		}
		let (nx, ny, nz) = (nx as usize, ny as usize, nz as usize);
		let total_voxels = match nx.checked_mul(ny).and_then(|n| n.checked_mul(nz)) {
			Some(n) if n <= MAX_VOXELS => n,
			_ => return Err(too_many),
		};

		log::debug!(
			"configured scoring grid {} x {} x {} ({} voxels)",
			nx, ny, nz, total_voxels
		);

		Ok(Self {
			nx,
			ny,
			nz,
			total_voxels,
			min,
			max,
			dx,
			dy,
			dz,
			seed: Index3::new(nx / 2, ny / 2, nz / 2),
			edep_run: vec![0.0; total_voxels],
			edep_event: vec![0.0; total_voxels],
			touched_flags: BitVec::repeat(false, total_voxels),
			touched: Vec::new(),
		})
	}
}

/// Voxels needed to cover `[min, max)`: `ceil((max - min) / pitch)`.
fn calculate_dimension(min: f64, max: f64, pitch: f64) -> f64 {
	((max - min) / pitch).ceil()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dimensions_round_up_partial_voxels() {
		let grid = EdepGrid::configure(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 5.0, 2.5), 1.0, 2.0, 1.0).unwrap();
		assert_eq!((grid.nx(), grid.ny(), grid.nz()), (10, 3, 3));
		assert_eq!(grid.total_voxels(), 90);
		assert_eq!(grid.seed_index(), Index3::new(5, 1, 1));
	}

	#[test]
	fn pad_geometry_has_no_sliver_voxel() {
		let grid = EdepGrid::configure(Vec3::new(-2500.0, -2500.0, -10.0), Vec3::new(2500.0, 2500.0, 0.0), 50.0, 50.0, 1.0).unwrap();
		assert_eq!((grid.nx(), grid.ny(), grid.nz()), (100, 100, 10));
	}

	#[test]
	fn partial_voxels_are_never_dropped() {
		let grid = EdepGrid::configure(Vec3::new(0.0, 0.0, 0.0), Vec3::new(3.0000000005, 1.0, 5.0e-10), 1.0, 1.0, 1.0).unwrap();
		assert_eq!((grid.nx(), grid.ny(), grid.nz()), (4, 1, 1));
		assert!(grid.contains(Vec3::new(3.0000000001, 0.5, 0.0)));
		assert_eq!(grid.to_index(Vec3::new(3.0000000001, 0.5, 0.0)), Index3::new(3, 0, 0));
	}

	#[test]
	fn oversized_grids_are_rejected() {
		let lo = Vec3::new(0.0, 0.0, 0.0);
		let err = EdepGrid::configure(lo, Vec3::new(1.0e7, 1.0e7, 1.0e6), 1.0, 1.0, 1.0).unwrap_err();
		assert!(matches!(err, GridError::TooManyVoxels { .. }));

		let side = 4_294_967_296.0;
		let err = EdepGrid::configure(lo, Vec3::new(side, side, 1.0), 1.0, 1.0, 1.0).unwrap_err();
		assert!(matches!(err, GridError::TooManyVoxels { .. }));

		let err = EdepGrid::configure(lo, Vec3::new(1.0, 1.0, 1.0), 1.0e-300, 1.0, 1.0).unwrap_err();
		assert!(matches!(err, GridError::TooManyVoxels { .. }));
	}

	#[test]
	fn non_finite_bounds_are_rejected() {
		let lo = Vec3::new(0.0, 0.0, 0.0);
		let err = EdepGrid::configure(lo, Vec3::new(f64::NAN, 1.0, 1.0), 1.0, 1.0, 1.0).unwrap_err();
		assert!(matches!(err, GridError::InvalidDimensions { nx: 0, .. }));
		let err = EdepGrid::configure(lo, Vec3::new(f64::INFINITY, 1.0, 1.0), 1.0, 1.0, 1.0).unwrap_err();
		assert!(matches!(err, GridError::TooManyVoxels { .. }));
	}

	#[test]
	fn empty_box_is_rejected() {
		let err = EdepGrid::configure(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 1.0), 1.0, 1.0, 1.0).unwrap_err();
		assert!(matches!(err, GridError::InvalidDimensions { ny: 0, .. }));
	}

	#[test]
	fn inverted_box_is_rejected() {
		let err = EdepGrid::configure(Vec3::new(0.0, 0.0, 0.0), Vec3::new(-4.0, 1.0, 1.0), 1.0, 1.0, 1.0).unwrap_err();
		assert!(matches!(err, GridError::InvalidDimensions { .. }));
	}

	#[test]
	fn non_positive_pitch_is_rejected() {
		let lo = Vec3::new(0.0, 0.0, 0.0);
		let hi = Vec3::new(1.0, 1.0, 1.0);
		assert!(matches!(EdepGrid::configure(lo, hi, 0.0, 1.0, 1.0), Err(GridError::InvalidPitch { .. })));
		assert!(matches!(EdepGrid::configure(lo, hi, 1.0, -1.0, 1.0), Err(GridError::InvalidPitch { .. })));
		assert!(matches!(EdepGrid::configure(lo, hi, 1.0, 1.0, f64::NAN), Err(GridError::InvalidPitch { .. })));
	}

	#[test]
	fn manhattan_distance() {
		let a = Index3::new(1, 1, 1);
		assert_eq!(a.manhattan(&Index3::new(0, 1, 1)), 1);
		assert_eq!(a.manhattan(&Index3::new(0, 0, 1)), 2);
		assert_eq!(a.manhattan(&a), 0);
	}
}
