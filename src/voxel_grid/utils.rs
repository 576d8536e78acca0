use std::mem::size_of;

use bitvec::prelude::BitVec;

use crate::units::EV;
use crate::voxel_grid::geometry::Vec3;
use crate::voxel_grid::grid::{EdepGrid, Index3};

/// Face-neighbour offsets: +x, -x, +y, -y, +z, -z.
static FACE_OFFSETS: [(isize, isize, isize); 6] = [
	(1, 0, 0),
	(-1, 0, 0),
	(0, 1, 0),
	(0, -1, 0),
	(0, 0, 1),
	(0, 0, -1),
];

/// Format large numbers with KB, MB, GB, TB suffixes
fn format_bytes(bytes: usize) -> String {
	const KB: usize = 1024;
	const MB: usize = KB * 1024;
	const GB: usize = MB * 1024;
	const TB: usize = GB * 1024;

	if bytes >= TB {
		format!("{:.2} TB", bytes as f64 / TB as f64)
	} else if bytes >= GB {
		format!("{:.2} GB", bytes as f64 / GB as f64)
	} else if bytes >= MB {
		format!("{:.2} MB", bytes as f64 / MB as f64)
	} else if bytes >= KB {
		format!("{:.2} KB", bytes as f64 / KB as f64)
	} else {
		format!("{} bytes", bytes)
	}
}

/// Voxel counts of a grid, with row-major (z fastest) index arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridShape {
	pub nx: usize,
	pub ny: usize,
	pub nz: usize,
}

impl GridShape {
	#[inline]
	pub fn total_voxels(&self) -> usize {
		self.nx * self.ny * self.nz
	}

	/// Convert (ix, iy, iz) to a linear index: `iz + nz * (iy + ny * ix)`.
	#[inline]
	pub fn flatten(&self, idx: Index3) -> usize {
		idx.iz + self.nz * (idx.iy + self.ny * idx.ix)
	}

	/// Convert a linear index back to (ix, iy, iz)
	#[inline]
	pub fn unflatten(&self, flat: usize) -> Index3 {
		let yz = self.ny * self.nz;
		let ix = flat / yz;
		let rem = flat - ix * yz;
		let iy = rem / self.nz;
		let iz = rem - iy * self.nz;
		Index3 { ix, iy, iz }
	}

	#[inline]
	pub fn in_bounds(&self, ix: isize, iy: isize, iz: isize) -> bool {
		ix >= 0
			&& iy >= 0
			&& iz >= 0
			&& (ix as usize) < self.nx
			&& (iy as usize) < self.ny
			&& (iz as usize) < self.nz
	}

	/// Linear indices of the in-bounds face neighbours of `idx`. Neighbours
	/// past the boundary are absent; there is no wraparound.
	pub fn face_neighbors(&self, idx: Index3) -> impl Iterator<Item = usize> + '_ {
		FACE_OFFSETS.iter().filter_map(move |&(di, dj, dk)| {
			let ix = idx.ix as isize + di;
			let iy = idx.iy as isize + dj;
			let iz = idx.iz as isize + dk;
			if self.in_bounds(ix, iy, iz) {
				Some(self.flatten(Index3::new(ix as usize, iy as usize, iz as usize)))
			} else {
				None
			}
		})
	}
}

impl EdepGrid {
	/// Report memory usage and print a detailed breakdown
	pub fn report_memory(&self) {
		let struct_overhead = size_of::<Self>() - 2 * size_of::<Vec<f64>>() - size_of::<BitVec>() - size_of::<Vec<usize>>();
		let energy_bytes = (self.edep_run.capacity() + self.edep_event.capacity()) * size_of::<f64>();
		let flag_bytes = self.touched_flags.capacity() / 8;
		let touched_bytes = self.touched.capacity() * size_of::<usize>();
		let total_memory = struct_overhead + energy_bytes + flag_bytes + touched_bytes;

		eprintln!("EdepGrid Memory Report:");
		eprintln!("-------------------------");
		eprintln!("  Dimensions: {} x {} x {}", self.nx, self.ny, self.nz);
		eprintln!("  Total Voxels: {:e}", self.total_voxels as f64); // Scientific notation
		let (lo, hi) = (self.min(), self.max());
		let (dx, dy, dz) = self.pitch();
		eprintln!(
			"  Bounds: [{:.1}, {:.1}) x [{:.1}, {:.1}) x [{:.1}, {:.1}) nm",
			lo.x, hi.x, lo.y, hi.y, lo.z, hi.z
		);
		eprintln!("  Voxel Size: {:.3} x {:.3} x {:.3} nm", dx, dy, dz);
		eprintln!("  Struct Overhead: {}", format_bytes(struct_overhead));
		eprintln!("  Energy Arrays: {}", format_bytes(energy_bytes));
		eprintln!("  Touched Flags: {}", format_bytes(flag_bytes));
		eprintln!("  Touched List: {}", format_bytes(touched_bytes));
		eprintln!("  Total Memory Used: {}", format_bytes(total_memory));
		eprintln!("-------------------------");
	}

	#[inline]
	pub fn shape(&self) -> GridShape {
		GridShape { nx: self.nx, ny: self.ny, nz: self.nz }
	}

	#[inline]
	pub fn nx(&self) -> usize {
		self.nx
	}

	#[inline]
	pub fn ny(&self) -> usize {
		self.ny
	}

	#[inline]
	pub fn nz(&self) -> usize {
		self.nz
	}

	#[inline]
	pub fn total_voxels(&self) -> usize {
		self.total_voxels
	}

	pub fn min(&self) -> Vec3 {
		self.min
	}

	pub fn max(&self) -> Vec3 {
		self.max
	}

	/// Voxel pitch (dx, dy, dz)
	pub fn pitch(&self) -> (f64, f64, f64) {
		(self.dx, self.dy, self.dz)
	}

	/// Volume of a single voxel in internal units
	pub fn voxel_volume(&self) -> f64 {
		self.dx * self.dy * self.dz
	}

	#[inline]
	pub fn flatten(&self, idx: Index3) -> usize {
		self.shape().flatten(idx)
	}

	#[inline]
	pub fn unflatten(&self, flat: usize) -> Index3 {
		self.shape().unflatten(flat)
	}

	pub fn seed_index(&self) -> Index3 {
		self.seed
	}

	pub fn seed_flat(&self) -> usize {
		self.flatten(self.seed)
	}

	#[inline]
	pub fn is_seed(&self, flat: usize) -> bool {
		flat == self.seed_flat()
	}

	/// Voxels touched during the current event, in first-touched order.
	#[inline]
	pub fn touched(&self) -> &[usize] {
		&self.touched
	}

	#[inline]
	pub fn is_touched(&self, flat: usize) -> bool {
		self.touched_flags[flat]
	}

	/// Energy deposited into a voxel during the current event, in eV.
	#[inline]
	pub fn edep_event_ev(&self, flat: usize) -> f64 {
		self.edep_event[flat] / EV
	}

	/// Energy deposited into a voxel since the last run reset, in eV.
	#[inline]
	pub fn edep_run_ev(&self, flat: usize) -> f64 {
		self.edep_run[flat] / EV
	}

	/// Sum of the run energy over the whole grid, in eV.
	pub fn total_edep_run_ev(&self) -> f64 {
		self.edep_run.iter().sum::<f64>() / EV
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flatten_is_z_fastest() {
		let shape = GridShape { nx: 3, ny: 4, nz: 5 };
		assert_eq!(shape.flatten(Index3::new(0, 0, 1)), 1);
		assert_eq!(shape.flatten(Index3::new(0, 1, 0)), 5);
		assert_eq!(shape.flatten(Index3::new(1, 0, 0)), 20);
		assert_eq!(shape.flatten(Index3::new(2, 3, 4)), 59);
	}

	#[test]
	fn flatten_unflatten_are_inverse_and_injective() {
		for &(nx, ny, nz) in &[(1, 1, 1), (2, 2, 2), (3, 4, 5), (7, 1, 3), (1, 6, 1)] {
			let shape = GridShape { nx, ny, nz };
			let mut seen = vec![false; shape.total_voxels()];
			for ix in 0..nx {
				for iy in 0..ny {
					for iz in 0..nz {
						let idx = Index3::new(ix, iy, iz);
						let flat = shape.flatten(idx);
						assert!(flat < shape.total_voxels());
						assert!(!seen[flat], "flat index {} produced twice", flat);
						seen[flat] = true;
						assert_eq!(shape.unflatten(flat), idx);
					}
				}
			}
			assert!(seen.iter().all(|&s| s));
		}
	}

	#[test]
	fn face_neighbors_are_bounds_checked() {
		let shape = GridShape { nx: 2, ny: 2, nz: 2 };
		let corner: Vec<usize> = shape.face_neighbors(Index3::new(0, 0, 0)).collect();
		assert_eq!(corner.len(), 3);
		assert!(corner.contains(&shape.flatten(Index3::new(1, 0, 0))));
		assert!(corner.contains(&shape.flatten(Index3::new(0, 1, 0))));
		assert!(corner.contains(&shape.flatten(Index3::new(0, 0, 1))));

		let interior = GridShape { nx: 3, ny: 3, nz: 3 };
		assert_eq!(interior.face_neighbors(Index3::new(1, 1, 1)).count(), 6);

		let column = GridShape { nx: 1, ny: 1, nz: 1 };
		assert_eq!(column.face_neighbors(Index3::new(0, 0, 0)).count(), 0);
	}

	#[test]
	fn format_bytes_suffixes() {
		assert_eq!(format_bytes(512), "512 bytes");
		assert_eq!(format_bytes(2048), "2.00 KB");
		assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
	}
}
