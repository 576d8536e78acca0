use crate::voxel_grid::geometry::Vec3;
use crate::voxel_grid::grid::{EdepGrid, Index3};

/// Voxel index along one axis, clamped into `[0, len - 1]`.
#[inline]
fn clamped_axis_index(p: f64, min: f64, pitch: f64, len: usize) -> usize {
	let raw = ((p - min) / pitch).floor();
	// NaN falls through both comparisons and lands on 0 via the saturating cast.
	if raw >= (len - 1) as f64 {
		len - 1
	} else if raw <= 0.0 {
		0
	} else {
		raw as usize
	}
}

impl EdepGrid {
	/// Half-open containment test `min <= p < max` on every axis.
	#[inline]
	pub fn contains(&self, p: Vec3) -> bool {
		p.x >= self.min.x && p.x < self.max.x
			&& p.y >= self.min.y && p.y < self.max.y
			&& p.z >= self.min.z && p.z < self.max.z
	}

	/// Convert a world position to a voxel index. Positions on or past the
	/// boundary are folded into the nearest valid voxel rather than rejected.
	pub fn to_index(&self, p: Vec3) -> Index3 {
		Index3 {
			ix: clamped_axis_index(p.x, self.min.x, self.dx, self.nx),
			iy: clamped_axis_index(p.y, self.min.y, self.dy, self.ny),
			iz: clamped_axis_index(p.z, self.min.z, self.dz, self.nz),
		}
	}

	/// Record `edep` at position `p`. Non-positive energies and positions
	/// outside the scoring box are dropped. Returns the flat index scored into.
	pub fn add_edep(&mut self, p: Vec3, edep: f64) -> Option<usize> {
		if !(edep > 0.0) || !self.contains(p) {
			return None;
		}
		let flat = self.flatten(self.to_index(p));
		self.edep_run[flat] += edep;
		self.edep_event[flat] += edep;
		if !self.touched_flags[flat] {
			self.touched_flags.set(flat, true);
			self.touched.push(flat);
		}
		Some(flat)
	}

	/// Clear the per-event energy of every touched voxel and empty the
	/// touched list. Cost is proportional to the touched count, not the grid.
	pub fn reset_event_accumulators(&mut self) {
		for &flat in &self.touched {
			self.edep_event[flat] = 0.0;
			self.touched_flags.set(flat, false);
		}
		self.touched.clear();
	}

	/// Zero the run energy of every voxel.
	pub fn reset_run_accumulators(&mut self) {
		self.edep_run.fill(0.0);
	}
}
