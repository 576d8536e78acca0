use std::fs::File;
use std::io::{BufWriter, Result, Write};
use std::path::Path;

use crate::voxel_grid::grid::EdepGrid;
use crate::voxel_grid::utils::GridShape;

pub const EDEP_HEADER: &str = "ix,iy,iz,edepRun_eV,seed";

/// Write one row per voxel (x slowest, z fastest) with the run energy in eV.
pub fn write_edep_rows<W: Write>(
	mut out: W,
	shape: GridShape,
	seed_flat: usize,
	edep_run_ev: impl Fn(usize) -> f64,
) -> Result<()> {
	writeln!(out, "{}", EDEP_HEADER)?;
	for flat in 0..shape.total_voxels() {
		let idx = shape.unflatten(flat);
		writeln!(
			out,
			"{},{},{},{},{}",
			idx.ix,
			idx.iy,
			idx.iz,
			edep_run_ev(flat),
			(flat == seed_flat) as u8
		)?;
	}
	out.flush()
}

impl EdepGrid {
	pub fn write_edep_csv<W: Write>(&self, out: W) -> Result<()> {
		write_edep_rows(out, self.shape(), self.seed_flat(), |flat| self.edep_run_ev(flat))
	}

	/// Save the energy-deposition table to `path`.
	pub fn export_edep_csv(&self, path: &Path) -> Result<()> {
		let file = BufWriter::new(File::create(path)?);
		self.write_edep_csv(file)?;
		log::info!("energy deposition table saved: {}", path.display());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use crate::voxel_grid::geometry::Vec3;
	use crate::voxel_grid::grid::EdepGrid;

	#[test]
	fn table_has_row_per_voxel_with_seed_flag() {
		let mut grid = EdepGrid::configure(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 2.0), 1.0, 1.0, 1.0).unwrap();
		grid.add_edep(Vec3::new(1.5, 0.5, 1.5), 12.5);

		let mut buf = Vec::new();
		grid.write_edep_csv(&mut buf).unwrap();
		let text = String::from_utf8(buf).unwrap();
		let lines: Vec<&str> = text.lines().collect();

		assert_eq!(lines.len(), 1 + 4);
		assert_eq!(lines[0], "ix,iy,iz,edepRun_eV,seed");
		assert_eq!(lines[1], "0,0,0,0,0");
		assert_eq!(lines[2], "0,0,1,0,0");
		assert_eq!(lines[3], "1,0,0,0,0");
		assert_eq!(lines[4], "1,0,1,12.5,1");
	}
}
