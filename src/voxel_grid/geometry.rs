use std::ops::{Add, Mul, Sub};

use crate::units::{MICROMETER, NANOMETER};
use crate::voxel_grid::grid::{EdepGrid, GridError};

/// Position in internal length units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
	pub x: f64,
	pub y: f64,
	pub z: f64,
}

impl Vec3 {
	pub const fn new(x: f64, y: f64, z: f64) -> Self {
		Self { x, y, z }
	}

	/// Point halfway between `self` and `other`.
	pub fn midpoint(&self, other: &Vec3) -> Vec3 {
		(*self + *other) * 0.5
	}
}

impl Add for Vec3 {
	type Output = Vec3;
	fn add(self, rhs: Vec3) -> Vec3 {
		Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
	}
}

impl Sub for Vec3 {
	type Output = Vec3;
	fn sub(self, rhs: Vec3) -> Vec3 {
		Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
	}
}

impl Mul<f64> for Vec3 {
	type Output = Vec3;
	fn mul(self, rhs: f64) -> Vec3 {
		Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
	}
}

/// Dielectric film on a square pad. The top surface of the film sits at z = 0
/// and the film extends downward by its thickness.
#[derive(Debug, Clone, PartialEq)]
pub struct FilmGeometry {
	pub thickness_nm: f64,
	pub pad_size_um: f64,
	pub voxel_dx_nm: f64,
	pub voxel_dy_nm: f64,
	pub voxel_dz_nm: f64,
}

impl Default for FilmGeometry {
	fn default() -> Self {
		Self {
			thickness_nm: 10.0,
			pad_size_um: 5.0,
			voxel_dx_nm: 50.0,
			voxel_dy_nm: 50.0,
			voxel_dz_nm: 1.0,
		}
	}
}

/// Scoring box and voxel pitch, in internal units.
#[derive(Debug, Clone, PartialEq)]
pub struct GridParams {
	pub min: Vec3,
	pub max: Vec3,
	pub dx: f64,
	pub dy: f64,
	pub dz: f64,
}

impl FilmGeometry {
	/// Scoring bounds matching the film volume: x, y in [-pad/2, pad/2), z in [-t, 0).
	pub fn grid_params(&self) -> GridParams {
		let half_pad = 0.5 * self.pad_size_um * MICROMETER;
		let thickness = self.thickness_nm * NANOMETER;
		GridParams {
			min: Vec3::new(-half_pad, -half_pad, -thickness),
			max: Vec3::new(half_pad, half_pad, 0.0),
			dx: self.voxel_dx_nm * NANOMETER,
			dy: self.voxel_dy_nm * NANOMETER,
			dz: self.voxel_dz_nm * NANOMETER,
		}
	}
}

impl GridParams {
	/// Instantiate an `EdepGrid` using these parameters.
	pub fn build_grid(&self) -> Result<EdepGrid, GridError> {
		EdepGrid::configure(self.min, self.max, self.dx, self.dy, self.dz)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn midpoint_of_step() {
		let a = Vec3::new(0.0, 2.0, -4.0);
		let b = Vec3::new(2.0, 2.0, 0.0);
		assert_eq!(a.midpoint(&b), Vec3::new(1.0, 2.0, -2.0));
		assert_eq!(b - a, Vec3::new(2.0, 0.0, 4.0));
	}

	#[test]
	fn default_film_bounds() {
		let params = FilmGeometry::default().grid_params();
		assert_eq!(params.min, Vec3::new(-2500.0, -2500.0, -10.0));
		assert_eq!(params.max, Vec3::new(2500.0, 2500.0, 0.0));
		let grid = params.build_grid().unwrap();
		assert_eq!(grid.total_voxels(), 100 * 100 * 10);
		assert_eq!(grid.min(), params.min);
		assert_eq!(grid.max(), params.max);
		assert_eq!(grid.pitch(), (50.0, 50.0, 1.0));
		assert_eq!(grid.voxel_volume(), 2500.0);
	}

	#[test]
	fn zero_thickness_film_fails() {
		let film = FilmGeometry { thickness_nm: 0.0, ..FilmGeometry::default() };
		assert!(film.grid_params().build_grid().is_err());
	}
}
