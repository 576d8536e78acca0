pub mod units;
pub mod config;
pub mod deposits;
pub mod simulation;
pub mod reduce;

pub mod voxel_grid {
	pub mod info;
	pub mod grid;
	pub mod utils;
	pub mod geometry;
	pub mod deposit;
	pub mod csv_output;
}

pub mod vacancy {
	pub mod params;
	pub mod poisson;
	pub mod model;
	pub mod csv_output;
}
