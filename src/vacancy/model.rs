use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::units::to_cm3;
use crate::vacancy::params::VacancyParams;
use crate::vacancy::poisson::sample_poisson;
use crate::voxel_grid::grid::{EdepGrid, Index3};
use crate::voxel_grid::utils::GridShape;

/// Electrons the seed can hold before it saturates.
pub const MAX_SEED_ELECTRONS: u8 = 2;

/// Oxygen-vacancy occupancy field evolved from per-event energy deposition.
///
/// Each voxel holds a bounded vacancy count and an energy bank. A touched voxel
/// next to an existing vacancy nucleates one more vacancy when its bank covers
/// the activation barrier; the barrier drops from `ea_base_ev` to `ea_fast_ev`
/// once the seed voxel has captured two electrons.
///
/// The model keeps a copy of the grid shape only. Energy is read from the
/// accumulator passed to [`VacancyModel::process_event`], which is never mutated.
#[derive(Debug, Clone)]
pub struct VacancyModel {
	params: VacancyParams,
	shape: GridShape,
	seed: Index3,
	seed_flat: usize,
	voxel_volume_cm3: f64,
	capacity_per_voxel: u32,
	vacancy_count: Vec<u32>,
	energy_bank_ev: Vec<f64>,
	seed_captured_electrons: u8,
	total_created: u64,
	initial_vacancies: u64,
	rng: ChaCha8Rng,
}

impl VacancyModel {
	/// Take geometry from `grid`, derive the per-voxel capacity from the material
	/// parameters, and fill the initial state.
	pub fn configure_from_grid(grid: &EdepGrid, params: VacancyParams) -> Self {
		let shape = grid.shape();
		let n = shape.total_voxels();
		let voxel_volume_cm3 = to_cm3(grid.voxel_volume());
		let capacity_per_voxel = params.capacity_for_volume(voxel_volume_cm3);
		let rng = ChaCha8Rng::seed_from_u64(params.init_seed);

		log::info!(
			"vacancy model: {} voxels, {:.3e} cm^3 each, capacity {} per voxel",
			n, voxel_volume_cm3, capacity_per_voxel
		);

		let mut model = Self {
			params,
			shape,
			seed: grid.seed_index(),
			seed_flat: grid.seed_flat(),
			voxel_volume_cm3,
			capacity_per_voxel,
			vacancy_count: vec![0; n],
			energy_bank_ev: vec![0.0; n],
			seed_captured_electrons: 0,
			total_created: 0,
			initial_vacancies: 0,
			rng,
		};
		model.reset_and_init();
		model
	}

	/// Reseed the generator and redraw the initial vacancy field.
	///
	/// Every voxel, in flat-index order, receives a Poisson draw with mean
	/// `concentration * voxel volume`, clamped into `[0, capacity]`. The seed
	/// voxel always ends with at least one vacancy.
	pub fn reset_and_init(&mut self) {
		self.rng = ChaCha8Rng::seed_from_u64(self.params.init_seed);
		self.energy_bank_ev.fill(0.0);
		self.vacancy_count.fill(0);

		let lambda = self.params.clamped_concentration_cm3() * self.voxel_volume_cm3;
		let capacity = self.capacity_per_voxel as i64;
		for count in self.vacancy_count.iter_mut() {
			let draw = sample_poisson(&mut self.rng, lambda);
			*count = draw.clamp(0, capacity) as u32;
		}
		let seed_count = &mut self.vacancy_count[self.seed_flat];
		*seed_count = (*seed_count).max(1);

		self.seed_captured_electrons = 0;
		self.total_created = 0;
		self.initial_vacancies = self.total_vacancies();

		log::debug!(
			"vacancy field initialized: mean {:.4} per voxel, {} vacancies total",
			lambda, self.initial_vacancies
		);
	}

	/// Fold the current event of `grid` into the vacancy state. Returns the
	/// number of vacancies created by this event.
	///
	/// Growth candidates are visited in the grid's first-touched order and see
	/// vacancies created earlier in the same pass, so adjacent touched voxels
	/// can grow as a chain within one event.
	pub fn process_event(&mut self, grid: &EdepGrid) -> u64 {
		debug_assert_eq!(grid.shape(), self.shape, "grid does not match the configured model");
		let touched = grid.touched();

		for &flat in touched {
			let edep_ev = grid.edep_event_ev(flat);
			if edep_ev > 0.0 {
				self.energy_bank_ev[flat] += edep_ev;
			}
		}

		self.capture_seed_electrons(grid.edep_event_ev(self.seed_flat));

		let mut created = 0;
		for &flat in touched {
			if self.vacancy_count[flat] >= self.capacity_per_voxel {
				continue;
			}
			let idx = self.shape.unflatten(flat);
			if !self.has_vacancy_neighbor(idx) {
				continue;
			}
			let ea = self.barrier_for(idx);
			if self.energy_bank_ev[flat] >= ea {
				self.vacancy_count[flat] += 1;
				self.energy_bank_ev[flat] -= ea;
				self.total_created += 1;
				created += 1;
			}
		}

		if created > 0 {
			log::trace!("event created {} vacancies ({} touched voxels)", created, touched.len());
		}
		created
	}

	fn capture_seed_electrons(&mut self, edep_seed_ev: f64) {
		if self.seed_captured_electrons >= MAX_SEED_ELECTRONS {
			return;
		}
		if edep_seed_ev > 0.0 && self.params.w_ev > 0.0 {
			let dn = (edep_seed_ev / self.params.w_ev).floor();
			if dn >= 1.0 {
				let captured = (self.seed_captured_electrons as f64 + dn).min(MAX_SEED_ELECTRONS as f64);
				self.seed_captured_electrons = captured as u8;
			}
		}
	}

	fn has_vacancy_neighbor(&self, idx: Index3) -> bool {
		self.shape
			.face_neighbors(idx)
			.any(|flat| self.vacancy_count[flat] > 0)
	}

	/// Activation barrier for growth at `idx` under the current seed charge.
	pub fn barrier_for(&self, idx: Index3) -> f64 {
		let charged = self.seed_captured_electrons == MAX_SEED_ELECTRONS;
		let near_seed = idx.manhattan(&self.seed) == 1;
		if charged && (!self.params.fast_only_near_seed || near_seed) {
			self.params.ea_fast_ev
		} else {
			self.params.ea_base_ev
		}
	}

	pub fn params(&self) -> &VacancyParams {
		&self.params
	}

	pub fn shape(&self) -> GridShape {
		self.shape
	}

	pub fn seed_index(&self) -> Index3 {
		self.seed
	}

	pub fn seed_flat(&self) -> usize {
		self.seed_flat
	}

	pub fn capacity_per_voxel(&self) -> u32 {
		self.capacity_per_voxel
	}

	pub fn voxel_volume_cm3(&self) -> f64 {
		self.voxel_volume_cm3
	}

	#[inline]
	pub fn vacancy_count(&self, flat: usize) -> u32 {
		self.vacancy_count[flat]
	}

	pub fn vacancy_counts(&self) -> &[u32] {
		&self.vacancy_count
	}

	#[inline]
	pub fn energy_bank_ev(&self, flat: usize) -> f64 {
		self.energy_bank_ev[flat]
	}

	pub fn energy_banks_ev(&self) -> &[f64] {
		&self.energy_bank_ev
	}

	pub fn seed_captured_electrons(&self) -> u8 {
		self.seed_captured_electrons
	}

	pub fn total_created(&self) -> u64 {
		self.total_created
	}

	/// Vacancy total right after the last `reset_and_init`.
	pub fn initial_vacancies(&self) -> u64 {
		self.initial_vacancies
	}

	pub fn total_vacancies(&self) -> u64 {
		self.vacancy_count.iter().map(|&c| c as u64).sum()
	}
}
