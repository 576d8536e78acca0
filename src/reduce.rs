//! Multi-worker runs.
//!
//! Every worker owns an independent accumulator and vacancy model and sees its
//! own event stream; growth cascades are only defined inside one stream. At run
//! end the terminal per-run quantities of all workers are summed into a
//! `RunTally`. Merged vacancy counts are tallies across independent films and
//! may exceed the single-voxel capacity.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::thread;

use anyhow::{Context, Result, anyhow, bail};
use indicatif::ProgressBar;

use crate::config::{OutputPaths, SimConfig};
use crate::deposits::EventRecord;
use crate::simulation::Simulation;
use crate::vacancy::csv_output::{created_per_primary, write_key_value_csv, write_vacancy_rows};
use crate::vacancy::params::VacancyParams;
use crate::voxel_grid::csv_output::write_edep_rows;
use crate::voxel_grid::utils::GridShape;

/// Tag inserted before the extension of every merged table name.
pub const MERGED_SUFFIX: &str = "_merged";

/// Summed end-of-run state of one or more workers.
#[derive(Debug, Clone, PartialEq)]
pub struct RunTally {
	pub shape: GridShape,
	pub seed_flat: usize,
	pub params: VacancyParams,
	pub capacity_per_voxel: u32,
	pub workers: usize,
	pub n_primaries: u64,
	pub total_created: u64,
	pub initial_vacancies: u64,
	pub seed_captured_max: u8,
	pub edep_run_ev: Vec<f64>,
	pub vacancy_count: Vec<u64>,
	pub energy_bank_ev: Vec<f64>,
}

impl RunTally {
	/// Snapshot the terminal state of a single worker.
	pub fn from_simulation(sim: &Simulation) -> Self {
		let grid = sim.grid();
		let model = sim.model();
		Self {
			shape: grid.shape(),
			seed_flat: grid.seed_flat(),
			params: model.params().clone(),
			capacity_per_voxel: model.capacity_per_voxel(),
			workers: 1,
			n_primaries: sim.events_in_run(),
			total_created: model.total_created(),
			initial_vacancies: model.initial_vacancies(),
			seed_captured_max: model.seed_captured_electrons(),
			edep_run_ev: (0..grid.total_voxels()).map(|flat| grid.edep_run_ev(flat)).collect(),
			vacancy_count: model.vacancy_counts().iter().map(|&c| c as u64).collect(),
			energy_bank_ev: model.energy_banks_ev().to_vec(),
		}
	}

	/// Add `other` into `self`. Both must come from the same grid geometry.
	pub fn merge(&mut self, other: &RunTally) -> Result<()> {
		if self.shape != other.shape || self.seed_flat != other.seed_flat {
			bail!(
				"cannot merge tallies of different grids ({:?} vs {:?})",
				self.shape,
				other.shape
			);
		}
		self.workers += other.workers;
		self.n_primaries += other.n_primaries;
		self.total_created += other.total_created;
		self.initial_vacancies += other.initial_vacancies;
		self.seed_captured_max = self.seed_captured_max.max(other.seed_captured_max);
		for (a, b) in self.edep_run_ev.iter_mut().zip(&other.edep_run_ev) {
			*a += b;
		}
		for (a, b) in self.vacancy_count.iter_mut().zip(&other.vacancy_count) {
			*a += b;
		}
		for (a, b) in self.energy_bank_ev.iter_mut().zip(&other.energy_bank_ev) {
			*a += b;
		}
		Ok(())
	}

	pub fn total_vacancies(&self) -> u64 {
		self.vacancy_count.iter().sum()
	}

	pub fn summary_rows(&self) -> Vec<(&'static str, String)> {
		let p = &self.params;
		vec![
			("workers", self.workers.to_string()),
			("initConc_cm3", p.init_conc_cm3.to_string()),
			("rho_g_cm3", p.rho_g_cm3.to_string()),
			("molarMass_g_mol", p.molar_mass_g_mol.to_string()),
			("capacityPerVoxel", self.capacity_per_voxel.to_string()),
			("W_eV", p.w_ev.to_string()),
			("Ea_base_eV", p.ea_base_ev.to_string()),
			("Ea_fast_eV", p.ea_fast_ev.to_string()),
			("fastOnlyNearSeed", (p.fast_only_near_seed as u8).to_string()),
			("initSeed", p.init_seed.to_string()),
			("seedCapturedElectronsMax", self.seed_captured_max.to_string()),
			("initialVacancies", self.initial_vacancies.to_string()),
			("totalVacancies", self.total_vacancies().to_string()),
			("totalCreated", self.total_created.to_string()),
			("nPrimaries", self.n_primaries.to_string()),
			(
				"createdPerPrimary",
				created_per_primary(self.total_created, self.n_primaries).to_string(),
			),
		]
	}

	/// Write the merged tables with the single-run layouts, next to the
	/// single-run names of `base` tagged with `MERGED_SUFFIX`. Returns the
	/// paths written.
	pub fn export(&self, base: &OutputPaths) -> Result<OutputPaths> {
		let paths = base.with_suffix(MERGED_SUFFIX);
		let open = |path: &Path| -> Result<BufWriter<File>> {
			let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
			Ok(BufWriter::new(file))
		};
		write_edep_rows(open(&paths.edep)?, self.shape, self.seed_flat, |flat| self.edep_run_ev[flat])
			.with_context(|| format!("failed to write {}", paths.edep.display()))?;
		write_vacancy_rows(
			open(&paths.vacancy_map)?,
			self.shape,
			self.seed_flat,
			&self.vacancy_count,
			&self.energy_bank_ev,
			|flat| self.edep_run_ev[flat],
		)
		.with_context(|| format!("failed to write {}", paths.vacancy_map.display()))?;
		write_key_value_csv(open(&paths.summary)?, &self.summary_rows())
			.with_context(|| format!("failed to write {}", paths.summary.display()))?;
		log::info!(
			"merged tables of {} workers saved: {}, {}, {}",
			self.workers,
			paths.edep.display(),
			paths.vacancy_map.display(),
			paths.summary.display()
		);
		Ok(paths)
	}
}

/// Deal `events` round-robin to `workers` independent simulations, run them in
/// parallel and sum their run-end tallies. Worker `w` seeds its vacancy field
/// with `init_seed + w`.
pub fn run_workers(
	config: &SimConfig,
	events: &[EventRecord],
	workers: usize,
	progress: &ProgressBar,
) -> Result<RunTally> {
	let workers = workers.max(1);
	let mut sims = Vec::with_capacity(workers);
	for w in 0..workers {
		let mut worker_config = config.clone();
		worker_config.vacancy.init_seed = config.vacancy.init_seed.wrapping_add(w as u64);
		sims.push(Simulation::new(&worker_config)?);
	}

	let tallies: Vec<Result<RunTally>> = thread::scope(|scope| {
		let handles: Vec<_> = sims
			.into_iter()
			.enumerate()
			.map(|(w, mut sim)| {
				let pb = progress.clone();
				scope.spawn(move || {
					sim.begin_run();
					for event in events.iter().skip(w).step_by(workers) {
						sim.replay_event(event);
						pb.inc(1);
					}
					log::debug!("worker {} replayed {} events", w, sim.events_in_run());
					RunTally::from_simulation(&sim)
				})
			})
			.collect();

		handles
			.into_iter()
			.enumerate()
			.map(|(w, handle)| handle.join().map_err(|_| anyhow!("worker {} panicked", w)))
			.collect()
	});

	let mut merged: Option<RunTally> = None;
	for tally in tallies {
		let tally = tally?;
		match merged.as_mut() {
			Some(acc) => acc.merge(&tally)?,
			None => merged = Some(tally),
		}
	}
	merged.ok_or_else(|| anyhow!("no workers ran"))
}
