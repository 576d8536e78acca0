//! Run and event lifecycle binding the accumulator to the vacancy model.
//!
//! The transport layer drives a `Simulation` with `begin_run`, then for each
//! primary `begin_event`, any number of `add_edep`/`score_step`, `end_event`,
//! and finally `end_run` which writes the three tables. Every closed event
//! counts as one primary.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{OutputPaths, SimConfig};
use crate::deposits::EventRecord;
use crate::vacancy::csv_output::created_per_primary;
use crate::vacancy::model::VacancyModel;
use crate::vacancy::params::VacancyParams;
use crate::voxel_grid::geometry::Vec3;
use crate::voxel_grid::grid::{EdepGrid, GridError};

/// Totals reported at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
	pub n_primaries: u64,
	pub total_created: u64,
	pub total_vacancies: u64,
	pub seed_captured_electrons: u8,
	pub created_per_primary: f64,
	pub total_edep_ev: f64,
}

/// Progress bar over replayed events; hidden when `quiet`.
pub fn event_progress(len: u64, quiet: bool) -> ProgressBar {
	if quiet {
		return ProgressBar::hidden();
	}
	let pb = ProgressBar::new(len);
	if let Ok(style) = ProgressStyle::default_bar().template("Replaying Events: [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
		pb.set_style(style.progress_chars("#>-"));
	}
	pb
}

pub struct Simulation {
	grid: EdepGrid,
	model: VacancyModel,
	output: OutputPaths,
	events_in_run: u64,
}

impl Simulation {
	/// Build the scoring grid from the film geometry and configure the model on it.
	pub fn new(config: &SimConfig) -> Result<Self, GridError> {
		let grid = config.film.grid_params().build_grid()?;
		Ok(Self::from_grid(grid, config.vacancy.clone(), config.output.clone()))
	}

	pub fn from_grid(grid: EdepGrid, params: VacancyParams, output: OutputPaths) -> Self {
		let model = VacancyModel::configure_from_grid(&grid, params);
		Self {
			grid,
			model,
			output,
			events_in_run: 0,
		}
	}

	pub fn grid(&self) -> &EdepGrid {
		&self.grid
	}

	pub fn model(&self) -> &VacancyModel {
		&self.model
	}

	pub fn output(&self) -> &OutputPaths {
		&self.output
	}

	/// Events closed with `end_event` since the last `begin_run`.
	pub fn events_in_run(&self) -> u64 {
		self.events_in_run
	}

	pub fn begin_run(&mut self) {
		self.grid.reset_run_accumulators();
		self.grid.reset_event_accumulators();
		self.model.reset_and_init();
		self.events_in_run = 0;
		log::info!(
			"run started: {} initial vacancies, seed voxel {:?}",
			self.model.initial_vacancies(),
			self.grid.seed_index()
		);
	}

	pub fn begin_event(&mut self) {
		self.grid.reset_event_accumulators();
	}

	pub fn add_edep(&mut self, position: Vec3, edep: f64) -> Option<usize> {
		self.grid.add_edep(position, edep)
	}

	/// Bin a transport step at the midpoint of its pre- and post-step points.
	pub fn score_step(&mut self, pre: Vec3, post: Vec3, edep: f64) -> Option<usize> {
		self.grid.add_edep(pre.midpoint(&post), edep)
	}

	/// Fold the event into the vacancy state; returns vacancies created.
	pub fn end_event(&mut self) -> u64 {
		self.events_in_run += 1;
		self.model.process_event(&self.grid)
	}

	/// Run one recorded event through the full event lifecycle.
	pub fn replay_event(&mut self, event: &EventRecord) -> u64 {
		self.begin_event();
		for sample in &event.samples {
			self.add_edep(sample.position, sample.edep);
		}
		self.end_event()
	}

	pub fn replay(&mut self, events: &[EventRecord], progress: &ProgressBar) -> u64 {
		let mut created = 0;
		for event in events {
			created += self.replay_event(event);
			progress.inc(1);
		}
		created
	}

	/// Run totals so far; every event closed with `end_event` counts as a primary.
	pub fn summary(&self) -> RunSummary {
		let n_primaries = self.events_in_run;
		RunSummary {
			n_primaries,
			total_created: self.model.total_created(),
			total_vacancies: self.model.total_vacancies(),
			seed_captured_electrons: self.model.seed_captured_electrons(),
			created_per_primary: created_per_primary(self.model.total_created(), n_primaries),
			total_edep_ev: self.grid.total_edep_run_ev(),
		}
	}

	/// Write the energy table, vacancy map and summary to the configured paths.
	pub fn end_run(&self) -> Result<RunSummary> {
		let n_primaries = self.events_in_run;
		let paths = &self.output;
		self.grid
			.export_edep_csv(&paths.edep)
			.with_context(|| format!("failed to write {}", paths.edep.display()))?;
		self.model
			.export_vacancy_csv(&paths.vacancy_map, &self.grid)
			.with_context(|| format!("failed to write {}", paths.vacancy_map.display()))?;
		self.model
			.export_summary_csv(&paths.summary, n_primaries)
			.with_context(|| format!("failed to write {}", paths.summary.display()))?;

		let summary = self.summary();
		log::info!(
			"run finished: {} primaries, {} vacancies created, seed holds {} electrons",
			summary.n_primaries, summary.total_created, summary.seed_captured_electrons
		);
		Ok(summary)
	}
}
