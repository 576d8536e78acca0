use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Result, Write};
use std::path::Path;

use crate::vacancy::model::VacancyModel;
use crate::voxel_grid::grid::EdepGrid;
use crate::voxel_grid::utils::GridShape;

pub const VACANCY_MAP_HEADER: &str = "ix,iy,iz,vacancyCount,Ebank_eV,edepRun_eV,seed";

/// Vacancies created per primary; 0 when no primaries were processed.
pub fn created_per_primary(total_created: u64, n_primaries: u64) -> f64 {
	if n_primaries > 0 {
		total_created as f64 / n_primaries as f64
	} else {
		0.0
	}
}

/// Write the per-voxel defect map from parallel arrays indexed by flat index.
pub fn write_vacancy_rows<W: Write, C: Display>(
	mut out: W,
	shape: GridShape,
	seed_flat: usize,
	counts: &[C],
	bank_ev: &[f64],
	edep_run_ev: impl Fn(usize) -> f64,
) -> Result<()> {
	writeln!(out, "{}", VACANCY_MAP_HEADER)?;
	for (flat, (count, bank)) in counts.iter().zip(bank_ev).enumerate() {
		let idx = shape.unflatten(flat);
		writeln!(
			out,
			"{},{},{},{},{},{},{}",
			idx.ix,
			idx.iy,
			idx.iz,
			count,
			bank,
			edep_run_ev(flat),
			(flat == seed_flat) as u8
		)?;
	}
	out.flush()
}

/// Write `key,value` rows.
pub fn write_key_value_csv<W: Write>(mut out: W, rows: &[(&str, String)]) -> Result<()> {
	writeln!(out, "key,value")?;
	for (key, value) in rows {
		writeln!(out, "{},{}", key, value)?;
	}
	out.flush()
}

fn create(path: &Path) -> Result<BufWriter<File>> {
	Ok(BufWriter::new(File::create(path)?))
}

impl VacancyModel {
	pub fn write_vacancy_csv<W: Write>(&self, grid: &EdepGrid, out: W) -> Result<()> {
		write_vacancy_rows(
			out,
			self.shape(),
			self.seed_flat(),
			self.vacancy_counts(),
			self.energy_banks_ev(),
			|flat| grid.edep_run_ev(flat),
		)
	}

	/// Model parameters and run totals, in output order.
	pub fn summary_rows(&self, n_primaries: u64) -> Vec<(&'static str, String)> {
		let p = self.params();
		vec![
			("initConc_cm3", p.init_conc_cm3.to_string()),
			("initConcClamped_cm3", p.clamped_concentration_cm3().to_string()),
			("rho_g_cm3", p.rho_g_cm3.to_string()),
			("molarMass_g_mol", p.molar_mass_g_mol.to_string()),
			("capacityPerVoxel", self.capacity_per_voxel().to_string()),
			("W_eV", p.w_ev.to_string()),
			("Ea_base_eV", p.ea_base_ev.to_string()),
			("Ea_fast_eV", p.ea_fast_ev.to_string()),
			("fastOnlyNearSeed", (p.fast_only_near_seed as u8).to_string()),
			("initSeed", p.init_seed.to_string()),
			("seedCapturedElectrons", self.seed_captured_electrons().to_string()),
			("initialVacancies", self.initial_vacancies().to_string()),
			("totalVacancies", self.total_vacancies().to_string()),
			("totalCreated", self.total_created().to_string()),
			("nPrimaries", n_primaries.to_string()),
			(
				"createdPerPrimary",
				created_per_primary(self.total_created(), n_primaries).to_string(),
			),
		]
	}

	pub fn write_summary_csv<W: Write>(&self, n_primaries: u64, out: W) -> Result<()> {
		write_key_value_csv(out, &self.summary_rows(n_primaries))
	}

	/// Save the defect map to `path`.
	pub fn export_vacancy_csv(&self, path: &Path, grid: &EdepGrid) -> Result<()> {
		self.write_vacancy_csv(grid, create(path)?)?;
		log::info!("vacancy map saved: {}", path.display());
		Ok(())
	}

	/// Save the run summary to `path`.
	pub fn export_summary_csv(&self, path: &Path, n_primaries: u64) -> Result<()> {
		self.write_summary_csv(n_primaries, create(path)?)?;
		log::info!("vacancy summary saved: {}", path.display());
		Ok(())
	}
}
