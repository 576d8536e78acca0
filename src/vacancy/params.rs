use crate::units::{AVOGADRO, OXYGEN_SITES_PER_FORMULA_UNIT};

/// Kinetic, initialization and material parameters of the vacancy model.
#[derive(Debug, Clone, PartialEq)]
pub struct VacancyParams {
	/// Energy per captured electron on the seed (eV)
	pub w_ev: f64,
	/// Activation barrier without a charged seed (eV)
	pub ea_base_ev: f64,
	/// Activation barrier once the seed holds two electrons (eV)
	pub ea_fast_ev: f64,
	/// Restrict the fast barrier to face neighbours of the seed
	pub fast_only_near_seed: bool,
	/// Initial vacancy concentration (cm^-3)
	pub init_conc_cm3: f64,
	/// Seed of the initialization generator
	pub init_seed: u64,
	/// Film density (g/cm^3)
	pub rho_g_cm3: f64,
	/// Molar mass of the oxide (g/mol)
	pub molar_mass_g_mol: f64,
}

impl Default for VacancyParams {
	fn default() -> Self {
		Self {
			w_ev: 15.0,
			ea_base_ev: 2.0,
			ea_fast_ev: 1.3,
			fast_only_near_seed: true,
			init_conc_cm3: 1.0e18,
			init_seed: 12345,
			rho_g_cm3: 9.68,
			molar_mass_g_mol: 210.49,
		}
	}
}

impl VacancyParams {
	/// Oxygen lattice sites per cm^3: `2 * (rho / M) * N_A`.
	pub fn site_density_cm3(&self) -> f64 {
		OXYGEN_SITES_PER_FORMULA_UNIT * (self.rho_g_cm3 / self.molar_mass_g_mol) * AVOGADRO
	}

	/// Maximum vacancy count of a voxel of the given volume; never below 1.
	pub fn capacity_for_volume(&self, voxel_volume_cm3: f64) -> u32 {
		let sites = (self.site_density_cm3() * voxel_volume_cm3).floor();
		if sites >= u32::MAX as f64 {
			u32::MAX
		} else if sites >= 1.0 {
			sites as u32
		} else {
			1
		}
	}

	/// Initial concentration clamped into `[0, site density]`.
	pub fn clamped_concentration_cm3(&self) -> f64 {
		let max = self.site_density_cm3();
		let conc = self.init_conc_cm3;
		if !(conc > 0.0) {
			0.0
		} else if conc > max {
			max
		} else {
			conc
		}
	}
}
