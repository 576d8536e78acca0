//! Run configuration and the macro-file reader.
//!
//! Macro files carry one `/<directory>/<name> <value>` command per line with
//! `#` comments. Commands addressed to the transport layer (`/run/...`,
//! `/gun/...`, `/control/...`) share the same files and are skipped.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;

use crate::vacancy::params::VacancyParams;
use crate::voxel_grid::geometry::FilmGeometry;

static COMMAND_RE: OnceLock<Regex> = OnceLock::new();

fn command_regex() -> &'static Regex {
	COMMAND_RE.get_or_init(|| {
		Regex::new(r"^(/[A-Za-z0-9_]+(?:/[A-Za-z0-9_]+)+)(?:\s+(.*?))?\s*$")
			.expect("command pattern is valid")
	})
}

/// File names of the three run-end tables.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
	pub edep: PathBuf,
	pub vacancy_map: PathBuf,
	pub summary: PathBuf,
}

impl Default for OutputPaths {
	fn default() -> Self {
		Self {
			edep: PathBuf::from("hfO2_edep_voxels.csv"),
			vacancy_map: PathBuf::from("hfO2_vacancy_map.csv"),
			summary: PathBuf::from("hfO2_vacancy_summary.csv"),
		}
	}
}

impl OutputPaths {
	/// Resolve relative names against `dir`; absolute paths are kept.
	pub fn in_dir(&self, dir: &Path) -> OutputPaths {
		OutputPaths {
			edep: dir.join(&self.edep),
			vacancy_map: dir.join(&self.vacancy_map),
			summary: dir.join(&self.summary),
		}
	}

	/// Insert `tag` before the extension of every file name, e.g. `_w2`.
	pub fn with_suffix(&self, tag: &str) -> OutputPaths {
		fn tagged(path: &Path, tag: &str) -> PathBuf {
			let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("out");
			let name = match path.extension().and_then(|e| e.to_str()) {
				Some(ext) => format!("{}{}.{}", stem, tag, ext),
				None => format!("{}{}", stem, tag),
			};
			path.with_file_name(name)
		}
		OutputPaths {
			edep: tagged(&self.edep, tag),
			vacancy_map: tagged(&self.vacancy_map, tag),
			summary: tagged(&self.summary, tag),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimConfig {
	pub film: FilmGeometry,
	pub vacancy: VacancyParams,
	pub output: OutputPaths,
}

fn parse_value<T: FromStr>(command: &str, value: &str) -> Result<T>
where
	T::Err: std::error::Error + Send + Sync + 'static,
{
	value
		.parse::<T>()
		.with_context(|| format!("invalid value '{}' for {}", value, command))
}

fn parse_bool(command: &str, value: &str) -> Result<bool> {
	match value.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(anyhow!("invalid boolean '{}' for {}", value, command)),
	}
}

impl SimConfig {
	/// Apply one command. Returns `Ok(false)` for commands this crate does not own.
	pub fn apply_command(&mut self, command: &str, value: &str) -> Result<bool> {
		let film = &mut self.film;
		let vac = &mut self.vacancy;
		match command {
			"/det/hfo2ThicknessNm" => film.thickness_nm = parse_value(command, value)?,
			"/det/padSizeUm" => film.pad_size_um = parse_value(command, value)?,
			"/det/voxelDxNm" => film.voxel_dx_nm = parse_value(command, value)?,
			"/det/voxelDyNm" => film.voxel_dy_nm = parse_value(command, value)?,
			"/det/voxelDzNm" => film.voxel_dz_nm = parse_value(command, value)?,
			"/det/vacConcCm3" => vac.init_conc_cm3 = parse_value(command, value)?,
			"/det/vacSeed" => vac.init_seed = parse_value(command, value)?,
			"/det/hfo2Rho_g_cm3" => vac.rho_g_cm3 = parse_value(command, value)?,
			"/vac/molarMass_g_mol" => vac.molar_mass_g_mol = parse_value(command, value)?,
			"/vac/W_eV" => vac.w_ev = parse_value(command, value)?,
			"/vac/EaBase_eV" => vac.ea_base_ev = parse_value(command, value)?,
			"/vac/EaFast_eV" => vac.ea_fast_ev = parse_value(command, value)?,
			"/vac/fastOnlyNearSeed" => vac.fast_only_near_seed = parse_bool(command, value)?,
			"/out/edep" => self.output.edep = PathBuf::from(value),
			"/out/vacancyMap" => self.output.vacancy_map = PathBuf::from(value),
			"/out/summary" => self.output.summary = PathBuf::from(value),
			_ => return Ok(false),
		}
		Ok(true)
	}

	/// Apply every command of a macro text on top of the current values.
	pub fn apply_macro_str(&mut self, text: &str) -> Result<()> {
		for (line_no, raw_line) in text.lines().enumerate() {
			let line = raw_line
				.split_once('#')
				.map(|(before, _)| before)
				.unwrap_or(raw_line)
				.trim();
			if line.is_empty() {
				continue;
			}
			let Some(caps) = command_regex().captures(line) else {
				bail!("line {}: not a command: '{}'", line_no + 1, line);
			};
			let command = &caps[1];
			let value = caps.get(2).map(|m| m.as_str()).unwrap_or("");

			let owned = command.starts_with("/det/") || command.starts_with("/vac/") || command.starts_with("/out/");
			if owned && value.is_empty() {
				bail!("line {}: {} needs a value", line_no + 1, command);
			}
			let applied = self
				.apply_command(command, value)
				.with_context(|| format!("line {}", line_no + 1))?;
			if !applied {
				log::warn!("line {}: ignoring command {}", line_no + 1, command);
			}
		}
		Ok(())
	}

	pub fn from_macro_str(text: &str) -> Result<Self> {
		let mut config = SimConfig::default();
		config.apply_macro_str(text)?;
		Ok(config)
	}

	pub fn from_macro_file(path: &Path) -> Result<Self> {
		let text = fs::read_to_string(path)
			.with_context(|| format!("failed to read macro file {}", path.display()))?;
		Self::from_macro_str(&text).with_context(|| format!("in macro file {}", path.display()))
	}
}
