//! Recorded energy-deposition streams.
//!
//! One sample per line: `event x_nm y_nm z_nm edep_eV`, separated by
//! whitespace or commas. Consecutive lines with the same event id form one
//! event. A line holding only an event id records a primary that deposited
//! nothing in the film. `#` starts a comment; a non-numeric first line is
//! taken as a header.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::units::{EV, NANOMETER};
use crate::voxel_grid::geometry::Vec3;

/// One energy deposit, in internal units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepositSample {
	pub position: Vec3,
	pub edep: f64,
}

/// All deposits of one primary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventRecord {
	pub event_id: u64,
	pub samples: Vec<DepositSample>,
}

fn fields(line: &str) -> impl Iterator<Item = &str> {
	line.split(|c: char| c == ',' || c.is_whitespace())
		.filter(|s| !s.is_empty())
}

fn parse_sample(tokens: &[&str]) -> Result<DepositSample> {
	let mut values = [0.0f64; 4];
	for (slot, token) in values.iter_mut().zip(tokens) {
		*slot = token
			.parse::<f64>()
			.with_context(|| format!("invalid number '{}'", token))?;
	}
	let [x, y, z, edep] = values;
	Ok(DepositSample {
		position: Vec3::new(x * NANOMETER, y * NANOMETER, z * NANOMETER),
		edep: edep * EV,
	})
}

pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<EventRecord>> {
	let mut events: Vec<EventRecord> = Vec::new();
	let mut seen_data = false;

	for (line_no, line_res) in reader.lines().enumerate() {
		let line = line_res?;
		let content = line.split_once('#').map(|(before, _)| before).unwrap_or(line.as_str());
		let tokens: Vec<&str> = fields(content).collect();
		if tokens.is_empty() {
			continue;
		}

		let event_id = match tokens[0].parse::<u64>() {
			Ok(id) => id,
			Err(_) if !seen_data => {
				log::debug!("skipping header line: {}", content.trim());
				seen_data = true;
				continue;
			}
			Err(_) => bail!("line {}: invalid event id '{}'", line_no + 1, tokens[0]),
		};
		seen_data = true;

		if events.last().map(|e| e.event_id) != Some(event_id) {
			events.push(EventRecord { event_id, samples: Vec::new() });
		}

		match tokens.len() {
			1 => {}
			5 => {
				let sample = parse_sample(&tokens[1..]).with_context(|| format!("line {}", line_no + 1))?;
				if let Some(event) = events.last_mut() {
					event.samples.push(sample);
				}
			}
			n => bail!("line {}: expected 1 or 5 fields, found {}", line_no + 1, n),
		}
	}
	Ok(events)
}

pub fn load_events(path: &Path) -> Result<Vec<EventRecord>> {
	let file = File::open(path).with_context(|| format!("failed to open deposit file {}", path.display()))?;
	read_events(BufReader::new(file)).with_context(|| format!("in deposit file {}", path.display()))
}
