use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use vacancy_mc::config::SimConfig;
use vacancy_mc::deposits::load_events;
use vacancy_mc::reduce::run_workers;
use vacancy_mc::simulation::{Simulation, event_progress};
use vacancy_mc::voxel_grid::info;

/// Replay recorded energy deposits through the vacancy growth model.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
	/// Macro file with /det/, /vac/ and /out/ commands
	#[arg(short, long = "macro")]
	macro_file: Option<PathBuf>,

	/// Deposit samples: `event x_nm y_nm z_nm edep_eV` per line
	#[arg(short, long)]
	deposits: PathBuf,

	/// Directory for the output tables
	#[arg(short, long, default_value = ".")]
	out_dir: PathBuf,

	/// Override the vacancy initialization seed
	#[arg(long)]
	seed: Option<u64>,

	/// Independent worker streams; events are dealt round-robin
	#[arg(short, long, default_value_t = 1)]
	workers: usize,

	/// Hide the progress bar
	#[arg(short, long)]
	quiet: bool,
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	info::print_banner();
	info::print_compile_info();

	let mut config = match &args.macro_file {
		Some(path) => SimConfig::from_macro_file(path)?,
		None => SimConfig::default(),
	};
	if let Some(seed) = args.seed {
		config.vacancy.init_seed = seed;
	}
	fs::create_dir_all(&args.out_dir)
		.with_context(|| format!("failed to create output directory {}", args.out_dir.display()))?;
	config.output = config.output.in_dir(&args.out_dir);

	let events = load_events(&args.deposits)?;
	log::info!("loaded {} events from {}", events.len(), args.deposits.display());
	let progress = event_progress(events.len() as u64, args.quiet);

	if args.workers > 1 {
		let tally = run_workers(&config, &events, args.workers, &progress)?;
		progress.finish_with_message("Replay complete!");
		let written = tally.export(&config.output)?;
		log::debug!("merged summary at {}", written.summary.display());
		println!(
			"workers={} primaries={} created={} createdPerPrimary={}",
			tally.workers,
			tally.n_primaries,
			tally.total_created,
			vacancy_mc::vacancy::csv_output::created_per_primary(tally.total_created, tally.n_primaries)
		);
		return Ok(());
	}

	let mut sim = Simulation::new(&config).context("invalid scoring grid")?;
	sim.grid().report_memory();
	sim.begin_run();
	sim.replay(&events, &progress);
	progress.finish_with_message("Replay complete!");

	let summary = sim.end_run()?;
	println!(
		"primaries={} created={} createdPerPrimary={} seedElectrons={} edep_eV={}",
		summary.n_primaries,
		summary.total_created,
		summary.created_per_primary,
		summary.seed_captured_electrons,
		summary.total_edep_ev
	);
	Ok(())
}
