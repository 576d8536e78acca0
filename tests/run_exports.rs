use std::fs;
use std::path::Path;

use indicatif::ProgressBar;
use tempfile::TempDir;

use vacancy_mc::config::SimConfig;
use vacancy_mc::deposits::load_events;
use vacancy_mc::reduce::run_workers;
use vacancy_mc::simulation::Simulation;

const MACRO: &str = "\
/det/hfo2ThicknessNm 3
/det/padSizeUm 0.003
/det/voxelDxNm 1
/det/voxelDyNm 1
/det/voxelDzNm 1
/det/vacConcCm3 0
/vac/W_eV 15
/vac/EaBase_eV 2
/vac/EaFast_eV 1.3
/run/beamOn 4
";

// Film spans x, y in [-1.5, 1.5) nm and z in [-3, 0) nm; the seed voxel is (1, 1, 1).
const DEPOSITS: &str = "\
event x_nm y_nm z_nm edep_eV
0  0.0  0.0 -1.5 30.0
0  0.0  0.0 -0.5  1.5
1  0.0  0.0 -2.5  1.0
2
3  0.0  0.0 -2.5  1.0
3  0.0  0.0  4.0 99.0
";

fn read_table(path: &Path) -> Vec<Vec<String>> {
	fs::read_to_string(path)
		.unwrap()
		.lines()
		.map(|line| line.split(',').map(str::to_string).collect())
		.collect()
}

fn summary_value(rows: &[Vec<String>], key: &str) -> String {
	rows.iter()
		.find(|row| row[0] == key)
		.map(|row| row[1].clone())
		.unwrap_or_else(|| panic!("missing key {}", key))
}

fn setup(dir: &TempDir) -> (SimConfig, Vec<vacancy_mc::deposits::EventRecord>) {
	let deposit_path = dir.path().join("deposits.txt");
	fs::write(&deposit_path, DEPOSITS).unwrap();
	let mut config = SimConfig::from_macro_str(MACRO).unwrap();
	config.output = config.output.in_dir(dir.path());
	(config, load_events(&deposit_path).unwrap())
}

#[test]
fn end_run_writes_all_three_tables() {
	let dir = TempDir::new().unwrap();
	let (config, events) = setup(&dir);
	assert_eq!(events.len(), 4);

	let mut sim = Simulation::new(&config).unwrap();
	sim.begin_run();
	sim.replay(&events, &ProgressBar::hidden());
	let summary = sim.end_run().unwrap();
	assert_eq!(summary.n_primaries, 4);

	// Event 0 charges the seed and grows (1,1,2) on the fast barrier;
	// (1,1,0) is also next to the seed: events 1 and 3 together pay its fast barrier.
	assert_eq!(summary.seed_captured_electrons, 2);
	assert_eq!(summary.total_created, 2);
	assert_eq!(summary.created_per_primary, 0.5);
	assert_eq!(summary.total_edep_ev, 33.5);

	let edep = read_table(&config.output.edep);
	assert_eq!(edep[0].join(","), "ix,iy,iz,edepRun_eV,seed");
	assert_eq!(edep.len(), 1 + 27);
	let seed_rows: Vec<_> = edep[1..].iter().filter(|row| row[4] == "1").collect();
	assert_eq!(seed_rows.len(), 1);
	assert_eq!(seed_rows[0][..4].join(","), "1,1,1,30");

	let map = read_table(&config.output.vacancy_map);
	assert_eq!(map[0].join(","), "ix,iy,iz,vacancyCount,Ebank_eV,edepRun_eV,seed");
	let row = |ix: usize, iy: usize, iz: usize| map[1 + iz + 3 * (iy + 3 * ix)].join(",");
	assert_eq!(row(1, 1, 1), "1,1,1,1,30,30,1");
	assert!(row(1, 1, 0).starts_with("1,1,0,1,"));
	assert!(row(1, 1, 0).ends_with(",2,0"));
	assert!(row(1, 1, 2).starts_with("1,1,2,1,"));

	let rows = read_table(&config.output.summary);
	assert_eq!(rows[0].join(","), "key,value");
	assert_eq!(summary_value(&rows, "totalCreated"), "2");
	assert_eq!(summary_value(&rows, "nPrimaries"), "4");
	assert_eq!(summary_value(&rows, "createdPerPrimary"), "0.5");
	assert_eq!(summary_value(&rows, "seedCapturedElectrons"), "2");
	assert_eq!(summary_value(&rows, "capacityPerVoxel"), "55");
	assert_eq!(summary_value(&rows, "initialVacancies"), "1");
	assert_eq!(summary_value(&rows, "totalVacancies"), "3");
}

#[test]
fn run_without_primaries_reports_zero_ratio() {
	let dir = TempDir::new().unwrap();
	let (config, _) = setup(&dir);
	let mut sim = Simulation::new(&config).unwrap();
	sim.begin_run();
	let summary = sim.end_run().unwrap();
	assert_eq!(summary.n_primaries, 0);
	assert_eq!(summary.created_per_primary, 0.0);
	let rows = read_table(&config.output.summary);
	assert_eq!(summary_value(&rows, "createdPerPrimary"), "0");
}

#[test]
fn unwritable_output_surfaces_an_error() {
	let dir = TempDir::new().unwrap();
	let (mut config, _) = setup(&dir);
	config.output.edep = dir.path().join("missing").join("edep.csv");
	let mut sim = Simulation::new(&config).unwrap();
	sim.begin_run();
	assert!(sim.end_run().is_err());
}

#[test]
fn worker_tallies_export_with_run_layout() {
	let dir = TempDir::new().unwrap();
	let (config, events) = setup(&dir);
	let tally = run_workers(&config, &events, 2, &ProgressBar::hidden()).unwrap();
	assert_eq!(tally.workers, 2);
	assert_eq!(tally.n_primaries, 4);
	assert_eq!(tally.initial_vacancies, 2);

	let paths = tally.export(&config.output).unwrap();
	assert_eq!(paths.vacancy_map, dir.path().join("hfO2_vacancy_map_merged.csv"));
	assert_eq!(paths.summary, dir.path().join("hfO2_vacancy_summary_merged.csv"));
	// Single-run names stay free for a sequential run in the same directory.
	assert!(!config.output.summary.exists());
	let map = read_table(&paths.vacancy_map);
	assert_eq!(map.len(), 1 + 27);
	let rows = read_table(&paths.summary);
	assert_eq!(summary_value(&rows, "workers"), "2");
	assert_eq!(summary_value(&rows, "nPrimaries"), "4");
	let edep = read_table(&paths.edep);
	let total: f64 = edep[1..].iter().map(|row| row[3].parse::<f64>().unwrap()).sum();
	assert_eq!(total, 33.5);
}
