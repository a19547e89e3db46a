use log::info;

use covidmap::postgis;
use covidmap::{
	aggregate_shires, append_run_log, compute_shire_incidence, compute_town_incidence,
	extract_snapshot, load_geometry, load_population, load_shire_cases, load_town_cases,
	magic_open, Config, CountMeter, Fetcher, Level, MissTally,
	SHIRE_CASES_DATASET, SHIRE_GEOMETRY_DATASET, SHIRE_POPULATION_DATASET,
	TOWN_GEOMETRY_DATASET, TOWN_POPULATION_DATASET,
};


fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();
	let config = Config::from_env();

	println!("loading boundary data ...");
	let town_boundaries = load_geometry(Level::Town, TOWN_GEOMETRY_DATASET, magic_open(&config.town_geometry_path)?)?;
	let shire_boundaries = load_geometry(Level::Shire, SHIRE_GEOMETRY_DATASET, magic_open(&config.shire_geometry_path)?)?;
	info!("{} town boundaries, {} shire boundaries", town_boundaries.len(), shire_boundaries.len());

	println!("loading population data ...");
	let town_populations = load_population(Level::Town, TOWN_POPULATION_DATASET, magic_open(&config.town_population_path)?)?;
	let shire_populations = load_population(Level::Shire, SHIRE_POPULATION_DATASET, magic_open(&config.shire_population_path)?)?;
	info!("{} town population rows, {} shire population rows", town_populations.len(), shire_populations.len());

	println!("fetching case data ...");
	let fetcher = Fetcher::new();
	let town_body = fetcher.fetch_csv(&config.town_cases_url)?;
	let shire_body = fetcher.fetch_csv(&config.shire_cases_url)?;
	let town_cases = load_town_cases(town_body.as_ref())?;
	let shire_cases_raw = load_shire_cases(shire_body.as_ref())?;
	info!("{} town case rows, {} raw shire case rows", town_cases.len(), shire_cases_raw.len());

	println!("aggregating shires from towns ...");
	let mut meter = CountMeter::new();
	let shire_cases = aggregate_shires(&town_cases, &mut meter);
	// The published shire series is derived from town rows; the shire
	// endpoint only serves as a cross-check on how current our towns are.
	if let Some(source_max) = shire_cases_raw.iter().map(|r| r.date).max() {
		let aggregated_max = shire_cases.iter().map(|r| r.date).max();
		info!(
			"{} reaches {}, aggregated shire series reaches {:?}",
			SHIRE_CASES_DATASET, source_max, aggregated_max,
		);
	}

	println!("computing incidence ...");
	let mut tally = MissTally::new();
	let town_series = compute_town_incidence(&town_cases, &town_populations, &mut tally);
	let shire_series = compute_shire_incidence(&shire_cases, &shire_populations, &mut tally);

	println!("extracting snapshots ...");
	let town_snapshot = extract_snapshot(Level::Town, &town_series, &town_boundaries)?;
	let shire_snapshot = extract_snapshot(Level::Shire, &shire_series, &shire_boundaries)?;
	if town_snapshot.date != shire_snapshot.date {
		// expected whenever the two sources update asynchronously
		info!("snapshot dates differ: towns {}, shires {}", town_snapshot.date, shire_snapshot.date);
	}

	println!("publishing to store ...");
	let mut store = postgis::Store::connect(&config.store_dsn)?;
	store.replace_all(&town_series, &shire_series, &town_snapshot, &shire_snapshot)?;
	println!(
		"synced {} + {} series rows, {} + {} map rows",
		town_series.len(), shire_series.len(),
		town_snapshot.rows.len(), shire_snapshot.rows.len(),
	);
	if tally.total() > 0 {
		println!("population lookups defaulted to 0: {}", tally);
	}

	append_run_log(&config.run_log_path, shire_snapshot.date)?;
	println!("done, latest shire date {}", shire_snapshot.date);
	Ok(())
}
