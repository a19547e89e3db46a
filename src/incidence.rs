use std::fmt;

use chrono::NaiveDate;

use enum_map::EnumMap;

use smartstring::alias::{String as SmartString};

use crate::cases::{CaseRecord, TownCaseRecord};
use crate::codes::{AdminCode, Level};
use crate::population::PopulationTable;


/// Per-level count of series rows whose code had no population entry and
/// therefore published incidence 0. Reported at end of run; a missing
/// denominator never aborts a run.
#[derive(Debug, Clone, Default)]
pub struct MissTally {
	misses: EnumMap<Level, u64>,
}

impl MissTally {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&mut self, level: Level) {
		self.misses[level] += 1;
	}

	pub fn get(&self, level: Level) -> u64 {
		self.misses[level]
	}

	pub fn total(&self) -> u64 {
		self.misses.iter().map(|(_, v)| *v).sum()
	}
}

impl fmt::Display for MissTally {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		write!(
			f,
			"{} town rows, {} shire rows without population match",
			self.misses[Level::Town],
			self.misses[Level::Shire],
		)
	}
}


#[derive(Debug, Clone, PartialEq)]
pub struct ShireIncidenceRecord {
	pub date: NaiveDate,
	pub code: AdminCode,
	pub cases: u64,
	pub incidence: f64,
}


#[derive(Debug, Clone, PartialEq)]
pub struct TownIncidenceRecord {
	pub date: NaiveDate,
	pub town_code: AdminCode,
	pub shire_code: AdminCode,
	pub town_name: SmartString,
	pub cases: u64,
	pub incidence: f64,
}


pub fn round2(v: f64) -> f64 {
	(v * 100.0).round() / 100.0
}

/// Cases per 100 000 inhabitants, rounded to two decimal places.
pub fn incidence_per_100k(cases: u64, population: u64) -> f64 {
	round2(100_000.0 * cases as f64 / population as f64)
}

fn incidence_or_default(level: Level, code: &str, cases: u64, populations: &PopulationTable, tally: &mut MissTally) -> f64 {
	match populations.get(code) {
		Some(population) => incidence_per_100k(cases, population),
		None => {
			tally.record(level);
			0.0
		},
	}
}


/// Extend the full shire series with incidence. The population lookup is a
/// prebuilt code-keyed table, one O(1) probe per row.
pub fn compute_shire_incidence(series: &[CaseRecord], populations: &PopulationTable, tally: &mut MissTally) -> Vec<ShireIncidenceRecord> {
	assert_eq!(populations.level(), Level::Shire);
	series.iter().map(|rec| {
		ShireIncidenceRecord{
			date: rec.date,
			code: rec.code.clone(),
			cases: rec.cases,
			incidence: incidence_or_default(Level::Shire, &rec.code, rec.cases, populations, tally),
		}
	}).collect()
}


/// Extend the full town series with incidence, same formula and the same
/// default-to-zero policy on a missing denominator as the shire level.
pub fn compute_town_incidence(series: &[TownCaseRecord], populations: &PopulationTable, tally: &mut MissTally) -> Vec<TownIncidenceRecord> {
	assert_eq!(populations.level(), Level::Town);
	series.iter().map(|rec| {
		TownIncidenceRecord{
			date: rec.date,
			town_code: rec.town_code.clone(),
			shire_code: rec.shire_code.clone(),
			town_name: rec.town_name.clone(),
			cases: rec.cases,
			incidence: incidence_or_default(Level::Town, &rec.town_code, rec.cases, populations, tally),
		}
	}).collect()
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn incidence_formula_matches_the_reference_scenario() {
		// 15 cases at 500 000 inhabitants is 3 per 100k
		assert_eq!(incidence_per_100k(15, 500_000), 3.0);
		assert_eq!(incidence_per_100k(0, 500_000), 0.0);
	}

	#[test]
	fn incidence_rounds_to_two_decimals() {
		// 7/300000*100000 = 2.333...
		assert_eq!(incidence_per_100k(7, 300_000), 2.33);
		// 5/3000*100000 = 166.666...
		assert_eq!(incidence_per_100k(5, 3_000), 166.67);
	}

	#[test]
	fn shire_series_gets_incidence_per_row() {
		let populations = PopulationTable::from_entries(Level::Shire, &[("08", 500_000)]);
		let series = vec![
			CaseRecord{date: NaiveDate::from_ymd(2021, 1, 1), code: "08".into(), cases: 15},
			CaseRecord{date: NaiveDate::from_ymd(2021, 1, 2), code: "08".into(), cases: 30},
		];
		let mut tally = MissTally::new();
		let out = compute_shire_incidence(&series, &populations, &mut tally);
		assert_eq!(out[0].incidence, 3.0);
		assert_eq!(out[1].incidence, 6.0);
		assert_eq!(tally.total(), 0);
	}

	#[test]
	fn missing_population_defaults_to_zero_and_is_tallied() {
		let populations = PopulationTable::from_entries(Level::Shire, &[("08", 500_000)]);
		let series = vec![
			CaseRecord{date: NaiveDate::from_ymd(2021, 1, 1), code: "99".into(), cases: 10},
		];
		let mut tally = MissTally::new();
		let out = compute_shire_incidence(&series, &populations, &mut tally);
		assert_eq!(out[0].incidence, 0.0);
		assert!(out[0].incidence.is_finite());
		assert_eq!(tally.get(Level::Shire), 1);
		assert_eq!(tally.get(Level::Town), 0);
	}

	#[test]
	fn town_misses_use_the_same_default_policy() {
		let populations = PopulationTable::from_entries(Level::Town, &[("08019", 1_600_000)]);
		let series = vec![
			TownCaseRecord{
				date: NaiveDate::from_ymd(2021, 1, 1),
				town_code: "08019".into(),
				shire_code: "08".into(),
				town_name: "Barcelona".into(),
				cases: 16,
			},
			TownCaseRecord{
				date: NaiveDate::from_ymd(2021, 1, 1),
				town_code: "0".into(),
				shire_code: "08".into(),
				town_name: "".into(),
				cases: 4,
			},
		];
		let mut tally = MissTally::new();
		let out = compute_town_incidence(&series, &populations, &mut tally);
		assert_eq!(out[0].incidence, 1.0);
		assert_eq!(out[1].incidence, 0.0);
		assert_eq!(tally.get(Level::Town), 1);
	}
}
