use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use geo_types::Geometry;

use smartstring::alias::{String as SmartString};

use crate::codes::{AdminCode, Level};
use crate::geometry::GeometryRecord;
use crate::incidence::{round2, ShireIncidenceRecord, TownIncidenceRecord};


/// Common view over the per-level incidence series rows.
pub trait SeriesRow {
	fn date(&self) -> NaiveDate;
	fn code(&self) -> &AdminCode;
	fn cases(&self) -> u64;
	fn incidence(&self) -> f64;

	fn name(&self) -> &str {
		""
	}
}

impl SeriesRow for ShireIncidenceRecord {
	fn date(&self) -> NaiveDate {
		self.date
	}

	fn code(&self) -> &AdminCode {
		&self.code
	}

	fn cases(&self) -> u64 {
		self.cases
	}

	fn incidence(&self) -> f64 {
		self.incidence
	}
}

impl SeriesRow for TownIncidenceRecord {
	fn date(&self) -> NaiveDate {
		self.date
	}

	fn code(&self) -> &AdminCode {
		&self.town_code
	}

	fn cases(&self) -> u64 {
		self.cases
	}

	fn incidence(&self) -> f64 {
		self.incidence
	}

	fn name(&self) -> &str {
		&self.town_name
	}
}


#[derive(Debug, Clone)]
pub struct SnapshotRecord {
	pub code: AdminCode,
	pub name: SmartString,
	pub cases: u64,
	pub incidence: f64,
	/// None for case rows with no boundary match; published with a NULL
	/// geometry column rather than dropped.
	pub geometry: Option<Geometry<f64>>,
}


/// The most recent date of one level's series, joined onto that level's
/// boundaries for map rendering.
#[derive(Debug, Clone)]
pub struct Snapshot {
	pub level: Level,
	pub date: NaiveDate,
	pub rows: Vec<SnapshotRecord>,
}


#[derive(Debug)]
pub enum SnapshotError {
	EmptySeries{level: Level},
}

impl fmt::Display for SnapshotError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::EmptySeries{level} => write!(f, "cannot snapshot an empty {} series", level),
		}
	}
}

impl std::error::Error for SnapshotError {}


/// Select all rows at the level's most recent date and join them onto the
/// boundary set by code. Neither side is dropped: boundary units without a
/// case row come out zero-filled, case rows without a boundary keep an
/// absent geometry. Rows sharing a code at the snapshot date (towns are
/// delivered in several slices per day) are summed first.
pub fn extract_snapshot<R: SeriesRow>(level: Level, series: &[R], boundaries: &[GeometryRecord]) -> Result<Snapshot, SnapshotError> {
	let date = match series.iter().map(|r| r.date()).max() {
		Some(d) => d,
		None => return Err(SnapshotError::EmptySeries{level}),
	};

	let mut at_date: BTreeMap<AdminCode, (SmartString, u64, f64)> = BTreeMap::new();
	for row in series.iter().filter(|r| r.date() == date) {
		let entry = at_date.entry(row.code().clone()).or_insert_with(|| (row.name().into(), 0, 0.0));
		entry.1 += row.cases();
		entry.2 += row.incidence();
	}

	let mut rows = Vec::with_capacity(boundaries.len() + at_date.len());
	for boundary in boundaries {
		let (name, cases, incidence) = match at_date.remove(&boundary.code) {
			Some((row_name, cases, incidence)) => {
				let name = if boundary.name.is_empty() { row_name } else { boundary.name.clone() };
				(name, cases, round2(incidence))
			},
			None => (boundary.name.clone(), 0, 0.0),
		};
		rows.push(SnapshotRecord{
			code: boundary.code.clone(),
			name,
			cases,
			incidence,
			geometry: Some(boundary.geometry.clone()),
		});
	}
	for (code, (name, cases, incidence)) in at_date {
		rows.push(SnapshotRecord{
			code,
			name,
			cases,
			incidence: round2(incidence),
			geometry: None,
		});
	}
	rows.sort_by(|a, b| a.code.cmp(&b.code));

	Ok(Snapshot{level, date, rows})
}
