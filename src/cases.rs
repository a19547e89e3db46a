use std::io;

use serde::{de, Deserialize, Deserializer};

use chrono::NaiveDate;

use smartstring::alias::{String as SmartString};

use csv;

use crate::codes::{AdminCode, Level};
use crate::DataFormatError;


pub static TOWN_CASES_DATASET: &'static str = "town cases";
pub static SHIRE_CASES_DATASET: &'static str = "shire cases";

/// The upstream endpoints deliver a fixed, versioned column order without
/// stable header names. Both loaders parse positionally and reject a body
/// whose header width differs from the published schema.
pub const TOWN_CASES_COLUMNS: usize = 11;
pub const SHIRE_CASES_COLUMNS: usize = 13;

/// Demographic slice of the shire dataset covering all groups combined; the
/// per-group slices would double-count on summation.
pub static ALL_GROUPS_SLICE: &'static str = "Tots";

static UNCLASSIFIED_NAME: &'static str = "No classificat";


fn dmy_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
	where D: Deserializer<'de>
{
	let s = String::deserialize(deserializer)?;
	NaiveDate::parse_from_str(&s, "%d/%m/%Y").map_err(de::Error::custom)
}

fn maybe_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
	where D: Deserializer<'de>
{
	let s = String::deserialize(deserializer)?;
	if s.is_empty() {
		return Ok(0)
	}
	s.parse::<u64>().map_err(de::Error::custom)
}


/// One delivered row of the town endpoint, in upstream column order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTownRow {
	#[serde(deserialize_with = "dmy_date")]
	pub date: NaiveDate,
	pub shire_code: String,
	pub shire_name: String,
	pub town_code: String,
	pub town_name: String,
	pub district_code: String,
	pub district_name: String,
	pub sex_code: String,
	pub sex_name: String,
	pub case_type: String,
	#[serde(deserialize_with = "maybe_count")]
	pub cases: u64,
}


/// One delivered row of the shire endpoint, in upstream column order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawShireRow {
	pub shire_name: String,
	pub shire_code: String,
	#[serde(deserialize_with = "dmy_date")]
	pub date: NaiveDate,
	pub sex: String,
	pub age_group: String,
	pub residence: String,
	#[serde(deserialize_with = "maybe_count")]
	pub confirmed_cases: u64,
	#[serde(deserialize_with = "maybe_count")]
	pub pcr_tests: u64,
	#[serde(deserialize_with = "maybe_count")]
	pub admissions_total: u64,
	#[serde(deserialize_with = "maybe_count")]
	pub admissions_critical: u64,
	#[serde(deserialize_with = "maybe_count")]
	pub admitted_total: u64,
	#[serde(deserialize_with = "maybe_count")]
	pub admitted_critical: u64,
	#[serde(deserialize_with = "maybe_count")]
	pub deaths: u64,
}


#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
	pub date: NaiveDate,
	pub code: AdminCode,
	pub cases: u64,
}


#[derive(Debug, Clone, PartialEq)]
pub struct TownCaseRecord {
	pub date: NaiveDate,
	pub town_code: AdminCode,
	pub shire_code: AdminCode,
	pub town_name: SmartString,
	pub cases: u64,
}


fn read_rows<R: io::Read, T: de::DeserializeOwned, F: FnMut(T)>(
	dataset: &'static str,
	columns: usize,
	r: R,
	mut submit: F,
) -> Result<(), DataFormatError> {
	let rdr = csv::ReaderBuilder::new()
		.has_headers(false)
		.from_reader(r);
	let mut rows = rdr.into_records();
	let header = match rows.next() {
		Some(h) => h.map_err(|e| DataFormatError::Csv{dataset, source: e})?,
		None => return Err(DataFormatError::Empty{dataset}),
	};
	if header.len() != columns {
		return Err(DataFormatError::ColumnCount{dataset, expected: columns, found: header.len()})
	}
	for (i, row) in rows.enumerate() {
		let rec = row.map_err(|e| DataFormatError::Row{dataset, row: i + 1, source: e})?;
		let parsed: T = rec.deserialize(None).map_err(|e| DataFormatError::Row{dataset, row: i + 1, source: e})?;
		submit(parsed);
	}
	Ok(())
}


/// Load and project the town series: unclassified rows are dropped, codes
/// are canonicalized, and only the columns the pipeline consumes survive.
pub fn load_town_cases<R: io::Read>(r: R) -> Result<Vec<TownCaseRecord>, DataFormatError> {
	let mut result = Vec::new();
	read_rows(TOWN_CASES_DATASET, TOWN_CASES_COLUMNS, r, |raw: RawTownRow| {
		if raw.town_name == UNCLASSIFIED_NAME {
			return
		}
		let shire_code = Level::Shire.normalize(&raw.shire_code);
		if Level::Shire.is_unclassified(&shire_code) {
			return
		}
		result.push(TownCaseRecord{
			date: raw.date,
			town_code: Level::Town.normalize(&raw.town_code),
			shire_code,
			town_name: raw.town_name.into(),
			cases: raw.cases,
		});
	})?;
	if result.is_empty() {
		return Err(DataFormatError::Empty{dataset: TOWN_CASES_DATASET})
	}
	result.sort_by(|a, b| (a.date, &a.town_code).cmp(&(b.date, &b.town_code)));
	Ok(result)
}


/// Load and project the shire series, keeping only the all-groups-combined
/// slice.
pub fn load_shire_cases<R: io::Read>(r: R) -> Result<Vec<CaseRecord>, DataFormatError> {
	let mut result = Vec::new();
	read_rows(SHIRE_CASES_DATASET, SHIRE_CASES_COLUMNS, r, |raw: RawShireRow| {
		if raw.sex != ALL_GROUPS_SLICE {
			return
		}
		result.push(CaseRecord{
			date: raw.date,
			code: Level::Shire.normalize(&raw.shire_code),
			cases: raw.confirmed_cases,
		});
	})?;
	if result.is_empty() {
		return Err(DataFormatError::Empty{dataset: SHIRE_CASES_DATASET})
	}
	result.sort_by(|a, b| (a.date, &a.code).cmp(&(b.date, &b.code)));
	Ok(result)
}


#[cfg(test)]
mod tests {
	use super::*;

	static TOWN_HEADER: &'static str = "data,comarcacodi,comarcadescripcio,municipicodi,municipidescripcio,districtecodi,districtedescripcio,sexecodi,sexedescripcio,resultatcoviddescripcio,numcasos";
	static SHIRE_HEADER: &'static str = "nom,codi,data,sexe,grup_edat,residencia,casos_confirmat,pcr,ingressos_total,ingressos_critic,ingressats_total,ingressats_critic,exitus";

	fn town_body(rows: &[&str]) -> String {
		let mut s = String::from(TOWN_HEADER);
		for row in rows {
			s.push('\n');
			s.push_str(row);
		}
		s
	}

	fn shire_body(rows: &[&str]) -> String {
		let mut s = String::from(SHIRE_HEADER);
		for row in rows {
			s.push('\n');
			s.push_str(row);
		}
		s
	}

	#[test]
	fn town_rows_are_projected_and_normalized() {
		let body = town_body(&[
			"02/01/2021,8,Barcelonès,8019,Barcelona,1,Ciutat Vella,0,Dona,Positiu,10",
			"01/01/2021,8,Barcelonès,8101,Hospitalet,0,,1,Home,Positiu,5",
		]);
		let rows = load_town_cases(body.as_bytes()).unwrap();
		assert_eq!(rows.len(), 2);
		// sorted by date
		assert_eq!(rows[0].date, NaiveDate::from_ymd(2021, 1, 1));
		assert_eq!(rows[0].town_code, "08101");
		assert_eq!(rows[0].shire_code, "08");
		assert_eq!(rows[0].cases, 5);
		assert_eq!(rows[1].town_name, "Barcelona");
	}

	#[test]
	fn town_unclassified_rows_are_dropped() {
		let body = town_body(&[
			"01/01/2021,8,Barcelonès,8019,Barcelona,1,Ciutat Vella,0,Dona,Positiu,10",
			"01/01/2021,8,Barcelonès,,No classificat,,,0,Dona,Positiu,3",
			"01/01/2021,0,No classificat,8101,Hospitalet,0,,1,Home,Positiu,4",
			"01/01/2021,abc,?,8101,Hospitalet,0,,1,Home,Positiu,4",
		]);
		let rows = load_town_cases(body.as_bytes()).unwrap();
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].town_code, "08019");
	}

	#[test]
	fn town_missing_count_reads_as_zero() {
		let body = town_body(&[
			"01/01/2021,8,Barcelonès,8019,Barcelona,1,Ciutat Vella,0,Dona,Positiu,",
		]);
		let rows = load_town_cases(body.as_bytes()).unwrap();
		assert_eq!(rows[0].cases, 0);
	}

	#[test]
	fn unparseable_date_is_an_error_not_a_dropped_row() {
		let body = town_body(&[
			"01/01/2021,8,Barcelonès,8019,Barcelona,1,Ciutat Vella,0,Dona,Positiu,10",
			"2021-01-01,8,Barcelonès,8019,Barcelona,1,Ciutat Vella,0,Dona,Positiu,10",
		]);
		match load_town_cases(body.as_bytes()) {
			Err(DataFormatError::Row{dataset, row, ..}) => {
				assert_eq!(dataset, TOWN_CASES_DATASET);
				assert_eq!(row, 2);
			},
			other => panic!("expected row error, got {:?}", other),
		}
	}

	#[test]
	fn unexpected_column_count_is_rejected() {
		let body = "a,b,c\n1,2,3\n";
		match load_town_cases(body.as_bytes()) {
			Err(DataFormatError::ColumnCount{expected, found, ..}) => {
				assert_eq!(expected, TOWN_CASES_COLUMNS);
				assert_eq!(found, 3);
			},
			other => panic!("expected column count error, got {:?}", other),
		}
	}

	#[test]
	fn shire_rows_keep_only_the_combined_slice() {
		let body = shire_body(&[
			"Barcelonès,8,01/01/2021,Tots,Totes,Tots,120,400,5,1,10,2,0",
			"Barcelonès,8,01/01/2021,Dona,Totes,Tots,70,220,3,0,6,1,0",
			"Barcelonès,8,01/01/2021,Home,Totes,Tots,50,180,2,1,4,1,0",
		]);
		let rows = load_shire_cases(body.as_bytes()).unwrap();
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].code, "08");
		assert_eq!(rows[0].cases, 120);
	}

	#[test]
	fn empty_shire_series_is_an_error() {
		let body = shire_body(&[
			"Barcelonès,8,01/01/2021,Dona,Totes,Tots,70,220,3,0,6,1,0",
		]);
		match load_shire_cases(body.as_bytes()) {
			Err(DataFormatError::Empty{dataset}) => assert_eq!(dataset, SHIRE_CASES_DATASET),
			other => panic!("expected empty error, got {:?}", other),
		}
	}
}
