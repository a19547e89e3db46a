use std::collections::HashMap;
use std::io;

use log::warn;

use csv;

use crate::codes::{parse_integer_like, AdminCode, Level};
use crate::DataFormatError;


pub static TOWN_POPULATION_DATASET: &'static str = "town population";
pub static SHIRE_POPULATION_DATASET: &'static str = "shire population";


/// Reference mapping from canonical admin code to inhabitant count, one
/// entry per administrative unit of a level.
#[derive(Debug, Clone)]
pub struct PopulationTable {
	level: Level,
	by_code: HashMap<AdminCode, u64>,
}

impl PopulationTable {
	pub fn level(&self) -> Level {
		self.level
	}

	pub fn get(&self, code: &str) -> Option<u64> {
		self.by_code.get(code).copied()
	}

	pub fn len(&self) -> usize {
		self.by_code.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_code.is_empty()
	}

	#[cfg(test)]
	pub fn from_entries(level: Level, entries: &[(&str, u64)]) -> Self {
		Self{
			level,
			by_code: entries.iter().map(|(c, p)| ((*c).into(), *p)).collect(),
		}
	}
}

impl Level {
	fn population_columns(&self) -> (&'static str, &'static str) {
		match self {
			Self::Town => ("Codi", "Pop_total"),
			Self::Shire => ("ID", "Població"),
		}
	}
}


/// Load one semicolon-delimited population reference file. Rows with an
/// empty retained field or a non-positive count are dropped wholesale; a
/// code occurring twice is a hard error, the mapping must be unique.
pub fn load_population<R: io::Read>(level: Level, dataset: &'static str, r: R) -> Result<PopulationTable, DataFormatError> {
	let (code_column, population_column) = level.population_columns();
	let mut rdr = csv::ReaderBuilder::new()
		.delimiter(b';')
		.has_headers(true)
		.from_reader(r);
	let headers = rdr.headers().map_err(|e| DataFormatError::Csv{dataset, source: e})?;
	let code_index = match headers.iter().position(|h| h == code_column) {
		Some(i) => i,
		None => return Err(DataFormatError::MissingColumn{dataset, column: code_column}),
	};
	let population_index = match headers.iter().position(|h| h == population_column) {
		Some(i) => i,
		None => return Err(DataFormatError::MissingColumn{dataset, column: population_column}),
	};

	let mut by_code = HashMap::new();
	for (i, row) in rdr.records().enumerate() {
		let rec = row.map_err(|e| DataFormatError::Row{dataset, row: i + 1, source: e})?;
		let raw_code = rec.get(code_index).unwrap_or("");
		let raw_population = rec.get(population_index).unwrap_or("");
		if raw_code.is_empty() || raw_population.is_empty() {
			continue
		}
		let population = match parse_integer_like(raw_population) {
			Some(v) if v > 0 => v,
			_ => {
				warn!("{}: row {}: unusable population {:?}, dropping row", dataset, i + 1, raw_population);
				continue
			},
		};
		let code = level.normalize(raw_code);
		if level.is_unclassified(&code) {
			warn!("{}: row {}: unclassified code {:?}, dropping row", dataset, i + 1, raw_code);
			continue
		}
		if by_code.insert(code.clone(), population).is_some() {
			return Err(DataFormatError::DuplicateCode{dataset, code})
		}
	}
	if by_code.is_empty() {
		return Err(DataFormatError::Empty{dataset})
	}
	Ok(PopulationTable{level, by_code})
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn shire_population_is_keyed_by_normalized_code() {
		let body = "ID;Comarca;Població\n8;Barcelonès;500000\n25;Pla d'Urgell;37000\n";
		let table = load_population(Level::Shire, SHIRE_POPULATION_DATASET, body.as_bytes()).unwrap();
		assert_eq!(table.len(), 2);
		assert_eq!(table.get("08"), Some(500000));
		assert_eq!(table.get("25"), Some(37000));
		assert_eq!(table.get("8"), None);
	}

	#[test]
	fn rows_with_empty_fields_are_dropped() {
		let body = "ID;Comarca;Població\n8;Barcelonès;500000\n;Sense codi;100\n25;Pla d'Urgell;\n";
		let table = load_population(Level::Shire, SHIRE_POPULATION_DATASET, body.as_bytes()).unwrap();
		assert_eq!(table.len(), 1);
		assert_eq!(table.get("08"), Some(500000));
	}

	#[test]
	fn non_positive_population_is_dropped() {
		let body = "ID;Comarca;Població\n8;Barcelonès;500000\n25;Pla d'Urgell;0\n33;Altres;abc\n";
		let table = load_population(Level::Shire, SHIRE_POPULATION_DATASET, body.as_bytes()).unwrap();
		assert_eq!(table.len(), 1);
	}

	#[test]
	fn duplicate_codes_are_rejected() {
		let body = "ID;Comarca;Població\n8;Barcelonès;500000\n08;Barcelonès bis;1\n";
		match load_population(Level::Shire, SHIRE_POPULATION_DATASET, body.as_bytes()) {
			Err(DataFormatError::DuplicateCode{code, ..}) => assert_eq!(code, "08"),
			other => panic!("expected duplicate code error, got {:?}", other),
		}
	}

	#[test]
	fn town_population_uses_town_columns() {
		let body = "Codi;Municipi;Pop_total\n8019;Barcelona;1600000\n";
		let table = load_population(Level::Town, TOWN_POPULATION_DATASET, body.as_bytes()).unwrap();
		assert_eq!(table.get("08019"), Some(1600000));
	}

	#[test]
	fn float_rendered_counts_are_accepted() {
		let body = "ID;Comarca;Població\n8;Barcelonès;500000.0\n";
		let table = load_population(Level::Shire, SHIRE_POPULATION_DATASET, body.as_bytes()).unwrap();
		assert_eq!(table.get("08"), Some(500000));
	}
}
