use std::fmt;
use std::io;

pub mod postgis;

mod aggregate;
mod cases;
mod codes;
mod config;
mod fetch;
mod geometry;
mod incidence;
mod ioutil;
mod population;
mod progress;
mod snapshot;

pub use aggregate::*;
pub use cases::*;
pub use codes::*;
pub use config::*;
pub use fetch::*;
pub use geometry::*;
pub use incidence::*;
pub use ioutil::*;
pub use population::*;
pub use progress::*;
pub use snapshot::*;


/// Structured parse/format failure, carrying enough context (dataset, row,
/// column) to find the offending record in the source.
#[derive(Debug)]
pub enum DataFormatError {
	Csv{dataset: &'static str, source: csv::Error},
	Row{dataset: &'static str, row: usize, source: csv::Error},
	ColumnCount{dataset: &'static str, expected: usize, found: usize},
	MissingColumn{dataset: &'static str, column: &'static str},
	DuplicateCode{dataset: &'static str, code: AdminCode},
	GeoJson{dataset: &'static str, source: geojson::Error},
	NotAFeatureCollection{dataset: &'static str},
	Empty{dataset: &'static str},
	Io{dataset: &'static str, source: io::Error},
}

impl fmt::Display for DataFormatError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Csv{dataset, source} => write!(f, "{}: {}", dataset, source),
			Self::Row{dataset, row, source} => write!(f, "{}: data row {}: {}", dataset, row, source),
			Self::ColumnCount{dataset, expected, found} => write!(f, "{}: expected {} columns, got {}", dataset, expected, found),
			Self::MissingColumn{dataset, column} => write!(f, "{}: missing column {:?}", dataset, column),
			Self::DuplicateCode{dataset, code} => write!(f, "{}: duplicate code {}", dataset, code),
			Self::GeoJson{dataset, source} => write!(f, "{}: {}", dataset, source),
			Self::NotAFeatureCollection{dataset} => write!(f, "{}: not a GeoJSON feature collection", dataset),
			Self::Empty{dataset} => write!(f, "{}: no usable rows", dataset),
			Self::Io{dataset, source} => write!(f, "{}: {}", dataset, source),
		}
	}
}

impl std::error::Error for DataFormatError {}
