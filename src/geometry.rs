use std::collections::HashSet;
use std::io;
use std::io::Read;

use log::warn;

use geo_types::{Geometry, LineString, MultiPolygon, Polygon};

use geojson::GeoJson;

use smartstring::alias::{String as SmartString};

use crate::codes::{AdminCode, Level};
use crate::DataFormatError;


pub static TOWN_GEOMETRY_DATASET: &'static str = "town geometry";
pub static SHIRE_GEOMETRY_DATASET: &'static str = "shire geometry";


/// Static boundary of one administrative unit, date-independent.
#[derive(Debug, Clone)]
pub struct GeometryRecord {
	pub code: AdminCode,
	pub name: SmartString,
	pub geometry: Geometry<f64>,
}

impl Level {
	fn geometry_properties(&self) -> (&'static str, &'static str) {
		match self {
			Self::Town => ("codiine", "nom_muni"),
			Self::Shire => ("comarca", "nom_comarca"),
		}
	}
}

fn property_id(value: &serde_json::Value) -> Option<String> {
	match value {
		serde_json::Value::String(s) => Some(s.clone()),
		serde_json::Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn ring_from(ring: Vec<Vec<f64>>) -> LineString<f64> {
	LineString::from(
		ring.into_iter()
			.filter(|position| position.len() >= 2)
			.map(|position| (position[0], position[1]))
			.collect::<Vec<_>>()
	)
}

fn polygon_from(rings: Vec<Vec<Vec<f64>>>) -> Polygon<f64> {
	let mut rings = rings.into_iter().map(ring_from);
	let exterior = rings.next().unwrap_or_else(|| LineString::from(Vec::<(f64, f64)>::new()));
	Polygon::new(exterior, rings.collect())
}

/// Only polygonal features can be rendered on the map; everything else is
/// unusable for this pipeline.
fn areal_geometry(value: geojson::Value) -> Option<Geometry<f64>> {
	match value {
		geojson::Value::Polygon(rings) => Some(Geometry::Polygon(polygon_from(rings))),
		geojson::Value::MultiPolygon(members) => Some(Geometry::MultiPolygon(
			MultiPolygon(members.into_iter().map(polygon_from).collect())
		)),
		_ => None,
	}
}


/// Load one GeoJSON boundary set into per-unit records. Features without a
/// usable code or an areal geometry are dropped with a warning; they cannot
/// participate in code-keyed joins anyway.
pub fn load_geometry<R: io::Read>(level: Level, dataset: &'static str, mut r: R) -> Result<Vec<GeometryRecord>, DataFormatError> {
	let mut raw = String::new();
	r.read_to_string(&mut raw).map_err(|e| DataFormatError::Io{dataset, source: e})?;
	let collection = match raw.parse::<GeoJson>().map_err(|e| DataFormatError::GeoJson{dataset, source: e})? {
		GeoJson::FeatureCollection(fc) => fc,
		_ => return Err(DataFormatError::NotAFeatureCollection{dataset}),
	};

	let (code_property, name_property) = level.geometry_properties();
	let mut seen: HashSet<AdminCode> = HashSet::new();
	let mut result = Vec::with_capacity(collection.features.len());
	for (i, feature) in collection.features.into_iter().enumerate() {
		let properties = match feature.properties {
			Some(p) => p,
			None => {
				warn!("{}: feature {} has no properties, skipping", dataset, i);
				continue
			},
		};
		let raw_code = match properties.get(code_property).and_then(property_id) {
			Some(c) => c,
			None => {
				warn!("{}: feature {} has no {} property, skipping", dataset, i, code_property);
				continue
			},
		};
		let code = level.normalize(&raw_code);
		if level.is_unclassified(&code) {
			warn!("{}: feature {} has unclassified code {:?}, skipping", dataset, i, raw_code);
			continue
		}
		let name: SmartString = properties.get(name_property)
			.and_then(|v| v.as_str())
			.unwrap_or("")
			.into();
		let value = match feature.geometry {
			Some(g) => g.value,
			None => {
				warn!("{}: feature {} ({}) has no geometry, skipping", dataset, i, code);
				continue
			},
		};
		let geometry = match areal_geometry(value) {
			Some(g) => g,
			None => {
				warn!("{}: feature {} ({}) is not areal, skipping", dataset, i, code);
				continue
			},
		};
		if !seen.insert(code.clone()) {
			warn!("{}: duplicate code {}, keeping first occurrence", dataset, code);
			continue
		}
		result.push(GeometryRecord{code, name, geometry});
	}
	if result.is_empty() {
		return Err(DataFormatError::Empty{dataset})
	}
	Ok(result)
}
