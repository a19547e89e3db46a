use std::fmt;
use std::fmt::Write;

use geo_types::{Geometry, LineString, Polygon};


#[derive(Debug, Clone)]
pub struct UnsupportedGeometry;

impl fmt::Display for UnsupportedGeometry {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str("unsupported geometry type, need polygon or multipolygon")
	}
}

impl std::error::Error for UnsupportedGeometry {}


/// Render a boundary as EWKT for the store. The destination columns are
/// uniformly multipolygon-typed, so plain polygons are promoted to
/// single-member multipolygons.
pub fn geometry_ewkt(geometry: &Geometry<f64>, srid: u32) -> Result<String, UnsupportedGeometry> {
	let mut out = String::new();
	write!(&mut out, "SRID={};", srid).expect("write to String failed");
	match geometry {
		Geometry::Polygon(p) => write_multipolygon(&mut out, std::slice::from_ref(p)),
		Geometry::MultiPolygon(mp) => write_multipolygon(&mut out, &mp.0),
		_ => return Err(UnsupportedGeometry),
	}
	Ok(out)
}

fn write_multipolygon(out: &mut String, polygons: &[Polygon<f64>]) {
	if polygons.is_empty() {
		out.push_str("MULTIPOLYGON EMPTY");
		return
	}
	out.push_str("MULTIPOLYGON(");
	for (i, polygon) in polygons.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}
		write_polygon_body(out, polygon);
	}
	out.push(')');
}

fn write_polygon_body(out: &mut String, polygon: &Polygon<f64>) {
	out.push('(');
	write_ring(out, polygon.exterior());
	for ring in polygon.interiors() {
		out.push(',');
		write_ring(out, ring);
	}
	out.push(')');
}

fn write_ring(out: &mut String, ring: &LineString<f64>) {
	out.push('(');
	for (i, c) in ring.0.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}
		write!(out, "{} {}", c.x, c.y).expect("write to String failed");
	}
	out.push(')');
}
