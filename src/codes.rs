use std::fmt;

use smartstring::alias::{String as SmartString};

use enum_map::Enum;


/// Normalized administrative code, fixed-width and left zero-padded per level.
pub type AdminCode = SmartString;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum Level {
	Town,
	Shire,
}

impl fmt::Display for Level {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Town => f.write_str("town"),
			Self::Shire => f.write_str("shire"),
		}
	}
}

impl Level {
	pub fn width(&self) -> usize {
		match self {
			Self::Town => 5,
			Self::Shire => 2,
		}
	}

	pub fn sentinel(&self) -> AdminCode {
		match self {
			Self::Town => "0".into(),
			Self::Shire => "00".into(),
		}
	}

	/// Canonicalize a raw identifier as delivered by any of the sources.
	///
	/// Accepts plain integers ("8"), already-padded codes ("08") and float
	/// renderings ("8.0"); all of them map to the same fixed-width code.
	/// Anything negative or non-numeric maps to the level sentinel.
	pub fn normalize(&self, raw: &str) -> AdminCode {
		match parse_integer_like(raw) {
			Some(id) => self.normalize_id(id),
			None => self.sentinel(),
		}
	}

	pub fn normalize_id(&self, id: u64) -> AdminCode {
		format!("{:01$}", id, self.width()).into()
	}

	/// Sentinel and zero codes stand for rows the sources could not assign
	/// to a real administrative unit. They must not survive aggregation.
	pub fn is_unclassified(&self, code: &str) -> bool {
		code.bytes().all(|b| b == b'0')
	}
}


pub(crate) fn parse_integer_like(raw: &str) -> Option<u64> {
	let raw = raw.trim();
	if raw.is_empty() {
		return None
	}
	if let Ok(v) = raw.parse::<u64>() {
		return Some(v)
	}
	match raw.parse::<f64>() {
		Ok(v) if v >= 0.0 && v.fract() == 0.0 => Some(v as u64),
		_ => None,
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalize_pads_to_level_width() {
		assert_eq!(Level::Shire.normalize("8"), "08");
		assert_eq!(Level::Town.normalize("8019"), "08019");
		assert_eq!(Level::Shire.normalize("25"), "25");
		assert_eq!(Level::Town.normalize("8019").len(), Level::Town.width());
	}

	#[test]
	fn normalize_agrees_across_source_representations() {
		let from_int = Level::Shire.normalize_id(8);
		assert_eq!(Level::Shire.normalize("8"), from_int);
		assert_eq!(Level::Shire.normalize("08"), from_int);
		assert_eq!(Level::Shire.normalize("8.0"), from_int);
	}

	#[test]
	fn normalize_is_idempotent() {
		for raw in &["8", "08", "8.0", "abc", "", "-3"] {
			let once = Level::Shire.normalize(raw);
			assert_eq!(Level::Shire.normalize(&once), once);
			let once = Level::Town.normalize(raw);
			assert_eq!(Level::Town.normalize(&once), once);
		}
	}

	#[test]
	fn invalid_input_maps_to_sentinel() {
		assert_eq!(Level::Shire.normalize("abc"), "00");
		assert_eq!(Level::Shire.normalize(""), "00");
		assert_eq!(Level::Shire.normalize("-3"), "00");
		assert_eq!(Level::Shire.normalize("8.5"), "00");
		assert_eq!(Level::Town.normalize("abc"), "0");
	}

	#[test]
	fn wide_values_pass_through_unpadded() {
		assert_eq!(Level::Shire.normalize("123"), "123");
	}

	#[test]
	fn unclassified_detection() {
		assert!(Level::Shire.is_unclassified("00"));
		assert!(Level::Shire.is_unclassified("0"));
		assert!(Level::Town.is_unclassified("00000"));
		assert!(!Level::Shire.is_unclassified("08"));
		assert!(!Level::Town.is_unclassified("08019"));
	}
}
