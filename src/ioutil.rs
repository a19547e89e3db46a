use std::io;
use std::io::{Read, Write};
use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDate};

use flate2;


pub fn magic_open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn Read>> {
	let path = path.as_ref();
	match path.extension() {
		Some(x) if x == "gz" => {
			Ok(Box::new(flate2::read::GzDecoder::new(fs::File::open(path)?)))
		},
		_ => Ok(Box::new(fs::File::open(path)?)),
	}
}


/// Append the single per-run record operators diff against the expected run
/// cadence to spot stale data.
pub fn append_run_log<P: AsRef<Path>>(path: P, latest: NaiveDate) -> io::Result<()> {
	let mut f = fs::OpenOptions::new().create(true).append(true).open(path)?;
	let now = Local::now();
	writeln!(f, "Run at {}, latest date in DB: {}", now.format("%d/%m/%Y %H:%M:%S"), latest)?;
	Ok(())
}
