use std::fmt;

use log::info;

use postgres::{Client, NoTls, Transaction};

use crate::incidence::{ShireIncidenceRecord, TownIncidenceRecord};
use crate::snapshot::Snapshot;

mod ewkt;

pub use ewkt::{geometry_ewkt, UnsupportedGeometry};


pub const SRID: u32 = 4326;

pub static TOWN_SERIES_TABLE: &'static str = "towns_covid";
pub static SHIRE_SERIES_TABLE: &'static str = "shires_covid";
pub static TOWN_SNAPSHOT_TABLE: &'static str = "towns_map";
pub static SHIRE_SNAPSHOT_TABLE: &'static str = "shires_map";


#[derive(Debug)]
pub enum Error {
	Connect(postgres::Error),
	Sql(postgres::Error),
	Geometry(UnsupportedGeometry),
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Connect(e) => write!(f, "store connection failed: {}", e),
			Self::Sql(e) => fmt::Display::fmt(e, f),
			Self::Geometry(e) => fmt::Display::fmt(e, f),
		}
	}
}

impl From<UnsupportedGeometry> for Error {
	fn from(err: UnsupportedGeometry) -> Self {
		Self::Geometry(err)
	}
}

impl std::error::Error for Error {}


pub struct Store {
	client: Client,
}

impl Store {
	pub fn connect(dsn: &str) -> Result<Self, Error> {
		Ok(Self{
			client: Client::connect(dsn, NoTls).map_err(Error::Connect)?,
		})
	}

	/// Replace the four destination tables with this run's output. All four
	/// writes share one transaction so a failing run leaves the previous
	/// publication intact instead of a half-updated store.
	pub fn replace_all(
			&mut self,
			town_series: &[TownIncidenceRecord],
			shire_series: &[ShireIncidenceRecord],
			town_snapshot: &Snapshot,
			shire_snapshot: &Snapshot,
	) -> Result<(), Error> {
		let mut tx = self.client.transaction().map_err(Error::Sql)?;
		replace_town_series(&mut tx, town_series)?;
		info!("{}: staged {} rows", TOWN_SERIES_TABLE, town_series.len());
		replace_shire_series(&mut tx, shire_series)?;
		info!("{}: staged {} rows", SHIRE_SERIES_TABLE, shire_series.len());
		replace_snapshot(&mut tx, TOWN_SNAPSHOT_TABLE, town_snapshot)?;
		info!("{}: staged {} rows", TOWN_SNAPSHOT_TABLE, town_snapshot.rows.len());
		replace_snapshot(&mut tx, SHIRE_SNAPSHOT_TABLE, shire_snapshot)?;
		info!("{}: staged {} rows", SHIRE_SNAPSHOT_TABLE, shire_snapshot.rows.len());
		tx.commit().map_err(Error::Sql)?;
		Ok(())
	}
}

fn replace_town_series(tx: &mut Transaction, series: &[TownIncidenceRecord]) -> Result<(), Error> {
	tx.batch_execute(&format!(
		"DROP TABLE IF EXISTS {t}; \
		CREATE TABLE {t} ( \
			date DATE NOT NULL, \
			town_code TEXT NOT NULL, \
			shire_code TEXT NOT NULL, \
			town_name TEXT NOT NULL, \
			cases BIGINT NOT NULL, \
			incidence DOUBLE PRECISION NOT NULL \
		)",
		t = TOWN_SERIES_TABLE,
	)).map_err(Error::Sql)?;
	let stmt = tx.prepare(&format!(
		"INSERT INTO {} (date, town_code, shire_code, town_name, cases, incidence) VALUES ($1, $2, $3, $4, $5, $6)",
		TOWN_SERIES_TABLE,
	)).map_err(Error::Sql)?;
	for rec in series {
		tx.execute(&stmt, &[
			&rec.date,
			&rec.town_code.as_str(),
			&rec.shire_code.as_str(),
			&rec.town_name.as_str(),
			&(rec.cases as i64),
			&rec.incidence,
		]).map_err(Error::Sql)?;
	}
	Ok(())
}

fn replace_shire_series(tx: &mut Transaction, series: &[ShireIncidenceRecord]) -> Result<(), Error> {
	tx.batch_execute(&format!(
		"DROP TABLE IF EXISTS {t}; \
		CREATE TABLE {t} ( \
			date DATE NOT NULL, \
			shire_code TEXT NOT NULL, \
			cases BIGINT NOT NULL, \
			incidence DOUBLE PRECISION NOT NULL \
		)",
		t = SHIRE_SERIES_TABLE,
	)).map_err(Error::Sql)?;
	let stmt = tx.prepare(&format!(
		"INSERT INTO {} (date, shire_code, cases, incidence) VALUES ($1, $2, $3, $4)",
		SHIRE_SERIES_TABLE,
	)).map_err(Error::Sql)?;
	for rec in series {
		tx.execute(&stmt, &[
			&rec.date,
			&rec.code.as_str(),
			&(rec.cases as i64),
			&rec.incidence,
		]).map_err(Error::Sql)?;
	}
	Ok(())
}

fn replace_snapshot(tx: &mut Transaction, table: &str, snapshot: &Snapshot) -> Result<(), Error> {
	tx.batch_execute(&format!(
		"DROP TABLE IF EXISTS {t}; \
		CREATE TABLE {t} ( \
			code TEXT NOT NULL, \
			name TEXT NOT NULL, \
			date DATE NOT NULL, \
			cases BIGINT NOT NULL, \
			incidence DOUBLE PRECISION NOT NULL, \
			geom geometry(MULTIPOLYGON, {srid}) \
		)",
		t = table,
		srid = SRID,
	)).map_err(Error::Sql)?;
	let stmt = tx.prepare(&format!(
		"INSERT INTO {} (code, name, date, cases, incidence, geom) VALUES ($1, $2, $3, $4, $5, ST_GeomFromEWKT($6))",
		table,
	)).map_err(Error::Sql)?;
	for rec in snapshot.rows.iter() {
		let geom = match rec.geometry.as_ref() {
			Some(g) => Some(geometry_ewkt(g, SRID)?),
			None => None,
		};
		tx.execute(&stmt, &[
			&rec.code.as_str(),
			&rec.name.as_str(),
			&snapshot.date,
			&(rec.cases as i64),
			&rec.incidence,
			&geom,
		]).map_err(Error::Sql)?;
	}
	Ok(())
}
