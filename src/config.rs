use std::env;
use std::path::PathBuf;


static TOWN_CASES_URL: &'static str = "https://analisi.transparenciacatalunya.cat/api/views/jj6z-iyrp/rows.csv?accessType=DOWNLOAD&sorting=true";
static SHIRE_CASES_URL: &'static str = "https://analisi.transparenciacatalunya.cat/api/views/c7sd-zy9j/rows.csv?accessType=DOWNLOAD&sorting=true";
static STORE_DSN: &'static str = "postgresql://covidmap@127.0.0.1:5432/covidmap";


#[derive(Debug, Clone)]
pub struct Config {
	pub town_cases_url: String,
	pub shire_cases_url: String,
	pub town_population_path: PathBuf,
	pub shire_population_path: PathBuf,
	pub town_geometry_path: PathBuf,
	pub shire_geometry_path: PathBuf,
	pub store_dsn: String,
	pub run_log_path: PathBuf,
}

impl Config {
	pub fn from_env() -> Self {
		Self{
			town_cases_url: env::var("COVIDMAP_TOWN_CASES_URL").unwrap_or_else(|_| TOWN_CASES_URL.into()),
			shire_cases_url: env::var("COVIDMAP_SHIRE_CASES_URL").unwrap_or_else(|_| SHIRE_CASES_URL.into()),
			town_population_path: path_var("COVIDMAP_TOWN_POPULATION", "admin/pop_towns.csv"),
			shire_population_path: path_var("COVIDMAP_SHIRE_POPULATION", "admin/pop_shires.csv"),
			town_geometry_path: path_var("COVIDMAP_TOWN_GEOMETRY", "admin/towns.geojson"),
			shire_geometry_path: path_var("COVIDMAP_SHIRE_GEOMETRY", "admin/shires.geojson"),
			store_dsn: env::var("COVIDMAP_STORE_DSN").unwrap_or_else(|_| STORE_DSN.into()),
			run_log_path: path_var("COVIDMAP_RUN_LOG", "log.txt"),
		}
	}
}

fn path_var(name: &str, default: &str) -> PathBuf {
	env::var_os(name).map(PathBuf::from).unwrap_or_else(|| default.into())
}
