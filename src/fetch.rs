use std::fmt;
use std::thread;
use std::time::Duration;

use bytes::Bytes;

use log::warn;

use reqwest;


static FETCH_ATTEMPTS: u32 = 3;


#[derive(Debug)]
pub enum FetchError {
	Request(reqwest::Error),
}

impl fmt::Display for FetchError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Request(e) => fmt::Display::fmt(e, f),
		}
	}
}

impl From<reqwest::Error> for FetchError {
	fn from(err: reqwest::Error) -> Self {
		Self::Request(err)
	}
}

impl std::error::Error for FetchError {}


pub struct Fetcher {
	client: reqwest::blocking::Client,
}

impl Fetcher {
	pub fn new() -> Self {
		Self{
			client: reqwest::blocking::Client::new(),
		}
	}

	/// Download one remote CSV body, retrying transient failures with a
	/// linear backoff before giving up for the run.
	pub fn fetch_csv(&self, url: &str) -> Result<Bytes, FetchError> {
		let mut attempt = 1;
		loop {
			match self.try_fetch(url) {
				Ok(body) => return Ok(body),
				Err(e) if attempt < FETCH_ATTEMPTS => {
					warn!("fetch attempt {}/{} for {} failed: {}", attempt, FETCH_ATTEMPTS, url, e);
					thread::sleep(Duration::from_secs((attempt * 2) as u64));
					attempt += 1;
				},
				Err(e) => return Err(e),
			}
		}
	}

	fn try_fetch(&self, url: &str) -> Result<Bytes, FetchError> {
		let resp = self.client.get(url).send()?;
		let resp = resp.error_for_status()?;
		Ok(resp.bytes()?)
	}
}
