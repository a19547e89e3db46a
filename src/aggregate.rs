use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::cases::{CaseRecord, TownCaseRecord};
use crate::codes::{AdminCode, Level};
use crate::progress::ProgressSink;


/// Derive the shire-level series from town rows: one output row per
/// observed (date, shire), carrying the sum of all town counts for it.
///
/// Shires are enumerated from the codes observed in the input, so a shire
/// without rows on a date is absent from that date, not zero; downstream
/// joins fill those with zero where a row is needed. The whole input is
/// grouped in a single pass, the per-date progress updates only pace the
/// emission loop.
pub fn aggregate_shires<S: ProgressSink + ?Sized>(towns: &[TownCaseRecord], progress: &mut S) -> Vec<CaseRecord> {
	let mut by_date: BTreeMap<NaiveDate, BTreeMap<AdminCode, u64>> = BTreeMap::new();
	for rec in towns {
		let code = Level::Shire.normalize(&rec.shire_code);
		if Level::Shire.is_unclassified(&code) {
			continue
		}
		*by_date.entry(rec.date).or_default().entry(code).or_insert(0) += rec.cases;
	}

	progress.begin(by_date.len());
	let mut result = Vec::new();
	for (i, (date, shires)) in by_date.iter().enumerate() {
		for (code, cases) in shires.iter() {
			result.push(CaseRecord{
				date: *date,
				code: code.clone(),
				cases: *cases,
			});
		}
		if (i + 1) % 10 == 0 {
			progress.update(i + 1);
		}
	}
	progress.finish();
	result
}
