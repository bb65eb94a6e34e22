use crate::record::{FieldValue, Record};
use std::collections::HashSet;
use tracing::debug;

/// Record types left out of the output tables by default.
pub const EXCLUDED_TYPES: [&str; 4] = ["data", "mastersthesis", "phdthesis", "www"];

/// Drops unwanted record types and normalizes `year`, preserving order.
#[derive(Debug, Clone)]
pub struct PostProcessor {
    excluded: HashSet<String>,
}

impl Default for PostProcessor {
    fn default() -> Self {
        PostProcessor::new(EXCLUDED_TYPES)
    }
}

impl PostProcessor {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PostProcessor {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keeps(&self, record: &Record) -> bool {
        !self.excluded.contains(&record.kind)
    }

    pub fn normalize(&self, mut record: Record) -> Record {
        let year = normalize_year(record.get("year"));
        record.set("year", year);
        record
    }

    /// Filters and normalizes a record stream. Errors pass through untouched.
    pub fn apply<I, E>(&self, records: I) -> impl Iterator<Item = Result<Record, E>>
    where
        I: IntoIterator<Item = Result<Record, E>>,
    {
        records.into_iter().filter_map(move |record| match record {
            Ok(record) if self.keeps(&record) => Some(Ok(self.normalize(record))),
            Ok(record) => {
                debug!(kind = %record.kind, key = ?record.key, "dropping record");
                None
            }
            Err(error) => Some(Err(error)),
        })
    }
}

/// Removes whitespace inside a year such as `"2 015"`. A year with nothing
/// left, or no year at all, becomes absent.
pub fn normalize_year(year: &FieldValue) -> FieldValue {
    match year {
        FieldValue::Scalar(text) => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            if compact.is_empty() {
                FieldValue::Absent
            } else {
                FieldValue::Scalar(compact)
            }
        }
        _ => FieldValue::Absent,
    }
}
