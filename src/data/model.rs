use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

use super::error::IngestError;

// ---------------------------------------------------------------------------
// Cell – a single raw value before typing
// ---------------------------------------------------------------------------

/// A raw input cell. CSV yields `Text`, Parquet yields typed values.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Null,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Null => write!(f, "<null>"),
        }
    }
}

/// One raw input row: column_name → cell.
pub type RawRow = BTreeMap<String, Cell>;

// ---------------------------------------------------------------------------
// Record – one sampled reading
// ---------------------------------------------------------------------------

/// A single reading: combined timestamp plus the measured channels.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    /// Channel name → value. `NaN` marks an empty cell in the source.
    pub fields: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded log
// ---------------------------------------------------------------------------

/// A loaded log. Never empty, every record has the same field set, and the
/// record order is the source order.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    records: Vec<Record>,
    field_names: Vec<String>,
}

impl Dataset {
    /// Validate the invariants and build the dataset.
    pub fn from_records(name: &str, records: Vec<Record>) -> Result<Self, IngestError> {
        let first = records.first().ok_or(IngestError::Empty)?;
        let field_names: Vec<String> = first.fields.keys().cloned().collect();

        for (row, rec) in records.iter().enumerate().skip(1) {
            if rec.fields.len() != field_names.len()
                || !rec.fields.keys().zip(&field_names).all(|(a, b)| a == b)
            {
                return Err(IngestError::InconsistentFields { row });
            }
        }

        if records.windows(2).any(|w| w[0].timestamp > w[1].timestamp) {
            log::warn!("{name}: records are not sorted by timestamp, bounds use first/last row");
        }

        Ok(Dataset {
            name: name.to_string(),
            records,
            field_names,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Sorted channel names shared by every record.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field_names.iter().any(|f| f == field)
    }

    /// Timestamp of the first record.
    pub fn min_timestamp(&self) -> NaiveDateTime {
        self.records[0].timestamp
    }

    /// Timestamp of the last record.
    pub fn max_timestamp(&self) -> NaiveDateTime {
        self.records[self.records.len() - 1].timestamp
    }

    /// Number of records, at least one.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    pub(crate) fn record(timestamp: NaiveDateTime, fields: &[(&str, f64)]) -> Record {
        Record {
            timestamp,
            fields: fields.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn bounds_come_from_first_and_last_record() {
        let ds = Dataset::from_records(
            "t",
            vec![
                record(ts(2024, 1, 1, 0, 0), &[("a", 1.0)]),
                record(ts(2024, 1, 1, 12, 0), &[("a", 2.0)]),
                record(ts(2024, 1, 2, 0, 0), &[("a", 3.0)]),
            ],
        )
        .unwrap();

        assert_eq!(ds.min_timestamp(), ts(2024, 1, 1, 0, 0));
        assert_eq!(ds.max_timestamp(), ts(2024, 1, 2, 0, 0));
        assert_eq!(ds.field_names(), ["a".to_string()]);
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let err = Dataset::from_records("t", Vec::new()).unwrap_err();
        assert!(matches!(err, IngestError::Empty));
    }

    #[test]
    fn differing_field_sets_are_rejected() {
        let err = Dataset::from_records(
            "t",
            vec![
                record(ts(2024, 1, 1, 0, 0), &[("a", 1.0), ("b", 1.0)]),
                record(ts(2024, 1, 1, 1, 0), &[("a", 1.0), ("c", 1.0)]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::InconsistentFields { row: 1 }));
    }

    #[test]
    fn unsorted_input_is_kept_in_source_order() {
        let ds = Dataset::from_records(
            "t",
            vec![
                record(ts(2024, 1, 2, 0, 0), &[("a", 1.0)]),
                record(ts(2024, 1, 1, 0, 0), &[("a", 2.0)]),
            ],
        )
        .unwrap();
        assert_eq!(ds.min_timestamp(), ts(2024, 1, 2, 0, 0));
        assert_eq!(ds.records()[1].fields["a"], 2.0);
    }
}
