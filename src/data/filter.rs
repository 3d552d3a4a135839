use chrono::{NaiveDate, NaiveDateTime};

use super::error::FilterParseError;
use super::model::{Dataset, Record};

/// Format of `"<date> <time of day>"` in a user bound.
pub const BOUND_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const DEFAULT_START_TIME: &str = "00:00";
pub const DEFAULT_END_TIME: &str = "23:59";

// ---------------------------------------------------------------------------
// TimeBound – what the user picked
// ---------------------------------------------------------------------------

/// A user-selected window. Times are free text straight from the input
/// boxes and are only validated when the bound is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBound {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

impl TimeBound {
    /// The whole dataset, day by day: min date 00:00 to max date 23:59.
    pub fn covering(dataset: &Dataset) -> Self {
        TimeBound {
            start_date: dataset.min_timestamp().date(),
            end_date: dataset.max_timestamp().date(),
            start_time: DEFAULT_START_TIME.to_string(),
            end_time: DEFAULT_END_TIME.to_string(),
        }
    }

    /// Combine dates and times into `(lo, hi)`.
    ///
    /// `lo > hi` is not an error here.
    pub fn resolve(&self) -> Result<(NaiveDateTime, NaiveDateTime), FilterParseError> {
        let lo = parse_bound(self.start_date, &self.start_time)
            .map_err(|input| FilterParseError::Start { input })?;
        let hi = parse_bound(self.end_date, &self.end_time)
            .map_err(|input| FilterParseError::End { input })?;
        Ok((lo, hi))
    }
}

/// `H:MM` or `HH:MM`, ASCII digits only. chrono alone would also take
/// `"12: 30"` since it skips spaces before numeric fields.
fn is_time_of_day(s: &str) -> bool {
    let Some((hour, minute)) = s.split_once(':') else {
        return false;
    };
    (1..=2).contains(&hour.len())
        && minute.len() == 2
        && hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit())
}

/// Err carries the combined input for the error message.
fn parse_bound(date: NaiveDate, time_of_day: &str) -> Result<NaiveDateTime, String> {
    let input = format!("{} {}", date.format("%Y-%m-%d"), time_of_day);
    if !is_time_of_day(time_of_day) {
        return Err(input);
    }
    NaiveDateTime::parse_from_str(&input, BOUND_FORMAT).map_err(|_| input)
}

// ---------------------------------------------------------------------------
// Filter result
// ---------------------------------------------------------------------------

/// Outcome of [`filter`]. Both variants are successful results.
#[derive(Debug, Clone, PartialEq)]
pub enum Filtered<'a> {
    /// Records with `lo <= timestamp <= hi`, in dataset order.
    InRange(Vec<&'a Record>),
    /// The bound did not parse, so every record is returned unfiltered.
    Fallback {
        records: Vec<&'a Record>,
        error: FilterParseError,
    },
}

impl<'a> Filtered<'a> {
    pub fn records(&self) -> &[&'a Record] {
        match self {
            Filtered::InRange(records) | Filtered::Fallback { records, .. } => records,
        }
    }

    /// Why the bound was ignored, for a fallback result.
    pub fn error(&self) -> Option<&FilterParseError> {
        match self {
            Filtered::Fallback { error, .. } => Some(error),
            Filtered::InRange(_) => None,
        }
    }

    #[cfg(test)]
    pub fn is_fallback(&self) -> bool {
        self.error().is_some()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Range filter
// ---------------------------------------------------------------------------

/// Select the records inside `bound`, inclusive at both ends.
///
/// A bound that fails to parse never fails the caller: the whole dataset is
/// returned as [`Filtered::Fallback`] so a half-typed time keeps the charts
/// populated.
pub fn filter<'a>(dataset: &'a Dataset, bound: &TimeBound) -> Filtered<'a> {
    match bound.resolve() {
        Ok((lo, hi)) => Filtered::InRange(
            dataset
                .records()
                .iter()
                .filter(|r| lo <= r.timestamp && r.timestamp <= hi)
                .collect(),
        ),
        Err(error) => {
            log::warn!(
                "{}: invalid date or time format: {}, {} - {}, {} ({error}); showing unfiltered data",
                dataset.name(),
                bound.start_date,
                bound.start_time,
                bound.end_date,
                bound.end_time
            );
            Filtered::Fallback {
                records: dataset.records().iter().collect(),
                error,
            }
        }
    }
}
