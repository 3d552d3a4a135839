use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::MissingFieldError;
use super::filter::{TimeBound, filter};
use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// Chart declarations
// ---------------------------------------------------------------------------

/// One channel drawn on a chart, with its legend label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesField {
    pub field: String,
    /// Legend text; the field name when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SeriesField {
    pub fn new(field: &str) -> Self {
        SeriesField {
            field: field.to_string(),
            label: None,
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.field)
    }
}

/// The channels one chart shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub title: String,
    pub fields: Vec<SeriesField>,
}

impl SeriesSpec {
    pub fn new(title: &str, fields: &[&str]) -> Self {
        SeriesSpec {
            title: title.to_string(),
            fields: fields.iter().map(|f| SeriesField::new(f)).collect(),
        }
    }

    /// Fail on the first requested field the dataset does not carry.
    pub fn check_fields(&self, dataset: &Dataset) -> Result<(), MissingFieldError> {
        match self.fields.iter().find(|f| !dataset.has_field(&f.field)) {
            Some(missing) => Err(self.missing(&missing.field)),
            None => Ok(()),
        }
    }

    fn missing(&self, field: &str) -> MissingFieldError {
        MissingFieldError {
            chart: self.title.clone(),
            field: field.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Projected chart data
// ---------------------------------------------------------------------------

/// One line: `(timestamp, value)` per filtered record, in record order.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub field: String,
    pub label: String,
    pub points: Vec<(NaiveDateTime, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub title: String,
    pub series: Vec<Series>,
}

/// Extract the spec's fields from `records`, one series per field.
pub fn project(records: &[&Record], spec: &SeriesSpec) -> Result<ChartData, MissingFieldError> {
    let series = spec
        .fields
        .iter()
        .map(|sf| {
            let points = records
                .iter()
                .map(|r| {
                    r.fields
                        .get(&sf.field)
                        .map(|&v| (r.timestamp, v))
                        .ok_or_else(|| spec.missing(&sf.field))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, MissingFieldError>(Series {
                field: sf.field.clone(),
                label: sf.label().to_string(),
                points,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ChartData {
        title: spec.title.clone(),
        series,
    })
}

// ---------------------------------------------------------------------------
// Chart pipeline: bound → filter → project, for every chart of a dataset
// ---------------------------------------------------------------------------

/// Every chart of one dataset for one bound.
#[derive(Debug, Clone)]
pub struct ChartSet {
    /// Records that passed the filter.
    pub row_count: usize,
    /// Set when the bound did not parse and the charts show everything.
    pub fallback: Option<String>,
    /// One entry per spec, in spec order.
    pub charts: Vec<Result<ChartData, MissingFieldError>>,
}

/// Filter once, then project each spec. A missing field only fails its
/// own chart.
pub fn chart_data(dataset: &Dataset, bound: &TimeBound, specs: &[SeriesSpec]) -> ChartSet {
    let filtered = filter(dataset, bound);
    if filtered.is_empty() {
        log::debug!("{}: no records in {:?}", dataset.name(), bound);
    }

    let charts = specs
        .iter()
        .map(|spec| {
            let chart = project(filtered.records(), spec);
            if let Err(e) = &chart {
                log::error!("{}: {e}", dataset.name());
            }
            chart
        })
        .collect();

    ChartSet {
        row_count: filtered.len(),
        fallback: filtered.error().map(|e| e.to_string()),
        charts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{record, ts};
    use chrono::NaiveDate;

    fn pv() -> Dataset {
        Dataset::from_records(
            "PV",
            vec![
                record(ts(2024, 1, 1, 0, 0), &[("P_Tracker1", 0.0), ("Ptotal", 0.0)]),
                record(ts(2024, 1, 1, 12, 0), &[("P_Tracker1", 4.0), ("Ptotal", 15.0)]),
                record(ts(2024, 1, 2, 0, 0), &[("P_Tracker1", 0.5), ("Ptotal", 1.0)]),
            ],
        )
        .unwrap()
    }

    fn all(ds: &Dataset) -> Vec<&Record> {
        ds.records().iter().collect()
    }

    #[test]
    fn every_series_is_as_long_as_the_records() {
        let ds = pv();
        let records = all(&ds);
        let spec = SeriesSpec::new("Produção Solar", &["Ptotal", "P_Tracker1"]);

        let chart = project(&records, &spec).unwrap();
        assert_eq!(chart.title, "Produção Solar");
        assert_eq!(chart.series.len(), 2);
        for s in &chart.series {
            assert_eq!(s.points.len(), records.len());
        }
        assert_eq!(chart.series[0].field, "Ptotal");
        assert_eq!(
            chart.series[0].points,
            vec![
                (ts(2024, 1, 1, 0, 0), 0.0),
                (ts(2024, 1, 1, 12, 0), 15.0),
                (ts(2024, 1, 2, 0, 0), 1.0),
            ]
        );
    }

    #[test]
    fn empty_records_give_empty_series() {
        let spec = SeriesSpec::new("c", &["Ptotal"]);
        let chart = project(&[], &spec).unwrap();
        assert_eq!(chart.series.len(), 1);
        assert!(chart.series[0].points.is_empty());
    }

    #[test]
    fn missing_field_is_an_error_not_a_default() {
        let ds = pv();
        let spec = SeriesSpec::new("c", &["Ptotal", "P_Tracker9"]);

        let err = project(&all(&ds), &spec).unwrap_err();
        assert_eq!(
            err,
            MissingFieldError {
                chart: "c".to_string(),
                field: "P_Tracker9".to_string(),
            }
        );
        assert_eq!(spec.check_fields(&ds), Err(err));
    }

    #[test]
    fn label_defaults_to_field_name() {
        let mut field = SeriesField::new("Tamb[C]");
        assert_eq!(field.label(), "Tamb[C]");
        field.label = Some("Ambient".to_string());
        assert_eq!(field.label(), "Ambient");
    }

    #[test]
    fn pipeline_filters_once_and_projects_each_chart() {
        let ds = pv();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bound = TimeBound {
            start_date: day,
            end_date: day,
            start_time: "06:00".to_string(),
            end_time: "23:59".to_string(),
        };
        let specs = [
            SeriesSpec::new("a", &["Ptotal"]),
            SeriesSpec::new("b", &["missing"]),
        ];

        let set = chart_data(&ds, &bound, &specs);
        assert_eq!(set.row_count, 1);
        assert!(set.fallback.is_none());
        let first = set.charts[0].as_ref().unwrap();
        assert_eq!(first.series[0].points, vec![(ts(2024, 1, 1, 12, 0), 15.0)]);
        assert!(set.charts[1].is_err());
    }

    #[test]
    fn pipeline_reports_fallback() {
        let ds = pv();
        let mut bound = TimeBound::covering(&ds);
        bound.start_time = "bad".to_string();

        let set = chart_data(&ds, &bound, &[SeriesSpec::new("a", &["Ptotal"])]);
        assert_eq!(set.row_count, 3);
        assert!(set.fallback.is_some());
    }
}
