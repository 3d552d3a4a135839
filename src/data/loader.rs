use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use chrono::NaiveDateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::IngestError;
use super::model::{Cell, Dataset, RawRow, Record};

/// Column holding the `DD/MM/YYYY` date.
pub const DATE_COLUMN: &str = "date";
/// Column holding the `HH:MM:SS` time of day.
pub const TIME_COLUMN: &str = "time";
/// Format of `"<date> <time>"` in the source logs.
pub const SOURCE_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a plant log from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – semicolon-delimited, header row, `date;time;<channels…>`
/// * `.parquet` – flat file with Utf8 `date`/`time` and numeric channel columns
pub fn load_file(name: &str, path: &Path) -> Result<Dataset, IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(name, std::fs::File::open(path)?)?,
        "parquet" | "pq" => load_parquet(name, path)?,
        other => return Err(IngestError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "{name}: loaded {} records, {} → {}, from {}",
        dataset.len(),
        dataset.min_timestamp(),
        dataset.max_timestamp(),
        path.display()
    );
    Ok(dataset)
}

/// Type raw rows into a [`Dataset`].
///
/// Every row needs `date` and `time`; every other column is a numeric channel.
/// The first failing row aborts the whole load.
pub fn load_rows<I>(name: &str, rows: I) -> Result<Dataset, IngestError>
where
    I: IntoIterator<Item = RawRow>,
{
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(row, raw)| parse_row(row, raw))
        .collect::<Result<Vec<_>, _>>()?;

    Dataset::from_records(name, records)
}

// ---------------------------------------------------------------------------
// Row typing
// ---------------------------------------------------------------------------

fn parse_row(row: usize, mut raw: RawRow) -> Result<Record, IngestError> {
    let date = take_text(&mut raw, row, DATE_COLUMN)?;
    let time = take_text(&mut raw, row, TIME_COLUMN)?;
    let timestamp = parse_source_timestamp(row, &date, &time)?;

    let fields: BTreeMap<String, f64> = raw
        .into_iter()
        .map(|(column, cell)| {
            let value = parse_value(row, &column, &cell)?;
            Ok((column, value))
        })
        .collect::<Result<_, IngestError>>()?;

    Ok(Record { timestamp, fields })
}

fn take_text(raw: &mut RawRow, row: usize, column: &str) -> Result<String, IngestError> {
    match raw.remove(column) {
        Some(Cell::Null) | None => Err(IngestError::MissingColumn {
            row,
            column: column.to_string(),
        }),
        Some(cell) => Ok(cell.to_string().trim().to_string()),
    }
}

fn parse_source_timestamp(row: usize, date: &str, time: &str) -> Result<NaiveDateTime, IngestError> {
    let input = format!("{date} {time}");
    NaiveDateTime::parse_from_str(&input, SOURCE_TIMESTAMP_FORMAT)
        .map_err(|source| IngestError::InvalidTimestamp { row, input, source })
}

/// Empty cells become `NaN`; a decimal comma is accepted.
fn parse_value(row: usize, column: &str, cell: &Cell) -> Result<f64, IngestError> {
    let text = match cell {
        Cell::Number(v) => return Ok(*v),
        Cell::Null => return Ok(f64::NAN),
        Cell::Text(s) => s.trim(),
    };
    if text.is_empty() {
        return Ok(f64::NAN);
    }
    text.parse::<f64>()
        .or_else(|_| text.replace(',', ".").parse::<f64>())
        .map_err(|_| IngestError::InvalidValue {
            row,
            column: column.to_string(),
            value: text.to_string(),
        })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row, `;` delimiter, every cell read as text.
pub fn load_csv<R: Read>(name: &str, reader: R) -> Result<Dataset, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), Cell::Text(v.to_string())))
            .collect();
        rows.push(row);
    }

    load_rows(name, rows)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet log.
///
/// Expected schema:
/// - `date`, `time`: Utf8 or LargeUtf8, same text layout as the CSV logs
/// - channels: Float64, Float32, Int64 or Int32
fn load_parquet(name: &str, path: &Path) -> Result<Dataset, IngestError> {
    let file = std::fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut raw = RawRow::new();
            for (field, col) in schema.fields().iter().zip(batch.columns()) {
                raw.insert(field.name().clone(), cell_at(field.name(), col, row)?);
            }
            rows.push(raw);
        }
    }

    load_rows(name, rows)
}

/// Extract a single cell from an Arrow column at a given row.
fn cell_at(column: &str, col: &Arc<dyn Array>, row: usize) -> Result<Cell, IngestError> {
    if col.is_null(row) {
        return Ok(Cell::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => Cell::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Cell::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Float64 => Cell::Number(col.as_primitive::<Float64Type>().value(row)),
        DataType::Float32 => Cell::Number(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Int64 => Cell::Number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Int32 => Cell::Number(col.as_primitive::<Int32Type>().value(row) as f64),
        other => {
            return Err(IngestError::UnsupportedColumnType {
                column: column.to_string(),
                data_type: format!("{other:?}"),
            })
        }
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::ts;

    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    const PV_CSV: &str = "\
date;time;P_Tracker1;Ptotal
01/01/2024;00:00:00;0;0
01/01/2024;12:00:00;1,5;6.25
02/01/2024;00:00:00;;0
";

    #[test]
    fn csv_rows_become_records() {
        let ds = load_csv("PV", PV_CSV.as_bytes()).unwrap();

        assert_eq!(ds.name(), "PV");
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.field_names(), ["P_Tracker1".to_string(), "Ptotal".to_string()]);
        assert_eq!(ds.min_timestamp(), ts(2024, 1, 1, 0, 0));
        assert_eq!(ds.max_timestamp(), ts(2024, 1, 2, 0, 0));

        let noon = &ds.records()[1];
        assert_eq!(noon.timestamp, ts(2024, 1, 1, 12, 0));
        assert_eq!(noon.fields["P_Tracker1"], 1.5);
        assert_eq!(noon.fields["Ptotal"], 6.25);
        assert!(ds.records()[2].fields["P_Tracker1"].is_nan());
    }

    #[test]
    fn unicode_channel_names_survive() {
        let csv = "date;time;Potência_Campo_Solar[kWth];Radiação_DNI[W/m2]\n\
                   15/06/2023;10:30:15;12.5;800\n";
        let ds = load_csv("SolarTech", csv.as_bytes()).unwrap();
        assert_eq!(ds.records()[0].fields["Potência_Campo_Solar[kWth]"], 12.5);
        assert_eq!(ds.records()[0].fields["Radiação_DNI[W/m2]"], 800.0);
    }

    #[test]
    fn missing_time_column_fails_the_load() {
        let csv = "date;Ptotal\n01/01/2024;1\n";
        let err = load_csv("PV", csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn { row: 0, ref column } if column == "time"
        ));
    }

    #[test]
    fn one_bad_timestamp_fails_the_whole_load() {
        let csv = "date;time;Ptotal\n01/01/2024;00:00:00;1\n2024-01-01;00:10:00;2\n";
        let err = load_csv("PV", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidTimestamp { row: 1, .. }));
    }

    #[test]
    fn time_without_seconds_is_rejected() {
        let csv = "date;time;Ptotal\n01/01/2024;00:00;1\n";
        let err = load_csv("PV", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidTimestamp { row: 0, .. }));
    }

    #[test]
    fn non_numeric_channel_fails_the_load() {
        let csv = "date;time;Ptotal\n01/01/2024;00:00:00;n/a\n";
        let err = load_csv("PV", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidValue { row: 0, .. }));
    }

    #[test]
    fn header_only_csv_is_empty() {
        let csv = "date;time;Ptotal\n";
        let err = load_csv("PV", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::Empty));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file("PV", Path::new("log.xlsx")).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(ref e) if e == "xlsx"));
    }

    #[test]
    fn csv_file_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PV_data.csv");
        std::fs::write(&path, PV_CSV).unwrap();

        let ds = load_file("PV", &path).unwrap();
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn parquet_file_loads_like_csv() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("date", DataType::Utf8, false),
            Field::new("time", DataType::Utf8, false),
            Field::new("Ptotal", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["01/01/2024", "01/01/2024"])),
                Arc::new(StringArray::from(vec!["00:00:00", "12:00:00"])),
                Arc::new(Float64Array::from(vec![Some(1.0), None])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PV_data.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file("PV", &path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].fields["Ptotal"], 1.0);
        assert!(ds.records()[1].fields["Ptotal"].is_nan());
        assert_eq!(ds.max_timestamp(), ts(2024, 1, 1, 12, 0));
    }
}
