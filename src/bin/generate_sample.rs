use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use parquet::arrow::ArrowWriter;

const STEP_MINUTES: i64 = 5;
const DAYS: i64 = 3;

const SOLARTECH_CHANNELS: [&str; 11] = [
    "Tamb[C]",
    "Tin_CampoSolar[C]",
    "Tout_CampoSolar[C]",
    "Caudal_CampoSolar[C]",
    "Tin_Armazenamento[C]",
    "Tout_Armazenamento[C]",
    "Caudal_Armazenamento[C]",
    "Potência_Campo_Solar[kWth]",
    "Potência_Armazenamento[kWth]",
    "Radiação_DNI[W/m2]",
    "Radiação_Global[W/m2]",
];

const PV_CHANNELS: [&str; 5] = ["P_Tracker1", "P_Tracker2", "P_Tracker3", "P_Tracker4", "Ptotal"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// 0 at night, 1 at solar noon.
fn sun(at: NaiveDateTime) -> f64 {
    let hour = at.hour() as f64 + at.minute() as f64 / 60.0;
    if !(6.0..=18.0).contains(&hour) {
        return 0.0;
    }
    (std::f64::consts::PI * (hour - 6.0) / 12.0).sin()
}

/// Timestamps plus one column of values per channel.
struct Log {
    timestamps: Vec<NaiveDateTime>,
    channels: Vec<(&'static str, Vec<f64>)>,
}

impl Log {
    fn new(channels: &[&'static str]) -> Self {
        Log {
            timestamps: Vec::new(),
            channels: channels.iter().map(|c| (*c, Vec::new())).collect(),
        }
    }

    fn push(&mut self, at: NaiveDateTime, values: &[f64]) {
        self.timestamps.push(at);
        for ((_, column), v) in self.channels.iter_mut().zip(values) {
            column.push((v * 100.0).round() / 100.0);
        }
    }
}

fn timestamps() -> impl Iterator<Item = NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(2024, 6, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("2024-06-01 00:00:00 is a valid timestamp");
    let steps = DAYS * 24 * 60 / STEP_MINUTES;
    (0..steps).map(move |i| start + Duration::minutes(i * STEP_MINUTES))
}

fn solartech(rng: &mut SimpleRng) -> Log {
    let mut log = Log::new(&SOLARTECH_CHANNELS);
    for at in timestamps() {
        let s = sun(at);
        let tamb = 18.0 + 10.0 * s + rng.gauss(0.0, 0.3);
        let dni = (850.0 * s + rng.gauss(0.0, 15.0)).max(0.0);
        let ghi = (950.0 * s + rng.gauss(0.0, 15.0)).max(0.0);
        let flow_field = if s > 0.1 { 2.5 + rng.gauss(0.0, 0.05) } else { 0.0 };
        let flow_storage = if s > 0.2 { 1.8 + rng.gauss(0.0, 0.05) } else { 0.0 };
        let tin_field = 60.0 + 20.0 * s + rng.gauss(0.0, 0.5);
        let tout_field = tin_field + 35.0 * s;
        let tin_storage = tout_field - 3.0;
        let tout_storage = tin_field + 2.0;
        let p_field = 4.18 * flow_field * (tout_field - tin_field);
        let p_storage = 4.18 * flow_storage * (tin_storage - tout_storage).max(0.0);

        log.push(
            at,
            &[
                tamb,
                tin_field,
                tout_field,
                flow_field,
                tin_storage,
                tout_storage,
                flow_storage,
                p_field,
                p_storage,
                dni,
                ghi,
            ],
        );
    }
    log
}

fn pv(rng: &mut SimpleRng) -> Log {
    let mut log = Log::new(&PV_CHANNELS);
    for at in timestamps() {
        let s = sun(at);
        let trackers: Vec<f64> = (0..4)
            .map(|i| (5.0 * s * (1.0 - 0.03 * i as f64) + rng.gauss(0.0, 0.05) * s).max(0.0))
            .collect();
        let total: f64 = trackers.iter().sum();
        log.push(at, &[trackers[0], trackers[1], trackers[2], trackers[3], total]);
    }
    log
}

fn write_csv(log: &Log, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let mut header = vec!["date", "time"];
    header.extend(log.channels.iter().map(|(name, _)| *name));
    writer.write_record(&header)?;

    for (row, at) in log.timestamps.iter().enumerate() {
        let mut record = vec![at.format("%d/%m/%Y").to_string(), at.format("%H:%M:%S").to_string()];
        record.extend(log.channels.iter().map(|(_, values)| format!("{:.2}", values[row])));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(log: &Log, path: &Path) -> Result<()> {
    let mut fields = vec![
        Field::new("date", DataType::Utf8, false),
        Field::new("time", DataType::Utf8, false),
    ];
    fields.extend(
        log.channels
            .iter()
            .map(|(name, _)| Field::new(*name, DataType::Float64, true)),
    );
    let schema = Arc::new(Schema::new(fields));

    let dates: Vec<String> = log.timestamps.iter().map(|t| t.format("%d/%m/%Y").to_string()).collect();
    let times: Vec<String> = log.timestamps.iter().map(|t| t.format("%H:%M:%S").to_string()).collect();
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(dates)),
        Arc::new(StringArray::from(times)),
    ];
    columns.extend(
        log.channels
            .iter()
            .map(|(_, values)| Arc::new(Float64Array::from(values.clone())) as ArrayRef),
    );

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn write_log(log: &Log, dir: &Path, stem: &str) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    write_csv(log, &dir.join(format!("{stem}.csv")))?;
    write_parquet(log, &dir.join(format!("{stem}.parquet")))?;
    println!(
        "Wrote {} rows × {} channels to {}/{stem}.{{csv,parquet}}",
        log.timestamps.len(),
        log.channels.len(),
        dir.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    let root = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    let mut rng = SimpleRng::new(42);

    write_log(&solartech(&mut rng), &root.join("SolarTech"), "ST_data")?;
    write_log(&pv(&mut rng), &root.join("PV"), "PV_data")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_starts_on_first_of_june() {
        let mut at = timestamps();
        let first = at.next().unwrap();
        assert_eq!(first.to_string(), "2024-06-01 00:00:00");
        assert_eq!(at.count() as i64 + 1, DAYS * 24 * 60 / STEP_MINUTES);
    }
}
