use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::data::series::SeriesSpec;

/// Environment variable naming a dashboard config file.
pub const CONFIG_ENV: &str = "SOLAR_VIEWER_CONFIG";

// ---------------------------------------------------------------------------
// Dashboard layout
// ---------------------------------------------------------------------------

/// One tab: a dataset, where to read it, and the charts drawn from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub path: PathBuf,
    pub charts: Vec<SeriesSpec>,
}

/// The whole dashboard, in tab order.
///
/// ```json
/// {
///   "datasets": [
///     {
///       "name": "PV",
///       "path": "data/PV/PV_data.csv",
///       "charts": [
///         { "title": "Produção Solar",
///           "fields": [{ "field": "Ptotal", "label": "Total" }] }
///       ]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub datasets: Vec<DatasetConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            datasets: vec![
                DatasetConfig {
                    name: "SolarTech".to_string(),
                    path: PathBuf::from("data/SolarTech/ST_data.csv"),
                    charts: vec![
                        SeriesSpec::new(
                            "SolarTech - Graph 1",
                            &[
                                "Tamb[C]",
                                "Tin_CampoSolar[C]",
                                "Tout_CampoSolar[C]",
                                "Caudal_CampoSolar[C]",
                            ],
                        ),
                        SeriesSpec::new(
                            "SolarTech - Graph 2",
                            &[
                                "Tamb[C]",
                                "Tin_Armazenamento[C]",
                                "Tout_Armazenamento[C]",
                                "Caudal_Armazenamento[C]",
                            ],
                        ),
                        SeriesSpec::new(
                            "SolarTech - Graph 3",
                            &[
                                "Potência_Campo_Solar[kWth]",
                                "Potência_Armazenamento[kWth]",
                                "Radiação_DNI[W/m2]",
                                "Radiação_Global[W/m2]",
                            ],
                        ),
                    ],
                },
                DatasetConfig {
                    name: "PV".to_string(),
                    path: PathBuf::from("data/PV/PV_data.csv"),
                    charts: vec![SeriesSpec::new(
                        "Produção Solar",
                        &["P_Tracker1", "P_Tracker2", "P_Tracker3", "P_Tracker4", "Ptotal"],
                    )],
                },
            ],
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config. Relative data paths are taken from the config
    /// file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;

        if let Some(dir) = path.parent() {
            for ds in &mut config.datasets {
                if ds.path.is_relative() {
                    ds.path = dir.join(&ds.path);
                }
            }
        }
        Ok(config)
    }

    /// `explicit` wins, then `$SOLAR_VIEWER_CONFIG`, then the built-in layout.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self> {
        let path = explicit.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        match path {
            Some(path) => {
                log::info!("Using dashboard config {}", path.display());
                Self::from_file(&path)
            }
            None => {
                log::info!("No dashboard config given, using built-in layout");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.datasets.is_empty() {
            bail!("config declares no datasets");
        }
        for (i, ds) in self.datasets.iter().enumerate() {
            if self.datasets[..i].iter().any(|other| other.name == ds.name) {
                bail!("dataset '{}' declared twice", ds.name);
            }
            if let Some(chart) = ds.charts.iter().find(|c| c.fields.is_empty()) {
                bail!("{}: chart '{}' has no fields", ds.name, chart.title);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_has_three_solartech_charts_and_one_pv_chart() {
        let config = DashboardConfig::default();
        let names: Vec<&str> = config.datasets.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["SolarTech", "PV"]);

        let st = &config.datasets[0];
        assert_eq!(st.charts.len(), 3);
        assert!(st.charts.iter().all(|c| c.fields.len() == 4));
        assert_eq!(st.charts[2].fields[1].field, "Potência_Armazenamento[kWth]");

        let pv = &config.datasets[1];
        assert_eq!(pv.charts.len(), 1);
        assert_eq!(pv.charts[0].title, "Produção Solar");
        assert_eq!(pv.charts[0].fields.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_config_overrides_layout_and_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(
            &path,
            r#"{
                "datasets": [{
                    "name": "PV",
                    "path": "pv.csv",
                    "charts": [{
                        "title": "Total",
                        "fields": [{ "field": "Ptotal", "label": "Total power" }]
                    }]
                }]
            }"#,
        )
        .unwrap();

        let config = DashboardConfig::load(Some(path)).unwrap();
        assert_eq!(config.datasets.len(), 1);
        assert_eq!(config.datasets[0].path, dir.path().join("pv.csv"));
        assert_eq!(config.datasets[0].charts[0].fields[0].label(), "Total power");
    }

    #[test]
    fn duplicate_dataset_names_are_rejected() {
        let mut config = DashboardConfig::default();
        config.datasets[1].name = "SolarTech".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = DashboardConfig::from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
