use std::path::Path;

use chrono::NaiveDate;

use crate::color::SeriesColors;
use crate::config::{DashboardConfig, DatasetConfig};
use crate::data::error::IngestError;
use crate::data::filter::TimeBound;
use crate::data::loader::load_file;
use crate::data::model::Dataset;
use crate::data::series::{ChartSet, chart_data};

// ---------------------------------------------------------------------------
// Per-dataset view state
// ---------------------------------------------------------------------------

/// A loaded dataset together with the bound the user is editing.
pub struct LoadedDataset {
    pub dataset: Dataset,
    /// Edited in place by the date pickers and time inputs.
    pub bound: TimeBound,
    /// Charts for the bound they were computed with.
    cache: Option<(TimeBound, ChartSet)>,
    /// Bumped on every recompute.
    generation: u64,
}

impl LoadedDataset {
    fn new(dataset: Dataset) -> Self {
        let bound = TimeBound::covering(&dataset);
        LoadedDataset {
            dataset,
            bound,
            cache: None,
            generation: 0,
        }
    }

    pub fn min_date(&self) -> NaiveDate {
        self.dataset.min_timestamp().date()
    }

    pub fn max_date(&self) -> NaiveDate {
        self.dataset.max_timestamp().date()
    }

    /// Keep picked dates inside the dataset's span.
    pub fn clamp_dates(&mut self) {
        let (min, max) = (self.min_date(), self.max_date());
        self.bound.start_date = self.bound.start_date.clamp(min, max);
        self.bound.end_date = self.bound.end_date.clamp(min, max);
    }

    /// Charts for the current bound, recomputed only when the bound changed.
    pub fn charts(&mut self, config: &DatasetConfig) -> &ChartSet {
        self.charts_with_generation(config).1
    }

    /// Like [`charts`](Self::charts), plus how many times the charts have
    /// been computed so far.
    pub fn charts_with_generation(&mut self, config: &DatasetConfig) -> (u64, &ChartSet) {
        let stale = match &self.cache {
            Some((bound, _)) => *bound != self.bound,
            None => true,
        };
        if stale {
            self.cache = None;
        }
        let (_, set) = self.cache.get_or_insert_with(|| {
            log::debug!("{}: recomputing charts for {:?}", config.name, self.bound);
            self.generation += 1;
            let set = chart_data(&self.dataset, &self.bound, &config.charts);
            (self.bound.clone(), set)
        });
        (self.generation, set)
    }
}

/// One tab of the dashboard.
pub struct DatasetView {
    pub config: DatasetConfig,
    /// None until a load succeeds.
    pub loaded: Option<LoadedDataset>,
    /// Last ingest failure, shown in the tab.
    pub load_error: Option<String>,
    pub colors: SeriesColors,
}

impl DatasetView {
    pub fn new(config: DatasetConfig) -> Self {
        let colors = SeriesColors::new(
            config
                .charts
                .iter()
                .flat_map(|c| c.fields.iter().map(|f| f.field.as_str())),
        );
        DatasetView {
            config,
            loaded: None,
            load_error: None,
            colors,
        }
    }

    /// Replace the dataset and reset the bound to cover it.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        for spec in &self.config.charts {
            if let Err(e) = spec.check_fields(&dataset) {
                log::error!("{}: {e}", self.config.name);
            }
        }
        self.loaded = Some(LoadedDataset::new(dataset));
        self.load_error = None;
    }

    /// Load from `path`. On failure the previous dataset stays in place.
    pub fn load_from(&mut self, path: &Path) -> Result<(), IngestError> {
        match load_file(&self.config.name, path) {
            Ok(dataset) => {
                self.set_dataset(dataset);
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "{}: failed to load {}: {e}",
                    self.config.name,
                    path.display()
                );
                self.load_error = Some(format!("Error loading {}: {e}", path.display()));
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub views: Vec<DatasetView>,
    /// Index of the visible tab.
    pub active: usize,
}

impl AppState {
    /// Build one view per configured dataset without touching the disk.
    pub fn new(config: DashboardConfig) -> Self {
        AppState {
            views: config.datasets.into_iter().map(DatasetView::new).collect(),
            active: 0,
        }
    }

    /// Load every dataset from its configured path. Failures are kept per
    /// view; the dashboard still opens.
    pub fn load_all(&mut self) {
        for view in &mut self.views {
            let path = view.config.path.clone();
            // Error already recorded on the view.
            let _ = view.load_from(&path);
        }
    }

    pub fn active_view_mut(&mut self) -> Option<&mut DatasetView> {
        self.views.get_mut(self.active)
    }
}
