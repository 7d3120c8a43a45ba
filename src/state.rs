use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data::filter::{filter, FilterCriteria, HourRange, ALL_STATES};
use crate::data::loader::{self, DataLoadError, LoadOptions};
use crate::data::model::{AccidentDataset, DayOfWeek};
use crate::data::summary::DashboardSummary;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until a file loads successfully).
    pub dataset: Option<Arc<AccidentDataset>>,

    /// File the dataset was read from.
    pub source: Option<PathBuf>,

    /// Sampling parameters used for every load.
    pub load_options: LoadOptions,

    /// Current filter selections.
    pub criteria: FilterCriteria,

    /// Indices of accidents passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Aggregates of the visible accidents (cached).
    pub summary: DashboardSummary,

    /// Set when the map should jump to the new center on the next frame.
    pub recenter_map: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

impl AppState {
    pub fn new(load_options: LoadOptions) -> Self {
        Self {
            dataset: None,
            source: None,
            load_options,
            criteria: FilterCriteria::default(),
            visible_indices: Vec::new(),
            summary: DashboardSummary::default(),
            recenter_map: false,
            status_message: None,
        }
    }

    /// Load `path` through the dataset cache and make it current.
    /// On failure the previous dataset is left untouched.
    pub fn try_open(&mut self, path: &Path) -> Result<(), DataLoadError> {
        let dataset = loader::load(path, &self.load_options)?;
        log::info!(
            "Loaded {} accidents from {}",
            dataset.len(),
            path.display()
        );
        self.source = Some(path.to_path_buf());
        self.set_dataset(dataset);
        Ok(())
    }

    /// Like [`AppState::try_open`], but failures are logged and kept in
    /// `status_message` for the window to show.
    pub fn open(&mut self, path: &Path) {
        if let Err(e) = self.try_open(path) {
            log::error!("Failed to load {}: {e}", path.display());
            self.status_message = Some(format!("Error: {e}"));
        }
    }

    /// Drop the cached copy of the current source and read it again.
    pub fn reload(&mut self) {
        if let Some(path) = self.source.clone() {
            loader::invalidate(&path);
            let criteria = self.criteria.clone();
            self.open(&path);
            self.set_criteria(criteria);
        }
    }

    /// Ingest a newly loaded dataset and reset the filters.
    pub fn set_dataset(&mut self, dataset: Arc<AccidentDataset>) {
        self.dataset = Some(dataset);
        self.criteria = FilterCriteria::default();
        self.status_message = None;
        self.refilter();
    }

    /// Recompute `visible_indices` and `summary` after a criteria change.
    pub fn refilter(&mut self) {
        match &self.dataset {
            Some(ds) => {
                let (view, _) = filter(ds, &self.criteria);
                self.summary = DashboardSummary::from_view(&view, &self.criteria);
                self.visible_indices = view.into_indices();
            }
            None => {
                self.summary = DashboardSummary::empty(&self.criteria);
                self.visible_indices.clear();
            }
        }
        self.recenter_map = true;
    }

    /// Select a region by name; [`ALL_STATES`] clears the constraint.
    pub fn set_region(&mut self, region: &str) {
        let region = (region != ALL_STATES).then(|| region.to_string());
        if self.criteria.region != region {
            self.criteria.region = region;
            self.refilter();
        }
    }

    /// Toggle a single weather condition in the selection.
    pub fn toggle_weather(&mut self, condition: &str) {
        if !self.criteria.weather_conditions.remove(condition) {
            self.criteria.weather_conditions.insert(condition.to_string());
        }
        self.refilter();
    }

    pub fn clear_weather(&mut self) {
        if !self.criteria.weather_conditions.is_empty() {
            self.criteria.weather_conditions.clear();
            self.refilter();
        }
    }

    /// Toggle a single day in the selection.
    pub fn toggle_day(&mut self, day: DayOfWeek) {
        if !self.criteria.days_of_week.remove(&day) {
            self.criteria.days_of_week.insert(day);
        }
        self.refilter();
    }

    pub fn clear_days(&mut self) {
        if !self.criteria.days_of_week.is_empty() {
            self.criteria.days_of_week.clear();
            self.refilter();
        }
    }

    pub fn set_hour_range(&mut self, range: HourRange) {
        if self.criteria.hour_range != range {
            self.criteria.hour_range = range;
            self.refilter();
        }
    }

    pub fn set_fatal_only(&mut self, fatal_only: bool) {
        if self.criteria.fatal_only != fatal_only {
            self.criteria.fatal_only = fatal_only;
            self.refilter();
        }
    }

    /// Replace all selections at once.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.refilter();
    }

    pub fn reset_filters(&mut self) {
        self.set_criteria(FilterCriteria::default());
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;
    use crate::data::filter::tests::record;

    fn loaded_state() -> AppState {
        let mut state = AppState::default();
        state.set_dataset(Arc::new(AccidentDataset::from_records(vec![
            record(Some("Ohio"), Some("Rain"), DayOfWeek::Monday, 5, 4),
            record(Some("Ohio"), Some("Clear"), DayOfWeek::Tuesday, 10, 2),
            record(Some("Texas"), Some("Rain"), DayOfWeek::Monday, 5, 2),
        ])));
        state
    }

    #[test]
    fn new_dataset_shows_everything() {
        let state = loaded_state();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.summary.count, 3);
        assert_eq!(state.summary.region, ALL_STATES);
    }

    #[test]
    fn selections_refilter_the_view() {
        let mut state = loaded_state();

        state.set_region("Ohio");
        assert_eq!(state.visible_indices, vec![0, 1]);

        state.set_fatal_only(true);
        assert_eq!(state.visible_indices, vec![0]);
        assert_eq!(state.summary.headline, "Showing 1 accidents in Ohio");

        state.set_fatal_only(false);
        state.toggle_weather("Clear");
        assert_eq!(state.visible_indices, vec![1]);
        state.toggle_weather("Clear");
        assert_eq!(state.visible_indices, vec![0, 1]);

        state.set_region(ALL_STATES);
        state.toggle_day(DayOfWeek::Monday);
        assert_eq!(state.visible_indices, vec![0, 2]);

        state.set_hour_range(HourRange::new(6, 23));
        assert!(state.visible_indices.is_empty());
        assert_eq!(state.summary.by_day.len(), 7);

        state.reset_filters();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.summary.count, 3);
    }

    #[test]
    fn clearing_selections_removes_constraints() {
        let mut state = loaded_state();
        state.toggle_weather("Rain");
        state.toggle_day(DayOfWeek::Tuesday);
        assert!(state.visible_indices.is_empty());

        state.clear_weather();
        assert_eq!(state.visible_indices, vec![1]);
        state.clear_days();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn failed_open_keeps_previous_dataset() {
        let mut state = loaded_state();
        let dir = TempDir::new().unwrap();
        state.open(&dir.path().join("missing.csv"));
        assert!(state.status_message.is_some());
        assert_eq!(state.visible_indices.len(), 3);
    }

    #[test]
    fn try_open_reports_missing_file() {
        let mut state = loaded_state();
        let dir = TempDir::new().unwrap();
        let err = state.try_open(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
        assert!(state.status_message.is_none());
        assert!(state.source.is_none());
        assert_eq!(state.visible_indices.len(), 3);
    }

    #[test]
    fn open_loads_through_the_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Severity,Start_Time,Start_Lat,Start_Lng,State,Weather_Condition").unwrap();
        writeln!(file, "4,2019-07-04 21:30:00,33.4,-112.0,AZ,Fair").unwrap();
        drop(file);

        let mut state = AppState::default();
        state.open(&path);
        assert!(state.status_message.is_none());
        assert_eq!(state.source.as_deref(), Some(path.as_path()));
        assert_eq!(state.summary.count, 1);
        assert!(state.dataset.as_ref().unwrap().facets().regions.contains("Arizona"));

        let before = state.dataset.clone().unwrap();
        state.set_fatal_only(true);
        state.reload();
        let after = state.dataset.clone().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(state.criteria.fatal_only);
        assert_eq!(state.summary.count, 1);
    }
}
