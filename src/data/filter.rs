use std::collections::BTreeSet;

use serde::Serialize;

use super::model::{AccidentDataset, AccidentRecord, DayOfWeek};

/// Region selection that places no constraint on the region.
pub const ALL_STATES: &str = "All States";

// ---------------------------------------------------------------------------
// HourRange – inclusive bounds on the hour of day
// ---------------------------------------------------------------------------

/// Inclusive hour-of-day bounds. The default covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HourRange {
    pub start: u8,
    pub end: u8,
}

impl Default for HourRange {
    fn default() -> Self {
        HourRange { start: 0, end: 23 }
    }
}

impl HourRange {
    /// Bounds are clamped to 23. A range with `start > end` matches nothing.
    pub fn new(start: u8, end: u8) -> Self {
        HourRange {
            start: start.min(23),
            end: end.min(23),
        }
    }

    pub fn contains(&self, hour: u8) -> bool {
        self.start <= hour && hour <= self.end
    }

    /// Hours covered by the range, ascending.
    pub fn hours(&self) -> impl Iterator<Item = u8> {
        self.start..=self.end
    }
}

// ---------------------------------------------------------------------------
// FilterCriteria – the user's selections
// ---------------------------------------------------------------------------

/// Filter selections, independent of whichever widget or flag produced them.
///
/// Empty sets and a `None`/[`ALL_STATES`] region mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub region: Option<String>,
    pub weather_conditions: BTreeSet<String>,
    pub days_of_week: BTreeSet<DayOfWeek>,
    pub hour_range: HourRange,
    pub fatal_only: bool,
}

impl FilterCriteria {
    /// The region to match, or `None` when every region is accepted.
    pub fn region_constraint(&self) -> Option<&str> {
        self.region.as_deref().filter(|r| *r != ALL_STATES)
    }

    /// Label used in headlines: the selected region or [`ALL_STATES`].
    pub fn region_label(&self) -> &str {
        self.region_constraint().unwrap_or(ALL_STATES)
    }

    /// Whether a record passes every active predicate.
    ///
    /// Predicates are checked in a fixed order: region, weather, day of week,
    /// hour range, fatality. A record with no hour never passes, since the hour
    /// filter always applies.
    pub fn matches(&self, rec: &AccidentRecord) -> bool {
        if let Some(region) = self.region_constraint() {
            if rec.region != Some(region) {
                return false;
            }
        }

        if !self.weather_conditions.is_empty() {
            match &rec.weather_condition {
                Some(w) if self.weather_conditions.contains(&**w) => {}
                _ => return false,
            }
        }

        if !self.days_of_week.is_empty() {
            match rec.day_of_week {
                Some(day) if self.days_of_week.contains(&day) => {}
                _ => return false,
            }
        }

        match rec.hour {
            Some(hour) if self.hour_range.contains(hour) => {}
            _ => return false,
        }

        !self.fatal_only || rec.is_fatal()
    }
}

// ---------------------------------------------------------------------------
// FilteredView – indices of records passing the criteria
// ---------------------------------------------------------------------------

/// A read-only subset of a dataset, stored as record indices.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a AccidentDataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// A view over every record.
    pub fn all(dataset: &'a AccidentDataset) -> Self {
        FilteredView {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    /// Apply `criteria` to the records of this view.
    pub fn refine(&self, criteria: &FilterCriteria) -> FilteredView<'a> {
        let records = self.dataset.records();
        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|&i| criteria.matches(&records[i]))
            .collect();
        FilteredView {
            dataset: self.dataset,
            indices,
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    pub fn records(&self) -> impl Iterator<Item = &'a AccidentRecord> + '_ {
        let records = self.dataset.records();
        self.indices.iter().map(move |&i| &records[i])
    }

    /// `(lat, lng)` pairs of the view, in record order.
    pub fn coordinates(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.records().map(|rec| (rec.start_lat, rec.start_lng))
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Filter a dataset, returning the view and its record count.
pub fn filter<'a>(dataset: &'a AccidentDataset, criteria: &FilterCriteria) -> (FilteredView<'a>, usize) {
    let view = FilteredView::all(dataset).refine(criteria);
    let count = view.len();
    log::debug!("Filter kept {count} of {} accidents", dataset.len());
    (view, count)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;

    /// Build a record whose start time falls on `day` (week of 2023-03-06) at `hour`.
    pub(crate) fn record(
        region: Option<&'static str>,
        weather: Option<&str>,
        day: DayOfWeek,
        hour: u32,
        severity: i64,
    ) -> AccidentRecord {
        let start = NaiveDate::from_ymd_opt(2023, 3, 6 + day.index() as u32)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        AccidentRecord::new(
            Some(start),
            40.0 + hour as f64 * 0.1,
            -83.0 - day.index() as f64 * 0.1,
            region,
            weather.map(Arc::from),
            Some(severity),
        )
    }

    fn three_records() -> AccidentDataset {
        AccidentDataset::from_records(vec![
            record(Some("Ohio"), Some("Rain"), DayOfWeek::Monday, 5, 4),
            record(Some("Ohio"), Some("Clear"), DayOfWeek::Tuesday, 10, 2),
            record(Some("Texas"), Some("Rain"), DayOfWeek::Monday, 5, 2),
        ])
    }

    fn varied() -> AccidentDataset {
        let regions = [Some("Ohio"), Some("Texas"), None];
        let weather = [Some("Rain"), Some("Clear"), Some("Snow"), None];
        let mut records = Vec::new();
        for i in 0..200usize {
            let mut rec = record(
                regions[i % 3],
                weather[i % 4],
                DayOfWeek::ALL[i % 7],
                (i % 24) as u32,
                1 + (i % 4) as i64,
            );
            if i % 11 == 0 {
                rec = AccidentRecord::new(None, rec.start_lat, rec.start_lng, rec.region, rec.weather_condition, rec.severity);
            }
            records.push(rec);
        }
        AccidentDataset::from_records(records)
    }

    fn criteria_grid() -> Vec<FilterCriteria> {
        vec![
            FilterCriteria::default(),
            FilterCriteria {
                region: Some("Ohio".to_string()),
                ..Default::default()
            },
            FilterCriteria {
                weather_conditions: ["Rain", "Snow"].iter().map(|s| s.to_string()).collect(),
                days_of_week: [DayOfWeek::Monday, DayOfWeek::Saturday].into_iter().collect(),
                ..Default::default()
            },
            FilterCriteria {
                region: Some("Texas".to_string()),
                hour_range: HourRange::new(6, 18),
                fatal_only: true,
                ..Default::default()
            },
        ]
    }

    #[test]
    fn region_filter_on_three_records() {
        let ds = three_records();
        let ohio = FilterCriteria {
            region: Some("Ohio".to_string()),
            ..Default::default()
        };
        let (view, count) = filter(&ds, &ohio);
        assert_eq!(count, 2);
        assert_eq!(view.indices(), &[0, 1]);

        let fatal_ohio = FilterCriteria {
            fatal_only: true,
            ..ohio
        };
        let (view, count) = filter(&ds, &fatal_ohio);
        assert_eq!(count, 1);
        assert_eq!(view.indices(), &[0]);
    }

    #[test]
    fn all_states_sentinel_is_no_constraint() {
        let ds = varied();
        for base in criteria_grid() {
            let sentinel = FilterCriteria {
                region: Some(ALL_STATES.to_string()),
                ..base.clone()
            };
            let unconstrained = FilterCriteria {
                region: None,
                ..base
            };
            assert_eq!(filter(&ds, &sentinel).0.indices(), filter(&ds, &unconstrained).0.indices());
        }
        assert_eq!(FilterCriteria::default().region_label(), ALL_STATES);
    }

    #[test]
    fn every_record_satisfies_every_active_predicate() {
        let ds = varied();
        for criteria in criteria_grid() {
            let (view, count) = filter(&ds, &criteria);
            assert_eq!(view.len(), count);
            for rec in view.records() {
                if let Some(region) = criteria.region_constraint() {
                    assert_eq!(rec.region, Some(region));
                }
                if !criteria.weather_conditions.is_empty() {
                    let w = rec.weather_condition.as_deref().unwrap();
                    assert!(criteria.weather_conditions.contains(w));
                }
                if !criteria.days_of_week.is_empty() {
                    assert!(criteria.days_of_week.contains(&rec.day_of_week.unwrap()));
                }
                assert!(criteria.hour_range.contains(rec.hour.unwrap()));
                if criteria.fatal_only {
                    assert!(rec.is_fatal());
                }
            }
            // Everything left out fails at least one predicate.
            let kept: BTreeSet<usize> = view.indices().iter().copied().collect();
            for (i, rec) in ds.records().iter().enumerate() {
                if !kept.contains(&i) {
                    assert!(!criteria.matches(rec));
                }
            }
        }
    }

    #[test]
    fn filtering_is_idempotent_and_pure() {
        let ds = varied();
        let before = ds.records().to_vec();
        for criteria in criteria_grid() {
            let (view, _) = filter(&ds, &criteria);
            let again = view.refine(&criteria);
            assert_eq!(view.indices(), again.indices());
            assert_eq!(filter(&ds, &criteria).0.indices(), view.indices());
        }
        assert_eq!(ds.records(), before.as_slice());
    }

    #[test]
    fn hour_range_is_inclusive_and_excludes_missing_hours() {
        let ds = varied();
        let criteria = FilterCriteria {
            hour_range: HourRange::new(5, 5),
            ..Default::default()
        };
        let (view, _) = filter(&ds, &criteria);
        assert!(!view.is_empty());
        assert!(view.records().all(|r| r.hour == Some(5)));

        let (full, count) = filter(&ds, &FilterCriteria::default());
        let with_time = ds.records().iter().filter(|r| r.hour.is_some()).count();
        assert_eq!(count, with_time);
        assert!(count < ds.len());
        assert!(full.records().all(|r| r.hour.is_some()));
    }

    #[test]
    fn inverted_hour_range_matches_nothing() {
        let ds = varied();
        let criteria = FilterCriteria {
            hour_range: HourRange::new(20, 4),
            ..Default::default()
        };
        assert_eq!(filter(&ds, &criteria).1, 0);
        assert_eq!(HourRange::new(3, 99), HourRange { start: 3, end: 23 });
    }

    #[test]
    fn unknown_region_and_weather_never_match() {
        let ds = varied();
        let criteria = FilterCriteria {
            region: Some("Atlantis".to_string()),
            ..Default::default()
        };
        assert_eq!(filter(&ds, &criteria).1, 0);

        let criteria = FilterCriteria {
            weather_conditions: ["Fog".to_string()].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(filter(&ds, &criteria).1, 0);
    }

    #[test]
    fn coordinates_follow_the_view() {
        let ds = three_records();
        let (view, _) = filter(
            &ds,
            &FilterCriteria {
                weather_conditions: ["Rain".to_string()].into_iter().collect(),
                ..Default::default()
            },
        );
        let coords: Vec<(f64, f64)> = view.coordinates().collect();
        assert_eq!(
            coords,
            [
                (ds.records()[0].start_lat, ds.records()[0].start_lng),
                (ds.records()[2].start_lat, ds.records()[2].start_lng),
            ]
        );
    }
}
