use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;

/// Severity value that marks a fatal accident.
pub const FATAL_SEVERITY: i64 = 4;

// ---------------------------------------------------------------------------
// DayOfWeek – calendar-ordered weekday names
// ---------------------------------------------------------------------------

/// Day of the week, ordered Monday..Sunday so that `Ord` matches the
/// calendar order used by the charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// All days in calendar order.
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    /// Zero-based position in the week (Monday = 0).
    pub fn index(self) -> usize {
        self as usize
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown day of week: {0:?}")]
pub struct ParseDayOfWeekError(pub String);

impl FromStr for DayOfWeek {
    type Err = ParseDayOfWeekError;

    /// Accepts full English day names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseDayOfWeekError(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// AccidentRecord – one retained row
// ---------------------------------------------------------------------------

/// A single accident with its calendar features derived at load time.
///
/// Coordinates are always present: rows without them never become records.
#[derive(Debug, Clone, PartialEq)]
pub struct AccidentRecord {
    pub start_time: Option<NaiveDateTime>,
    pub start_lat: f64,
    pub start_lng: f64,
    /// Full region name, `None` when the source code is not in the lookup table.
    pub region: Option<&'static str>,
    pub weather_condition: Option<Arc<str>>,
    pub severity: Option<i64>,
    /// Hour of day (0–23), present exactly when `start_time` is.
    pub hour: Option<u8>,
    pub day_of_week: Option<DayOfWeek>,
    pub date: Option<NaiveDate>,
}

impl AccidentRecord {
    /// Build a record and derive `hour`, `day_of_week` and `date` from
    /// `start_time`.
    pub fn new(
        start_time: Option<NaiveDateTime>,
        start_lat: f64,
        start_lng: f64,
        region: Option<&'static str>,
        weather_condition: Option<Arc<str>>,
        severity: Option<i64>,
    ) -> Self {
        let hour = start_time.map(|t| t.hour() as u8);
        let day_of_week = start_time.map(|t| DayOfWeek::from(t.weekday()));
        let date = start_time.map(|t| t.date());
        AccidentRecord {
            start_time,
            start_lat,
            start_lng,
            region,
            weather_condition,
            severity,
            hour,
            day_of_week,
            date,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Some(FATAL_SEVERITY)
    }
}

// ---------------------------------------------------------------------------
// LoadStats – what happened to the rows while loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Data rows read from the source (excluding the header).
    pub rows_read: usize,
    /// Rows that could not be decoded at all.
    pub rows_malformed: usize,
    /// Rows dropped because latitude or longitude was missing.
    pub rows_missing_coordinates: usize,
    /// Rows with coordinates, before sampling, whose start time could not be parsed.
    pub unparsed_timestamps: usize,
    /// Rows with coordinates, before sampling, whose state code is not in the region table.
    pub unmapped_regions: usize,
    /// Rows kept after sampling.
    pub rows_retained: usize,
}

// ---------------------------------------------------------------------------
// FacetValues – distinct values offered by the filter widgets
// ---------------------------------------------------------------------------

/// Sorted distinct values of the filterable columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetValues {
    pub regions: BTreeSet<&'static str>,
    pub weather_conditions: BTreeSet<Arc<str>>,
    pub days_of_week: BTreeSet<DayOfWeek>,
}

impl FacetValues {
    fn collect(records: &[AccidentRecord]) -> Self {
        let mut facets = FacetValues::default();
        for rec in records {
            if let Some(region) = rec.region {
                facets.regions.insert(region);
            }
            if let Some(weather) = &rec.weather_condition {
                if !facets.weather_conditions.contains(weather) {
                    facets.weather_conditions.insert(weather.clone());
                }
            }
            if let Some(day) = rec.day_of_week {
                facets.days_of_week.insert(day);
            }
        }
        facets
    }
}

// ---------------------------------------------------------------------------
// AccidentDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The loaded dataset. Immutable once built; filtering produces views over it.
#[derive(Debug, Clone, Default)]
pub struct AccidentDataset {
    records: Vec<AccidentRecord>,
    facets: FacetValues,
    stats: LoadStats,
}

impl AccidentDataset {
    /// Build facet indices from the given records.
    pub fn from_records(records: Vec<AccidentRecord>) -> Self {
        let stats = LoadStats {
            rows_read: records.len(),
            rows_retained: records.len(),
            ..LoadStats::default()
        };
        Self::with_stats(records, stats)
    }

    pub fn with_stats(records: Vec<AccidentRecord>, stats: LoadStats) -> Self {
        let facets = FacetValues::collect(&records);
        AccidentDataset {
            records,
            facets,
            stats,
        }
    }

    pub fn records(&self) -> &[AccidentRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&AccidentRecord> {
        self.records.get(index)
    }

    pub fn facets(&self) -> &FacetValues {
        &self.facets
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    /// Earliest and latest accident date, if any record has a start time.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        date_span(self.records.iter())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub(crate) fn date_span<'a>(
    records: impl Iterator<Item = &'a AccidentRecord>,
) -> Option<(NaiveDate, NaiveDate)> {
    records
        .filter_map(|rec| rec.date)
        .fold(None, |span, date| match span {
            None => Some((date, date)),
            Some((lo, hi)) => Some((lo.min(date), hi.max(date))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn derives_calendar_features() {
        let rec = AccidentRecord::new(
            Some(at("2023-03-06", "17:45:10")),
            40.0,
            -83.0,
            Some("Ohio"),
            None,
            Some(2),
        );
        assert_eq!(rec.hour, Some(17));
        assert_eq!(rec.day_of_week, Some(DayOfWeek::Monday));
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2023, 3, 6));
        assert!(!rec.is_fatal());
    }

    #[test]
    fn absent_start_time_leaves_features_absent() {
        let rec = AccidentRecord::new(None, 40.0, -83.0, None, None, Some(4));
        assert_eq!(rec.hour, None);
        assert_eq!(rec.day_of_week, None);
        assert_eq!(rec.date, None);
        assert!(rec.is_fatal());
    }

    #[test]
    fn day_of_week_order_and_names() {
        let names: Vec<&str> = DayOfWeek::ALL.iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        );
        assert!(DayOfWeek::Monday < DayOfWeek::Sunday);
        assert_eq!(DayOfWeek::Sunday.index(), 6);
        assert_eq!(DayOfWeek::from(Weekday::Sat), DayOfWeek::Saturday);
    }

    #[test]
    fn parses_day_names() {
        assert_eq!("friday".parse::<DayOfWeek>(), Ok(DayOfWeek::Friday));
        assert_eq!(" Sunday ".parse::<DayOfWeek>(), Ok(DayOfWeek::Sunday));
        assert!("Fri".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn dataset_collects_facets_and_span() {
        let rain: Arc<str> = Arc::from("Rain");
        let records = vec![
            AccidentRecord::new(
                Some(at("2023-03-07", "08:00:00")),
                40.0,
                -83.0,
                Some("Ohio"),
                Some(rain.clone()),
                Some(2),
            ),
            AccidentRecord::new(
                Some(at("2021-01-01", "23:00:00")),
                31.0,
                -97.0,
                Some("Texas"),
                Some(rain),
                Some(4),
            ),
            AccidentRecord::new(None, 35.0, -90.0, None, None, None),
        ];
        let ds = AccidentDataset::from_records(records);

        assert_eq!(ds.len(), 3);
        assert_eq!(
            ds.facets().regions.iter().copied().collect::<Vec<_>>(),
            ["Ohio", "Texas"]
        );
        assert_eq!(ds.facets().weather_conditions.len(), 1);
        assert_eq!(
            ds.facets().days_of_week.iter().copied().collect::<Vec<_>>(),
            [DayOfWeek::Tuesday, DayOfWeek::Friday]
        );
        assert_eq!(
            ds.date_span(),
            Some((
                NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 3, 7).unwrap()
            ))
        );
        assert_eq!(ds.stats().rows_retained, 3);
        assert_eq!(ds.get(1).map(|r| r.region), Some(Some("Texas")));
        assert!(ds.get(3).is_none());
    }
}
