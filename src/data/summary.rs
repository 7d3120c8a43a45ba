use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::filter::{FilterCriteria, FilteredView, HourRange};
use super::model::{date_span, DayOfWeek};

/// Number of weather categories shown in the weather chart.
pub const TOP_WEATHER_LIMIT: usize = 10;

/// Map center used when there is nothing to average: the geographic center
/// of the contiguous United States.
pub const DEFAULT_MAP_CENTER: MapCenter = MapCenter {
    lat: 39.8283,
    lng: -98.5795,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub day: DayOfWeek,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherCount {
    pub condition: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lng: f64,
}

/// Accidents per weekday, always seven buckets in calendar order.
pub fn day_of_week_counts(view: &FilteredView<'_>) -> Vec<DayCount> {
    let mut counts = [0usize; 7];
    for day in view.records().filter_map(|r| r.day_of_week) {
        counts[day.index()] += 1;
    }
    DayOfWeek::ALL
        .into_iter()
        .zip(counts)
        .map(|(day, count)| DayCount { day, count })
        .collect()
}

/// Accidents per hour for every hour in `range`, ascending and zero-filled.
pub fn hour_counts(view: &FilteredView<'_>, range: HourRange) -> Vec<HourCount> {
    let mut counts = [0usize; 24];
    for hour in view.records().filter_map(|r| r.hour) {
        counts[usize::from(hour)] += 1;
    }
    range
        .hours()
        .map(|hour| HourCount {
            hour,
            count: counts[usize::from(hour)],
        })
        .collect()
}

/// The `limit` most frequent weather conditions, by descending count.
/// Ties are ordered by name. Records without a condition are not counted.
pub fn top_weather_conditions(view: &FilteredView<'_>, limit: usize) -> Vec<WeatherCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for w in view.records().filter_map(|r| r.weather_condition.as_deref()) {
        *counts.entry(w).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(condition, count)| WeatherCount {
            condition: condition.to_string(),
            count,
        })
        .collect()
}

/// Mean coordinate of the view, or [`DEFAULT_MAP_CENTER`] when it is empty.
pub fn map_center(view: &FilteredView<'_>) -> MapCenter {
    if view.is_empty() {
        return DEFAULT_MAP_CENTER;
    }
    let (lat_sum, lng_sum) = view
        .coordinates()
        .fold((0.0, 0.0), |(la, lo), (lat, lng)| (la + lat, lo + lng));
    let n = view.len() as f64;
    let center = MapCenter {
        lat: lat_sum / n,
        lng: lng_sum / n,
    };
    if center.lat.is_finite() && center.lng.is_finite() {
        center
    } else {
        DEFAULT_MAP_CENTER
    }
}

// ---------------------------------------------------------------------------
// DashboardSummary – everything the dashboard draws
// ---------------------------------------------------------------------------

/// Aggregates of one filtered view, ready for charts or JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub count: usize,
    pub region: String,
    pub headline: String,
    pub by_day: Vec<DayCount>,
    pub by_hour: Vec<HourCount>,
    pub top_weather: Vec<WeatherCount>,
    pub map_center: MapCenter,
    pub date_span: Option<(NaiveDate, NaiveDate)>,
}

impl DashboardSummary {
    pub fn from_view(view: &FilteredView<'_>, criteria: &FilterCriteria) -> Self {
        let region = criteria.region_label().to_string();
        DashboardSummary {
            count: view.len(),
            headline: format!("Showing {} accidents in {region}", view.len()),
            region,
            by_day: day_of_week_counts(view),
            by_hour: hour_counts(view, criteria.hour_range),
            top_weather: top_weather_conditions(view, TOP_WEATHER_LIMIT),
            map_center: map_center(view),
            date_span: date_span(view.records()),
        }
    }

    /// Summary of an empty view under `criteria`.
    pub fn empty(criteria: &FilterCriteria) -> Self {
        let region = criteria.region_label().to_string();
        DashboardSummary {
            count: 0,
            headline: format!("Showing 0 accidents in {region}"),
            region,
            by_day: DayOfWeek::ALL
                .into_iter()
                .map(|day| DayCount { day, count: 0 })
                .collect(),
            by_hour: criteria
                .hour_range
                .hours()
                .map(|hour| HourCount { hour, count: 0 })
                .collect(),
            top_weather: Vec::new(),
            map_center: DEFAULT_MAP_CENTER,
            date_span: None,
        }
    }
}

impl Default for DashboardSummary {
    fn default() -> Self {
        Self::empty(&FilterCriteria::default())
    }
}
