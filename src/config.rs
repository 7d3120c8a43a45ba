use std::path::PathBuf;

use clap::Parser;

use crate::data::filter::{FilterCriteria, HourRange, ALL_STATES};
use crate::data::loader::{LoadOptions, DEFAULT_DATA_PATH, SAMPLE_SEED, SAMPLE_SIZE};
use crate::data::model::DayOfWeek;

/// Command-line configuration. Filter flags seed the dashboard's initial
/// selections, or select the accidents summarised with `--summary`.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "accident-atlas",
    version,
    about = "Explore US traffic accident records by state, weather, weekday and hour"
)]
pub struct Config {
    /// Accident records (.csv or .parquet)
    #[arg(short = 'd', long = "data", default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// Maximum number of accidents kept after loading
    #[arg(long = "sample-size", default_value_t = SAMPLE_SIZE)]
    pub sample_size: usize,

    /// Seed for the sampling RNG
    #[arg(long = "seed", default_value_t = SAMPLE_SEED)]
    pub seed: u64,

    /// Print the JSON summary for the selected filters and exit
    #[arg(long = "summary")]
    pub summary: bool,

    /// State name to show, or "All States"
    #[arg(long = "state", default_value = ALL_STATES)]
    pub state: String,

    /// Weather condition to include (repeatable)
    #[arg(long = "weather")]
    pub weather: Vec<String>,

    /// Day of the week to include (repeatable)
    #[arg(long = "day")]
    pub days: Vec<DayOfWeek>,

    /// First hour of day to include
    #[arg(long = "hour-from", default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=23))]
    pub hour_from: u8,

    /// Last hour of day to include
    #[arg(long = "hour-to", default_value_t = 23, value_parser = clap::value_parser!(u8).range(0..=23))]
    pub hour_to: u8,

    /// Only include fatal accidents (severity 4)
    #[arg(long = "fatal-only")]
    pub fatal_only: bool,
}

impl Config {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            sample_size: self.sample_size,
            seed: self.seed,
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            region: (self.state != ALL_STATES).then(|| self.state.clone()),
            weather_conditions: self.weather.iter().cloned().collect(),
            days_of_week: self.days.iter().copied().collect(),
            hour_range: HourRange::new(self.hour_from, self.hour_to),
            fatal_only: self.fatal_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_dashboard() {
        let config = Config::try_parse_from(["accident-atlas"]).unwrap();
        assert_eq!(config.data, PathBuf::from("US_Accidents_March23.csv"));
        assert_eq!(config.load_options(), LoadOptions::default());
        assert!(!config.summary);
        assert_eq!(config.criteria(), FilterCriteria::default());
    }

    #[test]
    fn filter_flags_build_criteria() {
        let config = Config::try_parse_from([
            "accident-atlas",
            "--data",
            "accidents.parquet",
            "--state",
            "Ohio",
            "--weather",
            "Rain",
            "--weather",
            "Light Snow",
            "--day",
            "monday",
            "--day",
            "Friday",
            "--hour-from",
            "6",
            "--hour-to",
            "18",
            "--fatal-only",
            "--sample-size",
            "1000",
            "--summary",
        ])
        .unwrap();

        let criteria = config.criteria();
        assert_eq!(criteria.region.as_deref(), Some("Ohio"));
        assert!(criteria.weather_conditions.contains("Light Snow"));
        assert_eq!(criteria.weather_conditions.len(), 2);
        assert_eq!(
            criteria.days_of_week.into_iter().collect::<Vec<_>>(),
            [DayOfWeek::Monday, DayOfWeek::Friday]
        );
        assert_eq!(criteria.hour_range, HourRange::new(6, 18));
        assert!(criteria.fatal_only);
        assert_eq!(config.load_options().sample_size, 1000);
        assert!(config.summary);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::try_parse_from(["accident-atlas", "--hour-to", "24"]).is_err());
        assert!(Config::try_parse_from(["accident-atlas", "--day", "Funday"]).is_err());
    }
}
