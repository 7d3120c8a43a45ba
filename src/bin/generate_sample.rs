use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Write a synthetic accidents CSV in the layout the dashboard reads.
#[derive(Parser, Debug)]
#[command(name = "generate_sample", version)]
struct Args {
    /// Number of rows to write
    #[arg(long = "rows", default_value_t = 50_000)]
    rows: usize,

    /// Output CSV path
    #[arg(short = 'o', long = "output", default_value = "sample_accidents.csv")]
    output: PathBuf,

    /// RNG seed
    #[arg(long = "seed", default_value_t = 42)]
    seed: u64,
}

#[derive(Serialize)]
struct Row {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Severity")]
    severity: u8,
    #[serde(rename = "Start_Time")]
    start_time: String,
    #[serde(rename = "Start_Lat")]
    start_lat: Option<f64>,
    #[serde(rename = "Start_Lng")]
    start_lng: Option<f64>,
    #[serde(rename = "State")]
    state: &'static str,
    #[serde(rename = "Weather_Condition")]
    weather_condition: Option<&'static str>,
}

/// (code, latitude, longitude, relative weight) of accident hot spots.
/// "PR" is deliberately outside the dashboard's state table.
const STATES: [(&str, f64, f64, u32); 10] = [
    ("CA", 34.05, -118.24, 30),
    ("FL", 28.54, -81.38, 15),
    ("TX", 29.76, -95.37, 12),
    ("SC", 34.00, -81.03, 6),
    ("NY", 40.71, -74.01, 6),
    ("NC", 35.23, -80.84, 6),
    ("OH", 39.96, -83.00, 4),
    ("PA", 39.95, -75.17, 4),
    ("OR", 45.52, -122.68, 3),
    ("PR", 18.47, -66.11, 1),
];

const WEATHER: [(&str, u32); 10] = [
    ("Fair", 35),
    ("Clear", 20),
    ("Mostly Cloudy", 12),
    ("Cloudy", 10),
    ("Partly Cloudy", 8),
    ("Light Rain", 6),
    ("Rain", 3),
    ("Light Snow", 2),
    ("Fog", 2),
    ("Heavy Rain", 1),
];

fn weighted<'a, T>(rng: &mut StdRng, items: &'a [T], weight: impl Fn(&T) -> u32) -> &'a T {
    let total: u32 = items.iter().map(&weight).sum();
    let mut pick = rng.gen_range(0..total);
    for item in items {
        let w = weight(item);
        if pick < w {
            return item;
        }
        pick -= w;
    }
    &items[items.len() - 1]
}

/// Hour of day skewed towards the morning and evening commutes.
fn commute_hour(rng: &mut StdRng) -> i64 {
    match rng.gen_range(0..10) {
        0..=2 => rng.gen_range(6..=9),
        3..=5 => rng.gen_range(15..=18),
        _ => rng.gen_range(0..24),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let epoch = NaiveDate::from_ymd_opt(2016, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("building start date")?;

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    for i in 0..args.rows {
        let &(state, lat, lng, _) = weighted(&mut rng, &STATES, |s| s.3);
        let day = rng.gen_range(0..2_630);
        let start = epoch
            + Duration::days(day)
            + Duration::hours(commute_hour(&mut rng))
            + Duration::minutes(rng.gen_range(0..60))
            + Duration::seconds(rng.gen_range(0..60));

        // A small share of rows carries the defects the loader must tolerate.
        let start_time = if rng.gen_bool(0.01) {
            "unknown".to_string()
        } else {
            start.format("%Y-%m-%d %H:%M:%S").to_string()
        };
        let has_location = !rng.gen_bool(0.005);
        let weather_condition = (!rng.gen_bool(0.02)).then(|| weighted(&mut rng, &WEATHER, |w| w.1).0);
        let severity = match rng.gen_range(0..100) {
            0..=2 => 4,
            3..=17 => 3,
            18..=95 => 2,
            _ => 1,
        };

        writer.serialize(Row {
            id: format!("A-{}", i + 1),
            severity,
            start_time,
            start_lat: has_location.then(|| lat + rng.gen_range(-1.5..1.5)),
            start_lng: has_location.then(|| lng + rng.gen_range(-1.5..1.5)),
            state,
            weather_condition,
        })?;
    }
    writer.flush()?;

    println!("Wrote {} accidents to {}", args.rows, args.output.display());
    Ok(())
}
