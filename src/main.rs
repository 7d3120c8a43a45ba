mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;

use app::AccidentAtlasApp;
use config::Config;
use data::filter::filter;
use data::loader;
use data::summary::DashboardSummary;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();
    let config = Config::parse();

    if config.summary {
        return print_summary(&config);
    }

    let state = startup_state(&config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Accident Atlas – US Traffic Accidents",
        options,
        Box::new(move |_cc| Ok(Box::new(AccidentAtlasApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard window: {e}"))
}

/// Load the startup dataset and apply the command-line filters. A file that
/// cannot be loaded ends startup.
fn startup_state(config: &Config) -> Result<AppState> {
    let mut state = AppState::new(config.load_options());
    state
        .try_open(&config.data)
        .with_context(|| format!("loading {}", config.data.display()))?;
    state.set_criteria(config.criteria());
    Ok(state)
}

/// Headless mode: load, filter with the command-line criteria and print the
/// summary as JSON.
fn print_summary(config: &Config) -> Result<()> {
    let dataset = loader::load(&config.data, &config.load_options())
        .with_context(|| format!("loading {}", config.data.display()))?;

    let criteria = config.criteria();
    let (view, count) = filter(&dataset, &criteria);
    log::info!("{count} of {} accidents match", dataset.len());

    let summary = DashboardSummary::from_view(&view, &criteria);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &summary).context("writing summary")?;
    writeln!(out).context("writing summary")?;
    Ok(())
}
