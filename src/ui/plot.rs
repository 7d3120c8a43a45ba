use eframe::egui::{self, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotBounds, Points};

use crate::color::{bar_color, generate_palette, ACCIDENT_POINT};
use crate::data::summary::DashboardSummary;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 220.0;
const MAP_HEIGHT: f32 = 480.0;

/// The map draws at most this many points; larger views are thinned by stride.
const MAX_MAP_POINTS: usize = 200_000;

/// Half extent of the initial map window, in degrees.
const MAP_HALF_SPAN_LNG: f64 = 11.0;
const MAP_HALF_SPAN_LAT: f64 = 6.0;

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the charts and map for the current filtered view.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open an accidents file to begin  (File → Open…)");
        });
        return;
    }

    let summary = state.summary.clone();
    ui.heading(&summary.headline);
    ui.add_space(4.0);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.columns(2, |cols: &mut [Ui]| {
                day_chart(&mut cols[0], &summary);
                hour_chart(&mut cols[1], &summary);
            });

            ui.add_space(8.0);
            ui.strong("Accidents by Weather Condition");
            ui.columns(2, |cols: &mut [Ui]| {
                weather_chart(&mut cols[0], &summary);
                weather_table(&mut cols[1], &summary);
            });

            ui.add_space(8.0);
            ui.strong("Accident Locations Map");
            accident_map(ui, state);
        });
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

fn show_bars(ui: &mut Ui, id: &str, x_label: &str, chart: BarChart) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show_grid([false, true])
        .x_axis_label(x_label)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

fn labelled(bars: Vec<Bar>) -> BarChart {
    BarChart::new(bars)
        .width(0.8)
        .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| {
            format!("{}\n{} accidents", bar.name, bar.value)
        }))
}

fn day_chart(ui: &mut Ui, summary: &DashboardSummary) {
    ui.strong("Accidents by Day of Week");
    let palette = generate_palette(summary.by_day.len());
    let bars: Vec<Bar> = summary
        .by_day
        .iter()
        .enumerate()
        .map(|(i, d)| {
            Bar::new(i as f64, d.count as f64)
                .name(d.day.name())
                .fill(bar_color(&palette, i))
        })
        .collect();

    show_bars(ui, "day_chart", "Monday → Sunday", labelled(bars));
}

fn hour_chart(ui: &mut Ui, summary: &DashboardSummary) {
    ui.strong("Accidents by Hour");
    let bars: Vec<Bar> = summary
        .by_hour
        .iter()
        .map(|h| {
            Bar::new(f64::from(h.hour), h.count as f64)
                .name(format!("{:02}:00", h.hour))
                .fill(egui::Color32::LIGHT_BLUE)
        })
        .collect();

    show_bars(ui, "hour_chart", "Hour of day", labelled(bars));
}

fn weather_chart(ui: &mut Ui, summary: &DashboardSummary) {
    let n = summary.top_weather.len();
    let palette = generate_palette(n);
    // Most frequent condition on top.
    let bars: Vec<Bar> = summary
        .top_weather
        .iter()
        .enumerate()
        .map(|(i, w)| {
            Bar::new((n - 1 - i) as f64, w.count as f64)
                .name(&w.condition)
                .fill(bar_color(&palette, i))
        })
        .collect();

    show_bars(ui, "weather_chart", "Accidents", labelled(bars).horizontal());
}

fn weather_table(ui: &mut Ui, summary: &DashboardSummary) {
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::remainder())
        .column(Column::auto().at_least(80.0))
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Weather");
            });
            header.col(|ui| {
                ui.strong("Accidents");
            });
        })
        .body(|mut body| {
            for w in &summary.top_weather {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(&w.condition);
                    });
                    row.col(|ui| {
                        ui.label(w.count.to_string());
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Scatter of accident locations, centered on the view's mean coordinate
/// whenever the filters change.
fn accident_map(ui: &mut Ui, state: &mut AppState) {
    let recenter = std::mem::take(&mut state.recenter_map);
    let center = state.summary.map_center;

    let Some(dataset) = state.dataset.as_deref() else {
        return;
    };
    let records = dataset.records();
    let visible = state.visible_indices.len();
    let stride = visible.div_ceil(MAX_MAP_POINTS).max(1);
    let points: Vec<[f64; 2]> = state
        .visible_indices
        .iter()
        .step_by(stride)
        .map(|&i| [records[i].start_lng, records[i].start_lat])
        .collect();
    let n_points = points.len();

    Plot::new("accident_map")
        .height(MAP_HEIGHT)
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            if recenter {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                    [center.lng - MAP_HALF_SPAN_LNG, center.lat - MAP_HALF_SPAN_LAT],
                    [center.lng + MAP_HALF_SPAN_LNG, center.lat + MAP_HALF_SPAN_LAT],
                ));
            }
            plot_ui.points(
                Points::new(points)
                    .radius(1.5)
                    .color(ACCIDENT_POINT)
                    .name("Accidents"),
            );
        });

    if stride > 1 {
        ui.label(format!(
            "Map shows {n_points} of {visible} accidents (every {stride}th)"
        ));
    }
}
