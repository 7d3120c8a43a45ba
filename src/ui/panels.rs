use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use crate::data::filter::{HourRange, ALL_STATES};
use crate::data::model::DayOfWeek;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    // Own the Arc so `state` stays mutable below.
    let dataset = match &state.dataset {
        Some(ds) => ds.clone(),
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };
    let facets = dataset.facets();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- State selector ----
            ui.strong("Select State");
            let current = state.criteria.region_label().to_string();
            egui::ComboBox::from_id_salt("state_select")
                .selected_text(&current)
                .width(ui.available_width() - 8.0)
                .show_ui(ui, |ui: &mut Ui| {
                    let options = std::iter::once(ALL_STATES).chain(facets.regions.iter().copied());
                    for region in options {
                        if ui.selectable_label(current == region, region).clicked() {
                            state.set_region(region);
                        }
                    }
                });
            ui.separator();

            // ---- Weather conditions ----
            let n_weather = state.criteria.weather_conditions.len();
            let header = format!(
                "Weather Conditions  ({n_weather}/{})",
                facets.weather_conditions.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("weather_filter")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("Clear").clicked() {
                        state.clear_weather();
                    }
                    for condition in &facets.weather_conditions {
                        let mut checked = state.criteria.weather_conditions.contains(&**condition);
                        if ui.checkbox(&mut checked, &**condition).changed() {
                            state.toggle_weather(condition);
                        }
                    }
                });

            // ---- Days of the week ----
            let n_days = state.criteria.days_of_week.len();
            egui::CollapsingHeader::new(RichText::new(format!("Day of the Week  ({n_days}/7)")).strong())
                .id_salt("day_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("Clear").clicked() {
                        state.clear_days();
                    }
                    for day in DayOfWeek::ALL {
                        let present = facets.days_of_week.contains(&day);
                        let mut checked = state.criteria.days_of_week.contains(&day);
                        let label = if present {
                            RichText::new(day.name())
                        } else {
                            RichText::new(day.name()).weak()
                        };
                        if ui.checkbox(&mut checked, label).changed() {
                            state.toggle_day(day);
                        }
                    }
                });
            ui.separator();

            // ---- Hour of day ----
            ui.strong("Hour of Day");
            let mut range = state.criteria.hour_range;
            let start_changed = ui
                .add(Slider::new(&mut range.start, 0..=23).text("from"))
                .changed();
            let end_changed = ui
                .add(Slider::new(&mut range.end, 0..=23).text("to"))
                .changed();
            if start_changed && range.start > range.end {
                range.end = range.start;
            }
            if end_changed && range.end < range.start {
                range.start = range.end;
            }
            state.set_hour_range(HourRange::new(range.start, range.end));
            ui.separator();

            // ---- Severity ----
            let mut fatal_only = state.criteria.fatal_only;
            if ui
                .checkbox(&mut fatal_only, "Show Only Fatal Accidents")
                .changed()
            {
                state.set_fatal_only(fatal_only);
            }
            ui.separator();

            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_reload = state.source.is_some();
            if ui.add_enabled(can_reload, egui::Button::new("Reload")).clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let stats = ds.stats();
            ui.label(format!(
                "{} accidents loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ))
            .on_hover_text(format!(
                "{} rows read, {} malformed, {} without coordinates, \
                 {} unparseable start times, {} unknown state codes",
                stats.rows_read,
                stats.rows_malformed,
                stats.rows_missing_coordinates,
                stats.unparsed_timestamps,
                stats.unmapped_regions
            ));

            if let Some((first, last)) = ds.date_span() {
                ui.separator();
                ui.label(format!("{first} – {last}"));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open accident records")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
