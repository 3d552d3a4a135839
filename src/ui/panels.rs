use eframe::egui::{self, Color32, RichText, TextEdit, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::TimeBound;
use crate::data::series::ChartSet;
use crate::state::{AppState, LoadedDataset};

// ---------------------------------------------------------------------------
// Left side panel – time window widgets
// ---------------------------------------------------------------------------

/// Render the left panel: the date range and time-of-day window.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(view) = state.active_view_mut() else {
        return;
    };

    ui.heading(&view.config.name);
    ui.separator();

    if let Some(err) = &view.load_error {
        ui.label(RichText::new(err).color(Color32::RED));
        ui.separator();
    }

    let Some(loaded) = view.loaded.as_mut() else {
        ui.label("No dataset loaded.");
        return;
    };

    bound_controls(ui, &view.config.name, loaded);

    // After the controls, so the summary reflects this frame's edits.
    ui.separator();
    let total = loaded.dataset.len();
    let set = loaded.charts(&view.config);
    let (rows, fallback) = window_summary(set, total);
    ui.label(rows);
    if let Some(notice) = fallback {
        ui.label(RichText::new(notice).color(Color32::YELLOW));
    }

    ui.separator();
    egui::CollapsingHeader::new(format!("{} channels", loaded.dataset.field_names().len()))
        .id_salt(format!("{}_channels", view.config.name))
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            for field in loaded.dataset.field_names() {
                ui.label(field);
            }
        });
}

/// Row count line, plus a notice when the window was ignored.
fn window_summary(set: &ChartSet, total: usize) -> (String, Option<String>) {
    let rows = format!("{} of {total} records", set.row_count);
    let notice = set
        .fallback
        .as_ref()
        .map(|reason| format!("Invalid window, showing all data ({reason})"));
    (rows, notice)
}

fn bound_controls(ui: &mut Ui, name: &str, loaded: &mut LoadedDataset) {
    let mut dates_changed = false;

    egui::Grid::new(format!("{name}_bound"))
        .num_columns(2)
        .spacing([8.0, 6.0])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Start date");
            dates_changed |= ui
                .add(
                    DatePickerButton::new(&mut loaded.bound.start_date)
                        .id_salt(&format!("{name}_start_date")),
                )
                .changed();
            ui.end_row();

            ui.strong("End date");
            dates_changed |= ui
                .add(
                    DatePickerButton::new(&mut loaded.bound.end_date)
                        .id_salt(&format!("{name}_end_date")),
                )
                .changed();
            ui.end_row();

            ui.strong("Start time");
            ui.add(
                TextEdit::singleline(&mut loaded.bound.start_time)
                    .hint_text("HH:MM")
                    .desired_width(60.0),
            );
            ui.end_row();

            ui.strong("End time");
            ui.add(
                TextEdit::singleline(&mut loaded.bound.end_time)
                    .hint_text("HH:MM")
                    .desired_width(60.0),
            );
            ui.end_row();
        });

    if dates_changed {
        loaded.clamp_dates();
    }

    ui.add_space(6.0);
    if ui.button("Reset window").clicked() {
        loaded.bound = TimeBound::covering(&loaded.dataset);
    }

    ui.separator();
    ui.label(format!(
        "Available: {} → {}",
        loaded.dataset.min_timestamp(),
        loaded.dataset.max_timestamp()
    ));
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu and dataset tabs.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                if let Some(view) = state.active_view_mut() {
                    let path = view.config.path.clone();
                    // Failure is shown in the side panel.
                    let _ = view.load_from(&path);
                }
                ui.close_menu();
            }
        });

        ui.separator();

        for i in 0..state.views.len() {
            let label = state.views[i].config.name.clone();
            if ui.selectable_label(state.active == i, label).clicked() {
                state.active = i;
            }
        }

    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Replace the active tab's dataset with a file picked by the user.
pub fn open_file_dialog(state: &mut AppState) {
    let Some(view) = state.active_view_mut() else {
        return;
    };

    let file = rfd::FileDialog::new()
        .set_title(format!("Open {} data", view.config.name))
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if view.load_from(&path).is_ok() {
            view.config.path = path;
        }
    }
}
