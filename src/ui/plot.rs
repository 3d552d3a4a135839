use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDateTime};
use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_plot::{GridMark, Legend, Line, Plot, PlotPoint, PlotPoints};

use crate::color::SeriesColors;
use crate::data::series::ChartData;
use crate::state::DatasetView;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Chart panels (central panel)
// ---------------------------------------------------------------------------

/// Render every chart of the active tab, stacked vertically.
pub fn chart_panels(ui: &mut Ui, view: Option<&mut DatasetView>) {
    let Some(view) = view else {
        return;
    };
    let DatasetView {
        config,
        loaded,
        colors,
        ..
    } = view;

    let Some(loaded) = loaded.as_mut() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(format!("No {} data  (File → Open…)", config.name));
        });
        return;
    };

    let (generation, set) = loaded.charts_with_generation(config);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (i, chart) in set.charts.iter().enumerate() {
                match chart {
                    Ok(chart) => {
                        ui.strong(&chart.title);
                        // New id per recompute so the view refits the new window.
                        let id = format!("{}_chart_{i}_{}", config.name, generation);
                        line_chart(ui, &id, chart, colors);
                    }
                    Err(e) => {
                        ui.strong(&config.charts[i].title);
                        ui.label(RichText::new(e.to_string()).color(Color32::RED));
                    }
                }
                ui.add_space(8.0);
            }
        });
}

/// Plot x is seconds since the epoch, reading the naive timestamp as UTC.
fn plot_x(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp() as f64
}

fn format_x(x: f64, pattern: &str) -> String {
    DateTime::from_timestamp(x as i64, 0)
        .map(|dt| dt.format(pattern).to_string())
        .unwrap_or_else(|| format!("{x:.0}"))
}

/// Break a series into runs of consecutive non-NaN points. Empty source
/// cells load as NaN, and each run is drawn as its own line so missing
/// readings stay visible as gaps.
fn split_at_gaps(points: &[(NaiveDateTime, f64)]) -> Vec<Vec<[f64; 2]>> {
    points
        .split(|(_, v)| v.is_nan())
        .filter(|run| !run.is_empty())
        .map(|run| run.iter().map(|&(ts, v)| [plot_x(ts), v]).collect())
        .collect()
}

fn line_chart(ui: &mut Ui, id: &str, chart: &ChartData, colors: &SeriesColors) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
            format_x(mark.value, "%d/%m %H:%M")
        })
        .label_formatter(|name: &str, value: &PlotPoint| {
            let at = format_x(value.x, "%Y-%m-%d %H:%M:%S");
            if name.is_empty() {
                at
            } else {
                format!("{name}\n{at}\n{:.2}", value.y)
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in &chart.series {
                let color = colors.color_for(&series.field);
                // Same name and colour, so the legend shows one entry.
                for run in split_at_gaps(&series.points) {
                    let line = Line::new(PlotPoints::from(run))
                        .name(&series.label)
                        .color(color)
                        .width(1.5);

                    plot_ui.line(line);
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::ts;

    #[test]
    fn nan_runs_split_the_line() {
        let p = |h: u32, v: f64| (ts(2024, 1, 1, h, 0), v);
        let runs = split_at_gaps(&[
            p(0, 1.0),
            p(1, 2.0),
            p(2, f64::NAN),
            p(3, f64::NAN),
            p(4, 5.0),
            p(5, f64::NAN),
        ]);

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], vec![[plot_x(ts(2024, 1, 1, 0, 0)), 1.0], [plot_x(ts(2024, 1, 1, 1, 0)), 2.0]]);
        assert_eq!(runs[1], vec![[plot_x(ts(2024, 1, 1, 4, 0)), 5.0]]);
    }

    #[test]
    fn series_without_gaps_is_one_run() {
        let runs = split_at_gaps(&[(ts(2024, 1, 1, 0, 0), 1.0), (ts(2024, 1, 1, 1, 0), 2.0)]);
        assert_eq!(runs.len(), 1);
        assert!(split_at_gaps(&[]).is_empty());
    }

    #[test]
    fn axis_values_round_trip_to_timestamps() {
        let at = ts(2024, 6, 15, 13, 45);
        assert_eq!(format_x(plot_x(at), "%Y-%m-%d %H:%M"), "2024-06-15 13:45");
    }
}
