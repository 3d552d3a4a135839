use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Colour per channel across a whole tab, so a channel shared by several
/// charts (e.g. `Tamb[C]`) keeps one colour everywhere.
#[derive(Debug, Clone, Default)]
pub struct SeriesColors {
    fields: Vec<String>,
    palette: Vec<Color32>,
}

impl SeriesColors {
    /// Assign colours in first-seen order.
    pub fn new<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for f in fields {
            if !unique.iter().any(|u| u == f) {
                unique.push(f.to_string());
            }
        }
        let palette = generate_palette(unique.len());
        SeriesColors {
            fields: unique,
            palette,
        }
    }

    pub fn color_for(&self, field: &str) -> Color32 {
        self.fields
            .iter()
            .position(|f| f == field)
            .map(|i| self.palette[i])
            .unwrap_or(Color32::LIGHT_BLUE)
    }
}
