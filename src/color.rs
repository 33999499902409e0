use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use daplot::predict::Method;

/// Colour of observed data points.
pub const DATA_COLOR: Color32 = Color32::LIGHT_BLUE;

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

/// Forecast line colour: one hue per prediction method.
pub fn method_color(method: Method) -> Color32 {
    let idx = Method::ALL.iter().position(|m| *m == method).unwrap_or(0);
    generate_palette(Method::ALL.len())
        .get(idx)
        .copied()
        .unwrap_or(Color32::GRAY)
}
