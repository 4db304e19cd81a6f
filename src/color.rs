use std::sync::OnceLock;

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

// ---------------------------------------------------------------------------
// Trace palette: emission order → Color32
// ---------------------------------------------------------------------------

/// Number of distinct hues before trace colours repeat.
pub const TRACE_PALETTE_SIZE: usize = 10;

/// Colour for the trace at the given emission index. The palette is fixed
/// and cyclic, so identical compile inputs always yield identical colours.
pub fn trace_color(index: usize) -> Color32 {
    static PALETTE: OnceLock<Vec<Color32>> = OnceLock::new();
    let palette = PALETTE.get_or_init(|| generate_palette(TRACE_PALETTE_SIZE));
    palette[index % TRACE_PALETTE_SIZE]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_hues() {
        let palette = generate_palette(TRACE_PALETTE_SIZE);
        assert_eq!(palette.len(), TRACE_PALETTE_SIZE);
        for pair in palette.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn trace_colors_cycle() {
        assert_eq!(trace_color(0), trace_color(TRACE_PALETTE_SIZE));
        assert_eq!(trace_color(3), trace_color(3));
        assert_ne!(trace_color(0), trace_color(1));
    }
}
