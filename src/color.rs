use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

/// Fill for accident points on the map (translucent red).
pub const ACCIDENT_POINT: Color32 = Color32::from_rgba_premultiplied(125, 19, 0, 160);

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

/// Colour for bar `index`, cycling through `palette`.
pub fn bar_color(palette: &[Color32], index: usize) -> Color32 {
    if palette.is_empty() {
        return Color32::LIGHT_BLUE;
    }
    palette[index % palette.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        let palette = generate_palette(7);
        assert_eq!(palette.len(), 7);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn bar_color_wraps_and_falls_back() {
        let palette = generate_palette(3);
        assert_eq!(bar_color(&palette, 4), palette[1]);
        assert_eq!(bar_color(&[], 2), Color32::LIGHT_BLUE);
    }
}
