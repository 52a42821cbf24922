use ratatui::style::Color;

// A small, modern palette (black + dark grays + purple accent) with limited
// semantic colors.
//
// Keep this palette cohesive. Prefer adding new roles here instead of
// sprinkling colors through the UI.
pub const BG: Color = Color::Rgb(11, 13, 16);
pub const SURFACE: Color = Color::Rgb(17, 21, 27);
pub const BAR_BG: Color = Color::Rgb(14, 18, 24);

pub const FG: Color = Color::Rgb(229, 231, 235);
pub const MUTED: Color = Color::Rgb(156, 163, 175);
pub const DIM: Color = Color::Rgb(107, 114, 128);
pub const BORDER: Color = Color::Rgb(55, 65, 81);

pub const ACCENT: Color = Color::Rgb(167, 139, 250);
pub const LINK: Color = Color::Rgb(129, 140, 248);

// Semantic colors (keep minimal).
pub const SUCCESS: Color = Color::Rgb(134, 239, 172);
pub const ERROR: Color = Color::Rgb(248, 113, 113);
pub const WARN: Color = Color::Rgb(251, 191, 36);

const MISERY_LOW: (u8, u8, u8) = (196, 181, 253);
const MISERY_HIGH: (u8, u8, u8) = (91, 33, 182);

/// Evenly interpolated purple gradient for the misery score bar, light to
/// dark, `size` steps.
pub fn misery_palette(size: u32) -> Vec<Color> {
    let steps = size.max(1);
    (0..steps)
        .map(|step| {
            let t = if steps == 1 {
                0.0
            } else {
                f64::from(step) / f64::from(steps - 1)
            };
            Color::Rgb(
                lerp(MISERY_LOW.0, MISERY_HIGH.0, t),
                lerp(MISERY_LOW.1, MISERY_HIGH.1, t),
                lerp(MISERY_LOW.2, MISERY_HIGH.2, t),
            )
        })
        .collect()
}

fn lerp(low: u8, high: u8, t: f64) -> u8 {
    let low = f64::from(low);
    let high = f64::from(high);
    (low + (high - low) * t).round() as u8
}
