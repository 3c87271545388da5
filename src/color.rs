// ABOUTME: Color math shared by the preview and every export renderer
// ABOUTME: Brightness adjustment, automatic text color selection and accent themes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text color used on dark backgrounds when no explicit color is configured
pub const LIGHT_TEXT: &str = "#ffffff";

/// Text color used on light backgrounds when no explicit color is configured
pub const DARK_TEXT: &str = "#000000";

/// Parse a 6-digit hex color, with or without a leading `#`, into its integer value.
///
/// Input is never validated: anything that fails to parse is treated as black.
pub fn parse_hex(hex: &str) -> u32 {
    u32::from_str_radix(hex.trim().trim_start_matches('#'), 16).unwrap_or(0) & 0x00ff_ffff
}

/// Split a hex color into its red, green and blue channels
pub fn to_rgb(hex: &str) -> (u8, u8, u8) {
    let num = parse_hex(hex);
    (
        ((num >> 16) & 0xff) as u8,
        ((num >> 8) & 0xff) as u8,
        (num & 0xff) as u8,
    )
}

/// Adjust a color by a brightness percentage.
///
/// `percent` is 1..=100 where 100 leaves the color unchanged and lower values
/// darken every channel by `round(2.55 * (percent - 100))`. The result is always
/// a lowercase, `#`-prefixed 6-digit string.
pub fn adjust_brightness(hex: &str, percent: i32) -> String {
    let num = parse_hex(hex) as i32;
    let amt = (f64::from(255 * (percent - 100)) / 100.0).round() as i32;

    let r = clamp_channel((num >> 16) + amt);
    let g = clamp_channel(((num >> 8) & 0xff) + amt);
    let b = clamp_channel((num & 0xff) + amt);

    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

// Anything below 1 collapses to 0.
fn clamp_channel(channel: i32) -> i32 {
    if channel < 255 {
        if channel < 1 {
            0
        } else {
            channel
        }
    } else {
        255
    }
}

/// Whether a background reads as dark at the given brightness
pub fn is_dark_background(bg_color: &str, brightness: i32) -> bool {
    brightness < 50 || (parse_hex(bg_color) < 0x0088_8888 && brightness < 80)
}

/// Resolve the text color: the explicit color when set, otherwise white on dark
/// backgrounds and black on light ones.
pub fn resolve_text_color(explicit: Option<&str>, bg_color: &str, brightness: i32) -> String {
    match explicit {
        Some(color) if !color.trim().is_empty() => normalize(color),
        _ if is_dark_background(bg_color, brightness) => LIGHT_TEXT.to_string(),
        _ => DARK_TEXT.to_string(),
    }
}

/// Normalize a hex color to the lowercase `#rrggbb` form
pub fn normalize(hex: &str) -> String {
    format!("#{:06x}", parse_hex(hex))
}

/// Hex digits without the leading `#`, uppercased, as DrawingML expects them
pub fn ooxml_hex(hex: &str) -> String {
    format!("{:06X}", parse_hex(hex))
}

/// Accent palettes for decorations such as the church name and captions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    Worship,
    Gold,
    Nature,
}

impl Theme {
    pub fn accent(&self) -> &'static str {
        match self {
            Theme::Light => "#4F46E5",
            Theme::Dark => "#6366F1",
            Theme::Worship => "#60A5FA",
            Theme::Gold => "#F59E0B",
            Theme::Nature => "#34D399",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "worship" => Ok(Theme::Worship),
            "gold" => Ok(Theme::Gold),
            "nature" => Ok(Theme::Nature),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Worship => "worship",
            Theme::Gold => "gold",
            Theme::Nature => "nature",
        };
        f.write_str(name)
    }
}
