//! Named and `#RRGGBB` colors, as accepted by color-valued host properties.

use crate::error::{raise, EidosError, RuntimeResult};

/// A named color and its byte components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedColor {
    pub name: &'static str,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

const fn named(name: &'static str, red: u8, green: u8, blue: u8) -> NamedColor {
    NamedColor {
        name,
        red,
        green,
        blue,
    }
}

/// Common R color names with their X11 values.
pub const NAMED_COLORS: &[NamedColor] = &[
    named("white", 255, 255, 255),
    named("black", 0, 0, 0),
    named("red", 255, 0, 0),
    named("green", 0, 255, 0),
    named("blue", 0, 0, 255),
    named("yellow", 255, 255, 0),
    named("cyan", 0, 255, 255),
    named("magenta", 255, 0, 255),
    named("orange", 255, 165, 0),
    named("purple", 160, 32, 240),
    named("brown", 165, 42, 42),
    named("pink", 255, 192, 203),
    named("gray", 190, 190, 190),
    named("grey", 190, 190, 190),
    named("darkgray", 169, 169, 169),
    named("darkgrey", 169, 169, 169),
    named("lightgray", 211, 211, 211),
    named("lightgrey", 211, 211, 211),
    named("navy", 0, 0, 128),
    named("maroon", 176, 48, 96),
    named("violet", 238, 130, 238),
    named("gold", 255, 215, 0),
    named("beige", 245, 245, 220),
    named("tan", 210, 180, 140),
    named("salmon", 250, 128, 114),
    named("turquoise", 64, 224, 208),
    named("darkgreen", 0, 100, 0),
    named("darkred", 139, 0, 0),
    named("darkblue", 0, 0, 139),
    named("skyblue", 135, 206, 235),
    named("chartreuse", 127, 255, 0),
    named("coral", 255, 127, 80),
];

fn hex_byte(text: &str) -> Option<u8> {
    u8::from_str_radix(text, 16).ok()
}

/// Resolves `name` to byte components.
pub fn color_components_u8(name: &str) -> RuntimeResult<(u8, u8, u8)> {
    if let Some(hex) = name.strip_prefix('#') {
        // from_str_radix alone would also take a sign, as in "#+F+F+F"
        if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            if let (Some(r), Some(g), Some(b)) = (
                hex_byte(&hex[0..2]),
                hex_byte(&hex[2..4]),
                hex_byte(&hex[4..6]),
            ) {
                return Ok((r, g, b));
            }
        }
    } else if let Some(color) = NAMED_COLORS.iter().find(|c| c.name == name) {
        return Ok((color.red, color.green, color.blue));
    }

    raise(EidosError::type_error(
        "color_components",
        format!("color '{}' was not recognized; use a color name or #RRGGBB", name),
    ))
}

/// Resolves `name` to float components in `0.0..=1.0`.
pub fn color_components(name: &str) -> RuntimeResult<(f32, f32, f32)> {
    let (r, g, b) = color_components_u8(name)?;
    Ok((r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0))
}

/// Renders float components as `#RRGGBB`, clamping each to `0.0..=1.0`.
pub fn color_string(red: f64, green: f64, blue: f64) -> String {
    fn byte(component: f64) -> u8 {
        if component.is_nan() {
            return 0;
        }
        (component.clamp(0.0, 1.0) * 255.0).round() as u8
    }
    format!("#{:02X}{:02X}{:02X}", byte(red), byte(green), byte(blue))
}
