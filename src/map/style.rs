//! Line style: color, width and dash pattern, parsed leniently from stored properties.
//!
//! Stored values come from an external store and may be missing, blank, or of
//! the wrong type. Each field falls back to its default independently.

use bevy::color::Srgba;
use bevy::math::Vec2;
use bevy::prelude::Color;
use serde_json::Value;

use crate::constants::{DEFAULT_LINE_COLOR, DEFAULT_LINE_WIDTH, MAX_LINE_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashPattern {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl DashPattern {
    /// Unknown names fall back to solid.
    pub fn parse(name: &str) -> DashPattern {
        match name.trim().to_ascii_lowercase().as_str() {
            "dashed" | "dash" => DashPattern::Dashed,
            "dotted" | "dot" => DashPattern::Dotted,
            "dashdot" | "dash-dot" => DashPattern::DashDot,
            _ => DashPattern::Solid,
        }
    }

    /// Alternating on/off lengths in multiples of the line width.
    pub fn lengths(&self) -> &'static [f32] {
        match self {
            DashPattern::Solid => &[],
            DashPattern::Dashed => &[4.0, 2.0],
            DashPattern::Dotted => &[1.0, 2.0],
            DashPattern::DashDot => &[4.0, 2.0, 1.0, 2.0],
        }
    }
}

/// Defaults applied when a stored style field is unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDefaults {
    pub color: String,
    pub width: u32,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            color: DEFAULT_LINE_COLOR.to_string(),
            width: DEFAULT_LINE_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    /// Hex text as stored, kept for saving back unchanged
    pub color_hex: String,
    pub color: Color,
    pub width: u32,
    pub pattern: DashPattern,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self::from_stored(None, None, None, &StyleDefaults::default())
    }
}

impl LineStyle {
    pub fn from_stored(
        color: Option<&Value>,
        width: Option<&Value>,
        pattern: Option<&Value>,
        defaults: &StyleDefaults,
    ) -> Self {
        let (color_hex, color) = parse_color(color, &defaults.color);
        Self {
            color_hex,
            color,
            width: parse_width(width, defaults.width),
            pattern: pattern
                .and_then(Value::as_str)
                .map(DashPattern::parse)
                .unwrap_or_default(),
        }
    }

}

/// Parse a stored width. Accepts numbers and numeric strings; anything else
/// (missing, blank, non-numeric, below 1) yields `default`. Widths above
/// `MAX_LINE_WIDTH` are clamped to it.
pub fn parse_width(value: Option<&Value>, default: u32) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(w) if w.is_finite() && w >= 1.0 => w.min(MAX_LINE_WIDTH as f64).round() as u32,
        _ => default.clamp(1, MAX_LINE_WIDTH),
    }
}

/// Parse a stored hex color, falling back to `default_hex` (and then to red).
pub fn parse_color(value: Option<&Value>, default_hex: &str) -> (String, Color) {
    let candidate = value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(text) = candidate
        && let Ok(srgba) = Srgba::hex(text)
    {
        return (text.to_string(), Color::from(srgba));
    }
    match Srgba::hex(default_hex) {
        Ok(srgba) => (default_hex.to_string(), Color::from(srgba)),
        Err(_) => (DEFAULT_LINE_COLOR.to_string(), Color::srgb(1.0, 0.0, 0.0)),
    }
}

/// Splits polyline segments into dash pieces, carrying the phase across segments.
pub struct Dasher<'a> {
    pattern: &'a [f32],
    scale: f32,
    index: usize,
    remaining: f32,
}

impl<'a> Dasher<'a> {
    pub fn new(pattern: &'a [f32], scale: f32) -> Self {
        let remaining = pattern.first().copied().unwrap_or(0.0) * scale;
        Self {
            pattern,
            scale,
            index: 0,
            remaining,
        }
    }

    fn is_solid(&self) -> bool {
        self.pattern.is_empty()
            || self.scale <= 0.0
            || self.pattern.iter().any(|len| *len <= 0.0)
    }

    /// Append the visible pieces of `a -> b` to `out`.
    pub fn segment(&mut self, a: Vec2, b: Vec2, out: &mut Vec<(Vec2, Vec2)>) {
        if self.is_solid() {
            out.push((a, b));
            return;
        }
        let length = a.distance(b);
        if length <= f32::EPSILON {
            return;
        }
        let dir = (b - a) / length;
        let mut pos = 0.0;
        while pos < length {
            let step = self.remaining.min(length - pos);
            if self.index % 2 == 0 {
                out.push((a + dir * pos, a + dir * (pos + step)));
            }
            pos += step;
            self.remaining -= step;
            if self.remaining <= 1e-4 {
                self.index = (self.index + 1) % self.pattern.len();
                self.remaining = self.pattern[self.index] * self.scale;
            }
        }
    }
}
