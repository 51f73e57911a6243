//! Control request parsing
//!
//! The `/update` endpoint takes a form encoded body with a `#RRGGBB`
//! `color` and a decimal `animation`. Malformed fields are coerced to
//! defaults, the request is never rejected.

use core::fmt::Write as _;

use heapless::String;

use crate::color::Color;
use crate::state::AnimationMode;

/// `#RRGGBB`
const COLOR_FIELD_LENGTH: usize = 7;
/// One or two decimal digits
const ANIMATION_FIELD_LENGTH: usize = 2;

/// Length of a status line, `"rr gg bb ww"`
pub const STATUS_LINE_LENGTH: usize = 11;

/// Parsed control request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlUpdate {
    pub color: Color,
    pub mode: AnimationMode,
}

impl ControlUpdate {
    /// Parse a form encoded request body
    pub fn from_form(body: &[u8]) -> Self {
        let mut color_field = String::<COLOR_FIELD_LENGTH>::new();
        let mut animation_field = String::<ANIMATION_FIELD_LENGTH>::new();

        let color = if form_value(body, "color", &mut color_field) {
            parse_color(&color_field)
        } else {
            Color::BLACK
        };
        let mode = if form_value(body, "animation", &mut animation_field) {
            parse_animation(&animation_field)
        } else {
            AnimationMode::Idle
        };

        Self {
            color: normalize_white(color),
            mode,
        }
    }

    /// Status line broadcast to peers after the update is applied
    pub fn status_line(&self) -> String<STATUS_LINE_LENGTH> {
        status_line(self.color)
    }
}

/// Format `"rr gg bb ww"` in lowercase hex
pub fn status_line(color: Color) -> String<STATUS_LINE_LENGTH> {
    let mut line = String::new();
    // 11 bytes always fit
    let _ = write!(
        line,
        "{:02x} {:02x} {:02x} {:02x}",
        color.r, color.g, color.b, color.w
    );
    line
}

/// Decode the RGB value of a `#RRGGBB` field.
///
/// The leading marker is skipped whatever it is. Anything that is not
/// exactly seven characters with six hex digits yields black.
pub fn parse_color(field: &str) -> Color {
    if field.len() != COLOR_FIELD_LENGTH || !field.is_char_boundary(1) {
        return Color::BLACK;
    }
    let digits = &field[1..];
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Color::BLACK;
    }
    u32::from_str_radix(digits, 16)
        .map(Color::from_rgb24)
        .unwrap_or(Color::BLACK)
}

/// Decode the decimal animation code; invalid input maps to idle
pub fn parse_animation(field: &str) -> AnimationMode {
    field
        .parse::<u8>()
        .map(AnimationMode::from_code)
        .unwrap_or(AnimationMode::Idle)
}

/// Move gray RGB input to the white channel.
///
/// The protocol has no white field: `r == g == b` means "white at that
/// intensity" and RGB is cleared.
pub fn normalize_white(color: Color) -> Color {
    if color.is_achromatic() {
        Color::white(color.r)
    } else {
        Color::rgb(color.r, color.g, color.b)
    }
}

/// Look up `key` in a form encoded body and percent-decode its value
/// into `out`.
///
/// Returns `false` if the key is missing, the value is malformed or does
/// not fit into `out`; `out` is left empty in that case.
pub fn form_value<const N: usize>(body: &[u8], key: &str, out: &mut String<N>) -> bool {
    out.clear();
    for pair in body.split(|&b| b == b'&') {
        let (name, value) = match pair.iter().position(|&b| b == b'=') {
            Some(pos) => (&pair[..pos], &pair[pos + 1..]),
            None => (pair, &pair[pair.len()..]),
        };
        if name != key.as_bytes() {
            continue;
        }
        if percent_decode(value, out) {
            return true;
        }
        out.clear();
        return false;
    }
    false
}

fn percent_decode<const N: usize>(value: &[u8], out: &mut String<N>) -> bool {
    let mut i = 0;
    while i < value.len() {
        let byte = match value[i] {
            b'+' => b' ',
            b'%' => {
                let Some(hex) = value.get(i + 1..i + 3) else {
                    return false;
                };
                let (Some(hi), Some(lo)) = (hex_value(hex[0]), hex_value(hex[1])) else {
                    return false;
                };
                i += 2;
                hi << 4 | lo
            }
            other => other,
        };
        if !byte.is_ascii() || out.push(char::from(byte)).is_err() {
            return false;
        }
        i += 1;
    }
    true
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}
