use serde::{ Serialize, Deserialize };

/// A color.
///
/// Represented with red-green-blue (RGB) byte values, each ranging from 0 to
/// 255 inclusive. All arithmetic on colors happens in floating point and is
/// truncated back to bytes, clamping anything outside the valid range.
///
/// # Examples
///
/// Darken a color:
///
/// ```
/// # use refract::color::Color;
/// let orange = Color::rgb(255, 128, 0);
/// assert_eq!(orange.scale(0.5), Color::rgb(127, 64, 0));
/// ```
///
/// Mix two colors by weight:
///
/// ```
/// # use refract::color::Color;
/// let mix = Color::blend(&[
///     (Color::rgb(200, 0, 0), 0.5),
///     (Color::rgb(0, 0, 200), 0.5),
/// ]);
/// assert_eq!(mix, Color::rgb(100, 0, 100));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash,
    Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl From<[u8; 3]> for Color {
    fn from(v: [u8; 3]) -> Color {
        Color { r: v[0], g: v[1], b: v[2] }
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> [u8; 3] {
        [c.r, c.g, c.b]
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Color {
        Color { r, g, b }
    }
}

/// Truncates a channel value toward zero and clamps it into a byte.
fn to_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }

    value.trunc().clamp(0.0, 255.0) as u8
}

impl Color {
    /// Creates a color with red, green and blue values.
    pub fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b }
    }

    /// The color black.
    pub fn black() -> Color {
        Color { r: 0, g: 0, b: 0 }
    }

    /// The color white.
    pub fn white() -> Color {
        Color { r: 255, g: 255, b: 255 }
    }

    /// Multiplies every channel by `factor`.
    ///
    /// Results are truncated toward zero and clamped to 255, so a brightness
    /// above 1.0 saturates instead of wrapping.
    pub fn scale(&self, factor: f64) -> Color {
        Color {
            r: to_channel(self.r as f64 * factor),
            g: to_channel(self.g as f64 * factor),
            b: to_channel(self.b as f64 * factor),
        }
    }

    /// Computes the weighted sum of several colors.
    ///
    /// Each channel is summed in floating point and only truncated once, at
    /// the end. Weights are not required to sum to one; the result is
    /// clamped into range either way.
    pub fn blend(parts: &[(Color, f64)]) -> Color {
        let (mut r, mut g, mut b) = (0.0, 0.0, 0.0);
        for (color, weight) in parts.iter() {
            r += color.r as f64 * weight;
            g += color.g as f64 * weight;
            b += color.b as f64 * weight;
        }

        Color { r: to_channel(r), g: to_channel(g), b: to_channel(b) }
    }

    /// Averages a list of colors.
    ///
    /// The mean is computed per channel with integer division, so fractions
    /// are truncated rather than rounded. An empty list averages to black.
    ///
    /// ```
    /// # use refract::color::Color;
    /// let avg = Color::average(&[Color::rgb(0, 1, 255), Color::rgb(1, 2, 0)]);
    /// assert_eq!(avg, Color::rgb(0, 1, 127));
    /// ```
    pub fn average(colors: &[Color]) -> Color {
        if colors.is_empty() {
            return Color::black();
        }

        let n = colors.len() as u64;
        let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
        for c in colors.iter() {
            r += c.r as u64;
            g += c.g as u64;
            b += c.b as u64;
        }

        Color { r: (r / n) as u8, g: (g / n) as u8, b: (b / n) as u8 }
    }
}

/* Tests */

#[test]
fn scale_truncates() {
    let c = Color::rgb(255, 3, 0);

    // 127.5 and 1.5 are truncated rather than rounded
    assert_eq!(c.scale(0.5), Color::rgb(127, 1, 0));
}

#[test]
fn scale_clamps_to_byte_range() {
    let c = Color::rgb(200, 100, 10);

    assert_eq!(c.scale(2.0), Color::rgb(255, 200, 20));
    assert_eq!(c.scale(-1.0), Color::black());
}

#[test]
fn blend_clamps_sum() {
    let mix = Color::blend(&[
        (Color::white(), 0.9),
        (Color::white(), 0.9),
    ]);

    assert_eq!(mix, Color::white());
}

#[test]
fn blend_ignores_zero_weights() {
    let mix = Color::blend(&[
        (Color::rgb(10, 20, 30), 1.0),
        (Color::white(), 0.0),
    ]);

    assert_eq!(mix, Color::rgb(10, 20, 30));
}

#[test]
fn average_of_single_color_is_itself() {
    let c = Color::rgb(13, 77, 201);

    assert_eq!(Color::average(&[c]), c);
}

#[test]
fn average_of_nothing_is_black() {
    assert_eq!(Color::average(&[]), Color::black());
}

#[test]
fn average_of_many_bright_colors() {
    // 255 × 17M overflows a u32 channel sum
    let colors = vec![Color::white(); 17_000_000];

    assert_eq!(Color::average(&colors), Color::white());
}

#[test]
fn deserialize_from_array() {
    let c: Color = serde_json::from_str("[70, 130, 180]").unwrap();

    assert_eq!(c, Color::rgb(70, 130, 180));
}
