use std::ops::{ Add, Sub, Mul };

use serde::{ Serialize, Deserialize };

use crate::feq;
use crate::vector::Vector3;

/// A color.
///
/// Represented with red-green-blue (RGB) values on a 0 to 255 scale. Values
/// are allowed to leave that range while light is being accumulated; they are
/// only clamped when written out as pixel bytes (see `Color::to_rgb8`).
///
/// # Examples
///
/// Blend a color with the light reflected off a mirror:
///
/// ```
/// # use chunk_tracer::color::Color;
/// let base = Color::rgb(100.0, 50.0, 0.0);
/// let mirror = Color::rgb(200.0, 200.0, 200.0);
/// let blend = base * 0.5 + mirror * 0.5;
/// assert_eq!(blend, Color::rgb(150.0, 125.0, 100.0));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialOrd, Serialize, Deserialize)]
#[serde(from = "ColorRepr", into = "[f64; 3]")]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Partial equality on two colors.
///
/// Similar to the `PartialEq` implementation on `Vector3`, `Color`s are
/// compared component-wise, accounting for possible floating point error in
/// comparisons.
impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r) &&
            feq(self.g, other.g) &&
            feq(self.b, other.b)
    }
}

/// The forms a color may take on the wire: `[r, g, b]`, or an object with
/// `r`, `g` and `b` fields. Colors are always written as arrays.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Array([f64; 3]),
    Object { r: f64, g: f64, b: f64 },
}

impl From<ColorRepr> for Color {
    fn from(repr: ColorRepr) -> Color {
        match repr {
            ColorRepr::Array(v) => v.into(),
            ColorRepr::Object { r, g, b } => Color { r, g, b },
        }
    }
}

impl From<[f64; 3]> for Color {
    fn from(v: [f64; 3]) -> Color {
        Color { r: v[0], g: v[1], b: v[2] }
    }
}

impl From<Color> for [f64; 3] {
    fn from(c: Color) -> [f64; 3] {
        [c.r, c.g, c.b]
    }
}

/// Colors and vectors are interchangeable for blending arithmetic.
impl From<Vector3> for Color {
    fn from(v: Vector3) -> Color {
        Color { r: v.x, g: v.y, b: v.z }
    }
}

impl From<Color> for Vector3 {
    fn from(c: Color) -> Vector3 {
        Vector3::new(c.r, c.g, c.b)
    }
}

impl Color {
    /// Creates a color with red, green and blue values.
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    /// The color black.
    pub fn black() -> Color {
        Color { r: 0.0, g: 0.0, b: 0.0 }
    }

    /// Full-intensity white, the color of specular highlights.
    pub fn white() -> Color {
        Color { r: 255.0, g: 255.0, b: 255.0 }
    }

    /// Whether every channel is a finite number.
    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    /// Converts the color to pixel bytes, clamping each channel to
    /// `[0, 255]` and rounding to the nearest integer.
    ///
    /// Returns `None` if any channel is NaN or infinite; such a color must
    /// never be written to a pixel.
    pub fn to_rgb8(&self) -> Option<[u8; 3]> {
        if !self.is_finite() {
            return None;
        }

        Some([
            self.r.clamp(0.0, 255.0).round() as u8,
            self.g.clamp(0.0, 255.0).round() as u8,
            self.b.clamp(0.0, 255.0).round() as u8,
        ])
    }
}

/// Adds two colors together.
///
/// Components are added together individually.
impl Add<Color> for Color {
    type Output = Color;

    fn add(self, other: Color) -> Self::Output {
        Color {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
        }
    }
}

impl Sub<Color> for Color {
    type Output = Color;

    fn sub(self, other: Color) -> Self::Output {
        Color {
            r: self.r - other.r,
            g: self.g - other.g,
            b: self.b - other.b,
        }
    }
}

/// Multiplies a color by a scalar.
///
/// Each component is multiplied by the scalar.
impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, other: f64) -> Self::Output {
        Color {
            r: self.r * other,
            g: self.g * other,
            b: self.b * other,
        }
    }
}

impl Mul<Color> for f64 {
    type Output = Color;

    fn mul(self, other: Color) -> Self::Output {
        Color {
            r: self * other.r,
            g: self * other.g,
            b: self * other.b,
        }
    }
}

#[test]
fn add_colors() {
    let c1 = Color::rgb(90.0, 60.0, 75.0);
    let c2 = Color::rgb(70.0, 10.0, 25.0);

    assert_eq!(c1 + c2, Color::rgb(160.0, 70.0, 100.0));
}

#[test]
fn subtract_colors() {
    let c1 = Color::rgb(90.0, 60.0, 75.0);
    let c2 = Color::rgb(70.0, 10.0, 25.0);

    assert_eq!(c1 - c2, Color::rgb(20.0, 50.0, 50.0));
}

#[test]
fn multiply_color_by_scalar() {
    let c = Color::rgb(20.0, 30.0, 40.0);

    assert_eq!(c * 2.0, Color::rgb(40.0, 60.0, 80.0));
    assert_eq!(0.5 * c, Color::rgb(10.0, 15.0, 20.0));
}

#[test]
fn colors_are_clamped_only_on_conversion() {
    let hot = Color::rgb(300.0, -20.0, 127.6);

    // Out-of-range values survive arithmetic untouched.
    assert_eq!(hot * 0.5, Color::rgb(150.0, -10.0, 63.8));
    assert_eq!(hot.to_rgb8(), Some([255, 0, 128]));
}

#[test]
fn non_finite_colors_have_no_pixel_value() {
    assert_eq!(Color::rgb(f64::NAN, 0.0, 0.0).to_rgb8(), None);
    assert_eq!(Color::rgb(0.0, f64::INFINITY, 0.0).to_rgb8(), None);
}

#[test]
fn vector_round_trip_keeps_channels() {
    let c = Color::rgb(1.0, 2.0, 3.0);
    let v: Vector3 = c.into();

    assert_eq!(v, Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(Color::from(v * 2.0), Color::rgb(2.0, 4.0, 6.0));
}

#[test]
fn color_reads_arrays_and_objects() {
    let from_array: Color = serde_json::from_str("[40, 40, 40]").unwrap();
    let from_object: Color = serde_json::from_str(
        r#"{ "r": 40, "g": 40, "b": 40, "x": 40, "y": 40, "z": 40 }"#).unwrap();

    assert_eq!(from_array, Color::rgb(40.0, 40.0, 40.0));
    assert_eq!(from_object, from_array);
    assert_eq!(serde_json::to_string(&from_object).unwrap(), "[40.0,40.0,40.0]");
}
