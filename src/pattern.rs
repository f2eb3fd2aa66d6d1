use serde::{ Serialize, Deserialize };

use crate::color::Color;

/// An alternating checkerboard pattern laid over the XZ plane.
///
/// For a point `(x, z)` the square index is
/// `round(scale * x) + round(scale * z)`; even squares take the `primary`
/// color and odd squares the `secondary` one. Larger scales give smaller
/// squares.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkerboard {
    pub scale: f64,
    pub primary: Color,
    pub secondary: Color,
}

impl Checkerboard {
    pub fn new(scale: f64, primary: Color, secondary: Color) -> Checkerboard {
        Checkerboard { scale, primary, secondary }
    }

    pub fn color_at(&self, x: f64, z: f64) -> Color {
        // f64::round rounds half away from zero, so the squares either side
        // of zero are mirror images of each other.
        let square = (self.scale * x).round() + (self.scale * z).round();

        if square.rem_euclid(2.0) == 0.0 {
            self.primary
        } else {
            self.secondary
        }
    }
}

#[test]
fn checker_alternates_along_x() {
    let board = Checkerboard::new(1.0, Color::white(), Color::black());

    assert_eq!(board.color_at(0.0, 0.0), Color::white());
    assert_eq!(board.color_at(0.4, 0.0), Color::white());
    assert_eq!(board.color_at(0.6, 0.0), Color::black());
    assert_eq!(board.color_at(1.6, 0.0), Color::white());
    assert_eq!(board.color_at(-0.6, 0.0), Color::black());
}

#[test]
fn checker_alternates_along_z() {
    let board = Checkerboard::new(1.0, Color::white(), Color::black());

    assert_eq!(board.color_at(0.0, 0.6), Color::black());
    assert_eq!(board.color_at(0.0, -1.6), Color::white());
}

#[test]
fn checker_diagonal_neighbours_match() {
    let board = Checkerboard::new(1.0, Color::white(), Color::black());

    assert_eq!(board.color_at(1.0, 1.0), board.color_at(0.0, 0.0));
    assert_eq!(board.color_at(-1.0, 1.0), board.color_at(0.0, 0.0));
}

#[test]
fn checker_scale_shrinks_squares() {
    let board = Checkerboard::new(2.0, Color::white(), Color::black());

    // round(2 * 0.3) = 1, odd.
    assert_eq!(board.color_at(0.3, 0.0), Color::black());
    // round(2 * 0.2) = 0, even.
    assert_eq!(board.color_at(0.2, 0.0), Color::white());
}

#[test]
fn checker_halves_round_away_from_zero() {
    let board = Checkerboard::new(1.0, Color::white(), Color::black());

    // round(-0.5) = -1 and round(0.5) = 1: both odd.
    assert_eq!(board.color_at(-0.5, 0.0), Color::black());
    assert_eq!(board.color_at(0.5, 0.0), Color::black());
}
