use std::ops::{ Add, Sub, Neg, Mul };

use serde::{ Serialize, Deserialize };

use crate::feq;
use crate::consts::{ EPSILON, VACUUM_RI };

/// A three-component vector.
///
/// Used for points, directions and surface normals alike. Vectors are plain
/// values; every operation returns a new vector.
///
/// Serialized as a three-element array, so scene files can write
/// `"center": [0.0, 0.0, -10.0]`.
#[derive(Debug, Default, Copy, Clone, PartialOrd, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PartialEq for Vector3 {
    fn eq(&self, other: &Vector3) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z)
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Vector3 {
        Vector3 { x: v[0], y: v[1], z: v[2] }
    }
}

impl From<Vector3> for [f64; 3] {
    fn from(v: Vector3) -> [f64; 3] {
        [v.x, v.y, v.z]
    }
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3 { x, y, z }
    }

    pub fn zero() -> Vector3 {
        Vector3 { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn norm(&self) -> f64 {
        f64::sqrt(
            self.x.powi(2)
            + self.y.powi(2)
            + self.z.powi(2)
        )
    }

    /// Scales the vector to unit length.
    ///
    /// Vectors shorter than `EPSILON` have no meaningful direction; they
    /// normalize to the zero vector rather than to a vector of NaNs.
    pub fn normalize(&self) -> Vector3 {
        let norm = self.norm();
        if norm < EPSILON {
            return Vector3::zero();
        }

        Vector3 {
            x: self.x / norm,
            y: self.y / norm,
            z: self.z / norm,
        }
    }

    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x
            + self.y * other.y
            + self.z * other.z
    }

    /// Reflects a vector across a normal: `I - 2(I.N)N`.
    pub fn reflect(&self, normal: &Vector3) -> Vector3 {
        *self - (*normal * 2.0 * self.dot(normal))
    }

    /// Refracts a vector through a surface using Snell's law.
    ///
    /// `self` is the incident direction, `normal` the outward surface normal
    /// and `refractive_index` the index of the medium behind the surface (the
    /// medium in front is taken to be air, index 1). If the incident vector
    /// points the same way as the normal, the ray is leaving the medium, so
    /// the indices swap and the normal is flipped.
    ///
    /// Total internal reflection yields the zero vector.
    pub fn refract(&self, normal: &Vector3, refractive_index: f64) -> Vector3 {
        let mut cos_incidence = -self.dot(normal).clamp(-1.0, 1.0);
        let mut n1 = VACUUM_RI;
        let mut n2 = refractive_index;
        let mut n = *normal;

        if cos_incidence < 0.0 {
            cos_incidence = -cos_incidence;
            std::mem::swap(&mut n1, &mut n2);
            n = -n;
        }

        let ratio = n1 / n2;
        let radicand = 1.0 - ratio.powi(2) * (1.0 - cos_incidence.powi(2));

        // Guard the square root; a negative radicand is total internal
        // reflection.
        if radicand < 0.0 {
            return Vector3::zero();
        }

        *self * ratio + n * (ratio * cos_incidence - radicand.sqrt())
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

/// Implements scalar right-multiplication for a vector.
///
/// ```
/// use chunk_tracer::vector::Vector3;
///
/// let v = Vector3::new(1.0, 2.0, 3.0);
/// assert_eq!(v * 2.0, Vector3::new(2.0, 4.0, 6.0));
/// ```
impl Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
            z: self.z * other,
        }
    }
}

impl Mul<Vector3> for f64 {
    type Output = Vector3;

    fn mul(self, other: Vector3) -> Vector3 {
        Vector3 {
            x: self * other.x,
            y: self * other.y,
            z: self * other.z,
        }
    }
}

/* Tests */

#[test]
fn add_vectors() {
    let a = Vector3::new(3.0, -2.0, 5.0);
    let b = Vector3::new(-2.0, 3.0, 1.0);

    assert_eq!(a + b, Vector3::new(1.0, 1.0, 6.0));
}

#[test]
fn sub_vectors() {
    let a = Vector3::new(3.0, 2.0, 1.0);
    let b = Vector3::new(5.0, 6.0, 7.0);

    assert_eq!(a - b, Vector3::new(-2.0, -4.0, -6.0));
}

#[test]
fn neg_vector() {
    let a = Vector3::new(1.0, -2.0, 3.0);

    assert_eq!(-a, Vector3::new(-1.0, 2.0, -3.0));
}

#[test]
fn mul_scalar_both_sides() {
    let a = Vector3::new(1.0, -2.0, 3.0);

    assert_eq!(a * 3.5, Vector3::new(3.5, -7.0, 10.5));
    assert_eq!(0.5 * a, Vector3::new(0.5, -1.0, 1.5));
}

#[test]
fn norm_and_normalize() {
    let v = Vector3::new(1.0, 2.0, 3.0);
    let e = Vector3::new(
        1.0 / f64::sqrt(14.0),
        2.0 / f64::sqrt(14.0),
        3.0 / f64::sqrt(14.0)
    );

    assert_eq!(v.norm(), f64::sqrt(14.0));
    assert_eq!(v.normalize(), e);
    assert!(feq(v.normalize().norm(), 1.0));
}

#[test]
fn normalize_degenerate_vector_is_zero() {
    let v = Vector3::new(0.0, 0.0, 0.0).normalize();
    assert!(v.is_zero());
    assert!(!v.x.is_nan());

    let tiny = Vector3::new(0.0001, 0.0, 0.0).normalize();
    assert!(tiny.is_zero());
}

#[test]
fn dot_vectors() {
    let a = Vector3::new(1.0, 2.0, 3.0);
    let b = Vector3::new(2.0, 3.0, 4.0);

    assert_eq!(a.dot(&b), 20.0);
}

#[test]
fn reflect_45() {
    let v = Vector3::new(1.0, -1.0, 0.0);
    let n = Vector3::new(0.0, 1.0, 0.0);

    assert_eq!(v.reflect(&n), Vector3::new(1.0, 1.0, 0.0));
}

#[test]
fn reflect_preserves_length() {
    let normals = [
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(1.0, 1.0, 0.0).normalize(),
        Vector3::new(-0.3, 0.2, 0.9).normalize(),
    ];
    let incidents = [
        Vector3::new(1.0, -1.0, 0.0).normalize(),
        Vector3::new(0.2, 0.7, -0.4).normalize(),
        Vector3::new(-1.0, -2.0, -3.0).normalize(),
        Vector3::new(0.0, 0.0, 1.0),
    ];

    for n in normals.iter() {
        for i in incidents.iter() {
            assert!(feq(i.reflect(n).norm(), 1.0));
        }
    }
}

#[test]
fn refract_head_on_passes_straight_through() {
    let i = Vector3::new(0.0, 0.0, -1.0);
    let n = Vector3::new(0.0, 0.0, 1.0);

    assert_eq!(i.refract(&n, 1.5), Vector3::new(0.0, 0.0, -1.0));
}

#[test]
fn refract_bends_towards_normal_entering_denser_medium() {
    let i = Vector3::new(1.0, -1.0, 0.0).normalize();
    let n = Vector3::new(0.0, 1.0, 0.0);
    let r = i.refract(&n, 1.5);

    // sin(45 deg) / 1.5
    assert!(feq(r.x, (0.5f64).sqrt() / 1.5));
    assert!(r.y < 0.0);
    assert!(feq(r.norm(), 1.0));
}

#[test]
fn refract_total_internal_reflection_yields_zero() {
    // Leaving glass at a grazing angle: the incident direction points the
    // same way as the outward normal, so the indices swap to 1.5 -> 1.0 and
    // the radicand 1 - 2.25 * (1 - cos^2) goes negative. Taking the square
    // root first and testing afterwards would never catch this.
    let i = Vector3::new(0.9, 0.1, 0.0).normalize();
    let n = Vector3::new(0.0, 1.0, 0.0);

    assert!(i.refract(&n, 1.5).is_zero());
}

#[test]
fn vector_serializes_as_array() {
    let v = Vector3::new(1.0, -2.5, 3.0);
    let json = serde_json::to_string(&v).unwrap();

    assert_eq!(json, "[1.0,-2.5,3.0]");
    assert_eq!(serde_json::from_str::<Vector3>(&json).unwrap(), v);
}
