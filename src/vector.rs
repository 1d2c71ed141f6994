use std::ops::{ Add, Sub, Neg, Mul };

use serde::{ Serialize, Deserialize };

use crate::feq;

/// A point or direction in 3D space.
///
/// `Vector3` is an immutable value type; every operation returns a new
/// vector. Points and directions share the same type, since the tracer never
/// needs to distinguish them.
#[derive(Debug, Default, Copy, Clone, PartialOrd, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Partial equality on two vectors.
///
/// Components are compared within `FEQ_EPSILON`, so computed vectors can be
/// compared without worrying about floating point error.
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
    /// The direction returned when normalizing a zero-length vector.
    pub const FALLBACK: Vector3 = Vector3 { x: 0.0, y: 0.0, z: 1.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3 { x, y, z }
    }

    pub fn zero() -> Vector3 {
        Vector3 { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn magnitude(&self) -> f64 {
        f64::sqrt(self.x.powi(2) + self.y.powi(2) + self.z.powi(2))
    }

    /// Produces a unit vector pointing in the same direction.
    ///
    /// A zero vector has no direction; rather than producing NaNs, this
    /// returns `Vector3::FALLBACK`.
    ///
    /// ```
    /// # use refract::vector::Vector3;
    /// assert_eq!(Vector3::new(4.0, 0.0, 0.0).normalize(),
    ///     Vector3::new(1.0, 0.0, 0.0));
    /// assert_eq!(Vector3::zero().normalize(), Vector3::FALLBACK);
    /// ```
    pub fn normalize(&self) -> Vector3 {
        let mag = self.magnitude();
        if mag == 0.0 || !mag.is_finite() {
            return Vector3::FALLBACK;
        }

        *self * (1.0 / mag)
    }

    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Reflects a vector across a normal.
    pub fn reflect(&self, normal: &Vector3) -> Vector3 {
        *self - (*normal * (2.0 * self.dot(normal)))
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
        Self { x: -self.x, y: -self.y, z: -self.z }
    }
}

/// Implements scalar right-multiplication for a vector.
///
/// ```
/// # use refract::vector::Vector3;
/// let v = Vector3::new(1.0, -2.0, 3.0);
/// assert_eq!(v * 2.0, Vector3::new(2.0, -4.0, 6.0));
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

/// Implements scalar left-multiplication for a vector.
impl Mul<Vector3> for f64 {
    type Output = Vector3;

    fn mul(self, other: Vector3) -> Vector3 {
        other * self
    }
}

/* Tests */

#[test]
fn add_vectors() {
    let a1 = Vector3::new(3.0, -2.0, 5.0);
    let a2 = Vector3::new(-2.0, 3.0, 1.0);

    assert_eq!(a1 + a2, Vector3::new(1.0, 1.0, 6.0));
}

#[test]
fn sub_vectors() {
    let p1 = Vector3::new(3.0, 2.0, 1.0);
    let p2 = Vector3::new(5.0, 6.0, 7.0);

    assert_eq!(p1 - p2, Vector3::new(-2.0, -4.0, -6.0));
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
fn magnitude_neg() {
    let v = Vector3::new(-1.0, -2.0, -3.0);

    assert_eq!(v.magnitude(), f64::sqrt(14.0));
}

#[test]
fn normalize_dirty() {
    let v = Vector3::new(1.0, 2.0, 3.0);
    let e = Vector3::new(
        1.0 / f64::sqrt(14.0),
        2.0 / f64::sqrt(14.0),
        3.0 / f64::sqrt(14.0)
    );

    assert_eq!(v.normalize(), e);
    assert!(feq(v.normalize().magnitude(), 1.0));
}

#[test]
fn normalize_is_idempotent() {
    let samples = [
        Vector3::new(1.0, 2.0, 3.0),
        Vector3::new(-0.001, 0.0, 7.5),
        Vector3::new(1e6, -3e5, 2.0),
    ];

    for v in samples.iter() {
        let once = v.normalize();
        assert_eq!(once.normalize(), once);
        assert!(feq(once.magnitude(), 1.0));
    }
}

#[test]
fn normalize_zero_falls_back() {
    let n = Vector3::zero().normalize();

    assert_eq!(n, Vector3::new(0.0, 0.0, 1.0));
    assert!(n.x.is_finite() && n.y.is_finite() && n.z.is_finite());
}

#[test]
fn dot_vectors() {
    let a = Vector3::new(1.0, 2.0, 3.0);
    let b = Vector3::new(2.0, 3.0, 4.0);

    assert_eq!(a.dot(&b), 20.0);
}

#[test]
fn cross_vectors() {
    let a = Vector3::new(1.0, 2.0, 3.0);
    let b = Vector3::new(2.0, 3.0, 4.0);

    assert_eq!(a.cross(&b), Vector3::new(-1.0, 2.0, -1.0));
    assert_eq!(b.cross(&a), Vector3::new(1.0, -2.0, 1.0));
}

#[test]
fn reflect_45() {
    let v = Vector3::new(1.0, -1.0, 0.0);
    let n = Vector3::new(0.0, 1.0, 0.0);

    assert_eq!(v.reflect(&n), Vector3::new(1.0, 1.0, 0.0));
}

#[test]
fn deserialize_from_array() {
    let v: Vector3 = serde_json::from_str("[1.5, -2, 3]").unwrap();

    assert_eq!(v, Vector3::new(1.5, -2.0, 3.0));
}
