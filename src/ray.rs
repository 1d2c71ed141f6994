use crate::vector::Vector3;

/// A half-line with an origin and a unit direction.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray {
    pub origin: Vector3,
    pub direction: Vector3,
}

impl Ray {
    /// Creates a ray, normalizing `direction`.
    ///
    /// A zero-length direction is replaced by `Vector3::FALLBACK`, so every
    /// ray that exists has a usable direction.
    pub fn new(origin: Vector3, direction: Vector3) -> Ray {
        Ray { origin, direction: direction.normalize() }
    }

    /// The point `t` units along the ray.
    pub fn position(&self, t: f64) -> Vector3 {
        self.origin + (self.direction * t)
    }

    /// The same ray with its origin pushed `distance` units forward.
    pub fn advance(&self, distance: f64) -> Ray {
        Ray {
            origin: self.position(distance),
            direction: self.direction,
        }
    }
}

/// Reflects `direction` about `normal`: `d - n(2 d.n)`.
pub fn reflect(direction: Vector3, normal: Vector3) -> Vector3 {
    direction.reflect(&normal)
}

/// Orients a boundary crossing.
///
/// Returns the normal flipped to face against `direction`, along with the
/// refractive indices of the medium being left and the medium being
/// entered. A ray travelling along the normal is leaving the surface's
/// medium, so the indices are swapped.
fn orient(direction: Vector3, normal: Vector3, n1: f64, n2: f64)
    -> (Vector3, f64, f64) {
    if direction.dot(&normal) > 0.0 {
        (-normal, n2, n1)
    } else {
        (normal, n1, n2)
    }
}

/// Bends `direction` through a boundary with Snell's law.
///
/// `n1` is the index outside the surface and `n2` the index inside; which
/// side the ray is on is worked out from the normal. Under total internal
/// reflection there is no transmitted ray, and the reflected direction is
/// returned instead.
pub fn refract(direction: Vector3, normal: Vector3, n1: f64, n2: f64)
    -> Vector3 {
    let (normal, n1, n2) = orient(direction, normal, n1, n2);

    let ratio = n1 / n2;
    let cos_i = -direction.dot(&normal);
    let sin2_t = ratio.powi(2) * (1.0 - cos_i.powi(2));

    if sin2_t > 1.0 {
        return reflect(direction, normal);
    }

    let cos_t = (1.0 - sin2_t).sqrt();
    direction * ratio + normal * (ratio * cos_i - cos_t)
}

/// Calculates the reflectance at a boundary.
///
/// The reflectance is the fraction of light reflected rather than
/// transmitted, averaged over both polarizations: `(rs^2 + rp^2) / 2`.
/// Total internal reflection reflects everything.
pub fn fresnel(direction: Vector3, normal: Vector3, n1: f64, n2: f64) -> f64 {
    let (normal, n1, n2) = orient(direction, normal, n1, n2);

    let cos_i = -direction.dot(&normal);
    let sin2_t = (n1 / n2).powi(2) * (1.0 - cos_i.powi(2));
    if sin2_t > 1.0 {
        return 1.0;
    }

    let cos_t = (1.0 - sin2_t).sqrt();
    let rs_den = n1 * cos_i + n2 * cos_t;
    let rp_den = n1 * cos_t + n2 * cos_i;

    // Exactly grazing: nothing gets through
    if rs_den == 0.0 || rp_den == 0.0 {
        return 1.0;
    }

    let rs = (n1 * cos_i - n2 * cos_t) / rs_den;
    let rp = (n1 * cos_t - n2 * cos_i) / rp_den;

    (rs.powi(2) + rp.powi(2)) / 2.0
}

#[test]
fn ray_position() {
    let r = Ray::new(
        Vector3::new(2.0, 3.0, 4.0),
        Vector3::new(1.0, 0.0, 0.0)
    );

    assert_eq!(r.position(0.0), Vector3::new(2.0, 3.0, 4.0));
    assert_eq!(r.position(1.0), Vector3::new(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Vector3::new(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Vector3::new(4.5, 3.0, 4.0));
}

#[test]
fn ray_direction_is_normalized() {
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 3.0, 4.0));

    assert_eq!(r.direction, Vector3::new(0.0, 0.6, 0.8));
}

#[test]
fn ray_with_zero_direction_is_total() {
    let r = Ray::new(Vector3::new(1.0, 1.0, 1.0), Vector3::zero());

    assert_eq!(r.direction, Vector3::FALLBACK);
    assert_eq!(r.position(2.0), Vector3::new(1.0, 1.0, 3.0));
}

#[test]
fn ray_advance_keeps_direction() {
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 2.0));
    let a = r.advance(0.5);

    assert_eq!(a.origin, Vector3::new(0.0, 0.0, 0.5));
    assert_eq!(a.direction, r.direction);
}

#[test]
fn refract_at_normal_incidence_goes_straight() {
    let d = Vector3::new(0.0, 0.0, 1.0);
    let n = Vector3::new(0.0, 0.0, -1.0);

    assert_eq!(refract(d, n, 1.0, 1.5), d);
}

#[test]
fn refract_bends_toward_normal_when_entering() {
    let d = Vector3::new(1.0, -1.0, 0.0).normalize();
    let n = Vector3::new(0.0, 1.0, 0.0);
    let t = refract(d, n, 1.0, 1.5);

    // sin(45 deg) / 1.5
    assert!(crate::feq(t.x, (0.5f64).sqrt() / 1.5));
    assert!(t.y < 0.0);
    assert!(crate::feq(t.magnitude(), 1.0));
}

#[test]
fn refract_swaps_indices_when_exiting() {
    // Leaving glass along the outward normal
    let d = Vector3::new(0.3, 1.0, 0.0).normalize();
    let n = Vector3::new(0.0, 1.0, 0.0);
    let t = refract(d, n, 1.0, 1.5);

    // Bends away from the normal: larger sideways component
    assert!(t.x > d.x);
    assert!(t.y > 0.0);
}

#[test]
fn total_internal_reflection_reflects() {
    // Grazing exit from glass, well past the critical angle
    let d = Vector3::new(1.0, 0.2, 0.0).normalize();
    let n = Vector3::new(0.0, 1.0, 0.0);

    assert_eq!(refract(d, n, 1.0, 1.5), reflect(d, -n));
    assert_eq!(fresnel(d, n, 1.0, 1.5), 1.0);
}

#[test]
fn fresnel_at_normal_incidence() {
    let d = Vector3::new(0.0, 0.0, 1.0);
    let n = Vector3::new(0.0, 0.0, -1.0);

    // ((1 - 1.5) / (1 + 1.5))^2
    assert!(crate::feq(fresnel(d, n, 1.0, 1.5), 0.04));
}

#[test]
fn fresnel_without_boundary_is_zero() {
    let d = Vector3::new(0.2, 0.3, 1.0).normalize();
    let n = Vector3::new(0.0, 0.0, -1.0);

    assert!(crate::feq(fresnel(d, n, 1.0, 1.0), 0.0));
}

#[test]
fn fresnel_grows_toward_grazing() {
    let n = Vector3::new(0.0, 1.0, 0.0);
    let steep = fresnel(Vector3::new(0.1, -1.0, 0.0).normalize(), n, 1.0, 1.5);
    let shallow = fresnel(Vector3::new(1.0, -0.1, 0.0).normalize(), n, 1.0, 1.5);

    assert!(shallow > steep);
    assert!(shallow < 1.0);
}
