use crate::consts::TRIANGLE_EPSILON;
use crate::vector::Vector3;
use crate::ray::Ray;
use crate::material::Material;

/// A sphere, described by its center and radius.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vector3,
    pub radius: f64,
    pub material: Material,
}

impl Sphere {
    pub fn new(center: Vector3, radius: f64, material: Material) -> Sphere {
        Sphere { center, radius, material }
    }

    /// Checks whether a ray intersects a Sphere.
    ///
    /// Solves `|O + tD - C|^2 = r^2` for `t`. Of the two roots, the nearest
    /// strictly positive one is returned; a sphere entirely behind the ray
    /// origin (both roots non-positive) or missed entirely (negative
    /// discriminant) yields `None`.
    ///
    /// When the origin is inside the sphere, the far root is the hit.
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        let sphere_to_ray = ray.origin - self.center;

        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * ray.direction.dot(&sphere_to_ray);
        let c = sphere_to_ray.dot(&sphere_to_ray) - self.radius.powi(2);

        let discriminant = b.powi(2) - (4.0 * a * c);
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let t1 = (-b - discriminant.sqrt()) / (2.0 * a);
        let t2 = (-b + discriminant.sqrt()) / (2.0 * a);

        if t1 > 0.0 {
            Some(t1)
        } else if t2 > 0.0 {
            Some(t2)
        } else {
            None
        }
    }

    /// Returns the outward normal at a point on the sphere's surface.
    pub fn normal_at(&self, point: Vector3) -> Vector3 {
        (point - self.center).normalize()
    }
}

/// A triangle between three vertices.
///
/// The face normal is computed once on construction, since it is the same
/// everywhere on the triangle. Its orientation follows the winding order
/// `v0 -> v1 -> v2` (right-handed).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle {
    pub v0: Vector3,
    pub v1: Vector3,
    pub v2: Vector3,
    pub material: Material,

    e1: Vector3,
    e2: Vector3,
    normal: Vector3,
}

impl Triangle {
    pub fn new(v0: Vector3, v1: Vector3, v2: Vector3, material: Material)
        -> Triangle {
        let e1 = v1 - v0;
        let e2 = v2 - v0;
        let normal = e1.cross(&e2).normalize();

        Triangle { v0, v1, v2, material, e1, e2, normal }
    }

    /// Computes the Möller–Trumbore barycentric coordinates of a hit.
    ///
    /// Returns `(u, v, t)` where `u` and `v` weight `v1` and `v2`
    /// respectively, and `t` is the distance along the ray. Rays parallel to
    /// the triangle's plane, rays passing outside its edges and hits at or
    /// behind the origin all return `None`. Triangles are hit from either
    /// side.
    pub fn barycentric(&self, ray: &Ray) -> Option<(f64, f64, f64)> {
        let dir_cross_e2 = ray.direction.cross(&self.e2);
        let determinant = self.e1.dot(&dir_cross_e2);

        // If the ray is parallel to the triangle (or the triangle is
        // degenerate), there is no intersection.
        if determinant.abs() < TRIANGLE_EPSILON {
            return None;
        }

        let f = 1.0 / determinant;
        let v0_to_origin = ray.origin - self.v0;
        let u = f * v0_to_origin.dot(&dir_cross_e2);
        if u < 0.0 || u > 1.0 {
            return None;
        }

        let origin_cross_e1 = v0_to_origin.cross(&self.e1);
        let v = f * ray.direction.dot(&origin_cross_e1);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.e2.dot(&origin_cross_e1);
        if t > TRIANGLE_EPSILON {
            Some((u, v, t))
        } else {
            None
        }
    }

    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        self.barycentric(ray).map(|(_, _, t)| t)
    }

    /// The precomputed face normal; `_point` is ignored.
    pub fn normal_at(&self, _point: Vector3) -> Vector3 {
        self.normal
    }
}

/// Any surface the tracer can render.
///
/// A closed set of primitives, dispatched by `match`. Meshes are expressed
/// as lists of triangles.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Surface {
    Sphere(Sphere),
    Triangle(Triangle),
}

impl From<Sphere> for Surface {
    fn from(s: Sphere) -> Surface {
        Surface::Sphere(s)
    }
}

impl From<Triangle> for Surface {
    fn from(t: Triangle) -> Surface {
        Surface::Triangle(t)
    }
}

impl Surface {
    /// Distance along `ray` to the nearest hit in front of its origin.
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        match self {
            Surface::Sphere(s) => s.intersect(ray),
            Surface::Triangle(t) => t.intersect(ray),
        }
    }

    pub fn normal_at(&self, point: Vector3) -> Vector3 {
        match self {
            Surface::Sphere(s) => s.normal_at(point),
            Surface::Triangle(t) => t.normal_at(point),
        }
    }

    pub fn material(&self) -> &Material {
        match self {
            Surface::Sphere(s) => &s.material,
            Surface::Triangle(t) => &t.material,
        }
    }
}

#[cfg(test)]
fn unit_triangle() -> Triangle {
    Triangle::new(
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(-1.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        Default::default(),
    )
}

#[test]
fn ray_at_center_hits_at_distance_minus_radius() {
    let s = Sphere::new(Vector3::new(0.0, 0.0, 10.0), 2.0, Default::default());
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));

    let t = s.intersect(&r).expect("ray aimed at the center should hit");
    assert!(crate::feq(t, 8.0));
}

#[test]
fn ray_at_center_from_oblique_origin() {
    let center = Vector3::new(3.0, -4.0, 12.0);
    let s = Sphere::new(center, 1.5, Default::default());
    let origin = Vector3::new(1.0, 1.0, 1.0);
    let r = Ray::new(origin, center - origin);

    let t = s.intersect(&r).unwrap();
    assert!(crate::feq(t, (center - origin).magnitude() - 1.5));
}

#[test]
fn ray_misses_sphere() {
    let s = Sphere::new(Vector3::zero(), 1.0, Default::default());
    let r = Ray::new(Vector3::new(0.0, 2.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(s.intersect(&r), None);
}

#[test]
fn ray_is_tangent_to_sphere() {
    let s = Sphere::new(Vector3::zero(), 1.0, Default::default());
    let r = Ray::new(Vector3::new(0.0, 1.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(s.intersect(&r), Some(5.0));
}

#[test]
fn ray_is_inside_sphere() {
    let s = Sphere::new(Vector3::zero(), 1.0, Default::default());
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(s.intersect(&r), Some(1.0));
}

#[test]
fn sphere_is_behind_ray() {
    let s = Sphere::new(Vector3::zero(), 1.0, Default::default());
    let r = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(s.intersect(&r), None);
}

#[test]
fn zero_radius_sphere_is_missed() {
    let s = Sphere::new(Vector3::new(0.0, 0.0, 5.0), 0.0, Default::default());
    let r = Ray::new(Vector3::new(0.0, 0.1, 0.0), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(s.intersect(&r), None);
}

#[test]
fn normal_on_sphere_nonaxial() {
    let s = Sphere::new(Vector3::new(1.0, 1.0, 1.0), 1.0, Default::default());
    let k = 3.0f64.sqrt() / 3.0;
    let n = s.normal_at(Vector3::new(1.0 + k, 1.0 + k, 1.0 + k));

    assert_eq!(n, Vector3::new(k, k, k));
    assert_eq!(n, n.normalize());
}

#[test]
fn triangle_normal_is_precomputed() {
    let t = unit_triangle();

    assert_eq!(t.normal_at(Vector3::new(0.0, 0.5, 0.0)),
        Vector3::new(0.0, 0.0, 1.0));
    assert_eq!(t.normal_at(Vector3::new(-0.5, 0.75, 0.0)),
        Vector3::new(0.0, 0.0, 1.0));
}

#[test]
fn ray_through_centroid_hits_triangle() {
    let t = unit_triangle();
    let centroid = (t.v0 + t.v1 + t.v2) * (1.0 / 3.0);
    let r = Ray::new(centroid - Vector3::new(0.0, 0.0, 2.0),
        Vector3::new(0.0, 0.0, 1.0));

    let (u, v, dist) = t.barycentric(&r).expect("centroid should be inside");
    assert!(u >= 0.0 && u <= 1.0);
    assert!(v >= 0.0 && v <= 1.0);
    assert!(u + v <= 1.0);
    assert!(crate::feq(u, 1.0 / 3.0) && crate::feq(v, 1.0 / 3.0));
    assert!(crate::feq(dist, 2.0));
}

#[test]
fn ray_parallel_to_triangle() {
    let t = unit_triangle();
    let r = Ray::new(Vector3::new(0.0, -1.0, -2.0), Vector3::new(0.0, 1.0, 0.0));

    assert_eq!(t.intersect(&r), None);
}

#[test]
fn ray_misses_each_triangle_edge() {
    let t = unit_triangle();
    let dir = Vector3::new(0.0, 0.0, 1.0);

    // Past the v0-v2 edge, past the v0-v1 edge, below the v1-v2 edge
    for origin in [
        Vector3::new(1.0, 1.0, -2.0),
        Vector3::new(-1.0, 1.0, -2.0),
        Vector3::new(0.0, -1.0, -2.0),
    ].iter() {
        assert_eq!(t.intersect(&Ray::new(*origin, dir)), None);
    }
}

#[test]
fn triangle_behind_ray_is_missed() {
    let t = unit_triangle();
    let r = Ray::new(Vector3::new(0.0, 0.5, 2.0), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(t.intersect(&r), None);
}

#[test]
fn degenerate_triangle_is_never_hit() {
    let t = Triangle::new(
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 1.0, 0.0),
        Vector3::new(2.0, 2.0, 0.0),
        Default::default(),
    );
    let r = Ray::new(Vector3::new(1.0, 1.0, -1.0), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(t.intersect(&r), None);
}

#[test]
fn surface_dispatches_to_primitive() {
    let m = crate::material::Material::preset("ruby").unwrap();
    let s: Surface = Sphere::new(Vector3::zero(), 1.0, m).into();
    let r = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(s.intersect(&r), Some(4.0));
    assert_eq!(s.normal_at(Vector3::new(0.0, 0.0, -1.0)),
        Vector3::new(0.0, 0.0, -1.0));
    assert_eq!(*s.material(), m);
}
