use crate::consts::SIMPLE_CAMERA_Z;
use crate::vector::Vector3;
use crate::ray::Ray;

/// A pinhole camera looking from `position` toward `look_at`.
///
/// The orthonormal basis and the image plane distance are derived once, on
/// construction. Changing any input means building a new camera, which is
/// what `with_aspect_ratio` does.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vector3,
    pub look_at: Vector3,
    pub up: Vector3,

    /// The vertical field of view, in degrees.
    pub fov: f64,

    /// Width over height of the image being rendered.
    pub aspect_ratio: f64,

    forward: Vector3,
    right: Vector3,
    true_up: Vector3,
    image_distance: f64,
}

impl PerspectiveCamera {
    pub fn new(position: Vector3, look_at: Vector3, up: Vector3, fov: f64,
        aspect_ratio: f64) -> PerspectiveCamera {
        let forward = (look_at - position).normalize();
        let right = forward.cross(&up).normalize();
        let true_up = right.cross(&forward).normalize();
        let image_distance = 1.0 / (fov.to_radians() / 2.0).tan();

        PerspectiveCamera {
            position,
            look_at,
            up,
            fov,
            aspect_ratio,
            forward,
            right,
            true_up,
            image_distance,
        }
    }

    pub fn forward(&self) -> Vector3 {
        self.forward
    }

    pub fn right(&self) -> Vector3 {
        self.right
    }

    pub fn true_up(&self) -> Vector3 {
        self.true_up
    }

    pub fn image_distance(&self) -> f64 {
        self.image_distance
    }

    /// Generates the ray through image coordinates `(x, y)`.
    ///
    /// `(0, 0)` is the top left corner of the image; coordinates are
    /// fractional so that samples can be placed anywhere inside a pixel.
    pub fn ray_for_pixel(&self, x: f64, y: f64, width: usize, height: usize)
        -> Ray {
        let ndc_x = (2.0 * x / width as f64 - 1.0) * self.aspect_ratio;
        let ndc_y = 1.0 - 2.0 * y / height as f64;

        let direction = self.forward * self.image_distance
            + self.right * ndc_x
            + self.true_up * ndc_y;

        Ray::new(self.position, direction)
    }
}

/// Maps pixels to primary rays.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Camera {
    Perspective(PerspectiveCamera),

    /// Orthographic rays straight down +z, from a plane `z` units in front
    /// of the origin and centered on the image.
    ///
    /// Used by scenes that do not place a camera. Every ray depends only on
    /// its pixel coordinate, so results are reproducible bit for bit.
    Simple { z: f64 },
}

impl Default for Camera {
    fn default() -> Camera {
        Camera::Simple { z: SIMPLE_CAMERA_Z }
    }
}

impl Camera {
    /// Creates a perspective camera; `fov` is in degrees.
    ///
    /// ```
    /// # use refract::camera::Camera;
    /// # use refract::vector::Vector3;
    /// let camera = Camera::look_at(
    ///     Vector3::new(0.0, 0.0, -10.0),
    ///     Vector3::zero(),
    ///     Vector3::new(0.0, 1.0, 0.0),
    ///     90.0,
    ///     1.0,
    /// );
    /// let ray = camera.ray_for_pixel(50.0, 50.0, 100, 100);
    /// assert_eq!(ray.direction, Vector3::new(0.0, 0.0, 1.0));
    /// ```
    pub fn look_at(position: Vector3, look_at: Vector3, up: Vector3,
        fov: f64, aspect_ratio: f64) -> Camera {
        Camera::Perspective(
            PerspectiveCamera::new(position, look_at, up, fov, aspect_ratio))
    }

    /// The same camera, re-derived for a different image shape.
    ///
    /// Simple cameras have no aspect ratio and are returned unchanged.
    pub fn with_aspect_ratio(&self, aspect_ratio: f64) -> Camera {
        match *self {
            Camera::Perspective(c) => Camera::look_at(
                c.position, c.look_at, c.up, c.fov, aspect_ratio),
            simple => simple,
        }
    }

    pub fn ray_for_pixel(&self, x: f64, y: f64, width: usize, height: usize)
        -> Ray {
        match self {
            Camera::Perspective(c) => c.ray_for_pixel(x, y, width, height),
            Camera::Simple { z } => {
                let origin = Vector3::new(
                    x - width as f64 / 2.0,
                    y - height as f64 / 2.0,
                    -z,
                );
                Ray::new(origin, Vector3::new(0.0, 0.0, 1.0))
            }
        }
    }
}

/* Tests */

#[cfg(test)]
fn down_z(aspect_ratio: f64) -> Camera {
    Camera::look_at(
        Vector3::new(0.0, 0.0, -10.0),
        Vector3::zero(),
        Vector3::new(0.0, 1.0, 0.0),
        90.0,
        aspect_ratio,
    )
}

#[test]
fn camera_basis_is_orthonormal() {
    let c = PerspectiveCamera::new(
        Vector3::new(1.0, 2.0, -3.0),
        Vector3::new(4.0, -1.0, 8.0),
        Vector3::new(0.0, 1.0, 0.0),
        60.0,
        1.5,
    );

    for v in [c.forward(), c.right(), c.true_up()].iter() {
        assert!(crate::feq(v.magnitude(), 1.0));
    }
    assert!(crate::feq(c.forward().dot(&c.right()), 0.0));
    assert!(crate::feq(c.forward().dot(&c.true_up()), 0.0));
    assert!(crate::feq(c.right().dot(&c.true_up()), 0.0));
}

#[test]
fn image_distance_follows_fov() {
    let c = PerspectiveCamera::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(0.0, 1.0, 0.0), 90.0, 1.0);
    assert!(crate::feq(c.image_distance(), 1.0));

    let narrow = PerspectiveCamera::new(Vector3::zero(),
        Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 1.0, 0.0), 60.0, 1.0);
    assert!(crate::feq(narrow.image_distance(), 3.0f64.sqrt()));
}

#[test]
fn center_ray_points_at_target() {
    let c = down_z(1.5);
    let r = c.ray_for_pixel(150.0, 50.0, 300, 100);

    assert_eq!(r.origin, Vector3::new(0.0, 0.0, -10.0));
    assert_eq!(r.direction, Vector3::new(0.0, 0.0, 1.0));
}

#[test]
fn corner_ray_of_square_image() {
    let c = down_z(1.0);
    let r = c.ray_for_pixel(0.0, 0.0, 100, 100);

    // ndc (-1, 1) with an image distance of 1: the direction (1, 1, 1) / sqrt(3)
    let k = 3.0f64.sqrt() / 3.0;
    assert_eq!(r.direction, Vector3::new(k, k, k));
}

#[test]
fn top_rows_look_up() {
    let c = down_z(1.0);
    let top = c.ray_for_pixel(50.0, 0.0, 100, 100);
    let bottom = c.ray_for_pixel(50.0, 100.0, 100, 100);

    assert!(top.direction.y > 0.0);
    assert!(bottom.direction.y < 0.0);
}

#[test]
fn aspect_ratio_widens_horizontal_spread() {
    let square = down_z(1.0).ray_for_pixel(0.0, 50.0, 100, 100);
    let wide = down_z(1.0).with_aspect_ratio(2.0)
        .ray_for_pixel(0.0, 50.0, 200, 100);

    assert!(wide.direction.x.abs() > square.direction.x.abs());
    assert_eq!(down_z(1.0).with_aspect_ratio(2.0), down_z(2.0));
}

#[test]
fn simple_camera_rays_are_parallel() {
    let c = Camera::default();

    let r = c.ray_for_pixel(0.0, 0.0, 200, 100);
    assert_eq!(r.origin, Vector3::new(-100.0, -50.0, -500.0));
    assert_eq!(r.direction, Vector3::new(0.0, 0.0, 1.0));

    let r = c.ray_for_pixel(150.5, 99.0, 200, 100);
    assert_eq!(r.origin, Vector3::new(50.5, 49.0, -500.0));
    assert_eq!(r.direction, Vector3::new(0.0, 0.0, 1.0));
}

#[test]
fn simple_camera_ignores_aspect_ratio() {
    let c = Camera::Simple { z: 20.0 };

    assert_eq!(c.with_aspect_ratio(3.0), c);
}
