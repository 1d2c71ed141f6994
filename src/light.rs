use crate::vector::Vector3;

/// A light source.
///
/// Lights only need to answer two questions for a point being shaded: which
/// way is the light, and how far away is it. Intensity is a scalar
/// multiplier on the diffuse contribution; lights carry no color.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Light {
    /// Emits in every direction from `position`.
    Point { position: Vector3, intensity: f64 },

    /// Infinitely distant light with parallel rays, like the sun.
    ///
    /// `direction` is stored pointing *toward* the light, i.e. opposite to
    /// the direction the light travels.
    Directional { direction: Vector3, intensity: f64 },
}

impl Light {
    /// Creates a point light.
    pub fn point(position: Vector3, intensity: f64) -> Light {
        Light::Point { position, intensity }
    }

    /// Creates a directional light whose rays travel along `travel`.
    ///
    /// ```
    /// # use refract::light::Light;
    /// # use refract::vector::Vector3;
    /// let sun = Light::directional(Vector3::new(0.0, -2.0, 0.0), 1.0);
    /// let to_sun = sun.direction_to(Vector3::zero());
    /// assert_eq!(to_sun, Vector3::new(0.0, 1.0, 0.0));
    /// assert!(sun.distance_from(Vector3::zero()).is_infinite());
    /// ```
    pub fn directional(travel: Vector3, intensity: f64) -> Light {
        Light::Directional { direction: -travel.normalize(), intensity }
    }

    /// Unit vector from `point` toward the light.
    pub fn direction_to(&self, point: Vector3) -> Vector3 {
        match *self {
            Light::Point { position, .. } => (position - point).normalize(),
            Light::Directional { direction, .. } => direction,
        }
    }

    /// Distance from `point` to the light; infinite for directional lights.
    pub fn distance_from(&self, point: Vector3) -> f64 {
        match *self {
            Light::Point { position, .. } => (position - point).magnitude(),
            Light::Directional { .. } => f64::INFINITY,
        }
    }

    pub fn intensity(&self) -> f64 {
        match *self {
            Light::Point { intensity, .. } => intensity,
            Light::Directional { intensity, .. } => intensity,
        }
    }
}

#[test]
fn point_light_direction_and_distance() {
    let light = Light::point(Vector3::new(0.0, 10.0, 0.0), 0.5);
    let p = Vector3::new(0.0, 0.0, 0.0);

    assert_eq!(light.direction_to(p), Vector3::new(0.0, 1.0, 0.0));
    assert_eq!(light.distance_from(p), 10.0);
    assert_eq!(light.intensity(), 0.5);
}

#[test]
fn point_light_direction_is_unit() {
    let light = Light::point(Vector3::new(3.0, 4.0, 12.0), 1.0);
    let p = Vector3::new(0.0, 0.0, 0.0);

    assert!(crate::feq(light.direction_to(p).magnitude(), 1.0));
    assert!(crate::feq(light.distance_from(p), 13.0));
}

#[test]
fn directional_light_is_constant() {
    let light = Light::directional(Vector3::new(1.0, -1.0, 0.0), 1.0);
    let k = 2.0f64.sqrt() / 2.0;

    for p in [Vector3::zero(), Vector3::new(100.0, -5.0, 3.0)].iter() {
        assert_eq!(light.direction_to(*p), Vector3::new(-k, k, 0.0));
        assert_eq!(light.distance_from(*p), f64::INFINITY);
    }
}
