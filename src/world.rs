use log::debug;

use crate::consts::{ DEFAULT_AMBIENT, DEFAULT_BACKGROUND, DEFAULT_MAX_DEPTH,
    SURFACE_OFFSET, VACUUM_RI };
use crate::vector::Vector3;
use crate::color::Color;
use crate::ray::{ Ray, reflect, refract, fresnel };
use crate::material::Material;
use crate::shape::{ Surface, Sphere, Triangle };
use crate::light::Light;
use crate::intersect::{ Hit, SurfaceId, cast, shadow_intensity };

/// A world with surfaces and lights.
///
/// Worlds collect everything the tracer needs besides the camera: the
/// surfaces (in insertion order, which is also the order they are tested
/// in), the lights, the ambient light factor, the background color and the
/// maximum recursion depth. Most shading logic lives here.
///
/// A world is built up front and only read while rendering. `trace` takes
/// `&self`, so a world can be shared freely between render threads.
#[derive(Clone, Debug, PartialEq)]
pub struct World {
    surfaces: Vec<Surface>,
    lights: Vec<Light>,
    ambient: f64,
    background: Color,
    max_depth: usize,
}

impl Default for World {
    fn default() -> World {
        World {
            surfaces: Vec::new(),
            lights: Vec::new(),
            ambient: DEFAULT_AMBIENT,
            background: DEFAULT_BACKGROUND.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl World {
    /// Creates an empty world with no surfaces and no lights.
    pub fn new() -> World {
        Default::default()
    }

    pub fn add_surface(&mut self, surface: Surface) -> SurfaceId {
        self.surfaces.push(surface);
        SurfaceId(self.surfaces.len() - 1)
    }

    pub fn add_surfaces<I>(&mut self, surfaces: I)
    where
        I: IntoIterator<Item = Surface>,
    {
        self.surfaces.extend(surfaces);
    }

    pub fn add_sphere(&mut self, center: Vector3, radius: f64,
        material: Material) -> SurfaceId {
        self.add_surface(Sphere::new(center, radius, material).into())
    }

    pub fn add_triangle(&mut self, v0: Vector3, v1: Vector3, v2: Vector3,
        material: Material) -> SurfaceId {
        self.add_surface(Triangle::new(v0, v1, v2, material).into())
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn set_lights(&mut self, lights: Vec<Light>) {
        self.lights = lights;
    }

    pub fn clear_lights(&mut self) {
        self.lights.clear();
    }

    /// Adds the classic two-light rig: unit point lights up and to the left
    /// and right of the origin, slightly toward the viewer.
    ///
    /// Worlds never get lights unless asked; call this for scenes that do not
    /// place their own.
    pub fn seed_default_lights(&mut self) {
        debug!("seeding default lights");
        self.add_light(Light::point(Vector3::new(-300.0, -300.0, -200.0), 1.0));
        self.add_light(Light::point(Vector3::new(300.0, -300.0, -200.0), 1.0));
    }

    /// Sets the ambient light factor, clamped to `[0, 1]`.
    pub fn set_ambient(&mut self, ambient: f64) {
        self.ambient = if ambient.is_nan() { 0.0 } else { ambient.clamp(0.0, 1.0) };
    }

    pub fn set_background(&mut self, background: Color) {
        self.background = background;
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(id.0)
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn ambient(&self) -> f64 {
        self.ambient
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Finds the nearest surface along a ray.
    ///
    /// See `intersect::cast`.
    pub fn cast(&self, ray: &Ray, max_distance: f64,
        exclude: Option<SurfaceId>) -> Option<Hit> {
        cast(&self.surfaces, ray, max_distance, exclude)
    }

    /// Calculates how brightly lit a point is, before any surface color.
    ///
    /// Starts from the ambient factor and adds a Lambertian term for every
    /// light, scaled by the light's intensity and by how much of it reaches
    /// the point through the scene (see `shadow_intensity`). Contributions
    /// from separate lights add up; they are not averaged.
    pub fn direct_brightness(&self, point: Vector3, normal: Vector3) -> f64 {
        let mut brightness = self.ambient;
        let shadow_origin = point + normal * SURFACE_OFFSET;

        for light in self.lights.iter() {
            let light_dir = light.direction_to(point);
            let diffuse = normal.dot(&light_dir).max(0.0);
            if diffuse == 0.0 {
                continue;
            }

            let shadow = shadow_intensity(&self.surfaces, shadow_origin,
                light_dir, light.distance_from(point));

            brightness += diffuse
                * (1.0 - self.ambient)
                * light.intensity()
                * (1.0 - shadow);
        }

        brightness
    }

    /// Determines the color seen along a ray.
    ///
    /// `depth` is the number of bounces already taken to get here; at
    /// `max_depth` the background is returned without casting anything.
    ///
    /// On a hit, the surface's color is lit by `direct_brightness`, then
    /// blended with a recursively traced reflection (for reflective
    /// materials) and refraction (for transparent ones). For transparent
    /// materials the split between reflected and transmitted light follows
    /// the Fresnel reflectance at the hit.
    pub fn trace(&self, ray: &Ray, depth: usize) -> Color {
        if depth >= self.max_depth {
            return self.background;
        }

        let hit = match self.cast(ray, f64::INFINITY, None) {
            Some(hit) => hit,
            None => return self.background,
        };

        let surface = &self.surfaces[hit.id.0];
        let point = ray.position(hit.t);
        let normal = surface.normal_at(point);
        let material = surface.material();

        let local_color = material.color()
            .scale(self.direct_brightness(point, normal));

        let mut reflection_color = self.background;
        if material.reflectivity() > 0.0 {
            // Offset along the outward normal, even for hits from inside
            let reflected = Ray::new(point + normal * SURFACE_OFFSET,
                reflect(ray.direction, normal));
            reflection_color = self.trace(&reflected, depth + 1);
        }

        let mut refraction_color = self.background;
        let mut reflection_weight = material.reflectivity();
        let mut refraction_weight = 0.0;

        let transparency = material.transparency();
        if transparency > 0.0 {
            let ri = material.refractive_index();

            let refracted = Ray::new(point,
                refract(ray.direction, normal, VACUUM_RI, ri))
                .advance(SURFACE_OFFSET);
            refraction_color = self.trace(&refracted, depth + 1);

            let reflectance = fresnel(ray.direction, normal, VACUUM_RI, ri);
            reflection_weight = material.reflectivity() * (1.0 - transparency)
                + transparency * reflectance;
            refraction_weight = transparency * (1.0 - reflectance);

            let total = reflection_weight + refraction_weight;
            if total > 1.0 {
                reflection_weight /= total;
                refraction_weight /= total;
            }
        }

        let direct_weight =
            (1.0 - reflection_weight - refraction_weight).max(0.0);

        Color::blend(&[
            (local_color, direct_weight),
            (reflection_color, reflection_weight),
            (refraction_color, refraction_weight),
        ])
    }
}

/* Tests */

#[cfg(test)]
fn toward_z(origin_z: f64) -> Ray {
    Ray::new(Vector3::new(0.0, 0.0, origin_z), Vector3::new(0.0, 0.0, 1.0))
}

#[test]
fn new_world_is_empty_and_unlit() {
    let w = World::new();

    assert!(w.surfaces().is_empty());
    assert!(w.lights().is_empty());
    assert_eq!(w.ambient(), 0.2);
    assert_eq!(w.background(), Color::rgb(70, 130, 180));
    assert_eq!(w.max_depth(), 5);
}

#[test]
fn default_lights_are_opt_in() {
    let mut w = World::new();
    w.seed_default_lights();

    assert_eq!(w.lights().len(), 2);
    assert_eq!(w.lights()[0],
        Light::point(Vector3::new(-300.0, -300.0, -200.0), 1.0));

    w.clear_lights();
    assert!(w.lights().is_empty());
}

#[test]
fn ambient_is_clamped() {
    let mut w = World::new();

    w.set_ambient(1.5);
    assert_eq!(w.ambient(), 1.0);
    w.set_ambient(-0.1);
    assert_eq!(w.ambient(), 0.0);
}

#[test]
fn surface_ids_follow_insertion_order() {
    let mut w = World::new();
    let a = w.add_sphere(Vector3::zero(), 1.0, Default::default());
    let b = w.add_triangle(Vector3::zero(), Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0), Default::default());

    assert_eq!(a, SurfaceId(0));
    assert_eq!(b, SurfaceId(1));
    assert!(matches!(w.surface(b), Some(Surface::Triangle(_))));
    assert_eq!(w.surface(SurfaceId(2)), None);
}

#[test]
fn color_ray_miss() {
    let mut w = World::new();
    w.add_sphere(Vector3::zero(), 1.0, Material::matte(Color::white()));
    let r = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 1.0, 0.0));

    assert_eq!(w.trace(&r, 0), w.background());
}

#[test]
fn trace_at_max_depth_returns_background() {
    let mut w = World::new();
    w.add_sphere(Vector3::zero(), 1.0, Material::preset("glass").unwrap());
    w.seed_default_lights();

    assert_ne!(w.trace(&toward_z(-5.0), 0), w.background());
    assert_eq!(w.trace(&toward_z(-5.0), w.max_depth()), w.background());

    w.set_max_depth(0);
    assert_eq!(w.trace(&toward_z(-5.0), 0), w.background());
}

#[test]
fn lambertian_shading_matches_cosine_law() {
    let mut w = World::new();
    let base = Color::rgb(200, 120, 30);
    w.add_sphere(Vector3::zero(), 1.0, Material::matte(base));

    // Light arrives 60 degrees off the normal at the hit point (0, 0, -1)
    let (sin, cos) = (60f64.to_radians().sin(), 60f64.to_radians().cos());
    w.add_light(Light::directional(Vector3::new(0.0, -sin, cos), 1.0));

    let c = w.trace(&toward_z(-5.0), 0);

    let factor = 0.2 + 0.8 * cos;
    let expect = |channel: u8| (channel as f64 * factor).trunc() as i32;
    assert!((c.r as i32 - expect(base.r)).abs() <= 1);
    assert!((c.g as i32 - expect(base.g)).abs() <= 1);
    assert!((c.b as i32 - expect(base.b)).abs() <= 1);
}

#[test]
fn light_behind_surface_contributes_nothing() {
    let mut w = World::new();
    w.add_sphere(Vector3::zero(), 1.0, Material::matte(Color::white()));
    w.add_light(Light::point(Vector3::new(0.0, 0.0, 10.0), 1.0));

    let hit_point = Vector3::new(0.0, 0.0, -1.0);
    let normal = Vector3::new(0.0, 0.0, -1.0);
    assert_eq!(w.direct_brightness(hit_point, normal), 0.2);
}

#[test]
fn multiple_lights_add_up() {
    let mut w = World::new();
    w.add_sphere(Vector3::zero(), 1.0, Material::matte(Color::white()));
    w.add_light(Light::point(Vector3::new(0.0, 0.0, -10.0), 1.0));
    w.add_light(Light::point(Vector3::new(0.0, 0.0, -20.0), 1.0));

    let hit_point = Vector3::new(0.0, 0.0, -1.0);
    let normal = Vector3::new(0.0, 0.0, -1.0);
    assert!(crate::feq(w.direct_brightness(hit_point, normal), 1.8));
}

#[test]
fn shade_intersection_in_shadow() {
    let mut w = World::new();
    let base = Color::rgb(100, 200, 50);
    w.add_sphere(Vector3::zero(), 1.0, Material::matte(base));
    w.add_sphere(Vector3::new(0.0, 0.0, -5.0), 1.0, Material::matte(base));
    w.add_light(Light::point(Vector3::new(0.0, 0.0, -10.0), 1.0));

    // The second sphere sits between the lit face and the light
    let hit_point = Vector3::new(0.0, 0.0, -1.0);
    let normal = Vector3::new(0.0, 0.0, -1.0);
    assert_eq!(w.direct_brightness(hit_point, normal), 0.2);
}

#[test]
fn transparent_occluder_gives_partial_light() {
    let mut w = World::new();
    w.add_sphere(Vector3::zero(), 1.0, Material::matte(Color::white()));
    w.add_sphere(Vector3::new(0.0, 0.0, -5.0), 1.0,
        Material::new(Color::white(), 0.0, 0.5, 1.5));
    w.add_light(Light::point(Vector3::new(0.0, 0.0, -10.0), 1.0));

    let hit_point = Vector3::new(0.0, 0.0, -1.0);
    let normal = Vector3::new(0.0, 0.0, -1.0);
    let b = w.direct_brightness(hit_point, normal);

    assert!(b > 0.2 && b < 1.0);
    assert!(crate::feq(b, 0.2 + 0.8 * 0.25));
}

#[test]
fn mirror_shows_what_is_behind_the_viewer() {
    let mut w = World::new();
    w.add_sphere(Vector3::zero(), 1.0,
        Material::metallic(Color::white(), 1.0));
    w.add_sphere(Vector3::new(0.0, 0.0, -20.0), 1.0,
        Material::matte(Color::rgb(255, 0, 0)));

    let c = w.trace(&toward_z(-5.0), 0);

    assert!(c.r > 0);
    assert_eq!((c.g, c.b), (0, 0));
}

#[test]
fn mirror_facing_nothing_shows_background() {
    let mut w = World::new();
    w.add_sphere(Vector3::zero(), 1.0,
        Material::metallic(Color::white(), 1.0));

    assert_eq!(w.trace(&toward_z(-5.0), 0), w.background());
}

#[test]
fn clear_medium_is_invisible() {
    let green = Material::matte(Color::rgb(0, 255, 0));

    let mut behind = World::new();
    behind.add_sphere(Vector3::new(0.0, 0.0, 10.0), 2.0, green);
    let expected = behind.trace(&toward_z(-5.0), 0);

    // A fully transparent sphere with the index of air changes nothing
    let mut w = behind.clone();
    w.add_sphere(Vector3::zero(), 1.0, Material::new(Color::white(), 0.0, 1.0, 1.0));

    assert_eq!(w.trace(&toward_z(-5.0), 0), expected);
    assert_ne!(expected, w.background());
}

#[test]
fn glass_blends_reflection_and_refraction() {
    let mut w = World::new();
    w.set_background(Color::black());
    w.add_sphere(Vector3::zero(), 1.0, Material::preset("glass").unwrap());
    w.add_sphere(Vector3::new(0.0, 0.0, 10.0), 3.0,
        Material::matte(Color::white()));
    w.set_ambient(1.0);

    let c = w.trace(&toward_z(-5.0), 0);

    // Mostly the white sphere seen through the glass, darkened by what is
    // reflected away at both boundaries
    assert!(c.r > 150 && c.r < 255);
    assert_eq!(c.r, c.g);
    assert_eq!(c.g, c.b);
}

#[test]
fn facing_mirrors_terminate() {
    let mut w = World::new();
    w.set_max_depth(50);
    let mirror = Material::metallic(Color::white(), 1.0);
    // Both face the origin
    w.add_triangle(Vector3::new(-10.0, -10.0, 5.0), Vector3::new(0.0, 10.0, 5.0),
        Vector3::new(10.0, -10.0, 5.0), mirror);
    w.add_triangle(Vector3::new(-10.0, -10.0, -5.0), Vector3::new(10.0, -10.0, -5.0),
        Vector3::new(0.0, 10.0, -5.0), mirror);

    // Bounces back and forth until the depth runs out
    assert_eq!(w.trace(&toward_z(0.0), 0), w.background());
}

#[test]
fn reflection_inside_sphere_starts_outside() {
    let mut w = World::new();
    w.add_sphere(Vector3::zero(), 1.0,
        Material::metallic(Color::white(), 1.0));
    w.add_sphere(Vector3::new(0.0, 0.0, 20.0), 1.0,
        Material::matte(Color::rgb(255, 0, 0)));

    // The reflection off the inner wall starts just beyond it, meets the
    // outer wall and is sent on toward the red sphere
    let c = w.trace(&toward_z(0.0), 0);

    assert!(c.r > 0);
    assert_eq!((c.g, c.b), (0, 0));
}
