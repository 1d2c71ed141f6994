use crate::consts::{ MAX_SHADOW_BOUNCES, SHADOW_CUTOFF, SURFACE_OFFSET };
use crate::vector::Vector3;
use crate::ray::Ray;
use crate::shape::Surface;

/// Identifies a surface by its position in a world's surface list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub usize);

/// An intersection.
///
/// Records which surface was struck, and `t`, the distance along the ray
/// (rays have unit directions, so `t` is a true distance).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hit {
    pub id: SurfaceId,
    pub t: f64,
}

/// Finds the nearest surface struck by a ray.
///
/// Every surface is tested in order, except `exclude`. Only hits strictly
/// closer than `max_distance` count. When two surfaces are hit at exactly
/// the same distance, the one that appears first in `surfaces` wins.
pub fn cast(surfaces: &[Surface], ray: &Ray, max_distance: f64,
    exclude: Option<SurfaceId>) -> Option<Hit> {
    let mut nearest: Option<Hit> = None;

    for (index, surface) in surfaces.iter().enumerate() {
        let id = SurfaceId(index);
        if exclude == Some(id) {
            continue;
        }

        if let Some(t) = surface.intersect(ray) {
            let closer = match nearest {
                Some(hit) => t < hit.t,
                None => true,
            };

            if t > 0.0 && t < max_distance && closer {
                nearest = Some(Hit { id, t });
            }
        }
    }

    nearest
}

/// Measures how much of a light is blocked on its way to a point.
///
/// Walks a shadow ray from `origin` toward the light. Opaque surfaces block
/// the light outright. Transparent surfaces attenuate it by their
/// transparency, and the walk continues just past each one. Returns the
/// shadow intensity: 0 for a fully lit point, 1 for a fully shadowed one.
///
/// Once the light passing through drops below `SHADOW_CUTOFF` the point is
/// treated as fully shadowed. The walk gives up after `MAX_SHADOW_BOUNCES`
/// surfaces, keeping whatever attenuation it has accumulated so far.
pub fn shadow_intensity(surfaces: &[Surface], origin: Vector3,
    light_dir: Vector3, light_distance: f64) -> f64 {
    let mut ray = Ray::new(origin, light_dir);
    let mut remaining = light_distance;
    let mut transparency = 1.0;

    for _ in 0..MAX_SHADOW_BOUNCES {
        let hit = match cast(surfaces, &ray, remaining, None) {
            Some(hit) => hit,
            None => return 1.0 - transparency,
        };

        let material = surfaces[hit.id.0].material();
        if material.is_opaque() {
            return 1.0;
        }

        transparency *= material.transparency();
        if transparency < SHADOW_CUTOFF {
            return 1.0;
        }

        let step = hit.t + SURFACE_OFFSET;
        ray = ray.advance(step);
        remaining -= step;
        if remaining <= 0.0 {
            break;
        }
    }

    1.0 - transparency
}

#[cfg(test)]
fn sphere_at(z: f64, material: crate::material::Material) -> Surface {
    crate::shape::Sphere::new(Vector3::new(0.0, 0.0, z), 1.0, material).into()
}

#[cfg(test)]
fn glass(transparency: f64) -> crate::material::Material {
    use crate::color::Color;

    crate::material::Material::new(Color::white(), 0.0, transparency, 1.5)
}

#[test]
fn cast_finds_nearest() {
    let surfaces = vec![
        sphere_at(10.0, Default::default()),
        sphere_at(5.0, Default::default()),
        sphere_at(20.0, Default::default()),
    ];
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));

    let hit = cast(&surfaces, &r, f64::INFINITY, None).unwrap();
    assert_eq!(hit.id, SurfaceId(1));
    assert!(crate::feq(hit.t, 4.0));
}

#[test]
fn cast_respects_max_distance() {
    let surfaces = vec![sphere_at(10.0, Default::default())];
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(cast(&surfaces, &r, 9.0, None), None);
    assert_eq!(cast(&surfaces, &r, 9.0001, None).map(|h| h.id),
        Some(SurfaceId(0)));
}

#[test]
fn cast_skips_excluded_surface() {
    let surfaces = vec![
        sphere_at(5.0, Default::default()),
        sphere_at(10.0, Default::default()),
    ];
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));

    let hit = cast(&surfaces, &r, f64::INFINITY, Some(SurfaceId(0))).unwrap();
    assert_eq!(hit.id, SurfaceId(1));
}

#[test]
fn cast_ties_go_to_first_surface() {
    let surfaces = vec![
        sphere_at(5.0, Default::default()),
        sphere_at(5.0, Default::default()),
    ];
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(cast(&surfaces, &r, f64::INFINITY, None).unwrap().id,
        SurfaceId(0));
}

#[test]
fn cast_on_empty_world_misses() {
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(cast(&[], &r, f64::INFINITY, None), None);
}

#[test]
fn unobstructed_light_casts_no_shadow() {
    let surfaces = vec![sphere_at(-10.0, Default::default())];

    let s = shadow_intensity(&surfaces, Vector3::zero(),
        Vector3::new(0.0, 0.0, 1.0), 50.0);
    assert_eq!(s, 0.0);
}

#[test]
fn opaque_occluder_casts_full_shadow() {
    let surfaces = vec![sphere_at(5.0, Default::default())];

    let s = shadow_intensity(&surfaces, Vector3::zero(),
        Vector3::new(0.0, 0.0, 1.0), 50.0);
    assert_eq!(s, 1.0);
}

#[test]
fn occluder_beyond_light_casts_no_shadow() {
    let surfaces = vec![sphere_at(30.0, Default::default())];

    let s = shadow_intensity(&surfaces, Vector3::zero(),
        Vector3::new(0.0, 0.0, 1.0), 20.0);
    assert_eq!(s, 0.0);
}

#[test]
fn transparent_occluder_casts_partial_shadow() {
    let surfaces = vec![sphere_at(5.0, glass(0.5))];

    let s = shadow_intensity(&surfaces, Vector3::zero(),
        Vector3::new(0.0, 0.0, 1.0), 50.0);

    // Entering and leaving the sphere each let half the light through
    assert!(s > 0.0 && s < 1.0);
    assert!(crate::feq(s, 0.75));
}

#[test]
fn nearly_opaque_stack_is_cut_off() {
    let surfaces = vec![
        sphere_at(5.0, glass(0.1)),
        sphere_at(10.0, glass(0.5)),
    ];

    // 0.1 * 0.1 = 0.01 is not below the cutoff, 0.01 * 0.5 is
    let s = shadow_intensity(&surfaces, Vector3::zero(),
        Vector3::new(0.0, 0.0, 1.0), 50.0);
    assert_eq!(s, 1.0);
}

#[test]
fn walk_is_bounded() {
    // Twelve thin transparent shells in a row: more than the bounce limit
    let surfaces: Vec<Surface> = (1..=12)
        .map(|i| sphere_at(i as f64 * 3.0, glass(0.99)))
        .collect();

    let s = shadow_intensity(&surfaces, Vector3::zero(),
        Vector3::new(0.0, 0.0, 1.0), f64::INFINITY);

    // Only the first MAX_SHADOW_BOUNCES surface crossings attenuate
    let expected = 1.0 - 0.99f64.powi(MAX_SHADOW_BOUNCES as i32);
    assert!(crate::feq(s, expected));
}
