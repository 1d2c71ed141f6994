use log::warn;

use crate::color::Color;
use crate::consts::{ DIAMOND_RI, GLASS_RI, RUBY_RI, VACUUM_RI, WATER_RI };

/// A material record.
///
/// Materials describe how a surface treats light: its base color, how much
/// light it mirrors (`reflectivity`), how much it lets through
/// (`transparency`) and how strongly transmitted light bends
/// (`refractive_index`).
///
/// Materials are immutable once built. The constructor keeps them physically
/// plausible: reflectivity and transparency are clamped to `[0, 1]`, and if
/// together they exceed 1 both are rescaled proportionally so that they sum
/// to exactly 1.
///
/// ```
/// # use refract::color::Color;
/// # use refract::material::Material;
/// let m = Material::new(Color::white(), 0.6, 0.9, 1.5);
/// assert!((m.reflectivity() - 0.4).abs() < 1e-9);
/// assert!((m.transparency() - 0.6).abs() < 1e-9);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    color: Color,
    reflectivity: f64,
    transparency: f64,
    refractive_index: f64,
}

impl Default for Material {
    fn default() -> Material {
        Material::matte(Color::white())
    }
}

fn unit_interval(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl Material {
    pub fn new(color: Color, reflectivity: f64, transparency: f64,
        refractive_index: f64) -> Material {
        let mut reflectivity = unit_interval(reflectivity);
        let mut transparency = unit_interval(transparency);

        let total = reflectivity + transparency;
        if total > 1.0 {
            warn!("reflectivity {} + transparency {} exceeds 1, rescaling",
                reflectivity, transparency);
            reflectivity /= total;
            transparency /= total;
        }

        let refractive_index = if refractive_index >= VACUUM_RI {
            refractive_index
        } else {
            VACUUM_RI
        };

        Material { color, reflectivity, transparency, refractive_index }
    }

    /// An opaque, non-reflective material.
    pub fn matte(color: Color) -> Material {
        Material::new(color, 0.0, 0.0, VACUUM_RI)
    }

    /// An opaque material which mirrors part of the incoming light.
    pub fn metallic(color: Color, reflectivity: f64) -> Material {
        Material::new(color, reflectivity, 0.0, VACUUM_RI)
    }

    /// A glass-like material with a faint reflection.
    pub fn glass_tinted(color: Color, transparency: f64,
        refractive_index: f64) -> Material {
        Material::new(color, 0.1, transparency, refractive_index)
    }

    /// Looks up one of the built-in named materials.
    ///
    /// Returns `None` for unknown names.
    pub fn preset(name: &str) -> Option<Material> {
        let m = match name {
            "red" => Material::matte(Color::rgb(255, 50, 50)),
            "green" => Material::matte(Color::rgb(50, 255, 50)),
            "blue" => Material::matte(Color::rgb(50, 50, 255)),
            "yellow" => Material::matte(Color::rgb(255, 255, 50)),
            "white" => Material::matte(Color::white()),
            "black" => Material::matte(Color::black()),

            "mirror" => Material::metallic(Color::white(), 0.9),
            "chrome" => Material::metallic(Color::rgb(220, 220, 220), 0.8),
            "metal_red" => Material::metallic(Color::rgb(255, 50, 50), 0.6),
            "metal_blue" => Material::metallic(Color::rgb(50, 50, 255), 0.6),

            "glass" => Material::glass_tinted(Color::white(), 0.9, GLASS_RI),
            "water" => Material::glass_tinted(
                Color::rgb(200, 230, 255), 0.8, WATER_RI),
            "diamond" => Material::new(Color::white(), 0.2, 0.8, DIAMOND_RI),
            "ruby" => Material::glass_tinted(
                Color::rgb(255, 20, 20), 0.7, RUBY_RI),

            _ => return None,
        };

        Some(m)
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn reflectivity(&self) -> f64 {
        self.reflectivity
    }

    pub fn transparency(&self) -> f64 {
        self.transparency
    }

    pub fn refractive_index(&self) -> f64 {
        self.refractive_index
    }

    pub fn is_opaque(&self) -> bool {
        self.transparency <= 0.0
    }
}

#[test]
fn valid_material_is_unchanged() {
    let m = Material::new(Color::rgb(1, 2, 3), 0.3, 0.5, 1.33);

    assert_eq!(m.color(), Color::rgb(1, 2, 3));
    assert_eq!(m.reflectivity(), 0.3);
    assert_eq!(m.transparency(), 0.5);
    assert_eq!(m.refractive_index(), 1.33);
}

#[test]
fn oversaturated_material_is_rescaled() {
    let m = Material::new(Color::white(), 1.0, 1.0, 1.5);

    assert_eq!(m.reflectivity(), 0.5);
    assert_eq!(m.transparency(), 0.5);
    assert!(crate::feq(m.reflectivity() + m.transparency(), 1.0));
}

#[test]
fn rescaling_keeps_proportions() {
    let m = Material::new(Color::white(), 0.9, 0.3, 1.5);

    assert!(crate::feq(m.reflectivity() / m.transparency(), 3.0));
    assert!(crate::feq(m.reflectivity() + m.transparency(), 1.0));
}

#[test]
fn out_of_range_inputs_are_clamped() {
    let m = Material::new(Color::white(), -0.5, 2.0, 0.5);

    assert_eq!(m.reflectivity(), 0.0);
    assert_eq!(m.transparency(), 1.0);
    assert_eq!(m.refractive_index(), 1.0);
}

#[test]
fn presets_are_known() {
    let glass = Material::preset("glass").unwrap();

    assert_eq!(glass.reflectivity(), 0.1);
    assert_eq!(glass.transparency(), 0.9);
    assert_eq!(glass.refractive_index(), 1.5);
    assert!(Material::preset("mirror").unwrap().is_opaque());
    assert!(Material::preset("unobtainium").is_none());
}
