use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{ Serialize, Deserialize };

use crate::{ RenderError, Result };
use crate::consts::{ DEFAULT_AMBIENT, SIMPLE_CAMERA_Z, VACUUM_RI };
use crate::vector::Vector3;
use crate::color::Color;
use crate::material::Material;
use crate::shape::{ Sphere, Surface, Triangle };
use crate::light::Light;
use crate::world::World;
use crate::camera::Camera;
use crate::render::{ Renderer, RenderSettings };

/// A world and the camera to view it through, as read from a scene file.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub world: World,
    pub camera: Camera,
}

impl Scene {
    /// Parses a JSON scene description.
    ///
    /// ```
    /// # use refract::scene::Scene;
    /// let scene = Scene::from_json_str(r#"{
    ///     "lights": [{ "type": "point", "position": [0, -300, -200] }],
    ///     "surfaces": [
    ///         { "type": "sphere", "center": [0, 0, 0], "radius": 50,
    ///           "material": "glass" }
    ///     ]
    /// }"#).unwrap();
    ///
    /// assert_eq!(scene.world.surfaces().len(), 1);
    /// assert_eq!(scene.world.lights().len(), 1);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Scene> {
        let file: SceneJson = serde_json::from_str(json)?;
        Scene::build(file)
    }

    /// Reads and parses a JSON scene file.
    pub fn load(path: &Path) -> Result<Scene> {
        debug!("loading scene from {}", path.display());
        let json = fs::read_to_string(path)?;
        Scene::from_json_str(&json)
    }

    /// Hands the scene over to a renderer.
    pub fn into_renderer(self, settings: RenderSettings) -> Renderer {
        let aspect = settings.width as f64 / settings.height as f64;
        let camera = self.camera.with_aspect_ratio(aspect);

        Renderer::new(self.world, camera, settings)
    }

    fn build(file: SceneJson) -> Result<Scene> {
        let mut world = World::new();
        world.set_ambient(file.ambient);
        if let Some(background) = file.background {
            world.set_background(background);
        }
        if let Some(max_depth) = file.max_depth {
            world.set_max_depth(max_depth);
        }

        if file.default_lights {
            world.seed_default_lights();
        }
        for light in file.lights.iter() {
            world.add_light(light.into());
        }

        let mut surfaces = Vec::with_capacity(file.surfaces.len());
        for surface in file.surfaces.iter() {
            surfaces.push(surface.to_surface(&file.materials)?);
        }
        world.add_surfaces(surfaces);

        let camera = match file.camera {
            Some(camera) => camera.into(),
            None => Camera::default(),
        };

        debug!("scene has {} surfaces and {} lights",
            world.surfaces().len(), world.lights().len());

        Ok(Scene { world, camera })
    }
}

fn default_ambient() -> f64 {
    DEFAULT_AMBIENT
}

fn default_intensity() -> f64 {
    1.0
}

fn default_refractive_index() -> f64 {
    VACUUM_RI
}

fn default_up() -> Vector3 {
    Vector3::new(0.0, 1.0, 0.0)
}

fn default_camera_z() -> f64 {
    SIMPLE_CAMERA_Z
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SceneJson {
    #[serde(default)]
    camera: Option<CameraJson>,

    #[serde(default = "default_ambient")]
    ambient: f64,

    #[serde(default)]
    background: Option<Color>,

    #[serde(default)]
    max_depth: Option<usize>,

    /// Adds the two standard point lights before any listed ones.
    #[serde(default)]
    default_lights: bool,

    /// Named materials, looked up before the built-in presets.
    #[serde(default)]
    materials: HashMap<String, MaterialJson>,

    #[serde(default)]
    lights: Vec<LightJson>,

    #[serde(default)]
    surfaces: Vec<SurfaceJson>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CameraJson {
    Perspective {
        position: Vector3,
        look_at: Vector3,
        #[serde(default = "default_up")]
        up: Vector3,
        fov: f64,
    },
    Simple {
        #[serde(default = "default_camera_z")]
        z: f64,
    },
}

impl From<CameraJson> for Camera {
    fn from(camera_json: CameraJson) -> Camera {
        match camera_json {
            // The aspect ratio is fixed up once the image size is known
            CameraJson::Perspective { position, look_at, up, fov } =>
                Camera::look_at(position, look_at, up, fov, 1.0),
            CameraJson::Simple { z } => Camera::Simple { z },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LightJson {
    Point {
        position: Vector3,
        #[serde(default = "default_intensity")]
        intensity: f64,
    },
    Directional {
        /// The direction the light travels in.
        direction: Vector3,
        #[serde(default = "default_intensity")]
        intensity: f64,
    },
}

impl From<&LightJson> for Light {
    fn from(light_json: &LightJson) -> Light {
        match *light_json {
            LightJson::Point { position, intensity } =>
                Light::point(position, intensity),
            LightJson::Directional { direction, intensity } =>
                Light::directional(direction, intensity),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct MaterialJson {
    color: Color,
    #[serde(default)]
    reflectivity: f64,
    #[serde(default)]
    transparency: f64,
    #[serde(default = "default_refractive_index")]
    refractive_index: f64,
}

impl From<&MaterialJson> for Material {
    fn from(m: &MaterialJson) -> Material {
        Material::new(m.color, m.reflectivity, m.transparency,
            m.refractive_index)
    }
}

/// A material given by name, or spelled out in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum MaterialRef {
    Named(String),
    Inline(MaterialJson),
}

impl MaterialRef {
    fn resolve(&self, materials: &HashMap<String, MaterialJson>)
        -> Result<Material> {
        match self {
            MaterialRef::Inline(m) => Ok(m.into()),
            MaterialRef::Named(name) => materials.get(name)
                .map(Material::from)
                .or_else(|| Material::preset(name))
                .ok_or_else(|| RenderError::Scene(
                    format!("unknown material `{}`", name))),
        }
    }
}

fn resolve(material: &Option<MaterialRef>,
    materials: &HashMap<String, MaterialJson>) -> Result<Material> {
    match material {
        Some(m) => m.resolve(materials),
        None => Ok(Material::default()),
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SurfaceJson {
    Sphere {
        center: Vector3,
        radius: f64,
        #[serde(default)]
        material: Option<MaterialRef>,
    },
    Triangle {
        v0: Vector3,
        v1: Vector3,
        v2: Vector3,
        #[serde(default)]
        material: Option<MaterialRef>,
    },
}

impl SurfaceJson {
    fn to_surface(&self, materials: &HashMap<String, MaterialJson>)
        -> Result<Surface> {
        let surface: Surface = match self {
            SurfaceJson::Sphere { center, radius, material } =>
                Sphere::new(*center, *radius, resolve(material, materials)?)
                    .into(),
            SurfaceJson::Triangle { v0, v1, v2, material } =>
                Triangle::new(*v0, *v1, *v2, resolve(material, materials)?)
                    .into(),
        };

        Ok(surface)
    }
}

/* Tests */

#[test]
fn empty_scene_uses_defaults() {
    let scene = Scene::from_json_str("{}").unwrap();

    assert_eq!(scene.world, World::new());
    assert_eq!(scene.camera, Camera::default());
}

#[test]
fn scene_settings_are_applied() {
    let scene = Scene::from_json_str(r#"{
        "ambient": 0.5,
        "background": [1, 2, 3],
        "max_depth": 3,
        "default_lights": true,
        "lights": [
            { "type": "directional", "direction": [0, 0, 2], "intensity": 0.5 }
        ]
    }"#).unwrap();

    let world = &scene.world;
    assert_eq!(world.ambient(), 0.5);
    assert_eq!(world.background(), Color::rgb(1, 2, 3));
    assert_eq!(world.max_depth(), 3);

    assert_eq!(world.lights().len(), 3);
    assert_eq!(world.lights()[2],
        Light::directional(Vector3::new(0.0, 0.0, 1.0), 0.5));
}

#[test]
fn materials_by_name_and_inline() {
    let scene = Scene::from_json_str(r#"{
        "materials": {
            "floor": { "color": [240, 240, 240], "reflectivity": 0.3 },
            "glass": { "color": [0, 0, 255], "transparency": 1.0 }
        },
        "surfaces": [
            { "type": "sphere", "center": [0, 0, 0], "radius": 1,
              "material": "ruby" },
            { "type": "sphere", "center": [0, 0, 5], "radius": 1,
              "material": "glass" },
            { "type": "triangle", "v0": [0, 0, 0], "v1": [1, 0, 0],
              "v2": [0, 1, 0], "material": "floor" },
            { "type": "triangle", "v0": [0, 0, 0], "v1": [1, 0, 0],
              "v2": [0, 1, 0],
              "material": { "color": [9, 9, 9], "transparency": 0.5,
                            "refractive_index": 1.33 } },
            { "type": "sphere", "center": [0, 0, 9], "radius": 2 }
        ]
    }"#).unwrap();

    let m: Vec<Material> = scene.world.surfaces().iter()
        .map(|s| *s.material())
        .collect();

    assert_eq!(m[0], Material::preset("ruby").unwrap());

    // Scene materials shadow presets of the same name
    assert_eq!(m[1], Material::new(Color::rgb(0, 0, 255), 0.0, 1.0, 1.0));
    assert_eq!(m[2], Material::metallic(Color::rgb(240, 240, 240), 0.3));
    assert_eq!(m[3], Material::new(Color::rgb(9, 9, 9), 0.0, 0.5, 1.33));
    assert_eq!(m[4], Material::default());
}

#[test]
fn unknown_material_is_an_error() {
    let err = Scene::from_json_str(r#"{
        "surfaces": [
            { "type": "sphere", "center": [0, 0, 0], "radius": 1,
              "material": "unobtainium" }
        ]
    }"#).unwrap_err();

    match err {
        RenderError::Scene(msg) => assert!(msg.contains("unobtainium")),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn malformed_json_is_an_error() {
    let err = Scene::from_json_str(r#"{ "surfaces": [ { "type": "cube" } ] }"#)
        .unwrap_err();

    assert!(matches!(err, RenderError::Json(_)));
}

#[test]
fn perspective_camera_is_fitted_to_the_image() {
    let scene = Scene::from_json_str(r#"{
        "camera": { "type": "perspective", "position": [0, 0, -500],
                    "look_at": [0, 0, 0], "fov": 60 }
    }"#).unwrap();

    let settings = RenderSettings { width: 300, height: 100,
        ..Default::default() };
    let renderer = scene.into_renderer(settings);

    let expected = Camera::look_at(Vector3::new(0.0, 0.0, -500.0),
        Vector3::zero(), Vector3::new(0.0, 1.0, 0.0), 60.0, 3.0);
    assert_eq!(*renderer.camera(), expected);
}

#[test]
fn simple_camera_depth() {
    let scene = Scene::from_json_str(
        r#"{ "camera": { "type": "simple", "z": 42 } }"#).unwrap();

    assert_eq!(scene.camera, Camera::Simple { z: 42.0 });
}

#[test]
fn missing_scene_file_is_an_error() {
    let err = Scene::load(Path::new("no/such/scene.json")).unwrap_err();

    assert!(matches!(err, RenderError::Io(_)));
}
