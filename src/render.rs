use std::mem;
use std::time::Instant;

use log::{ debug, info };
use rand::{ Rng, SeedableRng };
use rand::rngs::StdRng;
use rayon::prelude::*;
use rayon::{ ThreadPool, ThreadPoolBuilder };

use crate::{ RenderError, Result };
use crate::consts::{ DEFAULT_HEIGHT, DEFAULT_WIDTH };
use crate::vector::Vector3;
use crate::color::Color;
use crate::world::World;
use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::progress::{ ObserverId, ProgressObserver };

/// Output resolution and sampling options for a render.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    pub width: usize,
    pub height: usize,

    /// Rays traced per pixel; their colors are averaged.
    pub samples: usize,

    /// Seeds the random sub-pixel offsets used above four samples.
    pub seed: u64,

    /// Worker threads. `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for RenderSettings {
    fn default() -> RenderSettings {
        RenderSettings {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            samples: 1,
            seed: 0,
            threads: None,
        }
    }
}

/// Temporary settings for a quick, low quality render.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Preview {
    /// Multiplies both image dimensions.
    pub scale: f64,
    pub max_depth: usize,
    pub samples: usize,
}

impl Default for Preview {
    fn default() -> Preview {
        Preview { scale: 0.25, max_depth: 2, samples: 1 }
    }
}

/// What every pixel of one render shares.
#[derive(Copy, Clone, Debug)]
struct Frame {
    width: usize,
    height: usize,
    samples: usize,
    seed: u64,
}

/// Drives rendering of a world through a camera.
///
/// The renderer owns the world and the camera. Both are only read while
/// pixels are being computed: every pixel is a pure function of the world,
/// the camera and its own coordinates, so pixels are evaluated in parallel
/// and the resulting image does not depend on scheduling.
pub struct Renderer {
    world: World,
    camera: Camera,
    settings: RenderSettings,
    observers: Vec<(ObserverId, Box<dyn ProgressObserver>)>,
    next_observer: usize,
}

impl Renderer {
    pub fn new(world: World, camera: Camera, settings: RenderSettings)
        -> Renderer {
        Renderer {
            world,
            camera,
            settings,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    /// Replaces the camera with a perspective camera; `fov` is in degrees.
    ///
    /// The aspect ratio is taken from the current settings, and re-derived
    /// on every render to match the image being produced.
    pub fn set_camera(&mut self, position: Vector3, look_at: Vector3,
        up: Vector3, fov: f64) {
        let aspect = self.settings.width as f64 / self.settings.height as f64;
        self.camera = Camera::look_at(position, look_at, up, fov, aspect);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for building the scene between renders.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: RenderSettings) {
        self.settings = settings;
    }

    /// Registers an observer to be notified of progress on every render.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>)
        -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    /// Unregisters an observer. Returns `false` if it was not registered.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(other, _)| *other != id);
        self.observers.len() != before
    }

    /// Renders an image at the configured resolution.
    pub fn render(&mut self) -> Result<Canvas> {
        let (width, height) = (self.settings.width, self.settings.height);
        self.render_at(width, height)
    }

    /// Renders an image at an explicit resolution.
    ///
    /// Pixels are processed in batches of roughly 1% of the image. Each batch
    /// is traced in parallel, then written into the canvas by the calling
    /// thread, which also notifies observers.
    pub fn render_at(&mut self, width: usize, height: usize) -> Result<Canvas> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyImage { width, height });
        }
        let total = width.checked_mul(height)
            .filter(|total| *total <= isize::MAX as usize / mem::size_of::<Color>())
            .ok_or(RenderError::ImageTooLarge { width, height })?;
        if self.settings.samples == 0 {
            return Err(RenderError::InvalidSamples);
        }

        let pool = match self.settings.threads {
            Some(threads) => Some(ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?),
            None => None,
        };

        let frame = Frame {
            width,
            height,
            samples: self.settings.samples,
            seed: self.settings.seed,
        };
        let camera = self.camera.with_aspect_ratio(width as f64 / height as f64);
        let world = &self.world;

        info!("rendering {}x{} at {} sample(s) per pixel, max depth {}",
            width, height, frame.samples, world.max_depth());

        let start = Instant::now();
        let batch = (total / 100).max(1);
        let mut canvas = Canvas::new(width, height);

        let mut done = 0;
        while done < total {
            let end = (done + batch).min(total);

            let colors: Vec<Color> = in_pool(pool.as_ref(), || {
                (done..end)
                    .into_par_iter()
                    .map(|i| render_pixel(world, &camera, &frame,
                        i % width, i / width))
                    .collect()
            });

            for (i, color) in (done..end).zip(colors) {
                canvas.write_pixel(i % width, i / width, color);
            }

            done = end;
            for (_, observer) in self.observers.iter_mut() {
                observer.on_progress(done, total);
            }
        }

        let elapsed = start.elapsed();
        debug!("rendered {} pixels in {:?}", total, elapsed);
        for (_, observer) in self.observers.iter_mut() {
            observer.on_complete(elapsed);
        }

        Ok(canvas)
    }

    /// Renders a reduced quality version of the image.
    ///
    /// The configured resolution is scaled by `preview.scale` (never below a
    /// single pixel), and the world's maximum depth and the sample count are
    /// replaced for the duration of the render. The original values are
    /// restored afterwards, whether or not the render succeeded.
    pub fn render_preview(&mut self, preview: Preview) -> Result<Canvas> {
        if !preview.scale.is_finite() || preview.scale <= 0.0 {
            return Err(RenderError::InvalidPreviewScale(preview.scale));
        }

        let width = ((self.settings.width as f64 * preview.scale) as usize).max(1);
        let height = ((self.settings.height as f64 * preview.scale) as usize).max(1);

        let max_depth = self.world.max_depth();
        let samples = self.settings.samples;

        self.world.set_max_depth(preview.max_depth);
        self.settings.samples = preview.samples;

        let result = self.render_at(width, height);

        self.world.set_max_depth(max_depth);
        self.settings.samples = samples;

        result
    }
}

/// Runs `op` inside `pool`, or on rayon's global pool without one.
fn in_pool<R, F>(pool: Option<&ThreadPool>, op: F) -> R
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

/// Sub-pixel sample positions, for up to four samples.
fn fixed_offsets(samples: usize) -> &'static [(f64, f64)] {
    match samples {
        2 => &[(0.25, 0.25), (0.75, 0.75)],
        3 => &[(0.5, 0.25), (0.25, 0.75), (0.75, 0.75)],
        _ => &[(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)],
    }
}

/// Computes the color of one pixel.
///
/// A single sample traces through the pixel coordinate itself. Up to four
/// samples use fixed offsets inside the pixel. Beyond that the offsets are
/// random, drawn from a generator seeded by the frame seed and the pixel's
/// position, so a pixel always gets the same samples.
fn render_pixel(world: &World, camera: &Camera, frame: &Frame, x: usize,
    y: usize) -> Color {
    let (px, py) = (x as f64, y as f64);
    let trace = |dx: f64, dy: f64| {
        let ray = camera.ray_for_pixel(px + dx, py + dy,
            frame.width, frame.height);
        world.trace(&ray, 0)
    };

    let colors: Vec<Color> = match frame.samples {
        0 | 1 => return trace(0.0, 0.0),
        n @ 2..=4 => fixed_offsets(n).iter()
            .take(n)
            .map(|&(dx, dy)| trace(dx, dy))
            .collect(),
        n => {
            let index = (y * frame.width + x) as u64;
            let mut rng = StdRng::seed_from_u64(
                frame.seed ^ index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
            (0..n).map(|_| trace(rng.gen(), rng.gen())).collect()
        }
    };

    Color::average(&colors)
}

/* Tests */

#[cfg(test)]
use std::{ cell::RefCell, rc::Rc, time::Duration };

#[cfg(test)]
use crate::{ light::Light, material::Material };

#[cfg(test)]
fn red_ball(width: usize, height: usize) -> Renderer {
    let mut world = World::new();
    world.add_sphere(Vector3::zero(), 3.0, Material::matte(Color::rgb(255, 0, 0)));
    world.add_light(Light::point(Vector3::new(0.0, 0.0, -100.0), 1.0));

    let settings = RenderSettings { width, height, ..Default::default() };
    Renderer::new(world, Camera::default(), settings)
}

#[cfg(test)]
fn glass_scene(settings: RenderSettings) -> Renderer {
    let mut world = World::new();
    world.seed_default_lights();
    world.add_sphere(Vector3::new(0.0, 0.0, 5.0), 3.0,
        Material::preset("glass").unwrap());
    world.add_sphere(Vector3::new(2.0, 1.0, 12.0), 4.0,
        Material::preset("chrome").unwrap());
    world.add_triangle(Vector3::new(-20.0, 5.0, 0.0), Vector3::new(20.0, 5.0, 0.0),
        Vector3::new(0.0, 5.0, 40.0), Material::preset("green").unwrap());

    let mut r = Renderer::new(world, Camera::default(), settings);
    r.set_camera(Vector3::new(0.0, 0.0, -10.0), Vector3::new(0.0, 0.0, 5.0),
        Vector3::new(0.0, 1.0, 0.0), 60.0);
    r
}

#[cfg(test)]
#[derive(Default)]
struct Recorder {
    progress: Vec<(usize, usize)>,
    completions: usize,
}

#[cfg(test)]
struct Shared(Rc<RefCell<Recorder>>);

#[cfg(test)]
impl ProgressObserver for Shared {
    fn on_progress(&mut self, completed: usize, total: usize) {
        self.0.borrow_mut().progress.push((completed, total));
    }

    fn on_complete(&mut self, _elapsed: Duration) {
        self.0.borrow_mut().completions += 1;
    }
}

#[test]
fn render_sphere_through_simple_camera() {
    let mut r = red_ball(10, 10);
    let canvas = r.render().unwrap();

    assert_eq!((canvas.width, canvas.height), (10, 10));
    assert_eq!(canvas.read_pixel(5, 5), Some(Color::rgb(255, 0, 0)));
    assert_eq!(canvas.read_pixel(0, 0), Some(r.world().background()));
}

#[test]
fn render_sphere_lit_from_above() {
    let mut r = red_ball(10, 10);
    r.world_mut().set_lights(vec![
        Light::point(Vector3::new(0.0, -100.0, 0.0), 1.0)]);

    let canvas = r.render().unwrap();

    // The top of the sphere catches the light, the middle only ambient
    let top = canvas.read_pixel(5, 3).unwrap();
    let middle = canvas.read_pixel(5, 5).unwrap();
    assert_eq!(middle, Color::rgb(51, 0, 0));
    assert!(top.r > middle.r);
    assert_eq!((top.g, top.b), (0, 0));
    assert_eq!(canvas.read_pixel(9, 9), Some(r.world().background()));
}

#[test]
fn render_at_overrides_resolution() {
    let mut r = red_ball(10, 10);
    let canvas = r.render_at(4, 2).unwrap();

    assert_eq!((canvas.width, canvas.height), (4, 2));
    assert_eq!(r.settings().width, 10);
}

#[test]
fn empty_image_is_an_error() {
    let mut r = red_ball(0, 10);

    assert!(matches!(r.render(),
        Err(RenderError::EmptyImage { width: 0, height: 10 })));
    assert!(matches!(r.render_at(3, 0), Err(RenderError::EmptyImage { .. })));
}

#[test]
fn oversized_image_is_an_error() {
    let mut r = red_ball(usize::MAX / 2 + 1, 2);
    assert!(matches!(r.render(), Err(RenderError::ImageTooLarge { height: 2, .. })));

    // The pixel count fits in a usize, but the buffer would not fit in memory
    assert!(matches!(r.render_at(usize::MAX / 3, 2),
        Err(RenderError::ImageTooLarge { .. })));

    let mut r = red_ball(10, 10);
    let huge = r.render_preview(Preview { scale: 1e300, ..Default::default() });
    assert!(matches!(huge, Err(RenderError::ImageTooLarge { .. })));
    assert_eq!(r.settings().samples, 1);
    assert_eq!(r.world().max_depth(), 5);
}

#[test]
fn zero_samples_is_an_error() {
    let mut r = red_ball(4, 4);
    let settings = RenderSettings { samples: 0, ..*r.settings() };
    r.set_settings(settings);

    assert!(matches!(r.render(), Err(RenderError::InvalidSamples)));
}

#[test]
fn image_is_independent_of_thread_count() {
    let base = RenderSettings { width: 24, height: 16, samples: 6, seed: 7,
        threads: Some(1) };

    let single = glass_scene(base).render().unwrap();
    let several = glass_scene(RenderSettings { threads: Some(3), ..base })
        .render().unwrap();
    let global = glass_scene(RenderSettings { threads: None, ..base })
        .render().unwrap();

    assert_eq!(single, several);
    assert_eq!(single, global);
}

#[test]
fn fixed_sampling_is_deterministic() {
    let settings = RenderSettings { width: 12, height: 8, samples: 4,
        seed: 0, threads: None };

    let a = glass_scene(settings).render().unwrap();
    let b = glass_scene(settings).render().unwrap();
    assert_eq!(a, b);
}

#[test]
fn uniform_background_survives_averaging() {
    for samples in 1..=6 {
        let settings = RenderSettings { width: 3, height: 3, samples,
            seed: 1, threads: None };
        let mut r = Renderer::new(World::new(), Camera::default(), settings);

        let canvas = r.render().unwrap();
        assert!(canvas.pixels().iter().all(|p| *p == r.world().background()));
    }
}

#[test]
fn sample_offsets_stay_inside_the_pixel() {
    for n in 2..=4 {
        let offsets = fixed_offsets(n);
        assert_eq!(offsets.len(), n);
        assert!(offsets.iter()
            .all(|&(dx, dy)| (0.0..1.0).contains(&dx) && (0.0..1.0).contains(&dy)));
    }
}

#[test]
fn observers_see_every_batch() {
    let record = Rc::new(RefCell::new(Recorder::default()));
    let mut r = red_ball(20, 20);
    r.add_observer(Box::new(Shared(record.clone())));

    r.render().unwrap();

    let record = record.borrow();
    assert_eq!(record.progress.len(), 100);
    assert_eq!(record.progress[0], (4, 400));
    assert_eq!(record.progress.last(), Some(&(400, 400)));
    assert_eq!(record.completions, 1);
}

#[test]
fn small_images_report_every_pixel() {
    let record = Rc::new(RefCell::new(Recorder::default()));
    let mut r = red_ball(3, 2);
    r.add_observer(Box::new(Shared(record.clone())));

    r.render().unwrap();

    let progress: Vec<usize> = record.borrow().progress.iter()
        .map(|(done, _)| *done)
        .collect();
    assert_eq!(progress, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn removed_observers_are_not_notified() {
    let record = Rc::new(RefCell::new(Recorder::default()));
    let mut r = red_ball(4, 4);
    let id = r.add_observer(Box::new(Shared(record.clone())));

    assert!(r.remove_observer(id));
    assert!(!r.remove_observer(id));

    r.render().unwrap();
    assert!(record.borrow().progress.is_empty());
    assert_eq!(record.borrow().completions, 0);
}

#[test]
fn preview_scales_and_restores() {
    let settings = RenderSettings { width: 10, height: 7, samples: 4,
        seed: 0, threads: None };
    let mut r = glass_scene(settings);
    let camera = *r.camera();

    let canvas = r.render_preview(Preview { scale: 0.25, max_depth: 1,
        samples: 1 }).unwrap();

    // 10x7 scales down to 2x1, so the camera is refitted to a 2:1 frame
    assert_eq!((canvas.width, canvas.height), (2, 1));
    let fitted = camera.with_aspect_ratio(2.0);
    assert_ne!(fitted, camera);

    let mut world = r.world().clone();
    world.set_max_depth(1);
    for x in 0..2 {
        let ray = fitted.ray_for_pixel(x as f64, 0.0, 2, 1);
        assert_eq!(canvas.read_pixel(x, 0), Some(world.trace(&ray, 0)));
    }

    assert_eq!(*r.settings(), settings);
    assert_eq!(r.world().max_depth(), 5);
    assert_eq!(*r.camera(), camera);
}

#[test]
fn tiny_preview_keeps_one_pixel() {
    let mut r = red_ball(10, 10);
    let canvas = r.render_preview(Preview { scale: 0.01, ..Default::default() })
        .unwrap();

    assert_eq!((canvas.width, canvas.height), (1, 1));
}

#[test]
fn failed_preview_still_restores() {
    let mut r = red_ball(10, 10);

    let bad = r.render_preview(Preview { scale: 0.5, max_depth: 1, samples: 0 });
    assert!(matches!(bad, Err(RenderError::InvalidSamples)));
    assert_eq!(r.settings().samples, 1);
    assert_eq!(r.world().max_depth(), 5);

    for scale in [0.0, -1.0, f64::NAN, f64::INFINITY].iter() {
        let bad = r.render_preview(Preview { scale: *scale, ..Default::default() });
        assert!(matches!(bad, Err(RenderError::InvalidPreviewScale(_))));
    }
}
