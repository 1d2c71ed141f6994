use std::path::{ Path, PathBuf };

use clap::Parser;
use log::info;

use refract::Result;
use refract::canvas::Canvas;
use refract::progress::LogProgress;
use refract::render::{ Preview, RenderSettings };
use refract::scene::Scene;

/// Renders a JSON scene description to a PPM image.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// The scene file to render.
    #[clap(value_name = "SCENE", parse(from_os_str))]
    scene: PathBuf,

    #[clap(long, default_value_t = 1200)]
    width: usize,

    #[clap(long, default_value_t = 800)]
    height: usize,

    /// Rays per pixel, averaged.
    #[clap(long, default_value_t = 1)]
    samples: usize,

    /// Worker threads [default: all cores]
    #[clap(long)]
    threads: Option<usize>,

    /// Seed for random sub-pixel sampling.
    #[clap(long, default_value_t = 0)]
    seed: u64,

    /// Render a scaled down preview first.
    #[clap(long, value_name = "SCALE", min_values = 0,
        default_missing_value = "0.25")]
    preview: Option<f64>,

    /// Maximum recursion depth for the preview.
    #[clap(long, default_value_t = 2)]
    depth: usize,

    /// Also render at full quality after the preview.
    #[clap(long)]
    full: bool,

    /// Where to write the image [default: <SCENE stem>.ppm]
    #[clap(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

/// The output path with `suffix` appended to its file stem.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    path.with_file_name(format!("{}{}.ppm", stem, suffix))
}

fn save(canvas: &Canvas, path: &Path) -> Result<()> {
    canvas.save_ppm(path)?;
    info!("wrote {}x{} image to {}", canvas.width, canvas.height,
        path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let output = match args.output {
        Some(ref output) => output.clone(),
        None => with_suffix(&args.scene, ""),
    };

    let settings = RenderSettings {
        width: args.width,
        height: args.height,
        samples: args.samples,
        seed: args.seed,
        threads: args.threads,
    };

    let scene = Scene::load(&args.scene)?;
    let mut renderer = scene.into_renderer(settings);
    renderer.add_observer(Box::new(LogProgress::default()));

    if let Some(scale) = args.preview {
        let preview = Preview { scale, max_depth: args.depth, samples: 1 };
        let canvas = renderer.render_preview(preview)?;
        save(&canvas, &with_suffix(&output, "_preview"))?;

        if !args.full {
            return Ok(());
        }
    }

    let canvas = renderer.render()?;
    save(&canvas, &output)
}
