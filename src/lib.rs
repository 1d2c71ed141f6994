pub mod consts;
pub mod error;

pub mod vector;
pub mod color;
pub mod ray;

pub mod material;
pub mod shape;
pub mod light;
pub mod intersect;

pub mod world;
pub mod camera;
pub mod canvas;

pub mod progress;
pub mod render;
pub mod scene;

pub use error::{ RenderError, Result };

use consts::FEQ_EPSILON;

pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}
