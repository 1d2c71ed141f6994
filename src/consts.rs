// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.0001;

// Intersection and offset tolerances
pub const TRIANGLE_EPSILON: f64 = 0.0000001;
pub const SURFACE_OFFSET: f64 = 0.001;

// Shadow ray transparency walk
pub const MAX_SHADOW_BOUNCES: usize = 10;
pub const SHADOW_CUTOFF: f64 = 0.01;

// World defaults
pub const DEFAULT_AMBIENT: f64 = 0.2;
pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_BACKGROUND: (u8, u8, u8) = (70, 130, 180);

// Runtime parameters
pub const DEFAULT_WIDTH: usize = 1200;
pub const DEFAULT_HEIGHT: usize = 800;
pub const SIMPLE_CAMERA_Z: f64 = 500.0;

// Common refraction indices
pub const VACUUM_RI: f64 = 1.0;
pub const WATER_RI: f64 = 1.33;
pub const GLASS_RI: f64 = 1.5;
pub const RUBY_RI: f64 = 1.77;
pub const DIAMOND_RI: f64 = 2.42;
