// Runtime defaults
pub const DEFAULT_WIDTH: u32 = 960;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const DEFAULT_FOV: f64 = std::f64::consts::PI / 3.0;
pub const DEFAULT_OUT_FILE: &str = "./out.ppm";
pub const DEFAULT_MAX_RECURSE_DEPTH: u32 = 5;
pub const DEFAULT_MAX_DRAW_DISTANCE: f64 = 1000.0;

// Benchmark frame
pub const BENCHMARK_WIDTH: u32 = 1920;
pub const BENCHMARK_HEIGHT: u32 = 1080;

// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.0001;

// Surface offsets, parallel-ray rejection and normalisation threshold
pub const EPSILON: f64 = 0.001;

// Starting distance for the nearest-hit search
pub const HIT_SENTINEL: f64 = 99999.0;

// Automatic chunk sizing: frames up to this height use the small tier
pub const AUTO_CHUNK_HEIGHT_THRESHOLD: u32 = 720;
pub const AUTO_CHUNK_SIZE_SMALL: u32 = 32;
pub const AUTO_CHUNK_SIZE_LARGE: u32 = 64;

// Placeholder border is one pixel per this many pixels of chunk size
pub const CHUNK_BORDER_DIVISOR: u32 = 16;

// Scene snapshot wire format
pub const SNAPSHOT_VERSION: u32 = 1;

// Common refraction indices
pub const VACUUM_RI: f64 = 1.0;
pub const GLASS_RI: f64 = 1.5;
