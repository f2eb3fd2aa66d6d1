pub mod consts;
pub mod error;

pub mod vector;
pub mod ray;
pub mod color;
pub mod light;
pub mod pattern;

pub mod geometry;
pub mod intersect;
pub mod scene;
pub mod camera;
pub mod tracer;

pub mod context;
pub mod chunk;
pub mod allocation;
pub mod canvas;
pub mod worker;
pub mod parallel;
pub mod dispatcher;

pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < consts::FEQ_EPSILON
}
