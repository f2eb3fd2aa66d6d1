use serde::{ Serialize, Deserialize };

use crate::error::RenderError;
use crate::color::Color;
use crate::scene::Scene;
use crate::allocation::ChunkAllocationMode;
use crate::consts::{ DEFAULT_MAX_RECURSE_DEPTH, DEFAULT_MAX_DRAW_DISTANCE,
    SNAPSHOT_VERSION };

/// Switches and limits for a render.
///
/// Field names are camel-cased on the wire. Missing fields take their
/// defaults.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RaytracerOptions {
    pub shadows: bool,
    pub diffuse_lighting: bool,
    pub specular_lighting: bool,
    pub reflections: bool,
    pub refractions: bool,

    /// How many reflection/refraction bounces a camera ray may take.
    pub max_recurse_depth: u32,

    /// Surfaces at or beyond this distance are not drawn.
    pub max_draw_distance: f64,

    pub num_threads: usize,

    /// Edge length of a square chunk, in pixels. Zero picks a size from the
    /// frame height.
    pub chunk_size: u32,
    pub chunk_allocation_mode: ChunkAllocationMode,

    pub chunk_border_colour: Color,
    pub chunk_unrendered_colour: Color,
}

impl Default for RaytracerOptions {
    fn default() -> RaytracerOptions {
        RaytracerOptions {
            shadows: true,
            diffuse_lighting: true,
            specular_lighting: true,
            reflections: true,
            refractions: true,
            max_recurse_depth: DEFAULT_MAX_RECURSE_DEPTH,
            max_draw_distance: DEFAULT_MAX_DRAW_DISTANCE,
            num_threads: 1,
            chunk_size: 0,
            chunk_allocation_mode: ChunkAllocationMode::Sequential,
            chunk_border_colour: Color::rgb(255.0, 255.0, 255.0),
            chunk_unrendered_colour: Color::rgb(40.0, 40.0, 40.0),
        }
    }
}

/// One render request: frame size, camera, scene and options.
///
/// The context is never changed once a render starts. Each worker receives
/// its own decoded copy (see `Snapshot`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RaytraceContext {
    pub width: u32,
    pub height: u32,

    /// Vertical field of view, in radians.
    pub fov: f64,

    pub scene: Scene,
    pub options: RaytracerOptions,
}

impl RaytraceContext {
    pub fn new(width: u32, height: u32, fov: f64, scene: Scene,
        options: RaytracerOptions) -> RaytraceContext {
        RaytraceContext { width, height, fov, scene, options }
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Checks that the request can be rendered at all.
    pub fn validate(&self) -> Result<(), RenderError> {
        let invalid = |msg: String| Err(RenderError::InvalidConfiguration(msg));

        if self.options.num_threads == 0 {
            return invalid("at least one render thread is required".into());
        }

        if self.width == 0 || self.height == 0 {
            return invalid(format!("frame {}x{} has no pixels",
                self.width, self.height));
        }

        if !(self.fov > 0.0 && self.fov < std::f64::consts::PI) {
            return invalid(format!("field of view {} is not in (0, pi)",
                self.fov));
        }

        let draw_distance = self.options.max_draw_distance;
        if !(draw_distance > 0.0 && draw_distance.is_finite()) {
            return invalid(format!(
                "draw distance {} is not a positive finite number",
                draw_distance));
        }

        if !self.options.chunk_border_colour.is_finite()
            || !self.options.chunk_unrendered_colour.is_finite() {
            return invalid("placeholder colours must be finite".into());
        }

        if !self.scene.is_finite() {
            return invalid("scene contains a non-finite number".into());
        }

        Ok(())
    }
}

/// The versioned wire form of a `RaytraceContext`.
///
/// The dispatcher encodes the context once per render; each worker decodes
/// it once, when it starts, into a value it owns outright.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub context: RaytraceContext,
}

impl Snapshot {
    pub fn encode(context: &RaytraceContext) -> Result<String, RenderError> {
        #[derive(Serialize)]
        struct SnapshotRef<'a> {
            version: u32,
            context: &'a RaytraceContext,
        }

        serde_json::to_string(&SnapshotRef {
            version: SNAPSHOT_VERSION,
            context,
        }).map_err(|e| RenderError::SnapshotEncode(e.to_string()))
    }

    pub fn decode(encoded: &str) -> Result<RaytraceContext, RenderError> {
        let snapshot: Snapshot = serde_json::from_str(encoded)
            .map_err(|e| RenderError::SnapshotDecode(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RenderError::SnapshotVersion {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }

        Ok(snapshot.context)
    }
}

#[cfg(test)]
fn test_context() -> RaytraceContext {
    RaytraceContext::new(64, 48, std::f64::consts::PI / 3.0,
        Scene::showcase(), Default::default())
}

#[test]
fn default_context_is_valid() {
    assert!(test_context().validate().is_ok());
}

#[test]
fn zero_threads_is_invalid() {
    let mut ctx = test_context();
    ctx.options.num_threads = 0;

    assert!(matches!(ctx.validate(),
        Err(RenderError::InvalidConfiguration(_))));
}

#[test]
fn zero_area_frame_is_invalid() {
    let mut ctx = test_context();
    ctx.height = 0;
    assert!(ctx.validate().is_err());

    let mut ctx = test_context();
    ctx.width = 0;
    assert!(ctx.validate().is_err());
}

#[test]
fn field_of_view_must_be_open_interval() {
    let mut ctx = test_context();

    ctx.fov = 0.0;
    assert!(ctx.validate().is_err());
    ctx.fov = std::f64::consts::PI;
    assert!(ctx.validate().is_err());
    ctx.fov = f64::NAN;
    assert!(ctx.validate().is_err());
}

#[test]
fn infinite_draw_distance_is_invalid() {
    let mut ctx = test_context();
    ctx.options.max_draw_distance = f64::INFINITY;

    assert!(matches!(ctx.validate(),
        Err(RenderError::InvalidConfiguration(_))));
}

#[test]
fn non_finite_scene_is_invalid() {
    let mut ctx = test_context();
    ctx.scene.spheres[0].radius = f64::NAN;
    assert!(ctx.validate().is_err());

    let mut ctx = test_context();
    ctx.scene.lights[0].intensity = f64::INFINITY;
    assert!(ctx.validate().is_err());

    let mut ctx = test_context();
    ctx.scene.planes[0].z_end = f64::NEG_INFINITY;
    assert!(ctx.validate().is_err());

    let mut ctx = test_context();
    ctx.scene.background_colour = Color::rgb(0.0, f64::NAN, 0.0);
    assert!(ctx.validate().is_err());
}

#[test]
fn every_valid_context_survives_the_snapshot() {
    let mut ctx = test_context();
    ctx.options.max_draw_distance = 1.0e6;
    assert!(ctx.validate().is_ok());

    let encoded = Snapshot::encode(&ctx).unwrap();
    assert!(!encoded.contains("null"));
    assert_eq!(Snapshot::decode(&encoded).unwrap(), ctx);
}

#[test]
fn snapshot_round_trip_is_independent_copy() {
    let ctx = test_context();
    let encoded = Snapshot::encode(&ctx).unwrap();
    let decoded = Snapshot::decode(&encoded).unwrap();

    assert_eq!(decoded, ctx);
}

#[test]
fn snapshot_with_wrong_version_is_rejected() {
    let ctx = test_context();
    let encoded = Snapshot::encode(&ctx).unwrap()
        .replacen(&format!("\"version\":{}", SNAPSHOT_VERSION),
            "\"version\":999", 1);

    assert!(matches!(Snapshot::decode(&encoded),
        Err(RenderError::SnapshotVersion { found: 999, .. })));
}

#[test]
fn garbage_snapshot_fails_to_decode() {
    assert!(matches!(Snapshot::decode("{ not json"),
        Err(RenderError::SnapshotDecode(_))));
}

#[test]
fn options_fill_missing_fields_with_defaults() {
    let opts: RaytracerOptions = serde_json::from_str(
        r#"{ "numThreads": 4, "shadows": false,
             "chunkAllocationMode": "centerToEdge" }"#).unwrap();

    assert_eq!(opts.num_threads, 4);
    assert!(!opts.shadows);
    assert!(opts.reflections);
    assert_eq!(opts.chunk_allocation_mode, ChunkAllocationMode::CenterToEdge);
}
