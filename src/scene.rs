use std::fs;
use std::path::Path;

use serde::{ Serialize, Deserialize };

use crate::error::RenderError;
use crate::color::Color;
use crate::vector::Vector3;
use crate::light::{ Light, Albedo, Material };
use crate::geometry::{ Sphere, Plane };
use crate::consts::{ VACUUM_RI, GLASS_RI };

/// Everything that can be seen: geometry, lights and what lies behind them.
///
/// A scene is built once and then only read; every render worker gets its
/// own copy.
///
/// Scenes load from JSON. Vectors are three-element arrays; colours are
/// arrays or `{r, g, b}` objects:
///
/// ```
/// # use chunk_tracer::scene::Scene;
/// let scene: Scene = serde_json::from_str(r#"{
///     "spheres": [],
///     "planes": [],
///     "lights": [{ "position": [0, 10, 0], "intensity": 1.5 }],
///     "backgroundColour": [0, 128, 128]
/// }"#).unwrap();
/// assert_eq!(scene.lights.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub spheres: Vec<Sphere>,
    #[serde(default)]
    pub planes: Vec<Plane>,
    #[serde(default)]
    pub lights: Vec<Light>,
    pub background_colour: Color,
}

impl Scene {
    /// Creates an empty scene with a black background.
    pub fn empty() -> Scene {
        Default::default()
    }

    /// Whether every number in the scene is finite.
    ///
    /// JSON has no way to write NaN or infinity, so only finite scenes can
    /// be sent to render workers.
    pub fn is_finite(&self) -> bool {
        self.spheres.iter().all(Sphere::is_finite)
            && self.planes.iter().all(Plane::is_finite)
            && self.lights.iter().all(Light::is_finite)
            && self.background_colour.is_finite()
    }

    /// Reads a scene description from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Scene, RenderError> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| RenderError::SceneParse(e.to_string()))
    }

    /// The benchmark scene: two dozen small spheres scattered over a long
    /// checkerboard floor, a few mirrors and glass marbles among them, lit by
    /// a strong and a weak light.
    pub fn benchmark() -> Scene {
        let sphere = |radius: f64, x: f64, y: f64, z: f64, m: Material| {
            Sphere::new(Vector3::new(x, y, z), radius, m)
        };

        let spheres = vec![
            sphere(1.0, -6.5, -3.0, -26.0, matte(27.0, 118.0, 255.0)),
            sphere(1.0, -14.0, -3.0, -25.0, matte(146.0, 80.0, 188.0)),
            sphere(1.0, -10.0, -3.0, -25.0, matte(0.0, 146.0, 178.0)),
            sphere(1.0, -10.0, -3.0, -20.0, matte(185.0, 18.0, 27.0)),
            sphere(1.0, -2.5, -3.0, -20.0, matte(115.0, 45.0, 217.0)),
            sphere(2.0, -10.5, -2.0, -16.0, mirror()),
            sphere(1.0, -3.0, -3.0, -16.0, matte(247.0, 178.0, 173.0)),
            sphere(1.0, -6.0, -3.0, -18.0, matte(154.0, 188.0, 167.0)),
            sphere(1.0, -6.0, -3.0, -12.0, matte(96.0, 125.0, 139.0)),
            sphere(1.0, -9.5, -3.0, -12.0, matte(122.0, 186.0, 242.0)),
            sphere(1.0, 0.0, -3.0, -14.0, matte(250.0, 91.0, 15.0)),
            sphere(1.0, -3.0, -3.0, -11.0, glass()),
            sphere(1.0, -1.0, -3.0, -10.0, matte(54.0, 95.0, 182.0)),
            sphere(1.0, -4.5, -3.0, -8.0, matte(139.0, 195.0, 74.0)),
            sphere(4.0, 4.0, 0.0, -18.0, mirror()),
            sphere(1.0, 4.0, -3.0, -12.0, matte(115.0, 45.0, 217.0)),
            sphere(1.5, 8.5, -2.5, -10.0, mirror()),
            sphere(1.0, 1.0, -3.0, -11.5, matte(255.0, 200.0, 0.0)),
            sphere(1.0, 1.2, -3.0, -8.2, glass()),
            sphere(1.0, 4.0, -3.0, -7.0, matte(244.0, 67.0, 54.0)),
            sphere(1.0, 5.5, -3.0, -9.5, matte(150.0, 237.0, 137.0)),
            sphere(1.0, 6.5, -3.0, -15.0, matte(14.0, 234.0, 255.0)),
            sphere(1.0, 10.0, -3.0, -16.0, matte(171.0, 71.0, 188.0)),
            sphere(1.0, 11.0, -3.0, -20.0, matte(190.0, 189.0, 191.0)),
        ];

        let planes = vec![
            Plane::new(-4.0, 50.0, 40.0, -45.0, 1.5,
                Color::rgb(116.0, 101.0, 87.0),
                Color::rgb(92.0, 78.0, 70.0)),
        ];

        let lights = vec![
            Light::new(Vector3::new(30.0, 50.0, 40.0), 2.5),
            Light::new(Vector3::new(-20.0, 50.0, -25.0), 0.5),
        ];

        Scene {
            spheres,
            planes,
            lights,
            background_colour: Color::rgb(221.0, 221.0, 221.0),
        }
    }

    /// A small showcase: four large spheres (plaster, glass, rubber and a
    /// mirror) over a checkerboard, with three lights.
    pub fn showcase() -> Scene {
        let plaster = Material::new(Color::rgb(102.0, 102.0, 77.0),
            Albedo::new(0.6, 0.3, 0.1, 0.0), 50.0, VACUUM_RI);
        let rubber = Material::new(Color::rgb(77.0, 26.0, 26.0),
            Albedo::new(0.9, 0.1, 0.0, 0.0), 10.0, VACUUM_RI);
        let mirror = Material::new(Color::rgb(193.0, 193.0, 193.0),
            Albedo::new(0.0, 10.0, 0.8, 0.0), 1000.0, VACUUM_RI);

        Scene {
            spheres: vec![
                Sphere::new(Vector3::new(-3.0, 0.0, -16.0), 2.0, plaster),
                Sphere::new(Vector3::new(-1.0, -1.5, -12.0), 2.0, glass()),
                Sphere::new(Vector3::new(1.5, -0.5, -18.0), 3.0, rubber),
                Sphere::new(Vector3::new(7.0, 5.0, -18.0), 4.0, mirror),
            ],
            planes: vec![
                Plane::new(-4.0, 10.0, -10.0, -30.0, 0.7,
                    Color::rgb(200.0, 200.0, 200.0),
                    Color::rgb(15.0, 15.0, 15.0)),
            ],
            lights: vec![
                Light::new(Vector3::new(-20.0, 20.0, 20.0), 1.5),
                Light::new(Vector3::new(30.0, 50.0, -25.0), 1.8),
                Light::new(Vector3::new(30.0, 20.0, 30.0), 1.7),
            ],
            background_colour: Color::rgb(0.0, 128.0, 128.0),
        }
    }
}

fn mirror() -> Material {
    Material::new(Color::rgb(220.0, 220.0, 220.0),
        Albedo::new(0.1, 1.0, 0.8, 0.0), 2500.0, VACUUM_RI)
}

fn glass() -> Material {
    Material::new(Color::rgb(153.0, 179.0, 204.0),
        Albedo::new(0.0, 0.5, 0.1, 0.8), 125.0, GLASS_RI)
}

fn matte(r: f64, g: f64, b: f64) -> Material {
    Material::new(Color::rgb(r, g, b),
        Albedo::new(0.4, 0.0, 0.0, 0.0), 0.0, VACUUM_RI)
}

#[test]
fn benchmark_scene_contents() {
    let scene = Scene::benchmark();

    assert_eq!(scene.spheres.len(), 24);
    assert_eq!(scene.planes.len(), 1);
    assert_eq!(scene.lights.len(), 2);
    assert_eq!(scene.background_colour, Color::rgb(221.0, 221.0, 221.0));
}

#[test]
fn scene_json_round_trip_is_lossless() {
    let scene = Scene::showcase();
    let json = serde_json::to_string(&scene).unwrap();
    let back: Scene = serde_json::from_str(&json).unwrap();

    assert_eq!(back, scene);
}

#[test]
fn missing_background_is_a_parse_error() {
    let result = serde_json::from_str::<Scene>(r#"{ "spheres": [] }"#);
    assert!(result.is_err());
}

#[test]
fn scene_file_that_does_not_exist_is_an_io_error() {
    let result = Scene::from_json_file(Path::new("/nonexistent/scene.json"));
    assert!(matches!(result, Err(RenderError::Io(_))));
}
