use serde::{ Serialize, Deserialize };

use crate::color::Color;
use crate::vector::Vector3;
use crate::consts::VACUUM_RI;

/// A point light.
///
/// Light leaves `position` with the same `intensity` in every direction and
/// does not fall off with distance. Distance only matters for deciding
/// whether something sits between a surface and the light.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vector3,
    pub intensity: f64,
}

impl Light {
    pub fn new(position: Vector3, intensity: f64) -> Light {
        Light { position, intensity }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.intensity.is_finite()
    }
}

/// How much each kind of light contributes to a material's final color.
///
/// The four weights are independent; they need not sum to one, so a material
/// can reflect more light than it receives.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Albedo {
    pub diffuse: f64,
    pub specular: f64,
    pub reflection: f64,
    pub refraction: f64,
}

impl Albedo {
    pub fn new(diffuse: f64, specular: f64, reflection: f64, refraction: f64)
        -> Albedo {
        Albedo { diffuse, specular, reflection, refraction }
    }

    pub fn is_finite(&self) -> bool {
        self.diffuse.is_finite()
            && self.specular.is_finite()
            && self.reflection.is_finite()
            && self.refraction.is_finite()
    }
}

/// A material record.
///
/// `refractive_index` is only consulted when `albedo.refraction` is non-zero.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub diffuse_colour: Color,
    pub albedo: Albedo,
    pub specular_exponent: f64,
    pub refractive_index: f64,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            diffuse_colour: Color::rgb(255.0, 255.0, 255.0),
            albedo: Albedo::new(1.0, 0.0, 0.0, 0.0),
            specular_exponent: 0.0,
            refractive_index: VACUUM_RI,
        }
    }
}

impl Material {
    pub fn new(diffuse_colour: Color, albedo: Albedo, specular_exponent: f64,
        refractive_index: f64) -> Material {
        Material { diffuse_colour, albedo, specular_exponent, refractive_index }
    }

    /// Whether every number in the material is finite.
    pub fn is_finite(&self) -> bool {
        self.diffuse_colour.is_finite()
            && self.albedo.is_finite()
            && self.specular_exponent.is_finite()
            && self.refractive_index.is_finite()
    }

    /// A flat, fully diffuse material, as used for checkerboard squares.
    pub fn flat(diffuse_colour: Color) -> Material {
        Material { diffuse_colour, ..Default::default() }
    }
}

/// Accumulated light intensities at a single point.
///
/// Each unshadowed light adds its share through `Illumination::add_light`;
/// the sums are then weighted by a material's albedo.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Illumination {
    pub diffuse: f64,
    pub specular: f64,
}

impl Illumination {
    pub fn new() -> Illumination {
        Default::default()
    }

    /// Adds one light's Phong diffuse and specular contributions.
    ///
    /// `lightv` points from the surface towards the light, `normalv` is the
    /// surface normal and `eyev` points from the surface back towards the
    /// viewer. All three are expected to be unit vectors.
    pub fn add_light(&mut self, light: &Light, lightv: Vector3,
        normalv: Vector3, eyev: Vector3, specular_exponent: f64) {
        self.diffuse += light.intensity * lightv.dot(&normalv).max(0.0);

        let reflectv = (-lightv).reflect(&normalv);
        let reflect_dot_eye = reflectv.dot(&eyev).max(0.0);
        self.specular += light.intensity
            * reflect_dot_eye.powf(specular_exponent);
    }
}

#[test]
fn light_facing_surface_gives_full_diffuse() {
    let light = Light::new(Vector3::new(0.0, 10.0, 0.0), 1.5);
    let mut ill = Illumination::new();

    ill.add_light(&light,
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        50.0);

    assert_eq!(ill.diffuse, 1.5);
    assert_eq!(ill.specular, 1.5);
}

#[test]
fn light_behind_surface_contributes_nothing() {
    let light = Light::new(Vector3::new(0.0, -10.0, 0.0), 2.0);
    let mut ill = Illumination::new();

    ill.add_light(&light,
        Vector3::new(0.0, -1.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        10.0);

    assert_eq!(ill.diffuse, 0.0);
    assert_eq!(ill.specular, 0.0);
}

#[test]
fn light_at_45_degrees() {
    let light = Light::new(Vector3::new(10.0, 10.0, 0.0), 1.0);
    let mut ill = Illumination::new();
    let lightv = Vector3::new(1.0, 1.0, 0.0).normalize();

    // Eye sits on the mirror direction of the light.
    let eyev = Vector3::new(-1.0, 1.0, 0.0).normalize();
    ill.add_light(&light, lightv, Vector3::new(0.0, 1.0, 0.0), eyev, 125.0);

    assert!(crate::feq(ill.diffuse, (0.5f64).sqrt()));
    assert!(crate::feq(ill.specular, 1.0));
}

#[test]
fn illumination_accumulates_across_lights() {
    let a = Light::new(Vector3::new(0.0, 10.0, 0.0), 1.0);
    let b = Light::new(Vector3::new(0.0, 20.0, 0.0), 0.5);
    let up = Vector3::new(0.0, 1.0, 0.0);
    let side = Vector3::new(1.0, 0.0, 0.0);
    let mut ill = Illumination::new();

    ill.add_light(&a, up, up, side, 10.0);
    ill.add_light(&b, up, up, side, 10.0);

    assert_eq!(ill.diffuse, 1.5);
    assert_eq!(ill.specular, 0.0);
}

#[test]
fn material_reads_camel_case_json() {
    let json = r#"{
        "diffuseColour": [153, 179, 204],
        "albedo": { "diffuse": 0.0, "specular": 0.5,
                    "reflection": 0.1, "refraction": 0.8 },
        "specularExponent": 125,
        "refractiveIndex": 1.5
    }"#;
    let m: Material = serde_json::from_str(json).unwrap();

    assert_eq!(m.diffuse_colour, Color::rgb(153.0, 179.0, 204.0));
    assert_eq!(m.albedo, Albedo::new(0.0, 0.5, 0.1, 0.8));
    assert_eq!(m.specular_exponent, 125.0);
}
