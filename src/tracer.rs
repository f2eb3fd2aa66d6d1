use crate::color::Color;
use crate::ray::Ray;
use crate::scene::Scene;
use crate::context::RaytracerOptions;
use crate::light::{ Light, Illumination };
use crate::intersect::{ Hit, nearest_hit };

#[cfg(test)]
use crate::vector::Vector3;

/// The recursive shading kernel.
///
/// A tracer only borrows its scene and options; it is cheap to build and
/// holds no state between rays.
pub struct Tracer<'a> {
    pub scene: &'a Scene,
    pub options: &'a RaytracerOptions,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a Scene, options: &'a RaytracerOptions) -> Tracer<'a> {
        Tracer { scene, options }
    }

    /// Determines the color seen along a ray.
    ///
    /// `depth` counts the reflection/refraction bounces taken so far. Past
    /// `max_recurse_depth`, or when nothing is hit within the draw distance,
    /// the background shows through.
    pub fn trace(&self, ray: &Ray, depth: u32) -> Color {
        if depth > self.options.max_recurse_depth {
            return self.scene.background_colour;
        }

        match nearest_hit(self.scene, ray, self.options.max_draw_distance) {
            None => self.scene.background_colour,
            Some(hit) => self.shade(ray, &hit, depth),
        }
    }

    /// Calculates the color at a hit from direct light plus any reflected
    /// and refracted light.
    fn shade(&self, ray: &Ray, hit: &Hit, depth: u32) -> Color {
        let material = &hit.material;
        let eyev = -ray.direction;

        let mut ill = Illumination::new();
        for light in self.scene.lights.iter() {
            let lightv = (light.position - hit.point).normalize();
            if !self.is_shadow_cast(hit, light) {
                ill.add_light(light, lightv, hit.normalv, eyev,
                    material.specular_exponent);
            }
        }

        let diffuse_intensity = if self.options.diffuse_lighting {
            ill.diffuse
        } else {
            1.0
        };

        let mut color = material.diffuse_colour
            * material.albedo.diffuse
            * diffuse_intensity;

        if self.options.specular_lighting {
            color = color
                + Color::white() * material.albedo.specular * ill.specular;
        }

        // Secondary rays are only cast while there is depth left for them;
        // otherwise they contribute nothing.
        let can_bounce = depth < self.options.max_recurse_depth;

        if self.options.reflections && can_bounce {
            color = color
                + self.reflection_color(ray, hit, depth)
                    * material.albedo.reflection;
        }

        if self.options.refractions && can_bounce {
            color = color
                + self.refraction_color(ray, hit, depth)
                    * material.albedo.refraction;
        }

        color
    }

    fn reflection_color(&self, ray: &Ray, hit: &Hit, depth: u32) -> Color {
        let reflectv = ray.direction.reflect(&hit.normalv);
        let reflected = Ray::offset_from(hit.point, hit.normalv, reflectv);

        self.trace(&reflected, depth + 1)
    }

    fn refraction_color(&self, ray: &Ray, hit: &Hit, depth: u32) -> Color {
        let refractv = ray.direction
            .refract(&hit.normalv, hit.material.refractive_index);

        // Total internal reflection: no light gets through.
        if refractv.is_zero() {
            return Color::black();
        }

        let refracted = Ray::offset_from(hit.point, hit.normalv, refractv);
        self.trace(&refracted, depth + 1)
    }

    /// Determines whether something blocks the light reaching a hit.
    ///
    /// A shadow ray is cast from just off the surface, on the side facing
    /// the light. The point is in shadow if that ray hits anything closer
    /// than the light itself. Always false when shadows are disabled.
    pub fn is_shadow_cast(&self, hit: &Hit, light: &Light) -> bool {
        if !self.options.shadows {
            return false;
        }

        let to_light = light.position - hit.point;
        let light_distance = to_light.norm();
        let lightv = to_light.normalize();

        let shadow_ray = Ray::offset_from(hit.point, hit.normalv, lightv);

        match nearest_hit(self.scene, &shadow_ray,
            self.options.max_draw_distance) {
            Some(blocker) => {
                (blocker.point - shadow_ray.origin).norm() < light_distance
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod test_scenes {
    use super::*;
    use crate::geometry::Sphere;
    use crate::light::{ Albedo, Material };

    pub fn matte_red() -> Material {
        Material::new(Color::rgb(200.0, 0.0, 0.0),
            Albedo::new(1.0, 0.0, 0.0, 0.0), 0.0, 1.0)
    }

    /// A unit sphere at (0, 0, -10) lit from straight above.
    pub fn lone_sphere(material: Material) -> Scene {
        let mut scene = Scene::empty();
        scene.background_colour = Color::rgb(0.0, 0.0, 255.0);
        scene.spheres.push(Sphere::new(Vector3::new(0.0, 0.0, -10.0), 1.0,
            material));
        scene.lights.push(Light::new(Vector3::new(0.0, 20.0, -10.0), 1.0));
        scene
    }

    pub fn hit_on_top(scene: &Scene) -> Hit {
        let ray = Ray::new(Vector3::new(0.0, 5.0, -10.0),
            Vector3::new(0.0, -1.0, 0.0));
        nearest_hit(scene, &ray, 1000.0).unwrap()
    }
}

#[test]
fn miss_shows_background() {
    let scene = test_scenes::lone_sphere(test_scenes::matte_red());
    let options = RaytracerOptions::default();
    let tracer = Tracer::new(&scene, &options);

    let ray = Ray::new(Vector3::zero(), Vector3::new(0.0, 1.0, 0.0));
    assert_eq!(tracer.trace(&ray, 0), Color::rgb(0.0, 0.0, 255.0));
}

#[test]
fn too_deep_shows_background() {
    let scene = test_scenes::lone_sphere(test_scenes::matte_red());
    let options = RaytracerOptions::default();
    let tracer = Tracer::new(&scene, &options);

    let ray = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0));
    assert_eq!(tracer.trace(&ray, options.max_recurse_depth + 1),
        scene.background_colour);
}

#[test]
fn unoccluded_point_is_lit() {
    let scene = test_scenes::lone_sphere(test_scenes::matte_red());
    let options = RaytracerOptions::default();
    let tracer = Tracer::new(&scene, &options);

    let hit = test_scenes::hit_on_top(&scene);
    assert_eq!(hit.point, Vector3::new(0.0, 1.0, -10.0));
    assert!(!tracer.is_shadow_cast(&hit, &scene.lights[0]));
}

#[test]
fn occluding_sphere_casts_shadow() {
    use crate::geometry::Sphere;

    let mut scene = test_scenes::lone_sphere(test_scenes::matte_red());
    let hit = test_scenes::hit_on_top(&scene);

    scene.spheres.push(Sphere::new(Vector3::new(0.0, 10.0, -10.0), 1.0,
        test_scenes::matte_red()));

    let options = RaytracerOptions::default();
    let tracer = Tracer::new(&scene, &options);
    assert!(tracer.is_shadow_cast(&hit, &scene.lights[0]));

    let no_shadows = RaytracerOptions { shadows: false, ..Default::default() };
    let tracer = Tracer::new(&scene, &no_shadows);
    assert!(!tracer.is_shadow_cast(&hit, &scene.lights[0]));
}

#[test]
fn blocker_beyond_the_light_casts_no_shadow() {
    use crate::geometry::Sphere;

    let mut scene = test_scenes::lone_sphere(test_scenes::matte_red());
    let hit = test_scenes::hit_on_top(&scene);
    scene.spheres.push(Sphere::new(Vector3::new(0.0, 40.0, -10.0), 1.0,
        test_scenes::matte_red()));

    let options = RaytracerOptions::default();
    let tracer = Tracer::new(&scene, &options);
    assert!(!tracer.is_shadow_cast(&hit, &scene.lights[0]));
}

#[test]
fn direct_diffuse_shading() {
    let scene = test_scenes::lone_sphere(test_scenes::matte_red());
    let options = RaytracerOptions::default();
    let tracer = Tracer::new(&scene, &options);

    // Straight down onto the top of the sphere, light directly above.
    let ray = Ray::new(Vector3::new(0.0, 5.0, -10.0),
        Vector3::new(0.0, -1.0, 0.0));
    assert_eq!(tracer.trace(&ray, 0), Color::rgb(200.0, 0.0, 0.0));
}

#[test]
fn flat_color_when_diffuse_lighting_is_off() {
    let scene = test_scenes::lone_sphere(test_scenes::matte_red());
    let options = RaytracerOptions {
        diffuse_lighting: false,
        ..Default::default()
    };
    let tracer = Tracer::new(&scene, &options);

    // Grazing the side of the sphere, where diffuse light would be dim.
    let ray = Ray::new(Vector3::new(5.0, 0.0, -10.0),
        Vector3::new(-1.0, 0.0, 0.0));
    assert_eq!(tracer.trace(&ray, 0), Color::rgb(200.0, 0.0, 0.0));
}

#[test]
fn zero_depth_disables_secondary_rays() {
    use crate::light::{ Albedo, Material };

    let shiny = Material::new(Color::rgb(100.0, 100.0, 100.0),
        Albedo::new(0.5, 0.0, 0.8, 0.8), 0.0, 1.5);
    let scene = test_scenes::lone_sphere(shiny);
    let ray = Ray::new(Vector3::new(0.0, 5.0, -10.0),
        Vector3::new(0.0, -1.0, 0.0));

    let direct_only = RaytracerOptions {
        reflections: false,
        refractions: false,
        ..Default::default()
    };
    let depth_zero = RaytracerOptions {
        max_recurse_depth: 0,
        ..Default::default()
    };

    let expected = Tracer::new(&scene, &direct_only).trace(&ray, 0);
    let actual = Tracer::new(&scene, &depth_zero).trace(&ray, 0);

    assert_eq!(actual, expected);
    assert_eq!(actual, Color::rgb(50.0, 50.0, 50.0));
}

#[test]
fn mirror_picks_up_background() {
    use crate::light::{ Albedo, Material };

    let mirror = Material::new(Color::black(),
        Albedo::new(0.0, 0.0, 1.0, 0.0), 0.0, 1.0);
    let scene = test_scenes::lone_sphere(mirror);
    let options = RaytracerOptions::default();
    let tracer = Tracer::new(&scene, &options);

    // Reflected straight back up into the empty sky.
    let ray = Ray::new(Vector3::new(0.0, 5.0, -10.0),
        Vector3::new(0.0, -1.0, 0.0));
    assert_eq!(tracer.trace(&ray, 0), scene.background_colour);
}

#[test]
fn glass_sphere_shows_what_lies_behind() {
    use crate::light::{ Albedo, Material };

    let clear = Material::new(Color::black(),
        Albedo::new(0.0, 0.0, 0.0, 1.0), 0.0, 1.5);
    let scene = test_scenes::lone_sphere(clear);
    let options = RaytracerOptions::default();
    let tracer = Tracer::new(&scene, &options);

    // Head-on rays pass through both surfaces unbent into the background.
    let ray = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0));
    assert_eq!(tracer.trace(&ray, 0), scene.background_colour);
}

#[test]
fn specular_highlight_adds_white() {
    use crate::light::{ Albedo, Material };

    let gloss = Material::new(Color::black(),
        Albedo::new(0.0, 0.5, 0.0, 0.0), 50.0, 1.0);
    let scene = test_scenes::lone_sphere(gloss);
    let ray = Ray::new(Vector3::new(0.0, 5.0, -10.0),
        Vector3::new(0.0, -1.0, 0.0));

    let options = RaytracerOptions::default();
    assert_eq!(Tracer::new(&scene, &options).trace(&ray, 0),
        Color::rgb(127.5, 127.5, 127.5));

    let matte = RaytracerOptions {
        specular_lighting: false,
        ..Default::default()
    };
    assert_eq!(Tracer::new(&scene, &matte).trace(&ray, 0), Color::black());
}
