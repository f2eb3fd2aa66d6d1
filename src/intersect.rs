use crate::consts::HIT_SENTINEL;
use crate::vector::Vector3;
use crate::ray::Ray;
use crate::light::Material;
use crate::geometry::Intersectable;
use crate::scene::Scene;

/// A record of the surface a ray hit first.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hit {
    /// The distance along the ray to the hit.
    pub distance: f64,

    /// The point where the intersection occurs.
    pub point: Vector3,

    /// The outward surface normal at `point`.
    pub normalv: Vector3,

    /// The material of the surface at `point`.
    pub material: Material,
}

impl Hit {
    fn new(ray: &Ray, distance: f64, what: &dyn Intersectable) -> Hit {
        let point = ray.position(distance);

        Hit {
            distance,
            point,
            normalv: what.normal_at(point),
            material: what.material_at(point),
        }
    }
}

/// Finds the nearest surface a ray hits in a scene.
///
/// Spheres are tested before planes, in the order they are listed, and a
/// later object only replaces the current hit if it is strictly closer. On
/// an exact tie the first object tested keeps the hit.
///
/// Hits at or beyond `max_draw_distance` (or beyond `HIT_SENTINEL`) are
/// ignored.
pub fn nearest_hit(scene: &Scene, ray: &Ray, max_draw_distance: f64)
    -> Option<Hit> {
    let mut nearest = HIT_SENTINEL;
    let mut hit: Option<Hit> = None;

    let objects = scene.spheres.iter().map(|s| s as &dyn Intersectable)
        .chain(scene.planes.iter().map(|p| p as &dyn Intersectable));

    for obj in objects {
        if let Some(t) = obj.intersect(ray) {
            if t < nearest {
                nearest = t;
                hit = Some(Hit::new(ray, t, obj));
            }
        }
    }

    hit.filter(|h| h.distance < max_draw_distance)
}

#[cfg(test)]
fn two_sphere_scene() -> Scene {
    use crate::color::Color;
    use crate::geometry::Sphere;

    let mut scene = Scene::empty();
    scene.spheres.push(Sphere::new(Vector3::new(0.0, 0.0, -20.0), 2.0,
        Material::flat(Color::rgb(255.0, 0.0, 0.0))));
    scene.spheres.push(Sphere::new(Vector3::new(0.0, 0.0, -10.0), 2.0,
        Material::flat(Color::rgb(0.0, 255.0, 0.0))));
    scene
}

#[test]
fn nearest_of_two_spheres_wins() {
    let scene = two_sphere_scene();
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0));

    let h = nearest_hit(&scene, &r, 1000.0).unwrap();
    assert_eq!(h.distance, 8.0);
    assert_eq!(h.point, Vector3::new(0.0, 0.0, -8.0));
    assert_eq!(h.normalv, Vector3::new(0.0, 0.0, 1.0));
    assert_eq!(h.material, scene.spheres[1].material);
}

#[test]
fn hits_beyond_draw_distance_are_ignored() {
    let scene = two_sphere_scene();
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0));

    assert!(nearest_hit(&scene, &r, 8.5).is_some());
    assert!(nearest_hit(&scene, &r, 8.0).is_none());
}

#[test]
fn miss_with_huge_draw_distance_is_still_a_miss() {
    let scene = two_sphere_scene();
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 1.0, 0.0));

    assert!(nearest_hit(&scene, &r, HIT_SENTINEL * 10.0).is_none());
}

#[test]
fn sphere_wins_exact_tie_with_plane() {
    use crate::color::Color;
    use crate::geometry::{ Sphere, Plane };

    // The sphere's top touches the plane at y = -1 directly below the ray.
    let mut scene = Scene::empty();
    let sphere_material = Material::flat(Color::rgb(1.0, 2.0, 3.0));
    scene.planes.push(Plane::new(-1.0, 10.0, 0.0, -30.0, 1.0,
        Color::white(), Color::black()));
    scene.spheres.push(Sphere::new(Vector3::new(0.0, -2.0, -5.0), 1.0,
        sphere_material));

    let r = Ray::new(Vector3::new(0.0, 5.0, -5.0), Vector3::new(0.0, -1.0, 0.0));
    let h = nearest_hit(&scene, &r, 1000.0).unwrap();

    assert_eq!(h.distance, 6.0);
    assert_eq!(h.material, sphere_material);
}
