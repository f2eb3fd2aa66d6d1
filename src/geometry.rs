use serde::{ Serialize, Deserialize };

use crate::color::Color;
use crate::vector::Vector3;
use crate::ray::Ray;
use crate::light::Material;
use crate::pattern::Checkerboard;
use crate::consts::EPSILON;

/// Something a ray can hit.
///
/// `intersect` yields the distance along the ray to the nearest hit in front
/// of the ray origin, if any. The surface normal and material are looked up
/// separately, once a hit has been chosen.
pub trait Intersectable {
    fn intersect(&self, ray: &Ray) -> Option<f64>;
    fn normal_at(&self, point: Vector3) -> Vector3;
    fn material_at(&self, point: Vector3) -> Material;
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vector3,
    pub radius: f64,
    pub material: Material,
}

impl Sphere {
    pub fn new(center: Vector3, radius: f64, material: Material) -> Sphere {
        Sphere { center, radius, material }
    }

    pub fn is_finite(&self) -> bool {
        self.center.is_finite()
            && self.radius.is_finite()
            && self.material.is_finite()
    }
}

impl Intersectable for Sphere {
    /// Intersects a ray with the sphere, geometrically.
    ///
    /// `tca` is the length of the projection of the origin-to-center vector
    /// onto the ray, and `d2` the squared distance from the center to the
    /// ray. If that distance exceeds the radius the ray misses; otherwise the
    /// two roots lie `thc` either side of `tca`. The nearer non-negative root
    /// wins, so a ray starting inside the sphere hits the far side.
    fn intersect(&self, ray: &Ray) -> Option<f64> {
        let l = self.center - ray.origin;
        let tca = l.dot(&ray.direction);
        let d2 = l.dot(&l) - tca * tca;
        let r2 = self.radius * self.radius;

        if d2 > r2 {
            return None;
        }

        let thc = (r2 - d2).sqrt();
        let t0 = tca - thc;
        let t1 = tca + thc;

        if t0 >= 0.0 {
            Some(t0)
        } else if t1 >= 0.0 {
            Some(t1)
        } else {
            None
        }
    }

    fn normal_at(&self, point: Vector3) -> Vector3 {
        (point - self.center).normalize()
    }

    fn material_at(&self, _point: Vector3) -> Material {
        self.material
    }
}

/// A bounded horizontal plane with a checkerboard finish.
///
/// The plane sits at height `y_pos`, spans `-half_width < x < half_width`
/// and lies strictly between `z_start` and `z_end` (in either order).
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plane {
    pub y_pos: f64,
    pub half_width: f64,
    pub z_start: f64,
    pub z_end: f64,
    pub checkerboard_scale: f64,
    pub colour_a: Color,
    pub colour_b: Color,
}

impl Plane {
    pub fn new(y_pos: f64, half_width: f64, z_start: f64, z_end: f64,
        checkerboard_scale: f64, colour_a: Color, colour_b: Color) -> Plane {
        Plane {
            y_pos,
            half_width,
            z_start,
            z_end,
            checkerboard_scale,
            colour_a,
            colour_b,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.y_pos, self.half_width, self.z_start, self.z_end,
            self.checkerboard_scale].iter().all(|v| v.is_finite())
            && self.colour_a.is_finite()
            && self.colour_b.is_finite()
    }

    pub fn pattern(&self) -> Checkerboard {
        Checkerboard::new(self.checkerboard_scale, self.colour_a, self.colour_b)
    }

    fn contains(&self, point: Vector3) -> bool {
        let z_min = self.z_start.min(self.z_end);
        let z_max = self.z_start.max(self.z_end);

        point.x.abs() < self.half_width
            && point.z > z_min
            && point.z < z_max
    }
}

impl Intersectable for Plane {
    fn intersect(&self, ray: &Ray) -> Option<f64> {
        // Near-parallel rays would divide by (almost) zero.
        if ray.direction.y.abs() <= EPSILON {
            return None;
        }

        let t = (self.y_pos - ray.origin.y) / ray.direction.y;
        if t <= 0.0 {
            return None;
        }

        if self.contains(ray.position(t)) {
            Some(t)
        } else {
            None
        }
    }

    fn normal_at(&self, _point: Vector3) -> Vector3 {
        Vector3::new(0.0, 1.0, 0.0)
    }

    fn material_at(&self, point: Vector3) -> Material {
        Material::flat(self.pattern().color_at(point.x, point.z))
    }
}

#[cfg(test)]
fn test_plane() -> Plane {
    Plane::new(-1.0, 10.0, 0.0, -30.0, 1.0,
        Color::rgb(200.0, 200.0, 200.0), Color::rgb(15.0, 15.0, 15.0))
}

#[test]
fn ray_hits_sphere_center_on() {
    let s = Sphere::new(Vector3::new(0.0, 0.0, -10.0), 2.0, Default::default());
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0));

    let t = s.intersect(&r).unwrap();
    assert_eq!(t, 8.0);
    assert_eq!(r.position(t), Vector3::new(0.0, 0.0, -8.0));
}

#[test]
fn ray_aimed_at_center_hits_at_distance_minus_radius() {
    let origins = [
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(5.0, -3.0, 2.0),
        Vector3::new(-20.0, 7.5, -1.0),
    ];
    let spheres = [
        Sphere::new(Vector3::new(1.0, 2.0, -10.0), 1.5, Default::default()),
        Sphere::new(Vector3::new(-4.0, 0.0, 12.0), 3.0, Default::default()),
    ];

    for s in spheres.iter() {
        for o in origins.iter() {
            let to_center = s.center - *o;
            let r = Ray::new(*o, to_center.normalize());
            let t = s.intersect(&r).unwrap();

            assert!(crate::feq(t, to_center.norm() - s.radius));

            let hit = r.position(t);
            let n = s.normal_at(hit);
            assert!(crate::feq(n.norm(), 1.0));
            assert!(n.dot(&(hit - s.center)) > 0.0);
        }
    }
}

#[test]
fn ray_misses_sphere() {
    let s = Sphere::new(Vector3::new(0.0, 0.0, -10.0), 2.0, Default::default());
    let r = Ray::new(Vector3::new(0.0, 3.0, 0.0), Vector3::new(0.0, 0.0, -1.0));

    assert_eq!(s.intersect(&r), None);
}

#[test]
fn sphere_behind_ray_is_missed() {
    let s = Sphere::new(Vector3::new(0.0, 0.0, 10.0), 2.0, Default::default());
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0));

    assert_eq!(s.intersect(&r), None);
}

#[test]
fn ray_inside_sphere_hits_far_side() {
    let s = Sphere::new(Vector3::zero(), 1.0, Default::default());
    let r = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(s.intersect(&r), Some(1.0));
}

#[test]
fn ray_hits_plane_from_above() {
    let p = test_plane();
    let r = Ray::new(Vector3::new(0.0, 5.0, -5.0), Vector3::new(0.0, -1.0, 0.0));

    let t = p.intersect(&r).unwrap();
    assert_eq!(t, 6.0);
    assert_eq!(r.position(t), Vector3::new(0.0, -1.0, -5.0));
    assert_eq!(p.normal_at(r.position(t)), Vector3::new(0.0, 1.0, 0.0));
}

#[test]
fn parallel_ray_misses_plane() {
    let p = test_plane();
    let r = Ray::new(Vector3::new(0.0, 5.0, -5.0),
        Vector3::new(1.0, 0.0005, 0.0).normalize());

    assert_eq!(p.intersect(&r), None);
}

#[test]
fn plane_behind_ray_is_missed() {
    let p = test_plane();
    let r = Ray::new(Vector3::new(0.0, 5.0, -5.0), Vector3::new(0.0, 1.0, 0.0));

    assert_eq!(p.intersect(&r), None);
}

#[test]
fn ray_outside_plane_bounds_misses() {
    let p = test_plane();
    let down = Vector3::new(0.0, -1.0, 0.0);

    // Beyond the half width.
    let r = Ray::new(Vector3::new(10.5, 5.0, -5.0), down);
    assert_eq!(p.intersect(&r), None);

    // In front of the z range.
    let r = Ray::new(Vector3::new(0.0, 5.0, 1.0), down);
    assert_eq!(p.intersect(&r), None);

    // Past the far edge.
    let r = Ray::new(Vector3::new(0.0, 5.0, -31.0), down);
    assert_eq!(p.intersect(&r), None);
}

#[test]
fn plane_material_follows_checkerboard() {
    let p = test_plane();

    let a = p.material_at(Vector3::new(0.0, -1.0, -5.0));
    let b = p.material_at(Vector3::new(1.0, -1.0, -5.0));

    // round(0) + round(-5) = -5, odd.
    assert_eq!(a.diffuse_colour, Color::rgb(15.0, 15.0, 15.0));
    assert_eq!(b.diffuse_colour, Color::rgb(200.0, 200.0, 200.0));
    assert_eq!(a.albedo.diffuse, 1.0);
    assert_eq!(a.albedo.specular, 0.0);
}
