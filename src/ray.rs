use crate::vector::Vector3;
use crate::consts::EPSILON;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray {
    pub origin: Vector3,
    pub direction: Vector3,
}

impl Ray {
    pub fn new(origin: Vector3, direction: Vector3) -> Ray {
        Ray { origin, direction }
    }

    /// Starts a secondary ray just off a surface.
    ///
    /// The origin is nudged by `EPSILON` along the normal, onto whichever
    /// side of the surface `direction` leaves through, so the new ray cannot
    /// hit the surface it started on.
    pub fn offset_from(point: Vector3, normal: Vector3, direction: Vector3)
        -> Ray {
        let origin = if direction.dot(&normal) < 0.0 {
            point - normal * EPSILON
        } else {
            point + normal * EPSILON
        };

        Ray { origin, direction }
    }

    pub fn position(&self, t: f64) -> Vector3 {
        self.origin + (t * self.direction)
    }
}

#[test]
fn ray_position() {
    let r = Ray::new(
                Vector3::new(2.0, 3.0, 4.0),
                Vector3::new(1.0, 0.0, 0.0)
            );

    assert_eq!(r.position(0.0), Vector3::new(2.0, 3.0, 4.0));
    assert_eq!(r.position(1.0), Vector3::new(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Vector3::new(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Vector3::new(4.5, 3.0, 4.0));
}

#[test]
fn offset_follows_direction_side() {
    let point = Vector3::new(0.0, 0.0, 0.0);
    let normal = Vector3::new(0.0, 1.0, 0.0);

    let up = Ray::offset_from(point, normal, Vector3::new(0.0, 1.0, 0.0));
    assert!(up.origin.y > 0.0);

    let down = Ray::offset_from(point, normal, Vector3::new(1.0, -1.0, 0.0));
    assert!(down.origin.y < 0.0);
}
