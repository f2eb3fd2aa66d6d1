use crate::ray::Ray;
use crate::vector::Vector3;

/// A pinhole camera at the origin, looking down the negative Z axis.
///
/// Pixel coordinates are mapped onto an image plane placed so that the frame
/// height spans the vertical field of view.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Camera {
    /// The horizontal size of the frame, in pixels.
    pub width: u32,

    /// The vertical size of the frame, in pixels.
    pub height: u32,

    /// The distance from the eye to the image plane, measured in pixels
    /// (negative, since the camera looks down -Z).
    pub plane_z: f64,
}

impl Camera {
    pub fn new(width: u32, height: u32, field_of_view: f64) -> Camera {
        let plane_z = -(height as f64) / (2.0 * (field_of_view / 2.0).tan());

        Camera { width, height, plane_z }
    }

    /// The camera ray through the center of pixel `(px, py)`.
    pub fn ray_for_pixel(&self, px: u32, py: u32) -> Ray {
        // Offsets from the center of the frame to the pixel's center
        let x = px as f64 + 0.5 - self.width as f64 / 2.0;
        let y = -(py as f64 + 0.5) + self.height as f64 / 2.0;

        let direction = Vector3::new(x, y, self.plane_z).normalize();
        Ray::new(Vector3::zero(), direction)
    }
}

#[test]
fn ray_through_center_of_odd_frame() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(100, 50);

    assert_eq!(r.origin, Vector3::zero());
    assert_eq!(r.direction, Vector3::new(0.0, 0.0, -1.0));
}

#[test]
fn ray_through_corner() {
    // With a 90 degree field of view the image plane sits half the frame
    // height away, so the top-left pixel center is at (-100, 50, -50.5).
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(0, 0);

    assert_eq!(r.direction, Vector3::new(-100.0, 50.0, -50.5).normalize());
    assert!(r.direction.x < 0.0 && r.direction.y > 0.0);
}

#[test]
fn plane_distance_follows_field_of_view() {
    let c = Camera::new(640, 480, std::f64::consts::PI / 3.0);

    // tan(30 deg) = 1 / sqrt(3)
    assert!(crate::feq(c.plane_z, -240.0 * 3.0f64.sqrt()));
}
