// projection.rs - World-to-screen projection through the game's camera matrix.
//
// The camera is stored as 12 consecutive floats: three rows of
// (basis.x, basis.y, basis.z, translation) that produce clip-space x, y and w.
// Clip coordinates are normalized by w and mapped onto the viewport with the
// Y axis flipped (clip Y grows up, screen Y grows down).

use crate::config::Layout;
use crate::error::{Error, Result};
use crate::math::Vec3;
use crate::platform::{Platform, ProcessHandle};
use serde::Deserialize;

/// Points with w below this are behind or on the camera plane.
pub const MIN_CLIP_W: f32 = 0.001;

// ============================================================
// Viewport
// ============================================================

/// Pixel rectangle that normalized device coordinates map onto.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }
}

// ============================================================
// View Transform
// ============================================================

/// Row-major 3x4 camera matrix, read fresh every cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    rows: [[f32; 4]; 3],
}

impl ViewTransform {
    pub fn from_coefficients(m: [f32; 12]) -> Self {
        Self {
            rows: [
                [m[0], m[1], m[2], m[3]],
                [m[4], m[5], m[6], m[7]],
                [m[8], m[9], m[10], m[11]],
            ],
        }
    }

    /// Read the camera from `module + view_matrix`.
    /// `None` when the read fails or the matrix is all zero (no camera yet).
    pub fn read<P: Platform>(target: &ProcessHandle<P>, layout: &Layout) -> Option<Self> {
        let m: [f32; 12] = target.reader().read(target.address(layout.view_matrix)).ok()?;
        let transform = Self::from_coefficients(m);
        (!transform.is_zeroed()).then_some(transform)
    }

    pub fn is_zeroed(&self) -> bool {
        self.rows.iter().flatten().all(|&c| c == 0.0)
    }

    /// Clip-space (x, y, w) of a world point.
    pub fn to_clip(&self, p: Vec3) -> (f32, f32, f32) {
        (p.dot_row(&self.rows[0]), p.dot_row(&self.rows[1]), p.dot_row(&self.rows[2]))
    }

    /// Project `p` onto `viewport`, failing with `DegenerateProjection` when
    /// w is below `MIN_CLIP_W` (or not a number).
    pub fn project_checked(&self, p: Vec3, viewport: Viewport) -> Result<(i32, i32)> {
        let (clip_x, clip_y, w) = self.to_clip(p);
        // NaN fails this comparison too
        if !(w >= MIN_CLIP_W) {
            return Err(Error::DegenerateProjection { w });
        }

        let inv_w = 1.0 / w;
        let ndc_x = clip_x * inv_w;
        let ndc_y = clip_y * inv_w;

        let px = viewport.x as f32 + (ndc_x * 0.5 + 0.5) * viewport.width as f32;
        let py = viewport.y as f32 + (0.5 - ndc_y * 0.5) * viewport.height as f32;

        // Truncate toward zero only here, at the pixel boundary
        Ok((px as i32, py as i32))
    }

    /// Pixel position of `p`, or `None` if it cannot be projected.
    pub fn project(&self, p: Vec3, viewport: Viewport) -> Option<(i32, i32)> {
        self.project_checked(p, viewport).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockProcess;

    const FULL_HD: Viewport = Viewport::new(0, 0, 1920, 1080);

    /// x and y pass through, w is constant 1.
    fn flat() -> ViewTransform {
        ViewTransform::from_coefficients([1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0])
    }

    #[test]
    fn origin_lands_in_viewport_center() {
        assert_eq!(flat().project(Vec3::default(), FULL_HD), Some((960, 540)));
    }

    #[test]
    fn clip_corners_map_to_viewport_corners() {
        let m = flat();
        assert_eq!(m.project(Vec3::new(-1.0, 1.0, 0.0), FULL_HD), Some((0, 0)));
        assert_eq!(m.project(Vec3::new(1.0, -1.0, 0.0), FULL_HD), Some((1920, 1080)));
        // Clip Y up means screen Y up
        assert_eq!(m.project(Vec3::new(0.0, 0.5, 0.0), FULL_HD), Some((960, 270)));
    }

    #[test]
    fn viewport_origin_is_added() {
        let vp = Viewport::new(100, 50, 800, 600);
        assert_eq!(flat().project(Vec3::default(), vp), Some((500, 350)));
    }

    #[test]
    fn w_below_threshold_is_degenerate() {
        let m = ViewTransform::from_coefficients([1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0005]);
        assert_eq!(m.project(Vec3::new(3.0, 4.0, 5.0), FULL_HD), None);
        assert!(matches!(
            m.project_checked(Vec3::default(), FULL_HD),
            Err(Error::DegenerateProjection { .. })
        ));

        // Behind the camera
        let behind = ViewTransform::from_coefficients([1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(behind.project(Vec3::new(0.0, 0.0, -10.0), FULL_HD), None);
        assert!(behind.project(Vec3::new(0.0, 0.0, 10.0), FULL_HD).is_some());
    }

    #[test]
    fn w_divides_clip_coordinates() {
        // w = z, so a point twice as far lands twice as close to the center
        let m = ViewTransform::from_coefficients([1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(m.project(Vec3::new(1.0, 0.0, 2.0), FULL_HD), Some((1440, 540)));
        assert_eq!(m.project(Vec3::new(1.0, 0.0, 4.0), FULL_HD), Some((1200, 540)));
    }

    #[test]
    fn truncates_toward_zero() {
        let vp = Viewport::new(0, 0, 3, 3);
        // 0.5 * 3 = 1.5 -> 1
        assert_eq!(flat().project(Vec3::default(), vp), Some((1, 1)));
        // Left of the viewport: -0.75 -> 0, not -1
        assert_eq!(flat().project(Vec3::new(-1.5, 0.0, 0.0), vp), Some((0, 1)));
    }

    #[test]
    fn nan_w_is_degenerate() {
        let mut c = [0.0f32; 12];
        c[11] = f32::NAN;
        let m = ViewTransform::from_coefficients(c);
        assert_eq!(m.project(Vec3::default(), FULL_HD), None);
    }

    #[test]
    fn read_treats_zero_matrix_as_absent() {
        let layout = Layout::default();
        let mock = MockProcess::new();
        mock.add_module("client.dll", 0x1000_0000, 0x700_0000);
        let target = ProcessHandle::attach(mock.clone(), "client.dll").unwrap();
        let at = target.address(layout.view_matrix);

        // Unmapped
        assert_eq!(ViewTransform::read(&target, &layout), None);

        mock.alloc(at, 48);
        assert_eq!(ViewTransform::read(&target, &layout), None);

        let coefficients: [f32; 12] = [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        mock.write_value(at, &coefficients);
        assert_eq!(ViewTransform::read(&target, &layout), Some(flat()));
    }
}
