// math.rs - Simple 3D vector type used throughout the overlay.

use bytemuck::{Pod, Zeroable};

/// A 3-component vector (x, y, z) matching the engine's float[3] layout.
/// Used for world-space positions read from scene nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Check if all components are exactly zero (node not placed yet).
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Dot product with the first three coefficients of a matrix row.
    #[inline]
    pub fn dot_row(self, row: &[f32; 4]) -> f32 {
        row[0] * self.x + row[1] * self.y + row[2] * self.z + row[3]
    }
}
