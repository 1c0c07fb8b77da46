//! Math type re-exports and USD-specific value layouts.
//!
//! f32/f64 vectors, matrices and quaternions come from `glam`. The
//! half-precision and integer tuple types the Crate format stores but glam
//! does not model are defined here as `#[repr(C)]` Pod structs so the array
//! codecs can cast them straight out of decoded byte buffers.

// Re-export glam types
pub use glam::{
    // Single precision vectors
    Vec2, Vec3, Vec4,
    // Double precision vectors
    DVec2, DVec3, DVec4,
    // Integer vectors
    IVec2, IVec3, IVec4,
    // Double precision matrices
    DMat2, DMat3, DMat4,
    // Quaternions
    Quat, DQuat,
};

use bytemuck::{Pod, Zeroable};
use half::f16;
use std::fmt;

/// 2-component half-precision vector.
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct HVec2 {
    pub x: f16,
    pub y: f16,
}

/// 3-component half-precision vector.
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct HVec3 {
    pub x: f16,
    pub y: f16,
    pub z: f16,
}

/// 4-component half-precision vector.
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct HVec4 {
    pub x: f16,
    pub y: f16,
    pub z: f16,
    pub w: f16,
}

impl HVec2 {
    #[inline]
    pub fn new(x: f16, y: f16) -> Self {
        Self { x, y }
    }

    /// Widen to single precision.
    #[inline]
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x.to_f32(), self.y.to_f32())
    }
}

impl HVec3 {
    #[inline]
    pub fn new(x: f16, y: f16, z: f16) -> Self {
        Self { x, y, z }
    }

    /// Widen to single precision.
    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x.to_f32(), self.y.to_f32(), self.z.to_f32())
    }
}

impl HVec4 {
    #[inline]
    pub fn new(x: f16, y: f16, z: f16, w: f16) -> Self {
        Self { x, y, z, w }
    }

    /// Widen to single precision.
    #[inline]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.x.to_f32(),
            self.y.to_f32(),
            self.z.to_f32(),
            self.w.to_f32(),
        )
    }
}

impl fmt::Debug for HVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Debug for HVec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl fmt::Debug for HVec4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.z, self.w)
    }
}

/// Half-precision quaternion, stored in wire order (x, y, z, w).
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct HQuat {
    pub x: f16,
    pub y: f16,
    pub z: f16,
    pub w: f16,
}

impl HQuat {
    #[inline]
    pub fn from_xyzw(x: f16, y: f16, z: f16, w: f16) -> Self {
        Self { x, y, z, w }
    }

    /// Widen to a single-precision quaternion.
    #[inline]
    pub fn to_quat(self) -> Quat {
        Quat::from_xyzw(
            self.x.to_f32(),
            self.y.to_f32(),
            self.z.to_f32(),
            self.w.to_f32(),
        )
    }
}

impl fmt::Debug for HQuat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.z, self.w)
    }
}

/// Axis-aligned extent (`float3[2]` in the schema): lower and upper corner.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Extent {
    pub lower: Vec3,
    pub upper: Vec3,
}

impl Extent {
    /// Empty extent (inverted, expands on first point).
    pub const EMPTY: Self = Self {
        lower: Vec3::splat(f32::INFINITY),
        upper: Vec3::splat(f32::NEG_INFINITY),
    };

    #[inline]
    pub const fn new(lower: Vec3, upper: Vec3) -> Self {
        Self { lower, upper }
    }

    /// Check if this extent is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lower.x > self.upper.x
            || self.lower.y > self.upper.y
            || self.lower.z > self.upper.z
    }

    /// Expand to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: Vec3) {
        self.lower = self.lower.min(p);
        self.upper = self.upper.max(p);
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_vec_layout() {
        assert_eq!(std::mem::size_of::<HVec2>(), 4);
        assert_eq!(std::mem::size_of::<HVec3>(), 6);
        assert_eq!(std::mem::size_of::<HVec4>(), 8);
        assert_eq!(std::mem::size_of::<HQuat>(), 8);
    }

    #[test]
    fn test_half_vec_cast() {
        let bytes: Vec<u8> = [f16::from_f32(1.0), f16::from_f32(2.0), f16::from_f32(3.0)]
            .iter()
            .flat_map(|h| h.to_le_bytes())
            .collect();
        let v: Vec<HVec3> = bytemuck::pod_collect_to_vec(&bytes);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].to_vec3(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_extent_expand() {
        let mut e = Extent::EMPTY;
        assert!(e.is_empty());
        e.expand_by_point(Vec3::new(1.0, 2.0, 3.0));
        e.expand_by_point(Vec3::new(-1.0, 0.0, 5.0));
        assert_eq!(e.lower, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(e.upper, Vec3::new(1.0, 2.0, 5.0));
    }
}
