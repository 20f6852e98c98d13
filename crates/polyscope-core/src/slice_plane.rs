//! Slice planes for cutting through geometry.
//!
//! Each enabled plane culls the fragments on its negative side. Planes are
//! shared by every structure in the scene, so each one becomes a separately
//! named shader rule instance inside every program that draws geometry.

use glam::Vec3;

/// Maximum number of slice planes supported.
pub const MAX_SLICE_PLANES: usize = 4;

/// A slice plane that can cut through geometry.
///
/// Geometry on the negative side of the plane (opposite to normal) is discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicePlane {
    name: String,
    origin: Vec3,
    normal: Vec3,
    enabled: bool,
}

impl SlicePlane {
    /// Creates a new slice plane at the origin with +Y normal.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_pose(name, Vec3::ZERO, Vec3::Y)
    }

    /// Creates a slice plane with specific pose.
    pub fn with_pose(name: impl Into<String>, origin: Vec3, normal: Vec3) -> Self {
        Self {
            name: name.into(),
            origin,
            normal: normal.normalize(),
            enabled: true,
        }
    }

    /// Returns the name of this slice plane.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the origin point of the plane.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Returns the normal direction of the plane.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Sets both origin and normal at once.
    pub fn set_pose(&mut self, origin: Vec3, normal: Vec3) {
        self.origin = origin;
        self.normal = normal.normalize();
    }

    /// Returns whether the slice plane is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sets whether the slice plane is enabled.
    ///
    /// Toggling a plane changes the rule list of every program drawing
    /// geometry, so those programs are rebuilt before their next draw.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns the signed distance from a point to the plane.
    ///
    /// Positive values are on the normal side (kept), negative on the opposite (discarded).
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.origin).dot(self.normal)
    }

    /// Returns whether a point is on the kept side of the plane.
    pub fn is_kept(&self, point: Vec3) -> bool {
        !self.enabled || self.signed_distance(point) >= 0.0
    }
}

impl Default for SlicePlane {
    fn default() -> Self {
        Self::new("default")
    }
}
