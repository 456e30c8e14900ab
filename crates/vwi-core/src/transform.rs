//! Scale, rotation and translation transform.
//!
//! Composition follows "left happens first": `a * b` applies `a` and then `b`.
//! This lets incremental drag math read in the order it is performed, e.g.
//! `start * gizmo_start.inverse() * gizmo_current`.

use std::ops::Mul;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::SMALL_NUMBER;

/// A transform made of a non-uniform scale, a rotation and a translation,
/// applied in that order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Rotation applied after scaling.
    pub rotation: Quat,
    /// Translation applied last.
    pub translation: Vec3,
    /// Per-axis scale applied first.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Creates a transform from all three components.
    pub fn new(rotation: Quat, translation: Vec3, scale: Vec3) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Creates a pure translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Creates a pure rotation.
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Creates a pure scale.
    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            scale,
            ..Self::IDENTITY
        }
    }

    /// Creates an unscaled rigid transform.
    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
            scale: Vec3::ONE,
        }
    }

    /// Location (translation) of the transform.
    pub fn location(&self) -> Vec3 {
        self.translation
    }

    /// Replaces the translation.
    pub fn set_location(&mut self, location: Vec3) {
        self.translation = location;
    }

    /// Replaces the rotation.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// Replaces the scale.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Returns a copy with unit scale.
    pub fn without_scale(&self) -> Self {
        Self {
            scale: Vec3::ONE,
            ..*self
        }
    }

    /// Unit forward (+X) axis.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Unit up (+Z) axis.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Applies `self` first and `other` second.
    pub fn then(&self, other: &Transform) -> Transform {
        Transform {
            rotation: (other.rotation * self.rotation).normalize(),
            translation: other.rotation * (other.scale * self.translation) + other.translation,
            scale: self.scale * other.scale,
        }
    }

    /// Inverse transform. Exact for uniform scale.
    pub fn inverse(&self) -> Transform {
        let inv_rotation = self.rotation.inverse();
        let inv_scale = safe_reciprocal(self.scale);
        Transform {
            rotation: inv_rotation,
            translation: inv_rotation * (inv_scale * -self.translation),
            scale: inv_scale,
        }
    }

    /// Transforms a point.
    pub fn transform_position(&self, position: Vec3) -> Vec3 {
        self.rotation * (self.scale * position) + self.translation
    }

    /// Transforms a direction, including scale.
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * (self.scale * vector)
    }

    /// Rotates a direction, ignoring scale.
    pub fn transform_vector_no_scale(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    /// Maps a world point into the local space of this transform.
    pub fn inverse_transform_position(&self, position: Vec3) -> Vec3 {
        (self.rotation.inverse() * (position - self.translation)) * safe_reciprocal(self.scale)
    }

    /// Maps a world direction into local space, including scale.
    pub fn inverse_transform_vector(&self, vector: Vec3) -> Vec3 {
        (self.rotation.inverse() * vector) * safe_reciprocal(self.scale)
    }

    /// Maps a world direction into local space, ignoring scale.
    pub fn inverse_transform_vector_no_scale(&self, vector: Vec3) -> Vec3 {
        self.rotation.inverse() * vector
    }

    /// Interpolates between two transforms component-wise.
    pub fn blend(a: &Transform, b: &Transform, alpha: f32) -> Transform {
        Transform {
            rotation: a.rotation.lerp(b.rotation, alpha),
            translation: a.translation.lerp(b.translation, alpha),
            scale: a.scale.lerp(b.scale, alpha),
        }
    }

    /// Moves `self` toward `other` by `alpha`.
    pub fn blend_with(&mut self, other: &Transform, alpha: f32) {
        *self = Transform::blend(self, other, alpha);
    }

    /// Component-wise equality within `tolerance`. A rotation and its
    /// negated quaternion compare equal.
    pub fn equals(&self, other: &Transform, tolerance: f32) -> bool {
        let a = self.rotation;
        let b = other.rotation;
        let same_rotation = (a - b).to_array().iter().all(|c| c.abs() <= tolerance)
            || (a + b).to_array().iter().all(|c| c.abs() <= tolerance);

        same_rotation
            && self.translation.abs_diff_eq(other.translation, tolerance)
            && self.scale.abs_diff_eq(other.scale, tolerance)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.then(&rhs)
    }
}

impl Mul<&Transform> for &Transform {
    type Output = Transform;

    fn mul(self, rhs: &Transform) -> Transform {
        self.then(rhs)
    }
}

fn safe_reciprocal(v: Vec3) -> Vec3 {
    let recip = |c: f32| if c.abs() <= SMALL_NUMBER { 0.0 } else { 1.0 / c };
    Vec3::new(recip(v.x), recip(v.y), recip(v.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn sample() -> Transform {
        Transform::new(
            Quat::from_rotation_z(0.7) * Quat::from_rotation_x(0.3),
            Vec3::new(10.0, -4.0, 2.5),
            Vec3::splat(2.0),
        )
    }

    #[test]
    fn test_then_applies_left_first() {
        let a = Transform::from_translation(Vec3::X);
        let b = Transform::from_rotation(Quat::from_rotation_z(FRAC_PI_2));
        let p = (a * b).transform_position(Vec3::ZERO);
        // Translate to +X, then rotate a quarter turn about Z into +Y.
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_composition_matches_sequential_application() {
        let a = sample();
        let b = Transform::new(Quat::from_rotation_y(-0.4), Vec3::new(1.0, 2.0, 3.0), Vec3::ONE);
        let p = Vec3::new(0.5, -1.5, 4.0);
        let composed = (a * b).transform_position(p);
        let sequential = b.transform_position(a.transform_position(p));
        assert!(composed.abs_diff_eq(sequential, 1e-4));
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = sample();
        let p = Vec3::new(3.0, 7.0, -2.0);
        let back = t.inverse().transform_position(t.transform_position(p));
        assert!(back.abs_diff_eq(p, 1e-4));
        assert!((t * t.inverse()).equals(&Transform::IDENTITY, 1e-4));
    }

    #[test]
    fn test_inverse_transform_position_matches_inverse() {
        let t = sample();
        let p = Vec3::new(-6.0, 1.0, 9.0);
        assert!(t
            .inverse_transform_position(p)
            .abs_diff_eq(t.inverse().transform_position(p), 1e-4));
    }

    #[test]
    fn test_vector_no_scale_ignores_scale() {
        let t = Transform::new(Quat::IDENTITY, Vec3::new(5.0, 5.0, 5.0), Vec3::splat(3.0));
        assert_eq!(t.transform_vector_no_scale(Vec3::X), Vec3::X);
        assert_eq!(t.transform_vector(Vec3::X), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_blend_halfway() {
        let a = Transform::IDENTITY;
        let b = Transform::new(Quat::IDENTITY, Vec3::new(10.0, 0.0, 0.0), Vec3::splat(3.0));
        let mid = Transform::blend(&a, &b, 0.5);
        assert_relative_eq!(mid.translation.x, 5.0);
        assert_relative_eq!(mid.scale.x, 2.0);
    }

    #[test]
    fn test_equals_accepts_negated_quaternion() {
        let t = sample();
        let mut negated = t;
        negated.rotation = -t.rotation;
        assert!(t.equals(&negated, 1e-6));
        assert!(!t.equals(&Transform::IDENTITY, 1e-3));
    }
}
