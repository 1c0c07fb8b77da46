//! Skeleton and blend-shape schemas (UsdSkel).

use super::{GPrimAttrs, PrimCore, Relationship, TypedAttribute, UniformAttribute};
use crate::token::Token;
use crate::util::{DMat4, Quat, Vec3};

/// Root of a skinnable subtree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkelRoot {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    /// `skel:skeleton` binding relationship.
    pub skeleton: Option<Relationship>,
    /// `skel:animationSource` binding relationship.
    pub animation_source: Option<Relationship>,
}

/// Joint hierarchy with bind and rest transforms.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Skeleton {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    /// Joint paths, e.g. `"hips/spine/neck"` tokens.
    pub joints: UniformAttribute<Vec<Token>>,
    /// Optional per-joint display names.
    pub joint_names: UniformAttribute<Vec<Token>>,
    /// World-space bind transforms, one matrix per joint.
    pub bind_transforms: UniformAttribute<Vec<DMat4>>,
    /// Local-space rest transforms, one matrix per joint.
    pub rest_transforms: UniformAttribute<Vec<DMat4>>,
    /// `skel:animationSource` binding relationship.
    pub animation_source: Option<Relationship>,
}

/// Joint animation: translate/rotate/scale channels plus blend-shape
/// weights.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkelAnimation {
    pub core: PrimCore,
    pub joints: UniformAttribute<Vec<Token>>,
    pub translations: TypedAttribute<Vec<Vec3>>,
    pub rotations: TypedAttribute<Vec<Quat>>,
    pub scales: TypedAttribute<Vec<crate::util::HVec3>>,
    pub blend_shapes: UniformAttribute<Vec<Token>>,
    pub blend_shape_weights: TypedAttribute<Vec<f32>>,
}

/// Sparse blend-shape deltas.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlendShape {
    pub core: PrimCore,
    /// Position offsets, one per entry in `point_indices`.
    pub offsets: UniformAttribute<Vec<Vec3>>,
    pub normal_offsets: UniformAttribute<Vec<Vec3>>,
    /// Indices into the base mesh's points this shape deforms.
    pub point_indices: UniformAttribute<Vec<i32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_default() {
        let s = Skeleton::default();
        assert!(!s.joints.authored());
        assert!(s.animation_source.is_none());
    }

    #[test]
    fn test_blend_shape_slots() {
        let mut b = BlendShape::default();
        b.offsets.set_value(vec![Vec3::X]);
        b.point_indices.set_value(vec![0]);
        assert!(b.offsets.authored());
        assert_eq!(b.offsets.value().unwrap().len(), 1);
    }
}
