//! Skeleton family reconstructors.

use super::{
    add_residual_prop, build_xform_ops, fill_core, parse_gprim_prop, parse_single_target_rel,
    parse_typed_attr, parse_uniform_attr, try_prop, PropertySet,
};
use crate::prim::skel::*;
use crate::prim::Prim;
use crate::util::Result;

pub fn reconstruct_skel_root(prim: &Prim, warnings: &mut Vec<String>) -> Result<SkelRoot> {
    let mut out = SkelRoot::default();
    let mut table = PropertySet::new();
    fill_core(&mut out.core, prim);
    out.gprim.xform_ops = build_xform_ops(&mut table, &prim.props)?;
    for (name, prop) in &prim.props {
        if table.contains(name.as_str()) {
            continue;
        }
        try_prop!(parse_single_target_rel(
            &mut table,
            name,
            prop,
            "skel:skeleton",
            &mut out.skeleton
        ));
        try_prop!(parse_single_target_rel(
            &mut table,
            name,
            prop,
            "skel:animationSource",
            &mut out.animation_source
        ));
        try_prop!(parse_gprim_prop(&mut table, name, prop, &mut out.gprim));
        add_residual_prop(&mut out.core, name, prop, warnings);
    }
    Ok(out)
}

pub fn reconstruct_skeleton(prim: &Prim, warnings: &mut Vec<String>) -> Result<Skeleton> {
    let mut out = Skeleton::default();
    let mut table = PropertySet::new();
    fill_core(&mut out.core, prim);
    out.gprim.xform_ops = build_xform_ops(&mut table, &prim.props)?;
    for (name, prop) in &prim.props {
        if table.contains(name.as_str()) {
            continue;
        }
        try_prop!(parse_uniform_attr(&mut table, name, prop, "joints", &mut out.joints));
        try_prop!(parse_uniform_attr(
            &mut table,
            name,
            prop,
            "jointNames",
            &mut out.joint_names
        ));
        try_prop!(parse_uniform_attr(
            &mut table,
            name,
            prop,
            "bindTransforms",
            &mut out.bind_transforms
        ));
        try_prop!(parse_uniform_attr(
            &mut table,
            name,
            prop,
            "restTransforms",
            &mut out.rest_transforms
        ));
        try_prop!(parse_single_target_rel(
            &mut table,
            name,
            prop,
            "skel:animationSource",
            &mut out.animation_source
        ));
        try_prop!(parse_gprim_prop(&mut table, name, prop, &mut out.gprim));
        add_residual_prop(&mut out.core, name, prop, warnings);
    }
    Ok(out)
}

pub fn reconstruct_skel_animation(
    prim: &Prim,
    warnings: &mut Vec<String>,
) -> Result<SkelAnimation> {
    let mut out = SkelAnimation::default();
    let mut table = PropertySet::new();
    fill_core(&mut out.core, prim);
    for (name, prop) in &prim.props {
        try_prop!(parse_uniform_attr(&mut table, name, prop, "joints", &mut out.joints));
        try_prop!(parse_typed_attr(
            &mut table,
            name,
            prop,
            "translations",
            &mut out.translations
        ));
        try_prop!(parse_typed_attr(
            &mut table,
            name,
            prop,
            "rotations",
            &mut out.rotations
        ));
        try_prop!(parse_typed_attr(&mut table, name, prop, "scales", &mut out.scales));
        try_prop!(parse_uniform_attr(
            &mut table,
            name,
            prop,
            "blendShapes",
            &mut out.blend_shapes
        ));
        try_prop!(parse_typed_attr(
            &mut table,
            name,
            prop,
            "blendShapeWeights",
            &mut out.blend_shape_weights
        ));
        add_residual_prop(&mut out.core, name, prop, warnings);
    }
    Ok(out)
}

pub fn reconstruct_blend_shape(prim: &Prim, warnings: &mut Vec<String>) -> Result<BlendShape> {
    let mut out = BlendShape::default();
    let mut table = PropertySet::new();
    fill_core(&mut out.core, prim);
    for (name, prop) in &prim.props {
        try_prop!(parse_uniform_attr(&mut table, name, prop, "offsets", &mut out.offsets));
        try_prop!(parse_uniform_attr(
            &mut table,
            name,
            prop,
            "normalOffsets",
            &mut out.normal_offsets
        ));
        try_prop!(parse_uniform_attr(
            &mut table,
            name,
            prop,
            "pointIndices",
            &mut out.point_indices
        ));
        add_residual_prop(&mut out.core, name, prop, warnings);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prim::{Attribute, Property};
    use crate::token::Token;
    use crate::util::Vec3;
    use crate::value::Value;

    #[test]
    fn test_skeleton_joints() {
        let mut prim = Prim::new(crate::value::Specifier::Def, "Skeleton", "rig");
        prim.props.insert(
            "joints".to_string(),
            Property::Attribute(
                Attribute::scalar(
                    "token[]",
                    Value::TokenArray(vec![
                        Token::new("hips"),
                        Token::new("hips/spine"),
                    ]),
                )
                .uniform(),
            ),
        );
        let mut warnings = Vec::new();
        let skel = reconstruct_skeleton(&prim, &mut warnings).unwrap();
        let joints = skel.joints.value().unwrap();
        assert_eq!(joints.len(), 2);
        assert_eq!(joints[1].as_str(), "hips/spine");
    }

    #[test]
    fn test_blend_shape_offsets() {
        let mut prim = Prim::new(crate::value::Specifier::Def, "BlendShape", "smile");
        prim.props.insert(
            "offsets".to_string(),
            Property::Attribute(
                Attribute::scalar("vector3f[]", Value::Vec3fArray(vec![Vec3::X, Vec3::Y]))
                    .uniform(),
            ),
        );
        prim.props.insert(
            "pointIndices".to_string(),
            Property::Attribute(
                Attribute::scalar("int[]", Value::IntArray(vec![4, 9])).uniform(),
            ),
        );
        let mut warnings = Vec::new();
        let bs = reconstruct_blend_shape(&prim, &mut warnings).unwrap();
        assert_eq!(bs.offsets.value().unwrap().len(), 2);
        assert_eq!(bs.point_indices.value().unwrap(), &vec![4, 9]);
    }
}
