//! Geometry schema reconstructors.

use super::{
    add_residual_prop, build_xform_ops, fill_core, parse_enum_attr, parse_gprim_prop,
    parse_single_target_rel, parse_target_paths_rel, parse_typed_attr, parse_uniform_attr,
    parse_uniform_enum_attr, try_prop, PropertySet,
};
use crate::prim::geom::*;
use crate::prim::{Axis, Prim};
use crate::util::Result;

/// Shared preamble: build xform ops, then loop the props through the
/// per-type matchers.
macro_rules! reconstruct_body {
    ($prim:expr, $warnings:expr, $out:expr, $table:ident, $name:ident, $prop:ident, $($matchers:tt)*) => {{
        let mut $table = PropertySet::new();
        fill_core(&mut $out.core, $prim);
        $out.gprim.xform_ops = build_xform_ops(&mut $table, &$prim.props)?;
        for ($name, $prop) in &$prim.props {
            if $table.contains($name.as_str()) {
                continue;
            }
            $($matchers)*
            try_prop!(parse_gprim_prop(&mut $table, $name, $prop, &mut $out.gprim));
            add_residual_prop(&mut $out.core, $name, $prop, $warnings);
        }
        Ok($out)
    }};
}

pub fn reconstruct_xform(prim: &Prim, warnings: &mut Vec<String>) -> Result<Xform> {
    let mut out = Xform::default();
    reconstruct_body!(prim, warnings, out, table, name, prop,)
}

pub fn reconstruct_scope(prim: &Prim, warnings: &mut Vec<String>) -> Result<Scope> {
    let mut out = Scope::default();
    reconstruct_body!(prim, warnings, out, table, name, prop,)
}

pub fn reconstruct_model(prim: &Prim, warnings: &mut Vec<String>) -> Result<Model> {
    let mut out = Model::default();
    reconstruct_body!(prim, warnings, out, table, name, prop,)
}

pub fn reconstruct_sphere(prim: &Prim, warnings: &mut Vec<String>) -> Result<GeomSphere> {
    let mut out = GeomSphere::default();
    reconstruct_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_typed_attr(&mut table, name, prop, "radius", &mut out.radius));
    )
}

pub fn reconstruct_cube(prim: &Prim, warnings: &mut Vec<String>) -> Result<GeomCube> {
    let mut out = GeomCube::default();
    reconstruct_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_typed_attr(&mut table, name, prop, "size", &mut out.size));
    )
}

macro_rules! radial_reconstructor {
    ($fn_name:ident, $ty:ty) => {
        pub fn $fn_name(prim: &Prim, warnings: &mut Vec<String>) -> Result<$ty> {
            let mut out = <$ty>::default();
            reconstruct_body!(prim, warnings, out, table, name, prop,
                try_prop!(parse_typed_attr(&mut table, name, prop, "height", &mut out.height));
                try_prop!(parse_typed_attr(&mut table, name, prop, "radius", &mut out.radius));
                try_prop!(parse_uniform_enum_attr(
                    &mut table, name, prop, "axis",
                    Axis::ALLOWED, Axis::from_token, &mut out.axis,
                ));
            )
        }
    };
}

radial_reconstructor!(reconstruct_cone, GeomCone);
radial_reconstructor!(reconstruct_cylinder, GeomCylinder);
radial_reconstructor!(reconstruct_capsule, GeomCapsule);

pub fn reconstruct_mesh(prim: &Prim, warnings: &mut Vec<String>) -> Result<GeomMesh> {
    let mut out = GeomMesh::default();
    reconstruct_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_typed_attr(&mut table, name, prop, "points", &mut out.points));
        try_prop!(parse_typed_attr(&mut table, name, prop, "normals", &mut out.normals));
        try_prop!(parse_typed_attr(&mut table, name, prop, "velocities", &mut out.velocities));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "faceVertexCounts", &mut out.face_vertex_counts
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "faceVertexIndices", &mut out.face_vertex_indices
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "cornerIndices", &mut out.corner_indices
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "cornerSharpnesses", &mut out.corner_sharpnesses
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "creaseIndices", &mut out.crease_indices
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "creaseLengths", &mut out.crease_lengths
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "creaseSharpnesses", &mut out.crease_sharpnesses
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "holeIndices", &mut out.hole_indices
        ));
        try_prop!(parse_enum_attr(
            &mut table, name, prop, "interpolateBoundary",
            InterpolateBoundary::ALLOWED, InterpolateBoundary::from_token,
            &mut out.interpolate_boundary,
        ));
        try_prop!(parse_uniform_enum_attr(
            &mut table, name, prop, "subdivisionScheme",
            SubdivisionScheme::ALLOWED, SubdivisionScheme::from_token,
            &mut out.subdivision_scheme,
        ));
        try_prop!(parse_enum_attr(
            &mut table, name, prop, "faceVaryingLinearInterpolation",
            FaceVaryingLinearInterpolation::ALLOWED,
            FaceVaryingLinearInterpolation::from_token,
            &mut out.face_varying_linear_interpolation,
        ));
        try_prop!(parse_single_target_rel(
            &mut table, name, prop, "skel:skeleton", &mut out.skel_skeleton
        ));
        try_prop!(parse_target_paths_rel(
            &mut table, name, prop, "skel:blendShapeTargets", &mut out.skel_blend_shape_targets
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "skel:blendShapes", &mut out.skel_blend_shapes
        ));
    )
}

pub fn reconstruct_points(prim: &Prim, warnings: &mut Vec<String>) -> Result<GeomPoints> {
    let mut out = GeomPoints::default();
    reconstruct_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_typed_attr(&mut table, name, prop, "points", &mut out.points));
        try_prop!(parse_typed_attr(&mut table, name, prop, "normals", &mut out.normals));
        try_prop!(parse_typed_attr(&mut table, name, prop, "widths", &mut out.widths));
        try_prop!(parse_typed_attr(&mut table, name, prop, "ids", &mut out.ids));
        try_prop!(parse_typed_attr(&mut table, name, prop, "velocities", &mut out.velocities));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "accelerations", &mut out.accelerations
        ));
    )
}

pub fn reconstruct_basis_curves(
    prim: &Prim,
    warnings: &mut Vec<String>,
) -> Result<GeomBasisCurves> {
    let mut out = GeomBasisCurves::default();
    reconstruct_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_uniform_enum_attr(
            &mut table, name, prop, "type",
            CurveType::ALLOWED, CurveType::from_token, &mut out.curve_type,
        ));
        try_prop!(parse_uniform_enum_attr(
            &mut table, name, prop, "basis",
            CurveBasis::ALLOWED, CurveBasis::from_token, &mut out.basis,
        ));
        try_prop!(parse_uniform_enum_attr(
            &mut table, name, prop, "wrap",
            CurveWrap::ALLOWED, CurveWrap::from_token, &mut out.wrap,
        ));
        try_prop!(parse_typed_attr(&mut table, name, prop, "points", &mut out.points));
        try_prop!(parse_typed_attr(&mut table, name, prop, "normals", &mut out.normals));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "curveVertexCounts", &mut out.curve_vertex_counts
        ));
        try_prop!(parse_typed_attr(&mut table, name, prop, "widths", &mut out.widths));
        try_prop!(parse_typed_attr(&mut table, name, prop, "velocities", &mut out.velocities));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "accelerations", &mut out.accelerations
        ));
    )
}

pub fn reconstruct_geom_subset(prim: &Prim, warnings: &mut Vec<String>) -> Result<GeomSubset> {
    let mut out = GeomSubset::default();
    let mut table = PropertySet::new();
    fill_core(&mut out.core, prim);
    // GeomSubset is not boundable: no gprim attrs, no xform ops.
    for (name, prop) in &prim.props {
        try_prop!(parse_uniform_enum_attr(
            &mut table,
            name,
            prop,
            "elementType",
            SubsetElementType::ALLOWED,
            SubsetElementType::from_token,
            &mut out.element_type,
        ));
        try_prop!(parse_uniform_attr(
            &mut table,
            name,
            prop,
            "familyName",
            &mut out.family_name
        ));
        try_prop!(parse_typed_attr(
            &mut table,
            name,
            prop,
            "indices",
            &mut out.indices
        ));
        add_residual_prop(&mut out.core, name, prop, warnings);
    }
    Ok(out)
}

pub fn reconstruct_camera(prim: &Prim, warnings: &mut Vec<String>) -> Result<GeomCamera> {
    let mut out = GeomCamera::default();
    reconstruct_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "clippingPlanes", &mut out.clipping_planes
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "clippingRange", &mut out.clipping_range
        ));
        try_prop!(parse_typed_attr(&mut table, name, prop, "exposure", &mut out.exposure));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "focalLength", &mut out.focal_length
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "focusDistance", &mut out.focus_distance
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "horizontalAperture", &mut out.horizontal_aperture
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "horizontalApertureOffset",
            &mut out.horizontal_aperture_offset
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "verticalAperture", &mut out.vertical_aperture
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "verticalApertureOffset",
            &mut out.vertical_aperture_offset
        ));
        try_prop!(parse_typed_attr(&mut table, name, prop, "fStop", &mut out.f_stop));
        try_prop!(parse_enum_attr(
            &mut table, name, prop, "projection",
            Projection::ALLOWED, Projection::from_token, &mut out.projection,
        ));
        try_prop!(parse_uniform_enum_attr(
            &mut table, name, prop, "stereoRole",
            StereoRole::ALLOWED, StereoRole::from_token, &mut out.stereo_role,
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "shutter:open", &mut out.shutter_open
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "shutter:close", &mut out.shutter_close
        ));
    )
}

pub fn reconstruct_point_instancer(
    prim: &Prim,
    warnings: &mut Vec<String>,
) -> Result<PointInstancer> {
    let mut out = PointInstancer::default();
    reconstruct_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_target_paths_rel(
            &mut table, name, prop, "prototypes", &mut out.prototypes
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "protoIndices", &mut out.proto_indices
        ));
        try_prop!(parse_typed_attr(&mut table, name, prop, "ids", &mut out.ids));
        try_prop!(parse_typed_attr(&mut table, name, prop, "positions", &mut out.positions));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "orientations", &mut out.orientations
        ));
        try_prop!(parse_typed_attr(&mut table, name, prop, "scales", &mut out.scales));
        try_prop!(parse_typed_attr(&mut table, name, prop, "velocities", &mut out.velocities));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "accelerations", &mut out.accelerations
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "angularVelocities", &mut out.angular_velocities
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "invisibleIds", &mut out.invisible_ids
        ));
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prim::{AttrValue, Attribute, Property};
    use crate::util::Error;
    use crate::value::{TimeSamples, Value};

    fn sphere_prim(radius: Property) -> Prim {
        let mut prim = Prim::new(crate::value::Specifier::Def, "Sphere", "ball");
        prim.props.insert("radius".to_string(), radius);
        prim
    }

    #[test]
    fn test_sphere_scalar_radius() {
        let prim = sphere_prim(Property::Attribute(Attribute::scalar(
            "double",
            Value::Double(1.2),
        )));
        let mut warnings = Vec::new();
        let sphere = reconstruct_sphere(&prim, &mut warnings).unwrap();
        assert_eq!(sphere.radius.get_or_fallback(), Some(1.2));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_sphere_timesampled_radius() {
        let mut ts = TimeSamples::new();
        ts.add_sample(0.0, Value::Double(1.2));
        ts.add_sample(1.0, Value::Double(2.3));
        let mut attr = Attribute::default();
        attr.type_name = "double".to_string();
        attr.value = AttrValue::TimeSamples(ts);

        let prim = sphere_prim(Property::Attribute(attr));
        let mut warnings = Vec::new();
        let sphere = reconstruct_sphere(&prim, &mut warnings).unwrap();
        assert!(sphere.radius.is_timesamples());
        let ts = sphere.radius.timesamples().unwrap();
        assert_eq!(ts.times(), vec![0.0, 1.0]);
        assert_eq!(ts.sample_held(0.0), Some(1.2));
        assert_eq!(ts.sample_held(1.0), Some(2.3));
    }

    #[test]
    fn test_sphere_blocked_radius() {
        let prim = sphere_prim(Property::Attribute(Attribute::blocked("double")));
        let mut warnings = Vec::new();
        let sphere = reconstruct_sphere(&prim, &mut warnings).unwrap();
        assert!(sphere.radius.is_blocked());
        assert!(!sphere.radius.is_connection());
    }

    #[test]
    fn test_sphere_radius_type_mismatch() {
        let prim = sphere_prim(Property::Attribute(Attribute::scalar(
            "int",
            Value::Int(1),
        )));
        let mut warnings = Vec::new();
        let err = reconstruct_sphere(&prim, &mut warnings).unwrap_err();
        match err {
            Error::TypeMismatch { expected, actual } => {
                assert!(expected.contains("double"));
                assert!(expected.contains("radius"));
                assert!(actual.contains("int"));
            }
            other => panic!("expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_property_preserved() {
        let mut prim = Prim::new(crate::value::Specifier::Def, "Sphere", "ball");
        prim.props.insert(
            "myCustomThing".to_string(),
            Property::Attribute(Attribute::scalar("int", Value::Int(7))),
        );
        let mut warnings = Vec::new();
        let sphere = reconstruct_sphere(&prim, &mut warnings).unwrap();
        assert!(sphere.core.props.contains_key("myCustomThing"));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_primvars_preserved_without_warning() {
        let mut prim = Prim::new(crate::value::Specifier::Def, "Mesh", "m");
        prim.props.insert(
            "primvars:displayColor".to_string(),
            Property::Attribute(Attribute::scalar(
                "color3f[]",
                Value::Vec3fArray(vec![crate::util::Vec3::ONE]),
            )),
        );
        let mut warnings = Vec::new();
        let mesh = reconstruct_mesh(&prim, &mut warnings).unwrap();
        assert!(mesh.core.props.contains_key("primvars:displayColor"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_subset_enum_validation() {
        let mut prim = Prim::new(crate::value::Specifier::Def, "GeomSubset", "s");
        prim.props.insert(
            "elementType".to_string(),
            Property::Attribute(
                Attribute::scalar("token", Value::Token(crate::token::Token::new("edge")))
                    .uniform(),
            ),
        );
        let mut warnings = Vec::new();
        let err = reconstruct_geom_subset(&prim, &mut warnings).unwrap_err();
        assert!(matches!(err, Error::UnknownEnum { .. }));
    }
}
