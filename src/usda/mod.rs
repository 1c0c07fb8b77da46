//! ASCII (`.usda`) container parsing.
//!
//! A hand-written recursive descent parser over a cursor-tracked byte
//! stream, producing the same generic prim tree as the Crate decoder.

mod lexer;
mod parser;

pub use lexer::{Cursor, Lexer};
pub use parser::{is_usda, AsciiParser, Diagnostic};

use crate::prim::{Prim, StageMeta};
use crate::util::Result;

/// Parse an ASCII buffer into stage metadata, root prims, and collected
/// warnings.
pub fn parse_usda(buf: &[u8]) -> Result<(StageMeta, Vec<Prim>, Vec<String>)> {
    let mut parser = AsciiParser::new(buf);
    let (meta, prims) = parser.parse()?;
    let warnings = parser
        .warnings()
        .iter()
        .map(|d| {
            format!(
                "{} (at {}:{})",
                d.message,
                d.cursor.row + 1,
                d.cursor.col + 1
            )
        })
        .collect();
    Ok((meta, prims, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prim::{AttrValue, Property};
    use crate::value::{Specifier, Value};

    #[test]
    fn test_is_usda() {
        assert!(is_usda(b"#usda 1.0\n"));
        assert!(is_usda(b"#usda 1.0"));
        assert!(!is_usda(b"#usd 1.0\n"));
        assert!(!is_usda(b"PXR-USDC"));
        assert!(!is_usda(b"#usda one\n"));
    }

    #[test]
    fn test_minimal_document() {
        let src = br#"#usda 1.0
(
    defaultPrim = "World"
    upAxis = "Y"
    metersPerUnit = 0.01
)

def Xform "World"
{
    def Sphere "ball"
    {
        double radius = 1.5
    }
}
"#;
        let (meta, prims, warnings) = parse_usda(src).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(meta.default_prim.as_ref().unwrap().as_str(), "World");
        assert_eq!(meta.up_axis, Some(crate::prim::Axis::Y));
        assert_eq!(meta.meters_per_unit, Some(0.01));

        assert_eq!(prims.len(), 1);
        let world = &prims[0];
        assert_eq!(world.name, "World");
        assert_eq!(world.prim_type, "Xform");
        assert_eq!(world.spec, Specifier::Def);

        let ball = &world.children[0];
        assert_eq!(ball.prim_type, "Sphere");
        let Property::Attribute(radius) = &ball.props["radius"] else {
            panic!("radius must be an attribute");
        };
        assert_eq!(radius.value, AttrValue::Scalar(Value::Double(1.5)));
    }

    #[test]
    fn test_time_samples() {
        let src = br#"#usda 1.0

def Sphere "ball"
{
    double radius.timeSamples = {
        0: 1.2,
        1: 2.3,
    }
}
"#;
        let (_, prims, _) = parse_usda(src).unwrap();
        let Property::Attribute(radius) = &prims[0].props["radius"] else {
            panic!();
        };
        let AttrValue::TimeSamples(ts) = &radius.value else {
            panic!("expected time samples");
        };
        assert_eq!(ts.times(), vec![0.0, 1.0]);
        assert_eq!(ts.samples()[0].value, Some(Value::Double(1.2)));
        assert_eq!(ts.samples()[1].value, Some(Value::Double(2.3)));
    }

    #[test]
    fn test_blocked_and_connection() {
        let src = br#"#usda 1.0

def Shader "s"
{
    float inputs:roughness = None
    color3f inputs:diffuseColor.connect = </Mat/Tex.outputs:rgb>
}
"#;
        let (_, prims, _) = parse_usda(src).unwrap();
        let Property::Attribute(rough) = &prims[0].props["inputs:roughness"] else {
            panic!();
        };
        assert_eq!(rough.value, AttrValue::Blocked);

        let Property::Attribute(conn) = &prims[0].props["inputs:diffuseColor.connect"] else {
            panic!();
        };
        assert!(conn.is_connection());
        assert_eq!(
            conn.connections[0].full_path(),
            "/Mat/Tex.outputs:rgb"
        );
    }

    #[test]
    fn test_arrays_and_tuples() {
        let src = br#"#usda 1.0

def Mesh "m"
{
    point3f[] points = [(0, 0, 0), (1, 0, 0), (0, 1, 0)]
    int[] faceVertexIndices = [0, 1, 2,]
    uniform token subdivisionScheme = "none"
}
"#;
        let (_, prims, _) = parse_usda(src).unwrap();
        let Property::Attribute(points) = &prims[0].props["points"] else {
            panic!();
        };
        assert_eq!(points.type_name, "point3f[]");
        let AttrValue::Scalar(Value::Vec3fArray(pts)) = &points.value else {
            panic!("points must parse as float3[]");
        };
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[1], crate::util::Vec3::X);

        let Property::Attribute(subdiv) = &prims[0].props["subdivisionScheme"] else {
            panic!();
        };
        assert_eq!(subdiv.variability, Variability::Uniform);
    }

    use crate::value::Variability;

    #[test]
    fn test_prim_metas_and_references() {
        let src = br#"#usda 1.0

def Xform "rig" (
    kind = "component"
    active = true
    prepend references = @./arm.usda@</Arm>
)
{
}
"#;
        let (_, prims, _) = parse_usda(src).unwrap();
        let meta = &prims[0].meta;
        assert_eq!(meta.kind, Some(crate::prim::Kind::Component));
        assert_eq!(meta.active, Some(true));
        let (qual, refs) = meta.references.as_ref().unwrap();
        assert_eq!(*qual, crate::value::ListEditQual::Prepend);
        assert_eq!(refs[0].asset_path, "./arm.usda");
        assert_eq!(refs[0].prim_path.full_path(), "/Arm");
    }

    #[test]
    fn test_relationships() {
        let src = br#"#usda 1.0

def Mesh "m"
{
    rel material:binding = </Looks/Wood>
    rel skel:blendShapeTargets = [</Shapes/a>, </Shapes/b>]
}
"#;
        let (_, prims, _) = parse_usda(src).unwrap();
        let Property::Relationship(binding) = &prims[0].props["material:binding"] else {
            panic!();
        };
        assert_eq!(binding.single_target().unwrap().full_path(), "/Looks/Wood");

        let Property::Relationship(targets) = &prims[0].props["skel:blendShapeTargets"] else {
            panic!();
        };
        assert_eq!(targets.targets().len(), 2);
    }

    #[test]
    fn test_dictionary_duplicate_key_warns() {
        let src = br#"#usda 1.0

def Xform "x" (
    customData = {
        int a = 1
        int a = 2
    }
)
{
}
"#;
        let (_, prims, warnings) = parse_usda(src).unwrap();
        assert_eq!(
            prims[0].meta.custom_data.get("a"),
            Some(&Value::Int(2))
        );
        assert!(warnings.iter().any(|w| w.contains("duplicate")));
    }

    #[test]
    fn test_nonfinite_floats() {
        let src = br#"#usda 1.0

def Xform "x"
{
    float a = inf
    float b = -inf
    float c = nan
}
"#;
        let (_, prims, _) = parse_usda(src).unwrap();
        let get = |name: &str| -> f32 {
            let Property::Attribute(a) = &prims[0].props[name] else {
                panic!();
            };
            let AttrValue::Scalar(Value::Float(f)) = a.value else {
                panic!();
            };
            f
        };
        assert_eq!(get("a"), f32::INFINITY);
        assert_eq!(get("b"), f32::NEG_INFINITY);
        assert!(get("c").is_nan());
    }

    #[test]
    fn test_bad_header_rejected() {
        assert!(parse_usda(b"not usda").is_err());
        assert!(parse_usda(b"#usda x\n").is_err());
    }
}
