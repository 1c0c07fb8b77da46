//! `xformOpOrder` resolution.

use super::PropertySet;
use crate::prim::{AttrValue, PropertyMap, XformOp, XformOpKind};
use crate::util::{Error, Result};
use crate::value::{Value, ValueCast, Variability};

/// Split `tok` against an op prefix, returning the namespace suffix:
/// `""` for the bare op, `pivot` for `xformOp:translate:pivot`, `None`
/// when the prefix does not match or the suffix is malformed.
fn split_op_token(tok: &str, prefix: &str) -> Option<String> {
    let rest = tok.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some(String::new());
    }
    let rest = rest.strip_prefix(':')?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_string())
}

fn value_is_vec3(v: &Value) -> bool {
    matches!(v, Value::Vec3f(_) | Value::Vec3d(_))
}

fn value_is_scalar_fp(v: &Value) -> bool {
    matches!(v, Value::Float(_) | Value::Double(_))
}

fn value_is_quat(v: &Value) -> bool {
    matches!(v, Value::Quatf(_) | Value::Quatd(_))
}

fn value_is_matrix4(v: &Value) -> bool {
    matches!(v, Value::Matrix4d(_))
}

/// `(kind, accepted payload, diagnostic)` per op prefix, tried in order.
/// Longer prefixes come first so `rotateXYZ` never matches `rotateX`.
const OP_TABLE: &[(XformOpKind, fn(&Value) -> bool, &str)] = &[
    (XformOpKind::Transform, value_is_matrix4, "matrix4d"),
    (XformOpKind::Translate, value_is_vec3, "double3 or float3"),
    (XformOpKind::Scale, value_is_vec3, "double3 or float3"),
    (XformOpKind::RotateXYZ, value_is_vec3, "double3 or float3"),
    (XformOpKind::RotateXZY, value_is_vec3, "double3 or float3"),
    (XformOpKind::RotateYXZ, value_is_vec3, "double3 or float3"),
    (XformOpKind::RotateYZX, value_is_vec3, "double3 or float3"),
    (XformOpKind::RotateZXY, value_is_vec3, "double3 or float3"),
    (XformOpKind::RotateZYX, value_is_vec3, "double3 or float3"),
    (XformOpKind::RotateX, value_is_scalar_fp, "double or float"),
    (XformOpKind::RotateY, value_is_scalar_fp, "double or float"),
    (XformOpKind::RotateZ, value_is_scalar_fp, "double or float"),
    (XformOpKind::Orient, value_is_quat, "quatf or quatd"),
];

/// Build the ordered op list from `xformOpOrder` and the `xformOp:*`
/// attributes it names. Claimed attributes go into `table` so the
/// per-property loop skips them.
pub fn build_xform_ops(table: &mut PropertySet, props: &PropertyMap) -> Result<Vec<XformOp>> {
    let mut ops = Vec::new();

    let Some(order_prop) = props.get("xformOpOrder") else {
        table.insert("xformOpOrder".to_string());
        return Ok(ops);
    };
    if order_prop.is_relationship() {
        return Err(Error::invalid(
            "relationship for `xformOpOrder` is not supported",
        ));
    }
    let order_attr = order_prop
        .as_attribute()
        .ok_or_else(|| Error::internal("`xformOpOrder` is neither attribute nor relationship"))?;
    if order_attr.variability != Variability::Uniform {
        return Err(Error::VariabilityMismatch(
            "`xformOpOrder` must have `uniform` variability".to_string(),
        ));
    }
    let tokens: Vec<crate::token::Token> = order_attr
        .get_scalar()
        .and_then(Vec::from_value)
        .ok_or_else(|| {
            Error::TypeMismatch {
                expected: "`token[]` for `xformOpOrder`".to_string(),
                actual: format!("`{}`", order_attr.type_name),
            }
        })?;

    for (i, item) in tokens.iter().enumerate() {
        let mut tok = item.as_str();

        if tok.starts_with("!resetXformStack!") {
            if tok != "!resetXformStack!" {
                return Err(Error::invalid(
                    "`!resetXformStack!` must stand alone, not prefix an `xformOp:*` token",
                ));
            }
            if i != 0 {
                return Err(Error::invalid(
                    "`!resetXformStack!` must be the first element of `xformOpOrder`",
                ));
            }
            ops.push(XformOp::reset_xform_stack());
            continue;
        }

        let mut inverted = false;
        if let Some(rest) = tok.strip_prefix("!invert!") {
            inverted = true;
            tok = rest;
        }

        let prop = props
            .get(tok)
            .ok_or_else(|| Error::invalid(format!("xform op property `{}` not found", tok)))?;
        if prop.is_connection() {
            return Err(Error::ConnectionNotAllowed(format!(
                "connection of xform op property `{}` is not supported",
                tok
            )));
        }
        let attr = prop
            .as_attribute()
            .ok_or_else(|| Error::invalid(format!("`{}` must be an attribute", tok)))?;

        let mut matched = None;
        for (kind, accepts, expected) in OP_TABLE {
            let Some(suffix) = split_op_token(tok, kind.token_prefix()) else {
                continue;
            };
            match &attr.value {
                AttrValue::TimeSamples(_) => {}
                AttrValue::Scalar(v) if accepts(v) => {}
                other => {
                    let got = match other {
                        AttrValue::Scalar(v) => v.type_name(),
                        _ => "no value",
                    };
                    return Err(Error::TypeMismatch {
                        expected: format!("`{}` for `{}`", expected, kind.token_prefix()),
                        actual: format!("`{}`", got),
                    });
                }
            }
            matched = Some(XformOp {
                kind: *kind,
                suffix,
                inverted,
                value: attr.value.clone(),
            });
            break;
        }

        let op = matched.ok_or_else(|| {
            Error::invalid(format!(
                "token `{}` in `xformOpOrder` must use the `xformOp:*` namespace",
                tok
            ))
        })?;
        ops.push(op);
        table.insert(tok.to_string());
    }

    table.insert("xformOpOrder".to_string());
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prim::{Attribute, Property};
    use crate::token::Token;
    use crate::util::{DVec3, Vec3};
    use std::collections::BTreeMap;

    fn token_array(items: &[&str]) -> Property {
        Property::Attribute(
            Attribute::scalar(
                "token[]",
                Value::TokenArray(items.iter().map(|s| Token::new(*s)).collect()),
            )
            .uniform(),
        )
    }

    #[test]
    fn test_reset_invert_order() {
        let mut props: BTreeMap<String, Property> = BTreeMap::new();
        props.insert(
            "xformOpOrder".to_string(),
            token_array(&[
                "!resetXformStack!",
                "xformOp:translate",
                "!invert!xformOp:rotateY",
            ]),
        );
        props.insert(
            "xformOp:translate".to_string(),
            Property::Attribute(Attribute::scalar(
                "double3",
                Value::Vec3d(DVec3::new(1.0, 2.0, 3.0)),
            )),
        );
        props.insert(
            "xformOp:rotateY".to_string(),
            Property::Attribute(Attribute::scalar("float", Value::Float(45.0))),
        );

        let mut table = PropertySet::new();
        let ops = build_xform_ops(&mut table, &props).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].kind, XformOpKind::ResetXformStack);
        assert_eq!(ops[0].value, AttrValue::Empty);
        assert_eq!(ops[1].kind, XformOpKind::Translate);
        assert!(!ops[1].inverted);
        assert_eq!(ops[2].kind, XformOpKind::RotateY);
        assert!(ops[2].inverted);
        assert!(table.contains("xformOp:translate"));
        assert!(table.contains("xformOpOrder"));
    }

    #[test]
    fn test_suffixed_ops_keep_their_own_suffix() {
        let mut props: BTreeMap<String, Property> = BTreeMap::new();
        props.insert(
            "xformOpOrder".to_string(),
            token_array(&["xformOp:rotateY:pivot", "xformOp:rotateZ:lid"]),
        );
        props.insert(
            "xformOp:rotateY:pivot".to_string(),
            Property::Attribute(Attribute::scalar("double", Value::Double(10.0))),
        );
        props.insert(
            "xformOp:rotateZ:lid".to_string(),
            Property::Attribute(Attribute::scalar("double", Value::Double(20.0))),
        );

        let mut table = PropertySet::new();
        let ops = build_xform_ops(&mut table, &props).unwrap();
        assert_eq!(ops[0].kind, XformOpKind::RotateY);
        assert_eq!(ops[0].suffix, "pivot");
        assert_eq!(ops[1].kind, XformOpKind::RotateZ);
        assert_eq!(ops[1].suffix, "lid");
    }

    #[test]
    fn test_reset_must_be_first() {
        let mut props: BTreeMap<String, Property> = BTreeMap::new();
        props.insert(
            "xformOpOrder".to_string(),
            token_array(&["xformOp:scale", "!resetXformStack!"]),
        );
        props.insert(
            "xformOp:scale".to_string(),
            Property::Attribute(Attribute::scalar("float3", Value::Vec3f(Vec3::ONE))),
        );
        let mut table = PropertySet::new();
        assert!(build_xform_ops(&mut table, &props).is_err());
    }

    #[test]
    fn test_missing_op_property() {
        let mut props: BTreeMap<String, Property> = BTreeMap::new();
        props.insert(
            "xformOpOrder".to_string(),
            token_array(&["xformOp:translate"]),
        );
        let mut table = PropertySet::new();
        assert!(build_xform_ops(&mut table, &props).is_err());
    }

    #[test]
    fn test_wrong_payload_type() {
        let mut props: BTreeMap<String, Property> = BTreeMap::new();
        props.insert(
            "xformOpOrder".to_string(),
            token_array(&["xformOp:transform"]),
        );
        props.insert(
            "xformOp:transform".to_string(),
            Property::Attribute(Attribute::scalar("float", Value::Float(1.0))),
        );
        let mut table = PropertySet::new();
        assert!(matches!(
            build_xform_ops(&mut table, &props),
            Err(Error::TypeMismatch { .. })
        ));
    }
}
