//! Schema-driven prim reconstruction.
//!
//! Converts generic `(name, Property)` maps from either decoder into the
//! typed records in [`crate::prim`]. One generic matcher exists per slot
//! kind (varying, uniform, terminal, enum, extent, relationship); each
//! per-schema reconstructor routes every authored property through the
//! matchers and keeps whatever none of them claim in the residual map.

mod geom;
mod lux;
mod shade;
mod skel;
mod xform;

pub use xform::build_xform_ops;

use std::collections::HashSet;

use log::warn;

use crate::prim::{
    Orientation, Prim, Property, Purpose, Relationship, TerminalAttribute, TypedAttribute,
    TypedPrim, TypedPrimNode, UniformAttribute, Visibility,
};
use crate::path::Path;
use crate::util::{Error, Extent, Result, Vec3};
use crate::value::{
    underlying_type_name, Animatable, TimeSamples, TypedTimeSamples, Value, ValueCast,
    Variability,
};

/// Names already claimed for a prim; prevents `X` and `X.connect` from
/// writing the same slot twice.
pub(crate) type PropertySet = HashSet<String>;

/// Outcome of routing one property through one matcher.
pub(crate) enum ParseResult {
    Success,
    Unmatched,
    AlreadyProcessed,
    Fail(Error),
}

impl ParseResult {
    fn type_mismatch(name: &str, expected: &str, actual: &str) -> Self {
        Self::Fail(Error::TypeMismatch {
            expected: format!("`{}` for `{}`", expected, name),
            actual: format!("`{}`", actual),
        })
    }

    fn internal(msg: impl Into<String>) -> Self {
        Self::Fail(Error::internal(msg))
    }
}

/// Run a matcher; claimed properties end the per-property loop iteration,
/// hard failures bubble out.
macro_rules! try_prop {
    ($e:expr) => {
        match $e {
            $crate::reconstruct::ParseResult::Success
            | $crate::reconstruct::ParseResult::AlreadyProcessed => continue,
            $crate::reconstruct::ParseResult::Unmatched => {}
            $crate::reconstruct::ParseResult::Fail(err) => return Err(err),
        }
    };
}
pub(crate) use try_prop;

/// Map an authored type name to its storage form (`color3f[]` ->
/// `float3[]`) for comparison against a slot's expected type.
fn storage_type_name(authored: &str) -> String {
    match authored.strip_suffix("[]") {
        Some(base) => format!("{}[]", underlying_type_name(base)),
        None => underlying_type_name(authored).to_string(),
    }
}

fn type_matches(expected: &str, authored: &str) -> bool {
    // Crate files may omit an attribute's typeName; trust the payload.
    authored.is_empty() || authored == expected || storage_type_name(authored) == expected
}

/// Typed conversion of a generic sample table, preserving blocked
/// samples. `None` when any sample's payload refuses the target type.
fn convert_timesamples<T: ValueCast>(ts: &TimeSamples) -> Option<TypedTimeSamples<T>> {
    let mut out = TypedTimeSamples::new();
    for sample in ts.samples() {
        match &sample.value {
            None => out.add_blocked_sample(sample.t),
            Some(v) => out.add_sample(sample.t, T::from_value(v)?),
        }
    }
    Some(out)
}

// ----------------------------------------------------------------------
// Generic matchers
// ----------------------------------------------------------------------

/// Varying slot: accepts scalar, time samples, block, or connection.
pub(crate) fn parse_typed_attr<T: ValueCast>(
    table: &mut PropertySet,
    prop_name: &str,
    prop: &Property,
    name: &str,
    target: &mut TypedAttribute<T>,
) -> ParseResult {
    if let Some(base) = prop_name.strip_suffix(".connect") {
        if base != name {
            return ParseResult::Unmatched;
        }
        if table.contains(name) {
            return ParseResult::AlreadyProcessed;
        }
        let Some(attr) = prop.as_attribute() else {
            return ParseResult::internal(format!(
                "`{}` must be an attribute connection",
                prop_name
            ));
        };
        if !attr.is_connection() {
            return ParseResult::Fail(Error::InvalidConnection(format!(
                "`{}` has no connection target",
                prop_name
            )));
        }
        target.set_connections(attr.connections.iter().cloned());
        target.meta = attr.meta.clone();
        table.insert(name.to_string());
        return ParseResult::Success;
    }

    if prop_name != name {
        return ParseResult::Unmatched;
    }
    if table.contains(name) {
        return ParseResult::AlreadyProcessed;
    }
    let Some(attr) = prop.as_attribute() else {
        return ParseResult::internal(format!("`{}` must be an attribute", name));
    };
    if attr.is_connection() {
        target.set_connections(attr.connections.iter().cloned());
        target.meta = attr.meta.clone();
        table.insert(name.to_string());
        return ParseResult::Success;
    }
    if !type_matches(T::TYPE_NAME, &attr.type_name) {
        return ParseResult::type_mismatch(name, T::TYPE_NAME, &attr.type_name);
    }

    match &attr.value {
        crate::prim::AttrValue::Empty => target.set_value_empty(),
        crate::prim::AttrValue::Blocked => target.set_blocked(true),
        crate::prim::AttrValue::Scalar(v) => match T::from_value(v) {
            Some(x) => target.set_value(x),
            None => {
                return ParseResult::internal(format!(
                    "failed to read `{}` as `{}`",
                    name,
                    T::TYPE_NAME
                ))
            }
        },
        crate::prim::AttrValue::TimeSamples(ts) => {
            if attr.variability == Variability::Uniform {
                return ParseResult::Fail(Error::VariabilityMismatch(format!(
                    "time samples assigned to `uniform` property `{}`",
                    name
                )));
            }
            match convert_timesamples::<T>(ts) {
                Some(typed) => target.set_value(Animatable::TimeSamples(typed)),
                None => {
                    return ParseResult::internal(format!(
                        "time samples of `{}` hold values of mixed types",
                        name
                    ))
                }
            }
        }
    }
    target.meta = attr.meta.clone();
    table.insert(name.to_string());
    ParseResult::Success
}

/// Uniform slot: scalar value or connection; time samples are rejected.
pub(crate) fn parse_uniform_attr<T: ValueCast>(
    table: &mut PropertySet,
    prop_name: &str,
    prop: &Property,
    name: &str,
    target: &mut UniformAttribute<T>,
) -> ParseResult {
    if let Some(base) = prop_name.strip_suffix(".connect") {
        if base != name {
            return ParseResult::Unmatched;
        }
        if table.contains(name) {
            return ParseResult::AlreadyProcessed;
        }
        let Some(attr) = prop.as_attribute() else {
            return ParseResult::internal(format!(
                "`{}` must be an attribute connection",
                prop_name
            ));
        };
        if !attr.is_connection() {
            return ParseResult::Fail(Error::InvalidConnection(format!(
                "`{}` has no connection target",
                prop_name
            )));
        }
        target.set_connections(attr.connections.iter().cloned());
        target.meta = attr.meta.clone();
        table.insert(name.to_string());
        return ParseResult::Success;
    }

    if prop_name != name {
        return ParseResult::Unmatched;
    }
    if table.contains(name) {
        return ParseResult::AlreadyProcessed;
    }
    let Some(attr) = prop.as_attribute() else {
        return ParseResult::internal(format!("`{}` must be an attribute", name));
    };
    if attr.is_connection() {
        target.set_connections(attr.connections.iter().cloned());
        target.meta = attr.meta.clone();
        table.insert(name.to_string());
        return ParseResult::Success;
    }
    if !type_matches(T::TYPE_NAME, &attr.type_name) {
        return ParseResult::type_mismatch(name, T::TYPE_NAME, &attr.type_name);
    }

    match &attr.value {
        crate::prim::AttrValue::Empty => target.set_value_empty(),
        crate::prim::AttrValue::Blocked => target.set_blocked(true),
        crate::prim::AttrValue::Scalar(v) => match T::from_value(v) {
            Some(x) => target.set_value(x),
            None => {
                return ParseResult::internal(format!(
                    "failed to read `{}` as `{}`",
                    name,
                    T::TYPE_NAME
                ))
            }
        },
        crate::prim::AttrValue::TimeSamples(_) => {
            return ParseResult::Fail(Error::VariabilityMismatch(format!(
                "time samples assigned to `uniform` property `{}`",
                name
            )));
        }
    }
    target.meta = attr.meta.clone();
    table.insert(name.to_string());
    ParseResult::Success
}

/// Shader output slot: a declaration only; connections are not allowed.
pub(crate) fn parse_terminal_attr(
    table: &mut PropertySet,
    prop_name: &str,
    prop: &Property,
    name: &str,
    target: &mut TerminalAttribute,
) -> ParseResult {
    if let Some(base) = prop_name.strip_suffix(".connect") {
        if base != name {
            return ParseResult::Unmatched;
        }
        return ParseResult::Fail(Error::ConnectionNotAllowed(format!(
            "connection is not allowed for output terminal `{}`",
            name
        )));
    }
    if prop_name != name {
        return ParseResult::Unmatched;
    }
    if table.contains(name) {
        return ParseResult::AlreadyProcessed;
    }
    let Some(attr) = prop.as_attribute() else {
        return ParseResult::internal(format!("`{}` must be an attribute", name));
    };
    target.set_authored(attr.type_name.clone());
    target.meta = attr.meta.clone();
    table.insert(name.to_string());
    ParseResult::Success
}

/// Varying token-enum slot with a closed value set.
pub(crate) fn parse_enum_attr<E: Clone>(
    table: &mut PropertySet,
    prop_name: &str,
    prop: &Property,
    name: &str,
    allowed: &[&str],
    from_token: impl Fn(&str) -> Option<E>,
    target: &mut TypedAttribute<E>,
) -> ParseResult {
    if let Some(base) = prop_name.strip_suffix(".connect") {
        if base != name {
            return ParseResult::Unmatched;
        }
        if table.contains(name) {
            return ParseResult::AlreadyProcessed;
        }
        let Some(attr) = prop.as_attribute() else {
            return ParseResult::internal(format!(
                "`{}` must be an attribute connection",
                prop_name
            ));
        };
        if !attr.is_connection() {
            return ParseResult::Fail(Error::InvalidConnection(format!(
                "`{}` has no connection target",
                prop_name
            )));
        }
        target.set_connections(attr.connections.iter().cloned());
        table.insert(name.to_string());
        return ParseResult::Success;
    }
    if prop_name != name {
        return ParseResult::Unmatched;
    }
    if table.contains(name) {
        return ParseResult::AlreadyProcessed;
    }
    let Some(attr) = prop.as_attribute() else {
        return ParseResult::internal(format!("`{}` must be an attribute", name));
    };
    if !type_matches("token", &attr.type_name) {
        return ParseResult::type_mismatch(name, "token", &attr.type_name);
    }

    let unknown = |got: &str| {
        ParseResult::Fail(Error::UnknownEnum {
            attr: name.to_string(),
            got: got.to_string(),
            allowed: allowed.join(", "),
        })
    };

    match &attr.value {
        crate::prim::AttrValue::Empty => target.set_value_empty(),
        crate::prim::AttrValue::Blocked => target.set_blocked(true),
        crate::prim::AttrValue::Scalar(Value::Token(t)) => match from_token(t.as_str()) {
            Some(e) => target.set_value(e),
            None => return unknown(t.as_str()),
        },
        crate::prim::AttrValue::Scalar(other) => {
            return ParseResult::type_mismatch(name, "token", other.type_name())
        }
        crate::prim::AttrValue::TimeSamples(ts) => {
            let mut typed = TypedTimeSamples::new();
            for sample in ts.samples() {
                match &sample.value {
                    None => typed.add_blocked_sample(sample.t),
                    Some(Value::Token(t)) => match from_token(t.as_str()) {
                        Some(e) => typed.add_sample(sample.t, e),
                        None => return unknown(t.as_str()),
                    },
                    Some(other) => {
                        return ParseResult::type_mismatch(name, "token", other.type_name())
                    }
                }
            }
            target.set_value(Animatable::TimeSamples(typed));
        }
    }
    target.meta = attr.meta.clone();
    table.insert(name.to_string());
    ParseResult::Success
}

/// Uniform token-enum slot.
pub(crate) fn parse_uniform_enum_attr<E: Clone>(
    table: &mut PropertySet,
    prop_name: &str,
    prop: &Property,
    name: &str,
    allowed: &[&str],
    from_token: impl Fn(&str) -> Option<E>,
    target: &mut UniformAttribute<E>,
) -> ParseResult {
    if prop_name != name {
        return ParseResult::Unmatched;
    }
    if table.contains(name) {
        return ParseResult::AlreadyProcessed;
    }
    let Some(attr) = prop.as_attribute() else {
        return ParseResult::internal(format!("`{}` must be an attribute", name));
    };
    if !type_matches("token", &attr.type_name) {
        return ParseResult::type_mismatch(name, "token", &attr.type_name);
    }
    match &attr.value {
        crate::prim::AttrValue::Empty => target.set_value_empty(),
        crate::prim::AttrValue::Blocked => target.set_blocked(true),
        crate::prim::AttrValue::Scalar(Value::Token(t)) => match from_token(t.as_str()) {
            Some(e) => target.set_value(e),
            None => {
                return ParseResult::Fail(Error::UnknownEnum {
                    attr: name.to_string(),
                    got: t.as_str().to_string(),
                    allowed: allowed.join(", "),
                })
            }
        },
        crate::prim::AttrValue::Scalar(other) => {
            return ParseResult::type_mismatch(name, "token", other.type_name())
        }
        crate::prim::AttrValue::TimeSamples(_) => {
            return ParseResult::Fail(Error::VariabilityMismatch(format!(
                "time samples assigned to `uniform` property `{}`",
                name
            )));
        }
    }
    target.meta = attr.meta.clone();
    table.insert(name.to_string());
    ParseResult::Success
}

/// Extent: logical type `float3[2]`. Scalar and per-sample forms must
/// hold exactly two vectors; `uniform` is an error.
pub(crate) fn parse_extent_attr(
    table: &mut PropertySet,
    prop_name: &str,
    prop: &Property,
    name: &str,
    target: &mut TypedAttribute<Extent>,
) -> ParseResult {
    if let Some(base) = prop_name.strip_suffix(".connect") {
        if base != name {
            return ParseResult::Unmatched;
        }
        if table.contains(name) {
            return ParseResult::AlreadyProcessed;
        }
        let Some(attr) = prop.as_attribute() else {
            return ParseResult::internal("extent connection must be an attribute");
        };
        target.set_connections(attr.connections.iter().cloned());
        table.insert(name.to_string());
        return ParseResult::Success;
    }
    if prop_name != name {
        return ParseResult::Unmatched;
    }
    if table.contains(name) {
        return ParseResult::AlreadyProcessed;
    }
    let Some(attr) = prop.as_attribute() else {
        return ParseResult::internal(format!("`{}` must be an attribute", name));
    };
    if attr.variability == Variability::Uniform {
        return ParseResult::Fail(Error::VariabilityMismatch(format!(
            "`{}` cannot be `uniform`",
            name
        )));
    }

    let from_vecs = |vs: &[Vec3]| -> Option<Extent> {
        if vs.len() == 2 {
            Some(Extent::new(vs[0], vs[1]))
        } else {
            None
        }
    };

    match &attr.value {
        crate::prim::AttrValue::Empty => target.set_value_empty(),
        crate::prim::AttrValue::Blocked => target.set_blocked(true),
        crate::prim::AttrValue::Scalar(Value::Vec3fArray(vs)) => match from_vecs(vs) {
            Some(e) => target.set_value(e),
            None => {
                return ParseResult::type_mismatch(name, "float3[2]", "float3[] of other size")
            }
        },
        crate::prim::AttrValue::Scalar(other) => {
            return ParseResult::type_mismatch(name, "float3[2]", other.type_name())
        }
        crate::prim::AttrValue::TimeSamples(ts) => {
            let mut typed = TypedTimeSamples::new();
            for sample in ts.samples() {
                match &sample.value {
                    None => typed.add_blocked_sample(sample.t),
                    Some(Value::Vec3fArray(vs)) => match from_vecs(vs) {
                        Some(e) => typed.add_sample(sample.t, e),
                        None => {
                            return ParseResult::type_mismatch(
                                name,
                                "float3[2]",
                                "float3[] of other size",
                            )
                        }
                    },
                    Some(other) => {
                        return ParseResult::type_mismatch(
                            name,
                            "float3[2]",
                            other.type_name(),
                        )
                    }
                }
            }
            target.set_value(Animatable::TimeSamples(typed));
        }
    }
    target.meta = attr.meta.clone();
    table.insert(name.to_string());
    ParseResult::Success
}

/// Relationship with at most one target path.
pub(crate) fn parse_single_target_rel(
    table: &mut PropertySet,
    prop_name: &str,
    prop: &Property,
    name: &str,
    target: &mut Option<Relationship>,
) -> ParseResult {
    if prop_name != name {
        return ParseResult::Unmatched;
    }
    if table.contains(name) {
        return ParseResult::AlreadyProcessed;
    }
    let Some(rel) = prop.as_relationship() else {
        return ParseResult::internal(format!("`{}` must be a relationship", name));
    };
    if rel.targets().len() > 1 {
        return ParseResult::Fail(Error::InvalidConnection(format!(
            "`{}` accepts a single target path",
            name
        )));
    }
    *target = Some(rel.clone());
    table.insert(name.to_string());
    ParseResult::Success
}

/// Relationship with any number of target paths.
pub(crate) fn parse_target_paths_rel(
    table: &mut PropertySet,
    prop_name: &str,
    prop: &Property,
    name: &str,
    target: &mut Option<Relationship>,
) -> ParseResult {
    if prop_name != name {
        return ParseResult::Unmatched;
    }
    if table.contains(name) {
        return ParseResult::AlreadyProcessed;
    }
    let Some(rel) = prop.as_relationship() else {
        return ParseResult::internal(format!("`{}` must be a relationship", name));
    };
    *target = Some(rel.clone());
    table.insert(name.to_string());
    ParseResult::Success
}

// ----------------------------------------------------------------------
// Shared GPrim handling
// ----------------------------------------------------------------------

/// Like [`try_prop!`] but for use inside a matcher-chain function:
/// claimed properties return early instead of `continue`.
macro_rules! try_gprim {
    ($e:expr) => {
        match $e {
            ParseResult::Success => return ParseResult::Success,
            ParseResult::AlreadyProcessed => return ParseResult::AlreadyProcessed,
            ParseResult::Unmatched => {}
            fail => return fail,
        }
    };
}

/// Route one property through the attributes every boundable geometric
/// prim shares (extent, visibility, purpose, orientation, doubleSided,
/// proxyPrim, material bindings).
pub(crate) fn parse_gprim_prop(
    table: &mut PropertySet,
    prop_name: &str,
    prop: &Property,
    gprim: &mut crate::prim::geom::GPrimAttrs,
) -> ParseResult {
    try_gprim!(parse_extent_attr(table, prop_name, prop, "extent", &mut gprim.extent));
    try_gprim!(parse_enum_attr(
        table,
        prop_name,
        prop,
        "visibility",
        Visibility::ALLOWED,
        Visibility::from_token,
        &mut gprim.visibility,
    ));
    try_gprim!(parse_uniform_enum_attr(
        table,
        prop_name,
        prop,
        "purpose",
        Purpose::ALLOWED,
        Purpose::from_token,
        &mut gprim.purpose,
    ));
    try_gprim!(parse_uniform_enum_attr(
        table,
        prop_name,
        prop,
        "orientation",
        Orientation::ALLOWED,
        Orientation::from_token,
        &mut gprim.orientation,
    ));
    try_gprim!(parse_uniform_attr(
        table,
        prop_name,
        prop,
        "doubleSided",
        &mut gprim.double_sided,
    ));
    try_gprim!(parse_single_target_rel(
        table,
        prop_name,
        prop,
        "proxyPrim",
        &mut gprim.proxy_prim,
    ));

    for (rel_name, slot) in [
        ("material:binding", &mut gprim.material_binding.binding),
        ("material:binding:preview", &mut gprim.material_binding.preview),
        (
            "material:binding:correction",
            &mut gprim.material_binding.correction,
        ),
    ] {
        let mut rel: Option<Relationship> = None;
        match parse_single_target_rel(table, prop_name, prop, rel_name, &mut rel) {
            ParseResult::Success => {
                *slot = rel.as_ref().and_then(|r| r.single_target().cloned());
                return ParseResult::Success;
            }
            ParseResult::AlreadyProcessed => return ParseResult::AlreadyProcessed,
            ParseResult::Unmatched => {}
            fail => return fail,
        }
    }

    ParseResult::Unmatched
}

// ----------------------------------------------------------------------
// Residual properties
// ----------------------------------------------------------------------

/// Keep an unclaimed property in the residual map, warning once.
pub(crate) fn add_residual_prop(
    core: &mut crate::prim::PrimCore,
    prop_name: &str,
    prop: &Property,
    warnings: &mut Vec<String>,
) {
    if !prop_name.starts_with("primvars:") {
        warnings.push(format!(
            "unrecognized property `{}` kept verbatim",
            prop_name
        ));
        warn!("unrecognized property `{}`", prop_name);
    }
    core.props.insert(prop_name.to_string(), prop.clone());
}

/// Populate the shared core fields from a generic prim.
pub(crate) fn fill_core(core: &mut crate::prim::PrimCore, prim: &Prim) {
    core.name = prim.name.clone();
    core.spec = prim.spec;
    core.meta = prim.meta.clone();
}

// ----------------------------------------------------------------------
// Dispatch
// ----------------------------------------------------------------------

/// Reconstruct one generic prim into its typed record. The `prim_type`
/// string selects the schema; untyped prims become `Model`.
pub fn reconstruct_prim(prim: &Prim, warnings: &mut Vec<String>) -> Result<TypedPrim> {
    let typed = match prim.prim_type.as_str() {
        "Xform" => TypedPrim::Xform(geom::reconstruct_xform(prim, warnings)?),
        "Scope" => TypedPrim::Scope(geom::reconstruct_scope(prim, warnings)?),
        "" | "Model" => TypedPrim::Model(geom::reconstruct_model(prim, warnings)?),
        "Mesh" => TypedPrim::GeomMesh(Box::new(geom::reconstruct_mesh(prim, warnings)?)),
        "Sphere" => TypedPrim::GeomSphere(geom::reconstruct_sphere(prim, warnings)?),
        "Cube" => TypedPrim::GeomCube(geom::reconstruct_cube(prim, warnings)?),
        "Cone" => TypedPrim::GeomCone(geom::reconstruct_cone(prim, warnings)?),
        "Cylinder" => TypedPrim::GeomCylinder(geom::reconstruct_cylinder(prim, warnings)?),
        "Capsule" => TypedPrim::GeomCapsule(geom::reconstruct_capsule(prim, warnings)?),
        "Points" => TypedPrim::GeomPoints(Box::new(geom::reconstruct_points(prim, warnings)?)),
        "BasisCurves" => {
            TypedPrim::GeomBasisCurves(Box::new(geom::reconstruct_basis_curves(prim, warnings)?))
        }
        "GeomSubset" => TypedPrim::GeomSubset(geom::reconstruct_geom_subset(prim, warnings)?),
        "Camera" => TypedPrim::GeomCamera(Box::new(geom::reconstruct_camera(prim, warnings)?)),
        "PointInstancer" => TypedPrim::PointInstancer(Box::new(
            geom::reconstruct_point_instancer(prim, warnings)?,
        )),
        "SkelRoot" => TypedPrim::SkelRoot(skel::reconstruct_skel_root(prim, warnings)?),
        "Skeleton" => TypedPrim::Skeleton(Box::new(skel::reconstruct_skeleton(prim, warnings)?)),
        "SkelAnimation" => {
            TypedPrim::SkelAnimation(Box::new(skel::reconstruct_skel_animation(prim, warnings)?))
        }
        "BlendShape" => TypedPrim::BlendShape(skel::reconstruct_blend_shape(prim, warnings)?),
        "Material" => TypedPrim::Material(shade::reconstruct_material(prim, warnings)?),
        "Shader" => TypedPrim::Shader(Box::new(shade::reconstruct_shader(prim, warnings)?)),
        "SphereLight" => {
            TypedPrim::SphereLight(Box::new(lux::reconstruct_sphere_light(prim, warnings)?))
        }
        "RectLight" => TypedPrim::RectLight(Box::new(lux::reconstruct_rect_light(prim, warnings)?)),
        "DiskLight" => TypedPrim::DiskLight(Box::new(lux::reconstruct_disk_light(prim, warnings)?)),
        "CylinderLight" => {
            TypedPrim::CylinderLight(Box::new(lux::reconstruct_cylinder_light(prim, warnings)?))
        }
        "DistantLight" => {
            TypedPrim::DistantLight(Box::new(lux::reconstruct_distant_light(prim, warnings)?))
        }
        "DomeLight" => TypedPrim::DomeLight(Box::new(lux::reconstruct_dome_light(prim, warnings)?)),
        other => {
            warnings.push(format!(
                "unknown prim type `{}` on `{}`; reconstructed as Model",
                other, prim.name
            ));
            TypedPrim::Model(geom::reconstruct_model(prim, warnings)?)
        }
    };
    Ok(typed)
}

fn reconstruct_subtree(
    prim: &Prim,
    parent_path: &Path,
    warnings: &mut Vec<String>,
) -> Result<TypedPrimNode> {
    let path = parent_path.child(&crate::token::Token::new(&prim.name));
    let typed = reconstruct_prim(prim, warnings).map_err(|e| {
        Error::invalid(format!("{} (while reconstructing `{}`)", e, path))
    })?;
    let mut children = Vec::with_capacity(prim.children.len());
    for child in &prim.children {
        children.push(reconstruct_subtree(child, &path, warnings)?);
    }
    Ok(TypedPrimNode {
        prim: typed,
        path,
        children,
    })
}

/// Reconstruct a whole generic tree into typed prim nodes.
pub fn reconstruct_stage(
    prims: &[Prim],
    warnings: &mut Vec<String>,
) -> Result<Vec<TypedPrimNode>> {
    let root = Path::root();
    prims
        .iter()
        .map(|p| reconstruct_subtree(p, &root, warnings))
        .collect()
}
