//! The prim data model.
//!
//! Decoders produce *generic* prims: trees of `(name, Property)` maps plus
//! metadata. The reconstruction layer turns those into the *typed* schema
//! records in [`geom`], [`shade`], [`lux`] and [`skel`], united by
//! [`TypedPrim`].

pub mod geom;
pub mod lux;
pub mod shade;
pub mod skel;
mod slots;
mod xform;

pub use geom::GPrimAttrs;
pub use slots::{TerminalAttribute, TypedAttribute, UniformAttribute};
pub use xform::{XformOp, XformOpKind};

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::path::Path;
use crate::token::Token;
use crate::value::{
    AssetPath, Dictionary, ListEditQual, ListOp, Payload, Reference, Specifier, TimeSamples,
    Value, VariantSelectionMap, Variability,
};

/// Imageable visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Inherited,
    Invisible,
}

impl Visibility {
    pub const ALLOWED: &'static [&'static str] = &["inherited", "invisible"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "inherited" => Some(Self::Inherited),
            "invisible" => Some(Self::Invisible),
            _ => None,
        }
    }
}

/// Imageable purpose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Purpose {
    #[default]
    Default,
    Render,
    Proxy,
    Guide,
}

impl Purpose {
    pub const ALLOWED: &'static [&'static str] = &["default", "render", "proxy", "guide"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Self::Default),
            "render" => Some(Self::Render),
            "proxy" => Some(Self::Proxy),
            "guide" => Some(Self::Guide),
            _ => None,
        }
    }
}

/// Winding orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    RightHanded,
    LeftHanded,
}

impl Orientation {
    pub const ALLOWED: &'static [&'static str] = &["rightHanded", "leftHanded"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "rightHanded" => Some(Self::RightHanded),
            "leftHanded" => Some(Self::LeftHanded),
            _ => None,
        }
    }
}

/// Primary axis for cylinders, capsules and cones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

impl Axis {
    pub const ALLOWED: &'static [&'static str] = &["X", "Y", "Z"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "X" => Some(Self::X),
            "Y" => Some(Self::Y),
            "Z" => Some(Self::Z),
            _ => None,
        }
    }
}

/// Primvar interpolation across a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    Constant,
    Uniform,
    Varying,
    #[default]
    Vertex,
    FaceVarying,
}

impl Interpolation {
    pub const ALLOWED: &'static [&'static str] =
        &["constant", "uniform", "varying", "vertex", "faceVarying"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "constant" => Some(Self::Constant),
            "uniform" => Some(Self::Uniform),
            "varying" => Some(Self::Varying),
            "vertex" => Some(Self::Vertex),
            "faceVarying" => Some(Self::FaceVarying),
            _ => None,
        }
    }
}

/// Model kind (prim metadata).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Model,
    Group,
    Assembly,
    Component,
    Subcomponent,
    SceneLibrary,
}

impl Kind {
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "model" => Some(Self::Model),
            "group" => Some(Self::Group),
            "assembly" => Some(Self::Assembly),
            "component" => Some(Self::Component),
            "subcomponent" => Some(Self::Subcomponent),
            "sceneLibrary" => Some(Self::SceneLibrary),
            _ => None,
        }
    }
}

/// Attribute-level metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttrMeta {
    pub interpolation: Option<Interpolation>,
    pub element_size: Option<u32>,
    pub hidden: Option<bool>,
    pub custom: Option<bool>,
    pub doc: Option<String>,
    pub custom_data: Dictionary,
    /// Authored-but-unrecognized metadata.
    pub unregistered: Dictionary,
}

impl AttrMeta {
    pub fn is_empty(&self) -> bool {
        self.interpolation.is_none()
            && self.element_size.is_none()
            && self.hidden.is_none()
            && self.custom.is_none()
            && self.doc.is_none()
            && self.custom_data.is_empty()
            && self.unregistered.is_empty()
    }
}

/// Authored payload of an attribute.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AttrValue {
    /// Declared but not valued, e.g. `float3[] points`.
    #[default]
    Empty,
    /// Explicitly blocked with `None`.
    Blocked,
    Scalar(Value),
    TimeSamples(TimeSamples),
}

/// A named typed value on a prim, possibly time-sampled, possibly
/// connected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attribute {
    /// Authored type name (`color3f`, not the storage name `float3`).
    pub type_name: String,
    pub variability: Variability,
    pub value: AttrValue,
    /// Connection targets; non-empty makes this attribute a connection.
    pub connections: SmallVec<[Path; 1]>,
    pub meta: AttrMeta,
}

impl Attribute {
    pub fn scalar(type_name: impl Into<String>, value: Value) -> Self {
        Self {
            type_name: type_name.into(),
            value: AttrValue::Scalar(value),
            ..Self::default()
        }
    }

    pub fn blocked(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            value: AttrValue::Blocked,
            ..Self::default()
        }
    }

    pub fn uniform(mut self) -> Self {
        self.variability = Variability::Uniform;
        self
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        matches!(self.value, AttrValue::Blocked)
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self.value, AttrValue::Scalar(_))
    }

    #[inline]
    pub fn is_timesamples(&self) -> bool {
        matches!(self.value, AttrValue::TimeSamples(_))
    }

    #[inline]
    pub fn is_connection(&self) -> bool {
        !self.connections.is_empty()
    }

    pub fn get_scalar(&self) -> Option<&Value> {
        match &self.value {
            AttrValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_timesamples(&self) -> Option<&TimeSamples> {
        match &self.value {
            AttrValue::TimeSamples(ts) => Some(ts),
            _ => None,
        }
    }
}

/// Typeless pointer(s) to other prim paths.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RelationshipTargets {
    /// Declared with no target, e.g. `rel proxyPrim`.
    #[default]
    NoTargets,
    Single(Path),
    Multiple(Vec<Path>),
}

/// A `rel` property.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Relationship {
    pub targets: RelationshipTargets,
    pub list_edit: ListEditQual,
    pub meta: AttrMeta,
}

impl Relationship {
    pub fn single(p: Path) -> Self {
        Self {
            targets: RelationshipTargets::Single(p),
            ..Self::default()
        }
    }

    pub fn multiple(ps: Vec<Path>) -> Self {
        Self {
            targets: RelationshipTargets::Multiple(ps),
            ..Self::default()
        }
    }

    /// All targets, regardless of arity.
    pub fn targets(&self) -> Vec<&Path> {
        match &self.targets {
            RelationshipTargets::NoTargets => Vec::new(),
            RelationshipTargets::Single(p) => vec![p],
            RelationshipTargets::Multiple(ps) => ps.iter().collect(),
        }
    }

    /// The single target, if exactly one is authored.
    pub fn single_target(&self) -> Option<&Path> {
        match &self.targets {
            RelationshipTargets::Single(p) => Some(p),
            RelationshipTargets::Multiple(ps) if ps.len() == 1 => ps.first(),
            _ => None,
        }
    }
}

/// A property: an attribute (possibly empty) or a relationship.
#[derive(Clone, Debug, PartialEq)]
pub enum Property {
    Attribute(Attribute),
    Relationship(Relationship),
}

impl Property {
    #[inline]
    pub fn is_attribute(&self) -> bool {
        matches!(self, Self::Attribute(_))
    }

    #[inline]
    pub fn is_relationship(&self) -> bool {
        matches!(self, Self::Relationship(_))
    }

    /// True when this property carries one or more connection targets.
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Attribute(a) => a.is_connection(),
            Self::Relationship(_) => false,
        }
    }

    pub fn as_attribute(&self) -> Option<&Attribute> {
        match self {
            Self::Attribute(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            Self::Relationship(r) => Some(r),
            _ => None,
        }
    }
}

/// Composition arcs authored with a list-edit qualifier.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrimMeta {
    pub kind: Option<Kind>,
    pub active: Option<bool>,
    pub hidden: Option<bool>,
    pub instanceable: Option<bool>,
    pub doc: Option<String>,
    pub references: Option<(ListEditQual, Vec<Reference>)>,
    pub payload: Option<(ListEditQual, Vec<Payload>)>,
    pub inherits: Option<(ListEditQual, Vec<Path>)>,
    pub specializes: Option<(ListEditQual, Vec<Path>)>,
    pub variant_sets: Option<(ListEditQual, Vec<String>)>,
    pub variants: Option<VariantSelectionMap>,
    pub api_schemas: Option<ListOp<Token>>,
    pub asset_info: Dictionary,
    pub custom_data: Dictionary,
    /// Authored-but-unrecognized prim metadata.
    pub unregistered: Dictionary,
}

/// Stage-level (layer) metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StageMeta {
    pub default_prim: Option<Token>,
    pub up_axis: Option<Axis>,
    pub meters_per_unit: Option<f64>,
    pub time_codes_per_second: Option<f64>,
    pub start_time_code: Option<f64>,
    pub end_time_code: Option<f64>,
    pub frames_per_second: Option<f64>,
    pub doc: Option<String>,
    pub custom_layer_data: Dictionary,
    pub sub_layers: Vec<AssetPath>,
    /// Authored-but-unrecognized stage metadata.
    pub unregistered: Dictionary,
}

/// A generic (schema-agnostic) prim as produced by the decoders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Prim {
    pub spec: Specifier,
    /// Schema type name from `def TypeName`, empty for untyped prims.
    pub prim_type: String,
    pub name: String,
    pub props: BTreeMap<String, Property>,
    pub meta: PrimMeta,
    pub children: Vec<Prim>,
}

impl Prim {
    pub fn new(spec: Specifier, prim_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            spec,
            prim_type: prim_type.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Property map alias used throughout the reconstructor.
pub type PropertyMap = BTreeMap<String, Property>;

/// `material:binding` family resolved onto a typed prim.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialBinding {
    pub binding: Option<Path>,
    pub preview: Option<Path>,
    pub correction: Option<Path>,
}

impl MaterialBinding {
    pub fn is_empty(&self) -> bool {
        self.binding.is_none() && self.preview.is_none() && self.correction.is_none()
    }
}

/// The typed prim tree node: one variant per supported schema.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedPrim {
    Xform(geom::Xform),
    Scope(geom::Scope),
    Model(geom::Model),
    GeomMesh(Box<geom::GeomMesh>),
    GeomSphere(geom::GeomSphere),
    GeomCube(geom::GeomCube),
    GeomCone(geom::GeomCone),
    GeomCylinder(geom::GeomCylinder),
    GeomCapsule(geom::GeomCapsule),
    GeomPoints(Box<geom::GeomPoints>),
    GeomBasisCurves(Box<geom::GeomBasisCurves>),
    GeomSubset(geom::GeomSubset),
    GeomCamera(Box<geom::GeomCamera>),
    PointInstancer(Box<geom::PointInstancer>),
    SkelRoot(skel::SkelRoot),
    Skeleton(Box<skel::Skeleton>),
    SkelAnimation(Box<skel::SkelAnimation>),
    BlendShape(skel::BlendShape),
    Material(shade::Material),
    Shader(Box<shade::Shader>),
    SphereLight(Box<lux::SphereLight>),
    RectLight(Box<lux::RectLight>),
    DiskLight(Box<lux::DiskLight>),
    CylinderLight(Box<lux::CylinderLight>),
    DistantLight(Box<lux::DistantLight>),
    DomeLight(Box<lux::DomeLight>),
}

/// A reconstructed node: the typed record plus the recursive children.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedPrimNode {
    pub prim: TypedPrim,
    pub path: Path,
    pub children: Vec<TypedPrimNode>,
}

impl TypedPrim {
    /// The prim's name, regardless of schema.
    pub fn name(&self) -> &str {
        macro_rules! match_core {
            ($($variant:ident),*) => {
                match self {
                    $(Self::$variant(p) => &p.core.name,)*
                }
            };
        }
        match_core!(
            Xform,
            Scope,
            Model,
            GeomMesh,
            GeomSphere,
            GeomCube,
            GeomCone,
            GeomCylinder,
            GeomCapsule,
            GeomPoints,
            GeomBasisCurves,
            GeomSubset,
            GeomCamera,
            PointInstancer,
            SkelRoot,
            Skeleton,
            SkelAnimation,
            BlendShape,
            Material,
            Shader,
            SphereLight,
            RectLight,
            DiskLight,
            CylinderLight,
            DistantLight,
            DomeLight
        )
    }

    /// The schema type name this record was reconstructed as.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Xform(_) => "Xform",
            Self::Scope(_) => "Scope",
            Self::Model(_) => "Model",
            Self::GeomMesh(_) => "Mesh",
            Self::GeomSphere(_) => "Sphere",
            Self::GeomCube(_) => "Cube",
            Self::GeomCone(_) => "Cone",
            Self::GeomCylinder(_) => "Cylinder",
            Self::GeomCapsule(_) => "Capsule",
            Self::GeomPoints(_) => "Points",
            Self::GeomBasisCurves(_) => "BasisCurves",
            Self::GeomSubset(_) => "GeomSubset",
            Self::GeomCamera(_) => "Camera",
            Self::PointInstancer(_) => "PointInstancer",
            Self::SkelRoot(_) => "SkelRoot",
            Self::Skeleton(_) => "Skeleton",
            Self::SkelAnimation(_) => "SkelAnimation",
            Self::BlendShape(_) => "BlendShape",
            Self::Material(_) => "Material",
            Self::Shader(_) => "Shader",
            Self::SphereLight(_) => "SphereLight",
            Self::RectLight(_) => "RectLight",
            Self::DiskLight(_) => "DiskLight",
            Self::CylinderLight(_) => "CylinderLight",
            Self::DistantLight(_) => "DistantLight",
            Self::DomeLight(_) => "DomeLight",
        }
    }
}

/// Fields shared by every typed prim.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrimCore {
    pub name: String,
    pub spec: Specifier,
    pub meta: PrimMeta,
    /// Authored properties the schema did not claim, preserved verbatim
    /// (including `primvars:` attributes).
    pub props: PropertyMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_tokens() {
        assert_eq!(Visibility::from_token("invisible"), Some(Visibility::Invisible));
        assert_eq!(Visibility::from_token("hidden"), None);
        assert_eq!(Purpose::from_token("proxy"), Some(Purpose::Proxy));
        assert_eq!(Orientation::from_token("leftHanded"), Some(Orientation::LeftHanded));
        assert_eq!(Axis::from_token("Y"), Some(Axis::Y));
        assert_eq!(Interpolation::from_token("faceVarying"), Some(Interpolation::FaceVarying));
    }

    #[test]
    fn test_attribute_states() {
        let a = Attribute::scalar("double", Value::Double(1.0));
        assert!(a.is_scalar() && !a.is_blocked() && !a.is_connection());

        let b = Attribute::blocked("float");
        assert!(b.is_blocked());

        let mut c = Attribute::default();
        c.connections.push(Path::parse("/Mat/Tex.outputs:rgb"));
        assert!(c.is_connection());
    }

    #[test]
    fn test_relationship_targets() {
        let r = Relationship::single(Path::parse("/Looks/Mat"));
        assert_eq!(r.single_target().unwrap().full_path(), "/Looks/Mat");
        assert_eq!(r.targets().len(), 1);

        let m = Relationship::multiple(vec![Path::parse("/a"), Path::parse("/b")]);
        assert!(m.single_target().is_none());
        assert_eq!(m.targets().len(), 2);
    }
}
