//! Geometry schemas (UsdGeom).

use super::{
    Attribute, Axis, Interpolation, MaterialBinding, Orientation, PrimCore, Purpose,
    Relationship, TypedAttribute, UniformAttribute, Visibility, XformOp,
};
use crate::token::Token;
use crate::util::{Extent, Vec3};
use crate::value::{TimeCode, TimeSampleInterpolation, ValueCast};

/// Attributes shared by every imageable, boundable geometric prim.
#[derive(Clone, Debug, PartialEq)]
pub struct GPrimAttrs {
    /// Bounding extent; when authored, bounds the prim and its children.
    pub extent: TypedAttribute<Extent>,
    pub visibility: TypedAttribute<Visibility>,
    pub purpose: UniformAttribute<Purpose>,
    pub orientation: UniformAttribute<Orientation>,
    pub double_sided: UniformAttribute<bool>,
    pub xform_ops: Vec<XformOp>,
    pub proxy_prim: Option<Relationship>,
    pub material_binding: MaterialBinding,
}

impl Default for GPrimAttrs {
    fn default() -> Self {
        Self {
            extent: TypedAttribute::default(),
            visibility: TypedAttribute::with_fallback(Visibility::Inherited),
            purpose: UniformAttribute::with_fallback(Purpose::Default),
            orientation: UniformAttribute::with_fallback(Orientation::RightHanded),
            double_sided: UniformAttribute::with_fallback(false),
            xform_ops: Vec::new(),
            proxy_prim: None,
            material_binding: MaterialBinding::default(),
        }
    }
}

/// An attribute with `primvars:` prefix, optionally indexed through a
/// companion `primvars:<name>:indices` attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct GeomPrimvar {
    /// Primvar name with the `primvars:` prefix stripped.
    pub name: String,
    pub attr: Attribute,
    pub indices: Vec<i32>,
}

impl GeomPrimvar {
    #[inline]
    pub fn has_indices(&self) -> bool {
        !self.indices.is_empty()
    }

    pub fn interpolation(&self) -> Interpolation {
        self.attr.meta.interpolation.unwrap_or_default()
    }

    pub fn element_size(&self) -> u32 {
        self.attr.meta.element_size.unwrap_or(1)
    }

    /// Expand an indexed primvar: `dst[i] = values[indices[i]]`. Without
    /// indices, returns the value array as-is. `None` when the value is
    /// missing, not an array of `T`, or an index is out of range.
    pub fn flatten_with_indices<T>(&self) -> Option<Vec<T>>
    where
        Vec<T>: ValueCast,
        T: Clone,
    {
        let values: Vec<T> = self.attr.get_scalar().and_then(Vec::<T>::from_value)?;
        if self.indices.is_empty() {
            return Some(values);
        }
        let mut out = Vec::with_capacity(self.indices.len());
        for &i in &self.indices {
            out.push(values.get(usize::try_from(i).ok()?)?.clone());
        }
        Some(out)
    }
}

impl PrimCore {
    /// Check for a primvar (the `primvars:` prefix is implied).
    pub fn has_primvar(&self, name: &str) -> bool {
        self.props.contains_key(&format!("primvars:{}", name))
    }

    /// Fetch a primvar and its indices companion, if authored.
    pub fn primvar(&self, name: &str) -> Option<GeomPrimvar> {
        let attr = self
            .props
            .get(&format!("primvars:{}", name))?
            .as_attribute()?
            .clone();
        let indices = self
            .props
            .get(&format!("primvars:{}:indices", name))
            .and_then(|p| p.as_attribute())
            .and_then(|a| a.get_scalar())
            .and_then(Vec::<i32>::from_value)
            .unwrap_or_default();
        Some(GeomPrimvar {
            name: name.to_string(),
            attr,
            indices,
        })
    }

    /// All primvars authored on this prim.
    pub fn primvars(&self) -> Vec<GeomPrimvar> {
        self.props
            .keys()
            .filter_map(|k| k.strip_prefix("primvars:"))
            .filter(|rest| !rest.ends_with(":indices"))
            .map(|rest| rest.to_string())
            .collect::<Vec<_>>()
            .into_iter()
            .filter_map(|name| self.primvar(&name))
            .collect()
    }
}

/// Grouping transform node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Xform {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
}

/// Namespace-only grouping node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scope {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
}

/// Untyped model prim (`def "name"` with no schema type).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeomSphere {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub radius: TypedAttribute<f64>,
}

impl Default for GeomSphere {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            radius: TypedAttribute::with_fallback(2.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeomCube {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub size: TypedAttribute<f64>,
}

impl Default for GeomCube {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            size: TypedAttribute::with_fallback(2.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeomCone {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub height: TypedAttribute<f64>,
    pub radius: TypedAttribute<f64>,
    pub axis: UniformAttribute<Axis>,
}

impl Default for GeomCone {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            height: TypedAttribute::with_fallback(2.0),
            radius: TypedAttribute::with_fallback(1.0),
            axis: UniformAttribute::with_fallback(Axis::Z),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeomCylinder {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub height: TypedAttribute<f64>,
    pub radius: TypedAttribute<f64>,
    pub axis: UniformAttribute<Axis>,
}

impl Default for GeomCylinder {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            height: TypedAttribute::with_fallback(2.0),
            radius: TypedAttribute::with_fallback(1.0),
            axis: UniformAttribute::with_fallback(Axis::Z),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeomCapsule {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub height: TypedAttribute<f64>,
    pub radius: TypedAttribute<f64>,
    pub axis: UniformAttribute<Axis>,
}

impl Default for GeomCapsule {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            height: TypedAttribute::with_fallback(2.0),
            radius: TypedAttribute::with_fallback(0.5),
            axis: UniformAttribute::with_fallback(Axis::Z),
        }
    }
}

/// Subdivision boundary interpolation rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterpolateBoundary {
    None,
    #[default]
    EdgeAndCorner,
    EdgeOnly,
}

impl InterpolateBoundary {
    pub const ALLOWED: &'static [&'static str] = &["none", "edgeAndCorner", "edgeOnly"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "edgeAndCorner" => Some(Self::EdgeAndCorner),
            "edgeOnly" => Some(Self::EdgeOnly),
            _ => None,
        }
    }
}

/// Subdivision scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubdivisionScheme {
    #[default]
    CatmullClark,
    Loop,
    Bilinear,
    None,
}

impl SubdivisionScheme {
    pub const ALLOWED: &'static [&'static str] = &["catmullClark", "loop", "bilinear", "none"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "catmullClark" => Some(Self::CatmullClark),
            "loop" => Some(Self::Loop),
            "bilinear" => Some(Self::Bilinear),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// Face-varying interpolation rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaceVaryingLinearInterpolation {
    #[default]
    CornersPlus1,
    CornersPlus2,
    CornersOnly,
    Boundaries,
    None,
    All,
}

impl FaceVaryingLinearInterpolation {
    pub const ALLOWED: &'static [&'static str] = &[
        "cornersPlus1",
        "cornersPlus2",
        "cornersOnly",
        "boundaries",
        "none",
        "all",
    ];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "cornersPlus1" => Some(Self::CornersPlus1),
            "cornersPlus2" => Some(Self::CornersPlus2),
            "cornersOnly" => Some(Self::CornersOnly),
            "boundaries" => Some(Self::Boundaries),
            "none" => Some(Self::None),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Polygon mesh geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct GeomMesh {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,

    pub points: TypedAttribute<Vec<Vec3>>,
    pub normals: TypedAttribute<Vec<Vec3>>,
    pub velocities: TypedAttribute<Vec<Vec3>>,
    pub face_vertex_counts: TypedAttribute<Vec<i32>>,
    pub face_vertex_indices: TypedAttribute<Vec<i32>>,

    // Subdivision surface attributes.
    pub corner_indices: TypedAttribute<Vec<i32>>,
    pub corner_sharpnesses: TypedAttribute<Vec<f32>>,
    pub crease_indices: TypedAttribute<Vec<i32>>,
    pub crease_lengths: TypedAttribute<Vec<i32>>,
    pub crease_sharpnesses: TypedAttribute<Vec<f32>>,
    pub hole_indices: TypedAttribute<Vec<i32>>,
    pub interpolate_boundary: TypedAttribute<InterpolateBoundary>,
    pub subdivision_scheme: UniformAttribute<SubdivisionScheme>,
    pub face_varying_linear_interpolation: TypedAttribute<FaceVaryingLinearInterpolation>,

    // Skel binding.
    pub skel_skeleton: Option<Relationship>,
    pub skel_blend_shape_targets: Option<Relationship>,
    pub skel_blend_shapes: TypedAttribute<Vec<Token>>,
}

impl Default for GeomMesh {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            points: TypedAttribute::default(),
            normals: TypedAttribute::default(),
            velocities: TypedAttribute::default(),
            face_vertex_counts: TypedAttribute::default(),
            face_vertex_indices: TypedAttribute::default(),
            corner_indices: TypedAttribute::default(),
            corner_sharpnesses: TypedAttribute::default(),
            crease_indices: TypedAttribute::default(),
            crease_lengths: TypedAttribute::default(),
            crease_sharpnesses: TypedAttribute::default(),
            hole_indices: TypedAttribute::default(),
            interpolate_boundary: TypedAttribute::with_fallback(InterpolateBoundary::default()),
            subdivision_scheme: UniformAttribute::with_fallback(SubdivisionScheme::default()),
            face_varying_linear_interpolation: TypedAttribute::with_fallback(
                FaceVaryingLinearInterpolation::default(),
            ),
            skel_skeleton: None,
            skel_blend_shape_targets: None,
            skel_blend_shapes: TypedAttribute::default(),
        }
    }
}

impl GeomMesh {
    /// `points` at a given time. Empty when unauthored or blocked.
    /// `primvars:normals` takes precedence over `normals` for normals; the
    /// same precedence is left to callers here since primvars stay in
    /// `core.props`.
    pub fn points_at(&self, time: f64, _interp: TimeSampleInterpolation) -> Vec<Vec3> {
        self.points
            .value()
            .and_then(|v| v.sample_held(time))
            .unwrap_or_default()
    }

    pub fn points_default(&self) -> Vec<Vec3> {
        self.points_at(TimeCode::DEFAULT, TimeSampleInterpolation::Held)
    }

    pub fn face_vertex_counts_default(&self) -> Vec<i32> {
        self.face_vertex_counts
            .value()
            .and_then(|v| v.sample_held(TimeCode::DEFAULT))
            .unwrap_or_default()
    }

    pub fn face_vertex_indices_default(&self) -> Vec<i32> {
        self.face_vertex_indices
            .value()
            .and_then(|v| v.sample_held(TimeCode::DEFAULT))
            .unwrap_or_default()
    }
}

/// Point cloud geometry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeomPoints {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub points: TypedAttribute<Vec<Vec3>>,
    pub normals: TypedAttribute<Vec<Vec3>>,
    pub widths: TypedAttribute<Vec<f32>>,
    pub ids: TypedAttribute<Vec<i64>>,
    pub velocities: TypedAttribute<Vec<Vec3>>,
    pub accelerations: TypedAttribute<Vec<Vec3>>,
}

/// Curve type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CurveType {
    #[default]
    Cubic,
    Linear,
}

impl CurveType {
    pub const ALLOWED: &'static [&'static str] = &["cubic", "linear"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "cubic" => Some(Self::Cubic),
            "linear" => Some(Self::Linear),
            _ => None,
        }
    }
}

/// Curve basis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CurveBasis {
    #[default]
    Bezier,
    Bspline,
    CatmullRom,
}

impl CurveBasis {
    pub const ALLOWED: &'static [&'static str] = &["bezier", "bspline", "catmullRom"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "bezier" => Some(Self::Bezier),
            "bspline" => Some(Self::Bspline),
            "catmullRom" => Some(Self::CatmullRom),
            _ => None,
        }
    }
}

/// Curve wrap mode. `pinned` and `periodic` are distinct tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CurveWrap {
    #[default]
    Nonperiodic,
    Periodic,
    Pinned,
}

impl CurveWrap {
    pub const ALLOWED: &'static [&'static str] = &["nonperiodic", "periodic", "pinned"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "nonperiodic" => Some(Self::Nonperiodic),
            "periodic" => Some(Self::Periodic),
            "pinned" => Some(Self::Pinned),
            _ => None,
        }
    }
}

/// Basis curves (hair, fur, ribbons).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeomBasisCurves {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub curve_type: UniformAttribute<CurveType>,
    pub basis: UniformAttribute<CurveBasis>,
    pub wrap: UniformAttribute<CurveWrap>,
    pub points: TypedAttribute<Vec<Vec3>>,
    pub normals: TypedAttribute<Vec<Vec3>>,
    pub curve_vertex_counts: TypedAttribute<Vec<i32>>,
    pub widths: TypedAttribute<Vec<f32>>,
    pub velocities: TypedAttribute<Vec<Vec3>>,
    pub accelerations: TypedAttribute<Vec<Vec3>>,
}

/// GeomSubset element type; only faces are supported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubsetElementType {
    #[default]
    Face,
}

impl SubsetElementType {
    pub const ALLOWED: &'static [&'static str] = &["face"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "face" => Some(Self::Face),
            _ => None,
        }
    }
}

/// GeomSubset family type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubsetFamilyType {
    Partition,
    NonOverlapping,
    #[default]
    Unrestricted,
}

impl SubsetFamilyType {
    pub const ALLOWED: &'static [&'static str] =
        &["partition", "nonOverlapping", "unrestricted"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "partition" => Some(Self::Partition),
            "nonOverlapping" => Some(Self::NonOverlapping),
            "unrestricted" => Some(Self::Unrestricted),
            _ => None,
        }
    }
}

/// A named subset of a parent mesh's faces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeomSubset {
    pub core: PrimCore,
    pub element_type: UniformAttribute<SubsetElementType>,
    pub family_name: UniformAttribute<Token>,
    pub family_type: SubsetFamilyType,
    pub indices: TypedAttribute<Vec<i32>>,
}

/// Camera projection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

impl Projection {
    pub const ALLOWED: &'static [&'static str] = &["perspective", "orthographic"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "perspective" => Some(Self::Perspective),
            "orthographic" => Some(Self::Orthographic),
            _ => None,
        }
    }
}

/// Camera stereo role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StereoRole {
    #[default]
    Mono,
    Left,
    Right,
}

impl StereoRole {
    pub const ALLOWED: &'static [&'static str] = &["mono", "left", "right"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "mono" => Some(Self::Mono),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Camera. Apertures in tenths of a scene unit, focal length in the same
/// scale as the original schema.
#[derive(Clone, Debug, PartialEq)]
pub struct GeomCamera {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub clipping_planes: TypedAttribute<Vec<crate::util::Vec4>>,
    pub clipping_range: TypedAttribute<crate::util::Vec2>,
    pub exposure: TypedAttribute<f32>,
    pub focal_length: TypedAttribute<f32>,
    pub focus_distance: TypedAttribute<f32>,
    pub horizontal_aperture: TypedAttribute<f32>,
    pub horizontal_aperture_offset: TypedAttribute<f32>,
    pub vertical_aperture: TypedAttribute<f32>,
    pub vertical_aperture_offset: TypedAttribute<f32>,
    pub f_stop: TypedAttribute<f32>,
    pub projection: TypedAttribute<Projection>,
    pub stereo_role: UniformAttribute<StereoRole>,
    pub shutter_open: TypedAttribute<f64>,
    pub shutter_close: TypedAttribute<f64>,
}

impl Default for GeomCamera {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            clipping_planes: TypedAttribute::default(),
            clipping_range: TypedAttribute::with_fallback(crate::util::Vec2::new(0.1, 1000000.0)),
            exposure: TypedAttribute::with_fallback(0.0),
            focal_length: TypedAttribute::with_fallback(50.0),
            focus_distance: TypedAttribute::with_fallback(0.0),
            horizontal_aperture: TypedAttribute::with_fallback(20.965),
            horizontal_aperture_offset: TypedAttribute::with_fallback(0.0),
            vertical_aperture: TypedAttribute::with_fallback(15.2908),
            vertical_aperture_offset: TypedAttribute::with_fallback(0.0),
            f_stop: TypedAttribute::with_fallback(0.0),
            projection: TypedAttribute::with_fallback(Projection::Perspective),
            stereo_role: UniformAttribute::with_fallback(StereoRole::Mono),
            shutter_open: TypedAttribute::with_fallback(0.0),
            shutter_close: TypedAttribute::with_fallback(0.0),
        }
    }
}

/// Instancer scattering prototypes over per-instance transforms.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointInstancer {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub prototypes: Option<Relationship>,
    pub proto_indices: TypedAttribute<Vec<i32>>,
    pub ids: TypedAttribute<Vec<i64>>,
    pub positions: TypedAttribute<Vec<Vec3>>,
    pub orientations: TypedAttribute<Vec<crate::util::HQuat>>,
    pub scales: TypedAttribute<Vec<Vec3>>,
    pub velocities: TypedAttribute<Vec<Vec3>>,
    pub accelerations: TypedAttribute<Vec<Vec3>>,
    pub angular_velocities: TypedAttribute<Vec<Vec3>>,
    pub invisible_ids: TypedAttribute<Vec<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prim::Property;
    use crate::value::Value;


    #[test]
    fn test_sphere_default_radius() {
        let s = GeomSphere::default();
        assert_eq!(s.radius.get_or_fallback(), Some(2.0));
        assert!(!s.radius.authored());
    }

    #[test]
    fn test_wrap_tokens_distinct() {
        assert_eq!(CurveWrap::from_token("periodic"), Some(CurveWrap::Periodic));
        assert_eq!(CurveWrap::from_token("pinned"), Some(CurveWrap::Pinned));
        assert_ne!(CurveWrap::Periodic, CurveWrap::Pinned);
    }

    #[test]
    fn test_subset_family_type() {
        assert_eq!(
            SubsetFamilyType::from_token("nonOverlapping"),
            Some(SubsetFamilyType::NonOverlapping)
        );
        assert_eq!(SubsetFamilyType::from_token("faces"), None);
    }

    #[test]
    fn test_primvar_flatten() {
        let mut core = PrimCore::default();
        core.props.insert(
            "primvars:displayColor".to_string(),
            Property::Attribute(Attribute::scalar(
                "color3f[]",
                Value::Vec3fArray(vec![Vec3::X, Vec3::Y]),
            )),
        );
        core.props.insert(
            "primvars:displayColor:indices".to_string(),
            Property::Attribute(Attribute::scalar("int[]", Value::IntArray(vec![1, 0, 1]))),
        );

        let pv = core.primvar("displayColor").unwrap();
        assert!(pv.has_indices());
        let flat: Vec<Vec3> = pv.flatten_with_indices().unwrap();
        assert_eq!(flat, vec![Vec3::Y, Vec3::X, Vec3::Y]);

        assert!(core.has_primvar("displayColor"));
        assert!(!core.has_primvar("st"));
        // :indices companions are not primvars themselves.
        assert_eq!(core.primvars().len(), 1);
    }
}
