//! End-to-end tests: ASCII documents through parse and reconstruction.

use usd::prim::TypedPrim;
use usd::{load_from_memory, LoadConfig};

fn load(src: &[u8]) -> usd::Stage {
    load_from_memory(src, &LoadConfig::default()).expect("stage must load")
}

#[test]
fn test_sphere_with_time_sampled_radius() {
    let stage = load(
        br#"#usda 1.0

def Sphere "ball"
{
    double radius.timeSamples = {
        0: 1.2,
        1: 2.3,
    }
}
"#,
    );

    assert_eq!(stage.num_prims(), 1);
    let TypedPrim::GeomSphere(ball) = &stage.root_prims[0].prim else {
        panic!("expected a sphere");
    };
    assert!(ball.radius.is_timesamples());
    let ts = ball.radius.timesamples().unwrap();
    assert_eq!(ts.times(), vec![0.0, 1.0]);
    assert_eq!(ts.sample_held(0.0), Some(1.2));
    assert_eq!(ts.sample_held(1.0), Some(2.3));
    // Held interpolation between the samples.
    assert_eq!(ts.sample_held(0.5), Some(1.2));
}

#[test]
fn test_blocked_radius() {
    let stage = load(
        br#"#usda 1.0

def Sphere "ball"
{
    double radius = None
}
"#,
    );
    let TypedPrim::GeomSphere(ball) = &stage.root_prims[0].prim else {
        panic!();
    };
    assert!(ball.radius.is_blocked());
    assert!(!ball.radius.is_connection());
}

#[test]
fn test_preview_surface_connection() {
    let stage = load(
        br#"#usda 1.0

def Shader "pbr"
{
    uniform token info:id = "UsdPreviewSurface"
    color3f inputs:diffuseColor.connect = </Mat/Tex.outputs:rgb>
    float inputs:roughness = 0.4
}
"#,
    );
    let TypedPrim::Shader(shader) = &stage.root_prims[0].prim else {
        panic!("expected a shader");
    };
    assert_eq!(shader.info_id, "UsdPreviewSurface");
    let usd::prim::shade::ShaderNode::PreviewSurface(surface) = &shader.node else {
        panic!("expected a preview surface");
    };
    assert!(surface.diffuse_color.is_connection());
    assert_eq!(
        surface.diffuse_color.connections()[0].full_path(),
        "/Mat/Tex.outputs:rgb"
    );
    assert_eq!(surface.roughness.get_or_fallback(), Some(0.4));
}

#[test]
fn test_type_mismatch_is_reported() {
    let result = load_from_memory(
        br#"#usda 1.0

def Sphere "ball"
{
    int radius = 1
}
"#,
        &LoadConfig::default(),
    );
    let err = result.unwrap_err().to_string();
    assert!(err.contains("radius"), "error must name the property: {}", err);
    assert!(err.contains("double"), "error must name the expected type: {}", err);
    assert!(err.contains("int"), "error must name the authored type: {}", err);
}

#[test]
fn test_xform_op_order() {
    let stage = load(
        br#"#usda 1.0

def Xform "root"
{
    uniform token[] xformOpOrder = ["!resetXformStack!", "xformOp:translate", "!invert!xformOp:rotateY"]
    double3 xformOp:translate = (1, 2, 3)
    float xformOp:rotateY = 45
}
"#,
    );
    let TypedPrim::Xform(xform) = &stage.root_prims[0].prim else {
        panic!();
    };
    let ops = &xform.gprim.xform_ops;
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[0].kind, usd::prim::XformOpKind::ResetXformStack);
    assert_eq!(ops[0].value, usd::prim::AttrValue::Empty);
    assert_eq!(ops[1].kind, usd::prim::XformOpKind::Translate);
    assert_eq!(ops[2].kind, usd::prim::XformOpKind::RotateY);
    assert!(ops[2].inverted);
    assert!(!ops[1].inverted);
}

#[test]
fn test_nested_hierarchy_and_paths() {
    let stage = load(
        br#"#usda 1.0
(
    defaultPrim = "World"
)

def Xform "World"
{
    def Scope "geo"
    {
        def Mesh "plane"
        {
            point3f[] points = [(0, 0, 0), (1, 0, 0), (1, 1, 0), (0, 1, 0)]
            int[] faceVertexCounts = [4]
            int[] faceVertexIndices = [0, 1, 2, 3]
        }
    }
}
"#,
    );

    assert_eq!(stage.num_prims(), 3);
    let plane_path = usd::Path::parse("/World/geo/plane");
    let node = stage.prim_at_path(&plane_path).expect("plane must exist");
    let TypedPrim::GeomMesh(mesh) = &node.prim else {
        panic!("expected a mesh");
    };
    assert_eq!(mesh.points_default().len(), 4);
    assert_eq!(mesh.face_vertex_counts_default(), vec![4]);
    assert_eq!(mesh.face_vertex_indices_default(), vec![0, 1, 2, 3]);
}

#[test]
fn test_material_binding_and_residual_primvars() {
    let stage = load(
        br#"#usda 1.0

def Mesh "m"
{
    rel material:binding = </Looks/Wood>
    color3f[] primvars:displayColor = [(1, 0, 0)] (
        interpolation = "constant"
    )
    int[] primvars:displayColor:indices = [0]
}
"#,
    );
    let TypedPrim::GeomMesh(mesh) = &stage.root_prims[0].prim else {
        panic!();
    };
    assert_eq!(
        mesh.gprim.material_binding.binding.as_ref().unwrap().full_path(),
        "/Looks/Wood"
    );

    let pv = mesh.core.primvar("displayColor").expect("primvar kept");
    assert_eq!(pv.interpolation(), usd::prim::Interpolation::Constant);
    assert!(pv.has_indices());
    let flat: Vec<usd::util::Vec3> = pv.flatten_with_indices().unwrap();
    assert_eq!(flat, vec![usd::util::Vec3::X]);
}

#[test]
fn test_enum_round_trips() {
    let stage = load(
        br#"#usda 1.0

def Mesh "m"
{
    uniform token subdivisionScheme = "loop"
    uniform token orientation = "leftHanded"
    token visibility = "invisible"
    uniform token purpose = "render"
}
"#,
    );
    let TypedPrim::GeomMesh(mesh) = &stage.root_prims[0].prim else {
        panic!();
    };
    assert_eq!(
        mesh.subdivision_scheme.get_or_fallback(),
        Some(usd::prim::geom::SubdivisionScheme::Loop)
    );
    assert_eq!(
        mesh.gprim.orientation.get_or_fallback(),
        Some(usd::prim::Orientation::LeftHanded)
    );
    assert_eq!(
        mesh.gprim.visibility.get_or_fallback(),
        Some(usd::prim::Visibility::Invisible)
    );
    assert_eq!(
        mesh.gprim.purpose.get_or_fallback(),
        Some(usd::prim::Purpose::Render)
    );
}

#[test]
fn test_unknown_enum_token_rejected() {
    let result = load_from_memory(
        br#"#usda 1.0

def Mesh "m"
{
    uniform token subdivisionScheme = "catmark"
}
"#,
        &LoadConfig::default(),
    );
    let err = result.unwrap_err().to_string();
    assert!(err.contains("catmark"));
    assert!(err.contains("catmullClark"), "must list allowed tokens: {}", err);
}

#[test]
fn test_extent_size_checked() {
    let stage = load(
        br#"#usda 1.0

def Mesh "m"
{
    float3[] extent = [(-1, -1, -1), (1, 1, 1)]
}
"#,
    );
    let TypedPrim::GeomMesh(mesh) = &stage.root_prims[0].prim else {
        panic!();
    };
    let extent = mesh.gprim.extent.value().unwrap().get_scalar().unwrap();
    assert_eq!(extent.lower, usd::util::Vec3::splat(-1.0));
    assert_eq!(extent.upper, usd::util::Vec3::splat(1.0));

    // Three vectors is not an extent.
    let bad = load_from_memory(
        br#"#usda 1.0

def Mesh "m"
{
    float3[] extent = [(-1, -1, -1), (1, 1, 1), (2, 2, 2)]
}
"#,
        &LoadConfig::default(),
    );
    assert!(bad.is_err());
}

#[test]
fn test_skel_family() {
    let stage = load(
        br#"#usda 1.0

def SkelRoot "chr"
{
    def Skeleton "rig"
    {
        uniform token[] joints = ["hips", "hips/spine"]
        rel skel:animationSource = </chr/anim>
    }

    def SkelAnimation "anim"
    {
        uniform token[] joints = ["hips", "hips/spine"]
        float[] blendShapeWeights.timeSamples = {
            0: [0, 0],
            10: [1, 0.5],
        }
    }
}
"#,
    );
    let rig = stage
        .prim_at_path(&usd::Path::parse("/chr/rig"))
        .expect("rig exists");
    let TypedPrim::Skeleton(skel) = &rig.prim else {
        panic!();
    };
    assert_eq!(skel.joints.value().unwrap().len(), 2);
    assert_eq!(
        skel.animation_source
            .as_ref()
            .unwrap()
            .single_target()
            .unwrap()
            .full_path(),
        "/chr/anim"
    );

    let anim = stage
        .prim_at_path(&usd::Path::parse("/chr/anim"))
        .expect("anim exists");
    let TypedPrim::SkelAnimation(anim) = &anim.prim else {
        panic!();
    };
    assert!(anim.blend_shape_weights.is_timesamples());
}
