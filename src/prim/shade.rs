//! Shading schemas (UsdShade): materials and the preview shader library.

use super::{PrimCore, TerminalAttribute, TypedAttribute, UniformAttribute};
use crate::path::Path;
use crate::token::Token;
use crate::util::{Vec2, Vec3, Vec4};
use crate::value::AssetPath;

/// A material: binding site whose outputs connect to shader outputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub core: PrimCore,
    pub surface: Option<Path>,
    pub displacement: Option<Path>,
    pub volume: Option<Path>,
}

/// Texture wrap mode for [`UsdUVTexture`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextureWrap {
    #[default]
    UseMetadata,
    Black,
    Clamp,
    Repeat,
    Mirror,
}

impl TextureWrap {
    pub const ALLOWED: &'static [&'static str] =
        &["useMetadata", "black", "clamp", "repeat", "mirror"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "useMetadata" => Some(Self::UseMetadata),
            "black" => Some(Self::Black),
            "clamp" => Some(Self::Clamp),
            "repeat" => Some(Self::Repeat),
            "mirror" => Some(Self::Mirror),
            _ => None,
        }
    }
}

/// Source color space for [`UsdUVTexture`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceColorSpace {
    #[default]
    Auto,
    Raw,
    SRGB,
}

impl SourceColorSpace {
    pub const ALLOWED: &'static [&'static str] = &["auto", "raw", "sRGB"];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(Self::Auto),
            "raw" => Some(Self::Raw),
            "sRGB" => Some(Self::SRGB),
            _ => None,
        }
    }
}

/// The standard physically-based preview surface.
#[derive(Clone, Debug, PartialEq)]
pub struct UsdPreviewSurface {
    pub diffuse_color: TypedAttribute<Vec3>,
    pub emissive_color: TypedAttribute<Vec3>,
    pub specular_color: TypedAttribute<Vec3>,
    pub use_specular_workflow: TypedAttribute<i32>,
    pub metallic: TypedAttribute<f32>,
    pub roughness: TypedAttribute<f32>,
    pub clearcoat: TypedAttribute<f32>,
    pub clearcoat_roughness: TypedAttribute<f32>,
    pub opacity: TypedAttribute<f32>,
    pub opacity_threshold: TypedAttribute<f32>,
    pub ior: TypedAttribute<f32>,
    pub normal: TypedAttribute<Vec3>,
    pub displacement: TypedAttribute<f32>,
    pub occlusion: TypedAttribute<f32>,
    pub outputs_surface: TerminalAttribute,
    pub outputs_displacement: TerminalAttribute,
}

impl Default for UsdPreviewSurface {
    fn default() -> Self {
        Self {
            diffuse_color: TypedAttribute::with_fallback(Vec3::splat(0.18)),
            emissive_color: TypedAttribute::with_fallback(Vec3::ZERO),
            specular_color: TypedAttribute::with_fallback(Vec3::ZERO),
            use_specular_workflow: TypedAttribute::with_fallback(0),
            metallic: TypedAttribute::with_fallback(0.0),
            roughness: TypedAttribute::with_fallback(0.5),
            clearcoat: TypedAttribute::with_fallback(0.0),
            clearcoat_roughness: TypedAttribute::with_fallback(0.01),
            opacity: TypedAttribute::with_fallback(1.0),
            opacity_threshold: TypedAttribute::with_fallback(0.0),
            ior: TypedAttribute::with_fallback(1.5),
            normal: TypedAttribute::with_fallback(Vec3::Z),
            displacement: TypedAttribute::with_fallback(0.0),
            occlusion: TypedAttribute::with_fallback(1.0),
            outputs_surface: TerminalAttribute::default(),
            outputs_displacement: TerminalAttribute::default(),
        }
    }
}

/// UV texture lookup node.
#[derive(Clone, Debug, PartialEq)]
pub struct UsdUVTexture {
    pub file: TypedAttribute<AssetPath>,
    pub st: TypedAttribute<Vec2>,
    pub source_color_space: TypedAttribute<SourceColorSpace>,
    pub wrap_s: TypedAttribute<TextureWrap>,
    pub wrap_t: TypedAttribute<TextureWrap>,
    pub fallback: TypedAttribute<Vec4>,
    pub scale: TypedAttribute<Vec4>,
    pub bias: TypedAttribute<Vec4>,
    pub outputs_r: TerminalAttribute,
    pub outputs_g: TerminalAttribute,
    pub outputs_b: TerminalAttribute,
    pub outputs_a: TerminalAttribute,
    pub outputs_rgb: TerminalAttribute,
}

impl Default for UsdUVTexture {
    fn default() -> Self {
        Self {
            file: TypedAttribute::default(),
            st: TypedAttribute::default(),
            source_color_space: TypedAttribute::with_fallback(SourceColorSpace::Auto),
            wrap_s: TypedAttribute::with_fallback(TextureWrap::UseMetadata),
            wrap_t: TypedAttribute::with_fallback(TextureWrap::UseMetadata),
            fallback: TypedAttribute::with_fallback(Vec4::new(0.0, 0.0, 0.0, 1.0)),
            scale: TypedAttribute::with_fallback(Vec4::ONE),
            bias: TypedAttribute::with_fallback(Vec4::ZERO),
            outputs_r: TerminalAttribute::default(),
            outputs_g: TerminalAttribute::default(),
            outputs_b: TerminalAttribute::default(),
            outputs_a: TerminalAttribute::default(),
            outputs_rgb: TerminalAttribute::default(),
        }
    }
}

/// Primvar reader over a value type `T`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UsdPrimvarReader<T: Clone> {
    /// Name of the primvar to read (`token` or `string` in the wild).
    pub varname: UniformAttribute<Token>,
    pub fallback: TypedAttribute<T>,
    pub outputs_result: TerminalAttribute,
}

/// 2D texture-coordinate transform node.
#[derive(Clone, Debug, PartialEq)]
pub struct UsdTransform2d {
    pub input: TypedAttribute<Vec2>,
    pub rotation: TypedAttribute<f32>,
    pub scale: TypedAttribute<Vec2>,
    pub translation: TypedAttribute<Vec2>,
    pub outputs_result: TerminalAttribute,
}

impl Default for UsdTransform2d {
    fn default() -> Self {
        Self {
            input: TypedAttribute::default(),
            rotation: TypedAttribute::with_fallback(0.0),
            scale: TypedAttribute::with_fallback(Vec2::ONE),
            translation: TypedAttribute::with_fallback(Vec2::ZERO),
            outputs_result: TerminalAttribute::default(),
        }
    }
}

/// The node behind a `Shader` prim, selected by `info:id`.
#[derive(Clone, Debug, PartialEq)]
pub enum ShaderNode {
    PreviewSurface(UsdPreviewSurface),
    UVTexture(UsdUVTexture),
    PrimvarReaderInt(UsdPrimvarReader<i32>),
    PrimvarReaderFloat(UsdPrimvarReader<f32>),
    PrimvarReaderFloat2(UsdPrimvarReader<Vec2>),
    PrimvarReaderFloat3(UsdPrimvarReader<Vec3>),
    PrimvarReaderFloat4(UsdPrimvarReader<Vec4>),
    Transform2d(UsdTransform2d),
}

/// A `Shader` prim: its `info:id` discriminator plus the typed node.
#[derive(Clone, Debug, PartialEq)]
pub struct Shader {
    pub core: PrimCore,
    pub info_id: String,
    pub node: ShaderNode,
}

/// Known `info:id` values, in dispatch order.
pub const SHADER_INFO_IDS: &[&str] = &[
    "UsdPreviewSurface",
    "UsdUVTexture",
    "UsdPrimvarReader_int",
    "UsdPrimvarReader_float",
    "UsdPrimvarReader_float2",
    "UsdPrimvarReader_float3",
    "UsdPrimvarReader_float4",
    "UsdTransform2d",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_surface_defaults() {
        let s = UsdPreviewSurface::default();
        assert_eq!(s.diffuse_color.get_or_fallback(), Some(Vec3::splat(0.18)));
        assert_eq!(s.roughness.get_or_fallback(), Some(0.5));
        assert_eq!(s.ior.get_or_fallback(), Some(1.5));
        assert!(!s.outputs_surface.authored());
    }

    #[test]
    fn test_texture_enums() {
        assert_eq!(TextureWrap::from_token("repeat"), Some(TextureWrap::Repeat));
        assert_eq!(TextureWrap::from_token("tile"), None);
        assert_eq!(SourceColorSpace::from_token("sRGB"), Some(SourceColorSpace::SRGB));
    }
}
