//! Light schemas (UsdLux).

use super::{GPrimAttrs, PrimCore, TypedAttribute, UniformAttribute};
use crate::util::Vec3;
use crate::value::AssetPath;

/// Input attributes shared by every light.
#[derive(Clone, Debug, PartialEq)]
pub struct LightAttrs {
    pub color: TypedAttribute<Vec3>,
    pub intensity: TypedAttribute<f32>,
    pub exposure: TypedAttribute<f32>,
    pub diffuse: TypedAttribute<f32>,
    pub specular: TypedAttribute<f32>,
    pub normalize: TypedAttribute<bool>,
    pub enable_color_temperature: TypedAttribute<bool>,
    pub color_temperature: TypedAttribute<f32>,
}

impl Default for LightAttrs {
    fn default() -> Self {
        Self {
            color: TypedAttribute::with_fallback(Vec3::ONE),
            intensity: TypedAttribute::with_fallback(1.0),
            exposure: TypedAttribute::with_fallback(0.0),
            diffuse: TypedAttribute::with_fallback(1.0),
            specular: TypedAttribute::with_fallback(1.0),
            normalize: TypedAttribute::with_fallback(false),
            enable_color_temperature: TypedAttribute::with_fallback(false),
            color_temperature: TypedAttribute::with_fallback(6500.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SphereLight {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub light: LightAttrs,
    pub radius: TypedAttribute<f32>,
    pub treat_as_point: TypedAttribute<bool>,
}

impl Default for SphereLight {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            light: LightAttrs::default(),
            radius: TypedAttribute::with_fallback(0.5),
            treat_as_point: TypedAttribute::with_fallback(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RectLight {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub light: LightAttrs,
    pub width: TypedAttribute<f32>,
    pub height: TypedAttribute<f32>,
    pub file: TypedAttribute<AssetPath>,
}

impl Default for RectLight {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            light: LightAttrs::default(),
            width: TypedAttribute::with_fallback(1.0),
            height: TypedAttribute::with_fallback(1.0),
            file: TypedAttribute::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiskLight {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub light: LightAttrs,
    pub radius: TypedAttribute<f32>,
}

impl Default for DiskLight {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            light: LightAttrs::default(),
            radius: TypedAttribute::with_fallback(0.5),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CylinderLight {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub light: LightAttrs,
    pub length: TypedAttribute<f32>,
    pub radius: TypedAttribute<f32>,
    pub treat_as_line: TypedAttribute<bool>,
}

impl Default for CylinderLight {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            light: LightAttrs::default(),
            length: TypedAttribute::with_fallback(1.0),
            radius: TypedAttribute::with_fallback(0.5),
            treat_as_line: TypedAttribute::with_fallback(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DistantLight {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub light: LightAttrs,
    /// Angular size of the light, in degrees.
    pub angle: TypedAttribute<f32>,
}

impl Default for DistantLight {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            light: LightAttrs::default(),
            angle: TypedAttribute::with_fallback(0.53),
        }
    }
}

/// Environment texture format for [`DomeLight`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextureFormat {
    #[default]
    Automatic,
    Latlong,
    MirroredBall,
    Angular,
    CubeMapVerticalCross,
}

impl TextureFormat {
    pub const ALLOWED: &'static [&'static str] = &[
        "automatic",
        "latlong",
        "mirroredBall",
        "angular",
        "cubeMapVerticalCross",
    ];

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "automatic" => Some(Self::Automatic),
            "latlong" => Some(Self::Latlong),
            "mirroredBall" => Some(Self::MirroredBall),
            "angular" => Some(Self::Angular),
            "cubeMapVerticalCross" => Some(Self::CubeMapVerticalCross),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DomeLight {
    pub core: PrimCore,
    pub gprim: GPrimAttrs,
    pub light: LightAttrs,
    pub file: TypedAttribute<AssetPath>,
    pub texture_format: UniformAttribute<TextureFormat>,
    pub guide_radius: TypedAttribute<f32>,
}

impl Default for DomeLight {
    fn default() -> Self {
        Self {
            core: PrimCore::default(),
            gprim: GPrimAttrs::default(),
            light: LightAttrs::default(),
            file: TypedAttribute::default(),
            texture_format: UniformAttribute::with_fallback(TextureFormat::Automatic),
            guide_radius: TypedAttribute::with_fallback(100000.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_defaults() {
        let l = SphereLight::default();
        assert_eq!(l.light.color.get_or_fallback(), Some(Vec3::ONE));
        assert_eq!(l.light.intensity.get_or_fallback(), Some(1.0));
        assert_eq!(l.radius.get_or_fallback(), Some(0.5));
    }

    #[test]
    fn test_texture_format() {
        assert_eq!(TextureFormat::from_token("latlong"), Some(TextureFormat::Latlong));
        assert_eq!(TextureFormat::from_token("cube"), None);
    }
}
