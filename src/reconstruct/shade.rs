//! Material and shader reconstructors.
//!
//! `Shader.info:id` is required, must be a uniform token, and selects the
//! subtype reconstructor.

use super::{
    add_residual_prop, fill_core, parse_enum_attr, parse_terminal_attr, parse_typed_attr,
    parse_uniform_attr, try_prop, PropertySet,
};
use crate::prim::shade::*;
use crate::prim::{Prim, Property};
use crate::util::{Error, Result};
use crate::value::{Value, Variability};

pub fn reconstruct_material(prim: &Prim, warnings: &mut Vec<String>) -> Result<Material> {
    let mut out = Material::default();
    fill_core(&mut out.core, prim);
    let mut table = PropertySet::new();

    for (name, prop) in &prim.props {
        // Material outputs are connections to shader outputs.
        let slot = match name.as_str() {
            "outputs:surface" | "outputs:surface.connect" => Some(&mut out.surface),
            "outputs:displacement" | "outputs:displacement.connect" => {
                Some(&mut out.displacement)
            }
            "outputs:volume" | "outputs:volume.connect" => Some(&mut out.volume),
            _ => None,
        };
        if let Some(slot) = slot {
            let base = name.trim_end_matches(".connect");
            if table.contains(base) {
                continue;
            }
            if let Some(attr) = prop.as_attribute() {
                if let Some(target) = attr.connections.first() {
                    *slot = Some(target.clone());
                }
            }
            table.insert(base.to_string());
            continue;
        }
        add_residual_prop(&mut out.core, name, prop, warnings);
    }
    Ok(out)
}

/// Extract the required `info:id` discriminator.
fn shader_info_id(prim: &Prim) -> Result<String> {
    let prop = prim
        .props
        .get("info:id")
        .ok_or_else(|| Error::invalid("`Shader` requires an `info:id` attribute"))?;
    let attr = prop
        .as_attribute()
        .ok_or_else(|| Error::invalid("`info:id` must be an attribute"))?;
    if attr.variability != Variability::Uniform {
        return Err(Error::VariabilityMismatch(
            "`info:id` must be a `uniform token`".to_string(),
        ));
    }
    match attr.get_scalar() {
        Some(Value::Token(t)) => Ok(t.as_str().to_string()),
        Some(other) => Err(Error::TypeMismatch {
            expected: "`token` for `info:id`".to_string(),
            actual: format!("`{}`", other.type_name()),
        }),
        None => Err(Error::invalid("`info:id` carries no value")),
    }
}

pub fn reconstruct_shader(prim: &Prim, warnings: &mut Vec<String>) -> Result<Shader> {
    let info_id = shader_info_id(prim)?;
    let mut core = crate::prim::PrimCore::default();
    fill_core(&mut core, prim);
    let node = match info_id.as_str() {
        "UsdPreviewSurface" => {
            ShaderNode::PreviewSurface(reconstruct_preview_surface(prim, &mut core, warnings)?)
        }
        "UsdUVTexture" => ShaderNode::UVTexture(reconstruct_uv_texture(prim, &mut core, warnings)?),
        "UsdPrimvarReader_int" => {
            ShaderNode::PrimvarReaderInt(reconstruct_primvar_reader(prim, &mut core, warnings)?)
        }
        "UsdPrimvarReader_float" => {
            ShaderNode::PrimvarReaderFloat(reconstruct_primvar_reader(prim, &mut core, warnings)?)
        }
        "UsdPrimvarReader_float2" => {
            ShaderNode::PrimvarReaderFloat2(reconstruct_primvar_reader(prim, &mut core, warnings)?)
        }
        "UsdPrimvarReader_float3" => {
            ShaderNode::PrimvarReaderFloat3(reconstruct_primvar_reader(prim, &mut core, warnings)?)
        }
        "UsdPrimvarReader_float4" => {
            ShaderNode::PrimvarReaderFloat4(reconstruct_primvar_reader(prim, &mut core, warnings)?)
        }
        "UsdTransform2d" => ShaderNode::Transform2d(reconstruct_transform2d(prim, &mut core, warnings)?),
        other => {
            return Err(Error::invalid(format!(
                "unknown shader `info:id` `{}` (known: {})",
                other,
                SHADER_INFO_IDS.join(", ")
            )))
        }
    };

    Ok(Shader {
        core,
        info_id,
        node,
    })
}

/// Matcher loop over a shader's properties; `info:id` is pre-claimed.
macro_rules! shader_body {
    ($prim:expr, $warnings:expr, $out:expr, $residual:expr, $table:ident, $name:ident, $prop:ident, $($matchers:tt)*) => {{
        let mut $table = PropertySet::new();
        $table.insert("info:id".to_string());
        for ($name, $prop) in &$prim.props {
            if $table.contains($name.as_str()) {
                continue;
            }
            $($matchers)*
            add_residual_prop($residual, $name, $prop, $warnings);
        }
        Ok($out)
    }};
}

fn reconstruct_preview_surface(
    prim: &Prim,
    core: &mut crate::prim::PrimCore,
    warnings: &mut Vec<String>,
) -> Result<UsdPreviewSurface> {
    let mut out = UsdPreviewSurface::default();
    let result: Result<()> = shader_body!(prim, warnings, (), core, table, name, prop,
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:diffuseColor", &mut out.diffuse_color
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:emissiveColor", &mut out.emissive_color
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:specularColor", &mut out.specular_color
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:useSpecularWorkflow",
            &mut out.use_specular_workflow
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:metallic", &mut out.metallic
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:roughness", &mut out.roughness
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:clearcoat", &mut out.clearcoat
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:clearcoatRoughness", &mut out.clearcoat_roughness
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:opacity", &mut out.opacity
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:opacityThreshold", &mut out.opacity_threshold
        ));
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:ior", &mut out.ior));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:normal", &mut out.normal
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:displacement", &mut out.displacement
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:occlusion", &mut out.occlusion
        ));
        try_prop!(parse_terminal_attr(
            &mut table, name, prop, "outputs:surface", &mut out.outputs_surface
        ));
        try_prop!(parse_terminal_attr(
            &mut table, name, prop, "outputs:displacement", &mut out.outputs_displacement
        ));
    );
    result?;
    Ok(out)
}

fn reconstruct_uv_texture(
    prim: &Prim,
    core: &mut crate::prim::PrimCore,
    warnings: &mut Vec<String>,
) -> Result<UsdUVTexture> {
    let mut out = UsdUVTexture::default();
    let result: Result<()> = shader_body!(prim, warnings, (), core, table, name, prop,
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:file", &mut out.file));
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:st", &mut out.st));
        try_prop!(parse_enum_attr(
            &mut table, name, prop, "inputs:sourceColorSpace",
            SourceColorSpace::ALLOWED, SourceColorSpace::from_token,
            &mut out.source_color_space,
        ));
        try_prop!(parse_enum_attr(
            &mut table, name, prop, "inputs:wrapS",
            TextureWrap::ALLOWED, TextureWrap::from_token, &mut out.wrap_s,
        ));
        try_prop!(parse_enum_attr(
            &mut table, name, prop, "inputs:wrapT",
            TextureWrap::ALLOWED, TextureWrap::from_token, &mut out.wrap_t,
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:fallback", &mut out.fallback
        ));
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:scale", &mut out.scale));
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:bias", &mut out.bias));
        try_prop!(parse_terminal_attr(
            &mut table, name, prop, "outputs:r", &mut out.outputs_r
        ));
        try_prop!(parse_terminal_attr(
            &mut table, name, prop, "outputs:g", &mut out.outputs_g
        ));
        try_prop!(parse_terminal_attr(
            &mut table, name, prop, "outputs:b", &mut out.outputs_b
        ));
        try_prop!(parse_terminal_attr(
            &mut table, name, prop, "outputs:a", &mut out.outputs_a
        ));
        try_prop!(parse_terminal_attr(
            &mut table, name, prop, "outputs:rgb", &mut out.outputs_rgb
        ));
    );
    result?;
    Ok(out)
}

fn reconstruct_primvar_reader<T>(
    prim: &Prim,
    core: &mut crate::prim::PrimCore,
    warnings: &mut Vec<String>,
) -> Result<UsdPrimvarReader<T>>
where
    T: crate::value::ValueCast + Default,
{
    let mut out = UsdPrimvarReader::<T>::default();
    let result: Result<()> = shader_body!(prim, warnings, (), core, table, name, prop,
        try_prop!(parse_uniform_attr(
            &mut table, name, prop, "inputs:varname", &mut out.varname
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:fallback", &mut out.fallback
        ));
        try_prop!(parse_terminal_attr(
            &mut table, name, prop, "outputs:result", &mut out.outputs_result
        ));
    );
    result?;
    Ok(out)
}

fn reconstruct_transform2d(
    prim: &Prim,
    core: &mut crate::prim::PrimCore,
    warnings: &mut Vec<String>,
) -> Result<UsdTransform2d> {
    let mut out = UsdTransform2d::default();
    let result: Result<()> = shader_body!(prim, warnings, (), core, table, name, prop,
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:in", &mut out.input));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:rotation", &mut out.rotation
        ));
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:scale", &mut out.scale));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:translation", &mut out.translation
        ));
        try_prop!(parse_terminal_attr(
            &mut table, name, prop, "outputs:result", &mut out.outputs_result
        ));
    );
    result?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;
    use crate::prim::Attribute;
    use crate::token::Token;

    fn shader_prim(info_id: &str) -> Prim {
        let mut prim = Prim::new(crate::value::Specifier::Def, "Shader", "s");
        prim.props.insert(
            "info:id".to_string(),
            Property::Attribute(
                Attribute::scalar("token", Value::Token(Token::new(info_id))).uniform(),
            ),
        );
        prim
    }

    #[test]
    fn test_preview_surface_connection() {
        let mut prim = shader_prim("UsdPreviewSurface");
        let mut conn = Attribute::default();
        conn.type_name = "color3f".to_string();
        conn.connections.push(Path::parse("/Mat/Tex.outputs:rgb"));
        prim.props
            .insert("inputs:diffuseColor.connect".to_string(), Property::Attribute(conn));

        let mut warnings = Vec::new();
        let shader = reconstruct_shader(&prim, &mut warnings).unwrap();
        let ShaderNode::PreviewSurface(surface) = &shader.node else {
            panic!("expected preview surface");
        };
        assert!(surface.diffuse_color.is_connection());
        assert_eq!(
            surface.diffuse_color.connections()[0].full_path(),
            "/Mat/Tex.outputs:rgb"
        );
    }

    #[test]
    fn test_terminal_rejects_connection() {
        let mut prim = shader_prim("UsdPreviewSurface");
        let mut conn = Attribute::default();
        conn.type_name = "token".to_string();
        conn.connections.push(Path::parse("/other.outputs:surface"));
        prim.props
            .insert("outputs:surface.connect".to_string(), Property::Attribute(conn));

        let mut warnings = Vec::new();
        let err = reconstruct_shader(&prim, &mut warnings).unwrap_err();
        assert!(matches!(err, Error::ConnectionNotAllowed(_)));
    }

    #[test]
    fn test_unknown_info_id_rejected() {
        let prim = shader_prim("MyCustomShader");
        let mut warnings = Vec::new();
        assert!(reconstruct_shader(&prim, &mut warnings).is_err());
    }

    #[test]
    fn test_missing_info_id_rejected() {
        let prim = Prim::new(crate::value::Specifier::Def, "Shader", "s");
        let mut warnings = Vec::new();
        assert!(reconstruct_shader(&prim, &mut warnings).is_err());
    }

    #[test]
    fn test_uv_texture_wrap_enum() {
        let mut prim = shader_prim("UsdUVTexture");
        prim.props.insert(
            "inputs:wrapS".to_string(),
            Property::Attribute(Attribute::scalar(
                "token",
                Value::Token(Token::new("repeat")),
            )),
        );
        let mut warnings = Vec::new();
        let shader = reconstruct_shader(&prim, &mut warnings).unwrap();
        let ShaderNode::UVTexture(tex) = &shader.node else {
            panic!();
        };
        assert_eq!(tex.wrap_s.get_or_fallback(), Some(TextureWrap::Repeat));
    }

    #[test]
    fn test_material_surface_output() {
        let mut prim = Prim::new(crate::value::Specifier::Def, "Material", "m");
        let mut conn = Attribute::default();
        conn.type_name = "token".to_string();
        conn.connections.push(Path::parse("/m/pbr.outputs:surface"));
        prim.props
            .insert("outputs:surface.connect".to_string(), Property::Attribute(conn));

        let mut warnings = Vec::new();
        let material = reconstruct_material(&prim, &mut warnings).unwrap();
        assert_eq!(
            material.surface.as_ref().unwrap().full_path(),
            "/m/pbr.outputs:surface"
        );
    }

    #[test]
    fn test_connect_and_value_mutually_exclusive() {
        // `X` and `X.connect` may both be authored, but only one supplies
        // the slot; the second one reports AlreadyProcessed and is
        // silently dropped.
        let mut prim = shader_prim("UsdPreviewSurface");
        prim.props.insert(
            "inputs:roughness".to_string(),
            Property::Attribute(Attribute::scalar("float", Value::Float(0.25))),
        );
        let mut conn = Attribute::default();
        conn.type_name = "float".to_string();
        conn.connections.push(Path::parse("/Mat/Tex.outputs:r"));
        prim.props
            .insert("inputs:roughness.connect".to_string(), Property::Attribute(conn));

        let mut warnings = Vec::new();
        let shader = reconstruct_shader(&prim, &mut warnings).unwrap();
        let ShaderNode::PreviewSurface(surface) = &shader.node else {
            panic!();
        };
        // BTreeMap iteration orders `inputs:roughness` first, so the
        // value wins and the connection is dropped.
        assert!(!surface.roughness.is_connection() || surface.roughness.value().is_none());
        assert!(
            surface.roughness.is_connection()
                || surface.roughness.get_or_fallback() == Some(0.25)
        );
    }
}
