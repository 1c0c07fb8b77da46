//! Light schema reconstructors.

use super::{
    add_residual_prop, build_xform_ops, fill_core, parse_gprim_prop, parse_typed_attr,
    parse_uniform_enum_attr, try_prop, ParseResult, PropertySet,
};
use crate::prim::lux::*;
use crate::prim::Prim;
use crate::util::Result;

/// Route one property through the input attributes all lights share.
/// Bare (`intensity`) spellings are accepted alongside the `inputs:`
/// namespace, matching files written before the connectable-light era.
fn parse_light_prop(
    table: &mut PropertySet,
    prop_name: &str,
    prop: &crate::prim::Property,
    light: &mut LightAttrs,
) -> ParseResult {
    macro_rules! light_slot {
        ($name:literal, $slot:expr) => {
            match parse_typed_attr(table, prop_name, prop, $name, $slot) {
                ParseResult::Unmatched => {}
                other => return other,
            }
        };
    }
    light_slot!("inputs:color", &mut light.color);
    light_slot!("color", &mut light.color);
    light_slot!("inputs:intensity", &mut light.intensity);
    light_slot!("intensity", &mut light.intensity);
    light_slot!("inputs:exposure", &mut light.exposure);
    light_slot!("exposure", &mut light.exposure);
    light_slot!("inputs:diffuse", &mut light.diffuse);
    light_slot!("diffuse", &mut light.diffuse);
    light_slot!("inputs:specular", &mut light.specular);
    light_slot!("specular", &mut light.specular);
    light_slot!("inputs:normalize", &mut light.normalize);
    light_slot!("normalize", &mut light.normalize);
    light_slot!("inputs:enableColorTemperature", &mut light.enable_color_temperature);
    light_slot!("enableColorTemperature", &mut light.enable_color_temperature);
    light_slot!("inputs:colorTemperature", &mut light.color_temperature);
    light_slot!("colorTemperature", &mut light.color_temperature);
    ParseResult::Unmatched
}

macro_rules! light_body {
    ($prim:expr, $warnings:expr, $out:expr, $table:ident, $name:ident, $prop:ident, $($matchers:tt)*) => {{
        let mut $table = PropertySet::new();
        fill_core(&mut $out.core, $prim);
        $out.gprim.xform_ops = build_xform_ops(&mut $table, &$prim.props)?;
        for ($name, $prop) in &$prim.props {
            if $table.contains($name.as_str()) {
                continue;
            }
            $($matchers)*
            try_prop!(parse_light_prop(&mut $table, $name, $prop, &mut $out.light));
            try_prop!(parse_gprim_prop(&mut $table, $name, $prop, &mut $out.gprim));
            add_residual_prop(&mut $out.core, $name, $prop, $warnings);
        }
        Ok($out)
    }};
}

pub fn reconstruct_sphere_light(prim: &Prim, warnings: &mut Vec<String>) -> Result<SphereLight> {
    let mut out = SphereLight::default();
    light_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:radius", &mut out.radius));
        try_prop!(parse_typed_attr(&mut table, name, prop, "radius", &mut out.radius));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "treatAsPoint", &mut out.treat_as_point
        ));
    )
}

pub fn reconstruct_rect_light(prim: &Prim, warnings: &mut Vec<String>) -> Result<RectLight> {
    let mut out = RectLight::default();
    light_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:width", &mut out.width));
        try_prop!(parse_typed_attr(&mut table, name, prop, "width", &mut out.width));
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:height", &mut out.height));
        try_prop!(parse_typed_attr(&mut table, name, prop, "height", &mut out.height));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:texture:file", &mut out.file
        ));
    )
}

pub fn reconstruct_disk_light(prim: &Prim, warnings: &mut Vec<String>) -> Result<DiskLight> {
    let mut out = DiskLight::default();
    light_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:radius", &mut out.radius));
        try_prop!(parse_typed_attr(&mut table, name, prop, "radius", &mut out.radius));
    )
}

pub fn reconstruct_cylinder_light(
    prim: &Prim,
    warnings: &mut Vec<String>,
) -> Result<CylinderLight> {
    let mut out = CylinderLight::default();
    light_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:length", &mut out.length));
        try_prop!(parse_typed_attr(&mut table, name, prop, "length", &mut out.length));
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:radius", &mut out.radius));
        try_prop!(parse_typed_attr(&mut table, name, prop, "radius", &mut out.radius));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "treatAsLine", &mut out.treat_as_line
        ));
    )
}

pub fn reconstruct_distant_light(prim: &Prim, warnings: &mut Vec<String>) -> Result<DistantLight> {
    let mut out = DistantLight::default();
    light_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_typed_attr(&mut table, name, prop, "inputs:angle", &mut out.angle));
        try_prop!(parse_typed_attr(&mut table, name, prop, "angle", &mut out.angle));
    )
}

pub fn reconstruct_dome_light(prim: &Prim, warnings: &mut Vec<String>) -> Result<DomeLight> {
    let mut out = DomeLight::default();
    light_body!(prim, warnings, out, table, name, prop,
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "inputs:texture:file", &mut out.file
        ));
        try_prop!(parse_uniform_enum_attr(
            &mut table, name, prop, "inputs:texture:format",
            TextureFormat::ALLOWED, TextureFormat::from_token, &mut out.texture_format,
        ));
        try_prop!(parse_typed_attr(
            &mut table, name, prop, "guideRadius", &mut out.guide_radius
        ));
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prim::{Attribute, Property};
    use crate::util::Vec3;
    use crate::value::Value;

    #[test]
    fn test_sphere_light_inputs() {
        let mut prim = Prim::new(crate::value::Specifier::Def, "SphereLight", "key");
        prim.props.insert(
            "inputs:intensity".to_string(),
            Property::Attribute(Attribute::scalar("float", Value::Float(500.0))),
        );
        prim.props.insert(
            "inputs:color".to_string(),
            Property::Attribute(Attribute::scalar(
                "color3f",
                Value::Vec3f(Vec3::new(1.0, 0.9, 0.8)),
            )),
        );
        prim.props.insert(
            "inputs:radius".to_string(),
            Property::Attribute(Attribute::scalar("float", Value::Float(2.0))),
        );

        let mut warnings = Vec::new();
        let light = reconstruct_sphere_light(&prim, &mut warnings).unwrap();
        assert_eq!(light.light.intensity.get_or_fallback(), Some(500.0));
        assert_eq!(
            light.light.color.get_or_fallback(),
            Some(Vec3::new(1.0, 0.9, 0.8))
        );
        assert_eq!(light.radius.get_or_fallback(), Some(2.0));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_bare_attribute_spelling() {
        let mut prim = Prim::new(crate::value::Specifier::Def, "DistantLight", "sun");
        prim.props.insert(
            "angle".to_string(),
            Property::Attribute(Attribute::scalar("float", Value::Float(0.25))),
        );
        let mut warnings = Vec::new();
        let light = reconstruct_distant_light(&prim, &mut warnings).unwrap();
        assert_eq!(light.angle.get_or_fallback(), Some(0.25));
    }
}
