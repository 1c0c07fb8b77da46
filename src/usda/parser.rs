//! Recursive-descent parser for the ASCII container.
//!
//! The grammar, at design level:
//!
//! ```text
//! File         := Magic StageMetas? PrimTree*
//! PrimTree     := [ListEditQual] Specifier TypeName? Name
//!                 ('(' PrimMetas ')')? '{' Body '}'
//! Body         := (PropertyDecl | PrimTree)*
//! PropertyDecl := [custom] [uniform] TypeName ('[]')? Name (Suffix)?
//!                 ('=' Value)? ('(' AttrMetas ')')?
//! Suffix       := '.connect' | '.timeSamples'
//! ```
//!
//! Diagnostics accumulate on push/pop stacks so speculative parses can
//! withdraw their errors on backtrack.

use std::collections::BTreeMap;

use half::f16;
use log::warn;

use super::lexer::{Cursor, Lexer};
use crate::path::Path;
use crate::prim::{
    AttrMeta, AttrValue, Attribute, Axis, Interpolation, Kind, Prim, PrimMeta, Property,
    Relationship, RelationshipTargets, StageMeta,
};
use crate::token::Token;
use crate::util::{
    DMat2, DMat3, DMat4, DQuat, DVec2, DVec3, DVec4, Error, HQuat, HVec2, HVec3, HVec4, IVec2,
    IVec3, IVec4, Quat, Result, Vec2, Vec3, Vec4,
};
use crate::value::{
    AssetPath, Dictionary, ListEditQual, Payload, Reference, Specifier, TimeSamples, Value,
    Variability,
};

/// One located diagnostic.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub message: String,
    pub cursor: Cursor,
}

/// Sniff an ASCII header: `#usda <float>`.
pub fn is_usda(buf: &[u8]) -> bool {
    let line = buf.split(|&b| b == b'\n').next().unwrap_or(&[]);
    let Ok(line) = std::str::from_utf8(line) else {
        return false;
    };
    let Some(rest) = line.trim_end().strip_prefix("#usda ") else {
        return false;
    };
    rest.trim().parse::<f32>().is_ok()
}

/// Scalar type names the property grammar accepts.
const REGISTERED_TYPES: &[&str] = &[
    "bool", "uchar", "int", "uint", "int64", "uint64", "half", "float", "double", "string",
    "token", "asset", "timecode", "matrix2d", "matrix3d", "matrix4d", "quath", "quatf", "quatd",
    "half2", "half3", "half4", "float2", "float3", "float4", "double2", "double3", "double4",
    "int2", "int3", "int4", "color3f", "color4f", "normal3f", "point3f", "vector3f",
    "texCoord2f", "texCoord3f", "frame4d",
];

pub struct AsciiParser<'a> {
    lex: Lexer<'a>,
    version: f32,
    err_stack: Vec<Diagnostic>,
    warn_stack: Vec<Diagnostic>,
    #[allow(dead_code)]
    base_dir: String,
}

impl<'a> AsciiParser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            lex: Lexer::new(buf),
            version: 0.0,
            err_stack: Vec::new(),
            warn_stack: Vec::new(),
            base_dir: String::new(),
        }
    }

    /// Base filesystem directory used to resolve relative asset paths by
    /// an external resolver.
    pub fn with_base_dir(mut self, dir: impl Into<String>) -> Self {
        self.base_dir = dir.into();
        self
    }

    #[inline]
    pub fn version(&self) -> f32 {
        self.version
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.err_stack.push(Diagnostic {
            message: message.into(),
            cursor: self.lex.cursor(),
        });
    }

    /// Withdraw the most recent error (speculative parse rollback).
    pub fn pop_error(&mut self) {
        self.err_stack.pop();
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warn_stack.push(Diagnostic {
            message: message.into(),
            cursor: self.lex.cursor(),
        });
    }

    pub fn pop_warning(&mut self) {
        self.warn_stack.pop();
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warn_stack
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.err_stack
    }

    fn located(&self, msg: impl Into<String>) -> Error {
        let c = self.lex.cursor();
        Error::invalid(format!("{} at {}:{}", msg.into(), c.row + 1, c.col + 1))
    }

    // ------------------------------------------------------------------
    // Entry
    // ------------------------------------------------------------------

    /// Parse the whole document into stage metadata and root prims.
    pub fn parse(&mut self) -> Result<(StageMeta, Vec<Prim>)> {
        self.parse_magic_header()?;

        self.lex.skip_whitespace_and_comments();
        let meta = if self.lex.peek() == Some(b'(') {
            self.parse_stage_metas()?
        } else {
            StageMeta::default()
        };

        let mut prims = Vec::new();
        loop {
            self.lex.skip_whitespace_and_comments();
            if self.lex.eof() {
                break;
            }
            prims.push(self.parse_prim()?);
        }
        Ok((meta, prims))
    }

    /// `#usda <float>`, first line.
    fn parse_magic_header(&mut self) -> Result<()> {
        if !self.lex.accept_str("#usda ") {
            return Err(Error::MalformedHeader(
                "ASCII input must start with `#usda <version>`".to_string(),
            ));
        }
        self.lex.skip_inline_whitespace();
        let version = self.lex.read_f64()? as f32;
        self.version = version;
        self.lex.skip_until_newline();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stage metadata
    // ------------------------------------------------------------------

    fn parse_stage_metas(&mut self) -> Result<StageMeta> {
        self.lex.expect(b'(')?;
        let mut meta = StageMeta::default();
        loop {
            self.lex.skip_whitespace_and_comments();
            if self.lex.accept(b')') {
                break;
            }
            if self.lex.peek() == Some(b'"') || self.lex.peek() == Some(b'\'') {
                // A bare string is the layer doc.
                meta.doc = Some(self.lex.read_string_literal()?);
                continue;
            }
            let key = self.lex.read_identifier()?;
            self.lex.skip_whitespace_and_comments();
            self.lex.expect(b'=')?;
            self.lex.skip_whitespace_and_comments();
            match key.as_str() {
                "defaultPrim" => {
                    meta.default_prim = Some(Token::new(self.lex.read_string_literal()?))
                }
                "upAxis" => {
                    let axis = self.lex.read_string_literal()?;
                    meta.up_axis = Some(Axis::from_token(&axis).ok_or_else(|| {
                        Error::UnknownEnum {
                            attr: "upAxis".to_string(),
                            got: axis,
                            allowed: Axis::ALLOWED.join(", "),
                        }
                    })?);
                }
                "metersPerUnit" => meta.meters_per_unit = Some(self.lex.read_f64()?),
                "timeCodesPerSecond" => {
                    meta.time_codes_per_second = Some(self.lex.read_f64()?)
                }
                "startTimeCode" => meta.start_time_code = Some(self.lex.read_f64()?),
                "endTimeCode" => meta.end_time_code = Some(self.lex.read_f64()?),
                "framesPerSecond" => meta.frames_per_second = Some(self.lex.read_f64()?),
                "doc" => meta.doc = Some(self.lex.read_string_literal()?),
                "customLayerData" => meta.custom_layer_data = self.parse_dictionary()?,
                "subLayers" => {
                    let mut layers = Vec::new();
                    self.lex.expect(b'[')?;
                    loop {
                        self.lex.skip_whitespace_and_comments();
                        if self.lex.accept(b']') {
                            break;
                        }
                        layers.push(AssetPath::new(self.lex.read_asset_path()?));
                        self.lex.skip_whitespace_and_comments();
                        self.lex.accept(b',');
                    }
                    meta.sub_layers = layers;
                }
                other => {
                    let value = self.parse_any_value()?;
                    self.push_warning(format!("unknown stage metadatum `{}`", other));
                    meta.unregistered.insert(other.to_string(), value);
                }
            }
        }
        Ok(meta)
    }

    // ------------------------------------------------------------------
    // Prims
    // ------------------------------------------------------------------

    fn maybe_list_edit_qual(&mut self) -> Result<ListEditQual> {
        let saved = self.lex.save();
        if let Ok(word) = self.lex.read_identifier() {
            if let Some(qual) = ListEditQual::from_keyword(&word) {
                return Ok(qual);
            }
        }
        self.lex.restore(saved);
        Ok(ListEditQual::ResetToExplicit)
    }

    fn parse_prim(&mut self) -> Result<Prim> {
        // A list-edit qualifier may precede the specifier (rare but
        // legal for `over`s inside variants).
        let _qual = self.maybe_list_edit_qual()?;
        self.lex.skip_whitespace_and_comments();

        let spec_word = self.lex.read_identifier()?;
        let spec = match spec_word.as_str() {
            "def" => Specifier::Def,
            "over" => Specifier::Over,
            "class" => Specifier::Class,
            other => {
                return Err(self.located(format!(
                    "expected `def`, `over` or `class`, found `{}`",
                    other
                )))
            }
        };

        self.lex.skip_whitespace_and_comments();
        // Optional schema type name before the quoted prim name.
        let mut prim_type = String::new();
        if self.lex.peek() != Some(b'"') && self.lex.peek() != Some(b'\'') {
            prim_type = self.lex.read_identifier()?;
            self.lex.skip_whitespace_and_comments();
        }

        let name = self.lex.read_string_literal()?;
        if name.is_empty() {
            return Err(self.located("prim name must not be empty"));
        }

        let mut prim = Prim::new(spec, prim_type, name);

        self.lex.skip_whitespace_and_comments();
        if self.lex.peek() == Some(b'(') {
            prim.meta = self.parse_prim_metas()?;
        }

        self.lex.skip_whitespace_and_comments();
        self.lex.expect(b'{')?;
        loop {
            self.lex.skip_whitespace_and_comments();
            if self.lex.accept(b'}') {
                break;
            }
            if self.lex.eof() {
                return Err(self.located("unterminated prim body"));
            }
            if self.looking_at_nested_prim() {
                let child = self.parse_prim()?;
                prim.children.push(child);
            } else if self.lex.looking_at("variantSet ") {
                self.skip_variant_set_block()?;
            } else {
                self.parse_property_decl(&mut prim.props)?;
            }
        }
        Ok(prim)
    }

    /// Lookahead: does the body continue with a nested prim?
    fn looking_at_nested_prim(&mut self) -> bool {
        let saved = self.lex.save();
        let result = (|| -> Result<bool> {
            let _ = self.maybe_list_edit_qual()?;
            self.lex.skip_whitespace_and_comments();
            let word = self.lex.read_identifier()?;
            Ok(matches!(word.as_str(), "def" | "over" | "class"))
        })()
        .unwrap_or(false);
        self.lex.restore(saved);
        result
    }

    /// Variant sets belong to the composition engine; the block is
    /// consumed, balanced, and reported.
    fn skip_variant_set_block(&mut self) -> Result<()> {
        self.push_warning("variantSet blocks are not evaluated");
        warn!("skipping variantSet block");
        // variantSet "name" = { ... }
        self.lex.accept_str("variantSet");
        self.lex.skip_whitespace_and_comments();
        let _name = self.lex.read_string_literal()?;
        self.lex.skip_whitespace_and_comments();
        self.lex.expect(b'=')?;
        self.lex.skip_whitespace_and_comments();
        self.lex.expect(b'{')?;
        let mut depth = 1u32;
        while depth > 0 {
            match self.lex.bump() {
                Some(b'{') => depth += 1,
                Some(b'}') => depth -= 1,
                Some(_) => {}
                None => return Err(self.located("unterminated variantSet block")),
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    fn parse_property_decl(&mut self, props: &mut BTreeMap<String, Property>) -> Result<()> {
        let mut custom = false;
        let mut uniform = false;
        loop {
            let saved = self.lex.save();
            let word = self.lex.read_identifier()?;
            match word.as_str() {
                "custom" if !custom => custom = true,
                "uniform" if !uniform => uniform = true,
                "rel" => {
                    self.lex.skip_whitespace_and_comments();
                    return self.parse_relationship_decl(props, custom);
                }
                _ => {
                    self.lex.restore(saved);
                    break;
                }
            }
            self.lex.skip_whitespace_and_comments();
        }

        let type_name = {
            let base = self.lex.read_namespaced_identifier()?;
            if !REGISTERED_TYPES.contains(&base.as_str()) {
                return Err(self.located(format!("unknown attribute type `{}`", base)));
            }
            if self.lex.accept_str("[]") {
                format!("{}[]", base)
            } else {
                base
            }
        };

        self.lex.skip_whitespace_and_comments();
        let name = self.lex.read_namespaced_identifier()?;

        // Optional `.connect` / `.timeSamples` suffix.
        let mut suffix = String::new();
        if self.lex.accept(b'.') {
            suffix = self.lex.read_identifier()?;
            if suffix != "connect" && suffix != "timeSamples" {
                return Err(self.located(format!(
                    "unknown property suffix `.{}` on `{}`",
                    suffix, name
                )));
            }
        }

        let mut attr = Attribute {
            type_name: type_name.clone(),
            variability: if uniform {
                Variability::Uniform
            } else {
                Variability::Varying
            },
            ..Attribute::default()
        };
        attr.meta.custom = custom.then_some(true);

        let key = match suffix.as_str() {
            "connect" => {
                self.lex.skip_whitespace_and_comments();
                self.lex.expect(b'=')?;
                self.lex.skip_whitespace_and_comments();
                for p in self.parse_path_list()? {
                    attr.connections.push(p);
                }
                format!("{}.connect", name)
            }
            "timeSamples" => {
                self.lex.skip_whitespace_and_comments();
                self.lex.expect(b'=')?;
                self.lex.skip_whitespace_and_comments();
                let ts = self.parse_time_samples(&type_name)?;
                attr.value = AttrValue::TimeSamples(ts);
                name.clone()
            }
            _ => {
                self.lex.skip_inline_whitespace();
                if self.lex.accept(b'=') {
                    self.lex.skip_whitespace_and_comments();
                    if self.maybe_none()? {
                        attr.value = AttrValue::Blocked;
                    } else {
                        attr.value = AttrValue::Scalar(self.parse_typed_value(&type_name)?);
                    }
                }
                name.clone()
            }
        };

        self.lex.skip_inline_whitespace();
        if self.lex.peek() == Some(b'(') {
            attr.meta = self.parse_attr_metas(attr.meta)?;
        }

        if props.insert(key.clone(), Property::Attribute(attr)).is_some() {
            return Err(self.located(format!("property `{}` declared twice", key)));
        }
        Ok(())
    }

    fn parse_relationship_decl(
        &mut self,
        props: &mut BTreeMap<String, Property>,
        _custom: bool,
    ) -> Result<()> {
        let name = self.lex.read_namespaced_identifier()?;
        let mut rel = Relationship::default();

        self.lex.skip_inline_whitespace();
        if self.lex.accept(b'=') {
            self.lex.skip_whitespace_and_comments();
            if self.maybe_none()? {
                rel.targets = RelationshipTargets::NoTargets;
            } else {
                let mut paths = self.parse_path_list()?;
                rel.targets = match paths.len() {
                    0 => RelationshipTargets::NoTargets,
                    1 => RelationshipTargets::Single(paths.remove(0)),
                    _ => RelationshipTargets::Multiple(paths),
                };
            }
        }

        self.lex.skip_inline_whitespace();
        if self.lex.peek() == Some(b'(') {
            rel.meta = self.parse_attr_metas(rel.meta)?;
        }

        if props
            .insert(name.clone(), Property::Relationship(rel))
            .is_some()
        {
            return Err(self.located(format!("property `{}` declared twice", name)));
        }
        Ok(())
    }

    /// `None` denotes a blocked value.
    fn maybe_none(&mut self) -> Result<bool> {
        let saved = self.lex.save();
        if let Ok(word) = self.lex.read_identifier() {
            if word == "None" {
                return Ok(true);
            }
        }
        self.lex.restore(saved);
        Ok(false)
    }

    fn parse_path_list(&mut self) -> Result<Vec<Path>> {
        let mut out = Vec::new();
        if self.lex.accept(b'[') {
            loop {
                self.lex.skip_whitespace_and_comments();
                if self.lex.accept(b']') {
                    break;
                }
                out.push(Path::parse(&self.lex.read_path_identifier()?));
                self.lex.skip_whitespace_and_comments();
                self.lex.accept(b',');
            }
        } else {
            out.push(Path::parse(&self.lex.read_path_identifier()?));
        }
        Ok(out)
    }

    fn parse_time_samples(&mut self, type_name: &str) -> Result<TimeSamples> {
        self.lex.expect(b'{')?;
        let mut ts = TimeSamples::new();
        loop {
            self.lex.skip_whitespace_and_comments();
            if self.lex.accept(b'}') {
                break;
            }
            let t = self.lex.read_f64()?;
            self.lex.skip_whitespace_and_comments();
            self.lex.expect(b':')?;
            self.lex.skip_whitespace_and_comments();
            if self.maybe_none()? {
                ts.add_blocked(t);
            } else {
                ts.add_sample(t, self.parse_typed_value(type_name)?);
            }
            self.lex.skip_whitespace_and_comments();
            self.lex.accept(b',');
        }
        Ok(ts)
    }

    // ------------------------------------------------------------------
    // Metadata blocks
    // ------------------------------------------------------------------

    fn parse_attr_metas(&mut self, mut meta: AttrMeta) -> Result<AttrMeta> {
        self.lex.expect(b'(')?;
        loop {
            self.lex.skip_whitespace_and_comments();
            if self.lex.accept(b')') {
                break;
            }
            if self.lex.peek() == Some(b'"') || self.lex.peek() == Some(b'\'') {
                meta.doc = Some(self.lex.read_string_literal()?);
                continue;
            }
            let key = self.lex.read_namespaced_identifier()?;
            self.lex.skip_whitespace_and_comments();
            self.lex.expect(b'=')?;
            self.lex.skip_whitespace_and_comments();
            match key.as_str() {
                "interpolation" => {
                    let tok = self.lex.read_string_literal()?;
                    meta.interpolation =
                        Some(Interpolation::from_token(&tok).ok_or_else(|| {
                            Error::UnknownEnum {
                                attr: "interpolation".to_string(),
                                got: tok,
                                allowed: Interpolation::ALLOWED.join(", "),
                            }
                        })?);
                }
                "elementSize" => meta.element_size = Some(self.lex.read_i64()? as u32),
                "hidden" => meta.hidden = Some(self.parse_bool()?),
                "doc" => meta.doc = Some(self.lex.read_string_literal()?),
                "customData" => meta.custom_data = self.parse_dictionary()?,
                other => {
                    let value = self.parse_any_value()?;
                    meta.unregistered.insert(other.to_string(), value);
                }
            }
        }
        Ok(meta)
    }

    fn parse_prim_metas(&mut self) -> Result<PrimMeta> {
        self.lex.expect(b'(')?;
        let mut meta = PrimMeta::default();
        loop {
            self.lex.skip_whitespace_and_comments();
            if self.lex.accept(b')') {
                break;
            }
            if self.lex.peek() == Some(b'"') || self.lex.peek() == Some(b'\'') {
                meta.doc = Some(self.lex.read_string_literal()?);
                continue;
            }

            let qual = self.maybe_list_edit_qual()?;
            self.lex.skip_whitespace_and_comments();
            let key = self.lex.read_identifier()?;
            self.lex.skip_whitespace_and_comments();
            self.lex.expect(b'=')?;
            self.lex.skip_whitespace_and_comments();

            match key.as_str() {
                "kind" => {
                    let k = self.lex.read_string_literal()?;
                    meta.kind = Kind::from_token(&k);
                    if meta.kind.is_none() {
                        self.push_warning(format!("unknown kind `{}`", k));
                    }
                }
                "active" => meta.active = Some(self.parse_bool()?),
                "hidden" => meta.hidden = Some(self.parse_bool()?),
                "instanceable" => meta.instanceable = Some(self.parse_bool()?),
                "doc" => meta.doc = Some(self.lex.read_string_literal()?),
                "references" => {
                    meta.references = Some((qual, self.parse_reference_list()?));
                }
                "payload" => {
                    let refs = self.parse_reference_list()?;
                    let payloads = refs
                        .into_iter()
                        .map(|r| Payload {
                            asset_path: r.asset_path,
                            prim_path: r.prim_path,
                            layer_offset: r.layer_offset,
                        })
                        .collect();
                    meta.payload = Some((qual, payloads));
                }
                "inherits" => meta.inherits = Some((qual, self.parse_path_list()?)),
                "specializes" => meta.specializes = Some((qual, self.parse_path_list()?)),
                "variants" => {
                    let dict = self.parse_dictionary()?;
                    let mut map = std::collections::BTreeMap::new();
                    for (k, v) in dict {
                        if let Value::String(s) = v {
                            map.insert(k, s);
                        }
                    }
                    meta.variants = Some(map);
                }
                "variantSets" => {
                    let mut names = Vec::new();
                    if self.lex.peek() == Some(b'[') {
                        self.lex.expect(b'[')?;
                        loop {
                            self.lex.skip_whitespace_and_comments();
                            if self.lex.accept(b']') {
                                break;
                            }
                            names.push(self.lex.read_string_literal()?);
                            self.lex.skip_whitespace_and_comments();
                            self.lex.accept(b',');
                        }
                    } else {
                        names.push(self.lex.read_string_literal()?);
                    }
                    meta.variant_sets = Some((qual, names));
                }
                "apiSchemas" => {
                    let mut op = crate::value::ListOp::default();
                    let mut items = Vec::new();
                    self.lex.expect(b'[')?;
                    loop {
                        self.lex.skip_whitespace_and_comments();
                        if self.lex.accept(b']') {
                            break;
                        }
                        items.push(Token::new(self.lex.read_string_literal()?));
                        self.lex.skip_whitespace_and_comments();
                        self.lex.accept(b',');
                    }
                    match qual {
                        ListEditQual::Prepend => op.prepended_items = items,
                        ListEditQual::Append => op.appended_items = items,
                        ListEditQual::Add => op.added_items = items,
                        ListEditQual::Delete => op.deleted_items = items,
                        ListEditQual::Order => op.ordered_items = items,
                        ListEditQual::ResetToExplicit => {
                            op.is_explicit = true;
                            op.explicit_items = items;
                        }
                    }
                    meta.api_schemas = Some(op);
                }
                "assetInfo" => meta.asset_info = self.parse_dictionary()?,
                "customData" => meta.custom_data = self.parse_dictionary()?,
                other => {
                    let value = self.parse_any_value()?;
                    self.push_warning(format!("unknown prim metadatum `{}`", other));
                    meta.unregistered.insert(other.to_string(), value);
                }
            }
        }
        Ok(meta)
    }

    /// `@asset@`, `@asset@</prim>`, `</prim>`, or a `[...]` list thereof.
    fn parse_reference_list(&mut self) -> Result<Vec<Reference>> {
        let mut out = Vec::new();
        if self.lex.accept(b'[') {
            loop {
                self.lex.skip_whitespace_and_comments();
                if self.lex.accept(b']') {
                    break;
                }
                out.push(self.parse_reference()?);
                self.lex.skip_whitespace_and_comments();
                self.lex.accept(b',');
            }
        } else if self.maybe_none()? {
            // `references = None` clears; nothing to record.
        } else {
            out.push(self.parse_reference()?);
        }
        Ok(out)
    }

    fn parse_reference(&mut self) -> Result<Reference> {
        let mut r = Reference::default();
        if self.lex.peek() == Some(b'@') {
            r.asset_path = self.lex.read_asset_path()?;
            self.lex.skip_inline_whitespace();
        }
        if self.lex.peek() == Some(b'<') {
            r.prim_path = Path::parse(&self.lex.read_path_identifier()?);
        }
        if r.asset_path.is_empty() && r.prim_path.is_empty() {
            return Err(self.located("reference needs an asset path or a prim path"));
        }
        Ok(r)
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn parse_bool(&mut self) -> Result<bool> {
        let saved = self.lex.save();
        if let Ok(word) = self.lex.read_identifier() {
            match word.as_str() {
                "true" => return Ok(true),
                "false" => return Ok(false),
                _ => {}
            }
        }
        self.lex.restore(saved);
        match self.lex.read_i64()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.located(format!("expected boolean, got `{}`", other))),
        }
    }

    fn parse_f32(&mut self) -> Result<f32> {
        Ok(self.lex.read_f64()? as f32)
    }

    fn parse_tuple<T>(
        &mut self,
        n: usize,
        mut read: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        self.lex.expect(b'(')?;
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            self.lex.skip_whitespace_and_comments();
            out.push(read(self)?);
            self.lex.skip_whitespace_and_comments();
            if i + 1 < n {
                self.lex.expect(b',')?;
            } else {
                self.lex.accept(b',');
            }
        }
        self.lex.skip_whitespace_and_comments();
        self.lex.expect(b')')?;
        Ok(out)
    }

    /// `[elem, elem, ...]` with optional trailing comma. Tuple elements
    /// may be `None`; blocked tuple entries decay to zero with a warning
    /// since arrays are dense.
    fn parse_array<T>(
        &mut self,
        mut read: impl FnMut(&mut Self) -> Result<Option<T>>,
    ) -> Result<Vec<T>>
    where
        T: Default,
    {
        self.lex.expect(b'[')?;
        let mut out = Vec::new();
        loop {
            self.lex.skip_whitespace_and_comments();
            if self.lex.accept(b']') {
                break;
            }
            match read(self)? {
                Some(v) => out.push(v),
                None => {
                    self.push_warning("None array element replaced with a zero value");
                    out.push(T::default());
                }
            }
            self.lex.skip_whitespace_and_comments();
            self.lex.accept(b',');
        }
        Ok(out)
    }

    fn parse_matrix_rows(&mut self, dim: usize) -> Result<Vec<f64>> {
        self.lex.expect(b'(')?;
        let mut out = Vec::with_capacity(dim * dim);
        for i in 0..dim {
            self.lex.skip_whitespace_and_comments();
            let row = self.parse_tuple(dim, |p| p.lex.read_f64())?;
            out.extend(row);
            self.lex.skip_whitespace_and_comments();
            if i + 1 < dim {
                self.lex.expect(b',')?;
            } else {
                self.lex.accept(b',');
            }
        }
        self.lex.skip_whitespace_and_comments();
        self.lex.expect(b')')?;
        Ok(out)
    }

    /// Parse a value of a declared attribute type. Role names (`color3f`,
    /// `texCoord2f`, ...) parse through their underlying storage type.
    fn parse_typed_value(&mut self, declared: &str) -> Result<Value> {
        let is_array = declared.ends_with("[]");
        let base = declared.trim_end_matches("[]");
        let base = crate::value::underlying_type_name(base);

        macro_rules! scalar_or_array {
            ($scalar:ident, $array:ident, $read:expr) => {{
                if is_array {
                    let items = self.parse_array(|p| {
                        if p.maybe_none()? {
                            Ok(None)
                        } else {
                            ($read)(p).map(Some)
                        }
                    })?;
                    Ok(Value::$array(items))
                } else {
                    ($read)(self).map(Value::$scalar)
                }
            }};
        }

        match base {
            "bool" => scalar_or_array!(Bool, BoolArray, |p: &mut Self| p.parse_bool()),
            "uchar" => scalar_or_array!(UChar, UCharArray, |p: &mut Self| {
                Ok(p.lex.read_i64()? as u8)
            }),
            "int" => scalar_or_array!(Int, IntArray, |p: &mut Self| {
                Ok(p.lex.read_i64()? as i32)
            }),
            "uint" => scalar_or_array!(UInt, UIntArray, |p: &mut Self| {
                Ok(p.lex.read_i64()? as u32)
            }),
            "int64" => scalar_or_array!(Int64, Int64Array, |p: &mut Self| p.lex.read_i64()),
            "uint64" => scalar_or_array!(UInt64, UInt64Array, |p: &mut Self| {
                Ok(p.lex.read_i64()? as u64)
            }),
            "half" => scalar_or_array!(Half, HalfArray, |p: &mut Self| {
                Ok(f16::from_f32(p.parse_f32()?))
            }),
            "float" => scalar_or_array!(Float, FloatArray, |p: &mut Self| p.parse_f32()),
            "double" => scalar_or_array!(Double, DoubleArray, |p: &mut Self| p.lex.read_f64()),
            "timecode" => {
                scalar_or_array!(TimeCode, TimeCodeArray, |p: &mut Self| p.lex.read_f64())
            }
            "string" => scalar_or_array!(String, StringArray, |p: &mut Self| {
                p.lex.read_string_literal()
            }),
            "token" => scalar_or_array!(Token, TokenArray, |p: &mut Self| {
                Ok(Token::new(p.lex.read_string_literal()?))
            }),
            "asset" => scalar_or_array!(AssetPath, AssetPathArray, |p: &mut Self| {
                Ok(AssetPath::new(p.lex.read_asset_path()?))
            }),
            "int2" => scalar_or_array!(Vec2i, Vec2iArray, |p: &mut Self| {
                let v = p.parse_tuple(2, |p| Ok(p.lex.read_i64()? as i32))?;
                Ok(IVec2::from_slice(&v))
            }),
            "int3" => scalar_or_array!(Vec3i, Vec3iArray, |p: &mut Self| {
                let v = p.parse_tuple(3, |p| Ok(p.lex.read_i64()? as i32))?;
                Ok(IVec3::from_slice(&v))
            }),
            "int4" => scalar_or_array!(Vec4i, Vec4iArray, |p: &mut Self| {
                let v = p.parse_tuple(4, |p| Ok(p.lex.read_i64()? as i32))?;
                Ok(IVec4::from_slice(&v))
            }),
            "half2" => scalar_or_array!(Vec2h, Vec2hArray, |p: &mut Self| {
                let v = p.parse_tuple(2, |p| p.parse_f32())?;
                Ok(HVec2::new(f16::from_f32(v[0]), f16::from_f32(v[1])))
            }),
            "half3" => scalar_or_array!(Vec3h, Vec3hArray, |p: &mut Self| {
                let v = p.parse_tuple(3, |p| p.parse_f32())?;
                Ok(HVec3::new(
                    f16::from_f32(v[0]),
                    f16::from_f32(v[1]),
                    f16::from_f32(v[2]),
                ))
            }),
            "half4" => scalar_or_array!(Vec4h, Vec4hArray, |p: &mut Self| {
                let v = p.parse_tuple(4, |p| p.parse_f32())?;
                Ok(HVec4::new(
                    f16::from_f32(v[0]),
                    f16::from_f32(v[1]),
                    f16::from_f32(v[2]),
                    f16::from_f32(v[3]),
                ))
            }),
            "float2" => scalar_or_array!(Vec2f, Vec2fArray, |p: &mut Self| {
                let v = p.parse_tuple(2, |p| p.parse_f32())?;
                Ok(Vec2::from_slice(&v))
            }),
            "float3" => scalar_or_array!(Vec3f, Vec3fArray, |p: &mut Self| {
                let v = p.parse_tuple(3, |p| p.parse_f32())?;
                Ok(Vec3::from_slice(&v))
            }),
            "float4" => scalar_or_array!(Vec4f, Vec4fArray, |p: &mut Self| {
                let v = p.parse_tuple(4, |p| p.parse_f32())?;
                Ok(Vec4::from_slice(&v))
            }),
            "double2" => scalar_or_array!(Vec2d, Vec2dArray, |p: &mut Self| {
                let v = p.parse_tuple(2, |p| p.lex.read_f64())?;
                Ok(DVec2::from_slice(&v))
            }),
            "double3" => scalar_or_array!(Vec3d, Vec3dArray, |p: &mut Self| {
                let v = p.parse_tuple(3, |p| p.lex.read_f64())?;
                Ok(DVec3::from_slice(&v))
            }),
            "double4" => scalar_or_array!(Vec4d, Vec4dArray, |p: &mut Self| {
                let v = p.parse_tuple(4, |p| p.lex.read_f64())?;
                Ok(DVec4::from_slice(&v))
            }),
            "quath" => scalar_or_array!(Quath, QuathArray, |p: &mut Self| {
                let v = p.parse_tuple(4, |p| p.parse_f32())?;
                Ok(HQuat::from_xyzw(
                    f16::from_f32(v[0]),
                    f16::from_f32(v[1]),
                    f16::from_f32(v[2]),
                    f16::from_f32(v[3]),
                ))
            }),
            "quatf" => scalar_or_array!(Quatf, QuatfArray, |p: &mut Self| {
                let v = p.parse_tuple(4, |p| p.parse_f32())?;
                Ok(Quat::from_xyzw(v[0], v[1], v[2], v[3]))
            }),
            "quatd" => scalar_or_array!(Quatd, QuatdArray, |p: &mut Self| {
                let v = p.parse_tuple(4, |p| p.lex.read_f64())?;
                Ok(DQuat::from_xyzw(v[0], v[1], v[2], v[3]))
            }),
            "matrix2d" => scalar_or_array!(Matrix2d, Matrix2dArray, |p: &mut Self| {
                let v = p.parse_matrix_rows(2)?;
                Ok(DMat2::from_cols_slice(&v))
            }),
            "matrix3d" => scalar_or_array!(Matrix3d, Matrix3dArray, |p: &mut Self| {
                let v = p.parse_matrix_rows(3)?;
                Ok(DMat3::from_cols_slice(&v))
            }),
            "matrix4d" => scalar_or_array!(Matrix4d, Matrix4dArray, |p: &mut Self| {
                let v = p.parse_matrix_rows(4)?;
                Ok(DMat4::from_cols_slice(&v))
            }),
            other => Err(self.located(format!("unsupported attribute type `{}`", other))),
        }
    }

    /// Parse a value with no declared type, guessing from syntax. Used
    /// for unknown metadata keys and dictionary fallbacks.
    fn parse_any_value(&mut self) -> Result<Value> {
        self.lex.skip_whitespace_and_comments();
        match self.lex.peek() {
            Some(b'"') | Some(b'\'') => Ok(Value::String(self.lex.read_string_literal()?)),
            Some(b'@') => Ok(Value::AssetPath(AssetPath::new(
                self.lex.read_asset_path()?,
            ))),
            Some(b'<') => Ok(Value::String(self.lex.read_path_identifier()?)),
            Some(b'{') => Ok(Value::Dictionary(self.parse_dictionary()?)),
            Some(b'[') => {
                // Untyped array: strings or doubles.
                self.lex.expect(b'[')?;
                let mut strings = Vec::new();
                let mut doubles = Vec::new();
                loop {
                    self.lex.skip_whitespace_and_comments();
                    if self.lex.accept(b']') {
                        break;
                    }
                    match self.lex.peek() {
                        Some(b'"') | Some(b'\'') => {
                            strings.push(self.lex.read_string_literal()?)
                        }
                        _ => doubles.push(self.lex.read_f64()?),
                    }
                    self.lex.skip_whitespace_and_comments();
                    self.lex.accept(b',');
                }
                if !strings.is_empty() {
                    Ok(Value::StringVector(strings))
                } else {
                    Ok(Value::DoubleVector(doubles))
                }
            }
            Some(b) if b == b't' || b == b'f' => {
                let saved = self.lex.save();
                if let Ok(word) = self.lex.read_identifier() {
                    match word.as_str() {
                        "true" => return Ok(Value::Bool(true)),
                        "false" => return Ok(Value::Bool(false)),
                        _ => {}
                    }
                }
                self.lex.restore(saved);
                Err(self.located("cannot infer metadata value type"))
            }
            _ => Ok(Value::Double(self.lex.read_f64()?)),
        }
    }

    /// `{ type name = value ... }`. Duplicate keys keep the latest write
    /// and push a warning.
    fn parse_dictionary(&mut self) -> Result<Dictionary> {
        self.lex.expect(b'{')?;
        let mut dict = Dictionary::new();
        loop {
            self.lex.skip_whitespace_and_comments();
            if self.lex.accept(b'}') {
                break;
            }

            // `dictionary name = {...}` nests; `type name = value`
            // declares a typed entry; a quoted key falls back to an
            // untyped value.
            let (key, value) = if self.lex.peek() == Some(b'"') || self.lex.peek() == Some(b'\'')
            {
                let key = self.lex.read_string_literal()?;
                self.lex.skip_whitespace_and_comments();
                self.lex.expect(b'=')?;
                self.lex.skip_whitespace_and_comments();
                (key, self.parse_any_value()?)
            } else {
                let type_word = {
                    let base = self.lex.read_identifier()?;
                    if self.lex.accept_str("[]") {
                        format!("{}[]", base)
                    } else {
                        base
                    }
                };
                self.lex.skip_whitespace_and_comments();
                if type_word == "dictionary" {
                    let key = self.lex.read_identifier()?;
                    self.lex.skip_whitespace_and_comments();
                    self.lex.expect(b'=')?;
                    self.lex.skip_whitespace_and_comments();
                    (key, Value::Dictionary(self.parse_dictionary()?))
                } else if self.lex.peek() == Some(b'=') {
                    // No type word after all: `name = value`.
                    self.lex.expect(b'=')?;
                    self.lex.skip_whitespace_and_comments();
                    (type_word, self.parse_any_value()?)
                } else {
                    let key = self.lex.read_namespaced_identifier()?;
                    self.lex.skip_whitespace_and_comments();
                    self.lex.expect(b'=')?;
                    self.lex.skip_whitespace_and_comments();
                    (key, self.parse_typed_value(&type_word)?)
                }
            };

            if dict.insert(key.clone(), value).is_some() {
                self.push_warning(format!(
                    "duplicate dictionary key `{}`; latest wins",
                    key
                ));
            }
            self.lex.skip_whitespace_and_comments();
            self.lex.accept(b';');
        }
        Ok(dict)
    }
}
