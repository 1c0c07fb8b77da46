//! Generic prim-tree assembly from decoded specs and live field-sets.

use std::collections::BTreeMap;

use log::warn;

use super::format::SpecType;
use super::reader::{CrateReader, FieldValuePair};
use crate::prim::{
    AttrValue, Attribute, Axis, Interpolation, Kind, Prim, Property, Relationship,
    RelationshipTargets, StageMeta,
};
use crate::util::{Error, Result};
use crate::value::{ListEditQual, ListOp, Value, Variability};

/// Derive the authored list-edit qualifier and items from a list op.
fn listop_items<T: Clone>(op: &ListOp<T>) -> (ListEditQual, Vec<T>) {
    if op.is_explicit || !op.explicit_items.is_empty() {
        (ListEditQual::ResetToExplicit, op.explicit_items.clone())
    } else if !op.prepended_items.is_empty() {
        (ListEditQual::Prepend, op.prepended_items.clone())
    } else if !op.appended_items.is_empty() {
        (ListEditQual::Append, op.appended_items.clone())
    } else if !op.added_items.is_empty() {
        (ListEditQual::Add, op.added_items.clone())
    } else if !op.deleted_items.is_empty() {
        (ListEditQual::Delete, op.deleted_items.clone())
    } else {
        (ListEditQual::Order, op.ordered_items.clone())
    }
}

impl<'a> CrateReader<'a> {
    fn fields_for_fieldset(&self, fieldset_index: u32) -> &[FieldValuePair] {
        self.live_fieldsets()
            .get(&fieldset_index)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Assemble the generic prim tree and stage metadata.
    ///
    /// Call after [`read`](Self::read) has succeeded.
    pub fn reconstruct_scene(&mut self) -> Result<(StageMeta, Vec<Prim>)> {
        // Specs by path index; property specs grouped under their prim.
        let mut prim_spec_by_path: BTreeMap<u32, u32> = BTreeMap::new();
        let mut prop_specs_by_prim: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for (i, spec) in self.specs().iter().enumerate() {
            let path = self.path(spec.path_index)?.clone();
            match spec.spec_type {
                SpecType::Prim | SpecType::PseudoRoot => {
                    prim_spec_by_path.insert(spec.path_index.0, spec.fieldset_index.0);
                }
                SpecType::Attribute | SpecType::Connection | SpecType::Relationship => {
                    if path.is_property_path() {
                        prop_specs_by_prim
                            .entry(path.prim_part().to_string())
                            .or_default()
                            .push(i);
                    }
                }
                // Variant machinery is composition-level; preserved only
                // as warnings here.
                other => {
                    warn!("ignoring spec of type {:?} at {}", other, path);
                }
            }
        }

        // Root node: absolute "/" with parent -1.
        let root_index = self
            .nodes()
            .iter()
            .position(|n| n.parent == -1 && n.path.is_root());

        let mut stage_meta = StageMeta::default();
        let mut roots = Vec::new();

        if let Some(root_index) = root_index {
            if let Some(&fieldset) = prim_spec_by_path.get(&(root_index as u32)) {
                let fields: Vec<FieldValuePair> =
                    self.fields_for_fieldset(fieldset).to_vec();
                stage_meta = self.build_stage_meta(&fields);
            }
            let children = self.nodes()[root_index].children.clone();
            for child in children {
                if let Some(prim) =
                    self.build_prim_subtree(child, &prim_spec_by_path, &prop_specs_by_prim)?
                {
                    roots.push(prim);
                }
            }
        }

        Ok((stage_meta, roots))
    }

    /// Build the prim rooted at `node_index`, iteratively (post-order with
    /// an explicit stack; encoded hierarchies may be deep).
    fn build_prim_subtree(
        &mut self,
        node_index: usize,
        prim_specs: &BTreeMap<u32, u32>,
        prop_specs: &BTreeMap<String, Vec<usize>>,
    ) -> Result<Option<Prim>> {
        // Post-order: first pass collects visit order, second pass builds
        // children before parents.
        let mut order = Vec::new();
        let mut stack = vec![node_index];
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(self.nodes()[i].children.iter().copied());
        }

        let mut built: BTreeMap<usize, Prim> = BTreeMap::new();
        for &i in order.iter().rev() {
            let node_children = self.nodes()[i].children.clone();
            let Some(mut prim) = self.build_single_prim(i, prim_specs, prop_specs)? else {
                continue;
            };
            for child_index in node_children {
                if let Some(child) = built.remove(&child_index) {
                    prim.children.push(child);
                }
            }
            built.insert(i, prim);
        }
        Ok(built.remove(&node_index))
    }

    fn build_single_prim(
        &mut self,
        node_index: usize,
        prim_specs: &BTreeMap<u32, u32>,
        prop_specs: &BTreeMap<String, Vec<usize>>,
    ) -> Result<Option<Prim>> {
        let node = &self.nodes()[node_index];
        let path = node.path.clone();
        let name = path.name().to_string();

        let Some(&fieldset) = prim_specs.get(&(node_index as u32)) else {
            warn!("no prim spec for path {}", path);
            return Ok(None);
        };
        let fields: Vec<FieldValuePair> = self.fields_for_fieldset(fieldset).to_vec();

        let mut prim = Prim::default();
        prim.name = name;

        for (fname, value) in &fields {
            match (fname.as_str(), value) {
                ("specifier", Value::Specifier(s)) => prim.spec = *s,
                ("typeName", Value::Token(t)) => prim.prim_type = t.as_str().to_string(),
                ("active", Value::Bool(b)) => prim.meta.active = Some(*b),
                ("hidden", Value::Bool(b)) => prim.meta.hidden = Some(*b),
                ("instanceable", Value::Bool(b)) => prim.meta.instanceable = Some(*b),
                ("kind", Value::Token(t)) => prim.meta.kind = Kind::from_token(t.as_str()),
                ("documentation", Value::String(s)) => prim.meta.doc = Some(s.clone()),
                ("customData", Value::Dictionary(d)) => prim.meta.custom_data = d.clone(),
                ("assetInfo", Value::Dictionary(d)) => prim.meta.asset_info = d.clone(),
                ("apiSchemas", Value::TokenListOp(op)) => {
                    prim.meta.api_schemas = Some(op.clone())
                }
                ("references", Value::ReferenceListOp(op)) => {
                    let (qual, items) = listop_items(op);
                    prim.meta.references = Some((qual, items));
                }
                ("payload", Value::PayloadListOp(op)) => {
                    let (qual, items) = listop_items(op);
                    prim.meta.payload = Some((qual, items));
                }
                ("payload", Value::Payload(p)) => {
                    prim.meta.payload =
                        Some((ListEditQual::ResetToExplicit, vec![p.clone()]));
                }
                ("inheritPaths", Value::PathListOp(op)) => {
                    let (qual, items) = listop_items(op);
                    prim.meta.inherits = Some((qual, items));
                }
                ("specializes", Value::PathListOp(op)) => {
                    let (qual, items) = listop_items(op);
                    prim.meta.specializes = Some((qual, items));
                }
                ("variantSelection", Value::VariantSelectionMap(m)) => {
                    prim.meta.variants = Some(m.clone())
                }
                ("variantSetNames", Value::StringListOp(op)) => {
                    let (qual, items) = listop_items(op);
                    prim.meta.variant_sets = Some((qual, items));
                }
                // Child/property ordering is implied by node order here.
                ("primChildren", _) | ("properties", _) => {}
                (other, v) => {
                    prim.meta
                        .unregistered
                        .insert(other.to_string(), v.clone());
                }
            }
        }

        // Attach properties authored under this prim's path.
        if let Some(spec_indices) = prop_specs.get(path.prim_part()) {
            for &spec_index in spec_indices {
                let spec = self.specs()[spec_index];
                let prop_path = self.path(spec.path_index)?.clone();
                let prop_name = prop_path.prop_part().to_string();
                let fields: Vec<FieldValuePair> =
                    self.fields_for_fieldset(spec.fieldset_index.0).to_vec();
                let property = match spec.spec_type {
                    SpecType::Relationship => self.build_relationship(&fields),
                    _ => self.build_attribute(&fields)?,
                };
                if prim.props.insert(prop_name.clone(), property).is_some() {
                    return Err(Error::invalid(format!(
                        "property `{}` authored twice on {}",
                        prop_name, path
                    )));
                }
            }
        }

        Ok(Some(prim))
    }

    fn build_attribute(&mut self, fields: &[FieldValuePair]) -> Result<Property> {
        let mut attr = Attribute::default();
        for (fname, value) in fields {
            match (fname.as_str(), value) {
                ("typeName", Value::Token(t)) => attr.type_name = t.as_str().to_string(),
                ("variability", Value::Variability(v)) => attr.variability = *v,
                ("default", Value::ValueBlock) => attr.value = AttrValue::Blocked,
                ("default", v) => attr.value = AttrValue::Scalar(v.clone()),
                ("timeSamples", Value::TimeSamples(ts)) => {
                    attr.value = AttrValue::TimeSamples(ts.clone())
                }
                ("connectionPaths", Value::PathListOp(op)) => {
                    let (_, items) = listop_items(op);
                    attr.connections = items.into_iter().collect();
                }
                ("connectionPaths", Value::PathVector(paths)) => {
                    attr.connections = paths.iter().cloned().collect();
                }
                ("interpolation", Value::Token(t)) => {
                    attr.meta.interpolation = Interpolation::from_token(t.as_str());
                }
                ("elementSize", Value::Int(n)) => attr.meta.element_size = Some(*n as u32),
                ("custom", Value::Bool(b)) => attr.meta.custom = Some(*b),
                ("hidden", Value::Bool(b)) => attr.meta.hidden = Some(*b),
                ("documentation", Value::String(s)) => attr.meta.doc = Some(s.clone()),
                ("customData", Value::Dictionary(d)) => attr.meta.custom_data = d.clone(),
                (other, v) => {
                    attr.meta.unregistered.insert(other.to_string(), v.clone());
                }
            }
        }
        Ok(Property::Attribute(attr))
    }

    fn build_relationship(&mut self, fields: &[FieldValuePair]) -> Property {
        let mut rel = Relationship::default();
        for (fname, value) in fields {
            match (fname.as_str(), value) {
                ("targetPaths", Value::PathListOp(op)) => {
                    let (qual, items) = listop_items(op);
                    rel.list_edit = qual;
                    rel.targets = match items.len() {
                        0 => RelationshipTargets::NoTargets,
                        1 => RelationshipTargets::Single(items.into_iter().next().unwrap()),
                        _ => RelationshipTargets::Multiple(items),
                    };
                }
                ("targetPaths", Value::PathVector(paths)) => {
                    rel.targets = match paths.len() {
                        0 => RelationshipTargets::NoTargets,
                        1 => RelationshipTargets::Single(paths[0].clone()),
                        _ => RelationshipTargets::Multiple(paths.clone()),
                    };
                }
                ("variability", Value::Variability(_)) => {}
                (other, v) => {
                    rel.meta.unregistered.insert(other.to_string(), v.clone());
                }
            }
        }
        Property::Relationship(rel)
    }

    fn build_stage_meta(&mut self, fields: &[FieldValuePair]) -> StageMeta {
        let mut meta = StageMeta::default();
        for (fname, value) in fields {
            match (fname.as_str(), value) {
                ("defaultPrim", Value::Token(t)) => meta.default_prim = Some(t.clone()),
                ("upAxis", Value::Token(t)) => meta.up_axis = Axis::from_token(t.as_str()),
                ("metersPerUnit", Value::Double(d)) => meta.meters_per_unit = Some(*d),
                ("timeCodesPerSecond", Value::Double(d)) => {
                    meta.time_codes_per_second = Some(*d)
                }
                ("startTimeCode", Value::Double(d)) => meta.start_time_code = Some(*d),
                ("endTimeCode", Value::Double(d)) => meta.end_time_code = Some(*d),
                ("framesPerSecond", Value::Double(d)) => meta.frames_per_second = Some(*d),
                ("documentation", Value::String(s)) => meta.doc = Some(s.clone()),
                ("customLayerData", Value::Dictionary(d)) => {
                    meta.custom_layer_data = d.clone()
                }
                ("subLayers", Value::AssetPathArray(v)) => meta.sub_layers = v.clone(),
                ("primChildren", _) => {}
                (other, v) => {
                    meta.unregistered.insert(other.to_string(), v.clone());
                }
            }
        }
        meta
    }
}

