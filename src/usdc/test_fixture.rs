//! Hand encoder for Crate byte fixtures.
//!
//! Only tests use this; the library itself never writes. The builder lays
//! the file out as bootstrap header, payload blob (external values),
//! sections, TOC, and patches the TOC offset last.

use super::compression;
use super::format::*;
use super::integer_coding;

pub struct CrateBuilder {
    tokens: Vec<String>,
    string_indices: Vec<u32>,
    fields: Vec<(u32, ValueRep)>,
    fieldsets: Vec<i32>,
    path_indexes: Vec<i32>,
    elem_token_indexes: Vec<i32>,
    jumps: Vec<i32>,
    n_paths: usize,
    specs: Vec<(u32, u32, u32)>,
    payload: Vec<u8>,
}

impl CrateBuilder {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            string_indices: Vec::new(),
            fields: Vec::new(),
            fieldsets: Vec::new(),
            path_indexes: Vec::new(),
            elem_token_indexes: Vec::new(),
            jumps: Vec::new(),
            n_paths: 0,
            specs: Vec::new(),
            payload: Vec::new(),
        }
    }

    /// Intern a token, returning its index.
    pub fn token(&mut self, s: &str) -> u32 {
        if let Some(i) = self.tokens.iter().position(|t| t == s) {
            return i as u32;
        }
        self.tokens.push(s.to_string());
        (self.tokens.len() - 1) as u32
    }

    /// Register a string (a token index in the STRINGS pool).
    pub fn string(&mut self, s: &str) -> u32 {
        let tok = self.token(s);
        self.string_indices.push(tok);
        (self.string_indices.len() - 1) as u32
    }

    /// Append payload bytes, returning their absolute offset.
    pub fn add_payload(&mut self, bytes: &[u8]) -> u64 {
        let offset = (BOOTSTRAP_SIZE + self.payload.len()) as u64;
        self.payload.extend_from_slice(bytes);
        offset
    }

    pub fn add_field(&mut self, name: &str, rep: ValueRep) -> u32 {
        let tok = self.token(name);
        self.fields.push((tok, rep));
        (self.fields.len() - 1) as u32
    }

    /// Append a terminated field set, returning its start index.
    pub fn add_fieldset(&mut self, field_indices: &[u32]) -> u32 {
        let start = self.fieldsets.len() as u32;
        for &f in field_indices {
            self.fieldsets.push(f as i32);
        }
        self.fieldsets.push(FIELDSET_TERMINATOR as i32);
        start
    }

    pub fn set_paths(
        &mut self,
        n_paths: usize,
        path_indexes: Vec<i32>,
        elem_token_indexes: Vec<i32>,
        jumps: Vec<i32>,
    ) {
        self.n_paths = n_paths;
        self.path_indexes = path_indexes;
        self.elem_token_indexes = elem_token_indexes;
        self.jumps = jumps;
    }

    pub fn add_spec(&mut self, path_index: u32, fieldset_start: u32, spec_type: SpecType) {
        self.specs
            .push((path_index, fieldset_start, spec_type as u32));
    }

    fn compressed_ints_block_32(values: &[i32]) -> Vec<u8> {
        let encoded = integer_coding::encode_i32s(values);
        let frame = compression::compress(&encoded);
        let mut out = (frame.len() as u64).to_le_bytes().to_vec();
        out.extend_from_slice(&frame);
        out
    }

    fn compressed_ints_block_64(values: &[i64]) -> Vec<u8> {
        let encoded = integer_coding::encode_i64s(values);
        let frame = compression::compress(&encoded);
        let mut out = (frame.len() as u64).to_le_bytes().to_vec();
        out.extend_from_slice(&frame);
        out
    }

    fn tokens_section(&self) -> Vec<u8> {
        let mut blob = Vec::new();
        for t in &self.tokens {
            blob.extend_from_slice(t.as_bytes());
            blob.push(0);
        }
        let frame = compression::compress(&blob);
        let mut out = Vec::new();
        out.extend_from_slice(&(self.tokens.len() as u64).to_le_bytes());
        out.extend_from_slice(&(blob.len() as u64).to_le_bytes());
        out.extend_from_slice(&(frame.len() as u64).to_le_bytes());
        out.extend_from_slice(&frame);
        out
    }

    fn strings_section(&self) -> Vec<u8> {
        let mut out = (self.string_indices.len() as u64).to_le_bytes().to_vec();
        if !self.string_indices.is_empty() {
            let as_i32: Vec<i32> = self.string_indices.iter().map(|&v| v as i32).collect();
            out.extend_from_slice(&Self::compressed_ints_block_32(&as_i32));
        }
        out
    }

    fn fields_section(&self) -> Vec<u8> {
        let mut out = (self.fields.len() as u64).to_le_bytes().to_vec();
        if !self.fields.is_empty() {
            let toks: Vec<i32> = self.fields.iter().map(|&(t, _)| t as i32).collect();
            let reps: Vec<i64> = self.fields.iter().map(|&(_, r)| r.0 as i64).collect();
            out.extend_from_slice(&Self::compressed_ints_block_32(&toks));
            out.extend_from_slice(&Self::compressed_ints_block_64(&reps));
        }
        out
    }

    fn fieldsets_section(&self) -> Vec<u8> {
        let mut out = (self.fieldsets.len() as u64).to_le_bytes().to_vec();
        if !self.fieldsets.is_empty() {
            out.extend_from_slice(&Self::compressed_ints_block_32(&self.fieldsets));
        }
        out
    }

    fn paths_section(&self) -> Vec<u8> {
        let mut out = (self.n_paths as u64).to_le_bytes().to_vec();
        out.extend_from_slice(&(self.path_indexes.len() as u64).to_le_bytes());
        if !self.path_indexes.is_empty() {
            out.extend_from_slice(&Self::compressed_ints_block_32(&self.path_indexes));
            out.extend_from_slice(&Self::compressed_ints_block_32(&self.elem_token_indexes));
            out.extend_from_slice(&Self::compressed_ints_block_32(&self.jumps));
        }
        out
    }

    fn specs_section(&self) -> Vec<u8> {
        let mut out = (self.specs.len() as u64).to_le_bytes().to_vec();
        if !self.specs.is_empty() {
            let a: Vec<i32> = self.specs.iter().map(|&(p, _, _)| p as i32).collect();
            let b: Vec<i32> = self.specs.iter().map(|&(_, f, _)| f as i32).collect();
            let c: Vec<i32> = self.specs.iter().map(|&(_, _, t)| t as i32).collect();
            out.extend_from_slice(&Self::compressed_ints_block_32(&a));
            out.extend_from_slice(&Self::compressed_ints_block_32(&b));
            out.extend_from_slice(&Self::compressed_ints_block_32(&c));
        }
        out
    }

    fn bootstrap(toc_offset: u64) -> Vec<u8> {
        let mut out = Vec::with_capacity(BOOTSTRAP_SIZE);
        out.extend_from_slice(CRATE_MAGIC);
        out.extend_from_slice(&[0, 8, 0]); // version 0.8.0
        out.extend_from_slice(&[0; 5]);
        out.extend_from_slice(&toc_offset.to_le_bytes());
        out
    }

    /// A valid header with an empty TOC directly after it.
    pub fn build_empty_toc(&self) -> Vec<u8> {
        let mut out = Self::bootstrap(BOOTSTRAP_SIZE as u64);
        out.extend_from_slice(&0u64.to_le_bytes());
        out
    }

    /// Assemble the full file.
    pub fn build(&self) -> Vec<u8> {
        let sections: Vec<(SectionName, Vec<u8>)> = vec![
            (SectionName::Tokens, self.tokens_section()),
            (SectionName::Strings, self.strings_section()),
            (SectionName::Fields, self.fields_section()),
            (SectionName::FieldSets, self.fieldsets_section()),
            (SectionName::Paths, self.paths_section()),
            (SectionName::Specs, self.specs_section()),
        ];

        let mut out = Self::bootstrap(0);
        out.extend_from_slice(&self.payload);

        let mut toc_entries = Vec::new();
        for (name, bytes) in &sections {
            toc_entries.push((*name, out.len() as u64, bytes.len() as u64));
            out.extend_from_slice(bytes);
        }

        let toc_offset = out.len() as u64;
        out.extend_from_slice(&(toc_entries.len() as u64).to_le_bytes());
        for (name, start, size) in toc_entries {
            let mut padded = [0u8; SECTION_NAME_LEN];
            padded[..name.as_str().len()].copy_from_slice(name.as_str().as_bytes());
            out.extend_from_slice(&padded);
            out.extend_from_slice(&start.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
        }

        out[TOC_OFFSET_POS..TOC_OFFSET_POS + 8].copy_from_slice(&toc_offset.to_le_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prim::{AttrValue, Property};
    use crate::usdc::{parse_usdc, CrateReader, CrateReaderConfig};
    use crate::value::{Specifier, Value};

    /// Fixture: `/Root` (a Sphere) with a `radius` double attribute and a
    /// `/Root/Child` Xform beneath it.
    fn sphere_fixture() -> Vec<u8> {
        let mut b = CrateBuilder::new();

        // Paths: 0 = "/", 1 = "/Root", 2 = "/Root.radius", 3 = "/Root/Child".
        let tok_root = b.token("Root");
        let tok_radius = b.token("radius");
        let tok_child = b.token("Child");
        b.set_paths(
            4,
            vec![0, 1, 2, 3],
            vec![
                0,
                tok_root as i32,
                -(tok_radius as i32),
                tok_child as i32,
            ],
            // "/" has one child; "/Root" has a property and a child
            // subtree; ".radius" has a sibling; "/Root/Child" is a leaf.
            vec![-1, -1, 0, -2],
        );

        // Root prim fields.
        let spec_def = ValueRep::new(
            crate::value::TypeId::Specifier as u8,
            false,
            true,
            false,
            Specifier::Def as u64,
        );
        let tok_sphere_ty = b.token("Sphere");
        let rep_typename = ValueRep::new(
            crate::value::TypeId::Token as u8,
            false,
            true,
            false,
            tok_sphere_ty as u64,
        );
        let f_spec = b.add_field("specifier", spec_def);
        let f_type = b.add_field("typeName", rep_typename);
        let fs_prim = b.add_fieldset(&[f_spec, f_type]);

        // Child Xform fields.
        let tok_xform_ty = b.token("Xform");
        let rep_xform = ValueRep::new(
            crate::value::TypeId::Token as u8,
            false,
            true,
            false,
            tok_xform_ty as u64,
        );
        let f_spec2 = b.add_field("specifier", spec_def);
        let f_type2 = b.add_field("typeName", rep_xform);
        let fs_child = b.add_fieldset(&[f_spec2, f_type2]);

        // radius attribute: typeName=double, default inlined 1.5.
        let tok_double = b.token("double");
        let rep_attr_ty = ValueRep::new(
            crate::value::TypeId::Token as u8,
            false,
            true,
            false,
            tok_double as u64,
        );
        let rep_default = ValueRep::new(
            crate::value::TypeId::Double as u8,
            false,
            true,
            false,
            (1.5f32).to_bits() as u64,
        );
        let f_attr_ty = b.add_field("typeName", rep_attr_ty);
        let f_default = b.add_field("default", rep_default);
        let fs_attr = b.add_fieldset(&[f_attr_ty, f_default]);

        // Pseudo-root has no fields.
        let fs_root = b.add_fieldset(&[]);

        b.add_spec(0, fs_root, SpecType::PseudoRoot);
        b.add_spec(1, fs_prim, SpecType::Prim);
        b.add_spec(2, fs_attr, SpecType::Attribute);
        b.add_spec(3, fs_child, SpecType::Prim);

        b.build()
    }

    #[test]
    fn test_full_decode() {
        let buf = sphere_fixture();
        let (_meta, prims, warnings) =
            parse_usdc(&buf, &CrateReaderConfig::default()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(prims.len(), 1);

        let root = &prims[0];
        assert_eq!(root.name, "Root");
        assert_eq!(root.prim_type, "Sphere");
        assert_eq!(root.spec, Specifier::Def);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "Child");
        assert_eq!(root.children[0].prim_type, "Xform");

        let Property::Attribute(radius) = &root.props["radius"] else {
            panic!("radius must be an attribute");
        };
        assert_eq!(radius.type_name, "double");
        assert_eq!(radius.value, AttrValue::Scalar(Value::Double(1.5)));
    }

    #[test]
    fn test_decoded_paths_match_tree_walk() {
        let buf = sphere_fixture();
        let mut reader = CrateReader::new(&buf, CrateReaderConfig::default());
        reader.read().unwrap();

        let decoded: Vec<String> = reader
            .paths()
            .iter()
            .map(|p| p.full_path())
            .collect();
        assert_eq!(
            decoded,
            vec!["/", "/Root", "/Root.radius", "/Root/Child"]
        );

        // Pre-order walk over the reconstructed tree yields the same prim
        // path set.
        let (_, prims) = reader.reconstruct_scene().unwrap();
        let mut walked = vec!["/".to_string()];
        fn walk(prefix: &str, prim: &crate::prim::Prim, out: &mut Vec<String>) {
            let path = format!("{}/{}", if prefix == "/" { "" } else { prefix }, prim.name);
            for prop in prim.props.keys() {
                out.push(format!("{}.{}", path, prop));
            }
            out.push(path.clone());
            for child in &prim.children {
                walk(&path, child, out);
            }
        }
        for prim in &prims {
            walk("/", prim, &mut walked);
        }
        let mut walked_sorted = walked.clone();
        walked_sorted.sort();
        let mut decoded_sorted = decoded.clone();
        decoded_sorted.sort();
        assert_eq!(walked_sorted, decoded_sorted);
    }

    #[test]
    fn test_external_int_array_value() {
        let mut b = CrateBuilder::new();
        let tok_root = b.token("Root");
        let tok_ind = b.token("indices");
        b.set_paths(
            3,
            vec![0, 1, 2],
            vec![0, tok_root as i32, -(tok_ind as i32)],
            vec![-1, -1, -2],
        );

        // Raw (uncompressed) int array payload: count + elements.
        let values: Vec<i32> = vec![3, 1, 4, 1, 5, 9, 2, 6];
        let mut payload = (values.len() as u64).to_le_bytes().to_vec();
        for v in &values {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        let offset = b.add_payload(&payload);

        let spec_def = ValueRep::new(
            crate::value::TypeId::Specifier as u8,
            false,
            true,
            false,
            Specifier::Def as u64,
        );
        let f_spec = b.add_field("specifier", spec_def);
        let fs_prim = b.add_fieldset(&[f_spec]);

        let tok_int_ty = b.token("int[]");
        let rep_attr_ty = ValueRep::new(
            crate::value::TypeId::Token as u8,
            false,
            true,
            false,
            tok_int_ty as u64,
        );
        let rep_array = ValueRep::new(
            crate::value::TypeId::Int as u8,
            true,
            false,
            false,
            offset,
        );
        let f_ty = b.add_field("typeName", rep_attr_ty);
        let f_def = b.add_field("default", rep_array);
        let fs_attr = b.add_fieldset(&[f_ty, f_def]);
        let fs_root = b.add_fieldset(&[]);

        b.add_spec(0, fs_root, SpecType::PseudoRoot);
        b.add_spec(1, fs_prim, SpecType::Prim);
        b.add_spec(2, fs_attr, SpecType::Attribute);

        let buf = b.build();
        let (_, prims, _) = parse_usdc(&buf, &CrateReaderConfig::default()).unwrap();
        let Property::Attribute(attr) = &prims[0].props["indices"] else {
            panic!("expected attribute");
        };
        assert_eq!(attr.value, AttrValue::Scalar(Value::IntArray(values)));
    }

    #[test]
    fn test_token_limit_enforced() {
        let buf = sphere_fixture();
        let config = CrateReaderConfig {
            max_num_tokens: 2,
            ..Default::default()
        };
        assert!(parse_usdc(&buf, &config).is_err());
    }

    #[test]
    fn test_memory_budget_enforced() {
        let buf = sphere_fixture();
        let config = CrateReaderConfig {
            max_memory_budget: 4,
            ..Default::default()
        };
        assert!(matches!(
            parse_usdc(&buf, &config),
            Err(crate::util::Error::MemoryBudgetExceeded { .. })
        ));
    }

    #[test]
    fn test_truncated_input_rejected() {
        let buf = sphere_fixture();
        for cut in [8, 20, buf.len() / 2] {
            assert!(parse_usdc(&buf[..cut], &CrateReaderConfig::default()).is_err());
        }
    }
}
