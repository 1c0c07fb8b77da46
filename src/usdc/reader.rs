//! Crate section readers and scene assembly.
//!
//! Decoding walks the TOC sections in dependency order (TOKENS, STRINGS,
//! FIELDS, FIELDSETS, PATHS, SPECS), fills the per-decode pools, then
//! materializes live field-sets and the node hierarchy.

use std::collections::BTreeMap;

use log::debug;

use super::compression;
use super::format::*;
use super::integer_coding;
use super::CrateReaderConfig;
use crate::path::Path;
use crate::stream::StreamReader;
use crate::token::Token;
use crate::util::{Error, Result};
use crate::value::Value;

/// Intermediate scene-graph node; holds no prim or property data.
#[derive(Clone, Debug)]
pub struct Node {
    /// -1 = root, -2 = invalid.
    pub parent: i64,
    pub children: Vec<usize>,
    pub path: Path,
    /// Leaf-only relative path naming this node within its parent.
    pub elem_path: Path,
}

/// A live (decoded) field: name token plus unpacked value.
pub type FieldValuePair = (Token, Value);

/// Crate (binary) reader.
pub struct CrateReader<'a> {
    pub(super) sr: StreamReader<'a>,
    pub(super) config: CrateReaderConfig,

    pub(super) version: [u8; 3],
    toc: Vec<Section>,

    pub(super) tokens: Vec<Token>,
    pub(super) string_indices: Vec<Index>,
    pub(super) fields: Vec<Field>,
    pub(super) fieldset_indices: Vec<u32>,
    pub(super) specs: Vec<Spec>,
    pub(super) paths: Vec<Path>,
    pub(super) elem_paths: Vec<Path>,
    pub(super) nodes: Vec<Node>,

    /// Unpacked field lists keyed by fieldset start index.
    live_fieldsets: BTreeMap<u32, Vec<FieldValuePair>>,

    pub(super) memory_usage: u64,
    pub(super) warnings: Vec<String>,
}

impl<'a> CrateReader<'a> {
    pub fn new(buf: &'a [u8], config: CrateReaderConfig) -> Self {
        Self {
            sr: StreamReader::new(buf),
            config,
            version: [0; 3],
            toc: Vec::new(),
            tokens: Vec::new(),
            string_indices: Vec::new(),
            fields: Vec::new(),
            fieldset_indices: Vec::new(),
            specs: Vec::new(),
            paths: Vec::new(),
            elem_paths: Vec::new(),
            nodes: Vec::new(),
            live_fieldsets: BTreeMap::new(),
            memory_usage: 0,
            warnings: Vec::new(),
        }
    }

    /// Run the full decode: bootstrap, TOC, all sections, live field-sets.
    pub fn read(&mut self) -> Result<()> {
        self.read_bootstrap()?;
        self.read_toc()?;

        // Dependency order is fixed; each reader seeks to its section.
        self.read_tokens()?;
        self.read_strings()?;
        self.read_fields()?;
        self.read_fieldsets()?;
        self.read_paths()?;
        self.read_specs()?;

        self.build_live_fieldsets()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors (valid after a successful read)
    // ------------------------------------------------------------------

    #[inline]
    pub fn num_paths(&self) -> usize {
        self.paths.len()
    }

    #[inline]
    pub fn num_specs(&self) -> usize {
        self.specs.len()
    }

    #[inline]
    pub fn version(&self) -> [u8; 3] {
        self.version
    }

    #[inline]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[inline]
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    #[inline]
    pub fn specs(&self) -> &[Spec] {
        &self.specs
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn live_fieldsets(&self) -> &BTreeMap<u32, Vec<FieldValuePair>> {
        &self.live_fieldsets
    }

    /// Approximate decoded memory usage in MiB.
    pub fn memory_usage_mb(&self) -> u64 {
        self.memory_usage / 1024 / 1024
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub(super) fn token(&self, index: Index) -> Result<&Token> {
        self.tokens.get(index.0 as usize).ok_or_else(|| {
            Error::UnresolvedReference(format!("token index {} out of range", index.0))
        })
    }

    pub(super) fn string_token(&self, index: Index) -> Result<&Token> {
        let tok_index = self.string_indices.get(index.0 as usize).ok_or_else(|| {
            Error::UnresolvedReference(format!("string index {} out of range", index.0))
        })?;
        self.token(*tok_index)
    }

    pub(super) fn path(&self, index: Index) -> Result<&Path> {
        self.paths.get(index.0 as usize).ok_or_else(|| {
            Error::UnresolvedReference(format!("path index {} out of range", index.0))
        })
    }

    // ------------------------------------------------------------------
    // Resource accounting
    // ------------------------------------------------------------------

    pub(super) fn account_memory(&mut self, bytes: u64) -> Result<()> {
        self.memory_usage += bytes;
        if self.memory_usage > self.config.max_memory_budget {
            return Err(Error::MemoryBudgetExceeded {
                used: self.memory_usage,
                budget: self.config.max_memory_budget,
            });
        }
        Ok(())
    }

    /// Read a u64 count with a cap.
    pub(super) fn read_num(&mut self, what: &'static str, max: usize) -> Result<u64> {
        let n = self.sr.read_u64()?;
        if n > max as u64 {
            return Err(Error::LimitExceeded {
                what,
                value: n,
                max: max as u64,
            });
        }
        Ok(n)
    }

    // ------------------------------------------------------------------
    // Bootstrap and TOC
    // ------------------------------------------------------------------

    fn read_bootstrap(&mut self) -> Result<()> {
        self.sr.seek(0)?;
        let magic = self.sr.read_bytes(8)?;
        if magic != CRATE_MAGIC {
            return Err(Error::MalformedHeader(
                "missing PXR-USDC magic".to_string(),
            ));
        }
        let ver = self.sr.read_bytes(3)?;
        self.version = [ver[0], ver[1], ver[2]];
        if self.version[0] == 0 && self.version[1] < 4 {
            return Err(Error::MalformedHeader(format!(
                "unsupported crate version {}.{}.{}",
                self.version[0], self.version[1], self.version[2]
            )));
        }
        // Reserved bytes.
        self.sr.read_bytes(5)?;
        let toc_offset = self.sr.read_u64()?;
        if toc_offset < BOOTSTRAP_SIZE as u64 || toc_offset >= self.sr.len() {
            return Err(Error::MalformedHeader(format!(
                "TOC offset {} out of range",
                toc_offset
            )));
        }
        self.sr.seek(toc_offset)?;
        Ok(())
    }

    fn read_toc(&mut self) -> Result<()> {
        let n_sections = self.read_num("TOC sections", self.config.max_toc_sections)?;
        for _ in 0..n_sections {
            let name_bytes = self.sr.read_bytes(SECTION_NAME_LEN)?;
            let name = SectionName::from_padded(name_bytes)?;
            let start = self.sr.read_u64()?;
            let size = self.sr.read_u64()?;
            if start.checked_add(size).map_or(true, |end| end > self.sr.len()) {
                return Err(Error::TruncatedSection {
                    section: name.as_str(),
                    offset: start,
                });
            }
            self.toc.push(Section { name, start, size });
        }
        debug!("TOC: {} sections", self.toc.len());
        Ok(())
    }

    /// Seek to a section's start; absent sections decode as empty pools.
    fn seek_section(&mut self, name: SectionName) -> Result<Option<Section>> {
        let Some(sec) = self.toc.iter().find(|s| s.name == name).copied() else {
            return Ok(None);
        };
        self.sr.seek(sec.start)?;
        Ok(Some(sec))
    }

    // ------------------------------------------------------------------
    // Compressed helpers
    // ------------------------------------------------------------------

    /// Read a `u64 compressedSize` + LZ4 frame + integer codec block of
    /// `count` 32-bit elements.
    pub(super) fn read_compressed_ints_32(&mut self, count: usize) -> Result<Vec<i32>> {
        if count > self.config.max_num_indices {
            return Err(Error::LimitExceeded {
                what: "compressed-integer indices",
                value: count as u64,
                max: self.config.max_num_indices as u64,
            });
        }
        if count == 0 {
            return Ok(Vec::new());
        }
        let compressed_size = self.sr.read_u64()? as usize;
        let frame = self.sr.read_bytes(compressed_size)?;
        let worst = integer_coding::encoded_buffer_size_32(count);
        let encoded = decompress_bounded(frame, worst)?;
        self.account_memory((count * 4) as u64)?;
        integer_coding::decode_i32s(&encoded, count)
    }

    /// As [`read_compressed_ints_32`](Self::read_compressed_ints_32), for
    /// 64-bit elements.
    pub(super) fn read_compressed_ints_64(&mut self, count: usize) -> Result<Vec<i64>> {
        if count > self.config.max_num_indices {
            return Err(Error::LimitExceeded {
                what: "compressed-integer indices",
                value: count as u64,
                max: self.config.max_num_indices as u64,
            });
        }
        if count == 0 {
            return Ok(Vec::new());
        }
        let compressed_size = self.sr.read_u64()? as usize;
        let frame = self.sr.read_bytes(compressed_size)?;
        let worst = integer_coding::encoded_buffer_size_64(count);
        let encoded = decompress_bounded(frame, worst)?;
        self.account_memory((count * 8) as u64)?;
        integer_coding::decode_i64s(&encoded, count)
    }

    fn read_compressed_indices(&mut self, count: usize) -> Result<Vec<Index>> {
        let raw = self.read_compressed_ints_32(count)?;
        Ok(raw.into_iter().map(|v| Index(v as u32)).collect())
    }

    /// Pull a `u64 compressedSize` + frame out of the stream without
    /// decoding, so several blocks can inflate off-thread.
    fn take_compressed_block(&mut self, count: usize) -> Result<Vec<u8>> {
        if count > self.config.max_num_indices {
            return Err(Error::LimitExceeded {
                what: "compressed-integer indices",
                value: count as u64,
                max: self.config.max_num_indices as u64,
            });
        }
        let compressed_size = self.sr.read_u64()? as usize;
        Ok(self.sr.read_bytes(compressed_size)?.to_vec())
    }

    /// Inflate and decode three independent 32-bit blocks, in parallel
    /// when the config allows. Results come back in argument order, so the
    /// output is identical to the serial path.
    fn decode_three_blocks(
        &mut self,
        count: usize,
        a: Vec<u8>,
        b: Vec<u8>,
        c: Vec<u8>,
    ) -> Result<(Vec<i32>, Vec<i32>, Vec<i32>)> {
        let decode = |frame: &[u8]| -> Result<Vec<i32>> {
            if count == 0 {
                return Ok(Vec::new());
            }
            let worst = integer_coding::encoded_buffer_size_32(count);
            let encoded = decompress_bounded(frame, worst)?;
            integer_coding::decode_i32s(&encoded, count)
        };

        self.account_memory((count * 4 * 3) as u64)?;
        if self.config.num_threads == 0 {
            Ok((decode(&a)?, decode(&b)?, decode(&c)?))
        } else {
            let (ra, (rb, rc)) =
                rayon::join(|| decode(&a), || rayon::join(|| decode(&b), || decode(&c)));
            Ok((ra?, rb?, rc?))
        }
    }

    // ------------------------------------------------------------------
    // Section readers
    // ------------------------------------------------------------------

    fn read_tokens(&mut self) -> Result<()> {
        let Some(sec) = self.seek_section(SectionName::Tokens)? else {
            return Ok(());
        };
        let count = self.read_num("tokens", self.config.max_num_tokens)? as usize;
        let uncompressed_size = self.sr.read_u64()? as usize;
        let compressed_size = self.sr.read_u64()? as usize;

        if (compressed_size as u64) > sec.size {
            return Err(Error::TruncatedSection {
                section: SectionName::Tokens.as_str(),
                offset: sec.start,
            });
        }
        self.account_memory(uncompressed_size as u64)?;

        let frame = self.sr.read_bytes(compressed_size)?;
        let chars = compression::decompress(frame, uncompressed_size)?;
        if chars.last() != Some(&0) && count > 0 {
            return Err(Error::invalid("token data must be NUL terminated"));
        }

        let mut tokens = Vec::with_capacity(count);
        for raw in chars.split(|&b| b == 0) {
            if tokens.len() == count {
                break;
            }
            if raw.len() > self.config.max_token_length {
                return Err(Error::LimitExceeded {
                    what: "token length",
                    value: raw.len() as u64,
                    max: self.config.max_token_length as u64,
                });
            }
            let s = std::str::from_utf8(raw)
                .map_err(|_| Error::invalid("token data is not valid UTF-8"))?;
            tokens.push(Token::new(s));
        }
        if tokens.len() != count {
            return Err(Error::invalid(format!(
                "TOKENS declared {} entries but data holds {}",
                count,
                tokens.len()
            )));
        }
        debug!("read {} tokens", tokens.len());
        self.tokens = tokens;
        Ok(())
    }

    fn read_strings(&mut self) -> Result<()> {
        if self.seek_section(SectionName::Strings)?.is_none() {
            return Ok(());
        }
        let count = self.read_num("strings", self.config.max_num_strings)? as usize;
        let indices = self.read_compressed_indices(count)?;
        for idx in &indices {
            // Validate now so later lookups cannot go out of range.
            self.token(*idx)?;
        }
        self.string_indices = indices;
        Ok(())
    }

    fn read_fields(&mut self) -> Result<()> {
        if self.seek_section(SectionName::Fields)?.is_none() {
            return Ok(());
        }
        let count = self.read_num("fields", self.config.max_num_fields)? as usize;
        let token_indices = self.read_compressed_indices(count)?;
        // Value reps are coded as 64-bit blobs through the same codec.
        let reps = self.read_compressed_ints_64(count)?;

        let mut fields = Vec::with_capacity(count);
        for (tok, rep) in token_indices.into_iter().zip(reps) {
            self.token(tok)?;
            fields.push(Field {
                token_index: tok,
                value_rep: ValueRep(rep as u64),
            });
        }
        debug!("read {} fields", fields.len());
        self.fields = fields;
        Ok(())
    }

    fn read_fieldsets(&mut self) -> Result<()> {
        if self.seek_section(SectionName::FieldSets)?.is_none() {
            return Ok(());
        }
        let count = self.read_num("fieldsets", self.config.max_num_fieldsets)? as usize;
        let raw = self.read_compressed_ints_32(count)?;
        let indices: Vec<u32> = raw.into_iter().map(|v| v as u32).collect();
        for &idx in &indices {
            if idx != FIELDSET_TERMINATOR && idx as usize >= self.fields.len() {
                return Err(Error::UnresolvedReference(format!(
                    "fieldset entry {} out of field range",
                    idx
                )));
            }
        }
        self.fieldset_indices = indices;
        Ok(())
    }

    fn read_paths(&mut self) -> Result<()> {
        if self.seek_section(SectionName::Paths)?.is_none() {
            return Ok(());
        }
        // Total number of paths, then the number of encoded path entries.
        let n_paths = self.read_num("paths", self.config.max_num_paths)? as usize;
        let n_encoded = self.read_num("encoded paths", self.config.max_num_paths)? as usize;

        let (path_indexes, element_token_indexes, jumps) = if n_encoded == 0 {
            (Vec::new(), Vec::new(), Vec::new())
        } else {
            let a = self.take_compressed_block(n_encoded)?;
            let b = self.take_compressed_block(n_encoded)?;
            let c = self.take_compressed_block(n_encoded)?;
            self.decode_three_blocks(n_encoded, a, b, c)?
        };

        self.account_memory((n_paths * std::mem::size_of::<Path>()) as u64)?;
        self.build_decompressed_paths(n_paths, &path_indexes, &element_token_indexes, &jumps)?;
        Ok(())
    }

    /// Reconstruct paths from the jump-encoded arrays.
    ///
    /// `jump > 0`: child at `i+1`, sibling at `i+jump`. `jump == 0`:
    /// sibling only at `i+1`. `jump == -1`: child only at `i+1`.
    /// `jump == -2`: leaf. Uses an explicit work stack; encoded trees may
    /// nest thousands of levels deep.
    fn build_decompressed_paths(
        &mut self,
        n_paths: usize,
        path_indexes: &[i32],
        element_token_indexes: &[i32],
        jumps: &[i32],
    ) -> Result<()> {
        let n = path_indexes.len();
        if element_token_indexes.len() != n || jumps.len() != n {
            return Err(Error::invalid("path arrays disagree in length"));
        }
        let mut paths = vec![Path::empty(); n_paths];
        let mut elem_paths = vec![Path::empty(); n_paths];
        if n == 0 {
            self.paths = paths;
            self.elem_paths = elem_paths;
            self.build_node_hierarchy(&[], &[], &[])?;
            return Ok(());
        }

        // (entry index, parent path) work items.
        let mut stack: Vec<(usize, Path)> = vec![(0, Path::empty())];

        while let Some((mut cur, mut parent_path)) = stack.pop() {
            loop {
                if cur >= n {
                    return Err(Error::invalid("path jump out of range"));
                }
                let this_index = cur;
                let path_index = path_indexes[this_index];
                if path_index < 0 || path_index as usize >= n_paths {
                    return Err(Error::UnresolvedReference(format!(
                        "path index {} out of range",
                        path_index
                    )));
                }
                let path_index = path_index as usize;

                if parent_path.is_empty() {
                    parent_path = Path::root();
                    paths[path_index] = parent_path.clone();
                    elem_paths[path_index] = Path::root();
                } else {
                    let tok_index = element_token_indexes[this_index];
                    let is_prop = tok_index < 0;
                    let tok_index = Index(tok_index.unsigned_abs());
                    let elem_token = self.token(tok_index)?.clone();
                    let new_path = if is_prop {
                        parent_path.property(&elem_token)
                    } else {
                        parent_path.child(&elem_token)
                    };
                    paths[path_index] = new_path;
                    elem_paths[path_index] = Path::element(elem_token.as_str());
                }

                let jump = jumps[this_index];
                let has_child = jump > 0 || jump == -1;
                let has_sibling = jump >= 0;

                if has_child {
                    if has_sibling {
                        let sibling = this_index
                            .checked_add(jump as usize)
                            .ok_or_else(|| Error::invalid("path sibling jump overflow"))?;
                        stack.push((sibling, parent_path.clone()));
                    }
                    // Descend: this node's path becomes the parent.
                    parent_path = paths[path_indexes[this_index] as usize].clone();
                    cur = this_index + 1;
                } else if has_sibling {
                    cur = this_index + 1;
                } else {
                    break;
                }
            }
        }

        self.paths = paths;
        self.elem_paths = elem_paths;
        self.build_node_hierarchy(path_indexes, element_token_indexes, jumps)?;
        Ok(())
    }

    /// Build parent/children links mirroring the path reconstruction.
    fn build_node_hierarchy(
        &mut self,
        path_indexes: &[i32],
        element_token_indexes: &[i32],
        jumps: &[i32],
    ) -> Result<()> {
        let n = path_indexes.len();
        self.nodes = self
            .paths
            .iter()
            .zip(&self.elem_paths)
            .map(|(p, e)| Node {
                parent: -2,
                children: Vec::new(),
                path: p.clone(),
                elem_path: e.clone(),
            })
            .collect();
        if n == 0 {
            return Ok(());
        }

        // (entry index, parent node index).
        let mut stack: Vec<(usize, i64)> = vec![(0, -1)];
        while let Some((mut cur, mut parent_node)) = stack.pop() {
            loop {
                let this_index = cur;
                let path_index = path_indexes[this_index] as usize;

                if parent_node < 0 {
                    self.nodes[path_index].parent = -1;
                } else {
                    let is_prop = element_token_indexes[this_index] < 0;
                    self.nodes[path_index].parent = parent_node;
                    if !is_prop {
                        self.nodes[parent_node as usize].children.push(path_index);
                    }
                }

                let jump = jumps[this_index];
                let has_child = jump > 0 || jump == -1;
                let has_sibling = jump >= 0;
                if has_child {
                    if has_sibling {
                        stack.push((this_index + jump as usize, parent_node));
                    }
                    parent_node = path_index as i64;
                    cur = this_index + 1;
                } else if has_sibling {
                    cur = this_index + 1;
                } else {
                    break;
                }
            }
        }
        Ok(())
    }

    fn read_specs(&mut self) -> Result<()> {
        if self.seek_section(SectionName::Specs)?.is_none() {
            return Ok(());
        }
        let count = self.read_num("specs", self.config.max_num_specs)? as usize;

        // Three transposed arrays, each coded independently.
        let (path_indexes, fieldset_indexes, spec_types) = if count == 0 {
            (Vec::new(), Vec::new(), Vec::new())
        } else {
            let a = self.take_compressed_block(count)?;
            let b = self.take_compressed_block(count)?;
            let c = self.take_compressed_block(count)?;
            self.decode_three_blocks(count, a, b, c)?
        };

        let mut specs = Vec::with_capacity(count);
        for i in 0..count {
            let path_index = Index(path_indexes[i] as u32);
            self.path(path_index)?;
            let fieldset_index = Index(fieldset_indexes[i] as u32);
            if fieldset_index.0 as usize >= self.fieldset_indices.len() {
                return Err(Error::UnresolvedReference(format!(
                    "spec fieldset index {} out of range",
                    fieldset_index.0
                )));
            }
            let spec_type = SpecType::from_ordinal(spec_types[i] as u32).ok_or_else(|| {
                Error::invalid(format!("unknown spec type ordinal {}", spec_types[i]))
            })?;
            specs.push(Spec {
                path_index,
                fieldset_index,
                spec_type,
            });
        }
        debug!("read {} specs", specs.len());
        self.specs = specs;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Live field-sets
    // ------------------------------------------------------------------

    /// Chase each spec's field set and decode every value rep, caching by
    /// fieldset start index.
    fn build_live_fieldsets(&mut self) -> Result<()> {
        let starts: Vec<u32> = {
            let mut s: Vec<u32> = self.specs.iter().map(|sp| sp.fieldset_index.0).collect();
            s.sort_unstable();
            s.dedup();
            s
        };

        for start in starts {
            if self.live_fieldsets.contains_key(&start) {
                continue;
            }
            let mut pairs = Vec::new();
            let mut i = start as usize;
            while i < self.fieldset_indices.len() {
                let field_index = self.fieldset_indices[i];
                if field_index == FIELDSET_TERMINATOR {
                    break;
                }
                let field = self.fields[field_index as usize];
                let name = self.token(field.token_index)?.clone();
                let value = self.unpack_value(field.value_rep)?;
                pairs.push((name, value));
                i += 1;
            }
            self.live_fieldsets.insert(start, pairs);
        }
        debug!("materialized {} live field-sets", self.live_fieldsets.len());
        Ok(())
    }
}

/// Decompress an LZ4 frame whose exact inflated size is unknown but
/// bounded (compressed-integer blocks).
fn decompress_bounded(frame: &[u8], worst_case: usize) -> Result<Vec<u8>> {
    if frame.is_empty() {
        return Err(Error::invalid("empty compressed block"));
    }
    // Frames carry a chunk count byte followed by chunk data; sizes are
    // validated chunk by chunk.
    compression::decompress_unsized(frame, worst_case)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usdc::test_fixture::CrateBuilder;

    #[test]
    fn test_empty_crate() {
        // Valid header, empty TOC: decode succeeds with nothing in it.
        let buf = CrateBuilder::new().build_empty_toc();
        let mut reader = CrateReader::new(&buf, CrateReaderConfig::default());
        reader.read().unwrap();
        assert_eq!(reader.num_paths(), 0);
        assert_eq!(reader.num_specs(), 0);

        let (meta, prims) = reader.reconstruct_scene().unwrap();
        assert!(prims.is_empty());
        assert_eq!(meta, crate::prim::StageMeta::default());
    }

    #[test]
    fn test_jump_encoded_sibling_branch() {
        // "/" -> { "A" -> { "c" }, "B" }: entry for "A" carries both a
        // child (next entry) and a sibling (two entries ahead).
        let mut b = CrateBuilder::new();
        let tok_a = b.token("A") as i32;
        let tok_c = b.token("c") as i32;
        let tok_b = b.token("B") as i32;
        b.set_paths(
            4,
            vec![0, 1, 2, 3],
            vec![0, tok_a, tok_c, tok_b],
            vec![-1, 2, -2, -2],
        );
        let buf = b.build();

        let mut reader = CrateReader::new(&buf, CrateReaderConfig::default());
        reader.read().unwrap();
        let decoded: Vec<String> = reader.paths().iter().map(|p| p.full_path()).collect();
        assert_eq!(decoded, vec!["/", "/A", "/A/c", "/B"]);

        // Hierarchy mirrors the paths.
        assert_eq!(reader.nodes()[0].children, vec![1, 3]);
        assert_eq!(reader.nodes()[1].children, vec![2]);
        assert_eq!(reader.nodes()[1].parent, 0);
        assert_eq!(reader.nodes()[3].parent, 0);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut buf = CrateBuilder::new().build_empty_toc();
        buf[0] = b'X';
        let mut reader = CrateReader::new(&buf, CrateReaderConfig::default());
        assert!(matches!(
            reader.read_bootstrap_and_toc_for_test(),
            Err(Error::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_toc_section_cap() {
        let buf = CrateBuilder::new().build_empty_toc();
        let config = CrateReaderConfig {
            max_toc_sections: 0,
            ..Default::default()
        };
        let mut reader = CrateReader::new(&buf, config);
        // Zero sections still fits a cap of zero.
        reader.read_bootstrap_and_toc_for_test().unwrap();
    }
}

#[cfg(test)]
impl<'a> CrateReader<'a> {
    pub(crate) fn read_bootstrap_and_toc_for_test(&mut self) -> Result<()> {
        self.read_bootstrap()?;
        self.read_toc()
    }
}
