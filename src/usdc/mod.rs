//! Crate (binary `.usdc`) container decoding.
//!
//! The container is a TOC of sections over shared pools: interned tokens,
//! deduplicated field sets, jump-compressed path hierarchies, and packed
//! value representations. [`CrateReader`] decodes a byte buffer into those
//! pools and assembles the generic prim tree.

pub mod compression;
pub mod format;
pub mod integer_coding;
mod reader;
mod scene;
mod unpack;

pub use format::{Section, SectionName, Spec, SpecType, ValueRep};
pub use reader::{CrateReader, FieldValuePair, Node};

use crate::prim::{Prim, StageMeta};
use crate::util::Result;

/// Decode limits and scheduling knobs.
///
/// The caps bound work on adversarial input; every section reader checks
/// its counts against them and decoded payload bytes are charged against
/// `max_memory_budget`.
#[derive(Clone, Debug)]
pub struct CrateReaderConfig {
    /// Worker threads for section decompression: `-1` = detect hardware,
    /// `0` = serial.
    pub num_threads: i32,

    pub max_toc_sections: usize,
    pub max_num_tokens: usize,
    pub max_num_strings: usize,
    pub max_num_fields: usize,
    pub max_num_fieldsets: usize,
    pub max_num_specs: usize,
    pub max_num_paths: usize,
    pub max_num_indices: usize,
    pub max_dict_elements: usize,
    pub max_array_elements: usize,
    pub max_asset_path_elements: usize,
    /// Maximum allowed length of a `token` string, in bytes.
    pub max_token_length: usize,
    pub max_string_length: usize,
    /// Total budget for uncompressed data, in bytes.
    pub max_memory_budget: u64,
}

impl Default for CrateReaderConfig {
    fn default() -> Self {
        Self {
            num_threads: -1,
            max_toc_sections: 32,
            max_num_tokens: 1024 * 1024,
            max_num_strings: 1024 * 1024,
            max_num_fields: 1024 * 1024,
            max_num_fieldsets: 1024 * 1024,
            max_num_specs: 1024 * 1024,
            max_num_paths: 1024 * 1024,
            max_num_indices: 1024 * 1024 * 16,
            max_dict_elements: 256,
            max_array_elements: 1024 * 1024 * 1024,
            max_asset_path_elements: 512,
            max_token_length: 4096,
            max_string_length: 1024 * 1024 * 64,
            max_memory_budget: i32::MAX as u64, // 2 GiB
        }
    }
}

/// Decode a Crate buffer into stage metadata and a generic prim tree.
pub fn parse_usdc(
    buf: &[u8],
    config: &CrateReaderConfig,
) -> Result<(StageMeta, Vec<Prim>, Vec<String>)> {
    let mut reader = CrateReader::new(buf, config.clone());
    reader.read()?;
    let (meta, prims) = reader.reconstruct_scene()?;
    let warnings = reader.warnings().to_vec();
    Ok((meta, prims, warnings))
}

#[cfg(test)]
pub(crate) mod test_fixture;
