//! # usd
//!
//! Rust reader for the USD scene description format.
//!
//! Original USD format and C++ library developed by Pixar Animation
//! Studios. All rights to the original belong to the authors. This is an
//! independent Rust implementation of the two interchangeable container
//! encodings — the binary Crate (`.usdc`) and the ASCII form (`.usda`) —
//! reconstructing a strongly-typed prim tree for downstream consumers.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (math layouts, errors)
//! - [`stream`] - Bounded little-endian cursor over a byte buffer
//! - [`token`] / [`path`] - Interned names and hierarchical paths
//! - [`value`] - The tagged value model (scalars, arrays, composites)
//! - [`usdc`] - Crate binary container decoding
//! - [`usda`] - ASCII container parsing
//! - [`prim`] - Generic and typed prim records
//! - [`reconstruct`] - Schema-driven typed-prim reconstruction
//!
//! ## Example
//!
//! ```ignore
//! let bytes = std::fs::read("scene.usdc")?;
//! let stage = usd::load_from_memory(&bytes, &usd::LoadConfig::default())?;
//!
//! for node in &stage.root_prims {
//!     println!("{} ({})", node.path, node.prim.type_name());
//! }
//! ```

pub mod path;
pub mod prim;
pub mod reconstruct;
pub mod stream;
pub mod token;
pub mod usda;
pub mod usdc;
pub mod util;
pub mod value;

// Re-export commonly used types
pub use path::Path;
pub use token::Token;
pub use usdc::CrateReaderConfig;
pub use util::{Error, Result};
pub use value::Value;

use prim::{StageMeta, TypedPrimNode};

/// Decode knobs shared by both containers.
#[derive(Clone, Debug, Default)]
pub struct LoadConfig {
    /// Limits applied by the Crate decoder.
    pub crate_config: CrateReaderConfig,
    /// Base directory hint for an external asset resolver.
    pub base_dir: Option<String>,
}

/// A fully decoded and reconstructed scene.
#[derive(Clone, Debug)]
pub struct Stage {
    pub meta: StageMeta,
    pub root_prims: Vec<TypedPrimNode>,
    /// Non-fatal diagnostics gathered across decode and reconstruction.
    pub warnings: Vec<String>,
}

impl Stage {
    /// Total number of prims, all depths included.
    pub fn num_prims(&self) -> usize {
        fn count(nodes: &[TypedPrimNode]) -> usize {
            nodes.len() + nodes.iter().map(|n| count(&n.children)).sum::<usize>()
        }
        count(&self.root_prims)
    }

    /// Find a node by absolute prim path.
    pub fn prim_at_path(&self, path: &Path) -> Option<&TypedPrimNode> {
        fn find<'a>(nodes: &'a [TypedPrimNode], path: &Path) -> Option<&'a TypedPrimNode> {
            for node in nodes {
                if &node.path == path {
                    return Some(node);
                }
                if let Some(found) = find(&node.children, path) {
                    return Some(found);
                }
            }
            None
        }
        find(&self.root_prims, path)
    }
}

/// True when the buffer starts with the Crate magic.
pub fn is_usdc(buf: &[u8]) -> bool {
    buf.starts_with(usdc::format::CRATE_MAGIC)
}

/// True when the buffer starts with an ASCII `#usda` header.
pub fn is_usda(buf: &[u8]) -> bool {
    usda::is_usda(buf)
}

/// Decode a Crate (binary) buffer into a typed stage.
pub fn load_usdc_from_memory(buf: &[u8], config: &LoadConfig) -> Result<Stage> {
    let (meta, prims, mut warnings) = usdc::parse_usdc(buf, &config.crate_config)?;
    let root_prims = reconstruct::reconstruct_stage(&prims, &mut warnings)?;
    Ok(Stage {
        meta,
        root_prims,
        warnings,
    })
}

/// Parse an ASCII buffer into a typed stage.
pub fn load_usda_from_memory(buf: &[u8], _config: &LoadConfig) -> Result<Stage> {
    let (meta, prims, mut warnings) = usda::parse_usda(buf)?;
    let root_prims = reconstruct::reconstruct_stage(&prims, &mut warnings)?;
    Ok(Stage {
        meta,
        root_prims,
        warnings,
    })
}

/// Detect the container encoding and decode accordingly.
pub fn load_from_memory(buf: &[u8], config: &LoadConfig) -> Result<Stage> {
    if is_usdc(buf) {
        load_usdc_from_memory(buf, config)
    } else if is_usda(buf) {
        load_usda_from_memory(buf, config)
    } else {
        Err(Error::MalformedHeader(
            "input is neither Crate (PXR-USDC) nor ASCII (#usda)".to_string(),
        ))
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::path::Path;
    pub use crate::prim::{Prim, TypedPrim, TypedPrimNode};
    pub use crate::token::Token;
    pub use crate::util::{Error, Result};
    pub use crate::value::{Animatable, TimeSamples, Value};
    pub use crate::{load_from_memory, LoadConfig, Stage};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert!(is_usdc(b"PXR-USDC\x00\x08\x00"));
        assert!(!is_usdc(b"#usda 1.0\n"));
        assert!(is_usda(b"#usda 1.0\n"));
        assert!(!is_usda(b"PXR-USDC"));
    }

    #[test]
    fn test_load_rejects_unknown_container() {
        let err = load_from_memory(b"garbage", &LoadConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }
}
