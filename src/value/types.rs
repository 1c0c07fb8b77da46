//! Scalar support types carried by [`Value`](super::Value) variants.

use std::fmt;

use crate::path::Path;
use crate::token::Token;

/// Reference to an external asset, e.g. `@./textures/wood.png@`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AssetPath {
    pub asset_path: String,
    /// Filled by an external resolver; empty after decoding.
    pub resolved_path: String,
}

impl AssetPath {
    pub fn new(asset_path: impl Into<String>) -> Self {
        Self {
            asset_path: asset_path.into(),
            resolved_path: String::new(),
        }
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}@", self.asset_path)
    }
}

/// Time remapping applied by a composition arc.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerOffset {
    pub offset: f64,
    pub scale: f64,
}

impl Default for LayerOffset {
    fn default() -> Self {
        Self {
            offset: 0.0,
            scale: 1.0,
        }
    }
}

/// A `references` composition arc. Arc evaluation itself is out of scope;
/// the decoder only preserves the authored fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reference {
    pub asset_path: String,
    pub prim_path: Path,
    pub layer_offset: LayerOffset,
}

/// A `payload` composition arc.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
    pub asset_path: String,
    pub prim_path: Path,
    pub layer_offset: LayerOffset,
}

/// Prim specifier: whether a prim defines, overrides, or abstracts a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Specifier {
    #[default]
    Def,
    Over,
    Class,
}

impl Specifier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Def => "def",
            Self::Over => "over",
            Self::Class => "class",
        }
    }

    pub fn from_ordinal(v: u64) -> Option<Self> {
        match v {
            0 => Some(Self::Def),
            1 => Some(Self::Over),
            2 => Some(Self::Class),
            _ => None,
        }
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Property permission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Permission {
    #[default]
    Public,
    Private,
}

impl Permission {
    pub fn from_ordinal(v: u64) -> Option<Self> {
        match v {
            0 => Some(Self::Public),
            1 => Some(Self::Private),
            _ => None,
        }
    }
}

/// Attribute variability: invariant across time, or possibly time-sampled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Variability {
    Uniform,
    #[default]
    Varying,
}

impl Variability {
    pub fn from_ordinal(v: u64) -> Option<Self> {
        match v {
            0 => Some(Self::Uniform),
            1 => Some(Self::Varying),
            _ => None,
        }
    }
}

/// List-editing qualifier prefixing relational or composition-arc fields
/// in ASCII (`add`, `append`, `prepend`, `delete`, `reorder`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ListEditQual {
    /// No qualifier: the authored list is explicit.
    #[default]
    ResetToExplicit,
    Add,
    Append,
    Prepend,
    Delete,
    Order,
}

impl ListEditQual {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Self::Add),
            "append" => Some(Self::Append),
            "prepend" => Some(Self::Prepend),
            "delete" => Some(Self::Delete),
            "reorder" => Some(Self::Order),
            _ => None,
        }
    }
}

/// Variant-set name to selected-variant mapping.
pub type VariantSelectionMap = std::collections::BTreeMap<String, String>;

/// `{selected-set: token}` entries appear as tokens in ASCII; keep the key
/// type interned for parity with prim names.
pub type TokenMap = std::collections::BTreeMap<Token, Token>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specifier_roundtrip() {
        for (ord, spec) in [
            (0, Specifier::Def),
            (1, Specifier::Over),
            (2, Specifier::Class),
        ] {
            assert_eq!(Specifier::from_ordinal(ord), Some(spec));
        }
        assert_eq!(Specifier::from_ordinal(3), None);
    }

    #[test]
    fn test_list_edit_qual() {
        assert_eq!(ListEditQual::from_keyword("prepend"), Some(ListEditQual::Prepend));
        assert_eq!(ListEditQual::from_keyword("reorder"), Some(ListEditQual::Order));
        assert_eq!(ListEditQual::from_keyword("explicit"), None);
    }

    #[test]
    fn test_layer_offset_default() {
        let lo = LayerOffset::default();
        assert_eq!(lo.offset, 0.0);
        assert_eq!(lo.scale, 1.0);
    }
}
