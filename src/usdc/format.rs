//! Crate container constants and low-level structures.

use crate::util::{Error, Result};

/// Magic bytes at the start of a Crate file.
pub const CRATE_MAGIC: &[u8; 8] = b"PXR-USDC";

/// Size of the bootstrap header: magic + version triple + reserved + TOC
/// offset.
pub const BOOTSTRAP_SIZE: usize = 24;

/// Offset of the version triple in the header.
pub const VERSION_OFFSET: usize = 8;

/// Offset of the TOC offset field (LE u64).
pub const TOC_OFFSET_POS: usize = 16;

/// Section names are zero-padded ASCII of this length.
pub const SECTION_NAME_LEN: usize = 16;

/// The six known sections, in required read order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionName {
    Tokens,
    Strings,
    Fields,
    FieldSets,
    Paths,
    Specs,
}

impl SectionName {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tokens => "TOKENS",
            Self::Strings => "STRINGS",
            Self::Fields => "FIELDS",
            Self::FieldSets => "FIELDSETS",
            Self::Paths => "PATHS",
            Self::Specs => "SPECS",
        }
    }

    /// Parse a zero-padded 16-byte section name.
    pub fn from_padded(bytes: &[u8]) -> Result<Self> {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let name = std::str::from_utf8(&bytes[..end])
            .map_err(|_| Error::UnknownSection("<non-ascii>".to_string()))?;
        match name {
            "TOKENS" => Ok(Self::Tokens),
            "STRINGS" => Ok(Self::Strings),
            "FIELDS" => Ok(Self::Fields),
            "FIELDSETS" => Ok(Self::FieldSets),
            "PATHS" => Ok(Self::Paths),
            "SPECS" => Ok(Self::Specs),
            other => Err(Error::UnknownSection(other.to_string())),
        }
    }
}

/// One TOC record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Section {
    pub name: SectionName,
    pub start: u64,
    pub size: u64,
}

/// Index into one of the per-decode pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Index(pub u32);

/// Sentinel terminating each field set in the FIELDSETS section.
pub const FIELDSET_TERMINATOR: u32 = u32::MAX;

/// Spec types, validated against the known ordinal set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SpecType {
    Attribute = 1,
    Connection = 2,
    Expression = 3,
    Mapper = 4,
    MapperArg = 5,
    Prim = 6,
    PseudoRoot = 7,
    Relationship = 8,
    RelationshipTarget = 9,
    Variant = 10,
    VariantSet = 11,
}

impl SpecType {
    pub fn from_ordinal(v: u32) -> Option<Self> {
        match v {
            1 => Some(Self::Attribute),
            2 => Some(Self::Connection),
            3 => Some(Self::Expression),
            4 => Some(Self::Mapper),
            5 => Some(Self::MapperArg),
            6 => Some(Self::Prim),
            7 => Some(Self::PseudoRoot),
            8 => Some(Self::Relationship),
            9 => Some(Self::RelationshipTarget),
            10 => Some(Self::Variant),
            11 => Some(Self::VariantSet),
            _ => None,
        }
    }
}

/// One record of the SPECS section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Spec {
    pub path_index: Index,
    pub fieldset_index: Index,
    pub spec_type: SpecType,
}

/// One record of the FIELDS section: a name token plus a value rep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub token_index: Index,
    pub value_rep: ValueRep,
}

// Bit layout of the 8-byte value representation word:
//   bits  0..54  payload (55 bits)
//   bit  55      compressed
//   bit  56      inlined
//   bit  57      array
//   bits 58..63  type id (6 bits)
const PAYLOAD_MASK: u64 = (1u64 << 55) - 1;
const COMPRESSED_BIT: u64 = 1u64 << 55;
const INLINED_BIT: u64 = 1u64 << 56;
const ARRAY_BIT: u64 = 1u64 << 57;
const TYPE_SHIFT: u32 = 58;

/// The packed 8-byte value representation.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ValueRep(pub u64);

impl ValueRep {
    /// Assemble a rep from its parts. Used by tests and fixture builders.
    pub const fn new(type_id: u8, array: bool, inlined: bool, compressed: bool, payload: u64) -> Self {
        let mut v = (payload & PAYLOAD_MASK) | ((type_id as u64 & 0x3f) << TYPE_SHIFT);
        if array {
            v |= ARRAY_BIT;
        }
        if inlined {
            v |= INLINED_BIT;
        }
        if compressed {
            v |= COMPRESSED_BIT;
        }
        Self(v)
    }

    #[inline]
    pub const fn type_id(self) -> i32 {
        ((self.0 >> TYPE_SHIFT) & 0x3f) as i32
    }

    #[inline]
    pub const fn is_array(self) -> bool {
        self.0 & ARRAY_BIT != 0
    }

    #[inline]
    pub const fn is_inlined(self) -> bool {
        self.0 & INLINED_BIT != 0
    }

    #[inline]
    pub const fn is_compressed(self) -> bool {
        self.0 & COMPRESSED_BIT != 0
    }

    #[inline]
    pub const fn payload(self) -> u64 {
        self.0 & PAYLOAD_MASK
    }
}

impl std::fmt::Debug for ValueRep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ValueRep(ty={}, array={}, inlined={}, compressed={}, payload={:#x})",
            self.type_id(),
            self.is_array(),
            self.is_inlined(),
            self.is_compressed(),
            self.payload()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic() {
        assert_eq!(CRATE_MAGIC, b"PXR-USDC");
        assert_eq!(CRATE_MAGIC.len(), 8);
    }

    #[test]
    fn test_section_names() {
        let mut padded = [0u8; SECTION_NAME_LEN];
        padded[..6].copy_from_slice(b"TOKENS");
        assert_eq!(SectionName::from_padded(&padded).unwrap(), SectionName::Tokens);

        let mut bad = [0u8; SECTION_NAME_LEN];
        bad[..5].copy_from_slice(b"BOGUS");
        assert!(SectionName::from_padded(&bad).is_err());
    }

    #[test]
    fn test_value_rep_packing() {
        let rep = ValueRep::new(24, true, false, true, 0x1234);
        assert_eq!(rep.type_id(), 24);
        assert!(rep.is_array());
        assert!(!rep.is_inlined());
        assert!(rep.is_compressed());
        assert_eq!(rep.payload(), 0x1234);
    }

    #[test]
    fn test_value_rep_payload_width() {
        // Payload must not leak into the flag bits.
        let rep = ValueRep::new(1, false, true, false, u64::MAX);
        assert_eq!(rep.payload(), (1u64 << 55) - 1);
        assert_eq!(rep.type_id(), 1);
        assert!(rep.is_inlined());
        assert!(!rep.is_array());
        assert!(!rep.is_compressed());
    }

    #[test]
    fn test_spec_type_ordinals() {
        assert_eq!(SpecType::from_ordinal(6), Some(SpecType::Prim));
        assert_eq!(SpecType::from_ordinal(7), Some(SpecType::PseudoRoot));
        assert_eq!(SpecType::from_ordinal(0), None);
        assert_eq!(SpecType::from_ordinal(12), None);
    }
}
