//! Transform operation descriptors.
//!
//! `xformOpOrder` names the operations applied to a prim, in order. Each
//! entry resolves to an `xformOp:*` attribute, optionally inverted with an
//! `!invert!` prefix; the `!resetXformStack!` sentinel (first entry only)
//! discards the inherited transform.

use std::fmt;

use super::AttrValue;

/// The operation vocabulary of `xformOp:*` tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XformOpKind {
    Translate,
    Scale,
    RotateX,
    RotateY,
    RotateZ,
    RotateXYZ,
    RotateXZY,
    RotateYXZ,
    RotateYZX,
    RotateZXY,
    RotateZYX,
    Orient,
    Transform,
    ResetXformStack,
}

impl XformOpKind {
    /// The `xformOp:` token prefix for this operation (`!resetXformStack!`
    /// for the sentinel).
    pub const fn token_prefix(self) -> &'static str {
        match self {
            Self::Translate => "xformOp:translate",
            Self::Scale => "xformOp:scale",
            Self::RotateX => "xformOp:rotateX",
            Self::RotateY => "xformOp:rotateY",
            Self::RotateZ => "xformOp:rotateZ",
            Self::RotateXYZ => "xformOp:rotateXYZ",
            Self::RotateXZY => "xformOp:rotateXZY",
            Self::RotateYXZ => "xformOp:rotateYXZ",
            Self::RotateYZX => "xformOp:rotateYZX",
            Self::RotateZXY => "xformOp:rotateZXY",
            Self::RotateZYX => "xformOp:rotateZYX",
            Self::Orient => "xformOp:orient",
            Self::Transform => "xformOp:transform",
            Self::ResetXformStack => "!resetXformStack!",
        }
    }
}

impl fmt::Display for XformOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token_prefix())
    }
}

/// One resolved transform operation.
#[derive(Clone, Debug, PartialEq)]
pub struct XformOp {
    pub kind: XformOpKind,
    /// Namespace suffix after the op name, e.g. `pivot` in
    /// `xformOp:translate:pivot`. Empty for un-suffixed ops.
    pub suffix: String,
    pub inverted: bool,
    /// The attribute payload (scalar or time samples); `Empty` for
    /// `!resetXformStack!`.
    pub value: AttrValue,
}

impl XformOp {
    pub fn reset_xform_stack() -> Self {
        Self {
            kind: XformOpKind::ResetXformStack,
            suffix: String::new(),
            inverted: false,
            value: AttrValue::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_prefix() {
        assert_eq!(XformOpKind::Translate.token_prefix(), "xformOp:translate");
        assert_eq!(XformOpKind::RotateZYX.token_prefix(), "xformOp:rotateZYX");
        assert_eq!(
            XformOpKind::ResetXformStack.token_prefix(),
            "!resetXformStack!"
        );
    }

    #[test]
    fn test_reset_op() {
        let op = XformOp::reset_xform_stack();
        assert_eq!(op.kind, XformOpKind::ResetXformStack);
        assert!(!op.inverted);
        assert_eq!(op.value, AttrValue::Empty);
    }
}
