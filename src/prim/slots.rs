//! Typed attribute slots used by the schema records.
//!
//! Four slot shapes exist: varying ([`TypedAttribute`]), uniform
//! ([`UniformAttribute`]), and terminal ([`TerminalAttribute`], shader
//! outputs that may only be declared). Fallback defaults ride inside the
//! varying/uniform slots rather than as separate types.

use smallvec::SmallVec;

use super::AttrMeta;
use crate::path::Path;
use crate::value::Animatable;

/// A varying slot: value, time samples, blocked state, or a connection.
/// A slot never holds a connection and a value at the same time.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedAttribute<T> {
    value: Option<Animatable<T>>,
    connections: SmallVec<[Path; 1]>,
    fallback: Option<T>,
    /// Declared in the source (even if empty-valued).
    authored: bool,
    pub meta: AttrMeta,
}

impl<T> Default for TypedAttribute<T> {
    fn default() -> Self {
        Self {
            value: None,
            connections: SmallVec::new(),
            fallback: None,
            authored: false,
            meta: AttrMeta::default(),
        }
    }
}

impl<T: Clone> TypedAttribute<T> {
    /// A slot with a schema fallback value.
    pub fn with_fallback(fallback: T) -> Self {
        Self {
            fallback: Some(fallback),
            ..Self::default()
        }
    }

    pub fn set_value(&mut self, v: impl Into<Animatable<T>>) {
        debug_assert!(self.connections.is_empty());
        self.value = Some(v.into());
        self.authored = true;
    }

    /// Mark as declared with no value (`float3[] points` with no `=`).
    pub fn set_value_empty(&mut self) {
        self.authored = true;
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        if blocked {
            self.value = Some(Animatable::Blocked);
        }
        self.authored = true;
    }

    pub fn set_connection(&mut self, target: Path) {
        debug_assert!(self.value.is_none());
        self.connections.clear();
        self.connections.push(target);
        self.authored = true;
    }

    pub fn set_connections(&mut self, targets: impl IntoIterator<Item = Path>) {
        debug_assert!(self.value.is_none());
        self.connections = targets.into_iter().collect();
        self.authored = true;
    }

    #[inline]
    pub fn authored(&self) -> bool {
        self.authored
    }

    #[inline]
    pub fn is_connection(&self) -> bool {
        !self.connections.is_empty()
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        matches!(self.value, Some(Animatable::Blocked))
    }

    #[inline]
    pub fn is_timesamples(&self) -> bool {
        matches!(self.value, Some(Animatable::TimeSamples(_)))
    }

    pub fn connections(&self) -> &[Path] {
        &self.connections
    }

    pub fn value(&self) -> Option<&Animatable<T>> {
        self.value.as_ref()
    }

    /// The scalar value if one was authored, else the schema fallback.
    pub fn get_or_fallback(&self) -> Option<T> {
        match &self.value {
            Some(Animatable::Value(v)) => Some(v.clone()),
            Some(_) => self.fallback.clone(),
            None => self.fallback.clone(),
        }
    }

    /// Typed time samples, when authored in that form.
    pub fn timesamples(&self) -> Option<&crate::value::TypedTimeSamples<T>> {
        match &self.value {
            Some(Animatable::TimeSamples(ts)) => Some(ts),
            _ => None,
        }
    }
}

/// A uniform slot: a single value (never time samples) or a connection.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformAttribute<T> {
    value: Option<T>,
    connections: SmallVec<[Path; 1]>,
    fallback: Option<T>,
    blocked: bool,
    authored: bool,
    pub meta: AttrMeta,
}

impl<T> Default for UniformAttribute<T> {
    fn default() -> Self {
        Self {
            value: None,
            connections: SmallVec::new(),
            fallback: None,
            blocked: false,
            authored: false,
            meta: AttrMeta::default(),
        }
    }
}

impl<T: Clone> UniformAttribute<T> {
    pub fn with_fallback(fallback: T) -> Self {
        Self {
            fallback: Some(fallback),
            ..Self::default()
        }
    }

    pub fn set_value(&mut self, v: T) {
        debug_assert!(self.connections.is_empty());
        self.value = Some(v);
        self.authored = true;
    }

    pub fn set_value_empty(&mut self) {
        self.authored = true;
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
        self.authored = true;
    }

    pub fn set_connection(&mut self, target: Path) {
        debug_assert!(self.value.is_none());
        self.connections.clear();
        self.connections.push(target);
        self.authored = true;
    }

    pub fn set_connections(&mut self, targets: impl IntoIterator<Item = Path>) {
        debug_assert!(self.value.is_none());
        self.connections = targets.into_iter().collect();
        self.authored = true;
    }

    #[inline]
    pub fn authored(&self) -> bool {
        self.authored
    }

    #[inline]
    pub fn is_connection(&self) -> bool {
        !self.connections.is_empty()
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn connections(&self) -> &[Path] {
        &self.connections
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn get_or_fallback(&self) -> Option<T> {
        self.value.clone().or_else(|| self.fallback.clone())
    }
}

/// A shader output slot: declaration only; connections are rejected by the
/// reconstructor and values never authored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TerminalAttribute {
    authored: bool,
    /// Authored type name, kept for diagnostics.
    pub type_name: String,
    pub meta: AttrMeta,
}

impl TerminalAttribute {
    pub fn set_authored(&mut self, type_name: impl Into<String>) {
        self.authored = true;
        self.type_name = type_name.into();
    }

    #[inline]
    pub fn authored(&self) -> bool {
        self.authored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Animatable;

    #[test]
    fn test_typed_attribute_fallback() {
        let mut a: TypedAttribute<f64> = TypedAttribute::with_fallback(2.0);
        assert_eq!(a.get_or_fallback(), Some(2.0));
        assert!(!a.authored());

        a.set_value(3.5);
        assert_eq!(a.get_or_fallback(), Some(3.5));
        assert!(a.authored());
    }

    #[test]
    fn test_blocked_slot() {
        let mut a: TypedAttribute<f64> = TypedAttribute::with_fallback(1.0);
        a.set_blocked(true);
        assert!(a.is_blocked());
        // Blocked means no authored value; fallback still reports.
        assert_eq!(a.get_or_fallback(), Some(1.0));
    }

    #[test]
    fn test_connection_slot() {
        let mut a: TypedAttribute<f32> = TypedAttribute::default();
        a.set_connection(crate::path::Path::parse("/Mat/Tex.outputs:r"));
        assert!(a.is_connection());
        assert!(a.value().is_none());
        assert_eq!(a.connections().len(), 1);
    }

    #[test]
    fn test_uniform_attribute() {
        let mut u: UniformAttribute<bool> = UniformAttribute::with_fallback(false);
        assert_eq!(u.get_or_fallback(), Some(false));
        u.set_value(true);
        assert_eq!(u.get_or_fallback(), Some(true));
    }

    #[test]
    fn test_timesamples_slot() {
        let mut ts = crate::value::TypedTimeSamples::new();
        ts.add_sample(0.0, 1.2f64);
        ts.add_sample(1.0, 2.3f64);
        let mut a: TypedAttribute<f64> = TypedAttribute::default();
        a.set_value(Animatable::TimeSamples(ts));
        assert!(a.is_timesamples());
        assert_eq!(a.timesamples().unwrap().times(), vec![0.0, 1.0]);
    }
}
