//! Interned token strings.
//!
//! Tokens are short immutable strings (attribute names, schema identifiers,
//! enum values) that repeat heavily across a scene. They are stored once in
//! a process-wide database and shared; a `Token` is a cheap clonable handle.
//! Equality and hashing go through the string content, never through
//! storage identity, so per-decode pools may also intern privately.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;

/// Process-wide token storage. Readers from concurrent decodes may look up
/// and insert; entries are never invalidated.
struct TokenStorage {
    set: RwLock<HashSet<Arc<str>>>,
}

impl TokenStorage {
    fn instance() -> &'static TokenStorage {
        static STORAGE: std::sync::OnceLock<TokenStorage> = std::sync::OnceLock::new();
        STORAGE.get_or_init(|| TokenStorage {
            set: RwLock::new(HashSet::new()),
        })
    }

    fn intern(&self, s: &str) -> Arc<str> {
        {
            let set = self.set.read();
            if let Some(existing) = set.get(s) {
                return existing.clone();
            }
        }
        let mut set = self.set.write();
        if let Some(existing) = set.get(s) {
            return existing.clone();
        }
        let arc: Arc<str> = Arc::from(s);
        set.insert(arc.clone());
        arc
    }
}

/// An interned immutable short string with stable identity within a decode.
#[derive(Clone)]
pub struct Token(Arc<str>);

impl Token {
    /// Intern a string in the process-wide database.
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(TokenStorage::instance().intern(s.as_ref()))
    }

    /// The empty token.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// The token's string content.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Token {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Token {}

impl PartialEq<str> for Token {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Token {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?})", self.as_str())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(v: &T) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_token_equality() {
        let a = Token::new("points");
        let b = Token::new("points");
        let c = Token::new("normals");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, "points");
    }

    #[test]
    fn test_token_hash_matches_str() {
        let t = Token::new("xformOpOrder");
        assert_eq!(hash_of(&t), hash_of(&t.clone()));
    }

    #[test]
    fn test_concurrent_intern() {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                std::thread::spawn(move || {
                    for j in 0..100 {
                        let t = Token::new(format!("tok{}", (i * j) % 50));
                        assert!(!t.as_str().is_empty());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}
