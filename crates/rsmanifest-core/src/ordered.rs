//! Insertion-ordered, string-keyed mapping.
//!
//! [`OrderedMapping`] keeps keys in the order they were first inserted.
//! Overwriting a present key keeps its position; removing a key and
//! setting it again moves it to the end.

use indexmap::IndexMap;
use serde_json::Value;
use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Index;

/// Marker naming a family of mappings.
///
/// Two mappings only compare equal when they share the same kind, and the
/// kind's name leads the `Debug` rendering.
pub trait MappingKind: 'static {
    const NAME: &'static str;
}

/// The default kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Plain;

impl MappingKind for Plain {
    const NAME: &'static str = "OrderedMapping";
}

/// Errors raised by [`OrderedMapping`] access and construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("key not found: {0}")]
    MissingKey(String),
    #[error("expected at most one mapping argument, got {0}")]
    InvalidConstruction(usize),
    #[error("cannot build a mapping from a {0}")]
    NotAMapping(&'static str),
}

/// An ordered record of string keys to values.
pub struct OrderedMapping<V, K: MappingKind = Plain> {
    entries: IndexMap<String, V>,
    kind: PhantomData<fn() -> K>,
}

impl<V, K: MappingKind> OrderedMapping<V, K> {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            kind: PhantomData,
        }
    }

    /// Copy the entries of another mapping, of any kind, in its order.
    pub fn from_mapping<K2: MappingKind>(other: &OrderedMapping<V, K2>) -> Self
    where
        V: Clone,
    {
        Self {
            entries: other.entries.clone(),
            kind: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up a value. A missing key is an error, never a default.
    pub fn get(&self, key: &str) -> Result<&V, MappingError> {
        self.entries
            .get(key)
            .ok_or_else(|| MappingError::MissingKey(key.to_string()))
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut V, MappingError> {
        self.entries
            .get_mut(key)
            .ok_or_else(|| MappingError::MissingKey(key.to_string()))
    }

    /// Insert or overwrite a value, returning the previous one.
    ///
    /// A new key is appended; an existing key keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.entries.insert(key.into(), value)
    }

    /// Get the value for `key`, appending `default()` first if it is absent.
    pub fn get_or_insert_with(
        &mut self,
        key: impl Into<String>,
        default: impl FnOnce() -> V,
    ) -> &mut V {
        self.entries.entry(key.into()).or_insert_with(default)
    }

    /// Remove a key. The remaining keys keep their relative order.
    pub fn remove(&mut self, key: &str) -> Result<V, MappingError> {
        self.entries
            .shift_remove(key)
            .ok_or_else(|| MappingError::MissingKey(key.to_string()))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, V> {
        self.entries.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, V> {
        self.entries.iter()
    }

    /// Set every entry of `source` in the source's iteration order.
    pub fn merge<S, I>(&mut self, source: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, V)>,
    {
        for (key, value) in source {
            self.set(key, value);
        }
    }
}

impl<K: MappingKind> OrderedMapping<Value, K> {
    /// Build a mapping from loosely typed positional arguments.
    ///
    /// No arguments gives an empty mapping and a single JSON object is copied
    /// in document order. A single non-object is [`MappingError::NotAMapping`];
    /// more than one argument is [`MappingError::InvalidConstruction`].
    pub fn from_args(args: &[Value]) -> Result<Self, MappingError> {
        match args {
            [] => Ok(Self::new()),
            [single] => Self::try_from(single.clone()),
            _ => Err(MappingError::InvalidConstruction(args.len())),
        }
    }
}

impl<K: MappingKind> TryFrom<Value> for OrderedMapping<Value, K> {
    type Error = MappingError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(MappingError::NotAMapping(json_type_name(&other))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fold `source` into `target`, one `set` per entry.
pub fn mapping_merge<V, K, S, I>(target: &mut OrderedMapping<V, K>, source: I)
where
    K: MappingKind,
    S: Into<String>,
    I: IntoIterator<Item = (S, V)>,
{
    target.merge(source);
}

impl<V, K: MappingKind> Default for OrderedMapping<V, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone, K: MappingKind> Clone for OrderedMapping<V, K> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            kind: PhantomData,
        }
    }
}

// IndexMap equality ignores order, so compare the entry sequences directly.
impl<V, A, B> PartialEq<OrderedMapping<V, B>> for OrderedMapping<V, A>
where
    V: PartialEq,
    A: MappingKind,
    B: MappingKind,
{
    fn eq(&self, other: &OrderedMapping<V, B>) -> bool {
        TypeId::of::<A>() == TypeId::of::<B>()
            && self.entries.len() == other.entries.len()
            && self.entries.iter().eq(other.entries.iter())
    }
}

impl<V: Eq, K: MappingKind> Eq for OrderedMapping<V, K> {}

impl<V, K: MappingKind> OrderedMapping<V, K> {
    /// Render `Name(k1=v1, k2=v2)`, formatting each value with `value`.
    fn fmt_entries(
        &self,
        f: &mut fmt::Formatter<'_>,
        value: impl Fn(&V, &mut fmt::Formatter<'_>) -> fmt::Result,
    ) -> fmt::Result {
        write!(f, "{}(", K::NAME)?;
        for (i, (key, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}=")?;
            value(v, &mut *f)?;
        }
        f.write_str(")")
    }
}

impl<V: fmt::Debug, K: MappingKind> fmt::Debug for OrderedMapping<V, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_entries(f, |v, f| write!(f, "{v:?}"))
    }
}

impl<V: fmt::Display, K: MappingKind> fmt::Display for OrderedMapping<V, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_entries(f, |v, f| write!(f, "{v}"))
    }
}

/// Panics if the key is absent; use [`OrderedMapping::get`] to handle that.
impl<V, K: MappingKind> Index<&str> for OrderedMapping<V, K> {
    type Output = V;

    fn index(&self, key: &str) -> &V {
        &self.entries[key]
    }
}

impl<V, K: MappingKind, S: Into<String>> FromIterator<(S, V)> for OrderedMapping<V, K> {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        mapping.merge(iter);
        mapping
    }
}

impl<V, K: MappingKind, S: Into<String>> Extend<(S, V)> for OrderedMapping<V, K> {
    fn extend<I: IntoIterator<Item = (S, V)>>(&mut self, iter: I) {
        self.merge(iter);
    }
}

impl<V, K: MappingKind> IntoIterator for OrderedMapping<V, K> {
    type Item = (String, V);
    type IntoIter = indexmap::map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, V, K: MappingKind> IntoIterator for &'a OrderedMapping<V, K> {
    type Item = (&'a String, &'a V);
    type IntoIter = indexmap::map::Iter<'a, String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
