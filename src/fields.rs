//! Ordered, key-unique lists of encoded fields.
//!
//! Keys and values are stored as JSON text fragments behind `Arc<str>`, so
//! merging a logger's context into a scratch list copies pointers rather
//! than text. Lookups are linear scans: lists hold tens of fields at most.

use std::sync::Arc;

use crate::encode::{quote, Encode};

/// One `(key, value)` pair, both already encoded as JSON.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedField {
    key: Arc<str>,
    value: Arc<str>,
}

impl EncodedField {
    /// Encode a key/value pair. Returns `None` when `key` is not a string.
    pub fn new(key: &dyn Encode, value: &dyn Encode) -> Option<Self> {
        let key = key.encode_key()?;
        Some(EncodedField {
            key: key.into(),
            value: value.encode().into(),
        })
    }

    /// Build a field from a plain key name and an already encoded value.
    pub fn from_parts(name: &str, encoded_value: impl Into<Arc<str>>) -> Self {
        EncodedField {
            key: quote(name).into(),
            value: encoded_value.into(),
        }
    }

    /// Encoded key, including its quotes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Encoded value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Ordered list of encoded fields with unique keys.
///
/// Inserting a key that is already present replaces its value in place; the
/// field keeps the position of its first insertion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldList {
    entries: Vec<EncodedField>,
}

impl FieldList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        FieldList {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Encode a flat `key, value, key, value, ...` slice into a new list.
    pub fn from_flat(flat: &[&dyn Encode]) -> Self {
        let mut list = Self::with_capacity(flat.len() / 2);
        list.append_flat(flat);
        list
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EncodedField> {
        self.entries.iter()
    }

    /// Position of the field whose encoded key equals `key`.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|field| field.key() == key)
    }

    /// Encoded value stored under the plain key `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = quote(name);
        self.index_of(&key).map(|i| self.entries[i].value())
    }

    /// Overwrite the value of an existing key, or append a new field.
    pub fn insert(&mut self, field: EncodedField) -> &mut Self {
        self.upsert(0, field);
        self
    }

    /// Encode and insert alternating key/value entries.
    ///
    /// A trailing key without a value is dropped, as is every pair whose key
    /// is not a string. Later duplicates overwrite earlier ones.
    pub fn append_flat(&mut self, flat: &[&dyn Encode]) -> &mut Self {
        self.append_flat_above(0, flat);
        self
    }

    /// Insert already encoded fields from `other`, overwriting on collision.
    pub fn merge_from(&mut self, other: &FieldList) -> &mut Self {
        self.merge_above(0, other);
        self
    }

    /// Reserve room for at least `additional` more fields.
    pub fn grow(&mut self, additional: usize) {
        self.entries.reserve(additional);
    }

    /// Drop every field, keeping the allocation.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Like [`append_flat`](Self::append_flat), but fields before `floor`
    /// are fixed: a colliding key leaves them untouched.
    pub(crate) fn append_flat_above(&mut self, floor: usize, flat: &[&dyn Encode]) {
        let pairs = flat.chunks_exact(2);
        if !pairs.remainder().is_empty() {
            tracing::trace!(len = flat.len(), "odd-length field list, dropping trailing key");
        }
        self.grow(pairs.len());
        for pair in pairs {
            if let Some(field) = EncodedField::new(pair[0], pair[1]) {
                self.upsert(floor, field);
            }
        }
    }

    /// Like [`merge_from`](Self::merge_from), with the same `floor` rule as
    /// [`append_flat_above`](Self::append_flat_above).
    pub(crate) fn merge_above(&mut self, floor: usize, other: &FieldList) {
        self.grow(other.len());
        for field in other.iter() {
            self.upsert(floor, field.clone());
        }
    }

    fn upsert(&mut self, floor: usize, field: EncodedField) {
        match self.index_of(field.key()) {
            Some(i) if i < floor => {}
            Some(i) => self.entries[i].value = field.value,
            None => self.entries.push(field),
        }
    }
}

impl<'a> IntoIterator for &'a FieldList {
    type Item = &'a EncodedField;
    type IntoIter = std::slice::Iter<'a, EncodedField>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &FieldList) -> Vec<&str> {
        list.iter().map(EncodedField::key).collect()
    }

    #[test]
    fn append_encodes_pairs_in_order() {
        let list = FieldList::from_flat(&[&"tomato", &1, &"potato", &"two"]);
        assert_eq!(keys(&list), [r#""tomato""#, r#""potato""#]);
        assert_eq!(list.get("tomato"), Some("1"));
        assert_eq!(list.get("potato"), Some(r#""two""#));
    }

    #[test]
    fn duplicate_overwrites_in_place() {
        let list = FieldList::from_flat(&[&"a", &1, &"b", &2, &"a", &3]);
        assert_eq!(keys(&list), [r#""a""#, r#""b""#]);
        assert_eq!(list.get("a"), Some("3"));
    }

    #[derive(serde::Serialize)]
    enum Level {
        Info,
    }

    #[test]
    fn non_string_keys_are_dropped() {
        let list = FieldList::from_flat(&[&1, &"one", &"ok", &true, &vec![1], &2]);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("ok"), Some("true"));

        let list = FieldList::from_flat(&[&'k', &1, &Some("opt"), &2, &Level::Info, &3]);
        assert!(list.is_empty(), "{:?}", keys(&list));
    }

    #[test]
    fn odd_trailing_key_is_dropped() {
        let list = FieldList::from_flat(&[&"a", &1, &"dangling"]);
        assert_eq!(list.len(), 1);
        assert_eq!(list.index_of(r#""dangling""#), None);
    }

    #[test]
    fn merge_overwrites_or_appends() {
        let mut base = FieldList::from_flat(&[&"a", &1, &"b", &2]);
        let other = FieldList::from_flat(&[&"b", &20, &"c", &30]);
        base.merge_from(&other);
        assert_eq!(keys(&base), [r#""a""#, r#""b""#, r#""c""#]);
        assert_eq!(base.get("b"), Some("20"));
        assert_eq!(base.get("c"), Some("30"));
    }

    #[test]
    fn floor_protects_leading_fields() {
        let mut list = FieldList::from_flat(&[&"p", &2]);
        let floor = list.len();
        list.append_flat_above(floor, &[&"p", &4, &"q", &1, &"q", &5]);
        assert_eq!(list.get("p"), Some("2"));
        assert_eq!(list.get("q"), Some("5"));

        let call = FieldList::from_flat(&[&"p", &9, &"r", &7]);
        list.merge_above(floor, &call);
        assert_eq!(list.get("p"), Some("2"));
        assert_eq!(list.get("r"), Some("7"));
    }

    #[test]
    fn reset_keeps_capacity() {
        let mut list = FieldList::with_capacity(8);
        list.append_flat(&[&"a", &1]);
        let capacity = list.entries.capacity();
        list.reset();
        assert!(list.is_empty());
        assert_eq!(list.entries.capacity(), capacity);
    }

    #[test]
    fn grow_reserves() {
        let mut list = FieldList::new();
        list.grow(32);
        assert!(list.entries.capacity() >= 32);
    }

    #[test]
    fn insert_prebuilt_field() {
        let mut list = FieldList::new();
        list.insert(EncodedField::from_parts("level", r#""INFO""#));
        list.insert(EncodedField::from_parts("level", r#""WARN""#));
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("level"), Some(r#""WARN""#));
    }
}
