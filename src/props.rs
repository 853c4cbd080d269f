// This file is part of the sgf-reader library.
// Copyright (C) 2025 The sgf-reader developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

use std::{collections::BTreeMap, error::Error, fmt};

/// Raw properties of a node, as multi-valued strings keyed by property
/// name.
///
/// Keys iterate in sorted order. Cloning copies all values, so the clone
/// can be modified independently.
///
/// # Examples
///
/// ```
/// use sgf_reader::PropertyTable;
///
/// let mut props = PropertyTable::new();
/// props.put("AB", vec!["aa".to_owned(), "bb".to_owned()]);
/// props.add("C", "hello");
///
/// assert_eq!(props.value_count("AB"), 2);
/// assert_eq!(props.value_count("XX"), -1);
/// assert_eq!(props.value("AB", 1), Ok("bb"));
/// assert!(props.value("AB", 2).is_err());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct PropertyTable {
    props: BTreeMap<String, Vec<String>>,
}

impl PropertyTable {
    pub fn new() -> PropertyTable {
        PropertyTable::default()
    }

    /// Sets the values of a property, replacing previous values.
    ///
    /// An empty list of values removes the property.
    pub fn put(&mut self, key: impl Into<String>, values: Vec<String>) {
        let key = key.into();
        if values.is_empty() {
            self.props.remove(&key);
        } else {
            self.props.insert(key, values);
        }
    }

    /// Sets a property to a single value.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put(key, vec![value.into()]);
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.props.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.props.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.props.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.props.get(key).map(Vec::as_slice)
    }

    /// Number of values of a property, or `-1` if it is not present.
    pub fn value_count(&self, key: &str) -> i32 {
        self.props
            .get(key)
            .map_or(-1, |v| i32::try_from(v.len()).unwrap_or(i32::MAX))
    }

    /// # Errors
    ///
    /// Returns [`PropertyIndexError`] if the property is not present or has
    /// fewer values.
    pub fn value(&self, key: &str, index: usize) -> Result<&str, PropertyIndexError> {
        self.props
            .get(key)
            .and_then(|v| v.get(index))
            .map(String::as_str)
            .ok_or_else(|| PropertyIndexError {
                key: key.to_owned(),
                index,
            })
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }
}

impl IntoIterator for PropertyTable {
    type Item = (String, Vec<String>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.props.into_iter()
    }
}

/// Error when accessing a property value that does not exist.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyIndexError {
    pub key: String,
    pub index: usize,
}

impl fmt::Display for PropertyIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no value {} for property {}", self.index, self.key)
    }
}

impl Error for PropertyIndexError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_replaces() {
        let mut props = PropertyTable::new();
        props.add("KM", "6.5");
        props.put("KM", vec!["7".to_owned(), "8".to_owned()]);
        assert_eq!(props.value_count("KM"), 2);
        assert_eq!(props.value("KM", 0), Ok("7"));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_put_empty_removes() {
        let mut props = PropertyTable::new();
        props.add("C", "comment");
        props.put("C", Vec::new());
        assert!(!props.contains("C"));
        props.put("XX", Vec::new());
        assert!(props.is_empty());
        assert_eq!(props.value_count("XX"), -1);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = PropertyTable::new();
        a.add("C", "first");
        let mut b = a.clone();
        b.add("C", "second");
        b.add("GN", "game");
        assert_eq!(a.value("C", 0), Ok("first"));
        assert!(!a.contains("GN"));
        assert_eq!(b.value("C", 0), Ok("second"));
    }

    #[test]
    fn test_sorted_keys() {
        let mut props = PropertyTable::new();
        props.add("PW", "w");
        props.add("AB", "aa");
        props.add("KM", "0");
        assert_eq!(props.keys().collect::<Vec<_>>(), ["AB", "KM", "PW"]);
    }

    #[test]
    fn test_missing_key() {
        let props = PropertyTable::new();
        assert_eq!(
            props.value("B", 0),
            Err(PropertyIndexError {
                key: "B".to_owned(),
                index: 0
            })
        );
    }
}
