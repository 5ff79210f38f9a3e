//! Type names and the subtype predicate used for member classification.
//!
//! Catalogue type names are plain strings. Generic parameters (`List<Feature>`)
//! carry no meaning at this layer and are stripped to their base name before
//! storage or comparison.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::OnceLock;

/// The universal type. Accepts everything; never makes a member an instance
/// method.
pub const OBJECT_TYPE: &str = "Object";

fn generic_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<.*>").expect("generic-suffix regex must compile"))
}

/// Strip a generic parameter suffix: `List<Feature>` becomes `List`.
pub fn strip_generic(type_name: &str) -> String {
    generic_suffix_re()
        .replace(type_name, "")
        .trim()
        .to_string()
}

/// Subtype predicate consumed by the binder.
pub trait TypeMatcher: Send + Sync {
    /// Whether a value of type `actual` is acceptable where `declared` is
    /// required.
    fn accepts(&self, declared: &str, actual: &str) -> bool;
}

/// Table-driven nominal subtyping.
///
/// Each entry maps a type to its direct subtypes. `accepts` walks the table
/// transitively; equal names and [`OBJECT_TYPE`] always accept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubtypeTable {
    subtypes: BTreeMap<String, BTreeSet<String>>,
}

impl SubtypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The geospatial hierarchy shipped with the client.
    pub fn geospatial() -> Self {
        Self::new()
            .with_subtypes(
                "Element",
                ["Image", "Feature", "Collection", "ImageCollection", "FeatureCollection"],
            )
            .with_subtypes("Collection", ["FeatureCollection", "ImageCollection"])
            .with_subtypes("FeatureCollection", ["ImageCollection"])
    }

    pub fn with_subtypes<I, S>(mut self, parent: &str, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for child in children {
            self.insert(parent, child);
        }
        self
    }

    pub fn insert(&mut self, parent: &str, child: impl Into<String>) {
        self.subtypes
            .entry(parent.to_string())
            .or_default()
            .insert(child.into());
    }

    /// Merge `parent -> [children]` rows (as read from configuration).
    pub fn extend(&mut self, rows: &BTreeMap<String, Vec<String>>) {
        for (parent, children) in rows {
            for child in children {
                self.insert(parent, child.clone());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subtypes.is_empty()
    }
}

impl TypeMatcher for SubtypeTable {
    fn accepts(&self, declared: &str, actual: &str) -> bool {
        if declared == actual || declared == OBJECT_TYPE {
            return true;
        }
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([declared]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            let Some(children) = self.subtypes.get(current) else {
                continue;
            };
            if children.contains(actual) {
                return true;
            }
            queue.extend(children.iter().map(String::as_str));
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_generic_suffixes() {
        assert_eq!(strip_generic("List<Feature>"), "List");
        assert_eq!(strip_generic("Dictionary<String, List<Number>>"), "Dictionary");
        assert_eq!(strip_generic("Image"), "Image");
    }

    #[test]
    fn object_and_identity_always_accept() {
        let table = SubtypeTable::new();
        assert!(table.accepts("Image", "Image"));
        assert!(table.accepts(OBJECT_TYPE, "Image"));
        assert!(!table.accepts("Image", "String"));
    }

    #[test]
    fn geospatial_table_is_transitive() {
        let table = SubtypeTable::geospatial();
        assert!(table.accepts("Element", "Image"));
        assert!(table.accepts("Collection", "ImageCollection"));
        assert!(table.accepts("FeatureCollection", "ImageCollection"));
        assert!(!table.accepts("Image", "Element"));
        assert!(!table.accepts("ImageCollection", "FeatureCollection"));
    }

    #[test]
    fn extend_merges_configured_rows() {
        let mut table = SubtypeTable::new();
        let rows = BTreeMap::from([("Geometry".to_string(), vec!["Polygon".to_string()])]);
        table.extend(&rows);
        table.insert("Polygon", "Rectangle");
        assert!(table.accepts("Geometry", "Rectangle"));
    }
}
