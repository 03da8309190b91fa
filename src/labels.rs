use std::collections::BTreeMap;
use std::fmt;

/// Defect classes in the order a folder-based classification trainer assigns them
/// (sorted directory names).
pub const GEAR_DEFECTS: [&str; 4] = ["indentation", "pitting", "scuffing", "spalling"];

/// Ordered mapping from model class index to defect name.
///
/// Indices are dense and 0-based. Looking up an index outside the set yields a
/// synthesized `Class_<index>` name instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The four gear surface defects
    pub fn gear_defects() -> Self {
        Self::new(GEAR_DEFECTS)
    }

    /// Parse the `names` entry Ultralytics writes into exported model metadata,
    /// e.g. `{0: 'indentation', 1: 'pitting'}`.
    ///
    /// Returns `None` unless the indices form a dense 0-based range.
    pub fn from_model_metadata(raw: &str) -> Option<Self> {
        let body = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
        let mut entries = BTreeMap::new();

        for entry in body.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (index, name) = entry.split_once(':')?;
            let index: usize = index.trim().trim_matches(|c| c == '\'' || c == '"').parse().ok()?;
            let name = name.trim().trim_matches(|c| c == '\'' || c == '"');
            if name.is_empty() {
                return None;
            }
            entries.insert(index, name.to_string());
        }

        if entries.is_empty() || entries.keys().enumerate().any(|(expected, &i)| expected != i) {
            return None;
        }
        Some(Self {
            names: entries.into_values().collect(),
        })
    }

    /// Name for a class index, or the `Class_<index>` placeholder when out of range
    pub fn name(&self, index: usize) -> String {
        self.names
            .get(index)
            .cloned()
            .unwrap_or_else(|| placeholder_name(index))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// First label (in set order) contained in `text`, ignoring case
    pub fn find_in(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.iter().find(|name| haystack.contains(&name.to_lowercase()))
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::gear_defects()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.join(", "))
    }
}

pub fn placeholder_name(index: usize) -> String {
    format!("Class_{}", index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_index_gets_placeholder() {
        let labels = LabelSet::gear_defects();
        assert_eq!(labels.name(1), "pitting");
        assert_eq!(labels.name(7), "Class_7");
    }

    #[test]
    fn parses_ultralytics_names() {
        let labels = LabelSet::from_model_metadata(
            "{0: 'pitting', 1: 'indentation', 2: 'scuffing', 3: 'spalling'}",
        )
        .unwrap();
        assert_eq!(labels.len(), 4);
        assert_eq!(labels.name(0), "pitting");
        assert_eq!(labels.name(3), "spalling");
    }

    #[test]
    fn rejects_sparse_or_malformed_names() {
        assert!(LabelSet::from_model_metadata("{0: 'a', 2: 'b'}").is_none());
        assert!(LabelSet::from_model_metadata("['a', 'b']").is_none());
        assert!(LabelSet::from_model_metadata("{}").is_none());
    }

    #[test]
    fn finds_label_in_file_name_ignoring_case() {
        let labels = LabelSet::gear_defects();
        assert_eq!(labels.find_in("Gear_PITTING_03.jpg"), Some("pitting"));
        assert_eq!(labels.find_in("unlabeled.bmp"), None);
    }
}
