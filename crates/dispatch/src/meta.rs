//! Per-directory metadata records and rule tables.
//!
//! Each directory in the archive may carry a `meta.json` file: a JSON object
//! whose rule-class keys (`"gets"`, `"builds"`) hold rule tables, and whose
//! remaining top-level keys are arbitrary domain metadata. A missing file is
//! an empty record; absence is the normal state for leaf directories.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DispatchError, Result};
use crate::template::PathTemplate;

/// Fixed per-directory metadata filename.
pub const META_FILENAME: &str = "meta.json";

/// The metadata for one directory (or several, merged).
///
/// Wraps the file's top-level JSON object. `serde_json` is built with
/// `preserve_order`, so key order follows the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataRecord(Map<String, Value>);

impl MetadataRecord {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The raw top-level fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// The rule table registered under a rule-class key.
    ///
    /// An absent key yields an empty table. A present key must hold an
    /// object of rule objects; anything else is invalid metadata.
    pub fn rule_table(&self, key: &str) -> Result<RuleTable> {
        match self.0.get(key) {
            None => Ok(RuleTable::default()),
            Some(value) => RuleTable::from_value(key, value),
        }
    }

    /// Shallow merge: `other`'s top-level keys overwrite this record's.
    pub fn merge_from(&mut self, other: MetadataRecord) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }
}

/// A rule binds a path template to a named operation, plus whatever extra
/// metadata fields the rule object carried.
#[derive(Debug, Clone)]
pub struct Rule {
    pub template: PathTemplate,
    pub operation: String,
    /// Extra rule fields, merged verbatim onto matched parameters.
    pub extra: Map<String, Value>,
}

/// A rule together with its identifier in the table.
#[derive(Debug, Clone)]
pub struct NamedRule {
    pub name: String,
    pub rule: Rule,
}

/// An ordered table of rules for one rule class at one directory level.
///
/// Iteration order is the insertion order of the JSON object; the resolver
/// takes the first matching rule, so the order is part of the contract.
#[derive(Debug, Clone, Default)]
pub struct RuleTable(Vec<NamedRule>);

/// Serde shape of one rule object in `meta.json`.
#[derive(Deserialize)]
struct RawRule {
    path: String,
    operation: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl RuleTable {
    fn from_value(key: &str, value: &Value) -> Result<Self> {
        let invalid = |message: String| DispatchError::InvalidMetadata {
            path: key.to_string(),
            message,
        };

        let table = value
            .as_object()
            .ok_or_else(|| invalid("rule table is not an object".to_string()))?;

        let mut rules = Vec::with_capacity(table.len());
        for (name, rule_value) in table {
            let raw: RawRule = serde_json::from_value(rule_value.clone())
                .map_err(|e| invalid(format!("rule '{}': {}", name, e)))?;
            rules.push(NamedRule {
                name: name.clone(),
                rule: Rule {
                    template: PathTemplate::parse(&raw.path)?,
                    operation: raw.operation,
                    extra: raw.extra,
                },
            });
        }

        Ok(Self(rules))
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedRule> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Loads metadata records from directories under an archive root.
#[derive(Debug, Clone)]
pub struct MetaStore {
    root: PathBuf,
}

impl MetaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the metadata record for one directory (slash path relative to
    /// the root; `""` is the root itself). A missing file is an empty
    /// record; a file that is present but not a JSON object is an error.
    pub fn load(&self, dir: &str) -> Result<MetadataRecord> {
        let filename = self.root.join(dir).join(META_FILENAME);
        if !filename.exists() {
            return Ok(MetadataRecord::default());
        }

        let text = fs::read_to_string(&filename)?;
        serde_json::from_str(&text).map_err(|e| DispatchError::InvalidMetadata {
            path: filename.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Accumulate metadata across every prefix of `path`, shortest first,
    /// later (deeper) levels overwriting earlier top-level keys.
    pub fn load_all(&self, path: &str) -> Result<MetadataRecord> {
        let mut merged = MetadataRecord::default();
        let fields: Vec<&str> = path.split('/').collect();

        for split in 1..=fields.len() {
            let prefix = fields[..split].join("/");
            merged.merge_from(self.load(&prefix)?);
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_meta(root: &Path, dir: &str, value: Value) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(META_FILENAME), value.to_string()).unwrap();
    }

    #[test]
    fn test_missing_file_is_empty_record() {
        let tmp = TempDir::new().unwrap();
        let store = MetaStore::new(tmp.path());
        let record = store.load("nowhere").unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("bad")).unwrap();
        fs::write(tmp.path().join("bad").join(META_FILENAME), "not json").unwrap();
        let store = MetaStore::new(tmp.path());
        assert!(matches!(
            store.load("bad"),
            Err(DispatchError::InvalidMetadata { .. })
        ));
    }

    #[test]
    fn test_rule_table_preserves_file_order() {
        let tmp = TempDir::new().unwrap();
        write_meta(
            tmp.path(),
            "data",
            json!({
                "gets": {
                    "zebra": { "path": "<a>", "operation": "op.zebra" },
                    "apple": { "path": "<b>", "operation": "op.apple" },
                    "mango": { "path": "<c>", "operation": "op.mango" }
                }
            }),
        );
        let store = MetaStore::new(tmp.path());
        let table = store.load("data").unwrap().rule_table("gets").unwrap();
        let names: Vec<_> = table.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_rule_extra_fields_captured() {
        let tmp = TempDir::new().unwrap();
        write_meta(
            tmp.path(),
            "data",
            json!({
                "builds": {
                    "day": {
                        "path": "<int:year>/<field>",
                        "operation": "weather.build_day",
                        "source": "raw/{field}",
                        "units": "K"
                    }
                }
            }),
        );
        let store = MetaStore::new(tmp.path());
        let table = store.load("data").unwrap().rule_table("builds").unwrap();
        let rule = &table.iter().next().unwrap().rule;
        assert_eq!(rule.operation, "weather.build_day");
        assert_eq!(rule.extra.get("source"), Some(&json!("raw/{field}")));
        assert_eq!(rule.extra.get("units"), Some(&json!("K")));
    }

    #[test]
    fn test_missing_rule_class_is_empty_table() {
        let tmp = TempDir::new().unwrap();
        write_meta(tmp.path(), "data", json!({ "gets": {} }));
        let store = MetaStore::new(tmp.path());
        let record = store.load("data").unwrap();
        assert!(record.rule_table("builds").unwrap().is_empty());
    }

    #[test]
    fn test_bad_template_in_rule_is_load_error() {
        let tmp = TempDir::new().unwrap();
        write_meta(
            tmp.path(),
            "data",
            json!({
                "gets": { "bad": { "path": "<date:when>", "operation": "op" } }
            }),
        );
        let store = MetaStore::new(tmp.path());
        let record = store.load("data").unwrap();
        assert!(matches!(
            record.rule_table("gets"),
            Err(DispatchError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn test_load_all_merges_deeper_levels_last() {
        let tmp = TempDir::new().unwrap();
        write_meta(tmp.path(), "a", json!({ "delta": 0.75, "owner": "a" }));
        write_meta(tmp.path(), "a/b", json!({ "owner": "a/b" }));
        write_meta(tmp.path(), "a/b/c", json!({ "owner": "a/b/c", "extra": 1 }));
        let store = MetaStore::new(tmp.path());
        let merged = store.load_all("a/b/c").unwrap();
        assert_eq!(merged.get("delta"), Some(&json!(0.75)));
        assert_eq!(merged.get("owner"), Some(&json!("a/b/c")));
        assert_eq!(merged.get("extra"), Some(&json!(1)));
    }

    #[test]
    fn test_load_all_skips_levels_without_metadata() {
        let tmp = TempDir::new().unwrap();
        write_meta(tmp.path(), "a", json!({ "owner": "a" }));
        fs::create_dir_all(tmp.path().join("a/b/c")).unwrap();
        let store = MetaStore::new(tmp.path());
        let merged = store.load_all("a/b/c").unwrap();
        assert_eq!(merged.get("owner"), Some(&json!("a")));
    }
}
