//! Hierarchical path resolution.
//!
//! The resolver walks a logical path's directory hierarchy from the archive
//! root toward the leaf. At each level it loads that directory's metadata,
//! takes the rule table for the requested rule class and tries to match the
//! remaining relative path against each rule's template in table order. The
//! first successful match at the shallowest level wins; the walk never
//! continues past a matching level. This lets an ancestor directory declare
//! one rule covering many descendant paths while a closer directory can
//! still override with its own table.

use tracing::{debug, trace};

use crate::error::{DispatchError, Result};
use crate::meta::{MetaStore, NamedRule};
use crate::template::ParamSet;

/// A successful resolution.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    /// Directory prefix (slash path, relative to the root) at which the
    /// match was found.
    pub base: String,
    /// Path segments remaining after the base was consumed.
    pub relative: String,
    /// The matched rule.
    pub rule: NamedRule,
    /// Extracted parameters with the rule's extra fields merged on top.
    pub params: ParamSet,
}

/// Walks the metadata hierarchy for a path.
pub struct Resolver<'a> {
    store: &'a MetaStore,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a MetaStore) -> Self {
        Self { store }
    }

    /// Resolve `path` against the rule class `rule_key`.
    ///
    /// Walk order is the shortest prefix first, growing one segment at a
    /// time toward the full path: for `a/b/c` the (base, relative) pairs
    /// are `(a, b/c)`, `(a/b, c)`, `(a/b/c, "")`.
    pub fn resolve(&self, path: &str, rule_key: &str) -> Result<ResolvedPath> {
        let fields: Vec<&str> = path.split('/').collect();

        for split in 1..=fields.len() {
            let base = fields[..split].join("/");
            let relative = fields[split..].join("/");

            let record = self.store.load(&base)?;
            let table = record.rule_table(rule_key)?;
            trace!(base, relative, rules = table.len(), "considering level");

            for named in table.iter() {
                if let Some(mut params) = named.rule.template.match_path(&relative) {
                    params.merge(&named.rule.extra);
                    debug!(
                        base,
                        relative,
                        rule = named.name,
                        operation = named.rule.operation,
                        "matched"
                    );
                    return Ok(ResolvedPath {
                        base,
                        relative,
                        rule: named.clone(),
                        params,
                    });
                }
            }
        }

        Err(DispatchError::UnrecognizedPath(path.to_string()))
    }
}
