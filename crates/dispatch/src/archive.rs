//! The archive dispatcher.
//!
//! Binds the resolver and the operation registry together: resolve a
//! logical path to a rule, look the rule's operation up in the registry and
//! invoke it with the matched base directory and parameters.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{DispatchError, Result};
use crate::meta::{MetaStore, MetadataRecord};
use crate::registry::{OpContext, OperationRegistry};
use crate::resolver::{ResolvedPath, Resolver};

/// Rule class for read operations.
pub const GETS_KEY: &str = "gets";
/// Rule class for build operations.
pub const BUILDS_KEY: &str = "builds";

/// A metadata-driven archive rooted at a directory.
#[derive(Debug)]
pub struct Archive {
    root: PathBuf,
    store: MetaStore,
    registry: OperationRegistry,
}

impl Archive {
    pub fn new(root: impl Into<PathBuf>, registry: OperationRegistry) -> Self {
        let root = root.into();
        let store = MetaStore::new(root.clone());
        Self {
            root,
            store,
            registry,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Get data at a logical path.
    pub fn get(&self, path: &str) -> Result<Value> {
        self.dispatch(path, GETS_KEY)
    }

    /// Build data at a logical path.
    pub fn build(&self, path: &str) -> Result<Value> {
        self.dispatch(path, BUILDS_KEY)
    }

    /// Merged metadata along a logical path.
    pub fn meta(&self, path: &str) -> Result<MetadataRecord> {
        self.store.load_all(path)
    }

    /// Resolve a path without dispatching.
    pub fn resolve(&self, path: &str, rule_key: &str) -> Result<ResolvedPath> {
        Resolver::new(&self.store).resolve(path, rule_key)
    }

    /// Resolve a path under the given rule class and invoke the bound
    /// operation.
    ///
    /// The operation receives the matched base directory explicitly; the
    /// process working directory is never touched, so a failing operation
    /// leaves no state to restore. Operation failures propagate unchanged.
    pub fn dispatch(&self, path: &str, rule_key: &str) -> Result<Value> {
        let resolved = self.resolve(path, rule_key)?;

        let op = self
            .registry
            .get(&resolved.rule.rule.operation)
            .ok_or_else(|| DispatchError::OperationNotFound(resolved.rule.rule.operation.clone()))?;

        let base_dir = self.root.join(&resolved.base);
        debug!(
            path,
            rule_key,
            base = resolved.base,
            relative = resolved.relative,
            operation = resolved.rule.rule.operation,
            "dispatching"
        );

        let ctx = OpContext {
            base: &base_dir,
            relative: &resolved.relative,
            params: &resolved.params,
        };
        op.call(ctx).map_err(DispatchError::Operation)
    }
}
