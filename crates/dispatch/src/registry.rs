//! Operation registry.
//!
//! Rules in `meta.json` name their operation with a plain string (dotted
//! names like `weather.build_day` by convention). The registry maps those
//! names to statically registered implementations, populated at process
//! start; nothing is resolved by reflection.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::template::ParamSet;

/// Execution context handed to a dispatched operation.
///
/// The base directory is passed explicitly; operations resolve all file
/// I/O against it. The process working directory is never changed.
#[derive(Debug, Clone, Copy)]
pub struct OpContext<'a> {
    /// The matched base directory, joined to the archive root.
    pub base: &'a Path,
    /// Path segments remaining after the base.
    pub relative: &'a str,
    /// Extracted parameters plus the matched rule's extra fields.
    pub params: &'a ParamSet,
}

/// A callable operation bound to a rule.
///
/// Domain failures are reported as `anyhow::Error` and propagate unchanged
/// to the dispatch caller.
pub trait Operation: Send + Sync {
    fn call(&self, ctx: OpContext<'_>) -> anyhow::Result<Value>;
}

impl<F> Operation for F
where
    F: for<'a> Fn(OpContext<'a>) -> anyhow::Result<Value> + Send + Sync,
{
    fn call(&self, ctx: OpContext<'_>) -> anyhow::Result<Value> {
        self(ctx)
    }
}

/// Name → operation mapping.
#[derive(Default)]
pub struct OperationRegistry {
    ops: HashMap<String, Box<dyn Operation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation under a name; a later registration under the
    /// same name replaces the earlier one.
    pub fn register(&mut self, name: impl Into<String>, op: impl Operation + 'static) {
        self.ops.insert(name.into(), Box::new(op));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Operation> {
        self.ops.get(name).map(|b| b.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ops.keys().map(|k| k.as_str())
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("ops", &self.ops.keys().collect::<Vec<_>>())
            .finish()
    }
}
