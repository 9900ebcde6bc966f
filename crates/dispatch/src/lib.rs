//! Resource addressing and dispatch for the weather archive.
//!
//! A logical path like `year/1990/3/14/temp` is resolved by walking the
//! archive directory tree from the root toward the leaf, consulting the
//! `meta.json` file at each level for rule tables that bind path templates
//! to named operations. The first rule whose template matches the remaining
//! path wins, and the bound operation is invoked with the matched base
//! directory, the relative path and the extracted parameters.
//!
//! The crate is deliberately synchronous: resolution is a handful of small
//! file reads and dispatch hands control straight to the operation.

pub mod archive;
pub mod error;
pub mod meta;
pub mod registry;
pub mod resolver;
pub mod template;

pub use archive::{Archive, BUILDS_KEY, GETS_KEY};
pub use error::{DispatchError, Result};
pub use meta::{MetaStore, MetadataRecord, NamedRule, Rule, RuleTable, META_FILENAME};
pub use registry::{OpContext, Operation, OperationRegistry};
pub use resolver::{ResolvedPath, Resolver};
pub use template::{ParamSet, PathTemplate};
