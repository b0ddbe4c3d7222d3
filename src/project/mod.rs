//! Project Aggregation
//!
//! Collects translated entities into a single [`Project`].
//!
//! # Components
//!
//! - [`aggregator`]: The [`Project`] and its add/merge/combine operations
//! - [`walker`]: Depth-bounded discovery of entities nested in workflows
//! - [`manifest`]: Loading translator output from YAML

pub mod aggregator;
pub mod manifest;
pub mod walker;

pub use aggregator::Project;
pub use manifest::{load_manifest, Manifest};
pub use walker::{DependencyWalker, Discovered, DEFAULT_MAX_DEPTH};
