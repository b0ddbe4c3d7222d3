//! Graph Node Capability Interface
//!
//! Every element of a workflow graph (task, group, callback, schedule,
//! extension, the workflow itself) implements [`Node`]. The dependency
//! walker only ever talks to nodes through this trait: a fixed set of
//! accessors for the side entities a node carries, plus the explicit list
//! of child nodes it declares.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Connection, EnvVar, Include, Pool, Requirement, ResourceBuilder, Resources, Variable};
use crate::error::Result;

pub trait Node {
    /// Short name used in walk paths and diagnostics, e.g. `task:extract`.
    fn label(&self) -> String;

    /// Side entities carried directly by this node.
    fn resources(&self) -> Option<&Resources> {
        None
    }

    /// Child nodes the walker descends into.
    fn children(&self) -> Vec<&dyn Node> {
        Vec::new()
    }

    fn pool(&self) -> Option<&Pool> {
        self.resources().and_then(|r| r.pool.as_ref())
    }

    fn connections(&self) -> &[Connection] {
        self.resources().map(|r| r.connections.as_slice()).unwrap_or(&[])
    }

    fn variables(&self) -> &[Variable] {
        self.resources().map(|r| r.variables.as_slice()).unwrap_or(&[])
    }

    fn env_vars(&self) -> &[EnvVar] {
        self.resources().map(|r| r.env_vars.as_slice()).unwrap_or(&[])
    }

    fn includes(&self) -> &[Include] {
        self.resources().map(|r| r.includes.as_slice()).unwrap_or(&[])
    }

    fn imports(&self) -> &[Requirement] {
        self.resources().map(|r| r.imports.as_slice()).unwrap_or(&[])
    }
}

/// Gathers the import requirements of `node` and everything below it.
pub fn collect_imports(node: &dyn Node, out: &mut BTreeSet<Requirement>) {
    out.extend(node.imports().iter().cloned());
    for child in node.children() {
        collect_imports(child, out);
    }
}

/// A custom field attached to a task, callback, timetable or workflow.
///
/// Extensions carry their own resources and may nest further extensions,
/// so translators can hang entities at any depth without a dedicated type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Extension {
    pub name: String,

    #[serde(flatten)]
    pub resources: Resources,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Extension>,
}

impl Extension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_child(mut self, child: Extension) -> Self {
        self.children.push(child);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.resources.validate()?;
        self.children.iter().try_for_each(Extension::validate)
    }
}

impl ResourceBuilder for Extension {
    fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }
}

impl Node for Extension {
    fn label(&self) -> String {
        format!("extension:{}", self.name)
    }

    fn resources(&self) -> Option<&Resources> {
        Some(&self.resources)
    }

    fn children(&self) -> Vec<&dyn Node> {
        self.children.iter().map(|c| c as &dyn Node).collect()
    }
}
