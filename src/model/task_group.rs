//! Task Groups
//!
//! A named grouping of tasks. Groups nest: a group may contain further
//! groups to any depth.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::python;
use super::task::{render_block, validate_downstream, validate_tasks};
use super::{Extension, Node, Requirement, ResourceBuilder, Resources, TaskNode};
use crate::error::{require_key, Result};

/// Import every rendered group needs.
pub static TASK_GROUP_REQUIREMENT: Lazy<Requirement> = Lazy::new(|| {
    Requirement::builtin("apache-airflow", "airflow.utils.task_group", &["TaskGroup"])
});

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "GroupFields")]
pub struct TaskGroup {
    pub group_id: String,

    #[serde(default)]
    pub tasks: BTreeMap<String, TaskNode>,

    #[serde(flatten)]
    pub resources: Resources,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub downstream: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

/// Wire shape of a group; converting adds the `TaskGroup` import that
/// [`TaskGroup::new`] would have seeded.
#[derive(Deserialize)]
struct GroupFields {
    group_id: String,
    #[serde(default)]
    tasks: BTreeMap<String, TaskNode>,
    #[serde(flatten)]
    resources: Resources,
    #[serde(default)]
    downstream: BTreeSet<String>,
    #[serde(default)]
    extensions: Vec<Extension>,
}

impl From<GroupFields> for TaskGroup {
    fn from(fields: GroupFields) -> Self {
        Self {
            group_id: fields.group_id,
            tasks: fields.tasks,
            resources: fields.resources.with_import(TASK_GROUP_REQUIREMENT.clone()),
            downstream: fields.downstream,
            extensions: fields.extensions,
        }
    }
}

impl TaskGroup {
    pub fn new(group_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            group_id: require_key("TaskGroup", "group_id", &group_id.into())?,
            tasks: BTreeMap::new(),
            resources: Resources::default().with_import(TASK_GROUP_REQUIREMENT.clone()),
            downstream: BTreeSet::new(),
            extensions: Vec::new(),
        })
    }

    /// Adds a task or nested group, replacing any entry with the same id.
    pub fn with_task(mut self, node: impl Into<TaskNode>) -> Self {
        let node = node.into();
        self.tasks.insert(node.id().to_string(), node);
        self
    }

    pub fn with_downstream(mut self, id: impl Into<String>) -> Self {
        self.downstream.insert(id.into());
        self
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn render(&self) -> String {
        format!(
            "with TaskGroup(group_id={}) as {}:\n{}",
            python::string_literal(&self.group_id),
            python::identifier(&self.group_id),
            python::indent(&render_block(&self.tasks), 1)
        )
    }

    pub fn validate(&self) -> Result<()> {
        require_key("TaskGroup", "group_id", &self.group_id)?;
        self.resources.validate()?;
        self.extensions.iter().try_for_each(Extension::validate)?;
        validate_downstream(&self.group_id, &self.downstream)?;
        validate_tasks(&format!("group '{}'", self.group_id), &self.tasks)
    }
}

impl ResourceBuilder for TaskGroup {
    fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }
}

impl Node for TaskGroup {
    fn label(&self) -> String {
        format!("group:{}", self.group_id)
    }

    fn resources(&self) -> Option<&Resources> {
        Some(&self.resources)
    }

    /// Contained tasks first, then extensions.
    fn children(&self) -> Vec<&dyn Node> {
        self.tasks
            .values()
            .map(|t| t as &dyn Node)
            .chain(self.extensions.iter().map(|e| e as &dyn Node))
            .collect()
    }
}
