//! Tasks
//!
//! A [`Task`] is one operator instance inside a workflow. [`TaskNode`] is
//! what a workflow or group actually holds: either a task or a nested
//! [`TaskGroup`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::python;
use super::{Callback, Extension, Node, ResourceBuilder, Resources, TaskGroup};
use crate::error::{require_key, Error, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub task_id: String,

    /// Operator class name; also the task-type name in analysis reports.
    pub operator: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,

    #[serde(flatten)]
    pub resources: Resources,

    /// Callbacks keyed by hook argument name, e.g. `on_failure_callback`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub callbacks: BTreeMap<String, Callback>,

    /// Ids of tasks or groups that run after this one.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub downstream: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

impl Task {
    /// Creates a task.
    ///
    /// # Example
    ///
    /// ```
    /// use dagport::model::{Pool, ResourceBuilder, Task};
    ///
    /// let task = Task::new("extract", "BashOperator")
    ///     .unwrap()
    ///     .with_param("bash_command", "echo extract")
    ///     .with_pool(Pool::new("etl", 2).unwrap())
    ///     .with_downstream("load");
    /// assert_eq!(task.downstream.len(), 1);
    /// ```
    pub fn new(task_id: impl Into<String>, operator: impl Into<String>) -> Result<Self> {
        Ok(Self {
            task_id: require_key("Task", "task_id", &task_id.into())?,
            operator: require_key("Task", "operator", &operator.into())?,
            params: BTreeMap::new(),
            resources: Resources::default(),
            callbacks: BTreeMap::new(),
            downstream: BTreeSet::new(),
            extensions: Vec::new(),
        })
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_callback(mut self, hook: impl Into<String>, callback: Callback) -> Self {
        self.callbacks.insert(hook.into(), callback);
        self
    }

    pub fn with_downstream(mut self, task_id: impl Into<String>) -> Self {
        self.downstream.insert(task_id.into());
        self
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn render(&self) -> String {
        let mut args = vec![format!("task_id={}", python::string_literal(&self.task_id))];
        args.extend(python::kwargs(&self.params));
        if let Some(pool) = &self.resources.pool {
            args.push(format!("pool={}", python::string_literal(&pool.name)));
        }
        for (hook, callback) in &self.callbacks {
            args.push(format!("{}={}", hook, callback.render()));
        }
        format!(
            "{} = {}({})",
            python::identifier(&self.task_id),
            self.operator,
            args.join(", ")
        )
    }

    pub fn validate(&self) -> Result<()> {
        require_key("Task", "task_id", &self.task_id)?;
        require_key("Task", "operator", &self.operator)?;
        self.resources.validate()?;
        self.callbacks.values().try_for_each(Callback::validate)?;
        self.extensions.iter().try_for_each(Extension::validate)?;
        validate_downstream(&self.task_id, &self.downstream)
    }
}

pub(crate) fn validate_downstream(id: &str, downstream: &BTreeSet<String>) -> Result<()> {
    if downstream.iter().any(|d| d.trim().is_empty()) {
        return Err(Error::validation(format!(
            "'{}' lists an empty downstream id",
            id
        )));
    }
    if downstream.contains(id) {
        return Err(Error::validation(format!("'{}' lists itself downstream", id)));
    }
    Ok(())
}

impl ResourceBuilder for Task {
    fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }
}

impl Node for Task {
    fn label(&self) -> String {
        format!("task:{}", self.task_id)
    }

    fn resources(&self) -> Option<&Resources> {
        Some(&self.resources)
    }

    fn children(&self) -> Vec<&dyn Node> {
        self.callbacks
            .values()
            .map(|c| c as &dyn Node)
            .chain(self.extensions.iter().map(|e| e as &dyn Node))
            .collect()
    }
}

/// An entry in a workflow's or group's task collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskNode {
    Task(Task),
    Group(TaskGroup),
}

impl TaskNode {
    pub fn id(&self) -> &str {
        match self {
            Self::Task(t) => &t.task_id,
            Self::Group(g) => &g.group_id,
        }
    }

    /// Task-type name used when analyzing projects.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Task(t) => &t.operator,
            Self::Group(_) => "TaskGroup",
        }
    }

    pub fn downstream(&self) -> &BTreeSet<String> {
        match self {
            Self::Task(t) => &t.downstream,
            Self::Group(g) => &g.downstream,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Task(t) => t.render(),
            Self::Group(g) => g.render(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Task(t) => t.validate(),
            Self::Group(g) => g.validate(),
        }
    }

    fn as_node(&self) -> &dyn Node {
        match self {
            Self::Task(t) => t,
            Self::Group(g) => g,
        }
    }
}

impl From<Task> for TaskNode {
    fn from(task: Task) -> Self {
        TaskNode::Task(task)
    }
}

impl From<TaskGroup> for TaskNode {
    fn from(group: TaskGroup) -> Self {
        TaskNode::Group(group)
    }
}

impl Node for TaskNode {
    fn label(&self) -> String {
        self.as_node().label()
    }

    fn resources(&self) -> Option<&Resources> {
        self.as_node().resources()
    }

    fn children(&self) -> Vec<&dyn Node> {
        self.as_node().children()
    }
}

/// Checks that every entry is stored under its own id.
pub(crate) fn validate_tasks(owner: &str, tasks: &BTreeMap<String, TaskNode>) -> Result<()> {
    for (key, node) in tasks {
        if key != node.id() {
            return Err(Error::validation(format!(
                "{} stores '{}' under the key '{}'",
                owner,
                node.id(),
                key
            )));
        }
        node.validate()?;
    }
    Ok(())
}

/// Renders task definitions followed by their `>>` edges.
pub(crate) fn render_block(tasks: &BTreeMap<String, TaskNode>) -> String {
    if tasks.is_empty() {
        return "pass".to_string();
    }

    let mut lines: Vec<String> = tasks.values().map(TaskNode::render).collect();

    for node in tasks.values() {
        let downstream = node.downstream();
        if downstream.is_empty() {
            continue;
        }
        let targets: Vec<String> = downstream.iter().map(|d| python::identifier(d)).collect();
        let target = if targets.len() == 1 {
            targets[0].clone()
        } else {
            format!("[{}]", targets.join(", "))
        };
        lines.push(format!("{} >> {}", python::identifier(node.id()), target));
    }

    lines.join("\n")
}
