//! Workflow Data Model
//!
//! A workflow is the top-level unit of output: a schedule, metadata and a
//! graph of tasks, rendered to one Python DAG file.
//!
//! # Example YAML Format
//!
//! ```yaml
//! workflow_id: nightly_load
//! file_path: finance/nightly_load.py
//! source_file: jobs/nightly.xml
//! schedule:
//!   cron: "0 2 * * *"
//! tasks:
//!   extract:
//!     type: task
//!     task_id: extract
//!     operator: BashOperator
//!     params:
//!       bash_command: ./extract.sh
//!     pool:
//!       name: etl
//!       slots: 2
//!     downstream: [load]
//!   load:
//!     type: task
//!     task_id: load
//!     operator: BashOperator
//!     connections:
//!       - conn_id: warehouse
//!         conn_type: postgres
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{Entity, EntityKind};
use super::node::collect_imports;
use super::python;
use super::task::{render_block, validate_tasks};
use super::{Callback, Extension, Node, ResourceBuilder, Resources, Schedule, TaskNode};
use crate::error::{require_key, require_relative_path, Result};

/// Import lines every rendered workflow starts with.
const BASE_IMPORTS: [&str; 2] = [
    "from airflow import DAG",
    "from pendulum import DateTime, Timezone",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Workflow {
    pub workflow_id: String,

    /// Output path relative to the workflows directory; `<id>.py` if empty.
    #[serde(default)]
    pub file_path: String,

    /// Input file this workflow was translated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,

    #[serde(default)]
    pub start_date: NaiveDateTime,

    #[serde(default)]
    pub catchup: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub callbacks: BTreeMap<String, Callback>,

    #[serde(flatten)]
    pub resources: Resources,

    #[serde(default)]
    pub tasks: BTreeMap<String, TaskNode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

impl Workflow {
    pub fn new(workflow_id: impl Into<String>) -> Result<Self> {
        let workflow_id = require_key("Workflow", "workflow_id", &workflow_id.into())?;
        let file_path = format!("{}.py", workflow_id);
        require_relative_path("Workflow", &file_path)?;
        Ok(Self {
            file_path,
            workflow_id,
            source_file: None,
            schedule: None,
            start_date: NaiveDateTime::default(),
            catchup: false,
            description: None,
            params: BTreeMap::new(),
            callbacks: BTreeMap::new(),
            resources: Resources::default(),
            tasks: BTreeMap::new(),
            extensions: Vec::new(),
        })
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Result<Self> {
        let file_path = file_path.into();
        require_relative_path("Workflow", &file_path)?;
        self.file_path = file_path;
        Ok(self)
    }

    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDateTime) -> Self {
        self.start_date = start_date;
        self
    }

    pub fn with_catchup(mut self, catchup: bool) -> Self {
        self.catchup = catchup;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_callback(mut self, hook: impl Into<String>, callback: Callback) -> Self {
        self.callbacks.insert(hook.into(), callback);
        self
    }

    /// Adds a task or group, replacing any entry with the same id.
    pub fn with_task(mut self, node: impl Into<TaskNode>) -> Self {
        let node = node.into();
        self.tasks.insert(node.id().to_string(), node);
        self
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Path of the rendered file, relative to the workflows directory.
    pub fn relative_path(&self) -> String {
        if self.file_path.trim().is_empty() {
            format!("{}.py", self.workflow_id)
        } else {
            self.file_path.clone()
        }
    }

    /// File the workflow was translated from, for per-file reporting.
    pub fn origin(&self) -> String {
        self.source_file.clone().unwrap_or_else(|| self.relative_path())
    }

    /// The top-level task entries as walkable nodes.
    pub fn task_nodes(&self) -> Vec<&dyn Node> {
        self.tasks.values().map(|t| t as &dyn Node).collect()
    }

    /// Total number of tasks, including those inside groups.
    pub fn task_count(&self) -> usize {
        fn count(tasks: &BTreeMap<String, TaskNode>) -> usize {
            tasks
                .values()
                .map(|node| match node {
                    TaskNode::Task(_) => 1,
                    TaskNode::Group(g) => count(&g.tasks),
                })
                .sum()
        }
        count(&self.tasks)
    }

    fn import_lines(&self) -> BTreeSet<String> {
        let mut requirements = BTreeSet::new();
        for node in self.task_nodes() {
            collect_imports(node, &mut requirements);
        }
        collect_imports(self, &mut requirements);

        BASE_IMPORTS
            .iter()
            .map(|line| line.to_string())
            .chain(requirements.iter().filter_map(|r| r.import_line()))
            .collect()
    }

    fn dag_arguments(&self) -> Vec<String> {
        let start = &self.start_date;
        let mut args = vec![
            format!("dag_id={}", python::string_literal(&self.workflow_id)),
            format!(
                "schedule={}",
                self.schedule
                    .as_ref()
                    .map_or_else(|| "None".to_string(), Schedule::render)
            ),
            format!(
                "start_date=DateTime({}, {}, {}, {}, {}, {}, tzinfo=Timezone(\"UTC\"))",
                start.year(),
                start.month(),
                start.day(),
                start.hour(),
                start.minute(),
                start.second()
            ),
            format!("catchup={}", if self.catchup { "True" } else { "False" }),
        ];
        if let Some(description) = &self.description {
            args.push(format!("description={}", python::string_literal(description)));
        }
        if !self.params.is_empty() {
            let params = Value::Object(self.params.clone().into_iter().collect());
            args.push(format!("params={}", python::literal(&params)));
        }
        for (hook, callback) in &self.callbacks {
            args.push(format!("{}={}", hook, callback.render()));
        }
        args
    }
}

impl Entity for Workflow {
    type Key = String;
    const KIND: EntityKind = EntityKind::Workflows;

    fn key(&self) -> String {
        self.workflow_id.clone()
    }

    /// Combines two partial translations of the same workflow.
    ///
    /// Tasks, params and callbacks are unioned with `other` winning per
    /// key; `other`'s schedule and description win when present; the
    /// earliest start date is kept and catchup is on if either asked for it.
    /// File path and source file stay those of `self`.
    fn merge(mut self, other: Self) -> Self {
        self.tasks.extend(other.tasks);
        self.params.extend(other.params);
        self.callbacks.extend(other.callbacks);
        self.resources.absorb(other.resources);
        for extension in other.extensions {
            if !self.extensions.contains(&extension) {
                self.extensions.push(extension);
            }
        }
        if other.schedule.is_some() {
            self.schedule = other.schedule;
        }
        if other.description.is_some() {
            self.description = other.description;
        }
        if self.source_file.is_none() {
            self.source_file = other.source_file;
        }
        self.start_date = self.start_date.min(other.start_date);
        self.catchup |= other.catchup;
        self
    }

    fn render(&self) -> String {
        let imports: Vec<String> = self.import_lines().into_iter().collect();
        let args: Vec<String> = self
            .dag_arguments()
            .into_iter()
            .map(|arg| format!("    {},", arg))
            .collect();

        format!(
            "{}\n\nwith DAG(\n{}\n):\n{}\n",
            imports.join("\n"),
            args.join("\n"),
            python::indent(&render_block(&self.tasks), 1)
        )
    }

    fn validate(&self) -> Result<()> {
        require_key("Workflow", "workflow_id", &self.workflow_id)?;
        require_relative_path("Workflow", &self.relative_path())?;
        if let Some(schedule) = &self.schedule {
            schedule.validate()?;
        }
        self.callbacks.values().try_for_each(Callback::validate)?;
        self.resources.validate()?;
        self.extensions.iter().try_for_each(Extension::validate)?;
        validate_tasks(&format!("workflow '{}'", self.workflow_id), &self.tasks)
    }
}

impl ResourceBuilder for Workflow {
    fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }
}

/// The workflow as a walk root: its own resources, schedule, callbacks and
/// extensions. Tasks are walked separately through [`Workflow::task_nodes`].
impl Node for Workflow {
    fn label(&self) -> String {
        format!("workflow:{}", self.workflow_id)
    }

    fn resources(&self) -> Option<&Resources> {
        Some(&self.resources)
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut children: Vec<&dyn Node> = Vec::new();
        if let Some(schedule) = &self.schedule {
            children.push(schedule);
        }
        children.extend(self.callbacks.values().map(|c| c as &dyn Node));
        children.extend(self.extensions.iter().map(|e| e as &dyn Node));
        children
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Workflow(workflow_id={}, schedule={}, start_date={}, catchup={})",
            self.workflow_id,
            self.schedule
                .as_ref()
                .map_or_else(|| "None".to_string(), Schedule::render),
            self.start_date,
            if self.catchup { "True" } else { "False" }
        )
    }
}
