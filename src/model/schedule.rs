//! Workflow schedules: a plain cron expression or a timetable object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::python;
use super::{Extension, Node, ResourceBuilder, Resources};
use crate::error::{require_key, Result};

/// Written as a single-key map, `cron: "@daily"` or `timetable: {...}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "ScheduleFields", into = "ScheduleFields")]
pub enum Schedule {
    /// Cron expression or preset such as `@daily`.
    Cron(String),
    Timetable(Timetable),
}

/// Plain map form of [`Schedule`]; YAML enum tags are not required.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScheduleFields {
    Cron { cron: String },
    Timetable { timetable: Timetable },
}

impl From<ScheduleFields> for Schedule {
    fn from(fields: ScheduleFields) -> Self {
        match fields {
            ScheduleFields::Cron { cron } => Schedule::Cron(cron),
            ScheduleFields::Timetable { timetable } => Schedule::Timetable(timetable),
        }
    }
}

impl From<Schedule> for ScheduleFields {
    fn from(schedule: Schedule) -> Self {
        match schedule {
            Schedule::Cron(cron) => ScheduleFields::Cron { cron },
            Schedule::Timetable(timetable) => ScheduleFields::Timetable { timetable },
        }
    }
}

/// A custom timetable class; may need a package and ship include files.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Timetable {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,

    #[serde(flatten)]
    pub resources: Resources,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

impl Timetable {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: require_key("Timetable", "name", &name.into())?,
            params: BTreeMap::new(),
            resources: Resources::default(),
            extensions: Vec::new(),
        })
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl ResourceBuilder for Timetable {
    fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }
}

impl Schedule {
    pub fn cron(expression: impl Into<String>) -> Result<Self> {
        Ok(Self::Cron(require_key("Schedule", "cron", &expression.into())?))
    }

    /// The value passed as the workflow's `schedule=` argument.
    pub fn render(&self) -> String {
        match self {
            Self::Cron(expression) => python::string_literal(expression),
            Self::Timetable(t) => {
                format!("{}({})", t.name, python::kwargs(&t.params).join(", "))
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Cron(expression) => require_key("Schedule", "cron", expression).map(|_| ()),
            Self::Timetable(t) => {
                require_key("Timetable", "name", &t.name)?;
                t.resources.validate()?;
                t.extensions.iter().try_for_each(Extension::validate)
            }
        }
    }
}

impl Node for Schedule {
    fn label(&self) -> String {
        match self {
            Self::Cron(_) => "schedule:cron".to_string(),
            Self::Timetable(t) => format!("schedule:{}", t.name),
        }
    }

    fn resources(&self) -> Option<&Resources> {
        match self {
            Self::Cron(_) => None,
            Self::Timetable(t) => Some(&t.resources),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        match self {
            Self::Cron(_) => Vec::new(),
            Self::Timetable(t) => t.extensions.iter().map(|e| e as &dyn Node).collect(),
        }
    }
}
