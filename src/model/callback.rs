//! Callbacks attached to tasks or workflows (`on_success_callback`, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::python;
use super::{Extension, Node, ResourceBuilder, Resources};
use crate::error::{require_key, Result};

/// A call to `function(**params)` fired by the runtime on a hook.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Callback {
    pub function: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,

    #[serde(flatten)]
    pub resources: Resources,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

impl Callback {
    pub fn new(function: impl Into<String>) -> Result<Self> {
        Ok(Self {
            function: require_key("Callback", "function", &function.into())?,
            params: BTreeMap::new(),
            resources: Resources::default(),
            extensions: Vec::new(),
        })
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn render(&self) -> String {
        format!("{}({})", self.function, python::kwargs(&self.params).join(", "))
    }

    pub fn validate(&self) -> Result<()> {
        require_key("Callback", "function", &self.function)?;
        self.resources.validate()?;
        self.extensions.iter().try_for_each(Extension::validate)
    }
}

impl ResourceBuilder for Callback {
    fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }
}

impl Node for Callback {
    fn label(&self) -> String {
        format!("callback:{}", self.function)
    }

    fn resources(&self) -> Option<&Resources> {
        Some(&self.resources)
    }

    fn children(&self) -> Vec<&dyn Node> {
        self.extensions.iter().map(|e| e as &dyn Node).collect()
    }
}
