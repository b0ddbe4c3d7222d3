//! Runtime variables, keyed by `key` and overwritten on collision.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use crate::error::{require_key, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Settings document record for a variable.
#[derive(Serialize, Debug)]
pub struct VariableRecord<'a> {
    pub variable_name: &'a str,
    pub variable_value: &'a str,
}

impl Variable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        Ok(Self {
            key: require_key("Variable", "key", &key.into())?,
            value: value.into(),
        })
    }

    pub fn record(&self) -> VariableRecord<'_> {
        VariableRecord {
            variable_name: &self.key,
            variable_value: &self.value,
        }
    }
}

impl Entity for Variable {
    type Key = String;
    const KIND: EntityKind = EntityKind::Variables;

    fn key(&self) -> String {
        self.key.clone()
    }

    fn merge(self, other: Self) -> Self {
        other
    }

    fn render(&self) -> String {
        serde_yaml::to_string(&self.record()).unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        require_key("Variable", "key", &self.key).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let var = Variable::new("foo", "bar").unwrap();
        let text = var.render();
        assert!(text.contains("variable_name: foo"));
        assert!(text.contains("variable_value: bar"));
    }

    #[test]
    fn test_merge_overwrites() {
        let a = Variable::new("foo", "1").unwrap();
        let b = Variable::new("foo", "2").unwrap();
        assert_eq!(a.merge(b).value, "2");
    }
}
