//! Environment variables, written to the environment file as `KEY=VALUE`.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use crate::error::{require_key, Error, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl EnvVar {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let env_var = Self {
            key: require_key("EnvVar", "key", &key.into())?,
            value: value.into(),
        };
        env_var.validate()?;
        Ok(env_var)
    }
}

impl Entity for EnvVar {
    type Key = String;
    const KIND: EntityKind = EntityKind::EnvVars;

    fn key(&self) -> String {
        self.key.clone()
    }

    fn merge(self, other: Self) -> Self {
        other
    }

    fn render(&self) -> String {
        format!("{}={}", self.key, self.value)
    }

    fn validate(&self) -> Result<()> {
        require_key("EnvVar", "key", &self.key)?;
        if self.key.contains('=') || self.key.chars().any(char::is_whitespace) {
            return Err(Error::validation(format!(
                "EnvVar key '{}' may not contain '=' or whitespace",
                self.key
            )));
        }
        if self.value.contains('\n') {
            return Err(Error::validation(format!(
                "EnvVar '{}' value spans multiple lines",
                self.key
            )));
        }
        Ok(())
    }
}
