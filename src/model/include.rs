//! Included files: arbitrary contents written verbatim at a relative path.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use crate::error::{require_relative_path, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub filepath: String,
    #[serde(default)]
    pub contents: String,
}

impl Include {
    pub fn new(filepath: impl Into<String>, contents: impl Into<String>) -> Result<Self> {
        let include = Self {
            filepath: filepath.into().trim().to_string(),
            contents: contents.into(),
        };
        include.validate()?;
        Ok(include)
    }
}

impl Entity for Include {
    type Key = String;
    const KIND: EntityKind = EntityKind::Includes;

    fn key(&self) -> String {
        self.filepath.clone()
    }

    fn merge(self, other: Self) -> Self {
        other
    }

    fn render(&self) -> String {
        self.contents.clone()
    }

    fn validate(&self) -> Result<()> {
        require_relative_path("Include", &self.filepath)
    }
}
