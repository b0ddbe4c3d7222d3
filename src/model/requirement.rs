//! Requirements
//!
//! A declared external dependency of generated code: the names imported,
//! the module they come from, the Python package providing it, and an
//! optional system package.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use crate::error::{Error, Result};

/// An import/package requirement.
///
/// `names` is a set so that two requirements importing the same names in a
/// different order are the same requirement.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Requirement {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub names: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sys_package: Option<String>,
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into().trim().to_string();
    (!value.is_empty()).then_some(value)
}

impl Requirement {
    /// A Python import provided by `package`.
    ///
    /// ```
    /// use dagport::model::Requirement;
    ///
    /// let req = Requirement::new("apache-airflow", "airflow.operators.bash", ["BashOperator"]).unwrap();
    /// assert_eq!(req.import_line().unwrap(), "from airflow.operators.bash import BashOperator");
    /// ```
    pub fn new<I, S>(package: impl Into<String>, module: impl Into<String>, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requirement = Self {
            names: names.into_iter().filter_map(non_empty).collect(),
            module: non_empty(module),
            package: non_empty(package),
            sys_package: None,
        };
        requirement.validate()?;
        Ok(requirement)
    }

    /// An import from a module that needs no package installed.
    pub fn module<I, S>(module: impl Into<String>, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("", module, names)
    }

    /// A system (OS-level) package with no Python import.
    pub fn system(sys_package: impl Into<String>) -> Result<Self> {
        let requirement = Self {
            names: BTreeSet::new(),
            module: None,
            package: None,
            sys_package: non_empty(sys_package),
        };
        requirement.validate()?;
        Ok(requirement)
    }

    /// Requirements the crate itself declares; inputs are known good.
    pub(crate) fn builtin(package: &str, module: &str, names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            module: non_empty(module),
            package: non_empty(package),
            sys_package: None,
        }
    }

    pub fn with_sys_package(mut self, sys_package: impl Into<String>) -> Self {
        self.sys_package = non_empty(sys_package);
        self
    }

    /// The Python import statement this requirement contributes, if any.
    pub fn import_line(&self) -> Option<String> {
        let module = self.module.as_deref()?;
        if self.names.is_empty() {
            return Some(format!("import {}", module));
        }
        let names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        Some(format!("from {} import {}", module, names.join(", ")))
    }
}

impl Entity for Requirement {
    type Key = Requirement;
    const KIND: EntityKind = EntityKind::Requirements;

    fn key(&self) -> Self::Key {
        self.clone()
    }

    fn merge(self, other: Self) -> Self {
        other
    }

    fn render(&self) -> String {
        self.import_line()
            .or_else(|| self.package.clone())
            .or_else(|| self.sys_package.clone())
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        if self.module.is_none() && self.package.is_none() && self.sys_package.is_none() {
            return Err(Error::validation(
                "Requirement needs a module, a package or a system package",
            ));
        }
        if !self.names.is_empty() && self.module.is_none() {
            return Err(Error::validation(format!(
                "Requirement imports {:?} but names no module",
                self.names
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        write!(
            f,
            "Requirement(names=[{}], package={}, module={}, sys_package={})",
            names.join(","),
            self.package.as_deref().unwrap_or("None"),
            self.module.as_deref().unwrap_or("None"),
            self.sys_package.as_deref().unwrap_or("None"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_order_is_not_identity() {
        let a = Requirement::new("pendulum", "pendulum", ["DateTime", "Timezone"]).unwrap();
        let b = Requirement::new("pendulum", "pendulum", ["Timezone", "DateTime"]).unwrap();
        assert_eq!(a, b);

        let set: HashSet<Requirement> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_import_lines() {
        let from = Requirement::new("croniter", "multi_cron_timetable", ["MultiCronTimetable"]).unwrap();
        assert_eq!(
            from.import_line().unwrap(),
            "from multi_cron_timetable import MultiCronTimetable"
        );

        let plain = Requirement::module("json", Vec::<String>::new()).unwrap();
        assert_eq!(plain.import_line().unwrap(), "import json");

        let sys = Requirement::system("libpq-dev").unwrap();
        assert!(sys.import_line().is_none());
        assert_eq!(sys.render(), "libpq-dev");
    }

    #[test]
    fn test_blank_requirement_rejected() {
        assert!(Requirement::new("", "", Vec::<String>::new()).is_err());
        assert!(Requirement::system("  ").is_err());
    }

    #[test]
    fn test_names_without_module_rejected() {
        assert!(Requirement::new("pkg", "", ["Thing"]).is_err());
    }

    #[test]
    fn test_with_sys_package() {
        let req = Requirement::new("psycopg2", "psycopg2", Vec::<String>::new())
            .unwrap()
            .with_sys_package("libpq-dev");
        assert_eq!(req.sys_package.as_deref(), Some("libpq-dev"));
        assert_eq!(req.package.as_deref(), Some("psycopg2"));
    }

    #[test]
    fn test_display() {
        let req = Requirement::new("apache-airflow", "airflow", ["DAG"]).unwrap();
        assert_eq!(
            req.to_string(),
            "Requirement(names=[DAG], package=apache-airflow, module=airflow, sys_package=None)"
        );
    }
}
