//! Entity Contract
//!
//! Every kind the project stores at top level implements [`Entity`]:
//! an identity key, a merge with another instance of the same kind,
//! structural equality (`PartialEq`), and a textual rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Connection, EnvVar, Include, Pool, Requirement, Variable, Workflow};
use crate::error::Result;

/// Contract shared by all top-level entity kinds.
pub trait Entity: Clone + PartialEq + fmt::Debug {
    /// Identity under which the project stores this entity.
    type Key: Ord + Clone + fmt::Debug;

    /// Which project collection the entity belongs to.
    const KIND: EntityKind;

    fn key(&self) -> Self::Key;

    /// Combines `self` (the stored value) with `other` (the incoming one).
    ///
    /// Overwrite kinds return `other`; pools and workflows accumulate.
    fn merge(self, other: Self) -> Self;

    fn render(&self) -> String;

    /// Re-checks the constructor invariants, for values that did not go
    /// through a constructor (deserialized or mutated through public fields).
    fn validate(&self) -> Result<()>;
}

/// The collections a project keeps.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Workflows,
    Requirements,
    Pools,
    Connections,
    Variables,
    EnvVars,
    Includes,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Workflows => "workflows",
            Self::Requirements => "requirements",
            Self::Pools => "pools",
            Self::Connections => "connections",
            Self::Variables => "variables",
            Self::EnvVars => "env_vars",
            Self::Includes => "includes",
        };
        f.write_str(name)
    }
}

/// Any top-level entity, tagged by `kind` when serialized.
///
/// This is the shape entities take at dynamic boundaries (manifests,
/// heterogeneous batches from a translation pass).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnyEntity {
    Workflow(Workflow),
    Requirement(Requirement),
    Pool(Pool),
    Connection(Connection),
    Variable(Variable),
    EnvVar(EnvVar),
    Include(Include),
}

impl AnyEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Workflow(_) => EntityKind::Workflows,
            Self::Requirement(_) => EntityKind::Requirements,
            Self::Pool(_) => EntityKind::Pools,
            Self::Connection(_) => EntityKind::Connections,
            Self::Variable(_) => EntityKind::Variables,
            Self::EnvVar(_) => EntityKind::EnvVars,
            Self::Include(_) => EntityKind::Includes,
        }
    }

    /// Human-readable identity, used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Workflow(w) => format!("workflow '{}'", w.workflow_id),
            Self::Requirement(r) => r.to_string(),
            Self::Pool(p) => format!("pool '{}'", p.name),
            Self::Connection(c) => format!("connection '{}'", c.conn_id),
            Self::Variable(v) => format!("variable '{}'", v.key),
            Self::EnvVar(e) => format!("env var '{}'", e.key),
            Self::Include(i) => format!("include '{}'", i.filepath),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Workflow(w) => w.validate(),
            Self::Requirement(r) => r.validate(),
            Self::Pool(p) => p.validate(),
            Self::Connection(c) => c.validate(),
            Self::Variable(v) => v.validate(),
            Self::EnvVar(e) => e.validate(),
            Self::Include(i) => i.validate(),
        }
    }
}

macro_rules! impl_from_entity {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for AnyEntity {
                fn from(value: $variant) -> Self {
                    AnyEntity::$variant(value)
                }
            }
        )*
    };
}

impl_from_entity!(Workflow, Requirement, Pool, Connection, Variable, EnvVar, Include);
