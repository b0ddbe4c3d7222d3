//! Side Entities Carried by Graph Nodes
//!
//! Tasks, groups, callbacks, timetables, extensions and workflows may all
//! reference a pool and carry connections, variables, env vars, includes
//! and import requirements. [`Resources`] bundles those, and
//! [`ResourceBuilder`] gives every carrier the same `with_*` methods.

use serde::{Deserialize, Serialize};

use super::{Connection, Entity, EnvVar, Include, Pool, Requirement, Variable};
use crate::error::Result;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Resources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<Pool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_vars: Vec<EnvVar>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<Include>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<Requirement>,
}

/// Replaces the entry with the same key, or appends.
fn upsert<T: Entity>(items: &mut Vec<T>, item: T) {
    let key = item.key();
    match items.iter_mut().find(|existing| existing.key() == key) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_none()
            && self.connections.is_empty()
            && self.variables.is_empty()
            && self.env_vars.is_empty()
            && self.includes.is_empty()
            && self.imports.is_empty()
    }

    /// Folds `other` into `self`; entries with the same key are replaced by
    /// `other`'s. Absorbing the same bundle twice changes nothing.
    pub fn absorb(&mut self, other: Resources) {
        if other.pool.is_some() {
            self.pool = other.pool;
        }
        for conn in other.connections {
            upsert(&mut self.connections, conn);
        }
        for var in other.variables {
            upsert(&mut self.variables, var);
        }
        for env in other.env_vars {
            upsert(&mut self.env_vars, env);
        }
        for include in other.includes {
            upsert(&mut self.includes, include);
        }
        for import in other.imports {
            upsert(&mut self.imports, import);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(pool) = &self.pool {
            pool.validate()?;
        }
        self.connections.iter().try_for_each(Entity::validate)?;
        self.variables.iter().try_for_each(Entity::validate)?;
        self.env_vars.iter().try_for_each(Entity::validate)?;
        self.includes.iter().try_for_each(Entity::validate)?;
        self.imports.iter().try_for_each(Entity::validate)?;
        Ok(())
    }
}

/// Builder methods for anything that carries [`Resources`].
pub trait ResourceBuilder: Sized {
    fn resources_mut(&mut self) -> &mut Resources;

    fn with_pool(mut self, pool: Pool) -> Self {
        self.resources_mut().pool = Some(pool);
        self
    }

    fn with_connection(mut self, connection: Connection) -> Self {
        upsert(&mut self.resources_mut().connections, connection);
        self
    }

    fn with_variable(mut self, variable: Variable) -> Self {
        upsert(&mut self.resources_mut().variables, variable);
        self
    }

    fn with_env_var(mut self, env_var: EnvVar) -> Self {
        upsert(&mut self.resources_mut().env_vars, env_var);
        self
    }

    fn with_include(mut self, include: Include) -> Self {
        upsert(&mut self.resources_mut().includes, include);
        self
    }

    fn with_import(mut self, requirement: Requirement) -> Self {
        upsert(&mut self.resources_mut().imports, requirement);
        self
    }
}

impl ResourceBuilder for Resources {
    fn resources_mut(&mut self) -> &mut Resources {
        self
    }
}
