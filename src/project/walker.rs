//! Dependency Walker
//!
//! Depth-first discovery of every pool, connection, variable, env var,
//! include and requirement reachable from a set of graph nodes, however
//! deeply nested (a callback's extension inside a task inside a group
//! inside a group...).
//!
//! The walk only reads: everything found is collected into [`Discovered`]
//! and handed back, so a failed walk never leaves a project half-updated.

use crate::error::{Error, Result};
use crate::model::{Connection, EnvVar, Include, Node, Pool, Requirement, Variable};

/// Default bound on nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Side entities found during a walk, in visiting order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovered {
    pub pools: Vec<Pool>,
    pub connections: Vec<Connection>,
    pub variables: Vec<Variable>,
    pub env_vars: Vec<EnvVar>,
    pub includes: Vec<Include>,
    pub requirements: Vec<Requirement>,
}

impl Discovered {
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
            && self.connections.is_empty()
            && self.variables.is_empty()
            && self.env_vars.is_empty()
            && self.includes.is_empty()
            && self.requirements.is_empty()
    }

    fn take_from(&mut self, node: &dyn Node) {
        if let Some(pool) = node.pool() {
            self.pools.push(pool.clone());
        }
        self.connections.extend_from_slice(node.connections());
        self.variables.extend_from_slice(node.variables());
        self.env_vars.extend_from_slice(node.env_vars());
        self.includes.extend_from_slice(node.includes());
        self.requirements.extend_from_slice(node.imports());
    }
}

/// Walks node graphs with a recursion bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyWalker {
    max_depth: usize,
}

impl Default for DependencyWalker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl DependencyWalker {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Walks each root in order, appending findings to `found`.
    ///
    /// Fails with [`Error::Structural`] if any branch nests deeper than the
    /// configured bound; roots are at depth 1.
    pub fn walk<'a, I>(&self, roots: I, found: &mut Discovered) -> Result<()>
    where
        I: IntoIterator<Item = &'a dyn Node>,
    {
        let mut path = Vec::new();
        for root in roots {
            self.visit(root, &mut path, found)?;
        }
        Ok(())
    }

    fn visit(&self, node: &dyn Node, path: &mut Vec<String>, found: &mut Discovered) -> Result<()> {
        path.push(node.label());
        if path.len() > self.max_depth {
            return Err(Error::Structural {
                limit: self.max_depth,
                path: path.join("/"),
            });
        }

        found.take_from(node);

        for child in node.children() {
            self.visit(child, path, found)?;
        }

        path.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Callback, Extension, ResourceBuilder, Schedule, Task, TaskGroup, TaskNode, Timetable,
        Workflow,
    };

    fn walk(roots: Vec<&dyn Node>) -> Result<Discovered> {
        let mut found = Discovered::default();
        DependencyWalker::default().walk(roots, &mut found)?;
        Ok(found)
    }

    #[test]
    fn test_finds_direct_resources() {
        let task = Task::new("t", "BashOperator")
            .unwrap()
            .with_pool(Pool::new("p1", 2).unwrap())
            .with_connection(Connection::new("c1").unwrap())
            .with_variable(Variable::new("v", "1").unwrap())
            .with_env_var(EnvVar::new("E", "1").unwrap())
            .with_include(Include::new("include/x.sql", "select 1").unwrap());

        let found = walk(vec![&task as &dyn Node]).unwrap();
        assert_eq!(found.pools.len(), 1);
        assert_eq!(found.connections[0].conn_id, "c1");
        assert_eq!(found.variables.len(), 1);
        assert_eq!(found.env_vars.len(), 1);
        assert_eq!(found.includes.len(), 1);
    }

    #[test]
    fn test_finds_deeply_nested_entities() {
        // extension of an extension of a callback on a task in a group in a group
        let deep = Extension::new("outer").with_child(
            Extension::new("inner").with_connection(Connection::new("deep").unwrap()),
        );
        let task = Task::new("t", "EmptyOperator").unwrap().with_callback(
            "on_failure_callback",
            Callback::new("alert").unwrap().with_extension(deep),
        );
        let group = TaskGroup::new("outer")
            .unwrap()
            .with_task(TaskGroup::new("inner").unwrap().with_task(task));
        let node = TaskNode::from(group);

        let found = walk(vec![&node as &dyn Node]).unwrap();
        let ids: Vec<&str> = found.connections.iter().map(|c| c.conn_id.as_str()).collect();
        assert_eq!(ids, vec!["deep"]);
        // both groups contribute the TaskGroup import
        assert_eq!(found.requirements.len(), 2);
    }

    #[test]
    fn test_workflow_root_covers_schedule() {
        let timetable = Timetable::new("MultiCronTimetable")
            .unwrap()
            .with_import(Requirement::new("croniter", "multi_cron_timetable", ["MultiCronTimetable"]).unwrap());
        let wf = Workflow::new("w")
            .unwrap()
            .with_schedule(Schedule::Timetable(timetable))
            .with_env_var(EnvVar::new("FOO", "bar").unwrap());

        let found = walk(vec![&wf as &dyn Node]).unwrap();
        assert_eq!(found.requirements.len(), 1);
        assert_eq!(found.env_vars.len(), 1);
    }

    #[test]
    fn test_depth_limit() {
        let mut ext = Extension::new("leaf");
        for i in 0..10 {
            ext = Extension::new(format!("level{}", i)).with_child(ext);
        }

        let mut found = Discovered::default();
        let err = DependencyWalker::new(5).walk([&ext as &dyn Node], &mut found).unwrap_err();
        match err {
            Error::Structural { limit, path } => {
                assert_eq!(limit, 5);
                assert!(path.starts_with("extension:level9/extension:level8"));
            }
            other => panic!("unexpected error {:?}", other),
        }

        let mut found = Discovered::default();
        assert!(DependencyWalker::new(11).walk([&ext as &dyn Node], &mut found).is_ok());
    }

    #[test]
    fn test_empty_walk() {
        let found = walk(Vec::new()).unwrap();
        assert!(found.is_empty());
    }
}
