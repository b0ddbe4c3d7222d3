//! Project Aggregator
//!
//! [`Project`] owns every entity produced by the translation passes.
//! Each `add_*` operation inserts or merges according to the kind:
//!
//! | Kind | Collision behaviour |
//! |---|---|
//! | requirements | set insert, duplicates are no-ops |
//! | connections, variables, env vars, includes | last write wins |
//! | pools | slots combined by the configured [`PoolMerge`] |
//! | workflows | merged ([`Workflow`]'s `Entity::merge`) |
//!
//! Adding a workflow also walks its task graph and the workflow itself,
//! pulling every nested pool, connection, variable, env var, include and
//! requirement into the matching collection.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Add;
use std::path::Path;
use std::sync::Arc;

use super::walker::{DependencyWalker, Discovered};
use crate::config::{Config, RenderConfig};
use crate::error::{Error, Result};
use crate::model::{
    AnyEntity, Connection, Entity, EntityKind, EnvVar, Include, Node, Pool, PoolMerge,
    Requirement, Variable, Workflow,
};
use crate::output::analyzer::{analyze, AnalysisFormat};
use crate::output::renderer::{RenderSummary, Renderer};
use crate::output::reporter::{LogReporter, Reporter};

/// Everything needed to render a target project.
#[derive(Clone)]
pub struct Project {
    workflows: BTreeMap<String, Workflow>,
    requirements: BTreeSet<Requirement>,
    pools: BTreeMap<String, Pool>,
    connections: BTreeMap<String, Connection>,
    variables: BTreeMap<String, Variable>,
    env_vars: BTreeMap<String, EnvVar>,
    includes: BTreeMap<String, Include>,
    pool_merge: PoolMerge,
    walker: DependencyWalker,
    reporter: Arc<dyn Reporter>,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates a whole batch before any of it is applied.
fn validated<T: Entity>(items: impl IntoIterator<Item = T>) -> Result<Vec<T>> {
    let items: Vec<T> = items.into_iter().collect();
    items.iter().try_for_each(Entity::validate)?;
    Ok(items)
}

impl Project {
    pub fn new() -> Self {
        Self {
            workflows: BTreeMap::new(),
            requirements: BTreeSet::new(),
            pools: BTreeMap::new(),
            connections: BTreeMap::new(),
            variables: BTreeMap::new(),
            env_vars: BTreeMap::new(),
            includes: BTreeMap::new(),
            pool_merge: PoolMerge::default(),
            walker: DependencyWalker::default(),
            reporter: Arc::new(LogReporter),
        }
    }

    /// An empty project using the merge policy and depth bound from `config`.
    pub fn with_config(config: &Config) -> Self {
        Self {
            pool_merge: config.pool_merge,
            walker: DependencyWalker::new(config.max_depth),
            ..Self::new()
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_pool_merge(mut self, pool_merge: PoolMerge) -> Self {
        self.pool_merge = pool_merge;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.walker = DependencyWalker::new(max_depth);
        self
    }

    pub fn workflows(&self) -> &BTreeMap<String, Workflow> {
        &self.workflows
    }

    pub fn requirements(&self) -> &BTreeSet<Requirement> {
        &self.requirements
    }

    pub fn pools(&self) -> &BTreeMap<String, Pool> {
        &self.pools
    }

    pub fn connections(&self) -> &BTreeMap<String, Connection> {
        &self.connections
    }

    pub fn variables(&self) -> &BTreeMap<String, Variable> {
        &self.variables
    }

    pub fn env_vars(&self) -> &BTreeMap<String, EnvVar> {
        &self.env_vars
    }

    pub fn includes(&self) -> &BTreeMap<String, Include> {
        &self.includes
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    pub fn pool_merge(&self) -> PoolMerge {
        self.pool_merge
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
            && self.requirements.is_empty()
            && self.pools.is_empty()
            && self.connections.is_empty()
            && self.variables.is_empty()
            && self.env_vars.is_empty()
            && self.includes.is_empty()
    }

    pub fn add_requirements<I>(&mut self, requirements: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Requirement>,
    {
        let requirements = validated(requirements)?;
        self.insert_requirements(requirements);
        Ok(self)
    }

    pub fn add_pools<I>(&mut self, pools: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Pool>,
    {
        let pools = validated(pools)?;
        self.insert_pools(pools);
        Ok(self)
    }

    pub fn add_connections<I>(&mut self, connections: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Connection>,
    {
        let connections = validated(connections)?;
        overwrite(&mut self.connections, connections, self.reporter.as_ref());
        Ok(self)
    }

    pub fn add_variables<I>(&mut self, variables: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Variable>,
    {
        let variables = validated(variables)?;
        overwrite(&mut self.variables, variables, self.reporter.as_ref());
        Ok(self)
    }

    pub fn add_env_vars<I>(&mut self, env_vars: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = EnvVar>,
    {
        let env_vars = validated(env_vars)?;
        overwrite(&mut self.env_vars, env_vars, self.reporter.as_ref());
        Ok(self)
    }

    pub fn add_includes<I>(&mut self, includes: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Include>,
    {
        let includes = validated(includes)?;
        overwrite(&mut self.includes, includes, self.reporter.as_ref());
        Ok(self)
    }

    /// Adds workflows, merging into any stored workflow with the same id,
    /// then discovers everything nested in each added workflow.
    ///
    /// Each workflow is walked before anything is stored: if the walk fails
    /// the project is left as it was before that workflow.
    ///
    /// # Example
    ///
    /// ```
    /// use dagport::model::{Connection, Pool, ResourceBuilder, Task, Workflow};
    /// use dagport::Project;
    ///
    /// let workflow = Workflow::new("nightly").unwrap().with_task(
    ///     Task::new("load", "BashOperator")
    ///         .unwrap()
    ///         .with_pool(Pool::new("etl", 2).unwrap())
    ///         .with_connection(Connection::new("warehouse").unwrap()),
    /// );
    ///
    /// let mut project = Project::new();
    /// project.add_workflows([workflow]).unwrap();
    /// assert!(project.pools().contains_key("etl"));
    /// assert!(project.connections().contains_key("warehouse"));
    /// ```
    pub fn add_workflows<I>(&mut self, workflows: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Workflow>,
    {
        for workflow in workflows {
            workflow.validate()?;

            let mut found = Discovered::default();
            self.walker.walk(workflow.task_nodes(), &mut found)?;
            self.walker.walk([&workflow as &dyn Node], &mut found)?;

            self.insert_workflow(workflow);
            self.apply(found);
        }
        Ok(self)
    }

    /// Adds a batch of dynamically-typed entities that must all be of `kind`.
    ///
    /// A mismatched element fails the call before anything is added.
    pub fn add_batch(&mut self, kind: EntityKind, batch: Vec<AnyEntity>) -> Result<&mut Self> {
        if let Some(wrong) = batch.iter().find(|e| e.kind() != kind) {
            return Err(Error::validation(format!(
                "expected {} but got {}",
                kind,
                wrong.describe()
            )));
        }

        macro_rules! only {
            ($variant:ident) => {
                batch.into_iter().filter_map(|entity| match entity {
                    AnyEntity::$variant(value) => Some(value),
                    _ => None,
                })
            };
        }

        match kind {
            EntityKind::Workflows => self.add_workflows(only!(Workflow)),
            EntityKind::Requirements => self.add_requirements(only!(Requirement)),
            EntityKind::Pools => self.add_pools(only!(Pool)),
            EntityKind::Connections => self.add_connections(only!(Connection)),
            EntityKind::Variables => self.add_variables(only!(Variable)),
            EntityKind::EnvVars => self.add_env_vars(only!(EnvVar)),
            EntityKind::Includes => self.add_includes(only!(Include)),
        }
    }

    /// Adds a single entity of any kind.
    pub fn add_entity(&mut self, entity: AnyEntity) -> Result<&mut Self> {
        self.add_batch(entity.kind(), vec![entity])
    }

    /// Folds `other` into this project through the add-operations.
    ///
    /// `other`'s workflows are merged in without being walked again: its
    /// side collections already hold everything reachable from them, and
    /// adding both would count accumulating pools twice.
    pub fn extend(&mut self, other: Project) -> Result<&mut Self> {
        let Project {
            workflows,
            requirements,
            pools,
            connections,
            variables,
            env_vars,
            includes,
            ..
        } = other;

        let workflows = validated(workflows.into_values())?;
        for workflow in workflows {
            self.insert_workflow(workflow);
        }
        self.add_requirements(requirements)?;
        self.add_pools(pools.into_values())?;
        self.add_connections(connections.into_values())?;
        self.add_variables(variables.into_values())?;
        self.add_env_vars(env_vars.into_values())?;
        self.add_includes(includes.into_values())?;
        Ok(self)
    }

    /// Consuming form of [`Project::extend`].
    pub fn combine(mut self, other: Project) -> Result<Self> {
        self.extend(other)?;
        Ok(self)
    }

    /// Renders with the default layout, reporting through this project's reporter.
    pub fn render(&self, output_dir: impl AsRef<Path>) -> Result<RenderSummary> {
        Renderer::new(RenderConfig::default())
            .with_reporter(self.reporter.clone())
            .render(self, output_dir.as_ref())
    }

    /// Per-source-file workflow and task-type counts.
    pub fn analyze(&self, format: AnalysisFormat) -> Result<String> {
        analyze(self, format)
    }

    fn insert_workflow(&mut self, workflow: Workflow) {
        let id = workflow.key();
        let merged = match self.workflows.remove(&id) {
            Some(existing) => {
                self.reporter.debug(&format!("Merging workflow '{}'", id));
                existing.merge(workflow)
            }
            None => {
                self.reporter.debug(&format!("Adding workflow '{}'", id));
                workflow
            }
        };
        self.workflows.insert(id, merged);
    }

    fn insert_requirements(&mut self, requirements: Vec<Requirement>) {
        self.requirements.extend(requirements);
    }

    fn insert_pools(&mut self, pools: Vec<Pool>) {
        for pool in pools {
            let merged = match self.pools.remove(&pool.name) {
                Some(existing) => {
                    self.reporter.debug(&format!(
                        "Merging pool '{}' ({:?})",
                        pool.name, self.pool_merge
                    ));
                    existing.merge_with(pool, self.pool_merge)
                }
                None => pool,
            };
            self.pools.insert(merged.name.clone(), merged);
        }
    }

    fn apply(&mut self, found: Discovered) {
        let Discovered {
            pools,
            connections,
            variables,
            env_vars,
            includes,
            requirements,
        } = found;

        self.insert_pools(pools);
        overwrite(&mut self.connections, connections, self.reporter.as_ref());
        overwrite(&mut self.variables, variables, self.reporter.as_ref());
        overwrite(&mut self.env_vars, env_vars, self.reporter.as_ref());
        overwrite(&mut self.includes, includes, self.reporter.as_ref());
        self.insert_requirements(requirements);
    }
}

fn overwrite<T>(map: &mut BTreeMap<String, T>, items: Vec<T>, reporter: &dyn Reporter)
where
    T: Entity<Key = String>,
{
    for item in items {
        let key = item.key();
        if let Some(previous) = map.insert(key.clone(), item) {
            if map.get(&key) != Some(&previous) {
                reporter.debug(&format!("Overwriting {} '{}'", T::KIND, key));
            }
        }
    }
}

impl Add for Project {
    type Output = Result<Project>;

    fn add(self, other: Project) -> Self::Output {
        self.combine(other)
    }
}

/// Workflows compare by rendered text; everything else by value.
impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.workflows.len() == other.workflows.len()
            && self.workflows.iter().all(|(id, workflow)| {
                other
                    .workflows
                    .get(id)
                    .is_some_and(|o| o.render() == workflow.render())
            })
            && self.requirements == other.requirements
            && self.pools == other.pools
            && self.connections == other.connections
            && self.variables == other.variables
            && self.env_vars == other.env_vars
            && self.includes == other.includes
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn keys<V>(map: &BTreeMap<String, V>) -> String {
            map.keys().cloned().collect::<Vec<_>>().join(",")
        }
        let requirements: Vec<String> = self.requirements.iter().map(|r| r.to_string()).collect();
        write!(
            f,
            "Project(workflows=[{}], requirements=[{}], pools=[{}], connections=[{}], variables=[{}], env_vars=[{}], includes=[{}])",
            keys(&self.workflows),
            requirements.join(", "),
            keys(&self.pools),
            keys(&self.connections),
            keys(&self.variables),
            keys(&self.env_vars),
            keys(&self.includes),
        )
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("workflows", &self.workflows.keys().collect::<Vec<_>>())
            .field("requirements", &self.requirements)
            .field("pools", &self.pools)
            .field("connections", &self.connections)
            .field("variables", &self.variables)
            .field("env_vars", &self.env_vars)
            .field("includes", &self.includes)
            .field("pool_merge", &self.pool_merge)
            .finish()
    }
}
