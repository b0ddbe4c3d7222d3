//! Manifest Loader
//!
//! A manifest is the YAML hand-off from the translator: an ordered list of
//! passes, each mapping an entity kind to the entities that pass produced.
//!
//! ```yaml
//! passes:
//!   - workflows:
//!       - kind: workflow
//!         workflow_id: nightly
//!         tasks:
//!           load:
//!             type: task
//!             task_id: load
//!             operator: BashOperator
//!   - pools:
//!       - kind: pool
//!         name: etl
//!         slots: 2
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::aggregator::Project;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{AnyEntity, EntityKind};
use crate::output::reporter::Reporter;

/// One translator pass: batches of entities keyed by kind.
///
/// Batches are applied in the order they appear in the manifest, so a
/// later `connections` batch overwrites connections discovered from an
/// earlier `workflows` batch and vice versa.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pass(pub Vec<(EntityKind, Vec<AnyEntity>)>);

impl Pass {
    pub fn entity_count(&self) -> usize {
        self.0.iter().map(|(_, batch)| batch.len()).sum()
    }
}

impl Serialize for Pass {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (kind, batch) in &self.0 {
            map.serialize_entry(kind, batch)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Pass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PassVisitor;

        impl<'de> Visitor<'de> for PassVisitor {
            type Value = Pass;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of entity kind to entity list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Pass, A::Error> {
                let mut batches = Vec::new();
                while let Some(entry) = map.next_entry::<EntityKind, Vec<AnyEntity>>()? {
                    batches.push(entry);
                }
                Ok(Pass(batches))
            }
        }

        deserializer.deserialize_map(PassVisitor)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    #[serde(default)]
    pub passes: Vec<Pass>,
}

/// Loads a manifest from a YAML file.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Manifest> {
    let path = path.as_ref();
    info!("Loading manifest from {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let manifest = Manifest::from_yaml(&content)?;

    info!(
        "Loaded {} pass(es), {} entities",
        manifest.passes.len(),
        manifest.entity_count()
    );
    Ok(manifest)
}

impl Manifest {
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn entity_count(&self) -> usize {
        self.passes.iter().map(Pass::entity_count).sum()
    }

    /// Applies every pass, in order, to `project` through [`Project::add_batch`].
    pub fn apply_to(self, project: &mut Project) -> Result<()> {
        for (index, pass) in self.passes.into_iter().enumerate() {
            debug!("Applying pass {}", index + 1);
            for (kind, batch) in pass.0 {
                project.reporter().debug(&format!(
                    "Pass {}: adding {} {}",
                    index + 1,
                    batch.len(),
                    kind
                ));
                project.add_batch(kind, batch)?;
            }
        }
        Ok(())
    }

    /// Builds a fresh project from the manifest.
    pub fn into_project(self, config: &Config) -> Result<Project> {
        let mut project = Project::with_config(config);
        self.apply_to(&mut project)?;
        Ok(project)
    }

    /// Like [`Manifest::into_project`], reporting through `reporter`.
    pub fn into_project_with(
        self,
        config: &Config,
        reporter: std::sync::Arc<dyn Reporter>,
    ) -> Result<Project> {
        let mut project = Project::with_config(config).with_reporter(reporter);
        self.apply_to(&mut project)?;
        Ok(project)
    }
}
