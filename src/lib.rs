//! DagPort - Workflow Project Aggregation Engine
//!
//! Collects the entities produced by translating workflows from another
//! scheduler (workflows, tasks, pools, connections, variables, env vars,
//! includes and package requirements) into one deduplicated, merged
//! [`Project`], and renders that project as a deployable directory.
//!
//! # Architecture
//!
//! - [`model`]: Entity types and the capability interface used for discovery
//! - [`project`]: The aggregator, the dependency walker and manifest loading
//! - [`output`]: Rendering, analysis and progress reporting
//! - [`config`]: Output layout and merge settings
//! - [`error`]: Error taxonomy
//!
//! # Example
//!
//! ```rust,no_run
//! use dagport::model::{Pool, ResourceBuilder, Task, Workflow};
//! use dagport::Project;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workflow = Workflow::new("nightly")?.with_task(
//!         Task::new("load", "BashOperator")?
//!             .with_param("bash_command", "./load.sh")
//!             .with_pool(Pool::new("etl", 2)?),
//!     );
//!
//!     let mut project = Project::new();
//!     project.add_workflows([workflow])?;
//!     project.render("output")?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod project;

// Re-export commonly used types
pub use config::{Config, RenderConfig};
pub use error::{Error, Result};
pub use model::{AnyEntity, Entity, EntityKind, Workflow};
pub use output::{AnalysisFormat, Renderer};
pub use project::{load_manifest, Manifest, Project};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "DagPort";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "DagPort");
    }

    #[test]
    fn test_module_exports_project() {
        let project = Project::new();
        assert!(project.is_empty());
    }

    #[test]
    fn test_module_exports_workflow() {
        let workflow = Workflow::new("w").unwrap();
        assert_eq!(workflow.key(), "w");
        assert_eq!(EntityKind::Workflows.to_string(), "workflows");
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }
}
