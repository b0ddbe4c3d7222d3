//! Project Renderer
//!
//! Writes an aggregated [`Project`] to disk:
//!
//! ```text
//! <output>/
//! ├── dags/<workflow file_path>     one per workflow
//! ├── requirements.txt              python packages, sorted
//! ├── packages.txt                  system packages, sorted
//! ├── airflow_settings.yaml         pools, variables, connections
//! ├── <include filepath>            one per include
//! └── .env                          KEY=VALUE lines
//! ```
//!
//! Every artifact except the workflow files is skipped when it would be
//! empty. Each file is written to a temporary sibling and renamed into
//! place, so a file on disk is always complete.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tempfile::{Builder, NamedTempFile};

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::model::connection::ConnectionRecord;
use crate::model::pool::PoolRecord;
use crate::model::variable::VariableRecord;
use crate::model::Entity;
use crate::project::Project;

use super::reporter::{LogReporter, Reporter};

/// Files written by one render, relative to the output directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSummary {
    pub workflows: Vec<PathBuf>,
    pub requirements: Option<PathBuf>,
    pub packages: Option<PathBuf>,
    pub settings: Option<PathBuf>,
    pub includes: Vec<PathBuf>,
    pub env: Option<PathBuf>,
}

impl RenderSummary {
    /// Every written path, in write order.
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.workflows.iter().map(PathBuf::as_path).collect();
        paths.extend(self.requirements.as_deref());
        paths.extend(self.packages.as_deref());
        paths.extend(self.settings.as_deref());
        paths.extend(self.includes.iter().map(PathBuf::as_path));
        paths.extend(self.env.as_deref());
        paths
    }

    pub fn file_count(&self) -> usize {
        self.paths().len()
    }
}

#[derive(Serialize)]
struct SettingsDocument<'a> {
    airflow: Settings<'a>,
}

#[derive(Serialize)]
struct Settings<'a> {
    connections: Vec<ConnectionRecord<'a>>,
    pools: Vec<PoolRecord<'a>>,
    variables: Vec<VariableRecord<'a>>,
}

pub struct Renderer {
    config: RenderConfig,
    reporter: Arc<dyn Reporter>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Renders `project` under `output_dir`.
    ///
    /// Fails with [`Error::EmptyProject`] before touching the filesystem if
    /// the project has no workflows. A failure part-way through leaves the
    /// files already written in place; rendering again completes them.
    pub fn render(&self, project: &Project, output_dir: &Path) -> Result<RenderSummary> {
        if project.workflows().is_empty() {
            return Err(Error::EmptyProject);
        }

        let mut summary = RenderSummary::default();
        self.render_workflows(project, output_dir, &mut summary)?;
        self.render_requirements(project, output_dir, &mut summary)?;
        self.render_settings(project, output_dir, &mut summary)?;
        self.render_includes(project, output_dir, &mut summary)?;
        self.render_env(project, output_dir, &mut summary)?;

        self.reporter.info(&format!(
            "Rendered {} file(s) to {}",
            summary.file_count(),
            output_dir.display()
        ));
        Ok(summary)
    }

    fn render_workflows(
        &self,
        project: &Project,
        output_dir: &Path,
        summary: &mut RenderSummary,
    ) -> Result<()> {
        let workflows_dir = self.config.workflows_dir.clone();
        self.reporter
            .info(&format!("Writing {}", output_dir.join(&workflows_dir).display()));

        for workflow in project.workflows().values() {
            let relative = workflows_dir.join(workflow.relative_path());
            self.reporter.debug(&format!("Writing {}", relative.display()));
            write_file(output_dir, &relative, &workflow.render())?;
            summary.workflows.push(relative);
        }
        Ok(())
    }

    fn render_requirements(
        &self,
        project: &Project,
        output_dir: &Path,
        summary: &mut RenderSummary,
    ) -> Result<()> {
        let packages = sorted_names(project, |r| r.package.as_deref());
        if packages.is_empty() {
            self.reporter.debug(&format!(
                "No python packages to write, skipping {}",
                self.config.requirements_file.display()
            ));
        } else {
            summary.requirements =
                Some(self.write_listed(output_dir, &self.config.requirements_file, &packages)?);
        }

        let sys_packages = sorted_names(project, |r| r.sys_package.as_deref());
        if sys_packages.is_empty() {
            self.reporter.debug(&format!(
                "No system packages to write, skipping {}",
                self.config.packages_file.display()
            ));
        } else {
            summary.packages =
                Some(self.write_listed(output_dir, &self.config.packages_file, &sys_packages)?);
        }
        Ok(())
    }

    fn render_settings(
        &self,
        project: &Project,
        output_dir: &Path,
        summary: &mut RenderSummary,
    ) -> Result<()> {
        if project.pools().is_empty()
            && project.variables().is_empty()
            && project.connections().is_empty()
        {
            self.reporter.debug(&format!(
                "No pools, variables or connections to write, skipping {}",
                self.config.settings_file.display()
            ));
            return Ok(());
        }

        let document = SettingsDocument {
            airflow: Settings {
                connections: project.connections().values().map(|c| c.record()).collect(),
                pools: project.pools().values().map(|p| p.record()).collect(),
                variables: project.variables().values().map(|v| v.record()).collect(),
            },
        };
        let content = serde_yaml::to_string(&document)?;

        let relative = self.config.settings_file.clone();
        self.reporter
            .info(&format!("Writing {}", output_dir.join(&relative).display()));
        write_file(output_dir, &relative, &content)?;
        summary.settings = Some(relative);
        Ok(())
    }

    fn render_includes(
        &self,
        project: &Project,
        output_dir: &Path,
        summary: &mut RenderSummary,
    ) -> Result<()> {
        if project.includes().is_empty() {
            self.reporter.debug("No files to include");
            return Ok(());
        }

        for include in project.includes().values() {
            let relative = PathBuf::from(&include.filepath);
            self.reporter
                .info(&format!("Writing {}", output_dir.join(&relative).display()));
            write_file(output_dir, &relative, &include.render())?;
            summary.includes.push(relative);
        }
        Ok(())
    }

    fn render_env(
        &self,
        project: &Project,
        output_dir: &Path,
        summary: &mut RenderSummary,
    ) -> Result<()> {
        if project.env_vars().is_empty() {
            self.reporter.debug(&format!(
                "No entries for {}",
                self.config.env_file.display()
            ));
            return Ok(());
        }

        let lines: Vec<String> = project.env_vars().values().map(Entity::render).collect();
        let relative = self.config.env_file.clone();
        self.reporter
            .info(&format!("Writing {}", output_dir.join(&relative).display()));
        write_file(output_dir, &relative, &lines.join("\n"))?;
        summary.env = Some(relative);
        Ok(())
    }

    fn write_listed(
        &self,
        output_dir: &Path,
        relative: &Path,
        names: &BTreeSet<&str>,
    ) -> Result<PathBuf> {
        self.reporter
            .info(&format!("Writing {}", output_dir.join(relative).display()));
        let content = names.iter().copied().collect::<Vec<_>>().join("\n");
        write_file(output_dir, relative, &content)?;
        Ok(relative.to_path_buf())
    }
}

/// Distinct non-empty names picked from the project's requirements.
fn sorted_names<'a, F>(project: &'a Project, pick: F) -> BTreeSet<&'a str>
where
    F: Fn(&'a crate::model::Requirement) -> Option<&'a str>,
{
    project
        .requirements()
        .iter()
        .filter_map(pick)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Mode requested for rendered files before the umask applies, matching a
/// plain `fs::write`.
#[cfg(unix)]
const FILE_MODE: u32 = 0o666;

fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(FILE_MODE));
    }
    builder.tempfile_in(dir)
}

/// Writes `contents` to `output_dir/relative` via a temporary file in the
/// same directory, creating parents as needed.
fn write_file(output_dir: &Path, relative: &Path, contents: &str) -> Result<()> {
    let path = output_dir.join(relative);
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(output_dir);
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let mut file = temp_file_in(parent).map_err(|e| Error::io(parent, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| Error::io(&path, e))?;
    file.persist(&path).map_err(|e| Error::io(&path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Connection, EnvVar, Include, Pool, Requirement, ResourceBuilder, Task, Variable, Workflow,
    };
    use crate::output::reporter::{MemoryReporter, ReportLevel};
    use tempfile::tempdir;

    fn workflow(id: &str) -> Workflow {
        Workflow::new(id)
            .unwrap()
            .with_task(Task::new("t", "EmptyOperator").unwrap())
    }

    fn read(dir: &Path, relative: &str) -> String {
        fs::read_to_string(dir.join(relative)).unwrap()
    }

    #[test]
    fn test_empty_project_writes_nothing() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");

        let mut project = Project::new();
        project.add_pools([Pool::new("p", 1).unwrap()]).unwrap();

        let err = Renderer::default().render(&project, &out).unwrap_err();
        assert!(matches!(err, Error::EmptyProject));
        assert!(!out.exists());
    }

    #[test]
    fn test_workflow_only_project() {
        let dir = tempdir().unwrap();
        let mut project = Project::new();
        project.add_workflows([workflow("w")]).unwrap();

        let reporter = Arc::new(MemoryReporter::new());
        let summary = Renderer::default()
            .with_reporter(reporter.clone())
            .render(&project, dir.path())
            .unwrap();

        assert_eq!(summary.workflows, vec![PathBuf::from("dags/w.py")]);
        assert_eq!(summary.file_count(), 1);
        assert_eq!(read(dir.path(), "dags/w.py"), project.workflows()["w"].render());
        assert!(!dir.path().join("requirements.txt").exists());
        assert!(!dir.path().join("packages.txt").exists());
        assert!(!dir.path().join("airflow_settings.yaml").exists());
        assert!(!dir.path().join(".env").exists());

        let skipped = reporter.messages(ReportLevel::Debug);
        assert!(skipped.iter().any(|m| m.contains("skipping requirements.txt")));
        assert!(skipped.iter().any(|m| m.contains("No files to include")));
    }

    #[test]
    fn test_nested_workflow_path() {
        let dir = tempdir().unwrap();
        let mut project = Project::new();
        project
            .add_workflows([workflow("w").with_file_path("team/a/w.py").unwrap()])
            .unwrap();

        project.render(dir.path()).unwrap();
        assert!(dir.path().join("dags/team/a/w.py").is_file());
    }

    #[test]
    fn test_package_manifests_sorted_and_deduplicated() {
        let dir = tempdir().unwrap();
        let mut project = Project::new();
        project
            .add_workflows([workflow("w")])
            .unwrap()
            .add_requirements([
                Requirement::new("zeta", "z", ["Z"]).unwrap(),
                Requirement::new("alpha", "a", ["A"]).unwrap(),
                Requirement::new("alpha", "a2", ["B"]).unwrap(),
                Requirement::system("libpq-dev").unwrap(),
                Requirement::module("os", ["path"]).unwrap(),
            ])
            .unwrap();

        let summary = project.render(dir.path()).unwrap();
        assert_eq!(read(dir.path(), "requirements.txt"), "alpha\nzeta");
        assert_eq!(read(dir.path(), "packages.txt"), "libpq-dev");
        assert_eq!(summary.packages, Some(PathBuf::from("packages.txt")));
    }

    #[test]
    fn test_settings_document() {
        let dir = tempdir().unwrap();
        let mut project = Project::new();
        project
            .add_workflows([workflow("w")])
            .unwrap()
            .add_pools([Pool::new("p1", 5).unwrap().with_description("shared")])
            .unwrap()
            .add_connections([Connection::new("c1").unwrap().with_extra("host", "db")])
            .unwrap()
            .add_variables([Variable::new("env", "prod").unwrap()])
            .unwrap();

        project.render(dir.path()).unwrap();
        let document: serde_yaml::Value =
            serde_yaml::from_str(&read(dir.path(), "airflow_settings.yaml")).unwrap();
        let airflow = &document["airflow"];

        assert_eq!(airflow["pools"][0]["pool_name"], "p1");
        assert_eq!(airflow["pools"][0]["pool_slot"], 5);
        assert_eq!(airflow["pools"][0]["pool_description"], "shared");
        assert_eq!(airflow["connections"][0]["conn_id"], "c1");
        assert_eq!(airflow["connections"][0]["conn_type"], "generic");
        assert_eq!(airflow["connections"][0]["host"], "db");
        assert_eq!(airflow["variables"][0]["variable_name"], "env");
        assert_eq!(airflow["variables"][0]["variable_value"], "prod");
    }

    #[test]
    fn test_single_env_var_is_one_line() {
        let dir = tempdir().unwrap();
        let mut project = Project::new();
        let env = EnvVar::new("FOO", "bar").unwrap();
        project
            .add_workflows([workflow("w")])
            .unwrap()
            .add_env_vars([env.clone()])
            .unwrap();

        project.render(dir.path()).unwrap();
        let content = read(dir.path(), ".env");
        assert_eq!(content.lines().collect::<Vec<_>>(), vec![env.render().as_str()]);
    }

    #[test]
    fn test_includes_written_at_their_path() {
        let dir = tempdir().unwrap();
        let mut project = Project::new();
        project
            .add_workflows([workflow("w").with_include(Include::new("include/q.sql", "select 1").unwrap())])
            .unwrap();

        let summary = project.render(dir.path()).unwrap();
        assert_eq!(read(dir.path(), "include/q.sql"), "select 1");
        assert_eq!(summary.includes, vec![PathBuf::from("include/q.sql")]);
    }

    #[test]
    fn test_custom_layout() {
        let dir = tempdir().unwrap();
        let config = RenderConfig {
            workflows_dir: PathBuf::from("workflows"),
            env_file: PathBuf::from("config/airflow.env"),
            ..RenderConfig::default()
        };
        let mut project = Project::new();
        project
            .add_workflows([workflow("w").with_env_var(EnvVar::new("A", "1").unwrap())])
            .unwrap();

        Renderer::new(config).render(&project, dir.path()).unwrap();
        assert!(dir.path().join("workflows/w.py").is_file());
        assert_eq!(read(dir.path(), "config/airflow.env"), "A=1");
    }

    #[test]
    fn test_end_to_end_render() {
        let dir = tempdir().unwrap();
        let one = Workflow::new("one").unwrap().with_task(
            Task::new("t1", "BashOperator")
                .unwrap()
                .with_pool(Pool::new("p1", 2).unwrap())
                .with_connection(Connection::new("c1").unwrap()),
        );
        let two = Workflow::new("two").unwrap().with_task(
            Task::new("t2", "BashOperator")
                .unwrap()
                .with_pool(Pool::new("p1", 3).unwrap()),
        );

        let mut project = Project::new();
        project.add_workflows([one, two]).unwrap();
        let summary = project.render(dir.path()).unwrap();

        assert_eq!(summary.workflows.len(), 2);
        assert!(dir.path().join("dags/one.py").is_file());
        assert!(dir.path().join("dags/two.py").is_file());
        assert!(!dir.path().join("requirements.txt").exists());

        let settings = read(dir.path(), "airflow_settings.yaml");
        assert!(settings.contains("pool_name: p1"));
        assert!(settings.contains("pool_slot: 5"));
        assert!(settings.contains("conn_id: c1"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let build = || {
            let mut project = Project::new();
            project
                .add_workflows([workflow("b"), workflow("a")])
                .unwrap()
                .add_requirements([
                    Requirement::new("y", "y", ["Y"]).unwrap(),
                    Requirement::new("x", "x", ["X"]).unwrap(),
                ])
                .unwrap()
                .add_env_vars([EnvVar::new("B", "2").unwrap(), EnvVar::new("A", "1").unwrap()])
                .unwrap();
            project
        };

        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let summary = build().render(first.path()).unwrap();
        build().render(second.path()).unwrap();

        for path in summary.paths() {
            assert_eq!(
                fs::read(first.path().join(path)).unwrap(),
                fs::read(second.path().join(path)).unwrap(),
                "{} differs",
                path.display()
            );
        }
        assert_eq!(read(first.path(), ".env"), "A=1\nB=2");
    }

    #[cfg(unix)]
    #[test]
    fn test_rendered_files_follow_umask() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let mut project = Project::new();
        project
            .add_workflows([workflow("w").with_env_var(EnvVar::new("A", "1").unwrap())])
            .unwrap();
        project.render(dir.path()).unwrap();

        // a plain write in the same directory gets the umask-derived mode
        let reference = dir.path().join("reference.txt");
        fs::write(&reference, "x").unwrap();
        let expected = fs::metadata(&reference).unwrap().permissions().mode() & 0o777;

        for relative in ["dags/w.py", ".env"] {
            let mode = fs::metadata(dir.path().join(relative)).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, expected, "{} has mode {:o}", relative, mode);
        }
    }

    #[test]
    fn test_rerender_overwrites() {
        let dir = tempdir().unwrap();
        let mut project = Project::new();
        project.add_workflows([workflow("w")]).unwrap();
        project.render(dir.path()).unwrap();
        project.render(dir.path()).unwrap();
        assert_eq!(read(dir.path(), "dags/w.py"), project.workflows()["w"].render());
    }
}
