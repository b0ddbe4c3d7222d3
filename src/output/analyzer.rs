//! Project Analysis
//!
//! Summarises a project per source file: how many workflows came from each
//! file and how many top-level tasks of each type they hold. A `Totals` row
//! closes the table.
//!
//! ```text
//! | file   | Workflows | EmptyOperator |
//! |--------|-----------|---------------|
//! | a.xml  | 1         | 1             |
//! | b.xml  | 1         | 1             |
//! | Totals | 2         | 2             |
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::project::Project;

/// Header of the first column.
pub const LABEL_COLUMN: &str = "file";

/// Header of the workflow-count column.
pub const WORKFLOWS_COLUMN: &str = "Workflows";

/// Label of the closing row.
pub const TOTALS_LABEL: &str = "Totals";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisFormat {
    /// Markdown pipe table.
    #[default]
    Md,
    /// JSON list of records.
    Json,
    Csv,
}

impl FromStr for AnalysisFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Md),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(Error::validation(format!(
                "unknown analysis format '{}' (expected md, json or csv)",
                other
            ))),
        }
    }
}

impl fmt::Display for AnalysisFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Md => "md",
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}

/// Counts for one source file, or for the totals row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisRow {
    pub label: String,
    pub workflows: usize,
    pub task_types: BTreeMap<String, usize>,
}

impl AnalysisRow {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    fn absorb(&mut self, other: &AnalysisRow) {
        self.workflows += other.workflows;
        for (task_type, count) in &other.task_types {
            *self.task_types.entry(task_type.clone()).or_insert(0) += count;
        }
    }

    /// Cell text for each column; task types this row lacks are blank.
    fn cells(&self, task_types: &[String]) -> Vec<String> {
        let mut cells = vec![self.label.clone(), self.workflows.to_string()];
        cells.extend(task_types.iter().map(|t| {
            self.task_types
                .get(t)
                .map(ToString::to_string)
                .unwrap_or_default()
        }));
        cells
    }
}

/// Per-file summary of a project.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub rows: Vec<AnalysisRow>,
    pub totals: AnalysisRow,
}

impl Analysis {
    pub fn from_project(project: &Project) -> Self {
        let mut by_file: BTreeMap<String, AnalysisRow> = BTreeMap::new();
        for workflow in project.workflows().values() {
            let origin = workflow.origin();
            let row = by_file
                .entry(origin.clone())
                .or_insert_with(|| AnalysisRow::new(origin));
            row.workflows += 1;
            for node in workflow.tasks.values() {
                *row.task_types.entry(node.type_name().to_string()).or_insert(0) += 1;
            }
        }

        let rows: Vec<AnalysisRow> = by_file.into_values().collect();
        let mut totals = AnalysisRow::new(TOTALS_LABEL);
        rows.iter().for_each(|row| totals.absorb(row));

        Self { rows, totals }
    }

    /// Every task type seen, sorted.
    pub fn task_types(&self) -> Vec<String> {
        self.totals.task_types.keys().cloned().collect()
    }

    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![LABEL_COLUMN.to_string(), WORKFLOWS_COLUMN.to_string()];
        columns.extend(self.task_types());
        columns
    }

    fn all_rows(&self) -> impl Iterator<Item = &AnalysisRow> {
        self.rows.iter().chain(std::iter::once(&self.totals))
    }

    pub fn format(&self, format: AnalysisFormat) -> Result<String> {
        match format {
            AnalysisFormat::Md => Ok(self.to_markdown()),
            AnalysisFormat::Json => self.to_json(),
            AnalysisFormat::Csv => Ok(self.to_csv()),
        }
    }

    pub fn to_markdown(&self) -> String {
        let columns = self.columns();
        let task_types = self.task_types();
        let rows: Vec<Vec<String>> = self.all_rows().map(|r| r.cells(&task_types)).collect();

        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, header)| {
                rows.iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &[String]| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect();
            format!("| {} |", padded.join(" | "))
        };

        let mut output = String::new();
        let _ = writeln!(output, "{}", line(&columns));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        let _ = writeln!(output, "|{}|", rule.join("|"));
        for row in &rows {
            let _ = writeln!(output, "{}", line(row));
        }
        output
    }

    /// One JSON object per row; task types a row lacks are omitted.
    pub fn to_json(&self) -> Result<String> {
        let records: Vec<Value> = self
            .all_rows()
            .map(|row| {
                let mut record = Map::new();
                record.insert(LABEL_COLUMN.to_string(), Value::from(row.label.clone()));
                record.insert(WORKFLOWS_COLUMN.to_string(), Value::from(row.workflows));
                for (task_type, count) in &row.task_types {
                    record.insert(task_type.clone(), Value::from(*count));
                }
                Value::Object(record)
            })
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    pub fn to_csv(&self) -> String {
        let task_types = self.task_types();
        let mut output = String::new();
        let header: Vec<String> = self.columns().iter().map(|c| csv_field(c)).collect();
        let _ = writeln!(output, "{}", header.join(","));
        for row in self.all_rows() {
            let cells: Vec<String> = row.cells(&task_types).iter().map(|c| csv_field(c)).collect();
            let _ = writeln!(output, "{}", cells.join(","));
        }
        output
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Analyses `project` and formats the result.
pub fn analyze(project: &Project, format: AnalysisFormat) -> Result<String> {
    Analysis::from_project(project).format(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Task, TaskGroup, Workflow};

    fn two_file_project() -> Project {
        let mut project = Project::new();
        project
            .add_workflows([
                Workflow::new("foo")
                    .unwrap()
                    .with_source_file("foo.xml")
                    .with_task(Task::new("bar", "EmptyOperator").unwrap()),
                Workflow::new("baz")
                    .unwrap()
                    .with_source_file("baz.xml")
                    .with_task(Task::new("bop", "EmptyOperator").unwrap()),
            ])
            .unwrap();
        project
    }

    #[test]
    fn test_two_files_markdown() {
        let table = analyze(&two_file_project(), AnalysisFormat::Md).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "| file    | Workflows | EmptyOperator |");
        assert_eq!(lines[1], "|---------|-----------|---------------|");
        assert_eq!(lines[2], "| baz.xml | 1         | 1             |");
        assert_eq!(lines[3], "| foo.xml | 1         | 1             |");
        assert_eq!(lines[4], "| Totals  | 2         | 2             |");
    }

    #[test]
    fn test_totals_row() {
        let analysis = Analysis::from_project(&two_file_project());
        assert_eq!(analysis.rows.len(), 2);
        assert_eq!(analysis.totals.label, TOTALS_LABEL);
        assert_eq!(analysis.totals.workflows, 2);
        assert_eq!(analysis.totals.task_types["EmptyOperator"], 2);
    }

    #[test]
    fn test_empty_project_has_only_totals() {
        let project = Project::new();
        let analysis = Analysis::from_project(&project);
        assert!(analysis.rows.is_empty());
        assert_eq!(analysis.totals.workflows, 0);

        let table = analyze(&project, AnalysisFormat::Md).unwrap();
        assert_eq!(
            table,
            "| file   | Workflows |\n|--------|-----------|\n| Totals | 0         |\n"
        );
    }

    #[test]
    fn test_groups_counted_as_task_group() {
        let mut project = Project::new();
        project
            .add_workflows([Workflow::new("w")
                .unwrap()
                .with_task(Task::new("a", "BashOperator").unwrap())
                .with_task(
                    TaskGroup::new("g")
                        .unwrap()
                        .with_task(Task::new("b", "BashOperator").unwrap()),
                )])
            .unwrap();

        let analysis = Analysis::from_project(&project);
        assert_eq!(analysis.task_types(), vec!["BashOperator", "TaskGroup"]);
        assert_eq!(analysis.rows[0].label, "w.py");
        assert_eq!(analysis.rows[0].task_types["BashOperator"], 1);
    }

    #[test]
    fn test_same_file_accumulates() {
        let mut project = Project::new();
        project
            .add_workflows([
                Workflow::new("a")
                    .unwrap()
                    .with_source_file("jobs.xml")
                    .with_task(Task::new("t1", "BashOperator").unwrap()),
                Workflow::new("b")
                    .unwrap()
                    .with_source_file("jobs.xml")
                    .with_task(Task::new("t2", "BashOperator").unwrap()),
            ])
            .unwrap();

        let analysis = Analysis::from_project(&project);
        assert_eq!(analysis.rows.len(), 1);
        assert_eq!(analysis.rows[0].workflows, 2);
        assert_eq!(analysis.rows[0].task_types["BashOperator"], 2);
    }

    #[test]
    fn test_json_records() {
        let json = analyze(&two_file_project(), AnalysisFormat::Json).unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2]["file"], "Totals");
        assert_eq!(records[2]["Workflows"], 2);
        assert_eq!(records[2]["EmptyOperator"], 2);
    }

    #[test]
    fn test_csv() {
        let csv = analyze(&two_file_project(), AnalysisFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "file,Workflows,EmptyOperator\nbaz.xml,1,1\nfoo.xml,1,1\nTotals,2,2\n"
        );
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_missing_cells_are_blank() {
        let mut project = Project::new();
        project
            .add_workflows([
                Workflow::new("a")
                    .unwrap()
                    .with_task(Task::new("t", "BashOperator").unwrap()),
                Workflow::new("b")
                    .unwrap()
                    .with_task(Task::new("t", "EmptyOperator").unwrap()),
            ])
            .unwrap();
        let csv = analyze(&project, AnalysisFormat::Csv).unwrap();
        assert!(csv.contains("a.py,1,1,\n"));
        assert!(csv.contains("b.py,1,,1\n"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("md".parse::<AnalysisFormat>().unwrap(), AnalysisFormat::Md);
        assert_eq!("JSON".parse::<AnalysisFormat>().unwrap(), AnalysisFormat::Json);
        assert_eq!("csv".parse::<AnalysisFormat>().unwrap(), AnalysisFormat::Csv);
        assert!("xml".parse::<AnalysisFormat>().is_err());
        assert_eq!(AnalysisFormat::default().to_string(), "md");
    }

    #[test]
    fn test_analyze_does_not_mutate() {
        let project = two_file_project();
        let before = project.clone();
        analyze(&project, AnalysisFormat::Md).unwrap();
        assert_eq!(project, before);
    }
}
