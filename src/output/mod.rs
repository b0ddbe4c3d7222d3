//! Output
//!
//! Everything that leaves a [`Project`](crate::project::Project): the
//! rendered project directory, the per-file analysis table, and the
//! progress reports emitted along the way.

pub mod analyzer;
pub mod renderer;
pub mod reporter;

pub use analyzer::{analyze, Analysis, AnalysisFormat};
pub use renderer::{RenderSummary, Renderer};
pub use reporter::{LogReporter, MemoryReporter, ReportLevel, Reporter};
