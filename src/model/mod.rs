//! Entity Model
//!
//! Passive value types produced by the upstream translator and collected
//! by the [`Project`](crate::project::Project).
//!
//! # Structure
//!
//! - [`entity`]: The [`Entity`] contract shared by every top-level kind
//! - [`node`]: The [`Node`] capability interface walked during discovery
//! - [`resources`]: Side entities (pools, connections, ...) a node carries
//! - [`workflow`], [`task`], [`task_group`], [`callback`], [`schedule`]:
//!   the workflow graph
//! - [`requirement`], [`pool`], [`connection`], [`variable`], [`env_var`],
//!   [`include`]: the side entities themselves

pub mod callback;
pub mod connection;
pub mod entity;
pub mod env_var;
pub mod include;
pub mod node;
pub mod pool;
pub mod python;
pub mod requirement;
pub mod resources;
pub mod schedule;
pub mod task;
pub mod task_group;
pub mod variable;
pub mod workflow;

pub use callback::Callback;
pub use connection::Connection;
pub use entity::{AnyEntity, Entity, EntityKind};
pub use env_var::EnvVar;
pub use include::Include;
pub use node::{Extension, Node};
pub use pool::{Pool, PoolMerge};
pub use requirement::Requirement;
pub use resources::{ResourceBuilder, Resources};
pub use schedule::{Schedule, Timetable};
pub use task::{Task, TaskNode};
pub use task_group::TaskGroup;
pub use variable::Variable;
pub use workflow::Workflow;
