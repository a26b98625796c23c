// src/orchestration/mod.rs

//! Boundary towards concrete schedulers.
//!
//! - [`backend`] provides the `Orchestration` trait backends implement.
//! - [`registry`] maps orchestrator identifiers to backend constructors.
//! - [`describe`] is the in-crate backend that renders pipelines as text.

pub mod backend;
pub mod describe;
pub mod registry;

pub use backend::{Orchestration, wrap_task};
pub use describe::DescribeOrchestration;
pub use registry::OrchestrationRegistry;
