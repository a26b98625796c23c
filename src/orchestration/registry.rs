// src/orchestration/registry.rs

//! Orchestrator identifier -> backend constructor.
//!
//! Backends are registered explicitly at start-up; nothing is discovered at
//! run time.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::errors::{FlowdagError, Result};
use crate::orchestration::backend::Orchestration;
use crate::orchestration::describe;

type Constructor<H> = Box<dyn Fn() -> Box<dyn Orchestration<H>>>;

pub struct OrchestrationRegistry<H> {
    constructors: IndexMap<String, Constructor<H>>,
}

impl<H> Default for OrchestrationRegistry<H> {
    fn default() -> Self {
        Self {
            constructors: IndexMap::new(),
        }
    }
}

impl<H> OrchestrationRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the constructor for `orchestrator`.
    pub fn register<F>(&mut self, orchestrator: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Orchestration<H>> + 'static,
    {
        let orchestrator = orchestrator.into();
        info!(%orchestrator, "registered orchestration");
        self.constructors.insert(orchestrator, Box::new(constructor));
        self
    }

    pub fn contains(&self, orchestrator: &str) -> bool {
        self.constructors.contains_key(orchestrator)
    }

    pub fn orchestrators(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(|k| k.as_str())
    }

    /// Instantiate the backend registered under `orchestrator`.
    pub fn create(&self, orchestrator: &str) -> Result<Box<dyn Orchestration<H>>> {
        let constructor = self
            .constructors
            .get(orchestrator)
            .ok_or_else(|| FlowdagError::UnknownOrchestrator(orchestrator.to_string()))?;
        debug!(%orchestrator, "creating orchestration");
        Ok(constructor())
    }
}

impl<H: 'static> OrchestrationRegistry<H> {
    /// Registry with the backends shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        describe::register(&mut registry);
        registry
    }
}
