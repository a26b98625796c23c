// src/schedule/model.rs

//! Explicit schedules and the domain/table groupings they carry.

use crate::schedule::cron::is_none_literal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub final_name: String,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            final_name: name.clone(),
            name,
        }
    }

    pub fn with_final_name(mut self, final_name: impl Into<String>) -> Self {
        self.final_name = final_name.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    pub final_name: String,
    pub tables: Vec<Table>,
}

impl Domain {
    pub fn new(name: impl Into<String>, tables: Vec<Table>) -> Self {
        let name = name.into();
        Self {
            final_name: name.clone(),
            name,
            tables,
        }
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }
}

/// A fixed, time-based schedule declared by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    name: Option<String>,
    pub cron: Option<String>,
    pub domains: Vec<Domain>,
}

impl Schedule {
    /// A name or cron of `"none"` (any case) is treated as absent.
    pub fn new(name: Option<&str>, cron: Option<&str>, domains: Vec<Domain>) -> Self {
        Self {
            name: name
                .filter(|n| !n.trim().is_empty() && !is_none_literal(n))
                .map(|n| n.to_string()),
            cron: cron
                .filter(|c| !c.trim().is_empty() && !is_none_literal(c))
                .map(|c| c.trim().to_string()),
            domains,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
