#![allow(dead_code)]

use std::collections::BTreeMap;

use flowdag::config::model::{
    DependencyConfig, DependencyKindConfig, DomainConfig, PipelineSection, ScheduleSection,
};
use flowdag::config::{ConfigFile, RawConfigFile, TaskConfig, TaskKind};
use flowdag::schedule::{Dependencies, Dependency};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(source: &str) -> Self {
        Self {
            config: RawConfigFile {
                pipeline: PipelineSection {
                    source: source.to_string(),
                    orchestrator: "describe".to_string(),
                    cron: None,
                    filtered_datasets: vec![],
                    wrap: false,
                    output_datasets: vec![],
                },
                options: BTreeMap::new(),
                schedule: None,
                dependencies: vec![],
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_option(mut self, name: &str, value: &str) -> Self {
        self.config
            .options
            .insert(name.to_string(), toml::Value::String(value.to_string()));
        self
    }

    pub fn with_cron(mut self, cron: &str) -> Self {
        self.config.pipeline.cron = Some(cron.to_string());
        self
    }

    pub fn with_filtered_dataset(mut self, uri: &str) -> Self {
        self.config.pipeline.filtered_datasets.push(uri.to_string());
        self
    }

    pub fn wrapped(mut self, output_datasets: &[&str]) -> Self {
        self.config.pipeline.wrap = true;
        self.config.pipeline.output_datasets = output_datasets.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Explicit schedule; `domains` are `(name, tables)` pairs.
    pub fn with_schedule(mut self, name: Option<&str>, cron: Option<&str>, domains: &[(&str, &[&str])]) -> Self {
        self.config.schedule = Some(ScheduleSection {
            name: name.map(str::to_string),
            cron: cron.map(str::to_string),
            domains: domains
                .iter()
                .map(|(name, tables)| DomainConfig {
                    name: name.to_string(),
                    tables: tables.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
        });
        self
    }

    pub fn with_dependency(mut self, name: &str, cron: Option<&str>) -> Self {
        self.config.dependencies.push(DependencyConfig {
            name: name.to_string(),
            kind: DependencyKindConfig::Table,
            sink: None,
            cron: cron.map(str::to_string),
            dependencies: vec![],
        });
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            task: TaskConfig {
                kind,
                domain: None,
                tables: vec![],
                table: None,
                name: None,
                options: None,
                after: vec![],
                group: None,
            },
        }
    }

    pub fn dummy() -> Self {
        Self::new(TaskKind::Dummy)
    }

    pub fn load(domain: &str, table: &str) -> Self {
        Self::new(TaskKind::Load).domain(domain).table(table)
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.task.domain = Some(domain.to_string());
        self
    }

    pub fn table(mut self, table: &str) -> Self {
        self.task.table = Some(table.to_string());
        self
    }

    pub fn tables(mut self, tables: &[&str]) -> Self {
        self.task.tables = tables.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn group(mut self, group: &str) -> Self {
        self.task.group = Some(group.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Dependency set of plain tables, each `(uri, cron)`.
pub fn table_dependencies(tables: &[(&str, Option<&str>)]) -> Dependencies {
    tables
        .iter()
        .map(|(name, cron)| {
            let dep = Dependency::table(*name);
            match cron {
                Some(cron) => dep.with_cron(*cron),
                None => dep,
            }
        })
        .collect()
}
