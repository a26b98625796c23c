// tests/pipeline_lifecycle.rs

mod common;
use crate::common::builders::table_dependencies;
use crate::common::recording::RecordingJob;
use crate::common::{init_tracing, reference_time};

use std::error::Error;

use flowdag::config::MapOptions;
use flowdag::dag::{DependencyNode, GroupOptions};
use flowdag::errors::FlowdagError;
use flowdag::job::JobSource;
use flowdag::orchestration::{DescribeOrchestration, Orchestration};
use flowdag::pipeline::{Pipeline, PipelineBuilder};
use flowdag::schedule::{Dataset, Dependencies, Domain, Schedule};

type TestResult = Result<(), Box<dyn Error>>;

const HOURLY: &str = "0 * * * *";
const DAILY: &str = "0 0 * * *";

fn node_ids(nodes: Vec<&DependencyNode<String>>) -> Vec<String> {
    nodes.into_iter().map(|n| n.id().to_string()).collect()
}

fn builder<'a>(source: &'a JobSource, job: &'a RecordingJob) -> PipelineBuilder<'a, String, String> {
    Pipeline::builder(source, job, job)
}

fn mixed_cadence_dependencies() -> Dependencies {
    table_dependencies(&[("raw.orders", Some(HOURLY)), ("raw.customers", Some(DAILY))])
}

#[test]
fn opening_without_schedule_input_fails() {
    let job = RecordingJob::new();
    let source = JobSource::new("sales_load.py");
    let options = MapOptions::new();
    let result = builder(&source, &job)
        .options(&options)
        .at(reference_time())
        .open();
    assert!(matches!(result, Err(FlowdagError::MissingScheduleInput)));
}

#[test]
fn pipeline_id_includes_schedule_name() -> TestResult {
    let job = RecordingJob::new();
    let source = JobSource::new("Sales_Load.py");
    let schedule = Schedule::new(Some("Daily"), Some(DAILY), vec![Domain::new("sales", vec![])]);
    let options = MapOptions::new();

    let pipeline = builder(&source, &job)
        .options(&options)
        .schedule(&schedule)
        .at(reference_time())
        .open()?;
    assert_eq!(pipeline.pipeline_id(), "sales_load_Daily");
    assert_eq!(pipeline.cron(), Some(DAILY));
    assert_eq!(pipeline.tags(), ["sales".to_string()]);
    assert_eq!(pipeline.depth(), 1);

    let unnamed = Schedule::new(Some("none"), Some(DAILY), vec![]);
    let pipeline = builder(&source, &job)
        .options(&options)
        .schedule(&unnamed)
        .open()?;
    assert_eq!(pipeline.pipeline_id(), "sales_load");
    Ok(())
}

#[test]
fn explicit_schedule_with_malformed_cron_is_rejected() -> TestResult {
    let job = RecordingJob::new();
    let source = JobSource::new("sales_load.py");
    let options = MapOptions::new();

    let broken = Schedule::new(Some("nightly"), Some("not-a-cron"), vec![]);
    let result = builder(&source, &job)
        .options(&options)
        .schedule(&broken)
        .at(reference_time())
        .open();
    match result {
        Err(FlowdagError::InvalidCron(msg)) => assert!(msg.contains("not-a-cron")),
        Err(other) => panic!("expected InvalidCron, got {other:?}"),
        Ok(_) => panic!("expected InvalidCron, pipeline opened"),
    }

    let weekly = Schedule::new(None, Some("0 6 * * 0"), vec![]);
    let pipeline = builder(&source, &job)
        .options(&options)
        .schedule(&weekly)
        .at(reference_time())
        .open()?;
    assert_eq!(pipeline.cron(), Some("0 6 * * 0"));
    Ok(())
}

#[test]
fn standard_tasks_are_wired_and_returned_on_close() -> TestResult {
    init_tracing();
    let job = RecordingJob::new();
    let source = JobSource::new("sales_load.py");
    let dependencies = mixed_cadence_dependencies();
    let options = MapOptions::new().with("pre_load_strategy", "pending");

    let mut pipeline = builder(&source, &job)
        .options(&options)
        .dependencies(&dependencies)
        .at(reference_time())
        .open()?;

    let tables = vec!["orders".to_string()];
    let start = pipeline.start_task(None)?.expect("start created");
    let check = pipeline.pre_load("sales", &tables, None)?.expect("pre-load created");
    let import = pipeline.import(None, "sales", &tables)?.expect("import created");
    let load = pipeline.load(None, "sales", "orders")?.expect("load created");
    let end = pipeline
        .end_task(None, &[Dataset::new("sales.orders", None)?])?
        .expect("end created");
    let trigger = pipeline
        .trigger_least_frequent_datasets_task(None)?
        .expect("something to republish");

    assert_eq!(check.id(), "check_sales_pending_files");
    assert_eq!(import.id(), "import_sales");
    assert_eq!(load.id(), "load_sales_orders");
    assert_eq!(trigger.id(), "trigger_least_frequent_datasets");

    pipeline.before(&start, &check)?;
    pipeline.before(&check, &import)?;
    pipeline.before(&import, &load)?;
    pipeline.before(&load, &end)?;
    pipeline.before(&end, &trigger)?;

    assert_eq!(node_ids(pipeline.roots()), vec!["start"]);
    assert_eq!(node_ids(pipeline.leaves()), vec!["trigger_least_frequent_datasets"]);
    assert_eq!(pipeline.events(), vec!["raw.orders", "raw.customers"]);

    let finished = pipeline.close().expect("detached pipeline is returned");
    assert_eq!(finished.pipeline_id(), "sales_load");
    assert_eq!(finished.graph().tasks().len(), 6);
    assert!(finished.tree().starts_with("start"));

    let calls = job.calls();
    assert!(calls.contains(&"dummy:end[sales.orders<-sales_load]".to_string()));
    assert!(calls.contains(&"dummy:trigger_least_frequent_datasets[raw.customers<-sales_load]".to_string()));
    Ok(())
}

#[test]
fn declined_tasks_create_no_node() -> TestResult {
    let job = RecordingJob::new().declining("load_sales_orders");
    let source = JobSource::new("sales_load.py");
    let schedule = Schedule::new(None, Some(DAILY), vec![]);

    let options = MapOptions::new();
    let mut pipeline = builder(&source, &job)
        .schedule(&schedule)
        .options(&options)
        .at(reference_time())
        .open()?;

    // Default strategy is `none`: no readiness check at all.
    assert!(pipeline.pre_load("sales", &[], None)?.is_none());
    assert!(pipeline.load(None, "sales", "orders")?.is_none());
    // Not enough distinct cadences (no datasets at all).
    assert!(pipeline.trigger_least_frequent_datasets_task(None)?.is_none());
    // The job does not implement post tasks.
    assert!(pipeline.post_tasks(None)?.is_none());
    assert!(pipeline.pre_tasks(None)?.is_some());

    let finished = pipeline.close().expect("detached");
    let ids: Vec<_> = finished.graph().tasks().iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids, vec!["pre_tasks"]);
    Ok(())
}

#[test]
fn groups_restore_stack_depth_on_error() -> TestResult {
    let job = RecordingJob::new();
    let source = JobSource::new("sales_load.py");
    let schedule = Schedule::new(None, Some(DAILY), vec![]);
    let options = MapOptions::new();
    let mut pipeline = builder(&source, &job)
        .schedule(&schedule)
        .options(&options)
        .open()?;

    let before = pipeline.depth();
    let result = pipeline.with_group("sales", GroupOptions::default(), |p| {
        assert_eq!(p.depth(), before + 1);
        p.transform(None, "aggregate", None)?;
        p.transform(None, "aggregate", None)?;
        Ok(())
    });
    assert!(matches!(result, Err(FlowdagError::DuplicateId { .. })));
    assert_eq!(pipeline.depth(), before);

    {
        let mut group = pipeline.group("reporting", GroupOptions::default())?;
        group.transform(Some("kpi"), "kpi_daily", Some("--full"))?;
        assert_eq!(group.depth(), before + 1);
    }
    assert_eq!(pipeline.depth(), before);

    let (node, created) = pipeline.with_group("exports", GroupOptions::default(), |p| {
        p.dummy_task("export_done", vec!["manual".to_string()], &[])
    })?;
    assert!(node.is_group());
    assert!(created.is_some());

    let finished = pipeline.close().expect("detached");
    let roots = node_ids(finished.roots());
    assert_eq!(roots, vec!["sales", "reporting", "exports"]);
    Ok(())
}

#[test]
fn skip_or_start_wraps_upstream_handle() -> TestResult {
    let job = RecordingJob::new();
    let source = JobSource::new("sales_load.py");
    let schedule = Schedule::new(None, None, vec![]);
    let options = MapOptions::new();
    let mut pipeline = builder(&source, &job)
        .schedule(&schedule)
        .options(&options)
        .open()?;

    let load = pipeline.load(None, "sales", "orders")?.expect("load");
    let gate = pipeline.skip_or_start("skip_or_start", &load)?.expect("gate");
    pipeline.before(&load, &gate)?;

    let group = pipeline.with_group("g", GroupOptions::default(), |_| Ok(()))?.0;
    match pipeline.skip_or_start("gate_on_group", &group) {
        Err(FlowdagError::NotATask(id)) => assert_eq!(id, "g"),
        other => panic!("expected NotATask, got {other:?}"),
    }

    assert!(
        job.calls()
            .contains(&"skip_or_start:skip_or_start<load:load_sales_orders:sales.orders>".to_string())
    );
    Ok(())
}

#[test]
fn transform_options_use_pipeline_cron() -> TestResult {
    let job = RecordingJob::new();
    let source = JobSource::new("sales_load.py");
    let schedule = Schedule::new(None, Some(DAILY), vec![]);
    let options = MapOptions::new();
    let pipeline = builder(&source, &job)
        .schedule(&schedule)
        .options(&options)
        .at(reference_time())
        .open()?;

    let dates = pipeline.transform_options(None)?.expect("pipeline has a cron");
    assert!(dates.starts_with("sl_start_date='2024-05-14 00:00:00+0000'"));
    assert!(pipeline.transform_options(Some("not-a-cron")).is_err());
    Ok(())
}

#[test]
fn close_registers_with_attached_orchestration() -> TestResult {
    let job = RecordingJob::new();
    let source = JobSource::new("sales_load.py");
    let dependencies = mixed_cadence_dependencies();
    let mut orchestration = DescribeOrchestration::<String>::new();

    {
        let options = MapOptions::new();
        let mut pipeline = builder(&source, &job)
            .options(&options)
            .dependencies(&dependencies)
            .orchestration(&mut orchestration)
            .at(reference_time())
            .open()?;
        pipeline.start_task(None)?;
        assert!(pipeline.close().is_none());
    }

    assert_eq!(orchestration.pipelines().len(), 1);
    let report = orchestration.render();
    assert!(report.contains("Pipeline sales_load:"));
    assert!(report.contains("raw.orders?sl_schedule=20240515T1400"));
    assert!(report.contains("republished:"));
    Ok(())
}
