use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use serde_json::json;
use smallvec::SmallVec;

use super::*;
use crate::graph::command::{Command, CommandSchemas};
use crate::graph::model::JobMeta;

fn cmd() -> Command {
    CommandSchemas::builtin()
        .command("echo", json!({ "message": "hi" }))
        .unwrap()
}

fn task(name: &str, deps: &[u32]) -> AttachedTask {
    AttachedTask {
        name: name.to_string(),
        task_type: "misc".to_string(),
        commands: vec![cmd()],
        deps: deps.iter().copied().map(TaskId).collect::<SmallVec<_>>(),
    }
}

#[test]
fn valid_graph_yields_topological_order() {
    let tasks = vec![task("video", &[1, 2]), task("r1", &[]), task("r2", &[])];
    let order = validate_tasks(&tasks).unwrap();
    assert_eq!(order, vec![TaskId(1), TaskId(2), TaskId(0)]);
}

#[test]
fn ready_ties_break_by_lowest_id() {
    // "late" waits for "c"; "b" is free and comes before "c".
    let tasks = vec![task("late", &[2]), task("b", &[]), task("c", &[])];
    let order = validate_tasks(&tasks).unwrap();
    assert_eq!(order, vec![TaskId(1), TaskId(2), TaskId(0)]);
}

#[test]
fn dependency_order_skips_tasks_behind_a_cycle() {
    let tasks = vec![task("a", &[]), task("b", &[2]), task("c", &[1]), task("d", &[0])];
    assert_eq!(dependency_order(&tasks), vec![TaskId(0), TaskId(3)]);
}

#[test]
fn dangling_reference_is_unknown_task() {
    let tasks = vec![task("a", &[]), task("b", &[7])];
    let err = validate_tasks(&tasks).unwrap_err();
    assert!(matches!(err, CompileError::UnknownTask(m) if m.contains("'b'")));
}

#[test]
fn cycle_is_reported_with_names() {
    let tasks = vec![
        task("free", &[]),
        task("a", &[2]),
        task("b", &[3]),
        task("c", &[1]),
        task("after", &[1]),
    ];
    let err = validate_tasks(&tasks).unwrap_err();
    match err {
        CompileError::Cycle { tasks } => assert_eq!(tasks, vec!["a", "b", "c", "a"]),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn task_without_commands_is_rejected() {
    let mut empty = task("empty", &[]);
    empty.commands.clear();
    let err = validate_tasks(&[task("a", &[]), empty]).unwrap_err();
    assert!(matches!(err, CompileError::EmptyTask(n) if n == "empty"));
}

#[test]
fn duplicate_names_are_rechecked() {
    let err = validate_tasks(&[task("a", &[]), task("a", &[])]).unwrap_err();
    assert!(matches!(err, CompileError::DuplicateTaskName(n) if n == "a"));
}

#[test]
fn finalize_resolves_dependency_names() {
    let schemas = CommandSchemas::builtin();
    let meta = JobMeta {
        id: "job-1".to_string(),
        name: "n".to_string(),
        job_type: "test".to_string(),
        created: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
        priority: 50,
        metadata: BTreeMap::new(),
        submitter_platform: "linux".to_string(),
        worker_tag: None,
    };
    let mut job = JobBuilder::new(meta, &schemas);
    let mut a = job.new_task("a");
    a.add_command(cmd());
    let a = job.add_task(a).unwrap();
    let mut b = job.new_task("b").with_type("ffmpeg");
    b.add_command(cmd());
    b.add_dependency(&a);
    job.add_task(b).unwrap();

    let mut log = CompileLog::new("job-1", "test");
    log.info("authored");
    let compiled = finalize(job, Settings::new(), log).unwrap();

    let b = compiled.task("b").unwrap();
    assert_eq!(b.dependencies, vec!["a"]);
    assert_eq!(b.dependency_ids(), &[TaskId(0)]);
    assert_eq!(b.task_type, "ffmpeg");
    assert_eq!(compiled.log().len(), 1);
    let order: Vec<&str> = compiled
        .topological_order()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(order, vec!["a", "b"]);
}

#[test]
fn finalize_rejects_empty_task_without_exposing_graph() {
    let schemas = CommandSchemas::builtin();
    let meta = JobMeta {
        id: "job-1".to_string(),
        name: "n".to_string(),
        job_type: "test".to_string(),
        created: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
        priority: 50,
        metadata: BTreeMap::new(),
        submitter_platform: "linux".to_string(),
        worker_tag: None,
    };
    let mut job = JobBuilder::new(meta, &schemas);
    job.add_task(job.new_task("idle")).unwrap();
    let res = finalize(job, Settings::new(), CompileLog::new("job-1", "test"));
    assert!(matches!(res, Err(CompileError::EmptyTask(_))));
}
