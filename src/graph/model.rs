use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::foundation::fingerprint::{Fingerprint, StableHasher};
use crate::graph::command::Command;
use crate::trace::LogRecord;

/// Dynamically typed job settings as received from the submitter.
pub type Settings = Map<String, Value>;

/// Format used wherever the creation time is embedded in paths.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Job-scoped task identity, assigned on attachment in attachment order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TaskId(pub u32);

/// Job as submitted by a client, before compilation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SubmittedJob {
    /// Human-readable job name.
    pub name: String,
    /// Job type name, selects the compiler script.
    #[serde(rename = "type")]
    pub job_type: String,
    /// Scheduling priority.
    #[serde(default)]
    pub priority: i32,
    /// Job-type specific settings.
    #[serde(default)]
    pub settings: Settings,
    /// Free-form metadata (`project`, `user.name`, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Etag of the job type definition the submitter used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_etag: Option<String>,
    /// Platform of the submitting client (`linux`, `windows`, `darwin`).
    #[serde(default)]
    pub submitter_platform: String,
    /// Worker tag restricting which workers may run the job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_tag: Option<String>,
}

/// Identity and metadata of the job being compiled.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobMeta {
    /// Stable job identifier.
    pub id: String,
    /// Human-readable job name.
    pub name: String,
    /// Job type name.
    pub job_type: String,
    /// Creation time; the only clock input a script may use.
    pub created: DateTime<Utc>,
    /// Scheduling priority.
    pub priority: i32,
    /// Free-form metadata.
    pub metadata: BTreeMap<String, String>,
    /// Platform of the submitting client.
    pub submitter_platform: String,
    /// Worker tag, `None` when absent or empty.
    pub worker_tag: Option<String>,
}

impl JobMeta {
    /// Metadata for `submitted`, created at `created` with identifier `id`.
    pub fn from_submitted(
        submitted: &SubmittedJob,
        id: impl Into<String>,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: submitted.name.clone(),
            job_type: submitted.job_type.clone(),
            created,
            priority: submitted.priority,
            metadata: submitted.metadata.clone(),
            submitter_platform: submitted.submitter_platform.clone(),
            worker_tag: submitted.worker_tag.clone().filter(|t| !t.is_empty()),
        }
    }

    /// Creation time as embedded in derived paths (`2006-01-02_150405`).
    pub fn created_stamp(&self) -> String {
        self.created.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// A validated task of a [`CompiledJob`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CompiledTask {
    /// Job-scoped identity.
    pub id: TaskId,
    /// Name, unique within the job.
    pub name: String,
    /// Worker capability required to run the task (`blender`, `ffmpeg`, `misc`).
    pub task_type: String,
    /// Commands, executed in order.
    pub commands: Vec<Command>,
    /// Names of the tasks that must complete first.
    pub dependencies: Vec<String>,
    #[serde(skip)]
    pub(crate) dependency_ids: Vec<TaskId>,
}

impl CompiledTask {
    /// Identities of the tasks that must complete first.
    pub fn dependency_ids(&self) -> &[TaskId] {
        &self.dependency_ids
    }
}

/// Output of a successful compilation: an acyclic, fully resolved task graph.
///
/// Only the validator constructs this value, and it offers no mutation.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CompiledJob {
    meta: JobMeta,
    settings: Settings,
    tasks: Vec<CompiledTask>,
    log: Vec<LogRecord>,
    #[serde(skip)]
    order: Vec<TaskId>,
}

impl CompiledJob {
    pub(crate) fn new(
        meta: JobMeta,
        settings: Settings,
        tasks: Vec<CompiledTask>,
        log: Vec<LogRecord>,
        order: Vec<TaskId>,
    ) -> Self {
        Self {
            meta,
            settings,
            tasks,
            log,
            order,
        }
    }

    /// Job identity and metadata.
    pub fn meta(&self) -> &JobMeta {
        &self.meta
    }

    /// Settings after script rewrites (e.g. `{timestamp}` expansion).
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Tasks in attachment order; `tasks()[i].id == TaskId(i)`.
    pub fn tasks(&self) -> &[CompiledTask] {
        &self.tasks
    }

    /// Records emitted by the job compiler script.
    pub fn log(&self) -> &[LogRecord] {
        &self.log
    }

    /// Task by name.
    pub fn task(&self, name: &str) -> Option<&CompiledTask> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Task by identity.
    pub fn task_by_id(&self, id: TaskId) -> Option<&CompiledTask> {
        self.tasks.get(id.0 as usize)
    }

    /// Deterministic topological order: every task comes after all its dependencies, ties broken
    /// by lowest [`TaskId`].
    pub fn topological_order(&self) -> impl Iterator<Item = &CompiledTask> {
        self.order.iter().map(|id| &self.tasks[id.0 as usize])
    }

    /// Structural fingerprint: task names, types, commands and dependency edges.
    ///
    /// Job identity and the script log are not included, so two compilations of the same
    /// settings at the same creation time fingerprint equal.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut h = StableHasher::new();
        h.write_u32(self.tasks.len() as u32);
        for t in &self.tasks {
            h.write_str(&t.name);
            h.write_str(&t.task_type);
            h.write_u32(t.commands.len() as u32);
            for c in &t.commands {
                h.write_str(&c.kind);
                h.write_json(&Value::Object(c.args.clone()));
            }
            h.write_u32(t.dependencies.len() as u32);
            for d in &t.dependencies {
                h.write_str(d);
            }
        }
        h.finish()
    }
}
