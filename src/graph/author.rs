//! Graph builder API used by job compiler scripts.
//!
//! A script creates detached [`Task`]s, fills them with validated [`Command`]s, and attaches
//! them to the [`JobBuilder`], receiving a [`TaskHandle`] back. Dependencies always point at
//! handles, so they can only name tasks that were attached to the same job.
//!
//! A detached task can only wait for tasks that are already attached. To make a task wait for
//! one attached after it (a video task authored before its renders), attach both and link them
//! with [`JobBuilder::add_dependency`].

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::foundation::error::{CompileError, CompileResult};
use crate::graph::command::{Command, CommandSchemas};
use crate::graph::model::{JobMeta, TaskId};

/// Task type used when a script does not pick one.
pub const DEFAULT_TASK_TYPE: &str = "misc";

/// Reference to a task attached to a [`JobBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    job: String,
    id: TaskId,
    name: String,
}

impl TaskHandle {
    /// Job-scoped identity.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Task under construction, not yet attached to a job.
#[derive(Clone, Debug)]
pub struct Task {
    name: String,
    task_type: String,
    commands: Vec<Command>,
    deps: SmallVec<[TaskHandle; 4]>,
}

impl Task {
    /// New task with no commands or dependencies.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task_type: DEFAULT_TASK_TYPE.to_string(),
            commands: Vec::new(),
            deps: SmallVec::new(),
        }
    }

    /// Set the worker capability required to run this task.
    pub fn with_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a command; commands run in insertion order.
    pub fn add_command(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Make this task wait for `other`.
    ///
    /// The handle is resolved when this task is attached; a handle from another job fails
    /// there with `UnknownTask`. Adding the same dependency twice records it once.
    /// Use [`JobBuilder::add_dependency`] for targets attached after this task.
    pub fn add_dependency(&mut self, other: &TaskHandle) {
        if !self.deps.contains(other) {
            self.deps.push(other.clone());
        }
    }

    /// Commands so far.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// A task after attachment, dependencies resolved to identities.
#[derive(Clone, Debug)]
pub(crate) struct AttachedTask {
    pub(crate) name: String,
    pub(crate) task_type: String,
    pub(crate) commands: Vec<Command>,
    pub(crate) deps: SmallVec<[TaskId; 4]>,
}

/// The job graph under construction.
///
/// Owned by a single compilation and passed to the script by exclusive reference; only the
/// validator turns it into a [`crate::CompiledJob`].
pub struct JobBuilder<'s> {
    meta: JobMeta,
    schemas: &'s CommandSchemas,
    tasks: Vec<AttachedTask>,
    by_name: HashMap<String, TaskId>,
}

impl<'s> JobBuilder<'s> {
    /// Empty graph for `meta`, validating commands against `schemas`.
    pub fn new(meta: JobMeta, schemas: &'s CommandSchemas) -> Self {
        Self {
            meta,
            schemas,
            tasks: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Job being compiled.
    pub fn meta(&self) -> &JobMeta {
        &self.meta
    }

    /// Number of attached tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Create a detached task. Its name only has to be unique once attached.
    pub fn new_task(&self, name: impl Into<String>) -> Task {
        Task::new(name)
    }

    /// Create a command, checking `args` against the schema of `kind`.
    pub fn new_command(&self, kind: &str, args: serde_json::Value) -> CompileResult<Command> {
        self.schemas.command(kind, args)
    }

    /// Attach `task` to the job, assigning it the next [`TaskId`].
    pub fn add_task(&mut self, task: Task) -> CompileResult<TaskHandle> {
        if self.by_name.contains_key(&task.name) {
            return Err(CompileError::duplicate_task_name(task.name));
        }

        let mut deps = SmallVec::<[TaskId; 4]>::new();
        for handle in &task.deps {
            deps.push(self.resolve(handle)?);
        }

        let id = TaskId(self.tasks.len() as u32);
        self.by_name.insert(task.name.clone(), id);
        self.tasks.push(AttachedTask {
            name: task.name.clone(),
            task_type: task.task_type,
            commands: task.commands,
            deps,
        });

        Ok(TaskHandle {
            job: self.meta.id.clone(),
            id,
            name: task.name,
        })
    }

    /// Make the attached task `task` wait for `depends_on`.
    ///
    /// Both tasks must be attached, in either order. Fails with `Cycle` when `depends_on`
    /// already (transitively) waits for `task`.
    pub fn add_dependency(
        &mut self,
        task: &TaskHandle,
        depends_on: &TaskHandle,
    ) -> CompileResult<()> {
        let from = self.resolve(task)?;
        let to = self.resolve(depends_on)?;

        if let Some(path) = self.dependency_path(to, from) {
            let mut names = vec![self.tasks[from.0 as usize].name.clone()];
            names.extend(path.iter().map(|id| self.tasks[id.0 as usize].name.clone()));
            return Err(CompileError::Cycle { tasks: names });
        }

        let deps = &mut self.tasks[from.0 as usize].deps;
        if !deps.contains(&to) {
            deps.push(to);
        }
        Ok(())
    }

    fn resolve(&self, handle: &TaskHandle) -> CompileResult<TaskId> {
        let attached = handle.job == self.meta.id
            && self
                .tasks
                .get(handle.id.0 as usize)
                .is_some_and(|t| t.name == handle.name);
        if attached {
            Ok(handle.id)
        } else {
            Err(CompileError::unknown_task(handle.name.clone()))
        }
    }

    /// Dependency chain `start -> ... -> goal` (both included), if `start` waits for `goal`.
    fn dependency_path(&self, start: TaskId, goal: TaskId) -> Option<Vec<TaskId>> {
        let mut visited = vec![false; self.tasks.len()];
        let mut stack = vec![(start, 0usize)];
        visited[start.0 as usize] = true;

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if node == goal {
                return Some(stack.iter().map(|(id, _)| *id).collect());
            }
            let deps = &self.tasks[node.0 as usize].deps;
            if let Some(&dep) = deps.get(top.1) {
                top.1 += 1;
                if !visited[dep.0 as usize] {
                    visited[dep.0 as usize] = true;
                    stack.push((dep, 0));
                }
            } else {
                stack.pop();
            }
        }
        None
    }

    pub(crate) fn into_parts(self) -> (JobMeta, Vec<AttachedTask>) {
        (self.meta, self.tasks)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/author.rs"]
mod tests;
