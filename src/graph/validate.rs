//! Dependency graph validator: the only path from a [`JobBuilder`] to a [`CompiledJob`].

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use crate::foundation::error::{CompileError, CompileResult};
use crate::graph::author::{AttachedTask, JobBuilder};
use crate::graph::model::{CompiledJob, CompiledTask, Settings, TaskId};
use crate::trace::CompileLog;

/// Validate the authored graph and freeze it.
///
/// On any failure the builder is consumed and nothing is returned, so a partially authored
/// graph never leaves the compiler.
pub fn finalize(
    builder: JobBuilder<'_>,
    settings: Settings,
    log: CompileLog,
) -> CompileResult<CompiledJob> {
    let (meta, tasks) = builder.into_parts();
    let order = validate_tasks(&tasks)?;

    let compiled = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| CompiledTask {
            id: TaskId(i as u32),
            name: t.name.clone(),
            task_type: t.task_type.clone(),
            commands: t.commands.clone(),
            dependencies: t
                .deps
                .iter()
                .map(|d| tasks[d.0 as usize].name.clone())
                .collect(),
            dependency_ids: t.deps.to_vec(),
        })
        .collect();

    Ok(CompiledJob::new(
        meta,
        settings,
        compiled,
        log.into_records(),
        order,
    ))
}

/// Check references, acyclicity, non-empty tasks and name uniqueness, in that order.
///
/// Returns the deterministic topological order.
pub(crate) fn validate_tasks(tasks: &[AttachedTask]) -> CompileResult<Vec<TaskId>> {
    for t in tasks {
        if let Some(bad) = t.deps.iter().find(|d| d.0 as usize >= tasks.len()) {
            return Err(CompileError::unknown_task(format!(
                "#{} (dependency of '{}')",
                bad.0, t.name
            )));
        }
    }

    let order = dependency_order(tasks);
    if order.len() < tasks.len() {
        let mut ordered = vec![false; tasks.len()];
        for id in &order {
            ordered[id.0 as usize] = true;
        }
        let names = find_cycle(tasks, &ordered)
            .into_iter()
            .map(|id| tasks[id.0 as usize].name.clone())
            .collect();
        return Err(CompileError::Cycle { tasks: names });
    }

    if let Some(t) = tasks.iter().find(|t| t.commands.is_empty()) {
        return Err(CompileError::empty_task(t.name.clone()));
    }

    let mut seen = HashSet::<&str>::with_capacity(tasks.len());
    for t in tasks {
        if !seen.insert(t.name.as_str()) {
            return Err(CompileError::duplicate_task_name(t.name.clone()));
        }
    }

    Ok(order)
}

/// Tasks in dependency order; among tasks whose dependencies are all placed, the lowest id goes
/// first. Tasks on or behind a cycle are left out. Dependency ids must already be in range.
fn dependency_order(tasks: &[AttachedTask]) -> Vec<TaskId> {
    let mut waiting_on: Vec<usize> = tasks.iter().map(|t| t.deps.len()).collect();
    let mut unblocks = vec![Vec::<TaskId>::new(); tasks.len()];
    for (i, t) in tasks.iter().enumerate() {
        for dep in &t.deps {
            unblocks[dep.0 as usize].push(TaskId(i as u32));
        }
    }

    let mut ready: BinaryHeap<Reverse<TaskId>> = waiting_on
        .iter()
        .enumerate()
        .filter(|&(_, &n)| n == 0)
        .map(|(i, _)| Reverse(TaskId(i as u32)))
        .collect();

    let mut order = Vec::with_capacity(tasks.len());
    while let Some(Reverse(id)) = ready.pop() {
        order.push(id);
        for &next in &unblocks[id.0 as usize] {
            let n = &mut waiting_on[next.0 as usize];
            *n -= 1;
            if *n == 0 {
                ready.push(Reverse(next));
            }
        }
    }
    order
}

/// First cycle found by a depth-first walk (lowest ids first) over the tasks that could not be
/// ordered. The first task is repeated at the end.
fn find_cycle(tasks: &[AttachedTask], ordered: &[bool]) -> Vec<TaskId> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; tasks.len()];
    for root in 0..tasks.len() {
        if marks[root] != Mark::Unvisited || ordered[root] {
            continue;
        }

        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::OnStack;
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let Some(&dep) = tasks[node].deps.get(top.1) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            top.1 += 1;

            let d = dep.0 as usize;
            match marks[d] {
                Mark::OnStack => {
                    let start = stack.iter().position(|&(n, _)| n == d).unwrap_or(0);
                    let mut cycle: Vec<TaskId> = stack[start..]
                        .iter()
                        .map(|&(n, _)| TaskId(n as u32))
                        .collect();
                    cycle.push(dep);
                    return cycle;
                }
                Mark::Unvisited => {
                    marks[d] = Mark::OnStack;
                    stack.push((d, 0));
                }
                Mark::Done => {}
            }
        }
    }
    Vec::new()
}

#[cfg(test)]
#[path = "../../tests/unit/graph/validate.rs"]
mod tests;
