/// Crate-wide result alias.
pub type CompileResult<T> = Result<T, CompileError>;

/// Every way a job compilation can be rejected.
///
/// Display strings carry a stable prefix per kind so callers (and the job submission handler)
/// can report the first failure verbatim.
#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    /// Frame range specification is empty, malformed, or non-monotonic.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Path string cannot be processed (empty input).
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Command arguments do not match the shape required by the command kind.
    #[error("invalid command '{kind}': {message}")]
    InvalidCommand {
        /// Command kind the arguments were checked against.
        kind: String,
        /// What was wrong with the arguments.
        message: String,
    },

    /// A dependency references a task that was never attached to the job.
    #[error("unknown task: {0}")]
    UnknownTask(String),

    /// Another attached task already uses this name.
    #[error("duplicate task name: {0}")]
    DuplicateTaskName(String),

    /// The dependency relation contains a cycle.
    #[error("cycle detected: {}", format_cycle(.tasks))]
    Cycle {
        /// Task names along the cycle, first name repeated at the end.
        tasks: Vec<String>,
    },

    /// A task reached finalization without any command.
    #[error("empty task: task '{0}' has no commands")]
    EmptyTask(String),

    /// Failure raised inside a job compiler script, including settings rejected by the job type.
    #[error("script error in job type '{job_type}': {message}")]
    ScriptExecution {
        /// Job type whose script failed.
        job_type: String,
        /// Failure description.
        message: String,
    },

    /// No script is registered for the job type.
    #[error("unknown job type: {0}")]
    UnknownJobType(String),

    /// The submitted job was built against an outdated job type definition.
    #[error(
        "job type etag does not match: expecting {expected:?}, submitted job has {submitted:?}"
    )]
    JobTypeBadEtag {
        /// Etag of the job type as currently registered.
        expected: String,
        /// Etag carried by the submitted job.
        submitted: String,
    },

    /// Compiler options that can never work (zero threads, empty executable, bad file).
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// (De)serialization failure at the JSON boundary.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn format_cycle(tasks: &[String]) -> String {
    tasks.join(" -> ")
}

impl CompileError {
    /// Build a [`CompileError::InvalidRange`].
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    /// Build a [`CompileError::InvalidPath`].
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Build a [`CompileError::InvalidCommand`].
    pub fn invalid_command(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidCommand {
            kind: kind.into(),
            message: msg.into(),
        }
    }

    /// Build a [`CompileError::UnknownTask`].
    pub fn unknown_task(name: impl Into<String>) -> Self {
        Self::UnknownTask(name.into())
    }

    /// Build a [`CompileError::DuplicateTaskName`].
    pub fn duplicate_task_name(name: impl Into<String>) -> Self {
        Self::DuplicateTaskName(name.into())
    }

    /// Build a [`CompileError::EmptyTask`].
    pub fn empty_task(name: impl Into<String>) -> Self {
        Self::EmptyTask(name.into())
    }

    /// Build a [`CompileError::ScriptExecution`].
    pub fn script(job_type: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ScriptExecution {
            job_type: job_type.into(),
            message: msg.into(),
        }
    }

    /// Build a [`CompileError::InvalidOptions`].
    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions(msg.into())
    }

    /// Build a [`CompileError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
