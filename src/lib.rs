//! jobforge is the job compiler of a render farm.
//!
//! It turns a submitted job (a job type name plus a settings map) into an immutable,
//! dependency-ordered graph of tasks and commands that workers can later claim and run.
//!
//! # Pipeline overview
//!
//! 1. **Resolve**: look up the [`JobCompilerScript`] registered for the job type and check the
//!    submitted etag and settings against its [`JobTypeInfo`].
//! 2. **Author**: the script chunks the frame range ([`FrameChunker`]), derives paths
//!    ([`path`]), consults the [`CompatibilityPolicy`], and attaches tasks to a private
//!    [`JobBuilder`].
//! 3. **Validate**: [`finalize`] checks references, acyclicity, non-empty tasks and name
//!    uniqueness, then freezes the builder into a [`CompiledJob`].
//!
//! Key constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: equal metadata and settings compile to an identical graph.
//! - **No IO during compilation**: paths are manipulated as strings only.
//! - **All or nothing**: a failed compilation never exposes a partial graph.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod compiler;
mod config;
mod foundation;
mod frames;
mod graph;
mod policy;
mod scripts;
mod trace;

pub use compiler::{Clock, Compiler, FixedClock, SystemClock};
pub use config::CompilerOpts;
pub use foundation::error::{CompileError, CompileResult};
pub use foundation::fingerprint::{Fingerprint, fingerprint_json};
pub use frames::chunker::{
    ChunkPolicy, Chunk, Chunks, FixedCountChunker, FixedSizeChunker, FrameChunker,
};
pub use frames::range::{FrameSet, FrameSpan};
pub use graph::author::{DEFAULT_TASK_TYPE, JobBuilder, Task, TaskHandle};
pub use graph::command::{ArgType, Command, CommandArgs, CommandSchema, CommandSchemas};
pub use graph::model::{
    CompiledJob, CompiledTask, JobMeta, Settings, SubmittedJob, TIMESTAMP_FORMAT, TaskId,
};
pub use graph::validate::finalize;
pub use policy::compat::{
    CompatibilityPolicy, FFMPEG_INCOMPATIBLE_IMAGE_FORMATS, VIDEO_REQUIRED_SETTINGS, VideoGate,
};
pub use scripts::echo_sleep_test::EchoSleepTest;
pub use scripts::simple_blender_render::{SimpleBlenderRender, intermediate_path};
pub use scripts::{
    JobCompilerScript, JobTypeInfo, ScriptContext, ScriptRegistry, SettingSpec, SettingType,
    parse_settings,
};
pub use trace::{CompileLog, LogLevel, LogRecord};

/// Pure path-string algebra used to derive render output locations.
pub mod path {
    pub use crate::foundation::path::{basename, dirname, extension, join, stem, to_slash};
}
