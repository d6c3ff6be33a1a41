//! Compilation service: job type lookup, etag check, settings check, isolated script run,
//! validation.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::config::CompilerOpts;
use crate::foundation::error::{CompileError, CompileResult};
use crate::graph::author::JobBuilder;
use crate::graph::command::{CommandSchema, CommandSchemas};
use crate::graph::model::{CompiledJob, JobMeta, Settings, SubmittedJob};
use crate::graph::validate;
use crate::policy::compat::CompatibilityPolicy;
use crate::scripts::{JobCompilerScript, JobTypeInfo, ScriptContext, ScriptRegistry};
use crate::trace::CompileLog;

/// Source of job creation times.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Turns submitted jobs into validated task graphs.
///
/// Holds only read-only state after construction, so one instance can serve any number of
/// concurrent compilations.
pub struct Compiler {
    registry: ScriptRegistry,
    schemas: CommandSchemas,
    policy: CompatibilityPolicy,
    opts: CompilerOpts,
    clock: Box<dyn Clock>,
}

impl Compiler {
    /// Compiler with the built-in job types and command vocabulary.
    pub fn new(opts: CompilerOpts) -> CompileResult<Self> {
        opts.validate()?;
        let policy = CompatibilityPolicy::builtin()
            .with_incompatible_formats(&opts.extra_ffmpeg_incompatible_formats);
        Ok(Self {
            registry: ScriptRegistry::builtin()?,
            schemas: CommandSchemas::builtin(),
            policy,
            opts,
            clock: Box::new(SystemClock),
        })
    }

    /// Replace the clock used for `created` timestamps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Register an additional (or replacement) job type.
    pub fn with_script(mut self, script: impl JobCompilerScript + 'static) -> CompileResult<Self> {
        self.registry.register(Box::new(script))?;
        Ok(self)
    }

    /// Register an additional (or replacement) command kind.
    pub fn with_command_schema(mut self, schema: CommandSchema) -> Self {
        self.schemas.register(schema);
        self
    }

    /// Options in effect.
    pub fn opts(&self) -> &CompilerOpts {
        &self.opts
    }

    /// Compatibility tables in effect.
    pub fn policy(&self) -> &CompatibilityPolicy {
        &self.policy
    }

    /// Command vocabulary in effect.
    pub fn schemas(&self) -> &CommandSchemas {
        &self.schemas
    }

    /// Known job types, sorted by name, with etags.
    pub fn job_types(&self) -> Vec<JobTypeInfo> {
        self.registry.job_types()
    }

    /// One job type, with etag.
    pub fn job_type(&self, name: &str) -> CompileResult<JobTypeInfo> {
        Ok(self.registry.get(name)?.info.clone())
    }

    /// Reject `submitted` when it carries an etag that does not match its job type.
    ///
    /// A missing or empty etag is accepted with a warning.
    pub fn check_etag(&self, submitted: &SubmittedJob) -> CompileResult<()> {
        let registered = self.registry.get(&submitted.job_type)?;
        let expected = registered.info.etag.as_deref().unwrap_or_default();
        match submitted.type_etag.as_deref() {
            None | Some("") => {
                tracing::warn!(
                    job_type = %submitted.job_type,
                    "job submitted without job type etag, accepting anyway"
                );
                Ok(())
            }
            Some(etag) if etag != expected => Err(CompileError::JobTypeBadEtag {
                expected: expected.to_string(),
                submitted: etag.to_string(),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Compile a submitted job, assigning it a fresh id and the clock's current time.
    pub fn compile(&self, submitted: &SubmittedJob) -> CompileResult<CompiledJob> {
        self.check_etag(submitted)?;
        let id = uuid::Uuid::new_v4().to_string();
        let meta = JobMeta::from_submitted(submitted, id, self.clock.now());
        self.compile_with_meta(meta, &submitted.settings)
    }

    /// Compile with caller-provided identity and creation time.
    ///
    /// A pure function of its inputs: equal `meta` and `settings` give an identical graph.
    #[tracing::instrument(skip_all, fields(job = %meta.id, job_type = %meta.job_type))]
    pub fn compile_with_meta(
        &self,
        meta: JobMeta,
        settings: &Settings,
    ) -> CompileResult<CompiledJob> {
        let result = self.run_script(meta, settings);
        match &result {
            Ok(job) => tracing::info!(num_tasks = job.tasks().len(), "job compiled"),
            Err(e) => tracing::warn!(error = %e, "job rejected"),
        }
        result
    }

    fn run_script(&self, meta: JobMeta, settings: &Settings) -> CompileResult<CompiledJob> {
        let registered = self.registry.get(&meta.job_type)?;
        let info = &registered.info;
        let settings = info.normalize_settings(settings);
        info.check_settings(&settings)?;

        let ctx_meta = meta.clone();
        let ctx = ScriptContext {
            meta: &ctx_meta,
            settings: &settings,
            policy: &self.policy,
            opts: &self.opts,
        };
        let mut log = CompileLog::new(&meta.id, &meta.job_type);
        let mut builder = JobBuilder::new(meta, &self.schemas);

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            registered.script.compile(&ctx, &mut builder, &mut log)
        }));
        let effective = match outcome {
            Ok(result) => result?,
            Err(payload) => {
                return Err(CompileError::script(
                    &info.name,
                    format!("script panicked: {}", panic_message(payload.as_ref())),
                ));
            }
        };

        validate::finalize(builder, effective, log)
    }

    /// Compile many jobs in parallel. Results come back in input order.
    ///
    /// Fails only when the worker pool cannot be created; per-job failures are in the vector.
    pub fn compile_batch(
        &self,
        jobs: &[SubmittedJob],
    ) -> CompileResult<Vec<CompileResult<CompiledJob>>> {
        let pool = build_thread_pool(self.opts.threads)?;
        Ok(pool.install(|| jobs.par_iter().map(|job| self.compile(job)).collect()))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn build_thread_pool(threads: Option<usize>) -> CompileResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        CompileError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}"))
    })
}

#[cfg(test)]
#[path = "../tests/unit/compiler.rs"]
mod tests;
