use std::{
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jobforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a submitted job JSON into a task graph.
    Compile(CompileArgs),
    /// List the available job types with their etags.
    JobTypes(JobTypesArgs),
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Submitted job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output graph JSON; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Creation time (RFC 3339); current time when omitted.
    #[arg(long)]
    created: Option<chrono::DateTime<chrono::Utc>>,

    /// Job identifier; a random UUID when omitted.
    #[arg(long)]
    job_id: Option<String>,

    #[command(flatten)]
    opts: OptsArgs,
}

#[derive(Parser, Debug)]
struct JobTypesArgs {
    #[command(flatten)]
    opts: OptsArgs,
}

#[derive(Args, Debug)]
struct OptsArgs {
    /// Compiler options JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames per render task (overrides the config).
    #[arg(long, conflicts_with = "chunk_count")]
    chunk_size: Option<u64>,

    /// Number of render tasks (overrides the config).
    #[arg(long)]
    chunk_count: Option<u64>,
}

impl OptsArgs {
    fn load(&self) -> anyhow::Result<jobforge::CompilerOpts> {
        let mut opts = match &self.config {
            Some(path) => jobforge::CompilerOpts::from_path(path)?,
            None => jobforge::CompilerOpts::default(),
        };
        if let Some(size) = self.chunk_size {
            opts.chunking = jobforge::ChunkPolicy::FixedSize { size };
        }
        if let Some(count) = self.chunk_count {
            opts.chunking = jobforge::ChunkPolicy::FixedCount { count };
        }
        Ok(opts)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
        Command::JobTypes(args) => cmd_job_types(args),
    }
}

fn read_job_json(path: &Path) -> anyhow::Result<jobforge::SubmittedJob> {
    let f = File::open(path).with_context(|| format!("open job '{}'", path.display()))?;
    let r = BufReader::new(f);
    let job: jobforge::SubmittedJob =
        serde_json::from_reader(r).with_context(|| "parse submitted job JSON")?;
    Ok(job)
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let submitted = read_job_json(&args.in_path)?;
    let mut compiler = jobforge::Compiler::new(args.opts.load()?)?;
    if let Some(created) = args.created {
        compiler = compiler.with_clock(jobforge::FixedClock(created));
    }

    let compiled = match args.job_id {
        Some(id) => {
            compiler.check_etag(&submitted)?;
            let created = args.created.unwrap_or_else(chrono::Utc::now);
            let meta = jobforge::JobMeta::from_submitted(&submitted, id, created);
            compiler.compile_with_meta(meta, &submitted.settings)?
        }
        None => compiler.compile(&submitted)?,
    };

    let json = serde_json::to_string_pretty(&compiled).context("serialize compiled job")?;
    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(out, json + "\n")
                .with_context(|| format!("write graph '{}'", out.display()))?;
            eprintln!(
                "wrote {} ({} tasks, fingerprint {})",
                out.display(),
                compiled.tasks().len(),
                compiled.fingerprint()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("write graph to stdout")?;
        }
    }
    Ok(())
}

fn cmd_job_types(args: JobTypesArgs) -> anyhow::Result<()> {
    let compiler = jobforge::Compiler::new(args.opts.load()?)?;
    let mut stdout = std::io::stdout().lock();
    for info in compiler.job_types() {
        writeln!(
            stdout,
            "{}\t{}\t{}",
            info.name,
            info.etag.as_deref().unwrap_or_default(),
            info.label
        )?;
    }
    Ok(())
}
