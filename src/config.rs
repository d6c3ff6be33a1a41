use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{CompileError, CompileResult};
use crate::frames::chunker::ChunkPolicy;

/// Default for [`CompilerOpts::max_chunks`].
pub const DEFAULT_MAX_CHUNKS: u64 = 10_000;

/// Options controlling compilation. Deserializable from JSON; every field has a default.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOpts {
    /// Chunking used when a job does not set `chunk_size` itself.
    pub chunking: ChunkPolicy,
    /// Extra image formats FFmpeg cannot ingest, on top of the built-in table.
    pub extra_ffmpeg_incompatible_formats: Vec<String>,
    /// Executable placed in `create-video` commands.
    pub ffmpeg_exe: String,
    /// Worker threads for [`crate::Compiler::compile_batch`]. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Most render chunks a single job may produce. Larger frame ranges are rejected before any
    /// task is authored.
    pub max_chunks: u64,
}

impl Default for CompilerOpts {
    fn default() -> Self {
        Self {
            chunking: ChunkPolicy::default(),
            extra_ffmpeg_incompatible_formats: Vec::new(),
            ffmpeg_exe: "ffmpeg".to_string(),
            threads: None,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }
}

impl CompilerOpts {
    /// Parse options from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> CompileResult<Self> {
        let opts: Self = serde_json::from_reader(r)
            .map_err(|e| CompileError::serde(format!("parse compiler options JSON: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parse options from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CompileResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CompileError::invalid_options(format!(
                "open compiler options '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject settings that can never work.
    pub fn validate(&self) -> CompileResult<()> {
        match self.chunking {
            ChunkPolicy::FixedSize { size: 0 } => {
                return Err(CompileError::invalid_options("chunking size must be > 0"));
            }
            ChunkPolicy::FixedCount { count: 0 } => {
                return Err(CompileError::invalid_options("chunking count must be > 0"));
            }
            _ => {}
        }
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(CompileError::invalid_options("'threads' must be >= 1 when set"));
        }
        if self.ffmpeg_exe.is_empty() {
            return Err(CompileError::invalid_options("'ffmpeg_exe' must not be empty"));
        }
        if self.max_chunks == 0 {
            return Err(CompileError::invalid_options("'max_chunks' must be >= 1"));
        }
        Ok(())
    }
}
