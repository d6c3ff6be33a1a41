//! Explicit log channel handed to job compiler scripts.
//!
//! Scripts stay pure: instead of printing, they append records here. Each record is also
//! forwarded to `tracing` as it is emitted, tagged with the job and job type.

/// Severity of a [`LogRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal progress.
    Info,
    /// Something the submitter may want to fix.
    Warn,
}

/// One line written by a script.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
}

/// Collector for script log output of one compilation.
#[derive(Debug)]
pub struct CompileLog {
    job: String,
    job_type: String,
    records: Vec<LogRecord>,
}

impl CompileLog {
    /// Empty log for the given job.
    pub fn new(job: impl Into<String>, job_type: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            job_type: job_type.into(),
            records: Vec::new(),
        }
    }

    /// Append a debug record.
    pub fn debug(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Debug, message.into());
    }

    /// Append an info record.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    /// Append a warning record.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    /// Records so far, in emission order.
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub(crate) fn into_records(self) -> Vec<LogRecord> {
        self.records
    }

    fn push(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Debug => {
                tracing::debug!(job = %self.job, job_type = %self.job_type, "{message}")
            }
            LogLevel::Info => {
                tracing::info!(job = %self.job, job_type = %self.job_type, "{message}")
            }
            LogLevel::Warn => {
                tracing::warn!(job = %self.job, job_type = %self.job_type, "{message}")
            }
        }
        self.records.push(LogRecord { level, message });
    }
}
