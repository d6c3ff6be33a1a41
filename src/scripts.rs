//! Job compiler scripts: one pure function per job type, looked up by job type name.

pub mod simple_blender_render;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::CompilerOpts;
use crate::foundation::error::{CompileError, CompileResult};
use crate::foundation::fingerprint::fingerprint_json;
use crate::graph::author::JobBuilder;
use crate::graph::model::{JobMeta, Settings};
use crate::policy::compat::CompatibilityPolicy;
use crate::trace::CompileLog;

/// Read-only inputs of a script run.
pub struct ScriptContext<'a> {
    /// Job being compiled; `meta.created` is the only time source a script may use.
    pub meta: &'a JobMeta,
    /// Settings, already normalized and checked against the job type's [`SettingSpec`]s.
    pub settings: &'a Settings,
    /// Shared compatibility tables.
    pub policy: &'a CompatibilityPolicy,
    /// Compiler options.
    pub opts: &'a CompilerOpts,
}

/// Policy for one job type: decides which tasks to author and how they depend on each other.
///
/// Implementations must be deterministic functions of the context: no clock, filesystem, or
/// network access.
pub trait JobCompilerScript: Send + Sync {
    /// Job type description (name, label, settings schema).
    fn info(&self) -> JobTypeInfo;

    /// Author the job's tasks into `job`, returning the effective settings (which may differ
    /// from the input when the script expands placeholders).
    fn compile(
        &self,
        ctx: &ScriptContext<'_>,
        job: &mut JobBuilder<'_>,
        log: &mut CompileLog,
    ) -> CompileResult<Settings>;
}

/// JSON type of a job setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    /// String value.
    String,
    /// Integer fitting in 32 bits.
    Int32,
    /// Any number.
    Float,
    /// Boolean.
    Bool,
}

impl SettingType {
    fn accepts(self, v: &Value) -> bool {
        match self {
            Self::String => v.is_string(),
            Self::Int32 => v
                .as_i64()
                .is_some_and(|i| i32::try_from(i).is_ok()),
            Self::Float => v.is_number(),
            Self::Bool => v.is_boolean(),
        }
    }
}

/// Description of one setting of a job type.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SettingSpec {
    /// Setting key, unique within the job type.
    pub key: String,
    /// Value type.
    #[serde(rename = "type")]
    pub ty: SettingType,
    /// Reject jobs without this setting.
    #[serde(default)]
    pub required: bool,
    /// Value shown to submitters by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values (string settings only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    /// Show in submitter UIs.
    #[serde(default = "default_true")]
    pub visible: bool,
    /// May be changed after submission (implies recompilation).
    #[serde(default)]
    pub editable: bool,
    /// Older names accepted for this key; renamed to `key` before compilation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl SettingSpec {
    /// Optional, visible setting.
    pub fn new(key: impl Into<String>, ty: SettingType) -> Self {
        Self {
            key: key.into(),
            ty,
            required: false,
            default: None,
            choices: None,
            visible: true,
            editable: false,
            aliases: Vec::new(),
        }
    }

    /// Mark as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value.
    pub fn default_value(mut self, v: Value) -> Self {
        self.default = Some(v);
        self
    }

    /// Restrict to the given choices.
    pub fn choices<I: IntoIterator<Item = S>, S: Into<String>>(mut self, choices: I) -> Self {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Hide from submitter UIs.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Accept older names for this setting.
    pub fn aliases<I: IntoIterator<Item = S>, S: Into<String>>(mut self, aliases: I) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }
}

/// A job type as published to submitters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobTypeInfo {
    /// Job type name (`"simple-blender-render"`).
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Settings schema.
    pub settings: Vec<SettingSpec>,
    /// Fingerprint of this description; filled in on registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl JobTypeInfo {
    /// Hex fingerprint of the description (ignoring any etag already set).
    pub fn compute_etag(&self) -> CompileResult<String> {
        let mut bare = self.clone();
        bare.etag = None;
        Ok(fingerprint_json(&bare)?.to_hex())
    }

    /// Rename alias keys to their canonical key (unless the canonical key is present too).
    pub fn normalize_settings(&self, settings: &Settings) -> Settings {
        let mut out = settings.clone();
        for spec in &self.settings {
            for alias in &spec.aliases {
                if out.contains_key(&spec.key) {
                    break;
                }
                if let Some(v) = out.remove(alias) {
                    out.insert(spec.key.clone(), v);
                }
            }
        }
        out
    }

    /// Check presence, type and choices of every declared setting. Undeclared keys pass.
    pub fn check_settings(&self, settings: &Settings) -> CompileResult<()> {
        for spec in &self.settings {
            let value = settings.get(&spec.key).filter(|v| !v.is_null());
            let Some(value) = value else {
                if spec.required {
                    return Err(CompileError::script(
                        &self.name,
                        format!("missing required setting '{}'", spec.key),
                    ));
                }
                continue;
            };
            if !spec.ty.accepts(value) {
                return Err(CompileError::script(
                    &self.name,
                    format!("setting '{}' must be of type {:?}, got {value}", spec.key, spec.ty),
                ));
            }
            if let Some(choices) = &spec.choices
                && !value
                    .as_str()
                    .is_some_and(|s| choices.iter().any(|c| c == s))
            {
                return Err(CompileError::script(
                    &self.name,
                    format!(
                        "setting '{}' must be one of {choices:?}, got {value}",
                        spec.key
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Deserialize settings into a script's typed settings struct.
pub fn parse_settings<T: serde::de::DeserializeOwned>(
    job_type: &str,
    settings: &Settings,
) -> CompileResult<T> {
    serde_json::from_value(Value::Object(settings.clone()))
        .map_err(|e| CompileError::script(job_type, format!("invalid settings: {e}")))
}

pub(crate) struct Registered {
    pub(crate) script: Box<dyn JobCompilerScript>,
    pub(crate) info: JobTypeInfo,
}

/// Job-type keyed lookup table of scripts.
#[derive(Default)]
pub struct ScriptRegistry {
    scripts: BTreeMap<String, Registered>,
}

impl ScriptRegistry {
    /// Registry with every job type shipped in this crate.
    pub fn builtin() -> CompileResult<Self> {
        let mut r = Self::default();
        r.register(Box::new(simple_blender_render::SimpleBlenderRender))?;
        r.register(Box::new(echo_sleep_test::EchoSleepTest))?;
        Ok(r)
    }

    /// Register (or replace) a script under its job type name, computing its etag.
    pub fn register(&mut self, script: Box<dyn JobCompilerScript>) -> CompileResult<()> {
        let mut info = script.info();
        info.etag = Some(info.compute_etag()?);
        self.scripts
            .insert(info.name.clone(), Registered { script, info });
        Ok(())
    }

    pub(crate) fn get(&self, job_type: &str) -> CompileResult<&Registered> {
        self.scripts
            .get(job_type)
            .ok_or_else(|| CompileError::UnknownJobType(job_type.to_string()))
    }

    /// Published job types, sorted by name, etags filled in.
    pub fn job_types(&self) -> Vec<JobTypeInfo> {
        self.scripts.values().map(|r| r.info.clone()).collect()
    }
}

#[cfg(test)]
#[path = "../tests/unit/scripts/registry.rs"]
mod tests;
