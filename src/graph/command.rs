use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::foundation::error::{CompileError, CompileResult};

/// Argument map of a [`Command`]; ordered so serialized graphs are stable.
pub type CommandArgs = Map<String, Value>;

/// A single operation of a task. Commands of a task run sequentially, in order.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Command {
    /// Command kind from the [`CommandSchemas`] vocabulary (`"blender-render"`, `"echo"`, ...).
    pub kind: String,
    /// Validated arguments.
    pub args: CommandArgs,
}

impl Command {
    /// String argument, if present and a string.
    pub fn arg_str(&self, name: &str) -> Option<&str> {
        self.args.get(name).and_then(Value::as_str)
    }
}

/// JSON shape accepted for a command argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgType {
    /// JSON string.
    String,
    /// JSON number.
    Number,
    /// JSON boolean.
    Bool,
    /// JSON array of strings.
    StringList,
    /// Anything.
    Any,
}

impl ArgType {
    fn accepts(self, v: &Value) -> bool {
        match self {
            Self::String => v.is_string(),
            Self::Number => v.is_number(),
            Self::Bool => v.is_boolean(),
            Self::StringList => v
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::Any => true,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Number => "a number",
            Self::Bool => "a boolean",
            Self::StringList => "a list of strings",
            Self::Any => "any value",
        }
    }
}

/// Argument shape of one command kind.
#[derive(Clone, Debug)]
pub struct CommandSchema {
    kind: String,
    required: Vec<(String, ArgType)>,
    optional: Vec<(String, ArgType)>,
}

impl CommandSchema {
    /// Start a schema with no arguments.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            required: Vec::new(),
            optional: Vec::new(),
        }
    }

    /// Add a required argument.
    pub fn required(mut self, name: impl Into<String>, ty: ArgType) -> Self {
        self.required.push((name.into(), ty));
        self
    }

    /// Add an optional argument; it is type-checked only when present.
    pub fn optional(mut self, name: impl Into<String>, ty: ArgType) -> Self {
        self.optional.push((name.into(), ty));
        self
    }

    /// Kind this schema describes.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Check `args` against this schema. Extra arguments are allowed.
    pub fn check(&self, args: &CommandArgs) -> CompileResult<()> {
        for (name, ty) in &self.required {
            match args.get(name) {
                None | Some(Value::Null) => {
                    return Err(CompileError::invalid_command(
                        &self.kind,
                        format!("missing required argument '{name}'"),
                    ));
                }
                Some(v) if !ty.accepts(v) => {
                    return Err(CompileError::invalid_command(
                        &self.kind,
                        format!("argument '{name}' must be {}", ty.describe()),
                    ));
                }
                Some(_) => {}
            }
        }
        for (name, ty) in &self.optional {
            if let Some(v) = args.get(name)
                && !v.is_null()
                && !ty.accepts(v)
            {
                return Err(CompileError::invalid_command(
                    &self.kind,
                    format!("argument '{name}' must be {}", ty.describe()),
                ));
            }
        }
        Ok(())
    }
}

/// Command vocabulary: one [`CommandSchema`] per kind.
///
/// Adding a kind is a matter of registering its schema; nothing else in the compiler changes.
#[derive(Clone, Debug, Default)]
pub struct CommandSchemas {
    schemas: BTreeMap<String, CommandSchema>,
}

impl CommandSchemas {
    /// Vocabulary understood by the stock workers.
    pub fn builtin() -> Self {
        let mut s = Self::default();
        s.register(
            CommandSchema::new("blender-render")
                .required("exe", ArgType::String)
                .required("blendfile", ArgType::String)
                .required("render_output", ArgType::String)
                .required("frames", ArgType::String)
                .optional("exe_args", ArgType::String)
                .optional("format", ArgType::String)
                .optional("args", ArgType::StringList)
                .optional("args_before", ArgType::StringList),
        );
        s.register(
            CommandSchema::new("create-video")
                .required("exe", ArgType::String)
                .required("input_files", ArgType::String)
                .required("output_file", ArgType::String)
                .required("fps", ArgType::Number)
                .optional("args", ArgType::StringList),
        );
        s.register(CommandSchema::new("echo").required("message", ArgType::String));
        s.register(CommandSchema::new("sleep").required("duration_in_seconds", ArgType::Number));
        s.register(
            CommandSchema::new("exec")
                .required("exe", ArgType::String)
                .required("args", ArgType::StringList),
        );
        s.register(
            CommandSchema::new("move-directory")
                .required("src", ArgType::String)
                .required("dest", ArgType::String),
        );
        s.register(
            CommandSchema::new("copy-file")
                .required("src", ArgType::String)
                .required("dest", ArgType::String),
        );
        s
    }

    /// Register (or replace) the schema for its kind.
    pub fn register(&mut self, schema: CommandSchema) {
        self.schemas.insert(schema.kind.clone(), schema);
    }

    /// Schema for `kind`, if known.
    pub fn get(&self, kind: &str) -> Option<&CommandSchema> {
        self.schemas.get(kind)
    }

    /// Known kinds, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Build a validated [`Command`].
    ///
    /// `args` must be a JSON object matching the schema of `kind`.
    pub fn command(&self, kind: &str, args: Value) -> CompileResult<Command> {
        let schema = self
            .get(kind)
            .ok_or_else(|| CompileError::invalid_command(kind, "unknown command kind"))?;
        let Value::Object(args) = args else {
            return Err(CompileError::invalid_command(
                kind,
                "arguments must be a JSON object",
            ));
        };
        schema.check(&args)?;
        Ok(Command {
            kind: kind.to_string(),
            args,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/command.rs"]
mod tests;
