//! `simple-blender-render`: render a frame range in chunks, then encode a preview video when
//! the frames can be read by FFmpeg.

use serde_json::{Value, json};

use crate::foundation::error::{CompileError, CompileResult};
use crate::foundation::path;
use crate::frames::chunker::{FixedSizeChunker, FrameChunker};
use crate::graph::author::{JobBuilder, TaskHandle};
use crate::graph::model::Settings;
use crate::policy::compat::VideoGate;
use crate::scripts::{
    JobCompilerScript, JobTypeInfo, ScriptContext, SettingSpec, SettingType, parse_settings,
};
use crate::trace::CompileLog;

/// Job type name.
pub const JOB_TYPE: &str = "simple-blender-render";

/// Placeholder in `output_file_path` replaced by the job creation time.
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// Encoder arguments of the preview video, before `-r <fps> -y`.
const VIDEO_ARGS: &[&str] = &[
    "-c:v",
    "h264",
    "-crf",
    "20",
    "-g",
    "18",
    "-vf",
    "pad=ceil(iw/2)*2:ceil(ih/2)*2",
    "-pix_fmt",
    "yuv420p",
];

#[derive(Debug, serde::Deserialize)]
struct RenderSettings {
    frames: String,
    #[serde(default)]
    chunk_size: Option<u64>,
    output_file_path: String,
    image_format: String,
    #[serde(default)]
    frames_per_second: Option<f64>,
    #[serde(default)]
    output_file_extension: Option<String>,
    #[serde(default = "default_blender_cmd")]
    blender_cmd: String,
    blendfile: String,
}

fn default_blender_cmd() -> String {
    "{blender}".to_string()
}

/// Sibling of `final_dir` holding rendered frames before they are moved into place:
/// `/out/shots/010` becomes `/out/shots/010__intermediate-<stamp>`.
pub fn intermediate_path(final_dir: &str, stamp: &str) -> CompileResult<String> {
    let parent = path::dirname(final_dir)?;
    let base = path::basename(final_dir)?;
    path::join(&[parent, format!("{base}__intermediate-{stamp}")])
}

/// `-r` argument: integral rates without a fraction.
fn fps_arg(fps: f64) -> String {
    if fps.fract() == 0.0 {
        format!("{}", fps as i64)
    } else {
        fps.to_string()
    }
}

/// The `simple-blender-render` job type.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleBlenderRender;

impl JobCompilerScript for SimpleBlenderRender {
    fn info(&self) -> JobTypeInfo {
        JobTypeInfo {
            name: JOB_TYPE.to_string(),
            label: "Simple Blender Render".to_string(),
            settings: vec![
                SettingSpec::new("frames", SettingType::String).required(),
                SettingSpec::new("chunk_size", SettingType::Int32),
                SettingSpec::new("output_file_path", SettingType::String)
                    .required()
                    .aliases(["render_output"]),
                SettingSpec::new("image_format", SettingType::String)
                    .required()
                    .aliases(["format"]),
                SettingSpec::new("frames_per_second", SettingType::Float).aliases(["fps"]),
                SettingSpec::new("output_file_extension", SettingType::String),
                SettingSpec::new("blender_cmd", SettingType::String)
                    .default_value(json!("{blender}"))
                    .hidden(),
                SettingSpec::new("blendfile", SettingType::String)
                    .required()
                    .aliases(["filepath"])
                    .hidden(),
            ],
            etag: None,
        }
    }

    fn compile(
        &self,
        ctx: &ScriptContext<'_>,
        job: &mut JobBuilder<'_>,
        log: &mut CompileLog,
    ) -> CompileResult<Settings> {
        let s: RenderSettings = parse_settings(JOB_TYPE, ctx.settings)?;
        let mut settings = ctx.settings.clone();
        let stamp = ctx.meta.created_stamp();

        let output_path = s.output_file_path.replace(TIMESTAMP_PLACEHOLDER, &stamp);
        if output_path != s.output_file_path {
            log.debug(format!("output path expanded to {output_path}"));
            settings.insert(
                "output_file_path".to_string(),
                Value::String(output_path.clone()),
            );
        }

        let render_output = path::dirname(&output_path)?;
        let final_dir = path::dirname(&render_output)?;
        let render_dir = intermediate_path(&final_dir, &stamp)?;
        let render_subdir = path::basename(&render_output)?;
        let frame_pattern = path::join(&[
            render_dir.as_str(),
            render_subdir.as_str(),
            path::basename(&output_path)?.as_str(),
        ])?;

        let chunks = match s.chunk_size {
            Some(size) => FixedSizeChunker { size }.chunk(&s.frames)?,
            None => ctx.opts.chunking.chunk(&s.frames)?,
        };

        let num_chunks = chunks.remaining_chunks();
        if num_chunks > ctx.opts.max_chunks {
            return Err(CompileError::invalid_range(format!(
                "frames {} give {num_chunks} chunks, more than the limit of {}",
                s.frames, ctx.opts.max_chunks
            )));
        }

        let mut render_tasks: Vec<TaskHandle> = Vec::new();
        for chunk in chunks {
            let mut task = job.new_task(format!("render-{chunk}")).with_type("blender");
            task.add_command(job.new_command(
                "blender-render",
                json!({
                    "exe": s.blender_cmd,
                    "exe_args": "",
                    "blendfile": s.blendfile,
                    "format": s.image_format,
                    "render_output": frame_pattern,
                    "frames": chunk.to_string(),
                    "args_before": [],
                    "args": [
                        "--render-output", frame_pattern,
                        "--render-format", s.image_format,
                        "--render-frame", chunk.blender_arg(),
                    ],
                }),
            )?);
            render_tasks.push(job.add_task(task)?);
        }
        log.info(format!(
            "{} render tasks for frames {}",
            render_tasks.len(),
            s.frames
        ));

        let gate = ctx.policy.video_gate(&s.image_format, ctx.settings);
        match (gate, s.frames_per_second, s.output_file_extension.as_deref()) {
            (VideoGate::Allowed, Some(fps), Some(ext)) => {
                let stem = path::stem(&s.blendfile)?.replace(".flamenco", "");
                let mut task = job.new_task("create-video").with_type("ffmpeg");
                let mut args: Vec<String> = VIDEO_ARGS.iter().map(|a| a.to_string()).collect();
                args.extend(["-r".to_string(), fps_arg(fps), "-y".to_string()]);
                task.add_command(job.new_command(
                    "create-video",
                    json!({
                        "exe": ctx.opts.ffmpeg_exe,
                        "input_files": path::join(&[
                            render_dir.as_str(),
                            render_subdir.as_str(),
                            format!("*{ext}").as_str(),
                        ])?,
                        "output_file": path::join(&[
                            render_dir.as_str(),
                            format!("{stem}-{}.mp4", s.frames).as_str(),
                        ])?,
                        "fps": fps,
                        "args": args,
                    }),
                )?);
                for render in &render_tasks {
                    task.add_dependency(render);
                }
                job.add_task(task)?;
                log.info(format!("creating output video for {}", s.image_format));
            }
            (VideoGate::IncompatibleFormat(format), ..) => {
                log.info(format!(
                    "not creating a video: FFmpeg cannot read {format} images"
                ));
            }
            (VideoGate::MissingSetting(key), ..) => {
                log.info(format!("not creating a video: setting '{key}' is not set"));
            }
            (VideoGate::Allowed, ..) => {
                log.info("not creating a video: frame rate or file extension unknown");
            }
        }

        Ok(settings)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scripts/simple_blender_render.rs"]
mod tests;
