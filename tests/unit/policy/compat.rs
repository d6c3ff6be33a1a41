use serde_json::json;

use super::*;

fn settings(v: serde_json::Value) -> Settings {
    v.as_object().cloned().unwrap()
}

#[test]
fn exr_family_is_incompatible() {
    let p = CompatibilityPolicy::builtin();
    for f in FFMPEG_INCOMPATIBLE_IMAGE_FORMATS {
        assert!(!p.ffmpeg_can_ingest(f), "{f}");
    }
    assert!(!p.ffmpeg_can_ingest("open_exr"));
    assert!(p.ffmpeg_can_ingest("PNG"));
    assert!(p.ffmpeg_can_ingest("JPEG"));
}

#[test]
fn gate_requires_fps_and_extension() {
    let p = CompatibilityPolicy::builtin();
    let full = settings(json!({ "frames_per_second": 24, "output_file_extension": ".png" }));
    assert_eq!(p.video_gate("PNG", &full), VideoGate::Allowed);

    let no_fps = settings(json!({ "output_file_extension": ".png" }));
    assert_eq!(
        p.video_gate("PNG", &no_fps),
        VideoGate::MissingSetting("frames_per_second".to_string())
    );

    let zero_fps = settings(json!({ "frames_per_second": 0, "output_file_extension": ".png" }));
    assert!(!p.video_gate("PNG", &zero_fps).is_allowed());

    let empty_ext = settings(json!({ "frames_per_second": 24.0, "output_file_extension": "" }));
    assert_eq!(
        p.video_gate("PNG", &empty_ext),
        VideoGate::MissingSetting("output_file_extension".to_string())
    );
}

#[test]
fn format_check_comes_first() {
    let p = CompatibilityPolicy::builtin();
    assert_eq!(
        p.video_gate("OPEN_EXR", &Settings::new()),
        VideoGate::IncompatibleFormat("OPEN_EXR".to_string())
    );
}

#[test]
fn formats_can_be_added_as_data() {
    let p = CompatibilityPolicy::builtin().with_incompatible_formats(["dpx"]);
    assert!(!p.ffmpeg_can_ingest("DPX"));
    assert!(CompatibilityPolicy::default().ffmpeg_can_ingest("DPX"));
}
